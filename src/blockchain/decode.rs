//! `Transfer` event definition and log decoding.

use alloy::primitives::Address;
use alloy::rpc::types::{Filter, Log};
use alloy::sol;
use alloy::sol_types::SolEvent;

use crate::blockchain::types::{DecodeError, Network, TransferEvent};

sol! {
    /// ERC-721 transfer, emitted on mint, burn and every custody change.
    #[derive(Debug, PartialEq, Eq)]
    event Transfer(address indexed from, address indexed to, uint256 indexed tokenId);
}

/// Log filter selecting `Transfer` events of one contract.
pub fn transfer_filter(contract: Address) -> Filter {
    Filter::new().address(contract).event(Transfer::SIGNATURE)
}

/// Decode a subscription notification into a [`TransferEvent`].
pub fn decode_transfer(log: &Log, network: Network) -> Result<TransferEvent, DecodeError> {
    let decoded = log
        .log_decode::<Transfer>()
        .map_err(|e| DecodeError::NotTransfer(e.to_string()))?;
    let tx_hash = log.transaction_hash.ok_or(DecodeError::MissingTxHash)?;
    let transfer = decoded.inner.data;

    Ok(TransferEvent {
        token_id: transfer.tokenId.to_string(),
        tx_hash: tx_hash.to_string(),
        from_address: transfer.from.to_checksum(None),
        to_address: transfer.to.to_checksum(None),
        network,
    })
}
