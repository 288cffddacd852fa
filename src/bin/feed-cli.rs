use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use serde_json::Value;
use tokio_tungstenite::{connect_async, tungstenite::Message};

#[derive(Parser)]
#[command(name = "feed-cli")]
#[command(about = "Client for the POAP transfer feed", long_about = None)]
struct Cli {
    /// Feed server address (host:port)
    #[arg(short, long, default_value = "localhost:8080")]
    address: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print transfer records as they are broadcast
    Tail {
        /// Exit after this many records
        #[arg(short, long)]
        count: Option<usize>,
    },
    /// Show subscription and client status
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Tail { count } => tail(&cli.address, count).await?,
        Commands::Status => {
            let res = reqwest::get(format!("http://{}/status", cli.address)).await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn tail(address: &str, count: Option<usize>) -> Result<(), Box<dyn std::error::Error>> {
    let (mut socket, _) = connect_async(format!("ws://{}/", address)).await?;
    eprintln!("Connected to {}", address);

    let mut received = 0;
    while let Some(message) = socket.next().await {
        match message? {
            Message::Text(text) => {
                match serde_json::from_str::<Value>(text.as_str()) {
                    Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
                    Err(_) => println!("{}", text.as_str()),
                }
                received += 1;
                if count.is_some_and(|limit| received >= limit) {
                    break;
                }
            }
            Message::Close(_) => {
                eprintln!("Server closed the connection");
                break;
            }
            _ => {}
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: feed returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
