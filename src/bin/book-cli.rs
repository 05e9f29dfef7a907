use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "book-cli")]
#[command(about = "Command-line client for the book lending service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all books
    List,
    /// Show one book
    Get { id: u64 },
    /// Borrow one copy of a book
    Borrow { id: u64 },
    /// Overwrite the stock of a book
    ResetStock {
        id: u64,
        #[arg(short, long, default_value_t = 10)]
        stock: u32,
    },
    /// Show service health and circuit breaker state
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::List => client.get(format!("{}/api/books", base)).send().await?,
        Commands::Get { id } => client.get(format!("{}/api/books/{}", base, id)).send().await?,
        Commands::Borrow { id } => {
            client
                .post(format!("{}/api/books/{}/borrow", base, id))
                .send()
                .await?
        }
        Commands::ResetStock { id, stock } => {
            client
                .post(format!("{}/api/books/{}/reset-stock", base, id))
                .query(&[("stock", stock)])
                .send()
                .await?
        }
        Commands::Health => client.get(format!("{}/health", base)).send().await?,
    };
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if let Some(id) = res.headers().get("x-request-id").and_then(|v| v.to_str().ok()) {
        eprintln!("request-id: {}", id);
    }

    let json: Value = res.json().await?;
    if !status.is_success() {
        eprintln!("Error: service returned status {}", status);
    }
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
