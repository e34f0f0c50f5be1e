use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Management CLI for the resilient gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show payments circuit breaker state and stats
    Status,
    /// Reset circuit breaker stats
    Reset,
    /// Gateway health check
    Health,
    /// Pay an order through the gateway
    Pay {
        /// Order to pay
        order_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Status => {
            client
                .get(format!("{}/api/circuit-breaker/status", base))
                .send()
                .await?
        }
        Commands::Reset => {
            client
                .post(format!("{}/api/circuit-breaker/reset", base))
                .send()
                .await?
        }
        Commands::Health => client.get(format!("{}/api/health", base)).send().await?,
        Commands::Pay { order_id } => {
            client
                .post(format!("{}/api/orders/{}/pay", base, order_id))
                .send()
                .await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    println!("Status: {}", status);
    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
