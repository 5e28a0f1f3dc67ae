use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "relay-cli")]
#[command(about = "Query a running Dify relay", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch an app's parameters
    Parameters { app_id: String },
    /// Fetch an app's site settings
    Site { app_id: String },
    /// Check relay liveness
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let path = match &cli.command {
        Commands::Parameters { app_id } => format!("/api/client/dify/{}/parameters", app_id),
        Commands::Site { app_id } => format!("/api/client/dify/{}/site", app_id),
        Commands::Health => "/health".to_string(),
    };

    let res = client.get(format!("{}{}", cli.url, path)).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    let rendered = match serde_json::from_str::<Value>(&text) {
        Ok(json) => serde_json::to_string_pretty(&json)?,
        Err(_) => text,
    };

    if status.is_success() {
        println!("{}", rendered);
    } else {
        eprintln!("Error: relay returned status {}", status);
        eprintln!("{}", rendered);
    }
    Ok(())
}
