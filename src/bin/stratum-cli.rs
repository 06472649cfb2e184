use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "stratum-cli")]
#[command(about = "Management CLI for the stratum admin API", long_about = None)]
struct Cli {
    /// Admin API base URL.
    #[arg(short, long, default_value = "http://localhost:8000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show server info
    Info,
    /// List installable rule and plugin kinds
    Catalog,
    /// List global plugins
    Plugins,
    /// Install a global plugin
    AddPlugin {
        /// Plugin kind name, e.g. "forward"
        name: String,
        /// Plugin config as a JSON object
        #[arg(default_value = "{}")]
        config: String,
    },
    /// Remove a global plugin by id
    RemovePlugin { id: String },
    /// List global scopes
    Scopes,
    /// Create a global scope
    AddScope {
        name: String,
        #[arg(default_value = "")]
        description: String,
    },
    /// Remove a global scope by id
    RemoveScope { id: String },
    /// List managed instances
    Instances,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Info => client.get(format!("{base}/")).send().await?,
        Commands::Catalog => client.get(format!("{base}/catalog")).send().await?,
        Commands::Plugins => client.get(format!("{base}/plugins")).send().await?,
        Commands::AddPlugin { name, config } => {
            let config: Value = serde_json::from_str(&config)?;
            client
                .post(format!("{base}/plugins"))
                .json(&serde_json::json!({ "name": name, "config": config }))
                .send()
                .await?
        }
        Commands::RemovePlugin { id } => {
            client.delete(format!("{base}/plugins/{id}")).send().await?
        }
        Commands::Scopes => client.get(format!("{base}/scopes")).send().await?,
        Commands::AddScope { name, description } => {
            client
                .post(format!("{base}/scopes"))
                .json(&serde_json::json!({ "name": name, "description": description }))
                .send()
                .await?
        }
        Commands::RemoveScope { id } => {
            client.delete(format!("{base}/scopes/{id}")).send().await?
        }
        Commands::Instances => client.get(format!("{base}/instances")).send().await?,
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    if !status.is_success() {
        eprintln!("Error: admin API returned status {status}");
        if !text.is_empty() {
            eprintln!("{text}");
        }
        std::process::exit(1);
    }

    if text.is_empty() {
        println!("OK ({status})");
        return Ok(());
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        Err(_) => println!("{text}"),
    }
    Ok(())
}
