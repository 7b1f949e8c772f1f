use clap::{Parser, Subcommand};
use shortreg::config::Config;
use shortreg::error::AppResult;
use shortreg::server;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// shortreg - An in-memory URL shortener with per-click analytics
#[derive(Parser, Debug)]
#[command(name = "shortreg")]
#[command(version = "1.0.0")]
#[command(about = "An in-memory URL shortener with per-click analytics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the web server
    Server {
        /// Host to bind to (overrides SERVER_HOST env var)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides SERVER_PORT env var)
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string())),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;

    match cli.command {
        Commands::Server { host, port } => {
            let overridden = host.is_some() || port.is_some();
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let addr = format!("{}:{}", host, port);

            // Re-compute base_url after CLI overrides
            let mut config = config;
            if overridden {
                config.url.base_url = format!("http://{}:{}", host, port);
            }

            server::run_server(config, addr).await
        }
    }
}
