use anyhow::Result;
use clap::Parser;
use dotenvy::dotenv;

use qgate_core::GatewayConfig;

mod envelope;
mod handlers;
mod sink;
mod startup;
mod state;

#[derive(Parser, Debug)]
#[command(author, version, about = "Configuration-driven HTTP-to-SQL gateway", long_about = None)]
#[command(name = "qgate")]
struct Cli {
  /// Run the catalogue validator and exit without starting the HTTP host,
  /// overriding the configured validation mode
  #[arg(long, visible_alias = "validate")]
  validate_only: bool,

  /// Override the catalogue directory
  #[arg(long)]
  catalog_dir: Option<std::path::PathBuf>,

  /// Verbose output
  #[arg(short, long)]
  verbose: bool,
}

#[actix_web::main]
async fn main() -> Result<()> {
  // Load environment variables
  dotenv().ok();

  // Parse CLI arguments
  let cli = Cli::parse();

  // Initialize logging
  let log_level = if cli.verbose { "debug" } else { "info" };
  tracing_subscriber::fmt().with_env_filter(log_level).init();

  // Load configuration
  let mut config = GatewayConfig::from_env()?;
  if let Some(dir) = cli.catalog_dir {
    config.catalog_dir = dir;
  }

  let code = startup::run(config, cli.validate_only).await?;
  std::process::exit(code);
}
