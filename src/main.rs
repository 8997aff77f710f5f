//! Modelbench - Main Entry Point
//!
//! Model evaluation service with CLI and server modes.

use clap::Parser;
use modelbench::cli::{cmd_evaluate, cmd_info, cmd_serve, cmd_train, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "modelbench=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { host, port } => {
            cmd_serve(host, port).await?;
        }
        Commands::Evaluate {
            model,
            data,
            target,
        } => {
            cmd_evaluate(&model, &data, target.as_deref())?;
        }
        Commands::Train { data, target } => {
            cmd_train(&data, &target)?;
        }
        Commands::Info { data } => {
            cmd_info(&data)?;
        }
    }

    Ok(())
}
