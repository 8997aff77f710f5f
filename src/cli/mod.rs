//! Command-line interface

use clap::{Parser, Subcommand};
use std::path::Path;

use crate::dataset::DatasetLoader;
use crate::evaluation::EvaluationPipeline;
use crate::server::{run_server, ServerConfig};
use crate::training::BaselineTrainer;

#[derive(Parser)]
#[command(name = "modelbench", about = "Model evaluation service", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Evaluate a serialized model against a dataset
    Evaluate {
        /// Model artifact (.h5, .pt, .pth, .pkl)
        #[arg(long)]
        model: String,
        /// Dataset file (.csv, .xlsx, .xls)
        #[arg(long)]
        data: String,
        /// Target column; defaults to the last column
        #[arg(long)]
        target: Option<String>,
    },
    /// Train the baseline classifier on a dataset
    Train {
        #[arg(long)]
        data: String,
        #[arg(long)]
        target: String,
    },
    /// Print dataset information
    Info {
        #[arg(long)]
        data: String,
    },
}

pub async fn cmd_serve(host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let mut config = ServerConfig::default();
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }
    run_server(config).await
}

pub fn cmd_evaluate(model: &str, data: &str, target: Option<&str>) -> anyhow::Result<()> {
    let pipeline = EvaluationPipeline::new();
    let outcome = pipeline.evaluate(Path::new(model), Path::new(data), target);
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

pub fn cmd_train(data: &str, target: &str) -> anyhow::Result<()> {
    let df = DatasetLoader::new().load_table(Path::new(data))?;
    let report = BaselineTrainer::new().train(&df, target)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub fn cmd_info(data: &str) -> anyhow::Result<()> {
    let summary = DatasetLoader::new().summarize(Path::new(data))?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
