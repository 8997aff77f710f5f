//! Application state shared across handlers

use super::ServerConfig;
use crate::repository::{InMemoryStore, RecordStore};
use crate::textgen::TextGenAnalyzer;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Shared server state.
///
/// The analyzer pair and the two record stores are the only mutable state;
/// each sits behind its own lock so a load replacing the active pair
/// cannot race a request mid-inference.
pub struct AppState {
    pub config: ServerConfig,
    pub analyzer: RwLock<TextGenAnalyzer>,
    pub benchmarks: RwLock<Box<dyn RecordStore>>,
    pub library: RwLock<Box<dyn RecordStore>>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            analyzer: RwLock::new(TextGenAnalyzer::new()),
            benchmarks: RwLock::new(Box::new(InMemoryStore::new())),
            library: RwLock::new(Box::new(InMemoryStore::new())),
        }
    }

    /// Short unique id used in stored artifact filenames
    pub fn generate_id() -> String {
        Uuid::new_v4().to_string()[..8].to_string()
    }

    /// Get system information
    pub fn get_system_info() -> serde_json::Value {
        use sysinfo::System;

        let mut sys = System::new_all();
        sys.refresh_all();

        let cpu_usage: f32 =
            sys.cpus().iter().map(|c| c.cpu_usage()).sum::<f32>() / sys.cpus().len().max(1) as f32;

        serde_json::json!({
            "cpu_count": sys.cpus().len(),
            "cpu_usage": cpu_usage,
            "total_memory_gb": sys.total_memory() as f64 / 1024.0 / 1024.0 / 1024.0,
            "used_memory_gb": sys.used_memory() as f64 / 1024.0 / 1024.0 / 1024.0,
            "memory_usage_percent": (sys.used_memory() as f64 / sys.total_memory() as f64) * 100.0,
        })
    }
}
