use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::storage::DEFAULT_STORE_PATH;

pub const DEFAULT_CONFIG_PATH: &str = "config/app.json";
pub const DEFAULT_HTTP_PORT: u16 = 3000;
pub const DEFAULT_LISTENER_ADDR: &str = "127.0.0.1:7000";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub http_host: String,
    pub http_port: u16,
    /// Where the datagram listener binds and where the producer sends.
    pub listener_addr: SocketAddr,
    pub storage_path: PathBuf,
    pub static_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http_host: "127.0.0.1".to_string(),
            http_port: DEFAULT_HTTP_PORT,
            listener_addr: DEFAULT_LISTENER_ADDR
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 7000))),
            storage_path: PathBuf::from(DEFAULT_STORE_PATH),
            static_dir: PathBuf::from("static"),
        }
    }
}

impl AppConfig {
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}

/// Loads the JSON config file, falling back to defaults when it is missing
/// or unreadable.
pub fn load_config<P: AsRef<Path>>(path: P) -> AppConfig {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Failed to parse config file {}: {err}", path.display());
                AppConfig::default()
            }
        },
        Err(err) => {
            log::info!(
                "Config file {} not found ({err}); using defaults",
                path.display()
            );
            AppConfig::default()
        }
    }
}
