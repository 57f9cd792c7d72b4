use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use dotenvy::dotenv;
use message_relay::Supervisor;
use message_relay::config::{self, AppConfig};

#[derive(Parser)]
#[command(
    name = "message_relay",
    version,
    about = "Accepts web form messages and stores them via a local datagram listener"
)]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: PathBuf,
    /// HTTP port to serve the form on
    #[arg(long, env = "HTTP_PORT")]
    http_port: Option<u16>,
    /// Address the datagram listener binds and the form handler sends to
    #[arg(long, env = "LISTENER_ADDR", value_name = "ADDR")]
    listener_addr: Option<SocketAddr>,
    /// JSON file records are persisted to
    #[arg(long, env = "STORAGE_PATH", value_name = "FILE")]
    storage_path: Option<PathBuf>,
    /// Directory served under /static
    #[arg(long, env = "STATIC_DIR", value_name = "DIR")]
    static_dir: Option<PathBuf>,
}

impl Cli {
    fn apply(self, mut config: AppConfig) -> AppConfig {
        if let Some(port) = self.http_port {
            config.http_port = port;
        }
        if let Some(addr) = self.listener_addr {
            config.listener_addr = addr;
        }
        if let Some(path) = self.storage_path {
            config.storage_path = path;
        }
        if let Some(dir) = self.static_dir {
            config.static_dir = dir;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let app_config = config::load_config(&cli.config);
    let app_config = cli.apply(app_config);

    log::info!(
        "Starting message relay (http {}, listener {}, store {})",
        app_config.http_addr(),
        app_config.listener_addr,
        app_config.storage_path.display()
    );

    Supervisor::new(app_config).run().await?;

    log::info!("Message relay stopped");
    Ok(())
}
