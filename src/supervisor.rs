use tokio::net::TcpListener;

use crate::config::AppConfig;
use crate::error::SupervisorError;
use crate::network::{ListenerHandle, Producer};
use crate::storage::JsonStore;
use crate::web;

/// Owns the background listener task and runs the HTTP loop in the foreground.
#[derive(Debug)]
pub struct Supervisor {
    config: AppConfig,
    listener: Option<ListenerHandle>,
}

impl Supervisor {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            listener: None,
        }
    }

    /// Starts the listener unless a live one already exists. Does not wait
    /// for the bind to complete.
    pub fn ensure_listener(&mut self) -> &ListenerHandle {
        let alive = self
            .listener
            .as_ref()
            .is_some_and(|handle| !handle.is_finished());

        if alive {
            log::info!("Datagram listener already running");
        } else {
            // A finished handle means the previous bind failed.
            self.listener = None;
        }

        let config = &self.config;
        self.listener.get_or_insert_with(|| {
            log::info!("Starting datagram listener on {}", config.listener_addr);
            ListenerHandle::spawn(
                config.listener_addr,
                JsonStore::new(config.storage_path.clone()),
            )
        })
    }

    /// Binds the configured HTTP address and serves until Ctrl+C.
    pub async fn run(self) -> Result<(), SupervisorError> {
        let addr = self.config.http_addr();
        let http = match TcpListener::bind(&addr).await {
            Ok(http) => http,
            Err(source) => return Err(SupervisorError::HttpBind { addr, source }),
        };

        self.serve(http, async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for shutdown signal: {err}");
                std::future::pending::<()>().await;
            }
            log::info!("Received shutdown signal, stopping...");
        })
        .await
    }

    /// Serves HTTP on `http` until `shutdown` resolves, then stops and joins
    /// the listener task.
    pub async fn serve<F>(mut self, http: TcpListener, shutdown: F) -> Result<(), SupervisorError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.ensure_listener();

        let producer = Producer::new(self.config.listener_addr);
        let app = web::router(producer, &self.config.static_dir);

        match http.local_addr() {
            Ok(addr) => log::info!("HTTP server listening on http://{addr}"),
            Err(err) => log::warn!("HTTP server bound, address unknown: {err}"),
        }

        let served = axum::serve(http, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(SupervisorError::HttpServe);

        if let Some(handle) = self.listener.take() {
            handle.shutdown().await;
            log::info!("Datagram listener stopped");
        }

        served
    }
}
