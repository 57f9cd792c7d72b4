use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::watch;
use tokio::task::{self, JoinHandle};
use tokio::time::sleep;

use crate::common::{Message, Record};
use crate::error::ListenerError;
use crate::storage::JsonStore;

/// Larger datagrams are truncated by the transport.
pub const MAX_DATAGRAM_SIZE: usize = 1024;

/// Pause after a failed receive so a persistent socket error cannot spin the loop.
const RECEIVE_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Read-only view of whether the listener is bound and receiving.
///
/// Only this module can flip the flag.
#[derive(Debug, Clone, Default)]
pub struct Readiness(Arc<AtomicBool>);

impl Readiness {
    pub fn is_ready(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn set(&self, ready: bool) {
        self.0.store(ready, Ordering::Release);
    }
}

/// Datagram consumer that persists every decoded message.
///
/// The store sits behind a mutex only so appends can run on the blocking
/// pool; this listener stays its sole writer.
pub struct Listener {
    socket: UdpSocket,
    store: Arc<Mutex<JsonStore>>,
    readiness: Readiness,
}

impl Listener {
    pub async fn bind(
        addr: SocketAddr,
        store: JsonStore,
        readiness: Readiness,
    ) -> Result<Self, ListenerError> {
        let socket = match UdpSocket::bind(addr).await {
            Ok(socket) => socket,
            Err(source) => {
                readiness.set(false);
                return Err(ListenerError::Bind { addr, source });
            }
        };

        Ok(Self {
            socket,
            store: Arc::new(Mutex::new(store)),
            readiness,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Receives until `shutdown` flips to `true` or its sender is dropped.
    /// A bad datagram or a failed write only costs that one message.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut buf = [0u8; MAX_DATAGRAM_SIZE];
        self.readiness.set(true);
        log::info!(
            "Datagram listener receiving on {}",
            self.socket
                .local_addr()
                .map(|addr| addr.to_string())
                .unwrap_or_else(|_| "<unknown>".into())
        );

        loop {
            tokio::select! {
                received = self.socket.recv_from(&mut buf) => {
                    if let Some(pause) = self.on_receive(received, &buf).await {
                        sleep(pause).await;
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        log::info!("Datagram listener shutting down");
                        break;
                    }
                }
            }
        }

        self.readiness.set(false);
    }

    /// Handles one receive result. Returns how long to wait before the next
    /// receive, which is only non-zero after a socket error.
    async fn on_receive(
        &mut self,
        received: io::Result<(usize, SocketAddr)>,
        buf: &[u8],
    ) -> Option<Duration> {
        let result = match received {
            Ok((len, peer)) => {
                log::debug!("Received {len} bytes from {peer}");
                self.handle_datagram(&buf[..len]).await
            }
            Err(err) => Err(ListenerError::Receive(err)),
        };

        match result {
            Ok(record) => {
                log::debug!(
                    "Stored message from {} at {}",
                    record.message.username,
                    record.timestamp
                );
                None
            }
            Err(err @ ListenerError::Receive(_)) => {
                log::warn!("{err}; pausing {RECEIVE_ERROR_BACKOFF:?}");
                Some(RECEIVE_ERROR_BACKOFF)
            }
            Err(err @ (ListenerError::Store(_) | ListenerError::StoreTask(_))) => {
                log::error!("Dropping message: {err}");
                None
            }
            Err(err) => {
                log::warn!("Dropping datagram: {err}");
                None
            }
        }
    }

    async fn handle_datagram(&mut self, payload: &[u8]) -> Result<Record, ListenerError> {
        let message = Message::decode(payload)?;
        let store = Arc::clone(&self.store);
        let record = task::spawn_blocking(move || {
            let mut store = store.lock().unwrap_or_else(PoisonError::into_inner);
            store.append(message)
        })
        .await??;
        Ok(record)
    }
}

/// Owner-side handle to the background listener task.
#[derive(Debug)]
pub struct ListenerHandle {
    task: JoinHandle<()>,
    readiness: Readiness,
    shutdown: watch::Sender<bool>,
}

impl ListenerHandle {
    /// Spawns bind + receive loop in the background without waiting for the bind.
    /// Datagrams sent before the bind completes are lost.
    pub fn spawn(addr: SocketAddr, store: JsonStore) -> Self {
        let readiness = Readiness::default();
        let (shutdown, shutdown_rx) = watch::channel(false);

        let task_readiness = readiness.clone();
        let task = tokio::spawn(async move {
            match Listener::bind(addr, store, task_readiness).await {
                Ok(listener) => listener.run(shutdown_rx).await,
                Err(err) => log::error!("Datagram listener not started: {err}"),
            }
        });

        Self {
            task,
            readiness,
            shutdown,
        }
    }

    pub fn readiness(&self) -> Readiness {
        self.readiness.clone()
    }

    pub fn is_ready(&self) -> bool {
        self.readiness.is_ready()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signals the receive loop to stop and waits for the task to end.
    pub async fn shutdown(self) {
        // Already gone if the bind failed; nothing to signal then.
        let _ = self.shutdown.send(true);
        if let Err(err) = self.task.await {
            log::error!("Datagram listener task failed: {err}");
        }
    }
}
