//! GSI Ingestion Server
//!
//! Loopback HTTP listener the game client pushes state to. A single
//! dedicated worker thread drives a current-thread tokio runtime that
//! accepts and serves connections one at a time, so updates are merged
//! strictly in arrival order. Consumers read the published views from
//! any thread through the accessors on [`IngestionServer`].
//!
//! The accept wait is bounded (`accept_poll`), so a cleared running flag
//! is noticed within one poll interval and [`IngestionServer::stop`]
//! returns promptly.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tracing::{debug, error, info, instrument, warn};

use crate::config::ServerConfig;
use crate::gsi::filter::PlayerFilter;
use crate::gsi::hud::HudView;
use crate::gsi::radar::{RadarBomb, RadarGrenade, RadarPlayer};
use crate::gsi::service::Service;
use crate::gsi::smoke::SmokeStatus;
use crate::network::auth::AuthConfig;
use crate::network::protocol::{encode_response, validate_request, Rejection, StatusCode};
use crate::network::wire::read_request;

/// Name of the worker thread.
const WORKER_THREAD_NAME: &str = "gsi-ingest";

/// Server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind the loopback port.
    #[error("Failed to bind: {0}")]
    BindFailed(#[source] std::io::Error),

    /// Failed to build the runtime or spawn the worker thread.
    #[error("Failed to start worker: {0}")]
    Runtime(#[source] std::io::Error),

    /// The worker thread panicked.
    #[error("Worker thread panicked")]
    WorkerPanicked,
}

/// State the worker owns.
struct Worker {
    service: Arc<Service>,
    running: Arc<AtomicBool>,
    auth: AuthConfig,
    accept_poll: Duration,
    read_timeout: Option<Duration>,
    max_request_bytes: usize,
}

impl Worker {
    /// Accept loop. Returns once the running flag is cleared.
    #[instrument(skip_all, fields(addr = ?listener.local_addr().ok()))]
    async fn run(self, listener: std::net::TcpListener) {
        let listener = match TcpListener::from_std(listener) {
            Ok(listener) => listener,
            Err(e) => {
                error!("Failed to register listener: {}", e);
                self.running.store(false, Ordering::Release);
                return;
            }
        };

        while self.running.load(Ordering::Acquire) {
            match timeout(self.accept_poll, listener.accept()).await {
                // poll interval elapsed, recheck the flag
                Err(_) => continue,
                Ok(Ok((stream, peer))) => self.handle_connection(stream, peer).await,
                Ok(Err(e)) => error!("Accept error: {}", e),
            }
        }

        info!("GSI ingestion stopped");
    }

    /// Serve one request on one connection, then close it.
    async fn handle_connection(&self, mut stream: TcpStream, peer: SocketAddr) {
        let read = read_request(&mut stream, self.max_request_bytes);
        let read = match self.read_timeout {
            Some(limit) => match timeout(limit, read).await {
                Ok(read) => read,
                Err(_) => {
                    debug!(%peer, "request read timed out");
                    return;
                }
            },
            None => read.await,
        };

        let outcome = read
            .map_err(Rejection::from)
            .and_then(|request| validate_request(&request, &self.auth));

        let status = match outcome {
            Ok(payload) => {
                let heartbeat = self.service.ingest(payload);
                debug!(%peer, heartbeat, "update merged");
                StatusCode::NoContent
            }
            Err(Rejection::Protocol(e)) if e.is_transport() => {
                debug!(%peer, error = %e, "connection dropped before a full request");
                return;
            }
            Err(rejection) => {
                warn!(%peer, status = rejection.status().as_u16(), "rejected request: {}", rejection);
                rejection.status()
            }
        };

        if let Err(e) = write_response(&mut stream, status).await {
            debug!(%peer, error = %e, "failed to write response");
        }
    }
}

async fn write_response(stream: &mut TcpStream, status: StatusCode) -> std::io::Result<()> {
    stream.write_all(encode_response(status).as_bytes()).await?;
    stream.shutdown().await
}

/// Running ingestion server.
///
/// Dropping the server stops it.
pub struct IngestionServer {
    service: Arc<Service>,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    local_addr: SocketAddr,
}

impl IngestionServer {
    /// Bind `127.0.0.1:port` and start the worker.
    ///
    /// A bind failure is reported here, before any thread is spawned.
    pub fn start(config: ServerConfig) -> Result<Self, ServerError> {
        let service = Arc::new(Service::new(PlayerFilter::parse(&config.filtered_players)));
        Self::start_with_service(config, service)
    }

    /// Start over an existing service, keeping its state and filter.
    /// `config.filtered_players` is ignored.
    pub fn start_with_service(config: ServerConfig, service: Arc<Service>) -> Result<Self, ServerError> {
        let bind_addr = SocketAddr::from((Ipv4Addr::LOCALHOST, config.port));
        let listener = std::net::TcpListener::bind(bind_addr).map_err(ServerError::BindFailed)?;
        listener.set_nonblocking(true).map_err(ServerError::BindFailed)?;
        let local_addr = listener.local_addr().map_err(ServerError::BindFailed)?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ServerError::Runtime)?;

        let running = Arc::new(AtomicBool::new(true));
        let worker = Worker {
            service: Arc::clone(&service),
            running: Arc::clone(&running),
            auth: config.auth,
            accept_poll: config.accept_poll,
            read_timeout: config.read_timeout,
            max_request_bytes: config.max_request_bytes,
        };

        let handle = std::thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || runtime.block_on(worker.run(listener)))
            .map_err(ServerError::Runtime)?;

        info!("GSI ingestion listening on {}", local_addr);

        Ok(Self {
            service,
            running,
            worker: Some(handle),
            local_addr,
        })
    }

    /// Clear the running flag and join the worker. Idempotent.
    pub fn stop(&mut self) -> Result<(), ServerError> {
        self.running.store(false, Ordering::Release);
        match self.worker.take() {
            Some(handle) => handle.join().map_err(|_| ServerError::WorkerPanicked),
            None => Ok(()),
        }
    }

    /// Whether the worker is still accepting.
    pub fn is_running(&self) -> bool {
        self.worker.is_some() && self.running.load(Ordering::Acquire)
    }

    /// Bound address (useful with port `0`).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Shared service, e.g. to hand to a restarted server.
    pub fn service(&self) -> Arc<Service> {
        Arc::clone(&self.service)
    }

    /// Number of merged updates.
    pub fn heartbeat(&self) -> u64 {
        self.service.heartbeat()
    }

    /// Replace the player filter; views are rebuilt immediately.
    pub fn set_filtered_players(&self, list: &str) {
        self.service.set_filtered_players(list);
    }

    /// Latest HUD view, `None` before the first update.
    pub fn try_get_hud_view(&self) -> Option<HudView> {
        self.service.try_get_hud_view()
    }

    /// Latest radar players, `None` before the first update.
    pub fn try_get_radar_players(&self) -> Option<Vec<RadarPlayer>> {
        self.service.try_get_radar_players()
    }

    /// Latest radar grenades, `None` before the first update.
    pub fn try_get_radar_grenades(&self) -> Option<Vec<RadarGrenade>> {
        self.service.try_get_radar_grenades()
    }

    /// Latest radar bomb, `None` before the first update.
    pub fn try_get_radar_bomb(&self) -> Option<RadarBomb> {
        self.service.try_get_radar_bomb()
    }

    /// Tracked smokes, `None` before the first update.
    pub fn try_get_smokes(&self) -> Option<Vec<SmokeStatus>> {
        self.service.try_get_smokes()
    }

    /// Current `map.name`.
    pub fn try_get_map_name(&self) -> Option<String> {
        self.service.try_get_map_name()
    }
}

impl Drop for IngestionServer {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            error!("Failed to stop ingestion server: {}", e);
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
