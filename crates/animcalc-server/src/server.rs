//! HTTP server for the calculation API and the calculator page.
//!
//! Startup is split in two stages so callers can tell when the service is
//! reachable: [`Server::bind`] opens the listener (connections are accepted
//! from that point on) and [`BoundServer::serve`] drives the router until a
//! shutdown future resolves. [`Server::spawn`] runs both stages in the
//! background and returns once the listener answers.

use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::routing::{get, post};
use axum::Router;
use chrono::{DateTime, Utc};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use animcalc_core::{Error, Result};
use animcalc_telemetry::CalculationMetrics;

use crate::handlers;
use crate::readiness::wait_until_ready;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(10);

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address.
    pub addr: SocketAddr,
    /// Enable CORS.
    pub cors: bool,
    /// How long [`Server::spawn`] waits for the listener to answer.
    pub ready_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            cors: true,
            ready_timeout: DEFAULT_READY_TIMEOUT,
        }
    }
}

impl ServerConfig {
    /// Creates a new server config builder.
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }
}

/// Builder for ServerConfig.
#[derive(Debug, Default)]
pub struct ServerConfigBuilder {
    addr: Option<SocketAddr>,
    cors: Option<bool>,
    ready_timeout: Option<Duration>,
}

impl ServerConfigBuilder {
    /// Sets the listen address.
    pub fn addr(mut self, addr: SocketAddr) -> Self {
        self.addr = Some(addr);
        self
    }

    /// Sets whether CORS is enabled.
    pub fn cors(mut self, enabled: bool) -> Self {
        self.cors = Some(enabled);
        self
    }

    /// Sets the readiness timeout used by [`Server::spawn`].
    pub fn ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout = Some(timeout);
        self
    }

    /// Builds the server config.
    pub fn build(self) -> ServerConfig {
        let defaults = ServerConfig::default();
        ServerConfig {
            addr: self.addr.unwrap_or(defaults.addr),
            cors: self.cors.unwrap_or(defaults.cors),
            ready_timeout: self.ready_timeout.unwrap_or(defaults.ready_timeout),
        }
    }
}

/// Per-server state shared by the handlers.
///
/// Nothing here feeds back into a calculation; it only records what was served.
pub struct AppState {
    /// Calculation counters.
    pub metrics: CalculationMetrics,
    /// Server start time.
    pub start_time: Instant,
    /// Wall-clock start time, reported by `/api/status`.
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Creates fresh state.
    pub fn new() -> Self {
        Self {
            metrics: CalculationMetrics::new(),
            start_time: Instant::now(),
            started_at: Utc::now(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// The HTTP server.
pub struct Server {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl Server {
    /// Creates a new server with the given configuration.
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            state: Arc::new(AppState::new()),
        }
    }

    /// Creates the router.
    pub fn router(&self) -> Router {
        let mut router = Router::new()
            .route("/", get(handlers::index))
            .route("/static/script.js", get(handlers::script))
            .route("/health", get(handlers::health))
            .route("/calculate", post(handlers::calculate))
            .route("/api/status", get(handlers::server_status))
            .with_state(self.state.clone());

        router = router
            .layer(CatchPanicLayer::custom(handlers::handle_panic))
            .layer(TraceLayer::new_for_http());

        if self.config.cors {
            router = router.layer(CorsLayer::permissive());
        }

        router
    }

    /// Binds the listener. Connections are accepted once this returns.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn bind(self) -> Result<BoundServer> {
        let router = self.router();
        let listener = TcpListener::bind(self.config.addr).await?;
        let addr = listener.local_addr()?;

        tracing::info!(addr = %addr, "Listener bound");

        Ok(BoundServer {
            listener,
            router,
            addr,
        })
    }

    /// Runs the server until Ctrl+C or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cannot start.
    pub async fn run(self) -> Result<()> {
        let bound = self.bind().await?;

        tracing::info!(addr = %bound.local_addr(), "Starting Animcalc server");
        eprintln!(
            "\n\x1b[32m✓\x1b[0m Animation Calculator listening on {}",
            bound.base_url()
        );
        eprintln!("  Press Ctrl+C to stop\n");

        bound.serve(shutdown_signal()).await?;

        tracing::info!("Server shutdown complete");
        eprintln!("\x1b[32m✓\x1b[0m Server stopped");

        Ok(())
    }

    /// Starts the server on a background task and waits until it accepts
    /// connections.
    ///
    /// # Errors
    ///
    /// Returns an error if binding fails or the listener does not answer
    /// within the configured readiness timeout.
    pub async fn spawn(self) -> Result<RunningServer> {
        let ready_timeout = self.config.ready_timeout;
        let bound = self.bind().await?;
        let addr = bound.local_addr();

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(bound.serve(async move {
            let _ = shutdown_rx.await;
        }));

        let running = RunningServer {
            addr,
            shutdown_tx: Some(shutdown_tx),
            handle,
        };

        if let Err(e) = wait_until_ready(addr, ready_timeout).await {
            // Stop the task before reporting so nothing keeps the port.
            let _ = running.shutdown().await;
            return Err(e);
        }

        Ok(running)
    }
}

/// A server whose listener is bound but not yet serving.
pub struct BoundServer {
    listener: TcpListener,
    router: Router,
    addr: SocketAddr,
}

impl BoundServer {
    /// Returns the address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Returns an `http://` URL a local client can open.
    pub fn base_url(&self) -> String {
        base_url(self.addr)
    }

    /// Serves requests until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns an error if the accept loop fails.
    pub async fn serve<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| Error::internal(e.to_string()))
    }
}

/// A server running on a background task.
pub struct RunningServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<Result<()>>,
}

impl RunningServer {
    /// Returns the bound address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Returns an `http://` URL a local client can open.
    pub fn base_url(&self) -> String {
        base_url(self.addr)
    }

    /// Requests a graceful shutdown and waits for the task to finish.
    ///
    /// # Errors
    ///
    /// Returns the serve loop's error, or an internal error if the task panicked.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        self.handle
            .await
            .map_err(|e| Error::internal(format!("server task failed: {e}")))?
    }
}

/// Maps wildcard bind addresses to the matching loopback address.
pub(crate) fn connectable(addr: SocketAddr) -> SocketAddr {
    match addr.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => {
            SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), addr.port())
        },
        IpAddr::V6(ip) if ip.is_unspecified() => {
            SocketAddr::new(IpAddr::V6(Ipv6Addr::LOCALHOST), addr.port())
        },
        _ => addr,
    }
}

fn base_url(addr: SocketAddr) -> String {
    format!("http://{}", connectable(addr))
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            eprintln!("\n\x1b[33m⚡\x1b[0m Received Ctrl+C, shutting down gracefully...");
        },
        () = terminate => {
            eprintln!("\n\x1b[33m⚡\x1b[0m Received SIGTERM, shutting down gracefully...");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_builder() {
        let config = ServerConfig::builder()
            .addr("127.0.0.1:3000".parse().unwrap())
            .cors(false)
            .ready_timeout(Duration::from_secs(2))
            .build();

        assert_eq!(config.addr, "127.0.0.1:3000".parse().unwrap());
        assert!(!config.cors);
        assert_eq!(config.ready_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_server_config_defaults() {
        let config = ServerConfig::builder().build();
        assert_eq!(config.addr, "0.0.0.0:5000".parse().unwrap());
        assert!(config.cors);
        assert_eq!(config.ready_timeout, DEFAULT_READY_TIMEOUT);
    }

    #[test]
    fn test_connectable() {
        assert_eq!(
            connectable("0.0.0.0:5000".parse().unwrap()),
            "127.0.0.1:5000".parse().unwrap()
        );
        assert_eq!(
            connectable("[::]:80".parse().unwrap()),
            "[::1]:80".parse().unwrap()
        );
        assert_eq!(
            connectable("10.1.2.3:8080".parse().unwrap()),
            "10.1.2.3:8080".parse().unwrap()
        );
        assert_eq!(
            base_url("0.0.0.0:5000".parse().unwrap()),
            "http://127.0.0.1:5000"
        );
    }

    #[tokio::test]
    async fn test_bind_reports_ephemeral_port() {
        let server = Server::new(
            ServerConfig::builder()
                .addr("127.0.0.1:0".parse().unwrap())
                .build(),
        );
        let bound = server.bind().await.unwrap();
        assert_ne!(bound.local_addr().port(), 0);
        assert!(bound.base_url().starts_with("http://127.0.0.1:"));
    }

    #[tokio::test]
    async fn test_spawn_and_shutdown() {
        let server = Server::new(
            ServerConfig::builder()
                .addr("127.0.0.1:0".parse().unwrap())
                .build(),
        );
        let running = server.spawn().await.unwrap();
        let addr = running.addr();

        tokio::net::TcpStream::connect(addr).await.unwrap();

        running.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_bind_conflict_is_io_error() {
        let first = Server::new(
            ServerConfig::builder()
                .addr("127.0.0.1:0".parse().unwrap())
                .build(),
        )
        .bind()
        .await
        .unwrap();

        let second = Server::new(ServerConfig::builder().addr(first.local_addr()).build())
            .bind()
            .await;

        assert!(matches!(second, Err(Error::Io(_))));
    }
}
