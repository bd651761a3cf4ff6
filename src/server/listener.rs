//! WebSocket server
//!
//! Accepts subscriber upgrades on the configured route and hands each
//! connection to a [`Session`].

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ws::{WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use futures_util::StreamExt;
use tokio::net::TcpListener;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::Result;
use crate::hub::Hub;
use crate::server::config::ServerConfig;
use crate::session::Session;

/// State shared by every upgrade request
#[derive(Clone)]
struct AppState {
    hub: Hub,
    allowed_origin: Arc<str>,
    connection_semaphore: Option<Arc<Semaphore>>,
}

/// Downstream WebSocket server
pub struct RelayServer {
    config: ServerConfig,
    state: AppState,
}

impl RelayServer {
    /// Create a new server delivering events from `hub`
    pub fn new(config: ServerConfig, hub: Hub) -> Self {
        let connection_semaphore = if config.max_connections > 0 {
            Some(Arc::new(Semaphore::new(config.max_connections)))
        } else {
            None
        };

        let state = AppState {
            hub,
            allowed_origin: Arc::from(config.allowed_origin.as_str()),
            connection_semaphore,
        };

        Self { config, state }
    }

    /// Routes served by this server
    pub fn router(&self) -> Router {
        Router::new()
            .route(&self.config.path, get(upgrade))
            .with_state(self.state.clone())
    }

    /// Run the server
    ///
    /// This method blocks until the server fails.
    pub async fn run(&self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::info!(
            addr = %listener.local_addr()?,
            path = %self.config.path,
            "WebSocket server listening"
        );

        let app = self
            .router()
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        Ok(())
    }
}

async fn upgrade(
    State(state): State<AppState>,
    ConnectInfo(peer_addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let origin = headers
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok());

    if origin != Some(&*state.allowed_origin) {
        tracing::warn!(peer = %peer_addr, origin = ?origin, "Connection rejected: origin not allowed");
        return StatusCode::FORBIDDEN.into_response();
    }

    // Check connection limit
    let permit = match &state.connection_semaphore {
        Some(sem) => match Arc::clone(sem).try_acquire_owned() {
            Ok(permit) => Some(permit),
            Err(_) => {
                tracing::warn!(peer = %peer_addr, "Connection rejected: limit reached");
                return StatusCode::SERVICE_UNAVAILABLE.into_response();
            }
        },
        None => None,
    };

    let hub = state.hub.clone();
    ws.on_failed_upgrade(move |e| {
        tracing::debug!(peer = %peer_addr, error = %e, "WebSocket upgrade failed");
    })
    .on_upgrade(move |socket| handle_socket(socket, hub, peer_addr, permit))
}

async fn handle_socket(
    socket: WebSocket,
    hub: Hub,
    peer_addr: SocketAddr,
    _permit: Option<OwnedSemaphorePermit>,
) {
    let session = Session::open(hub).await;
    let session_id = session.id();

    tracing::debug!(subscriber_id = session_id, peer = %peer_addr, "New connection");

    let (sink, source) = socket.split();
    session.run(sink, source).await;

    tracing::debug!(subscriber_id = session_id, "Connection closed");
}
