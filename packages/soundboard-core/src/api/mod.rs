//! HTTP/WebSocket API layer.
//!
//! This module contains thin handlers that delegate to the catalog,
//! playback controller and client hub. It provides the router construction
//! and server startup functionality.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;

use crate::catalog::Catalog;
use crate::hub::ClientHub;
use crate::playback::PlaybackController;
use crate::state::Config;

pub mod http;
pub mod ws;

/// Errors that can occur when starting or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to a TCP port.
    #[error("Failed to bind to port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    /// The server stopped with an I/O error.
    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Shared application state for the API layer.
#[derive(Clone)]
pub struct AppState {
    /// Sound catalog.
    pub catalog: Arc<Catalog>,
    /// Controller for the single audio output.
    pub playback: Arc<PlaybackController>,
    /// Connected control clients.
    pub hub: Arc<ClientHub>,
    /// Application configuration.
    pub config: Arc<Config>,
}

/// Builder for constructing an `AppState`.
#[derive(Default)]
pub struct AppStateBuilder {
    catalog: Option<Arc<Catalog>>,
    playback: Option<Arc<PlaybackController>>,
    hub: Option<Arc<ClientHub>>,
    config: Option<Arc<Config>>,
}

impl AppStateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn catalog(mut self, catalog: Arc<Catalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn playback(mut self, playback: Arc<PlaybackController>) -> Self {
        self.playback = Some(playback);
        self
    }

    pub fn hub(mut self, hub: Arc<ClientHub>) -> Self {
        self.hub = Some(hub);
        self
    }

    pub fn config(mut self, config: Arc<Config>) -> Self {
        self.config = Some(config);
        self
    }

    /// Builds the `AppState`.
    ///
    /// The hub and config fall back to defaults; catalog and playback are
    /// required.
    ///
    /// # Panics
    ///
    /// Panics if the catalog or playback controller was not set.
    pub fn build(self) -> AppState {
        let config = self.config.unwrap_or_default();
        let hub = self
            .hub
            .unwrap_or_else(|| Arc::new(ClientHub::new(config.client_queue_capacity)));
        AppState {
            catalog: self.catalog.expect("catalog is required"),
            playback: self.playback.expect("playback is required"),
            hub,
            config,
        }
    }
}

impl AppState {
    /// Creates a new builder for constructing an `AppState`.
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder::new()
    }
}

/// Binds the configured port and serves until `shutdown` resolves.
///
/// Open control sessions are force-closed once shutdown begins so the
/// graceful drain does not wait on idle WebSockets.
pub async fn start_server<F>(state: AppState, shutdown: F) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let port = state.config.bind_port;
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind { port, source })?;

    let local = listener.local_addr()?;
    log::info!("Server listening on http://{}", local);

    let hub = Arc::clone(&state.hub);
    let app = http::create_router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            hub.close_all();
        })
        .await?;
    Ok(())
}
