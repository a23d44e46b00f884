//! `ScribbleServer` builder and server loop.
//!
//! This is the entry point for running a Scribble game server. It ties
//! together all the layers: transport → protocol → registry → room actors.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use scribble_protocol::{Codec, JsonCodec};
use scribble_room::{GameConfig, RoomRegistry, WordList, WordProvider};
use scribble_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::ScribbleError;
use crate::config::ServerConfig;
use crate::handler::handle_connection;

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The registry
/// lock is only taken for create, join, leave and kick.
pub(crate) struct ServerState<K: Codec> {
    pub(crate) registry: Mutex<RoomRegistry>,
    pub(crate) codec: K,
    pub(crate) config: ServerConfig,
}

/// Builder for configuring and starting a Scribble server.
///
/// # Example
///
/// ```rust,no_run
/// use scribble::prelude::*;
///
/// # async fn run() -> Result<(), ScribbleError> {
/// let server = ScribbleServer::builder()
///     .bind("0.0.0.0:3000")
///     .game_config(GameConfig {
///         total_rounds: 5,
///         ..GameConfig::default()
///     })
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct ScribbleServerBuilder {
    config: ServerConfig,
    game: GameConfig,
    words: Option<Arc<dyn WordProvider>>,
    seed: Option<u64>,
}

impl ScribbleServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            game: GameConfig::default(),
            words: None,
            seed: None,
        }
    }

    /// Replaces the process-level settings wholesale.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind = addr.to_string();
        self
    }

    /// Sets how long a silent connection survives.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    /// Sets the rules every room is created with.
    pub fn game_config(mut self, game: GameConfig) -> Self {
        self.game = game;
        self
    }

    /// Sets where round words come from. Defaults to the built-in list.
    pub fn words(mut self, words: impl WordProvider) -> Self {
        self.words = Some(Arc::new(words));
        self
    }

    /// Seeds room-code generation.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Binds the listener and builds the server.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<ScribbleServer<JsonCodec>, ScribbleError> {
        let transport = WebSocketTransport::bind(&self.config.bind).await?;

        let words = self
            .words
            .unwrap_or_else(|| Arc::new(WordList::default()));
        let mut registry = RoomRegistry::new(self.game, words);
        if let Some(seed) = self.seed {
            registry = registry.with_seed(seed);
        }

        let state = Arc::new(ServerState {
            registry: Mutex::new(registry),
            codec: JsonCodec,
            config: self.config,
        });

        Ok(ScribbleServer { transport, state })
    }
}

impl Default for ScribbleServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Scribble game server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct ScribbleServer<K: Codec = JsonCodec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<K>>,
}

impl ScribbleServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> ScribbleServerBuilder {
        ScribbleServerBuilder::new()
    }
}

impl<K: Codec> ScribbleServer<K> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Number of live rooms.
    pub async fn room_count(&self) -> usize {
        self.state.registry.lock().await.room_count()
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), ScribbleError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the accept loop until `shutdown` completes, then shuts down
    /// every room.
    ///
    /// Connection tasks already running are not waited for; their sockets
    /// close when the runtime stops.
    pub async fn run_until(
        mut self,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), ScribbleError> {
        tracing::info!(addr = ?self.transport.local_addr().ok(), "scribble server running");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(conn, state).await {
                                tracing::debug!(error = %e, "connection ended with error");
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
            }
        }

        tracing::info!("shutting down");
        let mut registry = self.state.registry.lock().await;
        let rooms = registry.room_count();
        registry.shutdown_all().await;
        tracing::info!(rooms, "all rooms shut down");
        Ok(())
    }
}
