//! `DuelhubServer` builder and accept loop.
//!
//! Ties the layers together: transport, protocol, lobby, reaper. One
//! accept loop, one handler task per connection, one lobby mutex behind
//! everything.

use std::sync::Arc;

use tokio::sync::Mutex;

use duelhub_protocol::{Codec, JsonCodec};
use duelhub_room::{CardSource, Lobby, LobbyConfig, reaper};

use crate::DuelhubError;
use crate::auth::Authenticator;
use crate::handler::handle_connection;
use crate::transport::WsListener;

/// Shared server state handed to each connection handler task.
pub(crate) struct ServerState<S, A, C> {
    /// The one serialization point: every lifecycle event and every reaper
    /// sweep goes through this lock.
    pub(crate) lobby: Arc<Mutex<Lobby<S>>>,
    pub(crate) auth: A,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a duelhub server.
///
/// # Example
///
/// ```rust,ignore
/// use duelhub::prelude::*;
///
/// let server = DuelhubServer::builder()
///     .bind("0.0.0.0:8080")
///     .build(my_cards, my_auth)
///     .await?;
/// server.run().await
/// ```
pub struct DuelhubServerBuilder {
    bind_addr: String,
    lobby_config: LobbyConfig,
}

impl DuelhubServerBuilder {
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            lobby_config: LobbyConfig::default(),
        }
    }

    /// Sets the address to bind to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Overrides the lobby/reaper tunables.
    pub fn lobby_config(mut self, config: LobbyConfig) -> Self {
        self.lobby_config = config;
        self
    }

    /// Binds the listener and assembles the server.
    ///
    /// Uses [`JsonCodec`], matching the browser client.
    pub async fn build<S: CardSource>(
        self,
        cards: S,
        auth: impl Authenticator,
    ) -> Result<DuelhubServer<S, impl Authenticator, JsonCodec>, DuelhubError>
    {
        let listener = WsListener::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            lobby: Arc::new(Mutex::new(Lobby::new(
                cards,
                self.lobby_config,
            ))),
            auth,
            codec: JsonCodec,
        });

        Ok(DuelhubServer { listener, state })
    }
}

impl Default for DuelhubServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running duelhub server.
///
/// Call [`run()`](Self::run) to start the reaper and accept connections.
pub struct DuelhubServer<S, A, C> {
    listener: WsListener,
    state: Arc<ServerState<S, A, C>>,
}

impl<S, A, C> DuelhubServer<S, A, C>
where
    S: CardSource,
    A: Authenticator,
    C: Codec,
{
    pub fn builder() -> DuelhubServerBuilder {
        DuelhubServerBuilder::new()
    }

    /// The address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the server until the process is terminated.
    ///
    /// Spawns the reaper, then loops accepting connections and spawning a
    /// handler task for each.
    pub async fn run(mut self) -> Result<(), DuelhubError> {
        let sweep_interval =
            self.state.lobby.lock().await.config().sweep_interval;
        reaper::spawn(Arc::clone(&self.state.lobby), sweep_interval);

        tracing::info!("duelhub server running");

        loop {
            match self.listener.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await
                        {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
