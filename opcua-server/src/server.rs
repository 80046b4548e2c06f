//! The connection supervisor: binds the listening socket, accepts
//! connections and spawns one task per connection, and drives the two
//! periodic background jobs every live session and subscription depend
//! on — the subscription engine's publish tick and the session
//! expiry sweep. Node storage, authentication policy, and the service
//! type table are all supplied by the embedder through [`ServerBuilder`].

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use log::{debug, error, info, warn};
use parking_lot::RwLock;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use opcua_core::config::{Config, ConfigError};
use opcua_core::ServiceCodec;

use crate::address_space::{AddressSpace, InMemoryAddressSpace};
use crate::authenticator::{Authenticator, DefaultAuthenticator};
use crate::config::ServerConfig;
use crate::dispatcher::{now_wire, MessageDispatcher};
use crate::info::ServerInfo;
use crate::server_handle::ServerHandle;
use crate::session::SessionManager;
use crate::subscriptions::SubscriptionEngine;

/// Assembles a [`Server`] from its configuration and the three seams an
/// embedder plugs in: where nodes live, how identity tokens are
/// checked, and how `MSG` bodies turn into typed requests/responses.
pub struct ServerBuilder {
    config: ServerConfig,
    server_certificate: Option<Vec<u8>>,
    address_space: Option<Arc<dyn AddressSpace>>,
    authenticator: Option<Arc<dyn Authenticator>>,
    codec: Option<Arc<dyn ServiceCodec>>,
}

impl ServerBuilder {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            server_certificate: None,
            address_space: None,
            authenticator: None,
            codec: None,
        }
    }

    pub fn server_certificate(mut self, der: Vec<u8>) -> Self {
        self.server_certificate = Some(der);
        self
    }

    pub fn address_space(mut self, address_space: Arc<dyn AddressSpace>) -> Self {
        self.address_space = Some(address_space);
        self
    }

    pub fn authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticator = Some(authenticator);
        self
    }

    pub fn codec(mut self, codec: Arc<dyn ServiceCodec>) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Validates the configuration and assembles the server. The
    /// returned [`ServerHandle`] stays usable after [`Server::run`]
    /// takes ownership of the `Server` itself.
    pub fn build(self) -> Result<(Server, ServerHandle), ConfigError> {
        self.config.validate()?;

        let codec = self.codec.ok_or_else(|| {
            ConfigError::Invalid("server builder requires a service codec".to_string())
        })?;
        let address_space = self
            .address_space
            .unwrap_or_else(|| Arc::new(InMemoryAddressSpace::default()));
        let authenticator = self
            .authenticator
            .unwrap_or_else(|| Arc::new(DefaultAuthenticator));

        let max_sessions = self.config.limits.max_sessions;
        let subscription_tick_interval = Duration::from_millis(self.config.subscription_tick_interval_ms);
        let session_check_interval = Duration::from_millis(self.config.session_check_interval_ms);

        let info = ServerInfo::new(
            self.config,
            self.server_certificate,
            address_space,
            authenticator,
            codec,
        );
        let sessions = Arc::new(RwLock::new(SessionManager::new(max_sessions)));
        let subscriptions = Arc::new(SubscriptionEngine::new(&info.config.limits));
        let token = CancellationToken::new();

        let handle = ServerHandle::new(
            info.clone(),
            sessions.clone(),
            subscriptions.clone(),
            token.clone(),
        );

        let dispatcher = Arc::new(MessageDispatcher {
            info: info.clone(),
            sessions: sessions.clone(),
            subscriptions: subscriptions.clone(),
        });

        Ok((
            Server {
                info,
                dispatcher,
                sessions,
                subscriptions,
                token,
                subscription_tick_interval,
                session_check_interval,
            },
            handle,
        ))
    }
}

/// Owns the accept loop and the background timers; consumed by
/// [`Server::run`], which is why an embedder holds onto a
/// [`ServerHandle`] from [`ServerBuilder::build`] rather than the
/// `Server` itself for anything that must outlive the run call.
pub struct Server {
    info: Arc<ServerInfo>,
    dispatcher: Arc<MessageDispatcher>,
    sessions: Arc<RwLock<SessionManager>>,
    subscriptions: Arc<SubscriptionEngine>,
    token: CancellationToken,
    subscription_tick_interval: Duration,
    session_check_interval: Duration,
}

impl Server {
    /// Binds the configured host/port and runs until the handle's
    /// cancellation token fires. Port `0` binds an ephemeral port; the
    /// resolved address is logged and returned once bound.
    pub async fn run(self) -> Result<(), std::io::Error> {
        let addr = format!("{}:{}", self.info.config.host, self.info.config.port);
        let listener = TcpListener::bind(&addr).await?;
        let local_addr = listener.local_addr()?;
        info!("opc.tcp server listening on {}", local_addr);
        self.run_with(listener).await;
        Ok(())
    }

    /// Runs the accept loop against an already-bound listener. Split out
    /// from [`Server::run`] so tests can bind an ephemeral port and read
    /// back the resolved address before connecting.
    pub async fn run_with(self, listener: TcpListener) {
        let mut connections: FuturesUnordered<JoinHandle<()>> = FuturesUnordered::new();

        let mut subscription_tick = tokio::time::interval(self.subscription_tick_interval);
        subscription_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        let mut next_session_check = Instant::now() + self.session_check_interval;

        loop {
            let next_conn: std::pin::Pin<Box<dyn std::future::Future<Output = Option<Result<(), tokio::task::JoinError>>> + Send>> =
                if connections.is_empty() {
                    Box::pin(std::future::pending())
                } else {
                    Box::pin(connections.next())
                };

            tokio::select! {
                biased;
                _ = self.token.cancelled() => {
                    debug!("server shutting down, waiting for {} connections", connections.len());
                    break;
                }
                accepted = listener.accept() => {
                    match accepted {
                        Ok((socket, peer)) => {
                            debug!("accepted connection from {}", peer);
                            let info = self.info.clone();
                            let dispatcher = self.dispatcher.clone();
                            let token = self.token.clone();
                            connections.push(tokio::spawn(async move {
                                crate::connection::run(socket, info, dispatcher, token).await;
                            }));
                        }
                        Err(e) => {
                            warn!("failed to accept connection: {}", e);
                        }
                    }
                }
                _ = subscription_tick.tick() => {
                    self.subscriptions.periodic_tick(now_wire());
                    self.subscriptions.sample_due_items(self.info.address_space.as_ref()).await;
                }
                _ = tokio::time::sleep_until(next_session_check.into()) => {
                    let expired = {
                        let sessions = self.sessions.read();
                        sessions.check_session_expiry(Instant::now()).1
                    };
                    if !expired.is_empty() {
                        let mut sessions = self.sessions.write();
                        for session_id in &expired {
                            sessions.remove(session_id);
                            self.subscriptions.delete_all_for_session(session_id);
                        }
                    }
                    next_session_check = Instant::now() + self.session_check_interval;
                }
                finished = next_conn => {
                    if let Some(Err(e)) = finished {
                        error!("connection task panicked: {}", e);
                    }
                }
            }
        }

        for conn in connections.iter() {
            conn.abort();
        }
        while connections.next().await.is_some() {}
    }

    pub fn local_listen_addr(&self) -> SocketAddr {
        SocketAddr::new(
            self.info.config.host.parse().unwrap_or_else(|_| [0, 0, 0, 0].into()),
            self.info.config.port,
        )
    }
}
