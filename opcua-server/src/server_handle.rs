//! External handle to a running server: the pieces an embedder needs to
//! reach into live state or ask the server to stop, without holding the
//! `Server` itself (which is consumed by [`crate::server::Server::run`]).

use std::sync::Arc;

use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

use crate::info::ServerInfo;
use crate::session::SessionManager;
use crate::subscriptions::SubscriptionEngine;

#[derive(Clone)]
pub struct ServerHandle {
    info: Arc<ServerInfo>,
    sessions: Arc<RwLock<SessionManager>>,
    subscriptions: Arc<SubscriptionEngine>,
    token: CancellationToken,
}

impl ServerHandle {
    pub(crate) fn new(
        info: Arc<ServerInfo>,
        sessions: Arc<RwLock<SessionManager>>,
        subscriptions: Arc<SubscriptionEngine>,
        token: CancellationToken,
    ) -> Self {
        Self {
            info,
            sessions,
            subscriptions,
            token,
        }
    }

    pub fn info(&self) -> &Arc<ServerInfo> {
        &self.info
    }

    pub fn sessions(&self) -> &Arc<RwLock<SessionManager>> {
        &self.sessions
    }

    pub fn subscriptions(&self) -> &Arc<SubscriptionEngine> {
        &self.subscriptions
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Signal the server's accept loop and every live connection to stop.
    pub fn cancel(&self) {
        self.token.cancel();
    }
}
