use std::time::{Duration, Instant};

use opcua_types::basic::ByteString;
use opcua_types::node_id::NodeId;
use opcua_types::service_types::UserIdentityToken;

/// A logical, user-authenticated context that owns subscriptions and can
/// migrate across secure channels. Created by `CreateSession`, usable for
/// nothing but `ActivateSession`/`CloseSession` until activated.
pub struct Session {
    pub session_id: NodeId,
    pub authentication_token: ByteString,
    pub session_name: String,
    pub channel_id: Option<u32>,
    pub timeout: Duration,
    pub activated: bool,
    pub user_identity: Option<UserIdentityToken>,
    pub last_server_nonce: Vec<u8>,
    pub subscription_ids: Vec<u32>,
    pub last_seen: Instant,
}

impl Session {
    pub fn create(
        session_id: NodeId,
        authentication_token: ByteString,
        session_name: String,
        channel_id: u32,
        timeout: Duration,
        server_nonce: Vec<u8>,
    ) -> Self {
        Self {
            session_id,
            authentication_token,
            session_name,
            channel_id: Some(channel_id),
            timeout,
            activated: false,
            user_identity: None,
            last_server_nonce: server_nonce,
            subscription_ids: Vec::new(),
            last_seen: Instant::now(),
        }
    }

    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.last_seen) > self.timeout
    }

    pub fn activate(&mut self, user_identity: UserIdentityToken, server_nonce: Vec<u8>) {
        self.activated = true;
        self.user_identity = Some(user_identity);
        self.last_server_nonce = server_nonce;
    }

    pub fn rebind(&mut self, channel_id: u32) {
        self.channel_id = Some(channel_id);
    }

    pub fn detach(&mut self) {
        self.channel_id = None;
    }

    pub fn add_subscription(&mut self, subscription_id: u32) {
        self.subscription_ids.push(subscription_id);
    }

    pub fn remove_subscription(&mut self, subscription_id: u32) {
        self.subscription_ids.retain(|id| *id != subscription_id);
    }
}
