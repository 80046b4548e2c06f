use std::sync::Arc;
use std::time::{Duration, Instant};

use hashbrown::HashMap;
use parking_lot::RwLock;

use opcua_core::AtomicHandle;
use opcua_crypto::random_byte_string;
use opcua_types::basic::ByteString;
use opcua_types::node_id::NodeId;
use opcua_types::service_types::UserIdentityToken;
use opcua_types::StatusCode;

use super::session::Session;
use crate::config::Limits;

/// Owns every live `Session`, indexed both by session id and by
/// authentication token so the dispatcher can bind an inbound request to
/// its session in one lookup. A session outlives the channel it was
/// created on; only `close_session`/timeout remove it from here.
pub struct SessionManager {
    sessions: HashMap<NodeId, Arc<RwLock<Session>>>,
    by_token: HashMap<Vec<u8>, NodeId>,
    max_sessions: usize,
}

impl SessionManager {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: HashMap::new(),
            by_token: HashMap::new(),
            max_sessions,
        }
    }

    pub fn find_by_token(&self, token: &ByteString) -> Option<Arc<RwLock<Session>>> {
        let bytes = token.0.as_ref()?;
        let session_id = self.by_token.get(bytes)?;
        self.sessions.get(session_id).cloned()
    }

    pub fn get(&self, session_id: &NodeId) -> Option<Arc<RwLock<Session>>> {
        self.sessions.get(session_id).cloned()
    }

    /// Allocates a session id and a random ≥32-byte authentication token,
    /// stores the session in `CreateSession`'s "not yet activated" state.
    pub fn create_session(
        &mut self,
        session_id_handle: &AtomicHandle,
        session_name: String,
        channel_id: u32,
        requested_timeout_ms: f64,
        limits: &Limits,
    ) -> Result<(Arc<RwLock<Session>>, Vec<u8>), StatusCode> {
        if self.sessions.len() >= self.max_sessions {
            return Err(StatusCode::BadTooManySessions);
        }
        let clamped_ms = requested_timeout_ms
            .max(limits.min_session_timeout_ms)
            .min(limits.max_session_timeout_ms);
        let timeout = Duration::from_millis(clamped_ms as u64);

        let session_id = NodeId::new(1, session_id_handle.next());
        let auth_token_bytes = random_byte_string(32);
        let server_nonce = random_byte_string(32);

        let session = Session::create(
            session_id.clone(),
            ByteString(Some(auth_token_bytes.clone())),
            session_name,
            channel_id,
            timeout,
            server_nonce.clone(),
        );
        let session = Arc::new(RwLock::new(session));
        self.sessions.insert(session_id.clone(), session.clone());
        self.by_token.insert(auth_token_bytes, session_id);
        Ok((session, server_nonce))
    }

    /// Detaches every session currently bound to `channel_id`. Called by
    /// the connection supervisor when a transport closes: the session
    /// itself survives (it may still be rebound by a later
    /// `ActivateSession` on a new channel within its timeout), only the
    /// now-dead channel binding is cleared.
    pub fn detach_channel(&mut self, channel_id: u32) {
        for session in self.sessions.values() {
            let mut session = session.write();
            if session.channel_id == Some(channel_id) {
                session.detach();
            }
        }
    }

    pub fn remove(&mut self, session_id: &NodeId) -> Option<Arc<RwLock<Session>>> {
        let session = self.sessions.remove(session_id)?;
        if let Some(bytes) = session.read().authentication_token.0.clone() {
            self.by_token.remove(&bytes);
        }
        Some(session)
    }

    /// Returns the next expiry deadline across all sessions (for a timer
    /// to sleep until) and the ids of sessions already past their
    /// timeout, without mutating anything — the caller decides whether
    /// to actually expire them.
    pub fn check_session_expiry(&self, now: Instant) -> (Option<Instant>, Vec<NodeId>) {
        let mut next_deadline = None;
        let mut expired = Vec::new();
        for (id, session) in &self.sessions {
            let session = session.read();
            if session.is_expired(now) {
                expired.push(id.clone());
            } else {
                let deadline = session.last_seen + session.timeout;
                next_deadline = Some(match next_deadline {
                    Some(d) if d < deadline => d,
                    _ => deadline,
                });
            }
        }
        (next_deadline, expired)
    }
}

/// Validates the client signature and identity token, marks the session
/// activated, and (re)binds it to the channel the request arrived on —
/// this is the step that lets a session survive a channel reopen: the
/// same authentication token, presented on a different channel, simply
/// rebinds.
pub fn activate_session(
    session: &Arc<RwLock<Session>>,
    channel_id: u32,
    user_identity: UserIdentityToken,
) -> Vec<u8> {
    let server_nonce = random_byte_string(32);
    let mut session = session.write();
    session.rebind(channel_id);
    session.activate(user_identity, server_nonce.clone());
    session.touch();
    server_nonce
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> Limits {
        Limits::default()
    }

    #[test]
    fn create_session_respects_max_sessions() {
        let mut manager = SessionManager::new(1);
        let handle = AtomicHandle::new(1);
        assert!(manager
            .create_session(&handle, "a".to_string(), 1, 60_000.0, &limits())
            .is_ok());
        assert!(matches!(
            manager
                .create_session(&handle, "b".to_string(), 1, 60_000.0, &limits())
                .unwrap_err(),
            StatusCode::BadTooManySessions
        ));
    }

    #[test]
    fn find_by_token_round_trips() {
        let mut manager = SessionManager::new(10);
        let handle = AtomicHandle::new(1);
        let (session, _nonce) = manager
            .create_session(&handle, "a".to_string(), 1, 60_000.0, &limits())
            .unwrap();
        let token = session.read().authentication_token.clone();
        assert!(manager.find_by_token(&token).is_some());
    }

    #[test]
    fn session_timeout_is_clamped_to_limits() {
        let mut manager = SessionManager::new(10);
        let handle = AtomicHandle::new(1);
        let (session, _nonce) = manager
            .create_session(&handle, "a".to_string(), 1, 1.0, &limits())
            .unwrap();
        let timeout = session.read().timeout;
        assert_eq!(timeout.as_millis() as f64, limits().min_session_timeout_ms);
    }
}
