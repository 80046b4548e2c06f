use std::time::{Duration, Instant};

use opcua_crypto::{derive_keys, random_nonce, AesKey, DerivedKeys, SecurityPolicy};
use opcua_types::constants::{SEQUENCE_NUMBER_WRAP_LIMIT, SEQUENCE_NUMBER_WRAP_THRESHOLD, TOKEN_OVERLAP_PERCENT};
use opcua_types::StatusCode;

/// The secure channel's own lifecycle, independent of the TCP connection
/// it currently rides on: a channel can survive a reconnect (a new
/// connection presenting the same channel id and a valid token resumes
/// it), while a connection always belongs to at most one channel at a
/// time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Idle,
    Opening,
    Open,
    Renewing,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityTokenRequestType {
    Issue,
    Renew,
}

/// One side's derived key material for one token generation.
#[derive(Clone)]
pub struct TokenKeys {
    pub token_id: u32,
    pub client_keys: DerivedKeys,
    pub server_keys: DerivedKeys,
    pub created_at: Instant,
    pub lifetime: Duration,
}

impl TokenKeys {
    /// A token's keys remain valid until `overlap_percent` of its
    /// nominal lifetime has elapsed, not just its nominal lifetime,
    /// so in-flight traffic signed under an outgoing token during a
    /// renew is still verifiable for a grace window.
    fn expires_at(&self) -> Instant {
        let overlap_millis =
            self.lifetime.as_millis() as u64 * TOKEN_OVERLAP_PERCENT as u64 / 100;
        self.created_at + Duration::from_millis(overlap_millis)
    }

    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at()
    }
}

/// Tracks an OPC UA secure channel: its negotiated security policy, the
/// current and (while a renew's overlap window is live) previous token
/// key sets, and the monotonic per-direction sequence number state. At
/// most two token key sets are ever retained at once.
pub struct SecureChannel {
    pub channel_id: u32,
    pub security_policy: SecurityPolicy,
    pub state: ChannelState,
    current_token: Option<TokenKeys>,
    previous_token: Option<TokenKeys>,
    next_token_id: u32,
    send_sequence_number: u32,
    recv_sequence_number: Option<u32>,
    encrypting_key: Option<AesKey>,
    decrypting_key: Option<AesKey>,
}

impl SecureChannel {
    pub fn new(channel_id: u32, security_policy: SecurityPolicy) -> Self {
        Self {
            channel_id,
            security_policy,
            state: ChannelState::Idle,
            current_token: None,
            previous_token: None,
            next_token_id: 1,
            send_sequence_number: 0,
            recv_sequence_number: None,
            encrypting_key: None,
            decrypting_key: None,
        }
    }

    pub fn begin_open(&mut self) {
        self.state = ChannelState::Opening;
    }

    /// Issues or renews a token: derives fresh client/server key sets
    /// from the two nonces, rotates the previous token set out (dropping
    /// anything older than two generations), and moves the channel to
    /// `Open`.
    pub fn open_or_renew(
        &mut self,
        request_type: SecurityTokenRequestType,
        client_nonce: &[u8],
        server_nonce: &[u8],
        lifetime: Duration,
    ) {
        let client_keys = derive_keys(self.security_policy, server_nonce, client_nonce);
        let server_keys = derive_keys(self.security_policy, client_nonce, server_nonce);
        let token_id = self.next_token_id;
        self.next_token_id = self.next_token_id.wrapping_add(1).max(1);

        if matches!(request_type, SecurityTokenRequestType::Renew) {
            self.previous_token = self.current_token.take();
            self.state = ChannelState::Renewing;
        } else {
            self.state = ChannelState::Opening;
        }

        self.encrypting_key = if self.security_policy.is_encrypted() {
            Some(AesKey::new(self.security_policy, &server_keys.encrypting_key))
        } else {
            None
        };
        self.decrypting_key = if self.security_policy.is_encrypted() {
            Some(AesKey::new(self.security_policy, &client_keys.encrypting_key))
        } else {
            None
        };

        self.current_token = Some(TokenKeys {
            token_id,
            client_keys,
            server_keys,
            created_at: Instant::now(),
            lifetime,
        });
        self.state = ChannelState::Open;
    }

    pub fn generate_server_nonce(&self) -> Vec<u8> {
        if self.security_policy.is_encrypted() {
            random_nonce(32)
        } else {
            Vec::new()
        }
    }

    /// Looks up the token keys for an inbound `token_id`, accepting
    /// either the current or the still-within-overlap previous
    /// generation; anything else is a security check failure.
    pub fn token_keys_for(&self, token_id: u32) -> Result<&TokenKeys, StatusCode> {
        let now = Instant::now();
        if let Some(current) = &self.current_token {
            if current.token_id == token_id {
                return Ok(current);
            }
        }
        if let Some(previous) = &self.previous_token {
            if previous.token_id == token_id && !previous.is_expired(now) {
                return Ok(previous);
            }
        }
        Err(StatusCode::BadSecurityChecksFailed)
    }

    pub fn current_token_id(&self) -> Option<u32> {
        self.current_token.as_ref().map(|t| t.token_id)
    }

    pub fn encrypting_key(&self) -> Option<&AesKey> {
        self.encrypting_key.as_ref()
    }

    pub fn decrypting_key(&self) -> Option<&AesKey> {
        self.decrypting_key.as_ref()
    }

    /// Allocates the next outgoing sequence number, wrapping from the
    /// documented threshold back to 1 (never 0).
    pub fn next_send_sequence_number(&mut self) -> u32 {
        let next = if self.send_sequence_number >= SEQUENCE_NUMBER_WRAP_THRESHOLD {
            1
        } else {
            self.send_sequence_number + 1
        };
        self.send_sequence_number = next;
        next
    }

    /// Validates an inbound sequence number against the last one seen:
    /// it must either be exactly one more, or be the single legal wrap
    /// (previous number was at/after the wrap threshold and the new
    /// number is small). Anything else is `BadSequenceNumberInvalid`.
    pub fn validate_recv_sequence_number(&mut self, sequence_number: u32) -> Result<(), StatusCode> {
        if let Some(last) = self.recv_sequence_number {
            let wrapped = last >= SEQUENCE_NUMBER_WRAP_THRESHOLD
                && sequence_number > 0
                && sequence_number < SEQUENCE_NUMBER_WRAP_LIMIT;
            let incremented = sequence_number == last.wrapping_add(1);
            if !wrapped && !incremented {
                return Err(StatusCode::BadSequenceNumberInvalid);
            }
        }
        self.recv_sequence_number = Some(sequence_number);
        Ok(())
    }

    pub fn close(&mut self) {
        self.state = ChannelState::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel() -> SecureChannel {
        SecureChannel::new(1, SecurityPolicy::None)
    }

    #[test]
    fn sequence_numbers_must_increment() {
        let mut c = channel();
        c.validate_recv_sequence_number(1).unwrap();
        c.validate_recv_sequence_number(2).unwrap();
        assert!(c.validate_recv_sequence_number(2).is_err());
        assert!(c.validate_recv_sequence_number(10).is_err());
    }

    #[test]
    fn sequence_numbers_wrap_near_the_documented_threshold() {
        let mut c = channel();
        c.validate_recv_sequence_number(SEQUENCE_NUMBER_WRAP_THRESHOLD).unwrap();
        c.validate_recv_sequence_number(1).unwrap();
    }

    #[test]
    fn open_or_renew_moves_channel_to_open_and_keeps_previous_token_alive() {
        let mut c = SecureChannel::new(7, SecurityPolicy::Basic256Sha256);
        c.open_or_renew(
            SecurityTokenRequestType::Issue,
            b"client-nonce-aaaaaaaaaaaaaaaaaaaa",
            b"server-nonce-aaaaaaaaaaaaaaaaaaaa",
            Duration::from_secs(3600),
        );
        assert_eq!(c.state, ChannelState::Open);
        let first_token = c.current_token_id().unwrap();

        c.open_or_renew(
            SecurityTokenRequestType::Renew,
            b"client-nonce-bbbbbbbbbbbbbbbbbbbb",
            b"server-nonce-bbbbbbbbbbbbbbbbbbbb",
            Duration::from_secs(3600),
        );
        assert_eq!(c.state, ChannelState::Open);
        assert!(c.token_keys_for(first_token).is_ok());
        assert_ne!(c.current_token_id().unwrap(), first_token);
    }
}
