//! User identity verification, separated from session lifecycle so an
//! embedder can swap in LDAP/database-backed checks without touching the
//! session manager.

use async_trait::async_trait;

use opcua_types::service_types::UserIdentityToken;
use opcua_types::StatusCode;

#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Validates a user identity token against whatever policy the
    /// embedder configures. `BadIdentityTokenInvalid` for a malformed
    /// token, `BadIdentityTokenRejected` / `BadUserAccessDenied` for a
    /// well-formed one the policy refuses.
    async fn authenticate(&self, token: &UserIdentityToken) -> Result<(), StatusCode>;
}

/// Accepts anonymous sessions and any username/password, useful for
/// tests and as the default when an embedder supplies nothing else.
/// Never use this for a production endpoint that advertises anything but
/// `SecurityPolicy::None`.
pub struct DefaultAuthenticator;

#[async_trait]
impl Authenticator for DefaultAuthenticator {
    async fn authenticate(&self, token: &UserIdentityToken) -> Result<(), StatusCode> {
        match token {
            UserIdentityToken::Anonymous { .. } => Ok(()),
            UserIdentityToken::UserName { user_name, .. } if !user_name.is_empty() => Ok(()),
            UserIdentityToken::UserName { .. } => Err(StatusCode::BadIdentityTokenInvalid),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn default_authenticator_accepts_anonymous() {
        let auth = DefaultAuthenticator;
        let result = auth
            .authenticate(&UserIdentityToken::Anonymous {
                policy_id: "anonymous".to_string(),
            })
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn default_authenticator_rejects_empty_username() {
        let auth = DefaultAuthenticator;
        let result = auth
            .authenticate(&UserIdentityToken::UserName {
                policy_id: "username".to_string(),
                user_name: String::new(),
                password: Vec::new(),
            })
            .await;
        assert!(result.is_err());
    }
}
