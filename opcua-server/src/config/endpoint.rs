use serde::{Deserialize, Serialize};

use opcua_types::service_types::{MessageSecurityMode, UserTokenPolicy, UserTokenType};

/// One entry of the server's static endpoint table, returned verbatim by
/// `GetEndpoints`. Discovery beyond serving this fixed list is explicitly
/// out of scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub path: String,
    pub security_policy_uri: String,
    #[serde(with = "security_mode_serde")]
    pub security_mode: MessageSecurityMode,
    #[serde(default = "default_user_token_ids")]
    pub user_token_ids: Vec<String>,
}

fn default_user_token_ids() -> Vec<String> {
    vec!["anonymous".to_string()]
}

impl EndpointConfig {
    pub fn user_token_policies(&self) -> Vec<UserTokenPolicy> {
        self.user_token_ids
            .iter()
            .map(|id| match id.as_str() {
                "username" => UserTokenPolicy {
                    policy_id: id.clone(),
                    token_type: UserTokenType::UserName,
                    security_policy_uri: None,
                },
                "certificate" => UserTokenPolicy {
                    policy_id: id.clone(),
                    token_type: UserTokenType::Certificate,
                    security_policy_uri: None,
                },
                _ => UserTokenPolicy {
                    policy_id: id.clone(),
                    token_type: UserTokenType::Anonymous,
                    security_policy_uri: None,
                },
            })
            .collect()
    }
}

mod security_mode_serde {
    use super::MessageSecurityMode;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(mode: &MessageSecurityMode, s: S) -> Result<S::Ok, S::Error> {
        let name = match mode {
            MessageSecurityMode::Invalid => "Invalid",
            MessageSecurityMode::None => "None",
            MessageSecurityMode::Sign => "Sign",
            MessageSecurityMode::SignAndEncrypt => "SignAndEncrypt",
        };
        name.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<MessageSecurityMode, D::Error> {
        let name = String::deserialize(d)?;
        Ok(match name.as_str() {
            "None" => MessageSecurityMode::None,
            "Sign" => MessageSecurityMode::Sign,
            "SignAndEncrypt" => MessageSecurityMode::SignAndEncrypt,
            _ => MessageSecurityMode::Invalid,
        })
    }
}
