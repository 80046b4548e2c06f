pub mod endpoint;
pub mod limits;

use serde::{Deserialize, Serialize};

use opcua_core::config::{Config, ConfigError};
pub use endpoint::EndpointConfig;
pub use limits::{Limits, OperationalLimits, SubscriptionLimits};

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    4840
}
fn default_hello_timeout_ms() -> u64 {
    opcua_types::constants::DEFAULT_HELLO_TIMEOUT_MS as u64
}
fn default_receive_buffer_size() -> u32 {
    opcua_types::constants::DEFAULT_RECEIVE_BUFFER_SIZE
}
fn default_send_buffer_size() -> u32 {
    opcua_types::constants::DEFAULT_SEND_BUFFER_SIZE
}
fn default_max_message_size() -> u32 {
    opcua_types::constants::DEFAULT_MAX_MESSAGE_SIZE
}
fn default_max_chunk_count() -> u32 {
    opcua_types::constants::DEFAULT_MAX_CHUNK_COUNT
}
fn default_send_buffer_high_watermark() -> usize {
    16 * 1024 * 1024
}
fn default_shutdown_grace_period_ms() -> u64 {
    2_000
}
fn default_subscription_tick_interval_ms() -> u64 {
    100
}
fn default_session_check_interval_ms() -> u64 {
    1_000
}
fn default_application_name() -> String {
    "opcua server".to_string()
}
fn default_application_uri() -> String {
    "urn:opcua:server".to_string()
}
fn default_product_uri() -> String {
    "urn:opcua:server:product".to_string()
}

/// The full set of configurable knobs named in the external-interfaces
/// section: listen address, certificate paths, security policies, TCP
/// framing limits, and the subscription/session limits from
/// [`limits`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    /// 0 means an ephemeral port; the resolved port is surfaced by the
    /// connection supervisor once the listener is bound.
    #[serde(default = "default_port")]
    pub port: u16,
    pub certificate_path: Option<String>,
    pub private_key_path: Option<String>,
    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,
    #[serde(default = "default_hello_timeout_ms")]
    pub hello_timeout_ms: u64,
    #[serde(default = "default_receive_buffer_size")]
    pub receive_buffer_size: u32,
    #[serde(default = "default_send_buffer_size")]
    pub send_buffer_size: u32,
    #[serde(default = "default_max_message_size")]
    pub max_message_size: u32,
    #[serde(default = "default_max_chunk_count")]
    pub max_chunk_count: u32,
    #[serde(default = "default_send_buffer_high_watermark")]
    pub send_buffer_high_watermark: usize,
    #[serde(default = "default_shutdown_grace_period_ms")]
    pub shutdown_grace_period_ms: u64,
    /// How often the subscription engine drives `periodic_tick` and
    /// samples due monitored items.
    #[serde(default = "default_subscription_tick_interval_ms")]
    pub subscription_tick_interval_ms: u64,
    /// How often the session manager sweeps for expired sessions.
    #[serde(default = "default_session_check_interval_ms")]
    pub session_check_interval_ms: u64,
    #[serde(default)]
    pub limits: Limits,
    #[serde(default = "default_application_name")]
    pub application_name: String,
    #[serde(default = "default_application_uri")]
    pub application_uri: String,
    #[serde(default = "default_product_uri")]
    pub product_uri: String,
    #[serde(default)]
    pub discovery_urls: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            certificate_path: None,
            private_key_path: None,
            endpoints: Vec::new(),
            hello_timeout_ms: default_hello_timeout_ms(),
            receive_buffer_size: default_receive_buffer_size(),
            send_buffer_size: default_send_buffer_size(),
            max_message_size: default_max_message_size(),
            max_chunk_count: default_max_chunk_count(),
            send_buffer_high_watermark: default_send_buffer_high_watermark(),
            shutdown_grace_period_ms: default_shutdown_grace_period_ms(),
            subscription_tick_interval_ms: default_subscription_tick_interval_ms(),
            session_check_interval_ms: default_session_check_interval_ms(),
            limits: Limits::default(),
            application_name: default_application_name(),
            application_uri: default_application_uri(),
            product_uri: default_product_uri(),
            discovery_urls: Vec::new(),
        }
    }
}

impl Config for ServerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoints.is_empty() {
            return Err(ConfigError::Invalid(
                "server config must declare at least one endpoint".to_string(),
            ));
        }
        if self.limits.subscriptions.min_publishing_interval_ms
            > self.limits.subscriptions.max_publishing_interval_ms
        {
            return Err(ConfigError::Invalid(
                "min_publishing_interval_ms exceeds max_publishing_interval_ms".to_string(),
            ));
        }
        Ok(())
    }

    fn application_name(&self) -> String {
        self.application_name.clone()
    }

    fn application_uri(&self) -> String {
        self.application_uri.clone()
    }

    fn product_uri(&self) -> String {
        self.product_uri.clone()
    }

    fn discovery_urls(&self) -> Vec<String> {
        self.discovery_urls.clone()
    }
}

impl ServerConfig {
    pub fn endpoint_url(&self) -> String {
        format!("opc.tcp://{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_fails_validation_without_endpoints() {
        let config = ServerConfig::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_with_an_endpoint_validates() {
        let mut config = ServerConfig::default();
        config.endpoints.push(EndpointConfig {
            path: "".to_string(),
            security_policy_uri: "http://opcfoundation.org/UA/SecurityPolicy#None".to_string(),
            security_mode: opcua_types::service_types::MessageSecurityMode::None,
            user_token_ids: vec!["anonymous".to_string()],
        });
        assert!(config.validate().is_ok());
    }
}
