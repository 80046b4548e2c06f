use serde::{Deserialize, Serialize};

mod defaults {
    pub fn max_subscriptions_per_session() -> u32 {
        100
    }
    pub fn max_monitored_items_per_sub() -> u32 {
        0
    }
    pub fn max_notifications_per_publish() -> u32 {
        0
    }
    pub fn min_publishing_interval_ms() -> f64 {
        100.0
    }
    pub fn max_publishing_interval_ms() -> f64 {
        3_600_000.0
    }
    pub fn min_sampling_interval_ms() -> f64 {
        50.0
    }
    pub fn max_keep_alive_count() -> u32 {
        0
    }
    pub fn max_lifetime_count() -> u32 {
        0
    }
    pub fn default_keep_alive_count() -> u32 {
        10
    }
    pub fn default_lifetime_count() -> u32 {
        60
    }
    pub fn max_queued_notifications() -> usize {
        100
    }
    pub fn max_monitored_item_queue_size() -> u32 {
        10
    }
    pub fn max_monitored_items_per_call() -> usize {
        1_000
    }
    pub fn max_nodes_per_read() -> usize {
        1_000
    }
    pub fn max_nodes_per_browse() -> usize {
        1_000
    }
    pub fn max_array_length() -> usize {
        1_000_000
    }
    pub fn max_string_length() -> usize {
        65_536
    }
    pub fn max_byte_string_length() -> usize {
        64 * 1024 * 1024
    }
    pub fn max_session_timeout_ms() -> f64 {
        3_600_000.0
    }
    pub fn min_session_timeout_ms() -> f64 {
        10_000.0
    }
    pub fn max_sessions() -> usize {
        100
    }
}

/// Subscription- and monitored-item-level limits. Values of `0` mean
/// "unlimited" except where noted, matching the reference server's own
/// convention for these knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionLimits {
    #[serde(default = "defaults::max_subscriptions_per_session")]
    pub max_subscriptions_per_session: u32,
    #[serde(default = "defaults::max_monitored_items_per_sub")]
    pub max_monitored_items_per_sub: usize,
    #[serde(default = "defaults::max_notifications_per_publish")]
    pub max_notifications_per_publish: u32,
    #[serde(default = "defaults::min_publishing_interval_ms")]
    pub min_publishing_interval_ms: f64,
    #[serde(default = "defaults::max_publishing_interval_ms")]
    pub max_publishing_interval_ms: f64,
    #[serde(default = "defaults::min_sampling_interval_ms")]
    pub min_sampling_interval_ms: f64,
    /// 0 means no upper bound is enforced (see the Open Question
    /// resolution recorded in the workspace's design ledger).
    #[serde(default = "defaults::max_keep_alive_count")]
    pub max_keep_alive_count: u32,
    #[serde(default = "defaults::max_lifetime_count")]
    pub max_lifetime_count: u32,
    #[serde(default = "defaults::default_keep_alive_count")]
    pub default_keep_alive_count: u32,
    #[serde(default = "defaults::default_lifetime_count")]
    pub default_lifetime_count: u32,
    #[serde(default = "defaults::max_queued_notifications")]
    pub max_queued_notifications: usize,
    #[serde(default = "defaults::max_monitored_item_queue_size")]
    pub max_monitored_item_queue_size: u32,
}

impl Default for SubscriptionLimits {
    fn default() -> Self {
        Self {
            max_subscriptions_per_session: defaults::max_subscriptions_per_session(),
            max_monitored_items_per_sub: defaults::max_monitored_items_per_sub(),
            max_notifications_per_publish: defaults::max_notifications_per_publish(),
            min_publishing_interval_ms: defaults::min_publishing_interval_ms(),
            max_publishing_interval_ms: defaults::max_publishing_interval_ms(),
            min_sampling_interval_ms: defaults::min_sampling_interval_ms(),
            max_keep_alive_count: defaults::max_keep_alive_count(),
            max_lifetime_count: defaults::max_lifetime_count(),
            default_keep_alive_count: defaults::default_keep_alive_count(),
            default_lifetime_count: defaults::default_lifetime_count(),
            max_queued_notifications: defaults::max_queued_notifications(),
            max_monitored_item_queue_size: defaults::max_monitored_item_queue_size(),
        }
    }
}

/// Per-call batching and wire-size limits applied to every service
/// request regardless of which subscription/session it targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationalLimits {
    #[serde(default = "defaults::max_monitored_items_per_call")]
    pub max_monitored_items_per_call: usize,
    #[serde(default = "defaults::max_nodes_per_read")]
    pub max_nodes_per_read: usize,
    #[serde(default = "defaults::max_nodes_per_browse")]
    pub max_nodes_per_browse: usize,
    #[serde(default = "defaults::max_array_length")]
    pub max_array_length: usize,
    #[serde(default = "defaults::max_string_length")]
    pub max_string_length: usize,
    #[serde(default = "defaults::max_byte_string_length")]
    pub max_byte_string_length: usize,
}

impl Default for OperationalLimits {
    fn default() -> Self {
        Self {
            max_monitored_items_per_call: defaults::max_monitored_items_per_call(),
            max_nodes_per_read: defaults::max_nodes_per_read(),
            max_nodes_per_browse: defaults::max_nodes_per_browse(),
            max_array_length: defaults::max_array_length(),
            max_string_length: defaults::max_string_length(),
            max_byte_string_length: defaults::max_byte_string_length(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Limits {
    #[serde(default)]
    pub subscriptions: SubscriptionLimits,
    #[serde(default)]
    pub operational: OperationalLimits,
    #[serde(default = "defaults::max_session_timeout_ms")]
    pub max_session_timeout_ms: f64,
    #[serde(default = "defaults::min_session_timeout_ms")]
    pub min_session_timeout_ms: f64,
    #[serde(default = "defaults::max_sessions")]
    pub max_sessions: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            subscriptions: SubscriptionLimits::default(),
            operational: OperationalLimits::default(),
            max_session_timeout_ms: defaults::max_session_timeout_ms(),
            min_session_timeout_ms: defaults::min_session_timeout_ms(),
            max_sessions: defaults::max_sessions(),
        }
    }
}
