pub mod engine;
pub mod monitored_item;
pub mod subscription;

pub use engine::{PendingPublish, SubscriptionEngine};
pub use monitored_item::{ItemFilter, MonitoredItem};
pub use subscription::{PublishOutcome, Subscription};
