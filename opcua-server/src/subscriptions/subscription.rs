use std::collections::{HashMap, VecDeque};
use std::time::Instant;

use opcua_types::basic::UaDateTime;
use opcua_types::node_id::NodeId;
use opcua_types::service_types::{
    DataChangeNotification, EventFieldList, EventNotificationList, MonitoredItemNotification,
    NotificationData, NotificationMessage,
};
use opcua_types::StatusCode;

use crate::config::SubscriptionLimits;

use super::monitored_item::MonitoredItem;

/// Why a publish cycle did (or did not) produce a response — the
/// dispatcher/engine uses this to decide whether to consume a queued
/// publish token and what to tell the client.
pub enum PublishOutcome {
    /// A notification (data, keep-alive, or both) is ready; consumes one
    /// publish token.
    Notification(NotificationMessage),
    /// Nothing to report and keep-alive hasn't fired; no token consumed.
    Nothing,
    /// The subscription exceeded its lifetime count without a publish
    /// token and must be torn down.
    Expired,
}

/// A periodic delivery context for monitored-item notifications, with
/// its own publish timer and a strictly monotonic sequence-number
/// stream. Owned by exactly one session; owns its monitored items.
pub struct Subscription {
    pub id: u32,
    pub session_id: NodeId,
    pub revised_publishing_interval_ms: f64,
    pub revised_lifetime_count: u32,
    pub revised_max_keep_alive_count: u32,
    pub publishing_enabled: bool,
    pub priority: u8,
    sequence_number: u32,
    keep_alive_counter: u32,
    lifetime_counter: u32,
    retransmission_queue: VecDeque<NotificationMessage>,
    retransmission_capacity: usize,
    items: HashMap<u32, MonitoredItem>,
    /// triggering item id -> items it promotes to one-shot reporting.
    triggers: HashMap<u32, Vec<u32>>,
    pub last_tick: Instant,
}

impl Subscription {
    pub fn new(
        id: u32,
        session_id: NodeId,
        revised_publishing_interval_ms: f64,
        revised_lifetime_count: u32,
        revised_max_keep_alive_count: u32,
        publishing_enabled: bool,
        priority: u8,
        retransmission_capacity: usize,
    ) -> Self {
        Self {
            id,
            session_id,
            revised_publishing_interval_ms,
            revised_lifetime_count,
            revised_max_keep_alive_count,
            publishing_enabled,
            priority,
            sequence_number: 0,
            keep_alive_counter: 0,
            lifetime_counter: 0,
            retransmission_queue: VecDeque::new(),
            retransmission_capacity: retransmission_capacity.max(1),
            items: HashMap::new(),
            triggers: HashMap::new(),
            last_tick: Instant::now(),
        }
    }

    /// Clamps requested publishing interval / lifetime / keep-alive per
    /// the revision rules: interval into `[min, max]`, keep-alive to at
    /// least 1, and lifetime bumped to at least 3x keep-alive.
    pub fn revise_parameters(
        requested_publishing_interval_ms: f64,
        requested_lifetime_count: u32,
        requested_max_keep_alive_count: u32,
        limits: &SubscriptionLimits,
    ) -> (f64, u32, u32) {
        let interval = requested_publishing_interval_ms
            .max(limits.min_publishing_interval_ms)
            .min(limits.max_publishing_interval_ms);
        let keep_alive = requested_max_keep_alive_count.max(1);
        let lifetime = requested_lifetime_count.max(keep_alive.saturating_mul(3));
        (interval, lifetime, keep_alive)
    }

    pub fn add_item(&mut self, item: MonitoredItem) {
        self.items.insert(item.id, item);
    }

    pub fn remove_item(&mut self, item_id: u32) -> bool {
        self.triggers.remove(&item_id);
        for targets in self.triggers.values_mut() {
            targets.retain(|id| *id != item_id);
        }
        self.items.remove(&item_id).is_some()
    }

    pub fn item_mut(&mut self, item_id: u32) -> Option<&mut MonitoredItem> {
        self.items.get_mut(&item_id)
    }

    pub fn item(&self, item_id: u32) -> Option<&MonitoredItem> {
        self.items.get(&item_id)
    }

    pub fn item_ids(&self) -> Vec<u32> {
        self.items.keys().copied().collect()
    }

    pub fn add_trigger_link(&mut self, triggering_item_id: u32, target_item_id: u32) -> Result<(), StatusCode> {
        if !self.items.contains_key(&triggering_item_id) || !self.items.contains_key(&target_item_id) {
            return Err(StatusCode::BadMonitoredItemIdInvalid);
        }
        let targets = self.triggers.entry(triggering_item_id).or_default();
        if !targets.contains(&target_item_id) {
            targets.push(target_item_id);
        }
        Ok(())
    }

    pub fn remove_trigger_link(&mut self, triggering_item_id: u32, target_item_id: u32) {
        if let Some(targets) = self.triggers.get_mut(&triggering_item_id) {
            targets.retain(|id| *id != target_item_id);
        }
    }

    /// Is this subscription "late" (has ticked over without delivering)?
    /// Late subscriptions are serviced before on-time ones when multiple
    /// subscriptions on the same session compete for publish tokens.
    pub fn is_late(&self) -> bool {
        self.keep_alive_counter > 0 || self.lifetime_counter > 0
    }

    fn next_sequence_number(&mut self) -> u32 {
        self.sequence_number = self.sequence_number.wrapping_add(1);
        if self.sequence_number == 0 {
            self.sequence_number = 1;
        }
        self.sequence_number
    }

    fn push_retransmission(&mut self, message: NotificationMessage) {
        if self.retransmission_queue.len() >= self.retransmission_capacity {
            self.retransmission_queue.pop_front();
        }
        self.retransmission_queue.push_back(message);
    }

    /// Runs one publish cycle per the component design's numbered steps:
    /// collects ready notifications from reporting items, and depending
    /// on whether there's data, publishing is enabled, and a token is
    /// available, either emits a notification, emits a keep-alive, or
    /// advances the keep-alive/lifetime counters.
    pub fn tick(&mut self, publish_token_available: bool, now_wire: UaDateTime) -> PublishOutcome {
        self.last_tick = Instant::now();

        let mut triggered: Vec<u32> = Vec::new();
        for (trigger_id, targets) in &self.triggers {
            if let Some(item) = self.items.get(trigger_id) {
                if item.has_queued() {
                    triggered.extend(targets.iter().copied());
                }
            }
        }
        for target_id in triggered {
            if let Some(item) = self.items.get_mut(&target_id) {
                item.promote_one_shot();
            }
        }

        let mut data_items = Vec::new();
        let mut event_items = Vec::new();
        for item in self.items.values_mut() {
            if !item.is_reporting() || !item.has_queued() {
                continue;
            }
            let (data, events) = item.drain();
            for queued in data {
                let mut value = queued.value;
                value.overflow = queued.overflow;
                data_items.push(MonitoredItemNotification {
                    client_handle: item.client_handle,
                    value,
                });
            }
            if !events.is_empty() {
                for event in events {
                    event_items.push(EventFieldList {
                        client_handle: item.client_handle,
                        event_fields: event.fields,
                    });
                }
            }
        }

        let has_notifications = !data_items.is_empty() || !event_items.is_empty();

        if has_notifications && self.publishing_enabled && publish_token_available {
            let mut notification_data = Vec::new();
            if !data_items.is_empty() {
                notification_data.push(NotificationData::DataChange(DataChangeNotification {
                    monitored_items: data_items,
                }));
            }
            if !event_items.is_empty() {
                notification_data.push(NotificationData::Event(EventNotificationList {
                    events: event_items,
                }));
            }
            let message = NotificationMessage {
                sequence_number: self.next_sequence_number(),
                publish_time: now_wire,
                notification_data,
            };
            self.push_retransmission(message.clone());
            self.keep_alive_counter = 0;
            self.lifetime_counter = 0;
            return PublishOutcome::Notification(message);
        }

        if !self.publishing_enabled || !has_notifications {
            self.keep_alive_counter += 1;
            if self.keep_alive_counter >= self.revised_max_keep_alive_count && publish_token_available {
                let message = NotificationMessage {
                    sequence_number: self.next_sequence_number(),
                    publish_time: now_wire,
                    notification_data: Vec::new(),
                };
                self.push_retransmission(message.clone());
                self.keep_alive_counter = 0;
                return PublishOutcome::Notification(message);
            }
        }

        if !publish_token_available {
            self.lifetime_counter += 1;
            if self.lifetime_counter >= self.revised_lifetime_count {
                return PublishOutcome::Expired;
            }
        }

        PublishOutcome::Nothing
    }

    /// Removes retransmission entries up to and including `sequence_number`.
    pub fn acknowledge(&mut self, sequence_number: u32) -> StatusCode {
        let found = self
            .retransmission_queue
            .iter()
            .any(|m| m.sequence_number == sequence_number);
        if !found {
            return StatusCode::BadSequenceNumberUnknown;
        }
        self.retransmission_queue
            .retain(|m| m.sequence_number != sequence_number);
        StatusCode::Good
    }

    pub fn republish(&self, sequence_number: u32) -> Result<NotificationMessage, StatusCode> {
        self.retransmission_queue
            .iter()
            .find(|m| m.sequence_number == sequence_number)
            .cloned()
            .ok_or(StatusCode::BadMessageNotAvailable)
    }

    pub fn available_sequence_numbers(&self) -> Vec<u32> {
        self.retransmission_queue
            .iter()
            .map(|m| m.sequence_number)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opcua_types::service_types::{
        DataChangeFilter, DataChangeTrigger, DeadbandType, MonitoredItemQueueOverflowPolicy,
        MonitoringMode,
    };
    use opcua_types::data_value::DataValue;
    use opcua_types::variant::Variant;
    use super::super::monitored_item::ItemFilter;

    fn sub() -> Subscription {
        Subscription::new(1, NodeId::new(1, 1u32), 100.0, 15, 5, true, 0, 50)
    }

    fn now() -> UaDateTime {
        UaDateTime::from_chrono(chrono::Utc::now())
    }

    #[test]
    fn revise_parameters_bumps_lifetime_to_3x_keep_alive() {
        let limits = SubscriptionLimits::default();
        let (interval, lifetime, keep_alive) = Subscription::revise_parameters(10.0, 2, 5, &limits);
        assert_eq!(interval, limits.min_publishing_interval_ms);
        assert_eq!(keep_alive, 5);
        assert_eq!(lifetime, 15);
    }

    #[test]
    fn keep_alive_fires_after_configured_count_with_no_data() {
        let mut s = sub();
        s.revised_max_keep_alive_count = 3;
        for _ in 0..2 {
            assert!(matches!(s.tick(true, now()), PublishOutcome::Nothing));
        }
        match s.tick(true, now()) {
            PublishOutcome::Notification(msg) => {
                assert_eq!(msg.sequence_number, 1);
                assert!(msg.notification_data.is_empty());
            }
            _ => panic!("expected keep-alive notification"),
        }
    }

    #[test]
    fn lifetime_expires_without_publish_tokens() {
        let mut s = sub();
        s.revised_lifetime_count = 2;
        assert!(matches!(s.tick(false, now()), PublishOutcome::Nothing));
        assert!(matches!(s.tick(false, now()), PublishOutcome::Expired));
    }

    #[test]
    fn republish_hit_and_miss() {
        let mut s = sub();
        let item = MonitoredItem::new(
            1,
            1,
            NodeId::new(1, 2u32),
            13,
            None,
            100.0,
            10,
            MonitoredItemQueueOverflowPolicy::DiscardOldest,
            ItemFilter::DataChange(DataChangeFilter {
                trigger: DataChangeTrigger::StatusValue,
                deadband_type: DeadbandType::None,
                deadband_value: 0.0,
            }),
            MonitoringMode::Reporting,
        );
        s.add_item(item);
        for i in 0..10u32 {
            s.item_mut(1).unwrap().notify_data_change(
                DataValue {
                    value: Some(Variant::UInt32(i)),
                    status: Some(StatusCode::Good),
                    ..Default::default()
                },
                None,
            );
            assert!(matches!(s.tick(true, now()), PublishOutcome::Notification(_)));
        }
        assert_eq!(s.available_sequence_numbers(), (1..=10).collect::<Vec<_>>());
        assert_eq!(s.acknowledge(5), StatusCode::Good);
        assert!(matches!(s.republish(3), Ok(_)));
        assert!(matches!(s.republish(5), Err(StatusCode::BadMessageNotAvailable)));
        assert!(matches!(s.republish(7), Ok(_)));
    }
}
