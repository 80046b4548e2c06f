use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use hashbrown::HashMap;
use parking_lot::RwLock;
use tokio::sync::oneshot;

use opcua_core::AtomicHandle;
use opcua_types::basic::UaDateTime;
use opcua_types::node_id::NodeId;
use opcua_types::service_types::{
    PublishResponse, ResponseHeader, SubscriptionAcknowledgement,
};
use opcua_types::StatusCode;

use crate::address_space::AddressSpace;
use crate::config::Limits;

use super::subscription::{PublishOutcome, Subscription};

/// A client-supplied publish token awaiting a `NotificationMessage`,
/// together with whatever the request's acknowledgements already
/// resolved to, so the eventual response can report both.
pub struct PendingPublish {
    pub request_handle: u32,
    pub acknowledgement_results: Vec<StatusCode>,
    pub responder: oneshot::Sender<PublishResponse>,
}

/// The cross-session home for every live subscription and monitored
/// item. Outlives any one session's connection the way the data model
/// requires ("a session survives channel loss"); sessions reference
/// subscriptions by id only, never by owning pointer, so the engine is
/// the single place subscription state actually lives.
pub struct SubscriptionEngine {
    subscriptions: RwLock<HashMap<u32, Arc<RwLock<Subscription>>>>,
    session_subscriptions: RwLock<HashMap<NodeId, Vec<u32>>>,
    publish_queues: RwLock<HashMap<NodeId, VecDeque<PendingPublish>>>,
    subscription_id_handle: AtomicHandle,
    retransmission_capacity: usize,
}

impl SubscriptionEngine {
    pub fn new(limits: &Limits) -> Self {
        Self {
            subscriptions: RwLock::new(HashMap::new()),
            session_subscriptions: RwLock::new(HashMap::new()),
            publish_queues: RwLock::new(HashMap::new()),
            subscription_id_handle: AtomicHandle::new(1),
            retransmission_capacity: limits.subscriptions.max_queued_notifications,
        }
    }

    pub fn get(&self, subscription_id: u32) -> Option<Arc<RwLock<Subscription>>> {
        self.subscriptions.read().get(&subscription_id).cloned()
    }

    pub fn session_subscription_ids(&self, session_id: &NodeId) -> Vec<u32> {
        self.session_subscriptions
            .read()
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn create_subscription(
        &self,
        session_id: NodeId,
        revised_publishing_interval_ms: f64,
        revised_lifetime_count: u32,
        revised_max_keep_alive_count: u32,
        publishing_enabled: bool,
        priority: u8,
    ) -> u32 {
        let id = self.subscription_id_handle.next();
        let subscription = Subscription::new(
            id,
            session_id.clone(),
            revised_publishing_interval_ms,
            revised_lifetime_count,
            revised_max_keep_alive_count,
            publishing_enabled,
            priority,
            self.retransmission_capacity,
        );
        self.subscriptions
            .write()
            .insert(id, Arc::new(RwLock::new(subscription)));
        self.session_subscriptions
            .write()
            .entry(session_id)
            .or_default()
            .push(id);
        id
    }

    /// Deletes a subscription; idempotent (per the testable property that
    /// a repeat delete reports `BadSubscriptionIdInvalid`).
    pub fn delete_subscription(&self, session_id: &NodeId, subscription_id: u32) -> StatusCode {
        let removed = self.subscriptions.write().remove(&subscription_id);
        if removed.is_none() {
            return StatusCode::BadSubscriptionIdInvalid;
        }
        if let Some(ids) = self.session_subscriptions.write().get_mut(session_id) {
            ids.retain(|id| *id != subscription_id);
        }
        StatusCode::Good
    }

    pub fn delete_all_for_session(&self, session_id: &NodeId) {
        let ids = self
            .session_subscriptions
            .write()
            .remove(session_id)
            .unwrap_or_default();
        let mut subs = self.subscriptions.write();
        for id in ids {
            subs.remove(&id);
        }
        self.publish_queues.write().remove(session_id);
    }

    /// Moves a subscription's ownership from one session to another,
    /// used by `TransferSubscriptions` and by `ActivateSession`'s
    /// implicit channel-rebind path.
    pub fn transfer(&self, subscription_id: u32, from: &NodeId, to: &NodeId) -> Result<(), StatusCode> {
        let subscription = self
            .subscriptions
            .read()
            .get(&subscription_id)
            .cloned()
            .ok_or(StatusCode::BadSubscriptionIdInvalid)?;
        {
            let mut guard = self.session_subscriptions.write();
            if let Some(ids) = guard.get_mut(from) {
                ids.retain(|id| *id != subscription_id);
            }
            guard.entry(to.clone()).or_default().push(subscription_id);
        }
        subscription.write().session_id = to.clone();
        Ok(())
    }

    pub fn enqueue_publish(&self, session_id: NodeId, pending: PendingPublish) {
        self.publish_queues
            .write()
            .entry(session_id)
            .or_default()
            .push_back(pending);
    }

    /// Drives every subscription's publish cycle once. Subscriptions in
    /// "late" state (keep-alive or lifetime counters already ticking) are
    /// serviced before on-time subscriptions on the same session;
    /// otherwise ties break on increasing subscription id.
    pub fn periodic_tick(&self, now_wire: UaDateTime) {
        let session_ids: Vec<NodeId> = self.session_subscriptions.read().keys().cloned().collect();
        for session_id in session_ids {
            let sub_ids = self
                .session_subscriptions
                .read()
                .get(&session_id)
                .cloned()
                .unwrap_or_default();
            let mut subs: Vec<Arc<RwLock<Subscription>>> = sub_ids
                .iter()
                .filter_map(|id| self.subscriptions.read().get(id).cloned())
                .collect();
            subs.sort_by_key(|s| {
                let s = s.read();
                (!s.is_late(), s.id)
            });

            let mut queue = self
                .publish_queues
                .write()
                .remove(&session_id)
                .unwrap_or_default();
            let mut expired = Vec::new();

            for sub in &subs {
                let token_available = !queue.is_empty();
                let outcome = sub.write().tick(token_available, now_wire);
                match outcome {
                    PublishOutcome::Notification(message) => {
                        if let Some(pending) = queue.pop_front() {
                            let sub_ref = sub.read();
                            let response = PublishResponse {
                                response_header: ResponseHeader::new_good(pending.request_handle),
                                subscription_id: sub_ref.id,
                                available_sequence_numbers: Some(sub_ref.available_sequence_numbers()),
                                more_notifications: false,
                                notification_message: message,
                                results: Some(pending.acknowledgement_results),
                            };
                            let _ = pending.responder.send(response);
                        }
                    }
                    PublishOutcome::Expired => {
                        expired.push(sub.read().id);
                        if let Some(pending) = queue.pop_front() {
                            let response = PublishResponse {
                                response_header: ResponseHeader::new_error(
                                    pending.request_handle,
                                    StatusCode::BadTimeout,
                                ),
                                subscription_id: sub.read().id,
                                available_sequence_numbers: None,
                                more_notifications: false,
                                notification_message: opcua_types::service_types::NotificationMessage {
                                    sequence_number: 0,
                                    publish_time: now_wire,
                                    notification_data: Vec::new(),
                                },
                                results: Some(pending.acknowledgement_results),
                            };
                            let _ = pending.responder.send(response);
                        }
                    }
                    PublishOutcome::Nothing => {}
                }
            }

            if !queue.is_empty() {
                self.publish_queues.write().insert(session_id.clone(), queue);
            }
            for id in expired {
                self.delete_subscription(&session_id, id);
            }
        }
    }

    /// Samples every due data-change item across every subscription and
    /// feeds the result through its filter. Event items are fed by the
    /// address space's own event dispatch path (out of scope here) and
    /// are not touched by this sweep.
    pub async fn sample_due_items(&self, address_space: &dyn AddressSpace) {
        let subs: Vec<Arc<RwLock<Subscription>>> =
            self.subscriptions.read().values().cloned().collect();
        let now = Instant::now();
        for sub in subs {
            let due_ids: Vec<(u32, opcua_types::node_id::NodeId, u32, Option<String>)> = {
                let sub = sub.read();
                sub.item_ids()
                    .into_iter()
                    .filter_map(|id| {
                        let item = sub.item(id)?;
                        if item.sample_due(now) {
                            Some((id, item.node_id.clone(), item.attribute_id, item.index_range.clone()))
                        } else {
                            None
                        }
                    })
                    .collect()
            };
            for (item_id, node_id, attribute_id, index_range) in due_ids {
                let value = address_space
                    .read(&node_id, attribute_id, index_range.as_deref())
                    .await;
                let eu_range = address_space.eu_range(&node_id).await;
                let mut sub = sub.write();
                if let Some(item) = sub.item_mut(item_id) {
                    item.notify_data_change(value, eu_range);
                    item.mark_sampled(now);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opcua_types::node_id::NodeId;

    fn engine() -> SubscriptionEngine {
        SubscriptionEngine::new(&Limits::default())
    }

    #[test]
    fn delete_subscription_is_idempotent() {
        let engine = engine();
        let session_id = NodeId::new(1, 1u32);
        let id = engine.create_subscription(session_id.clone(), 100.0, 15, 5, true, 0);
        assert_eq!(engine.delete_subscription(&session_id, id), StatusCode::Good);
        assert_eq!(
            engine.delete_subscription(&session_id, id),
            StatusCode::BadSubscriptionIdInvalid
        );
    }

    #[test]
    fn transfer_moves_subscription_between_sessions() {
        let engine = engine();
        let a = NodeId::new(1, 1u32);
        let b = NodeId::new(1, 2u32);
        let id = engine.create_subscription(a.clone(), 100.0, 15, 5, true, 0);
        engine.transfer(id, &a, &b).unwrap();
        assert!(engine.session_subscription_ids(&a).is_empty());
        assert_eq!(engine.session_subscription_ids(&b), vec![id]);
    }
}
