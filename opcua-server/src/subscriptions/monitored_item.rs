use std::collections::VecDeque;
use std::time::{Duration, Instant};

use opcua_types::basic::Range;
use opcua_types::data_value::DataValue;
use opcua_types::node_id::NodeId;
use opcua_types::service_types::{
    DataChangeFilter, DataChangeTrigger, DeadbandType, EventFilter, MonitoredItemQueueOverflowPolicy,
    MonitoringMode,
};
use opcua_types::variant::Variant;
use opcua_types::StatusCode;

/// A queued sample with the wire-level overflow marker set independently
/// of the sample's own status, since overflow is a property of queueing,
/// not of the attribute read that produced the value.
#[derive(Debug, Clone)]
pub struct QueuedValue {
    pub value: DataValue,
    pub overflow: bool,
}

#[derive(Debug, Clone)]
pub struct QueuedEvent {
    pub fields: Vec<Variant>,
    pub overflow: bool,
}

#[derive(Clone)]
pub enum ItemFilter {
    DataChange(DataChangeFilter),
    Event(EventFilter),
}

/// A single observed attribute or event source: sampling interval,
/// queue, discard policy, filter, and monitoring mode, exactly as named
/// in the data model. Owned exclusively by one [`super::subscription::Subscription`].
pub struct MonitoredItem {
    pub id: u32,
    pub client_handle: u32,
    pub node_id: NodeId,
    pub attribute_id: u32,
    pub index_range: Option<String>,
    pub sampling_interval_ms: f64,
    pub queue_size: u32,
    pub discard_policy: MonitoredItemQueueOverflowPolicy,
    pub filter: ItemFilter,
    pub monitoring_mode: MonitoringMode,
    last_value: Option<DataValue>,
    data_queue: VecDeque<QueuedValue>,
    event_queue: VecDeque<QueuedEvent>,
    /// Set for exactly one cycle when a trigger promotes this item from
    /// `Sampling` to a one-shot report.
    one_shot: bool,
    next_sample_at: Instant,
}

impl MonitoredItem {
    pub fn new(
        id: u32,
        client_handle: u32,
        node_id: NodeId,
        attribute_id: u32,
        index_range: Option<String>,
        sampling_interval_ms: f64,
        queue_size: u32,
        discard_policy: MonitoredItemQueueOverflowPolicy,
        filter: ItemFilter,
        monitoring_mode: MonitoringMode,
    ) -> Self {
        Self {
            id,
            client_handle,
            node_id,
            attribute_id,
            index_range,
            sampling_interval_ms,
            queue_size: queue_size.max(1),
            discard_policy,
            filter,
            monitoring_mode,
            last_value: None,
            data_queue: VecDeque::new(),
            event_queue: VecDeque::new(),
            one_shot: false,
            next_sample_at: Instant::now(),
        }
    }

    /// Whether this item's sampling interval has elapsed. The caller
    /// (the sampler loop) is responsible for calling [`Self::mark_sampled`]
    /// after actually reading the attribute.
    pub fn sample_due(&self, now: Instant) -> bool {
        self.is_sampling() && now >= self.next_sample_at
    }

    pub fn mark_sampled(&mut self, now: Instant) {
        let interval = Duration::from_secs_f64((self.sampling_interval_ms.max(1.0)) / 1000.0);
        self.next_sample_at = now + interval;
    }

    pub fn is_reporting(&self) -> bool {
        matches!(self.monitoring_mode, MonitoringMode::Reporting) || self.one_shot
    }

    pub fn is_sampling(&self) -> bool {
        !matches!(self.monitoring_mode, MonitoringMode::Disabled)
    }

    /// Promotes the item to report once for the current cycle, per the
    /// triggering rule: "when X would report, its triggered items are
    /// promoted from Sampling to one-shot Reporting for that cycle".
    pub fn promote_one_shot(&mut self) {
        if matches!(self.monitoring_mode, MonitoringMode::Sampling) {
            self.one_shot = true;
        }
    }

    fn clear_one_shot(&mut self) {
        self.one_shot = false;
    }

    /// Applies the data-change filter to a freshly sampled value. Returns
    /// `true` if the sample was queued (i.e. constitutes a reportable
    /// change), mirroring the return the triggering mechanism uses to
    /// decide whether this item "would report" this cycle.
    pub fn notify_data_change(&mut self, new_value: DataValue, eu_range: Option<Range>) -> bool {
        let ItemFilter::DataChange(filter) = &self.filter else {
            return false;
        };
        let is_change = match &self.last_value {
            None => true,
            Some(last) => data_change_detected(last, &new_value, filter, eu_range),
        };
        self.last_value = Some(new_value.clone());
        if !is_change {
            return false;
        }
        self.push_data(new_value);
        true
    }

    fn push_data(&mut self, value: DataValue) {
        let size = self.queue_size as usize;
        if self.data_queue.len() >= size {
            match self.discard_policy {
                MonitoredItemQueueOverflowPolicy::DiscardOldest => {
                    self.data_queue.pop_front();
                    self.data_queue.push_back(QueuedValue {
                        value,
                        overflow: false,
                    });
                    if let Some(front) = self.data_queue.front_mut() {
                        front.overflow = true;
                    }
                }
                MonitoredItemQueueOverflowPolicy::DiscardNewest => {
                    if let Some(back) = self.data_queue.back_mut() {
                        back.overflow = true;
                    }
                }
            }
        } else {
            self.data_queue.push_back(QueuedValue {
                value,
                overflow: false,
            });
        }
    }

    /// Evaluates the event's `where` clause and, if it passes, projects
    /// `select` fields into the queue. `where`-clause evaluation beyond a
    /// trivial pass-through is delegated to the caller, which has access
    /// to the address space's event-field resolution; a `None` verdict
    /// means the event failed the filter and is dropped silently.
    pub fn notify_event(&mut self, fields: Vec<Variant>, passed_where_clause: bool) -> bool {
        if !passed_where_clause {
            return false;
        }
        let size = self.queue_size as usize;
        if self.event_queue.len() >= size {
            match self.discard_policy {
                MonitoredItemQueueOverflowPolicy::DiscardOldest => {
                    self.event_queue.pop_front();
                    self.event_queue.push_back(QueuedEvent {
                        fields,
                        overflow: false,
                    });
                    if let Some(front) = self.event_queue.front_mut() {
                        front.overflow = true;
                    }
                }
                MonitoredItemQueueOverflowPolicy::DiscardNewest => {
                    if let Some(back) = self.event_queue.back_mut() {
                        back.overflow = true;
                    }
                    return false;
                }
            }
        } else {
            self.event_queue.push_back(QueuedEvent {
                fields,
                overflow: false,
            });
        }
        true
    }

    /// Drains everything queued since the previous cycle. Called once per
    /// publish cycle for items in `Reporting` mode (or one-shot-promoted);
    /// clears the one-shot flag regardless of whether anything was queued.
    pub fn drain(&mut self) -> (Vec<QueuedValue>, Vec<QueuedEvent>) {
        self.clear_one_shot();
        (self.data_queue.drain(..).collect(), self.event_queue.drain(..).collect())
    }

    pub fn has_queued(&self) -> bool {
        !self.data_queue.is_empty() || !self.event_queue.is_empty()
    }

    pub fn set_monitoring_mode(&mut self, mode: MonitoringMode) {
        self.monitoring_mode = mode;
        if matches!(mode, MonitoringMode::Disabled) {
            self.data_queue.clear();
            self.event_queue.clear();
        }
    }
}

fn numeric_change_exceeds(last: Option<&Variant>, new: Option<&Variant>, deadband: f64) -> bool {
    match (last.and_then(Variant::as_f64), new.and_then(Variant::as_f64)) {
        (Some(a), Some(b)) => (a - b).abs() > deadband,
        _ => last != new,
    }
}

fn data_change_detected(
    last: &DataValue,
    new: &DataValue,
    filter: &DataChangeFilter,
    eu_range: Option<Range>,
) -> bool {
    let status_changed = last.status != new.status;
    match filter.trigger {
        DataChangeTrigger::Status => status_changed,
        DataChangeTrigger::StatusValue | DataChangeTrigger::StatusValueTimestamp => {
            if status_changed {
                return true;
            }
            let value_changed = match filter.deadband_type {
                DeadbandType::None => last.value != new.value,
                DeadbandType::Absolute => {
                    numeric_change_exceeds(last.value.as_ref(), new.value.as_ref(), filter.deadband_value)
                }
                DeadbandType::Percent => {
                    // Falls back to an absolute deadband of 0 when the
                    // node carries no EURange metadata.
                    let deadband = eu_range
                        .map(|r| (filter.deadband_value / 100.0) * (r.high - r.low).abs())
                        .unwrap_or(0.0);
                    numeric_change_exceeds(last.value.as_ref(), new.value.as_ref(), deadband)
                }
            };
            if value_changed {
                return true;
            }
            if matches!(filter.trigger, DataChangeTrigger::StatusValueTimestamp) {
                return last.source_timestamp != new.source_timestamp;
            }
            false
        }
    }
}

pub fn filter_status_ok(item_filter: &ItemFilter) -> Result<(), StatusCode> {
    match item_filter {
        ItemFilter::DataChange(f) if f.deadband_value < 0.0 => Err(StatusCode::BadMonitoredItemFilterInvalid),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opcua_types::basic::UaDateTime;

    fn dv(value: f64) -> DataValue {
        DataValue {
            value: Some(Variant::Double(value)),
            status: Some(StatusCode::Good),
            ..Default::default()
        }
    }

    fn item(deadband: f64) -> MonitoredItem {
        MonitoredItem::new(
            1,
            1,
            NodeId::new(1, 1u32),
            13,
            None,
            100.0,
            10,
            MonitoredItemQueueOverflowPolicy::DiscardOldest,
            ItemFilter::DataChange(DataChangeFilter {
                trigger: DataChangeTrigger::StatusValue,
                deadband_type: DeadbandType::Absolute,
                deadband_value: deadband,
            }),
            MonitoringMode::Reporting,
        )
    }

    #[test]
    fn absolute_deadband_filters_small_changes() {
        let mut item = item(0.5);
        assert!(item.notify_data_change(dv(10.0), None));
        assert!(!item.notify_data_change(dv(10.3), None));
        assert!(!item.notify_data_change(dv(10.4), None));
        assert!(item.notify_data_change(dv(10.6), None));
        assert!(item.notify_data_change(dv(11.2), None));
        assert!(!item.notify_data_change(dv(11.0), None));
    }

    #[test]
    fn discard_oldest_marks_new_front_as_overflow() {
        let mut item = item(0.0);
        for i in 0..3 {
            item.queue_size = 2;
            item.notify_data_change(dv(i as f64), None);
        }
        let (drained, _) = item.drain();
        assert_eq!(drained.len(), 2);
        assert!(drained[0].overflow);
        assert!(!drained[1].overflow);
    }

    #[test]
    fn status_change_always_reports_even_under_deadband() {
        let mut item = item(1000.0);
        assert!(item.notify_data_change(dv(1.0), None));
        let mut changed_status = dv(1.0);
        changed_status.status = Some(StatusCode::Uncertain);
        assert!(item.notify_data_change(changed_status, None));
    }

    #[test]
    fn status_value_timestamp_trigger_reports_on_timestamp_alone() {
        let mut item = MonitoredItem::new(
            1,
            1,
            NodeId::new(1, 1u32),
            13,
            None,
            100.0,
            10,
            MonitoredItemQueueOverflowPolicy::DiscardOldest,
            ItemFilter::DataChange(DataChangeFilter {
                trigger: DataChangeTrigger::StatusValueTimestamp,
                deadband_type: DeadbandType::None,
                deadband_value: 0.0,
            }),
            MonitoringMode::Reporting,
        );
        let t1 = UaDateTime::from_chrono(chrono::Utc::now());
        let t2 = UaDateTime::from_chrono(chrono::Utc::now() + chrono::Duration::seconds(1));
        let mut first = dv(1.0);
        first.source_timestamp = Some(t1);
        assert!(item.notify_data_change(first, None));
        let mut same = dv(1.0);
        same.source_timestamp = Some(t1);
        assert!(!item.notify_data_change(same, None));
        let mut later = dv(1.0);
        later.source_timestamp = Some(t2);
        assert!(item.notify_data_change(later, None));
    }
}
