//! Routes decoded requests to the session manager, subscription engine,
//! or address space and maintains the authentication-token-to-session
//! binding, per the component design's dispatcher responsibilities.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::oneshot;

use opcua_types::basic::{ExtensionObject, UaDateTime};
use opcua_types::service_types::*;
use opcua_types::{RequestMessage, ResponseMessage, StatusCode};

use crate::address_space::AddressSpace;
use crate::authenticator::Authenticator;
use crate::info::ServerInfo;
use crate::session::{self, Session, SessionManager};
use crate::subscriptions::monitored_item::{filter_status_ok, ItemFilter};
use crate::subscriptions::{MonitoredItem, PendingPublish, SubscriptionEngine};

pub enum HandleMessageResult {
    Immediate(ResponseMessage),
    /// A `Publish` request that will be answered once a subscription has
    /// something to deliver; the connection task awaits the receiver
    /// alongside everything else rather than blocking the dispatcher.
    PendingPublish(oneshot::Receiver<PublishResponse>),
}

impl From<ResponseMessage> for HandleMessageResult {
    fn from(value: ResponseMessage) -> Self {
        HandleMessageResult::Immediate(value)
    }
}

pub struct MessageDispatcher {
    pub info: Arc<ServerInfo>,
    pub sessions: Arc<RwLock<SessionManager>>,
    pub subscriptions: Arc<SubscriptionEngine>,
}

impl MessageDispatcher {
    pub async fn handle(&self, request: RequestMessage, channel_id: u32) -> HandleMessageResult {
        let request_handle = request.request_header().request_handle;

        let needs_session = !matches!(
            request,
            RequestMessage::GetEndpoints(_) | RequestMessage::CreateSession(_)
        );
        let session = if needs_session {
            let token = request.request_header().authentication_token.clone();
            match self.sessions.read().find_by_token(&token) {
                Some(s) => Some(s),
                None => {
                    return ResponseMessage::service_fault(request_handle, StatusCode::BadSessionIdInvalid)
                        .into();
                }
            }
        } else {
            None
        };

        if let Some(session) = &session {
            let activated = session.read().activated;
            let allowed_before_activation = matches!(
                request,
                RequestMessage::ActivateSession(_) | RequestMessage::CloseSession(_)
            );
            if !activated && !allowed_before_activation {
                return ResponseMessage::service_fault(request_handle, StatusCode::BadSessionNotActivated)
                    .into();
            }
            session.write().touch();
        }

        match request {
            RequestMessage::GetEndpoints(req) => self.get_endpoints(*req).into(),
            RequestMessage::CreateSession(req) => self.create_session(*req, channel_id).into(),
            RequestMessage::ActivateSession(req) => {
                self.activate_session(*req, session.unwrap(), channel_id).await.into()
            }
            RequestMessage::CloseSession(req) => self.close_session(*req, session.unwrap()).into(),
            RequestMessage::CreateSubscription(req) => {
                self.create_subscription(*req, session.unwrap()).into()
            }
            RequestMessage::ModifySubscription(req) => {
                self.modify_subscription(*req, session.unwrap()).into()
            }
            RequestMessage::DeleteSubscriptions(req) => {
                self.delete_subscriptions(*req, session.unwrap()).into()
            }
            RequestMessage::SetPublishingMode(req) => {
                self.set_publishing_mode(*req, session.unwrap()).into()
            }
            RequestMessage::TransferSubscriptions(req) => {
                self.transfer_subscriptions(*req, session.unwrap()).into()
            }
            RequestMessage::Publish(req) => return self.publish(*req, session.unwrap()),
            RequestMessage::Republish(req) => self.republish(*req, session.unwrap()).into(),
            RequestMessage::CreateMonitoredItems(req) => {
                self.create_monitored_items(*req, session.unwrap()).into()
            }
            RequestMessage::ModifyMonitoredItems(req) => {
                self.modify_monitored_items(*req, session.unwrap()).into()
            }
            RequestMessage::SetMonitoringMode(req) => {
                self.set_monitoring_mode(*req, session.unwrap()).into()
            }
            RequestMessage::SetTriggering(req) => self.set_triggering(*req, session.unwrap()).into(),
            RequestMessage::DeleteMonitoredItems(req) => {
                self.delete_monitored_items(*req, session.unwrap()).into()
            }
            RequestMessage::Read(req) => self.read(*req).await.into(),
            RequestMessage::Write(req) => self.write(*req).await.into(),
            RequestMessage::Browse(req) => self.browse(*req).await.into(),
        }
    }

    fn get_endpoints(&self, req: GetEndpointsRequest) -> ResponseMessage {
        let endpoints = self
            .info
            .config
            .endpoints
            .iter()
            .map(|e| EndpointDescription {
                endpoint_url: format!("{}{}", self.info.config.endpoint_url(), e.path),
                server: self.info.application_description.clone(),
                security_mode: e.security_mode,
                security_policy_uri: e.security_policy_uri.clone(),
                user_identity_tokens: e.user_token_policies(),
                transport_profile_uri: "http://opcfoundation.org/UA-Profile/Transport/uatcp-uasc-uabinary"
                    .to_string(),
                security_level: 0,
            })
            .collect();
        GetEndpointsResponse {
            response_header: ResponseHeader::new_good(req.request_header.request_handle),
            endpoints: Some(endpoints),
        }
        .into()
    }

    fn create_session(&self, req: CreateSessionRequest, channel_id: u32) -> ResponseMessage {
        let result = self.sessions.write().create_session(
            &self.info.session_id_handle,
            req.session_name.clone(),
            channel_id,
            req.requested_session_timeout,
            &self.info.config.limits,
        );
        match result {
            Ok((session, server_nonce)) => {
                let session = session.read();
                CreateSessionResponse {
                    response_header: ResponseHeader::new_good(req.request_header.request_handle),
                    session_id: session.session_id.clone(),
                    authentication_token: session.authentication_token.clone(),
                    revised_session_timeout: session.timeout.as_millis() as f64,
                    server_nonce,
                    server_certificate: self.info.server_certificate.clone(),
                    server_endpoints: None,
                }
                .into()
            }
            Err(status) => ResponseMessage::service_fault(req.request_header.request_handle, status),
        }
    }

    /// Checks the user identity token against configured policies and
    /// (re)binds the session to this channel. `req.client_signature` /
    /// `req.user_token_signature` are not verified — doing so needs the
    /// client certificate parsed out of its DER bytes, which spec.md
    /// places outside this crate's crypto boundary alongside the other
    /// certificate/signature primitives named in its non-goals.
    async fn activate_session(
        &self,
        req: ActivateSessionRequest,
        session: Arc<RwLock<Session>>,
        channel_id: u32,
    ) -> ResponseMessage {
        if let Err(status) = self.info.authenticator.authenticate(&req.user_identity_token).await {
            return ResponseMessage::service_fault(req.request_header.request_handle, status);
        }
        let server_nonce = session::activate_session(&session, channel_id, req.user_identity_token);
        ActivateSessionResponse {
            response_header: ResponseHeader::new_good(req.request_header.request_handle),
            server_nonce,
            results: Some(vec![StatusCode::Good]),
        }
        .into()
    }

    fn close_session(&self, req: CloseSessionRequest, session: Arc<RwLock<Session>>) -> ResponseMessage {
        let session_id = session.read().session_id.clone();
        if req.delete_subscriptions {
            self.subscriptions.delete_all_for_session(&session_id);
        }
        self.sessions.write().remove(&session_id);
        CloseSessionResponse {
            response_header: ResponseHeader::new_good(req.request_header.request_handle),
        }
        .into()
    }

    fn create_subscription(
        &self,
        req: CreateSubscriptionRequest,
        session: Arc<RwLock<Session>>,
    ) -> ResponseMessage {
        let limits = &self.info.config.limits.subscriptions;
        let session_id = session.read().session_id.clone();
        if session.read().subscription_ids.len() as u32 >= limits.max_subscriptions_per_session {
            return ResponseMessage::service_fault(
                req.request_header.request_handle,
                StatusCode::BadTooManySubscriptions,
            );
        }
        let (interval, lifetime, keep_alive) = crate::subscriptions::Subscription::revise_parameters(
            req.requested_publishing_interval,
            req.requested_lifetime_count,
            req.requested_max_keep_alive_count,
            limits,
        );
        let id = self.subscriptions.create_subscription(
            session_id,
            interval,
            lifetime,
            keep_alive,
            req.publishing_enabled,
            req.priority,
        );
        session.write().add_subscription(id);
        CreateSubscriptionResponse {
            response_header: ResponseHeader::new_good(req.request_header.request_handle),
            subscription_id: id,
            revised_publishing_interval: interval,
            revised_lifetime_count: lifetime,
            revised_max_keep_alive_count: keep_alive,
        }
        .into()
    }

    fn modify_subscription(
        &self,
        req: ModifySubscriptionRequest,
        session: Arc<RwLock<Session>>,
    ) -> ResponseMessage {
        if !session.read().subscription_ids.contains(&req.subscription_id) {
            return ResponseMessage::service_fault(
                req.request_header.request_handle,
                StatusCode::BadSubscriptionIdInvalid,
            );
        }
        let Some(subscription) = self.subscriptions.get(req.subscription_id) else {
            return ResponseMessage::service_fault(
                req.request_header.request_handle,
                StatusCode::BadSubscriptionIdInvalid,
            );
        };
        let limits = &self.info.config.limits.subscriptions;
        let (interval, lifetime, keep_alive) = crate::subscriptions::Subscription::revise_parameters(
            req.requested_publishing_interval,
            req.requested_lifetime_count,
            req.requested_max_keep_alive_count,
            limits,
        );
        {
            let mut subscription = subscription.write();
            subscription.revised_publishing_interval_ms = interval;
            subscription.revised_lifetime_count = lifetime;
            subscription.revised_max_keep_alive_count = keep_alive;
            subscription.priority = req.priority;
        }
        ModifySubscriptionResponse {
            response_header: ResponseHeader::new_good(req.request_header.request_handle),
            revised_publishing_interval: interval,
            revised_lifetime_count: lifetime,
            revised_max_keep_alive_count: keep_alive,
        }
        .into()
    }

    fn delete_subscriptions(
        &self,
        req: DeleteSubscriptionsRequest,
        session: Arc<RwLock<Session>>,
    ) -> ResponseMessage {
        let session_id = session.read().session_id.clone();
        let ids = req.subscription_ids.unwrap_or_default();
        if ids.is_empty() {
            return ResponseMessage::service_fault(
                req.request_header.request_handle,
                StatusCode::BadNothingToDo,
            );
        }
        let results = ids
            .iter()
            .map(|id| {
                let status = self.subscriptions.delete_subscription(&session_id, *id);
                if status.is_good() {
                    session.write().remove_subscription(*id);
                }
                status
            })
            .collect();
        DeleteSubscriptionsResponse {
            response_header: ResponseHeader::new_good(req.request_header.request_handle),
            results: Some(results),
        }
        .into()
    }

    fn set_publishing_mode(
        &self,
        req: SetPublishingModeRequest,
        session: Arc<RwLock<Session>>,
    ) -> ResponseMessage {
        let owned = session.read().subscription_ids.clone();
        let ids = req.subscription_ids.unwrap_or_default();
        let results = ids
            .iter()
            .map(|id| {
                if !owned.contains(id) {
                    return StatusCode::BadSubscriptionIdInvalid;
                }
                match self.subscriptions.get(*id) {
                    Some(subscription) => {
                        subscription.write().publishing_enabled = req.publishing_enabled;
                        StatusCode::Good
                    }
                    None => StatusCode::BadSubscriptionIdInvalid,
                }
            })
            .collect();
        SetPublishingModeResponse {
            response_header: ResponseHeader::new_good(req.request_header.request_handle),
            results: Some(results),
        }
        .into()
    }

    fn transfer_subscriptions(
        &self,
        req: TransferSubscriptionsRequest,
        session: Arc<RwLock<Session>>,
    ) -> ResponseMessage {
        let session_id = session.read().session_id.clone();
        let ids = req.subscription_ids.unwrap_or_default();
        let results = ids
            .iter()
            .map(|id| {
                let current_owner = {
                    let subscription = self.subscriptions.get(*id);
                    subscription.map(|s| s.read().session_id.clone())
                };
                match current_owner {
                    Some(from) => match self.subscriptions.transfer(*id, &from, &session_id) {
                        Ok(()) => {
                            session.write().add_subscription(*id);
                            TransferResult {
                                status_code: StatusCode::Good,
                                available_sequence_numbers: self
                                    .subscriptions
                                    .get(*id)
                                    .map(|s| s.read().available_sequence_numbers()),
                            }
                        }
                        Err(status) => TransferResult {
                            status_code: status,
                            available_sequence_numbers: None,
                        },
                    },
                    None => TransferResult {
                        status_code: StatusCode::BadSubscriptionIdInvalid,
                        available_sequence_numbers: None,
                    },
                }
            })
            .collect();
        TransferSubscriptionsResponse {
            response_header: ResponseHeader::new_good(req.request_header.request_handle),
            results: Some(results),
        }
        .into()
    }

    fn publish(&self, req: PublishRequest, session: Arc<RwLock<Session>>) -> HandleMessageResult {
        let session_id = session.read().session_id.clone();
        let acks = req.subscription_acknowledgements.unwrap_or_default();
        let acknowledgement_results = acks
            .iter()
            .map(|ack| match self.subscriptions.get(ack.subscription_id) {
                Some(subscription) => subscription.write().acknowledge(ack.sequence_number),
                None => StatusCode::BadSubscriptionIdInvalid,
            })
            .collect();

        let (tx, rx) = oneshot::channel();
        self.subscriptions.enqueue_publish(
            session_id,
            PendingPublish {
                request_handle: req.request_header.request_handle,
                acknowledgement_results,
                responder: tx,
            },
        );
        HandleMessageResult::PendingPublish(rx)
    }

    fn republish(&self, req: RepublishRequest, session: Arc<RwLock<Session>>) -> ResponseMessage {
        if !session.read().subscription_ids.contains(&req.subscription_id) {
            return ResponseMessage::service_fault(
                req.request_header.request_handle,
                StatusCode::BadSubscriptionIdInvalid,
            );
        }
        let Some(subscription) = self.subscriptions.get(req.subscription_id) else {
            return ResponseMessage::service_fault(
                req.request_header.request_handle,
                StatusCode::BadSubscriptionIdInvalid,
            );
        };
        match subscription.read().republish(req.retransmit_sequence_number) {
            Ok(notification_message) => RepublishResponse {
                response_header: ResponseHeader::new_good(req.request_header.request_handle),
                notification_message,
            }
            .into(),
            Err(status) => ResponseMessage::service_fault(req.request_header.request_handle, status),
        }
    }

    fn create_monitored_items(
        &self,
        req: CreateMonitoredItemsRequest,
        session: Arc<RwLock<Session>>,
    ) -> ResponseMessage {
        if !session.read().subscription_ids.contains(&req.subscription_id) {
            return ResponseMessage::service_fault(
                req.request_header.request_handle,
                StatusCode::BadSubscriptionIdInvalid,
            );
        }
        let Some(subscription) = self.subscriptions.get(req.subscription_id) else {
            return ResponseMessage::service_fault(
                req.request_header.request_handle,
                StatusCode::BadSubscriptionIdInvalid,
            );
        };
        let items = req.items_to_create.unwrap_or_default();
        let max_per_call = self.info.config.limits.operational.max_monitored_items_per_call;
        if items.len() > max_per_call {
            return ResponseMessage::service_fault(
                req.request_header.request_handle,
                StatusCode::BadTooManyOperations,
            );
        }
        let limits = &self.info.config.limits.subscriptions;
        let results = items
            .into_iter()
            .map(|item_request| {
                let filter = parse_filter(&item_request.requested_parameters.filter);
                if let Err(status) = filter_status_ok(&filter) {
                    return MonitoredItemCreateResult {
                        status_code: status,
                        monitored_item_id: 0,
                        revised_sampling_interval: 0.0,
                        revised_queue_size: 0,
                        filter_result: ExtensionObject::Null,
                    };
                }
                let id = self.info.monitored_item_id_handle.next();
                let queue_size = if item_request.requested_parameters.queue_size == 0 {
                    1
                } else {
                    item_request
                        .requested_parameters
                        .queue_size
                        .min(limits.max_monitored_item_queue_size.max(1))
                };
                let sampling_interval = item_request
                    .requested_parameters
                    .sampling_interval
                    .max(limits.min_sampling_interval_ms);
                let discard_policy = if item_request.requested_parameters.discard_oldest {
                    MonitoredItemQueueOverflowPolicy::DiscardOldest
                } else {
                    MonitoredItemQueueOverflowPolicy::DiscardNewest
                };
                let item = MonitoredItem::new(
                    id,
                    item_request.requested_parameters.client_handle,
                    item_request.item_to_monitor.node_id.clone(),
                    item_request.item_to_monitor.attribute_id,
                    item_request.item_to_monitor.index_range.clone(),
                    sampling_interval,
                    queue_size,
                    discard_policy,
                    filter,
                    item_request.monitoring_mode,
                );
                subscription.write().add_item(item);
                MonitoredItemCreateResult {
                    status_code: StatusCode::Good,
                    monitored_item_id: id,
                    revised_sampling_interval: sampling_interval,
                    revised_queue_size: queue_size,
                    filter_result: ExtensionObject::Null,
                }
            })
            .collect();
        CreateMonitoredItemsResponse {
            response_header: ResponseHeader::new_good(req.request_header.request_handle),
            results: Some(results),
        }
        .into()
    }

    fn modify_monitored_items(
        &self,
        req: ModifyMonitoredItemsRequest,
        session: Arc<RwLock<Session>>,
    ) -> ResponseMessage {
        if !session.read().subscription_ids.contains(&req.subscription_id) {
            return ResponseMessage::service_fault(
                req.request_header.request_handle,
                StatusCode::BadSubscriptionIdInvalid,
            );
        }
        let Some(subscription) = self.subscriptions.get(req.subscription_id) else {
            return ResponseMessage::service_fault(
                req.request_header.request_handle,
                StatusCode::BadSubscriptionIdInvalid,
            );
        };
        let limits = &self.info.config.limits.subscriptions;
        let items = req.items_to_modify.unwrap_or_default();
        let results = items
            .into_iter()
            .map(|modify_request| {
                let mut subscription = subscription.write();
                let Some(item) = subscription.item_mut(modify_request.monitored_item_id) else {
                    return MonitoredItemModifyResult {
                        status_code: StatusCode::BadMonitoredItemIdInvalid,
                        revised_sampling_interval: 0.0,
                        revised_queue_size: 0,
                        filter_result: ExtensionObject::Null,
                    };
                };
                let sampling_interval = modify_request
                    .requested_parameters
                    .sampling_interval
                    .max(limits.min_sampling_interval_ms);
                let queue_size = modify_request
                    .requested_parameters
                    .queue_size
                    .max(1)
                    .min(limits.max_monitored_item_queue_size.max(1));
                item.sampling_interval_ms = sampling_interval;
                item.queue_size = queue_size;
                item.filter = parse_filter(&modify_request.requested_parameters.filter);
                MonitoredItemModifyResult {
                    status_code: StatusCode::Good,
                    revised_sampling_interval: sampling_interval,
                    revised_queue_size: queue_size,
                    filter_result: ExtensionObject::Null,
                }
            })
            .collect();
        ModifyMonitoredItemsResponse {
            response_header: ResponseHeader::new_good(req.request_header.request_handle),
            results: Some(results),
        }
        .into()
    }

    fn set_monitoring_mode(
        &self,
        req: SetMonitoringModeRequest,
        session: Arc<RwLock<Session>>,
    ) -> ResponseMessage {
        if !session.read().subscription_ids.contains(&req.subscription_id) {
            return ResponseMessage::service_fault(
                req.request_header.request_handle,
                StatusCode::BadSubscriptionIdInvalid,
            );
        }
        let Some(subscription) = self.subscriptions.get(req.subscription_id) else {
            return ResponseMessage::service_fault(
                req.request_header.request_handle,
                StatusCode::BadSubscriptionIdInvalid,
            );
        };
        let ids = req.monitored_item_ids.unwrap_or_default();
        let results = ids
            .iter()
            .map(|id| {
                let mut subscription = subscription.write();
                match subscription.item_mut(*id) {
                    Some(item) => {
                        item.set_monitoring_mode(req.monitoring_mode);
                        StatusCode::Good
                    }
                    None => StatusCode::BadMonitoredItemIdInvalid,
                }
            })
            .collect();
        SetMonitoringModeResponse {
            response_header: ResponseHeader::new_good(req.request_header.request_handle),
            results: Some(results),
        }
        .into()
    }

    fn set_triggering(&self, req: SetTriggeringRequest, session: Arc<RwLock<Session>>) -> ResponseMessage {
        if !session.read().subscription_ids.contains(&req.subscription_id) {
            return ResponseMessage::service_fault(
                req.request_header.request_handle,
                StatusCode::BadSubscriptionIdInvalid,
            );
        }
        let Some(subscription) = self.subscriptions.get(req.subscription_id) else {
            return ResponseMessage::service_fault(
                req.request_header.request_handle,
                StatusCode::BadSubscriptionIdInvalid,
            );
        };
        let mut subscription = subscription.write();
        let add_results = req
            .links_to_add
            .unwrap_or_default()
            .into_iter()
            .map(|target| {
                match subscription.add_trigger_link(req.triggering_item_id, target) {
                    Ok(()) => StatusCode::Good,
                    Err(status) => status,
                }
            })
            .collect();
        let remove_results = req
            .links_to_remove
            .unwrap_or_default()
            .into_iter()
            .map(|target| {
                subscription.remove_trigger_link(req.triggering_item_id, target);
                StatusCode::Good
            })
            .collect();
        SetTriggeringResponse {
            response_header: ResponseHeader::new_good(req.request_header.request_handle),
            add_results: Some(add_results),
            remove_results: Some(remove_results),
        }
        .into()
    }

    fn delete_monitored_items(
        &self,
        req: DeleteMonitoredItemsRequest,
        session: Arc<RwLock<Session>>,
    ) -> ResponseMessage {
        if !session.read().subscription_ids.contains(&req.subscription_id) {
            return ResponseMessage::service_fault(
                req.request_header.request_handle,
                StatusCode::BadSubscriptionIdInvalid,
            );
        }
        let Some(subscription) = self.subscriptions.get(req.subscription_id) else {
            return ResponseMessage::service_fault(
                req.request_header.request_handle,
                StatusCode::BadSubscriptionIdInvalid,
            );
        };
        let ids = req.monitored_item_ids.unwrap_or_default();
        let results = ids
            .iter()
            .map(|id| {
                if subscription.write().remove_item(*id) {
                    StatusCode::Good
                } else {
                    StatusCode::BadMonitoredItemIdInvalid
                }
            })
            .collect();
        DeleteMonitoredItemsResponse {
            response_header: ResponseHeader::new_good(req.request_header.request_handle),
            results: Some(results),
        }
        .into()
    }

    async fn read(&self, req: ReadRequest) -> ResponseMessage {
        let nodes = req.nodes_to_read.unwrap_or_default();
        if nodes.len() > self.info.config.limits.operational.max_nodes_per_read {
            return ResponseMessage::service_fault(
                req.request_header.request_handle,
                StatusCode::BadTooManyOperations,
            );
        }
        let mut results = Vec::with_capacity(nodes.len());
        for node in &nodes {
            results.push(
                self.info
                    .address_space
                    .read(&node.node_id, node.attribute_id, node.index_range.as_deref())
                    .await,
            );
        }
        ReadResponse {
            response_header: ResponseHeader::new_good(req.request_header.request_handle),
            results: Some(results),
        }
        .into()
    }

    async fn write(&self, req: WriteRequest) -> ResponseMessage {
        let nodes = req.nodes_to_write.unwrap_or_default();
        let mut results = Vec::with_capacity(nodes.len());
        for node in nodes {
            results.push(
                self.info
                    .address_space
                    .write(&node.node_id, node.attribute_id, node.index_range.as_deref(), node.value)
                    .await,
            );
        }
        WriteResponse {
            response_header: ResponseHeader::new_good(req.request_header.request_handle),
            results: Some(results),
        }
        .into()
    }

    async fn browse(&self, req: BrowseRequest) -> ResponseMessage {
        let descriptions = req.nodes_to_browse.unwrap_or_default();
        if descriptions.len() > self.info.config.limits.operational.max_nodes_per_browse {
            return ResponseMessage::service_fault(
                req.request_header.request_handle,
                StatusCode::BadTooManyOperations,
            );
        }
        let mut results = Vec::with_capacity(descriptions.len());
        for description in &descriptions {
            results.push(match self.info.address_space.browse(description).await {
                Ok(references) => BrowseResult {
                    status_code: StatusCode::Good,
                    continuation_point: None,
                    references: Some(references),
                },
                Err(status) => BrowseResult {
                    status_code: status,
                    continuation_point: None,
                    references: None,
                },
            });
        }
        BrowseResponse {
            response_header: ResponseHeader::new_good(req.request_header.request_handle),
            results: Some(results),
        }
        .into()
    }
}

fn parse_filter(filter: &ExtensionObject) -> ItemFilter {
    match filter {
        ExtensionObject::DataChangeFilter(f) => ItemFilter::DataChange(f.clone()),
        ExtensionObject::EventFilter(f) => ItemFilter::Event(f.clone()),
        _ => ItemFilter::DataChange(DataChangeFilter {
            trigger: DataChangeTrigger::StatusValue,
            deadband_type: DeadbandType::None,
            deadband_value: 0.0,
        }),
    }
}

/// Abandons a request whose elapsed wall time has exceeded its
/// `TimeoutHint`, per the advisory-timeout cancellation rule.
pub fn has_timed_out(started: std::time::Instant, timeout_hint_ms: u32) -> bool {
    timeout_hint_ms != 0 && started.elapsed() > Duration::from_millis(timeout_hint_ms as u64)
}

pub fn now_wire() -> UaDateTime {
    UaDateTime::from_chrono(chrono::Utc::now())
}
