use crate::basic::{ByteString, LocalizedText, QualifiedName, UaDateTime};
use crate::data_value::DataValue;
use crate::node_id::NodeId;
use crate::status_code::StatusCode;

#[derive(Debug, Clone, Default)]
pub struct RequestHeader {
    pub authentication_token: ByteString,
    pub timestamp: Option<UaDateTime>,
    pub request_handle: u32,
    pub return_diagnostics: u32,
    pub timeout_hint: u32,
}

impl RequestHeader {
    /// A header with no meaningful identity, used for requests this
    /// server synthesizes internally (e.g. resolving an EURange via a
    /// nested Translate+Read round trip) rather than receiving from a
    /// client.
    pub fn dummy() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone)]
pub struct ResponseHeader {
    pub timestamp: Option<UaDateTime>,
    pub request_handle: u32,
    pub service_result: StatusCode,
}

impl ResponseHeader {
    pub fn new_good(request_handle: u32) -> Self {
        Self {
            timestamp: None,
            request_handle,
            service_result: StatusCode::Good,
        }
    }

    pub fn new_error(request_handle: u32, status: StatusCode) -> Self {
        Self {
            timestamp: None,
            request_handle,
            service_result: status,
        }
    }
}

// ---- Session services ----------------------------------------------

#[derive(Debug, Clone)]
pub struct ApplicationDescription {
    pub application_uri: String,
    pub product_uri: String,
    pub application_name: LocalizedText,
    pub application_type: ApplicationType,
    pub discovery_urls: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationType {
    Server,
    Client,
    ClientAndServer,
    DiscoveryServer,
}

#[derive(Debug, Clone)]
pub struct UserTokenPolicy {
    pub policy_id: String,
    pub token_type: UserTokenType,
    pub security_policy_uri: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserTokenType {
    Anonymous,
    UserName,
    Certificate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSecurityMode {
    Invalid,
    None,
    Sign,
    SignAndEncrypt,
}

#[derive(Debug, Clone)]
pub struct EndpointDescription {
    pub endpoint_url: String,
    pub server: ApplicationDescription,
    pub security_mode: MessageSecurityMode,
    pub security_policy_uri: String,
    pub user_identity_tokens: Vec<UserTokenPolicy>,
    pub transport_profile_uri: String,
    pub security_level: u8,
}

#[derive(Debug, Clone, Default)]
pub struct GetEndpointsRequest {
    pub request_header: RequestHeader,
    pub endpoint_url: String,
    pub locale_ids: Option<Vec<String>>,
    pub profile_uris: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct GetEndpointsResponse {
    pub response_header: ResponseHeader,
    pub endpoints: Option<Vec<EndpointDescription>>,
}

#[derive(Debug, Clone, Default)]
pub struct CreateSessionRequest {
    pub request_header: RequestHeader,
    pub client_description: Option<ApplicationDescription>,
    pub server_uri: String,
    pub endpoint_url: String,
    pub session_name: String,
    pub client_nonce: Option<Vec<u8>>,
    pub client_certificate: Option<Vec<u8>>,
    pub requested_session_timeout: f64,
    pub max_response_message_size: u32,
}

#[derive(Debug, Clone)]
pub struct CreateSessionResponse {
    pub response_header: ResponseHeader,
    pub session_id: NodeId,
    pub authentication_token: ByteString,
    pub revised_session_timeout: f64,
    pub server_nonce: Vec<u8>,
    pub server_certificate: Option<Vec<u8>>,
    pub server_endpoints: Option<Vec<EndpointDescription>>,
}

#[derive(Debug, Clone)]
pub enum UserIdentityToken {
    Anonymous { policy_id: String },
    UserName { policy_id: String, user_name: String, password: Vec<u8> },
}

#[derive(Debug, Clone, Default)]
pub struct SignatureData {
    pub algorithm: Option<String>,
    pub signature: Option<Vec<u8>>,
}

/// `client_signature`/`user_token_signature` carry the client's proof of
/// possession over `serverCertificate ∥ serverNonce`; verifying them
/// needs the client certificate parsed out of its DER bytes, which is
/// out of scope here (see spec.md's crypto non-goals) — the session
/// manager accepts them but does not check them, the same boundary
/// `AddressSpace`/`Authenticator` draw for node storage and identity
/// policy.
#[derive(Debug, Clone)]
pub struct ActivateSessionRequest {
    pub request_header: RequestHeader,
    pub client_signature: SignatureData,
    pub locale_ids: Option<Vec<String>>,
    pub user_identity_token: UserIdentityToken,
    pub user_token_signature: SignatureData,
}

#[derive(Debug, Clone)]
pub struct ActivateSessionResponse {
    pub response_header: ResponseHeader,
    pub server_nonce: Vec<u8>,
    pub results: Option<Vec<StatusCode>>,
}

#[derive(Debug, Clone)]
pub struct CloseSessionRequest {
    pub request_header: RequestHeader,
    pub delete_subscriptions: bool,
}

#[derive(Debug, Clone)]
pub struct CloseSessionResponse {
    pub response_header: ResponseHeader,
}

#[derive(Debug, Clone)]
pub struct ServiceFault {
    pub response_header: ResponseHeader,
}

// ---- Subscription services ------------------------------------------

#[derive(Debug, Clone)]
pub struct CreateSubscriptionRequest {
    pub request_header: RequestHeader,
    pub requested_publishing_interval: f64,
    pub requested_lifetime_count: u32,
    pub requested_max_keep_alive_count: u32,
    pub max_notifications_per_publish: u32,
    pub publishing_enabled: bool,
    pub priority: u8,
}

#[derive(Debug, Clone)]
pub struct CreateSubscriptionResponse {
    pub response_header: ResponseHeader,
    pub subscription_id: u32,
    pub revised_publishing_interval: f64,
    pub revised_lifetime_count: u32,
    pub revised_max_keep_alive_count: u32,
}

#[derive(Debug, Clone)]
pub struct ModifySubscriptionRequest {
    pub request_header: RequestHeader,
    pub subscription_id: u32,
    pub requested_publishing_interval: f64,
    pub requested_lifetime_count: u32,
    pub requested_max_keep_alive_count: u32,
    pub max_notifications_per_publish: u32,
    pub priority: u8,
}

#[derive(Debug, Clone)]
pub struct ModifySubscriptionResponse {
    pub response_header: ResponseHeader,
    pub revised_publishing_interval: f64,
    pub revised_lifetime_count: u32,
    pub revised_max_keep_alive_count: u32,
}

#[derive(Debug, Clone)]
pub struct DeleteSubscriptionsRequest {
    pub request_header: RequestHeader,
    pub subscription_ids: Option<Vec<u32>>,
}

#[derive(Debug, Clone)]
pub struct DeleteSubscriptionsResponse {
    pub response_header: ResponseHeader,
    pub results: Option<Vec<StatusCode>>,
}

#[derive(Debug, Clone)]
pub struct SetPublishingModeRequest {
    pub request_header: RequestHeader,
    pub publishing_enabled: bool,
    pub subscription_ids: Option<Vec<u32>>,
}

#[derive(Debug, Clone)]
pub struct SetPublishingModeResponse {
    pub response_header: ResponseHeader,
    pub results: Option<Vec<StatusCode>>,
}

#[derive(Debug, Clone)]
pub struct TransferSubscriptionsRequest {
    pub request_header: RequestHeader,
    pub subscription_ids: Option<Vec<u32>>,
    pub send_initial_values: bool,
}

#[derive(Debug, Clone)]
pub struct TransferResult {
    pub status_code: StatusCode,
    pub available_sequence_numbers: Option<Vec<u32>>,
}

#[derive(Debug, Clone)]
pub struct TransferSubscriptionsResponse {
    pub response_header: ResponseHeader,
    pub results: Option<Vec<TransferResult>>,
}

#[derive(Debug, Clone, Default)]
pub struct SubscriptionAcknowledgement {
    pub subscription_id: u32,
    pub sequence_number: u32,
}

#[derive(Debug, Clone, Default)]
pub struct PublishRequest {
    pub request_header: RequestHeader,
    pub subscription_acknowledgements: Option<Vec<SubscriptionAcknowledgement>>,
}

#[derive(Debug, Clone)]
pub struct NotificationMessage {
    pub sequence_number: u32,
    pub publish_time: UaDateTime,
    pub notification_data: Vec<NotificationData>,
}

#[derive(Debug, Clone)]
pub enum NotificationData {
    DataChange(DataChangeNotification),
    Event(EventNotificationList),
    StatusChange(StatusCode),
}

#[derive(Debug, Clone)]
pub struct MonitoredItemNotification {
    pub client_handle: u32,
    pub value: DataValue,
}

#[derive(Debug, Clone, Default)]
pub struct DataChangeNotification {
    pub monitored_items: Vec<MonitoredItemNotification>,
}

#[derive(Debug, Clone)]
pub struct EventFieldList {
    pub client_handle: u32,
    pub event_fields: Vec<crate::variant::Variant>,
}

#[derive(Debug, Clone, Default)]
pub struct EventNotificationList {
    pub events: Vec<EventFieldList>,
}

#[derive(Debug, Clone)]
pub struct StatusChangeNotification {
    pub status: StatusCode,
}

#[derive(Debug, Clone)]
pub struct PublishResponse {
    pub response_header: ResponseHeader,
    pub subscription_id: u32,
    pub available_sequence_numbers: Option<Vec<u32>>,
    pub more_notifications: bool,
    pub notification_message: NotificationMessage,
    pub results: Option<Vec<StatusCode>>,
}

#[derive(Debug, Clone)]
pub struct RepublishRequest {
    pub request_header: RequestHeader,
    pub subscription_id: u32,
    pub retransmit_sequence_number: u32,
}

#[derive(Debug, Clone)]
pub struct RepublishResponse {
    pub response_header: ResponseHeader,
    pub notification_message: NotificationMessage,
}

// ---- MonitoredItem services ------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampsToReturn {
    Source,
    Server,
    Both,
    Neither,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitoringMode {
    Disabled,
    Sampling,
    Reporting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadbandType {
    None,
    Absolute,
    Percent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataChangeTrigger {
    Status,
    StatusValue,
    StatusValueTimestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitoredItemQueueOverflowPolicy {
    DiscardOldest,
    DiscardNewest,
}

#[derive(Debug, Clone)]
pub struct DataChangeFilter {
    pub trigger: DataChangeTrigger,
    pub deadband_type: DeadbandType,
    pub deadband_value: f64,
}

#[derive(Debug, Clone)]
pub struct ContentFilterElement {
    pub filter_operator: FilterOperator,
    pub filter_operands: Vec<FilterOperand>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Equals,
    And,
    Or,
    Not,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
    Like,
    IsNull,
    OfType,
}

#[derive(Debug, Clone)]
pub enum FilterOperand {
    Literal(crate::variant::Variant),
    Attribute(SimpleAttributeOperand),
    Element(u32),
}

#[derive(Debug, Clone)]
pub struct SimpleAttributeOperand {
    pub browse_path: Vec<QualifiedName>,
}

#[derive(Debug, Clone, Default)]
pub struct ContentFilter {
    pub elements: Vec<ContentFilterElement>,
}

#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub select_clauses: Vec<SimpleAttributeOperand>,
    pub where_clause: ContentFilter,
}

#[derive(Debug, Clone)]
pub struct MonitoringParameters {
    pub client_handle: u32,
    pub sampling_interval: f64,
    pub filter: crate::basic::ExtensionObject,
    pub queue_size: u32,
    pub discard_oldest: bool,
}

#[derive(Debug, Clone)]
pub struct ReadValueId {
    pub node_id: NodeId,
    pub attribute_id: u32,
    pub index_range: Option<String>,
    pub data_encoding: QualifiedName,
}

impl Default for ReadValueId {
    fn default() -> Self {
        Self {
            node_id: NodeId::null(),
            attribute_id: 13, // Value
            index_range: None,
            data_encoding: QualifiedName::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MonitoredItemCreateRequest {
    pub item_to_monitor: ReadValueId,
    pub monitoring_mode: MonitoringMode,
    pub requested_parameters: MonitoringParameters,
}

#[derive(Debug, Clone)]
pub struct MonitoredItemCreateResult {
    pub status_code: StatusCode,
    pub monitored_item_id: u32,
    pub revised_sampling_interval: f64,
    pub revised_queue_size: u32,
    pub filter_result: crate::basic::ExtensionObject,
}

#[derive(Debug, Clone)]
pub struct CreateMonitoredItemsRequest {
    pub request_header: RequestHeader,
    pub subscription_id: u32,
    pub timestamps_to_return: TimestampsToReturn,
    pub items_to_create: Option<Vec<MonitoredItemCreateRequest>>,
}

#[derive(Debug, Clone)]
pub struct CreateMonitoredItemsResponse {
    pub response_header: ResponseHeader,
    pub results: Option<Vec<MonitoredItemCreateResult>>,
}

#[derive(Debug, Clone)]
pub struct MonitoredItemModifyRequest {
    pub monitored_item_id: u32,
    pub requested_parameters: MonitoringParameters,
}

#[derive(Debug, Clone)]
pub struct MonitoredItemModifyResult {
    pub status_code: StatusCode,
    pub revised_sampling_interval: f64,
    pub revised_queue_size: u32,
    pub filter_result: crate::basic::ExtensionObject,
}

#[derive(Debug, Clone)]
pub struct ModifyMonitoredItemsRequest {
    pub request_header: RequestHeader,
    pub subscription_id: u32,
    pub timestamps_to_return: TimestampsToReturn,
    pub items_to_modify: Option<Vec<MonitoredItemModifyRequest>>,
}

#[derive(Debug, Clone)]
pub struct ModifyMonitoredItemsResponse {
    pub response_header: ResponseHeader,
    pub results: Option<Vec<MonitoredItemModifyResult>>,
}

#[derive(Debug, Clone)]
pub struct SetMonitoringModeRequest {
    pub request_header: RequestHeader,
    pub subscription_id: u32,
    pub monitoring_mode: MonitoringMode,
    pub monitored_item_ids: Option<Vec<u32>>,
}

#[derive(Debug, Clone)]
pub struct SetMonitoringModeResponse {
    pub response_header: ResponseHeader,
    pub results: Option<Vec<StatusCode>>,
}

#[derive(Debug, Clone)]
pub struct DeleteMonitoredItemsRequest {
    pub request_header: RequestHeader,
    pub subscription_id: u32,
    pub monitored_item_ids: Option<Vec<u32>>,
}

#[derive(Debug, Clone)]
pub struct DeleteMonitoredItemsResponse {
    pub response_header: ResponseHeader,
    pub results: Option<Vec<StatusCode>>,
}

#[derive(Debug, Clone)]
pub struct SetTriggeringRequest {
    pub request_header: RequestHeader,
    pub subscription_id: u32,
    pub triggering_item_id: u32,
    pub links_to_add: Option<Vec<u32>>,
    pub links_to_remove: Option<Vec<u32>>,
}

#[derive(Debug, Clone)]
pub struct SetTriggeringResponse {
    pub response_header: ResponseHeader,
    pub add_results: Option<Vec<StatusCode>>,
    pub remove_results: Option<Vec<StatusCode>>,
}

// ---- Attribute / View services (facade boundary) ---------------------

#[derive(Debug, Clone)]
pub struct ReadRequest {
    pub request_header: RequestHeader,
    pub max_age: f64,
    pub timestamps_to_return: TimestampsToReturn,
    pub nodes_to_read: Option<Vec<ReadValueId>>,
}

#[derive(Debug, Clone)]
pub struct ReadResponse {
    pub response_header: ResponseHeader,
    pub results: Option<Vec<DataValue>>,
}

#[derive(Debug, Clone)]
pub struct WriteValue {
    pub node_id: NodeId,
    pub attribute_id: u32,
    pub index_range: Option<String>,
    pub value: DataValue,
}

#[derive(Debug, Clone)]
pub struct WriteRequest {
    pub request_header: RequestHeader,
    pub nodes_to_write: Option<Vec<WriteValue>>,
}

#[derive(Debug, Clone)]
pub struct WriteResponse {
    pub response_header: ResponseHeader,
    pub results: Option<Vec<StatusCode>>,
}

#[derive(Debug, Clone)]
pub struct BrowseDescription {
    pub node_id: NodeId,
    pub browse_direction: BrowseDirection,
    pub reference_type_id: NodeId,
    pub include_subtypes: bool,
    pub node_class_mask: u32,
    pub result_mask: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowseDirection {
    Forward,
    Inverse,
    Both,
}

#[derive(Debug, Clone)]
pub struct ReferenceDescription {
    pub reference_type_id: NodeId,
    pub is_forward: bool,
    pub node_id: NodeId,
    pub browse_name: QualifiedName,
    pub display_name: LocalizedText,
}

#[derive(Debug, Clone)]
pub struct BrowseResult {
    pub status_code: StatusCode,
    pub continuation_point: Option<Vec<u8>>,
    pub references: Option<Vec<ReferenceDescription>>,
}

#[derive(Debug, Clone)]
pub struct BrowseRequest {
    pub request_header: RequestHeader,
    pub nodes_to_browse: Option<Vec<BrowseDescription>>,
}

#[derive(Debug, Clone)]
pub struct BrowseResponse {
    pub response_header: ResponseHeader,
    pub results: Option<Vec<BrowseResult>>,
}
