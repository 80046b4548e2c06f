use crate::service_types::*;

/// Tagged-variant dispatch over every service request this server
/// understands, in place of runtime type-id lookups at each call site.
/// The message dispatcher decodes a `TypeId` off the wire and produces
/// one of these; everything downstream matches on the variant instead of
/// re-inspecting the type id.
#[derive(Debug, Clone)]
pub enum RequestMessage {
    GetEndpoints(Box<GetEndpointsRequest>),
    CreateSession(Box<CreateSessionRequest>),
    ActivateSession(Box<ActivateSessionRequest>),
    CloseSession(Box<CloseSessionRequest>),
    CreateSubscription(Box<CreateSubscriptionRequest>),
    ModifySubscription(Box<ModifySubscriptionRequest>),
    DeleteSubscriptions(Box<DeleteSubscriptionsRequest>),
    SetPublishingMode(Box<SetPublishingModeRequest>),
    TransferSubscriptions(Box<TransferSubscriptionsRequest>),
    Publish(Box<PublishRequest>),
    Republish(Box<RepublishRequest>),
    CreateMonitoredItems(Box<CreateMonitoredItemsRequest>),
    ModifyMonitoredItems(Box<ModifyMonitoredItemsRequest>),
    SetMonitoringMode(Box<SetMonitoringModeRequest>),
    SetTriggering(Box<SetTriggeringRequest>),
    DeleteMonitoredItems(Box<DeleteMonitoredItemsRequest>),
    Read(Box<ReadRequest>),
    Write(Box<WriteRequest>),
    Browse(Box<BrowseRequest>),
}

impl RequestMessage {
    pub fn request_header(&self) -> &RequestHeader {
        match self {
            RequestMessage::GetEndpoints(r) => &r.request_header,
            RequestMessage::CreateSession(r) => &r.request_header,
            RequestMessage::ActivateSession(r) => &r.request_header,
            RequestMessage::CloseSession(r) => &r.request_header,
            RequestMessage::CreateSubscription(r) => &r.request_header,
            RequestMessage::ModifySubscription(r) => &r.request_header,
            RequestMessage::DeleteSubscriptions(r) => &r.request_header,
            RequestMessage::SetPublishingMode(r) => &r.request_header,
            RequestMessage::TransferSubscriptions(r) => &r.request_header,
            RequestMessage::Publish(r) => &r.request_header,
            RequestMessage::Republish(r) => &r.request_header,
            RequestMessage::CreateMonitoredItems(r) => &r.request_header,
            RequestMessage::ModifyMonitoredItems(r) => &r.request_header,
            RequestMessage::SetMonitoringMode(r) => &r.request_header,
            RequestMessage::SetTriggering(r) => &r.request_header,
            RequestMessage::DeleteMonitoredItems(r) => &r.request_header,
            RequestMessage::Read(r) => &r.request_header,
            RequestMessage::Write(r) => &r.request_header,
            RequestMessage::Browse(r) => &r.request_header,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ResponseMessage {
    ServiceFault(Box<ServiceFault>),
    GetEndpoints(Box<GetEndpointsResponse>),
    CreateSession(Box<CreateSessionResponse>),
    ActivateSession(Box<ActivateSessionResponse>),
    CloseSession(Box<CloseSessionResponse>),
    CreateSubscription(Box<CreateSubscriptionResponse>),
    ModifySubscription(Box<ModifySubscriptionResponse>),
    DeleteSubscriptions(Box<DeleteSubscriptionsResponse>),
    SetPublishingMode(Box<SetPublishingModeResponse>),
    TransferSubscriptions(Box<TransferSubscriptionsResponse>),
    Publish(Box<PublishResponse>),
    Republish(Box<RepublishResponse>),
    CreateMonitoredItems(Box<CreateMonitoredItemsResponse>),
    ModifyMonitoredItems(Box<ModifyMonitoredItemsResponse>),
    SetMonitoringMode(Box<SetMonitoringModeResponse>),
    SetTriggering(Box<SetTriggeringResponse>),
    DeleteMonitoredItems(Box<DeleteMonitoredItemsResponse>),
    Read(Box<ReadResponse>),
    Write(Box<WriteResponse>),
    Browse(Box<BrowseResponse>),
}

macro_rules! impl_from_response {
    ($variant:ident, $ty:ty) => {
        impl From<$ty> for ResponseMessage {
            fn from(v: $ty) -> Self {
                ResponseMessage::$variant(Box::new(v))
            }
        }
    };
}

impl_from_response!(ServiceFault, ServiceFault);
impl_from_response!(GetEndpoints, GetEndpointsResponse);
impl_from_response!(CreateSession, CreateSessionResponse);
impl_from_response!(ActivateSession, ActivateSessionResponse);
impl_from_response!(CloseSession, CloseSessionResponse);
impl_from_response!(CreateSubscription, CreateSubscriptionResponse);
impl_from_response!(ModifySubscription, ModifySubscriptionResponse);
impl_from_response!(DeleteSubscriptions, DeleteSubscriptionsResponse);
impl_from_response!(SetPublishingMode, SetPublishingModeResponse);
impl_from_response!(TransferSubscriptions, TransferSubscriptionsResponse);
impl_from_response!(Publish, PublishResponse);
impl_from_response!(Republish, RepublishResponse);
impl_from_response!(CreateMonitoredItems, CreateMonitoredItemsResponse);
impl_from_response!(ModifyMonitoredItems, ModifyMonitoredItemsResponse);
impl_from_response!(SetMonitoringMode, SetMonitoringModeResponse);
impl_from_response!(SetTriggering, SetTriggeringResponse);
impl_from_response!(DeleteMonitoredItems, DeleteMonitoredItemsResponse);
impl_from_response!(Read, ReadResponse);
impl_from_response!(Write, WriteResponse);
impl_from_response!(Browse, BrowseResponse);

impl ResponseMessage {
    pub fn response_header(&self) -> &ResponseHeader {
        match self {
            ResponseMessage::ServiceFault(r) => &r.response_header,
            ResponseMessage::GetEndpoints(r) => &r.response_header,
            ResponseMessage::CreateSession(r) => &r.response_header,
            ResponseMessage::ActivateSession(r) => &r.response_header,
            ResponseMessage::CloseSession(r) => &r.response_header,
            ResponseMessage::CreateSubscription(r) => &r.response_header,
            ResponseMessage::ModifySubscription(r) => &r.response_header,
            ResponseMessage::DeleteSubscriptions(r) => &r.response_header,
            ResponseMessage::SetPublishingMode(r) => &r.response_header,
            ResponseMessage::TransferSubscriptions(r) => &r.response_header,
            ResponseMessage::Publish(r) => &r.response_header,
            ResponseMessage::Republish(r) => &r.response_header,
            ResponseMessage::CreateMonitoredItems(r) => &r.response_header,
            ResponseMessage::ModifyMonitoredItems(r) => &r.response_header,
            ResponseMessage::SetMonitoringMode(r) => &r.response_header,
            ResponseMessage::SetTriggering(r) => &r.response_header,
            ResponseMessage::DeleteMonitoredItems(r) => &r.response_header,
            ResponseMessage::Read(r) => &r.response_header,
            ResponseMessage::Write(r) => &r.response_header,
            ResponseMessage::Browse(r) => &r.response_header,
        }
    }

    pub fn service_fault(request_handle: u32, status: crate::status_code::StatusCode) -> Self {
        ServiceFault {
            response_header: ResponseHeader::new_error(request_handle, status),
        }
        .into()
    }
}
