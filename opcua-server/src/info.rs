//! Shared, mostly-static server state handed to every connection and
//! session: configuration, certificate material, and the handful of
//! atomic id generators that must be unique across the whole server
//! rather than per-connection.

use std::sync::Arc;

use opcua_core::config::Config;
use opcua_core::{AtomicHandle, ServiceCodec};
use opcua_types::service_types::ApplicationDescription;

use crate::address_space::AddressSpace;
use crate::authenticator::Authenticator;
use crate::config::ServerConfig;

/// Everything a connection, session, or subscription needs to reach back
/// into server-wide state. Cheaply cloneable (an `Arc` around the real
/// payload) so each connection task can hold its own handle.
pub struct ServerInfo {
    pub config: ServerConfig,
    pub application_description: ApplicationDescription,
    pub server_certificate: Option<Vec<u8>>,
    pub address_space: Arc<dyn AddressSpace>,
    pub authenticator: Arc<dyn Authenticator>,
    /// Decodes/encodes `MSG` bodies to/from [`opcua_types::RequestMessage`]/
    /// [`opcua_types::ResponseMessage`]. The actual generated type table is
    /// out of scope for this crate; the connection pipeline only ever calls
    /// through this seam.
    pub codec: Arc<dyn ServiceCodec>,
    pub channel_id_handle: AtomicHandle,
    pub token_id_handle: AtomicHandle,
    pub session_id_handle: AtomicHandle,
    pub subscription_id_handle: AtomicHandle,
    pub monitored_item_id_handle: AtomicHandle,
}

impl ServerInfo {
    pub fn new(
        config: ServerConfig,
        server_certificate: Option<Vec<u8>>,
        address_space: Arc<dyn AddressSpace>,
        authenticator: Arc<dyn Authenticator>,
        codec: Arc<dyn ServiceCodec>,
    ) -> Arc<Self> {
        let application_description = config.application_description();
        Arc::new(Self {
            config,
            application_description,
            server_certificate,
            address_space,
            authenticator,
            codec,
            channel_id_handle: AtomicHandle::new(1),
            token_id_handle: AtomicHandle::new(1),
            session_id_handle: AtomicHandle::new(1),
            subscription_id_handle: AtomicHandle::new(1),
            monitored_item_id_handle: AtomicHandle::new(1),
        })
    }
}
