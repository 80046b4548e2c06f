//! A standalone OPC UA binary-protocol server core: secure channel
//! lifecycle, session management, the subscription/monitored-item
//! engine, and the connection supervisor that ties them to a TCP
//! listener. Node storage, the generated service type table, and
//! certificate validation are all boundaries this crate calls through
//! rather than owns; see [`address_space`], [`authenticator`], and
//! [`opcua_core::ServiceCodec`].

pub mod address_space;
pub mod authenticator;
pub mod config;
pub mod connection;
pub mod dispatcher;
pub mod info;
pub mod server;
pub mod server_handle;
pub mod session;
pub mod subscriptions;

pub use address_space::{AddressSpace, InMemoryAddressSpace};
pub use authenticator::{Authenticator, DefaultAuthenticator};
pub use config::ServerConfig;
pub use info::ServerInfo;
pub use server::{Server, ServerBuilder};
pub use server_handle::ServerHandle;
