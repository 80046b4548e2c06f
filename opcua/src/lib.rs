//! Umbrella crate tying the wire-framing core, the crypto primitives,
//! and the generated-types scaffolding together with the server
//! runtime. An embedder depends on this crate alone; the split between
//! `opcua-core`/`opcua-crypto`/`opcua-types`/`opcua-server` exists so
//! each concern can be tested and versioned on its own.

pub use opcua_core as core;
pub use opcua_crypto as crypto;
pub use opcua_types as types;

#[cfg(feature = "server")]
pub use opcua_server as server;
