//! Security policies, key derivation, and certificate-path bookkeeping
//! for the OPC UA secure channel. Full X.509 parsing/validation and
//! detached-signature creation against a private key are left to the
//! embedding application's certificate tooling; this crate only covers
//! what the connection pipeline needs to negotiate and run a channel.

pub mod aes_key;
pub mod certificate_store;
pub mod keys;
pub mod random;
pub mod security_policy;

pub use aes_key::AesKey;
pub use certificate_store::CertificateStore;
pub use keys::{derive_keys, sign_hmac_sha256, verify_hmac_sha256, DerivedKeys};
pub use random::{random_byte_string, random_nonce};
pub use security_policy::SecurityPolicy;
