use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::security_policy::SecurityPolicy;

type HmacSha256 = Hmac<Sha256>;

/// The signing key, encrypting key, and initialization vector derived
/// for one direction (client or server) of a secure channel token, per
/// the P_SHA256 pseudo-random function (OPC UA Part 6 §6.7.5).
#[derive(Debug, Clone)]
pub struct DerivedKeys {
    pub signing_key: Vec<u8>,
    pub encrypting_key: Vec<u8>,
    pub iv: Vec<u8>,
}

/// P_SHA256(secret, seed) expanded to `length` bytes, the key-derivation
/// primitive behind `derive_keys`.
fn p_sha256(secret: &[u8], seed: &[u8], length: usize) -> Vec<u8> {
    let mut result = Vec::with_capacity(length + 32);
    let mut a = {
        let mut mac = HmacSha256::new_from_slice(secret).expect("hmac accepts any key length");
        mac.update(seed);
        mac.finalize().into_bytes().to_vec()
    };
    while result.len() < length {
        let mut mac = HmacSha256::new_from_slice(secret).expect("hmac accepts any key length");
        mac.update(&a);
        mac.update(seed);
        let chunk = mac.finalize().into_bytes();
        result.extend_from_slice(&chunk);

        let mut mac_a = HmacSha256::new_from_slice(secret).expect("hmac accepts any key length");
        mac_a.update(&a);
        a = mac_a.finalize().into_bytes().to_vec();
    }
    result.truncate(length);
    result
}

/// Derives the signing/encrypting/iv triple for one direction of a
/// token, from the peer's nonce (the secret) and this side's nonce (the
/// seed) — the two nonces are swapped for the other direction.
pub fn derive_keys(policy: SecurityPolicy, secret: &[u8], seed: &[u8]) -> DerivedKeys {
    let signing_len = policy.symmetric_signing_key_size();
    let encrypting_len = policy.symmetric_key_size();
    let iv_len = policy.block_size();
    let total = signing_len + encrypting_len + iv_len;
    let bytes = p_sha256(secret, seed, total.max(1));

    let signing_key = bytes[0..signing_len].to_vec();
    let encrypting_key = bytes[signing_len..signing_len + encrypting_len].to_vec();
    let iv = bytes[signing_len + encrypting_len..signing_len + encrypting_len + iv_len].to_vec();

    DerivedKeys {
        signing_key,
        encrypting_key,
        iv,
    }
}

/// HMAC-SHA256 signature over `data` using `key`, used to sign/verify
/// symmetrically encrypted chunks once a channel has moved off `None`.
pub fn sign_hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("hmac accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

pub fn verify_hmac_sha256(key: &[u8], data: &[u8], signature: &[u8]) -> bool {
    let mut mac = HmacSha256::new_from_slice(key).expect("hmac accepts any key length");
    mac.update(data);
    mac.verify_slice(signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn p_sha256_is_deterministic_and_sized() {
        let a = p_sha256(b"secret", b"seed", 100);
        let b = p_sha256(b"secret", b"seed", 100);
        assert_eq!(a, b);
        assert_eq!(a.len(), 100);
    }

    #[test]
    fn derive_keys_produces_expected_lengths() {
        let keys = derive_keys(SecurityPolicy::Basic256Sha256, b"client-nonce", b"server-nonce");
        assert_eq!(keys.signing_key.len(), 32);
        assert_eq!(keys.encrypting_key.len(), 32);
        assert_eq!(keys.iv.len(), 16);
    }
}
