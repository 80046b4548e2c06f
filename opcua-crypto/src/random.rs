use rand::RngCore;

/// Generates a cryptographically random nonce of the given length, used
/// both for the client/server nonce exchange in OpenSecureChannel and for
/// deriving symmetric keys from it via [`crate::keys::derive_keys`].
pub fn random_nonce(length: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; length];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

pub fn random_byte_string(length: usize) -> Vec<u8> {
    random_nonce(length)
}
