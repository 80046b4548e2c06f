use std::fmt;

/// The security policies this server core negotiates during HEL/OPN.
/// Actual signing/encryption is delegated to the functions in
/// [`crate::keys`]; this enum only carries the policy identity and its
/// associated algorithm parameters (key/block/signature sizes) needed to
/// size chunk padding and signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecurityPolicy {
    None,
    Basic256Sha256,
    Aes128Sha256RsaOaep,
    Aes256Sha256RsaPss,
}

impl SecurityPolicy {
    pub fn uri(&self) -> &'static str {
        match self {
            SecurityPolicy::None => "http://opcfoundation.org/UA/SecurityPolicy#None",
            SecurityPolicy::Basic256Sha256 => {
                "http://opcfoundation.org/UA/SecurityPolicy#Basic256Sha256"
            }
            SecurityPolicy::Aes128Sha256RsaOaep => {
                "http://opcfoundation.org/UA/SecurityPolicy#Aes128_Sha256_RsaOaep"
            }
            SecurityPolicy::Aes256Sha256RsaPss => {
                "http://opcfoundation.org/UA/SecurityPolicy#Aes256_Sha256_RsaPss"
            }
        }
    }

    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            "http://opcfoundation.org/UA/SecurityPolicy#None" => Some(SecurityPolicy::None),
            "http://opcfoundation.org/UA/SecurityPolicy#Basic256Sha256" => {
                Some(SecurityPolicy::Basic256Sha256)
            }
            "http://opcfoundation.org/UA/SecurityPolicy#Aes128_Sha256_RsaOaep" => {
                Some(SecurityPolicy::Aes128Sha256RsaOaep)
            }
            "http://opcfoundation.org/UA/SecurityPolicy#Aes256_Sha256_RsaPss" => {
                Some(SecurityPolicy::Aes256Sha256RsaPss)
            }
            _ => None,
        }
    }

    pub fn is_encrypted(&self) -> bool {
        !matches!(self, SecurityPolicy::None)
    }

    /// Symmetric key length in bytes for this policy's block cipher.
    pub fn symmetric_key_size(&self) -> usize {
        match self {
            SecurityPolicy::None => 0,
            SecurityPolicy::Basic256Sha256 => 32,
            SecurityPolicy::Aes128Sha256RsaOaep => 16,
            SecurityPolicy::Aes256Sha256RsaPss => 32,
        }
    }

    pub fn block_size(&self) -> usize {
        if matches!(self, SecurityPolicy::None) {
            1
        } else {
            16
        }
    }

    pub fn signature_size(&self) -> usize {
        match self {
            SecurityPolicy::None => 0,
            _ => 32, // HMAC-SHA256
        }
    }

    pub fn symmetric_signing_key_size(&self) -> usize {
        match self {
            SecurityPolicy::None => 0,
            _ => 32,
        }
    }
}

impl Default for SecurityPolicy {
    fn default() -> Self {
        SecurityPolicy::None
    }
}

impl fmt::Display for SecurityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.uri())
    }
}
