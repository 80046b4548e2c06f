use aes::cipher::{block_padding::NoPadding, BlockDecryptMut, BlockEncryptMut, KeyIvInit};

use crate::security_policy::SecurityPolicy;

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// A symmetric key bound to the policy it was derived under. Chunk
/// bodies are always padded to the cipher's block size before this is
/// called (the chunker computes the padding), so encryption here never
/// needs to pad itself.
#[derive(Clone)]
pub struct AesKey {
    policy: SecurityPolicy,
    key: Vec<u8>,
}

impl AesKey {
    pub fn new(policy: SecurityPolicy, key: &[u8]) -> Self {
        Self {
            policy,
            key: key.to_vec(),
        }
    }

    pub fn block_size(&self) -> usize {
        16
    }

    pub fn encrypt(&self, data: &[u8], iv: &[u8]) -> Result<Vec<u8>, String> {
        match self.policy {
            SecurityPolicy::None => Ok(data.to_vec()),
            SecurityPolicy::Basic256Sha256 | SecurityPolicy::Aes256Sha256RsaPss => {
                let cipher = Aes256CbcEnc::new_from_slices(&self.key, iv)
                    .map_err(|e| e.to_string())?;
                Ok(cipher.encrypt_padded_vec_mut::<NoPadding>(data))
            }
            SecurityPolicy::Aes128Sha256RsaOaep => {
                let cipher = Aes128CbcEnc::new_from_slices(&self.key, iv)
                    .map_err(|e| e.to_string())?;
                Ok(cipher.encrypt_padded_vec_mut::<NoPadding>(data))
            }
        }
    }

    pub fn decrypt(&self, data: &[u8], iv: &[u8]) -> Result<Vec<u8>, String> {
        match self.policy {
            SecurityPolicy::None => Ok(data.to_vec()),
            SecurityPolicy::Basic256Sha256 | SecurityPolicy::Aes256Sha256RsaPss => {
                let cipher = Aes256CbcDec::new_from_slices(&self.key, iv)
                    .map_err(|e| e.to_string())?;
                cipher
                    .decrypt_padded_vec_mut::<NoPadding>(data)
                    .map_err(|e| e.to_string())
            }
            SecurityPolicy::Aes128Sha256RsaOaep => {
                let cipher = Aes128CbcDec::new_from_slices(&self.key, iv)
                    .map_err(|e| e.to_string())?;
                cipher
                    .decrypt_padded_vec_mut::<NoPadding>(data)
                    .map_err(|e| e.to_string())
            }
        }
    }
}
