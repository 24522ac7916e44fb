use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Symmetric key for transaction payloads.
pub type PayloadKey = [u8; 32];

const KDF_ROUNDS: u32 = 10_000;
const CHECKSUM_LEN: usize = 4;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;

/// Boundary contract for the payload confidentiality collaborator.
///
/// Transaction payloads arrive and rest encrypted; this core only needs to
/// derive a key from the session secrets and open the envelope. A wrong key
/// or tampered ciphertext must fail, never produce garbage plaintext.
pub trait TransactionCipher: Send + Sync {
    fn derive_key(&self, passphrase: &str, salt: &str) -> PayloadKey;
    fn encrypt(&self, plaintext: &str, key: &PayloadKey) -> String;
    fn decrypt(&self, ciphertext: &str, key: &PayloadKey) -> Result<String>;
}

/// SHA-256 based cipher: iterated hashing for key derivation, a hash-counter
/// keystream for the payload, and a plaintext checksum inside the envelope so
/// decryption with the wrong key is detected.
#[derive(Debug, Default, Clone)]
pub struct Sha256StreamCipher;

impl Sha256StreamCipher {
    pub fn new() -> Self {
        Self
    }

    fn keystream_block(key: &PayloadKey, counter: u64) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(key);
        hasher.update(counter.to_le_bytes());
        hasher.finalize().into()
    }

    fn apply_keystream(key: &PayloadKey, data: &mut [u8]) {
        for (counter, chunk) in data.chunks_mut(32).enumerate() {
            let block = Self::keystream_block(key, counter as u64);
            for (byte, pad) in chunk.iter_mut().zip(block.iter()) {
                *byte ^= pad;
            }
        }
    }

    fn checksum(plaintext: &[u8]) -> [u8; CHECKSUM_LEN] {
        let digest = Sha256::digest(plaintext);
        let mut checksum = [0u8; CHECKSUM_LEN];
        checksum.copy_from_slice(&digest[..CHECKSUM_LEN]);
        checksum
    }
}

impl TransactionCipher for Sha256StreamCipher {
    fn derive_key(&self, passphrase: &str, salt: &str) -> PayloadKey {
        let mut material = Sha256::new()
            .chain_update(passphrase.as_bytes())
            .chain_update([0u8])
            .chain_update(salt.as_bytes())
            .finalize();
        for _ in 1..KDF_ROUNDS {
            material = Sha256::digest(material);
        }
        material.into()
    }

    fn encrypt(&self, plaintext: &str, key: &PayloadKey) -> String {
        let mut data = Vec::with_capacity(CHECKSUM_LEN + plaintext.len());
        data.extend_from_slice(&Self::checksum(plaintext.as_bytes()));
        data.extend_from_slice(plaintext.as_bytes());
        Self::apply_keystream(key, &mut data);
        BASE64.encode(data)
    }

    fn decrypt(&self, ciphertext: &str, key: &PayloadKey) -> Result<String> {
        let mut data = BASE64
            .decode(ciphertext)
            .map_err(|e| CryptoError::DecryptionFailed(format!("invalid envelope: {}", e)))?;
        if data.len() < CHECKSUM_LEN {
            return Err(CryptoError::DecryptionFailed(
                "envelope too short".to_string(),
            ));
        }

        Self::apply_keystream(key, &mut data);
        let (checksum, plaintext) = data.split_at(CHECKSUM_LEN);
        if checksum != Self::checksum(plaintext) {
            return Err(CryptoError::DecryptionFailed(
                "checksum mismatch, wrong key or corrupted data".to_string(),
            ));
        }

        String::from_utf8(plaintext.to_vec())
            .map_err(|_| CryptoError::DecryptionFailed("payload is not valid UTF-8".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let cipher = Sha256StreamCipher::new();
        let key = cipher.derive_key("correct horse", "battery-staple");
        let plaintext = r#"{"type":"buy","amount":1.5,"price":42000.0}"#;

        let ciphertext = cipher.encrypt(plaintext, &key);
        assert_ne!(ciphertext, plaintext);
        assert_eq!(cipher.decrypt(&ciphertext, &key).unwrap(), plaintext);
    }

    #[test]
    fn test_key_derivation_is_deterministic() {
        let cipher = Sha256StreamCipher::new();
        assert_eq!(
            cipher.derive_key("pass", "salt"),
            cipher.derive_key("pass", "salt")
        );
        assert_ne!(
            cipher.derive_key("pass", "salt"),
            cipher.derive_key("pass", "other-salt")
        );
    }

    #[test]
    fn test_wrong_key_is_rejected() {
        let cipher = Sha256StreamCipher::new();
        let key = cipher.derive_key("pass", "salt");
        let wrong_key = cipher.derive_key("pass", "wrong-salt");

        let ciphertext = cipher.encrypt("secret", &key);
        assert!(cipher.decrypt(&ciphertext, &wrong_key).is_err());
    }

    #[test]
    fn test_tampered_ciphertext_is_rejected() {
        let cipher = Sha256StreamCipher::new();
        let key = cipher.derive_key("pass", "salt");

        let ciphertext = cipher.encrypt("secret payload", &key);
        let mut raw = BASE64.decode(&ciphertext).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0xFF;
        let tampered = BASE64.encode(raw);

        assert!(cipher.decrypt(&tampered, &key).is_err());
    }

    #[test]
    fn test_garbage_is_rejected() {
        let cipher = Sha256StreamCipher::new();
        let key = cipher.derive_key("pass", "salt");
        assert!(cipher.decrypt("not base64 at all!!!", &key).is_err());
        assert!(cipher.decrypt("QQ==", &key).is_err());
    }
}
