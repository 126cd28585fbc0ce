//! AES-CBC encryption and decryption of stored values.
//!
//! **Algorithm choice:** AES in CBC mode with PKCS#7 padding and a fixed,
//! pre-shared key and IV. Identical plaintext always produces identical
//! ciphertext, which keeps records written by other clients of the same
//! envelope format readable.
//!
//! This provides no authentication. A tampered ciphertext either fails to
//! unpad (and decrypts to empty text) or decrypts to garbage.

use aes::cipher::{
    block_padding::Pkcs7, generic_array::GenericArray, BlockDecryptMut, BlockEncryptMut,
    KeyIvInit,
};
use aes::{Aes128, Aes192, Aes256};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Historical default key (UTF-8 bytes, 16 bytes = AES-128).
pub const DEFAULT_SECRET_KEY: &str = "3333e6e143439161";

/// Historical default initialisation vector (UTF-8 bytes).
pub const DEFAULT_SECRET_IV: &str = "e3bbe7e3ba84431a";

/// Byte length of the CBC initialisation vector (one AES block).
pub const IV_LEN: usize = 16;

/// Separates the ciphertext from the clear JSON in structured output.
pub const STRUCTURED_SEPARATOR: char = '|';

/// Errors produced by the cipher layer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CipherError {
    /// The key is not 16, 24 or 32 bytes long.
    #[error("invalid key length: expected 16, 24 or 32 bytes, got {0}")]
    InvalidKeyLength(usize),

    /// The IV is not [`IV_LEN`] bytes long.
    #[error("invalid IV length: expected {IV_LEN} bytes, got {0}")]
    InvalidIvLength(usize),
}

#[derive(Clone)]
enum KeyBytes {
    Aes128([u8; 16]),
    Aes192([u8; 24]),
    Aes256([u8; 32]),
}

/// Key and IV material. Zeroed on drop, never printed.
#[derive(Clone)]
struct SecretKey {
    key: KeyBytes,
    iv: [u8; IV_LEN],
}

impl Drop for SecretKey {
    fn drop(&mut self) {
        match &mut self.key {
            KeyBytes::Aes128(k) => k.fill(0),
            KeyBytes::Aes192(k) => k.fill(0),
            KeyBytes::Aes256(k) => k.fill(0),
        }
        self.iv.fill(0);
    }
}

/// Symmetric cipher adapter with a fixed key and IV.
///
/// The AES variant is chosen from the key length: 16 bytes selects AES-128,
/// 24 bytes AES-192 and 32 bytes AES-256.
#[derive(Clone)]
pub struct Cipher {
    secret: SecretKey,
}

impl std::fmt::Debug for Cipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material.
        f.debug_struct("Cipher")
            .field("algorithm", &self.algorithm())
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl Default for Cipher {
    fn default() -> Self {
        let mut key = [0u8; 16];
        key.copy_from_slice(DEFAULT_SECRET_KEY.as_bytes());
        let mut iv = [0u8; IV_LEN];
        iv.copy_from_slice(DEFAULT_SECRET_IV.as_bytes());
        Self {
            secret: SecretKey {
                key: KeyBytes::Aes128(key),
                iv,
            },
        }
    }
}

impl Cipher {
    /// Build a cipher from raw key and IV bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidKeyLength`] if `key` is not 16, 24 or 32 bytes.
    /// Returns [`CipherError::InvalidIvLength`] if `iv` is not [`IV_LEN`] bytes.
    pub fn new(key: &[u8], iv: &[u8]) -> Result<Self, CipherError> {
        let key = match key.len() {
            16 => KeyBytes::Aes128(copy_array(key)),
            24 => KeyBytes::Aes192(copy_array(key)),
            32 => KeyBytes::Aes256(copy_array(key)),
            n => return Err(CipherError::InvalidKeyLength(n)),
        };
        if iv.len() != IV_LEN {
            return Err(CipherError::InvalidIvLength(iv.len()));
        }
        Ok(Self {
            secret: SecretKey {
                key,
                iv: copy_array(iv),
            },
        })
    }

    /// Name of the block cipher selected by the key length.
    pub fn algorithm(&self) -> &'static str {
        match self.secret.key {
            KeyBytes::Aes128(_) => "AES-128-CBC",
            KeyBytes::Aes192(_) => "AES-192-CBC",
            KeyBytes::Aes256(_) => "AES-256-CBC",
        }
    }

    /// Encrypt an arbitrary JSON value.
    ///
    /// Objects and arrays are serialised first and returned as
    /// `<hex>|<json>`, with the JSON in clear. Scalars are coerced to text
    /// (`null` becomes empty text) and only the hex ciphertext is returned.
    pub fn encrypt(&self, data: &Value) -> String {
        match data {
            Value::Object(_) | Value::Array(_) => {
                let text = data.to_string();
                let mut out = self.encrypt_text(&text);
                out.push(STRUCTURED_SEPARATOR);
                out.push_str(&text);
                out
            }
            Value::Null => self.encrypt_text(""),
            Value::String(s) => self.encrypt_text(s),
            other => self.encrypt_text(&other.to_string()),
        }
    }

    /// Encrypt text and return the lowercase hex ciphertext.
    pub fn encrypt_text(&self, text: &str) -> String {
        hex::encode(self.encrypt_bytes(text.as_bytes()))
    }

    /// Decrypt a hex ciphertext back to text.
    ///
    /// Absent or empty input yields empty text. Structured output is accepted:
    /// only the part before the first `|` is decrypted. Malformed hex, a
    /// ciphertext that fails to unpad, or plaintext that is not UTF-8 all yield
    /// empty text rather than an error; callers must not assume the result
    /// parses.
    pub fn decrypt(&self, data: Option<&str>) -> String {
        let data = match data {
            Some(d) if !d.is_empty() => d,
            _ => return String::new(),
        };
        let hex_part = data
            .split_once(STRUCTURED_SEPARATOR)
            .map_or(data, |(head, _)| head);

        let ciphertext = match hex::decode(hex_part) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(error = %e, "ciphertext is not valid hex");
                return String::new();
            }
        };
        let plaintext = match self.decrypt_bytes(&ciphertext) {
            Some(bytes) => bytes,
            None => {
                debug!(len = ciphertext.len(), "ciphertext failed to decrypt");
                return String::new();
            }
        };
        String::from_utf8(plaintext).unwrap_or_else(|_| {
            debug!("decrypted plaintext is not valid UTF-8");
            String::new()
        })
    }

    fn encrypt_bytes(&self, plaintext: &[u8]) -> Vec<u8> {
        let iv = GenericArray::from_slice(&self.secret.iv);
        match &self.secret.key {
            KeyBytes::Aes128(k) => cbc::Encryptor::<Aes128>::new(GenericArray::from_slice(k), iv)
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
            KeyBytes::Aes192(k) => cbc::Encryptor::<Aes192>::new(GenericArray::from_slice(k), iv)
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
            KeyBytes::Aes256(k) => cbc::Encryptor::<Aes256>::new(GenericArray::from_slice(k), iv)
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        }
    }

    fn decrypt_bytes(&self, ciphertext: &[u8]) -> Option<Vec<u8>> {
        if ciphertext.is_empty() || ciphertext.len() % IV_LEN != 0 {
            return None;
        }
        let iv = GenericArray::from_slice(&self.secret.iv);
        let result = match &self.secret.key {
            KeyBytes::Aes128(k) => cbc::Decryptor::<Aes128>::new(GenericArray::from_slice(k), iv)
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
            KeyBytes::Aes192(k) => cbc::Decryptor::<Aes192>::new(GenericArray::from_slice(k), iv)
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
            KeyBytes::Aes256(k) => cbc::Decryptor::<Aes256>::new(GenericArray::from_slice(k), iv)
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        };
        result.ok()
    }
}

fn copy_array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_key_matches_known_ciphertext() {
        let cipher = Cipher::default();
        assert_eq!(cipher.algorithm(), "AES-128-CBC");
        assert_eq!(cipher.encrypt_text("hello"), "2f8bad54e7db8fc35b7dea52b7b35762");
        assert_eq!(cipher.encrypt_text(""), "e2289867c6db080fc27429d358222af0");
    }

    #[test]
    fn encrypt_decrypt_round_trip() {
        let cipher = Cipher::default();
        let encrypted = cipher.encrypt_text("123-45-6789");
        assert_eq!(cipher.decrypt(Some(&encrypted)), "123-45-6789");
    }

    #[test]
    fn encryption_is_deterministic() {
        let cipher = Cipher::default();
        assert_eq!(cipher.encrypt_text("same"), cipher.encrypt_text("same"));
    }

    #[test]
    fn scalars_are_coerced_to_text() {
        let cipher = Cipher::default();
        assert_eq!(cipher.encrypt(&json!(42)), "4d7b9f9d288a8ca71558cfb5f1f25aea");
        assert_eq!(cipher.encrypt(&json!("hello")), cipher.encrypt_text("hello"));
        assert_eq!(cipher.encrypt(&json!(true)), cipher.encrypt_text("true"));
        assert_eq!(cipher.encrypt(&Value::Null), cipher.encrypt_text(""));
    }

    #[test]
    fn structured_values_leak_their_serialisation() {
        let cipher = Cipher::default();
        let out = cipher.encrypt(&json!({"id": 42}));
        assert_eq!(out, "b95bd8d8aaf7ccfd240354991205e937|{\"id\":42}");
        let (_, clear) = out.split_once(STRUCTURED_SEPARATOR).unwrap();
        assert_eq!(clear, r#"{"id":42}"#);
    }

    #[test]
    fn structured_output_still_decrypts() {
        let cipher = Cipher::default();
        let out = cipher.encrypt(&json!([1, 2, 3]));
        assert_eq!(cipher.decrypt(Some(&out)), "[1,2,3]");
    }

    #[test]
    fn absent_or_empty_input_decrypts_to_empty() {
        let cipher = Cipher::default();
        assert_eq!(cipher.decrypt(None), "");
        assert_eq!(cipher.decrypt(Some("")), "");
    }

    #[test]
    fn malformed_ciphertext_decrypts_to_empty() {
        let cipher = Cipher::default();
        assert_eq!(cipher.decrypt(Some("not hex at all")), "");
        assert_eq!(cipher.decrypt(Some("abcd")), "");
        // Valid length, wrong padding once decrypted.
        assert_eq!(cipher.decrypt(Some(&"00".repeat(16))), "");
    }

    #[test]
    fn wrong_key_does_not_recover_plaintext() {
        let a = Cipher::default();
        let b = Cipher::new(&[7u8; 32], &[9u8; IV_LEN]).unwrap();
        let encrypted = a.encrypt_text("secret");
        assert_ne!(b.decrypt(Some(&encrypted)), "secret");
    }

    #[test]
    fn key_length_selects_algorithm() {
        assert_eq!(Cipher::new(&[1u8; 24], &[0u8; 16]).unwrap().algorithm(), "AES-192-CBC");
        assert_eq!(Cipher::new(&[1u8; 32], &[0u8; 16]).unwrap().algorithm(), "AES-256-CBC");
    }

    #[test]
    fn invalid_lengths_rejected() {
        assert_eq!(
            Cipher::new(&[0u8; 15], &[0u8; 16]).unwrap_err(),
            CipherError::InvalidKeyLength(15)
        );
        assert_eq!(
            Cipher::new(&[0u8; 16], &[0u8; 8]).unwrap_err(),
            CipherError::InvalidIvLength(8)
        );
    }

    #[test]
    fn key_material_redacted_in_debug() {
        let cipher = Cipher::default();
        let text = format!("{cipher:?}");
        assert!(text.contains("REDACTED"));
        assert!(!text.contains(DEFAULT_SECRET_KEY));
    }
}
