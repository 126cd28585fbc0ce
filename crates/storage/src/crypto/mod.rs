//! AES-CBC value encryption primitives.
//!
//! This module is intentionally free of storage dependencies.
//! It provides the encrypt/decrypt pair the store wraps envelopes with.
//!
//! # Ciphertext format
//!
//! ```text
//! scalar:     <lowercase-hex(AES-CBC-PKCS7(text))>
//! structured: <lowercase-hex(AES-CBC-PKCS7(json))>|<json>
//! ```
//!
//! The structured form carries its JSON in clear after the separator. Records
//! written by the store never use it: envelopes are encrypted as text.

pub mod cipher;

pub use cipher::{Cipher, CipherError, DEFAULT_SECRET_IV, DEFAULT_SECRET_KEY};
