// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! AES-256-GCM encryption of individual profile fields.
//!
//! Stored format is `base64(nonce || ciphertext || tag)` with a 12-byte random
//! nonce and no associated data.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::rand::{SecureRandom, SystemRandom};
use std::sync::Arc;

/// Length of the hex-encoded key.
pub const KEY_HEX_LEN: usize = 64;

/// Field cipher errors.
#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    #[error("Encryption key must be 64 hex characters")]
    InvalidKey,

    #[error("Ciphertext too short")]
    CiphertextTooShort,

    #[error("Decryption failed")]
    DecryptionFailed,

    #[error("Encryption failed")]
    EncryptionFailed,
}

/// Server-wide field cipher.
#[derive(Clone)]
pub struct FieldCipher {
    key: Arc<LessSafeKey>,
    rng: SystemRandom,
}

impl std::fmt::Debug for FieldCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldCipher").finish_non_exhaustive()
    }
}

impl FieldCipher {
    /// Build a cipher from a 64-character hex key.
    pub fn from_hex(key_hex: &str) -> Result<Self, CipherError> {
        let key_hex = key_hex.trim();
        if key_hex.len() != KEY_HEX_LEN {
            return Err(CipherError::InvalidKey);
        }
        let key_bytes = hex::decode(key_hex).map_err(|_| CipherError::InvalidKey)?;
        let unbound =
            UnboundKey::new(&AES_256_GCM, &key_bytes).map_err(|_| CipherError::InvalidKey)?;

        Ok(Self {
            key: Arc::new(LessSafeKey::new(unbound)),
            rng: SystemRandom::new(),
        })
    }

    /// Encrypt a field value. Every call draws a fresh nonce.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|_| CipherError::EncryptionFailed)?;

        let mut in_out = plaintext.as_bytes().to_vec();
        self.key
            .seal_in_place_append_tag(
                Nonce::assume_unique_for_key(nonce_bytes),
                Aad::empty(),
                &mut in_out,
            )
            .map_err(|_| CipherError::EncryptionFailed)?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + in_out.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&in_out);
        Ok(BASE64.encode(sealed))
    }

    /// Decrypt a stored field value.
    pub fn decrypt(&self, encoded: &str) -> Result<String, CipherError> {
        let sealed = BASE64
            .decode(encoded.trim())
            .map_err(|_| CipherError::DecryptionFailed)?;
        if sealed.len() < NONCE_LEN {
            return Err(CipherError::CiphertextTooShort);
        }

        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
        let nonce = Nonce::try_assume_unique_for_key(nonce_bytes)
            .map_err(|_| CipherError::CiphertextTooShort)?;

        let mut in_out = ciphertext.to_vec();
        let plaintext = self
            .key
            .open_in_place(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| CipherError::DecryptionFailed)?;

        String::from_utf8(plaintext.to_vec()).map_err(|_| CipherError::DecryptionFailed)
    }
}
