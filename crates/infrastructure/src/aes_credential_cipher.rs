//! AES-256-GCM cipher for provider credentials at rest.

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use paygate_application::CredentialCipher;
use paygate_core::{AppError, AppResult};

const NONCE_LENGTH: usize = 12;

/// Encrypts tenant provider credentials before they reach the store.
///
/// Stored values are the random nonce followed by the GCM ciphertext.
#[derive(Clone)]
pub struct AesCredentialCipher {
    cipher: Aes256Gcm,
}

impl AesCredentialCipher {
    /// Creates a cipher from a 32-byte key.
    #[must_use]
    pub fn new(key_bytes: &[u8; 32]) -> Self {
        Self {
            cipher: Aes256Gcm::new(key_bytes.into()),
        }
    }

    /// Creates a cipher from the hex-encoded `CREDENTIAL_ENCRYPTION_KEY`.
    pub fn from_hex(hex_key: &str) -> AppResult<Self> {
        let decoded = hex::decode(hex_key.trim()).map_err(|error| {
            AppError::Validation(format!("invalid CREDENTIAL_ENCRYPTION_KEY hex: {error}"))
        })?;

        let key: [u8; 32] = decoded.try_into().map_err(|_| {
            AppError::Validation(
                "CREDENTIAL_ENCRYPTION_KEY must be exactly 32 bytes (64 hex chars)".to_owned(),
            )
        })?;

        Ok(Self::new(&key))
    }
}

impl CredentialCipher for AesCredentialCipher {
    fn encrypt(&self, plaintext: &[u8]) -> AppResult<Vec<u8>> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self.cipher.encrypt(&nonce, plaintext).map_err(|error| {
            AppError::Internal(format!("failed to encrypt provider credential: {error}"))
        })?;

        let mut sealed = Vec::with_capacity(NONCE_LENGTH + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    fn decrypt(&self, sealed: &[u8]) -> AppResult<Vec<u8>> {
        if sealed.len() <= NONCE_LENGTH {
            return Err(AppError::Internal(
                "stored provider credential is truncated".to_owned(),
            ));
        }

        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LENGTH);
        let nonce_array: [u8; NONCE_LENGTH] = nonce_bytes
            .try_into()
            .map_err(|_| AppError::Internal("credential nonce must be 12 bytes".to_owned()))?;

        self.cipher
            .decrypt(&Nonce::from(nonce_array), ciphertext)
            .map_err(|error| {
                AppError::Internal(format!("failed to decrypt provider credential: {error}"))
            })
    }
}

#[cfg(test)]
mod tests {
    use paygate_application::CredentialCipher;
    use paygate_core::AppResult;

    use super::AesCredentialCipher;

    #[test]
    fn sealed_credentials_open_with_the_same_key() -> AppResult<()> {
        let cipher = AesCredentialCipher::new(&[7_u8; 32]);

        let sealed = cipher.encrypt(b"sk_test_acme")?;

        assert_ne!(&sealed[12..], b"sk_test_acme".as_slice());
        assert_eq!(cipher.decrypt(&sealed)?, b"sk_test_acme");
        Ok(())
    }

    #[test]
    fn every_seal_uses_a_fresh_nonce() -> AppResult<()> {
        let cipher = AesCredentialCipher::new(&[7_u8; 32]);

        let first = cipher.encrypt(b"sk_test_acme")?;
        let second = cipher.encrypt(b"sk_test_acme")?;

        assert_ne!(first, second);
        Ok(())
    }

    #[test]
    fn other_keys_and_truncated_values_are_rejected() -> AppResult<()> {
        let sealed = AesCredentialCipher::new(&[7_u8; 32]).encrypt(b"sk_test_acme")?;
        let other = AesCredentialCipher::new(&[8_u8; 32]);

        assert!(other.decrypt(&sealed).is_err());
        assert!(other.decrypt(&sealed[..12]).is_err());
        Ok(())
    }

    #[test]
    fn hex_keys_must_decode_to_32_bytes() {
        assert!(AesCredentialCipher::from_hex(&"ab".repeat(32)).is_ok());
        assert!(AesCredentialCipher::from_hex(&"ab".repeat(16)).is_err());
        assert!(AesCredentialCipher::from_hex("not-hex").is_err());
    }
}
