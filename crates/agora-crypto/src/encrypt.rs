use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, KeyInit, OsRng, rand_core::RngCore},
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};

use crate::error::CryptoError;
use crate::keys::{DerivedKey, SALT_LEN, derive_key};

/// AES-GCM nonce length.
pub const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag length.
pub const TAG_LEN: usize = 16;

/// Smallest possible token body: salt + nonce + tag of an empty plaintext.
pub const MIN_TOKEN_BYTES: usize = SALT_LEN + NONCE_LEN + TAG_LEN;

/// Encryption envelope.
///
/// ```text
/// [0..16]   PBKDF2 salt
/// [16..28]  AES-GCM nonce
/// [28..]    ciphertext + 16-byte tag
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub salt: [u8; SALT_LEN],
    pub nonce: [u8; NONCE_LEN],
    pub ciphertext: Vec<u8>,
}

impl Envelope {
    /// Encrypt under a fresh random nonce. `salt` is the one `key` was derived with.
    pub fn seal(
        plaintext: &[u8],
        key: &DerivedKey,
        salt: [u8; SALT_LEN],
    ) -> Result<Self, CryptoError> {
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));

        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|_| CryptoError::EncryptionFailed)?;

        Ok(Self {
            salt,
            nonce,
            ciphertext,
        })
    }

    /// Decrypt and verify. Any tag mismatch is `AuthenticationFailed`.
    pub fn open(&self, key: &DerivedKey) -> Result<Vec<u8>, CryptoError> {
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));

        cipher
            .decrypt(Nonce::from_slice(&self.nonce), self.ciphertext.as_slice())
            .map_err(|_| CryptoError::AuthenticationFailed)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SALT_LEN + NONCE_LEN + self.ciphertext.len());
        out.extend_from_slice(&self.salt);
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() < MIN_TOKEN_BYTES {
            return Err(CryptoError::MalformedToken(format!(
                "truncated: {} bytes, need at least {}",
                bytes.len(),
                MIN_TOKEN_BYTES
            )));
        }

        let mut salt = [0u8; SALT_LEN];
        salt.copy_from_slice(&bytes[..SALT_LEN]);
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&bytes[SALT_LEN..SALT_LEN + NONCE_LEN]);

        Ok(Self {
            salt,
            nonce,
            ciphertext: bytes[SALT_LEN + NONCE_LEN..].to_vec(),
        })
    }

    /// URL-safe base64 without padding; safe in a path, query or fragment.
    pub fn to_token(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.to_bytes())
    }

    /// Parse a token. Standard-alphabet and padded input is tolerated.
    pub fn from_token(token: &str) -> Result<Self, CryptoError> {
        let normalized: String = token
            .trim()
            .trim_end_matches('=')
            .chars()
            .map(|c| match c {
                '+' => '-',
                '/' => '_',
                other => other,
            })
            .collect();

        let bytes = URL_SAFE_NO_PAD
            .decode(normalized.as_bytes())
            .map_err(|e| CryptoError::MalformedToken(e.to_string()))?;

        Self::from_bytes(&bytes)
    }
}

/// Seal `plaintext` and return the share token.
pub fn seal(
    plaintext: &[u8],
    key: &DerivedKey,
    salt: [u8; SALT_LEN],
) -> Result<String, CryptoError> {
    Ok(Envelope::seal(plaintext, key, salt)?.to_token())
}

/// Open a token with an already-derived key.
pub fn open(token: &str, key: &DerivedKey) -> Result<Vec<u8>, CryptoError> {
    Envelope::from_token(token)?.open(key)
}

/// Open a token by deriving the key from `passphrase` and the embedded salt.
pub fn open_with_passphrase(token: &str, passphrase: &str) -> Result<Vec<u8>, CryptoError> {
    let envelope = Envelope::from_token(token)?;
    let key = derive_key(passphrase, &envelope.salt);
    envelope.open(&key)
}
