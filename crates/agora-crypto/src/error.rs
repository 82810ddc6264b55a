use thiserror::Error;

/// Failures of the crypto layer. All of them mean "cannot decrypt" to a
/// caller; none of them ever yields partial plaintext.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Wrong passphrase, or the ciphertext was tampered with.
    #[error("authentication failed: wrong passphrase or tampered token")]
    AuthenticationFailed,

    #[error("malformed token: {0}")]
    MalformedToken(String),

    #[error("unsupported key length: expected 32 bytes, got {0}")]
    InvalidKeyLength(usize),

    #[error("encryption failed")]
    EncryptionFailed,
}
