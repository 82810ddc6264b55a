/// Agora Crypto Library
///
/// Passphrase-protected share tokens:
/// - PBKDF2-HMAC-SHA256 (100k iterations) stretches a passphrase + 16-byte salt
///   into an AES-256 key
/// - AES-256-GCM seals the payload under a fresh 12-byte nonce
/// - salt || nonce || ciphertext travels as one URL-safe base64 token

pub mod encrypt;
pub mod error;
pub mod keys;

pub use encrypt::{Envelope, open, open_with_passphrase, seal};
pub use error::CryptoError;
pub use keys::{DerivedKey, KEY_LEN, PBKDF2_ITERATIONS, SALT_LEN, derive_key, generate_salt};
