use std::future::Future;

use crate::expiry::ShareTtl;

/// Why a passphrase is being requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptPurpose {
    /// Minting a new link: the answer needs a confirmation and may carry a
    /// lifetime and a hint.
    Share,
    /// Opening a link; the hint shipped with it, if any, is shown.
    Open { hint: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassphraseEntry {
    pub passphrase: String,
    pub confirmed: Option<String>,
    pub ttl: ShareTtl,
    pub hint: Option<String>,
}

impl PassphraseEntry {
    pub fn new(passphrase: impl Into<String>) -> Self {
        let passphrase = passphrase.into();
        Self {
            confirmed: Some(passphrase.clone()),
            passphrase,
            ttl: ShareTtl::default(),
            hint: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassphrasePrompt {
    Cancelled,
    Provided(PassphraseEntry),
}

/// Source of passphrases: an interactive form, a terminal, an env var.
pub trait PassphraseProvider {
    fn request(&self, purpose: PromptPurpose) -> impl Future<Output = PassphrasePrompt> + Send;
}

/// Answers every prompt the same way.
#[derive(Debug, Clone)]
pub struct FixedPassphrase(pub PassphrasePrompt);

impl FixedPassphrase {
    pub fn provided(entry: PassphraseEntry) -> Self {
        Self(PassphrasePrompt::Provided(entry))
    }

    pub fn cancelled() -> Self {
        Self(PassphrasePrompt::Cancelled)
    }
}

impl PassphraseProvider for FixedPassphrase {
    async fn request(&self, _purpose: PromptPurpose) -> PassphrasePrompt {
        self.0.clone()
    }
}
