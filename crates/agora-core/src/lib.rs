/// Agora board engine.
///
/// Decision rules for agenda items, the sanitization gate for untrusted
/// board data, the share payload codec and encrypted share links, link
/// expiry, the local board cache and the session that ties them together.

pub mod analytics;
pub mod cache;
pub mod clock;
pub mod codec;
pub mod config;
pub mod decision;
pub mod error;
pub mod expiry;
pub mod passphrase;
pub mod prompt;
pub mod sanitize;
pub mod session;
pub mod share;
pub mod sync;

pub use analytics::MeetingAnalytics;
pub use cache::BoardCache;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::AgoraConfig;
pub use decision::NewAgendaItem;
pub use error::{BoardError, ErrorKind, Result};
pub use expiry::ShareTtl;
pub use prompt::{
    FixedPassphrase, PassphraseEntry, PassphraseProvider, PassphrasePrompt, PromptPurpose,
};
pub use session::BoardSession;
pub use share::{MAX_SHARE_URL_LEN, ShareLink};
pub use sync::run_sync_loop;
