use std::sync::Arc;

use rand::Rng;
use rand::distr::Alphanumeric;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use agora_store::StoreChain;
use agora_types::{Board, ItemStatus, Participant, Role};

use crate::analytics::MeetingAnalytics;
use crate::cache::BoardCache;
use crate::clock::Clock;
use crate::config::AgoraConfig;
use crate::decision::{self, NewAgendaItem};
use crate::error::{BoardError, Result};
use crate::expiry::ShareTtl;
use crate::passphrase;
use crate::prompt::{PassphraseProvider, PassphrasePrompt, PromptPurpose};
use crate::sanitize::{self, MAX_NAME_CHARS, MAX_PARTICIPANTS, MAX_TITLE_CHARS};
use crate::share::{self, ShareLink, ShareRequest};

const BOARD_ID_SUFFIX_LEN: usize = 9;

/// One user's view of one board.
///
/// Every mutation is written through to the local cache before it returns;
/// `sync` picks up changes another session wrote to the same cache.
pub struct BoardSession {
    config: AgoraConfig,
    cache: BoardCache,
    clock: Arc<dyn Clock>,
    board: Option<Board>,
    user: Option<String>,
    fingerprint: Option<String>,
}

impl BoardSession {
    pub fn new(config: AgoraConfig, store: StoreChain, clock: Arc<dyn Clock>) -> Self {
        let cache =
            BoardCache::new(store, config.namespace.clone(), config.cache_ttl, clock.clone());
        Self {
            config,
            cache,
            clock,
            board: None,
            user: None,
            fingerprint: None,
        }
    }

    pub fn config(&self) -> &AgoraConfig {
        &self.config
    }

    pub fn board(&self) -> Option<&Board> {
        self.board.as_ref()
    }

    pub fn current_user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// Owned copy of the open board.
    pub fn snapshot(&self) -> Result<Board> {
        self.open_board().cloned()
    }

    pub fn analytics(&self) -> Result<MeetingAnalytics> {
        Ok(MeetingAnalytics::compute(self.open_board()?))
    }

    pub fn create_board(&mut self, title: &str, creator: &str) -> Result<&Board> {
        let title = sanitize::plain_text(title, MAX_TITLE_CHARS);
        if title.is_empty() {
            return Err(BoardError::validation("board title is required"));
        }
        let creator = participant_name(creator)?;
        let now = self.clock.now();

        let board = Board {
            id: generate_board_id(),
            title,
            creator: creator.clone(),
            created_at: now,
            participants: vec![Participant {
                name: creator.clone(),
                role: Role::Admin,
                joined_at: now,
            }],
            agenda_items: vec![],
            settings: Default::default(),
        };
        info!("Created board {} for {}", board.id, creator);

        self.board = Some(board);
        self.user = Some(creator);
        self.persist()?;
        self.open_board()
    }

    /// Load a cached board without joining it.
    pub fn load_board(&mut self, board_id: &str) -> Result<&Board> {
        let board = self.cache.load(board_id)?;
        self.fingerprint = Some(fingerprint(&board)?);
        self.board = Some(board);
        self.user = None;
        self.open_board()
    }

    /// Join `board_id` as `name`. Re-joining under an existing name resumes
    /// that participant instead of adding a duplicate.
    pub fn join_board(&mut self, board_id: &str, name: &str) -> Result<&Board> {
        if self.board.as_ref().is_none_or(|b| b.id != board_id) {
            self.load_board(board_id)?;
        }
        let name = participant_name(name)?;
        let now = self.clock.now();
        let board = self.open_board_mut()?;

        if board.participant(&name).is_none() {
            if board.participants.len() >= MAX_PARTICIPANTS {
                return Err(BoardError::validation(format!(
                    "board already has {} participants",
                    MAX_PARTICIPANTS
                )));
            }
            board.participants.push(Participant {
                name: name.clone(),
                role: Role::Member,
                joined_at: now,
            });
            decision::recompute_board(board, now);
            info!("{} joined board {}", name, board.id);
            self.user = Some(name);
            self.persist()?;
        } else {
            self.user = Some(name);
        }
        self.open_board()
    }

    /// Resume as an existing participant.
    pub fn act_as(&mut self, name: &str) -> Result<()> {
        let board = self.open_board()?;
        let name = sanitize::plain_text(name, MAX_NAME_CHARS);
        if board.participant(&name).is_none() {
            return Err(BoardError::validation(format!(
                "{} has not joined board {}",
                name, board.id
            )));
        }
        self.user = Some(name);
        Ok(())
    }

    pub fn add_agenda_item(&mut self, request: NewAgendaItem) -> Result<String> {
        let user = self.require_user()?;
        let now = self.clock.now();
        let id = decision::add_item(self.open_board_mut()?, &user, request, now)?;
        self.persist()?;
        Ok(id)
    }

    pub fn vote(&mut self, item_id: &str, option: &str) -> Result<ItemStatus> {
        let user = self.require_user()?;
        let now = self.clock.now();
        let status = decision::cast_vote(self.open_board_mut()?, item_id, &user, option, now)?;
        self.persist()?;
        Ok(status)
    }

    pub fn complete_item(&mut self, item_id: &str) -> Result<()> {
        let user = self.require_user()?;
        let now = self.clock.now();
        decision::complete_item(self.open_board_mut()?, item_id, &user, now)?;
        self.persist()
    }

    /// Encrypt the open board into a share link valid for `ttl`.
    pub async fn build_share_url(
        &self,
        passphrase: &str,
        hint: Option<&str>,
        ttl: ShareTtl,
    ) -> Result<String> {
        let base = self.config.share_base();
        share::build_share_url(
            self.open_board()?,
            ShareRequest {
                base: &base,
                passphrase,
                hint,
                ttl,
                now: self.clock.now(),
            },
        )
        .await
    }

    pub async fn share_with_prompt<P: PassphraseProvider>(&self, provider: &P) -> Result<String> {
        self.open_board()?;
        let entry = match provider.request(PromptPurpose::Share).await {
            PassphrasePrompt::Cancelled => return Err(BoardError::Cancelled),
            PassphrasePrompt::Provided(entry) => entry,
        };
        let confirmed = entry
            .confirmed
            .as_deref()
            .ok_or_else(|| BoardError::validation("passphrase must be entered twice"))?;
        passphrase::confirm(&entry.passphrase, confirmed)?;

        self.build_share_url(&entry.passphrase, entry.hint.as_deref(), entry.ttl)
            .await
    }

    /// Open a board from its id and optional share token.
    ///
    /// Without a token the board must already be in the local cache. With
    /// one, the provider is asked for the passphrase and the decrypted board
    /// replaces any cached copy.
    pub async fn open_shared_link<P: PassphraseProvider>(
        &mut self,
        board_id: &str,
        token: Option<&str>,
        hint: Option<&str>,
        provider: &P,
    ) -> Result<&Board> {
        let Some(token) = token else {
            return self.load_board(board_id);
        };

        let purpose = PromptPurpose::Open {
            hint: hint.map(str::to_string),
        };
        let entry = match provider.request(purpose).await {
            PassphrasePrompt::Cancelled => return Err(BoardError::Cancelled),
            PassphrasePrompt::Provided(entry) => entry,
        };

        let board =
            share::open_shared_board(board_id, token, &entry.passphrase, self.clock.now()).await?;
        info!(
            "Opened shared board {} ({} participants, {} items)",
            board.id,
            board.participant_count(),
            board.agenda_items.len()
        );
        self.board = Some(board);
        self.user = None;
        self.persist()?;
        self.open_board()
    }

    pub async fn open_url<P: PassphraseProvider>(
        &mut self,
        url: &str,
        provider: &P,
    ) -> Result<&Board> {
        let link = ShareLink::parse(url)?;
        self.open_shared_link(&link.board_id, link.token.as_deref(), link.hint.as_deref(), provider)
            .await
    }

    /// Reload the open board from the cache. Returns true when the cached
    /// copy differs from the one in memory, which it then replaces.
    pub fn sync(&mut self) -> Result<bool> {
        let Some(board_id) = self.board.as_ref().map(|b| b.id.clone()) else {
            return Ok(false);
        };

        let latest = match self.cache.load(&board_id) {
            Ok(board) => board,
            Err(BoardError::NotFound(_)) => {
                warn!("Board {} is no longer in the local cache", board_id);
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        let latest_fingerprint = fingerprint(&latest)?;
        if self.fingerprint.as_deref() == Some(latest_fingerprint.as_str()) {
            return Ok(false);
        }

        info!("Board {} changed elsewhere, reloading", board_id);
        self.board = Some(latest);
        self.fingerprint = Some(latest_fingerprint);
        Ok(true)
    }

    pub fn purge_expired(&self) -> Result<usize> {
        self.cache.purge_expired()
    }

    pub fn cached_board_ids(&self) -> Result<Vec<String>> {
        self.cache.board_ids()
    }

    fn open_board(&self) -> Result<&Board> {
        self.board
            .as_ref()
            .ok_or_else(|| BoardError::NotFound("no board is open".into()))
    }

    fn open_board_mut(&mut self) -> Result<&mut Board> {
        self.board
            .as_mut()
            .ok_or_else(|| BoardError::NotFound("no board is open".into()))
    }

    fn require_user(&self) -> Result<String> {
        self.user
            .clone()
            .ok_or_else(|| BoardError::validation("join the board before making changes"))
    }

    fn persist(&mut self) -> Result<()> {
        if let Some(board) = &self.board {
            self.cache.save(board)?;
            self.fingerprint = Some(fingerprint(board)?);
        }
        Ok(())
    }
}

fn participant_name(name: &str) -> Result<String> {
    let name = sanitize::plain_text(name, MAX_NAME_CHARS);
    if name.is_empty() {
        return Err(BoardError::validation("a participant name is required"));
    }
    Ok(name)
}

/// `board_` followed by nine random lowercase alphanumerics.
pub fn generate_board_id() -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(BOARD_ID_SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!("board_{}", suffix)
}

/// Content hash of a board, used to notice changes made by other sessions.
pub fn fingerprint(board: &Board) -> Result<String> {
    let json = serde_json::to_vec(board)
        .map_err(|e| BoardError::Storage(anyhow::anyhow!("cannot serialize board: {}", e)))?;
    Ok(hex::encode(Sha256::digest(&json)))
}
