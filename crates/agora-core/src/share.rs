//! Encrypted share links.
//!
//! A link looks like
//!
//! ```text
//! {origin}{path}?board={boardId}#enc=1&data={token}[&hint={hint}]
//! ```
//!
//! The token and hint live in the fragment, which browsers never send to a
//! server. The token is `base64url(salt || nonce || AES-GCM(payload))`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use agora_crypto::{Envelope, derive_key, generate_salt};
use agora_types::Board;

use crate::codec;
use crate::error::{BoardError, Result};
use crate::expiry::{self, ShareTtl};
use crate::passphrase;
use crate::sanitize;

/// Links longer than this are refused instead of truncated.
pub const MAX_SHARE_URL_LEN: usize = 2000;

const ENCRYPTED_MARKER: &str = "1";

#[derive(Serialize, Deserialize)]
struct BoardQuery {
    board: String,
}

#[derive(Serialize, Deserialize, Default)]
struct Fragment {
    #[serde(skip_serializing_if = "Option::is_none")]
    enc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<String>,
}

/// The parts of a share URL the receiver needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLink {
    pub board_id: String,
    /// Absent for plain `?board=` links, which open from the local cache.
    pub token: Option<String>,
    pub hint: Option<String>,
}

impl ShareLink {
    pub fn to_url(&self, base: &str) -> Result<String> {
        let query = serde_urlencoded::to_string(BoardQuery {
            board: self.board_id.clone(),
        })
        .map_err(|e| BoardError::validation(format!("cannot encode board id: {}", e)))?;

        let Some(token) = &self.token else {
            return Ok(format!("{}?{}", base, query));
        };
        let fragment = serde_urlencoded::to_string(Fragment {
            enc: Some(ENCRYPTED_MARKER.into()),
            data: Some(token.clone()),
            hint: self.hint.clone(),
        })
        .map_err(|e| BoardError::validation(format!("cannot encode share fragment: {}", e)))?;

        Ok(format!("{}?{}#{}", base, query, fragment))
    }

    pub fn parse(url: &str) -> Result<Self> {
        let url = url.trim();
        let (before_fragment, fragment) = match url.split_once('#') {
            Some((head, fragment)) => (head, Some(fragment)),
            None => (url, None),
        };
        let query = before_fragment
            .split_once('?')
            .map(|(_, query)| query)
            .ok_or_else(|| BoardError::validation("share link has no board id"))?;

        let BoardQuery { board } = serde_urlencoded::from_str(query)
            .map_err(|_| BoardError::validation("share link has no board id"))?;
        sanitize::validate_id("board", &board)?;

        let fragment: Fragment = match fragment {
            Some(f) if !f.is_empty() => serde_urlencoded::from_str(f)
                .map_err(|e| BoardError::validation(format!("malformed share fragment: {}", e)))?,
            _ => Fragment::default(),
        };
        if fragment.data.is_some() && fragment.enc.as_deref() != Some(ENCRYPTED_MARKER) {
            return Err(BoardError::validation("unsupported share link format"));
        }

        Ok(Self {
            board_id: board,
            token: fragment.data.filter(|t| !t.is_empty()),
            hint: fragment
                .hint
                .map(|h| sanitize::plain_text(&h, passphrase::MAX_HINT_CHARS))
                .filter(|h| !h.is_empty()),
        })
    }
}

/// Derive a key under a fresh salt and seal `plaintext` on the blocking pool.
pub async fn seal_bytes(plaintext: Vec<u8>, passphrase: String) -> Result<String> {
    let envelope = tokio::task::spawn_blocking(move || {
        let salt = generate_salt();
        let key = derive_key(&passphrase, &salt);
        Envelope::seal(&plaintext, &key, salt)
    })
    .await??;
    Ok(envelope.to_token())
}

/// Derive the key from the token's salt and open it on the blocking pool.
pub async fn open_bytes(token: String, passphrase: String) -> Result<Vec<u8>> {
    let envelope = Envelope::from_token(&token)?;
    let plaintext = tokio::task::spawn_blocking(move || {
        let key = derive_key(&passphrase, &envelope.salt);
        envelope.open(&key)
    })
    .await??;
    Ok(plaintext)
}

/// Everything needed to mint one share link.
pub struct ShareRequest<'a> {
    pub base: &'a str,
    pub passphrase: &'a str,
    pub hint: Option<&'a str>,
    pub ttl: ShareTtl,
    pub now: DateTime<Utc>,
}

/// Encrypt `board` under the request's passphrase and return the link.
pub async fn build_share_url(board: &Board, request: ShareRequest<'_>) -> Result<String> {
    passphrase::validate_passphrase(request.passphrase)?;
    let hint = passphrase::validate_hint(request.hint, request.passphrase)?;

    let payload = codec::encode(board, request.ttl, request.now)?;
    let payload_len = payload.len();
    let token = seal_bytes(payload, request.passphrase.to_string()).await?;

    let url = ShareLink {
        board_id: board.id.clone(),
        token: Some(token),
        hint,
    }
    .to_url(request.base)?;

    if url.len() > MAX_SHARE_URL_LEN {
        return Err(BoardError::SizeLimit {
            length: url.len(),
            limit: MAX_SHARE_URL_LEN,
        });
    }

    info!(
        "Share link for board {} ready ({} payload bytes, {} chars, valid {} days)",
        board.id,
        payload_len,
        url.len(),
        request.ttl.days()
    );
    Ok(url)
}

/// Decrypt, check expiry, then sanitize. Wrong passphrase and tampering are
/// `Crypto`; a link past its deadline is `ExpiredLink`.
pub async fn open_shared_board(
    board_id: &str,
    token: &str,
    passphrase: &str,
    now: DateTime<Utc>,
) -> Result<Board> {
    sanitize::validate_id("board", board_id)?;

    let plaintext = open_bytes(token.to_string(), passphrase.to_string()).await?;
    let payload = codec::decode(&plaintext)?;
    expiry::check_payload(&payload, now)?;

    debug!("Opened share token for board {} (expires {})", board_id, payload.expires_at);
    sanitize::board_from_payload(board_id, payload, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use agora_types::{Participant, Role};
    use chrono::{Duration, TimeZone};

    const PASSPHRASE: &str = "Str0ng!Passw0rd";
    const BASE: &str = "https://boards.example.org/agora";

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 9, 14, 15, 0, 0).unwrap()
    }

    fn board() -> Board {
        Board {
            id: "board_k3x9q2m7a".into(),
            title: "Trustees".into(),
            creator: "Ada".into(),
            created_at: t0(),
            participants: vec![Participant {
                name: "Ada".into(),
                role: Role::Admin,
                joined_at: t0(),
            }],
            agenda_items: vec![],
            settings: Default::default(),
        }
    }

    fn request(hint: Option<&'static str>) -> ShareRequest<'static> {
        ShareRequest {
            base: BASE,
            passphrase: PASSPHRASE,
            hint,
            ttl: ShareTtl::SevenDays,
            now: t0(),
        }
    }

    #[test]
    fn parses_encrypted_link() {
        let link = ShareLink::parse(
            "https://boards.example.org/agora?board=board_k3x9q2m7a\
             #enc=1&data=abc_-123&hint=the+usual",
        )
        .unwrap();
        assert_eq!(link.board_id, "board_k3x9q2m7a");
        assert_eq!(link.token.as_deref(), Some("abc_-123"));
        assert_eq!(link.hint.as_deref(), Some("the usual"));
    }

    #[test]
    fn parses_plain_link() {
        let link = ShareLink::parse("https://boards.example.org/?board=board_abc").unwrap();
        assert_eq!(link.token, None);
        assert_eq!(link.hint, None);
    }

    #[test]
    fn rejects_links_without_board() {
        assert!(ShareLink::parse("https://boards.example.org/#enc=1&data=x").is_err());
        assert!(ShareLink::parse("https://boards.example.org/?board=../x").is_err());
        assert!(ShareLink::parse("https://boards.example.org/?board=a#data=x").is_err());
    }

    #[test]
    fn link_roundtrips_through_url() {
        let link = ShareLink {
            board_id: "board_abc".into(),
            token: Some("tok-en_1".into()),
            hint: Some("pet & year".into()),
        };
        let url = link.to_url(BASE).unwrap();
        let expected = "https://boards.example.org/agora?board=board_abc#enc=1&data=tok-en_1";
        assert!(url.starts_with(expected));
        assert_eq!(ShareLink::parse(&url).unwrap(), link);
    }

    #[tokio::test]
    async fn share_and_open_roundtrip() {
        let url = build_share_url(&board(), request(Some("our usual one"))).await.unwrap();
        assert!(url.len() <= MAX_SHARE_URL_LEN);

        let link = ShareLink::parse(&url).unwrap();
        assert_eq!(link.hint.as_deref(), Some("our usual one"));

        let token = link.token.unwrap();
        let opened = open_shared_board(&link.board_id, &token, PASSPHRASE, t0() + Duration::days(1))
            .await
            .unwrap();
        assert_eq!(opened.id, "board_k3x9q2m7a");
        assert_eq!(opened.title, "Trustees");
        assert_eq!(opened.participants, board().participants);
    }

    #[tokio::test]
    async fn wrong_passphrase_and_expiry_are_distinct() {
        let url = build_share_url(&board(), request(None)).await.unwrap();
        let link = ShareLink::parse(&url).unwrap();
        let token = link.token.unwrap();

        let wrong = open_shared_board(&link.board_id, &token, "Str0ng!Passw0rd?", t0())
            .await
            .unwrap_err();
        assert_eq!(wrong.kind(), ErrorKind::Crypto);

        let late = open_shared_board(&link.board_id, &token, PASSPHRASE, t0() + Duration::days(8))
            .await
            .unwrap_err();
        assert_eq!(late.kind(), ErrorKind::ExpiredLink);
    }

    #[tokio::test]
    async fn weak_passphrase_is_refused_before_encrypting() {
        let mut req = request(None);
        req.passphrase = "password";
        let err = build_share_url(&board(), req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn oversized_board_hits_size_limit() {
        let mut board = board();
        for i in 0..200 {
            board.participants.push(Participant {
                name: format!("{:x}", (i as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)),
                role: Role::Member,
                joined_at: t0() + Duration::seconds(i * 7919),
            });
        }
        let err = build_share_url(&board, request(None)).await.unwrap_err();
        assert!(matches!(err, BoardError::SizeLimit { limit: MAX_SHARE_URL_LEN, .. }));
    }
}
