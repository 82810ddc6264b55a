use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::Value;

use agora_types::{AgendaItem, Board, ItemStatus, Participant, Role, SharePayload, item_types};

use crate::decision;
use crate::error::{BoardError, Result};

pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_ITEM_TITLE_CHARS: usize = 300;
pub const MAX_DESCRIPTION_CHARS: usize = 2000;
pub const MAX_PRESENTER_CHARS: usize = 100;
pub const MAX_NAME_CHARS: usize = 100;
pub const MAX_PARTICIPANTS: usize = 100;
pub const MAX_AGENDA_ITEMS: usize = 100;
pub const MAX_ID_CHARS: usize = 64;

static MARKUP_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("markup pattern is valid"));

/// Reduce free text to plain text: tags and stray angle brackets removed,
/// control characters other than newline and tab dropped, trimmed, then cut
/// to `max_chars` characters.
pub fn plain_text(input: &str, max_chars: usize) -> String {
    let stripped = MARKUP_TAG.replace_all(input, "");
    let cleaned: String = stripped
        .chars()
        .filter(|c| *c != '<' && *c != '>')
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect();
    cleaned.trim().chars().take(max_chars).collect::<String>().trim_end().to_string()
}

/// Board and item ids end up in URLs and storage keys.
pub fn validate_id(kind: &str, id: &str) -> Result<()> {
    if id.is_empty()
        || id.len() > MAX_ID_CHARS
        || !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(BoardError::validation(format!("invalid {} id: {:?}", kind, id)));
    }
    Ok(())
}

/// Gate for untrusted board JSON (cached entries, imported data).
///
/// Requires an object with string `title` and `creator`; anything that does
/// not fit the board shape is rejected whole.
pub fn validate(raw: &Value, now: DateTime<Utc>) -> Result<Board> {
    let Some(obj) = raw.as_object() else {
        return Err(BoardError::validation("board data must be an object"));
    };
    for field in ["title", "creator"] {
        if !obj.get(field).is_some_and(Value::is_string) {
            return Err(BoardError::validation(format!("board {} is missing", field)));
        }
    }

    let board: Board = serde_json::from_value(raw.clone())
        .map_err(|e| BoardError::validation(format!("malformed board: {}", e)))?;
    sanitize_board(board, now)
}

/// Gate for a decrypted share payload; `board_id` comes from the share URL.
pub fn board_from_payload(
    board_id: &str,
    payload: SharePayload,
    now: DateTime<Utc>,
) -> Result<Board> {
    sanitize_board(payload.into_board(board_id.to_string()), now)
}

/// Clamp every field of `board` and re-derive everything that must not be
/// trusted: roles, tallies and statuses.
pub fn sanitize_board(mut board: Board, now: DateTime<Utc>) -> Result<Board> {
    validate_id("board", &board.id)?;

    board.title = plain_text(&board.title, MAX_TITLE_CHARS);
    if board.title.is_empty() {
        return Err(BoardError::validation("board title is required"));
    }
    board.creator = plain_text(&board.creator, MAX_NAME_CHARS);
    if board.creator.is_empty() {
        return Err(BoardError::validation("board creator is required"));
    }

    board.participants = sanitize_participants(board.participants, &board.creator)?;

    let names: HashSet<&str> = board.participants.iter().map(|p| p.name.as_str()).collect();
    let participant_count = board.participants.len();

    let mut items = board.agenda_items;
    items.truncate(MAX_AGENDA_ITEMS);
    let mut seen = HashSet::new();
    let mut sanitized = Vec::with_capacity(items.len());
    for item in items {
        if !seen.insert(item.id.clone()) {
            return Err(BoardError::validation(format!("duplicate agenda item id {:?}", item.id)));
        }
        sanitized.push(sanitize_item(item, &names, participant_count, now)?);
    }
    board.agenda_items = sanitized;

    Ok(board)
}

fn sanitize_participants(
    participants: Vec<Participant>,
    creator: &str,
) -> Result<Vec<Participant>> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(participants.len().min(MAX_PARTICIPANTS));

    for mut participant in participants {
        participant.name = plain_text(&participant.name, MAX_NAME_CHARS);
        if participant.name.is_empty() {
            return Err(BoardError::validation("participant name is required"));
        }
        if !seen.insert(participant.name.clone()) {
            continue;
        }
        participant.role = if participant.name == creator { Role::Admin } else { Role::Member };
        out.push(participant);
    }
    out.truncate(MAX_PARTICIPANTS);

    if !out.iter().any(|p| p.name == creator) {
        return Err(BoardError::validation("board creator must be a participant"));
    }
    Ok(out)
}

fn sanitize_item(
    mut item: AgendaItem,
    participants: &HashSet<&str>,
    participant_count: usize,
    now: DateTime<Utc>,
) -> Result<AgendaItem> {
    validate_id("agenda item", &item.id)?;

    let item_type = item_types::lookup(&item.item_type).ok_or_else(|| {
        BoardError::validation(format!("unknown agenda item type {:?}", item.item_type))
    })?;
    if item_type.category != item.category {
        return Err(BoardError::validation(format!(
            "agenda item {} category does not match type {}",
            item.id, item_type.key
        )));
    }

    item.title = plain_text(&item.title, MAX_ITEM_TITLE_CHARS);
    if item.title.is_empty() {
        return Err(BoardError::validation(format!("agenda item {} has no title", item.id)));
    }
    item.description = plain_text(&item.description, MAX_DESCRIPTION_CHARS);
    item.presenter = item
        .presenter
        .map(|p| plain_text(&p, MAX_PRESENTER_CHARS))
        .filter(|p| !p.is_empty());
    item.estimated_time_minutes =
        item.estimated_time_minutes.min(agora_types::models::MAX_ESTIMATED_MINUTES);

    if item_type.requires_voting() {
        let votes = std::mem::take(&mut item.user_votes);
        item.user_votes = votes
            .into_iter()
            .map(|(voter, option)| (plain_text(&voter, MAX_NAME_CHARS), option))
            .filter(|(voter, option)| {
                participants.contains(voter.as_str()) && item_type.option(option).is_some()
            })
            .collect();
        if item.status == ItemStatus::Completed {
            item.status = ItemStatus::Pending;
        }
        decision::recompute(&mut item, item_type, participant_count, now);
    } else {
        item.vote_tally.clear();
        item.user_votes.clear();
        if item.status == ItemStatus::Completed {
            item.completed_at.get_or_insert(now);
        } else {
            item.status = ItemStatus::Pending;
            item.completed_at = None;
        }
    }

    Ok(item)
}
