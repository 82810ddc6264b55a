use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{AgendaItem, Board, BoardSettings, Participant};

/// Board snapshot carried inside an encrypted share token.
///
/// The board id travels in the URL query, not in the payload, and settings
/// are left behind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharePayload {
    pub title: String,
    pub creator: String,
    #[serde(alias = "created")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub agenda_items: Vec<AgendaItem>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SharePayload {
    pub fn project(board: &Board, issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            title: board.title.clone(),
            creator: board.creator.clone(),
            created_at: board.created_at,
            participants: board.participants.clone(),
            agenda_items: board.agenda_items.clone(),
            issued_at,
            expires_at,
        }
    }

    /// Rebuild a board under the id taken from the share URL.
    pub fn into_board(self, id: String) -> Board {
        Board {
            id,
            title: self.title,
            creator: self.creator,
            created_at: self.created_at,
            participants: self.participants,
            agenda_items: self.agenda_items,
            settings: BoardSettings::default(),
        }
    }
}

/// Value persisted under `<namespace>_<boardId>` in local storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedBoardEntry {
    pub data: Board,
    pub saved_at: DateTime<Utc>,
}
