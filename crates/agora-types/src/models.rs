use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upper bound for an agenda item's estimated duration (one day).
pub const MAX_ESTIMATED_MINUTES: u32 = 1440;

// -- Participants --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    Member,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub name: String,
    #[serde(default)]
    pub role: Role,
    #[serde(alias = "joined")]
    pub joined_at: DateTime<Utc>,
}

// -- Agenda items --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemCategory {
    #[serde(rename = "voting")]
    Voting,
    #[serde(rename = "no-voting", alias = "no_voting")]
    NoVoting,
}

/// Decision rule applied to an item's tally.
///
/// Unrecognised policy names fall back to simple majority when read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum VotingThreshold {
    #[default]
    #[serde(rename = "simple_majority")]
    SimpleMajority,
    #[serde(rename = "supermajority")]
    Supermajority,
    #[serde(rename = "three-quarters")]
    ThreeQuarters,
    #[serde(rename = "unanimous")]
    Unanimous,
}

impl VotingThreshold {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "supermajority" => Self::Supermajority,
            "three-quarters" | "three_quarters" => Self::ThreeQuarters,
            "unanimous" => Self::Unanimous,
            _ => Self::SimpleMajority,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SimpleMajority => "simple_majority",
            Self::Supermajority => "supermajority",
            Self::ThreeQuarters => "three-quarters",
            Self::Unanimous => "unanimous",
        }
    }
}

impl From<String> for VotingThreshold {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Tied,
    Completed,
}

impl ItemStatus {
    /// True once the item has left `pending`.
    pub fn is_decided(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Tied => "tied",
            Self::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgendaItem {
    pub id: String,
    #[serde(alias = "type")]
    pub item_type: String,
    pub category: ItemCategory,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(
        rename = "estimatedTime",
        alias = "estimatedTimeMinutes",
        default,
        deserialize_with = "clamped_minutes::deserialize"
    )]
    pub estimated_time_minutes: u32,
    #[serde(default)]
    pub presenter: Option<String>,
    #[serde(default)]
    pub voting_threshold: VotingThreshold,
    /// Option key -> count. Keys are fixed when the item is created.
    #[serde(default, alias = "votes")]
    pub vote_tally: BTreeMap<String, u32>,
    /// Participant name -> chosen option key.
    #[serde(default)]
    pub user_votes: BTreeMap<String, String>,
    #[serde(default)]
    pub status: ItemStatus,
    #[serde(alias = "created")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl AgendaItem {
    pub fn is_voting(&self) -> bool {
        self.category == ItemCategory::Voting
    }

    pub fn total_votes(&self) -> u32 {
        self.vote_tally.values().sum()
    }
}

// -- Boards --

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BoardSettings {
    pub allow_anonymous_voting: bool,
    pub require_justification: bool,
    pub voting_deadline: Option<DateTime<Utc>>,
    pub quorum: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    #[serde(default, alias = "boardId")]
    pub id: String,
    pub title: String,
    pub creator: String,
    #[serde(alias = "created")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub agenda_items: Vec<AgendaItem>,
    #[serde(default)]
    pub settings: BoardSettings,
}

impl Board {
    pub fn participant(&self, name: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.name == name)
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    /// The creator is the only admin.
    pub fn is_admin(&self, name: &str) -> bool {
        self.creator == name
    }

    pub fn item(&self, item_id: &str) -> Option<&AgendaItem> {
        self.agenda_items.iter().find(|i| i.id == item_id)
    }

    pub fn item_mut(&mut self, item_id: &str) -> Option<&mut AgendaItem> {
        self.agenda_items.iter_mut().find(|i| i.id == item_id)
    }
}

/// Accepts any JSON number (or numeric string) and clamps it into
/// `0..=MAX_ESTIMATED_MINUTES`. Anything else reads as zero.
mod clamped_minutes {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::MAX_ESTIMATED_MINUTES;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u32, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let minutes = match value {
            Value::Number(n) => n.as_f64().unwrap_or(0.0),
            Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
            _ => 0.0,
        };
        Ok(clamp(minutes))
    }

    fn clamp(minutes: f64) -> u32 {
        if !minutes.is_finite() || minutes <= 0.0 {
            return 0;
        }
        minutes.round().min(MAX_ESTIMATED_MINUTES as f64) as u32
    }
}
