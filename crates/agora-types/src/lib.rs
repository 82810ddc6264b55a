/// Agora shared data model.
///
/// Board, participant and agenda item shapes as they travel through local
/// storage and share links (camelCase JSON), the snapshot projection carried
/// inside an encrypted share token, and the catalog of agenda item types.

pub mod item_types;
pub mod models;
pub mod share;

pub use item_types::{ItemType, VoteClass, VoteOption};
pub use models::{
    AgendaItem, Board, BoardSettings, ItemCategory, ItemStatus, Participant, Role, VotingThreshold,
};
pub use share::{CachedBoardEntry, SharePayload};
