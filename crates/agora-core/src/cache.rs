use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use agora_store::StoreChain;
use agora_types::{Board, CachedBoardEntry};

use crate::clock::Clock;
use crate::error::{BoardError, Result};
use crate::expiry::cache_entry_expired;
use crate::sanitize;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEntry {
    data: Value,
    saved_at: DateTime<Utc>,
}

/// Local board cache, one entry per board under `<namespace>_<boardId>`.
///
/// Entries expire `ttl` after they were last saved. Anything read back goes
/// through the sanitizer, so a hand-edited store cannot inject bad state.
pub struct BoardCache {
    store: StoreChain,
    namespace: String,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl BoardCache {
    pub fn new(
        store: StoreChain,
        namespace: impl Into<String>,
        ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            namespace: namespace.into(),
            ttl,
            clock,
        }
    }

    fn key(&self, board_id: &str) -> String {
        format!("{}_{}", self.namespace, board_id)
    }

    pub fn save(&self, board: &Board) -> Result<()> {
        sanitize::validate_id("board", &board.id)?;
        let entry = CachedBoardEntry {
            data: board.clone(),
            saved_at: self.clock.now(),
        };
        let json = serde_json::to_string(&entry)
            .map_err(|e| BoardError::Storage(anyhow::anyhow!("cannot serialize board: {}", e)))?;
        let backend = self.store.set(&self.key(&board.id), &json)?;
        debug!("Saved board {} to {}", board.id, backend);
        Ok(())
    }

    /// Missing, expired and corrupt entries all read as `NotFound`; the
    /// latter two are removed on the way.
    pub fn load(&self, board_id: &str) -> Result<Board> {
        sanitize::validate_id("board", board_id)?;
        let key = self.key(board_id);
        let Some(json) = self.store.get(&key)? else {
            return Err(BoardError::NotFound(board_id.to_string()));
        };

        let now = self.clock.now();
        let entry: RawEntry = match serde_json::from_str(&json) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Discarding unreadable cache entry {}: {}", key, e);
                self.store.delete(&key)?;
                return Err(BoardError::NotFound(board_id.to_string()));
            }
        };
        if cache_entry_expired(entry.saved_at, now, self.ttl) {
            info!("Cache entry for board {} expired (saved {})", board_id, entry.saved_at);
            self.store.delete(&key)?;
            return Err(BoardError::NotFound(board_id.to_string()));
        }

        let mut data = entry.data;
        if let Some(obj) = data.as_object_mut() {
            obj.insert("id".into(), Value::String(board_id.to_string()));
        }
        match sanitize::validate(&data, now) {
            Ok(board) => Ok(board),
            Err(e) => {
                warn!("Discarding invalid cache entry {}: {}", key, e);
                self.store.delete(&key)?;
                Err(BoardError::NotFound(board_id.to_string()))
            }
        }
    }

    /// Drop every expired or unreadable entry in this namespace.
    pub fn purge_expired(&self) -> Result<usize> {
        let prefix = format!("{}_", self.namespace);
        let now = self.clock.now();
        let mut removed = 0;

        for key in self.store.keys(&prefix)? {
            let Some(json) = self.store.get(&key)? else {
                continue;
            };
            let stale = match serde_json::from_str::<RawEntry>(&json) {
                Ok(entry) => cache_entry_expired(entry.saved_at, now, self.ttl),
                Err(_) => true,
            };
            if stale {
                self.store.delete(&key)?;
                removed += 1;
            }
        }

        if removed > 0 {
            info!("Purged {} stale cached boards", removed);
        }
        Ok(removed)
    }

    /// Ids of every board currently held in this namespace.
    pub fn board_ids(&self) -> Result<Vec<String>> {
        let prefix = format!("{}_", self.namespace);
        Ok(self
            .store
            .keys(&prefix)?
            .into_iter()
            .filter_map(|key| key.strip_prefix(&prefix).map(str::to_string))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use agora_types::{Participant, Role};
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 20, 9, 0, 0).unwrap()
    }

    fn board(id: &str) -> Board {
        Board {
            id: id.into(),
            title: "Finance committee".into(),
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

    fn cache() -> (BoardCache, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(t0()));
        let cache = BoardCache::new(
            StoreChain::in_memory(),
            "collab_board",
            Duration::days(7),
            clock.clone(),
        );
        (cache, clock)
    }

    #[test]
    fn save_then_load() {
        let (cache, _) = cache();
        cache.save(&board("board_one")).unwrap();
        assert_eq!(cache.load("board_one").unwrap(), board("board_one"));
        assert_eq!(cache.board_ids().unwrap(), vec!["board_one".to_string()]);
    }

    #[test]
    fn missing_board_is_not_found() {
        let (cache, _) = cache();
        assert!(matches!(cache.load("board_nope"), Err(BoardError::NotFound(_))));
    }

    #[test]
    fn expired_entries_are_dropped() {
        let (cache, clock) = cache();
        cache.save(&board("board_one")).unwrap();

        clock.advance(Duration::days(7));
        assert!(cache.load("board_one").is_ok());

        clock.advance(Duration::seconds(1));
        assert!(matches!(cache.load("board_one"), Err(BoardError::NotFound(_))));
        assert!(cache.board_ids().unwrap().is_empty());
    }

    #[test]
    fn purge_removes_only_stale_entries() {
        let (cache, clock) = cache();
        cache.save(&board("board_old")).unwrap();
        clock.advance(Duration::days(5));
        cache.save(&board("board_new")).unwrap();
        clock.advance(Duration::days(3));

        assert_eq!(cache.purge_expired().unwrap(), 1);
        assert_eq!(cache.board_ids().unwrap(), vec!["board_new".to_string()]);
    }

    #[test]
    fn tampered_entry_is_discarded() {
        let clock = Arc::new(FixedClock::new(t0()));
        let store = StoreChain::in_memory();
        store
            .set(
                "collab_board_board_bad",
                &format!("{{\"data\": {{\"title\": 5}}, \"savedAt\": \"{}\"}}", t0().to_rfc3339()),
            )
            .unwrap();
        let cache = BoardCache::new(store, "collab_board", Duration::days(7), clock);

        assert!(matches!(cache.load("board_bad"), Err(BoardError::NotFound(_))));
        assert!(cache.board_ids().unwrap().is_empty());
    }
}
