use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::warn;

use agora_types::Board;

use crate::session::BoardSession;

/// Poll the local cache for changes to the open board.
///
/// Each tick first drops expired cache entries, then reloads the board and
/// calls `on_change` when another session has modified it. Runs until the
/// surrounding task is dropped.
pub async fn run_sync_loop<F>(session: &mut BoardSession, period: Duration, mut on_change: F)
where
    F: FnMut(&Board),
{
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        if let Err(e) = session.purge_expired() {
            warn!("Cache purge error: {}", e);
        }

        match session.sync() {
            Ok(true) => {
                if let Some(board) = session.board() {
                    on_change(board);
                }
            }
            Ok(false) => {}
            Err(e) => {
                warn!("Sync error: {}", e);
            }
        }
    }
}
