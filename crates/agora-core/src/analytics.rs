use serde::Serialize;

use agora_types::{Board, ItemStatus};

/// Meeting summary figures. Rates are whole percentages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingAnalytics {
    pub total_items: usize,
    pub voting_items: usize,
    pub non_voting_items: usize,
    pub pending_items: usize,
    pub decided_items: usize,
    pub approved_items: usize,
    pub rejected_items: usize,
    pub tied_items: usize,
    pub completed_items: usize,
    pub total_estimated_minutes: u32,
    /// Votes cast out of participants x voting items.
    pub participation_rate: u32,
    /// Items no longer pending out of all items.
    pub completion_rate: u32,
    /// Approved items out of decided items.
    pub consensus_rate: u32,
    pub efficiency: u32,
}

impl MeetingAnalytics {
    pub fn compute(board: &Board) -> Self {
        let items = &board.agenda_items;
        let voting: Vec<_> = items.iter().filter(|i| i.is_voting()).collect();
        let count = |status: ItemStatus| items.iter().filter(|i| i.status == status).count();

        let decided = items.iter().filter(|i| i.status.is_decided()).count();
        let approved = count(ItemStatus::Approved);

        let possible_votes = board.participant_count() * voting.len();
        let cast_votes: usize = voting.iter().map(|i| i.user_votes.len()).sum();

        let participation_rate = percent(cast_votes, possible_votes);
        let completion_rate = percent(decided, items.len());

        Self {
            total_items: items.len(),
            voting_items: voting.len(),
            non_voting_items: items.len() - voting.len(),
            pending_items: count(ItemStatus::Pending),
            decided_items: decided,
            approved_items: approved,
            rejected_items: count(ItemStatus::Rejected),
            tied_items: count(ItemStatus::Tied),
            completed_items: count(ItemStatus::Completed),
            total_estimated_minutes: items.iter().map(|i| i.estimated_time_minutes).sum(),
            participation_rate,
            completion_rate,
            consensus_rate: percent(approved, decided),
            efficiency: ((f64::from(participation_rate) + f64::from(completion_rate)) / 2.0)
                .round()
                .min(100.0) as u32,
        }
    }
}

fn percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    (part as f64 / whole as f64 * 100.0).round() as u32
}
