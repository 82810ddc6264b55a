//! Board decision engine.
//!
//! An item's status is a pure function of its tally, the number of
//! participants and its voting policy. Every vote recomputes it; the first
//! time an item leaves `pending` its `completedAt` is stamped and never
//! moved again.

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use agora_types::{
    AgendaItem, Board, ItemCategory, ItemStatus, ItemType, VoteClass, VotingThreshold, item_types,
};

use crate::error::{BoardError, Result};
use crate::sanitize::{
    self, MAX_AGENDA_ITEMS, MAX_DESCRIPTION_CHARS, MAX_ITEM_TITLE_CHARS, MAX_PRESENTER_CHARS,
};

const SUPERMAJORITY_RATIO: f64 = 0.667;
const THREE_QUARTERS_RATIO: f64 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VoteCounts {
    pub yes: usize,
    pub no: usize,
    pub abstain: usize,
}

impl VoteCounts {
    /// Fold a tally into yes/no/abstain using the option classes of `item_type`.
    pub fn of(item: &AgendaItem, item_type: &ItemType) -> Self {
        let mut counts = Self::default();
        for (key, count) in &item.vote_tally {
            let count = *count as usize;
            match item_type.classify(key) {
                Some(VoteClass::Yes) => counts.yes += count,
                Some(VoteClass::No) => counts.no += count,
                Some(VoteClass::Abstain) => counts.abstain += count,
                None => {}
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.yes + self.no + self.abstain
    }
}

/// Yes votes needed for approval, measured against all participants.
///
/// Simple majority is decided on the votes actually cast; its figure (half
/// the board, rounded up) is what a full turnout would need.
pub fn required_votes(threshold: VotingThreshold, participant_count: usize) -> usize {
    let n = participant_count as f64;
    match threshold {
        VotingThreshold::SimpleMajority => participant_count.div_ceil(2),
        VotingThreshold::Supermajority => (n * SUPERMAJORITY_RATIO).ceil() as usize,
        VotingThreshold::ThreeQuarters => (n * THREE_QUARTERS_RATIO).ceil() as usize,
        VotingThreshold::Unanimous => participant_count,
    }
}

pub fn resolve_status(
    threshold: VotingThreshold,
    counts: VoteCounts,
    participant_count: usize,
) -> ItemStatus {
    if counts.total() == 0 {
        return ItemStatus::Pending;
    }

    match threshold {
        VotingThreshold::SimpleMajority => {
            if counts.yes + counts.no == 0 {
                ItemStatus::Pending
            } else if counts.yes > counts.no {
                ItemStatus::Approved
            } else if counts.no > counts.yes {
                ItemStatus::Rejected
            } else {
                ItemStatus::Tied
            }
        }
        VotingThreshold::Unanimous => {
            if counts.yes == participant_count {
                ItemStatus::Approved
            } else if counts.no > 0 {
                ItemStatus::Rejected
            } else {
                ItemStatus::Pending
            }
        }
        VotingThreshold::Supermajority | VotingThreshold::ThreeQuarters => {
            let required = required_votes(threshold, participant_count);
            if counts.yes >= required {
                ItemStatus::Approved
            } else if counts.no > participant_count.saturating_sub(required) {
                ItemStatus::Rejected
            } else {
                ItemStatus::Pending
            }
        }
    }
}

/// Rebuild the tally from the per-participant votes, then re-derive status.
pub fn recompute(
    item: &mut AgendaItem,
    item_type: &ItemType,
    participant_count: usize,
    now: DateTime<Utc>,
) {
    let mut tally = item_type.empty_tally();
    for option in item.user_votes.values() {
        if let Some(count) = tally.get_mut(option) {
            *count += 1;
        }
    }
    item.vote_tally = tally;

    let previous = item.status;
    let counts = VoteCounts::of(item, item_type);
    item.status = resolve_status(item.voting_threshold, counts, participant_count);
    if item.status.is_decided() && item.completed_at.is_none() {
        item.completed_at = Some(now);
    }
    if item.status != previous {
        info!("Item {} is now {} (was {})", item.id, item.status.as_str(), previous.as_str());
    }
}

/// Re-derive every voting item, e.g. after the participant count changed.
pub fn recompute_board(board: &mut Board, now: DateTime<Utc>) {
    let participant_count = board.participant_count();
    for item in board.agenda_items.iter_mut().filter(|i| i.is_voting()) {
        if let Some(item_type) = item_types::lookup(&item.item_type) {
            recompute(item, item_type, participant_count, now);
        }
    }
}

pub fn item_type_of(item: &AgendaItem) -> Result<&'static ItemType> {
    item_types::lookup(&item.item_type)
        .ok_or_else(|| {
            BoardError::validation(format!("unknown agenda item type {:?}", item.item_type))
        })
}

/// Record `voter`'s choice on a voting item, replacing any earlier choice.
pub fn cast_vote(
    board: &mut Board,
    item_id: &str,
    voter: &str,
    option: &str,
    now: DateTime<Utc>,
) -> Result<ItemStatus> {
    if board.participant(voter).is_none() {
        return Err(BoardError::validation(format!("{} is not a participant", voter)));
    }
    let participant_count = board.participant_count();
    let item = board
        .item_mut(item_id)
        .ok_or_else(|| BoardError::validation(format!("no agenda item {}", item_id)))?;
    if !item.is_voting() {
        return Err(BoardError::validation(format!("agenda item {} does not take votes", item_id)));
    }
    let item_type = item_type_of(item)?;
    if item_type.option(option).is_none() {
        let allowed: Vec<&str> = item_type.options.iter().map(|o| o.key).collect();
        return Err(BoardError::validation(format!(
            "{:?} is not a valid option for {}; expected one of {}",
            option,
            item_type.name,
            allowed.join(", ")
        )));
    }

    let previous = item.user_votes.insert(voter.to_string(), option.to_string());
    recompute(item, item_type, participant_count, now);

    match previous {
        Some(old) if old != option => {
            info!("{} changed vote on {} from {} to {}", voter, item_id, old, option)
        }
        Some(_) => {}
        None => info!("{} voted {} on {}", voter, option, item_id),
    }
    Ok(item.status)
}

/// Mark a non-voting item done. Only the board admin may do this.
pub fn complete_item(
    board: &mut Board,
    item_id: &str,
    actor: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    if !board.is_admin(actor) {
        return Err(BoardError::validation("only the board creator can complete agenda items"));
    }
    let item = board
        .item_mut(item_id)
        .ok_or_else(|| BoardError::validation(format!("no agenda item {}", item_id)))?;
    if item.is_voting() {
        return Err(BoardError::validation(format!(
            "agenda item {} is decided by vote and cannot be completed by hand",
            item_id
        )));
    }
    if item.status == ItemStatus::Completed {
        return Ok(());
    }

    item.status = ItemStatus::Completed;
    item.completed_at.get_or_insert(now);
    info!("Item {} completed by {}", item_id, actor);
    Ok(())
}

/// Fields supplied when adding an agenda item; everything else is derived.
#[derive(Debug, Clone, Default)]
pub struct NewAgendaItem {
    pub item_type: String,
    pub title: String,
    pub description: String,
    pub estimated_minutes: Option<u32>,
    pub presenter: Option<String>,
    pub voting_threshold: Option<VotingThreshold>,
}

pub fn new_item(request: NewAgendaItem, now: DateTime<Utc>) -> Result<AgendaItem> {
    let item_type = item_types::lookup(&request.item_type)
        .ok_or_else(|| {
            BoardError::validation(format!("unknown agenda item type {:?}", request.item_type))
        })?;

    let title = sanitize::plain_text(&request.title, MAX_ITEM_TITLE_CHARS);
    if title.is_empty() {
        return Err(BoardError::validation("agenda item title is required"));
    }

    let voting_threshold = match item_type.category {
        ItemCategory::Voting => request.voting_threshold.unwrap_or(item_type.default_threshold),
        ItemCategory::NoVoting => VotingThreshold::default(),
    };

    Ok(AgendaItem {
        id: format!("item_{}", Uuid::new_v4().simple()),
        item_type: item_type.key.to_string(),
        category: item_type.category,
        title,
        description: sanitize::plain_text(&request.description, MAX_DESCRIPTION_CHARS),
        estimated_time_minutes: request
            .estimated_minutes
            .unwrap_or(item_type.estimated_minutes)
            .min(agora_types::models::MAX_ESTIMATED_MINUTES),
        presenter: request
            .presenter
            .map(|p| sanitize::plain_text(&p, MAX_PRESENTER_CHARS))
            .filter(|p| !p.is_empty()),
        voting_threshold,
        vote_tally: item_type.empty_tally(),
        user_votes: Default::default(),
        status: ItemStatus::Pending,
        created_at: now,
        completed_at: None,
    })
}

/// Append a new item to the agenda. Only the board admin may do this.
pub fn add_item(
    board: &mut Board,
    actor: &str,
    request: NewAgendaItem,
    now: DateTime<Utc>,
) -> Result<String> {
    if !board.is_admin(actor) {
        return Err(BoardError::validation("only the board creator can add agenda items"));
    }
    if board.agenda_items.len() >= MAX_AGENDA_ITEMS {
        return Err(BoardError::validation(format!(
            "agenda is limited to {} items",
            MAX_AGENDA_ITEMS
        )));
    }

    let item = new_item(request, now)?;
    let id = item.id.clone();
    info!("Added {} item {} to board {}", item.item_type, id, board.id);
    board.agenda_items.push(item);
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_types::{Participant, Role};
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 18, 0, 0).unwrap()
    }

    fn board_with(names: &[&str]) -> Board {
        Board {
            id: "board_test12345".into(),
            title: "Board meeting".into(),
            creator: names[0].into(),
            created_at: t0(),
            participants: names
                .iter()
                .map(|n| Participant {
                    name: n.to_string(),
                    role: if *n == names[0] { Role::Admin } else { Role::Member },
                    joined_at: t0(),
                })
                .collect(),
            agenda_items: vec![],
            settings: Default::default(),
        }
    }

    fn add(board: &mut Board, item_type: &str, threshold: Option<VotingThreshold>) -> String {
        let creator = board.creator.clone();
        let request = NewAgendaItem {
            item_type: item_type.into(),
            title: "Motion".into(),
            voting_threshold: threshold,
            ..Default::default()
        };
        add_item(board, &creator, request, t0()).unwrap()
    }

    #[test]
    fn supermajority_of_four_approves_at_three() {
        let mut board = board_with(&["Ada", "Ben", "Cy", "Di"]);
        let id = add(&mut board, "supermajority", None);

        cast_vote(&mut board, &id, "Ada", "approve", t0()).unwrap();
        cast_vote(&mut board, &id, "Ben", "approve", t0()).unwrap();
        assert_eq!(board.item(&id).unwrap().status, ItemStatus::Pending);

        cast_vote(&mut board, &id, "Cy", "reject", t0()).unwrap();
        let status = cast_vote(&mut board, &id, "Di", "approve", t0()).unwrap();
        assert_eq!(status, ItemStatus::Approved);
        assert_eq!(required_votes(VotingThreshold::Supermajority, 4), 3);
    }

    #[test]
    fn supermajority_rejects_when_threshold_unreachable() {
        let mut board = board_with(&["Ada", "Ben", "Cy", "Di"]);
        let id = add(&mut board, "supermajority", None);
        cast_vote(&mut board, &id, "Ada", "reject", t0()).unwrap();
        assert_eq!(board.item(&id).unwrap().status, ItemStatus::Pending);
        let status = cast_vote(&mut board, &id, "Ben", "reject", t0()).unwrap();
        assert_eq!(status, ItemStatus::Rejected);
    }

    #[test]
    fn required_votes_for_every_policy() {
        assert_eq!(required_votes(VotingThreshold::SimpleMajority, 4), 2);
        assert_eq!(required_votes(VotingThreshold::SimpleMajority, 5), 3);
        assert_eq!(required_votes(VotingThreshold::Supermajority, 3), 3);
        assert_eq!(required_votes(VotingThreshold::Unanimous, 6), 6);
        assert_eq!(required_votes(VotingThreshold::SimpleMajority, 0), 0);
    }

    #[test]
    fn three_quarters_threshold() {
        assert_eq!(required_votes(VotingThreshold::ThreeQuarters, 4), 3);
        assert_eq!(required_votes(VotingThreshold::ThreeQuarters, 5), 4);
        let counts = VoteCounts { yes: 3, no: 1, abstain: 0 };
        assert_eq!(resolve_status(VotingThreshold::ThreeQuarters, counts, 5), ItemStatus::Pending);
        let counts = VoteCounts { yes: 3, no: 2, abstain: 0 };
        assert_eq!(resolve_status(VotingThreshold::ThreeQuarters, counts, 5), ItemStatus::Rejected);
    }

    #[test]
    fn unanimous_needs_everyone() {
        let mut board = board_with(&["Ada", "Ben", "Cy"]);
        let id = add(&mut board, "unanimous", None);
        cast_vote(&mut board, &id, "Ada", "agree", t0()).unwrap();
        cast_vote(&mut board, &id, "Ben", "agree", t0()).unwrap();
        assert_eq!(board.item(&id).unwrap().status, ItemStatus::Pending);
        assert_eq!(cast_vote(&mut board, &id, "Cy", "agree", t0()).unwrap(), ItemStatus::Approved);
        assert_eq!(cast_vote(&mut board, &id, "Cy", "object", t0()).unwrap(), ItemStatus::Rejected);
    }

    #[test]
    fn simple_majority_tie_and_abstentions() {
        let mut board = board_with(&["Ada", "Ben", "Cy"]);
        let id = add(&mut board, "simple_approval", None);
        assert_eq!(cast_vote(&mut board, &id, "Cy", "abstain", t0()).unwrap(), ItemStatus::Pending);
        cast_vote(&mut board, &id, "Ada", "approve", t0()).unwrap();
        assert_eq!(cast_vote(&mut board, &id, "Ben", "reject", t0()).unwrap(), ItemStatus::Tied);
    }

    #[test]
    fn conditional_approval_counts_as_yes() {
        let mut board = board_with(&["Ada", "Ben", "Cy"]);
        let id = add(&mut board, "conditional", None);
        cast_vote(&mut board, &id, "Ada", "approve_with_conditions", t0()).unwrap();
        cast_vote(&mut board, &id, "Ben", "approve", t0()).unwrap();
        assert_eq!(cast_vote(&mut board, &id, "Cy", "reject", t0()).unwrap(), ItemStatus::Approved);
    }

    #[test]
    fn completion_time_is_stamped_once() {
        let mut board = board_with(&["Ada", "Ben"]);
        let id = add(&mut board, "simple_approval", None);
        cast_vote(&mut board, &id, "Ada", "approve", t0()).unwrap();
        let later = t0() + Duration::hours(1);
        cast_vote(&mut board, &id, "Ben", "reject", later).unwrap();
        cast_vote(&mut board, &id, "Ben", "approve", later).unwrap();

        let item = board.item(&id).unwrap();
        assert_eq!(item.status, ItemStatus::Approved);
        assert_eq!(item.completed_at, Some(t0()));
    }

    #[test]
    fn invalid_votes_are_rejected() {
        let mut board = board_with(&["Ada", "Ben"]);
        let id = add(&mut board, "roll_call", None);
        assert!(cast_vote(&mut board, &id, "Eve", "aye", t0()).is_err());
        assert!(cast_vote(&mut board, &id, "Ben", "approve", t0()).is_err());
        assert!(cast_vote(&mut board, "item_missing", "Ben", "aye", t0()).is_err());

        let info = add(&mut board, "information_only", None);
        assert!(cast_vote(&mut board, &info, "Ben", "approve", t0()).is_err());
    }

    #[test]
    fn only_admin_edits_agenda() {
        let mut board = board_with(&["Ada", "Ben"]);
        let request = NewAgendaItem {
            item_type: "simple_approval".into(),
            title: "Sneaky".into(),
            ..Default::default()
        };
        assert!(add_item(&mut board, "Ben", request, t0()).is_err());

        let id = add(&mut board, "discussion_only", None);
        assert!(complete_item(&mut board, &id, "Ben", t0()).is_err());
        complete_item(&mut board, &id, "Ada", t0()).unwrap();
        let item = board.item(&id).unwrap();
        assert_eq!(item.status, ItemStatus::Completed);
        assert_eq!(item.completed_at, Some(t0()));
    }

    #[test]
    fn voting_items_cannot_be_completed_by_hand() {
        let mut board = board_with(&["Ada"]);
        let id = add(&mut board, "straw_poll", None);
        assert!(complete_item(&mut board, &id, "Ada", t0()).is_err());
    }

    #[test]
    fn new_item_uses_type_defaults() {
        let item = new_item(
            NewAgendaItem {
                item_type: "unanimous".into(),
                title: "<i>Dissolve</i> the committee".into(),
                estimated_minutes: Some(5000),
                ..Default::default()
            },
            t0(),
        )
        .unwrap();
        assert_eq!(item.title, "Dissolve the committee");
        assert_eq!(item.voting_threshold, VotingThreshold::Unanimous);
        assert_eq!(item.estimated_time_minutes, 1440);
        assert_eq!(item.vote_tally.len(), 2);
        assert!(item.id.starts_with("item_"));
    }

    #[test]
    fn joining_can_reopen_a_decision() {
        let mut board = board_with(&["Ada", "Ben"]);
        let id = add(&mut board, "unanimous", None);
        cast_vote(&mut board, &id, "Ada", "agree", t0()).unwrap();
        cast_vote(&mut board, &id, "Ben", "agree", t0()).unwrap();
        assert_eq!(board.item(&id).unwrap().status, ItemStatus::Approved);

        board.participants.push(Participant {
            name: "Cy".into(),
            role: Role::Member,
            joined_at: t0(),
        });
        recompute_board(&mut board, t0());
        let item = board.item(&id).unwrap();
        assert_eq!(item.status, ItemStatus::Pending);
        assert_eq!(item.completed_at, Some(t0()));
    }

    const VOTERS: [&str; 6] = ["Ada", "Ben", "Cy", "Di", "Ed", "Flo"];
    const OPTIONS: [&str; 3] = ["approve", "reject", "abstain"];

    proptest! {
        #[test]
        fn tally_matches_one_vote_per_voter(
            votes in proptest::collection::vec((0..VOTERS.len(), 0..OPTIONS.len()), 0..40),
            threshold in prop_oneof![
                Just(VotingThreshold::SimpleMajority),
                Just(VotingThreshold::Supermajority),
                Just(VotingThreshold::ThreeQuarters),
                Just(VotingThreshold::Unanimous),
            ],
        ) {
            let mut board = board_with(&VOTERS);
            let id = add(&mut board, "simple_approval", Some(threshold));
            for (voter, option) in &votes {
                cast_vote(&mut board, &id, VOTERS[*voter], OPTIONS[*option], t0()).unwrap();
            }

            let item = board.item(&id).unwrap().clone();
            prop_assert_eq!(item.total_votes() as usize, item.user_votes.len());
            prop_assert!(item.user_votes.len() <= VOTERS.len());

            let item_type = item_types::lookup("simple_approval").unwrap();
            let counts = VoteCounts::of(&item, item_type);
            prop_assert_eq!(item.status, resolve_status(threshold, counts, VOTERS.len()));
            if threshold != VotingThreshold::SimpleMajority && item.status == ItemStatus::Approved {
                prop_assert!(counts.yes >= required_votes(threshold, VOTERS.len()));
            }
            if item.status.is_decided() {
                prop_assert_eq!(item.completed_at, Some(t0()));
            }
        }

        #[test]
        fn revote_moves_exactly_one_tally(first in 0..OPTIONS.len(), second in 0..OPTIONS.len()) {
            let mut board = board_with(&["Ada", "Ben"]);
            let id = add(&mut board, "simple_approval", None);
            cast_vote(&mut board, &id, "Ben", "approve", t0()).unwrap();
            cast_vote(&mut board, &id, "Ada", OPTIONS[first], t0()).unwrap();
            let before = board.item(&id).unwrap().vote_tally.clone();

            cast_vote(&mut board, &id, "Ada", OPTIONS[second], t0()).unwrap();
            let after = &board.item(&id).unwrap().vote_tally;

            prop_assert_eq!(before.values().sum::<u32>(), after.values().sum::<u32>());
            if first != second {
                prop_assert_eq!(after[OPTIONS[first]] + 1, before[OPTIONS[first]]);
                prop_assert_eq!(after[OPTIONS[second]], before[OPTIONS[second]] + 1);
            } else {
                prop_assert_eq!(&before, after);
            }
        }
    }
}
