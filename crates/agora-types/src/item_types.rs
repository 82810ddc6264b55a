/// Catalog of agenda item types.
///
/// Each type fixes its category, default policy and timing, and the option
/// vocabulary a vote may use. Every option carries its semantic class so the
/// tally never has to guess whether "aye" or "consent" means yes.

use std::collections::BTreeMap;

use crate::models::VotingThreshold::{SimpleMajority, Supermajority, Unanimous};
use crate::models::{ItemCategory, VotingThreshold};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteClass {
    Yes,
    No,
    Abstain,
}

#[derive(Debug, Clone, Copy)]
pub struct VoteOption {
    /// Tally key: lower-cased label with spaces replaced by `_`.
    pub key: &'static str,
    pub label: &'static str,
    pub class: VoteClass,
}

#[derive(Debug, Clone, Copy)]
pub struct ItemType {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: ItemCategory,
    pub default_threshold: VotingThreshold,
    pub estimated_minutes: u32,
    pub has_presenter: bool,
    pub options: &'static [VoteOption],
}

impl ItemType {
    pub fn requires_voting(&self) -> bool {
        self.category == ItemCategory::Voting
    }

    pub fn option(&self, key: &str) -> Option<&'static VoteOption> {
        self.options.iter().find(|o| o.key == key)
    }

    pub fn classify(&self, key: &str) -> Option<VoteClass> {
        self.option(key).map(|o| o.class)
    }

    /// A zeroed tally holding exactly this type's option keys.
    pub fn empty_tally(&self) -> BTreeMap<String, u32> {
        self.options.iter().map(|o| (o.key.to_string(), 0)).collect()
    }
}

const fn opt(key: &'static str, label: &'static str, class: VoteClass) -> VoteOption {
    VoteOption { key, label, class }
}

const APPROVE_REJECT_ABSTAIN: &[VoteOption] = &[
    opt("approve", "Approve", VoteClass::Yes),
    opt("reject", "Reject", VoteClass::No),
    opt("abstain", "Abstain", VoteClass::Abstain),
];

const YES_NO_ABSTAIN: &[VoteOption] = &[
    opt("yes", "Yes", VoteClass::Yes),
    opt("no", "No", VoteClass::No),
    opt("abstain", "Abstain", VoteClass::Abstain),
];

const CONDITIONAL: &[VoteOption] = &[
    opt("approve", "Approve", VoteClass::Yes),
    opt("approve_with_conditions", "Approve with conditions", VoteClass::Yes),
    opt("reject", "Reject", VoteClass::No),
    opt("abstain", "Abstain", VoteClass::Abstain),
];

const STRAW_POLL: &[VoteOption] = &[
    opt("support", "Support", VoteClass::Yes),
    opt("oppose", "Oppose", VoteClass::No),
    opt("neutral", "Neutral", VoteClass::Abstain),
];

const CONSENSUS: &[VoteOption] = &[
    opt("consent", "Consent", VoteClass::Yes),
    opt("object", "Object", VoteClass::No),
    opt("stand_aside", "Stand Aside", VoteClass::Abstain),
];

const AGREE_OBJECT: &[VoteOption] = &[
    opt("agree", "Agree", VoteClass::Yes),
    opt("object", "Object", VoteClass::No),
];

const ROLL_CALL: &[VoteOption] = &[
    opt("aye", "Aye", VoteClass::Yes),
    opt("nay", "Nay", VoteClass::No),
    opt("present", "Present", VoteClass::Abstain),
];

const NO_OPTIONS: &[VoteOption] = &[];

const fn voting(
    key: &'static str,
    name: &'static str,
    description: &'static str,
    default_threshold: VotingThreshold,
    estimated_minutes: u32,
    options: &'static [VoteOption],
) -> ItemType {
    ItemType {
        key,
        name,
        description,
        category: ItemCategory::Voting,
        default_threshold,
        estimated_minutes,
        has_presenter: false,
        options,
    }
}

const fn no_voting(
    key: &'static str,
    name: &'static str,
    description: &'static str,
    estimated_minutes: u32,
    has_presenter: bool,
) -> ItemType {
    ItemType {
        key,
        name,
        description,
        category: ItemCategory::NoVoting,
        default_threshold: VotingThreshold::SimpleMajority,
        estimated_minutes,
        has_presenter,
        options: NO_OPTIONS,
    }
}

#[rustfmt::skip]
pub static ITEM_TYPES: &[ItemType] = &[
    voting("simple_approval", "Simple Approval", "Basic yes/no/abstain vote", SimpleMajority, 10, APPROVE_REJECT_ABSTAIN),
    // Weights are not modelled; every vote counts once.
    voting("weighted_voting", "Weighted Voting", "Votes weighted by authority", SimpleMajority, 15, APPROVE_REJECT_ABSTAIN),
    voting("supermajority", "Supermajority", "Requires 66.7% or higher", Supermajority, 12, APPROVE_REJECT_ABSTAIN),
    voting("conditional", "Conditional Vote", "Vote with conditions", SimpleMajority, 18, CONDITIONAL),
    voting("time_limited", "Time-Limited Vote", "Vote with deadline", SimpleMajority, 10, YES_NO_ABSTAIN),
    voting("anonymous", "Anonymous Vote", "Secret ballot", SimpleMajority, 10, APPROVE_REJECT_ABSTAIN),
    voting("proxy", "Proxy Vote", "Allow proxy voting", SimpleMajority, 15, YES_NO_ABSTAIN),
    voting("straw_poll", "Straw Poll", "Non-binding opinion", SimpleMajority, 5, STRAW_POLL),
    voting("priority", "Priority Ranking", "Rank by priority", SimpleMajority, 20, YES_NO_ABSTAIN),
    voting("consensus", "Consensus Building", "Seek agreement", SimpleMajority, 30, CONSENSUS),
    voting("unanimous", "Unanimous", "All must agree", Unanimous, 25, AGREE_OBJECT),
    voting("roll_call", "Roll Call Vote", "Recorded individual votes", SimpleMajority, 15, ROLL_CALL),
    no_voting("information_only", "Information Only", "Share information without voting", 10, true),
    no_voting("discussion_only", "Discussion Only", "Open discussion without formal vote", 20, true),
    no_voting("presentation_only", "Presentation Only", "Presentation without voting decision", 30, true),
    no_voting("update_only", "Status Update", "Progress update, no decision needed", 15, false),
    no_voting("training_only", "Training Session", "Educational content presentation", 45, true),
    no_voting("committee_report", "Committee Report", "Committee findings report", 20, true),
    no_voting("financial_review", "Financial Review", "Financial performance review", 25, true),
    no_voting("strategic_update", "Strategic Update", "Strategy progress update", 30, true),
];

/// Find an item type by its key.
pub fn lookup(key: &str) -> Option<&'static ItemType> {
    ITEM_TYPES.iter().find(|t| t.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_keys_follow_labels() {
        for item_type in ITEM_TYPES {
            for option in item_type.options {
                let derived = option.label.to_lowercase().replace(' ', "_");
                assert_eq!(option.key, derived, "{} / {}", item_type.key, option.label);
            }
        }
    }

    #[test]
    fn keys_are_unique() {
        for (i, a) in ITEM_TYPES.iter().enumerate() {
            for b in &ITEM_TYPES[i + 1..] {
                assert_ne!(a.key, b.key);
            }
        }
    }

    #[test]
    fn voting_types_have_yes_and_no_options() {
        for item_type in ITEM_TYPES.iter().filter(|t| t.requires_voting()) {
            assert!(item_type.options.iter().any(|o| o.class == VoteClass::Yes));
            assert!(item_type.options.iter().any(|o| o.class == VoteClass::No));
        }
    }

    #[test]
    fn non_voting_types_have_no_tally() {
        let info = lookup("information_only").unwrap();
        assert!(!info.requires_voting());
        assert!(info.empty_tally().is_empty());
    }

    #[test]
    fn classify_consensus_vocabulary() {
        let consensus = lookup("consensus").unwrap();
        assert_eq!(consensus.classify("consent"), Some(VoteClass::Yes));
        assert_eq!(consensus.classify("object"), Some(VoteClass::No));
        assert_eq!(consensus.classify("stand_aside"), Some(VoteClass::Abstain));
        assert_eq!(consensus.classify("approve"), None);
    }
}
