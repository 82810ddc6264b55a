use std::fmt::Write;

use agora_core::MeetingAnalytics;
use agora_core::decision::required_votes;
use agora_types::{Board, ItemStatus, item_types};

pub fn board(board: &Board, stats: &MeetingAnalytics) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} [{}]", board.title, board.id);
    let created = board.created_at.format("%Y-%m-%d %H:%M UTC");
    let _ = writeln!(out, "created by {} on {}", board.creator, created);

    let names: Vec<String> = board
        .participants
        .iter()
        .map(|p| {
            if board.is_admin(&p.name) {
                format!("{} (admin)", p.name)
            } else {
                p.name.clone()
            }
        })
        .collect();
    let _ = writeln!(out, "participants: {}", names.join(", "));
    let _ = writeln!(out);

    for (n, item) in board.agenda_items.iter().enumerate() {
        let kind = item_types::lookup(&item.item_type).map_or(item.item_type.as_str(), |t| t.name);
        let _ = writeln!(
            out,
            "{}. {} ({}, {} min) - {}",
            n + 1,
            item.title,
            kind,
            item.estimated_time_minutes,
            status_label(item.status)
        );
        let _ = writeln!(out, "   id: {}", item.id);
        if let Some(presenter) = &item.presenter {
            let _ = writeln!(out, "   presenter: {}", presenter);
        }
        if item.is_voting() {
            let tally: Vec<String> =
                item.vote_tally.iter().map(|(k, v)| format!("{} {}", k, v)).collect();
            let participants = board.participant_count();
            let _ = writeln!(
                out,
                "   {} | requires {}/{} | votes: {}",
                item.voting_threshold.as_str(),
                required_votes(item.voting_threshold, participants),
                participants,
                tally.join(", ")
            );
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "participation {}% | completion {}% | consensus {}% | efficiency {}% | {} min planned",
        stats.participation_rate,
        stats.completion_rate,
        stats.consensus_rate,
        stats.efficiency,
        stats.total_estimated_minutes
    );
    out
}

fn status_label(status: ItemStatus) -> &'static str {
    match status {
        ItemStatus::Pending => "pending",
        ItemStatus::Approved => "APPROVED",
        ItemStatus::Rejected => "REJECTED",
        ItemStatus::Tied => "TIED",
        ItemStatus::Completed => "done",
    }
}

pub fn type_catalog() -> String {
    let mut out = String::new();
    for item_type in item_types::ITEM_TYPES {
        let options: Vec<&str> = item_type.options.iter().map(|o| o.key).collect();
        let _ = writeln!(
            out,
            "{:<20} {:<20} {:>3} min  {}",
            item_type.key,
            item_type.name,
            item_type.estimated_minutes,
            if options.is_empty() { "no vote".to_string() } else { options.join("/") }
        );
    }
    out
}
