use std::collections::{BTreeSet, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::Card;

use super::hand_history::{ActionKind, HandHistory, PlayerStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueSeverity {
    /// The hand can't be replayed.
    Critical,
    /// Worth showing, but the hand is still usable.
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: IssueSeverity,
    pub field: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn critical(field: &str, message: impl Into<String>) -> Self {
        ValidationIssue {
            severity: IssueSeverity::Critical,
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn warning(field: &str, message: impl Into<String>) -> Self {
        ValidationIssue {
            severity: IssueSeverity::Warning,
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn is_critical(&self) -> bool {
        self.severity == IssueSeverity::Critical
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a freshly parsed hand for structural problems.
///
/// Returns every issue found, critical and warning alike; the caller decides
/// what to do with them.
pub fn validate(hand: &HandHistory) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    check_required(hand, &mut issues);
    check_money(hand, &mut issues);
    check_players(hand, &mut issues);
    check_board(hand, &mut issues);
    check_cards(hand, &mut issues);
    issues
}

fn check_required(hand: &HandHistory, issues: &mut Vec<ValidationIssue>) {
    if hand.hand_id.trim().is_empty() {
        issues.push(ValidationIssue::critical("hand_id", "hand id is missing"));
    }
    if hand.players.len() < 2 {
        issues.push(ValidationIssue::critical(
            "players",
            format!("a hand needs at least 2 players, found {}", hand.players.len()),
        ));
    }
    if hand.big_blind <= 0 {
        issues.push(ValidationIssue::critical(
            "big_blind",
            "big blind must be positive",
        ));
    }
    if hand.small_blind > hand.big_blind {
        issues.push(ValidationIssue::warning(
            "small_blind",
            "small blind is larger than the big blind",
        ));
    }
    if hand.context.is_tournament && hand.tournament_id.is_none() {
        issues.push(ValidationIssue::warning(
            "context",
            "classified as a tournament but no tournament id was found",
        ));
    }
}

fn check_money(hand: &HandHistory, issues: &mut Vec<ValidationIssue>) {
    let fields = [
        ("small_blind", hand.small_blind),
        ("big_blind", hand.big_blind),
        ("ante", hand.ante.unwrap_or(0)),
        ("total_pot", hand.total_pot),
        ("rake", hand.rake),
    ];
    for (field, value) in fields {
        if value < 0 {
            issues.push(ValidationIssue::critical(field, "must not be negative"));
        }
    }
    if hand.rake > hand.total_pot {
        issues.push(ValidationIssue::critical(
            "rake",
            format!("rake {} exceeds total pot {}", hand.rake, hand.total_pot),
        ));
    }
    for p in &hand.players {
        if p.starting_stack < 0 {
            issues.push(ValidationIssue::critical(
                "players.starting_stack",
                format!("{} has a negative stack", p.name),
            ));
        }
    }

    let all_actions = hand
        .preflop
        .iter()
        .chain(
            [&hand.flop, &hand.turn, &hand.river]
                .into_iter()
                .flatten()
                .flat_map(|s| s.actions.iter()),
        );
    for action in all_actions {
        let amounts: Vec<i64> = match &action.kind {
            ActionKind::Call { amount }
            | ActionKind::Bet { amount }
            | ActionKind::Ante { amount }
            | ActionKind::PostSmallBlind { amount }
            | ActionKind::PostBigBlind { amount }
            | ActionKind::PostDeadBlind { amount }
            | ActionKind::UncalledReturn { amount } => vec![*amount],
            ActionKind::Raise { delta, to } => vec![*delta, *to],
            ActionKind::AllIn { amount, to } => vec![*amount, to.unwrap_or(0)],
            _ => vec![],
        };
        if amounts.iter().any(|a| *a < 0) {
            issues.push(ValidationIssue::critical(
                "actions",
                format!("negative amount in `{action}`"),
            ));
        }
        let sitting_out = hand
            .player(&action.player)
            .is_some_and(|p| p.status == PlayerStatus::SittingOut);
        if sitting_out && !action.kind.is_forced() {
            issues.push(ValidationIssue::warning(
                "actions",
                format!("{} acted while marked as sitting out", action.player),
            ));
        }
    }
}

fn check_players(hand: &HandHistory, issues: &mut Vec<ValidationIssue>) {
    let mut keys = HashSet::new();
    let mut seats = HashSet::new();
    for p in &hand.players {
        if !keys.insert(&p.key) {
            issues.push(ValidationIssue::critical(
                "players",
                format!("two players share the key {:?}", p.key.as_str()),
            ));
        }
        if !seats.insert(p.seat) {
            issues.push(ValidationIssue::critical(
                "players.seat",
                format!("seat {} is listed twice", p.seat),
            ));
        }
        if p.seat == 0 || p.seat > hand.seat_count {
            issues.push(ValidationIssue::warning(
                "players.seat",
                format!("seat {} is outside a {}-max table", p.seat, hand.seat_count),
            ));
        }
    }
    if !hand.players.iter().any(|p| p.seat == hand.button_seat) {
        issues.push(ValidationIssue::warning(
            "button_seat",
            format!("no player sits in button seat {}", hand.button_seat),
        ));
    }
}

fn check_board(hand: &HandHistory, issues: &mut Vec<ValidationIssue>) {
    let expected = [("flop", &hand.flop, 3), ("turn", &hand.turn, 1), ("river", &hand.river, 1)];
    for (name, street, count) in expected {
        if let Some(s) = street
            && s.cards.len() != count
        {
            issues.push(ValidationIssue::critical(
                name,
                format!("expected {count} new card(s), found {}", s.cards.len()),
            ));
        }
    }
    if hand.turn.is_some() && hand.flop.is_none() {
        issues.push(ValidationIssue::critical("turn", "turn dealt without a flop"));
    }
    if hand.river.is_some() && hand.turn.is_none() {
        issues.push(ValidationIssue::critical("river", "river dealt without a turn"));
    }
}

fn check_cards(hand: &HandHistory, issues: &mut Vec<ValidationIssue>) {
    let mut seen: BTreeSet<Card> = BTreeSet::new();
    for p in &hand.players {
        if !(p.hole_cards.is_empty() || p.hole_cards.len() == 2) {
            issues.push(ValidationIssue::critical(
                "players.hole_cards",
                format!("{} has {} hole cards", p.name, p.hole_cards.len()),
            ));
        }
        for c in &p.hole_cards {
            if !seen.insert(*c) {
                issues.push(ValidationIssue::critical(
                    "players.hole_cards",
                    format!("card {c} is dealt more than once"),
                ));
            }
        }
    }
    for c in hand.board() {
        if !seen.insert(c) {
            issues.push(ValidationIssue::critical(
                "board",
                format!("card {c} is dealt more than once"),
            ));
        }
    }
}
