use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::core::{Card, PlayerKey, format_cards};

use super::context::{ContextConfidence, GameContext};
use super::money::Amount;
use super::validate::ValidationIssue;

/// The vendor format a hand history was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Site {
    PokerStars,
    GGPoker,
    /// Americas Cardroom and the rest of the Winning Poker Network.
    Acr,
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Site::PokerStars => write!(f, "PokerStars"),
            Site::GGPoker => write!(f, "GGPoker"),
            Site::Acr => write!(f, "ACR"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PlayerStatus {
    #[default]
    Active,
    SittingOut,
    Disconnected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Name exactly as printed.
    pub name: String,
    pub key: PlayerKey,
    pub seat: u8,
    pub starting_stack: Amount,
    /// Position label derived from the button, e.g. `BTN`, `SB`, `BB`, `UTG`.
    pub position: String,
    /// Empty, or exactly two cards.
    pub hole_cards: Vec<Card>,
    pub is_hero: bool,
    pub status: PlayerStatus,
}

/// One entry of the action log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub player: PlayerKey,
    pub kind: ActionKind,
}

/// What a player did. Amounts are integer minor units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionKind {
    Fold,
    Check,
    /// Chips added to match the current bet.
    Call { amount: Amount },
    Bet { amount: Amount },
    /// `delta` is how much the bet went up, `to` is the player's total for
    /// the street afterwards.
    Raise { delta: Amount, to: Amount },
    /// All the player's remaining chips. `amount` is what the line printed as
    /// added; `to` is the street total when it was printed as a raise.
    AllIn { amount: Amount, to: Option<Amount> },
    Ante { amount: Amount },
    PostSmallBlind { amount: Amount },
    PostBigBlind { amount: Amount },
    /// Blind money that goes straight into the pot without counting toward
    /// the player's bet, e.g. the small half of `posts small & big blinds`.
    PostDeadBlind { amount: Amount },
    UncalledReturn { amount: Amount },
    Show { cards: Vec<Card> },
    Muck,
}

impl ActionKind {
    pub fn is_forced(&self) -> bool {
        matches!(
            self,
            ActionKind::Ante { .. }
                | ActionKind::PostSmallBlind { .. }
                | ActionKind::PostBigBlind { .. }
                | ActionKind::PostDeadBlind { .. }
        )
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = &self.player;
        match &self.kind {
            ActionKind::Fold => write!(f, "{p} folds"),
            ActionKind::Check => write!(f, "{p} checks"),
            ActionKind::Call { amount } => write!(f, "{p} calls {amount}"),
            ActionKind::Bet { amount } => write!(f, "{p} bets {amount}"),
            ActionKind::Raise { delta, to } => write!(f, "{p} raises {delta} to {to}"),
            ActionKind::AllIn { amount, to: None } => write!(f, "{p} is all-in for {amount}"),
            ActionKind::AllIn { to: Some(to), .. } => write!(f, "{p} raises all-in to {to}"),
            ActionKind::Ante { amount } => write!(f, "{p} posts ante {amount}"),
            ActionKind::PostSmallBlind { amount } => write!(f, "{p} posts small blind {amount}"),
            ActionKind::PostBigBlind { amount } => write!(f, "{p} posts big blind {amount}"),
            ActionKind::PostDeadBlind { amount } => write!(f, "{p} posts dead blind {amount}"),
            ActionKind::UncalledReturn { amount } => {
                write!(f, "uncalled {amount} returned to {p}")
            }
            ActionKind::Show { cards } => write!(f, "{p} shows [{}]", format_cards(cards)),
            ActionKind::Muck => write!(f, "{p} mucks"),
        }
    }
}

/// Community cards revealed at the start of a street, and what was done on it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreetActions {
    /// The newly revealed cards only: three on the flop, one on turn and river.
    pub cards: Vec<Card>,
    pub actions: Vec<Action>,
}

/// A pot collection line as printed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub player: PlayerKey,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Showdown {
    /// Raw showdown section lines, for display.
    pub blurb: Vec<String>,
    /// Show and muck actions from the showdown section.
    pub actions: Vec<Action>,
    /// Everyone who collected from any pot, in printed order.
    pub winners: Vec<PlayerKey>,
    pub collected: Vec<Collection>,
    /// Sum of every collection.
    pub pot_won: Amount,
}

/// A parsed hand. Built once by the parser and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandHistory {
    pub hand_id: String,
    pub site: Site,
    pub game: String,
    pub limit: String,
    pub table_name: Option<String>,
    pub tournament_id: Option<String>,
    pub level: Option<String>,
    pub seat_count: u8,
    pub button_seat: u8,
    pub small_blind: Amount,
    pub big_blind: Amount,
    pub ante: Option<Amount>,
    pub context: GameContext,
    pub context_confidence: ContextConfidence,
    pub timestamp: Option<NaiveDateTime>,
    pub players: Vec<Player>,
    /// Blinds, antes and preflop betting in printed order.
    pub preflop: Vec<Action>,
    pub flop: Option<StreetActions>,
    pub turn: Option<StreetActions>,
    pub river: Option<StreetActions>,
    pub showdown: Option<Showdown>,
    pub total_pot: Amount,
    /// Everything the house kept: rake plus any jackpot style fees.
    pub rake: Amount,
    pub warnings: Vec<ValidationIssue>,
}

impl HandHistory {
    pub fn player(&self, key: &PlayerKey) -> Option<&Player> {
        self.players.iter().find(|p| &p.key == key)
    }

    pub fn hero(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.is_hero)
    }

    /// Every community card in deal order.
    pub fn board(&self) -> Vec<Card> {
        [&self.flop, &self.turn, &self.river]
            .into_iter()
            .flatten()
            .flat_map(|s| s.cards.iter().copied())
            .collect()
    }

    pub fn action_count(&self) -> usize {
        self.preflop.len()
            + [&self.flop, &self.turn, &self.river]
                .into_iter()
                .flatten()
                .map(|s| s.actions.len())
                .sum::<usize>()
            + self.showdown.as_ref().map_or(0, |s| s.actions.len())
    }
}
