use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;
use tracing::{debug, error, instrument, trace};

use crate::anomaly::{AnomalyKind, AnomalyLog, AnomalyLogEntry};
use crate::config::SettlementConfig;
use crate::core::{Card, PlayerKey, format_cards};
use crate::guards::{self, GuardError, GuardResult};
use crate::history::{Action, ActionKind, Amount, HandHistory, MoneyUnit, format_amount};
use crate::settlement::{
    Pot, PotAward, PotStatus, SettlementError, ShowdownFacts, SidePotError, calculate_side_pots,
    settle,
};

use super::snapshot::{Replay, ShowdownPayout, Snapshot, Street};

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("action by {0}, who isn't seated")]
    UnknownPlayer(PlayerKey),
    #[error(transparent)]
    SidePot(#[from] SidePotError),
    #[error(transparent)]
    Settlement(#[from] SettlementError),
    #[error(transparent)]
    Guard(#[from] GuardError),
}

impl ReplayError {
    pub fn code(&self) -> &'static str {
        match self {
            ReplayError::UnknownPlayer(_) => "unknown_player",
            ReplayError::SidePot(SidePotError::ConservationViolated { .. }) => {
                "conservation_violated"
            }
            ReplayError::SidePot(_) => "invalid_pot",
            ReplayError::Settlement(SettlementError::UnresolvedWinner { .. }) => {
                "unresolved_winner"
            }
            ReplayError::Settlement(SettlementError::AnomalyLog(_)) => "anomaly_log_unavailable",
            ReplayError::Guard(_) => "guard_failed",
        }
    }
}

/// Canonical keys interned to small indices for the length of one hand.
#[derive(Debug)]
struct PlayerTable {
    keys: Vec<PlayerKey>,
    names: Vec<String>,
    seats: Vec<u8>,
    index: BTreeMap<PlayerKey, usize>,
}

impl PlayerTable {
    fn new(hand: &HandHistory) -> Self {
        let mut table = PlayerTable {
            keys: Vec::with_capacity(hand.players.len()),
            names: Vec::with_capacity(hand.players.len()),
            seats: Vec::with_capacity(hand.players.len()),
            index: BTreeMap::new(),
        };
        for p in &hand.players {
            table.index.insert(p.key.clone(), table.keys.len());
            table.keys.push(p.key.clone());
            table.names.push(p.name.clone());
            table.seats.push(p.seat);
        }
        table
    }

    fn idx(&self, key: &PlayerKey) -> Result<usize, ReplayError> {
        self.index
            .get(key)
            .copied()
            .ok_or_else(|| ReplayError::UnknownPlayer(key.clone()))
    }

    fn len(&self) -> usize {
        self.keys.len()
    }

    /// Expand a per-index vector into a key-ordered map.
    fn map<T: Clone>(&self, values: &[T]) -> BTreeMap<PlayerKey, T> {
        self.keys.iter().cloned().zip(values.iter().cloned()).collect()
    }
}

/// Mutable table state while the action log is folded into snapshots.
#[derive(Debug)]
struct TableState {
    starting: Vec<Amount>,
    stacks: Vec<Amount>,
    committed: Vec<Amount>,
    pending: Vec<Amount>,
    folded: Vec<bool>,
    all_in: Vec<bool>,
    revealed: Vec<Option<Vec<Card>>>,
    board: Vec<Card>,
    street: Street,
    /// Set once anyone has been all-in; side pots are shown from then on.
    split_pots: bool,
}

impl TableState {
    fn new(hand: &HandHistory) -> Self {
        let n = hand.players.len();
        let starting: Vec<Amount> = hand.players.iter().map(|p| p.starting_stack).collect();
        TableState {
            stacks: starting.clone(),
            starting,
            committed: vec![0; n],
            pending: vec![0; n],
            folded: vec![false; n],
            all_in: vec![false; n],
            revealed: vec![None; n],
            board: Vec::new(),
            street: Street::Preflop,
            split_pots: false,
        }
    }

    /// Move chips from a stack into the pot. Never takes more than the
    /// player has. Returns what actually moved.
    fn contribute(&mut self, idx: usize, amount: Amount, pending: bool) -> Amount {
        let moved = amount.clamp(0, self.stacks[idx]);
        self.stacks[idx] -= moved;
        self.committed[idx] += moved;
        if pending {
            self.pending[idx] += moved;
        }
        if self.stacks[idx] == 0 && moved > 0 {
            self.mark_all_in(idx);
        }
        moved
    }

    fn mark_all_in(&mut self, idx: usize) {
        self.all_in[idx] = true;
        self.split_pots = true;
    }

    fn return_uncalled(&mut self, idx: usize, amount: Amount) -> Amount {
        let returned = amount.clamp(0, self.committed[idx]);
        self.committed[idx] -= returned;
        self.pending[idx] -= returned.min(self.pending[idx]);
        self.stacks[idx] += returned;
        if self.stacks[idx] > 0 {
            self.all_in[idx] = false;
        }
        returned
    }

    fn next_street(&mut self, street: Street, cards: &[Card]) {
        self.street = street;
        self.pending.iter_mut().for_each(|p| *p = 0);
        if cards.len() > 1 {
            self.board = cards.to_vec();
        } else {
            self.board.extend_from_slice(cards);
        }
    }

    fn live(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.folded.len()).filter(|i| !self.folded[*i])
    }

    fn statuses(&self) -> Vec<PotStatus> {
        (0..self.folded.len())
            .map(|i| {
                if self.folded[i] {
                    PotStatus::Folded
                } else if self.all_in[i] {
                    PotStatus::AllIn
                } else {
                    PotStatus::Active
                }
            })
            .collect()
    }
}

/// Replay a parsed hand into its snapshot sequence.
///
/// Every snapshot is checked by the guards as soon as it is built; a
/// critical failure stops the build. The final snapshot settles the pots
/// and is the only one with rake taken out.
#[instrument(level = "debug", skip_all, fields(hand_id = %hand.hand_id))]
pub fn build(
    hand: &HandHistory,
    config: &SettlementConfig,
    log: &dyn AnomalyLog,
) -> Result<Replay, ReplayError> {
    let mut builder = ReplayBuilder::new(hand, config, log);
    builder.seed()?;

    for action in hand.preflop.iter().filter(|a| !a.kind.is_forced()) {
        builder.action(action)?;
    }
    for (street, actions) in [
        (Street::Flop, &hand.flop),
        (Street::Turn, &hand.turn),
        (Street::River, &hand.river),
    ] {
        if let Some(s) = actions {
            builder.transition(street, &s.cards)?;
            for action in &s.actions {
                builder.action(action)?;
            }
        }
    }
    if let Some(showdown) = &hand.showdown {
        for action in &showdown.actions {
            builder.action(action)?;
        }
    }
    builder.finish()
}

struct ReplayBuilder<'a> {
    hand: &'a HandHistory,
    config: &'a SettlementConfig,
    log: &'a dyn AnomalyLog,
    players: PlayerTable,
    state: TableState,
    initial_total: Amount,
    snapshots: Vec<Snapshot>,
}

impl<'a> ReplayBuilder<'a> {
    fn new(hand: &'a HandHistory, config: &'a SettlementConfig, log: &'a dyn AnomalyLog) -> Self {
        let state = TableState::new(hand);
        ReplayBuilder {
            hand,
            config,
            log,
            players: PlayerTable::new(hand),
            initial_total: state.starting.iter().sum(),
            state,
            snapshots: Vec::new(),
        }
    }

    fn unit(&self) -> MoneyUnit {
        self.hand.context.unit
    }

    fn money(&self, amount: Amount) -> String {
        format_amount(amount, self.unit())
    }

    /// Antes and dead blinds go straight to the pot; live blinds stay in
    /// front of the player.
    fn seed(&mut self) -> Result<(), ReplayError> {
        let mut total = 0;
        for action in self.hand.preflop.iter().filter(|a| a.kind.is_forced()) {
            let idx = self.players.idx(&action.player)?;
            let moved = match action.kind {
                ActionKind::Ante { amount } | ActionKind::PostDeadBlind { amount } => {
                    self.state.contribute(idx, amount, false)
                }
                ActionKind::PostSmallBlind { amount } | ActionKind::PostBigBlind { amount } => {
                    self.state.contribute(idx, amount, true)
                }
                _ => 0,
            };
            trace!(player = %action.player, moved, "Seeded forced bet");
            total += moved;
        }
        let description = if total > 0 {
            format!("Blinds and antes posted ({})", self.money(total))
        } else {
            "Hand begins".to_string()
        };
        self.push(description)
    }

    fn transition(&mut self, street: Street, cards: &[Card]) -> Result<(), ReplayError> {
        self.state.next_street(street, cards);
        let description = format!("{street}: [{}]", format_cards(&self.state.board));
        self.push(description)
    }

    fn action(&mut self, action: &Action) -> Result<(), ReplayError> {
        let idx = self.players.idx(&action.player)?;
        let name = self.players.names[idx].clone();
        let description = match &action.kind {
            ActionKind::Fold => {
                self.state.folded[idx] = true;
                format!("{name} folds")
            }
            ActionKind::Check => format!("{name} checks"),
            ActionKind::Call { amount } => {
                let moved = self.state.contribute(idx, *amount, true);
                format!("{name} calls {}", self.money(moved))
            }
            ActionKind::Bet { amount } => {
                let moved = self.state.contribute(idx, *amount, true);
                format!("{name} bets {}", self.money(moved))
            }
            ActionKind::Raise { to, .. } => {
                let added = (to - self.state.pending[idx]).max(0);
                self.state.contribute(idx, added, true);
                format!("{name} raises to {}", self.money(self.state.pending[idx]))
            }
            ActionKind::AllIn { amount, to } => {
                let printed = match to {
                    Some(to) => (to - self.state.pending[idx]).max(0),
                    None => *amount,
                };
                let moved = self.state.contribute(idx, printed, true);
                if printed != moved {
                    debug!(player = %action.player, printed, moved, "All-in amount capped to stack");
                }
                self.state.mark_all_in(idx);
                format!("{name} is all-in for {}", self.money(moved))
            }
            ActionKind::Ante { amount } => {
                let moved = self.state.contribute(idx, *amount, false);
                format!("{name} posts ante {}", self.money(moved))
            }
            ActionKind::PostSmallBlind { amount } | ActionKind::PostBigBlind { amount } => {
                let moved = self.state.contribute(idx, *amount, true);
                format!("{name} posts {}", self.money(moved))
            }
            ActionKind::PostDeadBlind { amount } => {
                let moved = self.state.contribute(idx, *amount, false);
                format!("{name} posts dead blind {}", self.money(moved))
            }
            ActionKind::UncalledReturn { amount } => {
                let returned = self.state.return_uncalled(idx, *amount);
                format!("Uncalled {} returned to {name}", self.money(returned))
            }
            ActionKind::Show { cards } => {
                self.state.revealed[idx] = Some(cards.clone());
                format!("{name} shows [{}]", format_cards(cards))
            }
            ActionKind::Muck => format!("{name} mucks"),
        };

        self.heads_up_reveal();
        self.push(description)
    }

    /// Two players left and one of them all-in: both hands are turned up.
    fn heads_up_reveal(&mut self) {
        let live: Vec<usize> = self.state.live().collect();
        if live.len() != 2 || !live.iter().any(|i| self.state.all_in[*i]) {
            return;
        }
        for idx in live {
            if self.state.revealed[idx].is_some() {
                continue;
            }
            let known = &self.hand.players[idx].hole_cards;
            if known.len() == 2 {
                trace!(player = %self.players.keys[idx], "Revealing all-in hand");
                self.state.revealed[idx] = Some(known.clone());
            }
        }
    }

    fn committed_map(&self) -> BTreeMap<PlayerKey, Amount> {
        self.players.map(&self.state.committed)
    }

    fn status_map(&self) -> BTreeMap<PlayerKey, PotStatus> {
        self.players.map(&self.state.statuses())
    }

    fn pots(&self, rake: Amount) -> Result<Vec<Pot>, ReplayError> {
        let committed = self.committed_map();
        if !self.state.split_pots && self.state.street != Street::Showdown {
            let eligible: BTreeSet<PlayerKey> = self
                .state
                .live()
                .map(|i| self.players.keys[i].clone())
                .collect();
            return Ok(vec![Pot {
                amount: committed.values().sum(),
                eligible,
                level: self.state.committed.iter().copied().max().unwrap_or(0),
                is_side: false,
            }]);
        }
        let statuses = self.status_map();
        calculate_side_pots(&committed, &statuses, rake).map_err(|e| {
            if let SidePotError::ConservationViolated { .. } = &e {
                let entry = AnomalyLogEntry::new(
                    &self.hand.hand_id,
                    AnomalyKind::ConservationViolation,
                    e.to_string(),
                )
                .with_contributions(&committed, &statuses);
                if let Err(log_err) = self.log.record(&entry) {
                    error!(error = %log_err, "Unable to record conservation violation");
                }
            }
            ReplayError::from(e)
        })
    }

    fn snapshot(&self, description: String, pots: Vec<Pot>) -> Snapshot {
        let s = &self.state;
        Snapshot {
            sequence: self.snapshots.len(),
            street: s.street,
            description,
            board: s.board.clone(),
            pots,
            stacks: self.players.map(&s.stacks),
            committed: self.players.map(&s.committed),
            pending: self
                .players
                .map(&s.pending)
                .into_iter()
                .filter(|(_, v)| *v != 0)
                .collect(),
            folded: s
                .folded
                .iter()
                .enumerate()
                .filter(|(_, f)| **f)
                .map(|(i, _)| self.players.keys[i].clone())
                .collect(),
            all_in: self.players.map(&s.all_in),
            revealed: s
                .revealed
                .iter()
                .enumerate()
                .filter_map(|(i, r)| r.clone().map(|c| (self.players.keys[i].clone(), c)))
                .collect(),
            rake_applied: 0,
            showdown: None,
        }
    }

    /// Guards every snapshot gets.
    fn common_guards(&self, snap: &Snapshot) -> Vec<GuardResult> {
        let starting = self.players.map(&self.state.starting);
        let all_in: BTreeSet<PlayerKey> = snap
            .all_in
            .iter()
            .filter(|(_, a)| **a)
            .map(|(k, _)| k.clone())
            .collect();
        let mut results = vec![
            guards::pot_accuracy(&snap.pots, &snap.committed, snap.rake_applied),
            guards::all_in_bound(&all_in, &snap.committed, &starting),
            guards::non_negative("stacks", &snap.stacks),
            guards::non_negative("committed", &snap.committed),
            guards::non_negative("pending", &snap.pending),
        ];
        if self.state.split_pots || snap.street == Street::Showdown {
            results.push(guards::side_pot_correctness(&snap.pots, &snap.committed));
        }
        if let Some(prev) = self.snapshots.last() {
            results.push(guards::folded_monotonic(&prev.folded, &snap.folded));
        }
        results
    }

    fn push(&mut self, description: String) -> Result<(), ReplayError> {
        let pots = self.pots(0)?;
        let snap = self.snapshot(description, pots);
        let mut results = self.common_guards(&snap);
        results.push(guards::money_conservation(
            self.initial_total,
            snap.stacks.values().sum(),
            snap.pot_total(),
            0,
        ));
        guards::enforce(&results, &self.hand.hand_id, snap.sequence, self.log)?;
        trace!(sequence = snap.sequence, description = %snap.description, "Snapshot");
        self.snapshots.push(snap);
        Ok(())
    }

    fn finish(mut self) -> Result<Replay, ReplayError> {
        self.state.next_street(Street::Showdown, &[]);
        let rake = self.hand.rake;
        let pots = self.pots(rake)?;

        let committed = self.committed_map();
        let statuses = self.status_map();
        let hole_cards: BTreeMap<PlayerKey, Vec<Card>> = self
            .hand
            .players
            .iter()
            .filter(|p| p.hole_cards.len() == 2)
            .map(|p| (p.key.clone(), p.hole_cards.clone()))
            .collect();
        let seats = self.players.map(&self.players.seats);
        let recorded: BTreeSet<PlayerKey> = self
            .hand
            .showdown
            .iter()
            .flat_map(|s| s.winners.iter().cloned())
            .collect();
        let facts = ShowdownFacts {
            hand_id: &self.hand.hand_id,
            board: &self.state.board,
            hole_cards: &hole_cards,
            seats: &seats,
            recorded_winners: &recorded,
            committed: &committed,
            statuses: &statuses,
        };
        let settlement = settle(&pots, &facts, self.config, self.log)?;

        let final_stacks: BTreeMap<PlayerKey, Amount> = self
            .players
            .map(&self.state.stacks)
            .into_iter()
            .map(|(k, stack)| {
                let won = settlement.payouts.get(&k).copied().unwrap_or(0);
                (k, stack + won)
            })
            .collect();

        let description = describe_awards(&settlement.awards, &self.players, self.unit());
        let mut snap = self.snapshot(description, pots);
        snap.rake_applied = rake;

        let starting = self.players.map(&self.state.starting);
        let mut results = self.common_guards(&snap);
        results.extend([
            guards::money_conservation(self.initial_total, final_stacks.values().sum(), 0, rake),
            guards::stack_consistency(&starting, &committed, &settlement.payouts, &final_stacks),
            guards::non_negative("final_stacks", &final_stacks),
        ]);
        if self.hand.total_pot != 0 {
            results.push(guards::reported_total(
                self.hand.total_pot,
                committed.values().sum(),
            ));
        }
        if let Some(showdown) = &self.hand.showdown {
            let mut collected: BTreeMap<PlayerKey, Amount> = BTreeMap::new();
            for c in &showdown.collected {
                *collected.entry(c.player.clone()).or_default() += c.amount;
            }
            results.push(guards::recorded_collections(&collected, &settlement.payouts));
        }
        guards::enforce(&results, &self.hand.hand_id, snap.sequence, self.log)?;

        snap.showdown = Some(ShowdownPayout {
            payouts: settlement.payouts,
            final_stacks,
            awards: settlement.awards,
        });
        self.snapshots.push(snap);
        debug!(snapshots = self.snapshots.len(), rake, "Replay built");
        Ok(Replay::new(self.hand.hand_id.clone(), self.snapshots))
    }
}

fn describe_awards(
    awards: &[PotAward],
    players: &PlayerTable,
    unit: MoneyUnit,
) -> String {
    if awards.is_empty() {
        return "Hand over".to_string();
    }
    awards
        .iter()
        .map(|award| {
            let names: Vec<&str> = award
                .winners
                .iter()
                .filter_map(|k| players.index.get(k).map(|i| players.names[*i].as_str()))
                .collect();
            let pot = if award.pot_index == 0 {
                "main pot".to_string()
            } else {
                format!("side pot {}", award.pot_index)
            };
            format!(
                "{} wins {} ({})",
                names.join(" and "),
                format_amount(award.amount, unit),
                pot
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}
