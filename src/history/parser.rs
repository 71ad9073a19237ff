//! The parsing engine.
//!
//! One engine reads every supported dialect. It detects the dialect from the
//! header line, classifies tournament vs. cash before touching a single
//! amount, and then walks the remaining lines section by section using the
//! dialect's pattern tables.
use chrono::NaiveDateTime;
use regex::Captures;
use thiserror::Error;
use tracing::{debug, instrument, trace, warn};

use crate::core::{Card, CardParseError, PlayerKey, parse_cards};

use super::context::{ContextConfidence, GameContext, classify};
use super::dialect::{self, Dialect, LinePattern, SHARED};
use super::hand_history::{
    Action, ActionKind, Collection, HandHistory, Player, PlayerStatus, Showdown, Site,
    StreetActions,
};
use super::money::{Amount, AmountError, MoneyUnit, parse_amount};
use super::validate::{ValidationIssue, validate};

/// Largest accepted input.
pub const MAX_INPUT_BYTES: usize = 256 * 1024;
/// Most seats any supported table has.
pub const MAX_PLAYERS: usize = 10;
/// Most actions accepted in a single hand.
pub const MAX_ACTIONS: usize = 1_000;

const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("hand history is empty")]
    Empty,
    #[error("input is {len} bytes, over the {max} byte limit")]
    InputTooLarge { len: usize, max: usize },
    #[error("found {count} hands in one input; submit one hand at a time")]
    MultipleHands { count: usize },
    #[error("unrecognized hand history header: {header:?}")]
    UnrecognizedDialect { header: String },
    #[error("{name} hand histories are not supported")]
    UnsupportedDialect { name: String },
    #[error("unsupported {site} game: {variant}")]
    UnsupportedVariant { site: Site, variant: String },
    #[error("malformed {site} header: {line:?}")]
    MalformedHeader { site: Site, line: String },
    #[error("line {line_no}: malformed {what}: {line:?}")]
    MalformedLine {
        line_no: usize,
        what: &'static str,
        line: String,
    },
    #[error("line {line_no}: {source}")]
    InvalidAmount { line_no: usize, source: AmountError },
    #[error("line {line_no}: {source}")]
    InvalidCard {
        line_no: usize,
        source: CardParseError,
    },
    #[error("line {line_no}: unknown player {name:?}")]
    UnknownPlayer { line_no: usize, name: String },
    #[error("more than {max} players at the table")]
    TooManyPlayers { max: usize },
    #[error("more than {max} actions in one hand")]
    TooManyActions { max: usize },
    #[error("hand failed validation: {}", describe(.0))]
    Validation(Vec<ValidationIssue>),
}

fn describe(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ParseError {
    /// Stable machine readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ParseError::Empty => "empty_input",
            ParseError::InputTooLarge { .. } => "input_too_large",
            ParseError::MultipleHands { .. } => "multiple_hands",
            ParseError::UnrecognizedDialect { .. } => "unrecognized_dialect",
            ParseError::UnsupportedDialect { .. } => "unsupported_dialect",
            ParseError::UnsupportedVariant { .. } => "unsupported_variant",
            ParseError::MalformedHeader { .. } => "malformed_header",
            ParseError::MalformedLine { .. } => "malformed_line",
            ParseError::InvalidAmount { .. } => "invalid_amount",
            ParseError::InvalidCard { .. } => "invalid_card",
            ParseError::UnknownPlayer { .. } => "unknown_player",
            ParseError::TooManyPlayers { .. } => "too_many_players",
            ParseError::TooManyActions { .. } => "too_many_actions",
            ParseError::Validation(_) => "validation_failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    /// Table and seat lines, plus any blinds posted before the deal.
    Setup,
    Preflop,
    Flop,
    Turn,
    River,
    Showdown,
    Summary,
}

/// Header fields pulled out by the dialect grammar.
struct Header {
    hand_id: String,
    tournament_id: Option<String>,
    level: Option<String>,
    game: String,
    limit: String,
    small_blind: Amount,
    big_blind: Amount,
    ante: Option<Amount>,
    timestamp: Option<NaiveDateTime>,
}

/// Parse a single hand history.
///
/// # Examples
/// ```
/// use rs_poker_replay::history::{Site, parse};
///
/// let text = "\
/// Hand #42 - Holdem (No Limit) - $0.01/$0.02 - 2023/01/01 10:00:00 UTC
/// Table 'Oslo' 6-max Seat #1 is the button
/// Seat 1: Ann ($1.00)
/// Seat 2: Bob ($1.00)
/// Ann posts the small blind $0.01
/// Bob posts the big blind $0.02
/// *** HOLE CARDS ***
/// Ann folds
/// Uncalled bet ($0.01) returned to Bob
/// Bob collected $0.02 from main pot
/// *** SUMMARY ***
/// Total pot $0.02 | Rake $0.00
/// ";
/// let hand = parse(text).unwrap();
/// assert_eq!(Site::Acr, hand.site);
/// assert_eq!(2, hand.big_blind);
/// ```
#[instrument(level = "debug", skip(text), fields(len = text.len()))]
pub fn parse(text: &str) -> Result<HandHistory, ParseError> {
    if text.len() > MAX_INPUT_BYTES {
        return Err(ParseError::InputTooLarge {
            len: text.len(),
            max: MAX_INPUT_BYTES,
        });
    }
    let text = text.trim_start_matches('\u{feff}').trim();
    if text.is_empty() {
        return Err(ParseError::Empty);
    }

    // Line numbers are 1-based positions in the trimmed input.
    let lines: Vec<(usize, &str)> = text
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty())
        .collect();

    let headers = lines
        .iter()
        .filter(|(_, l)| dialect::detect(l).is_some())
        .count();
    if headers > 1 {
        return Err(ParseError::MultipleHands { count: headers });
    }

    let (_, header_line) = lines[0];
    let Some(dialect) = dialect::detect(header_line) else {
        return Err(match dialect::known_unsupported(header_line) {
            Some(name) => ParseError::UnsupportedDialect {
                name: name.to_string(),
            },
            None => ParseError::UnrecognizedDialect {
                header: header_line.to_string(),
            },
        });
    };
    debug!(site = %dialect.site, "Detected dialect");

    let classification = classify(header_line, dialect.layout_hint(header_line));
    let unit = classification.context.unit;
    let mut parser = HandParser::new(dialect, unit);
    for w in &classification.warnings {
        parser.warnings.push(ValidationIssue::warning("context", w.clone()));
    }

    let header = parser.header(header_line, classification.context.is_tournament)?;
    parser.small_blind = header.small_blind;

    let Some(&(table_no, table_line)) = lines.get(1) else {
        return Err(ParseError::MalformedLine {
            line_no: 2,
            what: "table line",
            line: String::new(),
        });
    };
    parser.table(table_no, table_line)?;

    for &(line_no, line) in &lines[2..] {
        parser.line(line_no, line)?;
    }

    let context = classification.context.with_big_blind(header.big_blind);
    parser.finish(header, context, classification.confidence)
}

struct HandParser {
    dialect: &'static Dialect,
    unit: MoneyUnit,
    section: Section,
    table_name: Option<String>,
    seat_count: u8,
    button_seat: u8,
    small_blind: Amount,
    players: Vec<Player>,
    preflop: Vec<Action>,
    flop: Option<StreetActions>,
    turn: Option<StreetActions>,
    river: Option<StreetActions>,
    showdown: Showdown,
    saw_showdown: bool,
    saw_hero: bool,
    total_pot: Option<Amount>,
    rake: Amount,
    summary_board: Option<Vec<Card>>,
    action_count: usize,
    warnings: Vec<ValidationIssue>,
}

impl HandParser {
    fn new(dialect: &'static Dialect, unit: MoneyUnit) -> Self {
        HandParser {
            dialect,
            unit,
            section: Section::Setup,
            table_name: None,
            seat_count: 0,
            button_seat: 0,
            small_blind: 0,
            players: Vec::new(),
            preflop: Vec::new(),
            flop: None,
            turn: None,
            river: None,
            showdown: Showdown::default(),
            saw_showdown: false,
            saw_hero: false,
            total_pot: None,
            rake: 0,
            summary_board: None,
            action_count: 0,
            warnings: Vec::new(),
        }
    }

    fn site(&self) -> Site {
        self.dialect.site
    }

    fn amount(&self, raw: &str, line_no: usize) -> Result<Amount, ParseError> {
        parse_amount(raw, self.unit).map_err(|source| ParseError::InvalidAmount { line_no, source })
    }

    fn cards(raw: &str, line_no: usize) -> Result<Vec<Card>, ParseError> {
        parse_cards(raw).map_err(|source| ParseError::InvalidCard { line_no, source })
    }

    fn capture_amount(
        &self,
        caps: &Captures<'_>,
        name: &str,
        line_no: usize,
    ) -> Result<Amount, ParseError> {
        self.amount(caps.name(name).map_or("", |m| m.as_str()), line_no)
    }

    /// The grammar matching the classification is tried first; the other
    /// one is a fallback that leaves a warning behind.
    fn header(&mut self, line: &str, is_tournament: bool) -> Result<Header, ParseError> {
        let dialect = self.dialect;
        let (first, second) = if is_tournament {
            (&dialect.tournament_header, &dialect.cash_header)
        } else {
            (&dialect.cash_header, &dialect.tournament_header)
        };
        let caps = match first.captures(line) {
            Some(caps) => caps,
            None => match second.captures(line) {
                Some(caps) => {
                    self.warnings.push(ValidationIssue::warning(
                        "context",
                        "header layout disagrees with the game context markers",
                    ));
                    caps
                }
                None if SHARED.unsupported_game.is_match(line) => {
                    return Err(ParseError::UnsupportedVariant {
                        site: self.site(),
                        variant: SHARED
                            .unsupported_game
                            .find(line)
                            .map_or_else(String::new, |m| m.as_str().to_string()),
                    });
                }
                None => {
                    return Err(ParseError::MalformedHeader {
                        site: self.site(),
                        line: line.to_string(),
                    });
                }
            },
        };

        let game = caps["game"].to_string();
        if !dialect::is_supported_game(&game) {
            return Err(ParseError::UnsupportedVariant {
                site: self.site(),
                variant: game,
            });
        }

        let timestamp = match caps.name("ts") {
            Some(ts) => match NaiveDateTime::parse_from_str(ts.as_str(), TIMESTAMP_FORMAT) {
                Ok(t) => Some(t),
                Err(e) => {
                    self.warnings.push(ValidationIssue::warning(
                        "timestamp",
                        format!("unreadable timestamp {:?}: {e}", ts.as_str()),
                    ));
                    None
                }
            },
            None => None,
        };

        let ante = match caps.name("ante") {
            Some(a) => Some(self.amount(a.as_str(), 1)?),
            None => None,
        };

        Ok(Header {
            hand_id: caps["id"].to_string(),
            tournament_id: caps.name("tid").map(|m| m.as_str().to_string()),
            level: caps.name("level").map(|m| m.as_str().to_string()),
            game,
            limit: caps["limit"].to_string(),
            small_blind: self.capture_amount(&caps, "sb", 1)?,
            big_blind: self.capture_amount(&caps, "bb", 1)?,
            ante,
            timestamp,
        })
    }

    fn table(&mut self, line_no: usize, line: &str) -> Result<(), ParseError> {
        let malformed = || ParseError::MalformedLine {
            line_no,
            what: "table line",
            line: line.to_string(),
        };
        let caps = self.dialect.table_line.captures(line).ok_or_else(malformed)?;
        self.table_name = Some(caps["table"].to_string());
        self.seat_count = caps["max"].parse().map_err(|_| malformed())?;
        self.button_seat = caps["button"].parse().map_err(|_| malformed())?;
        Ok(())
    }

    fn line(&mut self, line_no: usize, line: &str) -> Result<(), ParseError> {
        if let Some(caps) = SHARED.marker.captures(line) {
            return self.marker(line_no, &caps["marker"], &caps["rest"]);
        }
        match self.section {
            Section::Setup => {
                if let Some(caps) = self.dialect.seat_line.captures(line) {
                    return self.seat(line_no, &caps);
                }
                self.body_line(line_no, line)
            }
            Section::Summary => self.summary_line(line_no, line),
            _ => self.body_line(line_no, line),
        }
    }

    fn seat(&mut self, line_no: usize, caps: &Captures<'_>) -> Result<(), ParseError> {
        if self.players.len() >= MAX_PLAYERS {
            return Err(ParseError::TooManyPlayers { max: MAX_PLAYERS });
        }
        let stack_raw = &caps["stack"];
        if self.unit == MoneyUnit::Chips && stack_raw.contains(['$', '€', '£']) {
            self.warnings.push(ValidationIssue::warning(
                "context",
                format!("tournament hand prints a currency stack {stack_raw:?}"),
            ));
        }
        let status_text = &caps["status"];
        let status = if SHARED.sitting_out.is_match(status_text) {
            PlayerStatus::SittingOut
        } else if SHARED.disconnected.is_match(status_text) {
            PlayerStatus::Disconnected
        } else {
            PlayerStatus::Active
        };
        let name = caps["name"].to_string();
        self.players.push(Player {
            key: PlayerKey::new(&name),
            seat: caps["seat"].parse().map_err(|_| ParseError::MalformedLine {
                line_no,
                what: "seat line",
                line: caps[0].to_string(),
            })?,
            starting_stack: self.amount(stack_raw, line_no)?,
            position: String::new(),
            hole_cards: Vec::new(),
            is_hero: false,
            status,
            name,
        });
        Ok(())
    }

    fn marker(&mut self, line_no: usize, marker: &str, rest: &str) -> Result<(), ParseError> {
        trace!(line_no, marker, "Section marker");
        let last_group = |rest: &str| -> Result<Vec<Card>, ParseError> {
            let group = SHARED
                .bracket
                .captures_iter(rest)
                .last()
                .and_then(|c| c.name("cards").map(|m| m.as_str().to_string()))
                .unwrap_or_default();
            Self::cards(&group, line_no)
        };
        match marker {
            "HOLE CARDS" | "PRE-FLOP" | "PREFLOP" => self.section = Section::Preflop,
            "FLOP" => {
                self.flop = Some(StreetActions {
                    cards: last_group(rest)?,
                    actions: Vec::new(),
                });
                self.section = Section::Flop;
            }
            "TURN" => {
                self.turn = Some(StreetActions {
                    cards: last_group(rest)?,
                    actions: Vec::new(),
                });
                self.section = Section::Turn;
            }
            "RIVER" => {
                self.river = Some(StreetActions {
                    cards: last_group(rest)?,
                    actions: Vec::new(),
                });
                self.section = Section::River;
            }
            "SHOW DOWN" | "SHOWDOWN" => {
                self.saw_showdown = true;
                self.section = Section::Showdown;
            }
            "SUMMARY" => self.section = Section::Summary,
            // Run it twice, double boards and friends.
            other => {
                return Err(ParseError::UnsupportedVariant {
                    site: self.site(),
                    variant: other.to_string(),
                });
            }
        }
        Ok(())
    }

    fn resolve(&self, name: &str, line_no: usize) -> Result<PlayerKey, ParseError> {
        let key = PlayerKey::new(name);
        if self.players.iter().any(|p| p.key == key) {
            Ok(key)
        } else {
            Err(ParseError::UnknownPlayer {
                line_no,
                name: name.to_string(),
            })
        }
    }

    fn player_mut(&mut self, key: &PlayerKey) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| &p.key == key)
    }

    /// Record cards for a player unless some are already known.
    fn reveal(&mut self, key: &PlayerKey, cards: &[Card]) {
        if cards.len() != 2 {
            return;
        }
        if let Some(p) = self.player_mut(key)
            && p.hole_cards.is_empty()
        {
            p.hole_cards = cards.to_vec();
        }
    }

    fn push_action(&mut self, action: Action) -> Result<(), ParseError> {
        self.action_count += 1;
        if self.action_count > MAX_ACTIONS {
            return Err(ParseError::TooManyActions { max: MAX_ACTIONS });
        }
        trace!(%action, "Action");
        let list = match self.section {
            Section::Setup | Section::Preflop => &mut self.preflop,
            Section::Flop => &mut self.flop.get_or_insert_with(Default::default).actions,
            Section::Turn => &mut self.turn.get_or_insert_with(Default::default).actions,
            Section::River => &mut self.river.get_or_insert_with(Default::default).actions,
            Section::Showdown | Section::Summary => &mut self.showdown.actions,
        };
        list.push(action);
        Ok(())
    }

    fn body_line(&mut self, line_no: usize, line: &str) -> Result<(), ParseError> {
        if self.section == Section::Showdown {
            self.showdown.blurb.push(line.to_string());
        }

        if let Some(caps) = SHARED.dealt.captures(line) {
            let key = self.resolve(&caps["name"], line_no)?;
            if let Some(raw) = caps.name("cards") {
                let cards = Self::cards(raw.as_str(), line_no)?;
                let first_hero = !self.saw_hero;
                self.saw_hero = true;
                if let Some(p) = self.player_mut(&key) {
                    p.hole_cards = cards;
                    p.is_hero = first_hero;
                }
            }
            return Ok(());
        }

        if let Some(caps) = SHARED.uncalled.captures(line) {
            let player = self.resolve(&caps["name"], line_no)?;
            let amount = self.capture_amount(&caps, "amount", line_no)?;
            return self.push_action(Action {
                player,
                kind: ActionKind::UncalledReturn { amount },
            });
        }

        if let Some(caps) = SHARED.collected.captures(line) {
            let player = self.resolve(&caps["name"], line_no)?;
            let amount = self.capture_amount(&caps, "amount", line_no)?;
            if !self.showdown.winners.contains(&player) {
                self.showdown.winners.push(player.clone());
            }
            self.showdown.pot_won = self.showdown.pot_won.saturating_add(amount);
            self.showdown.collected.push(Collection { player, amount });
            return Ok(());
        }

        if let Some((pattern, caps)) = self.dialect.match_action(line) {
            let player = self.resolve(&caps["name"], line_no)?;
            for kind in self.action_kinds(pattern, &caps, line_no)? {
                if let ActionKind::Show { cards } = &kind {
                    self.reveal(&player, cards);
                }
                self.push_action(Action {
                    player: player.clone(),
                    kind,
                })?;
            }
            return Ok(());
        }

        // A seated player moving chips in a way no pattern understands would
        // leave the replay short.
        if matches!(
            self.section,
            Section::Setup | Section::Preflop | Section::Flop | Section::Turn | Section::River
        ) && let Some(caps) = self.dialect.money_verb.captures(line)
            && self
                .players
                .iter()
                .any(|p| p.key == PlayerKey::new(&caps["name"]))
        {
            return Err(ParseError::MalformedLine {
                line_no,
                what: "betting line",
                line: line.to_string(),
            });
        }

        trace!(line_no, line, "Skipping unrecognized line");
        Ok(())
    }

    /// Most lines are one action; a combined small and big blind post is two.
    fn action_kinds(
        &self,
        pattern: LinePattern,
        caps: &Captures<'_>,
        line_no: usize,
    ) -> Result<Vec<ActionKind>, ParseError> {
        let amount = |name: &str| self.capture_amount(caps, name, line_no);
        let kind = match pattern {
            LinePattern::RaiseAllIn => ActionKind::AllIn {
                amount: amount("amount")?,
                to: Some(amount("to")?),
            },
            LinePattern::Raise => ActionKind::Raise {
                delta: amount("amount")?,
                to: amount("to")?,
            },
            LinePattern::BetAllIn | LinePattern::CallAllIn => ActionKind::AllIn {
                amount: amount("amount")?,
                to: None,
            },
            LinePattern::Bet => ActionKind::Bet {
                amount: amount("amount")?,
            },
            LinePattern::Call => ActionKind::Call {
                amount: amount("amount")?,
            },
            LinePattern::Check => ActionKind::Check,
            LinePattern::Fold => ActionKind::Fold,
            LinePattern::SmallBlind => ActionKind::PostSmallBlind {
                amount: amount("amount")?,
            },
            LinePattern::BigBlind => ActionKind::PostBigBlind {
                amount: amount("amount")?,
            },
            LinePattern::Ante => ActionKind::Ante {
                amount: amount("amount")?,
            },
            LinePattern::Shows => ActionKind::Show {
                cards: Self::cards(&caps["cards"], line_no)?,
            },
            LinePattern::DeadBlinds => {
                let total = amount("amount")?;
                let dead = total.min(self.small_blind);
                return Ok(vec![
                    ActionKind::PostDeadBlind { amount: dead },
                    ActionKind::PostBigBlind {
                        amount: total - dead,
                    },
                ]);
            }
            LinePattern::Mucks => ActionKind::Muck,
        };
        Ok(vec![kind])
    }

    fn summary_line(&mut self, line_no: usize, line: &str) -> Result<(), ParseError> {
        if let Some(caps) = SHARED.total_pot.captures(line) {
            self.total_pot = Some(self.capture_amount(&caps, "amount", line_no)?);
            let mut fees: Amount = 0;
            for fee in SHARED.fee.captures_iter(&caps["rest"]) {
                let value = self.capture_amount(&fee, "amount", line_no)?;
                trace!(label = &fee["label"], value, "House fee");
                fees = fees.saturating_add(value);
            }
            self.rake = fees;
            return Ok(());
        }
        if let Some(caps) = SHARED.board.captures(line) {
            self.summary_board = Some(Self::cards(&caps["cards"], line_no)?);
            return Ok(());
        }
        if let Some(caps) = SHARED.summary_seat.captures(line) {
            let cards = Self::cards(&caps["cards"], line_no)?;
            let seat: Option<u8> = caps["seat"].parse().ok();
            let key = self
                .players
                .iter()
                .find(|p| Some(p.seat) == seat)
                .map(|p| p.key.clone());
            match key {
                Some(key) => self.reveal(&key, &cards),
                None => trace!(line_no, "Summary line for an unknown seat"),
            }
            return Ok(());
        }
        trace!(line_no, line, "Skipping summary line");
        Ok(())
    }

    fn assign_positions(&mut self) {
        let mut order: Vec<usize> = (0..self.players.len()).collect();
        // Clockwise from the button, wrapping past the highest seat.
        let button = self.button_seat;
        order.sort_by_key(|&i| {
            let seat = self.players[i].seat;
            (seat < button, seat)
        });
        let labels = position_labels(order.len());
        for (i, label) in order.into_iter().zip(labels) {
            self.players[i].position = label.to_string();
        }
    }

    fn finish(
        mut self,
        header: Header,
        context: GameContext,
        confidence: ContextConfidence,
    ) -> Result<HandHistory, ParseError> {
        self.assign_positions();

        let total_pot = match self.total_pot {
            Some(t) => t,
            None => {
                self.warnings
                    .push(ValidationIssue::warning("total_pot", "no total pot line"));
                0
            }
        };

        let ante = header.ante.or_else(|| {
            self.preflop.iter().find_map(|a| match a.kind {
                ActionKind::Ante { amount } => Some(amount),
                _ => None,
            })
        });

        let showdown = if self.saw_showdown || !self.showdown.collected.is_empty() {
            Some(self.showdown)
        } else {
            None
        };

        let mut hand = HandHistory {
            hand_id: header.hand_id,
            site: self.dialect.site,
            game: header.game,
            limit: header.limit,
            table_name: self.table_name,
            tournament_id: header.tournament_id,
            level: header.level,
            seat_count: self.seat_count,
            button_seat: self.button_seat,
            small_blind: header.small_blind,
            big_blind: header.big_blind,
            ante,
            context,
            context_confidence: confidence,
            timestamp: header.timestamp,
            players: self.players,
            preflop: self.preflop,
            flop: self.flop,
            turn: self.turn,
            river: self.river,
            showdown,
            total_pot,
            rake: self.rake,
            warnings: Vec::new(),
        };

        if let Some(board) = self.summary_board
            && board != hand.board()
        {
            self.warnings.push(ValidationIssue::warning(
                "board",
                "summary board differs from the dealt streets",
            ));
        }

        let (critical, mut warnings): (Vec<_>, Vec<_>) =
            validate(&hand).into_iter().partition(ValidationIssue::is_critical);
        if !critical.is_empty() {
            warn!(hand_id = %hand.hand_id, count = critical.len(), "Hand failed validation");
            return Err(ParseError::Validation(critical));
        }
        self.warnings.append(&mut warnings);
        hand.warnings = self.warnings;
        debug!(
            hand_id = %hand.hand_id,
            players = hand.players.len(),
            actions = hand.action_count(),
            warnings = hand.warnings.len(),
            "Parsed hand"
        );
        Ok(hand)
    }
}

/// Seats after the big blind, by how many of them there are.
const MIDDLE_POSITIONS: [&[&str]; 8] = [
    &[],
    &["UTG"],
    &["UTG", "CO"],
    &["UTG", "HJ", "CO"],
    &["UTG", "MP", "HJ", "CO"],
    &["UTG", "UTG+1", "MP", "HJ", "CO"],
    &["UTG", "UTG+1", "MP", "MP+1", "HJ", "CO"],
    &["UTG", "UTG+1", "UTG+2", "MP", "MP+1", "HJ", "CO"],
];

/// Position names clockwise from the button.
fn position_labels(n: usize) -> Vec<&'static str> {
    match n {
        0 => vec![],
        1 => vec!["BTN"],
        2 => vec!["BTN/SB", "BB"],
        _ => {
            let rest = (n - 3).min(MIDDLE_POSITIONS.len() - 1);
            let mut labels = vec!["BTN", "SB", "BB"];
            labels.extend_from_slice(MIDDLE_POSITIONS[rest]);
            labels
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{
        ACR_CASH_UNCALLED, GG_TOURNAMENT_SIDE_POT, STARS_CASH_DEAD_BLIND, STARS_CASH_SHOWDOWN,
        STARS_TOURNAMENT_SPLIT,
    };

    #[test]
    fn test_stars_cash() {
        let hand = parse(STARS_CASH_SHOWDOWN).unwrap();
        assert_eq!(Site::PokerStars, hand.site);
        assert_eq!("208112233446", hand.hand_id);
        assert!(!hand.context.is_tournament);
        assert_eq!(MoneyUnit::Currency, hand.context.unit);
        assert_eq!(5, hand.small_blind);
        assert_eq!(10, hand.big_blind);
        assert_eq!(3, hand.players.len());
        assert_eq!(1_000, hand.players[0].starting_stack);
        assert_eq!(145, hand.total_pot);
        assert_eq!(3, hand.rake);
        assert_eq!(5, hand.board().len());

        let hero = hand.hero().unwrap();
        assert_eq!("Alice", hero.name);
        assert_eq!("BTN", hero.position);
        assert_eq!(2, hero.hole_cards.len());

        // Carol's cards only come from the showdown.
        let carol = hand.player(&PlayerKey::new("carol")).unwrap();
        assert_eq!("BB", carol.position);
        assert_eq!(parse_cards("Qs Qd").unwrap(), carol.hole_cards);

        let showdown = hand.showdown.as_ref().unwrap();
        assert_eq!(vec![PlayerKey::new("Alice")], showdown.winners);
        assert_eq!(142, showdown.pot_won);
    }

    #[test]
    fn test_raise_carries_delta_and_total() {
        let hand = parse(STARS_CASH_SHOWDOWN).unwrap();
        let raise = hand
            .preflop
            .iter()
            .find(|a| matches!(a.kind, ActionKind::Raise { .. }))
            .unwrap();
        assert_eq!(ActionKind::Raise { delta: 20, to: 30 }, raise.kind);
    }

    #[test]
    fn test_gg_tournament() {
        let hand = parse(GG_TOURNAMENT_SIDE_POT).unwrap();
        assert_eq!(Site::GGPoker, hand.site);
        assert!(hand.context.is_tournament);
        assert_eq!(MoneyUnit::Chips, hand.context.unit);
        assert_eq!(Some("98765".to_string()), hand.tournament_id);
        assert_eq!(Some(25), hand.ante);
        assert_eq!(5_000, hand.players[0].starting_stack);
        assert_eq!(7_000, hand.total_pot);
        assert_eq!(0, hand.rake);

        let all_ins = hand
            .preflop
            .iter()
            .chain(hand.flop.iter().flat_map(|f| f.actions.iter()))
            .filter(|a| matches!(a.kind, ActionKind::AllIn { .. }))
            .count();
        assert_eq!(2, all_ins);
        // Only the hero's deal line has cards.
        assert_eq!(1, hand.players.iter().filter(|p| p.is_hero).count());
    }

    #[test]
    fn test_acr_cash_with_uncalled_bet() {
        let hand = parse(ACR_CASH_UNCALLED).unwrap();
        assert_eq!(Site::Acr, hand.site);
        let bob = hand.player(&PlayerKey::new("Big Bob")).unwrap();
        assert_eq!(200, bob.starting_stack);
        assert_eq!("BB", bob.position);
        let flop = hand.flop.as_ref().unwrap();
        assert!(flop.actions.iter().any(|a| a.kind == ActionKind::UncalledReturn { amount: 10 }));
        assert!(hand.turn.is_none());
        assert_eq!(13, hand.total_pot);
    }

    #[test]
    fn test_capped_all_in_raise() {
        let hand = parse(STARS_TOURNAMENT_SPLIT).unwrap();
        assert_eq!(
            ActionKind::AllIn {
                amount: 1_400,
                to: Some(1_500)
            },
            hand.preflop[2].kind
        );
        assert_eq!(Some("IV".to_string()), hand.level);
        assert_eq!("BTN/SB", hand.players[0].position);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(Err(ParseError::Empty), parse("  \n\n "));
    }

    #[test]
    fn test_too_large() {
        let text = "x".repeat(MAX_INPUT_BYTES + 1);
        assert_eq!("input_too_large", parse(&text).unwrap_err().code());
    }

    #[test]
    fn test_multiple_hands_rejected() {
        let text = format!("{STARS_CASH_SHOWDOWN}\n\n{ACR_CASH_UNCALLED}");
        assert_eq!(
            Err(ParseError::MultipleHands { count: 2 }),
            parse(&text)
        );
    }

    #[test]
    fn test_unknown_vendor() {
        let err = parse("Winamax Poker - CashGame - HandId: #123-4-5").unwrap_err();
        assert_eq!(
            ParseError::UnsupportedDialect {
                name: "Winamax".to_string()
            },
            err
        );
        let err = parse("Some random text").unwrap_err();
        assert_eq!("unrecognized_dialect", err.code());
    }

    #[test]
    fn test_omaha_is_unsupported_variant() {
        let text = STARS_CASH_SHOWDOWN.replace("Hold'em No Limit", "Omaha Pot Limit");
        assert!(matches!(
            parse(&text),
            Err(ParseError::UnsupportedVariant { .. })
        ));
    }

    #[test]
    fn test_run_it_twice_is_unsupported() {
        let text = STARS_CASH_SHOWDOWN.replace("*** FLOP ***", "*** FIRST FLOP ***");
        assert!(matches!(
            parse(&text),
            Err(ParseError::UnsupportedVariant { variant, .. }) if variant == "FIRST FLOP"
        ));
    }

    #[test]
    fn test_missing_table_line() {
        let text = STARS_CASH_SHOWDOWN.replace("Table 'Alcyone III'", "Tabel 'Alcyone III'");
        assert_eq!("malformed_line", parse(&text).unwrap_err().code());
    }

    #[test]
    fn test_unknown_actor() {
        let text = STARS_CASH_SHOWDOWN.replace("Bob: folds", "Mallory: folds");
        assert!(matches!(
            parse(&text),
            Err(ParseError::UnknownPlayer { name, .. }) if name == "Mallory"
        ));
    }

    #[test]
    fn test_bad_amount() {
        let text = STARS_CASH_SHOWDOWN.replace("Carol: calls $0.20", "Carol: calls $999999999.00");
        assert_eq!("invalid_amount", parse(&text).unwrap_err().code());
    }

    #[test]
    fn test_small_and_big_blinds_split_into_dead_and_live() {
        let hand = parse(STARS_CASH_DEAD_BLIND).unwrap();
        let ann = PlayerKey::new("Ann");
        let posted: Vec<&ActionKind> = hand
            .preflop
            .iter()
            .filter(|a| a.player == ann && a.kind.is_forced())
            .map(|a| &a.kind)
            .collect();
        assert_eq!(
            vec![
                &ActionKind::PostDeadBlind { amount: 5 },
                &ActionKind::PostBigBlind { amount: 10 }
            ],
            posted
        );
        assert_eq!(30, hand.total_pot);
    }

    #[test]
    fn test_unknown_betting_line_is_an_error() {
        let text = STARS_CASH_SHOWDOWN.replace(
            "Carol: posts big blind $0.10",
            "Carol: posts big blind $0.10\nAlice: posts straddle $0.20",
        );
        let err = parse(&text).unwrap_err();
        assert_eq!("malformed_line", err.code());
        assert!(matches!(
            err,
            ParseError::MalformedLine { what: "betting line", ref line, .. }
                if line == "Alice: posts straddle $0.20"
        ));

        let text = STARS_CASH_SHOWDOWN.replace("Carol: calls $0.40", "Carol: calls all of it");
        assert_eq!("malformed_line", parse(&text).unwrap_err().code());
    }

    #[test]
    fn test_chatter_is_still_skipped() {
        let text = STARS_CASH_SHOWDOWN.replace(
            "Bob: folds",
            "Bob: folds\nBob said, \"nice hand\"\nCarol is connected",
        );
        assert!(parse(&text).is_ok());
    }

    #[test]
    fn test_critical_validation_aborts() {
        // Board card also dealt to the hero.
        let text = STARS_CASH_SHOWDOWN.replace("Dealt to Alice [Ah Kh]", "Dealt to Alice [Ah Kd]");
        let err = parse(&text).unwrap_err();
        assert_eq!("validation_failed", err.code());
    }

    #[test]
    fn test_summary_does_not_overwrite_known_cards() {
        let text = STARS_CASH_SHOWDOWN.replace(
            "Seat 1: Alice (button) showed [Ah Kh]",
            "Seat 1: Alice (button) showed [2c 2d]",
        );
        let hand = parse(&text).unwrap();
        assert_eq!(parse_cards("Ah Kh").unwrap(), hand.hero().unwrap().hole_cards);
    }

    #[test]
    fn test_position_labels() {
        assert_eq!(vec!["BTN/SB", "BB"], position_labels(2));
        assert_eq!(vec!["BTN", "SB", "BB"], position_labels(3));
        assert_eq!(vec!["BTN", "SB", "BB", "UTG", "HJ", "CO"], position_labels(6));
        assert_eq!(9, position_labels(9).len());
        assert_eq!(
            vec!["BTN", "SB", "BB", "UTG", "UTG+1", "UTG+2", "MP", "MP+1", "HJ", "CO"],
            position_labels(10)
        );
    }

    #[test]
    fn test_parse_is_deterministic() {
        let a = serde_json::to_string(&parse(GG_TOURNAMENT_SIDE_POT).unwrap()).unwrap();
        let b = serde_json::to_string(&parse(GG_TOURNAMENT_SIDE_POT).unwrap()).unwrap();
        assert_eq!(a, b);
    }
}
