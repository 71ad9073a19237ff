//! Per-dialect pattern tables.
//!
//! The three supported formats share one line grammar with small
//! differences: where the stakes sit in the header, how a seat line prints a
//! stack, and whether an actor name is followed by a colon. Those
//! differences are written down here as data; [`super::parser`] is the only
//! code that interprets them.
use std::sync::LazyLock;

use regex::Regex;

use super::hand_history::Site;

/// Games this crate can replay. Anything else is an unsupported variant.
const SUPPORTED_GAMES: [&str; 2] = ["Hold'em", "Holdem"];

const GAMES: &str = r"Hold'em|Holdem|Omaha Hi/Lo|Omaha|5 Card Omaha|Courchevel|Razz|7 Card Stud|5 Card Draw|Triple Draw 2-7 Lowball|Badugi";
const LIMITS: &str = r"No Limit|Pot Limit|Fixed Limit|Limit";
const TIMESTAMP: &str = r"(?:\s*-\s*(?P<ts>\d{4}/\d{2}/\d{2} \d{1,2}:\d{2}:\d{2}))?";
const AMOUNT: &str = r"[$€£]?[0-9][0-9,]*(?:\.[0-9]+)?(?: ?[A-Z]{3})?";

/// Vendor names we recognise but can't parse, checked against the first line.
const KNOWN_UNSUPPORTED: [(&str, &str); 6] = [
    ("Winamax", "Winamax"),
    ("888poker", "888poker"),
    ("#Game No", "888poker"),
    ("PartyPoker", "PartyPoker"),
    ("Full Tilt", "Full Tilt Poker"),
    ("iPoker", "iPoker"),
];

/// The raw table a dialect is compiled from.
struct DialectSource {
    site: Site,
    signature: &'static str,
    tournament_header: &'static str,
    cash_header: &'static str,
    /// Layout markers that settle tournament vs. cash on their own.
    tournament_layout: Option<&'static str>,
    cash_layout: Option<&'static str>,
    table_line: &'static str,
    seat_line: &'static str,
    /// Prefix matching the acting player's name.
    actor: &'static str,
}

const SOURCES: [DialectSource; 3] = [
    DialectSource {
        site: Site::PokerStars,
        signature: r"^PokerStars (?:Zoom )?(?:Hand|Game) #\d+:",
        tournament_header: r"^PokerStars (?:Zoom )?(?:Hand|Game) #(?P<id>\d+):\s+Tournament #(?P<tid>\d+),\s*(?P<buyin>.*?)\s*(?P<game>{GAMES}) (?P<limit>{LIMITS}) - (?:Match Round [IVXLC]+, )?Level (?P<level>[IVXLC0-9]+) \((?P<sb>[^/)]+)/(?P<bb>[^/)]+)(?:/(?P<ante>[^)]+))?\){TIMESTAMP}",
        cash_header: r"^PokerStars (?:Zoom )?(?:Hand|Game) #(?P<id>\d+):\s+(?P<game>{GAMES}) (?P<limit>{LIMITS}) \((?P<sb>[^/)]+)/(?P<bb>[^)\s]+)(?:\s+(?P<ccy>[A-Z]{3}))?\){TIMESTAMP}",
        tournament_layout: None,
        cash_layout: None,
        table_line: r"^Table '(?P<table>[^']+)' (?P<max>\d+)-max (?:\(Play Money\) )?Seat #(?P<button>\d+) is the button",
        seat_line: r"^Seat (?P<seat>\d+): (?P<name>.+?) \((?P<stack>[^ )]+) in chips(?:, [^)]*)?\)(?P<status>.*)$",
        actor: r"^(?P<name>.+?): ",
    },
    DialectSource {
        site: Site::GGPoker,
        signature: r"^Poker Hand #(?:[A-Z]{2})?\d+:",
        tournament_header: r"^Poker Hand #(?P<id>TM\d+): Tournament #(?P<tid>\d+),\s*(?P<buyin>.*?)\s*(?P<game>{GAMES}) (?P<limit>{LIMITS}) - Level\s*(?P<level>\d+)\((?P<sb>[^/()]+)/(?P<bb>[^/()]+)(?:\((?P<ante>[^)]+)\))?\){TIMESTAMP}",
        cash_header: r"^Poker Hand #(?P<id>[A-Z]{2}\d+): (?P<game>{GAMES}) (?P<limit>{LIMITS}) \((?P<sb>[^/)]+)/(?P<bb>[^)]+)\){TIMESTAMP}",
        tournament_layout: Some(r"^Poker Hand #TM"),
        cash_layout: Some(r"^Poker Hand #(?:RC|HD|HH|SG|CO)"),
        table_line: r"^Table '(?P<table>[^']+)' (?P<max>\d+)-max Seat #(?P<button>\d+) is the button",
        seat_line: r"^Seat (?P<seat>\d+): (?P<name>.+?) \((?P<stack>[^ )]+) in chips\)(?P<status>.*)$",
        actor: r"^(?P<name>.+?): ",
    },
    DialectSource {
        site: Site::Acr,
        signature: r"^(?:Game )?Hand #\d+ - ",
        tournament_header: r"^(?:Game )?Hand #(?P<id>\d+) - Tournament #(?P<tid>\d+) - (?P<game>{GAMES}) \((?P<limit>{LIMITS})\) - Level (?P<level>\d+) \((?P<sb>[^/)]+)/(?P<bb>[^/)]+)(?:/(?P<ante>[^)]+))?\){TIMESTAMP}",
        cash_header: r"^(?:Game )?Hand #(?P<id>\d+) - (?P<game>{GAMES}) \((?P<limit>{LIMITS})\) - (?P<sb>[$€£][0-9.,]+)/(?P<bb>[$€£][0-9.,]+){TIMESTAMP}",
        tournament_layout: None,
        cash_layout: None,
        table_line: r"^Table '(?P<table>[^']+)' (?P<max>\d+)-max Seat #(?P<button>\d+) is the button",
        seat_line: r"^Seat (?P<seat>\d+): (?P<name>.+?) \((?P<stack>[$€£]?[0-9][0-9.,]*)\)(?P<status>.*)$",
        actor: r"^(?P<name>.+?) ",
    },
];

/// The kind of betting line a pattern recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LinePattern {
    RaiseAllIn,
    Raise,
    BetAllIn,
    Bet,
    CallAllIn,
    Call,
    Check,
    Fold,
    SmallBlind,
    BigBlind,
    DeadBlinds,
    Ante,
    Shows,
    Mucks,
}

/// Action grammar in match order. The capped all-in raise has to come
/// before the plain raise, which would otherwise swallow it.
const ACTION_TEMPLATES: [(LinePattern, &str); 14] = [
    (
        LinePattern::RaiseAllIn,
        r"raises (?P<amount>{AMOUNT}) to (?P<to>{AMOUNT}) and is all-in\s*$",
    ),
    (
        LinePattern::Raise,
        r"raises (?P<amount>{AMOUNT}) to (?P<to>{AMOUNT})\s*$",
    ),
    (
        LinePattern::BetAllIn,
        r"bets (?P<amount>{AMOUNT}) and is all-in\s*$",
    ),
    (LinePattern::Bet, r"bets (?P<amount>{AMOUNT})\s*$"),
    (
        LinePattern::CallAllIn,
        r"calls (?P<amount>{AMOUNT}) and is all-in\s*$",
    ),
    (LinePattern::Call, r"calls (?P<amount>{AMOUNT})\s*$"),
    (LinePattern::Check, r"checks\s*$"),
    (LinePattern::Fold, r"folds(?: \[[^\]]*\])?\s*$"),
    (
        LinePattern::SmallBlind,
        r"posts (?:the )?small blind (?P<amount>{AMOUNT})(?P<all_in> and is all-in)?\s*$",
    ),
    (
        LinePattern::BigBlind,
        r"posts (?:the )?big blind (?P<amount>{AMOUNT})(?P<all_in> and is all-in)?\s*$",
    ),
    (
        LinePattern::DeadBlinds,
        r"posts small & big blinds (?P<amount>{AMOUNT})(?P<all_in> and is all-in)?\s*$",
    ),
    (
        LinePattern::Ante,
        r"posts (?:the )?ante (?P<amount>{AMOUNT})(?P<all_in> and is all-in)?\s*$",
    ),
    (LinePattern::Shows, r"shows \[(?P<cards>[^\]]+)\]"),
    (LinePattern::Mucks, r"(?:mucks(?: hand)?|doesn't show hand)"),
];

fn compile(template: &str) -> Regex {
    let pattern = template
        .replace("{GAMES}", GAMES)
        .replace("{LIMITS}", LIMITS)
        .replace("{TIMESTAMP}", TIMESTAMP)
        .replace("{AMOUNT}", AMOUNT);
    Regex::new(&pattern).expect("dialect table regexes are valid")
}

/// A compiled dialect.
#[derive(Debug)]
pub(crate) struct Dialect {
    pub site: Site,
    pub signature: Regex,
    pub tournament_header: Regex,
    pub cash_header: Regex,
    pub tournament_layout: Option<Regex>,
    pub cash_layout: Option<Regex>,
    pub table_line: Regex,
    pub seat_line: Regex,
    pub actions: Vec<(LinePattern, Regex)>,
    /// A seated player's line whose verb moves chips. Anything this matches
    /// has to be understood by one of `actions`.
    pub money_verb: Regex,
}

impl Dialect {
    fn from_source(source: &DialectSource) -> Self {
        Dialect {
            site: source.site,
            signature: compile(source.signature),
            tournament_header: compile(source.tournament_header),
            cash_header: compile(source.cash_header),
            tournament_layout: source.tournament_layout.map(compile),
            cash_layout: source.cash_layout.map(compile),
            table_line: compile(source.table_line),
            seat_line: compile(source.seat_line),
            actions: ACTION_TEMPLATES
                .iter()
                .map(|(kind, t)| (*kind, compile(&format!("{}{}", source.actor, t))))
                .collect(),
            money_verb: compile(&format!(
                "{}{}",
                source.actor, r"(?:posts|bets|calls|raises)\b"
            )),
        }
    }

    /// What the header's layout alone says about tournament vs. cash.
    pub fn layout_hint(&self, header: &str) -> Option<bool> {
        if self
            .tournament_layout
            .as_ref()
            .is_some_and(|r| r.is_match(header))
        {
            Some(true)
        } else if self.cash_layout.as_ref().is_some_and(|r| r.is_match(header)) {
            Some(false)
        } else {
            None
        }
    }

    /// Try each action pattern in order.
    pub fn match_action<'l>(&self, line: &'l str) -> Option<(LinePattern, regex::Captures<'l>)> {
        self.actions
            .iter()
            .find_map(|(kind, re)| re.captures(line).map(|caps| (*kind, caps)))
    }
}

pub(crate) static DIALECTS: LazyLock<Vec<Dialect>> =
    LazyLock::new(|| SOURCES.iter().map(Dialect::from_source).collect());

/// Find the dialect whose signature matches a header line.
pub(crate) fn detect(header: &str) -> Option<&'static Dialect> {
    DIALECTS.iter().find(|d| d.signature.is_match(header))
}

/// Name a vendor we know of but don't support.
pub(crate) fn known_unsupported(header: &str) -> Option<&'static str> {
    KNOWN_UNSUPPORTED
        .iter()
        .find(|(needle, _)| header.contains(needle))
        .map(|(_, name)| *name)
}

pub(crate) fn is_supported_game(game: &str) -> bool {
    SUPPORTED_GAMES.contains(&game)
}

/// Lines whose shape is the same in every dialect.
#[derive(Debug)]
pub(crate) struct SharedLines {
    pub marker: Regex,
    pub bracket: Regex,
    pub dealt: Regex,
    pub uncalled: Regex,
    pub collected: Regex,
    pub total_pot: Regex,
    pub fee: Regex,
    pub board: Regex,
    pub summary_seat: Regex,
    pub sitting_out: Regex,
    pub disconnected: Regex,
    pub unsupported_game: Regex,
}

pub(crate) static SHARED: LazyLock<SharedLines> = LazyLock::new(|| SharedLines {
    marker: compile(r"^\*\*\* (?P<marker>[A-Z][A-Z -]*?) \*\*\*(?P<rest>.*)$"),
    bracket: compile(r"\[(?P<cards>[^\]]*)\]"),
    dealt: compile(r"^Dealt to (?P<name>.+?)(?: \[(?P<cards>[^\]]+)\])?\s*$"),
    uncalled: compile(r"^Uncalled bet \((?P<amount>{AMOUNT})\) returned to (?P<name>.+?)\s*$"),
    collected: compile(r"^(?P<name>.+?):? collected (?P<amount>{AMOUNT}) from .*pot.*$"),
    total_pot: compile(r"^Total pot (?P<amount>{AMOUNT})(?P<rest>.*)$"),
    fee: compile(r"\|\s*(?P<label>[A-Za-z][A-Za-z ]*?)\s+(?P<amount>{AMOUNT})"),
    board: compile(r"^Board \[(?P<cards>[^\]]*)\]"),
    summary_seat: compile(
        r"^Seat (?P<seat>\d+): (?P<rest>.*?)\b(?P<verb>showed|mucked) \[(?P<cards>[^\]]+)\]",
    ),
    sitting_out: compile(r"(?i)\bsitting out\b|\bout of hand\b"),
    disconnected: compile(r"(?i)\bdisconnected\b"),
    unsupported_game: compile(r"Omaha|Razz|Stud|Draw|Badugi|Courchevel"),
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_each_dialect() {
        let stars = "PokerStars Hand #1234567890: Hold'em No Limit ($0.05/$0.10 USD) - 2020/01/01 10:00:00 ET";
        let gg = "Poker Hand #RC123: Hold'em No Limit ($0.02/$0.05) - 2023/01/01 10:00:00";
        let acr = "Hand #2000001 - Holdem (No Limit) - $0.01/$0.02 - 2023/01/01 10:00:00 UTC";
        assert_eq!(Site::PokerStars, detect(stars).unwrap().site);
        assert_eq!(Site::GGPoker, detect(gg).unwrap().site);
        assert_eq!(Site::Acr, detect(acr).unwrap().site);
        assert!(detect("Winamax Poker - CashGame - HandId: #1").is_none());
    }

    #[test]
    fn test_known_unsupported_vendor() {
        assert_eq!(
            Some("Winamax"),
            known_unsupported("Winamax Poker - CashGame - HandId: #1-2-3")
        );
        assert_eq!(None, known_unsupported("hello"));
    }

    #[test]
    fn test_all_in_raise_matched_before_raise() {
        let stars = detect("PokerStars Hand #1:").unwrap();
        let (kind, caps) = stars
            .match_action("Villain: raises 300 to 600 and is all-in")
            .unwrap();
        assert_eq!(LinePattern::RaiseAllIn, kind);
        assert_eq!("Villain", &caps["name"]);
        assert_eq!("600", &caps["to"]);

        let (kind, _) = stars.match_action("Villain: raises 300 to 600").unwrap();
        assert_eq!(LinePattern::Raise, kind);
    }

    #[test]
    fn test_actor_separator_is_per_dialect() {
        let acr = detect("Hand #1 - ").unwrap();
        let (kind, caps) = acr.match_action("Big Bob calls 0.50").unwrap();
        assert_eq!(LinePattern::Call, kind);
        assert_eq!("Big Bob", &caps["name"]);

        let stars = detect("PokerStars Hand #1:").unwrap();
        assert!(stars.match_action("Big Bob calls 0.50").is_none());
    }

    #[test]
    fn test_small_and_big_blinds() {
        let stars = detect("PokerStars Hand #1:").unwrap();
        let (kind, caps) = stars
            .match_action("Ann: posts small & big blinds $0.15")
            .unwrap();
        assert_eq!(LinePattern::DeadBlinds, kind);
        assert_eq!("$0.15", &caps["amount"]);
    }

    #[test]
    fn test_money_verb_catches_unknown_bets() {
        let stars = detect("PokerStars Hand #1:").unwrap();
        let line = "Ann: posts straddle $0.20";
        assert!(stars.match_action(line).is_none());
        assert_eq!("Ann", &stars.money_verb.captures(line).unwrap()["name"]);
        assert!(!stars.money_verb.is_match("Ann: checks"));
    }

    #[test]
    fn test_gg_layout_hint() {
        let gg = detect("Poker Hand #TM1:").unwrap();
        assert_eq!(Some(true), gg.layout_hint("Poker Hand #TM1: Tournament"));
        assert_eq!(Some(false), gg.layout_hint("Poker Hand #RC1: Hold'em"));
        assert_eq!(None, gg.layout_hint("Poker Hand #ZZ1: Hold'em"));
    }

    #[test]
    fn test_marker_line() {
        let caps = SHARED
            .marker
            .captures("*** TURN *** [Ah Kd 2c] [5s]")
            .unwrap();
        assert_eq!("TURN", &caps["marker"]);
        let cards: Vec<&str> = SHARED
            .bracket
            .captures_iter(&caps["rest"])
            .map(|c| c.name("cards").map_or("", |m| m.as_str()))
            .collect();
        assert_eq!(vec!["Ah Kd 2c", "5s"], cards);
    }
}
