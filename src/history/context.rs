//! Tournament vs. cash game classification.
//!
//! This runs on the header line before any amount is parsed because the
//! answer decides whether every later number is chips or currency.
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::money::{Amount, MoneyUnit};

/// Big blind (in cents) at which a cash game counts as high stakes.
const HIGH_STAKES_CASH_BIG_BLIND: Amount = 1_000;
/// Big blind (in chips) at which a tournament level counts as high stakes.
const HIGH_STAKES_TOURNAMENT_BIG_BLIND: Amount = 10_000;

static TOURNAMENT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bTournament\s*#\s*\d+").expect("valid regex"));
static LEVEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bLevel\s*[IVXLC0-9]+").expect("valid regex"));
static BUY_IN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[$€£]?\d+(?:\.\d+)?\s*\+\s*[$€£]?\d+(?:\.\d+)?").expect("valid regex")
});
static CURRENCY_STAKES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[$€£]\s*\d[\d,]*(?:\.\d+)?\s*/\s*[$€£]\s*\d").expect("valid regex")
});
static DECIMAL_STAKES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d+\.\d{2}\s*/\s*\d+\.\d{2}\b").expect("valid regex"));
static CURRENCY_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(USD|EUR|GBP|CAD)\b").expect("valid regex"));

/// How a hand's numbers should be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameContext {
    pub is_tournament: bool,
    pub unit: MoneyUnit,
    /// True when printed amounts have to be scaled into minor units.
    pub conversion_needed: bool,
    pub is_high_stakes: bool,
    /// ISO code or symbol printed in the header, if any.
    pub currency: Option<String>,
}

impl GameContext {
    pub fn tournament() -> Self {
        GameContext {
            is_tournament: true,
            unit: MoneyUnit::Chips,
            conversion_needed: false,
            is_high_stakes: false,
            currency: None,
        }
    }

    pub fn cash(currency: Option<String>) -> Self {
        GameContext {
            is_tournament: false,
            unit: MoneyUnit::Currency,
            conversion_needed: true,
            is_high_stakes: false,
            currency,
        }
    }

    /// Fill in the stakes flag once the big blind is known.
    pub fn with_big_blind(mut self, big_blind: Amount) -> Self {
        let threshold = if self.is_tournament {
            HIGH_STAKES_TOURNAMENT_BIG_BLIND
        } else {
            HIGH_STAKES_CASH_BIG_BLIND
        };
        self.is_high_stakes = big_blind >= threshold;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ContextConfidence {
    Low,
    Medium,
    High,
}

/// Which markers were found in the header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextSignals {
    pub tournament_id: bool,
    pub level: bool,
    pub buy_in: bool,
    pub currency_stakes: bool,
    pub decimal_stakes: bool,
    /// What the dialect's own layout says, if it says anything.
    pub layout_tournament: Option<bool>,
}

impl ContextSignals {
    fn tournament_votes(&self) -> usize {
        [
            self.tournament_id,
            self.level,
            self.buy_in,
            self.layout_tournament == Some(true),
        ]
        .iter()
        .filter(|v| **v)
        .count()
    }

    fn cash_votes(&self) -> usize {
        [self.currency_stakes, self.layout_tournament == Some(false)]
            .iter()
            .filter(|v| **v)
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextClassification {
    pub context: GameContext,
    pub confidence: ContextConfidence,
    pub signals: ContextSignals,
    /// Contradictions between signals. Never empty when confidence is `Low`
    /// because of a conflict.
    pub warnings: Vec<String>,
}

/// Classify a header line.
///
/// `layout_tournament` is the dialect's own opinion (for example a hand id
/// prefix); `None` when the dialect's layout doesn't say.
pub fn classify(header: &str, layout_tournament: Option<bool>) -> ContextClassification {
    let signals = ContextSignals {
        tournament_id: TOURNAMENT_ID.is_match(header),
        level: LEVEL.is_match(header),
        buy_in: BUY_IN.is_match(header),
        currency_stakes: CURRENCY_STAKES.is_match(header),
        decimal_stakes: DECIMAL_STAKES.is_match(header),
        layout_tournament,
    };
    let currency = CURRENCY_CODE
        .captures(header)
        .map(|c| c[1].to_string())
        .or_else(|| {
            ['$', '€', '£']
                .into_iter()
                .find(|s| header.contains(*s))
                .map(String::from)
        });

    let t = signals.tournament_votes();
    let c = signals.cash_votes();
    let mut warnings = Vec::new();

    let (is_tournament, confidence) = match (t, c) {
        (0, 0) => {
            // Nothing conclusive. Fractional stakes can only be currency.
            warnings.push("no tournament or cash game markers in header".to_string());
            (!signals.decimal_stakes, ContextConfidence::Low)
        }
        (t, 0) => (
            true,
            if t >= 2 {
                ContextConfidence::High
            } else {
                ContextConfidence::Medium
            },
        ),
        (0, c) => (
            false,
            if c >= 2 || signals.decimal_stakes {
                ContextConfidence::High
            } else {
                ContextConfidence::Medium
            },
        ),
        (t, c) => {
            warnings.push(format!(
                "header has both tournament ({t}) and cash game ({c}) markers"
            ));
            // An explicit tournament id wins a tie.
            (t >= c, ContextConfidence::Low)
        }
    };

    for w in &warnings {
        warn!(header, warning = %w, "Ambiguous game context");
    }

    let context = if is_tournament {
        GameContext {
            currency,
            ..GameContext::tournament()
        }
    } else {
        GameContext::cash(currency)
    };
    debug!(?context, ?confidence, "Classified game context");

    ContextClassification {
        context,
        confidence,
        signals,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pokerstars_tournament() {
        let header = "PokerStars Hand #208112233445: Tournament #3012345678, $0.98+$0.12 USD Hold'em No Limit - Level IV (50/100) - 2020/01/15 20:31:02 ET";
        let c = classify(header, None);
        assert!(c.context.is_tournament);
        assert_eq!(MoneyUnit::Chips, c.context.unit);
        assert!(!c.context.conversion_needed);
        assert_eq!(ContextConfidence::High, c.confidence);
        assert_eq!(Some("USD".to_string()), c.context.currency);
        assert!(c.warnings.is_empty());
    }

    #[test]
    fn test_pokerstars_cash() {
        let header = "PokerStars Hand #208112233446:  Hold'em No Limit ($0.05/$0.10 USD) - 2020/01/15 20:31:02 ET";
        let c = classify(header, None);
        assert!(!c.context.is_tournament);
        assert_eq!(MoneyUnit::Currency, c.context.unit);
        assert!(c.context.conversion_needed);
        assert_eq!(ContextConfidence::Medium, c.confidence);
    }

    #[test]
    fn test_layout_hint_raises_confidence() {
        let header = "Poker Hand #RC1234567: Hold'em No Limit ($0.02/$0.05) - 2023/03/01 10:00:00";
        let c = classify(header, Some(false));
        assert!(!c.context.is_tournament);
        assert_eq!(ContextConfidence::High, c.confidence);
    }

    #[test]
    fn test_contradiction_is_reported_not_guessed_silently() {
        let header = "Poker Hand #TM99: Tournament #5, Hold'em No Limit ($0.02/$0.05)";
        let c = classify(header, Some(true));
        assert!(c.context.is_tournament);
        assert_eq!(ContextConfidence::Low, c.confidence);
        assert_eq!(1, c.warnings.len());
    }

    #[test]
    fn test_no_markers_falls_back_on_stakes_shape() {
        let decimal = classify("Hand #1 - Holdem (No Limit) - 0.10/0.25", None);
        assert!(!decimal.context.is_tournament);
        assert_eq!(ContextConfidence::Low, decimal.confidence);

        let whole = classify("Hand #1 - Holdem (No Limit) - 10/25", None);
        assert!(whole.context.is_tournament);
        assert!(!whole.warnings.is_empty());
    }

    #[test]
    fn test_high_stakes() {
        assert!(GameContext::cash(None).with_big_blind(1_000).is_high_stakes);
        assert!(!GameContext::cash(None).with_big_blind(10).is_high_stakes);
        assert!(!GameContext::tournament().with_big_blind(1_000).is_high_stakes);
    }
}
