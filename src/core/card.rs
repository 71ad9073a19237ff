use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Card rank, deuce through ace.
///
/// The discriminant doubles as the bit position used by the ranking code, so
/// `Two` must stay at zero and `Ace` at twelve.
#[derive(Debug, PartialEq, Eq, Ord, PartialOrd, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum Value {
    Two = 0,
    Three = 1,
    Four = 2,
    Five = 3,
    Six = 4,
    Seven = 5,
    Eight = 6,
    Nine = 7,
    Ten = 8,
    Jack = 9,
    Queen = 10,
    King = 11,
    Ace = 12,
}

const VALUES: [Value; 13] = [
    Value::Two,
    Value::Three,
    Value::Four,
    Value::Five,
    Value::Six,
    Value::Seven,
    Value::Eight,
    Value::Nine,
    Value::Ten,
    Value::Jack,
    Value::Queen,
    Value::King,
    Value::Ace,
];

impl Value {
    /// Every value from lowest to highest.
    pub const fn values() -> [Value; 13] {
        VALUES
    }

    /// Look up a value by its bit position.
    pub fn from_u8(v: u8) -> Option<Self> {
        VALUES.get(v as usize).copied()
    }

    /// Parse the single character used in hand histories.
    ///
    /// Both `T` and the `1` of a printed `10` map to ten.
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            '2' => Some(Value::Two),
            '3' => Some(Value::Three),
            '4' => Some(Value::Four),
            '5' => Some(Value::Five),
            '6' => Some(Value::Six),
            '7' => Some(Value::Seven),
            '8' => Some(Value::Eight),
            '9' => Some(Value::Nine),
            'T' | '1' => Some(Value::Ten),
            'J' => Some(Value::Jack),
            'Q' => Some(Value::Queen),
            'K' => Some(Value::King),
            'A' => Some(Value::Ace),
            _ => None,
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Value::Two => '2',
            Value::Three => '3',
            Value::Four => '4',
            Value::Five => '5',
            Value::Six => '6',
            Value::Seven => '7',
            Value::Eight => '8',
            Value::Nine => '9',
            Value::Ten => 'T',
            Value::Jack => 'J',
            Value::Queen => 'Q',
            Value::King => 'K',
            Value::Ace => 'A',
        }
    }
}

#[derive(Debug, PartialEq, Eq, Ord, PartialOrd, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum Suit {
    Spade = 0,
    Club = 1,
    Heart = 2,
    Diamond = 3,
}

impl Suit {
    pub const fn suits() -> [Suit; 4] {
        [Suit::Spade, Suit::Club, Suit::Heart, Suit::Diamond]
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            's' => Some(Suit::Spade),
            'c' => Some(Suit::Club),
            'h' => Some(Suit::Heart),
            'd' => Some(Suit::Diamond),
            _ => None,
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Suit::Spade => 's',
            Suit::Club => 'c',
            Suit::Heart => 'h',
            Suit::Diamond => 'd',
        }
    }
}

/// A single playing card.
#[derive(Debug, PartialEq, Eq, Ord, PartialOrd, Hash, Clone, Copy)]
pub struct Card {
    pub value: Value,
    pub suit: Suit,
}

impl Card {
    pub const fn new(value: Value, suit: Suit) -> Self {
        Card { value, suit }
    }
}

#[derive(Error, Debug, PartialEq, Eq, Clone, Hash)]
pub enum CardParseError {
    #[error("card text is empty")]
    Empty,
    #[error("unknown card value in {0:?}")]
    UnknownValue(String),
    #[error("unknown card suit in {0:?}")]
    UnknownSuit(String),
    #[error("unexpected trailing characters in {0:?}")]
    TrailingCharacters(String),
}

impl FromStr for Card {
    type Err = CardParseError;

    /// Parse `Ah`, `td`, or `10s`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut chars = s.chars();
        let first = chars.next().ok_or(CardParseError::Empty)?;
        let value =
            Value::from_char(first).ok_or_else(|| CardParseError::UnknownValue(s.to_string()))?;

        let mut suit_char = chars
            .next()
            .ok_or_else(|| CardParseError::UnknownSuit(s.to_string()))?;
        if first == '1' {
            // Only "10" is a legal two digit value.
            if suit_char != '0' {
                return Err(CardParseError::UnknownValue(s.to_string()));
            }
            suit_char = chars
                .next()
                .ok_or_else(|| CardParseError::UnknownSuit(s.to_string()))?;
        }
        let suit =
            Suit::from_char(suit_char).ok_or_else(|| CardParseError::UnknownSuit(s.to_string()))?;
        if chars.next().is_some() {
            return Err(CardParseError::TrailingCharacters(s.to_string()));
        }
        Ok(Card { value, suit })
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value.to_char(), self.suit.to_char())
    }
}

impl Serialize for Card {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Card {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Parse a whitespace separated run of cards such as `Ah Kd 2c`.
pub fn parse_cards(s: &str) -> Result<Vec<Card>, CardParseError> {
    s.split_whitespace().map(str::parse).collect()
}

/// Render cards the way hand histories print them.
pub fn format_cards(cards: &[Card]) -> String {
    cards
        .iter()
        .map(Card::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}
