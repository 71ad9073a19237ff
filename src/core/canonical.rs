//! Player name canonicalization.
//!
//! Hand histories spell the same player differently across sections (case,
//! accents, stray punctuation, doubled spaces). Every lookup in this crate
//! goes through [`PlayerKey`] so two spellings of one name always land on the
//! same entry.
use std::fmt;

use serde::{Deserialize, Serialize};
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// Normalize a free-form player name into a stable lookup key.
///
/// Lower-cases, strips diacritics, drops everything that is neither
/// alphanumeric nor whitespace, and collapses whitespace runs into a single
/// space. A name made only of punctuation falls back to its lower-cased,
/// whitespace-collapsed form so it still has a usable key.
///
/// The function is idempotent.
///
/// # Examples
/// ```
/// use rs_poker_replay::core::canonical_key;
///
/// assert_eq!(canonical_key("José María"), canonical_key("  JOSÉ   MARIA "));
/// assert_eq!("jose maria", canonical_key("José María"));
/// ```
pub fn canonical_key(raw: &str) -> String {
    let folded: String = raw
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    let key = collapse_whitespace(&folded);
    if key.is_empty() {
        collapse_whitespace(&raw.to_lowercase())
    } else {
        key
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A canonicalized player name.
///
/// Construction always canonicalizes, so two keys compare equal exactly when
/// the names they came from are the same player.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerKey(String);

impl PlayerKey {
    /// Creates the key for a player name as printed in a hand history.
    ///
    /// # Arguments
    ///
    /// * `raw` - The name in any case, spacing or accenting; see
    ///   [`canonical_key`] for the normalisation applied.
    pub fn new(raw: &str) -> Self {
        PlayerKey(canonical_key(raw))
    }

    /// The canonical form, e.g. `"jose maria"` for `"  José   MARÍA "`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerKey {
    fn from(raw: &str) -> Self {
        PlayerKey::new(raw)
    }
}
