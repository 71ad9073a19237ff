use crate::core::Card;

/// Given some cards create every possible group of `num_cards` of them.
///
/// Groups come out in lexicographic order of their positions in the source
/// slice. Enumeration is iterative so its stack use doesn't depend on the
/// number of cards.
#[derive(Debug)]
pub struct CardIter<'a> {
    /// All the cards to choose from.
    possible_cards: &'a [Card],

    /// Offsets of the group that will be returned next.
    idx: Vec<usize>,

    /// Size of the requested groups.
    num_cards: usize,

    done: bool,
}

impl CardIter<'_> {
    /// Create a new `CardIter` from a slice of cards.
    /// `num_cards` represents how many cards should be in each group.
    pub fn new(possible_cards: &[Card], num_cards: usize) -> CardIter<'_> {
        CardIter {
            possible_cards,
            idx: (0..num_cards).collect(),
            num_cards,
            done: num_cards > possible_cards.len(),
        }
    }
}

impl Iterator for CardIter<'_> {
    type Item = Vec<Card>;

    fn next(&mut self) -> Option<Vec<Card>> {
        if self.done {
            return None;
        }
        let result: Vec<Card> = self.idx.iter().map(|&i| self.possible_cards[i]).collect();

        // Find the right-most offset that can still move forward.
        let n = self.possible_cards.len();
        let k = self.num_cards;
        let mut level = k;
        loop {
            if level == 0 {
                self.done = true;
                break;
            }
            level -= 1;
            if self.idx[level] < n - k + level {
                self.idx[level] += 1;
                // Everything after the moved offset restarts right behind it.
                for after in level + 1..k {
                    self.idx[after] = self.idx[after - 1] + 1;
                }
                break;
            }
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parse_cards;

    #[test]
    fn test_iter_one() {
        let cards = parse_cards("2s").unwrap();
        assert_eq!(1, CardIter::new(&cards, 1).count());
    }

    #[test]
    fn test_iter_two_of_three() {
        let cards = parse_cards("2s 3s 4s").unwrap();
        let groups: Vec<Vec<Card>> = CardIter::new(&cards, 2).collect();
        assert_eq!(3, groups.len());
        for g in &groups {
            assert_eq!(2, g.len());
            assert_ne!(g[0], g[1]);
        }
    }

    #[test]
    fn test_seven_choose_five() {
        let cards = parse_cards("2s 3s 4s 5s 6s 7s 8s").unwrap();
        assert_eq!(21, CardIter::new(&cards, 5).count());
    }

    #[test]
    fn test_more_than_available() {
        let cards = parse_cards("2s 3s").unwrap();
        assert_eq!(0, CardIter::new(&cards, 3).count());
    }

    #[test]
    fn test_zero_cards_yields_single_empty_group() {
        let cards = parse_cards("2s 3s").unwrap();
        let groups: Vec<Vec<Card>> = CardIter::new(&cards, 0).collect();
        assert_eq!(vec![Vec::<Card>::new()], groups);
    }
}
