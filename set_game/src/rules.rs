//! Card encoding and set validity.
//!
//! The dealer only talks to [`SetRules`]; [`FeatureRules`] is the classic
//! encoding where a card id is a base-`set_size` number whose digits are the
//! card's features.

use std::collections::HashSet;

/// Card identifier, `0..deck_size`
pub type Card = usize;

/// Set validity rules consumed by the dealer
pub trait SetRules: Send + Sync {
    /// True iff `cards` form a legal set
    fn is_set(&self, cards: &[Card]) -> bool;

    /// Up to `limit` legal sets among `cards`, each sorted ascending
    fn find_sets(&self, cards: &[Card], limit: usize) -> Vec<Vec<Card>>;

    /// Feature values of a card, for hints and logs
    fn features(&self, card: Card) -> Vec<usize>;
}

/// Every feature must be all-equal or all-distinct across the set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureRules {
    set_size: usize,
    feature_count: usize,
}

impl FeatureRules {
    pub fn new(set_size: usize, feature_count: usize) -> Self {
        Self {
            set_size,
            feature_count,
        }
    }

    /// Number of distinct cards this encoding can express
    pub fn deck_size(&self) -> usize {
        (0..self.feature_count).fold(1, |acc, _| acc * self.set_size)
    }

    fn encode(&self, features: &[usize]) -> Card {
        features
            .iter()
            .rev()
            .fold(0, |acc, value| acc * self.set_size + value)
    }

    /// The single card that turns `cards` (one short of a set) into a set
    ///
    /// Returns `None` when some feature is neither all-equal nor
    /// all-distinct, or when the cards repeat.
    pub fn complete(&self, cards: &[Card]) -> Option<Card> {
        if cards.len() + 1 != self.set_size {
            return None;
        }
        let decoded: Vec<Vec<usize>> = cards.iter().map(|&card| self.features(card)).collect();
        let mut missing = Vec::with_capacity(self.feature_count);

        for feature in 0..self.feature_count {
            let values: HashSet<usize> = decoded.iter().map(|f| f[feature]).collect();
            let value = if values.len() == 1 {
                decoded[0][feature]
            } else if values.len() == cards.len() {
                (0..self.set_size).find(|v| !values.contains(v))?
            } else {
                return None;
            };
            missing.push(value);
        }

        let card = self.encode(&missing);
        (!cards.contains(&card)).then_some(card)
    }

    /// Walks every `set_size - 1` combination of `sorted` in lexicographic
    /// order and asks for its completion
    fn search(
        &self,
        sorted: &[Card],
        present: &HashSet<Card>,
        start: usize,
        chosen: &mut Vec<Card>,
        limit: usize,
        found: &mut Vec<Vec<Card>>,
    ) {
        if found.len() >= limit {
            return;
        }
        if chosen.len() + 1 == self.set_size {
            let last = chosen.last().copied();
            if let Some(card) = self.complete(chosen)
                && present.contains(&card)
                && last.is_none_or(|last| card > last)
            {
                let mut set = chosen.clone();
                set.push(card);
                found.push(set);
            }
            return;
        }
        for idx in start..sorted.len() {
            chosen.push(sorted[idx]);
            self.search(sorted, present, idx + 1, chosen, limit, found);
            chosen.pop();
            if found.len() >= limit {
                return;
            }
        }
    }
}

impl SetRules for FeatureRules {
    fn is_set(&self, cards: &[Card]) -> bool {
        if cards.len() != self.set_size {
            return false;
        }
        let (last, rest) = match cards.split_last() {
            Some(split) => split,
            None => return false,
        };
        self.complete(rest) == Some(*last)
    }

    fn find_sets(&self, cards: &[Card], limit: usize) -> Vec<Vec<Card>> {
        let mut sorted = cards.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        let present: HashSet<Card> = sorted.iter().copied().collect();

        let mut found = Vec::new();
        if limit > 0 {
            self.search(&sorted, &present, 0, &mut Vec::new(), limit, &mut found);
        }
        found
    }

    fn features(&self, card: Card) -> Vec<usize> {
        let mut rest = card;
        (0..self.feature_count)
            .map(|_| {
                let value = rest % self.set_size;
                rest /= self.set_size;
                value
            })
            .collect()
    }
}
