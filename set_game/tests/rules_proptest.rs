/// Property-based tests for set validity using proptest
///
/// These tests check the feature rules against a direct per-feature check
/// over randomly drawn cards and boards.
use proptest::prelude::*;
use set_game::{Card, FeatureRules, SetRules};
use std::collections::BTreeSet;

fn classic() -> FeatureRules {
    FeatureRules::new(3, 4)
}

// Strategy to generate a card of the classic 81-card deck
fn card_strategy() -> impl Strategy<Value = Card> {
    0usize..81
}

// Strategy to generate distinct cards, like a dealt board
fn board_strategy(min: usize, max: usize) -> impl Strategy<Value = Vec<Card>> {
    prop::collection::btree_set(card_strategy(), min..=max)
        .prop_map(|cards| cards.into_iter().collect())
}

// Straightforward reference: every feature all-equal or all-distinct
fn reference_is_set(rules: &FeatureRules, cards: &[Card]) -> bool {
    let distinct: BTreeSet<_> = cards.iter().collect();
    if cards.len() != 3 || distinct.len() != 3 {
        return false;
    }
    let features: Vec<Vec<usize>> = cards.iter().map(|&c| rules.features(c)).collect();
    (0..4).all(|f| {
        let values: BTreeSet<usize> = features.iter().map(|v| v[f]).collect();
        values.len() == 1 || values.len() == 3
    })
}

proptest! {
    #[test]
    fn test_is_set_matches_reference(a in card_strategy(), b in card_strategy(), c in card_strategy()) {
        let rules = classic();
        prop_assert_eq!(rules.is_set(&[a, b, c]), reference_is_set(&rules, &[a, b, c]));
    }

    #[test]
    fn test_is_set_ignores_order(cards in board_strategy(3, 3)) {
        let rules = classic();
        let expected = rules.is_set(&cards);
        let reversed: Vec<Card> = cards.iter().rev().copied().collect();
        let rotated = vec![cards[1], cards[2], cards[0]];
        prop_assert_eq!(rules.is_set(&reversed), expected);
        prop_assert_eq!(rules.is_set(&rotated), expected);
    }

    #[test]
    fn test_any_two_cards_complete_to_a_set(pair in board_strategy(2, 2)) {
        let rules = classic();
        let third = rules.complete(&pair);
        prop_assert!(third.is_some(), "every pair has exactly one completing card");
        let third = third.unwrap();
        prop_assert!(third < 81);
        prop_assert!(!pair.contains(&third));
        prop_assert!(rules.is_set(&[pair[0], pair[1], third]));
    }

    #[test]
    fn test_find_sets_is_exhaustive(board in board_strategy(3, 15)) {
        let rules = classic();
        let found = rules.find_sets(&board, usize::MAX);

        let mut expected = Vec::new();
        for i in 0..board.len() {
            for j in i + 1..board.len() {
                for k in j + 1..board.len() {
                    let triple = [board[i], board[j], board[k]];
                    if reference_is_set(&rules, &triple) {
                        expected.push(triple.to_vec());
                    }
                }
            }
        }

        let found: BTreeSet<Vec<Card>> = found.into_iter().collect();
        let expected: BTreeSet<Vec<Card>> = expected.into_iter().collect();
        prop_assert_eq!(found, expected);
    }

    #[test]
    fn test_find_sets_respects_limit(board in board_strategy(3, 20), limit in 0usize..4) {
        let rules = classic();
        let all = rules.find_sets(&board, usize::MAX);
        let limited = rules.find_sets(&board, limit);
        prop_assert_eq!(limited.len(), all.len().min(limit));
        for set in &limited {
            prop_assert!(rules.is_set(set));
            prop_assert!(set.windows(2).all(|w| w[0] < w[1]), "sets come out sorted");
        }
    }

    #[test]
    fn test_features_are_in_range(card in card_strategy()) {
        let features = classic().features(card);
        prop_assert_eq!(features.len(), 4);
        prop_assert!(features.iter().all(|&v| v < 3));
    }
}

#[test]
fn test_larger_sets() {
    // four cards, four values per feature
    let rules = FeatureRules::new(4, 2);
    assert_eq!(rules.deck_size(), 16);
    // (0,0) (1,0) (2,0) (3,0)
    assert!(rules.is_set(&[0, 1, 2, 3]));
    // (0,0) (1,1) (2,2) (3,3)
    assert!(rules.is_set(&[0, 5, 10, 15]));
    // (0,0) (1,0) (2,0) (0,1)
    assert!(!rules.is_set(&[0, 1, 2, 4]));
}
