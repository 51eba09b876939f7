#![forbid(unsafe_code)]
use gardes::scheduler::score_counts;
use gardes::EquityScorer;
use std::collections::HashMap;

fn counts(pairs: &[(&str, u32)]) -> HashMap<String, u32> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

#[test]
fn equal_counts_score_100() {
    let scorer = EquityScorer;
    let c = counts(&[("A", 5), ("B", 5), ("C", 5), ("D", 5)]);
    assert_eq!(scorer.score(&c), 100);
}

#[test]
fn skewed_counts_score_below_80() {
    let scorer = EquityScorer;
    let c = counts(&[("A", 10), ("B", 2), ("C", 8), ("D", 4)]);
    let score = scorer.score(&c);
    assert!(score < 80, "score = {score}");
    // écart-type sqrt(10) sur une moyenne de 6
    assert_eq!(score, 47);
}

#[test]
fn single_person_or_nobody_scores_100() {
    let scorer = EquityScorer;
    assert_eq!(scorer.score(&counts(&[("A", 5)])), 100);
    assert_eq!(scorer.score(&counts(&[])), 100);
}

#[test]
fn all_zero_counts_score_100() {
    assert_eq!(score_counts([0, 0, 0]), 100);
}

#[test]
fn score_ignores_person_ids() {
    let scorer = EquityScorer;
    let a = counts(&[("A", 10), ("B", 2), ("C", 8), ("D", 4)]);
    let b = counts(&[("Z", 2), ("Y", 4), ("X", 10), ("W", 8)]);
    assert_eq!(scorer.score(&a), scorer.score(&b));
    assert_eq!(score_counts([10, 2, 8, 4]), score_counts([4, 8, 2, 10]));
}

#[test]
fn score_decreases_with_dispersion_and_floors_at_zero() {
    let mild = score_counts([5, 6, 5, 6]);
    let strong = score_counts([1, 10, 1, 10]);
    assert!(mild > strong);
    assert_eq!(score_counts([0, 0, 0, 30]), 0);
}
