use std::collections::HashMap;
use std::hash::Hash;

/// Score d'équité 0–100 : `100 - 100 * écart-type / moyenne`.
///
/// Les sommes sont entières, le résultat ne dépend donc pas de l'ordre
/// d'itération. Zéro ou une personne, ou uniquement des compteurs nuls : 100.
#[derive(Debug, Clone, Copy, Default)]
pub struct EquityScorer;

impl EquityScorer {
    pub fn score<K: Eq + Hash>(&self, counts: &HashMap<K, u32>) -> u8 {
        score_counts(counts.values().copied())
    }
}

pub fn score_counts<I: IntoIterator<Item = u32>>(counts: I) -> u8 {
    let mut n: u128 = 0;
    let mut sum: u128 = 0;
    let mut sum_sq: u128 = 0;
    for c in counts {
        let c = u128::from(c);
        n += 1;
        sum += c;
        sum_sq += c * c;
    }
    if n <= 1 || sum == 0 {
        return 100;
    }
    // écart-type / moyenne = sqrt(n * Σc² - (Σc)²) / Σc
    let spread = (n * sum_sq - sum * sum) as f64;
    let ratio = spread.sqrt() / sum as f64;
    let score = (100.0 - ratio * 100.0).round();
    score.clamp(0.0, 100.0) as u8
}
