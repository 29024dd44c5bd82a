use std::collections::HashMap;

use serde::Serialize;

use wheelstat_db::models::{Alphabet, Event, Outcome};

/// One `prev → next` pair observed on consecutive spins.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transition {
    pub prev: Outcome,
    pub next: Outcome,
    pub count: u32,
    /// Share of all spins following `prev`, in percent.
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionStats {
    /// Every pair of the alphabet, prev-major in alphabet order.
    pub pairs: Vec<Transition>,
    /// For each prev (alphabet order), its successors by descending percentage.
    pub by_prev: Vec<(Outcome, Vec<Transition>)>,
}

impl TransitionStats {
    pub fn successors(&self, prev: Outcome) -> &[Transition] {
        self.by_prev
            .iter()
            .find(|(p, _)| *p == prev)
            .map(|(_, group)| group.as_slice())
            .unwrap_or(&[])
    }

    pub fn most_likely_after(&self, prev: Outcome) -> Option<&Transition> {
        self.successors(prev).first()
    }
}

pub fn compute_transition_stats(history: &[Event], alphabet: &Alphabet) -> TransitionStats {
    let mut pair_counts: HashMap<(Outcome, Outcome), u32> = HashMap::new();
    let mut prev_totals: HashMap<Outcome, u32> = HashMap::new();

    for w in history.windows(2) {
        let (prev, next) = (w[0].outcome, w[1].outcome);
        *pair_counts.entry((prev, next)).or_insert(0) += 1;
        *prev_totals.entry(prev).or_insert(0) += 1;
    }

    let mut pairs = Vec::with_capacity(alphabet.len() * alphabet.len());
    let mut by_prev = Vec::with_capacity(alphabet.len());

    for &prev in alphabet.outcomes() {
        let total_prev = prev_totals.get(&prev).copied().unwrap_or(0);
        let mut group: Vec<Transition> = alphabet
            .outcomes()
            .iter()
            .map(|&next| {
                let count = pair_counts.get(&(prev, next)).copied().unwrap_or(0);
                let percentage = if total_prev > 0 {
                    count as f64 / total_prev as f64 * 100.0
                } else {
                    0.0
                };
                Transition { prev, next, count, percentage }
            })
            .collect();

        pairs.extend(group.iter().cloned());
        // Stable: ties keep alphabet order.
        group.sort_by(|a, b| b.percentage.partial_cmp(&a.percentage).unwrap_or(std::cmp::Ordering::Equal));
        by_prev.push((prev, group));
    }

    TransitionStats { pairs, by_prev }
}
