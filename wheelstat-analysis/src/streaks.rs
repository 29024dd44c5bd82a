use std::collections::BTreeMap;

use serde::Serialize;

use wheelstat_db::models::{Alphabet, Event, Outcome};

/// How often an outcome's runs stopped after exactly `streak_length` spins.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreakBreak {
    pub streak_length: usize,
    pub count: u32,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreakBreakStats {
    pub outcome: Outcome,
    /// Observed run lengths, by descending percentage then ascending length.
    pub break_distribution: Vec<StreakBreak>,
    pub total_streaks: u32,
    pub average_streak_length: f64,
    pub most_common_break_after: usize,
    pub max_observed_streak: usize,
}

impl StreakBreakStats {
    pub fn break_at(&self, streak_length: usize) -> Option<&StreakBreak> {
        self.break_distribution
            .iter()
            .find(|b| b.streak_length == streak_length)
    }

    /// Summed break percentage over all lengths up to `streak_length`.
    pub fn cumulative_break_percentage(&self, streak_length: usize) -> f64 {
        self.break_distribution
            .iter()
            .filter(|b| b.streak_length <= streak_length)
            .map(|b| b.percentage)
            .sum()
    }
}

/// Maximal run lengths per alphabet outcome, in alphabet order.
pub fn run_lengths(history: &[Event], alphabet: &Alphabet) -> Vec<Vec<usize>> {
    let mut lengths = vec![Vec::new(); alphabet.len()];

    let mut i = 0;
    while i < history.len() {
        let outcome = history[i].outcome;
        let start = i;
        while i < history.len() && history[i].outcome == outcome {
            i += 1;
        }
        if let Some(idx) = alphabet.index_of(outcome) {
            lengths[idx].push(i - start);
        }
    }

    lengths
}

/// Length of the run of `outcome` that ends on the most recent spin.
pub fn current_streak(history: &[Event], outcome: Outcome) -> usize {
    history
        .iter()
        .rev()
        .take_while(|e| e.outcome == outcome)
        .count()
}

pub fn compute_streak_stats(history: &[Event], alphabet: &Alphabet) -> Vec<StreakBreakStats> {
    alphabet
        .outcomes()
        .iter()
        .zip(run_lengths(history, alphabet))
        .map(|(&outcome, lengths)| summarize(outcome, &lengths))
        .collect()
}

fn summarize(outcome: Outcome, lengths: &[usize]) -> StreakBreakStats {
    let total_streaks = lengths.len() as u32;
    let max_observed_streak = lengths.iter().copied().max().unwrap_or(0);
    let average_streak_length = if lengths.is_empty() {
        0.0
    } else {
        lengths.iter().sum::<usize>() as f64 / lengths.len() as f64
    };

    let mut count_by_length: BTreeMap<usize, u32> = BTreeMap::new();
    for &len in lengths {
        *count_by_length.entry(len).or_insert(0) += 1;
    }

    // Ascending lengths: the first strict maximum keeps the shortest length on ties.
    let mut most_common_break_after = 1;
    let mut max_count = 0;
    let mut break_distribution = Vec::with_capacity(count_by_length.len());
    for (&streak_length, &count) in &count_by_length {
        if count > max_count {
            max_count = count;
            most_common_break_after = streak_length;
        }
        break_distribution.push(StreakBreak {
            streak_length,
            count,
            percentage: count as f64 / total_streaks as f64 * 100.0,
        });
    }
    break_distribution.sort_by(|a, b| b.percentage.partial_cmp(&a.percentage).unwrap_or(std::cmp::Ordering::Equal));

    StreakBreakStats {
        outcome,
        break_distribution,
        total_streaks,
        average_streak_length,
        most_common_break_after,
        max_observed_streak,
    }
}
