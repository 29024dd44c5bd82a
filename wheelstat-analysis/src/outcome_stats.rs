use serde::Serialize;

use wheelstat_db::models::{Event, Outcome};

use crate::config::AnalysisConfig;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeStats {
    pub outcome: Outcome,
    pub count: u32,
    pub percentage: f64,
    /// Spins since the most recent occurrence (0 = the last spin).
    pub last_seen_index: Option<usize>,
    pub average_interval: f64,
    pub is_hot: bool,
    pub is_cold: bool,
}

/// The last `window` events, or the whole history when it is shorter.
pub fn trailing(history: &[Event], window: usize) -> &[Event] {
    &history[history.len().saturating_sub(window)..]
}

/// Share of `outcome` in the trailing window, in [0, 1].
pub fn recent_share(history: &[Event], outcome: Outcome, window: usize) -> f64 {
    let recent = trailing(history, window);
    if recent.is_empty() {
        return 0.0;
    }
    let hits = recent.iter().filter(|e| e.outcome == outcome).count();
    hits as f64 / recent.len() as f64
}

pub fn compute_outcome_stats(history: &[Event], config: &AnalysisConfig) -> Vec<OutcomeStats> {
    let total = history.len();
    let window_full = trailing(history, config.recent_spins_window).len() >= config.recent_spins_window;

    config
        .alphabet
        .outcomes()
        .iter()
        .map(|&outcome| {
            let positions: Vec<usize> = history
                .iter()
                .enumerate()
                .filter(|(_, e)| e.outcome == outcome)
                .map(|(i, _)| i)
                .collect();

            let count = positions.len() as u32;
            let percentage = if total > 0 {
                count as f64 / total as f64 * 100.0
            } else {
                0.0
            };

            let last_seen_index = positions.last().map(|&i| total - 1 - i);

            let average_interval = if positions.len() > 1 {
                let span: usize = positions.windows(2).map(|w| w[1] - w[0]).sum();
                span as f64 / (positions.len() - 1) as f64
            } else {
                0.0
            };

            let share = recent_share(history, outcome, config.recent_spins_window);
            let is_hot = share >= config.hot_threshold;
            let is_cold = share <= config.cold_threshold && window_full;

            OutcomeStats {
                outcome,
                count,
                percentage,
                last_seen_index,
                average_interval,
                is_hot,
                is_cold,
            }
        })
        .collect()
}
