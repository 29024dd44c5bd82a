use serde::Serialize;
use tracing::trace;

use wheelstat_db::models::{Event, Outcome};

use crate::config::{AnalysisConfig, StreakPenaltyConfig};
use crate::outcome_stats::{recent_share, trailing, OutcomeStats};
use crate::streaks::{current_streak, StreakBreakStats};

/// Score given to every signal when there is no data to judge by.
pub const NEUTRAL_SCORE: f64 = 25.0;

/// Number of trailing spins the trend score looks at.
pub const TREND_WINDOW: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbabilityScore {
    pub outcome: Outcome,
    /// Composite score in [0, 100].
    pub probability: f64,
    pub frequency_score: f64,
    pub hot_cold_score: f64,
    pub trend_score: f64,
    pub confidence: f64,
}

pub fn frequency_score(stats: &OutcomeStats, total_spins: usize) -> f64 {
    if total_spins == 0 {
        return NEUTRAL_SCORE;
    }
    stats.percentage
}

pub fn hot_cold_score(stats: &OutcomeStats, history: &[Event], window: usize) -> f64 {
    if trailing(history, window).is_empty() {
        return NEUTRAL_SCORE;
    }
    let recent_pct = recent_share(history, stats.outcome, window) * 100.0;

    if stats.is_hot {
        return (recent_pct * 1.5).min(100.0);
    }
    if stats.is_cold {
        return (recent_pct * 0.5 + 15.0).max(10.0);
    }
    recent_pct
}

/// Linearly weighted share over the last [`TREND_WINDOW`] spins (newest
/// weighs most), plus a bonus for having been seen very recently.
pub fn trend_score(stats: &OutcomeStats, history: &[Event]) -> f64 {
    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;
    for (i, event) in trailing(history, TREND_WINDOW).iter().enumerate() {
        let weight = (i + 1) as f64;
        total_weight += weight;
        if event.outcome == stats.outcome {
            weighted_sum += weight;
        }
    }

    if total_weight == 0.0 {
        return NEUTRAL_SCORE;
    }

    let weighted_pct = weighted_sum / total_weight * 100.0;
    match stats.last_seen_index {
        Some(last_seen) => {
            let recency_bonus = (20.0 - last_seen as f64 * 2.0).max(0.0);
            (weighted_pct + recency_bonus).min(100.0)
        }
        None => weighted_pct,
    }
}

/// Penalty for an outcome already on a run, drawn from how often its runs
/// historically broke at the current length.
pub fn streak_penalty(current_streak: usize, streak: &StreakBreakStats, tunables: &StreakPenaltyConfig) -> f64 {
    if current_streak == 0 || streak.break_distribution.is_empty() {
        return 0.0;
    }
    let break_pct = match streak.break_at(current_streak) {
        Some(b) => b.percentage,
        None => streak.cumulative_break_percentage(current_streak) * tunables.fallback_scale,
    };
    (break_pct * tunables.scale).min(tunables.cap)
}

pub fn confidence_for(total_spins: usize) -> f64 {
    match total_spins {
        n if n >= 50 => 0.9,
        n if n >= 30 => 0.75,
        n if n >= 15 => 0.6,
        n if n >= 5 => 0.4,
        _ => 0.2,
    }
}

/// `stats` and `streaks` must both follow the alphabet order of `config`.
pub fn score_outcomes(
    stats: &[OutcomeStats],
    history: &[Event],
    config: &AnalysisConfig,
    streaks: &[StreakBreakStats],
) -> Vec<ProbabilityScore> {
    let total_spins = history.len();
    let confidence = confidence_for(total_spins);

    stats
        .iter()
        .zip(streaks)
        .map(|(stat, streak)| {
            let frequency_score = frequency_score(stat, total_spins);
            let hot_cold_score = hot_cold_score(stat, history, config.recent_spins_window);
            let trend_score = trend_score(stat, history);

            let mut probability = frequency_score * config.frequency_weight
                + hot_cold_score * config.hot_cold_weight
                + trend_score * config.trend_weight;

            let run = current_streak(history, stat.outcome);
            if run >= 1 && !streak.break_distribution.is_empty() {
                let penalty = streak_penalty(run, streak, &config.streak_penalty);
                probability = (probability - penalty).max(config.streak_penalty.floor);
                trace!(outcome = %stat.outcome, run, penalty, "streak penalty applied");
            }

            ProbabilityScore {
                outcome: stat.outcome,
                probability,
                frequency_score,
                hot_cold_score,
                trend_score,
                confidence,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome_stats::compute_outcome_stats;
    use crate::streaks::compute_streak_stats;
    use wheelstat_db::models::make_history;

    fn score_history(values: &[u8]) -> Vec<ProbabilityScore> {
        let config = AnalysisConfig::default();
        let history = make_history(values);
        let stats = compute_outcome_stats(&history, &config);
        let streaks = compute_streak_stats(&history, &config.alphabet);
        score_outcomes(&stats, &history, &config, &streaks)
    }

    fn score(scores: &[ProbabilityScore], value: u8) -> &ProbabilityScore {
        scores.iter().find(|s| s.outcome == Outcome(value)).unwrap()
    }

    #[test]
    fn test_empty_history_is_neutral() {
        let scores = score_history(&[]);
        assert_eq!(scores.len(), 4);
        for s in &scores {
            assert_eq!(s.frequency_score, NEUTRAL_SCORE);
            assert_eq!(s.hot_cold_score, NEUTRAL_SCORE);
            assert_eq!(s.trend_score, NEUTRAL_SCORE);
            assert!((s.probability - 25.0).abs() < 1e-9);
            assert_eq!(s.confidence, 0.2);
        }
    }

    #[test]
    fn test_confidence_steps() {
        assert_eq!(confidence_for(0), 0.2);
        assert_eq!(confidence_for(4), 0.2);
        assert_eq!(confidence_for(5), 0.4);
        assert_eq!(confidence_for(15), 0.6);
        assert_eq!(confidence_for(29), 0.6);
        assert_eq!(confidence_for(30), 0.75);
        assert_eq!(confidence_for(50), 0.9);
        assert_eq!(confidence_for(500), 0.9);
    }

    #[test]
    fn test_hot_outcome_gets_boost() {
        // 45 spins cycling through 3, 5, 10, then 15 spins dominated by 5.
        let mut values: Vec<u8> = std::iter::repeat([3, 5, 10]).take(15).flatten().collect();
        values.extend([5, 5, 2, 5, 5, 3, 5, 5, 10, 5, 5, 2, 5, 5, 3]);
        assert_eq!(values.len(), 60);

        let config = AnalysisConfig::default();
        let history = make_history(&values);
        let stats = compute_outcome_stats(&history, &config);
        let five = stats.iter().find(|s| s.outcome == Outcome(5)).unwrap();
        assert!(five.is_hot);

        let scores = score_history(&values);
        let recent_pct: f64 = 10.0 / 15.0 * 100.0;
        assert!((score(&scores, 5).hot_cold_score - (recent_pct * 1.5).min(100.0)).abs() < 1e-9);
        assert_eq!(score(&scores, 5).confidence, 0.9);
    }

    #[test]
    fn test_cold_outcome_score() {
        let values: Vec<u8> = std::iter::repeat([2, 3]).take(10).flatten().collect();
        let scores = score_history(&values);
        // 10 never appears in the full window: 0 * 0.5 + 15.
        assert!((score(&scores, 10).hot_cold_score - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_trend_score_weights_recent() {
        let config = AnalysisConfig::default();
        let history = make_history(&[2, 2, 3]);
        let stats = compute_outcome_stats(&history, &config);
        // Weights 1, 2, 3: 3 holds 3/6, plus recency bonus 20.
        assert!((trend_score(&stats[1], &history) - 70.0).abs() < 1e-9);
        // 2 holds 3/6, seen one spin ago: bonus 18.
        assert!((trend_score(&stats[0], &history) - 68.0).abs() < 1e-9);
        // 5 never seen: no bonus.
        assert_eq!(trend_score(&stats[2], &history), 0.0);
    }

    #[test]
    fn test_streak_penalty_exact_length() {
        // 5 runs: 1, 1, 2 (current) -> break at 2 is 33.3%, penalty 26.7.
        let history = make_history(&[5, 2, 5, 3, 5, 5]);
        let config = AnalysisConfig::default();
        let streaks = compute_streak_stats(&history, &config.alphabet);
        let penalty = streak_penalty(2, &streaks[2], &config.streak_penalty);
        assert!((penalty - 100.0 / 3.0 * 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_streak_penalty_fallback_and_cap() {
        let config = AnalysisConfig::default();
        let history = make_history(&[5, 2, 5, 5, 3]);
        let streaks = compute_streak_stats(&history, &config.alphabet);
        // No run of length 3 for 5: cumulative (50 + 50) * 0.5 * 0.8 = 40, capped at 35.
        assert!((streak_penalty(3, &streaks[2], &config.streak_penalty) - 35.0).abs() < 1e-9);
        assert_eq!(streak_penalty(0, &streaks[2], &config.streak_penalty), 0.0);
    }

    #[test]
    fn test_probability_respects_floor() {
        let scores = score_history(&[5; 12]);
        // 12 in a row: break at 12 is 100%, penalty capped at 35.
        let five = score(&scores, 5);
        let raw = five.frequency_score * 0.6 + five.hot_cold_score * 0.2 + five.trend_score * 0.2;
        assert!((five.probability - (raw - 35.0)).abs() < 1e-9);
        assert!(five.probability >= 5.0);

        // A raw score below the floor is lifted to it.
        let config = AnalysisConfig {
            frequency_weight: 0.01,
            hot_cold_weight: 0.01,
            trend_weight: 0.01,
            ..AnalysisConfig::default()
        };
        let history = make_history(&[5; 12]);
        let stats = compute_outcome_stats(&history, &config);
        let streaks = compute_streak_stats(&history, &config.alphabet);
        let scores = score_outcomes(&stats, &history, &config, &streaks);
        assert_eq!(score(&scores, 5).probability, 5.0);
        // Outcomes not on a run are never floored.
        assert_eq!(score(&scores, 2).probability, 0.0);
    }
}
