pub mod config;
pub mod outcome_stats;
pub mod recommend;
pub mod scoring;
pub mod streaks;
pub mod transitions;

use serde::Serialize;
use tracing::debug;

use wheelstat_db::models::Event;

use crate::config::AnalysisConfig;
use crate::outcome_stats::{compute_outcome_stats, OutcomeStats};
use crate::recommend::{recommend, Recommendation};
use crate::scoring::{score_outcomes, ProbabilityScore};
use crate::streaks::{compute_streak_stats, StreakBreakStats};
use crate::transitions::{compute_transition_stats, TransitionStats};

/// Everything derived from one history snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub total_spins: usize,
    pub outcome_stats: Vec<OutcomeStats>,
    pub probability_scores: Vec<ProbabilityScore>,
    pub recommendations: Vec<Recommendation>,
    pub transition_stats: TransitionStats,
    pub streak_break_stats: Vec<StreakBreakStats>,
}

/// Runs the full pipeline over `history` (oldest first). Pure: the same
/// inputs always give the same report.
pub fn analyze(history: &[Event], config: &AnalysisConfig) -> AnalysisReport {
    let outcome_stats = compute_outcome_stats(history, config);
    let transition_stats = compute_transition_stats(history, &config.alphabet);
    let streak_break_stats = compute_streak_stats(history, &config.alphabet);

    let probability_scores = score_outcomes(&outcome_stats, history, config, &streak_break_stats);
    let recommendations = recommend(
        &probability_scores,
        &outcome_stats,
        history,
        &transition_stats,
        &streak_break_stats,
    );

    debug!(
        total_spins = history.len(),
        top = ?recommendations.iter().map(|r| r.outcome.value()).collect::<Vec<_>>(),
        "analysis complete"
    );

    AnalysisReport {
        total_spins: history.len(),
        outcome_stats,
        probability_scores,
        recommendations,
        transition_stats,
        streak_break_stats,
    }
}

pub fn analyze_default(history: &[Event]) -> AnalysisReport {
    analyze(history, &AnalysisConfig::default())
}
