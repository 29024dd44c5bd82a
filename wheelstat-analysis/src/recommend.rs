use serde::Serialize;

use wheelstat_db::models::{Event, Outcome};

use crate::outcome_stats::OutcomeStats;
use crate::scoring::{ProbabilityScore, NEUTRAL_SCORE};
use crate::streaks::{current_streak, StreakBreak, StreakBreakStats};
use crate::transitions::{Transition, TransitionStats};

pub const RECOMMENDATION_COUNT: usize = 2;

/// Break share (percent) from which a candidate's own run is called out.
pub const OWN_STREAK_BREAK_PCT: f64 = 25.0;
/// Break share (percent) from which the last outcome's run is noted on other candidates.
pub const CONTEXT_STREAK_BREAK_PCT: f64 = 20.0;
/// Minimum run of the last outcome before it is worth a note.
pub const CONTEXT_STREAK_MIN: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReasonKind {
    StreakBreak,
    Transition,
    Frequency,
    Hot,
    Cold,
    Balanced,
}

impl std::fmt::Display for ReasonKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReasonKind::StreakBreak => write!(f, "STREAK"),
            ReasonKind::Transition => write!(f, "TRANSITION"),
            ReasonKind::Frequency => write!(f, "FREQUENCY"),
            ReasonKind::Hot => write!(f, "HOT"),
            ReasonKind::Cold => write!(f, "COLD"),
            ReasonKind::Balanced => write!(f, "BALANCED"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub outcome: Outcome,
    pub probability: f64,
    pub confidence: f64,
    pub reason: String,
    pub rule: ReasonKind,
}

/// What the reason rules may look at for one candidate.
pub struct RuleContext<'a> {
    pub score: &'a ProbabilityScore,
    pub stats: &'a OutcomeStats,
    pub current_streak: usize,
    pub break_at_streak: Option<&'a StreakBreak>,
    pub best_after_last: Option<&'a Transition>,
}

pub struct ReasonRule {
    pub kind: ReasonKind,
    pub applies: fn(&RuleContext<'_>) -> bool,
    pub describe: fn(&RuleContext<'_>) -> String,
    /// Whether the note about the last outcome's run may precede the text.
    pub takes_streak_note: bool,
}

/// Evaluated top to bottom; the first rule that applies explains the pick.
/// The last rule always applies.
pub static REASON_RULES: [ReasonRule; 6] = [
    ReasonRule {
        kind: ReasonKind::StreakBreak,
        applies: |ctx| {
            ctx.current_streak >= 1
                && ctx.break_at_streak.is_some_and(|b| b.percentage >= OWN_STREAK_BREAK_PCT)
        },
        describe: |ctx| {
            format!(
                "{} has come up {} times in a row; {:.0}% of its runs break at this length",
                ctx.stats.outcome,
                ctx.current_streak,
                ctx.break_at_streak.map_or(0.0, |b| b.percentage),
            )
        },
        takes_streak_note: false,
    },
    ReasonRule {
        kind: ReasonKind::Transition,
        applies: |ctx| {
            ctx.best_after_last
                .is_some_and(|t| t.next == ctx.stats.outcome && t.count > 0)
        },
        describe: |ctx| match ctx.best_after_last {
            Some(t) => format!(
                "After {} usually comes {} ({:.0}%, {} times)",
                t.prev, t.next, t.percentage, t.count
            ),
            None => String::new(),
        },
        takes_streak_note: true,
    },
    ReasonRule {
        kind: ReasonKind::Frequency,
        // An empty history scores every outcome neutrally; that is no frequency evidence.
        applies: |ctx| ctx.score.frequency_score >= NEUTRAL_SCORE && ctx.stats.count > 0,
        describe: |ctx| {
            format!(
                "Across the whole history: {:.0}% of spins ({} times)",
                ctx.stats.percentage, ctx.stats.count
            )
        },
        takes_streak_note: true,
    },
    ReasonRule {
        kind: ReasonKind::Hot,
        applies: |ctx| ctx.stats.is_hot,
        describe: |ctx| format!("Hot: frequent in recent spins ({:.0}%)", ctx.score.hot_cold_score),
        takes_streak_note: true,
    },
    ReasonRule {
        kind: ReasonKind::Cold,
        applies: |ctx| ctx.stats.is_cold,
        describe: |_| "Cold: not seen for a while, due for a return".to_string(),
        takes_streak_note: true,
    },
    ReasonRule {
        kind: ReasonKind::Balanced,
        applies: |_| true,
        describe: |ctx| format!("Balanced choice (frequency {:.0}%)", ctx.score.frequency_score),
        takes_streak_note: true,
    },
];

/// Sentence about the most recent outcome's run, when that run has reached a
/// length at which its series often broke before.
pub fn streak_note(history: &[Event], streaks: &[StreakBreakStats]) -> Option<(Outcome, String)> {
    let last = history.last()?.outcome;
    let run = current_streak(history, last);
    if run < CONTEXT_STREAK_MIN {
        return None;
    }
    let pct = streaks
        .iter()
        .find(|s| s.outcome == last)?
        .break_at(run)?
        .percentage;
    if pct < CONTEXT_STREAK_BREAK_PCT {
        return None;
    }
    Some((last, format!("{} has come up {} times in a row; this series often breaks here. ", last, run)))
}

pub fn explain(ctx: &RuleContext<'_>, note: Option<&str>) -> (ReasonKind, String) {
    let rule = REASON_RULES
        .iter()
        .find(|rule| (rule.applies)(ctx))
        .unwrap_or(&REASON_RULES[REASON_RULES.len() - 1]);

    let text = (rule.describe)(ctx);
    let reason = match note {
        Some(note) if rule.takes_streak_note => format!("{}{}", note, text),
        _ => text,
    };
    (rule.kind, reason.trim().to_string())
}

/// `scores`, `stats` and `streaks` must share the alphabet order.
pub fn recommend(
    scores: &[ProbabilityScore],
    stats: &[OutcomeStats],
    history: &[Event],
    transitions: &TransitionStats,
    streaks: &[StreakBreakStats],
) -> Vec<Recommendation> {
    let mut candidates: Vec<(&ProbabilityScore, &OutcomeStats, &StreakBreakStats)> = scores
        .iter()
        .zip(stats)
        .zip(streaks)
        .map(|((score, stat), streak)| (score, stat, streak))
        .collect();
    // Stable: equal probabilities keep alphabet order.
    candidates.sort_by(|a, b| b.0.probability.partial_cmp(&a.0.probability).unwrap_or(std::cmp::Ordering::Equal));

    let last_outcome = history.last().map(|e| e.outcome);
    let best_after_last = last_outcome.and_then(|last| transitions.most_likely_after(last));
    let note = streak_note(history, streaks);

    candidates
        .into_iter()
        .take(RECOMMENDATION_COUNT)
        .map(|(score, stat, streak)| {
            let run = current_streak(history, stat.outcome);
            let ctx = RuleContext {
                score,
                stats: stat,
                current_streak: run,
                break_at_streak: streak.break_at(run),
                best_after_last,
            };
            let candidate_note = note
                .as_ref()
                .filter(|(streaking, _)| *streaking != stat.outcome)
                .map(|(_, text)| text.as_str());
            let (rule, reason) = explain(&ctx, candidate_note);

            Recommendation {
                outcome: stat.outcome,
                probability: score.probability,
                confidence: score.confidence,
                reason,
                rule,
            }
        })
        .collect()
}
