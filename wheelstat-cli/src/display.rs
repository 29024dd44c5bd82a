use comfy_table::{Table, ContentArrangement, presets::UTF8_FULL, Cell, Color};

use wheelstat_analysis::AnalysisReport;
use wheelstat_analysis::outcome_stats::OutcomeStats;
use wheelstat_analysis::recommend::Recommendation;
use wheelstat_analysis::scoring::ProbabilityScore;
use wheelstat_analysis::streaks::StreakBreakStats;
use wheelstat_analysis::transitions::TransitionStats;
use wheelstat_db::models::Event;
use wheelstat_db::storage::ImportResult;

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn format_timestamp(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "—".to_string())
}

fn tag_cell(stats: &OutcomeStats) -> Cell {
    if stats.is_hot {
        Cell::new("HOT").fg(Color::Green)
    } else if stats.is_cold {
        Cell::new("COLD").fg(Color::Red)
    } else {
        Cell::new("-")
    }
}

/// `first_index` is the 1-based position of `events[0]` in the full history.
pub fn display_events(events: &[Event], first_index: usize) {
    if events.is_empty() {
        println!("No spins recorded yet.");
        return;
    }

    let mut table = new_table(vec!["#", "Outcome", "Recorded at"]);
    for (i, event) in events.iter().enumerate() {
        table.add_row(vec![
            &(first_index + i).to_string(),
            &format!("{:>2}", event.outcome),
            &format_timestamp(event.timestamp),
        ]);
    }
    println!("{table}");
}

pub fn display_import_summary(result: &ImportResult, stored: usize) {
    println!("Import finished:");
    println!("  Records read   : {}", result.total_records);
    println!("  Stored         : {}", stored);
    if result.skipped > 0 {
        println!("  Skipped        : {}", result.skipped);
    }
}

pub fn display_outcome_stats(stats: &[OutcomeStats], total_spins: usize) {
    println!("\n📊 Statistics over {} spins\n", total_spins);

    let mut table = new_table(vec!["Outcome", "Count", "Share", "Last seen", "Avg interval", "Tag"]);
    for stat in stats {
        let last_seen = match stat.last_seen_index {
            Some(0) => "last spin".to_string(),
            Some(n) => format!("{} ago", n),
            None => "never".to_string(),
        };
        table.add_row(vec![
            Cell::new(format!("{:>2}", stat.outcome)),
            Cell::new(stat.count),
            Cell::new(format!("{:.1}%", stat.percentage)),
            Cell::new(last_seen),
            Cell::new(format!("{:.2}", stat.average_interval)),
            tag_cell(stat),
        ]);
    }
    println!("{table}");
}

pub fn display_transitions(transitions: &TransitionStats) {
    println!("\n── What follows what ──");

    let mut table = new_table(vec!["After", "Next (most likely first)"]);
    for (prev, group) in &transitions.by_prev {
        let successors = group
            .iter()
            .filter(|t| t.count > 0)
            .map(|t| format!("{} {:.0}% ({})", t.next, t.percentage, t.count))
            .collect::<Vec<_>>();
        let successors = if successors.is_empty() {
            "—".to_string()
        } else {
            successors.join("  ")
        };
        table.add_row(vec![format!("{:>2}", prev), successors]);
    }
    println!("{table}");
}

pub fn display_streaks(streaks: &[StreakBreakStats]) {
    println!("\n── Where runs break ──");

    let mut table = new_table(vec!["Outcome", "Runs", "Avg length", "Longest", "Usually breaks after", "Distribution"]);
    for streak in streaks {
        let distribution = streak
            .break_distribution
            .iter()
            .map(|b| format!("{}×: {:.0}%", b.streak_length, b.percentage))
            .collect::<Vec<_>>()
            .join("  ");
        let mode = if streak.total_streaks > 0 {
            streak.most_common_break_after.to_string()
        } else {
            "—".to_string()
        };
        table.add_row(vec![
            format!("{:>2}", streak.outcome),
            streak.total_streaks.to_string(),
            format!("{:.2}", streak.average_streak_length),
            streak.max_observed_streak.to_string(),
            mode,
            distribution,
        ]);
    }
    println!("{table}");
}

pub fn display_scores(scores: &[ProbabilityScore], stats: &[OutcomeStats]) {
    println!("\n🎯 Scores\n");

    let mut table = new_table(vec!["Outcome", "Score", "Frequency", "Hot/Cold", "Trend", "Tag"]);

    let mut rows: Vec<(&ProbabilityScore, &OutcomeStats)> = scores.iter().zip(stats).collect();
    rows.sort_by(|a, b| b.0.probability.partial_cmp(&a.0.probability).unwrap_or(std::cmp::Ordering::Equal));

    for (score, stat) in rows {
        table.add_row(vec![
            Cell::new(format!("{:>2}", score.outcome)),
            Cell::new(format!("{:.1}", score.probability)),
            Cell::new(format!("{:.1}", score.frequency_score)),
            Cell::new(format!("{:.1}", score.hot_cold_score)),
            Cell::new(format!("{:.1}", score.trend_score)),
            tag_cell(stat),
        ]);
    }
    println!("{table}");

    if let Some(first) = scores.first() {
        println!("Confidence: {:.0}%", first.confidence * 100.0);
    }
}

pub fn display_recommendations(recommendations: &[Recommendation]) {
    println!("\n🎲 Recommendations\n");

    let mut table = new_table(vec!["#", "Outcome", "Score", "Confidence", "Why"]);
    for (i, rec) in recommendations.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(format!("{:>2}", rec.outcome)).fg(Color::Green),
            Cell::new(format!("{:.1}", rec.probability)),
            Cell::new(format!("{:.0}%", rec.confidence * 100.0)),
            Cell::new(&rec.reason),
        ]);
    }
    println!("{table}");
}

pub fn display_statistics(report: &AnalysisReport) {
    display_outcome_stats(&report.outcome_stats, report.total_spins);
    display_transitions(&report.transition_stats);
    display_streaks(&report.streak_break_stats);
}

pub fn display_report(report: &AnalysisReport) {
    display_scores(&report.probability_scores, &report.outcome_stats);
    display_recommendations(&report.recommendations);
}
