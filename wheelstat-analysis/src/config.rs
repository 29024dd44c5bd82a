use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use wheelstat_db::models::Alphabet;

/// Tunables of the streak-break penalty applied by the scoring engine.
///
/// `fallback_scale` only matters when the current streak length has no
/// direct entry in the break distribution; it is a heuristic, not a law.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreakPenaltyConfig {
    pub cap: f64,
    pub scale: f64,
    pub fallback_scale: f64,
    pub floor: f64,
}

impl Default for StreakPenaltyConfig {
    fn default() -> Self {
        Self {
            cap: 35.0,
            scale: 0.8,
            fallback_scale: 0.5,
            floor: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub alphabet: Alphabet,
    /// Trailing window used for hot/cold classification.
    pub recent_spins_window: usize,
    pub hot_threshold: f64,
    /// Only applied once the trailing window is full.
    pub cold_threshold: f64,
    pub frequency_weight: f64,
    pub hot_cold_weight: f64,
    pub trend_weight: f64,
    pub streak_penalty: StreakPenaltyConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            alphabet: Alphabet::wheel(),
            recent_spins_window: 15,
            hot_threshold: 0.35,
            cold_threshold: 0.10,
            frequency_weight: 0.6,
            hot_cold_weight: 0.2,
            trend_weight: 0.2,
            streak_penalty: StreakPenaltyConfig::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read config {:?}", path))?;
        let config: AnalysisConfig = serde_json::from_str(&json)
            .with_context(|| format!("Invalid config {:?}", path))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.recent_spins_window == 0 {
            bail!("recent_spins_window must be at least 1");
        }
        for (name, value) in [
            ("hot_threshold", self.hot_threshold),
            ("cold_threshold", self.cold_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                bail!("{} must lie in [0, 1], got {}", name, value);
            }
        }
        for (name, value) in [
            ("frequency_weight", self.frequency_weight),
            ("hot_cold_weight", self.hot_cold_weight),
            ("trend_weight", self.trend_weight),
            ("streak_penalty.cap", self.streak_penalty.cap),
            ("streak_penalty.scale", self.streak_penalty.scale),
            ("streak_penalty.fallback_scale", self.streak_penalty.fallback_scale),
            ("streak_penalty.floor", self.streak_penalty.floor),
        ] {
            if !value.is_finite() || value < 0.0 {
                bail!("{} must be a non-negative number, got {}", name, value);
            }
        }
        Ok(())
    }
}
