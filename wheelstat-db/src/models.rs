use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Segment values of the money wheel tracked by default.
pub const WHEEL_OUTCOMES: [u8; 4] = [2, 3, 5, 10];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Outcome(pub u8);

impl Outcome {
    pub fn value(self) -> u8 {
        self.0
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered, non-empty set of distinct outcomes. Every per-outcome table
/// produced by the analysis follows this order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct Alphabet(Vec<Outcome>);

impl Alphabet {
    pub fn new(values: &[u8]) -> Result<Self> {
        if values.is_empty() {
            bail!("Alphabet must contain at least one outcome");
        }
        let mut seen = HashSet::with_capacity(values.len());
        for &v in values {
            if !seen.insert(v) {
                bail!("Duplicate outcome in alphabet: {}", v);
            }
        }
        Ok(Self(values.iter().map(|&v| Outcome(v)).collect()))
    }

    pub fn wheel() -> Self {
        Self(WHEEL_OUTCOMES.iter().map(|&v| Outcome(v)).collect())
    }

    pub fn outcomes(&self) -> &[Outcome] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn index_of(&self, outcome: Outcome) -> Option<usize> {
        self.0.iter().position(|&o| o == outcome)
    }

    pub fn contains(&self, outcome: Outcome) -> bool {
        self.index_of(outcome).is_some()
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Self::wheel()
    }
}

impl TryFrom<Vec<u8>> for Alphabet {
    type Error = anyhow::Error;

    fn try_from(values: Vec<u8>) -> Result<Self> {
        Self::new(&values)
    }
}

impl From<Alphabet> for Vec<u8> {
    fn from(alphabet: Alphabet) -> Self {
        alphabet.0.into_iter().map(Outcome::value).collect()
    }
}

impl std::fmt::Display for Alphabet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let values = self
            .0
            .iter()
            .map(|o| o.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{}", values)
    }
}

/// One observed spin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub outcome: Outcome,
    /// Unix milliseconds.
    pub timestamp: i64,
}

impl Event {
    pub fn new(outcome: Outcome) -> Self {
        Self::at(outcome, chrono::Utc::now().timestamp_millis())
    }

    pub fn at(outcome: Outcome, timestamp: i64) -> Self {
        Self {
            id: event_id(timestamp),
            outcome,
            timestamp,
        }
    }
}

pub fn event_id(timestamp: i64) -> String {
    format!("{}-{:08x}", timestamp, rand::random::<u32>())
}

pub fn validate_outcome(value: u8, alphabet: &Alphabet) -> Result<Outcome> {
    let outcome = Outcome(value);
    if !alphabet.contains(outcome) {
        bail!("Outcome {} is not on the wheel ({})", value, alphabet);
    }
    Ok(outcome)
}

/// Builds a chronological history (oldest first) from raw outcome values,
/// one second apart.
pub fn make_history(values: &[u8]) -> Vec<Event> {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| Event {
            id: format!("evt-{:04}", i),
            outcome: Outcome(v),
            timestamp: 1_700_000_000_000 + i as i64 * 1_000,
        })
        .collect()
}
