use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::warn;

use crate::models::{event_id, Alphabet, Event, Outcome};

/// Export document: the full history plus the moment it was written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageData {
    pub history: Vec<Event>,
    pub timestamp: i64,
}

/// Imported entries are trusted only loosely: any field may be missing or
/// carry the wrong JSON type, and a bad entry must not sink the document.
/// Older exports name the outcome `number`.
#[derive(Debug, Deserialize)]
struct RawEvent {
    id: Option<Value>,
    #[serde(alias = "number")]
    outcome: Option<Value>,
    timestamp: Option<Value>,
}

impl RawEvent {
    fn outcome(&self) -> Option<Outcome> {
        self.outcome
            .as_ref()
            .and_then(Value::as_u64)
            .and_then(|v| u8::try_from(v).ok())
            .map(Outcome)
    }

    fn timestamp(&self) -> Option<i64> {
        self.timestamp.as_ref().and_then(Value::as_i64)
    }

    fn id(&self) -> Option<String> {
        match &self.id {
            Some(Value::String(id)) if !id.is_empty() => Some(id.clone()),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawStorageData {
    history: Option<Vec<Value>>,
}

pub struct ImportResult {
    pub events: Vec<Event>,
    pub total_records: u32,
    pub skipped: u32,
}

pub fn export_json(history: &[Event]) -> Result<String> {
    let data = StorageData {
        history: history.to_vec(),
        timestamp: chrono::Utc::now().timestamp_millis(),
    };
    let json = serde_json::to_string_pretty(&data)?;
    Ok(json)
}

pub fn parse_import(json: &str, alphabet: &Alphabet) -> Result<ImportResult> {
    let data: RawStorageData = serde_json::from_str(json)
        .context("Import file is not a valid history document")?;
    let Some(raw) = data.history else {
        bail!("Import file has no \"history\" array");
    };

    let now = chrono::Utc::now().timestamp_millis();
    let mut result = ImportResult {
        events: Vec::with_capacity(raw.len()),
        total_records: 0,
        skipped: 0,
    };

    for value in raw {
        result.total_records += 1;
        let entry = match serde_json::from_value::<RawEvent>(value) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(record = result.total_records, error = %e, "skipping malformed entry");
                result.skipped += 1;
                continue;
            }
        };
        let outcome = match entry.outcome() {
            Some(o) if alphabet.contains(o) => o,
            _ => {
                warn!(record = result.total_records, outcome = ?entry.outcome, "skipping entry outside the alphabet");
                result.skipped += 1;
                continue;
            }
        };
        let timestamp = entry.timestamp().unwrap_or(now);
        let id = entry.id().unwrap_or_else(|| event_id(timestamp));
        result.events.push(Event { id, outcome, timestamp });
    }

    Ok(result)
}

pub fn save_json(path: &Path, history: &[Event]) -> Result<()> {
    let json = export_json(history)?;
    std::fs::write(path, json)
        .with_context(|| format!("Cannot write {:?}", path))?;
    Ok(())
}

pub fn load_json(path: &Path, alphabet: &Alphabet) -> Result<ImportResult> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read {:?}", path))?;
    parse_import(&json, alphabet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::make_history;

    #[test]
    fn test_export_then_import_keeps_history() {
        let history = make_history(&[2, 10, 5, 3]);
        let json = export_json(&history).unwrap();
        let result = parse_import(&json, &Alphabet::wheel()).unwrap();
        assert_eq!(result.events, history);
        assert_eq!(result.total_records, 4);
        assert_eq!(result.skipped, 0);
    }

    #[test]
    fn test_import_skips_invalid_outcomes() {
        let json = r#"{"history": [
            {"id": "a", "outcome": 2, "timestamp": 1},
            {"id": "b", "outcome": 7, "timestamp": 2},
            {"id": "c", "timestamp": 3},
            {"id": "d", "outcome": 10, "timestamp": 4}
        ]}"#;
        let result = parse_import(json, &Alphabet::wheel()).unwrap();
        assert_eq!(result.total_records, 4);
        assert_eq!(result.skipped, 2);
        let ids: Vec<&str> = result.events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "d"]);
    }

    #[test]
    fn test_import_fills_missing_fields() {
        let json = r#"{"history": [{"outcome": 5, "timestamp": 42}, {"outcome": 3}]}"#;
        let result = parse_import(json, &Alphabet::wheel()).unwrap();
        assert_eq!(result.events.len(), 2);
        assert!(result.events[0].id.starts_with("42-"));
        assert!(result.events[1].timestamp > 0);
    }

    #[test]
    fn test_import_skips_mistyped_outcomes_one_by_one() {
        let json = r#"{"history": [
            {"id": "a", "outcome": 2, "timestamp": 1},
            {"id": "b", "outcome": 300, "timestamp": 2},
            {"id": "c", "outcome": -1, "timestamp": 3},
            {"id": "d", "outcome": "2", "timestamp": 4},
            {"id": "e", "outcome": 2.5, "timestamp": 5},
            {"id": "f", "outcome": null, "timestamp": 6},
            5,
            "not an entry"
        ]}"#;
        let result = parse_import(json, &Alphabet::wheel()).unwrap();
        assert_eq!(result.total_records, 8);
        assert_eq!(result.skipped, 7);
        assert_eq!(result.events.len(), 1);
        assert_eq!(result.events[0].id, "a");
    }

    #[test]
    fn test_import_mistyped_id_and_timestamp_are_regenerated() {
        let json = r#"{"history": [{"id": 17, "outcome": 5, "timestamp": "soon"}]}"#;
        let result = parse_import(json, &Alphabet::wheel()).unwrap();
        assert_eq!(result.events.len(), 1);
        assert!(result.events[0].timestamp > 0);
        assert!(result.events[0].id.starts_with(&format!("{}-", result.events[0].timestamp)));
    }

    #[test]
    fn test_import_reads_number_field() {
        let json = r#"{"history": [
            {"id": "a", "number": 2, "timestamp": 1},
            {"id": "b", "number": 10, "timestamp": 2}
        ], "timestamp": 3}"#;
        let result = parse_import(json, &Alphabet::wheel()).unwrap();
        assert_eq!(result.skipped, 0);
        assert_eq!(
            result.events,
            vec![
                Event { id: "a".to_string(), outcome: Outcome(2), timestamp: 1 },
                Event { id: "b".to_string(), outcome: Outcome(10), timestamp: 2 },
            ]
        );
    }

    #[test]
    fn test_import_rejects_bad_documents() {
        assert!(parse_import("not json", &Alphabet::wheel()).is_err());
        assert!(parse_import(r#"{"timestamp": 1}"#, &Alphabet::wheel()).is_err());
    }
}
