//! Append-only change log kept next to the profiles document.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::store::Store;

/// Number of changes kept; older ones are dropped.
pub const MAX_HISTORY_ENTRIES: usize = 100;

/// What a change did. These are the only actions cm records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Add,
    Remove,
    Switch,
    Update,
}

impl ChangeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Switch => "switch",
            Self::Update => "update",
        }
    }
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The action of a change as read from disk.
///
/// Records written by another version of cm may carry an action this build
/// does not know; it is kept verbatim so rewriting the log does not lose it.
/// Only [`ChangeAction`] can be recorded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredAction {
    Known(ChangeAction),
    Unknown(String),
}

impl StoredAction {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Known(action) => action.as_str(),
            Self::Unknown(action) => action,
        }
    }

    pub fn known(&self) -> Option<ChangeAction> {
        match self {
            Self::Known(action) => Some(*action),
            Self::Unknown(_) => None,
        }
    }
}

impl From<ChangeAction> for StoredAction {
    fn from(action: ChangeAction) -> Self {
        Self::Known(action)
    }
}

impl PartialEq<ChangeAction> for StoredAction {
    fn eq(&self, other: &ChangeAction) -> bool {
        self.known() == Some(*other)
    }
}

impl fmt::Display for StoredAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Change {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub action: StoredAction,
    pub model_name: String,
    pub details: String,
}

/// The persisted log, newest change first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryLog {
    #[serde(default)]
    pub changes: Vec<Change>,
}

impl HistoryLog {
    /// Insert a change at the head and evict whatever falls past the cap.
    pub fn record(
        &mut self,
        action: ChangeAction,
        model_name: &str,
        details: String,
        now: DateTime<Utc>,
    ) -> Change {
        let millis = u64::try_from(now.timestamp_millis()).unwrap_or_default();
        let id = match self.changes.first() {
            Some(newest) if newest.id >= millis => newest.id + 1,
            _ => millis,
        };
        let change = Change {
            id,
            timestamp: now,
            action: action.into(),
            model_name: model_name.to_string(),
            details,
        };
        self.changes.insert(0, change.clone());
        self.changes.truncate(MAX_HISTORY_ENTRIES);
        change
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// At most `limit` changes, newest first.
    pub fn recent(&self, limit: usize) -> &[Change] {
        &self.changes[..limit.min(self.changes.len())]
    }
}

/// Writes change records through a [`Store`].
#[derive(Debug, Clone, Copy)]
pub struct HistoryRecorder<'a> {
    store: &'a Store,
}

impl<'a> HistoryRecorder<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    pub fn add_change(
        &self,
        action: ChangeAction,
        model_name: &str,
        details: impl Into<String>,
    ) -> Result<Change> {
        let mut log = self.store.read_history()?;
        let change = log.record(action, model_name, details.into(), Utc::now());
        self.store.write_history(&log)?;
        debug!(
            change_id = change.id,
            action = %change.action,
            model = %change.model_name,
            "recorded change"
        );
        Ok(change)
    }

    pub fn get_history(&self) -> Result<HistoryLog> {
        self.store.read_history()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).unwrap()
    }

    #[test]
    fn newest_change_comes_first() {
        let mut log = HistoryLog::default();
        log.record(ChangeAction::Add, "a", "Added new model: a".into(), at(1_000));
        log.record(ChangeAction::Switch, "a", "Switched to model: a".into(), at(2_000));
        assert_eq!(log.changes[0].action, ChangeAction::Switch);
        assert_eq!(log.changes[1].action, ChangeAction::Add);
    }

    #[test]
    fn ids_stay_monotonic_when_the_clock_does_not_move() {
        let mut log = HistoryLog::default();
        let first = log.record(ChangeAction::Add, "a", String::new(), at(5_000));
        let second = log.record(ChangeAction::Update, "a", String::new(), at(5_000));
        let third = log.record(ChangeAction::Update, "a", String::new(), at(4_000));
        assert_eq!(first.id, 5_000);
        assert_eq!(second.id, 5_001);
        assert_eq!(third.id, 5_002);
    }

    #[test]
    fn evicts_the_oldest_past_the_cap() {
        let mut log = HistoryLog::default();
        for i in 0..(MAX_HISTORY_ENTRIES as i64 + 5) {
            log.record(ChangeAction::Add, &format!("m{i}"), String::new(), at(i));
        }
        assert_eq!(log.len(), MAX_HISTORY_ENTRIES);
        assert_eq!(log.changes[0].model_name, "m104");
        assert_eq!(log.changes.last().unwrap().model_name, "m5");
    }

    #[test]
    fn unknown_actions_survive_a_reload() {
        let json = r#"{"changes":[{"id":1,"timestamp":"2024-01-01T00:00:00.000Z",
            "action":"import","modelName":"m","details":"d"}]}"#;
        let log: HistoryLog = serde_json::from_str(json).unwrap();
        assert_eq!(log.changes[0].action, StoredAction::Unknown("import".into()));
        assert_eq!(log.changes[0].action.known(), None);
        let back = serde_json::to_value(&log).unwrap();
        assert_eq!(back["changes"][0]["action"], "import");
        assert_eq!(back["changes"][0]["modelName"], "m");
    }

    #[test]
    fn known_actions_are_stored_lowercase() {
        let mut log = HistoryLog::default();
        log.record(ChangeAction::Switch, "a", String::new(), at(1));
        let back = serde_json::to_value(&log).unwrap();
        assert_eq!(back["changes"][0]["action"], "switch");

        let reloaded: HistoryLog = serde_json::from_value(back).unwrap();
        assert_eq!(reloaded.changes[0].action, ChangeAction::Switch);
        assert_eq!(
            reloaded.changes[0].action,
            StoredAction::Known(ChangeAction::Switch)
        );
    }

    #[test]
    fn recent_clamps_to_length() {
        let mut log = HistoryLog::default();
        log.record(ChangeAction::Add, "a", String::new(), at(1));
        assert_eq!(log.recent(20).len(), 1);
        assert_eq!(log.recent(0).len(), 0);
    }
}
