use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::models::{Entry, EntryLog, LogResult};

const LOG_FILE: &str = "log.json";

/// The persisted slot behind the entry log: one JSON file holding the
/// whole serialized array of entries. Every mutation rewrites the file
/// wholesale; there is no batching and no transaction, so a crash between
/// a mutation and its flush loses at most that one mutation.
pub struct LogStore {
    path: PathBuf,
}

impl LogStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Default slot under the platform data directory, falling back to the
    /// working directory when the platform reports none.
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("liftlog")
            .join(LOG_FILE)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Hydrates the log from the slot. An absent slot or an unparseable
    /// payload fails soft to the empty log. Any other read failure is an
    /// error: the slot may still hold history, so the caller must not
    /// flush over it.
    pub fn load(&self) -> LogResult<EntryLog> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(decode(&raw)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(EntryLog::default()),
            Err(err) => Err(err.into()),
        }
    }

    /// Rewrites the slot with the full serialized log.
    pub fn save(&self, log: &EntryLog) -> LogResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, encode(log)?)?;
        Ok(())
    }
}

/// Serializes the log as a bare JSON array of entries.
pub fn encode(log: &EntryLog) -> LogResult<String> {
    Ok(serde_json::to_string(log.entries())?)
}

/// Decodes a stored payload; timestamps come back as instants, not
/// strings. A payload that does not parse is discarded with a warning.
pub fn decode(raw: &str) -> EntryLog {
    match serde_json::from_str::<Vec<Entry>>(raw) {
        Ok(entries) => {
            info!("hydrated {} entries", entries.len());
            EntryLog::from_entries(entries)
        }
        Err(err) => {
            warn!("stored log is unreadable, starting empty: {err}");
            EntryLog::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntryDraft;
    use chrono::{Local, TimeZone, Utc};

    fn sample_log() -> EntryLog {
        let mut log = EntryLog::default();
        let base = Local.with_ymd_and_hms(2024, 3, 16, 10, 0, 0).unwrap();
        for (i, (name, weight)) in [("squat", 102.5), ("bench press", 80.0)]
            .into_iter()
            .enumerate()
        {
            let draft = EntryDraft {
                name: name.to_string(),
                reps: 5,
                weight,
                rpe: Some(8),
            };
            log.append(&draft, base + chrono::Duration::minutes(i as i64 * 4))
                .expect("valid draft");
        }
        log
    }

    #[test]
    fn save_then_load_round_trips_the_log() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = LogStore::new(dir.path().join("log.json"));

        let log = sample_log();
        store.save(&log).expect("save succeeds");
        let back = store.load().expect("slot is readable");

        assert_eq!(back.entries(), log.entries());
    }

    #[test]
    fn timestamps_round_trip_as_instants() {
        let raw = r#"[{"date":"2024-03-16T10:30:00+02:00","name":"squat","reps":5,"weight":100.0,"rpe":9}]"#;
        let log = decode(raw);

        assert_eq!(log.len(), 1);
        let entry = &log.entries()[0];
        let expected = Utc.with_ymd_and_hms(2024, 3, 16, 8, 30, 0).unwrap();
        assert_eq!(entry.date, expected);

        // A second decode of the re-encoded payload still compares equal
        // as an instant, whatever offset the local zone printed it with.
        let encoded = encode(&log).expect("encode succeeds");
        let again = decode(&encoded);
        assert_eq!(again.entries()[0].date, expected);
    }

    #[test]
    fn missing_slot_hydrates_empty() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = LogStore::new(dir.path().join("log.json"));

        assert!(store.load().expect("absent slot is not an error").is_empty());
    }

    #[test]
    fn unparseable_slot_hydrates_empty() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("log.json");
        fs::write(&path, "definitely not json").expect("write fixture");

        assert!(LogStore::new(path).load().expect("bad payload fails soft").is_empty());
    }

    #[test]
    fn unreadable_slot_is_an_error_not_an_empty_log() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("log.json");
        // A directory sitting at the slot path makes the read fail with
        // something other than NotFound.
        fs::create_dir(&path).expect("occupy the slot");

        assert!(LogStore::new(path).load().is_err());
    }

    #[test]
    fn foreign_shape_hydrates_empty() {
        // An entry missing required fields fails the whole decode; the
        // policy is discard and start over, never a panic.
        let raw = r#"[{"date":"2024-03-16T10:30:00+02:00","name":"squat"}]"#;
        assert!(decode(raw).is_empty());
        assert!(decode("{\"table\":[]}").is_empty());
    }

    #[test]
    fn cleared_log_persists_as_an_empty_array() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = LogStore::new(dir.path().join("log.json"));

        let mut log = sample_log();
        log.clear();
        store.save(&log).expect("save succeeds");

        let raw = fs::read_to_string(store.path()).expect("slot exists");
        assert_eq!(raw, "[]");
    }

    #[test]
    fn save_creates_the_slot_directory() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = LogStore::new(dir.path().join("nested").join("log.json"));

        store.save(&sample_log()).expect("save succeeds");
        assert!(store.path().exists());
    }
}
