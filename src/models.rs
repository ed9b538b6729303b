//models.rs
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One logged exercise set. Immutable once appended; the log only ever
/// appends new entries and removes whole ones.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub date: DateTime<Local>,
    pub name: String,
    pub reps: u32,
    pub weight: f32,
    pub rpe: u8,
}

#[derive(Debug, Error)]
pub enum LogError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),

    #[error("rpe must be between 1 and 10")]
    RpeOutOfRange,

    #[error("no entry at index {index}, the log has {len}")]
    OutOfRange { index: usize, len: usize },

    #[error("could not write the log: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not encode the log: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type LogResult<T> = Result<T, LogError>;

/// In-memory form state. Zero, empty or `None` mean the field has not been
/// provided yet; `build` names the first field that blocks a submit.
#[derive(Clone, Debug, Default)]
pub struct EntryDraft {
    pub name: String,
    pub reps: u32,
    pub weight: f32,
    pub rpe: Option<u8>,
}

impl EntryDraft {
    /// Seeds the form from an existing entry so logging another set of the
    /// same exercise needs no retyping.
    pub fn from_entry(entry: &Entry) -> Self {
        Self {
            name: entry.name.clone(),
            reps: entry.reps,
            weight: entry.weight,
            rpe: Some(entry.rpe),
        }
    }

    /// Checks every required field and stamps a new entry with `now`.
    pub fn build(&self, now: DateTime<Local>) -> LogResult<Entry> {
        if self.name.trim().is_empty() {
            return Err(LogError::Missing("name"));
        }
        if self.reps == 0 {
            return Err(LogError::NotPositive("reps"));
        }
        if self.weight <= 0.0 {
            return Err(LogError::NotPositive("weight"));
        }
        let rpe = self.rpe.ok_or(LogError::Missing("rpe"))?;
        if !(1..=10).contains(&rpe) {
            return Err(LogError::RpeOutOfRange);
        }

        Ok(Entry {
            date: now,
            name: self.name.trim().to_string(),
            reps: self.reps,
            weight: self.weight,
            rpe,
        })
    }
}

/// The full time-ordered history of sets. Entries are always stamped with
/// the current time on append, never inserted, so the sequence stays in
/// non-decreasing timestamp order. `revision` bumps on every successful
/// mutation; cached derivations key off it to tell when they are stale.
#[derive(Clone, Debug, Default)]
pub struct EntryLog {
    entries: Vec<Entry>,
    revision: u64,
}

impl EntryLog {
    pub fn from_entries(entries: Vec<Entry>) -> Self {
        Self {
            entries,
            revision: 0,
        }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&Entry> {
        self.entries.last()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Validates the draft, stamps it with `now` and appends. The log is
    /// untouched when validation fails.
    pub fn append(&mut self, draft: &EntryDraft, now: DateTime<Local>) -> LogResult<()> {
        let entry = draft.build(now)?;
        self.entries.push(entry);
        self.revision += 1;
        Ok(())
    }

    /// Removes the entry at `index`, keeping every other entry in its
    /// original relative order. An out-of-range index is an error and
    /// leaves the log untouched.
    pub fn remove_at(&mut self, index: usize) -> LogResult<Entry> {
        if index >= self.entries.len() {
            return Err(LogError::OutOfRange {
                index,
                len: self.entries.len(),
            });
        }
        let removed = self.entries.remove(index);
        self.revision += 1;
        Ok(removed)
    }

    /// Wholesale reset to the empty log.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.revision += 1;
    }
}
