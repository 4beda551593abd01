use serde::Deserialize;
use serde::Serialize;

/// One contiguous interval of tracked time. Timestamps are milliseconds since the unix epoch and a
/// missing `stop` means the interval is still running.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct Entry {
    pub start: i64,
    pub stop: Option<i64>,
    #[serde(default)]
    pub comment: String,
}

impl Entry {
    pub fn started_at(start: i64, comment: impl Into<String>) -> Self {
        Self {
            start,
            stop: None,
            comment: comment.into(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.stop.is_none()
    }

    /// Length of a sealed entry. Running entries have no duration yet.
    pub fn duration_ms(&self) -> Option<i64> {
        self.stop.map(|stop| stop - self.start)
    }

    pub fn with_stop(self, stop: i64) -> Self {
        Self {
            stop: Some(stop),
            ..self
        }
    }
}

/// Named accumulator of entries. Entries are kept in the order they were started.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone, Default)]
pub struct Project {
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub entries: Vec<Entry>,
}

impl Project {
    pub fn with_tags(tags: Vec<String>) -> Self {
        Self {
            tags,
            entries: vec![],
        }
    }

    pub fn running_entry_mut(&mut self) -> Option<&mut Entry> {
        self.entries.last_mut().filter(|entry| entry.is_running())
    }

    /// Sum of every sealed entry in milliseconds.
    pub fn total_ms(&self) -> i64 {
        self.entries.iter().filter_map(Entry::duration_ms).sum()
    }
}
