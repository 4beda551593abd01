//! Ordered tables addressed either by key or by 1-based position. Both the link launcher and the
//! shell shortcut dispatcher build one at startup and pass it to their lookups.

use std::{fmt::Display, fs, io::ErrorKind, path::Path};

use ansi_term::Colour;
use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("unknown key {0}")]
    UnknownKey(String),
    #[error("index {index} is outside of 1..={len}")]
    IndexOutOfRange { index: usize, len: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog<T> {
    entries: IndexMap<String, T>,
}

impl<T> Default for Catalog<T> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }
}

impl<T> FromIterator<(String, T)> for Catalog<T> {
    fn from_iter<I: IntoIterator<Item = (String, T)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<T> Catalog<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry at the end. Returns `false` and keeps the existing value if the key is taken.
    pub fn insert(&mut self, key: impl Into<String>, value: T) -> bool {
        let key = key.into();
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, value);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Entries with their 1-based position.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str, &T)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, (key, value))| (index + 1, key.as_str(), value))
    }

    /// Resolves a key or, when `key_or_index` is all digits, a 1-based position. `0` is never a
    /// valid position.
    pub fn lookup(&self, key_or_index: &str) -> Result<(&str, &T), LookupError> {
        let is_index = !key_or_index.is_empty() && key_or_index.bytes().all(|b| b.is_ascii_digit());
        let found = if is_index {
            let len = self.entries.len();
            let index = key_or_index.parse::<usize>().unwrap_or(usize::MAX);
            index
                .checked_sub(1)
                .and_then(|position| self.entries.get_index(position))
                .ok_or(LookupError::IndexOutOfRange { index, len })?
        } else {
            self.entries
                .get_key_value(key_or_index)
                .ok_or_else(|| LookupError::UnknownKey(key_or_index.to_owned()))?
        };
        debug!("Resolved {key_or_index} to {}", found.0);
        Ok((found.0.as_str(), found.1))
    }

    fn key_width(&self) -> usize {
        self.entries.keys().map(|key| key.len()).max().unwrap_or(0)
    }
}

impl<T: Display> Catalog<T> {
    /// One colored `NNN - key - value` line per entry.
    pub fn listing(&self) -> Vec<String> {
        let width = self.key_width();
        self.iter()
            .map(|(index, key, value)| {
                format!(
                    "{} - {} - {}",
                    Colour::Green.paint(format!("{index:03}")),
                    Colour::Cyan.paint(format!("{key:<width$}")),
                    Colour::Yellow.paint(value.to_string()),
                )
            })
            .collect()
    }
}

/// Reads an optional json config file. A missing file isn't an error, a malformed one is.
pub fn load_json_config<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read_to_string(path) {
        Ok(content) => {
            let config = serde_json::from_str(&content)
                .with_context(|| format!("Can't parse config file {path:?}"))?;
            debug!("Loaded config from {path:?}");
            Ok(Some(config))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Can't read config file {path:?}")),
    }
}
