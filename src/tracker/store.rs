use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    fs::operations::write_locked,
    utils::{
        clock::Clock,
        time::{format_pretty_time, ms_to_seconds},
    },
};

use super::entities::{Entry, Project};

pub const DATA_FILE_NAME: &str = "data.json";
const BACKUP_SUFFIX: &str = ".backup";

/// Projects keyed by name, in registration order.
pub type Projects = IndexMap<String, Project>;

#[derive(Debug, PartialEq, Eq)]
pub enum RegisterOutcome {
    Registered,
    AlreadyExists,
}

#[derive(Debug, PartialEq, Eq)]
pub struct StartOutcome {
    /// The project didn't exist and was registered with no tags.
    pub registered: bool,
    /// A previous entry was still open and got sealed at the new entry's start.
    pub sealed_previous: bool,
}

#[derive(Debug, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped { duration_ms: i64 },
    UnknownProject,
    /// The project has no entries or its last entry is already sealed.
    NotRunning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearChoice {
    Delete,
    Backup,
    Cancel,
}

impl ClearChoice {
    /// Interprets the answer to the `y/n/b` confirmation prompt.
    pub fn from_response(response: &str) -> Self {
        match response.trim().to_lowercase().as_str() {
            "y" => ClearChoice::Delete,
            "b" => ClearChoice::Backup,
            _ => ClearChoice::Cancel,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ClearOutcome {
    Deleted,
    BackedUp(PathBuf),
    Cancelled,
}

/// The whole tracking state. It is read fully on [TimeTrackerStore::open] and rewritten fully on
/// every [TimeTrackerStore::save]; nothing coordinates two processes using the same file.
pub struct TimeTrackerStore {
    path: PathBuf,
    projects: Projects,
    clock: Box<dyn Clock>,
    save_on_close: bool,
}

impl TimeTrackerStore {
    /// Loads `data.json` from `dir`, creating the directory and an empty store on first run.
    /// A file that isn't valid json is an error.
    pub async fn open(dir: &Path, clock: Box<dyn Clock>) -> Result<Self> {
        let path = dir.join(DATA_FILE_NAME);

        if !tokio::fs::try_exists(&path).await? {
            println!("Creating {}.", path.display());
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Can't create tracking directory {dir:?}"))?;
            write_locked(&path, b"{}").await?;
        }

        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Can't read {path:?}"))?;
        let projects: Projects = serde_json::from_str(&content)
            .with_context(|| format!("{path:?} is not a valid time tracking file"))?;
        debug!("Loaded {} projects from {path:?}", projects.len());

        Ok(Self {
            path,
            projects,
            clock,
            save_on_close: true,
        })
    }

    pub fn projects(&self) -> &Projects {
        &self.projects
    }

    pub fn project(&self, name: &str) -> Option<&Project> {
        self.projects.get(name)
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Serializes the entire store over the previous file content.
    pub async fn save(&self) -> Result<()> {
        let content = to_pretty_json(&self.projects)?;
        write_locked(&self.path, &content).await?;
        debug!("Saved {} projects into {:?}", self.projects.len(), self.path);
        Ok(())
    }

    pub async fn register(&mut self, name: &str, tags: Vec<String>) -> Result<RegisterOutcome> {
        if self.projects.contains_key(name) {
            warn!("Project {name} already exists");
            return Ok(RegisterOutcome::AlreadyExists);
        }

        info!("Registering project {name} with tags {tags:?}");
        self.projects
            .insert(name.to_owned(), Project::with_tags(tags));
        self.save().await?;
        Ok(RegisterOutcome::Registered)
    }

    /// Opens a new entry at the current time. Unknown projects are registered first.
    pub async fn start(&mut self, name: &str, comment: &str) -> Result<StartOutcome> {
        let registered = !self.projects.contains_key(name);
        if registered {
            self.register(name, vec![]).await?;
        }

        let now = self.clock.timestamp_ms();
        let project = self
            .projects
            .get_mut(name)
            .context("Project should exist after registration")?;

        let sealed_previous = match project.running_entry_mut() {
            Some(previous) => {
                warn!(
                    "Project {name} still had an entry running since {}, sealing it",
                    previous.start
                );
                previous.stop = Some(now);
                true
            }
            None => false,
        };

        project.entries.push(Entry::started_at(now, comment));
        info!("Started tracking {name} at {now}");

        Ok(StartOutcome {
            registered,
            sealed_previous,
        })
    }

    /// Seals the running entry of `name` at the current time and saves. A sealed entry is never
    /// sealed again.
    pub async fn stop(&mut self, name: &str) -> Result<StopOutcome> {
        let now = self.clock.timestamp_ms();

        let Some(project) = self.projects.get_mut(name) else {
            warn!("Project {name} not found");
            return Ok(StopOutcome::UnknownProject);
        };
        let Some(entry) = project.running_entry_mut() else {
            warn!("Project {name} has no running entry");
            return Ok(StopOutcome::NotRunning);
        };

        entry.stop = Some(now);
        let duration_ms = now - entry.start;
        info!("Stopped tracking {name} after {duration_ms}ms");

        self.save().await?;
        Ok(StopOutcome::Stopped { duration_ms })
    }

    /// Total tracked seconds of sealed entries. [None] for unknown projects.
    pub fn total_time(&self, name: &str) -> Option<f64> {
        self.projects
            .get(name)
            .map(|project| ms_to_seconds(project.total_ms()))
    }

    /// Human readable overview of every project with its total time and tags.
    pub fn report(&self) -> String {
        let mut report = String::new();
        for (name, project) in &self.projects {
            let total = ms_to_seconds(project.total_ms());
            report.push_str(&format!(
                "{name}\n\tTime Passed:\n\t\t{}",
                format_pretty_time(total)
            ));
            if !project.tags.is_empty() {
                report.push_str(&format!("\n\tTags:\n\t\t{}", project.tags.join(", ")));
            }
            report.push_str("\n\n");
        }
        report
    }

    /// Removes `data.json`, optionally keeping a copy next to it. Once the file is gone the store
    /// is no longer written on [TimeTrackerStore::close].
    pub async fn clear(&mut self, choice: ClearChoice) -> Result<ClearOutcome> {
        let outcome = match choice {
            ClearChoice::Cancel => return Ok(ClearOutcome::Cancelled),
            ClearChoice::Delete => ClearOutcome::Deleted,
            ClearChoice::Backup => {
                let backup = backup_path(&self.path);
                tokio::fs::copy(&self.path, &backup)
                    .await
                    .with_context(|| format!("Can't back up {:?} to {backup:?}", self.path))?;
                ClearOutcome::BackedUp(backup)
            }
        };

        tokio::fs::remove_file(&self.path)
            .await
            .with_context(|| format!("Can't delete {:?}", self.path))?;
        self.projects.clear();
        self.save_on_close = false;
        info!("Cleared tracking data with {outcome:?}");
        Ok(outcome)
    }

    /// Final save. Every command path ends here.
    pub async fn close(self) -> Result<()> {
        if self.save_on_close {
            self.save().await?;
            info!("Data saved on close");
        }
        Ok(())
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let mut backup = path.as_os_str().to_owned();
    backup.push(BACKUP_SUFFIX);
    PathBuf::from(backup)
}

fn to_pretty_json(value: &impl Serialize) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;
    Ok(buffer)
}
