use std::{io::Write, time::Duration};

use anyhow::Result;
use tracing::{debug, error, info};

use crate::utils::time::format_pretty_time;

use super::{
    store::{StopOutcome, TimeTrackerStore},
    terminal::KeyListener,
};

/// How often the elapsed time line is redrawn.
pub const RENDER_INTERVAL: Duration = Duration::from_millis(300);
/// How often the store is flushed while a session is running.
pub const AUTOSAVE_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy)]
pub struct SessionTiming {
    pub render_interval: Duration,
    pub autosave_interval: Duration,
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self {
            render_interval: RENDER_INTERVAL,
            autosave_interval: AUTOSAVE_INTERVAL,
        }
    }
}

#[derive(Debug)]
pub struct SessionSummary {
    pub elapsed: Duration,
    pub autosaves: usize,
    pub stop: StopOutcome,
}

/// Runs the live display for a project whose entry was already started. The loop is
/// single threaded: it polls for a key, redraws, sleeps for one render interval and flushes the
/// store whenever the autosave deadline has passed. Autosave failures are logged and retried at
/// the next deadline.
///
/// Once the loop ends, for any reason, the running entry is sealed and the store saved. Errors from
/// the loop are returned after that.
pub async fn run_session(
    store: &mut TimeTrackerStore,
    project: &str,
    keys: &mut impl KeyListener,
    out: &mut impl Write,
    timing: SessionTiming,
) -> Result<SessionSummary> {
    let started = store.clock().instant();
    let mut next_save = started + timing.autosave_interval;
    let mut autosaves = 0;
    info!("Session for {project} running");

    let running: Result<()> = async {
        while !keys.key_pressed()? {
            let elapsed = store.clock().instant() - started;
            write!(out, "\r{} elapsed.", format_pretty_time(elapsed.as_secs_f64()))?;
            out.flush()?;

            store.clock().sleep(timing.render_interval).await;

            if store.clock().instant() > next_save {
                match store.save().await {
                    Ok(()) => {
                        autosaves += 1;
                        debug!("Autosaved {project}");
                    }
                    Err(e) => error!("Autosave failed {e:?}"),
                }
                next_save = store.clock().instant() + timing.autosave_interval;
            }
        }
        Ok(())
    }
    .await;

    let elapsed = store.clock().instant() - started;
    let stop = store.stop(project).await;
    info!("Session for {project} stopped after {elapsed:?}");

    if let (Err(_), Err(e)) = (&running, &stop) {
        error!("Final save failed {e:?}");
    }
    running?;
    let stop = stop?;
    // Raw mode doesn't translate newlines, so return the cursor explicitly.
    write!(out, "\r\n")?;

    Ok(SessionSummary {
        elapsed,
        autosaves,
        stop,
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use anyhow::{anyhow, Result};
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    use crate::{
        tracker::{
            store::{StopOutcome, TimeTrackerStore, DATA_FILE_NAME},
            terminal::MockKeyListener,
        },
        utils::{clock::TestClock, logging::TEST_LOGGING},
    };

    use super::{run_session, SessionTiming};

    async fn open_store(dir: &std::path::Path) -> Result<TimeTrackerStore> {
        TimeTrackerStore::open(
            dir,
            Box::new(TestClock::starting_at(
                Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
            )),
        )
        .await
    }

    fn keys_pressed_after(polls_before_press: usize) -> MockKeyListener {
        let mut keys = MockKeyListener::new();
        let mut polls = 0;
        keys.expect_key_pressed().returning(move || {
            polls += 1;
            Ok(polls > polls_before_press)
        });
        keys
    }

    #[tokio::test(start_paused = true)]
    async fn session_renders_autosaves_and_seals() -> Result<()> {
        *TEST_LOGGING;
        let dir = tempdir()?;
        let mut store = open_store(dir.path()).await?;
        store.start("focus", "deep work").await?;

        let mut keys = keys_pressed_after(40);
        let mut out = Vec::new();
        let summary = run_session(
            &mut store,
            "focus",
            &mut keys,
            &mut out,
            SessionTiming::default(),
        )
        .await?;

        // 40 frames of 300ms cross the 10s deadline once.
        assert_eq!(summary.elapsed, Duration::from_secs(12));
        assert_eq!(summary.autosaves, 1);
        assert_eq!(
            summary.stop,
            StopOutcome::Stopped {
                duration_ms: 12_000
            }
        );

        let out = String::from_utf8(out)?;
        assert!(out.starts_with("\r0.000 seconds elapsed."));
        assert!(out.contains("\r11.700 seconds elapsed."));
        assert!(out.ends_with('\n'));

        let reopened = open_store(dir.path()).await?;
        let entry = &reopened.project("focus").unwrap().entries[0];
        assert_eq!(entry.duration_ms(), Some(12_000));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn immediate_key_press_seals_empty_entry() -> Result<()> {
        let dir = tempdir()?;
        let mut store = open_store(dir.path()).await?;
        store.start("quick", "").await?;

        let mut keys = keys_pressed_after(0);
        let mut out = Vec::new();
        let summary = run_session(
            &mut store,
            "quick",
            &mut keys,
            &mut out,
            SessionTiming::default(),
        )
        .await?;

        assert_eq!(summary.autosaves, 0);
        assert_eq!(summary.stop, StopOutcome::Stopped { duration_ms: 0 });
        assert_eq!(out, b"\r\n");
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn failing_key_listener_still_seals_entry() -> Result<()> {
        let dir = tempdir()?;
        let mut store = open_store(dir.path()).await?;
        store.start("flaky", "").await?;

        let mut keys = MockKeyListener::new();
        let mut polls = 0;
        keys.expect_key_pressed().returning(move || {
            polls += 1;
            if polls > 3 {
                Err(anyhow!("terminal went away"))
            } else {
                Ok(false)
            }
        });

        let result = run_session(
            &mut store,
            "flaky",
            &mut keys,
            &mut Vec::new(),
            SessionTiming::default(),
        )
        .await;

        assert!(result.is_err());
        let reopened = open_store(dir.path()).await?;
        let entry = &reopened.project("flaky").unwrap().entries[0];
        assert_eq!(entry.duration_ms(), Some(900));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn listener_error_wins_over_failed_final_save() -> Result<()> {
        *TEST_LOGGING;
        let dir = tempdir()?;
        let mut store = open_store(dir.path()).await?;
        store.start("flaky", "").await?;
        // A directory in place of the data file makes every save fail.
        let data = dir.path().join(DATA_FILE_NAME);
        std::fs::remove_file(&data)?;
        std::fs::create_dir(&data)?;

        let mut keys = MockKeyListener::new();
        keys.expect_key_pressed()
            .returning(|| Err(anyhow!("terminal went away")));

        let err = run_session(
            &mut store,
            "flaky",
            &mut keys,
            &mut Vec::new(),
            SessionTiming::default(),
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("terminal went away"));
        let entry = &store.project("flaky").unwrap().entries[0];
        assert_eq!(entry.duration_ms(), Some(0));
        Ok(())
    }
}
