//! Keypress detection for the live session. The controlling terminal is switched to raw mode for
//! as long as a [TerminalKeys] exists, and switched back when it is dropped, whichever way the
//! session ends.

use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use tracing::{debug, error};

/// Non-blocking source of "the user pressed something" signals.
#[cfg_attr(test, mockall::automock)]
pub trait KeyListener {
    /// Returns immediately. `true` once a key press was observed.
    fn key_pressed(&mut self) -> Result<bool>;
}

/// Raw mode held for the lifetime of the value.
pub struct RawModeGuard {
    _private: (),
}

impl RawModeGuard {
    pub fn acquire() -> Result<Self> {
        enable_raw_mode()?;
        debug!("Terminal switched to raw mode");
        Ok(Self { _private: () })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        match disable_raw_mode() {
            Ok(()) => debug!("Terminal restored"),
            Err(e) => error!("Failed to restore terminal mode {e:?}"),
        }
    }
}

/// Key presses read from the controlling terminal.
pub struct TerminalKeys {
    _raw_mode: RawModeGuard,
}

impl TerminalKeys {
    pub fn new() -> Result<Self> {
        Ok(Self {
            _raw_mode: RawModeGuard::acquire()?,
        })
    }
}

impl KeyListener for TerminalKeys {
    fn key_pressed(&mut self) -> Result<bool> {
        // Drain everything that's queued so resize or focus events can't hide a key press.
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    debug!("Key pressed {:?}", key.code);
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}
