use std::{
    env,
    ffi::OsString,
    io,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Result};

/// Selects the directory holding the time tracker's `data.json`.
pub const TRACKING_DIR_VAR: &str = "DS_TIME_TRACKING_DIR";
pub const DEFAULT_TRACKING_DIR: &str = "./time_tracker/";

/// Selects the directory holding `links.json` and `commands.json`.
pub const CONFIG_DIR_VAR: &str = "DS_UTIL_CONFIG_DIR";

const APPLICATION_NAME: &str = "dsutil";

/// Resolves the tracking directory. An explicit `--dir` wins over the environment, which wins
/// over [DEFAULT_TRACKING_DIR].
pub fn tracking_dir(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(|| tracking_dir_from(env::var_os(TRACKING_DIR_VAR)))
}

fn tracking_dir_from(value: Option<OsString>) -> PathBuf {
    value
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_TRACKING_DIR))
}

/// Directory for the launcher tables. Returns [None] when nothing sensible can be found, in which
/// case the built-in tables are used.
pub fn config_dir() -> Option<PathBuf> {
    config_dir_from(
        env::var_os(CONFIG_DIR_VAR),
        env::var_os("XDG_CONFIG_HOME"),
        env::var_os("HOME"),
    )
}

fn config_dir_from(
    explicit: Option<OsString>,
    xdg_config: Option<OsString>,
    home: Option<OsString>,
) -> Option<PathBuf> {
    if let Some(dir) = explicit.filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(dir));
    }
    xdg_config
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| home.map(|home| Path::new(&home).join(".config")))
        .map(|base| base.join(APPLICATION_NAME))
}

/// State directory used for logs of the tools that have no data directory of their own.
pub fn create_application_default_path() -> Result<PathBuf> {
    let path = {
        #[cfg(windows)]
        {
            let mut path = env::var("APPDATA")
                .map(PathBuf::from)
                .map_err(|_| anyhow!("APPDATA should be present on Windows"))?;
            path.push(APPLICATION_NAME);
            path
        }
        #[cfg(not(windows))]
        {
            let mut path = env::var("XDG_STATE_HOME")
                .map(PathBuf::from)
                .or_else(|_| {
                    env::var("HOME").map(|home| {
                        let mut path = PathBuf::from(home);
                        path.push(".local/state");
                        path
                    })
                })
                .map_err(|_| anyhow!("Couldn't find neither XDG_STATE_HOME nor HOME"))?;
            path.push(APPLICATION_NAME);
            path
        }
    };

    ensure_dir(path)
}

pub fn ensure_dir(path: PathBuf) -> Result<PathBuf> {
    match std::fs::create_dir_all(&path) {
        Ok(_) => Ok(path),
        Err(v) if v.kind() == io::ErrorKind::AlreadyExists => Ok(path),
        Err(v) => Err(v.into()),
    }
}
