use std::{path::Path, sync::LazyLock};

use anyhow::Result;
use tracing::level_filters::LevelFilter;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::fmt::{format::FmtSpan, writer::MakeWriterExt};

pub const TRACKER_PREFIX: &str = "time-tracker";
pub const CLIPPER_PREFIX: &str = "clipper";
pub const AST_PREFIX: &str = "ast-explorer";
pub const LINKER_PREFIX: &str = "linker";
pub const SHORTCUT_PREFIX: &str = "shortcut";

/// Logging flags shared by every binary.
#[derive(Debug, Clone, clap::Args)]
pub struct LogArgs {
    #[arg(long, help = "Mirror log output to stderr")]
    pub log: bool,
    #[arg(long = "log-filter", help = "Log level. Defaults to $RUST_LOG or info")]
    pub log_filter: Option<LevelFilter>,
}

/// Installs the global subscriber. Log files rotate daily inside `<log_root>/logs`. Regular tool
/// output goes to stdout, so the console mirror writes to stderr.
pub fn enable_logging(
    prefix: &str,
    log_root: &Path,
    log_level: Option<LevelFilter>,
    show_std: bool,
) -> Result<()> {
    let appender = tracing_appender::rolling::Builder::new()
        .rotation(Rotation::DAILY)
        .max_log_files(5)
        .filename_prefix(prefix)
        .build(log_root.join("logs"))?;

    let stderr = std::io::stderr.with_filter(move |_| show_std);

    let level = log_level
        .map(|v| v.to_string())
        .unwrap_or_else(|| std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()));

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(format!(
            "{}={level}",
            env!("CARGO_PKG_NAME").replace("-", "_"),
        )))
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(stderr.and(appender))
        .pretty()
        .init();
    Ok(())
}

impl LogArgs {
    pub fn enable(&self, prefix: &str, log_root: &Path) -> Result<()> {
        let level = if self.log && self.log_filter.is_none() {
            Some(LevelFilter::TRACE)
        } else {
            self.log_filter
        };
        enable_logging(prefix, log_root, level, self.log)
    }
}

pub static TEST_LOGGING: LazyLock<()> = LazyLock::new(|| {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::TRACE)
        .with_test_writer()
        .pretty()
        .init()
});
