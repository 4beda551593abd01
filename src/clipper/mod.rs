//! Flattens files into one stream on stdout, each preceded by a header naming it. Useful for
//! pasting a handful of sources somewhere in one go.

pub mod walk;

use std::{
    fs,
    io::{self, Write},
    path::Path,
};

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info};
use walk::{collect_files, header_path, ExcludeSet};

use crate::{
    fs::operations::is_text_file,
    utils::{
        dir::create_application_default_path,
        logging::{LogArgs, CLIPPER_PREFIX},
    },
};

#[derive(Parser, Debug)]
#[command(name = "clipper", version, long_about = None)]
#[command(about = "Flatten and print files with header formatting")]
pub struct ClipperArgs {
    #[arg(
        default_value = ".",
        help = "Files, directories or glob patterns to clip"
    )]
    paths: Vec<String>,
    #[arg(
        short = 'L',
        long,
        default_value_t = 0,
        help = "Recursion level for directories (0 = current dir only)"
    )]
    level: usize,
    #[arg(long, num_args = 0.., help = "Glob patterns of file names to exclude")]
    exclude: Vec<String>,
    #[command(flatten)]
    logging: LogArgs,
}

/// Counts of what happened to each collected file.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ClipSummary {
    pub printed: usize,
    pub excluded: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClipOutcome {
    Printed,
    Skipped,
    Failed,
}

pub fn run_clipper() -> Result<()> {
    let args = ClipperArgs::parse();
    args.logging
        .enable(CLIPPER_PREFIX, &create_application_default_path()?)?;

    let summary = clip(
        &args.paths,
        args.level,
        &ExcludeSet::new(&args.exclude),
        &mut io::stdout().lock(),
        &mut io::stderr().lock(),
    )?;
    info!("Clipped {summary:?}");
    Ok(())
}

/// Prints every file selected by `patterns` to `out`. Problems with single files are reported to
/// `err` and don't stop the others.
pub fn clip(
    patterns: &[String],
    level: usize,
    excludes: &ExcludeSet,
    out: &mut impl Write,
    err: &mut impl Write,
) -> Result<ClipSummary> {
    let mut summary = ClipSummary::default();
    for file in collect_files(patterns, level)? {
        if excludes.excludes(&file) {
            writeln!(err, "# Excluded by pattern: {}", file.display())?;
            summary.excluded += 1;
            continue;
        }
        match clip_file(out, err, &file, &header_path(&file, level))? {
            ClipOutcome::Printed => summary.printed += 1,
            ClipOutcome::Skipped => summary.skipped += 1,
            ClipOutcome::Failed => summary.failed += 1,
        }
    }
    out.flush()?;
    Ok(summary)
}

fn clip_file(
    out: &mut impl Write,
    err: &mut impl Write,
    file: &Path,
    header: &Path,
) -> Result<ClipOutcome> {
    if !is_text_file(file) {
        writeln!(err, "# Skipping non-text file: {}", file.display())?;
        return Ok(ClipOutcome::Skipped);
    }

    writeln!(out, "###")?;
    writeln!(out, "# {}", header.display())?;
    writeln!(out, "###")?;

    match fs::read_to_string(file) {
        Ok(content) => {
            writeln!(out, "{content}")?;
            debug!("Printed {file:?}");
            Ok(ClipOutcome::Printed)
        }
        Err(e) => {
            writeln!(err, "# Error reading {}: {e}", file.display())?;
            Ok(ClipOutcome::Failed)
        }
    }
}
