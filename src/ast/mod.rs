//! Outline of Python sources: classes with their methods, free functions and optionally imports,
//! each with its line number.

pub mod output;
pub mod summary;

use std::{
    fs,
    io::{self, IsTerminal, Write},
    path::{Path, PathBuf},
};

use anyhow::Result;
use clap::Parser;
use output::{write_summary, write_totals, OutputOptions, Totals};
use summary::{summarize_file, SortOrder};
use tracing::{debug, warn};

use crate::utils::{
    dir::create_application_default_path,
    logging::{LogArgs, AST_PREFIX},
};

#[derive(Parser, Debug)]
#[command(name = "ast-explorer", version, long_about = None)]
#[command(about = "List classes, functions and imports of Python files or directories")]
pub struct AstArgs {
    #[arg(default_value = ".", help = "Python files or directories to process")]
    paths: Vec<PathBuf>,
    #[arg(long, help = "Sort classes, methods and functions alphabetically")]
    sorted: bool,
    #[arg(
        long = "sorted-desc",
        alias = "sorted_desc",
        conflicts_with = "sorted",
        help = "Sort classes, methods and functions in descending order"
    )]
    sorted_desc: bool,
    #[arg(
        long = "header-only",
        alias = "header_only",
        help = "Only print the header line of every file"
    )]
    header_only: bool,
    #[arg(
        long = "show-imports",
        alias = "show_imports",
        help = "Print import statements"
    )]
    show_imports: bool,
    #[arg(
        long = "line-links",
        alias = "line_links",
        help = "Append vscode:// links to every function"
    )]
    line_links: bool,
    #[command(flatten)]
    logging: LogArgs,
}

impl AstArgs {
    fn sort_order(&self) -> SortOrder {
        if self.sorted_desc {
            SortOrder::Descending
        } else if self.sorted {
            SortOrder::Ascending
        } else {
            SortOrder::Source
        }
    }
}

/// What to print and how to order it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExplorerSettings {
    pub order: SortOrder,
    pub output: OutputOptions,
}

pub fn run_ast_explorer() -> Result<()> {
    let args = AstArgs::parse();
    args.logging
        .enable(AST_PREFIX, &create_application_default_path()?)?;

    let settings = ExplorerSettings {
        order: args.sort_order(),
        output: OutputOptions {
            header_only: args.header_only,
            show_imports: args.show_imports,
            line_links: args.line_links,
            colored: io::stdout().is_terminal(),
        },
    };

    let mut out = io::stdout().lock();
    let mut err = io::stderr().lock();
    for path in &args.paths {
        process_path(&mut out, &mut err, path, &settings)?;
    }
    Ok(())
}

pub fn process_path(
    out: &mut impl Write,
    err: &mut impl Write,
    path: &Path,
    settings: &ExplorerSettings,
) -> io::Result<()> {
    if path.is_file() && is_python_file(path) {
        process_file(out, err, path, settings)?;
    } else if path.is_dir() {
        process_directory(out, err, path, settings)?;
    } else {
        writeln!(out, "Skipping non-Python file: {}", path.display())?;
    }
    Ok(())
}

/// Prints the outline of one file. Parse and read failures are reported on `err` and yield
/// [None].
pub fn process_file(
    out: &mut impl Write,
    err: &mut impl Write,
    path: &Path,
    settings: &ExplorerSettings,
) -> io::Result<Option<summary::FileSummary>> {
    match summarize_file(path) {
        Ok(mut summary) => {
            summary.sort(settings.order);
            write_summary(out, &summary, &settings.output)?;
            Ok(Some(summary))
        }
        Err(e) => {
            warn!("Failed to summarize {path:?} {e:?}");
            writeln!(err, "Error processing {}: {e:#}", path.display())?;
            Ok(None)
        }
    }
}

/// Processes the Python files directly inside `dir` in name order, followed by their totals.
pub fn process_directory(
    out: &mut impl Write,
    err: &mut impl Write,
    dir: &Path,
    settings: &ExplorerSettings,
) -> io::Result<Totals> {
    let mut files = match python_files(dir) {
        Ok(files) => files,
        Err(e) => {
            writeln!(err, "Error processing {}: {e}", dir.display())?;
            Vec::new()
        }
    };
    files.sort();
    debug!("Found {} python files in {dir:?}", files.len());

    let mut totals = Totals::default();
    for file in files {
        writeln!(out)?;
        let summary = process_file(out, err, &file, settings)?;
        totals.add(summary.as_ref());
    }
    write_totals(out, &totals)?;
    Ok(totals)
}

fn python_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_python_file(&path) {
            files.push(path);
        }
    }
    Ok(files)
}

fn is_python_file(path: &Path) -> bool {
    path.extension().is_some_and(|extension| extension == "py")
}
