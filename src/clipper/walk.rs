use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use glob::{MatchOptions, Pattern};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

const GLOB_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// Files below `base`. Level `0` means only direct children, every extra level allows one more
/// directory hop. Entries whose name starts with a dot are skipped along with their contents.
pub fn find_files_in_dir(base: &Path, level: usize) -> Vec<PathBuf> {
    WalkDir::new(base)
        .min_depth(1)
        .max_depth(level + 1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry))
        .filter_map(|entry| {
            entry
                .inspect_err(|e| warn!("Skipping unreadable entry below {base:?} {e}"))
                .ok()
        })
        .filter(|entry| entry.file_type().is_file())
        .map(DirEntry::into_path)
        .collect()
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

/// Expands one command line path. Patterns matching nothing expand to nothing.
pub fn expand_path_pattern(pattern: &str) -> Result<Vec<PathBuf>> {
    if !pattern.contains(['*', '?', '[']) {
        let path = PathBuf::from(pattern);
        return Ok(if path.exists() { vec![path] } else { vec![] });
    }
    let paths = glob::glob_with(pattern, GLOB_OPTIONS)
        .with_context(|| format!("Invalid path pattern {pattern}"))?
        .filter_map(|path| {
            path.inspect_err(|e| warn!("Skipping unreadable match {e}"))
                .ok()
        })
        .collect();
    Ok(paths)
}

/// Every file named by `patterns`, sorted. Directories contribute their files up to `level`.
pub fn collect_files(patterns: &[String], level: usize) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let expanded = expand_path_pattern(pattern)?;
        if expanded.is_empty() {
            debug!("{pattern} matched nothing");
        }
        for path in expanded {
            if path.is_file() {
                files.push(path);
            } else if path.is_dir() {
                files.extend(find_files_in_dir(&path, level));
            }
        }
    }
    files.sort();
    Ok(files)
}

/// Shell style patterns matched against file names only.
#[derive(Debug, Default)]
pub struct ExcludeSet {
    patterns: Vec<Pattern>,
}

impl ExcludeSet {
    /// Malformed patterns are matched literally.
    pub fn new(raw: &[String]) -> Self {
        let patterns = raw
            .iter()
            .filter_map(|pattern| {
                Pattern::new(pattern)
                    .or_else(|e| {
                        warn!("Pattern {pattern} is malformed ({e}), matching it literally");
                        Pattern::new(&Pattern::escape(pattern))
                    })
                    .ok()
            })
            .collect();
        Self { patterns }
    }

    pub fn excludes(&self, path: &Path) -> bool {
        let Some(name) = path.file_name() else {
            return false;
        };
        let name = name.to_string_lossy();
        self.patterns
            .iter()
            .any(|pattern| pattern.matches(&name))
    }
}

/// Path printed in the header of `file`. With a positive `level` it is relative to the ancestor
/// `level` hops above the parent, as long as the path is deep enough, otherwise to the parent.
/// Leading `./` doesn't count as a level.
pub fn header_path(file: &Path, level: usize) -> PathBuf {
    let file: PathBuf = file
        .components()
        .filter(|component| !matches!(component, Component::CurDir))
        .collect();
    let base = display_base(&file, level);
    file.strip_prefix(base).unwrap_or(&file).to_path_buf()
}

/// Expects a path without `.` components.
fn display_base(file: &Path, level: usize) -> &Path {
    let parent = file.parent().unwrap_or(Path::new(""));
    file.ancestors().skip(1).nth(level).unwrap_or(parent)
}

#[cfg(test)]
mod tests {
    use std::{fs, path::Path};

    use anyhow::Result;
    use tempfile::tempdir;

    use super::{collect_files, display_base, find_files_in_dir, header_path, ExcludeSet};

    fn touch(path: &Path) -> Result<()> {
        fs::create_dir_all(path.parent().unwrap())?;
        fs::write(path, "x")?;
        Ok(())
    }

    fn tree() -> Result<tempfile::TempDir> {
        let dir = tempdir()?;
        let root = dir.path();
        touch(&root.join("a.txt"))?;
        touch(&root.join(".DS_Store"))?;
        touch(&root.join("src/main.rs"))?;
        touch(&root.join("src/deep/inner.rs"))?;
        touch(&root.join(".git/config"))?;
        Ok(dir)
    }

    fn names(base: &Path, files: Vec<std::path::PathBuf>) -> Vec<String> {
        files
            .iter()
            .map(|f| f.strip_prefix(base).unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn level_zero_lists_only_direct_files() -> Result<()> {
        let dir = tree()?;
        let found = find_files_in_dir(dir.path(), 0);
        assert_eq!(names(dir.path(), found), vec!["a.txt"]);
        Ok(())
    }

    #[test]
    fn levels_limit_directory_hops_and_skip_hidden() -> Result<()> {
        let dir = tree()?;
        let one = names(dir.path(), find_files_in_dir(dir.path(), 1));
        assert_eq!(one, vec!["a.txt", "src/main.rs"]);

        let two = names(dir.path(), find_files_in_dir(dir.path(), 2));
        assert_eq!(two, vec!["a.txt", "src/deep/inner.rs", "src/main.rs"]);
        assert!(two.iter().all(|name| !name.contains(".git") && !name.contains(".DS")));
        Ok(())
    }

    #[test]
    fn collect_expands_globs_and_sorts() -> Result<()> {
        let dir = tree()?;
        let pattern = format!("{}/src/*.rs", dir.path().display());
        let literal = dir.path().join("a.txt").display().to_string();
        let missing = dir.path().join("nope.txt").display().to_string();

        let files = collect_files(&[pattern, literal, missing], 0)?;

        assert_eq!(names(dir.path(), files), vec!["a.txt", "src/main.rs"]);
        Ok(())
    }

    #[test]
    fn excludes_match_file_names() {
        let excludes = ExcludeSet::new(&["*.json".to_owned(), "[".to_owned()]);
        assert!(excludes.excludes(Path::new("dir/package.json")));
        assert!(excludes.excludes(Path::new("weird/[")));
        assert!(!excludes.excludes(Path::new("json/readme.md")));
    }

    #[test]
    fn display_base_climbs_levels_when_deep_enough() {
        let file = Path::new("project/src/deep/inner.rs");
        assert_eq!(display_base(file, 0), Path::new("project/src/deep"));
        assert_eq!(display_base(file, 1), Path::new("project/src"));
        assert_eq!(display_base(file, 2), Path::new("project"));
        assert_eq!(display_base(Path::new("a/b.rs"), 3), Path::new("a"));
    }

    #[test]
    fn leading_current_dir_is_not_a_level() {
        let file = Path::new("./src/main.rs");
        assert_eq!(header_path(file, 0), Path::new("main.rs"));
        assert_eq!(header_path(file, 1), Path::new("src/main.rs"));
        assert_eq!(header_path(file, 2), Path::new("main.rs"));
        assert_eq!(header_path(Path::new("./a.txt"), 2), Path::new("a.txt"));
        assert_eq!(
            header_path(Path::new("./project/src/deep/inner.rs"), 2),
            Path::new("src/deep/inner.rs")
        );
    }
}
