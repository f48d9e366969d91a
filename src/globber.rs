//! Request orchestration.
//!
//! [`Globber`] normalizes pattern input, partitions negations, expands
//! directory shorthands, runs the traversal per positive pattern, applies
//! the exclusion layers (negatives, ignore files, extra globs), filters by
//! type, and finalizes paths: directory marks, absolute or relative form,
//! dedup, byte-wise sort.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;
use serde_json::Value;

use crate::entry::{Dirent, GlobEntry};
use crate::error::{GlobError, Result};
use crate::fs::{FileSystem, OsFileSystem};
use crate::ignore::IgnoreEvaluator;
use crate::options::{ExpandDirectories, GlobOptions};
use crate::paths;
use crate::walk;

// ---------------------------------------------------------------------------
// Pattern input
// ---------------------------------------------------------------------------

/// Pattern input: a single pattern or a list of them.
///
/// Typed callers convert implicitly via `From`; loose callers go through
/// [`Patterns::from_value`], which rejects non-string input with a typed
/// error.
#[derive(Debug, Clone)]
pub struct Patterns(Vec<String>);

impl Patterns {
    /// Coerce a JSON value: a string becomes a one-element list, an array
    /// must contain only strings.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(Self(vec![s.clone()])),
            Value::Array(items) => {
                let mut patterns = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::String(s) => patterns.push(s.clone()),
                        other => {
                            return Err(GlobError::InvalidPatternType(json_kind(other)))
                        }
                    }
                }
                Ok(Self(patterns))
            }
            other => Err(GlobError::InvalidPatternType(json_kind(other))),
        }
    }

    fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl From<&str> for Patterns {
    fn from(pattern: &str) -> Self {
        Self(vec![pattern.to_string()])
    }
}

impl From<String> for Patterns {
    fn from(pattern: String) -> Self {
        Self(vec![pattern])
    }
}

impl From<Vec<String>> for Patterns {
    fn from(patterns: Vec<String>) -> Self {
        Self(patterns)
    }
}

impl From<Vec<&str>> for Patterns {
    fn from(patterns: Vec<&str>) -> Self {
        Self(patterns.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for Patterns {
    fn from(patterns: &[&str]) -> Self {
        Self(patterns.iter().map(|p| p.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Patterns {
    fn from(patterns: [&str; N]) -> Self {
        Self(patterns.iter().map(|p| p.to_string()).collect())
    }
}

fn json_kind(value: &Value) -> String {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
    .to_string()
}

// ---------------------------------------------------------------------------
// Task and stream
// ---------------------------------------------------------------------------

/// The work one request implies, without running it.
#[derive(Debug, Clone)]
pub struct Task {
    /// Positive patterns after directory expansion.
    pub patterns: Vec<String>,
    /// Negative patterns, `!` stripped.
    pub negative: Vec<String>,
    pub options: GlobOptions,
}

/// Lazy, single-pass sequence of matched entries.
///
/// Any error the eager form would raise is raised before the stream exists;
/// consumers cancel by dropping it.
pub struct GlobStream {
    inner: std::vec::IntoIter<GlobEntry>,
}

impl Iterator for GlobStream {
    type Item = GlobEntry;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for GlobStream {}

// ---------------------------------------------------------------------------
// Globber
// ---------------------------------------------------------------------------

/// A configured glob request runner.
///
/// One instance serves one caller at a time; create one per worker when
/// parallelizing. The ignore-rule cache lives and dies with the instance.
///
/// # Example
///
/// ```no_run
/// use globber::{Globber, GlobOptions};
///
/// let globber = Globber::new(GlobOptions::builder().gitignore(true).build());
/// for path in globber.glob("src/**/*.rs")? {
///     println!("{path}");
/// }
/// # Ok::<(), globber::GlobError>(())
/// ```
pub struct Globber {
    fs: Arc<dyn FileSystem>,
    options: GlobOptions,
    evaluator: IgnoreEvaluator,
}

impl Globber {
    /// Build a runner over the host filesystem.
    pub fn new(options: GlobOptions) -> Self {
        Self::with_fs(options, Arc::new(OsFileSystem::new()))
    }

    /// Build a runner over a custom filesystem adapter.
    pub fn with_fs(options: GlobOptions, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            evaluator: IgnoreEvaluator::new(Arc::clone(&fs)),
            fs,
            options,
        }
    }

    pub fn options(&self) -> &GlobOptions {
        &self.options
    }

    /// Enumerate matching paths, fully filtered and finalized.
    pub fn glob(&self, patterns: impl Into<Patterns>) -> Result<Vec<String>> {
        self.collect(patterns.into())
    }

    /// Enumerate matching entries with kind flags, plus stats when requested.
    pub fn glob_entries(&self, patterns: impl Into<Patterns>) -> Result<Vec<GlobEntry>> {
        let cwd = self.resolve_cwd()?;
        let cwd_norm = paths::normalize(&cwd);
        let paths_out = self.collect(patterns.into())?;

        let mut entries = Vec::with_capacity(paths_out.len());
        for path in paths_out {
            entries.push(self.make_entry(path, &cwd_norm)?);
        }
        Ok(entries)
    }

    /// Enumerate lazily. Equivalent to [`glob_entries`](Self::glob_entries),
    /// yielded one entry at a time.
    pub fn stream(&self, patterns: impl Into<Patterns>) -> Result<GlobStream> {
        Ok(GlobStream {
            inner: self.glob_entries(patterns)?.into_iter(),
        })
    }

    /// Describe the work a request would do, without touching the tree
    /// beyond cwd resolution and the existence checks expansion needs.
    pub fn generate_tasks(&self, patterns: impl Into<Patterns>) -> Result<Task> {
        let cwd = self.resolve_cwd()?;
        let patterns: Patterns = patterns.into();
        let (positives, negatives) = partition(patterns.into_vec())?;
        let positives = self.expand(positives, &cwd);
        Ok(Task {
            patterns: positives,
            negative: negatives,
            options: self.options.clone(),
        })
    }

    /// Whether `path` is ignored under the cwd's ignore-file neighborhood.
    pub fn is_ignored(&self, path: impl AsRef<Path>) -> bool {
        let Ok(cwd) = self.resolve_cwd() else {
            return false;
        };
        let rules = self.evaluator.collect_for(&cwd, self.options.deep());
        self.evaluator.is_ignored(path.as_ref(), &rules, &cwd)
    }

    /// Whether `path` is ignored under rules from the given ignore files.
    pub fn is_ignored_by_files(&self, path: impl AsRef<Path>, files: &[String]) -> bool {
        let Ok(cwd) = self.resolve_cwd() else {
            return false;
        };
        let rules = self.evaluator.collect_from(files, &cwd);
        self.evaluator.is_ignored(path.as_ref(), &rules, &cwd)
    }

    // ── Pipeline ──────────────────────────────────────────────────────────

    fn collect(&self, patterns: Patterns) -> Result<Vec<String>> {
        let cwd = self.resolve_cwd()?;
        let (positives, negatives) = partition(patterns.into_vec())?;
        let positives = self.expand(positives, &cwd);

        let mut candidates = Vec::new();
        for pattern in &positives {
            candidates.extend(walk::enumerate(
                self.fs.as_ref(),
                pattern,
                &cwd,
                &self.options,
            )?);
        }
        debug!(
            "{} candidates from {} positive patterns",
            candidates.len(),
            positives.len()
        );

        if !negatives.is_empty() {
            candidates.retain(|c| {
                !negatives
                    .iter()
                    .any(|n| walk::matches_path_with(c, n, &cwd, &self.options))
            });
        }

        if self.options.gitignore() {
            let rules = self.evaluator.collect_for(&cwd, self.options.deep());
            candidates.retain(|c| !self.evaluator.is_ignored(Path::new(c), &rules, &cwd));
        }

        if !self.options.ignore_files().is_empty() {
            let rules = self
                .evaluator
                .collect_from(self.options.ignore_files(), &cwd);
            candidates.retain(|c| !self.evaluator.is_ignored(Path::new(c), &rules, &cwd));
        }

        if !self.options.ignore().is_empty() {
            candidates.retain(|c| {
                !self
                    .options
                    .ignore()
                    .iter()
                    .any(|g| walk::matches_path_with(c, g, &cwd, &self.options))
            });
        }

        if self.options.only_files() {
            candidates.retain(|c| self.fs.is_file(Path::new(c)));
        } else if self.options.only_directories() {
            candidates.retain(|c| self.fs.is_directory(Path::new(c)));
        }

        // Broken links abort after filtering, before finalization.
        if self.options.throw_error_on_broken_symbolic_link() {
            for candidate in &candidates {
                let path = Path::new(candidate);
                if self.fs.is_symlink(path) && !self.fs.exists(path) {
                    return Err(GlobError::BrokenSymbolicLink(path.to_path_buf()));
                }
            }
        }

        let cwd_norm = paths::normalize(&cwd);
        let mut finalized = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let mut path = candidate;
            if self.options.mark_directories() && self.fs.is_directory(Path::new(&path)) {
                path.push('/');
            }
            if !self.options.absolute() {
                if let Some(rel) = paths::relative_to(&path, &cwd_norm) {
                    if !rel.is_empty() {
                        path = rel.to_string();
                    }
                }
            }
            finalized.push(paths::denormalize(&path));
        }

        if self.options.unique() {
            let mut seen = HashSet::with_capacity(finalized.len());
            finalized.retain(|p| seen.insert(p.clone()));
        }
        finalized.sort_unstable();
        Ok(finalized)
    }

    fn resolve_cwd(&self) -> Result<PathBuf> {
        let configured = self
            .options
            .cwd()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.fs.cwd());
        self.fs
            .realpath(&configured)
            .filter(|p| self.fs.is_directory(p))
            .ok_or(GlobError::DirectoryNotFound(configured))
    }

    /// Rewrite positive patterns that name an existing directory.
    fn expand(&self, positives: Vec<String>, cwd: &Path) -> Vec<String> {
        let mut out = Vec::with_capacity(positives.len());
        for pattern in positives {
            if !self.fs.is_directory(&cwd.join(&pattern)) {
                out.push(pattern);
                continue;
            }
            let base = pattern.trim_end_matches('/');
            match self.options.expand_directories() {
                ExpandDirectories::Disabled => out.push(pattern),
                ExpandDirectories::Enabled => out.push(format!("{base}/**/*")),
                ExpandDirectories::Matching { files, extensions } => {
                    if files.is_empty() && extensions.is_empty() {
                        out.push(format!("{base}/**/*"));
                        continue;
                    }
                    for file in files {
                        out.push(format!("{base}/**/{file}"));
                    }
                    for ext in extensions {
                        out.push(format!("{base}/**/*.{ext}"));
                    }
                }
            }
        }
        out
    }

    fn make_entry(&self, path: String, cwd_norm: &str) -> Result<GlobEntry> {
        let normalized = paths::normalize_str(&path);
        let trimmed = normalized.trim_end_matches('/');
        let physical = if Path::new(trimmed).is_absolute() {
            PathBuf::from(trimmed)
        } else {
            PathBuf::from(format!("{}/{}", cwd_norm.trim_end_matches('/'), trimmed))
        };

        let dirent = if self.fs.is_symlink(&physical) {
            Dirent::symlink()
        } else if self.fs.is_directory(&physical) {
            Dirent::directory()
        } else {
            Dirent::file()
        };

        let stats = if self.options.stats() {
            Some(
                self.fs
                    .stat(&physical)
                    .map_err(|_| GlobError::CannotStatFile(physical.clone()))?,
            )
        } else {
            None
        };

        Ok(GlobEntry {
            name: paths::basename(&normalized).to_string(),
            path,
            dirent: Some(dirent),
            stats,
        })
    }
}

/// Split raw patterns into positives and `!`-stripped negatives.
///
/// A request of only negatives gets the universal positive `**/*`.
fn partition(patterns: Vec<String>) -> Result<(Vec<String>, Vec<String>)> {
    let mut positives = Vec::new();
    let mut negatives = Vec::new();
    for pattern in patterns {
        if pattern.is_empty() {
            return Err(GlobError::InvalidPattern(pattern));
        }
        match pattern.strip_prefix('!') {
            Some(rest) => negatives.push(rest.to_string()),
            None => positives.push(pattern),
        }
    }
    if positives.is_empty() && !negatives.is_empty() {
        positives.push("**/*".to_string());
    }
    Ok((positives, negatives))
}
