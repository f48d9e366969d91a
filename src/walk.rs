//! Pattern-driven enumeration of filesystem entries.
//!
//! One of three strategies applies per pattern:
//!
//! 1. absolute patterns delegate to the filesystem's shell-style glob;
//! 2. patterns containing `**` drive a pre-order recursive descent from the
//!    directory named by the pattern prefix;
//! 3. everything else delegates to the shell-style glob under the request
//!    cwd, with a second dotted-basename pass when `dot` is set.
//!
//! Results are absolute `/`-normalized strings in unspecified order; the
//! orchestrator owns final ordering.

use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{GlobError, Result};
use crate::fs::{FileSystem, GlobFlags};
use crate::options::GlobOptions;
use crate::pattern::Pattern;
use crate::paths;

/// Enumerate entries under `root` matching `pattern`.
pub(crate) fn enumerate(
    fs: &dyn FileSystem,
    pattern: &str,
    root: &Path,
    options: &GlobOptions,
) -> Result<Vec<String>> {
    let mut normalized = paths::normalize_str(pattern);

    if normalized.starts_with('/') {
        let mut flags = GlobFlags::BRACE;
        if options.dot() {
            flags |= GlobFlags::PERIOD;
        }
        if !options.case_sensitive_match() {
            flags |= GlobFlags::CASEFOLD;
        }
        return Ok(collect_glob(fs, &normalized, flags));
    }

    // Basename matching lifts a slashless pattern to any depth.
    if options.base_name_match() && !normalized.contains('/') && !normalized.contains("**") {
        normalized = format!("**/{normalized}");
    }

    if let Some(idx) = normalized.find("**") {
        return enumerate_globstar(fs, &normalized, idx, root, options);
    }

    enumerate_simple(fs, &normalized, root, options)
}

fn collect_glob(fs: &dyn FileSystem, pattern: &str, flags: GlobFlags) -> Vec<String> {
    fs.glob(pattern, flags)
        .iter()
        .map(|p| paths::normalize(p))
        .collect()
}

// ---------------------------------------------------------------------------
// Simple patterns
// ---------------------------------------------------------------------------

fn enumerate_simple(
    fs: &dyn FileSystem,
    pattern: &str,
    root: &Path,
    options: &GlobOptions,
) -> Result<Vec<String>> {
    let mut flags = GlobFlags::BRACE;
    if !options.case_sensitive_match() {
        flags |= GlobFlags::CASEFOLD;
    }

    let rooted = format!(
        "{}/{}",
        paths::normalize(root).trim_end_matches('/'),
        pattern
    );
    let mut hits = collect_glob(fs, &rooted, flags);

    if options.dot() {
        if let Some(dotted) = prepend_dot_to_basename(&rooted) {
            hits.extend(collect_glob(fs, &dotted, flags));
        }
    }
    Ok(hits)
}

/// `a/b/*.txt` becomes `a/b/.*.txt`; patterns already dotted are left alone.
fn prepend_dot_to_basename(pattern: &str) -> Option<String> {
    let (dir, base) = pattern.rsplit_once('/')?;
    if base.starts_with('.') {
        return None;
    }
    Some(format!("{dir}/.{base}"))
}

// ---------------------------------------------------------------------------
// Globstar patterns
// ---------------------------------------------------------------------------

fn enumerate_globstar(
    fs: &dyn FileSystem,
    pattern: &str,
    star_idx: usize,
    root: &Path,
    options: &GlobOptions,
) -> Result<Vec<String>> {
    let prefix = pattern[..star_idx].trim_end_matches('/');
    let suffix = pattern[star_idx + 2..].trim_start_matches('/');

    let root_norm = paths::normalize(root);
    let base = if prefix.is_empty() {
        root_norm
    } else {
        format!("{}/{}", root_norm.trim_end_matches('/'), prefix)
    };
    let base = PathBuf::from(base);
    if !fs.is_directory(&base) {
        return Ok(Vec::new());
    }

    let mut visited = Vec::new();
    visit(fs, &base, "", options.deep(), options, &mut visited)?;

    // A bare or `*` suffix keeps every traversed entry.
    if suffix.is_empty() || suffix == "*" {
        return Ok(visited.into_iter().map(|(abs, _)| abs).collect());
    }

    let case_sensitive = options.case_sensitive_match();
    let name_matcher = Pattern::compile_with(suffix, case_sensitive);
    let tail_matcher = Pattern::compile_with(&format!("*/{suffix}"), case_sensitive);

    Ok(visited
        .into_iter()
        .filter(|(abs, rel)| {
            name_matcher.matches(paths::basename(abs)) || tail_matcher.matches(rel)
        })
        .map(|(abs, _)| abs)
        .collect())
}

/// Pre-order walk pushing `(absolute, base-relative)` pairs.
///
/// `remaining` of zero stops the descent below the current directory, so a
/// `deep` of k emits paths at most k separators past the base.
fn visit(
    fs: &dyn FileSystem,
    dir: &Path,
    rel_prefix: &str,
    remaining: Option<usize>,
    options: &GlobOptions,
    out: &mut Vec<(String, String)>,
) -> Result<()> {
    let children = match fs.read_dir(dir) {
        Ok(children) => children,
        Err(source) => {
            if options.suppress_errors() {
                debug!("suppressed traversal error under {}: {source}", dir.display());
                return Ok(());
            }
            return Err(GlobError::Io {
                path: dir.to_path_buf(),
                source,
            });
        }
    };

    for name in children {
        if name.starts_with('.') && !options.dot() {
            continue;
        }
        let path = dir.join(&name);
        let rel = if rel_prefix.is_empty() {
            name.clone()
        } else {
            format!("{rel_prefix}/{name}")
        };
        out.push((paths::normalize(&path), rel.clone()));

        if fs.is_directory(&path) {
            if fs.is_symlink(&path) && !options.follow_symbolic_links() {
                continue;
            }
            match remaining {
                Some(0) => {}
                Some(n) => visit(fs, &path, &rel, Some(n - 1), options, out)?,
                None => visit(fs, &path, &rel, None, options, out)?,
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// matches_path
// ---------------------------------------------------------------------------

/// Test a path against a pattern, relativizing against `root` first.
///
/// When `path` is a descendant of `root` the pattern sees the relative form;
/// otherwise it sees the full normalized path. `**` forms are recognized.
///
/// # Example
///
/// ```
/// use globber::matches_path;
///
/// assert!(matches_path("/work/src/lib.rs", "src/**/*.rs", "/work"));
/// assert!(matches_path("/elsewhere/x.rs", "/elsewhere/*.rs", "/work"));
/// ```
pub fn matches_path(path: impl AsRef<Path>, pattern: &str, root: impl AsRef<Path>) -> bool {
    matches_path_with(
        &paths::normalize(path.as_ref()),
        pattern,
        root.as_ref(),
        &GlobOptions::default(),
    )
}

pub(crate) fn matches_path_with(
    path: &str,
    pattern: &str,
    root: &Path,
    options: &GlobOptions,
) -> bool {
    let root_norm = paths::normalize(root);
    let mut candidate = paths::relative_to(path, &root_norm).unwrap_or(path);
    if options.base_name_match() && !pattern.contains('/') {
        candidate = paths::basename(candidate);
    }
    Pattern::compile_with(pattern, options.case_sensitive_match()).matches(candidate)
}
