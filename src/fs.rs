//! Read-only filesystem abstraction.
//!
//! The orchestrator, the traversal engine, and the ignore evaluator all see
//! the filesystem through the [`FileSystem`] trait so that tests can swap in
//! a deterministic in-memory tree. [`OsFileSystem`] binds to the host OS;
//! [`MemoryFileSystem`] is the test double.
//!
//! The shell-style `glob` operation is implemented once, on top of the other
//! trait operations, and shared by both implementations. The original design
//! delegated it to the platform glob call; routing it through the in-repo
//! compiler trades the platform quirks for portable behavior.

use std::collections::{BTreeSet, HashMap};
use std::io;
use std::path::{Path, PathBuf};

use bitflags::bitflags;

use crate::entry::EntryStats;
use crate::error::{GlobError, Result};
use crate::pattern::{self, Pattern};
use crate::paths;

bitflags! {
    /// Options for the shell-style glob operation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct GlobFlags: u32 {
        /// Expand `{a,b,c}` brace patterns before matching.
        const BRACE = 1 << 0;

        /// Append a `/` to each matched directory.
        const MARK = 1 << 1;

        /// Allow wildcards to match names with a leading dot.
        const PERIOD = 1 << 2;

        /// Keep only directories.
        const ONLY_DIR = 1 << 3;

        /// Fold case while matching.
        const CASEFOLD = 1 << 4;
    }
}

/// Uniform read-only view of a filesystem.
///
/// `exists`, `is_file`, and `is_directory` follow symlinks; `is_symlink`
/// does not. `read_file` never fails: unreadable files read as empty.
pub trait FileSystem: Send + Sync {
    /// The process working directory.
    fn cwd(&self) -> PathBuf;

    fn exists(&self, path: &Path) -> bool;

    fn is_file(&self, path: &Path) -> bool;

    fn is_directory(&self, path: &Path) -> bool;

    fn is_symlink(&self, path: &Path) -> bool;

    /// Child names of a directory, in unspecified order.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<String>>;

    /// File contents, or the empty string on any error.
    fn read_file(&self, path: &Path) -> String;

    /// Canonical absolute path, or `None` when it cannot be resolved.
    fn realpath(&self, path: &Path) -> Option<PathBuf>;

    fn stat(&self, path: &Path) -> io::Result<EntryStats>;

    /// Shell-style glob rooted at `cwd()` for relative patterns.
    fn glob(&self, pattern: &str, flags: GlobFlags) -> Vec<PathBuf>;
}

// ---------------------------------------------------------------------------
// Strict helpers
// ---------------------------------------------------------------------------

/// Read a file, failing loudly instead of returning an empty string.
pub fn read_file_strict(fs: &dyn FileSystem, path: &Path) -> Result<String> {
    if !fs.exists(path) {
        return Err(GlobError::FileNotFound(path.to_path_buf()));
    }
    if !fs.is_file(path) {
        return Err(GlobError::FileUnreadable(path.to_path_buf()));
    }
    Ok(fs.read_file(path))
}

/// Require that a path is an existing directory.
pub fn require_directory(fs: &dyn FileSystem, path: &Path) -> Result<()> {
    if !fs.is_directory(path) {
        return Err(GlobError::PathNotDirectory(path.to_path_buf()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Shared shell-style glob
// ---------------------------------------------------------------------------

/// Segment-wise glob over the trait operations.
///
/// A `**` segment matches any number of intervening directories. Wildcards
/// skip dotted names unless the segment itself starts with a dot or
/// `GlobFlags::PERIOD` is set.
pub(crate) fn shell_glob(fs: &dyn FileSystem, pattern: &str, flags: GlobFlags) -> Vec<PathBuf> {
    let expanded = if flags.contains(GlobFlags::BRACE) {
        pattern::expand_braces(pattern)
    } else {
        vec![pattern.to_string()]
    };

    let mut seen = BTreeSet::new();
    for pat in expanded {
        for hit in glob_one(fs, &pat, flags) {
            seen.insert(hit);
        }
    }

    let mut out = Vec::with_capacity(seen.len());
    for path in seen {
        if flags.contains(GlobFlags::ONLY_DIR) && !fs.is_directory(&path) {
            continue;
        }
        if flags.contains(GlobFlags::MARK) && fs.is_directory(&path) {
            let mut marked = paths::normalize(&path);
            marked.push('/');
            out.push(PathBuf::from(marked));
        } else {
            out.push(path);
        }
    }
    out
}

fn glob_one(fs: &dyn FileSystem, pattern: &str, flags: GlobFlags) -> Vec<PathBuf> {
    let normalized = paths::normalize_str(pattern);
    let (base, rest) = if let Some(stripped) = normalized.strip_prefix('/') {
        (PathBuf::from("/"), stripped.to_string())
    } else {
        (fs.cwd(), normalized)
    };

    let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();
    let mut candidates = vec![base];

    for (idx, segment) in segments.iter().enumerate() {
        let last = idx == segments.len() - 1;
        let mut next = Vec::new();

        if *segment == "**" {
            for cand in &candidates {
                if !last {
                    // Zero or more intervening directories.
                    next.push(cand.clone());
                }
                collect_descendants(fs, cand, last, flags, &mut next);
            }
        } else if pattern::is_dynamic(segment) {
            let matcher =
                Pattern::compile_with(segment, !flags.contains(GlobFlags::CASEFOLD));
            let match_dotted =
                segment.starts_with('.') || flags.contains(GlobFlags::PERIOD);
            for cand in &candidates {
                let Ok(children) = fs.read_dir(cand) else {
                    continue;
                };
                for child in children {
                    if child.starts_with('.') && !match_dotted {
                        continue;
                    }
                    if matcher.matches(&child) {
                        next.push(cand.join(child));
                    }
                }
            }
        } else {
            let literal = unescape(segment);
            for cand in &candidates {
                let path = cand.join(&literal);
                if fs.exists(&path) {
                    next.push(path);
                }
            }
        }

        candidates = next;
        if candidates.is_empty() {
            break;
        }
    }

    candidates
}

/// Collect descendants of `dir` in pre-order: all of them when `everything`
/// is set, otherwise directories only (the `**`-as-intermediate case).
fn collect_descendants(
    fs: &dyn FileSystem,
    dir: &Path,
    everything: bool,
    flags: GlobFlags,
    out: &mut Vec<PathBuf>,
) {
    let Ok(children) = fs.read_dir(dir) else {
        return;
    };
    for child in children {
        if child.starts_with('.') && !flags.contains(GlobFlags::PERIOD) {
            continue;
        }
        let path = dir.join(child);
        let is_dir = fs.is_directory(&path);
        if everything || is_dir {
            out.push(path.clone());
        }
        if is_dir {
            collect_descendants(fs, &path, everything, flags, out);
        }
    }
}

fn unescape(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut chars = segment.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(next) => out.push(next),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

// ---------------------------------------------------------------------------
// OsFileSystem
// ---------------------------------------------------------------------------

/// [`FileSystem`] backed by the host OS.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl OsFileSystem {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for OsFileSystem {
    fn cwd(&self) -> PathBuf {
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_directory(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_symlink(&self, path: &Path) -> bool {
        std::fs::symlink_metadata(path)
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(path)? {
            names.push(entry?.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    fn read_file(&self, path: &Path) -> String {
        std::fs::read_to_string(path).unwrap_or_default()
    }

    fn realpath(&self, path: &Path) -> Option<PathBuf> {
        std::fs::canonicalize(path).ok()
    }

    fn stat(&self, path: &Path) -> io::Result<EntryStats> {
        std::fs::metadata(path).map(|meta| EntryStats::from_metadata(&meta))
    }

    fn glob(&self, pattern: &str, flags: GlobFlags) -> Vec<PathBuf> {
        shell_glob(self, pattern, flags)
    }
}

// ---------------------------------------------------------------------------
// MemoryFileSystem
// ---------------------------------------------------------------------------

/// In-memory [`FileSystem`] for deterministic tests.
///
/// Paths may be given relative to the configured working directory. Parent
/// directories are created implicitly.
///
/// # Example
///
/// ```
/// use globber::fs::{FileSystem, MemoryFileSystem};
/// use std::path::Path;
///
/// let mut mem = MemoryFileSystem::new("/project");
/// mem.add_file("src/lib.rs", "");
/// assert!(mem.is_directory(Path::new("/project/src")));
/// assert!(mem.is_file(Path::new("/project/src/lib.rs")));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    cwd: PathBuf,
    files: HashMap<PathBuf, String>,
    dirs: BTreeSet<PathBuf>,
    symlinks: HashMap<PathBuf, PathBuf>,
}

impl MemoryFileSystem {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        let cwd = cwd.into();
        let mut mem = Self {
            cwd: cwd.clone(),
            ..Self::default()
        };
        mem.add_dir(cwd);
        mem
    }

    fn absolute(&self, path: impl Into<PathBuf>) -> PathBuf {
        let path = path.into();
        if path.is_absolute() {
            path
        } else {
            self.cwd.join(path)
        }
    }

    fn add_parents(&mut self, path: &Path) {
        let mut parent = path.parent();
        while let Some(dir) = parent {
            if dir.as_os_str().is_empty() || !self.dirs.insert(dir.to_path_buf()) {
                break;
            }
            parent = dir.parent();
        }
    }

    pub fn add_dir(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        let path = self.absolute(path);
        self.add_parents(&path);
        self.dirs.insert(path);
        self
    }

    pub fn add_file(&mut self, path: impl Into<PathBuf>, contents: impl Into<String>) -> &mut Self {
        let path = self.absolute(path);
        self.add_parents(&path);
        self.files.insert(path, contents.into());
        self
    }

    /// Register a symlink. A target that is never added stays broken.
    pub fn add_symlink(&mut self, link: impl Into<PathBuf>, target: impl Into<PathBuf>) -> &mut Self {
        let link = self.absolute(link);
        let target = self.absolute(target);
        self.add_parents(&link);
        self.symlinks.insert(link, target);
        self
    }

    /// Follow symlinks, component by component, to the physical path.
    fn resolve(&self, path: &Path) -> Option<PathBuf> {
        let mut resolved = PathBuf::new();
        for component in path.components() {
            resolved.push(component);
            let mut hops = 0;
            while let Some(target) = self.symlinks.get(&resolved) {
                // Bounded hop count keeps link cycles from spinning forever.
                if hops >= 16 {
                    return None;
                }
                resolved = target.clone();
                hops += 1;
            }
        }
        if self.files.contains_key(&resolved) || self.dirs.contains(&resolved) {
            Some(resolved)
        } else {
            None
        }
    }
}

impl FileSystem for MemoryFileSystem {
    fn cwd(&self) -> PathBuf {
        self.cwd.clone()
    }

    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).is_some()
    }

    fn is_file(&self, path: &Path) -> bool {
        self.resolve(path)
            .map(|p| self.files.contains_key(&p))
            .unwrap_or(false)
    }

    fn is_directory(&self, path: &Path) -> bool {
        self.resolve(path)
            .map(|p| self.dirs.contains(&p))
            .unwrap_or(false)
    }

    fn is_symlink(&self, path: &Path) -> bool {
        self.symlinks.contains_key(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<String>> {
        let resolved = self
            .resolve(path)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such directory"))?;
        if !self.dirs.contains(&resolved) {
            return Err(io::Error::new(io::ErrorKind::Other, "not a directory"));
        }

        let mut names = BTreeSet::new();
        for key in self
            .files
            .keys()
            .chain(self.dirs.iter())
            .chain(self.symlinks.keys())
        {
            if key.parent() == Some(resolved.as_path()) {
                if let Some(name) = key.file_name() {
                    names.insert(name.to_string_lossy().into_owned());
                }
            }
        }
        Ok(names.into_iter().collect())
    }

    fn read_file(&self, path: &Path) -> String {
        self.resolve(path)
            .and_then(|p| self.files.get(&p).cloned())
            .unwrap_or_default()
    }

    fn realpath(&self, path: &Path) -> Option<PathBuf> {
        self.resolve(path)
    }

    fn stat(&self, path: &Path) -> io::Result<EntryStats> {
        let resolved = self
            .resolve(path)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such entry"))?;
        let is_file = self.files.contains_key(&resolved);
        Ok(EntryStats {
            size: self.files.get(&resolved).map(|c| c.len() as u64).unwrap_or(0),
            atime: 0,
            mtime: 0,
            ctime: 0,
            mode: if is_file { 0o644 } else { 0o755 },
            uid: 0,
            gid: 0,
            inode: 0,
            nlink: 1,
            is_file,
            is_directory: !is_file,
            is_symlink: self.symlinks.contains_key(path),
        })
    }

    fn glob(&self, pattern: &str, flags: GlobFlags) -> Vec<PathBuf> {
        shell_glob(self, pattern, flags)
    }
}
