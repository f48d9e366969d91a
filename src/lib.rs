//! # globber
//!
//! Glob matching and ignore-aware file enumeration with a pluggable
//! filesystem.
//!
//! globber locates filesystem entries matching one or more glob patterns,
//! with optional exclusion via `!`-negation patterns, gitignore-style ignore
//! files, and extra exclusion globs. It owns the glob compiler, the
//! traversal engine, the ignore evaluator, and the orchestration pipeline;
//! the filesystem itself is reached through the [`fs::FileSystem`] trait so
//! tests can substitute a deterministic in-memory tree.
//!
//! # Quick Start
//!
//! ```no_run
//! use globber::{glob, GlobOptions};
//!
//! let options = GlobOptions::builder()
//!     .cwd("/project")
//!     .gitignore(true)
//!     .build();
//!
//! for path in glob(["src/**/*.rs", "!**/generated.rs"], options)? {
//!     println!("{path}");
//! }
//! # Ok::<(), globber::GlobError>(())
//! ```
//!
//! Results are deduplicated and sorted byte-wise ascending; relative output
//! is the default, with `absolute`, directory marking, depth bounds, dotfile
//! policy, and symlink policy available on [`GlobOptions`].
//!
//! # Object mode
//!
//! [`glob_entries`] returns [`GlobEntry`] records carrying the entry's
//! basename and kind flags, plus a frozen stat record when the `stats`
//! option is set:
//!
//! ```no_run
//! use globber::{glob_entries, GlobOptions};
//!
//! let options = GlobOptions::builder().stats(true).build();
//! for entry in glob_entries("**/*.toml", options)? {
//!     let size = entry.stats.map(|s| s.size).unwrap_or(0);
//!     println!("{} ({size} bytes)", entry.path);
//! }
//! # Ok::<(), globber::GlobError>(())
//! ```
//!
//! # Custom filesystems
//!
//! Construct a [`Globber`] over any [`fs::FileSystem`] implementation:
//!
//! ```
//! use std::sync::Arc;
//! use globber::fs::MemoryFileSystem;
//! use globber::{Globber, GlobOptions};
//!
//! let mut mem = MemoryFileSystem::new("/app");
//! mem.add_file("src/lib.rs", "");
//! mem.add_file("src/main.rs", "");
//!
//! let globber = Globber::with_fs(GlobOptions::default(), Arc::new(mem));
//! let hits = globber.glob("src/*.rs").unwrap();
//! assert_eq!(hits, vec!["src/lib.rs", "src/main.rs"]);
//! ```

#![forbid(unsafe_code)]

pub mod fs;

mod entry;
mod error;
mod globber;
mod ignore;
mod options;
mod pattern;
mod paths;
mod walk;

// ── Public re-exports ─────────────────────────────────────────────────────────

pub use entry::{Dirent, EntryStats, GlobEntry};
pub use error::{GlobError, Result};
pub use fs::{FileSystem, GlobFlags};
pub use globber::{GlobStream, Globber, Patterns, Task};
pub use ignore::{IgnoreEvaluator, IgnoreRule};
pub use options::{ExpandDirectories, GlobOptions, GlobOptionsBuilder};
pub use pattern::{escape, is_dynamic, Pattern};
pub use walk::matches_path;

// ── Entry points ──────────────────────────────────────────────────────────────

/// Enumerate paths matching `patterns` under `options`.
///
/// Convenience for [`Globber::glob`] with a one-shot runner.
pub fn glob(patterns: impl Into<Patterns>, options: GlobOptions) -> Result<Vec<String>> {
    Globber::new(options).glob(patterns)
}

/// Enumerate entry records matching `patterns` under `options`.
///
/// Convenience for [`Globber::glob_entries`] with a one-shot runner.
pub fn glob_entries(
    patterns: impl Into<Patterns>,
    options: GlobOptions,
) -> Result<Vec<GlobEntry>> {
    Globber::new(options).glob_entries(patterns)
}

/// Enumerate lazily. Any error [`glob`] would raise is raised here, before
/// the first entry is yielded.
pub fn stream(patterns: impl Into<Patterns>, options: GlobOptions) -> Result<GlobStream> {
    Globber::new(options).stream(patterns)
}
