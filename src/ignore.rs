//! Ignore-file collection and evaluation.
//!
//! Files follow the widely-deployed path-ignore convention: `#` comments,
//! blank lines, `!` negation, a trailing `/` for directory-only rules, and
//! slashless patterns matching at any depth. Rules keep their source order;
//! for a given path the last matching rule wins.
//!
//! Parse failures and filesystem errors during collection are swallowed: a
//! broken ignore file contributes no rules, never an error.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;

use crate::fs::{FileSystem, GlobFlags};
use crate::pattern::{self, Pattern};
use crate::paths;

pub(crate) const IGNORE_FILE_NAME: &str = ".gitignore";
const REPOSITORY_MARKER: &str = ".git";

/// One parsed rule from an ignore file.
///
/// `base_dir` is the directory containing the file that produced the rule;
/// anchored patterns are evaluated relative to it.
#[derive(Debug, Clone)]
pub struct IgnoreRule {
    pattern: String,
    negated: bool,
    directory_only: bool,
    base_dir: PathBuf,
    path_matcher: Pattern,
    basename_matcher: Option<Pattern>,
}

impl IgnoreRule {
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn negated(&self) -> bool {
        self.negated
    }

    pub fn directory_only(&self) -> bool {
        self.directory_only
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

/// Collects rules from a path neighborhood and decides inclusion per path.
///
/// Parsed files are cached by absolute path for the life of the evaluator,
/// so no ignore file is read twice within one request.
pub struct IgnoreEvaluator {
    fs: Arc<dyn FileSystem>,
    cache: RefCell<HashMap<PathBuf, Vec<IgnoreRule>>>,
}

impl IgnoreEvaluator {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Gather rules for `cwd`'s neighborhood.
    ///
    /// Ancestor files (inside a repository) come first, repository root
    /// outward, then `cwd`'s own file, then files found by descending the
    /// subtree under the `deep` bound. Later rules override earlier ones,
    /// so deeper files take precedence over shallower ones.
    pub fn collect_for(&self, cwd: &Path, deep: Option<usize>) -> Vec<IgnoreRule> {
        let mut rules = Vec::new();

        // Ancestors apply only when cwd sits strictly inside a repository;
        // at the repository root itself there is nothing above to consult.
        if let Some(repo_root) = self.repository_root(cwd) {
            if repo_root != cwd {
                let mut ancestors = Vec::new();
                let mut current = cwd.parent();
                while let Some(dir) = current {
                    ancestors.push(dir.to_path_buf());
                    if dir == repo_root {
                        break;
                    }
                    current = dir.parent();
                }
                for dir in ancestors.iter().rev() {
                    rules.extend(self.rules_for_file(&dir.join(IGNORE_FILE_NAME)));
                }
            }
        }

        let own = cwd.join(IGNORE_FILE_NAME);
        rules.extend(self.rules_for_file(&own));

        let mut found = Vec::new();
        self.scan_subtree(cwd, deep, &mut found);
        for file in found {
            if file != own {
                rules.extend(self.rules_for_file(&file));
            }
        }

        rules
    }

    /// Gather rules from explicitly configured ignore files.
    ///
    /// Each entry is either a literal filename looked up in `cwd` or a glob
    /// resolved through the filesystem abstraction. Every match is parsed
    /// relative to its own containing directory.
    pub fn collect_from(&self, file_patterns: &[String], cwd: &Path) -> Vec<IgnoreRule> {
        let mut rules = Vec::new();
        for file_pattern in file_patterns {
            if pattern::is_dynamic(file_pattern) {
                let normalized = paths::normalize_str(file_pattern);
                let rooted = if normalized.starts_with('/') {
                    normalized
                } else {
                    format!(
                        "{}/{}",
                        paths::normalize(cwd).trim_end_matches('/'),
                        normalized
                    )
                };
                for hit in self.fs.glob(&rooted, GlobFlags::BRACE) {
                    rules.extend(self.rules_for_file(&hit));
                }
            } else {
                rules.extend(self.rules_for_file(&cwd.join(file_pattern)));
            }
        }
        rules
    }

    /// Decide whether `path` is ignored under `rules`.
    ///
    /// Rules are applied in order; each match flips the verdict to the
    /// rule's polarity, so the last matching rule decides.
    pub fn is_ignored(&self, path: &Path, rules: &[IgnoreRule], cwd: &Path) -> bool {
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            cwd.join(path)
        };
        let path_norm = paths::normalize(&path);
        let name = paths::basename(&path_norm);

        let mut ignored = false;
        for rule in rules {
            // Rules govern only the subtree below their own ignore file.
            let base_norm = paths::normalize(&rule.base_dir);
            let Some(candidate) = paths::relative_to(&path_norm, &base_norm) else {
                continue;
            };

            let mut hit = rule.path_matcher.matches(candidate)
                || rule
                    .basename_matcher
                    .as_ref()
                    .is_some_and(|m| m.matches(name));
            if hit && rule.directory_only && !self.fs.is_directory(&path) {
                hit = false;
            }
            if hit {
                ignored = !rule.negated;
            }
        }
        ignored
    }

    /// Closest ancestor (inclusive) carrying a repository marker.
    fn repository_root(&self, cwd: &Path) -> Option<PathBuf> {
        let mut current = Some(cwd);
        while let Some(dir) = current {
            if self.fs.exists(&dir.join(REPOSITORY_MARKER)) {
                return Some(dir.to_path_buf());
            }
            current = dir.parent();
        }
        None
    }

    /// Parse one ignore file, through the cache.
    fn rules_for_file(&self, file: &Path) -> Vec<IgnoreRule> {
        if let Some(cached) = self.cache.borrow().get(file) {
            return cached.clone();
        }
        let rules = if self.fs.is_file(file) {
            let base_dir = file.parent().unwrap_or_else(|| Path::new("/"));
            parse(&self.fs.read_file(file), base_dir)
        } else {
            debug!("no ignore file at {}", file.display());
            Vec::new()
        };
        self.cache
            .borrow_mut()
            .insert(file.to_path_buf(), rules.clone());
        rules
    }

    /// Pre-order scan for ignore files below `dir`, swallowing errors.
    fn scan_subtree(&self, dir: &Path, remaining: Option<usize>, out: &mut Vec<PathBuf>) {
        let Ok(children) = self.fs.read_dir(dir) else {
            return;
        };
        for name in children {
            let path = dir.join(&name);
            if name == IGNORE_FILE_NAME && self.fs.is_file(&path) {
                out.push(path);
            } else if name != REPOSITORY_MARKER && self.fs.is_directory(&path) {
                match remaining {
                    Some(0) => {}
                    Some(n) => self.scan_subtree(&path, Some(n - 1), out),
                    None => self.scan_subtree(&path, None, out),
                }
            }
        }
    }
}

/// Parse ignore-file contents into rules based at `base_dir`.
fn parse(content: &str, base_dir: &Path) -> Vec<IgnoreRule> {
    let mut rules = Vec::new();
    for line in content.split('\n') {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (negated, line) = match line.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, line),
        };
        let (directory_only, line) = match line.strip_suffix('/') {
            Some(rest) => (true, rest),
            None => (false, line),
        };
        if line.is_empty() {
            continue;
        }

        // Slashless patterns match at any depth; anchored ones are relative
        // to the ignore file's directory.
        let anchored = line.contains('/');
        let path_pattern = if anchored {
            line.trim_start_matches('/').to_string()
        } else {
            format!("**/{line}")
        };

        rules.push(IgnoreRule {
            pattern: line.to_string(),
            negated,
            directory_only,
            base_dir: base_dir.to_path_buf(),
            path_matcher: Pattern::compile(&path_pattern),
            basename_matcher: (!anchored).then(|| Pattern::compile(line)),
        });
    }
    rules
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFileSystem;

    fn evaluator(mem: MemoryFileSystem) -> IgnoreEvaluator {
        IgnoreEvaluator::new(Arc::new(mem))
    }

    #[test]
    fn parse_skips_comments_and_blanks() {
        let rules = parse("# build output\n\n  \ntarget/\n*.log\n!keep.log\n", Path::new("/r"));
        assert_eq!(rules.len(), 3);
        assert_eq!(rules[0].pattern(), "target");
        assert!(rules[0].directory_only());
        assert_eq!(rules[1].pattern(), "*.log");
        assert!(!rules[1].negated());
        assert!(rules[2].negated());
        assert_eq!(rules[2].base_dir(), Path::new("/r"));
    }

    #[test]
    fn slashless_rules_match_at_any_depth() {
        let mut mem = MemoryFileSystem::new("/r");
        mem.add_file("a/b/debug.log", "");
        let eval = evaluator(mem);
        let rules = parse("*.log\n", Path::new("/r"));

        assert!(eval.is_ignored(Path::new("/r/debug.log"), &rules, Path::new("/r")));
        assert!(eval.is_ignored(Path::new("/r/a/b/debug.log"), &rules, Path::new("/r")));
        assert!(!eval.is_ignored(Path::new("/r/debug.txt"), &rules, Path::new("/r")));
    }

    #[test]
    fn anchored_rules_bind_to_the_base_directory() {
        let mut mem = MemoryFileSystem::new("/r");
        mem.add_file("build/out.o", "");
        mem.add_file("sub/build/out.o", "");
        let eval = evaluator(mem);
        let rules = parse("build/*.o\n", Path::new("/r"));

        assert!(eval.is_ignored(Path::new("/r/build/out.o"), &rules, Path::new("/r")));
        assert!(!eval.is_ignored(Path::new("/r/sub/build/out.o"), &rules, Path::new("/r")));
    }

    #[test]
    fn later_rules_override_earlier_ones() {
        let mem = MemoryFileSystem::new("/r");
        let eval = evaluator(mem);
        let rules = parse("*.log\n!important.log\n", Path::new("/r"));

        assert!(eval.is_ignored(Path::new("/r/debug.log"), &rules, Path::new("/r")));
        assert!(!eval.is_ignored(Path::new("/r/important.log"), &rules, Path::new("/r")));

        // Reversed order, reversed verdict.
        let rules = parse("!important.log\n*.log\n", Path::new("/r"));
        assert!(eval.is_ignored(Path::new("/r/important.log"), &rules, Path::new("/r")));
    }

    #[test]
    fn directory_only_rules_require_a_directory() {
        let mut mem = MemoryFileSystem::new("/r");
        mem.add_dir("build");
        mem.add_file("docs/build", "");
        let eval = evaluator(mem);
        let rules = parse("build/\n", Path::new("/r"));

        assert!(eval.is_ignored(Path::new("/r/build"), &rules, Path::new("/r")));
        assert!(!eval.is_ignored(Path::new("/r/docs/build"), &rules, Path::new("/r")));
    }

    #[test]
    fn collect_for_layers_ancestors_cwd_and_subtree() {
        let mut mem = MemoryFileSystem::new("/repo/app");
        mem.add_dir("/repo/.git");
        mem.add_file("/repo/.gitignore", "*.log\n");
        mem.add_file("/repo/app/.gitignore", "!keep.log\n");
        mem.add_file("/repo/app/vendor/.gitignore", "*.tmp\n");
        let eval = evaluator(mem);

        let rules = eval.collect_for(Path::new("/repo/app"), None);
        let patterns: Vec<&str> = rules.iter().map(|r| r.pattern()).collect();
        assert_eq!(patterns, vec!["*.log", "keep.log", "*.tmp"]);
        // Deeper negation overrides the ancestor rule.
        assert!(!eval.is_ignored(Path::new("/repo/app/keep.log"), &rules, Path::new("/repo/app")));
        assert!(eval.is_ignored(Path::new("/repo/app/debug.log"), &rules, Path::new("/repo/app")));
    }

    #[test]
    fn collect_for_outside_a_repository_skips_ancestors() {
        let mut mem = MemoryFileSystem::new("/plain/dir");
        mem.add_file("/plain/.gitignore", "*.log\n");
        mem.add_file("/plain/dir/.gitignore", "*.tmp\n");
        let eval = evaluator(mem);

        let rules = eval.collect_for(Path::new("/plain/dir"), None);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].pattern(), "*.tmp");
    }

    #[test]
    fn collect_for_at_the_repository_root_skips_outside_files() {
        let mut mem = MemoryFileSystem::new("/a/repo");
        mem.add_dir("/a/repo/.git");
        mem.add_file("/a/.gitignore", "*.log\n");
        mem.add_file("/a/repo/.gitignore", "*.tmp\n");
        let eval = evaluator(mem);

        let rules = eval.collect_for(Path::new("/a/repo"), None);
        let patterns: Vec<&str> = rules.iter().map(|r| r.pattern()).collect();
        assert_eq!(patterns, vec!["*.tmp"]);
        assert!(!eval.is_ignored(
            Path::new("/a/repo/debug.log"),
            &rules,
            Path::new("/a/repo")
        ));
    }

    #[test]
    fn collect_for_honors_the_depth_bound() {
        let mut mem = MemoryFileSystem::new("/r");
        mem.add_file("a/.gitignore", "*.a\n");
        mem.add_file("a/b/.gitignore", "*.b\n");
        let eval = evaluator(mem);

        let all = eval.collect_for(Path::new("/r"), None);
        assert_eq!(all.len(), 2);

        let shallow = eval.collect_for(Path::new("/r"), Some(1));
        assert_eq!(shallow.len(), 1);
        assert_eq!(shallow[0].pattern(), "*.a");
    }

    #[test]
    fn collect_from_accepts_literals_and_globs() {
        let mut mem = MemoryFileSystem::new("/r");
        mem.add_file(".customignore", "*.bak\n");
        mem.add_file("conf/one.ignore", "*.tmp\n");
        mem.add_file("conf/two.ignore", "*.old\n");
        let eval = evaluator(mem);

        let rules = eval.collect_from(&[".customignore".into()], Path::new("/r"));
        assert_eq!(rules.len(), 1);

        let rules = eval.collect_from(&["conf/*.ignore".into()], Path::new("/r"));
        let patterns: Vec<&str> = rules.iter().map(|r| r.pattern()).collect();
        assert_eq!(patterns, vec!["*.tmp", "*.old"]);

        // Missing files contribute nothing.
        let rules = eval.collect_from(&["absent.ignore".into()], Path::new("/r"));
        assert!(rules.is_empty());
    }
}
