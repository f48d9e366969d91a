//! Request options.
//!
//! [`GlobOptions`] is an immutable bundle of the recognized knobs with fixed
//! defaults. It is built either fluently through [`GlobOptionsBuilder`] or
//! from a loose JSON map via [`GlobOptions::from_value`], which mirrors the
//! untyped configuration surface: values of the wrong shape are silently
//! discarded and the default stays in place.

use std::path::{Path, PathBuf};

use serde_json::Value;

/// Directory-shorthand expansion policy.
///
/// When a positive pattern names an existing directory, the orchestrator
/// rewrites it so the directory's contents are matched instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpandDirectories {
    /// Rewrite `<dir>` to `<dir>/**/*`. The default.
    Enabled,
    /// Leave the pattern unchanged.
    Disabled,
    /// Rewrite to `<dir>/**/<file>` per file and `<dir>/**/*.<ext>` per
    /// extension.
    Matching {
        files: Vec<String>,
        extensions: Vec<String>,
    },
}

/// Immutable options for one glob request.
#[derive(Debug, Clone)]
pub struct GlobOptions {
    cwd: Option<PathBuf>,
    expand_directories: ExpandDirectories,
    gitignore: bool,
    ignore_files: Vec<String>,
    ignore: Vec<String>,
    only_files: bool,
    only_directories: bool,
    dot: bool,
    deep: Option<usize>,
    follow_symbolic_links: bool,
    suppress_errors: bool,
    absolute: bool,
    unique: bool,
    mark_directories: bool,
    case_sensitive_match: bool,
    base_name_match: bool,
    throw_error_on_broken_symbolic_link: bool,
    object_mode: bool,
    stats: bool,
}

impl Default for GlobOptions {
    fn default() -> Self {
        Self {
            cwd: None,
            expand_directories: ExpandDirectories::Enabled,
            gitignore: false,
            ignore_files: Vec::new(),
            ignore: Vec::new(),
            only_files: true,
            only_directories: false,
            dot: false,
            deep: None,
            follow_symbolic_links: true,
            suppress_errors: false,
            absolute: false,
            unique: true,
            mark_directories: false,
            case_sensitive_match: true,
            base_name_match: false,
            throw_error_on_broken_symbolic_link: false,
            object_mode: false,
            stats: false,
        }
    }
}

impl GlobOptions {
    pub fn builder() -> GlobOptionsBuilder {
        GlobOptionsBuilder::default()
    }

    /// Build options from a loose JSON map.
    ///
    /// Keys use the camelCase spelling of the option table. Unknown keys and
    /// values of the wrong shape are ignored.
    ///
    /// # Example
    ///
    /// ```
    /// use globber::GlobOptions;
    /// use serde_json::json;
    ///
    /// let opts = GlobOptions::from_value(&json!({
    ///     "cwd": "/project",
    ///     "onlyDirectories": true,
    ///     "deep": 2,
    ///     "dot": "not-a-bool",
    /// }));
    /// assert!(opts.only_directories());
    /// assert!(!opts.only_files());
    /// assert_eq!(opts.deep(), Some(2));
    /// assert!(!opts.dot());
    /// ```
    pub fn from_value(value: &Value) -> Self {
        let mut b = Self::builder();
        let Some(map) = value.as_object() else {
            return b.build();
        };

        if let Some(cwd) = map.get("cwd").and_then(Value::as_str) {
            b = b.cwd(cwd);
        }
        match map.get("expandDirectories") {
            Some(Value::Bool(true)) => b = b.expand_directories(ExpandDirectories::Enabled),
            Some(Value::Bool(false)) => b = b.expand_directories(ExpandDirectories::Disabled),
            Some(Value::Object(obj)) => {
                b = b.expand_directories(ExpandDirectories::Matching {
                    files: string_list(obj.get("files")),
                    extensions: string_list(obj.get("extensions")),
                });
            }
            _ => {}
        }
        if let Some(v) = map.get("gitignore").and_then(Value::as_bool) {
            b = b.gitignore(v);
        }
        match map.get("ignoreFiles") {
            Some(Value::String(s)) => b = b.ignore_files([s.clone()]),
            Some(list @ Value::Array(_)) => b = b.ignore_files(string_list(Some(list))),
            _ => {}
        }
        if let Some(list @ Value::Array(_)) = map.get("ignore") {
            b = b.ignore(string_list(Some(list)));
        }
        if let Some(v) = map.get("onlyFiles").and_then(Value::as_bool) {
            b = b.only_files(v);
        }
        if let Some(v) = map.get("onlyDirectories").and_then(Value::as_bool) {
            b = b.only_directories(v);
        }
        if let Some(v) = map.get("dot").and_then(Value::as_bool) {
            b = b.dot(v);
        }
        match map.get("deep") {
            Some(Value::Null) => b = b.deep(None),
            Some(Value::Number(n)) => {
                if let Some(n) = n.as_u64() {
                    b = b.deep(Some(n as usize));
                }
            }
            _ => {}
        }
        if let Some(v) = map.get("followSymbolicLinks").and_then(Value::as_bool) {
            b = b.follow_symbolic_links(v);
        }
        if let Some(v) = map.get("suppressErrors").and_then(Value::as_bool) {
            b = b.suppress_errors(v);
        }
        if let Some(v) = map.get("absolute").and_then(Value::as_bool) {
            b = b.absolute(v);
        }
        if let Some(v) = map.get("unique").and_then(Value::as_bool) {
            b = b.unique(v);
        }
        if let Some(v) = map.get("markDirectories").and_then(Value::as_bool) {
            b = b.mark_directories(v);
        }
        if let Some(v) = map.get("caseSensitiveMatch").and_then(Value::as_bool) {
            b = b.case_sensitive_match(v);
        }
        if let Some(v) = map.get("baseNameMatch").and_then(Value::as_bool) {
            b = b.base_name_match(v);
        }
        if let Some(v) = map
            .get("throwErrorOnBrokenSymbolicLink")
            .and_then(Value::as_bool)
        {
            b = b.throw_error_on_broken_symbolic_link(v);
        }
        if let Some(v) = map.get("objectMode").and_then(Value::as_bool) {
            b = b.object_mode(v);
        }
        if let Some(v) = map.get("stats").and_then(Value::as_bool) {
            b = b.stats(v);
        }
        b.build()
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    pub fn expand_directories(&self) -> &ExpandDirectories {
        &self.expand_directories
    }

    pub fn gitignore(&self) -> bool {
        self.gitignore
    }

    pub fn ignore_files(&self) -> &[String] {
        &self.ignore_files
    }

    pub fn ignore(&self) -> &[String] {
        &self.ignore
    }

    pub fn only_files(&self) -> bool {
        self.only_files
    }

    pub fn only_directories(&self) -> bool {
        self.only_directories
    }

    pub fn dot(&self) -> bool {
        self.dot
    }

    pub fn deep(&self) -> Option<usize> {
        self.deep
    }

    pub fn follow_symbolic_links(&self) -> bool {
        self.follow_symbolic_links
    }

    pub fn suppress_errors(&self) -> bool {
        self.suppress_errors
    }

    pub fn absolute(&self) -> bool {
        self.absolute
    }

    pub fn unique(&self) -> bool {
        self.unique
    }

    pub fn mark_directories(&self) -> bool {
        self.mark_directories
    }

    pub fn case_sensitive_match(&self) -> bool {
        self.case_sensitive_match
    }

    pub fn base_name_match(&self) -> bool {
        self.base_name_match
    }

    pub fn throw_error_on_broken_symbolic_link(&self) -> bool {
        self.throw_error_on_broken_symbolic_link
    }

    pub fn object_mode(&self) -> bool {
        self.object_mode
    }

    pub fn stats(&self) -> bool {
        self.stats
    }
}

// ---------------------------------------------------------------------------
// GlobOptionsBuilder
// ---------------------------------------------------------------------------

/// Fluent constructor for [`GlobOptions`].
///
/// `only_files` and `only_directories` are mutually exclusive: setting one
/// clears the other. `stats` implies `object_mode`.
///
/// # Example
///
/// ```
/// use globber::GlobOptions;
///
/// let opts = GlobOptions::builder()
///     .cwd("/project")
///     .gitignore(true)
///     .only_directories(true)
///     .build();
/// assert!(!opts.only_files());
/// ```
#[derive(Debug, Clone, Default)]
pub struct GlobOptionsBuilder {
    options: GlobOptions,
}

impl GlobOptionsBuilder {
    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.options.cwd = Some(cwd.into());
        self
    }

    pub fn expand_directories(mut self, policy: ExpandDirectories) -> Self {
        self.options.expand_directories = policy;
        self
    }

    pub fn gitignore(mut self, yes: bool) -> Self {
        self.options.gitignore = yes;
        self
    }

    pub fn ignore_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.ignore_files = files.into_iter().map(Into::into).collect();
        self
    }

    pub fn ignore<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.ignore = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn only_files(mut self, yes: bool) -> Self {
        self.options.only_files = yes;
        if yes {
            self.options.only_directories = false;
        }
        self
    }

    pub fn only_directories(mut self, yes: bool) -> Self {
        self.options.only_directories = yes;
        if yes {
            self.options.only_files = false;
        }
        self
    }

    pub fn dot(mut self, yes: bool) -> Self {
        self.options.dot = yes;
        self
    }

    pub fn deep(mut self, depth: Option<usize>) -> Self {
        self.options.deep = depth;
        self
    }

    pub fn follow_symbolic_links(mut self, yes: bool) -> Self {
        self.options.follow_symbolic_links = yes;
        self
    }

    pub fn suppress_errors(mut self, yes: bool) -> Self {
        self.options.suppress_errors = yes;
        self
    }

    pub fn absolute(mut self, yes: bool) -> Self {
        self.options.absolute = yes;
        self
    }

    pub fn unique(mut self, yes: bool) -> Self {
        self.options.unique = yes;
        self
    }

    pub fn mark_directories(mut self, yes: bool) -> Self {
        self.options.mark_directories = yes;
        self
    }

    pub fn case_sensitive_match(mut self, yes: bool) -> Self {
        self.options.case_sensitive_match = yes;
        self
    }

    pub fn base_name_match(mut self, yes: bool) -> Self {
        self.options.base_name_match = yes;
        self
    }

    pub fn throw_error_on_broken_symbolic_link(mut self, yes: bool) -> Self {
        self.options.throw_error_on_broken_symbolic_link = yes;
        self
    }

    pub fn object_mode(mut self, yes: bool) -> Self {
        self.options.object_mode = yes;
        self
    }

    pub fn stats(mut self, yes: bool) -> Self {
        self.options.stats = yes;
        if yes {
            self.options.object_mode = true;
        }
        self
    }

    pub fn build(mut self) -> GlobOptions {
        if self.options.stats {
            self.options.object_mode = true;
        }
        self.options
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
