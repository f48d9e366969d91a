//! Glob pattern compilation.
//!
//! Translates a glob into an anchored regular expression in a single
//! left-to-right scan:
//! - `*` matches zero or more characters except `/`
//! - `**` matches across `/`; `/**/` also elides a whole path segment
//! - `?` matches exactly one character except `/`
//! - `[abc]`, `[a-z]`, `[!abc]`/`[^abc]` character classes, with POSIX
//!   named classes such as `[[:digit:]]` expanded inline
//! - `{a,b,c}` brace alternation (nesting allowed)
//! - `\x` matches a literal `x`
//!
//! Compilation never fails: a malformed character class yields a matcher
//! that rejects every input.

use regex::{Regex, RegexBuilder};

use crate::paths;

/// A compiled glob pattern.
///
/// Matching is anchored (full-string) and operates on `/`-normalized text.
/// A `Pattern` is immutable and safe to share across threads.
///
/// # Example
///
/// ```
/// use globber::Pattern;
///
/// let pat = Pattern::compile("src/**/*.rs");
/// assert!(pat.matches("src/lib.rs"));
/// assert!(pat.matches("src/walk/descend.rs"));
/// assert!(!pat.matches("tests/walk.rs"));
/// ```
#[derive(Debug, Clone)]
pub struct Pattern {
    original: String,
    regex: Option<Regex>,
}

impl Pattern {
    /// Compile a glob with case-sensitive matching.
    pub fn compile(glob: &str) -> Self {
        Self::compile_with(glob, true)
    }

    /// Compile a glob, folding case when `case_sensitive` is false.
    ///
    /// Compilation is infallible for any finite input; patterns that cannot
    /// be translated (an unterminated character class, an inverted range)
    /// compile to a matcher that rejects everything.
    pub fn compile_with(glob: &str, case_sensitive: bool) -> Self {
        let regex = translate(glob).and_then(|source| {
            RegexBuilder::new(&source)
                .case_insensitive(!case_sensitive)
                .build()
                .ok()
        });
        Self {
            original: glob.to_string(),
            regex,
        }
    }

    /// The glob text this pattern was compiled from.
    pub fn as_str(&self) -> &str {
        &self.original
    }

    /// Full-string match against `/`-normalized text.
    pub fn matches(&self, text: &str) -> bool {
        self.regex.as_ref().is_some_and(|r| r.is_match(text))
    }
}

/// True iff the pattern contains any glob metacharacter (`* ? [ ] { }`).
pub fn is_dynamic(pattern: &str) -> bool {
    pattern
        .chars()
        .any(|c| matches!(c, '*' | '?' | '[' | ']' | '{' | '}'))
}

/// Return a pattern that matches `path` literally.
///
/// Separators are normalized to `/`, then each of `[ ] ( ) { } ? *` is
/// prefixed with a backslash.
///
/// # Example
///
/// ```
/// use globber::escape;
///
/// assert_eq!(escape("build (new)/*.o"), "build \\(new\\)/\\*.o");
/// ```
pub fn escape(path: &str) -> String {
    let normalized = paths::normalize_str(path);
    let mut out = String::with_capacity(normalized.len());
    for c in normalized.chars() {
        if matches!(c, '[' | ']' | '(' | ')' | '{' | '}' | '?' | '*') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

// ---------------------------------------------------------------------------
// Glob -> regex translation
// ---------------------------------------------------------------------------

/// Translate a glob into an anchored regex source string.
///
/// Returns `None` for patterns that must reject all input (the failure mode
/// for malformed classes).
fn translate(glob: &str) -> Option<String> {
    let chars: Vec<char> = glob.chars().collect();
    let mut out = String::with_capacity(glob.len() + 8);
    out.push('^');

    let mut group_depth = 0usize;
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '\\' => {
                // Escape: next character is literal; a trailing backslash
                // stands for itself.
                if i + 1 < chars.len() {
                    push_literal(&mut out, chars[i + 1]);
                    i += 2;
                } else {
                    push_literal(&mut out, '\\');
                    i += 1;
                }
            }
            '*' => {
                let mut j = i;
                while j < chars.len() && chars[j] == '*' {
                    j += 1;
                }
                if j - i >= 2 {
                    // Globstar. Between separators it may also swallow the
                    // following separator so `a/**/b` matches `a/b`.
                    let bordered_left = i == 0 || chars[i - 1] == '/';
                    let bordered_right = j < chars.len() && chars[j] == '/';
                    if bordered_left && bordered_right {
                        out.push_str("(?:.*/)?");
                        j += 1;
                    } else {
                        out.push_str(".*");
                    }
                } else {
                    out.push_str("[^/]*");
                }
                i = j;
            }
            '?' => {
                out.push_str("[^/]");
                i += 1;
            }
            '[' => {
                let (class, next) = translate_class(&chars, i)?;
                out.push_str(&class);
                i = next;
            }
            '{' => {
                if has_matching_brace(&chars, i) {
                    out.push_str("(?:");
                    group_depth += 1;
                } else {
                    push_literal(&mut out, '{');
                }
                i += 1;
            }
            ',' => {
                if group_depth > 0 {
                    out.push('|');
                } else {
                    push_literal(&mut out, ',');
                }
                i += 1;
            }
            '}' => {
                if group_depth > 0 {
                    out.push(')');
                    group_depth -= 1;
                } else {
                    push_literal(&mut out, '}');
                }
                i += 1;
            }
            c => {
                push_literal(&mut out, c);
                i += 1;
            }
        }
    }

    out.push('$');
    Some(out)
}

/// Translate a `[...]` class starting at `chars[start]`.
///
/// Returns the emitted regex class and the index just past the closing `]`,
/// or `None` when the class is unterminated. POSIX names expand to plain
/// ranges so the emitted class never nests brackets.
fn translate_class(chars: &[char], start: usize) -> Option<(String, usize)> {
    let mut out = String::from("[");
    let mut i = start + 1;

    if i < chars.len() && (chars[i] == '!' || chars[i] == '^') {
        out.push('^');
        i += 1;
    }

    let mut first = true;
    let mut closed = false;
    while i < chars.len() {
        let c = chars[i];

        // `]` right after `[` or the negation marker is a literal member.
        if c == ']' && !first {
            closed = true;
            i += 1;
            break;
        }

        if c == '[' && i + 1 < chars.len() && chars[i + 1] == ':' {
            if let Some((expansion, next)) = posix_class(chars, i) {
                out.push_str(expansion);
                i = next;
                first = false;
                continue;
            }
        }

        // Range, unless the upper bound is the closing bracket.
        if i + 2 < chars.len() && chars[i + 1] == '-' && chars[i + 2] != ']' {
            push_class_char(&mut out, c);
            out.push('-');
            push_class_char(&mut out, chars[i + 2]);
            i += 3;
            first = false;
            continue;
        }

        push_class_char(&mut out, c);
        i += 1;
        first = false;
    }

    if !closed {
        return None;
    }
    out.push(']');
    Some((out, i))
}

/// Recognize `[:name:]` at `chars[start]` and return its expansion plus the
/// index just past the trailing `:]`.
fn posix_class(chars: &[char], start: usize) -> Option<(&'static str, usize)> {
    let mut j = start + 2;
    while j + 1 < chars.len() {
        if chars[j] == ':' && chars[j + 1] == ']' {
            let name: String = chars[start + 2..j].iter().collect();
            return posix_expansion(&name).map(|exp| (exp, j + 2));
        }
        j += 1;
    }
    None
}

/// Canonical character ranges for the POSIX named classes.
fn posix_expansion(name: &str) -> Option<&'static str> {
    Some(match name {
        "alnum" => "a-zA-Z0-9",
        "alpha" => "a-zA-Z",
        "ascii" => "\\x00-\\x7F",
        "blank" => " \\t",
        "cntrl" => "\\x00-\\x1F\\x7F",
        "digit" => "0-9",
        "graph" => "\\x21-\\x7E",
        "lower" => "a-z",
        "print" => "\\x20-\\x7E",
        "punct" => "\\x21-\\x2F\\x3A-\\x40\\x5B-\\x60\\x7B-\\x7E",
        "space" => " \\t\\r\\n\\x0B\\x0C",
        "upper" => "A-Z",
        "word" => "a-zA-Z0-9_",
        "xdigit" => "0-9A-Fa-f",
        _ => return None,
    })
}

/// Does the `{` at `start` have a matching `}` at its own nesting level?
fn has_matching_brace(chars: &[char], start: usize) -> bool {
    let mut depth = 0i32;
    let mut i = start;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 1,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return true;
                }
            }
            _ => {}
        }
        i += 1;
    }
    false
}

fn push_literal(out: &mut String, c: char) {
    if c.is_ascii_punctuation() {
        out.push('\\');
    }
    out.push(c);
}

fn push_class_char(out: &mut String, c: char) {
    if matches!(c, '[' | ']' | '^' | '-' | '&' | '\\') {
        out.push('\\');
    }
    out.push(c);
}

// ---------------------------------------------------------------------------
// Brace expansion (used by the shell-style glob in `fs`)
// ---------------------------------------------------------------------------

/// Expand the first top-level brace group, recursing for the rest.
///
/// `x{a,b}y` becomes `xay`, `xby`. A `{` without a matching `}` is left
/// alone, so the result is always non-empty.
pub(crate) fn expand_braces(pattern: &str) -> Vec<String> {
    let chars: Vec<char> = pattern.chars().collect();

    let mut depth = 0;
    let mut group_start = None;
    let mut group_end = None;
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 1,
            '{' => {
                if depth == 0 {
                    group_start = Some(i);
                }
                depth += 1;
            }
            '}' => {
                depth -= 1;
                if depth == 0 && group_start.is_some() {
                    group_end = Some(i);
                    break;
                }
            }
            _ => {}
        }
        i += 1;
    }

    let (start, end) = match (group_start, group_end) {
        (Some(s), Some(e)) => (s, e),
        _ => return vec![pattern.to_string()],
    };

    let prefix: String = chars[..start].iter().collect();
    let suffix: String = chars[end + 1..].iter().collect();
    let body: String = chars[start + 1..end].iter().collect();

    let mut results = Vec::new();
    for alt in split_alternatives(&body) {
        let combined = format!("{prefix}{alt}{suffix}");
        results.extend(expand_braces(&combined));
    }
    results
}

/// Split brace content on top-level commas.
fn split_alternatives(body: &str) -> Vec<String> {
    let mut alternatives = Vec::new();
    let mut current = String::new();
    let mut depth = 0;
    let mut escaped = false;

    for c in body.chars() {
        if escaped {
            current.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' => {
                current.push(c);
                escaped = true;
            }
            '{' => {
                depth += 1;
                current.push(c);
            }
            '}' => {
                depth -= 1;
                current.push(c);
            }
            ',' if depth == 0 => {
                alternatives.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    alternatives.push(current);
    alternatives
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(pattern: &str, text: &str) -> bool {
        Pattern::compile(pattern).matches(text)
    }

    #[test]
    fn literal_matches() {
        assert!(matches("hello.txt", "hello.txt"));
        assert!(!matches("hello.txt", "hello_txt"));
        assert!(!matches("hello", "hell"));
        assert!(matches("a+b", "a+b"));
    }

    #[test]
    fn empty_pattern_matches_only_the_empty_string() {
        assert!(matches("", ""));
        assert!(!matches("", "a"));
    }

    #[test]
    fn star_stops_at_separators() {
        assert!(matches("*.rs", "main.rs"));
        assert!(matches("*", "anything"));
        assert!(!matches("*.rs", "src/main.rs"));
        assert!(!matches("src/*", "src/a/b"));
        assert!(matches("src/*", "src/a"));
    }

    #[test]
    fn question_matches_one_non_separator() {
        assert!(matches("?", "a"));
        assert!(!matches("?", ""));
        assert!(!matches("?", "/"));
        assert!(matches("v?.0", "v1.0"));
        assert!(!matches("v?.0", "v10.0"));
    }

    #[test]
    fn globstar_spans_separators() {
        assert!(matches("**", "a/b/c"));
        assert!(matches("**/*.md", "readme.md"));
        assert!(matches("**/*.md", "docs/guide.md"));
        assert!(matches("**/*.md", "a/b/c/d.md"));
        assert!(matches("src/**", "src/a/b"));
        assert!(!matches("src/**", "other/a"));
    }

    #[test]
    fn bordered_globstar_elides_a_segment() {
        assert!(matches("a/**/b", "a/b"));
        assert!(matches("a/**/b", "a/x/b"));
        assert!(matches("a/**/b", "a/x/y/b"));
        assert!(!matches("a/**/b", "a/xb"));
    }

    #[test]
    fn unbordered_globstar_still_crosses_separators() {
        assert!(matches("a**b", "ab"));
        assert!(matches("a**b", "a/x/b"));
    }

    #[test]
    fn char_classes() {
        assert!(matches("[abc]", "b"));
        assert!(!matches("[abc]", "d"));
        assert!(matches("[a-z]", "m"));
        assert!(!matches("[a-z]", "M"));
        assert!(matches("file[0-9A-Za-z].txt", "fileB.txt"));
        assert!(matches("[!abc]", "d"));
        assert!(matches("[^abc]", "d"));
        assert!(!matches("[!abc]", "a"));
    }

    #[test]
    fn class_literal_bracket_and_dash() {
        assert!(matches("[]abc]", "]"));
        assert!(matches("[]abc]", "a"));
        assert!(matches("[!]a]", "x"));
        assert!(!matches("[!]a]", "]"));
        assert!(matches("[-abc]", "-"));
        assert!(matches("[abc-]", "-"));
    }

    #[test]
    fn posix_classes_expand() {
        assert!(matches("data[[:digit:]].log", "data5.log"));
        assert!(!matches("data[[:digit:]].log", "dataX.log"));
        assert!(matches("[[:alpha:]]", "Q"));
        assert!(matches("[[:alnum:]_]", "_"));
        assert!(matches("[[:xdigit:]]", "f"));
        assert!(!matches("[[:xdigit:]]", "g"));
        assert!(matches("[[:upper:][:digit:]]", "7"));
        assert!(matches("[[:upper:][:digit:]]", "Z"));
        assert!(!matches("[[:upper:][:digit:]]", "z"));
        assert!(matches("[![:digit:]]", "x"));
        assert!(!matches("[![:digit:]]", "4"));
    }

    #[test]
    fn braces_compile_to_alternation() {
        assert!(matches("*.{rs,go}", "main.rs"));
        assert!(matches("*.{rs,go}", "main.go"));
        assert!(!matches("*.{rs,go}", "main.py"));
        assert!(matches("{,un}do", "do"));
        assert!(matches("{,un}do", "undo"));
        assert!(matches("{a,{b,c}}", "c"));
    }

    #[test]
    fn unmatched_brace_is_literal() {
        assert!(matches("{abc", "{abc"));
        assert!(matches("abc}", "abc}"));
        assert!(matches("a,b", "a,b"));
    }

    #[test]
    fn escapes_produce_literals() {
        assert!(matches("\\*", "*"));
        assert!(!matches("\\*", "x"));
        assert!(matches("file\\[1\\]", "file[1]"));
        assert!(matches("a\\{b\\}", "a{b}"));
        // A trailing backslash stands for itself.
        assert!(matches("a\\", "a\\"));
    }

    #[test]
    fn malformed_class_rejects_everything() {
        let pat = Pattern::compile("[abc");
        assert!(!pat.matches("a"));
        assert!(!pat.matches("[abc"));
        assert!(!pat.matches(""));
    }

    #[test]
    fn case_folding_is_a_compile_option() {
        assert!(!matches("*.TXT", "note.txt"));
        let folded = Pattern::compile_with("*.TXT", false);
        assert!(folded.matches("note.txt"));
        assert!(folded.matches("NOTE.TXT"));
    }

    #[test]
    fn unicode_matches_character_wise() {
        assert!(matches("h?llo", "héllo"));
        assert!(matches("[αβγ]*", "βeta"));
    }

    #[test]
    fn dynamic_classifier_is_exact() {
        assert!(is_dynamic("*.rs"));
        assert!(is_dynamic("a?c"));
        assert!(is_dynamic("[ab]"));
        assert!(is_dynamic("{a,b}"));
        assert!(is_dynamic("]"));
        assert!(!is_dynamic("plain/path.txt"));
        assert!(!is_dynamic(""));
    }

    #[test]
    fn escape_round_trips_through_the_compiler() {
        for path in ["a/b.txt", "weird (1)[2]{3}.tar", "star*?.log"] {
            let escaped = escape(path);
            assert!(Pattern::compile(&escaped).matches(path), "{path}");
            assert!(!Pattern::compile(&escaped).matches("other"));
        }
    }

    #[test]
    fn expand_braces_produces_every_alternative() {
        assert_eq!(expand_braces("plain"), vec!["plain"]);
        assert_eq!(expand_braces("x{a,b}y"), vec!["xay", "xby"]);
        let mut crossed = expand_braces("{a,b}{1,2}");
        crossed.sort();
        assert_eq!(crossed, vec!["a1", "a2", "b1", "b2"]);
        assert_eq!(expand_braces("no{pe"), vec!["no{pe"]);
    }
}
