use std::fs;
use std::path::Path;

use globber::{
    escape, glob, glob_entries, is_dynamic, matches_path, stream, GlobError, GlobOptions,
};

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// Create the fixture tree used across these tests.
///
/// Structure:
/// ```text
/// fx/
///   unicorn.txt  cake.txt  rainbow.txt  .hidden
///   .gitignore            (lists cake.txt)
///   nested/file1.php  file2.php  file3.js
///   nested/deep/secret.txt  readme.md
///   docs/guide.md
///   complex-patterns/file1.txt file2.txt fileA.txt fileB.txt
///                    data0.log data5.log data9.log test-a.js test-b.js
/// ```
fn setup_fixture() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    fs::write(root.join("unicorn.txt"), "unicorn").unwrap();
    fs::write(root.join("cake.txt"), "cake").unwrap();
    fs::write(root.join("rainbow.txt"), "rainbow").unwrap();
    fs::write(root.join(".hidden"), "shh").unwrap();
    fs::write(root.join(".gitignore"), "cake.txt\n").unwrap();

    let nested = root.join("nested");
    fs::create_dir(&nested).unwrap();
    fs::write(nested.join("file1.php"), "1").unwrap();
    fs::write(nested.join("file2.php"), "2").unwrap();
    fs::write(nested.join("file3.js"), "3").unwrap();

    let deep = nested.join("deep");
    fs::create_dir(&deep).unwrap();
    fs::write(deep.join("secret.txt"), "secret").unwrap();
    fs::write(deep.join("readme.md"), "readme").unwrap();

    let docs = root.join("docs");
    fs::create_dir(&docs).unwrap();
    fs::write(docs.join("guide.md"), "guide").unwrap();

    let complex = root.join("complex-patterns");
    fs::create_dir(&complex).unwrap();
    for name in [
        "file1.txt", "file2.txt", "fileA.txt", "fileB.txt", "data0.log", "data5.log",
        "data9.log", "test-a.js", "test-b.js",
    ] {
        fs::write(complex.join(name), name).unwrap();
    }

    dir
}

fn options_at(root: &Path) -> GlobOptions {
    GlobOptions::builder().cwd(root).build()
}

// ---------------------------------------------------------------------------
// End-to-end scenarios
// ---------------------------------------------------------------------------

#[test]
fn flat_wildcard_returns_sorted_relative_paths() {
    let fx = setup_fixture();
    let hits = glob("*.txt", options_at(fx.path())).unwrap();
    assert_eq!(hits, vec!["cake.txt", "rainbow.txt", "unicorn.txt"]);
}

#[test]
fn negation_pattern_excludes_its_matches() {
    let fx = setup_fixture();
    let hits = glob(["*.txt", "!cake.txt"], options_at(fx.path())).unwrap();
    assert_eq!(hits, vec!["rainbow.txt", "unicorn.txt"]);
}

#[test]
fn gitignore_excludes_listed_files() {
    let fx = setup_fixture();
    let options = GlobOptions::builder().cwd(fx.path()).gitignore(true).build();
    let hits = glob("*.txt", options).unwrap();
    assert_eq!(hits, vec!["rainbow.txt", "unicorn.txt"]);
}

#[test]
fn globstar_spans_directories() {
    let fx = setup_fixture();
    let hits = glob("**/*.md", options_at(fx.path())).unwrap();
    assert_eq!(hits, vec!["docs/guide.md", "nested/deep/readme.md"]);
}

#[test]
fn character_class_ranges() {
    let fx = setup_fixture();
    let options = options_at(&fx.path().join("complex-patterns"));
    let hits = glob("file[0-9A-Za-z].txt", options).unwrap();
    assert_eq!(hits, vec!["file1.txt", "file2.txt", "fileA.txt", "fileB.txt"]);
}

#[test]
fn posix_class_in_a_set() {
    let fx = setup_fixture();
    let options = options_at(&fx.path().join("complex-patterns"));
    let hits = glob("data[[:digit:]].log", options).unwrap();
    assert_eq!(hits, vec!["data0.log", "data5.log", "data9.log"]);
}

#[test]
fn dot_option_governs_dotfiles() {
    let fx = setup_fixture();

    let options = GlobOptions::builder().cwd(fx.path()).dot(true).build();
    let hits = glob("*", options).unwrap();
    assert!(hits.contains(&".hidden".to_string()), "{hits:?}");

    let hits = glob("*", options_at(fx.path())).unwrap();
    assert!(!hits.iter().any(|p| p.starts_with('.')), "{hits:?}");
}

#[test]
fn bare_directory_pattern_expands_to_its_contents() {
    let fx = setup_fixture();
    let expanded = glob("nested", options_at(fx.path())).unwrap();
    let spelled_out = glob("nested/**/*", options_at(fx.path())).unwrap();
    assert_eq!(expanded, spelled_out);
    assert!(expanded.contains(&"nested/deep/secret.txt".to_string()));
}

// ---------------------------------------------------------------------------
// Library invariants
// ---------------------------------------------------------------------------

#[test]
fn identical_requests_return_identical_sequences() {
    let fx = setup_fixture();
    let first = glob("**/*", options_at(fx.path())).unwrap();
    let second = glob("**/*", options_at(fx.path())).unwrap();
    assert_eq!(first, second);
}

#[test]
fn output_is_sorted_bytewise_and_free_of_duplicates() {
    let fx = setup_fixture();
    let hits = glob(["**/*.txt", "*.txt", "cake.txt"], options_at(fx.path())).unwrap();

    for pair in hits.windows(2) {
        assert!(pair[0] < pair[1], "{pair:?} out of order or duplicated");
    }
}

#[test]
fn never_matching_negation_changes_nothing() {
    let fx = setup_fixture();
    let plain = glob("**/*", options_at(fx.path())).unwrap();
    let with_noop = glob(["**/*", "!zz-no-such-entry-*"], options_at(fx.path())).unwrap();
    assert_eq!(plain, with_noop);
}

#[test]
fn escape_round_trips_through_matches_path() {
    for path in ["plain.txt", "odd [1] (copy).txt", "stars*?.log", "a/b/c.rs"] {
        assert!(matches_path(path, &escape(path), ""));
        assert!(!matches_path("something-else", &escape(path), ""));
    }
}

#[test]
fn dynamic_classifier_matches_the_metacharacter_set() {
    for dynamic in ["*", "a?b", "[x]", "{a,b}", "only-close]"] {
        assert!(is_dynamic(dynamic), "{dynamic}");
    }
    for plain in ["a.txt", "some/path", "", "a!b"] {
        assert!(!is_dynamic(plain), "{plain}");
    }
}

#[test]
fn depth_bound_limits_separators_past_the_base() {
    let fx = setup_fixture();
    let options = GlobOptions::builder().cwd(fx.path()).deep(Some(0)).build();
    let hits = glob("**/*", options).unwrap();
    assert!(!hits.is_empty());
    assert!(
        hits.iter().all(|p| !p.contains('/')),
        "deep=0 must keep only base-level entries: {hits:?}"
    );

    let options = GlobOptions::builder().cwd(fx.path()).deep(Some(1)).build();
    let hits = glob("**/*", options).unwrap();
    assert!(hits.contains(&"nested/file1.php".to_string()));
    assert!(!hits.contains(&"nested/deep/secret.txt".to_string()));
}

#[test]
fn only_directories_returns_the_complement_of_only_files() {
    let fx = setup_fixture();

    let options = GlobOptions::builder()
        .cwd(fx.path())
        .only_directories(true)
        .build();
    let dirs = glob("**/*", options).unwrap();
    assert_eq!(
        dirs,
        vec!["complex-patterns", "docs", "nested", "nested/deep"]
    );

    let files = glob("**/*", options_at(fx.path())).unwrap();
    assert!(files.iter().all(|p| !dirs.contains(p)));
}

#[test]
fn mark_directories_applies_after_matching() {
    let fx = setup_fixture();
    let options = GlobOptions::builder()
        .cwd(fx.path())
        .only_directories(true)
        .mark_directories(true)
        .build();
    let hits = glob("nested/*", options).unwrap();
    assert_eq!(hits, vec!["nested/deep/"]);
}

#[test]
fn absolute_output_keeps_the_cwd_prefix() {
    let fx = setup_fixture();
    let options = GlobOptions::builder().cwd(fx.path()).absolute(true).build();
    let hits = glob("*.txt", options).unwrap();
    assert_eq!(hits.len(), 3);
    assert!(hits.iter().all(|p| Path::new(p).is_absolute()), "{hits:?}");
    assert!(hits[0].ends_with("cake.txt"));
}

#[test]
fn missing_cwd_is_an_eager_typed_error() {
    let missing = Path::new("/no/such/directory/anywhere");
    let err = glob("*.txt", options_at(missing)).unwrap_err();
    assert!(matches!(err, GlobError::DirectoryNotFound(_)));
    assert!(err.to_string().contains("anywhere"));
}

#[test]
fn stream_yields_what_glob_returns() {
    let fx = setup_fixture();
    let eager = glob("*.txt", options_at(fx.path())).unwrap();
    let lazy: Vec<String> = stream("*.txt", options_at(fx.path()))
        .unwrap()
        .map(|entry| entry.path)
        .collect();
    assert_eq!(eager, lazy);
}

#[test]
fn entries_expose_names_dirents_and_stats() {
    let fx = setup_fixture();
    let options = GlobOptions::builder().cwd(fx.path()).stats(true).build();
    let entries = glob_entries("nested/**/*.php", options).unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].path, "nested/file1.php");
    assert_eq!(entries[0].name, "file1.php");
    let dirent = entries[0].dirent.unwrap();
    assert!(dirent.is_file && !dirent.is_directory);
    let stats = entries[0].stats.unwrap();
    assert_eq!(stats.size, 1);
    assert!(stats.mtime > 0);
}

#[test]
fn case_insensitive_matching_is_opt_in() {
    let fx = setup_fixture();
    let hits = glob("UNICORN.txt", options_at(fx.path())).unwrap();
    assert!(hits.is_empty());

    let options = GlobOptions::builder()
        .cwd(fx.path())
        .case_sensitive_match(false)
        .build();
    let hits = glob("UNICORN.*", options).unwrap();
    assert_eq!(hits, vec!["unicorn.txt"]);
}

#[test]
fn base_name_match_finds_entries_at_any_depth() {
    let fx = setup_fixture();
    let options = GlobOptions::builder()
        .cwd(fx.path())
        .base_name_match(true)
        .build();
    let hits = glob("secret.txt", options).unwrap();
    assert_eq!(hits, vec!["nested/deep/secret.txt"]);
}
