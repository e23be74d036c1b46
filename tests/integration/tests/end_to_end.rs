//! End-to-end tests for the checking pipeline.
//!
//! These tests run the built-in checks over the fixture project through
//! discovery, the check manager and the style guides, the same way the
//! command line does.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lintel_core::{JobsArgument, Manager, RunOptions, StyleGuideManager, Violation};
use lintel_tokens::BasicFrontEnd;
use rstest::rstest;
use tempfile::TempDir;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/project")
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Runs every built-in check and returns `(path, line, column, code)`
/// with paths relative to `root`.
fn check(root: &Path, options: RunOptions) -> Vec<(String, usize, usize, String)> {
    check_violations(options)
        .into_iter()
        .map(|violation| {
            let relative = Path::new(&violation.filename)
                .strip_prefix(root)
                .map(path_string)
                .unwrap_or(violation.filename.clone());
            (relative, violation.line, violation.column, violation.code)
        })
        .collect()
}

fn check_violations(options: RunOptions) -> Vec<Violation> {
    let plugins = lintel_rules::plugins().unwrap();
    let options = Arc::new(options);
    let mut manager = Manager::new(
        Arc::clone(&options),
        &plugins,
        Arc::new(BasicFrontEnd::new()),
    );
    manager.start().unwrap();
    manager.run().unwrap();

    let mut guides = StyleGuideManager::new(&options, &plugins, Vec::new()).unwrap();
    manager.report(&mut guides);
    guides.into_sink()
}

fn finding(path: &str, line: usize, column: usize, code: &str) -> (String, usize, usize, String) {
    (path.to_string(), line, column, code.to_string())
}

fn project_findings() -> Vec<(String, usize, usize, String)> {
    vec![
        finding("app/blocks.py", 4, 6, "E703"),
        finding("app/deep.py", 1, 1, "C901"),
        finding("app/long.py", 1, 80, "E501"),
        finding("app/main.py", 2, 6, "E703"),
        finding("app/main.py", 3, 8, "E231"),
        finding("app/spacing.py", 5, 1, "E303"),
    ]
}

mod fixture_project {
    use super::*;
    use pretty_assertions::assert_eq;

    #[rstest]
    #[case::serial(1)]
    #[case::parallel(3)]
    fn reports_in_discovery_order(#[case] jobs: usize) {
        let root = fixtures_dir();
        let options = RunOptions::new()
            .filenames(vec![path_string(&root)])
            .jobs(JobsArgument::Fixed(jobs));

        assert_eq!(check(&root, options), project_findings());
    }

    #[test]
    fn messages_carry_the_measured_values() {
        let root = fixtures_dir();
        let options = RunOptions::new()
            .filenames(vec![path_string(&root)])
            .select(vec!["C9".to_string(), "E5".to_string()]);

        let texts: Vec<String> = check_violations(options)
            .into_iter()
            .map(|violation| violation.text)
            .collect();
        assert_eq!(
            texts,
            vec![
                "'if x0:' is too deeply nested (5 > 4)",
                "line too long (86 > 79 characters)",
            ]
        );
    }

    #[test]
    fn disable_noqa_reports_suppressed_lines() {
        let root = fixtures_dir();
        let options = RunOptions::new()
            .filenames(vec![path_string(&root.join("app"))])
            .select(vec!["E7".to_string()])
            .disable_noqa(true);

        assert_eq!(
            check(&root, options),
            vec![
                finding("app/blocks.py", 2, 6, "E703"),
                finding("app/blocks.py", 4, 6, "E703"),
                finding("app/main.py", 2, 6, "E703"),
                finding("app/skipped.py", 2, 6, "E703"),
            ]
        );
    }

    #[test]
    fn explicit_file_bypasses_filename_patterns() {
        let root = fixtures_dir();
        let notes = root.join("docs/notes.txt");
        let options = RunOptions::new().filenames(vec![path_string(&notes)]);

        assert_eq!(
            check(&root, options),
            vec![finding("docs/notes.txt", 1, 6, "E703")]
        );
    }

    #[test]
    fn per_file_ignores_and_extend_ignore_combine() {
        let root = fixtures_dir();
        let options = RunOptions::new()
            .filenames(vec![path_string(&root)])
            .extend_ignore(vec!["C9".to_string()])
            .per_file_ignore("main.py", vec!["E2".to_string(), "E7".to_string()]);

        assert_eq!(
            check(&root, options),
            vec![
                finding("app/blocks.py", 4, 6, "E703"),
                finding("app/long.py", 1, 80, "E501"),
                finding("app/spacing.py", 5, 1, "E303"),
            ]
        );
    }
}

mod discovery {
    use super::*;
    use pretty_assertions::assert_eq;

    fn write(root: &Path, relative: &str, source: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, source).unwrap();
    }

    #[test]
    fn default_excludes_skip_cache_directories() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), "pkg/mod.py", "x = 1;\n");
        write(temp_dir.path(), "pkg/__pycache__/mod.py", "x = 1;\n");
        write(temp_dir.path(), ".git/hook.py", "x = 1;\n");

        let options = RunOptions::new().filenames(vec![path_string(temp_dir.path())]);
        assert_eq!(
            check(temp_dir.path(), options),
            vec![finding("pkg/mod.py", 1, 6, "E703")]
        );
    }

    #[test]
    fn extend_exclude_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), "src/a.py", "x = 1;\n");
        write(temp_dir.path(), "build/a.py", "x = 1;\n");
        write(temp_dir.path(), "src/__pycache__/a.py", "x = 1;\n");

        let options = RunOptions::new()
            .filenames(vec![path_string(temp_dir.path())])
            .extend_exclude(vec!["build".to_string()]);
        assert_eq!(
            check(temp_dir.path(), options),
            vec![finding("src/a.py", 1, 6, "E703")]
        );
    }

    #[test]
    fn unreadable_path_is_reported_not_fatal() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), "a.py", "x = 1\n");
        let missing = path_string(&temp_dir.path().join("missing.py"));

        let options = RunOptions::new().filenames(vec![
            path_string(&temp_dir.path().join("a.py")),
            missing,
        ]);
        assert_eq!(
            check(temp_dir.path(), options),
            vec![finding("missing.py", 0, 1, "E902")]
        );
    }
}
