//! Integration tests for CLI behavior
//!
//! These tests verify the external behavior of the lintel binary: exit
//! status, output lines, configuration discovery and flag precedence.

use assert_cmd::Command;
use assert_fs::TempDir;
use assert_fs::prelude::*;
use predicates::prelude::*;

/// Helper to create a command that ignores any config file around the
/// test process.
fn lintel_cmd() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_lintel"));
    cmd.env_remove("RUST_LOG");
    cmd
}

mod help_command {
    use super::*;

    #[test]
    fn shows_help_with_flag() {
        lintel_cmd()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Usage:"));
    }

    #[test]
    fn shows_version_with_flag() {
        lintel_cmd()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn rejects_zero_jobs() {
        lintel_cmd()
            .args(["--jobs", "0", "--isolated"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("Invalid jobs value '0'"));
    }
}

mod reporting {
    use super::*;

    #[test]
    fn clean_file_succeeds() {
        let temp = TempDir::new().unwrap();
        temp.child("clean.py").write_str("x = 1\n").unwrap();

        lintel_cmd()
            .current_dir(temp.path())
            .args(["--isolated", "clean.py"])
            .assert()
            .success()
            .stdout(predicate::str::is_empty());
    }

    #[test]
    fn reports_in_default_format() {
        let temp = TempDir::new().unwrap();
        temp.child("dirty.py").write_str("x = 1; \n").unwrap();

        lintel_cmd()
            .current_dir(temp.path())
            .args(["--isolated", "dirty.py"])
            .assert()
            .code(1)
            .stdout(
                "dirty.py:1:6: E703 statement ends with a semicolon\n\
                 dirty.py:1:7: W291 trailing whitespace\n",
            );
    }

    #[test]
    fn select_limits_reported_codes() {
        let temp = TempDir::new().unwrap();
        temp.child("dirty.py").write_str("x = 1; \n").unwrap();

        lintel_cmd()
            .current_dir(temp.path())
            .args(["--isolated", "--select", "E7", "dirty.py"])
            .assert()
            .code(1)
            .stdout("dirty.py:1:6: E703 statement ends with a semicolon\n");
    }

    #[test]
    fn noqa_marker_suppresses() {
        let temp = TempDir::new().unwrap();
        temp.child("quiet.py")
            .write_str("x = 1;  # noqa: E703\n")
            .unwrap();

        lintel_cmd()
            .current_dir(temp.path())
            .args(["--isolated", "quiet.py"])
            .assert()
            .success();

        lintel_cmd()
            .current_dir(temp.path())
            .args(["--isolated", "--disable-noqa", "quiet.py"])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("E703"));
    }

    #[test]
    fn exit_zero_still_prints() {
        let temp = TempDir::new().unwrap();
        temp.child("dirty.py").write_str("x = 1;\n").unwrap();

        lintel_cmd()
            .current_dir(temp.path())
            .args(["--isolated", "--exit-zero", "--count", "dirty.py"])
            .assert()
            .success()
            .stdout(predicate::str::ends_with("E703 statement ends with a semicolon\n1\n"));
    }

    #[test]
    fn reads_standard_input() {
        lintel_cmd()
            .args(["--isolated", "--stdin-display-name", "piped.py", "-"])
            .write_stdin("x = 1;\n")
            .assert()
            .code(1)
            .stdout("piped.py:1:6: E703 statement ends with a semicolon\n");
    }

    #[test]
    fn missing_file_is_e902() {
        let temp = TempDir::new().unwrap();

        lintel_cmd()
            .current_dir(temp.path())
            .args(["--isolated", "missing.py"])
            .assert()
            .code(1)
            .stdout(predicate::str::starts_with("missing.py:0:1: E902 NotFound"));
    }

    #[test]
    fn unparsable_file_is_e999() {
        let temp = TempDir::new().unwrap();
        temp.child("broken.py").write_str("x = 1)\n").unwrap();

        lintel_cmd()
            .current_dir(temp.path())
            .args(["--isolated", "broken.py"])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("E999 ParseError"));
    }

    #[test]
    fn missing_block_at_end_of_file_can_be_suppressed() {
        let temp = TempDir::new().unwrap();
        temp.child("open.py").write_str("if x:\n").unwrap();
        temp.child("quiet.py").write_str("if x:  # noqa\n").unwrap();

        lintel_cmd()
            .current_dir(temp.path())
            .args(["--isolated", "open.py"])
            .assert()
            .code(1)
            .stdout("open.py:1:6: E999 ParseError: expected an indented block\n");

        lintel_cmd()
            .current_dir(temp.path())
            .args(["--isolated", "quiet.py"])
            .assert()
            .success();
    }

    #[test]
    fn extension_must_be_enabled() {
        let temp = TempDir::new().unwrap();
        temp.child("notes.py").write_str("# TODO: tidy\n").unwrap();

        lintel_cmd()
            .current_dir(temp.path())
            .args(["--isolated", "notes.py"])
            .assert()
            .success();

        lintel_cmd()
            .current_dir(temp.path())
            .args(["--isolated", "--enable-extensions", "T1", "notes.py"])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("notes.py:1:3: T100 found 'TODO' marker"));
    }

    #[test]
    fn json_format_lists_every_file() {
        let temp = TempDir::new().unwrap();
        temp.child("a.py").write_str("x = 1;\n").unwrap();
        temp.child("b.py").write_str("x = 1\n").unwrap();

        let output = lintel_cmd()
            .current_dir(temp.path())
            .args(["--isolated", "--format", "json", "a.py", "b.py"])
            .output()
            .unwrap();
        assert_eq!(output.status.code(), Some(1));

        let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(report["a.py"][0]["code"], "E703");
        assert_eq!(report["a.py"][0]["column_number"], 6);
        assert_eq!(report["b.py"], serde_json::json!([]));
    }

    #[test]
    fn statistics_are_printed() {
        let temp = TempDir::new().unwrap();
        temp.child("a.py").write_str("x = 1;\ny = 2;\n").unwrap();

        lintel_cmd()
            .current_dir(temp.path())
            .args(["--isolated", "--statistics", "a.py"])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("2     E703 statement ends with a semicolon"));
    }
}

mod configuration {
    use super::*;

    #[test]
    fn discovers_config_file() {
        let temp = TempDir::new().unwrap();
        temp.child(".lintel.jsonc")
            .write_str("{\n  // trailing whitespace is fine here\n  \"extend-ignore\": [\"W291\"]\n}\n")
            .unwrap();
        temp.child("a.py").write_str("x = 1 \n").unwrap();

        lintel_cmd()
            .current_dir(temp.path())
            .arg("a.py")
            .assert()
            .success();

        lintel_cmd()
            .current_dir(temp.path())
            .args(["--isolated", "a.py"])
            .assert()
            .code(1);
    }

    #[test]
    fn flags_override_config_file() {
        let temp = TempDir::new().unwrap();
        temp.child(".lintel.json")
            .write_str(r#"{ "max-line-length": 10 }"#)
            .unwrap();
        temp.child("a.py").write_str("value = 12345\n").unwrap();

        lintel_cmd()
            .current_dir(temp.path())
            .arg("a.py")
            .assert()
            .code(1)
            .stdout(predicate::str::contains("E501 line too long (13 > 10 characters)"));

        lintel_cmd()
            .current_dir(temp.path())
            .args(["--max-line-length", "20", "a.py"])
            .assert()
            .success();
    }

    #[test]
    fn per_file_ignores_apply() {
        let temp = TempDir::new().unwrap();
        temp.child("tests/test_a.py").write_str("x = 1;\n").unwrap();
        temp.child("src/a.py").write_str("x = 1;\n").unwrap();

        lintel_cmd()
            .current_dir(temp.path())
            .args(["--isolated", "--per-file-ignores", "tests/*:E7", "."])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("src/a.py:1:6: E703"))
            .stdout(predicate::str::contains("test_a.py").not());
    }

    #[test]
    fn unknown_config_key_is_fatal() {
        let temp = TempDir::new().unwrap();
        temp.child(".lintel.json")
            .write_str(r#"{ "selekt": ["E"] }"#)
            .unwrap();

        lintel_cmd()
            .current_dir(temp.path())
            .arg("a.py")
            .assert()
            .code(2)
            .stderr(predicate::str::contains("selekt"));
    }
}

mod parallel {
    use super::*;

    #[test]
    fn jobs_do_not_change_output() {
        let temp = TempDir::new().unwrap();
        for i in 0..8 {
            temp.child(format!("pkg/m{i}.py"))
                .write_str(&format!("x{i} = 1;\ny = f(a,b)\n"))
                .unwrap();
        }

        let serial = lintel_cmd()
            .current_dir(temp.path())
            .args(["--isolated", "--jobs", "1", "pkg"])
            .output()
            .unwrap();
        let parallel = lintel_cmd()
            .current_dir(temp.path())
            .args(["--isolated", "--jobs", "4", "pkg"])
            .output()
            .unwrap();

        assert_eq!(serial.status.code(), Some(1));
        assert_eq!(parallel.status.code(), Some(1));
        assert_eq!(
            String::from_utf8_lossy(&serial.stdout),
            String::from_utf8_lossy(&parallel.stdout)
        );
        assert_eq!(String::from_utf8_lossy(&serial.stdout).lines().count(), 16);
    }
}
