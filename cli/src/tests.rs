use std::path::PathBuf;

use clap::Parser;
use safe_rewrite::RewriteOptions;

use crate::command_exec::{effective_options, execute_command, replace_all};
use crate::error::{CliError, error_json, tool_error_details};
use crate::input::load_bytes_limited;
use crate::{Cli, Command};

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("safe-rewrite").chain(args.iter().copied()))
        .expect("parse args")
}

#[test]
fn replace_all_substitutes_every_occurrence() {
    assert_eq!(
        replace_all(b"This is a test", b"is", b"was"),
        b"Thwas was a test".to_vec()
    );
    assert_eq!(replace_all(b"aaaa", b"aa", b"b"), b"bb".to_vec());
    assert_eq!(replace_all(b"abc", b"zz", b"y"), b"abc".to_vec());
    assert_eq!(replace_all(b"", b"a", b"b"), Vec::<u8>::new());
}

#[test]
fn replace_command_rewrites_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("t");
    std::fs::write(&path, "This is a test").expect("write");

    let cli = parse(&[
        "replace",
        path.to_str().expect("utf-8 path"),
        "--from",
        "is",
        "--to",
        "was",
    ]);
    let report = execute_command(&cli.command, effective_options(&cli).expect("options"))
        .expect("replace");

    assert!(report.changed);
    assert_eq!(report.bytes_read, 14);
    assert_eq!(report.bytes_written, 16);
    assert_eq!(
        std::fs::read_to_string(&path).expect("read"),
        "Thwas was a test"
    );
}

#[test]
fn replace_command_rejects_empty_pattern() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("t");
    std::fs::write(&path, "abc").expect("write");

    let cli = parse(&["replace", path.to_str().expect("utf-8"), "--from", "", "--to", "x"]);
    let err = execute_command(&cli.command, RewriteOptions::default()).expect_err("empty from");
    assert_eq!(err.code(), "usage");
    assert_eq!(std::fs::read_to_string(&path).expect("read"), "abc");
}

#[test]
fn write_command_replaces_with_input_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let target = dir.path().join("target.txt");
    let input = dir.path().join("input.txt");
    std::fs::write(&target, "old").expect("write target");
    std::fs::write(&input, "brand new").expect("write input");

    let cli = parse(&[
        "write",
        target.to_str().expect("utf-8"),
        "--input",
        input.to_str().expect("utf-8"),
    ]);
    let report =
        execute_command(&cli.command, RewriteOptions::default()).expect("write command");

    assert!(report.changed);
    assert_eq!(std::fs::read_to_string(&target).expect("read"), "brand new");
}

#[test]
fn write_command_replaces_target_larger_than_input_limit() {
    let dir = tempfile::tempdir().expect("tempdir");
    let target = dir.path().join("big.log");
    let input = dir.path().join("input.txt");
    std::fs::write(&target, "x".repeat(100)).expect("write target");
    std::fs::write(&input, "tiny").expect("write input");

    let cli = parse(&[
        "write",
        target.to_str().expect("utf-8"),
        "--input",
        input.to_str().expect("utf-8"),
    ]);
    let options = RewriteOptions {
        max_input_bytes: 16,
        ..RewriteOptions::default()
    };
    let report = execute_command(&cli.command, options).expect("write command");

    assert!(report.changed);
    assert_eq!(report.bytes_read, 0);
    assert_eq!(report.bytes_written, 4);
    assert_eq!(std::fs::read_to_string(&target).expect("read"), "tiny");
}

#[test]
fn write_command_skips_identical_content() {
    let dir = tempfile::tempdir().expect("tempdir");
    let target = dir.path().join("target.txt");
    let input = dir.path().join("input.txt");
    std::fs::write(&target, "same").expect("write target");
    std::fs::write(&input, "same").expect("write input");

    let cli = parse(&[
        "--skip-unchanged",
        "write",
        target.to_str().expect("utf-8"),
        "--input",
        input.to_str().expect("utf-8"),
    ]);
    let report = execute_command(&cli.command, effective_options(&cli).expect("options"))
        .expect("write command");

    assert!(!report.changed);
    assert_eq!(report.bytes_read, 4);
    assert_eq!(report.bytes_written, 0);
    let mut names: Vec<_> = std::fs::read_dir(dir.path())
        .expect("read_dir")
        .map(|entry| entry.expect("entry").file_name())
        .collect();
    names.sort();
    assert_eq!(names, vec!["input.txt", "target.txt"]);
}

#[test]
fn write_command_rejects_oversized_input() {
    let dir = tempfile::tempdir().expect("tempdir");
    let target = dir.path().join("target.txt");
    let input = dir.path().join("input.txt");
    std::fs::write(&target, "old").expect("write target");
    std::fs::write(&input, "x".repeat(40)).expect("write input");

    let cli = parse(&[
        "write",
        target.to_str().expect("utf-8"),
        "--input",
        input.to_str().expect("utf-8"),
    ]);
    let options = RewriteOptions {
        max_input_bytes: 16,
        ..RewriteOptions::default()
    };
    let err = execute_command(&cli.command, options).expect_err("input too large");
    assert_eq!(err.code(), safe_rewrite::Error::CODE_INPUT_TOO_LARGE);
    assert!(err.to_string().contains("40 bytes"), "{err}");
    assert_eq!(std::fs::read_to_string(&target).expect("read"), "old");
}

#[test]
fn skip_unchanged_flag_overrides_options() {
    let cli = parse(&["--skip-unchanged", "write", "target.txt"]);
    let options = effective_options(&cli).expect("options");
    assert!(options.skip_unchanged);
    match &cli.command {
        Command::Write { input, .. } => assert_eq!(input, &PathBuf::from("-")),
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn options_file_is_loaded() {
    let dir = tempfile::tempdir().expect("tempdir");
    let options_path = dir.path().join("rewrite.toml");
    std::fs::write(&options_path, "sync = false\nmax_input_bytes = 1024\n").expect("write");

    let cli = parse(&[
        "--options",
        options_path.to_str().expect("utf-8"),
        "write",
        "target.txt",
    ]);
    let options = effective_options(&cli).expect("options");
    assert!(!options.sync);
    assert_eq!(options.max_input_bytes, 1024);
}

#[test]
fn load_bytes_limited_rejects_large_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("big.bin");
    std::fs::write(&path, "x".repeat(100)).expect("write");

    let err = load_bytes_limited(&path, 10).expect_err("should reject");
    match err {
        safe_rewrite::Error::InputTooLarge {
            size_bytes,
            max_bytes,
        } => {
            assert_eq!(size_bytes, 100);
            assert_eq!(max_bytes, 10);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn missing_target_reports_open_failed_json() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("missing.txt");

    let cli = parse(&[
        "replace",
        missing.to_str().expect("utf-8"),
        "--from",
        "a",
        "--to",
        "b",
    ]);
    let err = execute_command(&cli.command, RewriteOptions::default()).expect_err("missing");
    let json = error_json(&err);

    assert_eq!(
        json.pointer("/error/code").and_then(|v| v.as_str()),
        Some("open_failed")
    );
    assert_eq!(
        json.pointer("/error/details/kind").and_then(|v| v.as_str()),
        Some("open_failed")
    );
}

#[test]
fn tool_error_details_covers_already_closed() {
    let err = safe_rewrite::Error::AlreadyClosed {
        path: PathBuf::from("t.txt"),
        state: safe_rewrite::SessionState::Aborted,
    };
    let details = tool_error_details(&err).expect("details");
    assert_eq!(
        details.get("kind").and_then(|v| v.as_str()),
        Some("already_closed")
    );
    assert_eq!(
        details.get("state").and_then(|v| v.as_str()),
        Some("aborted")
    );
}

#[test]
fn usage_errors_have_no_tool_details() {
    let json = error_json(&CliError::Usage("bad".to_string()));
    assert_eq!(
        json.pointer("/error/code").and_then(|v| v.as_str()),
        Some("usage")
    );
    assert!(json.pointer("/error/details").is_none());
}
