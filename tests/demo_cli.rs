use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

fn demo() -> Command {
    Command::cargo_bin("apprun-demo").unwrap()
}

#[test]
fn echoes_positionals_interspersed_with_flags() {
    demo()
        .arg("first")
        .arg("--prefix=> ")
        .arg("second")
        .arg("--logging_level=ERROR")
        .assert()
        .success()
        .stdout("> first\n> second\n")
        .stderr("");
}

#[test]
fn app_error_exits_one_without_usage() {
    demo()
        .arg("--fail=app")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error: boom"))
        .stdout(predicate::str::contains("Flags:").not());
}

#[test]
fn usage_error_exits_two_with_usage() {
    demo()
        .arg("--fail=usage")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Error: bad arg"))
        .stdout(
            predicate::str::contains("Echoes ARGS, one per line.")
                .and(predicate::str::contains("apprun-demo [flags] [ARGS...]"))
                .and(predicate::str::contains("%s").not())
                .and(predicate::str::contains("Flags:"))
                .and(predicate::str::contains("--logging_level"))
                .and(predicate::str::contains("--fail")),
        );
}

#[test]
fn unknown_flag_exits_two_before_main() {
    demo()
        .arg("--not_a_flag")
        .arg("never-echoed")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Error: ").and(predicate::str::contains("--not_a_flag")))
        .stdout(
            predicate::str::contains("Flags:").and(predicate::str::contains("never-echoed").not()),
        );
}

#[test]
fn malformed_flag_value_exits_two() {
    demo()
        .arg("--fail=sometimes")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Error: "))
        .stdout(predicate::str::contains("Flags:"));
}

#[test]
fn unknown_logging_level_is_not_translated() {
    demo()
        .arg("--logging_level=INFO,apprun_demo:LOUD")
        .arg("never-echoed")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("LOUD"))
        .stdout("");
}

#[test]
fn other_errors_report_debug_form() {
    demo()
        .arg("--fail=fault")
        .assert()
        .code(1)
        .stderr(
            predicate::str::contains("Error: Fault(")
                .and(predicate::str::contains("disk on fire")),
        );
}

#[test]
fn panics_are_not_caught() {
    demo()
        .arg("--fail=panic")
        .assert()
        .code(101)
        .stderr(predicate::str::contains("demo panic"));
}

#[test]
fn help_prints_usage_and_succeeds() {
    demo()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Flags:")
                .and(predicate::str::contains("--profile_output")),
        );
}

#[test]
fn log_lines_go_to_the_log_file_in_format() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let log_path = dir.path().join("demo.log");

    demo()
        .arg("--logging_level=WARNING,apprun_demo:DEBUG")
        .arg(format!("--logging_filename={}", log_path.display()))
        .arg("hello")
        .assert()
        .success()
        .stdout("hello\n")
        .stderr("");

    let log = fs::read_to_string(&log_path)?;
    let starting = log
        .lines()
        .find(|l| l.contains("starting with 1 argument(s)"))
        .expect("info line present");
    assert!(starting.starts_with("main:"), "{starting}");
    assert!(starting.contains(":INFO:apprun_demo:"), "{starting}");
    assert!(log.contains(":DEBUG:apprun_demo:"), "{log}");
    assert!(!log.contains('\x1b'), "{log:?}");
    let echoing = log.lines().find(|l| l.contains(" echoing")).expect("debug line present");
    assert!(echoing.ends_with(" echoing arg=hello"), "{echoing}");
    Ok(())
}

#[test]
fn named_logger_levels_filter_independently() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let log_path = dir.path().join("quiet.log");

    demo()
        .arg("--logging_level=DEBUG,apprun_demo:ERROR")
        .arg(format!("--logging_filename={}", log_path.display()))
        .arg("hello")
        .assert()
        .success();

    let log = fs::read_to_string(&log_path)?;
    assert!(!log.contains("apprun_demo"), "{log}");
    assert!(log.contains(":DEBUG:apprun::runner:"), "{log}");
    Ok(())
}

#[test]
fn profile_is_written_to_output_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let stats_path = dir.path().join("profile.json");

    demo()
        .arg("--profile")
        .arg(format!("--profile_output={}", stats_path.display()))
        .arg("a")
        .arg("b")
        .assert()
        .success()
        .stdout("a\nb\n");

    let report: serde_json::Value = serde_json::from_str(&fs::read_to_string(&stats_path)?)?;
    let entries = report["entries"].as_array().expect("entries array");
    let calls_of = |name: &str| {
        entries
            .iter()
            .find(|e| e["name"] == name)
            .and_then(|e| e["calls"].as_u64())
    };
    assert_eq!(calls_of("main"), Some(1));
    assert_eq!(calls_of("echo"), Some(2));
    Ok(())
}

#[test]
fn profile_without_output_prints_table() {
    demo()
        .arg("--profile")
        .arg("only")
        .assert()
        .success()
        .stdout(
            predicate::str::starts_with("only\n")
                .and(predicate::str::contains("ncalls"))
                .and(predicate::str::contains("::main")),
        );
}

#[test]
fn explicit_profile_values_are_accepted() {
    demo()
        .arg("--profile=false")
        .arg("plain")
        .assert()
        .success()
        .stdout("plain\n");

    demo()
        .arg("--noprofile")
        .arg("--profile=true")
        .arg("timed")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("timed\n").and(predicate::str::contains("ncalls")));
}
