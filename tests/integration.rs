use assert_cmd::Command;
use assert_fs::TempDir;
use predicates::prelude::*;
use std::fs;

fn parbench_cmd() -> Command {
    let mut cmd = Command::cargo_bin("parbench").unwrap();
    cmd.env("NO_COLOR", "1");
    cmd
}

/// Small, single-repeat run so the whole suite stays fast.
fn quick_cmd() -> Command {
    let mut cmd = parbench_cmd();
    cmd.args(["--size", "1000", "--repeats", "1", "--threads", "2"]);
    cmd
}

// ---- Default report ----

#[test]
fn default_suite_reports_every_operation() {
    let output = quick_cmd().assert().success().get_output().stdout.clone();
    let stdout = String::from_utf8(output).unwrap();

    for tag in [
        "Serial std::max_element",
        "Parallel rayon::max_element",
        "Serial std::adjacent_difference",
        "Serial std::adjacent_find",
        "Parallel std::all_of",
        "Parallel rayon::any_of",
        "Serial std::count",
        "Parallel std::equal",
        "Serial std::copy",
        "Serial std::fill",
        "Serial std::merge",
        "Parallel rayon::merge",
        "Serial std::inplace_merge",
        "Parallel rayon::inplace_merge",
        "Serial std::sort",
        "Parallel rayon::sort",
        "Parallel rayon::stable_sort",
    ] {
        assert!(stdout.contains(&format!("{}: size = ", tag)), "missing {}", tag);
    }

    assert!(!stdout.contains("Parallel std::sort"));
    assert!(!stdout.contains("SIMD rayon::sort"));
    assert!(!stdout.contains("fill<i64>"));
    assert!(!stdout.contains("sort<f64>"));
    assert!(!stdout.contains("merge_single_buffer"));
}

#[test]
fn report_lines_carry_results_and_times() {
    quick_cmd()
        .args(["--only", "count", "--backend", "std", "--mode", "serial"])
        .assert()
        .success()
        .stdout(predicate::str::contains("count (i32, 1000 elements)"))
        .stdout(predicate::str::contains(
            "Serial std::count: size = 1000  Result: 1  Lowest: ",
        ))
        .stdout(predicate::str::is_match(r"Time: \d+\.\d{6}ms").unwrap());
}

#[test]
fn fill_line_has_no_result_field() {
    quick_cmd()
        .args(["--only", "fill", "--backend", "rayon", "--mode", "parallel"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Parallel rayon::fill: size = 1000  Lowest: 42  Highest: 42  Time: ",
        ))
        .stdout(predicate::str::contains("Result").not());
}

#[test]
fn only_filter_restricts_and_orders_operations() {
    let output = quick_cmd()
        .args(["--only", "equal", "--only", "max-element", "--only", "equal"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8(output).unwrap();

    assert!(stdout.contains("std::equal"));
    assert!(stdout.contains("std::max_element"));
    assert!(!stdout.contains("::sort"));
    let equal_at = stdout.find("::equal").unwrap();
    let max_at = stdout.find("::max_element").unwrap();
    assert!(equal_at < max_at);
    assert_eq!(stdout.matches("equal (i32, 1000 elements)").count(), 1);
}

#[test]
fn repeats_multiply_trial_lines() {
    let output = parbench_cmd()
        .args(["--size", "500", "--repeats", "3", "--only", "any-of"])
        .args(["--backend", "std", "--mode", "serial"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8(output).unwrap();
    assert_eq!(stdout.matches("Serial std::any_of: size = 500  Result: true").count(), 3);
}

#[test]
fn no_simd_drops_vectorized_modes() {
    quick_cmd()
        .args(["--no-simd", "--only", "count"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Parallel rayon::count"))
        .stdout(predicate::str::contains("SIMD").not());
}

#[test]
fn max_element_reports_the_value_only() {
    quick_cmd()
        .args(["--only", "max-element", "--backend", "std", "--mode", "serial"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Serial std::max_element: size = 1000  Result: 999  Lowest: ",
        ))
        .stdout(predicate::str::contains(" at 999").not());
}

#[cfg(target_arch = "x86_64")]
#[test]
fn streaming_fill_runs_on_std_serial_only() {
    quick_cmd()
        .args(["--only", "fill-stream"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Serial std::fill_stream: size = 1000  Lowest: 42"))
        .stdout(predicate::str::contains("rayon::fill_stream").not())
        .stdout(predicate::str::contains("Parallel std::fill_stream").not());
}

// ---- Opt-in operations ----

#[test]
fn opt_in_operations_run_when_selected() {
    quick_cmd()
        .args(["--only", "fill-i64", "--only", "sort-f64", "--fresh-buffers"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Serial std::fill<i64>: size = 1000"))
        .stdout(predicate::str::contains("Parallel rayon::sort<f64>: size = 1000"));
}

#[test]
fn buffer_merge_variants_run_when_selected() {
    quick_cmd()
        .args(["--only", "merge-dual-buffer", "--only", "merge-single-buffer"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Serial std::merge_dual_buffer: size = 2000"))
        .stdout(predicate::str::contains("Parallel rayon::merge_single_buffer: size = 4000"));
}

// ---- JSON output ----

#[test]
fn json_emits_one_object_per_trial() {
    let output = quick_cmd()
        .args(["--json", "--only", "copy", "--mode", "serial", "--mode", "parallel"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8(output).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 4);

    for line in lines {
        let value: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(value["operation"], "copy");
        assert_eq!(value["size"], 1000);
        assert!(value["elapsed_ms"].as_f64().unwrap() >= 0.0);
        assert!(value["recorded_at"].as_str().unwrap().ends_with('Z'));
    }
}

#[test]
fn format_json_matches_json_flag() {
    quick_cmd()
        .args(["--format", "json", "--only", "equal", "--backend", "std", "--mode", "serial"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"tag\":\"Serial std::equal\""))
        .stdout(predicate::str::contains("\"result\":\"true\""));
}

// ---- Output file ----

#[test]
fn output_flag_writes_report_to_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("report.txt");

    quick_cmd()
        .args(["--only", "adjacent-find", "--output"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let report = fs::read_to_string(&path).unwrap();
    assert!(report.contains("Serial std::adjacent_find: size = 1000  Result: none"));
}

#[test]
fn output_to_missing_directory_fails() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("missing").join("report.txt");

    quick_cmd()
        .args(["--only", "fill", "--output"])
        .arg(&path)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("cannot create"));
}

// ---- Capability listing ----

#[test]
fn list_prints_capability_matrix() {
    parbench_cmd()
        .arg("--list")
        .assert()
        .success()
        .stdout(predicate::str::contains("vector width:"))
        .stdout(predicate::str::contains("std seq"))
        .stdout(predicate::str::contains("rayon par_unseq"))
        .stdout(predicate::str::contains("inplace_merge"))
        .stdout(predicate::str::contains("sort<f64>"))
        .stdout(predicate::str::contains(" size = ").not());
}

#[test]
fn list_with_no_simd_marks_disabled() {
    parbench_cmd()
        .args(["--list", "--no-simd"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(disabled)"));
}

// ---- Errors ----

#[test]
fn zero_size_fails_with_exit_1() {
    parbench_cmd()
        .args(["--size", "0"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("got 0"));
}

#[test]
fn unknown_operation_is_a_usage_error() {
    parbench_cmd()
        .args(["--only", "shuffle"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn seed_conflicts_with_random_seed() {
    parbench_cmd()
        .args(["--seed", "7", "--random-seed"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn logs_stay_on_stderr() {
    quick_cmd()
        .args(["--verbose", "--json", "--only", "equal"])
        .assert()
        .success()
        .stderr(predicate::str::contains("starting run"))
        .stdout(predicate::str::contains("starting run").not());
}
