//! CLI integration tests using assert_cmd.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn articulate() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("articulate").unwrap()
}

const TABLE: &str = "\
UC Name,Group ID,Set ID,Num Required,Receiving,Courses Group 1,Courses Group 2
UCB,A,A,1,MATH 1A,MATH 1A,MATH 1AH
UCB,B,A,1,MATH 1B,MATH 1B,
UCLA,A,A,1,MATH 31A,MATH 1A,
UCLA,G,A,1,COM SCI 31,Not Articulated,
";

const CONFIG: &str = r#"
catalog = ["UCB", "UCLA"]
permutation_size = 2
parallelism = 1

[districts]
"Foothill-De Anza" = ["De Anza College", "Foothill College"]
"#;

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
}

fn fixture() -> (TempDir, PathBuf, PathBuf) {
    let dir = TempDir::new().unwrap();
    let table = write(dir.path(), "tables/De_Anza_College.csv", TABLE);
    let config = write(dir.path(), "articulate.toml", CONFIG);
    (dir, table, config)
}

#[test]
fn validate_valid_table() {
    let (_dir, table, config) = fixture();
    articulate()
        .arg("validate")
        .arg("--input")
        .arg(&table)
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("De_Anza_College (4 rows)"))
        .stdout(predicate::str::contains("All tables valid"));
}

#[test]
fn validate_reports_malformed_set() {
    let (dir, _table, config) = fixture();
    let bad = write(
        dir.path(),
        "bad.csv",
        "UC Name,Group ID,Set ID,Num Required,Receiving,Courses Group 1\nUCB,A,A,,MATH 1A,MATH 1\n",
    );
    articulate()
        .arg("validate")
        .arg("--input")
        .arg(&bad)
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stdout(predicate::str::contains("num_required is missing"))
        .stderr(predicate::str::contains("failed to build"));
}

#[test]
fn validate_warns_on_missing_institution() {
    let (dir, table, _config) = fixture();
    let config = write(dir.path(), "wide.toml", "catalog = [\"UCB\", \"UCLA\", \"UCM\"]\n");
    articulate()
        .arg("validate")
        .arg("--input")
        .arg(&table)
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("no articulation rows for UCM"));
}

#[test]
fn validate_nonexistent_file() {
    articulate()
        .arg("validate")
        .arg("--input")
        .arg("nonexistent.csv")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn evaluate_single_institution() {
    let (_dir, table, config) = fixture();
    articulate()
        .arg("evaluate")
        .arg("--input")
        .arg(&table)
        .arg("--institution")
        .arg("ucla")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("1/2 groups satisfied"))
        .stdout(predicate::str::contains("COM SCI 31"));
}

#[test]
fn evaluate_json_output() {
    let (_dir, table, config) = fixture();
    articulate()
        .arg("evaluate")
        .arg("--input")
        .arg(&table)
        .arg("--institution")
        .arg("UCB")
        .arg("--json")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"satisfied\": true"));
}

#[test]
fn evaluate_unknown_institution_fails() {
    let (_dir, table, config) = fixture();
    articulate()
        .arg("evaluate")
        .arg("--input")
        .arg(&table)
        .arg("--institution")
        .arg("UCX")
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown institution: UCX"));
}

#[test]
fn evaluate_availability_writes_csv() {
    let (dir, table, config) = fixture();
    let out = dir.path().join("out");
    articulate()
        .arg("evaluate")
        .arg("--input")
        .arg(&table)
        .arg("--output")
        .arg(&out)
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("De_Anza_College"));

    let csv = std::fs::read_to_string(out.join("availability.csv")).unwrap();
    assert!(csv.contains("De_Anza_College,1,,0,G: COM SCI 31,1"));
}

#[test]
fn sequence_writes_all_formats() {
    let (dir, _table, config) = fixture();
    let out = dir.path().join("results");
    articulate()
        .arg("sequence")
        .arg("--input")
        .arg(dir.path().join("tables"))
        .arg("--output")
        .arg(&out)
        .arg("--format")
        .arg("all")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stderr(predicate::str::contains("2 permutations"))
        .stderr(predicate::str::contains("As 2nd"));

    assert!(out.join("order_1_averages.csv").exists());
    assert!(out.join("order_2_averages.csv").exists());
    assert!(out.join("De_Anza_College_averages.csv").exists());
    assert!(out.join("summary.md").exists());

    let totals = std::fs::read_to_string(out.join("total_combination_order.txt")).unwrap();
    // after UCLA, only MATH 1B is new for UCB
    assert!(totals.contains(
        "UCB:\n  As 1st: 2 Courses, 0 Unarticulated\n  As 2nd: 1 Courses, 0 Unarticulated\n"
    ));
    // after UCB, MATH 1A is already credited
    assert!(totals.contains(
        "UCLA:\n  As 1st: 1 Courses, 1 Unarticulated\n  As 2nd: 0 Courses, 1 Unarticulated\n"
    ));

    let json = std::fs::read_dir(&out)
        .unwrap()
        .filter_map(|e| e.ok())
        .any(|e| e.file_name().to_string_lossy().ends_with(".json"));
    assert!(json);
}

#[test]
fn sequence_rejects_unknown_format() {
    let (_dir, table, config) = fixture();
    articulate()
        .arg("sequence")
        .arg("--input")
        .arg(&table)
        .arg("--format")
        .arg("html")
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown format"));
}

#[test]
fn tag_writes_table() {
    let (dir, _table, config) = fixture();
    let records = write(
        dir.path(),
        "records.json",
        r#"[
  {
    "receiving_institution": "University of California Berkeley",
    "receiving": [{"course": "MATH 1A"}],
    "sending": [{"course": "MATH 1A"}, "or", {"course": "MATH 1AH"}]
  },
  {
    "receiving_institution": "University of California Berkeley",
    "receiving": [{"course": "PHYS 7A"}],
    "sending": ["not_articulated"]
  }
]"#,
    );
    let out = dir.path().join("tagged.csv");
    articulate()
        .arg("tag")
        .arg("--input")
        .arg(&records)
        .arg("--output")
        .arg(&out)
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Tagged 1 rows from 2 records (1 skipped)"));

    let csv = std::fs::read_to_string(&out).unwrap();
    assert!(csv.contains("UCB,A,A,1,MATH 1A,MATH 1A,MATH 1AH"));
}

#[test]
fn merge_builds_district_tables() {
    let (dir, _table, config) = fixture();
    write(
        dir.path(),
        "tables/Foothill_College.csv",
        "UC Name,Group ID,Set ID,Num Required,Receiving,Courses Group 1\n\
         UCLA,G,A,1,COM SCI 31,CS 1A\n",
    );
    write(
        dir.path(),
        "tables/Ohlone_College.csv",
        "UC Name,Group ID,Set ID,Num Required,Receiving,Courses Group 1\n\
         UCB,A,A,1,MATH 1A,MATH 101\n",
    );
    let out = dir.path().join("districts");
    articulate()
        .arg("merge")
        .arg("--input")
        .arg(dir.path().join("tables"))
        .arg("--output")
        .arg(&out)
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Merged 2 colleges into 1 districts"))
        .stdout(predicate::str::contains("Ohlone College"));

    let csv = std::fs::read_to_string(out.join("Foothill-De_Anza.csv")).unwrap();
    assert!(csv.starts_with("College Name,UC Name"));
    assert!(csv.contains("Foothill College,UCLA,G,A,1,COM SCI 31,CS 1A"));
}

#[test]
fn init_creates_config() {
    let dir = TempDir::new().unwrap();

    articulate()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created articulate.toml"));

    assert!(dir.path().join("articulate.toml").exists());

    articulate()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}
