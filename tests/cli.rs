use assert_cmd::Command;
use std::path::PathBuf;
use tempfile::tempdir;

fn data(file: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(file)
}

fn forecast_command() -> Command {
    let mut command = Command::cargo_bin("seir-forecast").unwrap();
    command
        .arg("--history")
        .arg(data("history.csv"))
        .arg("--demographics")
        .arg(data("age_data.csv"))
        .arg("--config")
        .arg(data("forecast_config.json"));
    command
}

#[test]
fn prints_summary() {
    let output = forecast_command().output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("Forecast from 2020-04-01 to 2020-07-30 (120 days)\n"));
    assert!(stdout.contains("Total deaths: "));
    assert!(stdout.contains("Peak hospitalized: "));
}

#[test]
fn writes_wide_report() {
    let temp_dir = tempdir().unwrap();
    forecast_command()
        .args(["--reference-date", "2020-03-30", "--horizon-days", "10"])
        .arg("--output-dir")
        .arg(temp_dir.path())
        .args(["--file-prefix", "canada_"])
        .assert()
        .success();

    let path = temp_dir.path().join("canada_forecast.csv");
    let mut reader = csv::Reader::from_path(path).unwrap();
    assert_eq!(
        reader.headers().unwrap(),
        vec![
            "date",
            "susceptible",
            "exposed",
            "infected",
            "recovered",
            "hospitalized",
            "dead"
        ]
    );
    let rows: Vec<_> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 11);
    assert_eq!(&rows[0][0], "2020-03-30");
    // 7398 confirmed - 1324 recovered - 80 deaths
    assert_eq!(&rows[0][3], "5994.0");
    assert_eq!(&rows[0][6], "80");
    assert_eq!(&rows[10][0], "2020-04-09");
}

#[test]
fn refuses_to_overwrite_without_flag() {
    let temp_dir = tempdir().unwrap();
    let run = |overwrite: bool| {
        let mut command = forecast_command();
        command
            .args(["--horizon-days", "3", "--long-format"])
            .arg("--output-dir")
            .arg(temp_dir.path());
        if overwrite {
            command.arg("--overwrite");
        }
        command.assert()
    };

    run(false).success();
    run(false).failure();
    run(true).success();
}

#[test]
fn unknown_reference_date_fails() {
    let output = forecast_command()
        .args(["--reference-date", "2020-05-01"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("no historical record for reference date 2020-05-01"));
}

#[test]
fn negative_horizon_fails() {
    let output = forecast_command()
        .args(["--horizon-days", "-1"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("horizon must be non-negative, got -1 days"));
}
