use assert_cmd::cargo::cargo_bin_cmd;
use serde::Deserialize;
use std::{error::Error, fs, path::PathBuf};

#[derive(Debug, Deserialize, PartialEq)]
struct Marker {
    start: f64,
    end: f64,
}

#[test]
fn markers_append_undo_and_save() -> Result<(), Box<dyn Error>> {
    let input = workspace_root().join("test_data/markers_sample.csv");
    let dir = tempfile::tempdir()?;
    let out = dir.path().join("events.csv");

    let mut cmd = cargo_bin_cmd!("dbsview");
    cmd.args([
        "markers",
        "--input",
        input.to_str().expect("utf8 path"),
        "--add",
        "10.25",
        "11.5",
        "--add",
        "20",
        "21",
        "--undo",
        "--out",
        out.to_str().expect("utf8 path"),
    ]);
    let output = cmd.assert().success().get_output().stdout.clone();
    let markers: Vec<Marker> = serde_json::from_slice(&output)?;
    assert_eq!(
        markers,
        vec![
            Marker { start: 1.0, end: 2.0 },
            Marker { start: 5.0, end: 6.0 },
            Marker { start: 10.25, end: 11.5 },
        ]
    );

    let saved = fs::read_to_string(&out)?;
    assert_eq!(
        saved,
        "Start Time (s),End Time (s)\n1.000,2.000\n5.000,6.000\n10.250,11.500\n"
    );
    Ok(())
}

#[test]
fn saving_an_empty_list_fails() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let out = dir.path().join("events.csv");
    let mut cmd = cargo_bin_cmd!("dbsview");
    cmd.args(["markers", "--out", out.to_str().expect("utf8 path")]);
    cmd.assert().failure();
    assert!(!out.exists());
    Ok(())
}

fn workspace_root() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .expect("crates dir")
        .parent()
        .expect("workspace root")
        .to_path_buf()
}
