use assert_cmd::Command;
use predicates::prelude::*;

mod common;

fn vgenome() -> Command {
    let mut cmd = Command::cargo_bin("vgenome").unwrap();
    cmd.env_remove("VGENOME_CONFIG")
        .env_remove("VGENOME_DATA_DIR")
        .env_remove("VGENOME_BASE_URL");
    cmd
}

fn data_dir() -> String {
    common::dataset_dir().display().to_string()
}

#[test]
fn runs() {
    vgenome().assert().success();
}

#[test]
fn outputs_tool_name() {
    let mut cmd = vgenome();
    cmd.arg("-V");
    cmd.assert().success().stdout("vgenome 0.1.0\n");
}

#[test]
fn graph_prints_text() {
    let mut cmd = vgenome();
    cmd.args(["graph", "1", "--data-dir", &data_dir()]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Objects (3):"))
        .stdout(predicate::str::contains("1000: man flying"))
        .stdout(predicate::str::contains("5000: kite is red"))
        .stdout(predicate::str::contains("skipped 1 rel(s) and 1 attr(s)"));
}

#[test]
fn graph_prints_json() {
    let mut cmd = vgenome();
    cmd.args(["graph", "2", "--data-dir", &data_dir(), "--output", "json"]);
    let output = cmd.assert().success().get_output().stdout.clone();

    let value: serde_json::Value = serde_json::from_slice(&output).expect("valid JSON");
    assert_eq!(value["graph"]["image"]["id"], 2);
    assert_eq!(value["graph"]["relationships"].as_array().map(Vec::len), Some(2));
    assert_eq!(
        value["graph"]["entities"][0]["senses"][0]["definition"],
        "a tall perennial woody plant"
    );
    assert_eq!(value["report"]["dropped_relationships"], 0);
}

#[test]
fn graph_lowercases_names_on_request() {
    let tmp = tempfile::tempdir().expect("tempdir");
    common::copy_dataset(tmp.path());
    std::fs::write(
        tmp.path().join("by-id").join("3.json"),
        r#"{"objects": [{"object_id": 1, "x": 0, "y": 0, "w": 1, "h": 1, "names": ["Boat"]}], "relationships": []}"#,
    )
    .expect("write graph");

    let mut cmd = vgenome();
    cmd.args(["graph", "3", "--no-senses", "--lowercase-names"])
        .arg("--data-dir")
        .arg(tmp.path());
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("1: boat"));
}

#[test]
fn graph_for_unknown_image_reports_not_found() {
    let mut cmd = vgenome();
    cmd.args(["graph", "424242", "--data-dir", &data_dir()]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("not found"));
}

#[test]
fn graphs_fail_on_unknown_sense_by_default() {
    let mut cmd = vgenome();
    cmd.args(["graphs", "--data-dir", &data_dir()]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unicorn.n.01"));
}

#[test]
fn graphs_summary_with_skip_policy() {
    let mut cmd = vgenome();
    cmd.args([
        "graphs",
        "--data-dir",
        &data_dir(),
        "--unresolved-senses",
        "skip",
        "--min-rels",
        "2",
        "--max-rels",
        "5",
    ]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Accepted 2 of 4 graph(s)"));
}

#[test]
fn graphs_json_lists_accepted_images() {
    let mut cmd = vgenome();
    cmd.args([
        "graphs",
        "--data-dir",
        &data_dir(),
        "--no-senses",
        "--start",
        "1",
        "--output",
        "json",
    ]);
    let output = cmd.assert().success().get_output().stdout.clone();

    let value: serde_json::Value = serde_json::from_slice(&output).expect("valid JSON");
    assert_eq!(value["image_ids"], serde_json::json!([2, 3, 10]));
    assert_eq!(value["report"]["graphs_accepted"], 3);
}

#[test]
fn inverted_bounds_are_rejected() {
    let mut cmd = vgenome();
    cmd.args([
        "graphs",
        "--data-dir",
        &data_dir(),
        "--min-rels",
        "5",
        "--max-rels",
        "1",
    ]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("min_rels"));
}

#[test]
fn config_file_supplies_defaults() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let config = tmp.path().join("vgenome.yaml");
    std::fs::write(
        &config,
        format!(
            "data_dir: {}\nunresolved_senses: skip\nmin_rels: 1\nmax_rels: 1\n",
            data_dir()
        ),
    )
    .expect("write config");

    let mut cmd = vgenome();
    cmd.arg("graphs").arg("--config").arg(&config);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Accepted 1 of 4 graph(s)"));
}

#[test]
fn regions_summary() {
    let mut cmd = vgenome();
    cmd.args(["regions", "--data-dir", &data_dir()]);
    cmd.assert()
        .success()
        .stdout("Loaded 3 region description(s) across 2 image(s)\n");
}

#[test]
fn qas_summary_json() {
    let mut cmd = vgenome();
    cmd.args(["qas", "--data-dir", &data_dir(), "--output", "json"]);
    let output = cmd.assert().success().get_output().stdout.clone();

    let value: serde_json::Value = serde_json::from_slice(&output).expect("valid JSON");
    assert_eq!(value, serde_json::json!({"images": 2, "items": 3}));
}

#[test]
fn vrd_summary() {
    let mut cmd = vgenome();
    cmd.arg("vrd").arg(common::vrd_fixture());
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Loaded 2 graph(s) with 1 relationship(s)"))
        .stdout(predicate::str::contains("skipped 1 rel(s)"));
}

#[test]
fn missing_data_dir_fails_with_path() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let mut cmd = vgenome();
    cmd.arg("regions").arg("--data-dir").arg(tmp.path());
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("image_data.json"));
}
