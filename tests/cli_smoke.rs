use std::{path::Path, process::Command};

const CORPUS: &str = "--- Page 4 ---\nMurabaha is a sale at cost plus an agreed profit.\n\n\
                      --- Page 5 ---\nIjarah is a lease of a usufruct for rent.";

fn aaoifi_kb(data_dir: &Path, enabled: &str) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_aaoifi-kb"));
    cmd.arg("--data-dir")
        .arg(data_dir)
        .arg("-q")
        .env("ENABLE_PDF_KNOWLEDGE", enabled)
        .env_remove("AAOIFI_KB_LOG");
    cmd
}

fn stdout(cmd: &mut Command) -> String {
    let output = cmd.output().expect("run aaoifi-kb");
    assert!(
        output.status.success(),
        "aaoifi-kb failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).expect("utf-8 stdout")
}

#[test]
fn context_prints_labelled_block() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("AAOIFI-Standards.txt"), CORPUS).unwrap();

    let out = stdout(aaoifi_kb(tmp.path(), "true").args(["context", "ijarah"]));

    assert!(out.starts_with("[AAOIFI Standards - Page 4]\n"));
    assert!(out.contains("Ijarah is a lease"));
}

#[test]
fn context_is_empty_when_disabled() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("AAOIFI-Standards.txt"), CORPUS).unwrap();

    let out =
        stdout(aaoifi_kb(tmp.path(), "false").args(["context", "ijarah"]));
    assert!(out.is_empty());

    let status =
        stdout(aaoifi_kb(tmp.path(), "False").args(["status", "--json"]));
    let value: serde_json::Value = serde_json::from_str(&status).unwrap();
    assert_eq!(value["status"]["state"], "disabled");
}

#[test]
fn search_json_lists_ranked_chunks() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("AAOIFI-Standards.txt"), CORPUS).unwrap();

    let out = stdout(aaoifi_kb(tmp.path(), "true").args([
        "search",
        "murabaha profit",
        "--json",
    ]));
    let hits: serde_json::Value = serde_json::from_str(&out).unwrap();
    let hits = hits.as_array().expect("array of hits");

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["rank"], 1);
    assert_eq!(hits[0]["score"], 2);
    assert_eq!(hits[0]["page"], "4");
}

#[test]
fn status_reports_failed_load() {
    let tmp = tempfile::tempdir().unwrap();

    let out =
        stdout(aaoifi_kb(tmp.path(), "true").args(["status", "--json"]));
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();

    assert_eq!(value["status"]["state"], "loadFailed");
    assert!(
        value["status"]["reason"]
            .as_str()
            .unwrap()
            .contains("not found")
    );
}

#[test]
fn prompt_wraps_question_with_context() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("AAOIFI-Standards.txt"), CORPUS).unwrap();

    let out = stdout(aaoifi_kb(tmp.path(), "true").args(["prompt", "murabaha"]));

    assert!(out.starts_with("murabaha\n\n---\nRelevant context from AAOIFI Standards:\n"));
    assert!(out.contains("[AAOIFI Standards - Page 4]"));
}

#[test]
fn completions_script_names_the_binary() {
    let tmp = tempfile::tempdir().unwrap();

    let out = stdout(aaoifi_kb(tmp.path(), "true").args(["completions", "bash"]));
    assert!(out.contains("aaoifi-kb"));
    assert!(out.contains("context"));
}
