use std::process::Command;

use tempfile::TempDir;

fn weave_binary() -> &'static str {
    env!("CARGO_BIN_EXE_weave")
}

fn write_config(dir: &TempDir, contents: &serde_json::Value) -> std::path::PathBuf {
    let path = dir.path().join("workflow.json");
    std::fs::write(&path, serde_json::to_string_pretty(contents).unwrap()).unwrap();
    path
}

#[test]
fn run_workflow_succeeds_and_exits_zero() {
    let dir = TempDir::new().unwrap();
    let config = serde_json::json!({
        "initial_input": {},
        "agents": [
            {"agent_id": "a", "agent_type": "calculator", "config": {"value": 10}},
            {"agent_id": "b", "agent_type": "calculator", "inputs": ["a"], "config": {"op": "add", "const": 5}},
        ],
    });
    let path = write_config(&dir, &config);

    let output = Command::new(weave_binary())
        .args(["run-workflow", "--config"])
        .arg(&path)
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["status"], serde_json::json!("success"));
    assert_eq!(result["agent_results"]["b"]["output"]["result"], serde_json::json!(15.0));
}

#[test]
fn run_workflow_with_cycle_exits_nonzero() {
    let dir = TempDir::new().unwrap();
    let config = serde_json::json!({
        "initial_input": {},
        "agents": [
            {"agent_id": "a", "agent_type": "calculator", "inputs": ["b"]},
            {"agent_id": "b", "agent_type": "calculator", "inputs": ["a"]},
        ],
    });
    let path = write_config(&dir, &config);

    let output = Command::new(weave_binary())
        .args(["run-workflow", "--config"])
        .arg(&path)
        .output()
        .unwrap();

    assert!(!output.status.success());
    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["status"], serde_json::json!("failed"));
}

#[test]
fn list_agents_lists_all_four_builtins() {
    let output = Command::new(weave_binary()).arg("list-agents").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for name in ["calculator", "static_fetch", "list_aggregate", "chart_series"] {
        assert!(stdout.contains(name), "expected '{name}' in:\n{stdout}");
    }
}

#[test]
fn list_tools_lists_all_four_builtins() {
    let output = Command::new(weave_binary()).arg("list-tools").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for name in ["calculator", "static_fetch", "list_aggregate", "chart_series"] {
        assert!(stdout.contains(name), "expected '{name}' in:\n{stdout}");
    }
}
