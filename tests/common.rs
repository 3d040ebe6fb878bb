#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

pub const SESSIONS_JSON: &str = r#"[
  {
    "id": "s-night-far",
    "created_at": "2024-03-04T21:15:00Z",
    "day_period": "night",
    "effort": true,
    "overall_hit_percentage": 64.5,
    "assignment_name": "Night qualification",
    "total_shots": 40,
    "total_hits": 26,
    "participants": ["u-ana"],
    "target_stats": [
      {"target_index": 1, "distance_m": 650, "engagements": [{"user_id": "u-ana", "shots_fired": 20, "target_hits": 13}]},
      {"target_index": 2, "distance_m": 820}
    ]
  },
  {
    "id": "s-day-mid",
    "created_at": "2024-03-02T09:00:00Z",
    "day_period": "day",
    "effort": false,
    "overall_hit_percentage": 80,
    "target_stats": [{"distance_m": 300}, {"distance_m": 550}]
  },
  {
    "id": "s-day-mid-effort",
    "created_at": "2024-03-01T09:00:00Z",
    "day_period": "day",
    "effort": true,
    "overall_hit_percentage": 80,
    "target_stats": [{"distance_m": 450, "engagements": [{"user_id": "u-ben", "shots_fired": 10, "target_hits": 8}]}]
  },
  {
    "id": "s-no-targets",
    "created_at": "2024-03-03",
    "day_period": "day",
    "effort": null,
    "overall_hit_percentage": null,
    "target_stats": null
  },
  {
    "id": "s-legacy",
    "created_at": "2024-02-20T12:00:00Z",
    "overall_hit_percentage": 55,
    "targets": [{"distance_m": 1000}]
  }
]"#;

pub struct TestEnvironment {
    // Dropping the TempDir removes the workspace.
    _temp_dir: TempDir,
    pub work_dir: PathBuf,
    pub config_dir: PathBuf,
}

impl Default for TestEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEnvironment {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let work_dir = temp_dir.path().join("work");
        let config_dir = temp_dir.path().join("config");
        fs::create_dir_all(&work_dir).expect("mkdir work");
        fs::create_dir_all(&config_dir).expect("mkdir config");
        Self {
            _temp_dir: temp_dir,
            work_dir,
            config_dir,
        }
    }

    pub fn write_sessions(&self, content: &str) -> PathBuf {
        let path = self.work_dir.join("sessions.json");
        fs::write(&path, content).expect("write sessions");
        path
    }

    pub fn write_config(&self, content: &str) -> PathBuf {
        let path = self.config_dir.join("config.toml");
        fs::write(&path, content).expect("write config");
        path
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut command = Command::new(rangelog_bin());
        command
            .args(["--config-dir", path_str(&self.config_dir)])
            .args(args)
            .current_dir(&self.work_dir)
            .env_remove("RANGELOG_CONFIG_DIR")
            .env_remove("RANGELOG_LOG")
            .env("NO_COLOR", "1");
        command
    }

    pub fn run(&self, args: &[&str]) -> Output {
        self.command(args).output().expect("run rangelog")
    }

    pub fn run_with_stdin(&self, args: &[&str], stdin: &str) -> Output {
        let mut child = self
            .command(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("spawn rangelog");
        child
            .stdin
            .take()
            .expect("stdin")
            .write_all(stdin.as_bytes())
            .expect("write stdin");
        child.wait_with_output().expect("wait rangelog")
    }
}

pub fn rangelog_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_rangelog"))
}

pub fn path_str(path: &Path) -> &str {
    path.to_str().expect("utf-8 path")
}

pub fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "stderr:\n{}",
        String::from_utf8_lossy(&output.stderr)
    );
}

pub fn stdout_json(output: &Output) -> serde_json::Value {
    assert_success(output);
    serde_json::from_slice(&output.stdout).expect("parse json stdout")
}

pub fn session_ids(json: &serde_json::Value) -> Vec<String> {
    json["result"]["sessions"]
        .as_array()
        .expect("sessions array")
        .iter()
        .map(|s| s["id"].as_str().expect("id").to_string())
        .collect()
}
