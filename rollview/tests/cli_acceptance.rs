use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

struct CliTestEnv {
    _temp_dir: TempDir,
    home: PathBuf,
    xdg_config: PathBuf,
    xdg_state: PathBuf,
    transcripts: PathBuf,
}

impl CliTestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let base = temp_dir.path().to_path_buf();
        let home = base.join("home");
        let xdg_config = base.join("xdg-config");
        let xdg_state = base.join("xdg-state");
        let transcripts = base.join("transcripts");

        fs::create_dir_all(&home).expect("failed to create HOME");
        fs::create_dir_all(&xdg_config).expect("failed to create XDG_CONFIG_HOME");
        fs::create_dir_all(&xdg_state).expect("failed to create XDG_STATE_HOME");
        fs::create_dir_all(&transcripts).expect("failed to create transcript dir");

        Self {
            _temp_dir: temp_dir,
            home,
            xdg_config,
            xdg_state,
            transcripts,
        }
    }

    /// Copy a core fixture under a rollout-style file name.
    fn seed_fixture(&self, fixture: &str) -> PathBuf {
        let source = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../rollview-core/tests/fixtures")
            .join(fixture);
        let target = self
            .transcripts
            .join(format!("rollout-2025-11-25T00-33-35-{fixture}"));
        fs::copy(source, &target).expect("failed to copy fixture");
        target
    }

    fn write_transcript(&self, name: &str, contents: &str) -> PathBuf {
        let target = self.transcripts.join(name);
        fs::write(&target, contents).expect("failed to write transcript");
        target
    }

    fn write_config(&self, contents: &str) -> PathBuf {
        let dir = self.xdg_config.join("rollview");
        fs::create_dir_all(&dir).expect("failed to create config dir");
        let path = dir.join("config.toml");
        fs::write(&path, contents).expect("failed to write config");
        path
    }
}

fn run_bin(env: &CliTestEnv, args: &[&str]) -> Output {
    let bin_path = PathBuf::from(assert_cmd::cargo::cargo_bin!("rollview"));

    Command::new(bin_path)
        .args(args)
        .env("HOME", &env.home)
        .env("XDG_CONFIG_HOME", &env.xdg_config)
        .env("XDG_STATE_HOME", &env.xdg_state)
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("failed to execute rollview: {e}"))
}

fn path_arg(path: &Path) -> &str {
    path.to_str().expect("temp path is not UTF-8")
}

fn assert_success(args: &[&str], output: &Output) {
    if output.status.success() {
        return;
    }

    let rendered_args = args
        .iter()
        .map(|arg| OsString::from(arg).to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    panic!(
        "rollview {rendered_args} failed\nstatus: {}\nstdout:\n{}\nstderr:\n{}",
        output.status, stdout, stderr
    );
}

#[test]
fn show_prints_runtime_state_json() {
    let env = CliTestEnv::new();
    let transcript = env.seed_fixture("full-session.jsonl");

    let args = ["show", path_arg(&transcript)];
    let output = run_bin(&env, &args);
    assert_success(&args, &output);

    let state: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("show should print JSON");
    assert_eq!(state["thread"]["id"], "019ab86e-1e83-75b0-b2d7-d335492e7026");
    assert_eq!(state["thread"]["turns"].as_array().map(Vec::len), Some(2));
    assert_eq!(state["model"], "gpt-5-codex");
    assert_eq!(
        state["meta"]["fileName"],
        "rollout-2025-11-25T00-33-35-full-session.jsonl"
    );

    // Logs go to the state dir, never to stdout
    assert!(env.xdg_state.join("rollview").exists());
}

#[test]
fn show_compact_is_single_line() {
    let env = CliTestEnv::new();
    let transcript = env.seed_fixture("rollback.jsonl");

    let args = ["show", "--compact", path_arg(&transcript)];
    let output = run_bin(&env, &args);
    assert_success(&args, &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim_end().lines().count(), 1);
}

#[test]
fn summary_lists_turns() {
    let env = CliTestEnv::new();
    let transcript = env.seed_fixture("full-session.jsonl");

    let args = ["summary", path_arg(&transcript)];
    let output = run_bin(&env, &args);
    assert_success(&args, &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Preview:   Why does the build fail?"));
    assert!(stdout.contains("Sandbox:   workspace-write"));
    assert!(stdout.contains("Branch:    main"));
    assert!(stdout.contains("turn 1 [completed] turn-a (3 items)"));
    assert!(
        stdout.contains("turn 2 [interrupted] turn-b (2 items)"),
        "unexpected summary:\n{stdout}"
    );
}

#[test]
fn check_reports_counts() {
    let env = CliTestEnv::new();
    let transcript = env.seed_fixture("response-items-only.jsonl");

    let args = ["check", path_arg(&transcript)];
    let output = run_bin(&env, &args);
    assert_success(&args, &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), "ok: turns=1, items=2, lines=5");
}

#[test]
fn check_fails_without_turns() {
    let env = CliTestEnv::new();
    let transcript = env.write_transcript(
        "empty.jsonl",
        "{\"type\":\"session_meta\",\"payload\":{\"id\":\"s\"}}\n",
    );

    let output = run_bin(&env, &["check", path_arg(&transcript)]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no turns reconstructed"), "stderr:\n{stderr}");
}

#[test]
fn malformed_line_is_reported_with_its_number() {
    let env = CliTestEnv::new();
    let transcript = env.seed_fixture("malformed-line.jsonl");

    let output = run_bin(&env, &["show", path_arg(&transcript)]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("line 2: invalid JSON syntax"), "stderr:\n{stderr}");
}

#[test]
fn config_default_model_applies() {
    let env = CliTestEnv::new();
    env.write_config("[replay]\ndefault_model = \"o4-mini\"\n");
    let transcript = env.seed_fixture("response-items-only.jsonl");

    let args = ["show", "--compact", path_arg(&transcript)];
    let output = run_bin(&env, &args);
    assert_success(&args, &output);

    let state: serde_json::Value = serde_json::from_slice(&output.stdout).expect("invalid JSON");
    assert_eq!(state["model"], "o4-mini");
    assert_eq!(state["meta"]["fallbackUsed"], true);
}

#[test]
fn explicit_config_flag_is_validated() {
    let env = CliTestEnv::new();
    let config = env.write_config("[replay]\ndefault_model = \"\"\n");
    let transcript = env.seed_fixture("rollback.jsonl");

    let output = run_bin(
        &env,
        &["--config", path_arg(&config), "check", path_arg(&transcript)],
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("default_model must not be empty"), "stderr:\n{stderr}");
}

#[test]
fn missing_file_fails() {
    let env = CliTestEnv::new();
    let missing = env.transcripts.join("nope.jsonl");

    let output = run_bin(&env, &["summary", path_arg(&missing)]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to read"), "stderr:\n{stderr}");
}

#[test]
fn verbose_echoes_logs_to_stderr_only() {
    let env = CliTestEnv::new();
    let transcript = env.seed_fixture("rollback.jsonl");

    let args = ["--verbose", "show", "--compact", path_arg(&transcript)];
    let output = run_bin(&env, &args);
    assert_success(&args, &output);

    let state: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should stay pure JSON");
    assert_eq!(state["meta"]["turnCount"], 3);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Logging initialized"), "stderr:\n{stderr}");
    assert!(stderr.contains("Replayed transcript"), "stderr:\n{stderr}");
}
