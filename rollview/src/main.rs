//! rollview - Codex rollout transcript replayer
//!
//! Rebuilds the thread, turns and items of a recorded session from its JSONL
//! transcript and prints them as JSON or as a short summary.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rollview_core::format::{
    describe_item, describe_turn, format_duration_secs, format_unix_seconds, truncate_preview,
};
use rollview_core::{replay_transcript, Config, ReplayOptions, RuntimeState};

/// Item `type` tags a replayed thread may contain.
const KNOWN_ITEM_KINDS: &[&str] = &[
    "userMessage",
    "agentMessage",
    "reasoning",
    "commandExecution",
    "fileChange",
    "mcpToolCall",
    "imageView",
    "contextCompaction",
    "enteredReviewMode",
    "exitedReviewMode",
    "webSearch",
    "collabAgentToolCall",
];

#[derive(Parser)]
#[command(name = "rollview")]
#[command(about = "Replay Codex rollout transcripts into threads, turns and items")]
#[command(version)]
struct Args {
    /// Config file to use instead of $XDG_CONFIG_HOME/rollview/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level, echoing log lines to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the replayed runtime state as JSON
    Show {
        /// Transcript file (`-` for stdin)
        file: PathBuf,

        /// Single-line JSON instead of pretty-printed
        #[arg(long)]
        compact: bool,
    },
    /// Print a human-readable summary of the thread
    Summary {
        /// Transcript file (`-` for stdin)
        file: PathBuf,
    },
    /// Replay and verify the thread structure
    Check {
        /// Transcript file (`-` for stdin)
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = match &args.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => Config::load().context("failed to load configuration")?,
    };
    if args.verbose {
        config.logging.level = "debug".to_string();
        config.logging.stderr = true;
    }

    // Initialize logging
    let _log_guard =
        rollview_core::logging::init(&config.logging).context("failed to initialize logging")?;

    let options = ReplayOptions::from_config(&config);

    match args.command {
        Command::Show { file, compact } => {
            let state = load_state(&file, &options)?;
            let json = if compact {
                serde_json::to_string(&state)
            } else {
                serde_json::to_string_pretty(&state)
            }
            .context("failed to serialize runtime state")?;
            println!("{}", json);
        }
        Command::Summary { file } => {
            let state = load_state(&file, &options)?;
            print_summary(&state);
        }
        Command::Check { file } => {
            let state = load_state(&file, &options)?;
            check_state(&state)?;
            println!(
                "ok: turns={}, items={}, lines={}",
                state.meta.turn_count, state.meta.item_count, state.meta.non_empty_lines
            );
        }
    }

    Ok(())
}

fn load_state(path: &Path, options: &ReplayOptions) -> Result<RuntimeState> {
    let text = read_transcript(path)?;

    let options = match path.file_name() {
        Some(name) if path != Path::new("-") => options
            .clone()
            .with_file_name(name.to_string_lossy().into_owned()),
        _ => options.clone(),
    };

    tracing::info!(path = %path.display(), bytes = text.len(), "Replaying transcript");

    replay_transcript(&text, &options)
        .with_context(|| format!("failed to replay {}", path.display()))
}

fn read_transcript(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read transcript from stdin")?;
        return Ok(text);
    }

    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn print_summary(state: &RuntimeState) {
    let thread = &state.thread;

    println!("Thread:    {}", thread.id);
    if let Some(file_name) = &state.meta.file_name {
        println!("File:      {}", file_name);
    }
    println!("Preview:   {}", truncate_preview(&thread.preview, 72));
    println!("Cwd:       {}", thread.cwd);
    println!("Source:    {}", thread.source.as_str());
    println!("Model:     {} ({})", state.model, state.model_provider);
    println!("Sandbox:   {}", state.sandbox_mode);
    println!("Approval:  {}", state.approval_policy.as_str());
    if let Some(effort) = &state.reasoning_effort {
        println!("Effort:    {}", effort.as_str());
    }
    println!(
        "Started:   {} (lasted {})",
        format_unix_seconds(thread.created_at),
        format_duration_secs(thread.updated_at - thread.created_at)
    );
    if let Some(branch) = thread.git_info.as_ref().and_then(|g| g.branch.as_deref()) {
        println!("Branch:    {}", branch);
    }
    println!(
        "Lines:     {} ({} non-empty)",
        state.meta.total_lines, state.meta.non_empty_lines
    );
    if state.meta.fallback_used {
        println!("Note:      no turn events, rebuilt from response items");
    }

    println!();
    for (index, turn) in thread.turns.iter().enumerate() {
        println!("{}", describe_turn(index, turn));
        for item in &turn.items {
            println!("    {}", describe_item(item));
        }
    }
}

/// Structural checks on the serialized thread, as a consumer would see it.
fn check_state(state: &RuntimeState) -> Result<()> {
    if state.thread.id.trim().is_empty() {
        anyhow::bail!("thread id is empty");
    }
    if state.thread.turns.is_empty() {
        anyhow::bail!("no turns reconstructed");
    }

    let value = serde_json::to_value(&state.thread).context("failed to serialize thread")?;
    let turns = value["turns"].as_array().map(Vec::as_slice).unwrap_or_default();
    for turn in turns {
        let items = turn["items"].as_array().map(Vec::as_slice).unwrap_or_default();
        for item in items {
            let kind = item["type"].as_str().unwrap_or_default();
            if !KNOWN_ITEM_KINDS.contains(&kind) {
                anyhow::bail!(
                    "turn {} has item of unknown type '{}'",
                    turn["id"].as_str().unwrap_or_default(),
                    kind
                );
            }
        }
    }

    Ok(())
}
