//! Replay: classified records into a [`RuntimeState`]
//!
//! ## Pipeline
//!
//! 1. [`history::build_turns_from_event_msgs`] replays `event_msg` records
//!    through the turn state machine.
//! 2. If that yields no turns, [`fallback::build_fallback_turns`] rebuilds
//!    turns from `response_item` messages instead.
//! 3. [`normalize`] derives the thread configuration from the first
//!    `session_meta` and the last `turn_context`.
//!
//! Every call works on fresh local state, so independent replays can run on
//! separate threads without coordination.

mod fields;
pub mod fallback;
pub mod history;
pub mod normalize;

pub use fallback::build_fallback_turns;
pub use history::build_turns_from_event_msgs;

use crate::config::{default_model, Config};
use crate::error::Result;
use crate::ingest::{parse_transcript, ParsedTranscript};
use crate::types::{ReplayMeta, RuntimeState, Thread, ThreadStatus};
use normalize::{find_first_user_preview, timestamp_range, SessionInfo, TurnConfig};
use uuid::Uuid;

/// Caller-supplied inputs that are not part of the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayOptions {
    /// Reported back in [`ReplayMeta::file_name`]
    pub file_name: Option<String>,
    /// Model reported when no turn context names one
    pub default_model: String,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            file_name: None,
            default_model: default_model(),
        }
    }
}

impl ReplayOptions {
    /// Options seeded from the `[replay]` config section.
    pub fn from_config(config: &Config) -> Self {
        Self {
            file_name: None,
            default_model: config.replay.default_model.clone(),
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        let file_name = file_name.into();
        self.file_name = (!file_name.is_empty()).then_some(file_name);
        self
    }
}

/// Parse and replay transcript text in one step.
pub fn replay_transcript(text: &str, options: &ReplayOptions) -> Result<RuntimeState> {
    let parsed = parse_transcript(text)?;
    build_runtime_state(&parsed, options)
}

/// Reconstruct the thread and its configuration from a parsed transcript.
///
/// Fails with [`crate::Error::Shape`] if `parsed` does not satisfy the
/// invariants ingestion establishes.
pub fn build_runtime_state(
    parsed: &ParsedTranscript,
    options: &ReplayOptions,
) -> Result<RuntimeState> {
    parsed.check_shape()?;

    let now = chrono::Utc::now().timestamp();
    let (created_at, updated_at) = timestamp_range(parsed.records(), now);

    let session = SessionInfo::from_payload(parsed.session_meta().and_then(|r| r.payload.as_ref()));
    let turn_config = TurnConfig::from_payload(
        parsed.turn_context().and_then(|r| r.payload.as_ref()),
        &session.cwd,
    );

    let mut turns = build_turns_from_event_msgs(parsed.event_msgs());
    let fallback_used = turns.is_empty();
    if fallback_used {
        turns = build_fallback_turns(parsed.response_items());
        tracing::debug!(
            turns = turns.len(),
            "No turns from event messages, used response items"
        );
    }

    let item_count = turns.iter().map(|t| t.items.len()).sum();
    let meta = ReplayMeta {
        file_name: options.file_name.clone(),
        total_lines: parsed.total_lines(),
        non_empty_lines: parsed.non_empty_lines(),
        turn_count: turns.len(),
        item_count,
        fallback_used,
    };

    let thread = Thread {
        id: session
            .id
            .unwrap_or_else(|| format!("thread-{}", Uuid::new_v4())),
        preview: find_first_user_preview(&turns),
        model_provider: session.model_provider.clone(),
        created_at,
        updated_at,
        status: ThreadStatus::Idle,
        path: None,
        cwd: session.cwd,
        cli_version: session.cli_version,
        source: session.source,
        git_info: session.git_info,
        turns,
    };

    tracing::info!(
        thread_id = %thread.id,
        turns = meta.turn_count,
        items = meta.item_count,
        fallback = meta.fallback_used,
        "Replayed transcript"
    );

    Ok(RuntimeState {
        thread,
        model: turn_config
            .model
            .unwrap_or_else(|| options.default_model.clone()),
        model_provider: session.model_provider,
        approval_policy: turn_config.approval_policy,
        sandbox_mode: turn_config.sandbox.mode(),
        sandbox: turn_config.sandbox,
        reasoning_effort: turn_config.reasoning_effort,
        meta,
    })
}
