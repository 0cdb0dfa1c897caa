//! # rollview-core
//!
//! Core library for rollview - a replayer for Codex rollout transcripts.
//!
//! This library provides:
//! - Domain types for threads, turns, and items
//! - Line-oriented transcript ingestion and record classification
//! - Turn reconstruction from the event stream, with a response-item fallback
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Architecture
//!
//! Data flows through three layers:
//! - **Layer 0 (Raw):** JSONL transcript text (immutable)
//! - **Layer 1 (Parsed):** Records bucketed by kind, each keeping its raw JSON
//! - **Layer 2 (Replayed):** The reconstructed thread plus its configuration
//!
//! ## Example
//!
//! ```rust
//! use rollview_core::{replay_transcript, ReplayOptions, TurnStatus};
//!
//! let text = r#"{"type":"event_msg","payload":{"type":"task_started","turn_id":"t1"}}
//! {"type":"event_msg","payload":{"type":"user_message","message":"hi"}}
//! {"type":"event_msg","payload":{"type":"task_complete","turn_id":"t1"}}"#;
//!
//! let state = replay_transcript(text, &ReplayOptions::default()).unwrap();
//! assert_eq!(state.thread.turns[0].id, "t1");
//! assert_eq!(state.thread.turns[0].status, TurnStatus::Completed);
//! assert_eq!(state.thread.preview, "hi");
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use error::{Error, Result};
pub use ingest::{parse_transcript, ParsedTranscript, Record, RecordKind};
pub use replay::{build_runtime_state, replay_transcript, ReplayOptions};
pub use types::*;

// Public modules
pub mod config;
pub mod error;
pub mod format;
pub mod ingest;
pub mod logging;
pub mod replay;
pub mod types;
