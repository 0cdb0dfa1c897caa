//! Ingestion layer: transcript text into classified records
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌───────────────┐     ┌────────────────────┐
//! │ JSONL text   │ ──► │ ingest_lines  │ ──► │ ParsedTranscript   │
//! │ (one object  │     │ (Record per   │     │ ├─ session_meta    │
//! │  per line)   │     │  non-blank    │     │ ├─ turn_context    │
//! └──────────────┘     │  line)        │     │ ├─ event_msg       │
//!                      └───────────────┘     │ ├─ response_item   │
//!                                            │ └─ unknown         │
//!                                            └────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use rollview_core::ingest::{parse_transcript, RecordKind};
//!
//! let text = r#"{"type":"event_msg","payload":{"type":"user_message","message":"hi"}}"#;
//! let parsed = parse_transcript(text).unwrap();
//! assert_eq!(parsed.count_of(RecordKind::EventMsg), 1);
//! ```

mod classify;
mod record;

pub use classify::{ParsedTranscript, RecordKind};
pub use record::{ingest_lines, IngestedLines, Record};

use crate::error::Result;

/// Ingest and classify a whole transcript.
///
/// Fails on the first malformed line; no partial result is returned.
pub fn parse_transcript(text: &str) -> Result<ParsedTranscript> {
    let ingested = ingest_lines(text)?;

    tracing::debug!(
        total_lines = ingested.total_lines,
        non_empty_lines = ingested.non_empty_lines,
        "Ingested transcript lines"
    );

    let parsed = ParsedTranscript::classify(ingested);

    tracing::debug!(
        session_meta = parsed.count_of(RecordKind::SessionMeta),
        turn_context = parsed.count_of(RecordKind::TurnContext),
        event_msg = parsed.count_of(RecordKind::EventMsg),
        response_item = parsed.count_of(RecordKind::ResponseItem),
        unknown = parsed.count_of(RecordKind::Unknown),
        "Classified records"
    );

    Ok(parsed)
}
