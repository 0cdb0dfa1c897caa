//! Best-effort turns from `response_item` records.
//!
//! Used only when the event stream produced nothing. Turn boundaries come from
//! message roles alone: every user message starts a turn.

use super::fields::Fields;
use super::history::{generated_turn_id, ItemIds};
use crate::ingest::Record;
use crate::types::{MessagePhase, ThreadItem, Turn, TurnStatus, UserInput};
use serde_json::Value;

/// Rebuild turns from raw model request/response records.
pub fn build_fallback_turns<'a>(response_items: impl IntoIterator<Item = &'a Record>) -> Vec<Turn> {
    let mut turns = Vec::new();
    let mut item_ids = ItemIds::new();
    let mut current: Option<Turn> = None;

    for record in response_items {
        let payload = Fields::from_map(record.payload_object());

        match payload.str(&["type"]) {
            Some("message") => {
                let text = extract_message_text(payload.array(&["content"]));
                if text.is_empty() {
                    continue;
                }

                if payload.str(&["role"]).unwrap_or("assistant") == "user" {
                    if let Some(turn) = current.take().filter(|t| !t.items.is_empty()) {
                        turns.push(turn);
                    }
                    let id = item_ids.next_id();
                    current.get_or_insert_with(new_turn).items.push(ThreadItem::UserMessage {
                        id,
                        content: vec![UserInput::Text {
                            text,
                            text_elements: Vec::new(),
                        }],
                    });
                } else {
                    let id = item_ids.next_id();
                    current.get_or_insert_with(new_turn).items.push(ThreadItem::AgentMessage {
                        id,
                        text,
                        phase: payload.parse::<MessagePhase>(&["phase"]),
                    });
                }
            }
            Some("reasoning") => {
                let summary = extract_reasoning_text(payload.array(&["summary"]));
                let content = extract_reasoning_text(payload.array(&["content"]));
                if summary.is_empty() && content.is_empty() {
                    continue;
                }

                let id = item_ids.next_id();
                current.get_or_insert_with(new_turn).items.push(ThreadItem::Reasoning {
                    id,
                    summary,
                    content,
                });
            }
            _ => {}
        }
    }

    if let Some(turn) = current.filter(|t| !t.items.is_empty()) {
        turns.push(turn);
    }

    turns
}

fn new_turn() -> Turn {
    Turn {
        id: generated_turn_id(),
        items: Vec::new(),
        status: TurnStatus::Completed,
        error: None,
    }
}

/// Joins `input_text`/`output_text`/`text` parts with newlines, trimmed.
fn extract_message_text(content: Option<&Vec<Value>>) -> String {
    let parts: Vec<&str> = content
        .into_iter()
        .flatten()
        .filter_map(|part| {
            let part = Fields::new(Some(part));
            match part.str(&["type"]) {
                Some("input_text" | "output_text" | "text") => part.str(&["text"]),
                _ => None,
            }
        })
        .collect();

    parts.join("\n").trim().to_string()
}

/// Non-blank entries, given either as bare strings or as `{text}` objects.
fn extract_reasoning_text(entries: Option<&Vec<Value>>) -> Vec<String> {
    entries
        .into_iter()
        .flatten()
        .filter_map(|entry| match entry {
            Value::String(text) => Some(text.as_str()),
            other => Fields::new(Some(other)).str(&["text"]),
        })
        .filter(|text| !text.trim().is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn items(payloads: Vec<Value>) -> Vec<Record> {
        payloads
            .into_iter()
            .enumerate()
            .map(|(i, payload)| Record {
                line_number: i + 1,
                timestamp: None,
                record_type: "response_item".to_string(),
                raw: json!({"type": "response_item"}),
                payload: Some(payload),
            })
            .collect()
    }

    fn message(role: &str, text: &str) -> Value {
        let part = if role == "user" { "input_text" } else { "output_text" };
        json!({
            "type": "message",
            "role": role,
            "content": [{"type": part, "text": text}]
        })
    }

    #[test]
    fn test_user_then_assistant_forms_one_turn() {
        let turns = build_fallback_turns(&items(vec![
            message("user", "hello"),
            message("assistant", "hi back"),
        ]));

        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].status, TurnStatus::Completed);
        assert!(turns[0].error.is_none());
        assert_eq!(turns[0].items[0].kind(), "userMessage");
        assert_eq!(
            turns[0].items[1],
            ThreadItem::AgentMessage {
                id: "item-2".into(),
                text: "hi back".into(),
                phase: None,
            }
        );
    }

    #[test]
    fn test_each_user_message_starts_turn() {
        let turns = build_fallback_turns(&items(vec![
            message("assistant", "preamble"),
            message("user", "one"),
            message("user", "two"),
            message("assistant", "answer"),
        ]));

        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].items[0].kind(), "agentMessage");
        assert_eq!(turns[1].items.len(), 1);
        assert_eq!(turns[2].items.len(), 2);
    }

    #[test]
    fn test_message_text_joining_and_phase() {
        let turns = build_fallback_turns(&items(vec![json!({
            "type": "message",
            "phase": "finalAnswer",
            "content": [
                {"type": "output_text", "text": "  first"},
                {"type": "refusal", "text": "skipped"},
                {"type": "text", "text": "second  "},
                "bare string"
            ]
        })]));

        assert_eq!(
            turns[0].items[0],
            ThreadItem::AgentMessage {
                id: "item-1".into(),
                text: "first\nsecond".into(),
                phase: Some(MessagePhase::FinalAnswer),
            }
        );
    }

    #[test]
    fn test_unknown_phase_dropped_and_empty_messages_skipped() {
        let turns = build_fallback_turns(&items(vec![
            json!({"type": "message", "role": "user", "content": [{"type": "input_text", "text": "   "}]}),
            json!({"type": "message", "role": "assistant", "phase": "draft",
                   "content": [{"type": "output_text", "text": "ok"}]}),
        ]));

        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].items.len(), 1);
        assert_eq!(
            turns[0].items[0],
            ThreadItem::AgentMessage {
                id: "item-1".into(),
                text: "ok".into(),
                phase: None,
            }
        );
    }

    #[test]
    fn test_reasoning_items() {
        let turns = build_fallback_turns(&items(vec![
            message("user", "think"),
            json!({"type": "reasoning", "summary": [{"type": "summary_text", "text": "plan"}, " "], "content": ["raw"]}),
            json!({"type": "reasoning", "summary": [], "encrypted_content": "xyz"}),
            json!({"type": "function_call", "name": "shell"}),
        ]));

        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].items.len(), 2);
        assert_eq!(
            turns[0].items[1],
            ThreadItem::Reasoning {
                id: "item-2".into(),
                summary: vec!["plan".into()],
                content: vec!["raw".into()],
            }
        );
    }

    #[test]
    fn test_no_messages_no_turns() {
        assert!(build_fallback_turns(&items(vec![json!({"type": "other"}), json!(null)])).is_empty());
    }
}
