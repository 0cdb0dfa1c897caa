//! Turn reconstruction from `event_msg` records.
//!
//! The builder is a small state machine: either no turn is open, or one
//! [`PendingTurn`] is, flagged with whether an explicit `task_started` opened
//! it and whether a compaction marker was seen while it was empty. Events are
//! replayed in order; closed turns land in `turns` and are only touched again
//! by completion/abort events naming their id, or dropped by a rollback.

use super::fields::Fields;
use crate::ingest::Record;
use crate::types::{ThreadItem, Turn, TurnStatus, UserInput};
use uuid::Uuid;

/// Rebuild turns from `event_msg` records, in source order.
pub fn build_turns_from_event_msgs<'a>(events: impl IntoIterator<Item = &'a Record>) -> Vec<Turn> {
    let mut builder = ThreadHistoryBuilder::new();
    for record in events {
        if let Some(event) = ReplayEvent::from_record(record) {
            builder.handle_event(event);
        }
    }
    builder.finish()
}

pub(crate) fn generated_turn_id() -> String {
    format!("turn-{}", Uuid::new_v4())
}

/// Hands out `item-1`, `item-2`, ... for one parse.
#[derive(Debug)]
pub(crate) struct ItemIds {
    next: usize,
}

impl ItemIds {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn next_id(&mut self) -> String {
        let id = format!("item-{}", self.next);
        self.next += 1;
        id
    }

    /// Continue numbering after `issued` existing items.
    pub fn reset_after(&mut self, issued: usize) {
        self.next = issued + 1;
    }
}

/// The event kinds reconstruction reacts to.
#[derive(Debug, Clone, PartialEq)]
enum ReplayEvent<'a> {
    UserMessage(Vec<UserInput>),
    AgentMessage(&'a str),
    AgentReasoning(&'a str),
    AgentReasoningRawContent(&'a str),
    TurnStarted(Option<&'a str>),
    TurnComplete(Option<&'a str>),
    TurnAborted(Option<&'a str>),
    ThreadRolledBack(usize),
    ContextCompacted,
    Ignored,
}

impl<'a> ReplayEvent<'a> {
    /// `None` when the payload is not an object with a string `type`.
    fn from_record(record: &'a Record) -> Option<Self> {
        let payload = Fields::from_map(record.payload_object());
        let kind = payload.str(&["type"])?;
        let turn_id = || payload.str(&["turn_id", "turnId"]).filter(|id| !id.is_empty());
        let text = |name: &str| payload.str(&[name]).unwrap_or_default();

        Some(match kind {
            "user_message" => ReplayEvent::UserMessage(build_user_inputs(payload)),
            "agent_message" => ReplayEvent::AgentMessage(text("message")),
            "agent_reasoning" => ReplayEvent::AgentReasoning(text("text")),
            "agent_reasoning_raw_content" => ReplayEvent::AgentReasoningRawContent(text("text")),
            "task_started" | "turn_started" => ReplayEvent::TurnStarted(turn_id()),
            "task_complete" | "turn_complete" => ReplayEvent::TurnComplete(turn_id()),
            "turn_aborted" => ReplayEvent::TurnAborted(turn_id()),
            "thread_rolled_back" => {
                let count = payload
                    .number(&["num_turns", "numTurns"])
                    .filter(|n| n.is_finite() && *n > 0.0)
                    .map(|n| n.floor() as usize)
                    .unwrap_or(0);
                ReplayEvent::ThreadRolledBack(count)
            }
            "context_compacted" => ReplayEvent::ContextCompacted,
            _ => ReplayEvent::Ignored,
        })
    }
}

fn build_user_inputs(payload: Fields<'_>) -> Vec<UserInput> {
    let mut content = Vec::new();

    if let Some(message) = payload.str(&["message"]).filter(|m| !m.trim().is_empty()) {
        content.push(UserInput::Text {
            text: message.to_string(),
            text_elements: payload
                .array(&["text_elements", "textElements"])
                .cloned()
                .unwrap_or_default(),
        });
    }

    let strings = |name: &str| {
        payload
            .array(&[name])
            .into_iter()
            .flatten()
            .filter_map(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>()
    };

    content.extend(strings("images").into_iter().map(|url| UserInput::Image { url }));
    content.extend(
        strings("local_images")
            .into_iter()
            .map(|path| UserInput::LocalImage { path }),
    );

    content
}

/// The open turn and its bookkeeping flags.
#[derive(Debug)]
struct PendingTurn {
    id: String,
    items: Vec<ThreadItem>,
    status: TurnStatus,
    opened_explicitly: bool,
    saw_compaction: bool,
}

impl PendingTurn {
    fn implicit() -> Self {
        Self {
            id: generated_turn_id(),
            items: Vec::new(),
            status: TurnStatus::Completed,
            opened_explicitly: false,
            saw_compaction: false,
        }
    }

    fn explicit(turn_id: Option<&str>) -> Self {
        Self {
            id: turn_id.map(str::to_string).unwrap_or_else(generated_turn_id),
            items: Vec::new(),
            status: TurnStatus::InProgress,
            opened_explicitly: true,
            saw_compaction: false,
        }
    }

    /// Implicit turns that never received content are bookkeeping noise.
    fn is_discardable(&self) -> bool {
        self.items.is_empty() && !self.opened_explicitly && !self.saw_compaction
    }

    /// A following user message starts a new turn unless this one was opened
    /// explicitly or is an empty shell left behind by a compaction.
    fn yields_to_user_message(&self) -> bool {
        !self.opened_explicitly && !(self.saw_compaction && self.items.is_empty())
    }
}

impl From<PendingTurn> for Turn {
    fn from(value: PendingTurn) -> Self {
        Self {
            id: value.id,
            items: value.items,
            status: value.status,
            error: None,
        }
    }
}

fn mark_completed(status: &mut TurnStatus) {
    if matches!(status, TurnStatus::InProgress | TurnStatus::Completed) {
        *status = TurnStatus::Completed;
    }
}

fn mark_interrupted(status: &mut TurnStatus) {
    if *status != TurnStatus::Failed {
        *status = TurnStatus::Interrupted;
    }
}

struct ThreadHistoryBuilder {
    turns: Vec<Turn>,
    current_turn: Option<PendingTurn>,
    item_ids: ItemIds,
}

impl ThreadHistoryBuilder {
    fn new() -> Self {
        Self {
            turns: Vec::new(),
            current_turn: None,
            item_ids: ItemIds::new(),
        }
    }

    fn finish(mut self) -> Vec<Turn> {
        self.finish_current_turn();
        self.turns
    }

    fn handle_event(&mut self, event: ReplayEvent<'_>) {
        match event {
            ReplayEvent::UserMessage(content) => self.handle_user_message(content),
            ReplayEvent::AgentMessage(text) => self.handle_agent_message(text),
            ReplayEvent::AgentReasoning(text) => self.handle_reasoning(text, false),
            ReplayEvent::AgentReasoningRawContent(text) => self.handle_reasoning(text, true),
            ReplayEvent::TurnStarted(turn_id) => {
                self.finish_current_turn();
                self.current_turn = Some(PendingTurn::explicit(turn_id));
            }
            ReplayEvent::TurnComplete(turn_id) => self.handle_turn_complete(turn_id),
            ReplayEvent::TurnAborted(turn_id) => self.handle_turn_aborted(turn_id),
            ReplayEvent::ThreadRolledBack(count) => self.handle_thread_rollback(count),
            ReplayEvent::ContextCompacted => {
                if let Some(turn) = self.current_turn.as_mut() {
                    turn.saw_compaction = true;
                }
            }
            ReplayEvent::Ignored => {}
        }
    }

    fn handle_user_message(&mut self, content: Vec<UserInput>) {
        if self
            .current_turn
            .as_ref()
            .is_some_and(PendingTurn::yields_to_user_message)
        {
            self.finish_current_turn();
        }

        let id = self.item_ids.next_id();
        self.ensure_turn()
            .items
            .push(ThreadItem::UserMessage { id, content });
    }

    fn handle_agent_message(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }

        let id = self.item_ids.next_id();
        self.ensure_turn().items.push(ThreadItem::AgentMessage {
            id,
            text: text.to_string(),
            phase: None,
        });
    }

    /// Summary (`raw == false`) or raw content fragments extend a trailing
    /// reasoning item; anything else starts a new one.
    fn handle_reasoning(&mut self, text: &str, raw: bool) {
        if text.is_empty() {
            return;
        }

        if let Some(ThreadItem::Reasoning {
            summary, content, ..
        }) = self.ensure_turn().items.last_mut()
        {
            let target = if raw { content } else { summary };
            target.push(text.to_string());
            return;
        }

        let id = self.item_ids.next_id();
        let (summary, content) = if raw {
            (Vec::new(), vec![text.to_string()])
        } else {
            (vec![text.to_string()], Vec::new())
        };
        self.ensure_turn().items.push(ThreadItem::Reasoning {
            id,
            summary,
            content,
        });
    }

    fn current_turn_has_id(&self, turn_id: Option<&str>) -> bool {
        match (turn_id, self.current_turn.as_ref()) {
            (Some(id), Some(turn)) => turn.id == id,
            _ => false,
        }
    }

    fn closed_turn_mut(&mut self, turn_id: Option<&str>) -> Option<&mut Turn> {
        let id = turn_id?;
        self.turns.iter_mut().find(|turn| turn.id == id)
    }

    fn handle_turn_complete(&mut self, turn_id: Option<&str>) {
        if self.current_turn_has_id(turn_id) {
            self.complete_current_turn();
            return;
        }

        if let Some(turn) = self.closed_turn_mut(turn_id) {
            mark_completed(&mut turn.status);
            return;
        }

        // Best effort: an unmatched id still completes whatever is open.
        if self.current_turn.is_some() {
            tracing::debug!(turn_id = ?turn_id, "Completion matched no turn, closing the open one");
            self.complete_current_turn();
        }
    }

    fn complete_current_turn(&mut self) {
        if let Some(turn) = self.current_turn.as_mut() {
            mark_completed(&mut turn.status);
        }
        self.finish_current_turn();
    }

    fn handle_turn_aborted(&mut self, turn_id: Option<&str>) {
        if self.current_turn_has_id(turn_id) {
            if let Some(turn) = self.current_turn.as_mut() {
                mark_interrupted(&mut turn.status);
            }
            return;
        }

        if let Some(turn) = self.closed_turn_mut(turn_id) {
            mark_interrupted(&mut turn.status);
            return;
        }

        if let Some(turn) = self.current_turn.as_mut() {
            mark_interrupted(&mut turn.status);
        }
    }

    fn handle_thread_rollback(&mut self, count: usize) {
        self.finish_current_turn();

        let keep = self.turns.len().saturating_sub(count);
        tracing::debug!(
            requested = count,
            dropped = self.turns.len() - keep,
            "Rolling back turns"
        );
        self.turns.truncate(keep);

        let item_count: usize = self.turns.iter().map(|t| t.items.len()).sum();
        self.item_ids.reset_after(item_count);
    }

    fn finish_current_turn(&mut self) {
        let Some(pending) = self.current_turn.take() else {
            return;
        };
        if pending.is_discardable() {
            return;
        }

        let mut turn = Turn::from(pending);
        if self.turns.iter().any(|t| t.id == turn.id) {
            let fresh = generated_turn_id();
            tracing::warn!(turn_id = %turn.id, new_id = %fresh, "Duplicate turn id, renaming");
            turn.id = fresh;
        }
        self.turns.push(turn);
    }

    fn ensure_turn(&mut self) -> &mut PendingTurn {
        self.current_turn.get_or_insert_with(PendingTurn::implicit)
    }
}
