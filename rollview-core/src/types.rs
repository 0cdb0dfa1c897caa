//! Core domain types for rollview
//!
//! These types form the reconstructed conversation model handed to consumers
//! (RPC shims, renderers). Every type serializes with camelCase field names and
//! owns all of its data, so a [`RuntimeState`] can be cloned or shipped across
//! a message boundary as-is.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Transcript** | An ordered, line-delimited log of session events for one conversation |
//! | **Thread** | The conversation reconstructed from one transcript |
//! | **Turn** | One exchange cycle (user input through agent completion) |
//! | **Item** | An atomic unit of turn content (message, reasoning, tool call, ...) |
//! | **Sandbox policy** | Filesystem/network access granted to tool execution |

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================
// Turns
// ============================================

/// Lifecycle of a turn. `InProgress` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TurnStatus {
    Completed,
    Interrupted,
    Failed,
    InProgress,
}

impl TurnStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnStatus::Completed => "completed",
            TurnStatus::Interrupted => "interrupted",
            TurnStatus::Failed => "failed",
            TurnStatus::InProgress => "inProgress",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, TurnStatus::InProgress)
    }
}

impl std::fmt::Display for TurnStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TurnStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(TurnStatus::Completed),
            "interrupted" => Ok(TurnStatus::Interrupted),
            "failed" => Ok(TurnStatus::Failed),
            "inProgress" => Ok(TurnStatus::InProgress),
            _ => Err(format!("unknown turn status: {}", s)),
        }
    }
}

/// Error attached to a failed turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnError {
    pub message: String,
}

/// One exchange cycle within a thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Turn {
    /// Unique within the thread
    pub id: String,
    /// Items in production order
    pub items: Vec<ThreadItem>,
    pub status: TurnStatus,
    pub error: Option<TurnError>,
}

// ============================================
// Items
// ============================================

/// Phase tag on agent messages produced by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MessagePhase {
    Commentary,
    FinalAnswer,
}

impl std::str::FromStr for MessagePhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "commentary" => Ok(MessagePhase::Commentary),
            "finalAnswer" => Ok(MessagePhase::FinalAnswer),
            _ => Err(format!("unknown message phase: {}", s)),
        }
    }
}

/// One part of a user message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum UserInput {
    Text {
        text: String,
        /// UI-defined spans within `text`, passed through untouched.
        #[serde(default)]
        text_elements: Vec<Value>,
    },
    Image {
        url: String,
    },
    LocalImage {
        path: String,
    },
}

impl UserInput {
    /// Text of a `Text` part.
    pub fn text(&self) -> Option<&str> {
        match self {
            UserInput::Text { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// Execution status shared by tool-like items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ToolStatus {
    InProgress,
    Completed,
    Failed,
    Declined,
}

/// Atomic unit of turn content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ThreadItem {
    #[serde(rename_all = "camelCase")]
    UserMessage { id: String, content: Vec<UserInput> },
    #[serde(rename_all = "camelCase")]
    AgentMessage {
        id: String,
        text: String,
        #[serde(default)]
        phase: Option<MessagePhase>,
    },
    /// Summary and raw-content fragments accumulate while reasoning events
    /// keep arriving back to back.
    #[serde(rename_all = "camelCase")]
    Reasoning {
        id: String,
        #[serde(default)]
        summary: Vec<String>,
        #[serde(default)]
        content: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    CommandExecution {
        id: String,
        command: String,
        cwd: String,
        status: ToolStatus,
        aggregated_output: Option<String>,
        exit_code: Option<i32>,
        duration_ms: Option<i64>,
    },
    #[serde(rename_all = "camelCase")]
    FileChange {
        id: String,
        changes: Vec<Value>,
        status: ToolStatus,
    },
    #[serde(rename_all = "camelCase")]
    McpToolCall {
        id: String,
        server: String,
        tool: String,
        status: ToolStatus,
        arguments: Value,
        result: Option<Value>,
        error: Option<String>,
        duration_ms: Option<i64>,
    },
    #[serde(rename_all = "camelCase")]
    ImageView { id: String, path: String },
    #[serde(rename_all = "camelCase")]
    ContextCompaction { id: String },
    #[serde(rename_all = "camelCase")]
    EnteredReviewMode { id: String, review: String },
    #[serde(rename_all = "camelCase")]
    ExitedReviewMode { id: String, review: String },
    #[serde(rename_all = "camelCase")]
    WebSearch { id: String, query: String },
    #[serde(rename_all = "camelCase")]
    CollabAgentToolCall {
        id: String,
        tool: String,
        status: ToolStatus,
        sender_thread_id: String,
        receiver_thread_ids: Vec<String>,
        prompt: Option<String>,
    },
}

impl ThreadItem {
    pub fn id(&self) -> &str {
        match self {
            ThreadItem::UserMessage { id, .. }
            | ThreadItem::AgentMessage { id, .. }
            | ThreadItem::Reasoning { id, .. }
            | ThreadItem::CommandExecution { id, .. }
            | ThreadItem::FileChange { id, .. }
            | ThreadItem::McpToolCall { id, .. }
            | ThreadItem::ImageView { id, .. }
            | ThreadItem::ContextCompaction { id }
            | ThreadItem::EnteredReviewMode { id, .. }
            | ThreadItem::ExitedReviewMode { id, .. }
            | ThreadItem::WebSearch { id, .. }
            | ThreadItem::CollabAgentToolCall { id, .. } => id,
        }
    }

    /// The serialized `type` tag of this item.
    pub fn kind(&self) -> &'static str {
        match self {
            ThreadItem::UserMessage { .. } => "userMessage",
            ThreadItem::AgentMessage { .. } => "agentMessage",
            ThreadItem::Reasoning { .. } => "reasoning",
            ThreadItem::CommandExecution { .. } => "commandExecution",
            ThreadItem::FileChange { .. } => "fileChange",
            ThreadItem::McpToolCall { .. } => "mcpToolCall",
            ThreadItem::ImageView { .. } => "imageView",
            ThreadItem::ContextCompaction { .. } => "contextCompaction",
            ThreadItem::EnteredReviewMode { .. } => "enteredReviewMode",
            ThreadItem::ExitedReviewMode { .. } => "exitedReviewMode",
            ThreadItem::WebSearch { .. } => "webSearch",
            ThreadItem::CollabAgentToolCall { .. } => "collabAgentToolCall",
        }
    }
}

// ============================================
// Thread
// ============================================

/// Runtime status of a thread. Replayed threads are always idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ThreadStatus {
    #[default]
    Idle,
}

/// Where the session was started from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionSource {
    Cli,
    Vscode,
    Exec,
    AppServer,
    #[default]
    Unknown,
}

impl SessionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionSource::Cli => "cli",
            SessionSource::Vscode => "vscode",
            SessionSource::Exec => "exec",
            SessionSource::AppServer => "appServer",
            SessionSource::Unknown => "unknown",
        }
    }
}

impl std::str::FromStr for SessionSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cli" => Ok(SessionSource::Cli),
            "vscode" => Ok(SessionSource::Vscode),
            "exec" => Ok(SessionSource::Exec),
            "appServer" => Ok(SessionSource::AppServer),
            "unknown" => Ok(SessionSource::Unknown),
            _ => Err(format!("unknown session source: {}", s)),
        }
    }
}

/// Git state recorded at session start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitInfo {
    pub sha: Option<String>,
    pub branch: Option<String>,
    pub origin_url: Option<String>,
}

/// The conversation reconstructed from one transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    pub id: String,
    /// First non-empty user text, or empty
    pub preview: String,
    pub model_provider: String,
    /// Unix seconds
    pub created_at: i64,
    /// Unix seconds
    pub updated_at: i64,
    pub status: ThreadStatus,
    /// Replayed threads have no backing rollout path
    pub path: Option<String>,
    pub cwd: String,
    pub cli_version: String,
    pub source: SessionSource,
    pub git_info: Option<GitInfo>,
    pub turns: Vec<Turn>,
}

// ============================================
// Thread configuration
// ============================================

/// When the agent asks before running commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApprovalPolicy {
    Untrusted,
    OnFailure,
    OnRequest,
    #[default]
    Never,
}

impl ApprovalPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalPolicy::Untrusted => "untrusted",
            ApprovalPolicy::OnFailure => "on-failure",
            ApprovalPolicy::OnRequest => "on-request",
            ApprovalPolicy::Never => "never",
        }
    }
}

impl std::str::FromStr for ApprovalPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "untrusted" => Ok(ApprovalPolicy::Untrusted),
            "on-failure" => Ok(ApprovalPolicy::OnFailure),
            "on-request" => Ok(ApprovalPolicy::OnRequest),
            "never" => Ok(ApprovalPolicy::Never),
            _ => Err(format!("unknown approval policy: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningEffort {
    None,
    Minimal,
    Low,
    Medium,
    High,
    Xhigh,
}

impl ReasoningEffort {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasoningEffort::None => "none",
            ReasoningEffort::Minimal => "minimal",
            ReasoningEffort::Low => "low",
            ReasoningEffort::Medium => "medium",
            ReasoningEffort::High => "high",
            ReasoningEffort::Xhigh => "xhigh",
        }
    }
}

impl std::str::FromStr for ReasoningEffort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(ReasoningEffort::None),
            "minimal" => Ok(ReasoningEffort::Minimal),
            "low" => Ok(ReasoningEffort::Low),
            "medium" => Ok(ReasoningEffort::Medium),
            "high" => Ok(ReasoningEffort::High),
            "xhigh" => Ok(ReasoningEffort::Xhigh),
            _ => Err(format!("unknown reasoning effort: {}", s)),
        }
    }
}

/// Filesystem and network access granted to tool execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SandboxPolicy {
    #[serde(rename_all = "camelCase")]
    ReadOnly { access: Value },
    DangerFullAccess,
    #[serde(rename_all = "camelCase")]
    WorkspaceWrite {
        writable_roots: Vec<Value>,
        read_only_access: Value,
        network_access: bool,
        exclude_tmpdir_env_var: bool,
        exclude_slash_tmp: bool,
    },
}

impl SandboxPolicy {
    /// Read access to the whole filesystem.
    pub fn full_access() -> Value {
        serde_json::json!({ "type": "fullAccess" })
    }

    /// The policy used whenever the recorded one is missing or unreadable.
    pub fn read_only() -> Self {
        SandboxPolicy::ReadOnly {
            access: Self::full_access(),
        }
    }

    pub fn mode(&self) -> SandboxMode {
        match self {
            SandboxPolicy::ReadOnly { .. } => SandboxMode::ReadOnly,
            SandboxPolicy::DangerFullAccess => SandboxMode::DangerFullAccess,
            SandboxPolicy::WorkspaceWrite { .. } => SandboxMode::WorkspaceWrite,
        }
    }
}

/// Short string tag of a [`SandboxPolicy`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SandboxMode {
    ReadOnly,
    WorkspaceWrite,
    DangerFullAccess,
}

impl SandboxMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SandboxMode::ReadOnly => "read-only",
            SandboxMode::WorkspaceWrite => "workspace-write",
            SandboxMode::DangerFullAccess => "danger-full-access",
        }
    }
}

impl std::fmt::Display for SandboxMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================
// Runtime state
// ============================================

/// Bookkeeping about the replay itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayMeta {
    pub file_name: Option<String>,
    pub total_lines: usize,
    pub non_empty_lines: usize,
    pub turn_count: usize,
    pub item_count: usize,
    /// True when turns came from `response_item` records instead of events
    pub fallback_used: bool,
}

/// Final output of a replay: the thread plus its effective configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeState {
    pub thread: Thread,
    pub model: String,
    pub model_provider: String,
    pub approval_policy: ApprovalPolicy,
    pub sandbox: SandboxPolicy,
    pub sandbox_mode: SandboxMode,
    pub reasoning_effort: Option<ReasoningEffort>,
    pub meta: ReplayMeta,
}
