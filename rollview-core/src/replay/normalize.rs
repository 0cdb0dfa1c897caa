//! Thread-level metadata from `session_meta` / `turn_context` records.
//!
//! Every value here is optional in the source. Unknown or malformed input
//! falls back to a fixed default instead of failing the replay.

use super::fields::Fields;
use crate::ingest::Record;
use crate::types::{
    ApprovalPolicy, GitInfo, ReasoningEffort, SandboxPolicy, SessionSource, ThreadItem, Turn,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

/// Fields taken from the canonical `session_meta` payload.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionInfo {
    pub id: Option<String>,
    pub cwd: String,
    pub cli_version: String,
    pub model_provider: String,
    pub source: SessionSource,
    pub git_info: Option<GitInfo>,
}

impl SessionInfo {
    pub fn from_payload(payload: Option<&Value>) -> Self {
        let meta = Fields::new(payload);
        Self {
            id: meta.str(&["id"]).map(str::to_string),
            cwd: meta.string_or(&["cwd"], "/"),
            cli_version: meta.string_or(&["cli_version", "cliVersion"], "unknown"),
            model_provider: meta.string_or(&["model_provider", "modelProvider"], "unknown"),
            source: meta.parse(&["source"]).unwrap_or_default(),
            git_info: normalize_git_info(meta.value(&["git"])),
        }
    }
}

/// Effective configuration taken from the latest `turn_context` payload.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnConfig {
    pub model: Option<String>,
    pub approval_policy: ApprovalPolicy,
    pub sandbox: SandboxPolicy,
    pub reasoning_effort: Option<ReasoningEffort>,
}

impl TurnConfig {
    pub fn from_payload(payload: Option<&Value>, cwd: &str) -> Self {
        let context = Fields::new(payload);
        Self {
            model: context
                .str(&["model"])
                .filter(|m| !m.is_empty())
                .map(str::to_string),
            approval_policy: context
                .parse(&["approval_policy", "approvalPolicy"])
                .unwrap_or_default(),
            sandbox: normalize_sandbox_policy(
                context.value(&["sandbox_policy", "sandboxPolicy"]),
                cwd,
            ),
            reasoning_effort: context.parse(&["effort", "reasoning_effort"]),
        }
    }
}

/// Reconcile the two git metadata spellings; `None` without a git object.
pub fn normalize_git_info(value: Option<&Value>) -> Option<GitInfo> {
    let git = Fields::new(value);
    if !git.is_object() {
        return None;
    }

    Some(GitInfo {
        sha: git.str(&["sha", "commit_hash"]).map(str::to_string),
        branch: git.str(&["branch"]).map(str::to_string),
        origin_url: git
            .str(&["originUrl", "repository_url"])
            .map(str::to_string),
    })
}

/// Accepts the CLI's short strings as well as structured policies in either
/// camelCase or kebab/snake_case spelling.
pub fn normalize_sandbox_policy(value: Option<&Value>, cwd: &str) -> SandboxPolicy {
    if let Some(Value::String(mode)) = value {
        return match mode.as_str() {
            "danger-full-access" => SandboxPolicy::DangerFullAccess,
            "workspace-write" => SandboxPolicy::WorkspaceWrite {
                writable_roots: vec![Value::String(cwd.to_string())],
                read_only_access: SandboxPolicy::full_access(),
                network_access: true,
                exclude_tmpdir_env_var: false,
                exclude_slash_tmp: false,
            },
            _ => SandboxPolicy::read_only(),
        };
    }

    let policy = Fields::new(value);
    match policy.str(&["type"]) {
        Some("dangerFullAccess" | "danger-full-access") => SandboxPolicy::DangerFullAccess,
        Some("readOnly" | "read-only") => SandboxPolicy::ReadOnly {
            access: policy
                .object(&["access"])
                .cloned()
                .unwrap_or_else(SandboxPolicy::full_access),
        },
        Some("workspaceWrite" | "workspace-write") => SandboxPolicy::WorkspaceWrite {
            writable_roots: policy
                .array(&["writableRoots", "writable_roots"])
                .cloned()
                .unwrap_or_else(|| vec![Value::String(cwd.to_string())]),
            read_only_access: policy
                .object(&["readOnlyAccess", "read_only_access"])
                .cloned()
                .unwrap_or_else(SandboxPolicy::full_access),
            network_access: policy.bool_or(&["networkAccess", "network_access"], true),
            exclude_tmpdir_env_var: policy
                .bool_or(&["excludeTmpdirEnvVar", "exclude_tmpdir_env_var"], false),
            exclude_slash_tmp: policy.bool_or(&["excludeSlashTmp", "exclude_slash_tmp"], false),
        },
        _ => SandboxPolicy::read_only(),
    }
}

/// Parse a record timestamp into Unix seconds.
///
/// RFC 3339 first; offset-less date-times are read as UTC; a bare date is
/// midnight UTC.
pub fn parse_timestamp(value: &str) -> Option<i64> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.timestamp());
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(Utc.from_utc_datetime(&naive).timestamp());
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive).timestamp())
}

/// Earliest and latest parsable timestamp, or `now` for both.
pub fn timestamp_range<'a>(records: impl IntoIterator<Item = &'a Record>, now: i64) -> (i64, i64) {
    records
        .into_iter()
        .filter_map(|r| r.timestamp.as_deref().and_then(parse_timestamp))
        .fold(None, |range, ts| match range {
            None => Some((ts, ts)),
            Some((min, max)) => Some((ts.min(min), ts.max(max))),
        })
        .unwrap_or((now, now))
}

/// First non-blank text of a user message, scanning turns in order.
pub fn find_first_user_preview(turns: &[Turn]) -> String {
    turns
        .iter()
        .flat_map(|turn| &turn.items)
        .filter_map(|item| match item {
            ThreadItem::UserMessage { content, .. } => Some(content),
            _ => None,
        })
        .flatten()
        .filter_map(|input| input.text())
        .map(str::trim)
        .find(|text| !text.is_empty())
        .unwrap_or_default()
        .to_string()
}
