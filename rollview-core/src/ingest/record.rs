//! Line ingestion: raw transcript text into typed [`Record`]s.
//!
//! Ingestion is strict. The first line that fails to decode, is not a JSON
//! object, or lacks a string `type` aborts the whole pass with
//! [`Error::Parse`] carrying that line's 1-based number.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One non-blank transcript line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// 1-based line number in the CRLF-normalized source
    pub line_number: usize,
    /// Top-level `timestamp`, kept only when it is a string
    pub timestamp: Option<String>,
    /// Top-level `type` discriminator
    #[serde(rename = "type")]
    pub record_type: String,
    /// Top-level `payload`; `None` when absent or JSON null
    pub payload: Option<Value>,
    /// The decoded line, untouched
    pub raw: Value,
}

impl Record {
    fn from_value(raw: Value, line_number: usize) -> Result<Self> {
        let Some(object) = raw.as_object() else {
            return Err(Error::parse(line_number, "expected a JSON object"));
        };

        let Some(record_type) = object.get("type").and_then(Value::as_str) else {
            return Err(Error::parse(line_number, "missing string field type"));
        };

        Ok(Self {
            line_number,
            timestamp: object
                .get("timestamp")
                .and_then(Value::as_str)
                .map(str::to_string),
            record_type: record_type.to_string(),
            payload: object.get("payload").filter(|v| !v.is_null()).cloned(),
            raw,
        })
    }

    /// The payload when it is a JSON object.
    pub fn payload_object(&self) -> Option<&Map<String, Value>> {
        self.payload.as_ref().and_then(Value::as_object)
    }

    /// The payload's own `type` field (event or item kind).
    pub fn payload_kind(&self) -> Option<&str> {
        self.payload_object()?.get("type")?.as_str()
    }
}

/// Output of [`ingest_lines`].
#[derive(Debug, Clone, Default)]
pub struct IngestedLines {
    pub records: Vec<Record>,
    /// Every line after CRLF normalization, blank ones included
    pub total_lines: usize,
    pub non_empty_lines: usize,
}

/// Split `text` into lines and decode each non-blank one.
pub fn ingest_lines(text: &str) -> Result<IngestedLines> {
    let normalized = text.replace("\r\n", "\n");
    let mut ingested = IngestedLines::default();

    for (index, line) in normalized.split('\n').enumerate() {
        let line_number = index + 1;
        ingested.total_lines = line_number;

        if line.trim().is_empty() {
            continue;
        }
        ingested.non_empty_lines += 1;

        let value: Value = serde_json::from_str(line)
            .map_err(|e| Error::parse(line_number, describe_json_error(&e)))?;

        ingested.records.push(Record::from_value(value, line_number)?);
    }

    Ok(ingested)
}

/// serde_json reports positions as if the line were the whole document, so
/// only the column survives.
fn describe_json_error(err: &serde_json::Error) -> String {
    let message = err.to_string();
    let detail = message.split(" at line ").next().unwrap_or_default();
    if detail.is_empty() {
        return "invalid JSON syntax".to_string();
    }
    format!("invalid JSON syntax ({}, column {})", detail, err.column())
}
