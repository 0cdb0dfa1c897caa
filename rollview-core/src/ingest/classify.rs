//! Record classification by top-level `type`.

use super::record::{IngestedLines, Record};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Bucket a record falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    SessionMeta,
    TurnContext,
    EventMsg,
    ResponseItem,
    Unknown,
}

impl RecordKind {
    pub fn from_type(record_type: &str) -> Self {
        match record_type {
            "session_meta" => RecordKind::SessionMeta,
            "turn_context" => RecordKind::TurnContext,
            "event_msg" => RecordKind::EventMsg,
            "response_item" => RecordKind::ResponseItem,
            _ => RecordKind::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::SessionMeta => "session_meta",
            RecordKind::TurnContext => "turn_context",
            RecordKind::EventMsg => "event_msg",
            RecordKind::ResponseItem => "response_item",
            RecordKind::Unknown => "unknown",
        }
    }
}

/// A fully ingested transcript with its records partitioned by kind.
///
/// Buckets hold indices into `records`, in encounter order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTranscript {
    total_lines: usize,
    non_empty_lines: usize,
    records: Vec<Record>,
    session_metas: Vec<usize>,
    turn_contexts: Vec<usize>,
    event_msgs: Vec<usize>,
    response_items: Vec<usize>,
    unknown: Vec<usize>,
}

impl ParsedTranscript {
    /// Partition ingested records into buckets.
    pub fn classify(ingested: IngestedLines) -> Self {
        let mut parsed = ParsedTranscript {
            total_lines: ingested.total_lines,
            non_empty_lines: ingested.non_empty_lines,
            ..Default::default()
        };

        for (index, record) in ingested.records.iter().enumerate() {
            parsed
                .bucket_mut(RecordKind::from_type(&record.record_type))
                .push(index);
        }
        parsed.records = ingested.records;
        parsed
    }

    /// Rebuild a parsed transcript that crossed a serialization boundary.
    ///
    /// Fails with [`Error::Shape`] unless the value deserializes and passes
    /// [`ParsedTranscript::check_shape`].
    pub fn from_value(value: Value) -> Result<Self> {
        let parsed: ParsedTranscript = serde_json::from_value(value)
            .map_err(|e| Error::Shape(format!("not a parsed transcript: {}", e)))?;
        parsed.check_shape()?;
        Ok(parsed)
    }

    /// Verify the invariants ingestion and classification establish.
    pub fn check_shape(&self) -> Result<()> {
        if self.non_empty_lines > self.total_lines {
            return Err(Error::Shape(format!(
                "{} non-empty lines exceed {} total lines",
                self.non_empty_lines, self.total_lines
            )));
        }
        if self.records.len() != self.non_empty_lines {
            return Err(Error::Shape(format!(
                "{} records for {} non-empty lines",
                self.records.len(),
                self.non_empty_lines
            )));
        }

        let mut previous_line = 0;
        for record in &self.records {
            if record.line_number <= previous_line || record.line_number > self.total_lines {
                return Err(Error::Shape(format!(
                    "record line number {} out of order or range",
                    record.line_number
                )));
            }
            previous_line = record.line_number;
        }

        let mut bucketed = 0;
        for kind in [
            RecordKind::SessionMeta,
            RecordKind::TurnContext,
            RecordKind::EventMsg,
            RecordKind::ResponseItem,
            RecordKind::Unknown,
        ] {
            let bucket = self.bucket(kind);
            let mut previous: Option<usize> = None;
            for &index in bucket {
                let record = self.records.get(index).ok_or_else(|| {
                    Error::Shape(format!("{} bucket points past the records", kind.as_str()))
                })?;
                if previous.is_some_and(|p| p >= index) {
                    return Err(Error::Shape(format!(
                        "{} bucket is not in encounter order",
                        kind.as_str()
                    )));
                }
                if RecordKind::from_type(&record.record_type) != kind {
                    return Err(Error::Shape(format!(
                        "line {} of type {:?} filed under {}",
                        record.line_number,
                        record.record_type,
                        kind.as_str()
                    )));
                }
                previous = Some(index);
            }
            bucketed += bucket.len();
        }

        if bucketed != self.records.len() {
            return Err(Error::Shape(format!(
                "{} of {} records are bucketed",
                bucketed,
                self.records.len()
            )));
        }

        Ok(())
    }

    fn bucket(&self, kind: RecordKind) -> &[usize] {
        match kind {
            RecordKind::SessionMeta => &self.session_metas,
            RecordKind::TurnContext => &self.turn_contexts,
            RecordKind::EventMsg => &self.event_msgs,
            RecordKind::ResponseItem => &self.response_items,
            RecordKind::Unknown => &self.unknown,
        }
    }

    fn bucket_mut(&mut self, kind: RecordKind) -> &mut Vec<usize> {
        match kind {
            RecordKind::SessionMeta => &mut self.session_metas,
            RecordKind::TurnContext => &mut self.turn_contexts,
            RecordKind::EventMsg => &mut self.event_msgs,
            RecordKind::ResponseItem => &mut self.response_items,
            RecordKind::Unknown => &mut self.unknown,
        }
    }

    /// Records of one kind, in encounter order.
    pub fn records_of(&self, kind: RecordKind) -> impl Iterator<Item = &Record> + '_ {
        self.bucket(kind).iter().map(move |&i| &self.records[i])
    }

    /// Every record, in source order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn total_lines(&self) -> usize {
        self.total_lines
    }

    pub fn non_empty_lines(&self) -> usize {
        self.non_empty_lines
    }

    /// The canonical session metadata: the first `session_meta` record.
    pub fn session_meta(&self) -> Option<&Record> {
        self.records_of(RecordKind::SessionMeta).next()
    }

    /// The canonical turn context: the last `turn_context` record.
    pub fn turn_context(&self) -> Option<&Record> {
        self.records_of(RecordKind::TurnContext).last()
    }

    pub fn event_msgs(&self) -> impl Iterator<Item = &Record> + '_ {
        self.records_of(RecordKind::EventMsg)
    }

    pub fn response_items(&self) -> impl Iterator<Item = &Record> + '_ {
        self.records_of(RecordKind::ResponseItem)
    }

    pub fn count_of(&self, kind: RecordKind) -> usize {
        self.bucket(kind).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::record::ingest_lines;
    use serde_json::json;

    fn classify(text: &str) -> ParsedTranscript {
        ParsedTranscript::classify(ingest_lines(text).unwrap())
    }

    const MIXED: &str = r#"{"type":"session_meta","payload":{"id":"first"}}
{"type":"turn_context","payload":{"model":"a"}}
{"type":"event_msg","payload":{"type":"user_message","message":"hi"}}
{"type":"session_meta","payload":{"id":"second"}}
{"type":"compacted","payload":{}}
{"type":"turn_context","payload":{"model":"b"}}
{"type":"response_item","payload":{"type":"message"}}"#;

    #[test]
    fn test_partition_preserves_order() {
        let parsed = classify(MIXED);

        assert_eq!(parsed.count_of(RecordKind::SessionMeta), 2);
        assert_eq!(parsed.count_of(RecordKind::TurnContext), 2);
        assert_eq!(parsed.count_of(RecordKind::EventMsg), 1);
        assert_eq!(parsed.count_of(RecordKind::ResponseItem), 1);
        assert_eq!(parsed.count_of(RecordKind::Unknown), 1);

        let lines: Vec<_> = parsed
            .records_of(RecordKind::TurnContext)
            .map(|r| r.line_number)
            .collect();
        assert_eq!(lines, vec![2, 6]);
        assert!(parsed.check_shape().is_ok());
    }

    #[test]
    fn test_canonical_meta_and_context() {
        let parsed = classify(MIXED);

        let meta = parsed.session_meta().unwrap();
        assert_eq!(meta.payload.as_ref().unwrap()["id"], "first");

        let context = parsed.turn_context().unwrap();
        assert_eq!(context.payload.as_ref().unwrap()["model"], "b");
    }

    #[test]
    fn test_from_value_round_trip() {
        let parsed = classify(MIXED);
        let value = serde_json::to_value(&parsed).unwrap();

        let restored = ParsedTranscript::from_value(value).unwrap();
        assert_eq!(restored, parsed);
    }

    #[test]
    fn test_from_value_rejects_non_transcripts() {
        let err = ParsedTranscript::from_value(json!("nope")).unwrap_err();
        assert!(matches!(err, Error::Shape(_)));

        let err = ParsedTranscript::from_value(json!({"records": 3})).unwrap_err();
        assert!(matches!(err, Error::Shape(_)));
    }

    #[test]
    fn test_check_shape_catches_misfiled_records() {
        let parsed = classify(MIXED);
        let mut value = serde_json::to_value(&parsed).unwrap();
        value["eventMsgs"] = json!([0]);

        let err = ParsedTranscript::from_value(value).unwrap_err();
        assert!(err.to_string().contains("filed under event_msg"), "{err}");
    }

    #[test]
    fn test_check_shape_catches_bad_counts() {
        let parsed = classify(MIXED);
        let mut value = serde_json::to_value(&parsed).unwrap();
        value["nonEmptyLines"] = json!(99);

        assert!(ParsedTranscript::from_value(value).is_err());
    }
}
