//! The log event as it is written out.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One log event, fully resolved and ready to render.
///
/// `fields` holds everything that is not canonical: injected correlation
/// fields, span fields and event fields, already merged in that order.
#[derive(Debug, Clone)]
pub struct LogEvent {
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub logger: String,
    pub target: String,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub message: String,
    pub fields: BTreeMap<String, Value>,
}

impl LogEvent {
    /// Render as a single JSON object followed by a newline.
    ///
    /// Canonical keys are written last and overwrite any field of the same
    /// name, so `level`, `timestamp`, `logger` and `message` are always the
    /// event's own.
    pub fn to_json_line(&self) -> String {
        let mut object: Map<String, Value> = self
            .fields
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        object.insert("level".into(), Value::String(self.level.clone()));
        object.insert(
            "timestamp".into(),
            Value::String(self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        object.insert("logger".into(), Value::String(self.logger.clone()));
        object.insert("target".into(), Value::String(self.target.clone()));
        object.insert("message".into(), Value::String(self.message.clone()));
        if let Some(line) = self.line {
            object.insert("lineno".into(), Value::from(line));
        }
        if let Some(file) = &self.file {
            object.insert("pathname".into(), Value::String(file.clone()));
        }

        let mut line = Value::Object(object).to_string();
        line.push('\n');
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event(fields: BTreeMap<String, Value>) -> LogEvent {
        LogEvent {
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap(),
            level: "INFO".into(),
            logger: "orders".into(),
            target: "orders::api".into(),
            file: Some("src/api.rs".into()),
            line: Some(17),
            message: "Request started".into(),
            fields,
        }
    }

    #[test]
    fn test_single_line_with_canonical_fields() {
        let line = event(BTreeMap::new()).to_json_line();
        assert!(line.ends_with('\n'));
        assert_eq!(line.matches('\n').count(), 1);

        let parsed: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["level"], "INFO");
        assert_eq!(parsed["timestamp"], "2024-05-01T12:30:00.000Z");
        assert_eq!(parsed["logger"], "orders");
        assert_eq!(parsed["message"], "Request started");
        assert_eq!(parsed["lineno"], 17);
        assert_eq!(parsed["pathname"], "src/api.rs");
    }

    #[test]
    fn test_canonical_fields_overwrite_extras() {
        let fields = BTreeMap::from([
            ("level".to_string(), Value::from("DEBUG")),
            ("message".to_string(), Value::from("spoofed")),
            ("path".to_string(), Value::from("/items/5")),
        ]);
        let parsed: Value = serde_json::from_str(&event(fields).to_json_line()).unwrap();

        assert_eq!(parsed["level"], "INFO");
        assert_eq!(parsed["message"], "Request started");
        assert_eq!(parsed["path"], "/items/5");
    }

    #[test]
    fn test_unknown_location_is_omitted() {
        let mut event = event(BTreeMap::new());
        event.file = None;
        event.line = None;
        let parsed: Value = serde_json::from_str(&event.to_json_line()).unwrap();

        assert!(parsed.get("lineno").is_none());
        assert!(parsed.get("pathname").is_none());
    }
}
