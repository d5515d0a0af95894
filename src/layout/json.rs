// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use jiff::Timestamp;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::record::LogRecord;

/// A JSON layout for formatting application log records.
///
/// Output format:
///
/// ```json
/// {"timestamp":"2024-08-11T14:44:57.172Z","level":"ERROR","logger":"api::server","message":"Hello error!"}
/// {"timestamp":"2024-08-11T14:44:57.173Z","level":"INFO","logger":"api::server","message":"Hello info!","request_id":"42"}
/// ```
///
/// Structured attributes are merged into the top-level document.
#[derive(Default, Debug, Clone)]
#[non_exhaustive]
pub struct JsonLayout {}

#[derive(Debug, Serialize)]
struct RecordLine<'a> {
    #[serde(serialize_with = "super::serialize_timestamp")]
    timestamp: &'a Timestamp,
    level: &'a str,
    logger: &'a str,
    message: &'a str,
    #[serde(flatten)]
    attributes: Map<String, Value>,
}

impl JsonLayout {
    pub(crate) fn format(&self, record: &LogRecord) -> anyhow::Result<Vec<u8>> {
        let mut attributes = Map::new();
        for (key, value) in record.attributes() {
            attributes.insert(key.clone(), value.clone());
        }

        let timestamp = record.timestamp();
        let line = RecordLine {
            timestamp: &timestamp,
            level: record.level().as_str(),
            logger: record.logger(),
            message: record.message(),
            attributes,
        };

        Ok(serde_json::to_vec(&line)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Level;

    fn parse(bytes: Vec<u8>) -> Value {
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn format_emits_fixed_field_set() {
        let record = LogRecord::builder()
            .level(Level::Warn)
            .logger("api::server")
            .message("disk almost full")
            .build();
        let doc = parse(JsonLayout::default().format(&record).unwrap());

        let object = doc.as_object().unwrap();
        assert_eq!(object.len(), 4);
        assert_eq!(object["level"], "WARN");
        assert_eq!(object["logger"], "api::server");
        assert_eq!(object["message"], "disk almost full");
        assert!(object["timestamp"].is_string());
    }

    #[test]
    fn format_renders_utc_millisecond_timestamps() {
        let timestamp: Timestamp = "2024-08-11T14:44:57.172051Z".parse().unwrap();
        let record = LogRecord::builder().timestamp(timestamp).build();
        let doc = parse(JsonLayout::default().format(&record).unwrap());

        assert_eq!(doc["timestamp"], "2024-08-11T14:44:57.172Z");
    }

    #[test]
    fn format_merges_attributes_into_top_level() {
        let record = LogRecord::builder()
            .message("request done")
            .attribute("request_id", "42")
            .attribute("elapsed_ms", 12)
            .build();
        let doc = parse(JsonLayout::default().format(&record).unwrap());

        assert_eq!(doc["request_id"], "42");
        assert_eq!(doc["elapsed_ms"], 12);
    }
}
