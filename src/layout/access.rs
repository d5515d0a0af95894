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

use crate::record::AccessRecord;

/// A JSON layout for formatting HTTP access records.
///
/// Output format:
///
/// ```json
/// {"timestamp":"2024-08-11T14:44:57.172Z","message":"10.0.0.7 - alice \"GET /health HTTP/1.1\" 200 512","protocol":"HTTP/1.1","request":{"method":"GET","url":"/health","remoteHost":"10.0.0.7","remoteUser":"alice","headers":{"Accept":"*/*"}},"response":{"status":200,"contentLength":512,"responseTime":3,"headers":{"Content-Type":"application/json"}}}
/// ```
///
/// Repeated header names collapse into a JSON array under the same key.
#[derive(Default, Debug, Clone)]
#[non_exhaustive]
pub struct AccessJsonLayout {}

#[derive(Debug, Serialize)]
struct AccessLine<'a> {
    #[serde(serialize_with = "super::serialize_timestamp")]
    timestamp: &'a Timestamp,
    message: String,
    protocol: &'a str,
    request: RequestPart<'a>,
    response: ResponsePart,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestPart<'a> {
    method: &'a str,
    url: &'a str,
    remote_host: &'a str,
    remote_user: Option<&'a str>,
    headers: Map<String, Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    status: u16,
    content_length: u64,
    response_time: u64,
    headers: Map<String, Value>,
}

impl AccessJsonLayout {
    pub(crate) fn format(&self, record: &AccessRecord) -> anyhow::Result<Vec<u8>> {
        let timestamp = record.timestamp();
        let line = AccessLine {
            timestamp: &timestamp,
            message: request_line(record),
            protocol: record.protocol(),
            request: RequestPart {
                method: record.method(),
                url: record.url(),
                remote_host: record.remote_host(),
                remote_user: record.remote_user(),
                headers: headers_to_map(record.request_headers()),
            },
            response: ResponsePart {
                status: record.status(),
                content_length: record.content_length(),
                response_time: record.response_time().as_millis() as u64,
                headers: headers_to_map(record.response_headers()),
            },
        };

        Ok(serde_json::to_vec(&line)?)
    }
}

// Common log format request line, kept human-readable for the Loggly search
// summary view.
fn request_line(record: &AccessRecord) -> String {
    format!(
        "{} - {} \"{} {} {}\" {} {}",
        record.remote_host(),
        record.remote_user().unwrap_or("-"),
        record.method(),
        record.url(),
        record.protocol(),
        record.status(),
        record.content_length(),
    )
}

// Headers are multi-valued; a repeated name becomes an array of its values.
fn headers_to_map(headers: &[(String, String)]) -> Map<String, Value> {
    let mut map = Map::new();
    for (name, value) in headers {
        match map.get_mut(name) {
            None => {
                map.insert(name.clone(), Value::String(value.clone()));
            }
            Some(Value::Array(values)) => {
                values.push(Value::String(value.clone()));
            }
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(value.clone())]);
            }
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn sample() -> AccessRecord {
        AccessRecord::builder()
            .timestamp("2024-08-11T14:44:57.172051Z".parse().unwrap())
            .method("GET")
            .url("/health")
            .protocol("HTTP/1.1")
            .remote_host("10.0.0.7")
            .remote_user("alice")
            .request_header("Accept", "*/*")
            .status(200)
            .content_length(512)
            .response_time(Duration::from_millis(3))
            .response_header("Content-Type", "application/json")
            .build()
    }

    fn parse(bytes: Vec<u8>) -> Value {
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn format_nests_request_and_response() {
        let doc = parse(AccessJsonLayout::default().format(&sample()).unwrap());

        assert_eq!(doc["timestamp"], "2024-08-11T14:44:57.172Z");
        assert_eq!(doc["protocol"], "HTTP/1.1");
        assert_eq!(
            doc["message"],
            "10.0.0.7 - alice \"GET /health HTTP/1.1\" 200 512"
        );

        let request = doc["request"].as_object().unwrap();
        assert_eq!(request["method"], "GET");
        assert_eq!(request["url"], "/health");
        assert_eq!(request["remoteHost"], "10.0.0.7");
        assert_eq!(request["remoteUser"], "alice");
        assert_eq!(request["headers"]["Accept"], "*/*");

        let response = doc["response"].as_object().unwrap();
        assert_eq!(response["status"], 200);
        assert_eq!(response["contentLength"], 512);
        assert_eq!(response["responseTime"], 3);
        assert_eq!(response["headers"]["Content-Type"], "application/json");
    }

    #[test]
    fn format_renders_absent_user_as_null_and_dash() {
        let record = AccessRecord::builder()
            .method("GET")
            .url("/")
            .remote_host("10.0.0.7")
            .status(404)
            .build();
        let doc = parse(AccessJsonLayout::default().format(&record).unwrap());

        assert!(doc["request"]["remoteUser"].is_null());
        assert_eq!(doc["message"], "10.0.0.7 - - \"GET / HTTP/1.1\" 404 0");
    }

    #[test]
    fn repeated_headers_become_arrays() {
        let record = AccessRecord::builder()
            .request_header("Cookie", "a=1")
            .request_header("Cookie", "b=2")
            .request_header("Accept", "*/*")
            .build();
        let doc = parse(AccessJsonLayout::default().format(&record).unwrap());

        let headers = doc["request"]["headers"].as_object().unwrap();
        assert_eq!(headers["Cookie"], serde_json::json!(["a=1", "b=2"]));
        assert_eq!(headers["Accept"], "*/*");
    }
}
