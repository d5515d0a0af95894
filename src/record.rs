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

//! Log and HTTP access records consumed by the Loggly layouts.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use jiff::Timestamp;

use crate::error::ConfigError;

/// An enum representing the available verbosity levels of a log record.
///
/// Levels are ordered by severity: `Trace < Debug < Info < Warn < Error`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// Designates very low priority, often extremely verbose, information.
    Trace,
    /// Designates lower priority information.
    Debug,
    /// Designates useful information.
    Info,
    /// Designates hazardous situations.
    Warn,
    /// Designates very serious errors.
    Error,
}

impl Level {
    /// Return the string representation of the `Level`.
    ///
    /// This returns the same string as the `fmt::Display` implementation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }
}

impl fmt::Debug for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Level {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Level, Self::Err> {
        for (name, level) in [
            ("trace", Level::Trace),
            ("debug", Level::Debug),
            ("info", Level::Info),
            ("warn", Level::Warn),
            ("error", Level::Error),
        ] {
            if s.eq_ignore_ascii_case(name) {
                return Ok(level);
            }
        }

        Err(ConfigError::MalformedThreshold(s.to_string()))
    }
}

/// The lowest severity of events that an appender forwards.
///
/// The default threshold accepts all severities.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, serde::Deserialize)]
#[serde(try_from = "String")]
pub enum Threshold {
    /// Forward every event regardless of severity.
    #[default]
    All,
    /// Forward events at or above the given severity.
    Min(Level),
}

impl Threshold {
    /// Check whether an event of the given level passes this threshold.
    pub fn admits(&self, level: Level) -> bool {
        match self {
            Threshold::All => true,
            Threshold::Min(min) => level >= *min,
        }
    }
}

impl FromStr for Threshold {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Threshold, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            Ok(Threshold::All)
        } else {
            Level::from_str(s).map(Threshold::Min)
        }
    }
}

impl TryFrom<String> for Threshold {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Threshold, Self::Error> {
        s.parse()
    }
}

impl From<Level> for Threshold {
    fn from(level: Level) -> Self {
        Threshold::Min(level)
    }
}

/// The payload of one application log event.
///
/// Records are immutable once built. Construct them with [`LogRecord::builder`].
#[derive(Clone, Debug)]
pub struct LogRecord {
    timestamp: Timestamp,
    level: Level,
    logger: String,
    message: String,
    attributes: Vec<(String, serde_json::Value)>,
}

impl LogRecord {
    /// Returns a new builder with the current time and `Info` level.
    pub fn builder() -> LogRecordBuilder {
        LogRecordBuilder::default()
    }

    /// The observed time, UTC.
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// The severity of the event.
    pub fn level(&self) -> Level {
        self.level
    }

    /// The name of the logger that emitted the event.
    pub fn logger(&self) -> &str {
        &self.logger
    }

    /// The message body.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Structured key-value attributes attached to the event.
    pub fn attributes(&self) -> &[(String, serde_json::Value)] {
        &self.attributes
    }
}

/// Builder for [`LogRecord`].
#[derive(Debug)]
pub struct LogRecordBuilder {
    record: LogRecord,
}

impl Default for LogRecordBuilder {
    fn default() -> Self {
        LogRecordBuilder {
            record: LogRecord {
                timestamp: Timestamp::now(),
                level: Level::Info,
                logger: String::new(),
                message: String::new(),
                attributes: vec![],
            },
        }
    }
}

impl LogRecordBuilder {
    /// Set [`timestamp`](LogRecord::timestamp). Defaults to the current time.
    pub fn timestamp(mut self, timestamp: Timestamp) -> Self {
        self.record.timestamp = timestamp;
        self
    }

    /// Set [`level`](LogRecord::level).
    pub fn level(mut self, level: Level) -> Self {
        self.record.level = level;
        self
    }

    /// Set [`logger`](LogRecord::logger).
    pub fn logger(mut self, logger: impl Into<String>) -> Self {
        self.record.logger = logger.into();
        self
    }

    /// Set [`message`](LogRecord::message).
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.record.message = message.into();
        self
    }

    /// Set [`message`](LogRecord::message) from raw bytes.
    ///
    /// Invalid UTF-8 sequences are replaced with `U+FFFD`; a message is never
    /// rejected for its encoding.
    pub fn message_bytes(mut self, message: &[u8]) -> Self {
        self.record.message = String::from_utf8_lossy(message).into_owned();
        self
    }

    /// Attach one key-value attribute to the record.
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.record.attributes.push((key.into(), value.into()));
        self
    }

    /// Invoke the builder and return a `LogRecord`.
    pub fn build(self) -> LogRecord {
        self.record
    }
}

/// A record describing one completed HTTP request/response cycle.
///
/// Created by the HTTP layer of the host application; immutable once built.
#[derive(Clone, Debug)]
pub struct AccessRecord {
    timestamp: Timestamp,
    method: String,
    url: String,
    protocol: String,
    remote_host: String,
    remote_user: Option<String>,
    request_headers: Vec<(String, String)>,
    status: u16,
    content_length: u64,
    response_time: Duration,
    response_headers: Vec<(String, String)>,
}

impl AccessRecord {
    /// Returns a new builder with the current time.
    pub fn builder() -> AccessRecordBuilder {
        AccessRecordBuilder::default()
    }

    /// The observed time, UTC.
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// The HTTP request method.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The requested URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The HTTP protocol version, e.g. `HTTP/1.1`.
    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    /// The remote client address.
    pub fn remote_host(&self) -> &str {
        &self.remote_host
    }

    /// The authenticated remote user, if any.
    pub fn remote_user(&self) -> Option<&str> {
        self.remote_user.as_deref()
    }

    /// Request headers in arrival order; names may repeat.
    pub fn request_headers(&self) -> &[(String, String)] {
        &self.request_headers
    }

    /// The response status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// The response content length in bytes.
    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    /// Time elapsed between receiving the request and completing the response.
    pub fn response_time(&self) -> Duration {
        self.response_time
    }

    /// Response headers; names may repeat.
    pub fn response_headers(&self) -> &[(String, String)] {
        &self.response_headers
    }
}

/// Builder for [`AccessRecord`].
#[derive(Debug)]
pub struct AccessRecordBuilder {
    record: AccessRecord,
}

impl Default for AccessRecordBuilder {
    fn default() -> Self {
        AccessRecordBuilder {
            record: AccessRecord {
                timestamp: Timestamp::now(),
                method: String::new(),
                url: String::new(),
                protocol: "HTTP/1.1".to_string(),
                remote_host: String::new(),
                remote_user: None,
                request_headers: vec![],
                status: 0,
                content_length: 0,
                response_time: Duration::ZERO,
                response_headers: vec![],
            },
        }
    }
}

impl AccessRecordBuilder {
    /// Set [`timestamp`](AccessRecord::timestamp). Defaults to the current time.
    pub fn timestamp(mut self, timestamp: Timestamp) -> Self {
        self.record.timestamp = timestamp;
        self
    }

    /// Set [`method`](AccessRecord::method).
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.record.method = method.into();
        self
    }

    /// Set [`url`](AccessRecord::url).
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.record.url = url.into();
        self
    }

    /// Set [`protocol`](AccessRecord::protocol). Defaults to `HTTP/1.1`.
    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.record.protocol = protocol.into();
        self
    }

    /// Set [`remote_host`](AccessRecord::remote_host).
    pub fn remote_host(mut self, remote_host: impl Into<String>) -> Self {
        self.record.remote_host = remote_host.into();
        self
    }

    /// Set [`remote_user`](AccessRecord::remote_user).
    pub fn remote_user(mut self, remote_user: impl Into<String>) -> Self {
        self.record.remote_user = Some(remote_user.into());
        self
    }

    /// Append one request header.
    pub fn request_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.record.request_headers.push((name.into(), value.into()));
        self
    }

    /// Set [`status`](AccessRecord::status).
    pub fn status(mut self, status: u16) -> Self {
        self.record.status = status;
        self
    }

    /// Set [`content_length`](AccessRecord::content_length).
    pub fn content_length(mut self, content_length: u64) -> Self {
        self.record.content_length = content_length;
        self
    }

    /// Set [`response_time`](AccessRecord::response_time).
    pub fn response_time(mut self, response_time: Duration) -> Self {
        self.record.response_time = response_time;
        self
    }

    /// Append one response header.
    pub fn response_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.record.response_headers.push((name.into(), value.into()));
        self
    }

    /// Invoke the builder and return an `AccessRecord`.
    pub fn build(self) -> AccessRecord {
        self.record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_orders_by_severity() {
        assert!(Level::Trace < Level::Debug);
        assert!(Level::Debug < Level::Info);
        assert!(Level::Info < Level::Warn);
        assert!(Level::Warn < Level::Error);
    }

    #[test]
    fn threshold_default_admits_everything() {
        let threshold = Threshold::default();
        assert!(threshold.admits(Level::Trace));
        assert!(threshold.admits(Level::Error));
    }

    #[test]
    fn threshold_min_level_rejects_verbose_events() {
        let threshold = Threshold::Min(Level::Warn);
        assert!(!threshold.admits(Level::Trace));
        assert!(!threshold.admits(Level::Info));
        assert!(threshold.admits(Level::Warn));
        assert!(threshold.admits(Level::Error));
    }

    #[test]
    fn threshold_parses_case_insensitively() {
        assert_eq!("ALL".parse::<Threshold>().unwrap(), Threshold::All);
        assert_eq!(
            "warn".parse::<Threshold>().unwrap(),
            Threshold::Min(Level::Warn)
        );
        assert!("verbose".parse::<Threshold>().is_err());
    }

    #[test]
    fn message_bytes_replaces_invalid_utf8() {
        let record = LogRecord::builder()
            .message_bytes(b"broken \xff\xfe message")
            .build();
        assert_eq!(record.message(), "broken \u{FFFD}\u{FFFD} message");
    }

    #[test]
    fn access_record_keeps_header_order() {
        let record = AccessRecord::builder()
            .request_header("Accept", "text/html")
            .request_header("Cookie", "a=1")
            .request_header("Cookie", "b=2")
            .build();
        let names: Vec<_> = record.request_headers().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["Accept", "Cookie", "Cookie"]);
    }
}
