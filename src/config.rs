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

//! Appender configuration, validated once at construction.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use serde::Deserializer;

use crate::error::ConfigError;
use crate::record::Threshold;

pub(crate) const DEFAULT_SERVER: &str = "logs-01.loggly.com";

/// Which generation of the Loggly HTTP endpoint to target.
///
/// The service historically exposed a single-event endpoint (`/inputs/...`)
/// before the batch endpoint (`/bulk/...`); both remain live.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointMode {
    /// Newline-delimited batches against `/bulk/{token}/tag/{tag}`.
    #[default]
    Bulk,
    /// One request per event against `/inputs/{token}/tag/{tag}`.
    Single,
}

/// Settings for a Loggly appender.
///
/// Deserializable from a configuration document; unrecognized options are an
/// error. Every constructor path runs [`AppenderConfig::validate`] before a
/// worker thread is spawned, so a misconfigured shipper fails at startup
/// rather than silently discarding events.
///
/// # Examples
///
/// ```
/// use loggly_append::AppenderConfig;
///
/// let config: AppenderConfig = serde_json::from_str(
///     r#"{"token": "0000-0000", "tag": "my-app", "threshold": "info"}"#,
/// )
/// .unwrap();
/// config.validate().unwrap();
/// ```
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppenderConfig {
    /// The Loggly server, `host[:port]`. Defaults to `logs-01.loggly.com`
    /// (port 443 implied by HTTPS).
    #[serde(default = "default_server")]
    pub server: String,
    /// The customer token. Required, must not be empty.
    pub token: String,
    /// The tag attached to every event. Falls back to the application name
    /// when unset.
    #[serde(default)]
    pub tag: Option<String>,
    /// The lowest severity of events to forward. Defaults to accept-all.
    #[serde(default)]
    pub threshold: Threshold,
    /// Endpoint generation. Defaults to [`EndpointMode::Bulk`].
    #[serde(default)]
    pub mode: EndpointMode,
    /// Flush once this many events have accumulated.
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
    /// Flush once the oldest unflushed event is this old, in milliseconds.
    #[serde(default = "default_max_batch_delay", deserialize_with = "de_millis")]
    pub max_batch_delay: Duration,
    /// How many times a transiently failed delivery is retried before the
    /// batch is dropped.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Timeout for one delivery request, in milliseconds.
    #[serde(default = "default_request_timeout", deserialize_with = "de_millis")]
    pub request_timeout: Duration,
    /// Grace period for the final flush on shutdown, in milliseconds.
    #[serde(default = "default_shutdown_timeout", deserialize_with = "de_millis")]
    pub shutdown_timeout: Duration,
    /// Override the computed endpoint URL, e.g. to point at a local relay.
    /// The templated Loggly URL is used when unset.
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl AppenderConfig {
    /// Create a configuration with the given token and all defaults.
    pub fn new(token: impl Into<String>) -> Self {
        AppenderConfig {
            server: default_server(),
            token: token.into(),
            tag: None,
            threshold: Threshold::default(),
            mode: EndpointMode::default(),
            max_batch_size: default_max_batch_size(),
            max_batch_delay: default_max_batch_delay(),
            max_retries: default_max_retries(),
            request_timeout: default_request_timeout(),
            shutdown_timeout: default_shutdown_timeout(),
            endpoint: None,
        }
    }

    /// Check the configuration, failing fast on anything that would make the
    /// appender silently unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token.is_empty() {
            return Err(ConfigError::EmptyToken);
        }
        if self.max_batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        self.server.parse::<HostPort>()?;
        Ok(())
    }

    /// The tag to attach, falling back to the application name.
    pub(crate) fn resolve_tag(&self, application_name: &str) -> String {
        self.tag
            .clone()
            .unwrap_or_else(|| application_name.to_string())
    }

    /// The endpoint URL for the configured server, token, tag and mode.
    pub(crate) fn endpoint_url(&self, tag: &str) -> Result<String, ConfigError> {
        if let Some(endpoint) = &self.endpoint {
            return Ok(endpoint.clone());
        }
        let server: HostPort = self.server.parse()?;
        let path = match self.mode {
            EndpointMode::Bulk => "bulk",
            EndpointMode::Single => "inputs",
        };
        Ok(format!("https://{server}/{path}/{}/tag/{tag}", self.token))
    }
}

/// A host with an optional port, as accepted for the `server` option.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct HostPort {
    host: String,
    port: Option<u16>,
}

impl HostPort {
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }
}

impl fmt::Display for HostPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.port {
            Some(port) => write!(f, "{}:{}", self.host, port),
            None => write!(f, "{}", self.host),
        }
    }
}

impl FromStr for HostPort {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<HostPort, Self::Err> {
        let invalid = |reason: &str| ConfigError::InvalidServer {
            address: s.to_string(),
            reason: reason.to_string(),
        };

        // bracketed IPv6 literal, e.g. [::1]:443
        let (host, rest) = if let Some(stripped) = s.strip_prefix('[') {
            let end = stripped.find(']').ok_or_else(|| invalid("unclosed '['"))?;
            (&stripped[..end], &stripped[end + 1..])
        } else if s.matches(':').count() > 1 {
            return Err(invalid("IPv6 addresses must be bracketed"));
        } else {
            match s.split_once(':') {
                Some((host, _)) => (host, &s[host.len()..]),
                None => (s, ""),
            }
        };

        if host.is_empty() {
            return Err(invalid("empty host"));
        }
        if host.contains(char::is_whitespace) {
            return Err(invalid("host contains whitespace"));
        }

        let port = match rest.strip_prefix(':') {
            None if rest.is_empty() => None,
            None => return Err(invalid("unexpected trailing characters")),
            Some(port) => Some(
                port.parse::<u16>()
                    .map_err(|_| invalid("port is not a number in 0..=65535"))?,
            ),
        };

        Ok(HostPort {
            host: host.to_string(),
            port,
        })
    }
}

fn default_server() -> String {
    DEFAULT_SERVER.to_string()
}

fn default_max_batch_size() -> usize {
    100
}

fn default_max_batch_delay() -> Duration {
    Duration::from_secs(5)
}

fn default_max_retries() -> u32 {
    2
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(1)
}

fn de_millis<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_millis)
}
