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

//! Construction of appenders from a configuration type identifier.
//!
//! Hosts that drive logging from a configuration document map an appender
//! `type` string to a constructor here, instead of relying on any runtime
//! discovery mechanism. The registry is populated at process start and read
//! afterwards.

use std::collections::HashMap;

use crate::append::LogglyAppender;
use crate::append::LogglyAppenderBuilder;
use crate::config::AppenderConfig;
use crate::error::ConfigError;

/// A constructor for one appender type, given the validated settings and the
/// host application's name.
pub type AppenderConstructor = fn(&AppenderConfig, &str) -> Result<LogglyAppender, ConfigError>;

/// Maps configuration type identifiers to appender constructors.
///
/// The default registry knows `loggly` (application log events) and
/// `loggly-request` (HTTP access events); both identifiers are kept for
/// compatibility with existing configuration documents.
///
/// # Examples
///
/// ```no_run
/// use loggly_append::AppenderConfig;
/// use loggly_append::AppenderRegistry;
///
/// let registry = AppenderRegistry::default();
/// let config = AppenderConfig::new("your-loggly-token");
/// let appender = registry.build("loggly", &config, "my-app").unwrap();
/// ```
pub struct AppenderRegistry {
    constructors: HashMap<String, AppenderConstructor>,
}

impl Default for AppenderRegistry {
    fn default() -> Self {
        let mut registry = AppenderRegistry::empty();
        registry.register("loggly", build_loggly);
        registry.register("loggly-request", build_loggly_request);
        registry
    }
}

impl AppenderRegistry {
    /// Create a registry with no constructors registered.
    pub fn empty() -> Self {
        AppenderRegistry {
            constructors: HashMap::new(),
        }
    }

    /// Register a constructor under a type identifier, replacing any previous
    /// registration for the same identifier.
    pub fn register(&mut self, kind: impl Into<String>, constructor: AppenderConstructor) {
        self.constructors.insert(kind.into(), constructor);
    }

    /// Construct an appender of the given type.
    ///
    /// Fails fast with [`ConfigError::UnknownType`] for unregistered
    /// identifiers and with the constructor's own error for invalid settings.
    pub fn build(
        &self,
        kind: &str,
        config: &AppenderConfig,
        application_name: &str,
    ) -> Result<LogglyAppender, ConfigError> {
        let constructor = self
            .constructors
            .get(kind)
            .ok_or_else(|| ConfigError::UnknownType(kind.to_string()))?;
        constructor(config, application_name)
    }
}

fn build_loggly(
    config: &AppenderConfig,
    application_name: &str,
) -> Result<LogglyAppender, ConfigError> {
    LogglyAppenderBuilder::new(config.clone(), application_name)
        .thread_name("loggly-append")
        .build()
}

fn build_loggly_request(
    config: &AppenderConfig,
    application_name: &str,
) -> Result<LogglyAppender, ConfigError> {
    LogglyAppenderBuilder::new(config.clone(), application_name)
        .thread_name("loggly-append-request")
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_knows_both_historical_types() {
        let registry = AppenderRegistry::default();
        let mut config = AppenderConfig::new("t0k3n");
        // keep shutdown instant; nothing is ever enqueued
        config.shutdown_timeout = std::time::Duration::from_millis(10);

        for kind in ["loggly", "loggly-request"] {
            let appender = registry.build(kind, &config, "my-app").unwrap();
            drop(appender);
        }
    }

    #[test]
    fn unknown_type_fails_fast() {
        let registry = AppenderRegistry::default();
        let config = AppenderConfig::new("t0k3n");
        let err = registry.build("syslog", &config, "my-app").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownType(kind) if kind == "syslog"));
    }

    #[test]
    fn invalid_config_fails_fast() {
        let registry = AppenderRegistry::default();
        let config = AppenderConfig::new("");
        assert!(matches!(
            registry.build("loggly", &config, "my-app"),
            Err(ConfigError::EmptyToken)
        ));
    }
}
