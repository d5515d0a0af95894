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

//! Bridge from the `log` crate facade.
//!
//! # Examples
//!
//! ```no_run
//! use loggly_append::AppenderConfig;
//! use loggly_append::LogglyAppenderBuilder;
//!
//! let config = AppenderConfig::new("your-loggly-token");
//! let appender = LogglyAppenderBuilder::new(config, "my-app").build().unwrap();
//! loggly_append::bridge::log::install(appender, log::LevelFilter::Info).unwrap();
//!
//! log::info!(request_id = "42"; "request done");
//! ```

use crate::append::Append;
use crate::record::Level;
use crate::record::LogRecord;

/// Forwards `log` crate records to an [`Append`] sink.
#[derive(Debug)]
pub struct LogBridge<T> {
    appender: T,
}

impl<T: Append> LogBridge<T> {
    /// Wrap an appender for use as a `log::Log` implementation.
    pub fn new(appender: T) -> Self {
        LogBridge { appender }
    }
}

impl From<log::Level> for Level {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Level::Error,
            log::Level::Warn => Level::Warn,
            log::Level::Info => Level::Info,
            log::Level::Debug => Level::Debug,
            log::Level::Trace => Level::Trace,
        }
    }
}

impl<T: Append> log::Log for LogBridge<T> {
    fn enabled(&self, _: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        let mut attributes: Vec<(String, String)> = Vec::new();

        struct KeyValueVisitor<'a> {
            attributes: &'a mut Vec<(String, String)>,
        }

        impl<'kvs> log::kv::VisitSource<'kvs> for KeyValueVisitor<'_> {
            fn visit_pair(
                &mut self,
                key: log::kv::Key<'kvs>,
                value: log::kv::Value<'kvs>,
            ) -> Result<(), log::kv::Error> {
                self.attributes.push((key.to_string(), value.to_string()));
                Ok(())
            }
        }

        let mut visitor = KeyValueVisitor {
            attributes: &mut attributes,
        };
        // attributes are best-effort; the message ships regardless
        let _ = record.key_values().visit(&mut visitor);

        let mut builder = LogRecord::builder()
            .level(record.level().into())
            .logger(record.target())
            .message(record.args().to_string());
        for (key, value) in attributes {
            builder = builder.attribute(key, value);
        }

        self.appender.submit(builder.build());
    }

    fn flush(&self) {
        self.appender.flush();
    }
}

/// Install a bridge as the global `log` logger.
pub fn install<T: Append>(appender: T, max_level: log::LevelFilter) -> Result<(), log::SetLoggerError> {
    log::set_boxed_logger(Box::new(LogBridge::new(appender)))?;
    log::set_max_level(max_level);
    Ok(())
}
