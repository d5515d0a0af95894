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

//! A batching appender that ships log and HTTP access events to Loggly.
//!
//! # Overview
//!
//! Records submitted to a [`LogglyAppender`] are encoded as Loggly JSON
//! documents, buffered, and posted in batches to the Loggly bulk endpoint by
//! a background worker thread. Submission is fire-and-forget: callers never
//! block on the network and never see delivery errors. Failed deliveries are
//! retried with bounded backoff, then reported to a [`Trap`] and counted in
//! the appender's [metrics](LogglyAppender::metrics).
//!
//! # Examples
//!
//! Ship application events, tagged with the application name:
//!
//! ```no_run
//! use loggly_append::Append;
//! use loggly_append::AppenderConfig;
//! use loggly_append::Level;
//! use loggly_append::LogRecord;
//! use loggly_append::LogglyAppenderBuilder;
//!
//! let mut config = AppenderConfig::new("your-loggly-token");
//! config.threshold = Level::Info.into();
//!
//! let appender = LogglyAppenderBuilder::new(config, "my-app").build().unwrap();
//!
//! appender.submit(
//!     LogRecord::builder()
//!         .level(Level::Warn)
//!         .logger("api::server")
//!         .message("disk almost full")
//!         .build(),
//! );
//! ```
//!
//! Construct appenders from configuration documents by type identifier:
//!
//! ```no_run
//! use loggly_append::AppenderConfig;
//! use loggly_append::AppenderRegistry;
//!
//! let registry = AppenderRegistry::default();
//! let config: AppenderConfig =
//!     serde_json::from_str(r#"{"token": "your-loggly-token", "threshold": "info"}"#).unwrap();
//! let appender = registry.build("loggly", &config, "my-app").unwrap();
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod append;
pub mod bridge;
pub mod layout;
pub mod record;

mod batch;
mod client;
mod config;
mod error;
mod metrics;
mod registry;
mod trap;
mod worker;

pub use append::Append;
pub use append::LogglyAppender;
pub use append::LogglyAppenderBuilder;
pub use config::AppenderConfig;
pub use config::EndpointMode;
pub use config::HostPort;
pub use error::ConfigError;
pub use error::DeliverError;
pub use metrics::MetricsSnapshot;
pub use record::AccessRecord;
pub use record::Level;
pub use record::LogRecord;
pub use record::Threshold;
pub use registry::AppenderRegistry;
pub use trap::DefaultTrap;
pub use trap::Trap;
