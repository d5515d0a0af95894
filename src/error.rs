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

/// Errors detected while validating an appender configuration.
///
/// Configuration errors fail fast: every constructor path validates before any
/// worker thread is spawned.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("token must not be empty")]
    EmptyToken,
    #[error("invalid server address {address:?}: {reason}")]
    InvalidServer { address: String, reason: String },
    #[error("malformed threshold: {0:?}")]
    MalformedThreshold(String),
    #[error("max_batch_size must be greater than zero")]
    ZeroBatchSize,
    #[error("unknown appender type: {0:?}")]
    UnknownType(String),
    #[error("failed to build http client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Errors raised while delivering a batch to Loggly.
///
/// These never reach the host application's call path; the worker reports them
/// through the configured [`Trap`](crate::Trap) and moves on.
#[derive(Debug, thiserror::Error)]
pub enum DeliverError {
    /// The service rejected the batch with a 4xx status. Not retried.
    #[error("loggly rejected the batch: status {status}")]
    Rejected { status: u16 },
    /// Transient failures outlasted the retry budget. The batch is dropped.
    #[error("delivery failed after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: String },
}
