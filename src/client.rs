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

//! HTTPS delivery of batches to the Loggly intake endpoints.

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;

use crate::batch::EncodedEvent;
use crate::config::AppenderConfig;
use crate::config::EndpointMode;
use crate::error::ConfigError;
use crate::error::DeliverError;
use crate::metrics::Metrics;

const INITIAL_BACKOFF: Duration = Duration::from_millis(250);

// Loggly expects newline-delimited JSON with this content type, not
// application/json.
const LOGGLY_CONTENT_TYPE: &str = "text/plain";

/// A failed delivery, with how much of the batch had gone out already.
#[derive(Debug)]
pub(crate) struct DeliveryFailure {
    /// Events posted successfully before the failing one. Always zero in
    /// bulk mode, where the whole batch is one request.
    pub(crate) delivered: usize,
    pub(crate) error: DeliverError,
}

/// Delivers formatted batches to one endpoint URL.
///
/// Runs exclusively on the appender's worker thread; callers never wait on
/// the network.
#[derive(Debug)]
pub(crate) struct LogglyClient {
    endpoint: String,
    mode: EndpointMode,
    http: reqwest::blocking::Client,
    max_retries: u32,
    initial_backoff: Duration,
    metrics: Arc<Metrics>,
}

impl LogglyClient {
    pub(crate) fn new(
        config: &AppenderConfig,
        tag: &str,
        metrics: Arc<Metrics>,
    ) -> Result<LogglyClient, ConfigError> {
        let endpoint = config.endpoint_url(tag)?;
        let http = reqwest::blocking::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(ConfigError::HttpClient)?;

        Ok(LogglyClient {
            endpoint,
            mode: config.mode,
            http,
            max_retries: config.max_retries,
            initial_backoff: INITIAL_BACKOFF,
            metrics,
        })
    }

    /// Deliver one batch. In bulk mode the whole batch is a single request;
    /// in single-event mode each event is posted on its own, and the first
    /// hard failure abandons the remainder of the batch.
    pub(crate) fn deliver(&self, batch: &[EncodedEvent]) -> Result<(), DeliveryFailure> {
        match self.mode {
            EndpointMode::Bulk => self
                .send_with_retry(&join_lines(batch))
                .map_err(|error| DeliveryFailure {
                    delivered: 0,
                    error,
                }),
            EndpointMode::Single => {
                for (delivered, event) in batch.iter().enumerate() {
                    self.send_with_retry(event.as_bytes())
                        .map_err(|error| DeliveryFailure { delivered, error })?;
                }
                Ok(())
            }
        }
    }

    fn send_with_retry(&self, body: &[u8]) -> Result<(), DeliverError> {
        let mut attempts = 0u32;
        let mut backoff = self.initial_backoff;

        loop {
            attempts += 1;
            let last = match self.post(body) {
                Ok(status) if status.is_success() => return Ok(()),
                // 4xx means a malformed token or tag; retrying cannot help
                Ok(status) if status.is_client_error() => {
                    return Err(DeliverError::Rejected {
                        status: status.as_u16(),
                    });
                }
                Ok(status) => format!("unexpected status {status}"),
                Err(err) => err.to_string(),
            };

            if attempts > self.max_retries {
                return Err(DeliverError::Exhausted { attempts, last });
            }

            self.metrics.incr_retry_attempts();
            std::thread::sleep(backoff);
            backoff *= 2;
        }
    }

    fn post(&self, body: &[u8]) -> Result<StatusCode, reqwest::Error> {
        self.http
            .post(&self.endpoint)
            .header(CONTENT_TYPE, LOGGLY_CONTENT_TYPE)
            .body(body.to_vec())
            .send()
            .map(|response| response.status())
    }
}

fn join_lines(batch: &[EncodedEvent]) -> Vec<u8> {
    let size: usize = batch.iter().map(|event| event.len() + 1).sum();
    let mut body = Vec::with_capacity(size);
    for event in batch {
        body.extend_from_slice(event.as_bytes());
        body.push(b'\n');
    }
    body
}
