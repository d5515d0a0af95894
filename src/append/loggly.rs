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

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::SendTimeoutError;
use crossbeam_channel::Sender;

use crate::append::Append;
use crate::batch::BatchBuffer;
use crate::batch::EncodedEvent;
use crate::batch::Enqueue;
use crate::client::LogglyClient;
use crate::config::AppenderConfig;
use crate::error::ConfigError;
use crate::layout::AccessJsonLayout;
use crate::layout::JsonLayout;
use crate::metrics::Metrics;
use crate::metrics::MetricsSnapshot;
use crate::record::AccessRecord;
use crate::record::LogRecord;
use crate::record::Threshold;
use crate::trap::DefaultTrap;
use crate::trap::Trap;
use crate::worker::Signal;
use crate::worker::Worker;

/// An appender that ships records to Loggly in batches.
///
/// Each appender owns one background worker thread that drives timer-based
/// flushes and all network I/O. Dropping the appender attempts one final
/// flush within the configured shutdown grace period; events still unflushed
/// after that are discarded.
///
/// # Examples
///
/// ```no_run
/// use loggly_append::Append;
/// use loggly_append::AppenderConfig;
/// use loggly_append::LogRecord;
/// use loggly_append::LogglyAppenderBuilder;
///
/// let config = AppenderConfig::new("your-loggly-token");
/// let appender = LogglyAppenderBuilder::new(config, "my-app").build().unwrap();
///
/// appender.submit(LogRecord::builder().message("service started").build());
/// ```
#[derive(Debug)]
pub struct LogglyAppender {
    threshold: Threshold,
    log_layout: JsonLayout,
    access_layout: AccessJsonLayout,
    buffer: Arc<BatchBuffer>,
    sender: Sender<Signal>,
    trap: Arc<dyn Trap>,
    metrics: Arc<Metrics>,
    _guard: WorkerGuard,
}

impl LogglyAppender {
    /// The threshold this appender filters with.
    pub fn threshold(&self) -> Threshold {
        self.threshold
    }

    /// A point-in-time copy of the delivery counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    fn enqueue(&self, encoded: anyhow::Result<Vec<u8>>) {
        let encoded = match encoded {
            Ok(encoded) => encoded,
            Err(err) => {
                self.trap.trap(&err.context("failed to encode record"));
                return;
            }
        };

        let outcome = self.buffer.enqueue(EncodedEvent::new(encoded));
        self.metrics.incr_events_enqueued();

        match outcome {
            // wake the parked worker so it arms the delay timer
            Enqueue::Started => self.signal(Signal::Wake),
            Enqueue::Pending => (),
            Enqueue::Full => self.signal(Signal::Flush),
        }
    }

    fn signal(&self, signal: Signal) {
        if self.sender.send(signal).is_err() {
            let err = anyhow::Error::msg("loggly worker thread is gone; record buffered only");
            self.trap.trap(&err);
        }
    }
}

impl Append for LogglyAppender {
    fn submit(&self, record: LogRecord) {
        if !self.threshold.admits(record.level()) {
            return;
        }
        self.enqueue(self.log_layout.format(&record));
    }

    fn submit_access(&self, record: AccessRecord) {
        self.enqueue(self.access_layout.format(&record));
    }

    fn flush(&self) {
        self.signal(Signal::Flush);
    }
}

/// A builder for configuring a [`LogglyAppender`].
pub struct LogglyAppenderBuilder {
    config: AppenderConfig,
    application_name: String,
    thread_name: String,
    trap: Box<dyn Trap>,
}

impl LogglyAppenderBuilder {
    /// Create a builder from validated-on-build settings and the name of the
    /// host application (used as the tag when the config sets none).
    pub fn new(config: AppenderConfig, application_name: impl Into<String>) -> Self {
        LogglyAppenderBuilder {
            config,
            application_name: application_name.into(),
            thread_name: "loggly-append".to_string(),
            trap: Box::new(DefaultTrap::default()),
        }
    }

    /// Set the worker thread name.
    pub fn thread_name(mut self, thread_name: impl Into<String>) -> Self {
        self.thread_name = thread_name.into();
        self
    }

    /// Set the trap that receives delivery failures.
    pub fn trap(mut self, trap: impl Into<Box<dyn Trap>>) -> Self {
        self.trap = trap.into();
        self
    }

    /// Validate the configuration and start the appender.
    pub fn build(self) -> Result<LogglyAppender, ConfigError> {
        let Self {
            config,
            application_name,
            thread_name,
            trap,
        } = self;

        config.validate()?;

        let tag = config.resolve_tag(&application_name);
        let metrics = Arc::new(Metrics::default());
        let client = LogglyClient::new(&config, &tag, metrics.clone())?;
        let buffer = Arc::new(BatchBuffer::new(config.max_batch_size));
        let trap: Arc<dyn Trap> = Arc::from(trap);

        let (sender, receiver) = crossbeam_channel::unbounded();
        let (shutdown_sender, shutdown_receiver) = crossbeam_channel::bounded(0);

        let worker = Worker::new(
            receiver,
            shutdown_receiver,
            buffer.clone(),
            client,
            config.max_batch_delay,
            trap.clone(),
            metrics.clone(),
        );
        let handle = worker.make_thread(thread_name);
        let guard = WorkerGuard::new(
            handle,
            sender.clone(),
            shutdown_sender,
            config.shutdown_timeout,
        );

        Ok(LogglyAppender {
            threshold: config.threshold,
            log_layout: JsonLayout::default(),
            access_layout: AccessJsonLayout::default(),
            buffer,
            sender,
            trap,
            metrics,
            _guard: guard,
        })
    }
}

/// Shuts the worker down on drop, granting it a bounded window to run the
/// final flush.
#[derive(Debug)]
struct WorkerGuard {
    _handle: Option<JoinHandle<()>>,
    sender: Sender<Signal>,
    shutdown: Sender<()>,
    shutdown_timeout: Duration,
}

impl WorkerGuard {
    fn new(
        handle: JoinHandle<()>,
        sender: Sender<Signal>,
        shutdown: Sender<()>,
        shutdown_timeout: Duration,
    ) -> Self {
        WorkerGuard {
            _handle: Some(handle),
            sender,
            shutdown,
            shutdown_timeout,
        }
    }
}

impl Drop for WorkerGuard {
    fn drop(&mut self) {
        let shutdown_timeout = self.shutdown_timeout;
        match self
            .sender
            .send_timeout(Signal::Shutdown, shutdown_timeout)
        {
            Ok(()) => {
                // The worker takes the rendezvous only after its final flush,
                // so this bounds how long shutdown waits for delivery.
                let _ = self.shutdown.send_timeout((), shutdown_timeout);
            }
            Err(SendTimeoutError::Disconnected(_)) => (),
            Err(SendTimeoutError::Timeout(_)) => {
                eprintln!("failed to signal shutdown to loggly worker");
            }
        }
    }
}
