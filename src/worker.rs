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

use crossbeam_channel::Receiver;
use crossbeam_channel::RecvTimeoutError;

use crate::batch::BatchBuffer;
use crate::client::LogglyClient;
use crate::metrics::Metrics;
use crate::trap::Trap;

/// Control messages from the appender to its worker thread.
#[derive(Debug)]
pub(crate) enum Signal {
    /// A new batch started; wake up and arm the delay timer.
    Wake,
    /// Flush the pending batch now (count limit reached or explicit flush).
    Flush,
    /// Final flush, then exit.
    Shutdown,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum WorkerState {
    Continue,
    Shutdown,
    Disconnected,
}

/// The background task that drives flush-on-timer and delivery.
///
/// All network I/O happens here; callers of `submit` only touch the buffer
/// and the control channel.
pub(crate) struct Worker {
    receiver: Receiver<Signal>,
    shutdown: Receiver<()>,
    buffer: Arc<BatchBuffer>,
    client: LogglyClient,
    max_delay: std::time::Duration,
    trap: Arc<dyn Trap>,
    metrics: Arc<Metrics>,
}

impl Worker {
    pub(crate) fn new(
        receiver: Receiver<Signal>,
        shutdown: Receiver<()>,
        buffer: Arc<BatchBuffer>,
        client: LogglyClient,
        max_delay: std::time::Duration,
        trap: Arc<dyn Trap>,
        metrics: Arc<Metrics>,
    ) -> Worker {
        Worker {
            receiver,
            shutdown,
            buffer,
            client,
            max_delay,
            trap,
            metrics,
        }
    }

    fn step(&mut self) -> WorkerState {
        let signal = match self.buffer.deadline(self.max_delay) {
            Some(deadline) => self.receiver.recv_deadline(deadline),
            None => self
                .receiver
                .recv()
                .map_err(|_| RecvTimeoutError::Disconnected),
        };

        match signal {
            // the next step picks up the freshly armed deadline
            Ok(Signal::Wake) => WorkerState::Continue,
            Ok(Signal::Flush) | Err(RecvTimeoutError::Timeout) => {
                self.flush();
                WorkerState::Continue
            }
            Ok(Signal::Shutdown) => WorkerState::Shutdown,
            Err(RecvTimeoutError::Disconnected) => WorkerState::Disconnected,
        }
    }

    fn flush(&self) {
        let batch = self.buffer.drain();
        if batch.is_empty() {
            return;
        }

        match self.client.deliver(&batch) {
            Ok(()) => self.metrics.incr_batches_delivered(),
            Err(failure) => {
                self.metrics.incr_batches_abandoned();
                // single-event mode may have posted part of the batch
                let dropped = batch.len() - failure.delivered;
                self.metrics.add_events_dropped(dropped as u64);
                let err = anyhow::Error::new(failure.error)
                    .context("failed to deliver batch to loggly");
                self.trap.trap(&err);
            }
        }
    }

    pub(crate) fn make_thread(mut self, name: String) -> std::thread::JoinHandle<()> {
        std::thread::Builder::new()
            .name(name)
            .spawn(move || {
                loop {
                    match self.step() {
                        WorkerState::Continue => {}
                        WorkerState::Shutdown | WorkerState::Disconnected => {
                            // one final flush of whatever accumulated
                            self.flush();
                            let _ = self.shutdown.recv();
                            break;
                        }
                    }
                }
            })
            .expect("failed to spawn the loggly appender worker thread")
    }
}
