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

//! Best-effort delivery counters.
//!
//! Shipping failures never surface to the host application; these counters
//! are how an operator observes that the appender degraded.

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

#[derive(Debug, Default)]
pub(crate) struct Metrics {
    events_enqueued: AtomicU64,
    events_dropped: AtomicU64,
    batches_delivered: AtomicU64,
    batches_abandoned: AtomicU64,
    retry_attempts: AtomicU64,
}

impl Metrics {
    pub(crate) fn incr_events_enqueued(&self) {
        self.events_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_events_dropped(&self, count: u64) {
        self.events_dropped.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn incr_batches_delivered(&self) {
        self.batches_delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn incr_batches_abandoned(&self) {
        self.batches_abandoned.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn incr_retry_attempts(&self) {
        self.retry_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            events_enqueued: self.events_enqueued.load(Ordering::Relaxed),
            events_dropped: self.events_dropped.load(Ordering::Relaxed),
            batches_delivered: self.batches_delivered.load(Ordering::Relaxed),
            batches_abandoned: self.batches_abandoned.load(Ordering::Relaxed),
            retry_attempts: self.retry_attempts.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of an appender's delivery counters.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[non_exhaustive]
pub struct MetricsSnapshot {
    /// Events accepted past the threshold and queued for delivery.
    pub events_enqueued: u64,
    /// Events discarded after delivery gave up on their batch.
    pub events_dropped: u64,
    /// Batches acknowledged with a 2xx response.
    pub batches_delivered: u64,
    /// Batches given up on, either rejected or past the retry budget.
    pub batches_abandoned: u64,
    /// Individual redelivery attempts after transient failures.
    pub retry_attempts: u64,
}
