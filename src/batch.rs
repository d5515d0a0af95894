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

//! The pending-batch buffer shared between callers and the worker thread.
//!
//! The buffer moves through `Empty -> Accumulating -> Empty`: the first
//! enqueue starts a batch and arms the delay deadline, and [`BatchBuffer::drain`]
//! hands the whole batch over atomically. Events enqueued while a drained
//! batch is still in flight accumulate into a fresh batch instead of blocking.

use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;

/// One JSON-encoded record, owned by the buffer until flushed.
#[derive(Debug)]
pub(crate) struct EncodedEvent {
    bytes: Vec<u8>,
}

impl EncodedEvent {
    pub(crate) fn new(bytes: Vec<u8>) -> Self {
        EncodedEvent { bytes }
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub(crate) fn len(&self) -> usize {
        self.bytes.len()
    }
}

/// Outcome of appending one event to the buffer.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Enqueue {
    /// First event of a new batch; the flush timer starts now.
    Started,
    /// Appended to a batch already under way.
    Pending,
    /// The batch reached the count limit and should be flushed now.
    Full,
}

#[derive(Debug, Default)]
struct Pending {
    events: Vec<EncodedEvent>,
    // armed by the first enqueue of a batch, disarmed by drain
    since: Option<Instant>,
}

#[derive(Debug)]
pub(crate) struct BatchBuffer {
    max_events: usize,
    pending: Mutex<Pending>,
}

impl BatchBuffer {
    pub(crate) fn new(max_events: usize) -> Self {
        BatchBuffer {
            max_events,
            pending: Mutex::new(Pending::default()),
        }
    }

    /// Append an event, reporting whether it started a new batch or filled
    /// the current one.
    pub(crate) fn enqueue(&self, event: EncodedEvent) -> Enqueue {
        let mut pending = self.lock();
        let started = pending.events.is_empty();
        if started {
            pending.since = Some(Instant::now());
        }
        pending.events.push(event);
        if pending.events.len() >= self.max_events {
            Enqueue::Full
        } else if started {
            Enqueue::Started
        } else {
            Enqueue::Pending
        }
    }

    /// Take the accumulated batch, leaving the buffer empty.
    ///
    /// The swap happens under the lock, so a concurrent enqueue lands either
    /// entirely in the returned batch or entirely in the next one.
    pub(crate) fn drain(&self) -> Vec<EncodedEvent> {
        let mut pending = self.lock();
        pending.since = None;
        std::mem::take(&mut pending.events)
    }

    /// The instant at which the oldest unflushed event exceeds `max_delay`,
    /// or `None` while the buffer is empty.
    pub(crate) fn deadline(&self, max_delay: Duration) -> Option<Instant> {
        self.lock().since.map(|since| since + max_delay)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.lock().events.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Pending> {
        // a poisoned lock only means a panicking thread left a consistent
        // Vec behind; keep shipping
        self.pending.lock().unwrap_or_else(|err| err.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(text: &str) -> EncodedEvent {
        EncodedEvent::new(text.as_bytes().to_vec())
    }

    #[test]
    fn enqueue_reports_batch_start_and_count_limit() {
        let buffer = BatchBuffer::new(3);
        assert_eq!(buffer.enqueue(event("a")), Enqueue::Started);
        assert_eq!(buffer.enqueue(event("b")), Enqueue::Pending);
        assert_eq!(buffer.enqueue(event("c")), Enqueue::Full);

        buffer.drain();
        assert_eq!(buffer.enqueue(event("d")), Enqueue::Started);
    }

    #[test]
    fn single_event_batches_are_full_immediately() {
        let buffer = BatchBuffer::new(1);
        assert_eq!(buffer.enqueue(event("a")), Enqueue::Full);
    }

    #[test]
    fn drain_returns_events_in_enqueue_order() {
        let buffer = BatchBuffer::new(10);
        buffer.enqueue(event("one"));
        buffer.enqueue(event("two"));
        buffer.enqueue(event("three"));

        let batch = buffer.drain();
        let texts: Vec<_> = batch
            .iter()
            .map(|e| String::from_utf8(e.as_bytes().to_vec()).unwrap())
            .collect();
        assert_eq!(texts, ["one", "two", "three"]);
        assert_eq!(buffer.len(), 0);
    }

    #[test]
    fn deadline_is_armed_by_first_enqueue_and_cleared_by_drain() {
        let buffer = BatchBuffer::new(10);
        let max_delay = Duration::from_secs(5);
        assert!(buffer.deadline(max_delay).is_none());

        buffer.enqueue(event("a"));
        let first = buffer.deadline(max_delay).unwrap();
        buffer.enqueue(event("b"));
        // the deadline tracks the first unflushed event, not the latest
        assert_eq!(buffer.deadline(max_delay).unwrap(), first);

        buffer.drain();
        assert!(buffer.deadline(max_delay).is_none());
    }

    #[test]
    fn events_after_drain_start_a_new_batch() {
        let buffer = BatchBuffer::new(10);
        buffer.enqueue(event("old"));
        let in_flight = buffer.drain();
        buffer.enqueue(event("new"));

        assert_eq!(in_flight.len(), 1);
        let next = buffer.drain();
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].as_bytes(), b"new");
    }

    #[test]
    fn encoded_event_tracks_byte_size() {
        assert_eq!(event("{\"a\":1}").len(), 7);
    }
}
