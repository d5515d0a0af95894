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

//! End-to-end shipping tests against a local mock endpoint.

use std::time::Duration;

use loggly_append::Append;
use loggly_append::AppenderConfig;
use loggly_append::EndpointMode;
use loggly_append::Level;
use loggly_append::LogRecord;
use loggly_append::LogglyAppender;
use loggly_append::LogglyAppenderBuilder;

const BULK_PATH: &str = "/bulk/t0k3n/tag/test";
const SINGLE_PATH: &str = "/inputs/t0k3n/tag/test";

fn appender(server: &mockito::ServerGuard, tweak: impl FnOnce(&mut AppenderConfig)) -> LogglyAppender {
    let mut config = AppenderConfig::new("t0k3n");
    config.tag = Some("test".to_string());
    config.endpoint = Some(format!("{}{BULK_PATH}", server.url()));
    config.shutdown_timeout = Duration::from_secs(5);
    tweak(&mut config);
    LogglyAppenderBuilder::new(config, "test").build().unwrap()
}

fn record(message: &str) -> LogRecord {
    LogRecord::builder()
        .level(Level::Info)
        .logger("shipping::test")
        .message(message)
        .build()
}

#[test]
fn ships_pending_records_in_one_ordered_batch() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", BULK_PATH)
        .match_header("content-type", "text/plain")
        .match_body(mockito::Matcher::Regex(
            r#"(?s)"message":"one".*"message":"two".*"message":"three""#.to_string(),
        ))
        .with_status(200)
        .expect(1)
        .create();

    let appender = appender(&server, |config| {
        config.max_batch_size = 10;
        config.max_batch_delay = Duration::from_secs(60);
    });
    appender.submit(record("one"));
    appender.submit(record("two"));
    appender.submit(record("three"));
    drop(appender);

    mock.assert();
}

#[test]
fn flushes_every_time_the_batch_fills() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", BULK_PATH)
        .with_status(200)
        .expect_at_least(2)
        .create();

    let appender = appender(&server, |config| {
        config.max_batch_size = 10;
        config.max_batch_delay = Duration::from_secs(60);
    });
    for i in 0..25 {
        appender.submit(record(&format!("event-{i}")));
    }
    assert_eq!(appender.metrics().events_enqueued, 25);
    drop(appender);

    // 25 events at a batch size of 10: two full batches plus the final flush.
    mock.assert();
}

#[test]
fn delay_elapsing_flushes_the_batch_exactly_once() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", BULK_PATH)
        .match_body(mockito::Matcher::Regex(
            r#"(?s)"message":"one".*"message":"two".*"message":"three""#.to_string(),
        ))
        .with_status(200)
        .expect(1)
        .create();

    let appender = appender(&server, |config| {
        config.max_batch_size = 10;
        config.max_batch_delay = Duration::from_millis(200);
    });
    appender.submit(record("one"));
    appender.submit(record("two"));
    appender.submit(record("three"));

    // the timer, not shutdown, must deliver: wait while the appender lives
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while appender.metrics().batches_delivered == 0 && std::time::Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(appender.metrics().batches_delivered, 1);
    drop(appender);

    mock.assert();
}

#[test]
fn sends_nothing_when_nothing_was_submitted() {
    let mut server = mockito::Server::new();
    let mock = server.mock("POST", BULK_PATH).expect(0).create();

    let appender = appender(&server, |_| {});
    drop(appender);

    mock.assert();
}

#[test]
fn shutdown_flushes_a_partial_batch() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", BULK_PATH)
        .match_body(mockito::Matcher::Regex(r#""message":"straggler""#.to_string()))
        .with_status(200)
        .expect(1)
        .create();

    let appender = appender(&server, |config| {
        config.max_batch_size = 100;
        config.max_batch_delay = Duration::from_secs(60);
    });
    appender.submit(record("straggler"));
    drop(appender);

    mock.assert();
}

#[test]
fn threshold_drops_records_before_they_are_buffered() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", BULK_PATH)
        .match_body(mockito::Matcher::Regex(r#"(?s)\A[^\n]*"message":"kept"[^\n]*\n\z"#.to_string()))
        .with_status(200)
        .expect(1)
        .create();

    let appender = appender(&server, |config| {
        config.threshold = Level::Warn.into();
    });
    appender.submit(record("filtered"));
    appender.submit(
        LogRecord::builder()
            .level(Level::Error)
            .logger("shipping::test")
            .message("kept")
            .build(),
    );
    assert_eq!(appender.metrics().events_enqueued, 1);
    drop(appender);

    mock.assert();
}

#[test]
fn single_mode_counts_only_undelivered_events_as_dropped() {
    let mut server = mockito::Server::new();
    let delivered = server
        .mock("POST", SINGLE_PATH)
        .match_body(mockito::Matcher::Regex(r#""message":"good""#.to_string()))
        .with_status(200)
        .expect(1)
        .create();
    let rejected = server
        .mock("POST", SINGLE_PATH)
        .match_body(mockito::Matcher::Regex(r#""message":"bad""#.to_string()))
        .with_status(401)
        .expect(1)
        .create();

    let appender = appender(&server, |config| {
        config.mode = EndpointMode::Single;
        config.endpoint = Some(format!("{}{SINGLE_PATH}", server.url()));
    });
    appender.submit(record("good"));
    appender.submit(record("bad"));
    appender.flush();

    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while appender.metrics().batches_abandoned == 0 && std::time::Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }

    let metrics = appender.metrics();
    assert_eq!(metrics.events_enqueued, 2);
    assert_eq!(metrics.events_dropped, 1);
    assert_eq!(metrics.batches_abandoned, 1);
    drop(appender);

    delivered.assert();
    rejected.assert();
}

#[test]
fn rejected_batch_is_abandoned_without_retry() {
    let mut server = mockito::Server::new();
    let mock = server.mock("POST", BULK_PATH).with_status(401).expect(1).create();

    let appender = appender(&server, |_| {});
    appender.submit(record("doomed"));
    appender.flush();

    // give the worker time to take the flush signal and hit the endpoint
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while appender.metrics().batches_abandoned == 0 && std::time::Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }

    let metrics = appender.metrics();
    assert_eq!(metrics.batches_abandoned, 1);
    assert_eq!(metrics.events_dropped, 1);
    assert_eq!(metrics.batches_delivered, 0);
    drop(appender);

    mock.assert();
}
