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

//! Appenders that forward submitted records.

use std::fmt;

use crate::record::AccessRecord;
use crate::record::LogRecord;

mod loggly;

pub use self::loggly::LogglyAppender;
pub use self::loggly::LogglyAppenderBuilder;

/// A sink for log and HTTP access records.
///
/// Both submit methods are fire-and-forget: they never block on network I/O
/// and never surface delivery problems to the caller.
pub trait Append: fmt::Debug + Send + Sync + 'static {
    /// Submit an application log record.
    fn submit(&self, record: LogRecord);

    /// Submit an HTTP access record.
    fn submit_access(&self, record: AccessRecord);

    /// Request an early flush of any buffered records.
    ///
    /// Default to a no-op.
    fn flush(&self) {}
}

impl<T: Append> From<T> for Box<dyn Append> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}
