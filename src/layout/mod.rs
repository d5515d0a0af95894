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

//! Layouts that encode records as Loggly JSON documents.
//!
//! Field names are a wire contract with the aggregation service and must not
//! change; see <https://www.loggly.com/docs/automated-parsing/#json>.

pub use access::AccessJsonLayout;
pub use json::JsonLayout;

mod access;
mod json;

use jiff::Timestamp;

// Loggly parses timestamps as ISO-8601 with millisecond precision and an
// explicit UTC `Z` suffix.
fn serialize_timestamp<S>(timestamp: &Timestamp, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_str(&format_args!("{timestamp:.3}"))
}
