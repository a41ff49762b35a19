// Weft - Flat Record Binding Engine
//
// Copyright (c) 2025 Weft Contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Handlers for the W3C XML Schema `date`, `time`, and `dateTime` lexical
//! forms.
//!
//! Parsing tries a non-lenient format set first, anchored to `yyyy-MM-dd`
//! with optional time and optional zone. On failure, a handler configured
//! lenient tries partial forms with an implicit 1970-01-01 date. Values
//! parsed as `time` always carry the epoch date. Zone offsets are compared
//! and reproduced using the total offset in seconds.

use super::TypeHandler;
use crate::error::{WeftError, WeftResult};
use crate::schema::TypeRef;
use crate::value::{DateTimeValue, Value};
use chrono::{FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::BTreeMap;

/// Split a trailing zone designator (`Z` or `±hh:mm`) off a lexical form.
fn split_zone(text: &str) -> WeftResult<(&str, Option<FixedOffset>)> {
    if let Some(body) = text.strip_suffix('Z') {
        let zero = FixedOffset::east_opt(0)
            .ok_or_else(|| WeftError::conversion("invalid zone offset", 0))?;
        return Ok((body, Some(zero)));
    }
    let bytes = text.as_bytes();
    if bytes.len() >= 6 {
        let at = bytes.len() - 6;
        let sign = bytes[at];
        if (sign == b'+' || sign == b'-') && bytes[bytes.len() - 3] == b':' {
            let digits = &text[at + 1..];
            let hh: i32 = digits[..2]
                .parse()
                .map_err(|_| WeftError::conversion(format!("invalid zone '{}'", digits), 0))?;
            let mm: i32 = digits[3..]
                .parse()
                .map_err(|_| WeftError::conversion(format!("invalid zone '{}'", digits), 0))?;
            let mut seconds = hh * 3600 + mm * 60;
            if sign == b'-' {
                seconds = -seconds;
            }
            let offset = FixedOffset::east_opt(seconds).ok_or_else(|| {
                WeftError::conversion(format!("zone offset '{}' out of range", digits), 0)
            })?;
            return Ok((&text[..at], Some(offset)));
        }
    }
    Ok((text, None))
}

/// Reject non-zero offsets when a handler forbids zones.
fn check_zone(offset: Option<FixedOffset>, allowed: bool, text: &str) -> WeftResult<()> {
    if !allowed {
        if let Some(o) = offset {
            if o.local_minus_utc() != 0 {
                return Err(WeftError::conversion(
                    format!("zone offset not allowed in '{}'", text),
                    0,
                ));
            }
        }
    }
    Ok(())
}

/// Render an offset in the canonical lexical form.
fn format_offset(offset: FixedOffset) -> String {
    let total = offset.local_minus_utc();
    if total == 0 {
        return "Z".to_string();
    }
    let sign = if total < 0 { '-' } else { '+' };
    let abs = total.abs();
    format!("{}{:02}:{:02}", sign, abs / 3600, (abs % 3600) / 60)
}

fn parse_date(body: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(body, "%Y-%m-%d").ok()
}

fn parse_time(body: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(body, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(body, "%H:%M"))
        .ok()
}

fn parse_datetime(body: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(body, "%Y-%m-%dT%H:%M:%S%.f").ok()
}

/// The epoch date substituted for time-only forms.
fn epoch() -> NaiveDate {
    NaiveDate::default()
}

/// `xs:date` handler.
#[derive(Debug, Clone, Copy)]
pub struct XmlDateHandler {
    /// Accept partial/extended forms after the strict set fails.
    pub lenient: bool,
    /// Permit non-zero zone offsets.
    pub time_zone_allowed: bool,
}

impl XmlDateHandler {
    pub fn new() -> Self {
        Self {
            lenient: false,
            time_zone_allowed: true,
        }
    }

    pub fn lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }
}

impl Default for XmlDateHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeHandler for XmlDateHandler {
    fn parse(&self, text: &str) -> WeftResult<Value> {
        if text.is_empty() {
            return Ok(Value::Null);
        }
        let (body, offset) = split_zone(text)?;
        check_zone(offset, self.time_zone_allowed, text)?;

        let date = parse_date(body).or_else(|| {
            if self.lenient {
                // Accept a full dateTime and truncate to the date.
                parse_datetime(body).map(|dt| dt.date())
            } else {
                None
            }
        });
        match date {
            Some(d) => Ok(Value::DateTime(DateTimeValue {
                timestamp: d.and_time(NaiveTime::default()),
                offset,
            })),
            None => Err(WeftError::conversion(
                format!("invalid date '{}'", text),
                0,
            )),
        }
    }

    fn format(&self, value: &Value) -> WeftResult<Option<String>> {
        match value {
            Value::Null => Ok(None),
            Value::DateTime(d) => {
                let mut out = d.timestamp.format("%Y-%m-%d").to_string();
                if let Some(o) = d.offset {
                    out.push_str(&format_offset(o));
                }
                Ok(Some(out))
            }
            other => Err(WeftError::conversion(
                format!("expected a date value, got '{}'", other),
                0,
            )),
        }
    }

    fn target_type(&self) -> TypeRef {
        TypeRef::DateTime
    }

    fn configure(&mut self, properties: &BTreeMap<String, String>) -> WeftResult<()> {
        configure_flags(&mut self.lenient, &mut self.time_zone_allowed, properties)
    }
}

/// `xs:time` handler. The date portion of parsed values is always the Unix
/// epoch.
#[derive(Debug, Clone, Copy)]
pub struct XmlTimeHandler {
    pub lenient: bool,
    pub time_zone_allowed: bool,
}

impl XmlTimeHandler {
    pub fn new() -> Self {
        Self {
            lenient: false,
            time_zone_allowed: true,
        }
    }

    pub fn lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }
}

impl Default for XmlTimeHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeHandler for XmlTimeHandler {
    fn parse(&self, text: &str) -> WeftResult<Value> {
        if text.is_empty() {
            return Ok(Value::Null);
        }
        let (body, offset) = split_zone(text)?;
        check_zone(offset, self.time_zone_allowed, text)?;

        let strict = NaiveTime::parse_from_str(body, "%H:%M:%S%.f").ok();
        let time = strict.or_else(|| {
            if self.lenient {
                parse_time(body).or_else(|| parse_datetime(body).map(|dt| dt.time()))
            } else {
                None
            }
        });
        match time {
            Some(t) => Ok(Value::DateTime(DateTimeValue {
                timestamp: epoch().and_time(t),
                offset,
            })),
            None => Err(WeftError::conversion(
                format!("invalid time '{}'", text),
                0,
            )),
        }
    }

    fn format(&self, value: &Value) -> WeftResult<Option<String>> {
        match value {
            Value::Null => Ok(None),
            Value::DateTime(d) => {
                let mut out = d.timestamp.format("%H:%M:%S").to_string();
                if let Some(o) = d.offset {
                    out.push_str(&format_offset(o));
                }
                Ok(Some(out))
            }
            other => Err(WeftError::conversion(
                format!("expected a time value, got '{}'", other),
                0,
            )),
        }
    }

    fn target_type(&self) -> TypeRef {
        TypeRef::DateTime
    }

    fn configure(&mut self, properties: &BTreeMap<String, String>) -> WeftResult<()> {
        configure_flags(&mut self.lenient, &mut self.time_zone_allowed, properties)
    }
}

/// `xs:dateTime` handler.
#[derive(Debug, Clone, Copy)]
pub struct XmlDateTimeHandler {
    pub lenient: bool,
    pub time_zone_allowed: bool,
}

impl XmlDateTimeHandler {
    pub fn new() -> Self {
        Self {
            lenient: false,
            time_zone_allowed: true,
        }
    }

    pub fn lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }
}

impl Default for XmlDateTimeHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeHandler for XmlDateTimeHandler {
    fn parse(&self, text: &str) -> WeftResult<Value> {
        if text.is_empty() {
            return Ok(Value::Null);
        }
        let (body, offset) = split_zone(text)?;
        check_zone(offset, self.time_zone_allowed, text)?;

        let strict = parse_datetime(body);
        let timestamp = strict.or_else(|| {
            if self.lenient {
                parse_date(body)
                    .map(|d| d.and_time(NaiveTime::default()))
                    .or_else(|| parse_time(body).map(|t| epoch().and_time(t)))
            } else {
                None
            }
        });
        match timestamp {
            Some(ts) => Ok(Value::DateTime(DateTimeValue {
                timestamp: ts,
                offset,
            })),
            None => Err(WeftError::conversion(
                format!("invalid dateTime '{}'", text),
                0,
            )),
        }
    }

    fn format(&self, value: &Value) -> WeftResult<Option<String>> {
        match value {
            Value::Null => Ok(None),
            Value::DateTime(d) => {
                let mut out = d.timestamp.format("%Y-%m-%dT%H:%M:%S").to_string();
                if let Some(o) = d.offset {
                    out.push_str(&format_offset(o));
                }
                Ok(Some(out))
            }
            other => Err(WeftError::conversion(
                format!("expected a dateTime value, got '{}'", other),
                0,
            )),
        }
    }

    fn target_type(&self) -> TypeRef {
        TypeRef::DateTime
    }

    fn configure(&mut self, properties: &BTreeMap<String, String>) -> WeftResult<()> {
        configure_flags(&mut self.lenient, &mut self.time_zone_allowed, properties)
    }
}

fn configure_flags(
    lenient: &mut bool,
    time_zone_allowed: &mut bool,
    properties: &BTreeMap<String, String>,
) -> WeftResult<()> {
    if let Some(v) = properties.get("lenient") {
        *lenient = parse_flag("lenient", v)?;
    }
    if let Some(v) = properties
        .get("time_zone_allowed")
        .or_else(|| properties.get("timezone_allowed"))
    {
        *time_zone_allowed = parse_flag("time_zone_allowed", v)?;
    }
    Ok(())
}

fn parse_flag(name: &str, value: &str) -> WeftResult<bool> {
    value
        .parse()
        .map_err(|_| WeftError::config(format!("invalid {} flag '{}'", name, value)))
}
