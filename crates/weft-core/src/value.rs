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

//! Dynamic values produced and consumed by the binding engine.

use chrono::{FixedOffset, NaiveDateTime};
use std::collections::BTreeMap;

/// A date/time carrier: a local timestamp plus the offset it was read with.
///
/// The offset is kept separately so that a value parsed without a zone stays
/// distinguishable from one parsed at UTC.
#[derive(Debug, Clone, PartialEq)]
pub struct DateTimeValue {
    /// The local date and time.
    pub timestamp: NaiveDateTime,
    /// UTC offset, if one was present in the input.
    pub offset: Option<FixedOffset>,
}

impl DateTimeValue {
    /// Create a value with no zone information.
    pub fn local(timestamp: NaiveDateTime) -> Self {
        Self {
            timestamp,
            offset: None,
        }
    }

    /// Create a value carrying a UTC offset.
    pub fn with_offset(timestamp: NaiveDateTime, offset: FixedOffset) -> Self {
        Self {
            timestamp,
            offset: Some(offset),
        }
    }

    /// Total offset from UTC in seconds (0 when no zone was present).
    pub fn offset_seconds(&self) -> i32 {
        self.offset.map(|o| o.local_minus_utc()).unwrap_or(0)
    }
}

/// A dynamic aggregate: a registered class name plus named member values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Bean {
    /// The registered class this bean was instantiated from.
    pub class: String,
    /// Member values keyed by declared member name.
    pub members: BTreeMap<String, Value>,
}

impl Bean {
    /// Create an empty bean of the given class.
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            members: BTreeMap::new(),
        }
    }

    /// Get a member value by name.
    pub fn get(&self, member: &str) -> Option<&Value> {
        self.members.get(member)
    }

    /// Set a member value.
    pub fn set(&mut self, member: impl Into<String>, value: Value) {
        self.members.insert(member.into(), value);
    }

    /// Create a bean with the given members.
    pub fn with_members(class: impl Into<String>, members: BTreeMap<String, Value>) -> Self {
        Self {
            class: class.into(),
            members,
        }
    }
}

/// A dynamic property value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent or null value.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating-point value.
    Float(f64),
    /// String value.
    String(String),
    /// Date/time value.
    DateTime(DateTimeValue),
    /// Ordered sequence of values.
    List(Vec<Value>),
    /// Keyed mapping of values.
    Map(BTreeMap<String, Value>),
    /// Aggregate with named members.
    Bean(Bean),
}

impl Value {
    /// Returns true if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Try to get the value as a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get the value as an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Try to get the value as a float. Integers widen.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(n) => Some(*n),
            Self::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Try to get the value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get the value as a date/time.
    pub fn as_datetime(&self) -> Option<&DateTimeValue> {
        match self {
            Self::DateTime(d) => Some(d),
            _ => None,
        }
    }

    /// Try to get the value as a list.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Try to get the value as a map.
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Try to get the value as a bean.
    pub fn as_bean(&self) -> Option<&Bean> {
        match self {
            Self::Bean(b) => Some(b),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, ""),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(n) => write!(f, "{}", n),
            Self::Float(n) => write!(f, "{}", n),
            Self::String(s) => write!(f, "{}", s),
            Self::DateTime(d) => match d.offset {
                Some(o) => write!(f, "{}{}", d.timestamp, o),
                None => write!(f, "{}", d.timestamp),
            },
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Self::Map(_) => write!(f, "[map]"),
            Self::Bean(b) => write!(f, "[{}]", b.class),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}
