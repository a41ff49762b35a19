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

//! Error types for stream compilation and record binding.

use std::fmt;
use thiserror::Error;

/// The kind of error that occurred during compilation or binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeftErrorKind {
    /// Invalid stream configuration. Raised during compile, never retried.
    Config,
    /// A field value failed type conversion.
    Conversion,
    /// No record definition matched the input record.
    Unidentified,
    /// Record occurrence constraints (min/max) violated.
    Occurrence,
    /// Invalid state for marshalling (e.g. missing identifier).
    Writer,
    /// The operation is not supported by this handler.
    Unsupported,
    /// I/O error from the underlying stream.
    Io,
}

impl fmt::Display for WeftErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config => write!(f, "ConfigError"),
            Self::Conversion => write!(f, "ConversionError"),
            Self::Unidentified => write!(f, "UnidentifiedRecordError"),
            Self::Occurrence => write!(f, "OccurrenceError"),
            Self::Writer => write!(f, "WriterError"),
            Self::Unsupported => write!(f, "UnsupportedError"),
            Self::Io => write!(f, "IOError"),
        }
    }
}

/// An error raised while compiling a stream layout or binding records.
#[derive(Debug, Clone, Error)]
#[error("{kind} at line {line}: {message}")]
pub struct WeftError {
    /// The kind of error.
    pub kind: WeftErrorKind,
    /// Human-readable error message.
    pub message: String,
    /// Line number in the input stream (0 when not line-bound).
    pub line: usize,
    /// Name of the record being processed, if known.
    pub record: Option<String>,
    /// Name of the field being processed, if known.
    pub field: Option<String>,
}

impl WeftError {
    /// Create a new error.
    pub fn new(kind: WeftErrorKind, message: impl Into<String>, line: usize) -> Self {
        Self {
            kind,
            message: message.into(),
            line,
            record: None,
            field: None,
        }
    }

    /// Attach the record name being processed.
    pub fn with_record(mut self, record: impl Into<String>) -> Self {
        self.record = Some(record.into());
        self
    }

    /// Attach the field name being processed.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Attach the input line number.
    pub fn with_line(mut self, line: usize) -> Self {
        self.line = line;
        self
    }

    // Convenience constructors for each error kind

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(WeftErrorKind::Config, message, 0)
    }

    pub fn conversion(message: impl Into<String>, line: usize) -> Self {
        Self::new(WeftErrorKind::Conversion, message, line)
    }

    pub fn unidentified(message: impl Into<String>, line: usize) -> Self {
        Self::new(WeftErrorKind::Unidentified, message, line)
    }

    pub fn occurrence(message: impl Into<String>, line: usize) -> Self {
        Self::new(WeftErrorKind::Occurrence, message, line)
    }

    pub fn writer(message: impl Into<String>) -> Self {
        Self::new(WeftErrorKind::Writer, message, 0)
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(WeftErrorKind::Unsupported, message, 0)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(WeftErrorKind::Io, message, 0)
    }
}

impl From<std::io::Error> for WeftError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string())
    }
}

/// Result type for weft operations.
pub type WeftResult<T> = Result<T, WeftError>;
