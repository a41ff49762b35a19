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

//! The stream reader: drives the compiled parser tree over a record reader.

use crate::config::UnidentifiedPolicy;
use crate::error::{WeftError, WeftResult};
use crate::io::RecordReader;
use crate::parser::context::UnmarshallingContext;
use crate::stream::Stream;
use crate::value::Value;
use std::sync::Arc;
use tracing::warn;

/// Callback invoked with every reported record-level error.
pub type ErrorHandler = Box<dyn FnMut(&WeftError) + Send>;

/// Unmarshals aggregates from a record stream.
///
/// Single-threaded per instance. With an error handler installed the reader
/// reports conversion and skipped-record errors and continues with the next
/// record; without one the first error is returned to the caller.
pub struct StreamReader {
    stream: Arc<Stream>,
    input: Box<dyn RecordReader>,
    ctx: UnmarshallingContext,
    record_name: Option<String>,
    error_handler: Option<ErrorHandler>,
}

impl std::fmt::Debug for StreamReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamReader")
            .field("stream", &self.stream)
            .field("record_name", &self.record_name)
            .field("has_error_handler", &self.error_handler.is_some())
            .finish()
    }
}

impl StreamReader {
    /// Create a reader over tokenized input.
    pub fn new(stream: Arc<Stream>, input: Box<dyn RecordReader>) -> WeftResult<Self> {
        if !stream.mode().readable() {
            return Err(WeftError::config(format!(
                "stream '{}' is not compiled for reading",
                stream.name()
            )));
        }
        let ctx = stream.new_context();
        Ok(Self {
            stream,
            input,
            ctx,
            record_name: None,
            error_handler: None,
        })
    }

    /// Install an error handler.
    pub fn with_error_handler(mut self, handler: ErrorHandler) -> Self {
        self.error_handler = Some(handler);
        self
    }

    /// Read the next aggregate, or None at end of stream.
    pub fn read(&mut self) -> WeftResult<Option<Value>> {
        loop {
            let Some(token) = self.input.read()? else {
                self.record_name = None;
                self.stream.validate_end(&self.ctx)?;
                return Ok(None);
            };
            let line = self.input.line_number();
            self.ctx.begin_record(line);

            let matched = match self.stream.match_record(&token, &mut self.ctx) {
                Ok(m) => m,
                Err(error) => {
                    self.report(&error);
                    return Err(error);
                }
            };

            let Some(record_id) = matched else {
                let error = WeftError::unidentified(
                    format!("no record definition matched line {}", line),
                    line,
                );
                self.report(&error);
                match self.stream.on_unidentified() {
                    UnidentifiedPolicy::Skip => {
                        warn!(stream = %self.stream.name(), line, "skipping unidentified record");
                        continue;
                    }
                    UnidentifiedPolicy::Fail => return Err(error),
                }
            };

            self.record_name = Some(self.stream.parsers.get(record_id).name.clone());
            match self
                .stream
                .unmarshal_record(record_id, &token, &mut self.ctx)
            {
                Ok(value) => return Ok(Some(value)),
                Err(error) => {
                    self.report(&error);
                    if self.error_handler.is_some() {
                        continue;
                    }
                    return Err(error);
                }
            }
        }
    }

    fn report(&mut self, error: &WeftError) {
        if let Some(handler) = &mut self.error_handler {
            handler(error);
        }
    }

    /// Name of the most recently read record definition.
    pub fn record_name(&self) -> Option<&str> {
        self.record_name.as_deref()
    }

    /// Line number of the most recently read record.
    pub fn line_number(&self) -> usize {
        self.input.line_number()
    }

    /// Release the underlying reader.
    pub fn close(&mut self) -> WeftResult<()> {
        self.input.close()
    }
}
