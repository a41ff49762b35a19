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

//! The stream writer: marshals aggregates back into record tokens.

use crate::error::{WeftError, WeftResult};
use crate::io::RecordWriter;
use crate::stream::Stream;
use crate::value::Value;
use std::sync::Arc;

/// Marshals aggregates into a record stream. Single-threaded per instance.
pub struct StreamWriter {
    stream: Arc<Stream>,
    output: Box<dyn RecordWriter>,
}

impl StreamWriter {
    /// Create a writer over a record sink.
    pub fn new(stream: Arc<Stream>, output: Box<dyn RecordWriter>) -> WeftResult<Self> {
        if !stream.mode().writable() {
            return Err(WeftError::config(format!(
                "stream '{}' is not compiled for writing",
                stream.name()
            )));
        }
        Ok(Self { stream, output })
    }

    /// Marshal a value through the record definition matching it.
    pub fn write(&mut self, value: &Value) -> WeftResult<()> {
        let record = self.stream.select_record(None, value)?;
        let token = self.stream.marshal_record(record, value)?;
        self.output.write(&token)
    }

    /// Marshal a value through a named record definition.
    pub fn write_named(&mut self, record_name: &str, value: &Value) -> WeftResult<()> {
        let record = self.stream.select_record(Some(record_name), value)?;
        let token = self.stream.marshal_record(record, value)?;
        self.output.write(&token)
    }

    /// Flush buffered output.
    pub fn flush(&mut self) -> WeftResult<()> {
        self.output.flush()
    }

    /// Flush and release the underlying writer.
    pub fn close(&mut self) -> WeftResult<()> {
        self.output.close()
    }
}
