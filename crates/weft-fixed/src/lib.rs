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

//! Fixed-length record tokenization for the weft binding engine.
//!
//! One line per [`RecordToken::Line`] token. Fields are addressed by
//! character offset and width inside the engine; this crate only handles
//! line framing, comment skipping, and terminator normalization.

use std::io::{BufRead, Write};
use weft_core::io::{RecordParserFactory, RecordReader, RecordToken, RecordWriter};
use weft_core::{WeftError, WeftResult};

/// Options for fixed-length tokenization.
#[derive(Debug, Clone)]
pub struct FixedLengthOptions {
    /// Lines starting with this prefix are skipped.
    pub comment_prefix: Option<String>,
    /// Skip lines that are entirely empty.
    pub skip_blank_lines: bool,
    /// Line terminator emitted on write.
    pub terminator: String,
}

impl Default for FixedLengthOptions {
    fn default() -> Self {
        Self {
            comment_prefix: None,
            skip_blank_lines: true,
            terminator: "\n".to_string(),
        }
    }
}

/// Factory producing fixed-length readers and writers.
#[derive(Debug, Clone, Default)]
pub struct FixedLengthParserFactory {
    options: FixedLengthOptions,
}

impl FixedLengthParserFactory {
    pub fn new(options: FixedLengthOptions) -> Self {
        Self { options }
    }
}

impl RecordParserFactory for FixedLengthParserFactory {
    fn create_reader(&self, input: Box<dyn BufRead>) -> WeftResult<Box<dyn RecordReader>> {
        Ok(Box::new(FixedLengthReader {
            input,
            options: self.options.clone(),
            line: 0,
            current: 0,
        }))
    }

    fn create_writer(&self, output: Box<dyn Write>) -> WeftResult<Box<dyn RecordWriter>> {
        Ok(Box::new(FixedLengthWriter {
            output,
            terminator: self.options.terminator.clone(),
        }))
    }
}

struct FixedLengthReader {
    input: Box<dyn BufRead>,
    options: FixedLengthOptions,
    /// Physical line counter.
    line: usize,
    /// Line number of the most recently returned record.
    current: usize,
}

impl RecordReader for FixedLengthReader {
    fn read(&mut self) -> WeftResult<Option<RecordToken>> {
        loop {
            let mut buf = String::new();
            let n = self
                .input
                .read_line(&mut buf)
                .map_err(|e| WeftError::io(format!("fixed-length read failed: {}", e)))?;
            if n == 0 {
                return Ok(None);
            }
            self.line += 1;

            let line = buf.trim_end_matches(['\r', '\n']);
            if self.options.skip_blank_lines && line.is_empty() {
                continue;
            }
            if let Some(prefix) = &self.options.comment_prefix {
                if line.starts_with(prefix.as_str()) {
                    continue;
                }
            }
            self.current = self.line;
            return Ok(Some(RecordToken::Line(line.to_string())));
        }
    }

    fn line_number(&self) -> usize {
        self.current
    }
}

struct FixedLengthWriter {
    output: Box<dyn Write>,
    terminator: String,
}

impl RecordWriter for FixedLengthWriter {
    fn write(&mut self, token: &RecordToken) -> WeftResult<()> {
        let RecordToken::Line(line) = token else {
            return Err(WeftError::writer(
                "fixed-length writer expects line-structured records",
            ));
        };
        self.output
            .write_all(line.as_bytes())
            .and_then(|_| self.output.write_all(self.terminator.as_bytes()))
            .map_err(|e| WeftError::io(format!("fixed-length write failed: {}", e)))
    }

    fn flush(&mut self) -> WeftResult<()> {
        self.output
            .flush()
            .map_err(|e| WeftError::io(format!("fixed-length flush failed: {}", e)))
    }
}
