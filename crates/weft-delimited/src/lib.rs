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

//! Delimited record tokenization for the weft binding engine.
//!
//! Wraps the `csv` crate: one input record per [`RecordToken::Fields`]
//! token, with configurable delimiter, quoting, and comment handling.

use std::io::{BufRead, Write};
use weft_core::io::{RecordParserFactory, RecordReader, RecordToken, RecordWriter};
use weft_core::{WeftError, WeftResult};

/// Options for delimited tokenization.
#[derive(Debug, Clone)]
pub struct DelimitedOptions {
    /// Field delimiter (default `,`).
    pub delimiter: u8,
    /// Quote character (default `"`).
    pub quote: u8,
    /// Lines starting with this byte are skipped.
    pub comment: Option<u8>,
    /// Quote fields on output only when necessary.
    pub quote_minimal: bool,
}

impl Default for DelimitedOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            comment: None,
            quote_minimal: true,
        }
    }
}

/// Factory producing delimited readers and writers.
#[derive(Debug, Clone, Default)]
pub struct DelimitedParserFactory {
    options: DelimitedOptions,
}

impl DelimitedParserFactory {
    pub fn new(options: DelimitedOptions) -> Self {
        Self { options }
    }

    /// A factory with a custom delimiter and default quoting.
    pub fn with_delimiter(delimiter: u8) -> Self {
        Self {
            options: DelimitedOptions {
                delimiter,
                ..DelimitedOptions::default()
            },
        }
    }
}

impl RecordParserFactory for DelimitedParserFactory {
    fn create_reader(&self, input: Box<dyn BufRead>) -> WeftResult<Box<dyn RecordReader>> {
        let reader = csv::ReaderBuilder::new()
            .delimiter(self.options.delimiter)
            .quote(self.options.quote)
            .comment(self.options.comment)
            .has_headers(false)
            .flexible(true)
            .from_reader(input);
        Ok(Box::new(DelimitedReader { reader, line: 0 }))
    }

    fn create_writer(&self, output: Box<dyn Write>) -> WeftResult<Box<dyn RecordWriter>> {
        let quote_style = if self.options.quote_minimal {
            csv::QuoteStyle::Necessary
        } else {
            csv::QuoteStyle::Always
        };
        let writer = csv::WriterBuilder::new()
            .delimiter(self.options.delimiter)
            .quote(self.options.quote)
            .quote_style(quote_style)
            .flexible(true)
            .from_writer(output);
        Ok(Box::new(DelimitedWriter { writer }))
    }
}

struct DelimitedReader {
    reader: csv::Reader<Box<dyn BufRead>>,
    line: usize,
}

impl RecordReader for DelimitedReader {
    fn read(&mut self) -> WeftResult<Option<RecordToken>> {
        let mut record = csv::StringRecord::new();
        let more = self
            .reader
            .read_record(&mut record)
            .map_err(|e| WeftError::io(format!("delimited read failed: {}", e)))?;
        if !more {
            return Ok(None);
        }
        self.line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(self.line + 1);
        let fields: Vec<String> = record.iter().map(str::to_string).collect();
        Ok(Some(RecordToken::Fields(fields)))
    }

    fn line_number(&self) -> usize {
        self.line
    }
}

struct DelimitedWriter {
    writer: csv::Writer<Box<dyn Write>>,
}

impl RecordWriter for DelimitedWriter {
    fn write(&mut self, token: &RecordToken) -> WeftResult<()> {
        let RecordToken::Fields(fields) = token else {
            return Err(WeftError::writer(
                "delimited writer expects field-structured records",
            ));
        };
        self.writer
            .write_record(fields)
            .map_err(|e| WeftError::io(format!("delimited write failed: {}", e)))
    }

    fn flush(&mut self) -> WeftResult<()> {
        self.writer
            .flush()
            .map_err(|e| WeftError::io(format!("delimited flush failed: {}", e)))
    }
}
