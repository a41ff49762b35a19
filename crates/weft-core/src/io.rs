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

//! Interfaces between the binding engine and the per-format record
//! tokenizers.
//!
//! A tokenizer turns raw input into [`RecordToken`]s and back. The engine is
//! agnostic to how tokens were produced; format crates implement
//! [`RecordReader`], [`RecordWriter`], and [`RecordParserFactory`].

use crate::error::WeftResult;
use std::io::{BufRead, Write};

/// A structured XML-like element, format-agnostic.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ElementNode {
    /// Element name.
    pub name: String,
    /// Attributes in document order.
    pub attributes: Vec<(String, String)>,
    /// Concatenated text content, if any.
    pub text: Option<String>,
    /// Child elements in document order.
    pub children: Vec<ElementNode>,
}

impl ElementNode {
    /// Create an element with no content.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Create an element holding text.
    pub fn with_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Append a child element.
    pub fn push(&mut self, child: ElementNode) {
        self.children.push(child);
    }

    /// The nth child with the given name.
    pub fn child_named(&self, name: &str, n: usize) -> Option<&ElementNode> {
        self.children.iter().filter(|c| c.name == name).nth(n)
    }

    /// How many children carry the given name.
    pub fn count_named(&self, name: &str) -> usize {
        self.children.iter().filter(|c| c.name == name).count()
    }

    /// The element's text, defaulting to empty.
    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}

/// One record as produced by a tokenizer.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordToken {
    /// Delimited record: fields in order.
    Fields(Vec<String>),
    /// Fixed-length record: the raw line.
    Line(String),
    /// XML record: one element subtree.
    Node(ElementNode),
}

impl RecordToken {
    /// Number of fields for delimited tokens.
    pub fn field_count(&self) -> Option<usize> {
        match self {
            Self::Fields(fields) => Some(fields.len()),
            _ => None,
        }
    }
}

/// Pulls record tokens from an input stream.
pub trait RecordReader {
    /// The next record, or None at end of stream.
    fn read(&mut self) -> WeftResult<Option<RecordToken>>;

    /// Line number of the most recently returned record (1-based; 0 before
    /// the first read).
    fn line_number(&self) -> usize;

    /// Release any buffered state.
    fn close(&mut self) -> WeftResult<()> {
        Ok(())
    }
}

/// Consumes record tokens into an output stream.
pub trait RecordWriter {
    /// Write one record.
    fn write(&mut self, token: &RecordToken) -> WeftResult<()>;

    /// Flush buffered output.
    fn flush(&mut self) -> WeftResult<()>;

    /// Flush and release any buffered state.
    fn close(&mut self) -> WeftResult<()> {
        self.flush()
    }
}

/// Creates readers and writers for one wire format.
pub trait RecordParserFactory {
    /// Create a reader over buffered input.
    fn create_reader(&self, input: Box<dyn BufRead>) -> WeftResult<Box<dyn RecordReader>>;

    /// Create a writer over an output sink.
    fn create_writer(&self, output: Box<dyn Write>) -> WeftResult<Box<dyn RecordWriter>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== ElementNode tests ====================

    #[test]
    fn test_element_new() {
        let e = ElementNode::new("record");
        assert_eq!(e.name, "record");
        assert!(e.text.is_none());
        assert!(e.children.is_empty());
    }

    #[test]
    fn test_element_with_text() {
        let e = ElementNode::with_text("id", "42");
        assert_eq!(e.text_or_empty(), "42");
    }

    #[test]
    fn test_element_child_named() {
        let mut e = ElementNode::new("r");
        e.push(ElementNode::with_text("x", "1"));
        e.push(ElementNode::with_text("y", "2"));
        e.push(ElementNode::with_text("x", "3"));

        assert_eq!(e.child_named("x", 0).unwrap().text_or_empty(), "1");
        assert_eq!(e.child_named("x", 1).unwrap().text_or_empty(), "3");
        assert!(e.child_named("x", 2).is_none());
        assert_eq!(e.count_named("x"), 2);
        assert_eq!(e.count_named("z"), 0);
    }

    // ==================== RecordToken tests ====================

    #[test]
    fn test_token_field_count() {
        let t = RecordToken::Fields(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(t.field_count(), Some(2));
        assert_eq!(RecordToken::Line("ab".to_string()).field_count(), None);
    }
}
