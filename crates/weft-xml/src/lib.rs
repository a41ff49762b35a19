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

//! XML record tokenization for the weft binding engine.
//!
//! Each child element of the document root is one record, yielded as a
//! [`RecordToken::Node`] subtree. Writing wraps records back under a
//! configurable root element.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io::{BufRead, Write};
use weft_core::io::{ElementNode, RecordParserFactory, RecordReader, RecordToken, RecordWriter};
use weft_core::{WeftError, WeftResult};

/// Guard against unbounded element nesting.
const MAX_DEPTH: usize = 100;

/// Options for XML tokenization.
#[derive(Debug, Clone)]
pub struct XmlOptions {
    /// Document root element name.
    pub root_element: String,
    /// Pretty-print output with indentation.
    pub pretty: bool,
    /// Indent width when pretty-printing.
    pub indent: usize,
}

impl Default for XmlOptions {
    fn default() -> Self {
        Self {
            root_element: "stream".to_string(),
            pretty: true,
            indent: 2,
        }
    }
}

/// Factory producing XML readers and writers.
#[derive(Debug, Clone, Default)]
pub struct XmlParserFactory {
    options: XmlOptions,
}

impl XmlParserFactory {
    pub fn new(options: XmlOptions) -> Self {
        Self { options }
    }
}

impl RecordParserFactory for XmlParserFactory {
    fn create_reader(&self, input: Box<dyn BufRead>) -> WeftResult<Box<dyn RecordReader>> {
        let mut reader = quick_xml::Reader::from_reader(input);
        reader.trim_text(true);
        Ok(Box::new(XmlReader {
            reader,
            buf: Vec::new(),
            inside_root: false,
            records: 0,
        }))
    }

    fn create_writer(&self, output: Box<dyn Write>) -> WeftResult<Box<dyn RecordWriter>> {
        let writer = if self.options.pretty {
            quick_xml::Writer::new_with_indent(output, b' ', self.options.indent)
        } else {
            quick_xml::Writer::new(output)
        };
        Ok(Box::new(XmlWriter {
            writer,
            root: self.options.root_element.clone(),
            started: false,
            closed: false,
        }))
    }
}

struct XmlReader {
    reader: quick_xml::Reader<Box<dyn BufRead>>,
    buf: Vec<u8>,
    inside_root: bool,
    records: usize,
}

/// One parse event with all buffer borrows detached.
enum Step {
    Start(BytesStart<'static>),
    EmptyElement(BytesStart<'static>),
    Text(String),
    End,
    Eof,
    Other,
}

impl XmlReader {
    fn next_step(&mut self) -> WeftResult<Step> {
        self.buf.clear();
        let event = match self.reader.read_event_into(&mut self.buf) {
            Ok(event) => event,
            Err(e) => {
                return Err(WeftError::io(format!(
                    "XML parse error at position {}: {}",
                    self.reader.buffer_position(),
                    e
                )));
            }
        };
        Ok(match event {
            Event::Start(e) => Step::Start(e.to_owned()),
            Event::Empty(e) => Step::EmptyElement(e.to_owned()),
            Event::Text(t) => match t.unescape() {
                Ok(text) => Step::Text(text.into_owned()),
                Err(e) => {
                    return Err(WeftError::io(format!("invalid XML text: {}", e)));
                }
            },
            Event::End(_) => Step::End,
            Event::Eof => Step::Eof,
            _ => Step::Other,
        })
    }

    /// Read one element subtree, the start tag having been consumed.
    fn read_element(&mut self, start: &BytesStart<'_>, depth: usize) -> WeftResult<ElementNode> {
        if depth > MAX_DEPTH {
            return Err(WeftError::io("XML nesting too deep".to_string()));
        }
        let mut element = element_from_start(start)?;
        loop {
            match self.next_step()? {
                Step::Start(child_start) => {
                    let child = self.read_element(&child_start, depth + 1)?;
                    element.push(child);
                }
                Step::EmptyElement(child_start) => {
                    element.push(element_from_start(&child_start)?);
                }
                Step::Text(text) => match &mut element.text {
                    Some(existing) => existing.push_str(&text),
                    slot => *slot = Some(text),
                },
                Step::End => return Ok(element),
                Step::Eof => {
                    return Err(WeftError::io(format!(
                        "unexpected end of XML inside element '{}'",
                        element.name
                    )));
                }
                Step::Other => {}
            }
        }
    }
}

impl RecordReader for XmlReader {
    fn read(&mut self) -> WeftResult<Option<RecordToken>> {
        loop {
            match self.next_step()? {
                Step::Start(start) => {
                    if !self.inside_root {
                        self.inside_root = true;
                        continue;
                    }
                    let element = self.read_element(&start, 1)?;
                    self.records += 1;
                    return Ok(Some(RecordToken::Node(element)));
                }
                Step::EmptyElement(start) => {
                    if !self.inside_root {
                        // An empty document root holds no records.
                        return Ok(None);
                    }
                    let element = element_from_start(&start)?;
                    self.records += 1;
                    return Ok(Some(RecordToken::Node(element)));
                }
                Step::End | Step::Eof => return Ok(None),
                Step::Text(_) | Step::Other => {}
            }
        }
    }

    fn line_number(&self) -> usize {
        self.records
    }
}

fn element_from_start(start: &BytesStart<'_>) -> WeftResult<ElementNode> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut element = ElementNode::new(name);
    for attr in start.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| WeftError::io(format!("invalid XML attribute: {}", e)))?
            .into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

struct XmlWriter {
    writer: quick_xml::Writer<Box<dyn Write>>,
    root: String,
    started: bool,
    closed: bool,
}

impl XmlWriter {
    fn io(e: quick_xml::Error) -> WeftError {
        WeftError::io(format!("XML write failed: {}", e))
    }

    fn ensure_started(&mut self) -> WeftResult<()> {
        if self.started {
            return Ok(());
        }
        self.writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(Self::io)?;
        self.writer
            .write_event(Event::Start(BytesStart::new(self.root.as_str())))
            .map_err(Self::io)?;
        self.started = true;
        Ok(())
    }

    fn write_element(&mut self, element: &ElementNode) -> WeftResult<()> {
        let mut start = BytesStart::new(element.name.as_str());
        for (key, value) in &element.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }
        if element.text.is_none() && element.children.is_empty() {
            return self
                .writer
                .write_event(Event::Empty(start))
                .map_err(Self::io);
        }
        self.writer
            .write_event(Event::Start(start))
            .map_err(Self::io)?;
        if let Some(text) = &element.text {
            self.writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(Self::io)?;
        }
        for child in &element.children {
            self.write_element(child)?;
        }
        self.writer
            .write_event(Event::End(BytesEnd::new(element.name.as_str())))
            .map_err(Self::io)
    }
}

impl RecordWriter for XmlWriter {
    fn write(&mut self, token: &RecordToken) -> WeftResult<()> {
        let RecordToken::Node(element) = token else {
            return Err(WeftError::writer(
                "XML writer expects element-structured records",
            ));
        };
        self.ensure_started()?;
        self.write_element(element)
    }

    fn flush(&mut self) -> WeftResult<()> {
        self.writer
            .get_mut()
            .flush()
            .map_err(|e| WeftError::io(format!("XML flush failed: {}", e)))
    }

    fn close(&mut self) -> WeftResult<()> {
        if self.started && !self.closed {
            self.writer
                .write_event(Event::End(BytesEnd::new(self.root.as_str())))
                .map_err(Self::io)?;
            self.closed = true;
        }
        self.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader_for(text: &'static str) -> Box<dyn RecordReader> {
        XmlParserFactory::default()
            .create_reader(Box::new(text.as_bytes()))
            .unwrap()
    }

    // ==================== Reading ====================

    #[test]
    fn test_read_records() {
        let mut reader = reader_for(
            "<stream><order><id>1</id></order><order><id>2</id></order></stream>",
        );
        let RecordToken::Node(first) = reader.read().unwrap().unwrap() else {
            panic!("expected node token");
        };
        assert_eq!(first.name, "order");
        assert_eq!(first.child_named("id", 0).unwrap().text_or_empty(), "1");

        let RecordToken::Node(second) = reader.read().unwrap().unwrap() else {
            panic!("expected node token");
        };
        assert_eq!(second.child_named("id", 0).unwrap().text_or_empty(), "2");
        assert_eq!(reader.read().unwrap(), None);
    }

    #[test]
    fn test_read_nested_elements() {
        let mut reader = reader_for(
            "<stream><person><name>Ada</name><address><city>Oslo</city></address></person></stream>",
        );
        let RecordToken::Node(person) = reader.read().unwrap().unwrap() else {
            panic!("expected node token");
        };
        let address = person.child_named("address", 0).unwrap();
        assert_eq!(
            address.child_named("city", 0).unwrap().text_or_empty(),
            "Oslo"
        );
    }

    #[test]
    fn test_read_attributes() {
        let mut reader = reader_for("<stream><order id=\"4\"/></stream>");
        let RecordToken::Node(order) = reader.read().unwrap().unwrap() else {
            panic!("expected node token");
        };
        assert_eq!(
            order.attributes,
            vec![("id".to_string(), "4".to_string())]
        );
    }

    #[test]
    fn test_read_empty_document() {
        let mut reader = reader_for("<stream/>");
        assert_eq!(reader.read().unwrap(), None);
    }

    #[test]
    fn test_read_unescapes_text() {
        let mut reader = reader_for("<stream><r><v>a &amp; b</v></r></stream>");
        let RecordToken::Node(r) = reader.read().unwrap().unwrap() else {
            panic!("expected node token");
        };
        assert_eq!(r.child_named("v", 0).unwrap().text_or_empty(), "a & b");
    }

    #[test]
    fn test_record_count_as_line_number() {
        let mut reader = reader_for("<stream><r/><r/></stream>");
        reader.read().unwrap();
        assert_eq!(reader.line_number(), 1);
        reader.read().unwrap();
        assert_eq!(reader.line_number(), 2);
    }

    // ==================== Writing ====================

    struct Tee(std::rc::Rc<std::cell::RefCell<Vec<u8>>>);

    impl Write for Tee {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn write_records(tokens: &[RecordToken]) -> String {
        let shared: std::rc::Rc<std::cell::RefCell<Vec<u8>>> = Default::default();
        let factory = XmlParserFactory::new(XmlOptions {
            pretty: false,
            ..XmlOptions::default()
        });
        let mut writer = factory
            .create_writer(Box::new(Tee(shared.clone())))
            .unwrap();
        for token in tokens {
            writer.write(token).unwrap();
        }
        writer.close().unwrap();
        let bytes = shared.borrow().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_write_wraps_in_root() {
        let mut order = ElementNode::new("order");
        order.push(ElementNode::with_text("id", "1"));
        let out = write_records(&[RecordToken::Node(order)]);
        assert_eq!(
            out,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <stream><order><id>1</id></order></stream>"
        );
    }

    #[test]
    fn test_write_empty_element() {
        let out = write_records(&[RecordToken::Node(ElementNode::new("ping"))]);
        assert!(out.contains("<ping/>"));
    }

    #[test]
    fn test_write_escapes_text() {
        let mut r = ElementNode::new("r");
        r.push(ElementNode::with_text("v", "a & b"));
        let out = write_records(&[RecordToken::Node(r)]);
        assert!(out.contains("a &amp; b"));
    }

    #[test]
    fn test_write_rejects_field_tokens() {
        let factory = XmlParserFactory::default();
        let mut writer = factory.create_writer(Box::new(Vec::new())).unwrap();
        let err = writer
            .write(&RecordToken::Fields(vec!["x".to_string()]))
            .unwrap_err();
        assert!(err.message.contains("element-structured"));
    }

    // ==================== Round trip ====================

    #[test]
    fn test_roundtrip() {
        let mut person = ElementNode::new("person");
        person.push(ElementNode::with_text("name", "Ada"));
        let mut address = ElementNode::new("address");
        address.push(ElementNode::with_text("city", "Oslo"));
        person.push(address);

        let out = write_records(&[RecordToken::Node(person.clone())]);
        let mut reader = XmlParserFactory::default()
            .create_reader(Box::new(std::io::Cursor::new(out.into_bytes())))
            .unwrap();
        let token = reader.read().unwrap().unwrap();
        assert_eq!(token, RecordToken::Node(person));
    }
}
