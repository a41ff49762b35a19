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

//! # weft
//!
//! Bidirectional mapping between flat textual records (delimited,
//! fixed-length, XML) and in-memory structured values.
//!
//! A declarative stream configuration describes the layout of records within
//! a stream and the binding of fields onto registered classes. From it the
//! engine compiles an immutable [`Stream`] with two dual capabilities: a
//! [`StreamReader`] that unmarshals text into aggregates, and a
//! [`StreamWriter`] that marshals aggregates back into text.
//!
//! ## Quick start
//!
//! ```no_run
//! use weft::{
//!     ClassDef, FieldConfig, RecordConfig, StreamBuilder, StreamFormat, TypeRef, Value,
//! };
//!
//! fn main() -> weft::WeftResult<()> {
//!     let stream = StreamBuilder::new("orders", StreamFormat::Delimited)
//!         .class(
//!             ClassDef::new("Order")
//!                 .property("id", TypeRef::Int)
//!                 .property("item", TypeRef::String),
//!         )
//!         .record(
//!             RecordConfig::new("order")
//!                 .bound_to("Order")
//!                 .child(FieldConfig::new("id").typed("int"))
//!                 .child(FieldConfig::new("item")),
//!         )
//!         .build()?;
//!
//!     let input = "1,socks\n2,shoes\n";
//!     let mut reader = weft::create_reader(stream, Box::new(input.as_bytes()))?;
//!     while let Some(order) = reader.read()? {
//!         let bean = order.as_bean().unwrap();
//!         println!("{:?}", bean.get("item"));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Crates
//!
//! - `weft-core`: compiler, parser/property trees, type handlers, drivers
//! - `weft-delimited`: delimited tokenizer (csv-backed)
//! - `weft-fixed`: fixed-length tokenizer
//! - `weft-xml`: XML tokenizer (quick-xml-backed)

mod builder;

pub use builder::StreamBuilder;

pub use weft_core::{
    accessor, config, factory, io, schema, types, Access, Aggregation, Bean, BeanConfig,
    ClassDef, ClassRegistry, ComponentConfig, ConstructorDef, DateTimeValue, ElementNode,
    ErrorHandler, FieldConfig, GroupConfig, GroupOrder, Justify, Occurs, Param, PropertyDef,
    RecordConfig, RecordParserFactory, RecordReader, RecordToken, RecordWriter, SegmentConfig,
    Stream, StreamConfig, StreamFormat, StreamMode, StreamReader, StreamWriter, TypeHandler,
    TypeHandlerRegistry, TypeRef, UnidentifiedPolicy, Value, WeftError, WeftErrorKind,
    WeftResult,
};

pub use weft_delimited::{DelimitedOptions, DelimitedParserFactory};
pub use weft_fixed::{FixedLengthOptions, FixedLengthParserFactory};
pub use weft_xml::{XmlOptions, XmlParserFactory};

use std::io::{BufRead, Write};
use std::sync::Arc;

/// The default tokenizer factory for a stream's format.
pub fn default_factory(format: StreamFormat) -> Box<dyn RecordParserFactory> {
    match format {
        StreamFormat::Delimited | StreamFormat::Csv => {
            Box::new(DelimitedParserFactory::default())
        }
        StreamFormat::FixedLength => Box::new(FixedLengthParserFactory::default()),
        StreamFormat::Xml => Box::new(XmlParserFactory::default()),
    }
}

/// Open a reader over buffered input using the stream's default tokenizer.
pub fn create_reader(
    stream: Arc<Stream>,
    input: Box<dyn BufRead>,
) -> WeftResult<StreamReader> {
    let tokenizer = default_factory(stream.format()).create_reader(input)?;
    StreamReader::new(stream, tokenizer)
}

/// Open a writer over an output sink using the stream's default tokenizer.
pub fn create_writer(stream: Arc<Stream>, output: Box<dyn Write>) -> WeftResult<StreamWriter> {
    let tokenizer = default_factory(stream.format()).create_writer(output)?;
    StreamWriter::new(stream, tokenizer)
}
