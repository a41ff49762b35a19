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

//! Core binding engine for weft: bidirectional mapping between flat
//! textual records and in-memory aggregates.
//!
//! A declarative [`config::StreamConfig`] describes the layout of records
//! within a stream and the binding of fields onto registered classes. The
//! two-pass compiler lowers it into an immutable [`Stream`] holding a parser
//! tree and a property tree; [`StreamReader`] drives the trees over
//! tokenized input and [`StreamWriter`] reverses the traversal for output.
//!
//! Record tokenization is pluggable through the [`io`] interfaces; the
//! `weft-delimited`, `weft-fixed`, and `weft-xml` crates supply the built-in
//! wire formats.

pub mod accessor;
mod compile;
pub mod config;
mod error;
pub mod factory;
pub mod io;
mod marshal;
pub mod parser;
pub mod property;
mod reader;
pub mod schema;
mod stream;
pub mod types;
mod unmarshal;
mod value;
mod writer;

pub use config::{
    Aggregation, BeanConfig, ComponentConfig, FieldConfig, GroupConfig, GroupOrder, Justify,
    Occurs, RecordConfig, SegmentConfig, StreamConfig, StreamFormat, StreamMode,
    UnidentifiedPolicy,
};
pub use error::{WeftError, WeftErrorKind, WeftResult};
pub use io::{ElementNode, RecordParserFactory, RecordReader, RecordToken, RecordWriter};
pub use reader::{ErrorHandler, StreamReader};
pub use schema::{Access, ClassDef, ClassRegistry, ConstructorDef, Param, PropertyDef, TypeRef};
pub use stream::Stream;
pub use types::{TypeHandler, TypeHandlerRegistry};
pub use value::{Bean, DateTimeValue, Value};
pub use writer::StreamWriter;
