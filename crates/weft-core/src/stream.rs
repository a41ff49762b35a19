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

//! The compiled stream: an immutable pair of parser and property trees.

use crate::compile;
use crate::config::{StreamConfig, StreamFormat, StreamMode, UnidentifiedPolicy};
use crate::error::WeftResult;
use crate::parser::context::UnmarshallingContext;
use crate::parser::{ParserArena, ParserId, ParserKind};
use crate::property::{PropertyArena, PropertyKind};
use crate::schema::ClassRegistry;
use crate::types::TypeHandlerRegistry;
use std::collections::HashMap;
use std::sync::Arc;

/// A compiled, immutable stream layout.
///
/// Compilation is single-threaded; the result is freely shareable across
/// threads. Readers and writers borrow the stream and keep their own
/// transient state.
#[derive(Debug)]
pub struct Stream {
    pub(crate) name: String,
    pub(crate) format: StreamFormat,
    pub(crate) mode: StreamMode,
    pub(crate) on_unidentified: UnidentifiedPolicy,
    pub(crate) parsers: ParserArena,
    pub(crate) properties: PropertyArena,
    pub(crate) root: ParserId,
    pub(crate) records: HashMap<String, ParserId>,
    pub(crate) classes: Arc<ClassRegistry>,
}

impl Stream {
    /// Compile a stream configuration against registered classes and type
    /// handlers.
    pub fn compile(
        config: StreamConfig,
        classes: Arc<ClassRegistry>,
        handlers: &TypeHandlerRegistry,
    ) -> WeftResult<Self> {
        compile::compile(config, classes, handlers)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn format(&self) -> StreamFormat {
        self.format
    }

    pub fn mode(&self) -> StreamMode {
        self.mode
    }

    pub fn on_unidentified(&self) -> UnidentifiedPolicy {
        self.on_unidentified
    }

    pub(crate) fn root(&self) -> ParserId {
        self.root
    }

    /// The record parser with the given name.
    pub fn record(&self, name: &str) -> Option<ParserId> {
        self.records.get(name).copied()
    }

    /// Declared record names, in no particular order.
    pub fn record_names(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    /// A fresh unmarshalling context sized for this stream.
    pub fn new_context(&self) -> UnmarshallingContext {
        UnmarshallingContext::new(self.properties.len())
    }

    /// A deterministic structural outline of both trees.
    ///
    /// Two compilations of the same configuration produce identical
    /// outlines.
    pub fn structure(&self) -> String {
        let mut out = String::new();
        self.describe_parser(self.root, 0, &mut out);
        out
    }

    fn describe_parser(&self, id: ParserId, depth: usize, out: &mut String) {
        let node = self.parsers.get(id);
        let indent = "  ".repeat(depth);
        let kind = match &node.kind {
            ParserKind::Field(_) => "field",
            ParserKind::Segment(_) => "segment",
            ParserKind::Record(_) => "record",
            ParserKind::Group(_) => "group",
        };
        out.push_str(&format!("{}{} {}", indent, kind, node.name));
        if let Some(pid) = node.property {
            let prop = self.properties.get(pid);
            let prop_kind = match &prop.kind {
                PropertyKind::Simple { ty } => format!("simple:{}", ty),
                PropertyKind::Complex { class, .. } => format!("complex:{}", class),
                PropertyKind::Collection => "collection".to_string(),
                PropertyKind::Map { .. } => "map".to_string(),
            };
            out.push_str(&format!(" -> {}", prop_kind));
            if prop.identifier {
                out.push_str(" [id]");
            }
        }
        out.push('\n');
        for child in node.children.clone() {
            self.describe_parser(child, depth + 1, out);
        }
    }
}
