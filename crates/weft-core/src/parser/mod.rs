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

//! The parser tree: the textual side of a compiled stream.
//!
//! Mirrors the property tree through an arena of [`ParserNode`]s referenced
//! by stable [`ParserId`] handles. Each node either binds one property or is
//! structural (groups, ignored fields, inline segments).

pub mod context;

use crate::config::{GroupOrder, Justify, Occurs};
use crate::property::PropertyId;
use crate::types::TypeHandler;
use regex::Regex;
use std::sync::Arc;

/// Stable handle to a parser node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParserId(pub(crate) usize);

impl ParserId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Where a field's text lives within a record token.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldDescriptor {
    /// 0-based field index for delimited records.
    Ordinal(usize),
    /// Character span for fixed-length records.
    Fixed {
        offset: usize,
        length: usize,
        pad: char,
        justify: Justify,
    },
    /// Child element name for XML records.
    Named(String),
}

impl FieldDescriptor {
    /// Width of one occurrence in cursor units (fields or characters).
    pub fn width(&self) -> usize {
        match self {
            Self::Ordinal(_) => 1,
            Self::Fixed { length, .. } => *length,
            Self::Named(_) => 1,
        }
    }
}

/// A scalar field parser.
#[derive(Debug, Clone)]
pub struct FieldParser {
    pub descriptor: FieldDescriptor,
    pub handler: Arc<dyn TypeHandler>,
    pub required: bool,
    pub trim: bool,
    pub default_value: Option<String>,
    pub literal: Option<String>,
    pub regex: Option<Regex>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub min_occurs: usize,
    pub max_occurs: Occurs,
    /// Participates in record identification.
    pub identifier: bool,
    /// Cursor units later siblings still require; bounds greedy repeats.
    pub tail_min: usize,
}

/// A segment parser: a bundle of child fields and segments.
#[derive(Debug, Clone)]
pub struct SegmentParser {
    pub min_occurs: usize,
    pub max_occurs: Occurs,
    /// Cursor units consumed by one occurrence.
    pub stride: usize,
    /// Cursor units later siblings still require; bounds greedy repeats.
    pub tail_min: usize,
}

/// A record parser.
#[derive(Debug, Clone)]
pub struct RecordParser {
    pub min_occurs: usize,
    pub max_occurs: Occurs,
    /// Identifier field nodes checked left-to-right during dispatch.
    pub identifiers: Vec<ParserId>,
}

/// A record group parser.
#[derive(Debug, Clone)]
pub struct GroupParser {
    pub min_occurs: usize,
    pub max_occurs: Occurs,
    pub order: GroupOrder,
}

/// Variant payload of a parser node.
#[derive(Debug, Clone)]
pub enum ParserKind {
    Field(FieldParser),
    Segment(SegmentParser),
    Record(RecordParser),
    Group(GroupParser),
}

/// One node of the parser tree.
#[derive(Debug, Clone)]
pub struct ParserNode {
    /// Node name (field, segment, record, or group name).
    pub name: String,
    /// Variant payload.
    pub kind: ParserKind,
    /// Bound property, or None for structural nodes.
    pub property: Option<PropertyId>,
    /// Children in declared order.
    pub children: Vec<ParserId>,
}

impl ParserNode {
    pub fn new(name: impl Into<String>, kind: ParserKind) -> Self {
        Self {
            name: name.into(),
            kind,
            property: None,
            children: Vec::new(),
        }
    }

    pub fn as_field(&self) -> Option<&FieldParser> {
        match &self.kind {
            ParserKind::Field(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&RecordParser> {
        match &self.kind {
            ParserKind::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&GroupParser> {
        match &self.kind {
            ParserKind::Group(g) => Some(g),
            _ => None,
        }
    }

    /// The declared min occurrences of this node within its parent.
    pub fn min_occurs(&self) -> usize {
        match &self.kind {
            ParserKind::Field(f) => f.min_occurs,
            ParserKind::Segment(s) => s.min_occurs,
            ParserKind::Record(r) => r.min_occurs,
            ParserKind::Group(g) => g.min_occurs,
        }
    }

    /// The declared max occurrences of this node within its parent.
    pub fn max_occurs(&self) -> Occurs {
        match &self.kind {
            ParserKind::Field(f) => f.max_occurs,
            ParserKind::Segment(s) => s.max_occurs,
            ParserKind::Record(r) => r.max_occurs,
            ParserKind::Group(g) => g.max_occurs,
        }
    }
}

/// Arena owning every parser node of one compiled stream.
#[derive(Debug, Clone, Default)]
pub struct ParserArena {
    nodes: Vec<ParserNode>,
}

impl ParserArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, returning its handle.
    pub fn alloc(&mut self, node: ParserNode) -> ParserId {
        let id = ParserId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: ParserId) -> &ParserNode {
        &self.nodes[id.0]
    }

    pub fn get_mut(&mut self, id: ParserId) -> &mut ParserNode {
        &mut self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParserId, &ParserNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (ParserId(i), n))
    }
}
