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

//! Per-read and per-write transient state.
//!
//! The compiled trees are immutable; everything that changes while driving
//! them lives here, keyed by node handle.

use super::ParserId;
use crate::config::Justify;
use crate::error::WeftError;
use crate::io::{ElementNode, RecordToken};
use crate::property::PropertyId;
use crate::value::Value;
use std::collections::HashMap;

/// Occurrence position of a sequential group.
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupPosition {
    /// Index of the current child in declared order.
    pub child: usize,
    /// Completed iterations of the group itself.
    pub iterations: usize,
}

/// Mutable state for one reader.
#[derive(Debug, Default)]
pub struct UnmarshallingContext {
    /// Property value slots, indexed by property handle.
    slots: Vec<Option<Value>>,
    /// Occurrence counters per record/group node.
    counts: HashMap<ParserId, usize>,
    /// Sequential-group cursors.
    positions: HashMap<ParserId, GroupPosition>,
    /// Field conversion errors collected for the current record.
    pub errors: Vec<WeftError>,
    /// Line number of the record being processed.
    pub line: usize,
}

impl UnmarshallingContext {
    pub fn new(property_count: usize) -> Self {
        Self {
            slots: vec![None; property_count],
            counts: HashMap::new(),
            positions: HashMap::new(),
            errors: Vec::new(),
            line: 0,
        }
    }

    /// Clear per-record state, keeping group counters.
    pub fn begin_record(&mut self, line: usize) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.errors.clear();
        self.line = line;
    }

    pub fn set_slot(&mut self, id: PropertyId, value: Value) {
        self.slots[id.index()] = Some(value);
    }

    pub fn take_slot(&mut self, id: PropertyId) -> Option<Value> {
        self.slots[id.index()].take()
    }

    pub fn peek_slot(&self, id: PropertyId) -> Option<&Value> {
        self.slots[id.index()].as_ref()
    }

    /// Append to a sequence slot, creating it on first use.
    pub fn push_slot(&mut self, id: PropertyId, value: Value) {
        match &mut self.slots[id.index()] {
            Some(Value::List(items)) => items.push(value),
            slot => *slot = Some(Value::List(vec![value])),
        }
    }

    /// Insert into a map slot, creating it on first use.
    pub fn entry_slot(&mut self, id: PropertyId, key: String, value: Value) {
        match &mut self.slots[id.index()] {
            Some(Value::Map(entries)) => {
                entries.insert(key, value);
            }
            slot => {
                let mut entries = std::collections::BTreeMap::new();
                entries.insert(key, value);
                *slot = Some(Value::Map(entries));
            }
        }
    }

    pub fn count(&self, id: ParserId) -> usize {
        self.counts.get(&id).copied().unwrap_or(0)
    }

    pub fn increment(&mut self, id: ParserId) {
        *self.counts.entry(id).or_insert(0) += 1;
    }

    pub fn set_count(&mut self, id: ParserId, count: usize) {
        self.counts.insert(id, count);
    }

    pub fn reset_count(&mut self, id: ParserId) {
        self.counts.remove(&id);
    }

    pub fn reset_position(&mut self, id: ParserId) {
        self.positions.remove(&id);
    }

    pub fn position(&self, id: ParserId) -> GroupPosition {
        self.positions.get(&id).copied().unwrap_or_default()
    }

    pub fn set_position(&mut self, id: ParserId, position: GroupPosition) {
        self.positions.insert(id, position);
    }

    pub fn push_error(&mut self, error: WeftError) {
        self.errors.push(error);
    }
}

/// Accumulates one output record, per wire format.
#[derive(Debug)]
pub enum RecordBuilder {
    /// Delimited: field slots by ordinal.
    Fields { slots: Vec<Option<String>> },
    /// Fixed-length: a character buffer grown on demand.
    Line { chars: Vec<char> },
    /// XML: an element tree with a scope stack for open segments.
    Node {
        root: ElementNode,
        open: Vec<ElementNode>,
    },
}

impl RecordBuilder {
    pub fn fields() -> Self {
        Self::Fields { slots: Vec::new() }
    }

    pub fn line() -> Self {
        Self::Line { chars: Vec::new() }
    }

    pub fn node(record_name: &str) -> Self {
        Self::Node {
            root: ElementNode::new(record_name),
            open: Vec::new(),
        }
    }

    /// Set a delimited field slot. Intervening unset slots stay None and
    /// render as empty strings.
    pub fn set_field(&mut self, ordinal: usize, text: Option<String>) {
        if let Self::Fields { slots } = self {
            if slots.len() <= ordinal {
                slots.resize(ordinal + 1, None);
            }
            if text.is_some() {
                slots[ordinal] = text;
            }
        }
    }

    /// Write a fixed-length span, padding the value to its width. A missing
    /// value fills the span entirely with the pad character.
    pub fn set_span(
        &mut self,
        offset: usize,
        length: usize,
        pad: char,
        justify: Justify,
        text: Option<&str>,
    ) {
        if let Self::Line { chars } = self {
            if chars.len() < offset + length {
                chars.resize(offset + length, ' ');
            }
            let value: Vec<char> = text.unwrap_or("").chars().take(length).collect();
            let fill = length - value.len();
            let mut span = Vec::with_capacity(length);
            match justify {
                Justify::Left => {
                    span.extend(&value);
                    span.extend(std::iter::repeat(pad).take(fill));
                }
                Justify::Right => {
                    span.extend(std::iter::repeat(pad).take(fill));
                    span.extend(&value);
                }
            }
            chars[offset..offset + length].copy_from_slice(&span);
        }
    }

    /// Add an XML field element to the innermost open scope. Absent fields
    /// are omitted.
    pub fn add_element(&mut self, name: &str, text: Option<String>) {
        if let Self::Node { root, open } = self {
            if let Some(text) = text {
                let target = open.last_mut().unwrap_or(root);
                target.push(ElementNode::with_text(name, text));
            }
        }
    }

    /// Open a nested segment element.
    pub fn open_element(&mut self, name: &str) {
        if let Self::Node { open, .. } = self {
            open.push(ElementNode::new(name));
        }
    }

    /// Close the innermost segment element and attach it to its parent.
    pub fn close_element(&mut self) {
        if let Self::Node { root, open } = self {
            if let Some(closed) = open.pop() {
                let target = open.last_mut().unwrap_or(root);
                target.push(closed);
            }
        }
    }

    /// Finish the record. Trailing unset delimited slots are trimmed;
    /// internal ones back-fill as empty strings.
    pub fn finish(self) -> RecordToken {
        match self {
            Self::Fields { mut slots } => {
                while matches!(slots.last(), Some(None)) {
                    slots.pop();
                }
                RecordToken::Fields(
                    slots
                        .into_iter()
                        .map(|s| s.unwrap_or_default())
                        .collect(),
                )
            }
            Self::Line { chars } => RecordToken::Line(chars.into_iter().collect()),
            Self::Node { mut root, mut open } => {
                while let Some(closed) = open.pop() {
                    let target = open.last_mut().unwrap_or(&mut root);
                    target.push(closed);
                }
                RecordToken::Node(root)
            }
        }
    }
}
