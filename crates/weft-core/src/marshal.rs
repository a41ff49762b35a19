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

//! Marshalling: the dual traversal producing record tokens from values.
//!
//! Delimited output back-fills internal gaps with empty strings and trims
//! trailing ones; fixed-length output emits pad characters over the full
//! width of every missing field.

use crate::accessor::Accessor;
use crate::config::{Occurs, StreamFormat};
use crate::error::{WeftError, WeftResult};
use crate::io::RecordToken;
use crate::parser::context::RecordBuilder;
use crate::parser::{FieldDescriptor, ParserId, ParserKind};
use crate::property::PropertyKind;
use crate::stream::Stream;
use crate::value::Value;

impl Stream {
    /// Select the record definition a value marshals through: by explicit
    /// name, by bound class, or by being the only record declared.
    pub(crate) fn select_record(
        &self,
        name: Option<&str>,
        value: &Value,
    ) -> WeftResult<ParserId> {
        if let Some(name) = name {
            return self.record(name).ok_or_else(|| {
                WeftError::writer(format!("no record named '{}' in stream '{}'", name, self.name))
            });
        }

        let records = self.records_in_order();
        for &id in &records {
            let Some(prop) = self.parsers.get(id).property else {
                continue;
            };
            match (&self.properties.get(prop).kind, value) {
                (PropertyKind::Complex { class, .. }, Value::Bean(bean)) => {
                    if bean.class == *class || self.classes.is_subclass(&bean.class, class) {
                        return Ok(id);
                    }
                }
                (PropertyKind::Map { key: None }, Value::Map(_)) => return Ok(id),
                _ => {}
            }
        }
        if records.len() == 1 {
            return Ok(records[0]);
        }
        Err(WeftError::writer(format!(
            "no record definition in stream '{}' accepts the value",
            self.name
        )))
    }

    /// Record parsers in declared order.
    pub(crate) fn records_in_order(&self) -> Vec<ParserId> {
        let mut out = Vec::new();
        self.collect_records(self.root(), &mut out);
        out
    }

    fn collect_records(&self, id: ParserId, out: &mut Vec<ParserId>) {
        let node = self.parsers.get(id);
        if matches!(node.kind, ParserKind::Record(_)) {
            out.push(id);
            return;
        }
        for &child in &node.children {
            self.collect_records(child, out);
        }
    }

    /// Marshal a value through a record parser into a record token.
    pub(crate) fn marshal_record(
        &self,
        record_id: ParserId,
        value: &Value,
    ) -> WeftResult<RecordToken> {
        let node = self.parsers.get(record_id);
        let mut builder = match self.format {
            StreamFormat::Delimited | StreamFormat::Csv => RecordBuilder::fields(),
            StreamFormat::FixedLength => RecordBuilder::line(),
            StreamFormat::Xml => RecordBuilder::node(&node.name),
        };
        let mut cursor = 0usize;
        self.emit_children(&node.children, value, &mut cursor, &mut builder)?;
        Ok(builder.finish())
    }

    fn emit_children(
        &self,
        children: &[ParserId],
        scope: &Value,
        cursor: &mut usize,
        builder: &mut RecordBuilder,
    ) -> WeftResult<()> {
        for &child in children {
            match &self.parsers.get(child).kind {
                ParserKind::Field(_) => self.emit_field(child, scope, cursor, builder)?,
                ParserKind::Segment(_) => self.emit_segment(child, scope, cursor, builder)?,
                _ => {}
            }
        }
        Ok(())
    }

    fn emit_field(
        &self,
        id: ParserId,
        scope: &Value,
        cursor: &mut usize,
        builder: &mut RecordBuilder,
    ) -> WeftResult<()> {
        let node = self.parsers.get(id);
        let Some(field) = node.as_field() else {
            return Ok(());
        };

        // Explicitly positioned fields may leave a gap for back-fill.
        if let RecordBuilder::Fields { .. } = builder {
            if let FieldDescriptor::Ordinal(p) = &field.descriptor {
                if *p > *cursor {
                    *cursor = *p;
                }
            }
        }
        if let RecordBuilder::Line { .. } = builder {
            if let FieldDescriptor::Fixed { offset, .. } = &field.descriptor {
                if *offset > *cursor {
                    *cursor = *offset;
                }
            }
        }

        let value = node
            .property
            .and_then(|prop| self.properties.get(prop).accessor.as_ref())
            .and_then(|accessor| member_value(scope, accessor));

        if field.max_occurs == Occurs::Count(1) {
            let text = self.format_field(&node.name, field, value)?;
            self.emit_text(&node.name, field, text, cursor, builder);
            return Ok(());
        }

        let items: &[Value] = value.and_then(|v| v.as_list()).unwrap_or(&[]);
        let emit_count = match field.max_occurs {
            Occurs::Count(max) => items.len().min(max),
            Occurs::Unbounded => items.len(),
        }
        .max(field.min_occurs);
        for i in 0..emit_count {
            let text = self.format_field(&node.name, field, items.get(i))?;
            self.emit_text(&node.name, field, text, cursor, builder);
        }
        Ok(())
    }

    /// Format one field occurrence, falling back to the configured literal.
    /// A missing identifier is a writer error.
    fn format_field(
        &self,
        name: &str,
        field: &crate::parser::FieldParser,
        value: Option<&Value>,
    ) -> WeftResult<Option<String>> {
        let mut text = match value {
            Some(v) => field
                .handler
                .format(v)
                .map_err(|e| e.with_field(name.to_string()))?,
            None => None,
        };
        if text.is_none() {
            text = field.literal.clone();
        }
        if text.is_none() && field.identifier {
            return Err(WeftError::writer(format!(
                "cannot marshal record: identifier field '{}' has no value",
                name
            )));
        }
        Ok(text)
    }

    fn emit_text(
        &self,
        name: &str,
        field: &crate::parser::FieldParser,
        text: Option<String>,
        cursor: &mut usize,
        builder: &mut RecordBuilder,
    ) {
        match builder {
            RecordBuilder::Fields { .. } => {
                builder.set_field(*cursor, text);
                *cursor += 1;
            }
            RecordBuilder::Line { .. } => {
                if let FieldDescriptor::Fixed {
                    length,
                    pad,
                    justify,
                    ..
                } = &field.descriptor
                {
                    builder.set_span(*cursor, *length, *pad, *justify, text.as_deref());
                    *cursor += length;
                }
            }
            RecordBuilder::Node { .. } => {
                builder.add_element(name, text);
            }
        }
    }

    fn emit_segment(
        &self,
        id: ParserId,
        scope: &Value,
        cursor: &mut usize,
        builder: &mut RecordBuilder,
    ) -> WeftResult<()> {
        let node = self.parsers.get(id);
        let is_xml = matches!(builder, RecordBuilder::Node { .. });

        let Some(prop) = node.property else {
            // Inline segment: children bind through the enclosing scope.
            if is_xml {
                builder.open_element(&node.name);
            }
            self.emit_children(&node.children, scope, cursor, builder)?;
            if is_xml {
                builder.close_element();
            }
            return Ok(());
        };

        let prop_node = self.properties.get(prop);
        let value = prop_node
            .accessor
            .as_ref()
            .and_then(|accessor| member_value(scope, accessor));

        match &prop_node.kind {
            PropertyKind::Complex { .. } => {
                match value {
                    Some(inner) => {
                        if is_xml {
                            builder.open_element(&node.name);
                        }
                        self.emit_children(&node.children, inner, cursor, builder)?;
                        if is_xml {
                            builder.close_element();
                        }
                    }
                    None => {
                        // Flat formats still reserve the segment's span.
                        if !is_xml {
                            self.emit_children(&node.children, &Value::Null, cursor, builder)?;
                        }
                    }
                }
            }
            PropertyKind::Collection | PropertyKind::Map { .. } => {
                let items: Vec<&Value> = match value {
                    Some(Value::List(items)) => items.iter().collect(),
                    Some(Value::Map(entries)) => entries.values().collect(),
                    _ => Vec::new(),
                };
                let emit_count = match node.max_occurs() {
                    Occurs::Count(max) => items.len().min(max),
                    Occurs::Unbounded => items.len(),
                };
                for &item in items.iter().take(emit_count) {
                    if is_xml {
                        builder.open_element(&node.name);
                    }
                    self.emit_children(&node.children, item, cursor, builder)?;
                    if is_xml {
                        builder.close_element();
                    }
                }
                // Flat formats pad missing occurrences up to the minimum.
                if !is_xml {
                    for _ in emit_count..node.min_occurs() {
                        self.emit_children(&node.children, &Value::Null, cursor, builder)?;
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// Read the member a property binds from the current scope value.
fn member_value<'a>(scope: &'a Value, accessor: &Accessor) -> Option<&'a Value> {
    let value = match scope {
        Value::Bean(bean) => accessor
            .get(bean)
            .or_else(|| bean.get(accessor.member())),
        Value::Map(entries) => entries.get(&accessor.name),
        _ => None,
    };
    value.filter(|v| !v.is_null())
}
