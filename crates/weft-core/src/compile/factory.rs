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

//! Second compile pass: lower the finalized configuration into the parser
//! and property trees.
//!
//! The pass maintains two stacks: one of open parser scopes, one of the
//! properties they bind. A scope that binds nothing pushes the distinct
//! `Unbound` slot so the stacks always pop in the same pairing. Popping a
//! complex property runs constructor selection over its gathered
//! constructor-argument children.

use crate::accessor::{resolve_accessor, Accessor};
use crate::config::{
    Aggregation, ComponentConfig, FieldConfig, GroupConfig, Occurs, RecordConfig, SegmentConfig,
    StreamConfig, StreamFormat,
};
use crate::error::{WeftError, WeftResult};
use crate::factory::select_for_types;
use crate::parser::{
    FieldDescriptor, FieldParser, GroupParser, ParserArena, ParserId, ParserKind, ParserNode,
    RecordParser, SegmentParser,
};
use crate::property::{
    PropertyArena, PropertyId, PropertyKind, PropertyNode, SelectedConstructor,
};
use crate::schema::ClassRegistry;
use crate::stream::Stream;
use crate::types::{EscapedCharHandler, EscapedStringHandler, TypeHandler, TypeHandlerRegistry};
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// A property-stack entry. The unbound sentinel is its own variant, never a
/// shared placeholder value.
#[derive(Debug, Clone, Copy, PartialEq)]
enum PropertySlot {
    Bound(PropertyId),
    Unbound,
}

/// The two stacks driving the second pass.
#[derive(Debug, Default)]
struct CompileContext {
    parser_stack: Vec<ParserId>,
    property_stack: Vec<PropertySlot>,
}

impl CompileContext {
    fn push(&mut self, parser: ParserId, slot: PropertySlot) {
        self.parser_stack.push(parser);
        self.property_stack.push(slot);
    }

    fn pop(&mut self) -> (ParserId, PropertySlot) {
        let parser = self
            .parser_stack
            .pop()
            .expect("parser stack underflow during compile");
        let slot = self
            .property_stack
            .pop()
            .expect("property stack underflow during compile");
        (parser, slot)
    }

    /// The innermost bound property, skipping unbound scopes.
    fn enclosing_property(&self) -> Option<PropertyId> {
        self.property_stack.iter().rev().find_map(|slot| match slot {
            PropertySlot::Bound(id) => Some(*id),
            PropertySlot::Unbound => None,
        })
    }
}

pub(crate) fn build(
    config: &StreamConfig,
    classes: Arc<ClassRegistry>,
    handlers: &TypeHandlerRegistry,
) -> WeftResult<Stream> {
    debug!(stream = %config.name, format = ?config.format, "compiling stream layout");
    let mut compiler = Compiler {
        classes: &classes,
        handlers,
        config,
        parsers: ParserArena::new(),
        properties: PropertyArena::new(),
        records: HashMap::new(),
        ctx: CompileContext::default(),
    };

    let root = compiler.build_root()?;
    let records = std::mem::take(&mut compiler.records);
    let parsers = std::mem::take(&mut compiler.parsers);
    let properties = std::mem::take(&mut compiler.properties);

    Ok(Stream {
        name: config.name.clone(),
        format: config.format,
        mode: config.mode,
        on_unidentified: config.on_unidentified,
        parsers,
        properties,
        root,
        records,
        classes,
    })
}

struct Compiler<'a> {
    classes: &'a ClassRegistry,
    handlers: &'a TypeHandlerRegistry,
    config: &'a StreamConfig,
    parsers: ParserArena,
    properties: PropertyArena,
    records: HashMap<String, ParserId>,
    ctx: CompileContext,
}

impl<'a> Compiler<'a> {
    fn build_root(&mut self) -> WeftResult<ParserId> {
        let root = self.parsers.alloc(ParserNode::new(
            self.config.name.clone(),
            ParserKind::Group(GroupParser {
                min_occurs: 0,
                max_occurs: Occurs::Unbounded,
                order: self.config.order,
            }),
        ));
        self.ctx.push(root, PropertySlot::Unbound);
        for child in &self.config.children {
            self.build_component(child)?;
        }
        self.ctx.pop();
        Ok(root)
    }

    fn build_component(&mut self, component: &ComponentConfig) -> WeftResult<()> {
        match component {
            ComponentConfig::Group(g) => self.build_group(g),
            ComponentConfig::Record(r) => self.build_record(r),
            ComponentConfig::Segment(s) => self.build_segment(s),
            ComponentConfig::Field(f) => self.build_field(f),
        }
    }

    fn attach(&mut self, child: ParserId) {
        if let Some(&parent) = self.ctx.parser_stack.last() {
            self.parsers.get_mut(parent).children.push(child);
        }
    }

    // ==== groups ====

    fn build_group(&mut self, group: &GroupConfig) -> WeftResult<()> {
        let id = self.parsers.alloc(ParserNode::new(
            group.name.clone(),
            ParserKind::Group(GroupParser {
                min_occurs: group.min_occurs,
                max_occurs: group.max_occurs,
                order: group.order,
            }),
        ));
        self.attach(id);
        self.ctx.push(id, PropertySlot::Unbound);
        for child in &group.children {
            self.build_component(child)?;
        }
        self.ctx.pop();
        Ok(())
    }

    // ==== records ====

    fn build_record(&mut self, record: &RecordConfig) -> WeftResult<()> {
        if self.records.contains_key(&record.name) {
            return Err(WeftError::config(format!(
                "duplicate record name '{}'",
                record.name
            )));
        }

        let kind = match &record.bean {
            Some(bean) => {
                self.classes.require(&bean.class_name)?;
                PropertyKind::Complex {
                    class: bean.class_name.clone(),
                    constructor: None,
                }
            }
            None => PropertyKind::Map { key: None },
        };
        let prop = self
            .properties
            .alloc(PropertyNode::new(record.name.clone(), kind));

        let mut node = ParserNode::new(
            record.name.clone(),
            ParserKind::Record(RecordParser {
                min_occurs: record.min_occurs,
                max_occurs: record.max_occurs,
                identifiers: Vec::new(),
            }),
        );
        node.property = Some(prop);
        let id = self.parsers.alloc(node);
        self.attach(id);
        self.records.insert(record.name.clone(), id);

        self.ctx.push(id, PropertySlot::Bound(prop));
        for child in &record.children {
            self.build_component(child)?;
        }
        self.ctx.pop();

        self.update_constructor(prop)?;

        let identifiers = self.collect_identifiers(id);
        if let ParserKind::Record(r) = &mut self.parsers.get_mut(id).kind {
            r.identifiers = identifiers;
        }
        self.assign_tails(id, 0);
        Ok(())
    }

    // ==== segments ====

    fn build_segment(&mut self, segment: &SegmentConfig) -> WeftResult<()> {
        let node = ParserNode::new(
            segment.name.clone(),
            ParserKind::Segment(SegmentParser {
                min_occurs: segment.min_occurs,
                max_occurs: segment.max_occurs,
                stride: 0,
                tail_min: 0,
            }),
        );
        let id = self.parsers.alloc(node);
        self.attach(id);

        let inner_slot = match (&segment.bean, &segment.aggregation) {
            (None, Aggregation::Single) => PropertySlot::Unbound,
            (Some(bean), aggregation) => {
                self.classes.require(&bean.class_name)?;
                let accessor = self.bind_member(
                    &segment.name,
                    segment.getter.as_deref(),
                    segment.setter.as_deref(),
                    segment.ctor_arg,
                    false,
                )?;
                let complex = self.properties.alloc(PropertyNode::new(
                    segment.name.clone(),
                    PropertyKind::Complex {
                        class: bean.class_name.clone(),
                        constructor: None,
                    },
                ));
                let bound = match aggregation {
                    Aggregation::Single => {
                        self.properties.get_mut(complex).accessor = accessor;
                        complex
                    }
                    Aggregation::List => {
                        let mut coll =
                            PropertyNode::new(segment.name.clone(), PropertyKind::Collection);
                        coll.accessor = accessor;
                        coll.children.push(complex);
                        self.properties.alloc(coll)
                    }
                    Aggregation::Map { key } => {
                        let mut map = PropertyNode::new(
                            segment.name.clone(),
                            PropertyKind::Map {
                                key: Some(key.clone()),
                            },
                        );
                        map.accessor = accessor;
                        map.children.push(complex);
                        self.properties.alloc(map)
                    }
                };
                self.bind_to_enclosing(bound);
                self.parsers.get_mut(id).property = Some(bound);
                PropertySlot::Bound(complex)
            }
            // Preprocessing rejects aggregation without a bean.
            (None, _) => PropertySlot::Unbound,
        };

        self.ctx.push(id, inner_slot);
        for child in &segment.children {
            self.build_component(child)?;
        }
        self.ctx.pop();

        if let PropertySlot::Bound(complex) = inner_slot {
            self.update_constructor(complex)?;
        }

        let stride = self.subtree_width(id);
        if let ParserKind::Segment(s) = &mut self.parsers.get_mut(id).kind {
            s.stride = stride.unwrap_or(0);
        }
        Ok(())
    }

    // ==== fields ====

    fn build_field(&mut self, field: &FieldConfig) -> WeftResult<()> {
        let handler = self.field_handler(field)?;
        let descriptor = self.field_descriptor(field);
        let regex = match &field.regex {
            Some(pattern) => Some(Regex::new(pattern).map_err(|e| {
                WeftError::config(format!(
                    "invalid pattern on field '{}': {}",
                    field.name, e
                ))
            })?),
            None => None,
        };

        let mut node = ParserNode::new(
            field.name.clone(),
            ParserKind::Field(FieldParser {
                descriptor,
                handler: handler.clone(),
                required: field.required,
                trim: field.trim.unwrap_or(false),
                default_value: field.default_value.clone(),
                literal: field.literal.clone(),
                regex,
                min_length: field.min_length,
                max_length: field.max_length,
                min_occurs: field.min_occurs,
                max_occurs: field.max_occurs,
                identifier: field.is_identifier,
                tail_min: 0,
            }),
        );

        if !field.ignore {
            let accessor = self.bind_member(
                &field.name,
                field.getter.as_deref(),
                field.setter.as_deref(),
                field.ctor_arg,
                field.literal.is_some(),
            )?;
            let simple = self.properties.alloc(PropertyNode::new(
                field.name.clone(),
                PropertyKind::Simple {
                    ty: handler.target_type(),
                },
            ));
            let repeating = field.max_occurs != Occurs::Count(1);
            let bound = if repeating {
                let mut coll = PropertyNode::new(field.name.clone(), PropertyKind::Collection);
                coll.accessor = accessor;
                coll.children.push(simple);
                self.properties.alloc(coll)
            } else {
                self.properties.get_mut(simple).accessor = accessor;
                simple
            };
            self.bind_to_enclosing(bound);
            node.property = Some(bound);

            if field.is_identifier {
                self.properties.get_mut(simple).identifier = true;
                self.properties.get_mut(bound).identifier = true;
                self.propagate_identifier();
            }
        }

        let id = self.parsers.alloc(node);
        self.attach(id);
        Ok(())
    }

    /// Resolve the handler for a field, swapping in escape-decoding handlers
    /// when the stream enables them.
    fn field_handler(&self, field: &FieldConfig) -> WeftResult<Arc<dyn TypeHandler>> {
        let type_name = field.type_name.as_deref().unwrap_or("string");
        if self.config.escape_strings && field.handler_name.is_none() {
            match type_name {
                "string" => {
                    return Ok(Arc::new(EscapedStringHandler::new(self.config.null_escape)))
                }
                "char" | "character" => {
                    return Ok(Arc::new(EscapedCharHandler::new(self.config.null_escape)))
                }
                _ => {}
            }
        }
        self.handlers
            .lookup(
                type_name,
                Some(self.config.format),
                field.handler_name.as_deref(),
            )
            .ok_or_else(|| {
                WeftError::config(format!(
                    "no type handler for type '{}' on field '{}'",
                    type_name, field.name
                ))
            })
    }

    fn field_descriptor(&self, field: &FieldConfig) -> FieldDescriptor {
        match self.config.format {
            StreamFormat::Delimited | StreamFormat::Csv => {
                FieldDescriptor::Ordinal(field.position.map(|p| p - 1).unwrap_or(0))
            }
            StreamFormat::FixedLength => FieldDescriptor::Fixed {
                offset: field.offset.unwrap_or(0),
                length: field.length.unwrap_or(1),
                pad: field.padding,
                justify: field.justify,
            },
            StreamFormat::Xml => FieldDescriptor::Named(field.name.clone()),
        }
    }

    // ==== binding ====

    /// Resolve how a named member attaches to the enclosing property and
    /// enforce mode constraints.
    fn bind_member(
        &self,
        name: &str,
        getter: Option<&str>,
        setter: Option<&str>,
        ctor_arg: Option<usize>,
        has_literal: bool,
    ) -> WeftResult<Option<Accessor>> {
        let Some(enclosing) = self.ctx.enclosing_property() else {
            return Ok(None);
        };
        let parent = self.properties.get(enclosing);
        let accessor = match &parent.kind {
            PropertyKind::Complex { class, .. } => resolve_accessor(
                self.classes,
                class,
                name,
                getter,
                setter,
                ctor_arg,
                self.config.allow_protected_access,
            )?,
            PropertyKind::Map { .. } => Accessor::direct(name),
            PropertyKind::Collection => {
                return Err(WeftError::config(format!(
                    "cannot bind member '{}' into a collection property",
                    name
                )));
            }
            PropertyKind::Simple { .. } => {
                return Err(WeftError::config(format!(
                    "property '{}' cannot have children",
                    parent.name
                )));
            }
        };

        if self.config.mode.readable() && !accessor.writable() && accessor.ctor_arg.is_none() {
            return Err(WeftError::config(format!(
                "member '{}' is not writable and the stream mode includes reading",
                name
            )));
        }
        // Constructor arguments marshal back through their stored member;
        // literal fields marshal their constant.
        if self.config.mode.writable()
            && !accessor.readable()
            && !has_literal
            && accessor.ctor_arg.is_none()
        {
            return Err(WeftError::config(format!(
                "member '{}' is not readable and the stream mode includes writing",
                name
            )));
        }
        Ok(Some(accessor))
    }

    /// Append a property to the enclosing property's child list.
    fn bind_to_enclosing(&mut self, child: PropertyId) {
        if let Some(enclosing) = self.ctx.enclosing_property() {
            self.properties.get_mut(enclosing).children.push(child);
        }
    }

    /// Mark every open bound property an identifier.
    fn propagate_identifier(&mut self) {
        for slot in self.ctx.property_stack.clone() {
            if let PropertySlot::Bound(id) = slot {
                self.properties.get_mut(id).identifier = true;
            }
        }
    }

    // ==== constructor selection ====

    /// Select a constructor for a complex property from its gathered
    /// constructor-argument children.
    fn update_constructor(&mut self, prop: PropertyId) -> WeftResult<()> {
        let node = self.properties.get(prop);
        let PropertyKind::Complex { class, .. } = &node.kind else {
            return Ok(());
        };
        let class = class.clone();

        let mut args: Vec<(usize, PropertyId)> = node
            .children
            .iter()
            .filter_map(|&child| {
                self.properties
                    .get(child)
                    .accessor
                    .as_ref()
                    .and_then(|a| a.ctor_arg)
                    .map(|index| (index, child))
            })
            .collect();
        if args.is_empty() {
            return Ok(());
        }
        args.sort_by_key(|(index, _)| *index);

        for (expected, (index, child)) in args.iter().enumerate() {
            if *index != expected {
                let child_name = self.properties.get(*child).name.clone();
                return Err(WeftError::config(format!(
                    "constructor arguments of class '{}' are not contiguous: \
                     member '{}' declares index {}, expected {}",
                    class, child_name, index, expected
                )));
            }
        }

        let arg_types: Vec<_> = args
            .iter()
            .map(|(_, child)| self.properties.get(*child).type_ref())
            .collect();
        let def = self.classes.require(&class)?.clone();
        let index = select_for_types(self.classes, &def, &arg_types)?;
        let param_members: Vec<String> = args
            .iter()
            .map(|(_, child)| {
                let node = self.properties.get(*child);
                node.accessor
                    .as_ref()
                    .map(|a| a.member().to_string())
                    .unwrap_or_else(|| node.name.clone())
            })
            .collect();

        if let PropertyKind::Complex { constructor, .. } =
            &mut self.properties.get_mut(prop).kind
        {
            *constructor = Some(SelectedConstructor {
                index,
                param_members,
            });
        }
        Ok(())
    }

    // ==== layout metadata ====

    fn collect_identifiers(&self, parser: ParserId) -> Vec<ParserId> {
        let mut out = Vec::new();
        self.collect_identifiers_into(parser, &mut out);
        out
    }

    fn collect_identifiers_into(&self, parser: ParserId, out: &mut Vec<ParserId>) {
        for &child in &self.parsers.get(parser).children {
            match &self.parsers.get(child).kind {
                ParserKind::Field(f) => {
                    if f.identifier {
                        out.push(child);
                    }
                }
                ParserKind::Segment(_) => self.collect_identifiers_into(child, out),
                _ => {}
            }
        }
    }

    /// Cursor units consumed by one occurrence of a node's subtree, or None
    /// when unbounded.
    fn subtree_width(&self, parser: ParserId) -> Option<usize> {
        let mut total = 0usize;
        for &child in &self.parsers.get(parser).children {
            let node = self.parsers.get(child);
            let one = match &node.kind {
                ParserKind::Field(f) => f.descriptor.width(),
                ParserKind::Segment(_) => self.subtree_width(child)?,
                _ => 0,
            };
            let count = node.max_occurs().as_count()?;
            total += one * count;
        }
        Some(total)
    }

    /// Minimum cursor units one occurrence of a node requires.
    fn min_width(&self, parser: ParserId) -> usize {
        let node = self.parsers.get(parser);
        match &node.kind {
            ParserKind::Field(f) => f.descriptor.width(),
            ParserKind::Segment(_) => node
                .children
                .iter()
                .map(|&c| self.min_width(c) * self.parsers.get(c).min_occurs())
                .sum(),
            _ => 0,
        }
    }

    /// Record, on every field and segment, how many cursor units later
    /// siblings still require. Greedy repeats stop early enough to satisfy
    /// them.
    fn assign_tails(&mut self, parser: ParserId, outer: usize) {
        let children = self.parsers.get(parser).children.clone();
        let mut tail = outer;
        for &child in children.iter().rev() {
            let min = self.min_width(child) * self.parsers.get(child).min_occurs();
            match &mut self.parsers.get_mut(child).kind {
                ParserKind::Field(f) => f.tail_min = tail,
                ParserKind::Segment(s) => s.tail_min = tail,
                _ => {}
            }
            if matches!(self.parsers.get(child).kind, ParserKind::Segment(_)) {
                self.assign_tails(child, tail);
            }
            tail += min;
        }
    }
}

