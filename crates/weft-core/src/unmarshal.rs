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

//! Unmarshalling: record dispatch, occurrence enforcement, and tree-driven
//! population of property values.

use crate::config::{GroupOrder, Justify, Occurs};
use crate::error::{WeftError, WeftResult};
use crate::io::{ElementNode, RecordToken};
use crate::parser::context::{GroupPosition, UnmarshallingContext};
use crate::parser::{FieldDescriptor, FieldParser, ParserId, ParserKind};
use crate::property::{PropertyId, PropertyKind};
use crate::stream::Stream;
use crate::value::{Bean, Value};

/// Borrowed view of a record token during one walk.
#[derive(Clone, Copy)]
enum View<'a> {
    Fields(&'a [String]),
    Line(&'a [char]),
    Node(&'a ElementNode),
}

impl Stream {
    // ==== record dispatch ====

    /// Match the token against the expected set of record definitions,
    /// updating occurrence state. `Ok(None)` means no definition matched.
    pub(crate) fn match_record(
        &self,
        token: &RecordToken,
        ctx: &mut UnmarshallingContext,
    ) -> WeftResult<Option<ParserId>> {
        self.match_group(self.root(), token, ctx)
    }

    /// Validate outstanding minimum occurrences at end of stream.
    pub(crate) fn validate_end(&self, ctx: &UnmarshallingContext) -> WeftResult<()> {
        self.validate_group_end(self.root(), ctx)
    }

    fn match_group(
        &self,
        group_id: ParserId,
        token: &RecordToken,
        ctx: &mut UnmarshallingContext,
    ) -> WeftResult<Option<ParserId>> {
        let node = self.parsers.get(group_id);
        let order = node.as_group().map(|g| g.order).unwrap_or_default();
        let children = node.children.clone();

        match order {
            GroupOrder::Sequential => {
                let pos = ctx.position(group_id);
                for j in pos.child..children.len() {
                    let child = children[j];
                    let matched = match &self.parsers.get(child).kind {
                        ParserKind::Record(_) => {
                            if self.record_matches(child, token) {
                                if self.parsers.get(child).max_occurs().allows(ctx.count(child)) {
                                    Some(child)
                                } else {
                                    // At its max: only a new group iteration
                                    // can take this record again.
                                    return self.repeat_group(group_id, j, token, ctx);
                                }
                            } else {
                                None
                            }
                        }
                        ParserKind::Group(_) => self.match_group(child, token, ctx)?,
                        _ => None,
                    };
                    if let Some(record) = matched {
                        for &skipped in &children[pos.child..j] {
                            let min = self.parsers.get(skipped).min_occurs();
                            if ctx.count(skipped) < min {
                                return Err(self.occurrence_error(skipped, min, ctx));
                            }
                        }
                        if matches!(self.parsers.get(child).kind, ParserKind::Record(_)) {
                            ctx.increment(child);
                        }
                        ctx.set_position(
                            group_id,
                            GroupPosition {
                                child: j,
                                iterations: pos.iterations,
                            },
                        );
                        ctx.set_count(group_id, pos.iterations + 1);
                        return Ok(Some(record));
                    }
                }
                // Nothing ahead matched; an earlier child may start a new
                // iteration of this group.
                for j in 0..pos.child {
                    let child = children[j];
                    let would = match &self.parsers.get(child).kind {
                        ParserKind::Record(_) => self.record_matches(child, token),
                        ParserKind::Group(_) => self.group_matches_fresh(child, token),
                        _ => false,
                    };
                    if would {
                        return self.repeat_group(group_id, j, token, ctx);
                    }
                }
                Ok(None)
            }
            GroupOrder::Unordered => {
                for &child in &children {
                    let allows = self.parsers.get(child).max_occurs().allows(ctx.count(child));
                    let matched = match &self.parsers.get(child).kind {
                        ParserKind::Record(_) => {
                            if allows && self.record_matches(child, token) {
                                ctx.increment(child);
                                Some(child)
                            } else {
                                None
                            }
                        }
                        ParserKind::Group(_) => self.match_group(child, token, ctx)?,
                        _ => None,
                    };
                    if let Some(record) = matched {
                        let pos = ctx.position(group_id);
                        ctx.set_count(group_id, pos.iterations + 1);
                        return Ok(Some(record));
                    }
                }
                // A record matched structurally but is over its max.
                for &child in &children {
                    if matches!(self.parsers.get(child).kind, ParserKind::Record(_))
                        && self.record_matches(child, token)
                    {
                        return Err(WeftError::occurrence(
                            format!(
                                "record '{}' exceeds its maximum occurrences",
                                self.parsers.get(child).name
                            ),
                            ctx.line,
                        ));
                    }
                }
                Ok(None)
            }
        }
    }

    /// Start a new iteration of a sequential group at child `j`.
    fn repeat_group(
        &self,
        group_id: ParserId,
        j: usize,
        token: &RecordToken,
        ctx: &mut UnmarshallingContext,
    ) -> WeftResult<Option<ParserId>> {
        let node = self.parsers.get(group_id);
        let children = node.children.clone();
        let pos = ctx.position(group_id);

        if !node.max_occurs().allows(pos.iterations + 1) {
            return Err(WeftError::occurrence(
                format!("group '{}' exceeds its maximum occurrences", node.name),
                ctx.line,
            ));
        }
        for &child in &children {
            let min = self.parsers.get(child).min_occurs();
            if ctx.count(child) < min {
                return Err(self.occurrence_error(child, min, ctx));
            }
        }
        for &child in &children {
            self.reset_subtree(child, ctx);
        }
        // Children declared before the matching one are skipped in the new
        // iteration; their minimums must allow that.
        for &skipped in &children[0..j] {
            let min = self.parsers.get(skipped).min_occurs();
            if min > 0 {
                return Err(self.occurrence_error(skipped, min, ctx));
            }
        }

        let child = children[j];
        let matched = match &self.parsers.get(child).kind {
            ParserKind::Record(_) => {
                ctx.increment(child);
                Some(child)
            }
            ParserKind::Group(_) => self.match_group(child, token, ctx)?,
            _ => None,
        };
        ctx.set_position(
            group_id,
            GroupPosition {
                child: j,
                iterations: pos.iterations + 1,
            },
        );
        ctx.set_count(group_id, pos.iterations + 2);
        Ok(matched)
    }

    fn reset_subtree(&self, id: ParserId, ctx: &mut UnmarshallingContext) {
        ctx.reset_count(id);
        if matches!(self.parsers.get(id).kind, ParserKind::Group(_)) {
            ctx.reset_position(id);
            for &child in &self.parsers.get(id).children {
                self.reset_subtree(child, ctx);
            }
        }
    }

    /// Could this group accept the token as the start of a fresh iteration?
    fn group_matches_fresh(&self, group_id: ParserId, token: &RecordToken) -> bool {
        let node = self.parsers.get(group_id);
        let Some(group) = node.as_group() else {
            return false;
        };
        for &child in &node.children {
            let matches = match &self.parsers.get(child).kind {
                ParserKind::Record(_) => self.record_matches(child, token),
                ParserKind::Group(_) => self.group_matches_fresh(child, token),
                _ => false,
            };
            if matches {
                return true;
            }
            if group.order == GroupOrder::Sequential && self.parsers.get(child).min_occurs() > 0
            {
                return false;
            }
        }
        false
    }

    fn validate_group_end(&self, group_id: ParserId, ctx: &UnmarshallingContext) -> WeftResult<()> {
        let node = self.parsers.get(group_id);
        let Some(group) = node.as_group() else {
            return Ok(());
        };
        let pos = ctx.position(group_id);
        let active =
            pos.child > 0 || pos.iterations > 0 || node.children.iter().any(|&c| ctx.count(c) > 0);
        let iterations = pos.iterations + usize::from(active);
        if iterations < group.min_occurs {
            return Err(WeftError::occurrence(
                format!(
                    "expected at least {} occurrences of group '{}'",
                    group.min_occurs, node.name
                ),
                ctx.line,
            ));
        }
        if active {
            for &child in &node.children {
                let min = self.parsers.get(child).min_occurs();
                if ctx.count(child) < min {
                    return Err(self.occurrence_error(child, min, ctx));
                }
                if matches!(self.parsers.get(child).kind, ParserKind::Group(_))
                    && ctx.count(child) > 0
                {
                    self.validate_group_end(child, ctx)?;
                }
            }
        }
        Ok(())
    }

    fn occurrence_error(&self, id: ParserId, min: usize, ctx: &UnmarshallingContext) -> WeftError {
        WeftError::occurrence(
            format!(
                "expected at least {} occurrences of '{}'",
                min,
                self.parsers.get(id).name
            ),
            ctx.line,
        )
        .with_record(self.parsers.get(id).name.clone())
    }

    // ==== record identification ====

    /// True when every identifier field of the record matches the token.
    pub(crate) fn record_matches(&self, record_id: ParserId, token: &RecordToken) -> bool {
        let node = self.parsers.get(record_id);
        let Some(record) = node.as_record() else {
            return false;
        };
        if let RecordToken::Node(elem) = token {
            if elem.name != node.name {
                return false;
            }
        }
        for &fid in &record.identifiers {
            let Some(field) = self.parsers.get(fid).as_field() else {
                continue;
            };
            let raw = identifier_text(field, token);
            let Some(text) = raw else {
                return false;
            };
            let text = if field.trim { text.trim().to_string() } else { text };
            let ok = if let Some(literal) = &field.literal {
                text == *literal
            } else if let Some(regex) = &field.regex {
                regex.is_match(&text)
            } else {
                field.handler.parse(&text).is_ok()
            };
            if !ok {
                return false;
            }
        }
        true
    }

    // ==== record unmarshalling ====

    /// Drive the record parser over a token, producing the bound aggregate.
    ///
    /// Field conversion failures are collected and aggregated into a single
    /// error carrying the first failure's context.
    pub(crate) fn unmarshal_record(
        &self,
        record_id: ParserId,
        token: &RecordToken,
        ctx: &mut UnmarshallingContext,
    ) -> WeftResult<Value> {
        let line_chars: Vec<char>;
        let view = match token {
            RecordToken::Fields(fields) => View::Fields(fields),
            RecordToken::Line(line) => {
                line_chars = line.chars().collect();
                View::Line(&line_chars)
            }
            RecordToken::Node(elem) => View::Node(elem),
        };

        let node = self.parsers.get(record_id);
        let mut cursor = 0usize;
        self.walk(&node.children, view, &mut cursor, ctx)?;

        if !ctx.errors.is_empty() {
            let first = &ctx.errors[0];
            let mut error = WeftError::conversion(
                format!(
                    "{} field error(s) in record '{}': {}",
                    ctx.errors.len(),
                    node.name,
                    first.message
                ),
                ctx.line,
            )
            .with_record(node.name.clone());
            error.field = first.field.clone();
            return Err(error);
        }

        let prop = node
            .property
            .ok_or_else(|| WeftError::config(format!("record '{}' is unbound", node.name)))?;
        Ok(self.materialize(prop, ctx, true)?.unwrap_or(Value::Null))
    }

    fn walk(
        &self,
        children: &[ParserId],
        view: View<'_>,
        cursor: &mut usize,
        ctx: &mut UnmarshallingContext,
    ) -> WeftResult<()> {
        for &child in children {
            match &self.parsers.get(child).kind {
                ParserKind::Field(_) => self.walk_field(child, view, cursor, ctx)?,
                ParserKind::Segment(_) => self.walk_segment(child, view, cursor, ctx)?,
                _ => {}
            }
        }
        Ok(())
    }

    fn walk_field(
        &self,
        id: ParserId,
        view: View<'_>,
        cursor: &mut usize,
        ctx: &mut UnmarshallingContext,
    ) -> WeftResult<()> {
        let node = self.parsers.get(id);
        let Some(field) = node.as_field() else {
            return Ok(());
        };

        // An explicitly positioned field may sit ahead of the cursor.
        match (&field.descriptor, view) {
            (FieldDescriptor::Ordinal(p), View::Fields(_)) if *p > *cursor => *cursor = *p,
            (FieldDescriptor::Fixed { offset, .. }, View::Line(_)) if *offset > *cursor => {
                *cursor = *offset
            }
            _ => {}
        }

        if field.max_occurs == Occurs::Count(1) {
            let raw = extract(view, field, *cursor, 0);
            advance(view, field, cursor);
            if let Some(value) = self.parse_field(&node.name, field, raw, ctx) {
                if let Some(prop) = node.property {
                    ctx.set_slot(prop, value);
                }
            }
            return Ok(());
        }

        let n = self.occurrence_count(view, field, &node.name, *cursor, ctx);
        for i in 0..n {
            let raw = extract(view, field, *cursor, i);
            advance(view, field, cursor);
            if let Some(value) = self.parse_field(&node.name, field, raw, ctx) {
                if let Some(prop) = node.property {
                    ctx.push_slot(prop, value);
                }
            }
        }
        Ok(())
    }

    /// How many occurrences of a repeating field are present, bounded by the
    /// declared maximum and by the space later siblings still require.
    fn occurrence_count(
        &self,
        view: View<'_>,
        field: &FieldParser,
        name: &str,
        cursor: usize,
        ctx: &mut UnmarshallingContext,
    ) -> usize {
        let usable = match view {
            View::Fields(fields) => fields
                .len()
                .saturating_sub(cursor)
                .saturating_sub(field.tail_min),
            View::Line(chars) => {
                chars
                    .len()
                    .saturating_sub(cursor)
                    .saturating_sub(field.tail_min)
                    / field.descriptor.width().max(1)
            }
            // Name-addressed occurrences never compete with later siblings.
            View::Node(elem) => match &field.descriptor {
                FieldDescriptor::Named(n) => elem.count_named(n),
                _ => 0,
            },
        };
        let n = match field.max_occurs {
            Occurs::Count(max) => usable.min(max),
            Occurs::Unbounded => usable,
        };
        if n < field.min_occurs {
            ctx.push_error(
                WeftError::conversion(
                    format!(
                        "expected at least {} occurrences of field '{}'",
                        field.min_occurs, name
                    ),
                    ctx.line,
                )
                .with_field(name.to_string()),
            );
        }
        n
    }

    fn walk_segment(
        &self,
        id: ParserId,
        view: View<'_>,
        cursor: &mut usize,
        ctx: &mut UnmarshallingContext,
    ) -> WeftResult<()> {
        let node = self.parsers.get(id);
        let ParserKind::Segment(segment) = &node.kind else {
            return Ok(());
        };

        let n = match view {
            View::Node(elem) => {
                let present = elem.count_named(&node.name);
                let capped = match segment.max_occurs {
                    Occurs::Count(max) => present.min(max),
                    Occurs::Unbounded => present,
                };
                if capped < segment.min_occurs {
                    ctx.push_error(
                        WeftError::conversion(
                            format!(
                                "expected at least {} occurrences of segment '{}'",
                                segment.min_occurs, node.name
                            ),
                            ctx.line,
                        )
                        .with_field(node.name.clone()),
                    );
                }
                capped
            }
            View::Fields(fields) => self.flat_segment_count(
                segment,
                fields.len().saturating_sub(*cursor),
                &node.name,
                ctx,
            ),
            View::Line(chars) => self.flat_segment_count(
                segment,
                chars.len().saturating_sub(*cursor),
                &node.name,
                ctx,
            ),
        };

        for i in 0..n {
            match view {
                View::Node(elem) => {
                    let Some(child_elem) = elem.child_named(&node.name, i) else {
                        break;
                    };
                    let mut inner = 0usize;
                    self.walk(&node.children, View::Node(child_elem), &mut inner, ctx)?;
                }
                _ => {
                    self.walk(&node.children, view, cursor, ctx)?;
                }
            }
            self.materialize_segment(id, ctx)?;
        }
        Ok(())
    }

    fn flat_segment_count(
        &self,
        segment: &crate::parser::SegmentParser,
        available: usize,
        name: &str,
        ctx: &mut UnmarshallingContext,
    ) -> usize {
        if segment.max_occurs == Occurs::Count(1) {
            return 1;
        }
        let stride = segment.stride.max(1);
        let usable = available.saturating_sub(segment.tail_min) / stride;
        let n = match segment.max_occurs {
            Occurs::Count(max) => usable.min(max),
            Occurs::Unbounded => usable,
        };
        if n < segment.min_occurs {
            ctx.push_error(
                WeftError::conversion(
                    format!(
                        "expected at least {} occurrences of segment '{}'",
                        segment.min_occurs, name
                    ),
                    ctx.line,
                )
                .with_field(name.to_string()),
            );
        }
        n
    }

    /// Assemble one occurrence of a bound segment into its property slot.
    fn materialize_segment(
        &self,
        id: ParserId,
        ctx: &mut UnmarshallingContext,
    ) -> WeftResult<()> {
        let node = self.parsers.get(id);
        let Some(prop) = node.property else {
            return Ok(());
        };
        match &self.properties.get(prop).kind {
            PropertyKind::Complex { .. } => {
                if let Some(value) = self.build_aggregate(prop, ctx, false)? {
                    ctx.set_slot(prop, value);
                }
            }
            PropertyKind::Collection => {
                let element = self.properties.get(prop).children[0];
                if let Some(value) = self.materialize(element, ctx, false)? {
                    ctx.push_slot(prop, value);
                }
            }
            PropertyKind::Map { key: Some(key) } => {
                let element = self.properties.get(prop).children[0];
                if let Some(value) = self.materialize(element, ctx, false)? {
                    let entry_key = self
                        .map_entry_key(element, key, &value)
                        .unwrap_or_default();
                    ctx.entry_slot(prop, entry_key, value);
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// The key of a map-aggregated segment entry, read from the entry value.
    fn map_entry_key(&self, element: PropertyId, key: &str, value: &Value) -> Option<String> {
        let bean = value.as_bean()?;
        let member = self
            .properties
            .get(element)
            .children
            .iter()
            .find(|&&c| self.properties.get(c).name == key)
            .and_then(|&c| self.properties.get(c).accessor.as_ref())
            .map(|a| a.member().to_string())
            .unwrap_or_else(|| key.to_string());
        bean.get(&member).map(|v| v.to_string())
    }

    /// Produce the value of a property from its slot, building aggregates
    /// bottom-up. `force` builds an aggregate even when no member was set.
    pub(crate) fn materialize(
        &self,
        prop: PropertyId,
        ctx: &mut UnmarshallingContext,
        force: bool,
    ) -> WeftResult<Option<Value>> {
        if let Some(value) = ctx.take_slot(prop) {
            return Ok(Some(value));
        }
        match &self.properties.get(prop).kind {
            PropertyKind::Complex { .. } | PropertyKind::Map { key: None } => {
                self.build_aggregate(prop, ctx, force)
            }
            _ => Ok(None),
        }
    }

    /// Build a complex or keyed aggregate from its children's slots.
    fn build_aggregate(
        &self,
        prop: PropertyId,
        ctx: &mut UnmarshallingContext,
        force: bool,
    ) -> WeftResult<Option<Value>> {
        let node = self.properties.get(prop);
        let children = node.children.clone();

        match &node.kind {
            PropertyKind::Map { key: None } => {
                let mut entries = std::collections::BTreeMap::new();
                for &child in &children {
                    if let Some(value) = self.materialize(child, ctx, false)? {
                        entries.insert(self.properties.get(child).name.clone(), value);
                    }
                }
                if entries.is_empty() && !force {
                    return Ok(None);
                }
                Ok(Some(Value::Map(entries)))
            }
            PropertyKind::Complex { class, constructor } => {
                let class = class.clone();
                let constructor = constructor.clone();
                let mut gathered: Vec<(PropertyId, Option<Value>)> = Vec::new();
                let mut any = false;
                for &child in &children {
                    let value = self.materialize(child, ctx, false)?;
                    any |= value.is_some();
                    gathered.push((child, value));
                }
                if !any && !force {
                    return Ok(None);
                }

                let mut bean = Bean::new(class.clone());
                if let Some(selected) = &constructor {
                    // Neutral defaults for parameters left unmatched.
                    for member in &selected.param_members {
                        bean.set(member.clone(), Value::Null);
                    }
                }
                for (child, value) in gathered {
                    let child_node = self.properties.get(child);
                    let Some(accessor) = &child_node.accessor else {
                        continue;
                    };
                    let Some(value) = value else { continue };
                    if accessor.ctor_arg.is_some() {
                        bean.set(accessor.member().to_string(), value);
                    } else {
                        accessor.set(&mut bean, value);
                    }
                }
                Ok(Some(Value::Bean(bean)))
            }
            _ => Ok(None),
        }
    }

    // ==== field text processing ====

    /// Trim, default, validate, and convert one field occurrence. Failures
    /// are recorded in the context; the walk continues.
    fn parse_field(
        &self,
        name: &str,
        field: &FieldParser,
        raw: Option<String>,
        ctx: &mut UnmarshallingContext,
    ) -> Option<Value> {
        let text = raw.map(|t| {
            if field.trim {
                t.trim().to_string()
            } else {
                t
            }
        });
        let present = text.as_deref().map(|t| !t.is_empty()).unwrap_or(false);

        if !present {
            if let Some(default) = &field.default_value {
                return self.convert(name, field, default, ctx);
            }
            if field.required {
                ctx.push_error(
                    WeftError::conversion(
                        format!("required field '{}' is missing", name),
                        ctx.line,
                    )
                    .with_field(name.to_string()),
                );
            }
            return None;
        }

        let text = text.unwrap_or_default();
        if let Some(literal) = &field.literal {
            if text != *literal {
                ctx.push_error(
                    WeftError::conversion(
                        format!(
                            "unexpected value '{}' for field '{}': expected '{}'",
                            text, name, literal
                        ),
                        ctx.line,
                    )
                    .with_field(name.to_string()),
                );
                return None;
            }
        }
        let length = text.chars().count();
        if let Some(min) = field.min_length {
            if length < min {
                ctx.push_error(
                    WeftError::conversion(
                        format!("field '{}' is shorter than {} characters", name, min),
                        ctx.line,
                    )
                    .with_field(name.to_string()),
                );
                return None;
            }
        }
        if let Some(max) = field.max_length {
            if length > max {
                ctx.push_error(
                    WeftError::conversion(
                        format!("field '{}' is longer than {} characters", name, max),
                        ctx.line,
                    )
                    .with_field(name.to_string()),
                );
                return None;
            }
        }
        if let Some(regex) = &field.regex {
            if !regex.is_match(&text) {
                ctx.push_error(
                    WeftError::conversion(
                        format!("field '{}' does not match its pattern", name),
                        ctx.line,
                    )
                    .with_field(name.to_string()),
                );
                return None;
            }
        }
        self.convert(name, field, &text, ctx)
    }

    fn convert(
        &self,
        name: &str,
        field: &FieldParser,
        text: &str,
        ctx: &mut UnmarshallingContext,
    ) -> Option<Value> {
        match field.handler.parse(text) {
            Ok(value) => Some(value),
            Err(mut error) => {
                error.line = ctx.line;
                error.field = Some(name.to_string());
                error.message = format!("invalid '{}': {}", text, error.message);
                ctx.push_error(error);
                None
            }
        }
    }
}

/// Extract identifier text at a field's static position.
fn identifier_text(field: &FieldParser, token: &RecordToken) -> Option<String> {
    match (token, &field.descriptor) {
        (RecordToken::Fields(fields), FieldDescriptor::Ordinal(p)) => fields.get(*p).cloned(),
        (
            RecordToken::Line(line),
            FieldDescriptor::Fixed {
                offset,
                length,
                pad,
                justify,
            },
        ) => {
            let chars: Vec<char> = line.chars().collect();
            extract_span(&chars, *offset, *length, *pad, *justify)
        }
        (RecordToken::Node(elem), FieldDescriptor::Named(name)) => elem
            .child_named(name, 0)
            .map(|c| c.text_or_empty().to_string()),
        _ => None,
    }
}

/// Extract one field occurrence from the view at the cursor.
fn extract(view: View<'_>, field: &FieldParser, cursor: usize, occurrence: usize) -> Option<String> {
    match (view, &field.descriptor) {
        (View::Fields(fields), _) => fields.get(cursor).cloned(),
        (
            View::Line(chars),
            FieldDescriptor::Fixed {
                length,
                pad,
                justify,
                ..
            },
        ) => extract_span(chars, cursor, *length, *pad, *justify),
        (View::Node(elem), FieldDescriptor::Named(name)) => elem
            .child_named(name, occurrence)
            .map(|c| c.text_or_empty().to_string()),
        _ => None,
    }
}

fn advance(view: View<'_>, field: &FieldParser, cursor: &mut usize) {
    match view {
        View::Fields(_) => *cursor += 1,
        View::Line(_) => *cursor += field.descriptor.width(),
        View::Node(_) => {}
    }
}

/// Slice a fixed-length span and strip its padding.
fn extract_span(
    chars: &[char],
    offset: usize,
    length: usize,
    pad: char,
    justify: Justify,
) -> Option<String> {
    if offset >= chars.len() {
        return None;
    }
    let end = (offset + length).min(chars.len());
    let span: String = chars[offset..end].iter().collect();
    let stripped = match justify {
        Justify::Left => span.trim_end_matches(pad),
        Justify::Right => span.trim_start_matches(pad),
    };
    Some(stripped.to_string())
}
