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

//! First compile pass: validate, default, and position the configuration.
//!
//! After this pass every field carries its resolved trim flag and, where the
//! layout is determinate, its assigned position or offset. Structural
//! violations (bad occurrence bounds, unresolvable handlers, ambiguous
//! record identifiers, inheritance cycles) are configuration errors.

use crate::config::{
    Aggregation, ComponentConfig, FieldConfig, GroupConfig, Occurs, RecordConfig, SegmentConfig,
    StreamConfig, StreamFormat,
};
use crate::error::{WeftError, WeftResult};
use crate::schema::ClassRegistry;
use crate::types::TypeHandlerRegistry;
use regex::Regex;
use std::collections::HashSet;

/// Run the first pass over a stream configuration.
pub fn preprocess(
    config: &mut StreamConfig,
    classes: &ClassRegistry,
    handlers: &TypeHandlerRegistry,
) -> WeftResult<()> {
    classes.validate()?;
    validate_group_children(&config.name, &config.children)?;
    validate_sibling_records(&config.children)?;

    let format = config.format;
    let trim = config.trim;
    for child in &mut config.children {
        preprocess_component(child, format, trim, handlers)?;
    }
    Ok(())
}

fn preprocess_component(
    component: &mut ComponentConfig,
    format: StreamFormat,
    trim: bool,
    handlers: &TypeHandlerRegistry,
) -> WeftResult<()> {
    match component {
        ComponentConfig::Group(group) => preprocess_group(group, format, trim, handlers),
        ComponentConfig::Record(record) => preprocess_record(record, format, trim, handlers),
        ComponentConfig::Segment(s) => Err(WeftError::config(format!(
            "segment '{}' must be declared inside a record",
            s.name
        ))),
        ComponentConfig::Field(f) => Err(WeftError::config(format!(
            "field '{}' must be declared inside a record",
            f.name
        ))),
    }
}

fn preprocess_group(
    group: &mut GroupConfig,
    format: StreamFormat,
    trim: bool,
    handlers: &TypeHandlerRegistry,
) -> WeftResult<()> {
    validate_occurs(&group.name, group.min_occurs, group.max_occurs)?;
    validate_group_children(&group.name, &group.children)?;
    validate_sibling_records(&group.children)?;
    for child in &mut group.children {
        preprocess_component(child, format, trim, handlers)?;
    }
    Ok(())
}

fn preprocess_record(
    record: &mut RecordConfig,
    format: StreamFormat,
    trim: bool,
    handlers: &TypeHandlerRegistry,
) -> WeftResult<()> {
    validate_occurs(&record.name, record.min_occurs, record.max_occurs)?;
    if record.children.is_empty() {
        return Err(WeftError::config(format!(
            "record '{}' declares no fields",
            record.name
        )));
    }

    match format {
        StreamFormat::Delimited | StreamFormat::Csv => {
            let mut running = Some(1usize);
            layout_delimited(&record.name, &mut record.children, &mut running)?;
        }
        StreamFormat::FixedLength => {
            let mut running = Some(0usize);
            layout_fixed(&record.name, &mut record.children, &mut running)?;
        }
        StreamFormat::Xml => {
            validate_unique_names(&record.name, &record.children)?;
        }
    }

    finish_fields(&record.name, &mut record.children, format, trim, handlers)?;
    Ok(())
}

/// Assign 1-based ordinals to delimited fields. Returns the token width of
/// one occurrence of `children`, or None when a descendant is unbounded.
fn layout_delimited(
    record: &str,
    children: &mut [ComponentConfig],
    running: &mut Option<usize>,
) -> WeftResult<Option<usize>> {
    let mut total: Option<usize> = Some(0);
    for child in children {
        match child {
            ComponentConfig::Field(field) => {
                validate_occurs(&field.name, field.min_occurs, field.max_occurs)?;
                let assigned = place(record, &field.name, field.position, running)?;
                field.position = assigned;
                advance(running, assigned, anchored_width(field.min_occurs, field.max_occurs, 1));
                total = add_width(total, field.max_occurs.as_count());
            }
            ComponentConfig::Segment(segment) => {
                validate_occurs(&segment.name, segment.min_occurs, segment.max_occurs)?;
                let one = layout_delimited(record, &mut segment.children, running)?;
                let repeating = segment.max_occurs != Occurs::Count(1);
                if repeating && one.is_none() {
                    return Err(WeftError::config(format!(
                        "repeating segment '{}' in record '{}' contains an unbounded field",
                        segment.name, record
                    )));
                }
                let width = match (one, segment.max_occurs.as_count()) {
                    (Some(w), Some(m)) => {
                        // The recursion consumed one occurrence; later
                        // positions stay anchored only for exact counts.
                        if m == segment.min_occurs {
                            if let Some(r) = running.as_mut() {
                                *r += w * (m - 1);
                            }
                        } else {
                            *running = None;
                        }
                        Some(w * m)
                    }
                    _ => {
                        *running = None;
                        None
                    }
                };
                total = add_width(total, width);
            }
            other => {
                return Err(WeftError::config(format!(
                    "'{}' is not allowed inside record '{}'",
                    other.name(),
                    record
                )));
            }
        }
    }
    Ok(total)
}

/// Assign character offsets to fixed-length fields. Returns the character
/// width of one occurrence of `children`.
fn layout_fixed(
    record: &str,
    children: &mut [ComponentConfig],
    running: &mut Option<usize>,
) -> WeftResult<Option<usize>> {
    let mut total: Option<usize> = Some(0);
    for child in children {
        match child {
            ComponentConfig::Field(field) => {
                validate_occurs(&field.name, field.min_occurs, field.max_occurs)?;
                let length = field.length.ok_or_else(|| {
                    WeftError::config(format!(
                        "fixed-length field '{}' in record '{}' requires a length",
                        field.name, record
                    ))
                })?;
                let assigned = place(record, &field.name, field.offset, running)?;
                field.offset = assigned;
                advance(
                    running,
                    assigned,
                    anchored_width(field.min_occurs, field.max_occurs, length),
                );
                total = add_width(total, field.max_occurs.as_count().map(|m| m * length));
            }
            ComponentConfig::Segment(segment) => {
                validate_occurs(&segment.name, segment.min_occurs, segment.max_occurs)?;
                let one = layout_fixed(record, &mut segment.children, running)?;
                let repeating = segment.max_occurs != Occurs::Count(1);
                if repeating && one.is_none() {
                    return Err(WeftError::config(format!(
                        "repeating segment '{}' in record '{}' contains an unbounded field",
                        segment.name, record
                    )));
                }
                let width = match (one, segment.max_occurs.as_count()) {
                    (Some(w), Some(m)) => {
                        if m == segment.min_occurs {
                            if let Some(r) = running.as_mut() {
                                *r += w * (m - 1);
                            }
                        } else {
                            *running = None;
                        }
                        Some(w * m)
                    }
                    _ => {
                        *running = None;
                        None
                    }
                };
                total = add_width(total, width);
            }
            other => {
                return Err(WeftError::config(format!(
                    "'{}' is not allowed inside record '{}'",
                    other.name(),
                    record
                )));
            }
        }
    }
    Ok(total)
}

/// Place one field at its explicit or assigned position.
fn place(
    record: &str,
    field: &str,
    explicit: Option<usize>,
    running: &Option<usize>,
) -> WeftResult<Option<usize>> {
    match (explicit, running) {
        (Some(pos), Some(next)) => {
            if pos < *next {
                return Err(WeftError::config(format!(
                    "position {} of field '{}' in record '{}' is already used",
                    pos, field, record
                )));
            }
            Ok(Some(pos))
        }
        (Some(pos), None) => Ok(Some(pos)),
        (None, Some(next)) => Ok(Some(*next)),
        // After an unbounded field the layout is indeterminate; positions
        // resolve at runtime from the consumption cursor.
        (None, None) => Ok(None),
    }
}

fn advance(running: &mut Option<usize>, position: Option<usize>, width: Option<usize>) {
    *running = match (position, width) {
        (Some(p), Some(w)) => Some(p + w),
        _ => None,
    };
}

/// Cursor units a field consumes when its occurrence count is exact.
/// Variable-occurrence fields un-anchor everything that follows.
fn anchored_width(min: usize, max: Occurs, unit: usize) -> Option<usize> {
    match max {
        Occurs::Count(m) if m == min => Some(m * unit),
        _ => None,
    }
}

fn add_width(total: Option<usize>, width: Option<usize>) -> Option<usize> {
    match (total, width) {
        (Some(t), Some(w)) => Some(t + w),
        _ => None,
    }
}

/// Field-level defaulting and validation shared by all formats.
fn finish_fields(
    record: &str,
    children: &mut [ComponentConfig],
    format: StreamFormat,
    trim: bool,
    handlers: &TypeHandlerRegistry,
) -> WeftResult<()> {
    for child in children {
        match child {
            ComponentConfig::Field(field) => {
                finish_field(record, field, format, trim, handlers)?;
            }
            ComponentConfig::Segment(segment) => {
                validate_segment(record, segment)?;
                finish_fields(record, &mut segment.children, format, trim, handlers)?;
            }
            _ => {}
        }
    }
    Ok(())
}

fn finish_field(
    record: &str,
    field: &mut FieldConfig,
    format: StreamFormat,
    trim: bool,
    handlers: &TypeHandlerRegistry,
) -> WeftResult<()> {
    if field.trim.is_none() {
        field.trim = Some(trim);
    }
    if let (Some(min), Some(max)) = (field.min_length, field.max_length) {
        if min > max {
            return Err(WeftError::config(format!(
                "min_length exceeds max_length on field '{}' in record '{}'",
                field.name, record
            )));
        }
    }
    if let Some(pattern) = &field.regex {
        Regex::new(pattern).map_err(|e| {
            WeftError::config(format!(
                "invalid pattern on field '{}' in record '{}': {}",
                field.name, record, e
            ))
        })?;
    }
    if field.is_identifier {
        let determinate = match format {
            StreamFormat::Delimited | StreamFormat::Csv => field.position.is_some(),
            StreamFormat::FixedLength => field.offset.is_some(),
            StreamFormat::Xml => true,
        };
        if !determinate {
            return Err(WeftError::config(format!(
                "identifier field '{}' in record '{}' follows a variable-occurrence field",
                field.name, record
            )));
        }
    }
    let type_name = field.type_name.as_deref().unwrap_or("string");
    if handlers
        .lookup(type_name, Some(format), field.handler_name.as_deref())
        .is_none()
    {
        return Err(WeftError::config(format!(
            "no type handler for type '{}' on field '{}' in record '{}'",
            type_name, field.name, record
        )));
    }
    Ok(())
}

fn validate_segment(record: &str, segment: &SegmentConfig) -> WeftResult<()> {
    if segment.children.is_empty() {
        return Err(WeftError::config(format!(
            "segment '{}' in record '{}' declares no children",
            segment.name, record
        )));
    }
    match &segment.aggregation {
        Aggregation::Single => Ok(()),
        Aggregation::List | Aggregation::Map { .. } if segment.bean.is_none() => {
            Err(WeftError::config(format!(
                "aggregated segment '{}' in record '{}' requires a bean binding",
                segment.name, record
            )))
        }
        Aggregation::Map { key } => {
            let found = segment.children.iter().any(|c| match c {
                ComponentConfig::Field(f) => &f.name == key,
                _ => false,
            });
            if !found {
                return Err(WeftError::config(format!(
                    "map segment '{}' in record '{}' names unknown key field '{}'",
                    segment.name, record, key
                )));
            }
            Ok(())
        }
        Aggregation::List => Ok(()),
    }
}

fn validate_occurs(name: &str, min: usize, max: Occurs) -> WeftResult<()> {
    match max {
        Occurs::Count(0) => Err(WeftError::config(format!(
            "'{}' declares max_occurs of zero",
            name
        ))),
        Occurs::Count(m) if m < min => Err(WeftError::config(format!(
            "'{}' declares min_occurs {} above max_occurs {}",
            name, min, m
        ))),
        _ => Ok(()),
    }
}

/// Streams and groups contain only records and groups.
fn validate_group_children(owner: &str, children: &[ComponentConfig]) -> WeftResult<()> {
    for child in children {
        if matches!(
            child,
            ComponentConfig::Field(_) | ComponentConfig::Segment(_)
        ) {
            return Err(WeftError::config(format!(
                "'{}' is not allowed directly under '{}'; wrap it in a record",
                child.name(),
                owner
            )));
        }
    }
    Ok(())
}

/// Sibling records must be distinguishable: with more than one record in a
/// scope every record needs an identifier, and two literal identifier
/// signatures may not collide.
fn validate_sibling_records(children: &[ComponentConfig]) -> WeftResult<()> {
    let records: Vec<&RecordConfig> = children
        .iter()
        .filter_map(|c| match c {
            ComponentConfig::Record(r) => Some(r),
            _ => None,
        })
        .collect();
    if records.len() < 2 {
        return Ok(());
    }

    let mut signatures: Vec<(String, Vec<(String, String)>)> = Vec::new();
    for record in &records {
        let mut identifiers = Vec::new();
        collect_identifier_literals(&record.children, &mut identifiers);
        if identifiers.is_empty() && !has_any_identifier(&record.children) {
            return Err(WeftError::config(format!(
                "record '{}' has no identifier and cannot be distinguished from its siblings",
                record.name
            )));
        }
        identifiers.sort();
        if !identifiers.is_empty() {
            if let Some((other, _)) = signatures
                .iter()
                .find(|(_, sig)| !sig.is_empty() && *sig == identifiers)
            {
                return Err(WeftError::config(format!(
                    "records '{}' and '{}' declare identical record identifiers",
                    other, record.name
                )));
            }
        }
        signatures.push((record.name.clone(), identifiers));
    }
    Ok(())
}

fn collect_identifier_literals(
    children: &[ComponentConfig],
    out: &mut Vec<(String, String)>,
) {
    for child in children {
        match child {
            ComponentConfig::Field(f) => {
                if f.is_identifier {
                    if let Some(literal) = &f.literal {
                        out.push((f.name.clone(), literal.clone()));
                    }
                }
            }
            ComponentConfig::Segment(s) => collect_identifier_literals(&s.children, out),
            _ => {}
        }
    }
}

fn has_any_identifier(children: &[ComponentConfig]) -> bool {
    children.iter().any(|child| match child {
        ComponentConfig::Field(f) => f.is_identifier,
        ComponentConfig::Segment(s) => has_any_identifier(&s.children),
        _ => false,
    })
}

/// Duplicate field and segment names are ambiguous for name-addressed
/// formats.
fn validate_unique_names(record: &str, children: &[ComponentConfig]) -> WeftResult<()> {
    let mut seen = HashSet::new();
    for child in children {
        let name = child.name();
        if !seen.insert(name.to_string()) {
            return Err(WeftError::config(format!(
                "duplicate name '{}' in record '{}'",
                name, record
            )));
        }
        if let ComponentConfig::Segment(s) = child {
            validate_unique_names(&s.name, &s.children)?;
        }
    }
    Ok(())
}
