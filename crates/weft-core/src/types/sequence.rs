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

//! Sequence handler synthesized for `list<T>` type names.

use super::TypeHandler;
use crate::error::{WeftError, WeftResult};
use crate::schema::TypeRef;
use crate::value::Value;
use std::sync::Arc;

/// Delegates to an element handler, splitting and joining on a delimiter.
///
/// The escape character escapes only the delimiter and itself; any other
/// escaped character is kept verbatim, escape included.
#[derive(Debug, Clone)]
pub struct SequenceHandler {
    element: Arc<dyn TypeHandler>,
    delimiter: char,
    escape: char,
}

impl SequenceHandler {
    pub fn new(element: Arc<dyn TypeHandler>, delimiter: char, escape: char) -> Self {
        Self {
            element,
            delimiter,
            escape,
        }
    }

    /// Split `text` on the delimiter, honoring the escape character.
    fn split(&self, text: &str) -> Vec<String> {
        let mut pieces = Vec::new();
        let mut current = String::new();
        let mut chars = text.chars();
        while let Some(c) = chars.next() {
            if c == self.escape {
                match chars.next() {
                    Some(next) if next == self.delimiter || next == self.escape => {
                        current.push(next);
                    }
                    Some(next) => {
                        current.push(c);
                        current.push(next);
                    }
                    None => current.push(c),
                }
            } else if c == self.delimiter {
                pieces.push(std::mem::take(&mut current));
            } else {
                current.push(c);
            }
        }
        pieces.push(current);
        pieces
    }

    /// Escape the delimiter and escape character in one element.
    fn escape_text(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for c in text.chars() {
            if c == self.delimiter || c == self.escape {
                out.push(self.escape);
            }
            out.push(c);
        }
        out
    }
}

impl TypeHandler for SequenceHandler {
    fn parse(&self, text: &str) -> WeftResult<Value> {
        if text.is_empty() {
            return Ok(Value::Null);
        }
        let mut items = Vec::new();
        for piece in self.split(text) {
            items.push(self.element.parse(&piece)?);
        }
        Ok(Value::List(items))
    }

    fn format(&self, value: &Value) -> WeftResult<Option<String>> {
        match value {
            Value::Null => Ok(None),
            Value::List(items) => {
                let mut pieces = Vec::with_capacity(items.len());
                for item in items {
                    let text = self.element.format(item)?.unwrap_or_default();
                    pieces.push(self.escape_text(&text));
                }
                Ok(Some(pieces.join(&self.delimiter.to_string())))
            }
            other => Err(WeftError::conversion(
                format!("expected a sequence value, got '{}'", other),
                0,
            )),
        }
    }

    fn target_type(&self) -> TypeRef {
        TypeRef::List
    }
}
