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

//! Type handlers: text ↔ value conversion for scalar fields.
//!
//! Handlers are resolved through a registry keyed by `(type name, stream
//! format, handler name)`, most specific key first. Sequence handlers for
//! `list<T>` type names are synthesized on demand by delegating to the
//! element handler and cached for reuse.

mod datetime;
mod escape;
mod primitives;
mod sequence;

pub use datetime::{XmlDateHandler, XmlDateTimeHandler, XmlTimeHandler};
pub use escape::{EscapedCharHandler, EscapedStringHandler};
pub use primitives::{
    BoolHandler, BoolIntHandler, CharHandler, FloatHandler, IntHandler, StringHandler,
};
pub use sequence::SequenceHandler;

use crate::config::StreamFormat;
use crate::error::WeftResult;
use crate::schema::TypeRef;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Converts between field text and dynamic values.
pub trait TypeHandler: Send + Sync + std::fmt::Debug {
    /// Parse field text into a value. Empty text parses to null; malformed
    /// text is a conversion error.
    fn parse(&self, text: &str) -> WeftResult<crate::value::Value>;

    /// Format a value as field text. `None` means the field is absent.
    fn format(&self, value: &crate::value::Value) -> WeftResult<Option<String>>;

    /// The type this handler produces.
    fn target_type(&self) -> TypeRef;

    /// Apply configuration properties (pattern, lenient, zone flags).
    fn configure(&mut self, properties: &BTreeMap<String, String>) -> WeftResult<()> {
        let _ = properties;
        Ok(())
    }
}

/// Registry lookup key. `format` and `name` generalize from most to least
/// specific during resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct HandlerKey {
    type_name: String,
    format: Option<StreamFormat>,
    name: Option<String>,
}

/// Key for the synthesized sequence-handler cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SequenceKey {
    element: String,
    format: Option<StreamFormat>,
    name: Option<String>,
}

/// Resolves `(type name, format, name)` to a type handler.
///
/// Registration happens before compilation; afterwards the registry is
/// read-only and safe to share across readers. The sequence cache tolerates
/// concurrent lookups with idempotent insertion.
#[derive(Debug, Default)]
pub struct TypeHandlerRegistry {
    index: HashMap<HandlerKey, Arc<dyn TypeHandler>>,
    sequence_cache: RwLock<HashMap<SequenceKey, Arc<dyn TypeHandler>>>,
}

impl TypeHandlerRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry preloaded with the built-in handlers.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("string", Arc::new(StringHandler));
        registry.register("char", Arc::new(CharHandler));
        registry.register("character", Arc::new(CharHandler));
        for name in ["int", "integer", "long"] {
            registry.register(name, Arc::new(IntHandler));
        }
        for name in ["float", "double"] {
            registry.register(name, Arc::new(FloatHandler));
        }
        for name in ["bool", "boolean"] {
            registry.register(name, Arc::new(BoolHandler));
        }
        registry.register("date", Arc::new(XmlDateHandler::new()));
        registry.register("time", Arc::new(XmlTimeHandler::new()));
        registry.register("datetime", Arc::new(XmlDateTimeHandler::new()));
        registry
    }

    /// Register a handler for a type name across all formats.
    pub fn register(&mut self, type_name: impl Into<String>, handler: Arc<dyn TypeHandler>) {
        self.index.insert(
            HandlerKey {
                type_name: type_name.into(),
                format: None,
                name: None,
            },
            handler,
        );
    }

    /// Register a handler for a type name under one stream format.
    pub fn register_for_format(
        &mut self,
        type_name: impl Into<String>,
        format: StreamFormat,
        handler: Arc<dyn TypeHandler>,
    ) {
        self.index.insert(
            HandlerKey {
                type_name: type_name.into(),
                format: Some(format),
                name: None,
            },
            handler,
        );
    }

    /// Register a named handler, selected by `handler_name` in field
    /// configuration.
    pub fn register_named(
        &mut self,
        type_name: impl Into<String>,
        name: impl Into<String>,
        handler: Arc<dyn TypeHandler>,
    ) {
        self.index.insert(
            HandlerKey {
                type_name: type_name.into(),
                format: None,
                name: Some(name.into()),
            },
            handler,
        );
    }

    /// Register a handler under a fully qualified key.
    pub fn register_key(
        &mut self,
        type_name: impl Into<String>,
        format: Option<StreamFormat>,
        name: Option<String>,
        handler: Arc<dyn TypeHandler>,
    ) {
        self.index.insert(
            HandlerKey {
                type_name: type_name.into(),
                format,
                name,
            },
            handler,
        );
    }

    /// Resolve a handler, most specific key first: `(type, format, name)`,
    /// `(type, format)`, `(type, name)`, `(type)`.
    ///
    /// A `list<T>` type name resolves to a synthesized sequence handler
    /// delegating to the handler for `T`.
    pub fn lookup(
        &self,
        type_name: &str,
        format: Option<StreamFormat>,
        name: Option<&str>,
    ) -> Option<Arc<dyn TypeHandler>> {
        if let Some(element) = type_name
            .strip_prefix("list<")
            .and_then(|rest| rest.strip_suffix('>'))
        {
            return self.lookup_sequence(element, format, name);
        }

        let keys = [
            HandlerKey {
                type_name: type_name.to_string(),
                format,
                name: name.map(str::to_string),
            },
            HandlerKey {
                type_name: type_name.to_string(),
                format,
                name: None,
            },
            HandlerKey {
                type_name: type_name.to_string(),
                format: None,
                name: name.map(str::to_string),
            },
            HandlerKey {
                type_name: type_name.to_string(),
                format: None,
                name: None,
            },
        ];
        keys.iter().find_map(|k| self.index.get(k).cloned())
    }

    /// Synthesize (or fetch) a sequence handler for `list<element>`.
    ///
    /// Insertion is idempotent under concurrent lookups: a racing insert
    /// keeps the first handler stored.
    fn lookup_sequence(
        &self,
        element: &str,
        format: Option<StreamFormat>,
        name: Option<&str>,
    ) -> Option<Arc<dyn TypeHandler>> {
        let key = SequenceKey {
            element: element.to_string(),
            format,
            name: name.map(str::to_string),
        };
        if let Some(handler) = self.sequence_cache.read().get(&key) {
            return Some(handler.clone());
        }
        let element_handler = self.lookup(element, format, name)?;
        let delimiter = sequence_delimiter(format);
        let handler: Arc<dyn TypeHandler> =
            Arc::new(SequenceHandler::new(element_handler, delimiter, '\\'));
        let mut cache = self.sequence_cache.write();
        Some(cache.entry(key).or_insert(handler).clone())
    }
}

/// Per-format delimiter for synthesized sequence handlers. XML uses the
/// schema list separator; text formats use a comma.
fn sequence_delimiter(format: Option<StreamFormat>) -> char {
    match format {
        Some(StreamFormat::Xml) => ' ',
        _ => ',',
    }
}
