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

//! Fluent construction of compiled streams.

use std::sync::Arc;
use weft_core::types::TypeHandler;
use weft_core::{
    ClassDef, ClassRegistry, GroupConfig, GroupOrder, RecordConfig, Stream, StreamConfig,
    StreamFormat, StreamMode, TypeHandlerRegistry, UnidentifiedPolicy, WeftResult,
};

/// Assembles a stream configuration, class registry, and type handler
/// registry, then compiles them into a shareable [`Stream`].
///
/// ```no_run
/// use weft::{ClassDef, FieldConfig, RecordConfig, StreamBuilder, StreamFormat, TypeRef};
///
/// let stream = StreamBuilder::new("people", StreamFormat::Csv)
///     .class(ClassDef::new("Person").property("name", TypeRef::String))
///     .record(
///         RecordConfig::new("person")
///             .bound_to("Person")
///             .child(FieldConfig::new("name")),
///     )
///     .build()
///     .unwrap();
/// ```
pub struct StreamBuilder {
    config: StreamConfig,
    classes: Vec<ClassDef>,
    handlers: TypeHandlerRegistry,
}

impl StreamBuilder {
    /// Start a stream layout with default options.
    pub fn new(name: impl Into<String>, format: StreamFormat) -> Self {
        Self {
            config: StreamConfig::new(name, format),
            classes: Vec::new(),
            handlers: TypeHandlerRegistry::with_defaults(),
        }
    }

    /// Compile for reading, writing, or both.
    pub fn mode(mut self, mode: StreamMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Let top-level records appear in any order.
    pub fn unordered(mut self) -> Self {
        self.config.order = GroupOrder::Unordered;
        self
    }

    /// Trim whitespace from field text by default.
    pub fn trim(mut self) -> Self {
        self.config.trim = true;
        self
    }

    /// Decode escape sequences in string and character fields.
    pub fn escape_strings(mut self, null_escape: bool) -> Self {
        self.config.escape_strings = true;
        self.config.null_escape = null_escape;
        self
    }

    /// Policy for records no definition matches.
    pub fn on_unidentified(mut self, policy: UnidentifiedPolicy) -> Self {
        self.config.on_unidentified = policy;
        self
    }

    /// Resolve protected members during accessor resolution.
    pub fn allow_protected_access(mut self) -> Self {
        self.config.allow_protected_access = true;
        self
    }

    /// Register a target class.
    pub fn class(mut self, def: ClassDef) -> Self {
        self.classes.push(def);
        self
    }

    /// Register a type handler for a type name.
    pub fn type_handler(
        mut self,
        type_name: impl Into<String>,
        handler: Arc<dyn TypeHandler>,
    ) -> Self {
        self.handlers.register(type_name, handler);
        self
    }

    /// Register a named type handler, selected per field via
    /// `handler_name`.
    pub fn named_type_handler(
        mut self,
        type_name: impl Into<String>,
        name: impl Into<String>,
        handler: Arc<dyn TypeHandler>,
    ) -> Self {
        self.handlers.register_named(type_name, name, handler);
        self
    }

    /// Add a top-level record.
    pub fn record(mut self, record: RecordConfig) -> Self {
        self.config.children.push(record.into());
        self
    }

    /// Add a top-level group.
    pub fn group(mut self, group: GroupConfig) -> Self {
        self.config.children.push(group.into());
        self
    }

    /// Compile the layout.
    pub fn build(self) -> WeftResult<Arc<Stream>> {
        let mut registry = ClassRegistry::new();
        for class in self.classes {
            registry.register(class)?;
        }
        let stream = Stream::compile(self.config, Arc::new(registry), &self.handlers)?;
        Ok(Arc::new(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::{FieldConfig, TypeRef};

    #[test]
    fn test_build_simple_stream() {
        let stream = StreamBuilder::new("s", StreamFormat::Delimited)
            .class(ClassDef::new("Thing").property("id", TypeRef::Int))
            .record(
                RecordConfig::new("thing")
                    .bound_to("Thing")
                    .child(FieldConfig::new("id").typed("int")),
            )
            .build()
            .unwrap();
        assert_eq!(stream.name(), "s");
        assert!(stream.record("thing").is_some());
    }

    #[test]
    fn test_build_duplicate_class_fails() {
        let err = StreamBuilder::new("s", StreamFormat::Delimited)
            .class(ClassDef::new("X"))
            .class(ClassDef::new("X"))
            .record(RecordConfig::new("r").child(FieldConfig::new("a")))
            .build()
            .unwrap_err();
        assert!(err.message.contains("already registered"));
    }

    #[test]
    fn test_build_mode_and_order() {
        let stream = StreamBuilder::new("s", StreamFormat::Csv)
            .mode(StreamMode::Read)
            .unordered()
            .record(RecordConfig::new("r").child(FieldConfig::new("a")))
            .build()
            .unwrap();
        assert_eq!(stream.mode(), StreamMode::Read);
    }
}
