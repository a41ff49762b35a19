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

//! Registered aggregate shapes: classes, members, and constructors.
//!
//! Target aggregates are declared up front instead of being discovered by
//! runtime reflection. A [`ClassDef`] names its members, backing fields, and
//! constructors; the [`ClassRegistry`] indexes definitions by name and walks
//! single-inheritance chains during lookup.

use crate::error::{WeftError, WeftResult};
use crate::value::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// A reference to a value type, used for member and parameter declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TypeRef {
    /// Accepts any value.
    Any,
    /// Boolean.
    Bool,
    /// 64-bit integer.
    Int,
    /// 64-bit float. Accepts integers by widening.
    Float,
    /// String.
    String,
    /// Date/time.
    DateTime,
    /// Ordered sequence.
    List,
    /// Keyed mapping.
    Map,
    /// A registered class (or any of its subclasses).
    Class(String),
}

impl TypeRef {
    /// Value types disqualify a constructor when left unmatched; reference
    /// types merely penalize it.
    pub fn is_value_type(&self) -> bool {
        matches!(self, Self::Bool | Self::Int | Self::Float | Self::DateTime)
    }

    /// Resolve a configured type name to a type reference.
    ///
    /// Unknown names resolve to `Class(name)` so user-registered classes can
    /// be named directly in field configuration.
    pub fn from_name(name: &str) -> Self {
        match name {
            "any" => Self::Any,
            "bool" | "boolean" => Self::Bool,
            "int" | "integer" | "long" => Self::Int,
            "float" | "double" => Self::Float,
            "string" | "char" | "character" => Self::String,
            "date" | "time" | "datetime" => Self::DateTime,
            "list" => Self::List,
            "map" => Self::Map,
            other => Self::Class(other.to_string()),
        }
    }

    /// The runtime type tag of a value.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Any,
            Value::Bool(_) => Self::Bool,
            Value::Int(_) => Self::Int,
            Value::Float(_) => Self::Float,
            Value::String(_) => Self::String,
            Value::DateTime(_) => Self::DateTime,
            Value::List(_) => Self::List,
            Value::Map(_) => Self::Map,
            Value::Bean(b) => Self::Class(b.class.clone()),
        }
    }
}

impl std::fmt::Display for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Any => write!(f, "any"),
            Self::Bool => write!(f, "bool"),
            Self::Int => write!(f, "int"),
            Self::Float => write!(f, "float"),
            Self::String => write!(f, "string"),
            Self::DateTime => write!(f, "datetime"),
            Self::List => write!(f, "list"),
            Self::Map => write!(f, "map"),
            Self::Class(name) => write!(f, "{}", name),
        }
    }
}

/// Member visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Access {
    #[default]
    Public,
    /// Visible to accessor resolution only when protected access is enabled.
    Protected,
}

/// A declared member of a class.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PropertyDef {
    /// Declared member name.
    pub name: String,
    /// Declared member type.
    pub ty: TypeRef,
    /// Whether the member can be read (has a getter).
    pub readable: bool,
    /// Whether the member can be written (has a setter).
    pub writable: bool,
    /// Member visibility.
    pub access: Access,
    /// Static members are skipped by accessor resolution.
    pub is_static: bool,
}

impl PropertyDef {
    /// A public read/write member.
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            readable: true,
            writable: true,
            access: Access::Public,
            is_static: false,
        }
    }

    /// Mark the member getter-only.
    pub fn read_only(mut self) -> Self {
        self.writable = false;
        self
    }

    /// Mark the member setter-only.
    pub fn write_only(mut self) -> Self {
        self.readable = false;
        self
    }

    /// Mark the member protected.
    pub fn protected(mut self) -> Self {
        self.access = Access::Protected;
        self
    }

    /// Mark the member static.
    pub fn statik(mut self) -> Self {
        self.is_static = true;
        self
    }
}

/// A declared constructor parameter.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Param {
    /// Parameter name; doubles as the member the argument is stored under.
    pub name: String,
    /// Parameter type.
    pub ty: TypeRef,
    /// A nullable-of-value-type parameter; softens the unmatched penalty.
    pub optional: bool,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            optional: false,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// A declared constructor.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConstructorDef {
    /// Parameters in declaration order.
    pub params: Vec<Param>,
}

impl ConstructorDef {
    pub fn new(params: Vec<Param>) -> Self {
        Self { params }
    }

    /// The default (no-argument) constructor.
    pub fn default_ctor() -> Self {
        Self { params: Vec::new() }
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// A registered aggregate shape.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClassDef {
    /// Class name.
    pub name: String,
    /// Optional parent class for single inheritance.
    pub parent: Option<String>,
    /// Declared properties (getter/setter-backed members).
    pub properties: Vec<PropertyDef>,
    /// Declared backing fields, probed after properties.
    pub fields: Vec<PropertyDef>,
    /// Declared constructors, in declaration order.
    pub constructors: Vec<ConstructorDef>,
}

impl ClassDef {
    /// Create a class with a default constructor and no members.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            properties: Vec::new(),
            fields: Vec::new(),
            constructors: vec![ConstructorDef::default_ctor()],
        }
    }

    /// Set the parent class.
    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Add a public read/write property.
    pub fn property(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.properties.push(PropertyDef::new(name, ty));
        self
    }

    /// Add a property definition.
    pub fn property_def(mut self, def: PropertyDef) -> Self {
        self.properties.push(def);
        self
    }

    /// Add a declared backing field.
    pub fn field(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.fields.push(PropertyDef::new(name, ty));
        self
    }

    /// Add a field definition.
    pub fn field_def(mut self, def: PropertyDef) -> Self {
        self.fields.push(def);
        self
    }

    /// Add a constructor. The implicit default constructor is removed the
    /// first time an explicit constructor is added.
    pub fn constructor(mut self, params: Vec<Param>) -> Self {
        if self.constructors.len() == 1 && self.constructors[0].params.is_empty() {
            self.constructors.clear();
        }
        self.constructors.push(ConstructorDef::new(params));
        self
    }

    /// Re-add the default constructor alongside explicit ones.
    pub fn with_default_constructor(mut self) -> Self {
        if !self.constructors.iter().any(|c| c.params.is_empty()) {
            self.constructors.push(ConstructorDef::default_ctor());
        }
        self
    }

    /// The default constructor, if declared.
    pub fn default_constructor(&self) -> Option<&ConstructorDef> {
        self.constructors.iter().find(|c| c.params.is_empty())
    }
}

/// Registry of class definitions, keyed by class name.
#[derive(Debug, Clone, Default)]
pub struct ClassRegistry {
    classes: HashMap<String, Arc<ClassDef>>,
}

impl ClassRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class definition. Duplicate names collide.
    pub fn register(&mut self, def: ClassDef) -> WeftResult<()> {
        if self.classes.contains_key(&def.name) {
            return Err(WeftError::config(format!(
                "class '{}' is already registered",
                def.name
            )));
        }
        self.classes.insert(def.name.clone(), Arc::new(def));
        Ok(())
    }

    /// Look up a class by name.
    pub fn get(&self, name: &str) -> Option<&Arc<ClassDef>> {
        self.classes.get(name)
    }

    /// Look up a class, raising a configuration error when missing.
    pub fn require(&self, name: &str) -> WeftResult<&Arc<ClassDef>> {
        self.get(name)
            .ok_or_else(|| WeftError::config(format!("class '{}' is not registered", name)))
    }

    /// The inheritance chain of a class, most-derived first.
    ///
    /// Stops at an unregistered parent name; cycle detection is performed by
    /// [`ClassRegistry::validate`] before compilation.
    pub fn chain<'a>(&'a self, name: &str) -> Vec<&'a Arc<ClassDef>> {
        let mut out = Vec::new();
        let mut current = self.get(name);
        while let Some(def) = current {
            if out.iter().any(|d: &&Arc<ClassDef>| d.name == def.name) {
                break;
            }
            out.push(def);
            current = def.parent.as_deref().and_then(|p| self.get(p));
        }
        out
    }

    /// True when `child` is `ancestor` or transitively extends it.
    pub fn is_subclass(&self, child: &str, ancestor: &str) -> bool {
        self.chain(child).iter().any(|d| d.name == ancestor)
    }

    /// Check every inheritance chain for cycles and dangling parents using
    /// DFS color marking.
    pub fn validate(&self) -> WeftResult<()> {
        #[derive(Clone, Copy, PartialEq)]
        enum Color {
            White,
            Gray,
            Black,
        }

        let mut colors: HashMap<&str, Color> =
            self.classes.keys().map(|k| (k.as_str(), Color::White)).collect();

        for name in self.classes.keys() {
            let mut path: Vec<&str> = Vec::new();
            let mut current = Some(name.as_str());
            while let Some(node) = current {
                match colors.get(node).copied() {
                    None => {
                        return Err(WeftError::config(format!(
                            "class '{}' extends unregistered class '{}'",
                            path.last().unwrap_or(&name.as_str()),
                            node
                        )));
                    }
                    Some(Color::Black) => break,
                    Some(Color::Gray) => {
                        return Err(WeftError::config(format!(
                            "inheritance cycle detected through class '{}'",
                            node
                        )));
                    }
                    Some(Color::White) => {
                        colors.insert(node, Color::Gray);
                        path.push(node);
                        current = self
                            .classes
                            .get(node)
                            .and_then(|d| d.parent.as_deref());
                    }
                }
            }
            for visited in path {
                colors.insert(visited, Color::Black);
            }
        }
        Ok(())
    }

    /// True when a value of type `from` can be passed where `to` is expected.
    pub fn assignable(&self, to: &TypeRef, from: &TypeRef) -> bool {
        match (to, from) {
            (TypeRef::Any, _) => true,
            (TypeRef::Float, TypeRef::Int) => true,
            (TypeRef::Class(target), TypeRef::Class(source)) => {
                self.is_subclass(source, target)
            }
            (a, b) => a == b,
        }
    }

    /// True when a runtime value can be passed where `to` is expected.
    ///
    /// Null is assignable to reference-typed parameters only.
    pub fn value_assignable(&self, to: &TypeRef, value: &Value) -> bool {
        match value {
            Value::Null => !to.is_value_type(),
            other => self.assignable(to, &TypeRef::of(other)),
        }
    }
}
