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

//! The property tree: the in-memory side of a compiled stream.
//!
//! Nodes live in an arena owned by the stream and are referenced by stable
//! [`PropertyId`] handles. The tree is immutable after compilation; all
//! per-record value state lives in the unmarshalling context, keyed by
//! handle.

use crate::accessor::Accessor;
use crate::schema::TypeRef;

/// Stable handle to a property node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyId(pub(crate) usize);

impl PropertyId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Constructor selection recorded on a complex property at compile time.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedConstructor {
    /// Index into the class's declared constructors.
    pub index: usize,
    /// Member name supplying each parameter, in parameter order.
    pub param_members: Vec<String>,
}

/// Variant payload of a property node.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKind {
    /// A scalar member.
    Simple {
        /// Declared scalar type.
        ty: TypeRef,
    },
    /// An aggregate with named members.
    Complex {
        /// Registered class name.
        class: String,
        /// Constructor selected for constructor-argument children, if any.
        constructor: Option<SelectedConstructor>,
    },
    /// An ordered sequence aggregating child occurrences.
    Collection,
    /// A keyed mapping aggregating child occurrences.
    Map {
        /// Child field supplying entry keys; None maps members by name.
        key: Option<String>,
    },
}

/// One node of the property tree.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyNode {
    /// Logical property name.
    pub name: String,
    /// Variant payload.
    pub kind: PropertyKind,
    /// Participates in record identification. Set on identifier fields and
    /// propagated to every enclosing property.
    pub identifier: bool,
    /// How the property attaches to its parent aggregate, when bound to one.
    pub accessor: Option<Accessor>,
    /// Child properties in declared order.
    pub children: Vec<PropertyId>,
}

impl PropertyNode {
    pub fn new(name: impl Into<String>, kind: PropertyKind) -> Self {
        Self {
            name: name.into(),
            kind,
            identifier: false,
            accessor: None,
            children: Vec::new(),
        }
    }

    /// The declared or inferred type of this property.
    pub fn type_ref(&self) -> TypeRef {
        match &self.kind {
            PropertyKind::Simple { ty } => ty.clone(),
            PropertyKind::Complex { class, .. } => TypeRef::Class(class.clone()),
            PropertyKind::Collection => TypeRef::List,
            PropertyKind::Map { .. } => TypeRef::Map,
        }
    }

    /// Simple properties cannot have children.
    pub fn can_have_children(&self) -> bool {
        !matches!(self.kind, PropertyKind::Simple { .. })
    }
}

/// Arena owning every property node of one compiled stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyArena {
    nodes: Vec<PropertyNode>,
}

impl PropertyArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, returning its handle.
    pub fn alloc(&mut self, node: PropertyNode) -> PropertyId {
        let id = PropertyId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: PropertyId) -> &PropertyNode {
        &self.nodes[id.0]
    }

    pub fn get_mut(&mut self, id: PropertyId) -> &mut PropertyNode {
        &mut self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PropertyId, &PropertyNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (PropertyId(i), n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple(name: &str) -> PropertyNode {
        PropertyNode::new(name, PropertyKind::Simple { ty: TypeRef::String })
    }

    // ==================== Arena tests ====================

    #[test]
    fn test_arena_alloc_and_get() {
        let mut arena = PropertyArena::new();
        let id = arena.alloc(simple("a"));
        assert_eq!(arena.get(id).name, "a");
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_arena_handles_are_stable() {
        let mut arena = PropertyArena::new();
        let a = arena.alloc(simple("a"));
        let b = arena.alloc(simple("b"));
        assert_ne!(a, b);
        assert_eq!(arena.get(a).name, "a");
        assert_eq!(arena.get(b).name, "b");
    }

    #[test]
    fn test_arena_get_mut() {
        let mut arena = PropertyArena::new();
        let id = arena.alloc(simple("a"));
        arena.get_mut(id).identifier = true;
        assert!(arena.get(id).identifier);
    }

    #[test]
    fn test_arena_iter() {
        let mut arena = PropertyArena::new();
        arena.alloc(simple("a"));
        arena.alloc(simple("b"));
        let names: Vec<_> = arena.iter().map(|(_, n)| n.name.clone()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    // ==================== Node tests ====================

    #[test]
    fn test_simple_cannot_have_children() {
        assert!(!simple("s").can_have_children());
        let complex = PropertyNode::new(
            "c",
            PropertyKind::Complex {
                class: "X".to_string(),
                constructor: None,
            },
        );
        assert!(complex.can_have_children());
        let coll = PropertyNode::new("l", PropertyKind::Collection);
        assert!(coll.can_have_children());
        let map = PropertyNode::new("m", PropertyKind::Map { key: None });
        assert!(map.can_have_children());
    }

    #[test]
    fn test_type_ref() {
        assert_eq!(simple("s").type_ref(), TypeRef::String);
        let complex = PropertyNode::new(
            "c",
            PropertyKind::Complex {
                class: "Order".to_string(),
                constructor: None,
            },
        );
        assert_eq!(complex.type_ref(), TypeRef::Class("Order".to_string()));
        assert_eq!(
            PropertyNode::new("l", PropertyKind::Collection).type_ref(),
            TypeRef::List
        );
        assert_eq!(
            PropertyNode::new("m", PropertyKind::Map { key: None }).type_ref(),
            TypeRef::Map
        );
    }
}
