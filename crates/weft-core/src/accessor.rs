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

//! Accessor resolution: mapping a logical property name to a read/write
//! capability on a registered class.
//!
//! Resolution order:
//!
//! 1. An explicit getter/setter name from configuration, accepted literally
//!    or after stripping the conventional `get`/`Get`/`is`/`Is`/`set`/`Set`
//!    prefixes.
//! 2. A declared property whose name matches the logical name or one of its
//!    variants (`name`, `Name`, decapitalized, `_name`, `m_name`), walking
//!    the inheritance chain.
//! 3. A declared backing field with the same name variants.
//! 4. When only one of the two capabilities was found through an explicit
//!    name, the counterpart name is derived and searched.
//!
//! Static members are always skipped. Protected members resolve only when
//! protected access is enabled for the stream.

use crate::error::{WeftError, WeftResult};
use crate::schema::{Access, ClassRegistry, PropertyDef, TypeRef};
use crate::value::{Bean, Value};

/// A resolved capability to read and/or write one member of a bean.
#[derive(Debug, Clone, PartialEq)]
pub struct Accessor {
    /// The logical property name from configuration.
    pub name: String,
    /// Declared member name used for reads, when readable.
    pub read_member: Option<String>,
    /// Declared member name used for writes, when writable.
    pub write_member: Option<String>,
    /// Declared member type.
    pub ty: TypeRef,
    /// Constructor-argument index, when the member is constructor-injected.
    pub ctor_arg: Option<usize>,
}

impl Accessor {
    /// An accessor that reads and writes a map entry directly.
    pub fn direct(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            read_member: Some(name.clone()),
            write_member: Some(name.clone()),
            name,
            ty: TypeRef::Any,
            ctor_arg: None,
        }
    }

    pub fn readable(&self) -> bool {
        self.read_member.is_some()
    }

    pub fn writable(&self) -> bool {
        self.write_member.is_some()
    }

    /// The member name constructor arguments are stored under.
    pub fn member(&self) -> &str {
        self.write_member
            .as_deref()
            .or(self.read_member.as_deref())
            .unwrap_or(&self.name)
    }

    /// Read the member from a bean.
    pub fn get<'a>(&self, bean: &'a Bean) -> Option<&'a Value> {
        self.read_member.as_deref().and_then(|m| bean.get(m))
    }

    /// Write the member on a bean.
    pub fn set(&self, bean: &mut Bean, value: Value) {
        if let Some(member) = self.write_member.as_deref() {
            bean.set(member, value);
        }
    }
}

/// Which capability a search is after.
#[derive(Clone, Copy, PartialEq)]
enum Capability {
    Read,
    Write,
}

/// Resolve an accessor for `name` on `class_name`.
///
/// Fails with a configuration error when neither a property nor a field can
/// be found and the member is not constructor-injected.
pub fn resolve_accessor(
    registry: &ClassRegistry,
    class_name: &str,
    name: &str,
    getter: Option<&str>,
    setter: Option<&str>,
    ctor_arg: Option<usize>,
    allow_protected: bool,
) -> WeftResult<Accessor> {
    let mut read_hit: Option<PropertyDef> = None;
    let mut write_hit: Option<PropertyDef> = None;

    // Step 1: explicit accessor names.
    if let Some(g) = getter {
        read_hit = find_member(
            registry,
            class_name,
            &override_candidates(g),
            Capability::Read,
            allow_protected,
        );
        if read_hit.is_none() {
            return Err(WeftError::config(format!(
                "getter '{}' not found on class '{}' for property '{}'",
                g, class_name, name
            )));
        }
    }
    if let Some(s) = setter {
        write_hit = find_member(
            registry,
            class_name,
            &override_candidates(s),
            Capability::Write,
            allow_protected,
        );
        if write_hit.is_none() {
            return Err(WeftError::config(format!(
                "setter '{}' not found on class '{}' for property '{}'",
                s, class_name, name
            )));
        }
    }

    // Steps 2 and 3: declared property, then declared field, by name variant.
    let variants = name_variants(name);
    if read_hit.is_none() && getter.is_none() {
        read_hit = find_member(
            registry,
            class_name,
            &variants,
            Capability::Read,
            allow_protected,
        );
    }
    if write_hit.is_none() && setter.is_none() {
        write_hit = find_member(
            registry,
            class_name,
            &variants,
            Capability::Write,
            allow_protected,
        );
    }

    // Step 4: derive the counterpart of an explicitly named accessor.
    if read_hit.is_some() && write_hit.is_none() {
        if let Some(g) = getter {
            let counterpart = name_variants(&strip_accessor_prefix(g).unwrap_or_else(|| g.to_string()));
            write_hit = find_member(
                registry,
                class_name,
                &counterpart,
                Capability::Write,
                allow_protected,
            );
        }
    }
    if write_hit.is_some() && read_hit.is_none() {
        if let Some(s) = setter {
            let counterpart = name_variants(&strip_accessor_prefix(s).unwrap_or_else(|| s.to_string()));
            read_hit = find_member(
                registry,
                class_name,
                &counterpart,
                Capability::Read,
                allow_protected,
            );
        }
    }

    if read_hit.is_none() && write_hit.is_none() && ctor_arg.is_none() {
        return Err(WeftError::config(format!(
            "neither property nor field found with name '{}' on class '{}'",
            name, class_name
        )));
    }

    let ty = read_hit
        .as_ref()
        .or(write_hit.as_ref())
        .map(|d| d.ty.clone())
        .unwrap_or(TypeRef::Any);

    Ok(Accessor {
        name: name.to_string(),
        read_member: read_hit.map(|d| d.name),
        write_member: write_hit.map(|d| d.name),
        ty,
        ctor_arg,
    })
}

/// Candidate names for an explicit accessor override: the literal name, then
/// the variants of the prefix-stripped name.
fn override_candidates(accessor_name: &str) -> Vec<String> {
    let mut out = vec![accessor_name.to_string()];
    if let Some(stripped) = strip_accessor_prefix(accessor_name) {
        for v in name_variants(&stripped) {
            if !out.contains(&v) {
                out.push(v);
            }
        }
    }
    out
}

/// Strip a conventional accessor prefix, if present.
fn strip_accessor_prefix(name: &str) -> Option<String> {
    for prefix in ["get", "Get", "is", "Is", "set", "Set"] {
        if let Some(rest) = name.strip_prefix(prefix) {
            if !rest.is_empty() {
                return Some(rest.to_string());
            }
        }
    }
    None
}

/// The probed variants of a logical name.
fn name_variants(name: &str) -> Vec<String> {
    let mut out = vec![name.to_string()];
    for candidate in [
        capitalize(name),
        decapitalize(name),
        format!("_{}", name),
        format!("m_{}", name),
    ] {
        if !out.contains(&candidate) {
            out.push(candidate);
        }
    }
    out
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn decapitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Search declared properties across the inheritance chain, then declared
/// fields, for the first candidate name providing the wanted capability.
fn find_member(
    registry: &ClassRegistry,
    class_name: &str,
    candidates: &[String],
    capability: Capability,
    allow_protected: bool,
) -> Option<PropertyDef> {
    let chain = registry.chain(class_name);

    let visible = |def: &PropertyDef| -> bool {
        if def.is_static {
            return false;
        }
        if def.access == Access::Protected && !allow_protected {
            return false;
        }
        match capability {
            Capability::Read => def.readable,
            Capability::Write => def.writable,
        }
    };

    for candidate in candidates {
        for class in &chain {
            if let Some(def) = class
                .properties
                .iter()
                .find(|d| &d.name == candidate && visible(d))
            {
                return Some(def.clone());
            }
        }
    }
    for candidate in candidates {
        for class in &chain {
            if let Some(def) = class
                .fields
                .iter()
                .find(|d| &d.name == candidate && visible(d))
            {
                return Some(def.clone());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ClassDef;

    fn registry() -> ClassRegistry {
        let mut reg = ClassRegistry::new();
        reg.register(
            ClassDef::new("Base")
                .property("id", TypeRef::Int)
                .property_def(PropertyDef::new("secret", TypeRef::String).protected())
                .property_def(PropertyDef::new("counter", TypeRef::Int).statik()),
        )
        .unwrap();
        reg.register(
            ClassDef::new("Person")
                .extends("Base")
                .property("firstName", TypeRef::String)
                .property_def(PropertyDef::new("age", TypeRef::Int).write_only())
                .property_def(PropertyDef::new("label", TypeRef::String).read_only())
                .field("m_code", TypeRef::String),
        )
        .unwrap();
        reg
    }

    fn resolve(reg: &ClassRegistry, name: &str) -> WeftResult<Accessor> {
        resolve_accessor(reg, "Person", name, None, None, None, false)
    }

    // ==================== Name variant tests ====================

    #[test]
    fn test_name_variants() {
        let v = name_variants("firstName");
        assert!(v.contains(&"firstName".to_string()));
        assert!(v.contains(&"FirstName".to_string()));
        assert!(v.contains(&"_firstName".to_string()));
        assert!(v.contains(&"m_firstName".to_string()));
    }

    #[test]
    fn test_strip_accessor_prefix() {
        assert_eq!(strip_accessor_prefix("getName"), Some("Name".to_string()));
        assert_eq!(strip_accessor_prefix("IsActive"), Some("Active".to_string()));
        assert_eq!(strip_accessor_prefix("setAge"), Some("Age".to_string()));
        assert_eq!(strip_accessor_prefix("name"), None);
        assert_eq!(strip_accessor_prefix("get"), None);
    }

    #[test]
    fn test_capitalize_decapitalize() {
        assert_eq!(capitalize("name"), "Name");
        assert_eq!(decapitalize("Name"), "name");
        assert_eq!(capitalize(""), "");
    }

    // ==================== Resolution tests ====================

    #[test]
    fn test_resolve_exact_name() {
        let reg = registry();
        let a = resolve(&reg, "firstName").unwrap();
        assert!(a.readable() && a.writable());
        assert_eq!(a.member(), "firstName");
        assert_eq!(a.ty, TypeRef::String);
    }

    #[test]
    fn test_resolve_capitalized_variant() {
        let reg = registry();
        // Logical name "FirstName" resolves to declared "firstName".
        let a = resolve(&reg, "FirstName").unwrap();
        assert_eq!(a.member(), "firstName");
    }

    #[test]
    fn test_resolve_inherited_member() {
        let reg = registry();
        let a = resolve(&reg, "id").unwrap();
        assert_eq!(a.member(), "id");
        assert_eq!(a.ty, TypeRef::Int);
    }

    #[test]
    fn test_resolve_field_fallback() {
        let reg = registry();
        let a = resolve(&reg, "code").unwrap();
        assert_eq!(a.member(), "m_code");
    }

    #[test]
    fn test_resolve_missing_member_fails() {
        let reg = registry();
        let err = resolve(&reg, "nothing").unwrap_err();
        assert!(err.message.contains("neither property nor field"));
    }

    #[test]
    fn test_resolve_missing_but_ctor_arg_ok() {
        let reg = registry();
        let a =
            resolve_accessor(&reg, "Person", "nothing", None, None, Some(0), false).unwrap();
        assert!(!a.readable() && !a.writable());
        assert_eq!(a.ctor_arg, Some(0));
        assert_eq!(a.member(), "nothing");
    }

    #[test]
    fn test_resolve_write_only_member() {
        let reg = registry();
        let a = resolve(&reg, "age").unwrap();
        assert!(a.writable());
        assert!(!a.readable());
    }

    #[test]
    fn test_resolve_read_only_member() {
        let reg = registry();
        let a = resolve(&reg, "label").unwrap();
        assert!(a.readable());
        assert!(!a.writable());
    }

    // ==================== Explicit override tests ====================

    #[test]
    fn test_resolve_explicit_getter_with_prefix() {
        let reg = registry();
        let a = resolve_accessor(
            &reg,
            "Person",
            "name",
            Some("getFirstName"),
            None,
            None,
            false,
        )
        .unwrap();
        assert_eq!(a.read_member.as_deref(), Some("firstName"));
        // Step 4: the setter counterpart is derived from the getter name.
        assert_eq!(a.write_member.as_deref(), Some("firstName"));
    }

    #[test]
    fn test_resolve_explicit_getter_missing_fails() {
        let reg = registry();
        let err = resolve_accessor(
            &reg,
            "Person",
            "name",
            Some("getNothing"),
            None,
            None,
            false,
        )
        .unwrap_err();
        assert!(err.message.contains("getter 'getNothing' not found"));
    }

    #[test]
    fn test_resolve_explicit_setter() {
        let reg = registry();
        let a =
            resolve_accessor(&reg, "Person", "years", None, Some("setAge"), None, false)
                .unwrap();
        assert_eq!(a.write_member.as_deref(), Some("age"));
    }

    // ==================== Visibility tests ====================

    #[test]
    fn test_protected_member_hidden_by_default() {
        let reg = registry();
        let err = resolve(&reg, "secret").unwrap_err();
        assert!(err.message.contains("neither property nor field"));
    }

    #[test]
    fn test_protected_member_visible_with_flag() {
        let reg = registry();
        let a = resolve_accessor(&reg, "Person", "secret", None, None, None, true).unwrap();
        assert_eq!(a.member(), "secret");
    }

    #[test]
    fn test_static_member_always_skipped() {
        let reg = registry();
        let err = resolve(&reg, "counter").unwrap_err();
        assert!(err.message.contains("neither property nor field"));
    }

    // ==================== Accessor behavior tests ====================

    #[test]
    fn test_accessor_get_set_on_bean() {
        let reg = registry();
        let a = resolve(&reg, "firstName").unwrap();
        let mut bean = Bean::new("Person");
        a.set(&mut bean, Value::from("Ada"));
        assert_eq!(a.get(&bean).unwrap().as_str(), Some("Ada"));
    }

    #[test]
    fn test_accessor_direct() {
        let a = Accessor::direct("key");
        let mut bean = Bean::new("map");
        a.set(&mut bean, Value::Int(1));
        assert_eq!(a.get(&bean), Some(&Value::Int(1)));
        assert_eq!(a.ty, TypeRef::Any);
    }
}
