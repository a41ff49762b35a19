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

//! Handlers for primitive scalar types.

use super::TypeHandler;
use crate::error::{WeftError, WeftResult};
use crate::schema::TypeRef;
use crate::value::Value;
use std::collections::BTreeMap;

/// Plain string pass-through.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringHandler;

impl TypeHandler for StringHandler {
    fn parse(&self, text: &str) -> WeftResult<Value> {
        if text.is_empty() {
            return Ok(Value::Null);
        }
        Ok(Value::String(text.to_string()))
    }

    fn format(&self, value: &Value) -> WeftResult<Option<String>> {
        match value {
            Value::Null => Ok(None),
            other => Ok(Some(other.to_string())),
        }
    }

    fn target_type(&self) -> TypeRef {
        TypeRef::String
    }
}

/// Single-character fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharHandler;

impl TypeHandler for CharHandler {
    fn parse(&self, text: &str) -> WeftResult<Value> {
        if text.is_empty() {
            return Ok(Value::Null);
        }
        let mut chars = text.chars();
        let first = chars.next();
        if chars.next().is_some() {
            return Err(WeftError::conversion(
                format!("invalid character '{}': expected a single character", text),
                0,
            ));
        }
        Ok(Value::String(first.unwrap_or_default().to_string()))
    }

    fn format(&self, value: &Value) -> WeftResult<Option<String>> {
        match value {
            Value::Null => Ok(None),
            other => Ok(Some(other.to_string())),
        }
    }

    fn target_type(&self) -> TypeRef {
        TypeRef::String
    }
}

/// 64-bit signed integers.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntHandler;

impl TypeHandler for IntHandler {
    fn parse(&self, text: &str) -> WeftResult<Value> {
        if text.is_empty() {
            return Ok(Value::Null);
        }
        text.parse::<i64>()
            .map(Value::Int)
            .map_err(|_| WeftError::conversion(format!("invalid integer '{}'", text), 0))
    }

    fn format(&self, value: &Value) -> WeftResult<Option<String>> {
        match value {
            Value::Null => Ok(None),
            Value::Int(n) => Ok(Some(n.to_string())),
            other => Err(WeftError::conversion(
                format!("expected an integer value, got '{}'", other),
                0,
            )),
        }
    }

    fn target_type(&self) -> TypeRef {
        TypeRef::Int
    }
}

/// 64-bit floats.
#[derive(Debug, Clone, Copy, Default)]
pub struct FloatHandler;

impl TypeHandler for FloatHandler {
    fn parse(&self, text: &str) -> WeftResult<Value> {
        if text.is_empty() {
            return Ok(Value::Null);
        }
        text.parse::<f64>()
            .map(Value::Float)
            .map_err(|_| WeftError::conversion(format!("invalid number '{}'", text), 0))
    }

    fn format(&self, value: &Value) -> WeftResult<Option<String>> {
        match value {
            Value::Null => Ok(None),
            Value::Float(n) => Ok(Some(n.to_string())),
            Value::Int(n) => Ok(Some(n.to_string())),
            other => Err(WeftError::conversion(
                format!("expected a numeric value, got '{}'", other),
                0,
            )),
        }
    }

    fn target_type(&self) -> TypeRef {
        TypeRef::Float
    }
}

/// `true`/`false` literals, case-insensitive on parse.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolHandler;

impl TypeHandler for BoolHandler {
    fn parse(&self, text: &str) -> WeftResult<Value> {
        if text.is_empty() {
            return Ok(Value::Null);
        }
        match text.to_ascii_lowercase().as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(WeftError::conversion(
                format!("invalid boolean '{}'", text),
                0,
            )),
        }
    }

    fn format(&self, value: &Value) -> WeftResult<Option<String>> {
        match value {
            Value::Null => Ok(None),
            Value::Bool(b) => Ok(Some(b.to_string())),
            other => Err(WeftError::conversion(
                format!("expected a boolean value, got '{}'", other),
                0,
            )),
        }
    }

    fn target_type(&self) -> TypeRef {
        TypeRef::Bool
    }
}

/// Booleans encoded as integers.
///
/// An integer equal to `true_value` parses as true, one equal to
/// `false_value` as false; anything else fails. Formatting emits the
/// configured literals.
#[derive(Debug, Clone)]
pub struct BoolIntHandler {
    /// Integer meaning true (default 1).
    pub true_value: i64,
    /// Integer meaning false (default 0).
    pub false_value: i64,
    /// Literal emitted for null values; absent field when None.
    pub null_value: Option<String>,
}

impl BoolIntHandler {
    pub fn new() -> Self {
        Self {
            true_value: 1,
            false_value: 0,
            null_value: None,
        }
    }
}

impl Default for BoolIntHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeHandler for BoolIntHandler {
    fn parse(&self, text: &str) -> WeftResult<Value> {
        if text.is_empty() {
            return Ok(Value::Null);
        }
        let n: i64 = text
            .parse()
            .map_err(|_| WeftError::conversion(format!("invalid integer '{}'", text), 0))?;
        if n == self.true_value {
            Ok(Value::Bool(true))
        } else if n == self.false_value {
            Ok(Value::Bool(false))
        } else {
            Err(WeftError::conversion(
                format!(
                    "invalid boolean '{}': expected {} or {}",
                    text, self.true_value, self.false_value
                ),
                0,
            ))
        }
    }

    fn format(&self, value: &Value) -> WeftResult<Option<String>> {
        match value {
            Value::Null => Ok(self.null_value.clone()),
            Value::Bool(true) => Ok(Some(self.true_value.to_string())),
            Value::Bool(false) => Ok(Some(self.false_value.to_string())),
            other => Err(WeftError::conversion(
                format!("expected a boolean value, got '{}'", other),
                0,
            )),
        }
    }

    fn target_type(&self) -> TypeRef {
        TypeRef::Bool
    }

    fn configure(&mut self, properties: &BTreeMap<String, String>) -> WeftResult<()> {
        if let Some(v) = properties.get("true_value") {
            self.true_value = v
                .parse()
                .map_err(|_| WeftError::config(format!("invalid true_value '{}'", v)))?;
        }
        if let Some(v) = properties.get("false_value") {
            self.false_value = v
                .parse()
                .map_err(|_| WeftError::config(format!("invalid false_value '{}'", v)))?;
        }
        if let Some(v) = properties.get("null_value") {
            self.null_value = Some(v.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== StringHandler tests ====================

    #[test]
    fn test_string_parse() {
        assert_eq!(
            StringHandler.parse("hello").unwrap(),
            Value::String("hello".to_string())
        );
        assert_eq!(StringHandler.parse("").unwrap(), Value::Null);
    }

    #[test]
    fn test_string_format() {
        assert_eq!(
            StringHandler.format(&Value::from("x")).unwrap(),
            Some("x".to_string())
        );
        assert_eq!(StringHandler.format(&Value::Null).unwrap(), None);
    }

    // ==================== CharHandler tests ====================

    #[test]
    fn test_char_parse() {
        assert_eq!(
            CharHandler.parse("a").unwrap(),
            Value::String("a".to_string())
        );
        assert_eq!(CharHandler.parse("").unwrap(), Value::Null);
    }

    #[test]
    fn test_char_parse_rejects_multichar() {
        let err = CharHandler.parse("ab").unwrap_err();
        assert!(err.message.contains("single character"));
    }

    // ==================== IntHandler tests ====================

    #[test]
    fn test_int_parse() {
        assert_eq!(IntHandler.parse("42").unwrap(), Value::Int(42));
        assert_eq!(IntHandler.parse("-7").unwrap(), Value::Int(-7));
        assert_eq!(IntHandler.parse("").unwrap(), Value::Null);
    }

    #[test]
    fn test_int_parse_malformed() {
        assert!(IntHandler.parse("4x").is_err());
        assert!(IntHandler.parse("1.5").is_err());
    }

    #[test]
    fn test_int_format() {
        assert_eq!(
            IntHandler.format(&Value::Int(9)).unwrap(),
            Some("9".to_string())
        );
        assert_eq!(IntHandler.format(&Value::Null).unwrap(), None);
        assert!(IntHandler.format(&Value::from("x")).is_err());
    }

    #[test]
    fn test_int_roundtrip() {
        for n in [0i64, 1, -1, i64::MAX, i64::MIN] {
            let text = IntHandler.format(&Value::Int(n)).unwrap().unwrap();
            assert_eq!(IntHandler.parse(&text).unwrap(), Value::Int(n));
        }
    }

    // ==================== FloatHandler tests ====================

    #[test]
    fn test_float_parse() {
        assert_eq!(FloatHandler.parse("2.5").unwrap(), Value::Float(2.5));
        assert_eq!(FloatHandler.parse("-1e3").unwrap(), Value::Float(-1000.0));
        assert_eq!(FloatHandler.parse("").unwrap(), Value::Null);
        assert!(FloatHandler.parse("x").is_err());
    }

    #[test]
    fn test_float_format_accepts_int() {
        assert_eq!(
            FloatHandler.format(&Value::Int(2)).unwrap(),
            Some("2".to_string())
        );
    }

    // ==================== BoolHandler tests ====================

    #[test]
    fn test_bool_parse() {
        assert_eq!(BoolHandler.parse("true").unwrap(), Value::Bool(true));
        assert_eq!(BoolHandler.parse("FALSE").unwrap(), Value::Bool(false));
        assert_eq!(BoolHandler.parse("").unwrap(), Value::Null);
        assert!(BoolHandler.parse("yes").is_err());
    }

    #[test]
    fn test_bool_format() {
        assert_eq!(
            BoolHandler.format(&Value::Bool(true)).unwrap(),
            Some("true".to_string())
        );
        assert_eq!(BoolHandler.format(&Value::Null).unwrap(), None);
    }

    // ==================== BoolIntHandler tests ====================

    #[test]
    fn test_boolint_parse_defaults() {
        let h = BoolIntHandler::new();
        assert_eq!(h.parse("1").unwrap(), Value::Bool(true));
        assert_eq!(h.parse("0").unwrap(), Value::Bool(false));
        assert_eq!(h.parse("").unwrap(), Value::Null);
    }

    #[test]
    fn test_boolint_parse_other_integer_fails() {
        let h = BoolIntHandler::new();
        let err = h.parse("2").unwrap_err();
        assert!(err.message.contains("expected 1 or 0"));
    }

    #[test]
    fn test_boolint_parse_non_integer_fails() {
        let h = BoolIntHandler::new();
        assert!(h.parse("true").is_err());
    }

    #[test]
    fn test_boolint_format() {
        let h = BoolIntHandler::new();
        assert_eq!(h.format(&Value::Bool(true)).unwrap(), Some("1".to_string()));
        assert_eq!(
            h.format(&Value::Bool(false)).unwrap(),
            Some("0".to_string())
        );
        assert_eq!(h.format(&Value::Null).unwrap(), None);
    }

    #[test]
    fn test_boolint_configure() {
        let mut h = BoolIntHandler::new();
        let mut props = BTreeMap::new();
        props.insert("true_value".to_string(), "9".to_string());
        props.insert("false_value".to_string(), "8".to_string());
        props.insert("null_value".to_string(), "-".to_string());
        h.configure(&props).unwrap();
        assert_eq!(h.parse("9").unwrap(), Value::Bool(true));
        assert_eq!(h.parse("8").unwrap(), Value::Bool(false));
        assert_eq!(h.format(&Value::Null).unwrap(), Some("-".to_string()));
    }

    #[test]
    fn test_boolint_configure_invalid() {
        let mut h = BoolIntHandler::new();
        let mut props = BTreeMap::new();
        props.insert("true_value".to_string(), "x".to_string());
        assert!(h.configure(&props).is_err());
    }
}
