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

//! Escape-decoding handlers for string and character fields.
//!
//! Decoding is one-way: these handlers do not re-encode escapes on output
//! and report the operation as unsupported, matching the behavior of the
//! system this engine is drop-in compatible with.

use super::TypeHandler;
use crate::error::{WeftError, WeftResult};
use crate::schema::TypeRef;
use crate::value::Value;

/// Decode the recognized escape sequences in `text`.
///
/// `\\`, `\n`, `\r`, `\t` and `\f` always decode; `\0` decodes to NUL only
/// when `null_escape` is set. Any other escaped character decodes to itself.
fn unescape(text: &str, null_escape: bool) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('f') => out.push('\u{000C}'),
            Some('0') if null_escape => out.push('\0'),
            Some(other) => out.push(other),
            // Trailing lone backslash is kept literally.
            None => out.push('\\'),
        }
    }
    out
}

/// String fields with escape decoding on parse.
#[derive(Debug, Clone, Copy, Default)]
pub struct EscapedStringHandler {
    /// Decode `\0` to NUL.
    pub null_escape: bool,
}

impl EscapedStringHandler {
    pub fn new(null_escape: bool) -> Self {
        Self { null_escape }
    }
}

impl TypeHandler for EscapedStringHandler {
    fn parse(&self, text: &str) -> WeftResult<Value> {
        if text.is_empty() {
            return Ok(Value::Null);
        }
        Ok(Value::String(unescape(text, self.null_escape)))
    }

    fn format(&self, _value: &Value) -> WeftResult<Option<String>> {
        Err(WeftError::unsupported(
            "escaped string fields cannot be formatted",
        ))
    }

    fn target_type(&self) -> TypeRef {
        TypeRef::String
    }
}

/// Single-character fields with escape decoding on parse.
#[derive(Debug, Clone, Copy, Default)]
pub struct EscapedCharHandler {
    /// Decode `\0` to NUL.
    pub null_escape: bool,
}

impl EscapedCharHandler {
    pub fn new(null_escape: bool) -> Self {
        Self { null_escape }
    }
}

impl TypeHandler for EscapedCharHandler {
    fn parse(&self, text: &str) -> WeftResult<Value> {
        if text.is_empty() {
            return Ok(Value::Null);
        }
        let decoded = unescape(text, self.null_escape);
        if decoded.chars().count() != 1 {
            return Err(WeftError::conversion(
                format!("invalid character '{}': expected a single character", text),
                0,
            ));
        }
        Ok(Value::String(decoded))
    }

    fn format(&self, _value: &Value) -> WeftResult<Option<String>> {
        Err(WeftError::unsupported(
            "escaped character fields cannot be formatted",
        ))
    }

    fn target_type(&self) -> TypeRef {
        TypeRef::String
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WeftErrorKind;

    // ==================== unescape tests ====================

    #[test]
    fn test_unescape_known_sequences() {
        assert_eq!(unescape(r"a\\b", false), "a\\b");
        assert_eq!(unescape(r"a\nb", false), "a\nb");
        assert_eq!(unescape(r"a\rb", false), "a\rb");
        assert_eq!(unescape(r"a\tb", false), "a\tb");
        assert_eq!(unescape(r"a\fb", false), "a\u{000C}b");
    }

    #[test]
    fn test_unescape_null_enabled() {
        assert_eq!(unescape(r"c\0d", true), "c\0d");
    }

    #[test]
    fn test_unescape_null_disabled_decodes_to_zero() {
        assert_eq!(unescape(r"c\0d", false), "c0d");
    }

    #[test]
    fn test_unescape_unknown_escape_decodes_to_char() {
        assert_eq!(unescape(r"\x\y", false), "xy");
    }

    #[test]
    fn test_unescape_trailing_backslash() {
        assert_eq!(unescape(r"ab\", false), "ab\\");
    }

    #[test]
    fn test_unescape_full_sequence() {
        // a\\b\nc\0d with null escaping decodes to a, backslash, b,
        // newline, c, NUL, d.
        assert_eq!(unescape(r"a\\b\nc\0d", true), "a\\b\nc\0d");
    }

    // ==================== Handler tests ====================

    #[test]
    fn test_escaped_string_parse() {
        let h = EscapedStringHandler::new(true);
        assert_eq!(
            h.parse(r"a\\b\nc\0d").unwrap(),
            Value::String("a\\b\nc\0d".to_string())
        );
    }

    #[test]
    fn test_escaped_string_parse_null_off() {
        let h = EscapedStringHandler::new(false);
        assert_eq!(h.parse(r"\0").unwrap(), Value::String("0".to_string()));
    }

    #[test]
    fn test_escaped_string_empty_is_null() {
        let h = EscapedStringHandler::new(false);
        assert_eq!(h.parse("").unwrap(), Value::Null);
    }

    #[test]
    fn test_escaped_string_format_unsupported() {
        let h = EscapedStringHandler::new(false);
        let err = h.format(&Value::from("x")).unwrap_err();
        assert_eq!(err.kind, WeftErrorKind::Unsupported);
    }

    #[test]
    fn test_escaped_char_parse() {
        let h = EscapedCharHandler::new(false);
        assert_eq!(h.parse(r"\n").unwrap(), Value::String("\n".to_string()));
        assert_eq!(h.parse("a").unwrap(), Value::String("a".to_string()));
    }

    #[test]
    fn test_escaped_char_parse_null() {
        let h = EscapedCharHandler::new(true);
        assert_eq!(h.parse(r"\0").unwrap(), Value::String("\0".to_string()));
    }

    #[test]
    fn test_escaped_char_rejects_multichar() {
        let h = EscapedCharHandler::new(false);
        assert!(h.parse(r"ab").is_err());
        assert!(h.parse(r"\n\n").is_err());
    }

    #[test]
    fn test_escaped_char_format_unsupported() {
        let h = EscapedCharHandler::new(false);
        let err = h.format(&Value::from("x")).unwrap_err();
        assert_eq!(err.kind, WeftErrorKind::Unsupported);
    }
}
