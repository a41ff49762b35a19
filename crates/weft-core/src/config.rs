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

//! Declarative stream configuration.
//!
//! A configuration tree describes the layout of records within a stream and
//! the binding of fields onto registered classes. The tree is validated and
//! defaulted by the preprocessor, then lowered into an executable parser
//! tree by the parser factory.

/// The wire format of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StreamFormat {
    /// Delimiter-separated fields.
    Delimited,
    /// Fixed-width fields addressed by offset and length.
    FixedLength,
    /// Comma-separated values with quoting.
    Csv,
    /// XML elements.
    Xml,
}

/// Whether a stream is compiled for reading, writing, or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StreamMode {
    Read,
    Write,
    #[default]
    ReadWrite,
}

impl StreamMode {
    pub fn readable(self) -> bool {
        matches!(self, Self::Read | Self::ReadWrite)
    }

    pub fn writable(self) -> bool {
        matches!(self, Self::Write | Self::ReadWrite)
    }
}

/// Ordering constraint applied to a group's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GroupOrder {
    /// Children must appear in declared order.
    #[default]
    Sequential,
    /// Children may appear in any order; min/max still enforced.
    Unordered,
}

/// Policy for records no definition matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UnidentifiedPolicy {
    /// Report through the error handler and stop.
    #[default]
    Fail,
    /// Report through the error handler and continue with the next record.
    Skip,
}

/// Maximum occurrence bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Occurs {
    Count(usize),
    Unbounded,
}

impl Occurs {
    /// True when `n` more occurrences are allowed.
    pub fn allows(&self, n: usize) -> bool {
        match self {
            Self::Count(max) => n < *max,
            Self::Unbounded => true,
        }
    }

    /// The bound as a count, when bounded.
    pub fn as_count(&self) -> Option<usize> {
        match self {
            Self::Count(n) => Some(*n),
            Self::Unbounded => None,
        }
    }
}

impl Default for Occurs {
    fn default() -> Self {
        Self::Count(1)
    }
}

/// Padding direction for fixed-length fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Justify {
    /// Value at the left, padding at the right.
    #[default]
    Left,
    /// Value at the right, padding at the left.
    Right,
}

/// How a repeated segment aggregates into its bound member.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Aggregation {
    /// A single occurrence bound directly.
    #[default]
    Single,
    /// Occurrences collected into an ordered sequence.
    List,
    /// Occurrences keyed by the value of a child field.
    Map {
        /// Name of the child field supplying the entry key.
        key: String,
    },
}

/// Binding of a record or segment onto a registered class.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BeanConfig {
    /// Registered class name.
    pub class_name: String,
}

impl BeanConfig {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
        }
    }
}

/// A scalar position within a record.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldConfig {
    /// Logical field name; also the bound member name unless overridden.
    pub name: String,
    /// 1-based ordinal for delimited formats. Assigned when omitted.
    pub position: Option<usize>,
    /// Byte offset for fixed-length formats. Assigned when omitted.
    pub offset: Option<usize>,
    /// Width for fixed-length formats.
    pub length: Option<usize>,
    /// Pad character for fixed-length output.
    pub padding: char,
    /// Padding direction.
    pub justify: Justify,
    /// Missing or empty input is an error when required.
    pub required: bool,
    /// Whitespace trimming; None inherits the stream default.
    pub trim: Option<bool>,
    /// Literal applied when the input is missing or empty.
    pub default_value: Option<String>,
    /// Constant value; used for record identification and filled on write.
    pub literal: Option<String>,
    /// Validation pattern; also used for regex record identification.
    pub regex: Option<String>,
    /// Minimum text length after trimming.
    pub min_length: Option<usize>,
    /// Maximum text length after trimming.
    pub max_length: Option<usize>,
    /// Configured type name; defaults to "string".
    pub type_name: Option<String>,
    /// Named type handler override.
    pub handler_name: Option<String>,
    /// Constructor-argument index on the enclosing bean.
    pub ctor_arg: Option<usize>,
    /// Participates in record identification.
    pub is_identifier: bool,
    /// Explicit getter name override.
    pub getter: Option<String>,
    /// Explicit setter name override.
    pub setter: Option<String>,
    /// Parsed and validated but not bound to any member.
    pub ignore: bool,
    /// Minimum number of occurrences.
    pub min_occurs: usize,
    /// Maximum number of occurrences; above one collects into a sequence.
    pub max_occurs: Occurs,
}

impl FieldConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: None,
            offset: None,
            length: None,
            padding: ' ',
            justify: Justify::Left,
            required: false,
            trim: None,
            default_value: None,
            literal: None,
            regex: None,
            min_length: None,
            max_length: None,
            type_name: None,
            handler_name: None,
            ctor_arg: None,
            is_identifier: false,
            getter: None,
            setter: None,
            ignore: false,
            min_occurs: 1,
            max_occurs: Occurs::Count(1),
        }
    }

    /// Set the configured type name.
    pub fn typed(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    /// Mark the field a record identifier matching the given literal.
    pub fn rid_literal(mut self, literal: impl Into<String>) -> Self {
        self.is_identifier = true;
        self.literal = Some(literal.into());
        self
    }

    /// Mark the field a record identifier matching the given pattern.
    pub fn rid_regex(mut self, pattern: impl Into<String>) -> Self {
        self.is_identifier = true;
        self.regex = Some(pattern.into());
        self
    }

    /// Set occurrence bounds.
    pub fn occurs(mut self, min: usize, max: Occurs) -> Self {
        self.min_occurs = min;
        self.max_occurs = max;
        self
    }

    /// Set fixed-length geometry.
    pub fn at(mut self, offset: usize, length: usize) -> Self {
        self.offset = Some(offset);
        self.length = Some(length);
        self
    }

    /// Set the constructor-argument index.
    pub fn ctor(mut self, index: usize) -> Self {
        self.ctor_arg = Some(index);
        self
    }

    /// Mark the field required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// A named bundle of fields and segments bound to a member.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SegmentConfig {
    /// Segment name; also the bound member name and the XML element name.
    pub name: String,
    /// Class binding; unbound segments contribute children to the parent.
    pub bean: Option<BeanConfig>,
    /// Aggregation of repeated occurrences.
    pub aggregation: Aggregation,
    /// Constructor-argument index on the enclosing bean.
    pub ctor_arg: Option<usize>,
    /// Explicit getter name override.
    pub getter: Option<String>,
    /// Explicit setter name override.
    pub setter: Option<String>,
    /// Minimum number of occurrences.
    pub min_occurs: usize,
    /// Maximum number of occurrences.
    pub max_occurs: Occurs,
    /// Ordered children.
    pub children: Vec<ComponentConfig>,
}

impl SegmentConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bean: None,
            aggregation: Aggregation::Single,
            ctor_arg: None,
            getter: None,
            setter: None,
            min_occurs: 1,
            max_occurs: Occurs::Count(1),
            children: Vec::new(),
        }
    }

    pub fn bound_to(mut self, class_name: impl Into<String>) -> Self {
        self.bean = Some(BeanConfig::new(class_name));
        self
    }

    pub fn aggregated(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    pub fn occurs(mut self, min: usize, max: Occurs) -> Self {
        self.min_occurs = min;
        self.max_occurs = max;
        self
    }

    pub fn child(mut self, child: impl Into<ComponentConfig>) -> Self {
        self.children.push(child.into());
        self
    }
}

/// One record definition.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RecordConfig {
    /// Record name; also the XML element name.
    pub name: String,
    /// Class binding; unbound records unmarshal into a keyed map.
    pub bean: Option<BeanConfig>,
    /// Minimum occurrences within the enclosing group.
    pub min_occurs: usize,
    /// Maximum occurrences within the enclosing group.
    pub max_occurs: Occurs,
    /// Ordered children (fields and segments).
    pub children: Vec<ComponentConfig>,
}

impl RecordConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bean: None,
            min_occurs: 0,
            max_occurs: Occurs::Unbounded,
            children: Vec::new(),
        }
    }

    pub fn bound_to(mut self, class_name: impl Into<String>) -> Self {
        self.bean = Some(BeanConfig::new(class_name));
        self
    }

    pub fn occurs(mut self, min: usize, max: Occurs) -> Self {
        self.min_occurs = min;
        self.max_occurs = max;
        self
    }

    pub fn child(mut self, child: impl Into<ComponentConfig>) -> Self {
        self.children.push(child.into());
        self
    }
}

/// An ordered grouping of records and nested groups.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupConfig {
    pub name: String,
    pub min_occurs: usize,
    pub max_occurs: Occurs,
    pub order: GroupOrder,
    pub children: Vec<ComponentConfig>,
}

impl GroupConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            min_occurs: 0,
            max_occurs: Occurs::Unbounded,
            order: GroupOrder::Sequential,
            children: Vec::new(),
        }
    }

    pub fn unordered(mut self) -> Self {
        self.order = GroupOrder::Unordered;
        self
    }

    pub fn occurs(mut self, min: usize, max: Occurs) -> Self {
        self.min_occurs = min;
        self.max_occurs = max;
        self
    }

    pub fn child(mut self, child: impl Into<ComponentConfig>) -> Self {
        self.children.push(child.into());
        self
    }
}

/// Any node of the configuration tree below the stream.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ComponentConfig {
    Group(GroupConfig),
    Record(RecordConfig),
    Segment(SegmentConfig),
    Field(FieldConfig),
}

impl ComponentConfig {
    pub fn name(&self) -> &str {
        match self {
            Self::Group(g) => &g.name,
            Self::Record(r) => &r.name,
            Self::Segment(s) => &s.name,
            Self::Field(f) => &f.name,
        }
    }
}

impl From<GroupConfig> for ComponentConfig {
    fn from(v: GroupConfig) -> Self {
        Self::Group(v)
    }
}

impl From<RecordConfig> for ComponentConfig {
    fn from(v: RecordConfig) -> Self {
        Self::Record(v)
    }
}

impl From<SegmentConfig> for ComponentConfig {
    fn from(v: SegmentConfig) -> Self {
        Self::Segment(v)
    }
}

impl From<FieldConfig> for ComponentConfig {
    fn from(v: FieldConfig) -> Self {
        Self::Field(v)
    }
}

/// Root of the configuration tree: one logical stream layout.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StreamConfig {
    /// Stream name.
    pub name: String,
    /// Wire format.
    pub format: StreamFormat,
    /// Compile mode.
    pub mode: StreamMode,
    /// Ordering of the implicit root group.
    pub order: GroupOrder,
    /// Policy for unidentifiable records.
    pub on_unidentified: UnidentifiedPolicy,
    /// Enable resolution of protected members.
    pub allow_protected_access: bool,
    /// Default whitespace trimming for fields.
    pub trim: bool,
    /// Decode escape sequences in string and character fields.
    pub escape_strings: bool,
    /// Additionally decode `\0` to NUL when escaping is enabled.
    pub null_escape: bool,
    /// Top-level records and groups.
    pub children: Vec<ComponentConfig>,
}

impl StreamConfig {
    pub fn new(name: impl Into<String>, format: StreamFormat) -> Self {
        Self {
            name: name.into(),
            format,
            mode: StreamMode::ReadWrite,
            order: GroupOrder::Sequential,
            on_unidentified: UnidentifiedPolicy::Fail,
            allow_protected_access: false,
            trim: false,
            escape_strings: false,
            null_escape: false,
            children: Vec::new(),
        }
    }

    pub fn mode(mut self, mode: StreamMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn unordered(mut self) -> Self {
        self.order = GroupOrder::Unordered;
        self
    }

    pub fn child(mut self, child: impl Into<ComponentConfig>) -> Self {
        self.children.push(child.into());
        self
    }
}
