//! In-memory model of schema fragments.
//!
//! Raw JSON fragments are parsed once into [`SchemaNode`]s stored in a
//! [`NodeArena`]. Nodes point at their children through [`NodeId`]s, so a
//! node can be cloned or renamed without touching the shared arena entry.

use crate::error::{CodegenError, Result};
use serde_json::{Map, Number, Value};
use std::collections::BTreeSet;
use std::fmt;

/// Index of a node inside a [`NodeArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Scalar and container types a schema `type` may name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Integer,
    Number,
    Boolean,
    String,
    Array,
    Object,
    Mixed,
}

impl Primitive {
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "integer" => Some(Self::Integer),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            "string" => Some(Self::String),
            "array" => Some(Self::Array),
            "object" => Some(Self::Object),
            "mixed" => Some(Self::Mixed),
            _ => None,
        }
    }

    /// Scalars can be inlined in place of a reference to them
    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            Self::Integer | Self::Number | Self::Boolean | Self::String
        )
    }

    /// TypeScript expression for this primitive
    pub fn ts_type(self) -> &'static str {
        match self {
            Self::Integer | Self::Number => "number",
            Self::Boolean => "boolean",
            Self::String => "string",
            Self::Array => "any[]",
            Self::Object => "{ [key: string]: unknown }",
            Self::Mixed => "any /* mixed primitive */",
        }
    }
}

/// A literal enum value
#[derive(Debug, Clone, PartialEq)]
pub enum EnumValue {
    Number(Number),
    String(String),
}

impl EnumValue {
    /// Numeric coercion with the semantics of a unary plus on the raw value:
    /// numbers are themselves, strings are trimmed and parsed, the empty
    /// string is zero and anything unparseable is `None`.
    pub fn coerce_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            Self::String(s) => {
                let s = s.trim();
                if s.is_empty() {
                    return Some(0.0);
                }
                if let Some(value) = parse_radix_literal(s) {
                    return value;
                }
                match s {
                    "Infinity" | "+Infinity" => Some(f64::INFINITY),
                    "-Infinity" => Some(f64::NEG_INFINITY),
                    _ if s.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') => {
                        None
                    }
                    _ => s.parse::<f64>().ok(),
                }
            }
        }
    }

    /// True when the value coerces to a non-zero number
    pub fn is_truthy_number(&self) -> bool {
        self.coerce_number().is_some_and(|n| n != 0.0 && !n.is_nan())
    }

    /// TypeScript literal: strings single-quoted, numbers bare
    pub fn ts_literal(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::String(s) => format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
        }
    }
}

impl fmt::Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

/// `0x`, `0o` and `0b` literals. `Some(None)` for a prefix with bad digits.
fn parse_radix_literal(s: &str) -> Option<Option<f64>> {
    let (radix, digits) = match s.get(..2)? {
        "0x" | "0X" => (16, &s[2..]),
        "0o" | "0O" => (8, &s[2..]),
        "0b" | "0B" => (2, &s[2..]),
        _ => return None,
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Some(None);
    }
    Some(u64::from_str_radix(digits, radix).ok().map(|v| v as f64))
}

/// `enum` modifier with optional `enumNames`
#[derive(Debug, Clone, PartialEq)]
pub struct EnumSpec {
    pub values: Vec<EnumValue>,
    pub names: Option<Vec<String>>,
}

/// Shape of a schema node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// A single declared `type`
    Primitive(Primitive),
    /// A `type` array such as `["integer", "string"]`
    Primitives(Vec<Primitive>),
    /// `type: array` with `items`
    Array(NodeId),
    /// `$ref`, holding the definition name
    Ref(String),
    OneOf(Vec<NodeId>),
    /// `allOf`, plus any properties declared next to it
    AllOf {
        bases: Vec<NodeId>,
        properties: Vec<NodeId>,
    },
    /// Object with declared properties
    Object(Vec<NodeId>),
    /// Nothing we know how to classify
    Untyped,
}

/// A parsed schema fragment
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    pub name: String,
    /// Naming scope for synthetic names of nested declarations
    pub parent_name: Option<String>,
    pub kind: NodeKind,
    pub enumeration: Option<EnumSpec>,
    /// Property names that must be non-optional (object nodes)
    pub required: BTreeSet<String>,
    /// `required: true` on a method parameter
    pub required_flag: bool,
    pub description: Option<String>,
    /// Raw `type` string, kept for error reporting
    pub declared_type: Option<String>,
}

impl SchemaNode {
    /// Clone of this node under another name.
    ///
    /// Child ids are shared with the original; the arena entry stays as is.
    pub fn aliased(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    /// The node's own properties, for object-like nodes
    pub fn properties(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Object(properties) | NodeKind::AllOf { properties, .. } => properties,
            _ => &[],
        }
    }

    pub fn ref_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Ref(name) => Some(name),
            _ => None,
        }
    }

    /// True for placeholder names synthesized from `patternProperties`
    pub fn is_pattern_property(&self) -> bool {
        is_pattern_property(&self.name)
    }
}

/// Owner of every node parsed during a generation run
#[derive(Debug, Clone, Default)]
pub struct NodeArena {
    nodes: Vec<SchemaNode>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a node by id
    ///
    /// Ids are only handed out by this arena, so the lookup cannot miss.
    pub fn get(&self, id: NodeId) -> &SchemaNode {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Store a node built outside of [`NodeArena::parse`]
    pub fn insert(&mut self, node: SchemaNode) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Parse a raw fragment, and recursively its children, into the arena
    pub fn parse(&mut self, raw: &Value, name: &str, parent_name: Option<&str>) -> Result<NodeId> {
        let object = raw.as_object().ok_or_else(|| {
            CodegenError::malformed(name, format!("expected a key-value mapping, got {raw}"))
        })?;

        let declared_type = object.get("type").and_then(Value::as_str).map(str::to_string);
        let description = object
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string);
        let enumeration = parse_enum(object, name)?;

        let (required, required_flag) = match object.get("required") {
            Some(Value::Array(names)) => (
                names
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect(),
                false,
            ),
            Some(Value::Bool(flag)) => (BTreeSet::new(), *flag),
            _ => (BTreeSet::new(), false),
        };

        let kind = self.parse_kind(object, name, declared_type.as_deref())?;

        Ok(self.insert(SchemaNode {
            name: name.to_string(),
            parent_name: parent_name.map(str::to_string),
            kind,
            enumeration,
            required,
            required_flag,
            description,
            declared_type,
        }))
    }

    fn parse_kind(
        &mut self,
        object: &Map<String, Value>,
        name: &str,
        declared_type: Option<&str>,
    ) -> Result<NodeKind> {
        if let Some(Value::Array(alternatives)) = object.get("oneOf") {
            if !alternatives.is_empty() {
                let ids = alternatives
                    .iter()
                    .map(|alt| self.parse(alt, name, None))
                    .collect::<Result<Vec<_>>>()?;
                return Ok(NodeKind::OneOf(ids));
            }
        }

        if declared_type == Some("array") {
            if let Some(items) = object.get("items").filter(|v| v.is_object()) {
                let item = self.parse(items, &format!("{name}_items"), Some(name))?;
                return Ok(NodeKind::Array(item));
            }
        }

        if let Some(reference) = object.get("$ref").and_then(Value::as_str) {
            return Ok(NodeKind::Ref(ref_to_name(reference).to_string()));
        }

        let properties = self.parse_properties(object, name)?;

        if let Some(Value::Array(bases)) = object.get("allOf") {
            if !bases.is_empty() {
                let bases = bases
                    .iter()
                    .map(|base| self.parse(base, name, None))
                    .collect::<Result<Vec<_>>>()?;
                return Ok(NodeKind::AllOf { bases, properties });
            }
        }

        if !properties.is_empty() || declared_type == Some("object") {
            return Ok(NodeKind::Object(properties));
        }

        match object.get("type") {
            Some(Value::String(t)) => Ok(Primitive::from_type_name(t)
                .map(NodeKind::Primitive)
                .unwrap_or(NodeKind::Untyped)),
            Some(Value::Array(types)) => {
                let primitives = types
                    .iter()
                    .map(|t| t.as_str().and_then(Primitive::from_type_name))
                    .collect::<Option<Vec<_>>>();
                match primitives {
                    Some(p) if !p.is_empty() => Ok(NodeKind::Primitives(p)),
                    _ => Ok(NodeKind::Untyped),
                }
            }
            _ => Ok(NodeKind::Untyped),
        }
    }

    fn parse_properties(&mut self, object: &Map<String, Value>, name: &str) -> Result<Vec<NodeId>> {
        let mut ids = Vec::new();

        if let Some(properties) = object.get("properties") {
            let properties = properties
                .as_object()
                .ok_or_else(|| CodegenError::malformed(name, "\"properties\" is not a mapping"))?;
            for (property_name, property) in properties {
                ids.push(self.parse(property, property_name, Some(name))?);
            }
        }

        if let Some(patterns) = object.get("patternProperties") {
            let patterns = patterns.as_object().ok_or_else(|| {
                CodegenError::malformed(name, "\"patternProperties\" is not a mapping")
            })?;
            for (pattern, property) in patterns {
                ids.push(self.parse(property, pattern_property_name(pattern), Some(name))?);
            }
        }

        Ok(ids)
    }
}

fn parse_enum(object: &Map<String, Value>, name: &str) -> Result<Option<EnumSpec>> {
    let Some(Value::Array(raw_values)) = object.get("enum") else {
        return Ok(None);
    };

    let values = raw_values
        .iter()
        .map(|value| match value {
            Value::Number(n) => Ok(EnumValue::Number(n.clone())),
            Value::String(s) => Ok(EnumValue::String(s.clone())),
            other => Err(CodegenError::malformed(
                name,
                format!("enum values must be numbers or strings, got {other}"),
            )),
        })
        .collect::<Result<Vec<_>>>()?;

    let names = match object.get("enumNames") {
        Some(Value::Array(names)) => Some(
            names
                .iter()
                .map(|n| match n {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
        ),
        _ => None,
    };

    Ok(Some(EnumSpec { values, names }))
}

/// Definition name a `$ref` points at: the text after the last `/`
pub fn ref_to_name(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}

/// Placeholder property name for a `patternProperties` key
pub fn pattern_property_name(pattern: &str) -> &'static str {
    match pattern {
        "^[0-9]+$" | "^\\d+$" | "[0-9]+" | "\\d+" => "[key: number]",
        _ => "[key: string]",
    }
}

pub fn is_pattern_property(name: &str) -> bool {
    name.starts_with("[key: ")
}
