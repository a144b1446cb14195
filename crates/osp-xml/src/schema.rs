//! ---
//! osp_section: "02-schema-wire-format"
//! osp_subsection: "module"
//! osp_type: "source"
//! osp_scope: "code"
//! osp_description: "Schema-driven XML codec for OSP documents."
//! osp_version: "v0.1.0"
//! osp_owner: "tbd"
//! ---
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use tracing::debug;

use crate::error::Result;

const OSP_SYSTEM_STRUCTURE_YAML: &str = include_str!("../schemas/OspSystemStructure.yaml");

static OSP_SYSTEM_STRUCTURE: Lazy<Arc<XmlSchema>> = Lazy::new(|| {
    Arc::new(
        XmlSchema::from_yaml_str(OSP_SYSTEM_STRUCTURE_YAML)
            .expect("bundled OspSystemStructure schema is valid"),
    )
});

fn default_min_occurs() -> u32 {
    1
}

/// Grammar of one document type: the root element and everything below it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XmlSchema {
    pub root: String,
    pub namespace: String,
    #[serde(flatten)]
    pub element: ElementDecl,
}

impl XmlSchema {
    /// Schema of the OSP system structure document, parsed once per process.
    pub fn osp_system_structure() -> Arc<XmlSchema> {
        Arc::clone(&OSP_SYSTEM_STRUCTURE)
    }

    /// Load a schema descriptor from disk. `.json` files are read as JSON,
    /// anything else as YAML.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(schema_path = %path.display(), "loading schema descriptor");
        let raw = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if is_json {
            Self::from_json_str(&raw)
        } else {
            Self::from_yaml_str(&raw)
        }
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Declaration of the element reached by following `names` from the root.
    pub fn lookup(&self, names: &[&str]) -> Option<&ElementDecl> {
        let mut current = &self.element;
        for name in names {
            current = &current.child(name)?.element;
        }
        Some(current)
    }
}

/// Content model of a single element.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ElementDecl {
    #[serde(default)]
    pub attributes: Vec<AttributeDecl>,
    #[serde(default)]
    pub text: Option<SimpleType>,
    #[serde(default)]
    pub enumeration: Vec<String>,
    #[serde(default)]
    pub compositor: Compositor,
    #[serde(default)]
    pub children: Vec<ChildDecl>,
}

impl ElementDecl {
    /// Text-only element that decodes straight to its typed value.
    pub fn is_simple(&self) -> bool {
        self.text.is_some() && self.attributes.is_empty() && self.children.is_empty()
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeDecl> {
        self.attributes.iter().find(|attr| attr.name == name)
    }

    pub fn child(&self, name: &str) -> Option<&ChildDecl> {
        self.children.iter().find(|child| child.name == name)
    }

    pub(crate) fn alternatives(&self) -> String {
        self.children
            .iter()
            .map(|child| child.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: SimpleType,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildDecl {
    pub name: String,
    #[serde(default = "default_min_occurs")]
    pub min_occurs: u32,
    #[serde(default)]
    pub max_occurs: MaxOccurs,
    #[serde(flatten)]
    pub element: ElementDecl,
}

impl ChildDecl {
    /// Repeatable children are always represented as arrays, even with a single occurrence.
    pub fn is_list(&self) -> bool {
        match self.max_occurs {
            MaxOccurs::Bounded(max) => max > 1,
            MaxOccurs::Unbounded => true,
        }
    }

    pub fn allows(&self, count: usize) -> bool {
        let above_min = count >= self.min_occurs as usize;
        match self.max_occurs {
            MaxOccurs::Bounded(max) => above_min && count <= max as usize,
            MaxOccurs::Unbounded => above_min,
        }
    }
}

/// How the children of an element combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compositor {
    /// Children appear in declaration order, each within its own occurrence bounds.
    #[default]
    Sequence,
    /// Like `Sequence`, but the children may appear in any order.
    All,
    /// Exactly one of the declared children is present.
    Choice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "OccursRepr", into = "OccursRepr")]
pub enum MaxOccurs {
    Bounded(u32),
    Unbounded,
}

impl Default for MaxOccurs {
    fn default() -> Self {
        MaxOccurs::Bounded(1)
    }
}

impl fmt::Display for MaxOccurs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaxOccurs::Bounded(max) => write!(f, "{}", max),
            MaxOccurs::Unbounded => f.write_str("unbounded"),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum OccursRepr {
    Count(u32),
    Keyword(String),
}

impl TryFrom<OccursRepr> for MaxOccurs {
    type Error = String;

    fn try_from(repr: OccursRepr) -> std::result::Result<Self, Self::Error> {
        match repr {
            OccursRepr::Count(count) => Ok(MaxOccurs::Bounded(count)),
            OccursRepr::Keyword(keyword) if keyword == "unbounded" => Ok(MaxOccurs::Unbounded),
            OccursRepr::Keyword(other) => Err(format!("invalid max_occurs '{}'", other)),
        }
    }
}

impl From<MaxOccurs> for OccursRepr {
    fn from(max: MaxOccurs) -> Self {
        match max {
            MaxOccurs::Bounded(count) => OccursRepr::Count(count),
            MaxOccurs::Unbounded => OccursRepr::Keyword("unbounded".to_owned()),
        }
    }
}

/// XML Schema built-in types used by attributes and text content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimpleType {
    #[serde(rename = "string")]
    String,
    #[serde(rename = "double")]
    Double,
    #[serde(rename = "int")]
    Int,
    #[serde(rename = "unsignedInt")]
    UnsignedInt,
    #[serde(rename = "boolean")]
    Boolean,
}

impl SimpleType {
    pub fn as_str(self) -> &'static str {
        match self {
            SimpleType::String => "xs:string",
            SimpleType::Double => "xs:double",
            SimpleType::Int => "xs:int",
            SimpleType::UnsignedInt => "xs:unsignedInt",
            SimpleType::Boolean => "xs:boolean",
        }
    }

    /// Typed value of a lexical representation, `None` when it is not valid for the type.
    pub fn parse(self, raw: &str) -> Option<Value> {
        match self {
            SimpleType::String => Some(Value::String(raw.to_owned())),
            SimpleType::Double => parse_double(raw.trim()).map(double_value),
            SimpleType::Int => raw.trim().parse::<i32>().ok().map(Value::from),
            SimpleType::UnsignedInt => raw.trim().parse::<u64>().ok().map(Value::from),
            SimpleType::Boolean => match raw.trim() {
                "true" | "1" => Some(Value::Bool(true)),
                "false" | "0" => Some(Value::Bool(false)),
                _ => None,
            },
        }
    }

    /// Lexical representation of a typed value, `None` when the value does not fit the type.
    pub fn render(self, value: &Value) -> Option<String> {
        match self {
            SimpleType::String => value.as_str().map(str::to_owned),
            SimpleType::Double => double_from_value(value).map(format_double),
            SimpleType::Int => value
                .as_i64()
                .and_then(|v| i32::try_from(v).ok())
                .map(|v| v.to_string()),
            SimpleType::UnsignedInt => value.as_u64().map(|v| v.to_string()),
            SimpleType::Boolean => value.as_bool().map(|v| v.to_string()),
        }
    }
}

impl fmt::Display for SimpleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const POSITIVE_INFINITY: &str = "INF";
const NEGATIVE_INFINITY: &str = "-INF";
const NOT_A_NUMBER: &str = "NaN";

/// Wire value of an `xs:double`. JSON numbers cannot hold non-finite values,
/// so those keep their lexical form: `"INF"`, `"-INF"` or `"NaN"`.
pub fn double_value(value: f64) -> Value {
    match Number::from_f64(value) {
        Some(number) => Value::Number(number),
        None if value.is_nan() => Value::String(NOT_A_NUMBER.to_owned()),
        None if value > 0.0 => Value::String(POSITIVE_INFINITY.to_owned()),
        None => Value::String(NEGATIVE_INFINITY.to_owned()),
    }
}

/// Inverse of [`double_value`].
pub fn double_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(lexical) => match lexical.as_str() {
            POSITIVE_INFINITY => Some(f64::INFINITY),
            NEGATIVE_INFINITY => Some(f64::NEG_INFINITY),
            NOT_A_NUMBER => Some(f64::NAN),
            _ => None,
        },
        _ => None,
    }
}

// Rust also reads `inf` and `nan`, which are not xs:double literals.
fn parse_double(lexical: &str) -> Option<f64> {
    match lexical {
        POSITIVE_INFINITY | "+INF" => Some(f64::INFINITY),
        NEGATIVE_INFINITY => Some(f64::NEG_INFINITY),
        NOT_A_NUMBER => Some(f64::NAN),
        _ => lexical.parse::<f64>().ok().filter(|value| value.is_finite()),
    }
}

// Debug formatting keeps the shortest representation that parses back to the same bits.
fn format_double(value: f64) -> String {
    if value.is_nan() {
        NOT_A_NUMBER.to_owned()
    } else if value.is_infinite() {
        let lexical = if value > 0.0 { POSITIVE_INFINITY } else { NEGATIVE_INFINITY };
        lexical.to_owned()
    } else {
        format!("{:?}", value)
    }
}
