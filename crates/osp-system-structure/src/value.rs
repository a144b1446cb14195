//! ---
//! osp_section: "03-system-structure-model"
//! osp_subsection: "module"
//! osp_type: "source"
//! osp_scope: "code"
//! osp_description: "Object model of the OSP system structure configuration."
//! osp_version: "v0.1.0"
//! osp_owner: "tbd"
//! ---
use std::fmt;
use std::str::FromStr;

use osp_xml::double_value;
use serde_json::Value;

use crate::errors::{ModelError, Result};
use crate::{required_identifier, wire, DictXml, XmlDict};

const VALUE_KEY: &str = "@value";
const VARIABLE_KEY: &str = "@variable";

/// The four kinds of typed initial value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Real,
    Integer,
    String,
    Boolean,
}

impl ValueKind {
    /// Probe order when a wire dictionary is searched for a value element.
    /// A malformed dictionary carrying several tags resolves to the first hit.
    pub const DISPATCH_ORDER: [ValueKind; 4] = [
        ValueKind::Real,
        ValueKind::Integer,
        ValueKind::String,
        ValueKind::Boolean,
    ];

    /// Element tag of the kind. Other tools match on these names, keep them stable.
    pub const fn kind_name(self) -> &'static str {
        match self {
            ValueKind::Real => "Real",
            ValueKind::Integer => "Integer",
            ValueKind::String => "String",
            ValueKind::Boolean => "Boolean",
        }
    }

    /// First kind, in dispatch order, whose tag is a key of `dict`.
    pub fn detect(dict: &XmlDict) -> Option<ValueKind> {
        Self::DISPATCH_ORDER
            .into_iter()
            .find(|kind| dict.contains_key(kind.kind_name()))
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind_name())
    }
}

impl FromStr for ValueKind {
    type Err = ModelError;

    fn from_str(tag: &str) -> Result<Self> {
        Self::DISPATCH_ORDER
            .into_iter()
            .find(|kind| kind.kind_name() == tag)
            .ok_or_else(|| ModelError::UnsupportedVariant {
                family: "value",
                tag: tag.to_owned(),
            })
    }
}

/// Typed value wrapper used by initial values.
#[derive(Debug, Clone, PartialEq)]
pub enum OspValue {
    Real(f64),
    /// `xs:int`.
    Integer(i32),
    String(String),
    Boolean(bool),
}

impl OspValue {
    pub const REQUIRED_FIELDS: &'static [&'static str] = &["value"];

    pub fn kind(&self) -> ValueKind {
        match self {
            OspValue::Real(_) => ValueKind::Real,
            OspValue::Integer(_) => ValueKind::Integer,
            OspValue::String(_) => ValueKind::String,
            OspValue::Boolean(_) => ValueKind::Boolean,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        self.kind().kind_name()
    }

    /// Rebuild a wrapper of `kind` from the dictionary found under its tag.
    pub fn from_dict_xml(kind: ValueKind, dict: &XmlDict) -> Result<Self> {
        let entity = kind.kind_name();
        let raw = wire::get(dict, entity, VALUE_KEY)?;
        let value = match kind {
            ValueKind::Real => OspValue::Real(wire::as_float(raw, entity, VALUE_KEY)?),
            ValueKind::Integer => OspValue::Integer(
                raw.as_i64()
                    .and_then(|value| i32::try_from(value).ok())
                    .ok_or_else(|| wire::mismatch(entity, VALUE_KEY, "expected a 32-bit integer"))?,
            ),
            ValueKind::String => OspValue::String(
                raw.as_str()
                    .map(str::to_owned)
                    .ok_or_else(|| wire::mismatch(entity, VALUE_KEY, "expected a string"))?,
            ),
            ValueKind::Boolean => OspValue::Boolean(
                raw.as_bool()
                    .ok_or_else(|| wire::mismatch(entity, VALUE_KEY, "expected a boolean"))?,
            ),
        };
        Ok(value)
    }

    pub fn to_dict_xml(&self) -> XmlDict {
        let value = match self {
            OspValue::Real(value) => double_value(*value),
            OspValue::Integer(value) => Value::from(*value),
            OspValue::String(value) => Value::from(value.as_str()),
            OspValue::Boolean(value) => Value::from(*value),
        };
        let mut dict = XmlDict::new();
        dict.insert(VALUE_KEY.to_owned(), value);
        dict
    }
}

impl From<f64> for OspValue {
    fn from(value: f64) -> Self {
        OspValue::Real(value)
    }
}

impl From<i32> for OspValue {
    fn from(value: i32) -> Self {
        OspValue::Integer(value)
    }
}

impl From<bool> for OspValue {
    fn from(value: bool) -> Self {
        OspValue::Boolean(value)
    }
}

impl From<&str> for OspValue {
    fn from(value: &str) -> Self {
        OspValue::String(value.to_owned())
    }
}

impl From<String> for OspValue {
    fn from(value: String) -> Self {
        OspValue::String(value)
    }
}

/// Initial value of one simulator variable.
#[derive(Debug, Clone, PartialEq)]
pub struct OspInitialValue {
    pub variable: String,
    pub value: OspValue,
}

impl OspInitialValue {
    pub fn new(variable: impl Into<String>, value: impl Into<OspValue>) -> Self {
        Self {
            variable: variable.into(),
            value: value.into(),
        }
    }

    pub fn builder() -> OspInitialValueBuilder {
        OspInitialValueBuilder::default()
    }
}

impl DictXml for OspInitialValue {
    const ENTITY: &'static str = "OspInitialValue";
    const REQUIRED_FIELDS: &'static [&'static str] = &["variable", "value"];

    fn from_dict_xml(dict: &XmlDict) -> Result<Self> {
        let variable = wire::string(dict, Self::ENTITY, VARIABLE_KEY)?;
        let kind = ValueKind::detect(dict).ok_or_else(|| {
            wire::mismatch(Self::ENTITY, "Real|Integer|String|Boolean", "no value element")
        })?;
        let value = OspValue::from_dict_xml(kind, wire::object(dict, Self::ENTITY, kind.kind_name())?)?;
        Ok(Self { variable, value })
    }

    fn to_dict_xml(&self) -> XmlDict {
        let mut dict = XmlDict::new();
        dict.insert(VARIABLE_KEY.to_owned(), Value::from(self.variable.as_str()));
        dict.insert(
            self.value.kind_name().to_owned(),
            Value::Object(self.value.to_dict_xml()),
        );
        dict
    }
}

#[derive(Debug, Default, Clone)]
pub struct OspInitialValueBuilder {
    variable: Option<String>,
    value: Option<OspValue>,
}

impl OspInitialValueBuilder {
    pub fn variable(mut self, variable: impl Into<String>) -> Self {
        self.variable = Some(variable.into());
        self
    }

    pub fn value(mut self, value: impl Into<OspValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn build(self) -> Result<OspInitialValue> {
        const ENTITY: &str = OspInitialValue::ENTITY;
        let variable = required_identifier(ENTITY, "variable", self.variable)?;
        let value = self.value.ok_or(ModelError::MissingField {
            entity: ENTITY,
            field: "value",
        })?;
        Ok(OspInitialValue { variable, value })
    }
}
