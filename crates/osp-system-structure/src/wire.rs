//! ---
//! osp_section: "03-system-structure-model"
//! osp_subsection: "module"
//! osp_type: "source"
//! osp_scope: "code"
//! osp_description: "Object model of the OSP system structure configuration."
//! osp_version: "v0.1.0"
//! osp_owner: "tbd"
//! ---
//! Lookup helpers over wire dictionaries. Wire input is assumed schema-valid,
//! so these only translate a wrong shape into [`ModelError::Wire`].

use serde_json::Value;

use crate::errors::{ModelError, Result};
use crate::XmlDict;

pub(crate) fn mismatch(entity: &'static str, key: &str, message: impl Into<String>) -> ModelError {
    ModelError::Wire {
        entity,
        key: key.to_owned(),
        message: message.into(),
    }
}

pub(crate) fn get<'a>(dict: &'a XmlDict, entity: &'static str, key: &str) -> Result<&'a Value> {
    dict.get(key)
        .ok_or_else(|| mismatch(entity, key, "key is missing"))
}

/// Present and not `null`.
pub(crate) fn get_opt<'a>(dict: &'a XmlDict, key: &str) -> Option<&'a Value> {
    dict.get(key).filter(|value| !value.is_null())
}

pub(crate) fn string(dict: &XmlDict, entity: &'static str, key: &str) -> Result<String> {
    get(dict, entity, key)?
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| mismatch(entity, key, "expected a string"))
}

pub(crate) fn float(dict: &XmlDict, entity: &'static str, key: &str) -> Result<f64> {
    as_float(get(dict, entity, key)?, entity, key)
}

pub(crate) fn opt_float(dict: &XmlDict, entity: &'static str, key: &str) -> Result<Option<f64>> {
    get_opt(dict, key)
        .map(|value| as_float(value, entity, key))
        .transpose()
}

pub(crate) fn as_float(value: &Value, entity: &'static str, key: &str) -> Result<f64> {
    osp_xml::double_from_value(value)
        .ok_or_else(|| mismatch(entity, key, "expected a number, INF, -INF or NaN"))
}

pub(crate) fn count(dict: &XmlDict, entity: &'static str, key: &str) -> Result<u32> {
    get(dict, entity, key)?
        .as_u64()
        .and_then(|value| u32::try_from(value).ok())
        .ok_or_else(|| mismatch(entity, key, "expected a non-negative integer"))
}

pub(crate) fn object<'a>(dict: &'a XmlDict, entity: &'static str, key: &str) -> Result<&'a XmlDict> {
    get(dict, entity, key)?
        .as_object()
        .ok_or_else(|| mismatch(entity, key, "expected a dictionary"))
}

/// Items of a repeatable element. A lone dictionary counts as a single item
/// and `null` or an absent key as none.
pub(crate) fn list<'a>(dict: &'a XmlDict, entity: &'static str, key: &str) -> Result<Vec<&'a XmlDict>> {
    match get_opt(dict, key) {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_object()
                    .ok_or_else(|| mismatch(entity, key, "expected a list of dictionaries"))
            })
            .collect(),
        Some(Value::Object(item)) => Ok(vec![item]),
        Some(_) => Err(mismatch(entity, key, "expected a list of dictionaries")),
    }
}

pub(crate) fn list_value(items: impl IntoIterator<Item = XmlDict>) -> Value {
    Value::Array(items.into_iter().map(Value::Object).collect())
}
