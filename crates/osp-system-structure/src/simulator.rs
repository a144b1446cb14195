//! ---
//! osp_section: "03-system-structure-model"
//! osp_subsection: "module"
//! osp_type: "source"
//! osp_scope: "code"
//! osp_description: "Object model of the OSP system structure configuration."
//! osp_version: "v0.1.0"
//! osp_owner: "tbd"
//! ---
use osp_xml::double_value;
use serde_json::Value;

use crate::errors::Result;
use crate::value::OspInitialValue;
use crate::{required_identifier, wire, DictXml, XmlDict};

const NAME_KEY: &str = "@name";
const SOURCE_KEY: &str = "@source";
const STEP_SIZE_KEY: &str = "@stepSize";
const INITIAL_VALUES_KEY: &str = "InitialValues";
const INITIAL_VALUE_KEY: &str = "InitialValue";

/// Split a wire `source` at its last `/` into `(fmu_rel_path, source)`.
/// The separator stays on the relative path so concatenation restores the input.
pub fn split_source(raw: &str) -> (&str, &str) {
    match raw.rfind('/') {
        Some(index) => raw.split_at(index + 1),
        None => ("", raw),
    }
}

/// A simulated component (FMU) of the system.
#[derive(Debug, Clone, PartialEq)]
pub struct OspSimulator {
    pub name: String,
    /// File name of the FMU.
    pub source: String,
    /// Directory prefix of the FMU, empty or ending in `/`.
    pub fmu_rel_path: String,
    pub step_size: Option<f64>,
    /// `Some(vec![])` is an `InitialValues` element without entries.
    pub initial_values: Option<Vec<OspInitialValue>>,
}

impl OspSimulator {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            fmu_rel_path: String::new(),
            step_size: None,
            initial_values: None,
        }
    }

    pub fn builder() -> OspSimulatorBuilder {
        OspSimulatorBuilder::default()
    }

    /// The `source` attribute as written on the wire.
    pub fn source_path(&self) -> String {
        format!("{}{}", self.fmu_rel_path, self.source)
    }

    pub fn add_initial_value(&mut self, initial_value: OspInitialValue) {
        self.initial_values
            .get_or_insert_with(Vec::new)
            .push(initial_value);
    }

    pub fn initial_value(&self, variable: &str) -> Option<&OspInitialValue> {
        self.initial_values
            .as_deref()?
            .iter()
            .find(|initial| initial.variable == variable)
    }
}

impl DictXml for OspSimulator {
    const ENTITY: &'static str = "OspSimulator";
    const REQUIRED_FIELDS: &'static [&'static str] = &["name", "source"];

    fn from_dict_xml(dict: &XmlDict) -> Result<Self> {
        let raw_source = wire::string(dict, Self::ENTITY, SOURCE_KEY)?;
        let (fmu_rel_path, source) = split_source(&raw_source);
        let initial_values = match dict.get(INITIAL_VALUES_KEY) {
            None => None,
            Some(Value::Null) => Some(Vec::new()),
            Some(_) => {
                let container = wire::object(dict, Self::ENTITY, INITIAL_VALUES_KEY)?;
                let items = wire::list(container, Self::ENTITY, INITIAL_VALUE_KEY)?
                    .into_iter()
                    .map(OspInitialValue::from_dict_xml)
                    .collect::<Result<Vec<_>>>()?;
                Some(items)
            }
        };
        Ok(Self {
            name: wire::string(dict, Self::ENTITY, NAME_KEY)?,
            source: source.to_owned(),
            fmu_rel_path: fmu_rel_path.to_owned(),
            step_size: wire::opt_float(dict, Self::ENTITY, STEP_SIZE_KEY)?,
            initial_values,
        })
    }

    fn to_dict_xml(&self) -> XmlDict {
        let mut dict = XmlDict::new();
        dict.insert(NAME_KEY.to_owned(), Value::from(self.name.as_str()));
        dict.insert(SOURCE_KEY.to_owned(), Value::from(self.source_path()));
        if let Some(step_size) = self.step_size {
            dict.insert(STEP_SIZE_KEY.to_owned(), double_value(step_size));
        }
        if let Some(initial_values) = &self.initial_values {
            let container = if initial_values.is_empty() {
                Value::Null
            } else {
                let mut container = XmlDict::new();
                container.insert(
                    INITIAL_VALUE_KEY.to_owned(),
                    wire::list_value(initial_values.iter().map(|initial| initial.to_dict_xml())),
                );
                Value::Object(container)
            };
            dict.insert(INITIAL_VALUES_KEY.to_owned(), container);
        }
        dict
    }
}

#[derive(Debug, Default, Clone)]
pub struct OspSimulatorBuilder {
    name: Option<String>,
    source: Option<String>,
    fmu_rel_path: Option<String>,
    step_size: Option<f64>,
    initial_values: Option<Vec<OspInitialValue>>,
}

impl OspSimulatorBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// FMU file name, kept verbatim.
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn fmu_rel_path(mut self, fmu_rel_path: impl Into<String>) -> Self {
        self.fmu_rel_path = Some(fmu_rel_path.into());
        self
    }

    /// Full wire path, split into relative path and file name.
    pub fn source_path(self, raw: &str) -> Self {
        let (fmu_rel_path, source) = split_source(raw);
        self.fmu_rel_path(fmu_rel_path).source(source)
    }

    pub fn step_size(mut self, step_size: f64) -> Self {
        self.step_size = Some(step_size);
        self
    }

    pub fn initial_value(mut self, initial_value: OspInitialValue) -> Self {
        self.initial_values
            .get_or_insert_with(Vec::new)
            .push(initial_value);
        self
    }

    pub fn initial_values(mut self, initial_values: Vec<OspInitialValue>) -> Self {
        self.initial_values = Some(initial_values);
        self
    }

    pub fn build(self) -> Result<OspSimulator> {
        const ENTITY: &str = OspSimulator::ENTITY;
        Ok(OspSimulator {
            name: required_identifier(ENTITY, "name", self.name)?,
            source: required_identifier(ENTITY, "source", self.source)?,
            fmu_rel_path: self.fmu_rel_path.unwrap_or_default(),
            step_size: self.step_size,
            initial_values: self.initial_values,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ModelError, OspValue};
    use serde_json::json;

    fn dict(value: Value) -> XmlDict {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn source_splits_at_last_separator() {
        assert_eq!(split_source("a/b/c.fmu"), ("a/b/", "c.fmu"));
        assert_eq!(split_source("c.fmu"), ("", "c.fmu"));
        assert_eq!(split_source("dir/"), ("dir/", ""));

        for raw in ["a/b/c.fmu", "c.fmu"] {
            let simulator =
                OspSimulator::from_dict_xml(&dict(json!({"@name": "s", "@source": raw}))).unwrap();
            assert_eq!(simulator.source_path(), raw);
            assert_eq!(simulator.to_dict_xml()["@source"], json!(raw));
        }
    }

    #[test]
    fn optional_fields_are_omitted_when_unset() {
        let simulator = OspSimulator::new("chassis", "chassis.fmu");
        assert_eq!(
            Value::Object(simulator.to_dict_xml()),
            json!({"@name": "chassis", "@source": "chassis.fmu"})
        );
    }

    #[test]
    fn wire_form_round_trips_with_initial_values() {
        let raw = dict(json!({
            "@name": "wheel",
            "@source": "fmus/wheel.fmu",
            "@stepSize": 0.001,
            "InitialValues": {"InitialValue": [
                {"@variable": "radius", "Real": {"@value": 0.3}},
                {"@variable": "label", "String": {"@value": "front"}}
            ]}
        }));
        let simulator = OspSimulator::from_dict_xml(&raw).unwrap();
        assert_eq!(simulator.fmu_rel_path, "fmus/");
        assert_eq!(simulator.source, "wheel.fmu");
        assert_eq!(simulator.step_size, Some(0.001));
        assert_eq!(
            simulator.initial_value("radius").map(|initial| &initial.value),
            Some(&OspValue::Real(0.3))
        );
        assert_eq!(simulator.to_dict_xml(), raw);
    }

    #[test]
    fn empty_initial_values_container_round_trips() {
        let raw = dict(json!({"@name": "s", "@source": "s.fmu", "InitialValues": null}));
        let simulator = OspSimulator::from_dict_xml(&raw).unwrap();
        assert_eq!(simulator.initial_values, Some(Vec::new()));
        assert_eq!(simulator.to_dict_xml(), raw);
    }

    #[test]
    fn builder_checks_required_fields() {
        let err = OspSimulator::builder().name("s").build().unwrap_err();
        assert!(matches!(err, ModelError::MissingField { field: "source", .. }));

        let built = OspSimulator::builder()
            .name("s")
            .source_path("lib/s.fmu")
            .step_size(0.1)
            .initial_value(OspInitialValue::new("k", 2_i32))
            .build()
            .unwrap();
        assert_eq!(built.fmu_rel_path, "lib/");
        assert_eq!(built.source_path(), "lib/s.fmu");
        assert_eq!(OspSimulator::from_dict_xml(&built.to_dict_xml()).unwrap(), built);
    }
}
