//! ---
//! osp_section: "03-system-structure-model"
//! osp_subsection: "module"
//! osp_type: "source"
//! osp_scope: "code"
//! osp_description: "Object model of the OSP system structure configuration."
//! osp_version: "v0.1.0"
//! osp_owner: "tbd"
//! ---
//! Root of the configuration tree and the only entity bound to a schema.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use osp_xml::{double_value, EncodeOptions, XmlSchema, NAMESPACE_KEY};
use serde_json::Value;
use tracing::{debug, info};

use crate::connection::{OspConnection, OspConnections};
use crate::errors::{ModelError, Result};
use crate::function::{OspFunction, OspFunctions};
use crate::simulator::OspSimulator;
use crate::{wire, DictXml, XmlDict};

const START_TIME_KEY: &str = "StartTime";
const BASE_STEP_SIZE_KEY: &str = "BaseStepSize";
const ALGORITHM_KEY: &str = "Algorithm";
const SIMULATORS_KEY: &str = "Simulators";
const SIMULATOR_KEY: &str = "Simulator";
const FUNCTIONS_KEY: &str = "Functions";
const CONNECTIONS_KEY: &str = "Connections";
const VERSION_KEY: &str = "@version";

pub const DEFAULT_VERSION: &str = "0.1";

/// Co-simulation master algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Algorithm {
    #[default]
    FixedStep,
}

impl Algorithm {
    pub const ALLOWED: [Algorithm; 1] = [Algorithm::FixedStep];

    pub const fn as_str(self) -> &'static str {
        match self {
            Algorithm::FixedStep => "fixedStep",
        }
    }

    fn allowed_list() -> String {
        Self::ALLOWED
            .iter()
            .map(|algorithm| algorithm.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = ModelError;

    fn from_str(value: &str) -> Result<Self> {
        Self::ALLOWED
            .into_iter()
            .find(|algorithm| algorithm.as_str() == value)
            .ok_or_else(|| ModelError::UnsupportedAlgorithm {
                value: value.to_owned(),
                allowed: Self::allowed_list(),
            })
    }
}

/// A complete system structure document.
#[derive(Debug, Clone)]
pub struct OspSystemStructure {
    /// `None` only for documents read without a `StartTime`.
    pub start_time: Option<f64>,
    /// Left to the solver when unset.
    pub base_step_size: Option<f64>,
    algorithm: Option<Algorithm>,
    pub simulators: Vec<OspSimulator>,
    pub functions: OspFunctions,
    pub connections: OspConnections,
    /// `None` only for documents read without a `version` attribute.
    pub version: Option<String>,
    schema: Arc<XmlSchema>,
}

impl Default for OspSystemStructure {
    fn default() -> Self {
        Self::with_schema(XmlSchema::osp_system_structure())
    }
}

impl PartialEq for OspSystemStructure {
    fn eq(&self, other: &Self) -> bool {
        self.start_time == other.start_time
            && self.base_step_size == other.base_step_size
            && self.algorithm == other.algorithm
            && self.simulators == other.simulators
            && self.functions == other.functions
            && self.connections == other.connections
            && self.version == other.version
    }
}

impl OspSystemStructure {
    /// Empty structure bound to the bundled schema.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema(schema: Arc<XmlSchema>) -> Self {
        Self {
            start_time: Some(0.0),
            base_step_size: None,
            algorithm: Some(Algorithm::default()),
            simulators: Vec::new(),
            functions: OspFunctions::new(),
            connections: OspConnections::new(),
            version: Some(DEFAULT_VERSION.to_owned()),
            schema,
        }
    }

    pub fn builder() -> OspSystemStructureBuilder {
        OspSystemStructureBuilder::default()
    }

    pub fn schema(&self) -> &Arc<XmlSchema> {
        &self.schema
    }

    /// Start time in seconds, `0.0` when the document leaves it out.
    pub fn start_time(&self) -> f64 {
        self.start_time.unwrap_or(0.0)
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm.unwrap_or_default()
    }

    /// Assign the algorithm by its wire name. A rejected value leaves the
    /// current algorithm untouched.
    pub fn set_algorithm(&mut self, value: &str) -> Result<()> {
        self.algorithm = Some(value.parse()?);
        Ok(())
    }

    pub fn version(&self) -> &str {
        self.version.as_deref().unwrap_or(DEFAULT_VERSION)
    }

    pub fn add_simulator(&mut self, simulator: OspSimulator) {
        self.simulators.push(simulator);
    }

    pub fn add_connection(&mut self, connection: impl Into<OspConnection>) {
        self.connections.add_connection(connection);
    }

    pub fn add_function(&mut self, function: impl Into<OspFunction>) {
        self.functions.add_function(function);
    }

    pub fn simulator(&self, name: &str) -> Option<&OspSimulator> {
        self.simulators
            .iter()
            .find(|simulator| simulator.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.simulators.is_empty() && self.functions.is_empty() && self.connections.is_empty()
    }

    pub fn from_dict_xml_with_schema(dict: &XmlDict, schema: Arc<XmlSchema>) -> Result<Self> {
        let mut structure = Self::with_schema(schema);
        structure.load_dict_xml(dict)?;
        Ok(structure)
    }

    /// Replace the whole content with `dict`. Scalars absent from `dict` stay
    /// absent so that the wire form is reproduced as read.
    fn load_dict_xml(&mut self, dict: &XmlDict) -> Result<()> {
        const ENTITY: &str = OspSystemStructure::ENTITY;
        let mut loaded = Self::with_schema(Arc::clone(&self.schema));
        loaded.start_time = wire::opt_float(dict, ENTITY, START_TIME_KEY)?;
        loaded.base_step_size = wire::opt_float(dict, ENTITY, BASE_STEP_SIZE_KEY)?;
        loaded.algorithm = None;
        if wire::get_opt(dict, ALGORITHM_KEY).is_some() {
            loaded.set_algorithm(&wire::string(dict, ENTITY, ALGORITHM_KEY)?)?;
        }
        if wire::get_opt(dict, SIMULATORS_KEY).is_some() {
            let container = wire::object(dict, ENTITY, SIMULATORS_KEY)?;
            loaded.simulators = wire::list(container, ENTITY, SIMULATOR_KEY)?
                .into_iter()
                .map(OspSimulator::from_dict_xml)
                .collect::<Result<Vec<_>>>()?;
        }
        if wire::get_opt(dict, FUNCTIONS_KEY).is_some() {
            loaded.functions = OspFunctions::from_dict_xml(wire::object(dict, ENTITY, FUNCTIONS_KEY)?)?;
        }
        if wire::get_opt(dict, CONNECTIONS_KEY).is_some() {
            loaded.connections =
                OspConnections::from_dict_xml(wire::object(dict, ENTITY, CONNECTIONS_KEY)?)?;
        }
        loaded.version = match wire::get_opt(dict, VERSION_KEY) {
            Some(_) => Some(wire::string(dict, ENTITY, VERSION_KEY)?),
            None => None,
        };
        debug!(
            simulators = loaded.simulators.len(),
            functions = loaded.functions.len(),
            connections = loaded.connections.len(),
            "system structure loaded from wire dictionary"
        );
        *self = loaded;
        Ok(())
    }

    /// Decode XML text with the bundled schema.
    pub fn from_xml_str(text: &str) -> Result<Self> {
        Self::from_xml_str_with_schema(text, XmlSchema::osp_system_structure())
    }

    pub fn from_xml_str_with_schema(text: &str, schema: Arc<XmlSchema>) -> Result<Self> {
        let mut structure = Self::with_schema(schema);
        structure.from_xml(text)?;
        Ok(structure)
    }

    /// Replace the content of this instance with the document in `text`,
    /// decoded with the instance's own schema. On error nothing is changed.
    #[allow(clippy::wrong_self_convention)]
    pub fn from_xml(&mut self, text: &str) -> Result<()> {
        let dict = self.schema.decode(text)?;
        self.load_dict_xml(&dict)
    }

    pub fn from_xml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let dict = XmlSchema::osp_system_structure().decode_file(path)?;
        let structure = Self::from_dict_xml(&dict)?;
        info!(
            path = %path.display(),
            simulators = structure.simulators.len(),
            "loaded system structure"
        );
        Ok(structure)
    }

    /// Validated XML text with the default layout.
    pub fn to_xml_string(&self) -> Result<String> {
        self.to_xml_string_with(&EncodeOptions::default())
    }

    pub fn to_xml_string_with(&self, options: &EncodeOptions) -> Result<String> {
        Ok(self.schema.encode_with(&self.to_dict_xml(), options)?)
    }

    pub fn write_xml_file(&self, path: impl AsRef<Path>, options: &EncodeOptions) -> Result<()> {
        let path = path.as_ref();
        self.schema.encode_file(&self.to_dict_xml(), options, path)?;
        info!(path = %path.display(), "wrote system structure");
        Ok(())
    }

    /// Check the wire form against the schema without encoding it.
    pub fn validate(&self) -> Result<()> {
        Ok(self.schema.validate(&self.to_dict_xml())?)
    }
}

impl DictXml for OspSystemStructure {
    const ENTITY: &'static str = "OspSystemStructure";
    const REQUIRED_FIELDS: &'static [&'static str] = &[];

    /// Uses the bundled schema; see [`OspSystemStructure::from_dict_xml_with_schema`].
    fn from_dict_xml(dict: &XmlDict) -> Result<Self> {
        Self::from_dict_xml_with_schema(dict, XmlSchema::osp_system_structure())
    }

    fn to_dict_xml(&self) -> XmlDict {
        let mut dict = XmlDict::new();
        dict.insert(
            NAMESPACE_KEY.to_owned(),
            Value::from(self.schema.namespace.as_str()),
        );
        if let Some(start_time) = self.start_time {
            dict.insert(START_TIME_KEY.to_owned(), double_value(start_time));
        }
        if let Some(base_step_size) = self.base_step_size {
            dict.insert(BASE_STEP_SIZE_KEY.to_owned(), double_value(base_step_size));
        }
        if let Some(algorithm) = self.algorithm {
            dict.insert(ALGORITHM_KEY.to_owned(), Value::from(algorithm.as_str()));
        }
        let simulators = if self.simulators.is_empty() {
            Value::Null
        } else {
            let mut container = XmlDict::new();
            container.insert(
                SIMULATOR_KEY.to_owned(),
                wire::list_value(self.simulators.iter().map(|simulator| simulator.to_dict_xml())),
            );
            Value::Object(container)
        };
        dict.insert(SIMULATORS_KEY.to_owned(), simulators);
        if let Some(functions) = self.functions.to_dict_xml() {
            dict.insert(FUNCTIONS_KEY.to_owned(), Value::Object(functions));
        }
        if let Some(connections) = self.connections.to_dict_xml() {
            dict.insert(CONNECTIONS_KEY.to_owned(), Value::Object(connections));
        }
        if let Some(version) = &self.version {
            dict.insert(VERSION_KEY.to_owned(), Value::from(version.as_str()));
        }
        dict
    }
}

#[derive(Debug, Default, Clone)]
pub struct OspSystemStructureBuilder {
    start_time: Option<f64>,
    base_step_size: Option<f64>,
    algorithm: Option<String>,
    simulators: Vec<OspSimulator>,
    functions: OspFunctions,
    connections: OspConnections,
    version: Option<String>,
    schema: Option<Arc<XmlSchema>>,
}

impl OspSystemStructureBuilder {
    pub fn start_time(mut self, start_time: f64) -> Self {
        self.start_time = Some(start_time);
        self
    }

    pub fn base_step_size(mut self, base_step_size: f64) -> Self {
        self.base_step_size = Some(base_step_size);
        self
    }

    /// Checked against [`Algorithm::ALLOWED`] by `build`.
    pub fn algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.algorithm = Some(algorithm.into());
        self
    }

    pub fn simulator(mut self, simulator: OspSimulator) -> Self {
        self.simulators.push(simulator);
        self
    }

    pub fn function(mut self, function: impl Into<OspFunction>) -> Self {
        self.functions.add_function(function);
        self
    }

    pub fn connection(mut self, connection: impl Into<OspConnection>) -> Self {
        self.connections.add_connection(connection);
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn schema(mut self, schema: Arc<XmlSchema>) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn build(self) -> Result<OspSystemStructure> {
        let schema = self
            .schema
            .unwrap_or_else(XmlSchema::osp_system_structure);
        let mut structure = OspSystemStructure::with_schema(schema);
        if let Some(algorithm) = &self.algorithm {
            structure.set_algorithm(algorithm)?;
        }
        if let Some(start_time) = self.start_time {
            structure.start_time = Some(start_time);
        }
        structure.base_step_size = self.base_step_size;
        structure.simulators = self.simulators;
        structure.functions = self.functions;
        structure.connections = self.connections;
        if let Some(version) = self.version {
            structure.version = Some(version);
        }
        Ok(structure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{OspSumFunction, OspVariableConnection, OspVariableEndpoint};
    use serde_json::json;

    #[test]
    fn rejected_algorithm_keeps_previous_value() {
        let mut structure = OspSystemStructure::new();
        let err = structure.set_algorithm("variableStep").unwrap_err();
        assert!(matches!(err, ModelError::UnsupportedAlgorithm { ref value, .. } if value == "variableStep"));
        assert_eq!(structure.algorithm(), Algorithm::FixedStep);
        structure.set_algorithm("fixedStep").unwrap();
        assert_eq!(structure.algorithm().to_string(), "fixedStep");
    }

    #[test]
    fn empty_structure_wire_form() {
        let structure = OspSystemStructure::new();
        assert!(structure.is_empty());
        assert_eq!(
            Value::Object(structure.to_dict_xml()),
            json!({
                "@xmlns": "http://opensimulationplatform.com/MSMI/OSPSystemStructure",
                "StartTime": 0.0,
                "Algorithm": "fixedStep",
                "Simulators": null,
                "@version": "0.1"
            })
        );
    }

    #[test]
    fn mutators_populate_the_tree() {
        let mut structure = OspSystemStructure::new();
        structure.add_simulator(OspSimulator::new("a", "a.fmu"));
        structure.add_simulator(OspSimulator::new("b", "b.fmu"));
        structure.add_connection(OspVariableConnection::new(
            OspVariableEndpoint::new("a", "y"),
            OspVariableEndpoint::new("b", "u"),
        ));
        structure.add_function(OspSumFunction::new("total", 2));

        assert!(!structure.is_empty());
        assert_eq!(structure.simulator("b").map(|s| s.source.as_str()), Some("b.fmu"));
        assert!(structure.simulator("c").is_none());

        let dict = structure.to_dict_xml();
        assert_eq!(dict["Connections"]["VariableConnection"][0]["Variable"][1]["@simulator"], json!("b"));
        assert_eq!(OspSystemStructure::from_dict_xml(&dict).unwrap(), structure);
    }

    #[test]
    fn builder_validates_algorithm() {
        let err = OspSystemStructure::builder()
            .algorithm("euler")
            .build()
            .unwrap_err();
        assert!(matches!(err, ModelError::UnsupportedAlgorithm { .. }));

        let structure = OspSystemStructure::builder()
            .start_time(1.5)
            .base_step_size(0.01)
            .version("0.2")
            .simulator(OspSimulator::new("a", "a.fmu"))
            .build()
            .unwrap();
        let dict = structure.to_dict_xml();
        assert_eq!(dict["BaseStepSize"], json!(0.01));
        assert_eq!(dict["@version"], json!("0.2"));
        assert_eq!(OspSystemStructure::from_dict_xml(&dict).unwrap(), structure);
    }

    #[test]
    fn from_xml_replaces_content_and_keeps_it_on_failure() {
        let mut structure = OspSystemStructure::new();
        structure.add_simulator(OspSimulator::new("old", "old.fmu"));

        let text = r#"<OspSystemStructure xmlns="http://opensimulationplatform.com/MSMI/OSPSystemStructure" version="0.1">
            <BaseStepSize>0.05</BaseStepSize>
            <Simulators><Simulator name="new" source="fmu/new.fmu"/></Simulators>
        </OspSystemStructure>"#;
        structure.from_xml(text).unwrap();
        assert_eq!(structure.simulators.len(), 1);
        assert_eq!(structure.simulators[0].fmu_rel_path, "fmu/");
        assert_eq!(structure.base_step_size, Some(0.05));
        assert_eq!(structure.start_time, None);
        assert_eq!(structure.start_time(), 0.0);
        assert!(!structure.to_dict_xml().contains_key("Algorithm"));
        assert_eq!(structure.algorithm(), Algorithm::FixedStep);

        assert!(structure.from_xml("<Broken>").is_err());
        assert_eq!(structure.simulators[0].name, "new");
    }
}
