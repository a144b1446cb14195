//! ---
//! osp_section: "03-system-structure-model"
//! osp_subsection: "module"
//! osp_type: "source"
//! osp_scope: "code"
//! osp_description: "Object model of the OSP system structure configuration."
//! osp_version: "v0.1.0"
//! osp_owner: "tbd"
//! ---
//! Connection terminals. Endpoints are plain identifier pairs and carry no
//! reference to the simulator or function they name.

use serde_json::Value;

use crate::errors::Result;
use crate::{required_identifier, wire, DictXml, XmlDict};

const NAME_KEY: &str = "@name";
const SIMULATOR_KEY: &str = "@simulator";
const FUNCTION_KEY: &str = "@function";

/// A variable of a simulator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OspVariableEndpoint {
    pub simulator: String,
    pub name: String,
}

impl OspVariableEndpoint {
    pub fn new(simulator: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            simulator: simulator.into(),
            name: name.into(),
        }
    }

    pub fn builder() -> OspVariableEndpointBuilder {
        OspVariableEndpointBuilder::default()
    }
}

impl DictXml for OspVariableEndpoint {
    const ENTITY: &'static str = "OspVariableEndpoint";
    const REQUIRED_FIELDS: &'static [&'static str] = &["simulator", "name"];

    fn from_dict_xml(dict: &XmlDict) -> Result<Self> {
        Ok(Self {
            simulator: wire::string(dict, Self::ENTITY, SIMULATOR_KEY)?,
            name: wire::string(dict, Self::ENTITY, NAME_KEY)?,
        })
    }

    fn to_dict_xml(&self) -> XmlDict {
        let mut dict = XmlDict::new();
        dict.insert(SIMULATOR_KEY.to_owned(), Value::from(self.simulator.as_str()));
        dict.insert(NAME_KEY.to_owned(), Value::from(self.name.as_str()));
        dict
    }
}

#[derive(Debug, Default, Clone)]
pub struct OspVariableEndpointBuilder {
    simulator: Option<String>,
    name: Option<String>,
}

impl OspVariableEndpointBuilder {
    pub fn simulator(mut self, simulator: impl Into<String>) -> Self {
        self.simulator = Some(simulator.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn build(self) -> Result<OspVariableEndpoint> {
        const ENTITY: &str = OspVariableEndpoint::ENTITY;
        Ok(OspVariableEndpoint {
            simulator: required_identifier(ENTITY, "simulator", self.simulator)?,
            name: required_identifier(ENTITY, "name", self.name)?,
        })
    }
}

/// A signal of a function.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OspSignalEndpoint {
    pub function: String,
    pub name: String,
}

impl OspSignalEndpoint {
    pub fn new(function: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            name: name.into(),
        }
    }

    pub fn builder() -> OspSignalEndpointBuilder {
        OspSignalEndpointBuilder::default()
    }
}

impl DictXml for OspSignalEndpoint {
    const ENTITY: &'static str = "OspSignalEndpoint";
    const REQUIRED_FIELDS: &'static [&'static str] = &["function", "name"];

    fn from_dict_xml(dict: &XmlDict) -> Result<Self> {
        Ok(Self {
            function: wire::string(dict, Self::ENTITY, FUNCTION_KEY)?,
            name: wire::string(dict, Self::ENTITY, NAME_KEY)?,
        })
    }

    fn to_dict_xml(&self) -> XmlDict {
        let mut dict = XmlDict::new();
        dict.insert(FUNCTION_KEY.to_owned(), Value::from(self.function.as_str()));
        dict.insert(NAME_KEY.to_owned(), Value::from(self.name.as_str()));
        dict
    }
}

#[derive(Debug, Default, Clone)]
pub struct OspSignalEndpointBuilder {
    function: Option<String>,
    name: Option<String>,
}

impl OspSignalEndpointBuilder {
    pub fn function(mut self, function: impl Into<String>) -> Self {
        self.function = Some(function.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn build(self) -> Result<OspSignalEndpoint> {
        const ENTITY: &str = OspSignalEndpoint::ENTITY;
        Ok(OspSignalEndpoint {
            function: required_identifier(ENTITY, "function", self.function)?,
            name: required_identifier(ENTITY, "name", self.name)?,
        })
    }
}
