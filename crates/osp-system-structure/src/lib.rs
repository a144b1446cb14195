//! ---
//! osp_section: "03-system-structure-model"
//! osp_subsection: "module"
//! osp_type: "source"
//! osp_scope: "code"
//! osp_description: "Object model of the OSP system structure configuration."
//! osp_version: "v0.1.0"
//! osp_owner: "tbd"
//! ---
//! Typed model of an OSP co-simulation system structure.
//!
//! The tree is rooted at [`OspSystemStructure`], which owns the simulators,
//! the functions aggregate and the connections aggregate. Every entity can be
//! built from its fields (typed `new` constructors or builders that enforce the
//! required-field set) or from a wire dictionary, and serialises back to the
//! same wire dictionary shape through [`DictXml`].

pub mod connection;
pub mod endpoint;
pub mod errors;
pub mod function;
pub mod simulator;
pub mod system;
pub mod value;

mod wire;

pub use connection::{
    ConnectionKind, OspConnection, OspConnections, OspSignalConnection,
    OspSignalGroupConnection, OspVariableConnection, OspVariableGroupConnection,
};
pub use endpoint::{OspSignalEndpoint, OspVariableEndpoint};
pub use errors::{ModelError, Result};
pub use function::{
    FunctionKind, OspFunction, OspFunctions, OspLinearTransformationFunction, OspSumFunction,
    OspVectorSumFunction,
};
pub use osp_xml::{EncodeOptions, XmlDict, XmlSchema};
pub use simulator::{split_source, OspSimulator};
pub use system::{Algorithm, OspSystemStructure, DEFAULT_VERSION};
pub use value::{OspInitialValue, OspValue, ValueKind};

/// Two-way mapping between an entity and its wire dictionary.
pub trait DictXml: Sized {
    /// Entity name used in error messages.
    const ENTITY: &'static str;
    /// Fields that construction from fields must supply.
    const REQUIRED_FIELDS: &'static [&'static str];

    /// Rebuild the entity from a schema-valid wire dictionary.
    fn from_dict_xml(dict: &XmlDict) -> Result<Self>;

    fn to_dict_xml(&self) -> XmlDict;
}

/// Required-field check shared by the builders: absent is a missing field,
/// present but blank is an empty one.
pub(crate) fn required_identifier(
    entity: &'static str,
    field: &'static str,
    value: Option<String>,
) -> Result<String> {
    let value = value.ok_or(ModelError::MissingField { entity, field })?;
    if value.trim().is_empty() {
        return Err(ModelError::EmptyField { entity, field });
    }
    Ok(value)
}
