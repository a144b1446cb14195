//! ---
//! osp_section: "03-system-structure-model"
//! osp_subsection: "module"
//! osp_type: "source"
//! osp_scope: "code"
//! osp_description: "Object model of the OSP system structure configuration."
//! osp_version: "v0.1.0"
//! osp_owner: "tbd"
//! ---
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ModelError>;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("{entity}: a required argument, '{field}', is missing")]
    MissingField {
        entity: &'static str,
        field: &'static str,
    },
    #[error("{entity}: '{field}' must not be empty")]
    EmptyField {
        entity: &'static str,
        field: &'static str,
    },
    #[error("{entity}: only {expected} variable endpoints are allowed, found {found}")]
    EndpointCount {
        entity: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("unsupported {family} type '{tag}'")]
    UnsupportedVariant { family: &'static str, tag: String },
    #[error("the algorithm for integration should be one of [{allowed}], got '{value}'")]
    UnsupportedAlgorithm { value: String, allowed: String },
    #[error("{entity}: malformed wire dictionary at '{key}': {message}")]
    Wire {
        entity: &'static str,
        key: String,
        message: String,
    },
    #[error(transparent)]
    Xml(#[from] osp_xml::XmlError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
