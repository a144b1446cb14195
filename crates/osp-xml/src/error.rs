//! ---
//! osp_section: "02-schema-wire-format"
//! osp_subsection: "module"
//! osp_type: "source"
//! osp_scope: "code"
//! osp_description: "Schema-driven XML codec for OSP documents."
//! osp_version: "v0.1.0"
//! osp_owner: "tbd"
//! ---
use thiserror::Error;

use crate::schema::SimpleType;

pub type Result<T> = std::result::Result<T, XmlError>;

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("XML syntax error: {0}")]
    Syntax(#[from] quick_xml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("schema descriptor error: {0}")]
    SchemaYaml(#[from] serde_yaml::Error),
    #[error("schema descriptor error: {0}")]
    SchemaJson(#[from] serde_json::Error),
    #[error("encoded document is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("document contains no root element")]
    EmptyDocument,
    #[error("unexpected root element '{found}', expected '{expected}'")]
    UnexpectedRoot { expected: String, found: String },
    #[error("root element is in namespace {found:?}, expected '{expected}'")]
    NamespaceMismatch {
        expected: String,
        found: Option<String>,
    },
    #[error("{path}: element '{name}' is in namespace {found:?}, expected '{expected}'")]
    ElementNamespace {
        path: String,
        name: String,
        expected: String,
        found: Option<String>,
    },
    #[error("{path}: element '{name}' must come before '{after}'")]
    OutOfOrder {
        path: String,
        name: String,
        after: String,
    },
    #[error("{path}: element '{name}' is not allowed here")]
    UnexpectedElement { path: String, name: String },
    #[error("{path}: attribute '{name}' is not allowed here")]
    UnexpectedAttribute { path: String, name: String },
    #[error("{path}: required attribute '{name}' is missing")]
    MissingAttribute { path: String, name: String },
    #[error("{path}: element '{name}' occurs {found} time(s), allowed {min}..{max}")]
    Occurrence {
        path: String,
        name: String,
        min: u32,
        max: String,
        found: usize,
    },
    #[error("{path}: exactly one of [{alternatives}] is required, found {found}")]
    Choice {
        path: String,
        alternatives: String,
        found: usize,
    },
    #[error("{path}: '{raw}' is not a valid {ty}")]
    InvalidValue {
        path: String,
        ty: SimpleType,
        raw: String,
    },
    #[error("{path}: '{value}' is not one of [{allowed}]")]
    NotInEnumeration {
        path: String,
        value: String,
        allowed: String,
    },
    #[error("{path}: text content is not allowed here")]
    UnexpectedText { path: String },
    #[error("{path}: {message}")]
    Malformed { path: String, message: String },
}

impl XmlError {
    pub(crate) fn malformed(path: &str, message: impl Into<String>) -> Self {
        XmlError::Malformed {
            path: path.to_owned(),
            message: message.into(),
        }
    }
}
