//! ---
//! osp_section: "02-schema-wire-format"
//! osp_subsection: "module"
//! osp_type: "source"
//! osp_scope: "code"
//! osp_description: "Schema-driven XML codec for OSP documents."
//! osp_version: "v0.1.0"
//! osp_owner: "tbd"
//! ---
//! Schema-driven conversion between XML text and nested wire dictionaries.
//!
//! A wire dictionary mirrors the element tree of a document: attributes are
//! keyed with an `@` prefix, child elements by their tag name, repeatable
//! elements always become arrays and empty elements become `null`. Every
//! scalar is typed according to the [`XmlSchema`] that governs the document,
//! so `stepSize="0.1"` decodes to the float `0.1` rather than a string.
//!
//! ```ignore
//! use osp_xml::XmlSchema;
//!
//! let schema = XmlSchema::osp_system_structure();
//! let dict = schema.decode(&std::fs::read_to_string("OspSystemStructure.xml")?)?;
//! let xml = schema.encode(&dict)?;
//! ```

pub mod decode;
pub mod encode;
pub mod error;
pub mod schema;

pub use encode::EncodeOptions;
pub use error::{Result, XmlError};
pub use schema::{
    double_from_value, double_value, AttributeDecl, ChildDecl, Compositor, ElementDecl, MaxOccurs,
    SimpleType, XmlSchema,
};

/// Nested dictionary form of an XML element.
pub type XmlDict = serde_json::Map<String, serde_json::Value>;

/// Key prefix marking attributes in a wire dictionary.
pub const ATTRIBUTE_PREFIX: char = '@';

/// Key holding the text content of an element that also carries attributes.
pub const TEXT_KEY: &str = "$";

/// Key holding the default namespace declaration of the root element.
pub const NAMESPACE_KEY: &str = "@xmlns";

/// Wire key for an attribute name.
pub fn attribute_key(name: &str) -> String {
    format!("{}{}", ATTRIBUTE_PREFIX, name)
}
