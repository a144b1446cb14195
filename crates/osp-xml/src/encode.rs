//! ---
//! osp_section: "02-schema-wire-format"
//! osp_subsection: "module"
//! osp_type: "source"
//! osp_scope: "code"
//! osp_description: "Schema-driven XML codec for OSP documents."
//! osp_version: "v0.1.0"
//! osp_owner: "tbd"
//! ---
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde_json::Value;
use tracing::debug;

use crate::decode::{check_enumeration, check_occurrences};
use crate::error::{Result, XmlError};
use crate::schema::{ChildDecl, ElementDecl, XmlSchema};
use crate::{XmlDict, ATTRIBUTE_PREFIX, NAMESPACE_KEY, TEXT_KEY};

/// Layout of encoded documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Spaces per nesting level; `0` writes the document on one line.
    pub indent: usize,
    pub xml_declaration: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            indent: 2,
            xml_declaration: true,
        }
    }
}

impl XmlSchema {
    /// Encode a wire dictionary as XML text after validating it against the schema.
    pub fn encode(&self, dict: &XmlDict) -> Result<String> {
        self.encode_with(dict, &EncodeOptions::default())
    }

    pub fn encode_with(&self, dict: &XmlDict, options: &EncodeOptions) -> Result<String> {
        let mut writer = if options.indent > 0 {
            Writer::new_with_indent(Vec::new(), b' ', options.indent)
        } else {
            Writer::new(Vec::new())
        };
        if options.xml_declaration {
            writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        }
        self.write_root(&mut writer, dict)?;
        let text = String::from_utf8(writer.into_inner())?;
        debug!(root = %self.root, bytes = text.len(), "encoded document");
        Ok(text)
    }

    pub fn encode_file(
        &self,
        dict: &XmlDict,
        options: &EncodeOptions,
        path: impl AsRef<Path>,
    ) -> Result<()> {
        let text = self.encode_with(dict, options)?;
        fs::write(path.as_ref(), text)?;
        Ok(())
    }

    /// Check a wire dictionary against the schema without producing text.
    pub fn validate(&self, dict: &XmlDict) -> Result<()> {
        let mut writer = Writer::new(io::sink());
        self.write_root(&mut writer, dict)
    }

    fn write_root<W: Write>(&self, writer: &mut Writer<W>, dict: &XmlDict) -> Result<()> {
        if let Some(declared) = dict.get(NAMESPACE_KEY) {
            if declared.as_str() != Some(self.namespace.as_str()) {
                return Err(XmlError::NamespaceMismatch {
                    expected: self.namespace.clone(),
                    found: declared.as_str().map(str::to_owned),
                });
            }
        }
        let body: XmlDict = dict
            .iter()
            .filter(|(key, _)| key.as_str() != NAMESPACE_KEY)
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        let path = format!("/{}", self.root);
        write_element(
            writer,
            &self.root,
            &Value::Object(body),
            &self.element,
            &path,
            Some(&self.namespace),
        )
    }
}

fn write_element<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    value: &Value,
    decl: &ElementDecl,
    path: &str,
    namespace: Option<&str>,
) -> Result<()> {
    let mut start = BytesStart::new(name);
    if let Some(namespace) = namespace {
        start.push_attribute(("xmlns", namespace));
    }

    if let (true, Some(ty)) = (decl.is_simple(), decl.text) {
        let text = ty.render(value).ok_or_else(|| XmlError::InvalidValue {
            path: path.to_owned(),
            ty,
            raw: value.to_string(),
        })?;
        check_enumeration(decl, &text, path)?;
        writer.write_event(Event::Start(start))?;
        writer.write_event(Event::Text(BytesText::new(&text)))?;
        writer.write_event(Event::End(BytesEnd::new(name)))?;
        return Ok(());
    }

    let empty = XmlDict::new();
    let dict = match value {
        Value::Null => &empty,
        Value::Object(dict) => dict,
        other => {
            return Err(XmlError::malformed(
                path,
                format!("expected an element dictionary, found {}", other),
            ))
        }
    };

    let mut text = None;
    for (key, item) in dict {
        if let Some(attr_name) = key.strip_prefix(ATTRIBUTE_PREFIX) {
            let attr = decl
                .attribute(attr_name)
                .ok_or_else(|| XmlError::UnexpectedAttribute {
                    path: path.to_owned(),
                    name: attr_name.to_owned(),
                })?;
            let lexical = attr.ty.render(item).ok_or_else(|| XmlError::InvalidValue {
                path: format!("{}/@{}", path, attr_name),
                ty: attr.ty,
                raw: item.to_string(),
            })?;
            start.push_attribute((attr_name, lexical.as_str()));
        } else if key == TEXT_KEY {
            let ty = decl.text.ok_or_else(|| XmlError::UnexpectedText {
                path: path.to_owned(),
            })?;
            let lexical = ty.render(item).ok_or_else(|| XmlError::InvalidValue {
                path: path.to_owned(),
                ty,
                raw: item.to_string(),
            })?;
            check_enumeration(decl, &lexical, path)?;
            text = Some(lexical);
        } else if decl.child(key).is_none() {
            return Err(XmlError::UnexpectedElement {
                path: path.to_owned(),
                name: key.clone(),
            });
        }
    }
    for attr in decl.attributes.iter().filter(|attr| attr.required) {
        if !dict.contains_key(&crate::attribute_key(&attr.name)) {
            return Err(XmlError::MissingAttribute {
                path: path.to_owned(),
                name: attr.name.clone(),
            });
        }
    }

    let mut children: Vec<(&ChildDecl, Vec<&Value>)> = Vec::with_capacity(decl.children.len());
    for child in &decl.children {
        let items = match dict.get(&child.name) {
            None => Vec::new(),
            Some(Value::Array(items)) if child.is_list() => items.iter().collect(),
            Some(Value::Array(_)) => {
                return Err(XmlError::malformed(
                    path,
                    format!("'{}' occurs at most once and cannot be a list", child.name),
                ))
            }
            Some(item) => vec![item],
        };
        children.push((child, items));
    }
    let counts: Vec<usize> = children.iter().map(|(_, items)| items.len()).collect();
    check_occurrences(decl, &counts, path)?;

    if text.is_none() && counts.iter().all(|&count| count == 0) {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    if let Some(text) = &text {
        writer.write_event(Event::Text(BytesText::new(text)))?;
    }
    for (child, items) in children {
        for (index, item) in items.into_iter().enumerate() {
            let child_path = if child.is_list() {
                format!("{}/{}[{}]", path, child.name, index + 1)
            } else {
                format!("{}/{}", path, child.name)
            };
            write_element(writer, &child.name, item, &child.element, &child_path, None)?;
        }
    }
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}
