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
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, XmlError};
use crate::schema::{Compositor, ElementDecl, XmlSchema};
use crate::{attribute_key, XmlDict, NAMESPACE_KEY, TEXT_KEY};

/// Element as read from the document, before the schema is applied.
#[derive(Debug, Default)]
struct RawElement {
    prefix: Option<String>,
    name: String,
    attributes: Vec<(String, String)>,
    namespaces: Vec<(Option<String>, String)>,
    namespace: Option<String>,
    text: String,
    children: Vec<RawElement>,
}

impl RawElement {
    fn open(start: &BytesStart<'_>) -> Result<Self> {
        let qname = start.name();
        let mut element = RawElement {
            prefix: qname
                .prefix()
                .map(|prefix| String::from_utf8_lossy(prefix.as_ref()).into_owned()),
            name: String::from_utf8_lossy(qname.local_name().as_ref()).into_owned(),
            ..RawElement::default()
        };
        for attr in start.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let key = attr.key.as_ref();
            let value = attr.unescape_value()?.into_owned();
            if key == b"xmlns" {
                element.namespaces.push((None, value));
            } else if let Some(prefix) = key.strip_prefix(b"xmlns:") {
                let prefix = String::from_utf8_lossy(prefix).into_owned();
                element.namespaces.push((Some(prefix), value));
            } else if attr.key.prefix().is_none() {
                let name = String::from_utf8_lossy(key).into_owned();
                element.attributes.push((name, value));
            }
            // Qualified attributes from foreign vocabularies (xsi:*) carry no model data.
        }
        Ok(element)
    }

    /// Resolve the element's prefix against its own declarations, then the
    /// enclosing elements from the innermost out. `xmlns=""` undeclares.
    fn resolve_namespace(&mut self, ancestors: &[RawElement]) {
        let prefix = self.prefix.as_deref();
        let namespace = std::iter::once(&*self)
            .chain(ancestors.iter().rev())
            .flat_map(|element| element.namespaces.iter())
            .find(|(declared, _)| declared.as_deref() == prefix)
            .map(|(_, uri)| uri.clone())
            .filter(|uri| !uri.is_empty());
        self.namespace = namespace;
    }
}

impl XmlSchema {
    /// Decode XML text into a wire dictionary, validating it against the schema.
    pub fn decode(&self, xml: &str) -> Result<XmlDict> {
        let root = read_tree(xml)?;
        if root.name != self.root {
            return Err(XmlError::UnexpectedRoot {
                expected: self.root.clone(),
                found: root.name,
            });
        }
        if root.namespace.as_deref() != Some(self.namespace.as_str()) {
            return Err(XmlError::NamespaceMismatch {
                expected: self.namespace.clone(),
                found: root.namespace,
            });
        }

        let path = format!("/{}", root.name);
        let mut dict = XmlDict::new();
        dict.insert(NAMESPACE_KEY.to_owned(), Value::String(self.namespace.clone()));
        if let Value::Object(body) = decode_element(&root, &self.element, &path, &self.namespace)? {
            dict.extend(body);
        }
        debug!(root = %self.root, keys = dict.len(), "decoded document");
        Ok(dict)
    }

    pub fn decode_file(&self, path: impl AsRef<Path>) -> Result<XmlDict> {
        let raw = fs::read_to_string(path.as_ref())?;
        self.decode(&raw)
    }
}

fn read_tree(xml: &str) -> Result<RawElement> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut stack: Vec<RawElement> = Vec::new();
    let mut root: Option<RawElement> = None;
    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                let mut element = RawElement::open(&start)?;
                element.resolve_namespace(&stack);
                stack.push(element);
            }
            Event::Empty(start) => {
                let mut element = RawElement::open(&start)?;
                element.resolve_namespace(&stack);
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| XmlError::malformed("/", "closing tag without opening tag"))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(XmlError::malformed(
            &format!("/{}", open.name),
            "document ends inside an open element",
        ));
    }
    root.ok_or(XmlError::EmptyDocument)
}

fn attach(
    stack: &mut [RawElement],
    root: &mut Option<RawElement>,
    element: RawElement,
) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => {
            return Err(XmlError::malformed(
                "/",
                format!("second root element '{}'", element.name),
            ))
        }
    }
    Ok(())
}

fn decode_element(
    raw: &RawElement,
    decl: &ElementDecl,
    path: &str,
    namespace: &str,
) -> Result<Value> {
    let text = match decl.text {
        Some(ty) => {
            let value = ty.parse(&raw.text).ok_or_else(|| XmlError::InvalidValue {
                path: path.to_owned(),
                ty,
                raw: raw.text.clone(),
            })?;
            check_enumeration(decl, &raw.text, path)?;
            Some(value)
        }
        None if !raw.text.trim().is_empty() => {
            return Err(XmlError::UnexpectedText {
                path: path.to_owned(),
            })
        }
        None => None,
    };

    if decl.is_simple() {
        if let Some(child) = raw.children.first() {
            return Err(XmlError::UnexpectedElement {
                path: path.to_owned(),
                name: child.name.clone(),
            });
        }
        if let Some((name, _)) = raw.attributes.first() {
            return Err(XmlError::UnexpectedAttribute {
                path: path.to_owned(),
                name: name.clone(),
            });
        }
        return Ok(text.unwrap_or(Value::Null));
    }

    let mut dict = XmlDict::new();
    for (name, lexical) in &raw.attributes {
        let attr = decl
            .attribute(name)
            .ok_or_else(|| XmlError::UnexpectedAttribute {
                path: path.to_owned(),
                name: name.clone(),
            })?;
        let value = attr.ty.parse(lexical).ok_or_else(|| XmlError::InvalidValue {
            path: format!("{}/@{}", path, name),
            ty: attr.ty,
            raw: lexical.clone(),
        })?;
        dict.insert(attribute_key(name), value);
    }
    for attr in decl.attributes.iter().filter(|attr| attr.required) {
        if !dict.contains_key(&attribute_key(&attr.name)) {
            return Err(XmlError::MissingAttribute {
                path: path.to_owned(),
                name: attr.name.clone(),
            });
        }
    }
    if let Some(text) = text {
        dict.insert(TEXT_KEY.to_owned(), text);
    }

    let mut counts = vec![0usize; decl.children.len()];
    let mut last_index = 0;
    for child in &raw.children {
        let index = decl
            .children
            .iter()
            .position(|candidate| candidate.name == child.name)
            .ok_or_else(|| XmlError::UnexpectedElement {
                path: path.to_owned(),
                name: child.name.clone(),
            })?;
        let child_decl = &decl.children[index];
        if decl.compositor == Compositor::Sequence && index < last_index {
            return Err(XmlError::OutOfOrder {
                path: path.to_owned(),
                name: child.name.clone(),
                after: decl.children[last_index].name.clone(),
            });
        }
        last_index = index;
        if child.namespace.as_deref() != Some(namespace) {
            return Err(XmlError::ElementNamespace {
                path: path.to_owned(),
                name: child.name.clone(),
                expected: namespace.to_owned(),
                found: child.namespace.clone(),
            });
        }
        counts[index] += 1;
        let child_path = if child_decl.is_list() {
            format!("{}/{}[{}]", path, child.name, counts[index])
        } else {
            format!("{}/{}", path, child.name)
        };
        let value = decode_element(child, &child_decl.element, &child_path, namespace)?;
        if child_decl.is_list() {
            match dict
                .entry(child.name.clone())
                .or_insert_with(|| Value::Array(Vec::new()))
            {
                Value::Array(items) => items.push(value),
                _ => return Err(XmlError::malformed(path, "list slot holds a scalar")),
            }
        } else {
            dict.insert(child.name.clone(), value);
        }
    }
    check_occurrences(decl, &counts, path)?;

    if dict.is_empty() {
        Ok(Value::Null)
    } else {
        Ok(Value::Object(dict))
    }
}

pub(crate) fn check_enumeration(decl: &ElementDecl, lexical: &str, path: &str) -> Result<()> {
    if decl.enumeration.is_empty() || decl.enumeration.iter().any(|item| item == lexical.trim()) {
        return Ok(());
    }
    Err(XmlError::NotInEnumeration {
        path: path.to_owned(),
        value: lexical.trim().to_owned(),
        allowed: decl.enumeration.join(", "),
    })
}

pub(crate) fn check_occurrences(decl: &ElementDecl, counts: &[usize], path: &str) -> Result<()> {
    match decl.compositor {
        Compositor::Sequence | Compositor::All => {
            for (child, &found) in decl.children.iter().zip(counts) {
                if !child.allows(found) {
                    return Err(XmlError::Occurrence {
                        path: path.to_owned(),
                        name: child.name.clone(),
                        min: child.min_occurs,
                        max: child.max_occurs.to_string(),
                        found,
                    });
                }
            }
        }
        Compositor::Choice => {
            let present = counts.iter().filter(|&&count| count > 0).count();
            let single = counts.iter().all(|&count| count <= 1);
            if present != 1 || !single {
                return Err(XmlError::Choice {
                    path: path.to_owned(),
                    alternatives: decl.alternatives(),
                    found: counts.iter().sum(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SimpleType;
    use serde_json::json;

    const NS: &str = "http://opensimulationplatform.com/MSMI/OSPSystemStructure";

    fn document(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<OspSystemStructure xmlns="{NS}" version="0.1">
{body}
</OspSystemStructure>"#
        )
    }

    #[test]
    fn decodes_typed_scalars_and_lists() {
        let xml = document(
            r#"
  <StartTime>0.0</StartTime>
  <BaseStepSize>0.01</BaseStepSize>
  <Algorithm>fixedStep</Algorithm>
  <Simulators>
    <Simulator name="Engine" source="fmus/Engine.fmu" stepSize="0.04">
      <InitialValues>
        <InitialValue variable="load"><Real value="3.5"/></InitialValue>
        <InitialValue variable="gears"><Integer value="7"/></InitialValue>
      </InitialValues>
    </Simulator>
  </Simulators>"#,
        );
        let dict = XmlSchema::osp_system_structure().decode(&xml).unwrap();

        assert_eq!(dict[NAMESPACE_KEY], json!(NS));
        assert_eq!(dict["@version"], json!("0.1"));
        assert_eq!(dict["StartTime"], json!(0.0));
        assert_eq!(dict["BaseStepSize"], json!(0.01));
        assert_eq!(dict["Algorithm"], json!("fixedStep"));
        assert_eq!(
            dict["Simulators"],
            json!({
                "Simulator": [{
                    "@name": "Engine",
                    "@source": "fmus/Engine.fmu",
                    "@stepSize": 0.04,
                    "InitialValues": {
                        "InitialValue": [
                            {"@variable": "load", "Real": {"@value": 3.5}},
                            {"@variable": "gears", "Integer": {"@value": 7}}
                        ]
                    }
                }]
            })
        );
    }

    #[test]
    fn empty_container_decodes_to_null() {
        let xml = document("<Simulators/><Connections></Connections>");
        let dict = XmlSchema::osp_system_structure().decode(&xml).unwrap();
        assert_eq!(dict["Simulators"], Value::Null);
        assert_eq!(dict["Connections"], Value::Null);
    }

    #[test]
    fn single_and_paired_endpoints_keep_their_shape() {
        let xml = document(
            r#"<Simulators/>
  <Connections>
    <VariableConnection>
      <Variable simulator="A" name="out"/>
      <Variable simulator="B" name="in"/>
    </VariableConnection>
    <SignalConnection>
      <Variable simulator="A" name="y"/>
      <Signal function="gain" name="in"/>
    </SignalConnection>
  </Connections>"#,
        );
        let dict = XmlSchema::osp_system_structure().decode(&xml).unwrap();
        let connections = &dict["Connections"];
        assert_eq!(connections["VariableConnection"][0]["Variable"][1]["@name"], json!("in"));
        assert_eq!(
            connections["SignalConnection"][0]["Signal"],
            json!({"@function": "gain", "@name": "in"})
        );
    }

    #[test]
    fn prefixed_root_resolves_namespace() {
        let xml = format!(
            r#"<osp:OspSystemStructure xmlns:osp="{NS}"><osp:Simulators/></osp:OspSystemStructure>"#
        );
        let dict = XmlSchema::osp_system_structure().decode(&xml).unwrap();
        assert_eq!(dict[NAMESPACE_KEY], json!(NS));
    }

    #[test]
    fn unprefixed_children_of_prefixed_root_are_foreign() {
        let xml = format!(
            r#"<osp:OspSystemStructure xmlns:osp="{NS}"><Simulators/></osp:OspSystemStructure>"#
        );
        let err = XmlSchema::osp_system_structure().decode(&xml).unwrap_err();
        assert!(
            matches!(err, XmlError::ElementNamespace { ref name, found: None, .. } if name == "Simulators"),
            "{err}"
        );

        let redeclared = format!(
            r#"<osp:OspSystemStructure xmlns:osp="{NS}"><Simulators xmlns="{NS}"><Simulator name="A" source="a.fmu"/></Simulators></osp:OspSystemStructure>"#
        );
        let dict = XmlSchema::osp_system_structure().decode(&redeclared).unwrap();
        assert_eq!(dict["Simulators"]["Simulator"][0]["@name"], json!("A"));
    }

    #[test]
    fn undeclared_default_namespace_is_rejected_below_the_root() {
        let xml = document(r#"<Simulators xmlns=""/>"#);
        let err = XmlSchema::osp_system_structure().decode(&xml).unwrap_err();
        assert!(matches!(err, XmlError::ElementNamespace { .. }), "{err}");
    }

    #[test]
    fn sequence_children_must_follow_declaration_order() {
        let xml = document("<Simulators/><StartTime>1.0</StartTime>");
        let err = XmlSchema::osp_system_structure().decode(&xml).unwrap_err();
        assert!(
            matches!(err, XmlError::OutOfOrder { ref name, ref after, .. } if name == "StartTime" && after == "Simulators"),
            "{err}"
        );

        let swapped = document(
            r#"<Simulators/><Connections><SignalConnection>
                <Signal function="gain" name="in"/>
                <Variable simulator="A" name="y"/>
            </SignalConnection></Connections>"#,
        );
        assert!(matches!(
            XmlSchema::osp_system_structure().decode(&swapped).unwrap_err(),
            XmlError::OutOfOrder { .. }
        ));
    }

    #[test]
    fn connection_and_function_kinds_may_interleave() {
        let xml = document(
            r#"<Simulators/>
  <Functions>
    <Sum name="s" inputCount="2"/>
    <LinearTransformation name="gain" factor="1.0" offset="0.0"/>
    <Sum name="t" inputCount="3"/>
  </Functions>
  <Connections>
    <SignalConnection>
      <Variable simulator="A" name="y"/>
      <Signal function="gain" name="in"/>
    </SignalConnection>
    <VariableConnection>
      <Variable simulator="A" name="out"/>
      <Variable simulator="B" name="in"/>
    </VariableConnection>
  </Connections>"#,
        );
        let dict = XmlSchema::osp_system_structure().decode(&xml).unwrap();
        assert_eq!(dict["Functions"]["Sum"].as_array().map(Vec::len), Some(2));
        assert_eq!(dict["Connections"]["VariableConnection"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn integers_are_limited_to_32_bits() {
        let xml = document(
            r#"<Simulators><Simulator name="A" source="a.fmu"><InitialValues>
                <InitialValue variable="n"><Integer value="3000000000"/></InitialValue>
            </InitialValues></Simulator></Simulators>"#,
        );
        assert!(matches!(
            XmlSchema::osp_system_structure().decode(&xml).unwrap_err(),
            XmlError::InvalidValue { ty: SimpleType::Int, .. }
        ));
    }

    #[test]
    fn non_finite_doubles_decode_to_lexical_values() {
        let xml = document(
            r#"<StartTime>-INF</StartTime>
  <Simulators><Simulator name="A" source="a.fmu"><InitialValues>
    <InitialValue variable="x"><Real value="INF"/></InitialValue>
    <InitialValue variable="y"><Real value="NaN"/></InitialValue>
  </InitialValues></Simulator></Simulators>
  <Functions><LinearTransformation name="gain" factor="INF" offset="NaN"/></Functions>"#,
        );
        let schema = XmlSchema::osp_system_structure();
        let dict = schema.decode(&xml).unwrap();
        assert_eq!(dict["StartTime"], json!("-INF"));
        let values = &dict["Simulators"]["Simulator"][0]["InitialValues"]["InitialValue"];
        assert_eq!(values[0]["Real"]["@value"], json!("INF"));
        assert_eq!(values[1]["Real"]["@value"], json!("NaN"));
        assert_eq!(
            dict["Functions"]["LinearTransformation"][0],
            json!({"@name": "gain", "@factor": "INF", "@offset": "NaN"})
        );
        assert_eq!(schema.decode(&schema.encode(&dict).unwrap()).unwrap(), dict);
    }

    #[test]
    fn rejects_wrong_namespace() {
        let xml = r#"<OspSystemStructure xmlns="urn:other"><Simulators/></OspSystemStructure>"#;
        let err = XmlSchema::osp_system_structure().decode(xml).unwrap_err();
        assert!(matches!(err, XmlError::NamespaceMismatch { .. }));
    }

    #[test]
    fn rejects_unknown_algorithm() {
        let xml = document("<Algorithm>variableStep</Algorithm><Simulators/>");
        let err = XmlSchema::osp_system_structure().decode(&xml).unwrap_err();
        assert!(matches!(err, XmlError::NotInEnumeration { .. }));
    }

    #[test]
    fn rejects_single_endpoint_variable_connection() {
        let xml = document(
            r#"<Simulators/><Connections><VariableConnection>
                <Variable simulator="A" name="out"/>
            </VariableConnection></Connections>"#,
        );
        let err = XmlSchema::osp_system_structure().decode(&xml).unwrap_err();
        assert!(matches!(err, XmlError::Occurrence { found: 1, .. }), "{err}");
    }

    #[test]
    fn rejects_initial_value_with_two_kinds() {
        let xml = document(
            r#"<Simulators><Simulator name="A" source="a.fmu"><InitialValues>
                <InitialValue variable="x"><Real value="1.0"/><Integer value="1"/></InitialValue>
            </InitialValues></Simulator></Simulators>"#,
        );
        let err = XmlSchema::osp_system_structure().decode(&xml).unwrap_err();
        assert!(matches!(err, XmlError::Choice { found: 2, .. }), "{err}");
    }

    #[test]
    fn rejects_missing_required_attribute_and_bad_types() {
        let schema = XmlSchema::osp_system_structure();
        let missing = document(r#"<Simulators><Simulator name="A"/></Simulators>"#);
        assert!(matches!(
            schema.decode(&missing).unwrap_err(),
            XmlError::MissingAttribute { .. }
        ));

        let bad_type =
            document(r#"<Simulators><Simulator name="A" source="a.fmu" stepSize="fast"/></Simulators>"#);
        assert!(matches!(
            schema.decode(&bad_type).unwrap_err(),
            XmlError::InvalidValue { .. }
        ));
    }

    #[test]
    fn rejects_unknown_elements_and_malformed_text() {
        let schema = XmlSchema::osp_system_structure();
        let unknown = document("<Simulators/><Plugins/>");
        assert!(matches!(
            schema.decode(&unknown).unwrap_err(),
            XmlError::UnexpectedElement { .. }
        ));
        assert!(schema.decode("<OspSystemStructure>").is_err());
        assert!(matches!(schema.decode("").unwrap_err(), XmlError::EmptyDocument));
    }
}
