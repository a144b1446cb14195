//! ---
//! osp_section: "05-command-line"
//! osp_subsection: "binary"
//! osp_type: "source"
//! osp_scope: "code"
//! osp_description: "Control CLI for OSP system structure documents."
//! osp_version: "v0.1.0"
//! osp_owner: "tbd"
//! ---
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use indexmap::IndexMap;
use osp_system_structure::{ConnectionKind, FunctionKind, OspSystemStructure, XmlDict};
use serde_json::Value;
use tracing::{info, warn};

use crate::Session;

#[derive(Debug, Args)]
pub struct DocumentArgs {
    /// System structure XML document.
    #[arg(value_name = "XML")]
    pub path: PathBuf,
}

#[derive(Debug, Args)]
pub struct DecodeArgs {
    #[command(flatten)]
    pub document: DocumentArgs,

    /// Indent the JSON output.
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Debug, Args)]
pub struct EncodeArgs {
    /// JSON file holding a wire dictionary.
    #[arg(value_name = "JSON")]
    pub path: PathBuf,

    /// Write the XML here instead of standard output.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

fn decode_file(session: &Session, path: &Path) -> Result<XmlDict> {
    session
        .schema
        .decode_file(path)
        .with_context(|| format!("failed to decode {}", path.display()))
}

fn load_model(session: &Session, path: &Path) -> Result<OspSystemStructure> {
    let dict = decode_file(session, path)?;
    OspSystemStructure::from_dict_xml_with_schema(&dict, Arc::clone(&session.schema))
        .with_context(|| format!("{} does not describe a system structure", path.display()))
}

pub fn decode(session: &Session, args: &DecodeArgs, out: &mut impl Write) -> Result<()> {
    let dict = Value::Object(decode_file(session, &args.document.path)?);
    let text = if args.pretty {
        serde_json::to_string_pretty(&dict)?
    } else {
        serde_json::to_string(&dict)?
    };
    writeln!(out, "{text}")?;
    Ok(())
}

pub fn encode(session: &Session, args: &EncodeArgs, out: &mut impl Write) -> Result<()> {
    let raw = fs::read_to_string(&args.path)
        .with_context(|| format!("failed to read {}", args.path.display()))?;
    let dict = match serde_json::from_str::<Value>(&raw)
        .with_context(|| format!("{} is not valid JSON", args.path.display()))?
    {
        Value::Object(dict) => dict,
        _ => bail!("{} must hold a JSON object", args.path.display()),
    };
    match &args.output {
        Some(path) => {
            session.schema.encode_file(&dict, &session.options, path)?;
            info!(path = %path.display(), "wrote XML document");
        }
        None => {
            let xml = session.schema.encode_with(&dict, &session.options)?;
            writeln!(out, "{xml}")?;
        }
    }
    Ok(())
}

pub fn validate(session: &Session, args: &DocumentArgs, out: &mut impl Write) -> Result<()> {
    let model = load_model(session, &args.path)?;
    model.validate()?;
    writeln!(
        out,
        "{}: valid ({} simulators, {} functions, {} connections)",
        args.path.display(),
        model.simulators.len(),
        model.functions.len(),
        model.connections.len()
    )?;
    Ok(())
}

pub fn roundtrip(session: &Session, args: &DocumentArgs, out: &mut impl Write) -> Result<()> {
    let first = decode_file(session, &args.path)?;
    let model = OspSystemStructure::from_dict_xml_with_schema(&first, Arc::clone(&session.schema))?;
    let xml = model.to_xml_string_with(&session.options)?;
    let second = session.schema.decode(&xml)?;
    if first != second {
        let changed: Vec<&str> = first
            .keys()
            .chain(second.keys().filter(|key| !first.contains_key(*key)))
            .filter(|key| first.get(*key) != second.get(*key))
            .map(String::as_str)
            .collect();
        warn!(path = %args.path.display(), ?changed, "round trip changed the document");
        bail!(
            "round trip of {} changed: {}",
            args.path.display(),
            changed.join(", ")
        );
    }
    writeln!(out, "{}: round trip ok", args.path.display())?;
    Ok(())
}

/// Entity counts in document order.
pub fn counts(model: &OspSystemStructure) -> IndexMap<&'static str, usize> {
    let mut counts = IndexMap::new();
    counts.insert("Simulator", model.simulators.len());
    counts.insert(
        "InitialValue",
        model
            .simulators
            .iter()
            .filter_map(|simulator| simulator.initial_values.as_ref())
            .map(Vec::len)
            .sum(),
    );
    for kind in FunctionKind::ALL {
        counts.insert(kind.kind_name(), model.functions.count(kind));
    }
    for kind in ConnectionKind::ALL {
        counts.insert(kind.kind_name(), model.connections.count(kind));
    }
    counts
}

pub fn summary(session: &Session, args: &DocumentArgs, out: &mut impl Write) -> Result<()> {
    let model = load_model(session, &args.path)?;
    writeln!(out, "{}", args.path.display())?;
    writeln!(out, "  {:<26}{}", "Algorithm", model.algorithm())?;
    writeln!(out, "  {:<26}{}", "StartTime", model.start_time())?;
    if let Some(step) = model.base_step_size {
        writeln!(out, "  {:<26}{}", "BaseStepSize", step)?;
    }
    for (kind, count) in counts(&model) {
        writeln!(out, "  {:<26}{}", kind, count)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use osp_system_structure::{EncodeOptions, XmlSchema};

    const DOCUMENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<OspSystemStructure xmlns="http://opensimulationplatform.com/MSMI/OSPSystemStructure" version="0.1">
  <BaseStepSize>0.01</BaseStepSize>
  <Simulators>
    <Simulator name="chassis" source="chassis.fmu">
      <InitialValues>
        <InitialValue variable="C.mChassis"><Real value="400"/></InitialValue>
      </InitialValues>
    </Simulator>
    <Simulator name="wheel" source="fmus/wheel.fmu"/>
  </Simulators>
  <Functions>
    <Sum name="total" inputCount="2"/>
  </Functions>
  <Connections>
    <VariableConnection>
      <Variable simulator="chassis" name="p.e"/>
      <Variable simulator="wheel" name="p1.e"/>
    </VariableConnection>
  </Connections>
</OspSystemStructure>
"#;

    fn session() -> Session {
        Session {
            schema: XmlSchema::osp_system_structure(),
            options: EncodeOptions::default(),
        }
    }

    fn fixture(dir: &Path) -> PathBuf {
        let path = dir.join("OspSystemStructure.xml");
        fs::write(&path, DOCUMENT).unwrap();
        path
    }

    #[test]
    fn summary_counts_every_kind() {
        let dir = tempfile::tempdir().unwrap();
        let model = load_model(&session(), &fixture(dir.path())).unwrap();
        let counts = counts(&model);
        assert_eq!(counts["Simulator"], 2);
        assert_eq!(counts["InitialValue"], 1);
        assert_eq!(counts["Sum"], 1);
        assert_eq!(counts["VariableConnection"], 1);
        assert_eq!(counts["SignalGroupConnection"], 0);
        assert_eq!(counts.get_index(0).map(|(key, _)| *key), Some("Simulator"));
    }

    #[test]
    fn decode_then_encode_reproduces_the_document() {
        let dir = tempfile::tempdir().unwrap();
        let xml_path = fixture(dir.path());
        let mut json = Vec::new();
        decode(
            &session(),
            &DecodeArgs {
                document: DocumentArgs { path: xml_path.clone() },
                pretty: true,
            },
            &mut json,
        )
        .unwrap();
        let json_path = dir.path().join("wire.json");
        fs::write(&json_path, &json).unwrap();

        let out_path = dir.path().join("encoded.xml");
        encode(
            &session(),
            &EncodeArgs {
                path: json_path,
                output: Some(out_path.clone()),
            },
            &mut Vec::new(),
        )
        .unwrap();
        let schema = XmlSchema::osp_system_structure();
        assert_eq!(
            schema.decode_file(&out_path).unwrap(),
            schema.decode_file(&xml_path).unwrap()
        );
    }

    #[test]
    fn roundtrip_and_validate_report_success() {
        let dir = tempfile::tempdir().unwrap();
        let args = DocumentArgs {
            path: fixture(dir.path()),
        };
        let mut out = Vec::new();
        roundtrip(&session(), &args, &mut out).unwrap();
        validate(&session(), &args, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("round trip ok"));
        assert!(text.contains("valid (2 simulators, 1 functions, 1 connections)"));
    }

    #[test]
    fn encode_rejects_non_object_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.json");
        fs::write(&path, "[1, 2]").unwrap();
        let err = encode(
            &session(),
            &EncodeArgs { path, output: None },
            &mut Vec::new(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("must hold a JSON object"));
    }
}
