//! ---
//! osp_section: "04-scenario-model"
//! osp_subsection: "module"
//! osp_type: "source"
//! osp_scope: "code"
//! osp_description: "Scenario and event model for OSP co-simulations."
//! osp_version: "v0.1.0"
//! osp_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::Result;
use crate::event::{serialize_number, OspEvent};

/// Keep ASCII letters, digits and `-_.() `, then turn spaces into underscores.
/// The result may still be empty, `.` or `..`.
pub fn format_filename(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || "-_.() ".contains(*c))
        .map(|c| if c == ' ' { '_' } else { c })
        .collect()
}

/// Wire shape of a scenario file. The name only lives in the file name.
#[derive(Serialize, Deserialize)]
struct ScenarioDocument {
    description: String,
    events: Vec<OspEvent>,
    #[serde(serialize_with = "serialize_number")]
    end: f64,
}

/// A named list of events ending at `end` seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct OspScenario {
    pub name: String,
    pub end: f64,
    pub description: String,
    pub events: Vec<OspEvent>,
}

impl OspScenario {
    pub fn new(name: impl Into<String>, end: f64, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            end,
            description: description.into(),
            events: Vec::new(),
        }
    }

    pub fn add_event(&mut self, event: OspEvent) {
        self.events.push(event);
    }

    fn document(&self) -> ScenarioDocument {
        ScenarioDocument {
            description: self.description.clone(),
            events: self.events.clone(),
            end: self.end,
        }
    }

    /// The scenario as a JSON value: `{description, events, end}`.
    pub fn to_dict(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self.document())?)
    }

    /// Pretty JSON with two-space indentation.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.document())?)
    }

    /// Replace description, end time and events from JSON. The name is kept.
    /// On error nothing is changed.
    #[allow(clippy::wrong_self_convention)]
    pub fn from_json(&mut self, text: &str) -> Result<()> {
        let document: ScenarioDocument = serde_json::from_str(text)?;
        self.description = document.description;
        self.end = document.end;
        self.events = document.events;
        Ok(())
    }

    pub fn from_json_str(name: impl Into<String>, text: &str) -> Result<Self> {
        let mut scenario = Self::new(name, 0.0, "");
        scenario.from_json(text)?;
        Ok(scenario)
    }

    pub fn file_name(&self) -> String {
        format!("{}.json", format_filename(&self.name))
    }

    /// Write `<dir>/<file_name()>` and return its path.
    pub fn write_to_dir(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let path = dir.as_ref().join(self.file_name());
        fs::write(&path, self.to_json()?)?;
        info!(path = %path.display(), events = self.events.len(), "wrote scenario");
        Ok(path)
    }

    /// Read a scenario file, naming the scenario after the file stem.
    pub fn read_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let scenario = Self::from_json_str(name, &fs::read_to_string(path)?)?;
        info!(path = %path.display(), events = scenario.events.len(), "loaded scenario");
        Ok(scenario)
    }
}
