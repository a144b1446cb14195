//! ---
//! osp_section: "04-scenario-model"
//! osp_subsection: "module"
//! osp_type: "source"
//! osp_scope: "code"
//! osp_description: "Scenario and event model for OSP co-simulations."
//! osp_version: "v0.1.0"
//! osp_owner: "tbd"
//! ---
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

use crate::errors::{Result, ScenarioError};

/// What an event does to its variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventAction {
    Override = 1,
    Bias = 2,
    Reset = 3,
}

impl EventAction {
    pub const ALL: [EventAction; 3] = [EventAction::Override, EventAction::Bias, EventAction::Reset];

    pub const fn as_str(self) -> &'static str {
        match self {
            EventAction::Override => "override",
            EventAction::Bias => "bias",
            EventAction::Reset => "reset",
        }
    }

    /// Numeric action code used by the simulation engine.
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for EventAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for EventAction {
    type Err = ScenarioError;

    fn from_str(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == name)
            .ok_or_else(|| ScenarioError::UnknownAction(name.to_owned()))
    }
}

impl TryFrom<u8> for EventAction {
    type Error = ScenarioError;

    fn try_from(code: u8) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|action| action.code() == code)
            .ok_or_else(|| ScenarioError::UnknownAction(code.to_string()))
    }
}

/// A single scheduled change of a model variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OspEvent {
    pub time: f64,
    pub model: String,
    pub variable: String,
    pub action: EventAction,
    #[serde(serialize_with = "serialize_number")]
    pub value: f64,
}

impl OspEvent {
    pub fn new(
        time: f64,
        model: impl Into<String>,
        variable: impl Into<String>,
        action: EventAction,
        value: f64,
    ) -> Self {
        Self {
            time,
            model: model.into(),
            variable: variable.into(),
            action,
            value,
        }
    }
}

/// Integral values are written as JSON integers, everything else as floats.
pub(crate) fn serialize_number<S: Serializer>(value: &f64, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    const EXACT_INTEGER_LIMIT: f64 = 9_007_199_254_740_992.0;
    if value.fract() == 0.0 && value.abs() <= EXACT_INTEGER_LIMIT {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}
