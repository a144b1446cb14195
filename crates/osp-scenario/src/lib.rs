//! ---
//! osp_section: "04-scenario-model"
//! osp_subsection: "module"
//! osp_type: "source"
//! osp_scope: "code"
//! osp_description: "Scenario and event model for OSP co-simulations."
//! osp_version: "v0.1.0"
//! osp_owner: "tbd"
//! ---
//! Scenarios schedule variable overrides, biases and resets during a
//! co-simulation run. They are stored as flat JSON files named after the
//! scenario.

pub mod errors;
pub mod event;
pub mod scenario;

pub use errors::{Result, ScenarioError};
pub use event::{EventAction, OspEvent};
pub use scenario::{format_filename, OspScenario};
