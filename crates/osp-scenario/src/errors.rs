//! ---
//! osp_section: "04-scenario-model"
//! osp_subsection: "module"
//! osp_type: "source"
//! osp_scope: "code"
//! osp_description: "Scenario and event model for OSP co-simulations."
//! osp_version: "v0.1.0"
//! osp_owner: "tbd"
//! ---
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScenarioError>;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("scenario JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown event action '{0}', expected override, bias or reset")]
    UnknownAction(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
