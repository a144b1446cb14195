//! ---
//! osp_section: "01-core-functionality"
//! osp_subsection: "module"
//! osp_type: "source"
//! osp_scope: "code"
//! osp_description: "Shared primitives for the OSP tooling."
//! osp_version: "v0.1.0"
//! osp_owner: "tbd"
//! ---
//! Shared primitives for the OSP system structure toolkit.
//! This crate exposes configuration loading and logging setup consumed
//! by the command-line front end and the integration suite.

pub mod config;
pub mod logging;

pub use config::{LoadedOspConfig, LoggingConfig, OspConfig, OutputConfig, SchemaConfig};
pub use logging::{init_tracing, LogFormat};
