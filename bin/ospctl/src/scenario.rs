//! ---
//! osp_section: "05-command-line"
//! osp_subsection: "binary"
//! osp_type: "source"
//! osp_scope: "code"
//! osp_description: "Control CLI for OSP system structure documents."
//! osp_version: "v0.1.0"
//! osp_owner: "tbd"
//! ---
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use osp_scenario::{format_filename, OspScenario};

#[derive(Debug, Args)]
pub struct FilenameArgs {
    /// Scenario name, free text.
    pub name: String,
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Scenario JSON file.
    #[arg(value_name = "JSON")]
    pub path: PathBuf,
}

pub fn filename(args: &FilenameArgs, out: &mut impl Write) -> Result<()> {
    writeln!(out, "{}.json", format_filename(&args.name))?;
    Ok(())
}

pub fn check(args: &CheckArgs, out: &mut impl Write) -> Result<()> {
    let scenario = OspScenario::read_file(&args.path)
        .with_context(|| format!("failed to load scenario {}", args.path.display()))?;
    writeln!(
        out,
        "{}: {} events until t={}s",
        scenario.name,
        scenario.events.len(),
        scenario.end
    )?;
    if !scenario.description.is_empty() {
        writeln!(out, "  {}", scenario.description)?;
    }
    for event in &scenario.events {
        writeln!(
            out,
            "  t={:<10} {:<8} {}.{} = {}",
            event.time, event.action, event.model, event.variable, event.value
        )?;
    }
    Ok(())
}
