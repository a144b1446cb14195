//! ---
//! osp_section: "05-command-line"
//! osp_subsection: "binary"
//! osp_type: "source"
//! osp_scope: "code"
//! osp_description: "Control CLI for OSP system structure documents."
//! osp_version: "v0.1.0"
//! osp_owner: "tbd"
//! ---
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use osp_common::{init_tracing, LoadedOspConfig, LogFormat, OspConfig};
use osp_system_structure::{EncodeOptions, XmlSchema};
use tracing::debug;

mod document;
mod scenario;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "OSP system structure toolkit",
    long_about = None
)]
struct Cli {
    /// Configuration file; otherwise OSP_CONFIG, then ./osp.toml.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the configured log format.
    #[arg(long = "log-format", global = true, value_enum)]
    log_format: Option<LogFormatArg>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the wire dictionary of an XML document as JSON.
    Decode(document::DecodeArgs),
    /// Encode a JSON wire dictionary as XML.
    Encode(document::EncodeArgs),
    /// Check a document against the schema and the object model.
    Validate(document::DocumentArgs),
    /// Decode, rebuild, re-encode and decode again, then compare.
    Roundtrip(document::DocumentArgs),
    /// Count simulators, functions and connections per kind.
    Summary(document::DocumentArgs),
    /// Print the file name a scenario with this name is stored under.
    #[command(name = "scenario-filename")]
    ScenarioFilename(scenario::FilenameArgs),
    /// Load a scenario file and list its events.
    #[command(name = "scenario-check")]
    ScenarioCheck(scenario::CheckArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatArg {
    Json,
    Pretty,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Json => LogFormat::StructuredJson,
            LogFormatArg::Pretty => LogFormat::Pretty,
        }
    }
}

/// Settings shared by the document commands.
pub struct Session {
    pub schema: Arc<XmlSchema>,
    pub options: EncodeOptions,
}

impl Session {
    fn from_config(config: &OspConfig) -> Result<Self> {
        let schema = match &config.schema.path {
            Some(path) => Arc::new(
                XmlSchema::from_path(path)
                    .with_context(|| format!("failed to load schema {}", path.display()))?,
            ),
            None => XmlSchema::osp_system_structure(),
        };
        Ok(Self {
            schema,
            options: EncodeOptions {
                indent: config.output.indent,
                xml_declaration: config.output.xml_declaration,
            },
        })
    }
}

fn load_config(cli: &Cli) -> Result<OspConfig> {
    let loaded = match &cli.config {
        Some(path) => LoadedOspConfig {
            config: OspConfig::from_path(path)?,
            source: Some(path.clone()),
        },
        None => OspConfig::load_with_source(&[PathBuf::from("osp.toml")])?,
    };
    let mut config = loaded.config;
    if let Some(format) = cli.log_format {
        config.logging.format = format.into();
    }
    init_tracing("ospctl", &config.logging)?;
    match &loaded.source {
        Some(path) => debug!(path = %path.display(), "configuration loaded"),
        None => debug!("no configuration file found, using defaults"),
    }
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Commands::Decode(args) => document::decode(&Session::from_config(&config)?, &args, &mut out)?,
        Commands::Encode(args) => document::encode(&Session::from_config(&config)?, &args, &mut out)?,
        Commands::Validate(args) => {
            document::validate(&Session::from_config(&config)?, &args, &mut out)?
        }
        Commands::Roundtrip(args) => {
            document::roundtrip(&Session::from_config(&config)?, &args, &mut out)?
        }
        Commands::Summary(args) => document::summary(&Session::from_config(&config)?, &args, &mut out)?,
        Commands::ScenarioFilename(args) => scenario::filename(&args, &mut out)?,
        Commands::ScenarioCheck(args) => scenario::check(&args, &mut out)?,
    }
    Ok(())
}
