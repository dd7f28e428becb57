//! cspheader CLI
//!
//! Assembles Content-Security-Policy headers from a JSON policy or a preset.

#![warn(missing_docs)]
#![warn(clippy::all)]

use clap::{Args, Parser, Subcommand};
use color_eyre::Result;
use cspheader_cli::{
    list_presets, run_assemble, show_templates, OutputFormat, PolicySource,
};
use cspheader_policy::{Preset, TemplateKind};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cspheader")]
#[command(about = "Assemble Content-Security-Policy and Report-To header values", long_about = None)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble a policy and print its headers
    Assemble {
        #[command(flatten)]
        source: SourceArgs,
        /// Print a JSON object instead of header lines
        #[arg(long)]
        json: bool,
    },
    /// List built-in presets
    Presets,
    /// Show built-in template text
    Templates {
        /// Template kind (source-option, sandbox, frame-ancestors, unquoted-multi, unquoted-single)
        #[arg(short, long)]
        kind: Option<TemplateKind>,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct SourceArgs {
    /// Path to a JSON policy file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Built-in preset name
    #[arg(short, long)]
    preset: Option<Preset>,
}

impl SourceArgs {
    fn into_source(self) -> Option<PolicySource> {
        match (self.config, self.preset) {
            (Some(path), _) => Some(PolicySource::File(path)),
            (None, Some(preset)) => Some(PolicySource::Preset(preset)),
            (None, None) => None,
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "cspheader_policy=debug,cspheader_cli=debug"
    } else {
        "cspheader_policy=info,cspheader_cli=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Assemble { source, json } => {
            let source = source
                .into_source()
                .ok_or_else(|| color_eyre::eyre::eyre!("either --config or --preset is required"))?;
            let format = if json {
                OutputFormat::Json
            } else {
                OutputFormat::Text
            };
            println!("{}", run_assemble(&source, format)?);
            Ok(())
        }
        Commands::Presets => {
            println!("{}", list_presets());
            Ok(())
        }
        Commands::Templates { kind } => {
            println!("{}", show_templates(kind));
            Ok(())
        }
    }
}
