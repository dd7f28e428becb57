//! cspheader CLI support
//!
//! Policy loading and header formatting behind the `cspheader` binary.

#![warn(missing_docs)]
#![warn(clippy::all)]

use cspheader_policy::{HeaderMap, Policy, PolicyAssembler, Preset, TemplateKind};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Config file could not be read
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not a valid policy
    #[error("invalid policy in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Assembly failed
    #[error(transparent)]
    Assembly(#[from] cspheader_policy::AssemblyError),

    /// Output serialization failed
    #[error("failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Where a policy comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicySource {
    /// JSON file
    File(PathBuf),
    /// Built-in preset
    Preset(Preset),
}

/// How headers are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// `Name: value` lines
    #[default]
    Text,
    /// JSON object of header name to value
    Json,
}

/// Load a policy from its source
///
/// # Errors
///
/// Returns error if the file cannot be read or parsed
pub fn load_policy(source: &PolicySource) -> Result<Policy, CliError> {
    match source {
        PolicySource::File(path) => load_policy_file(path),
        PolicySource::Preset(preset) => {
            info!(%preset, "using preset");
            Ok(preset.policy())
        }
    }
}

fn load_policy_file(path: &Path) -> Result<Policy, CliError> {
    info!(path = %path.display(), "loading policy");
    let json = fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Policy::from_json(&json).map_err(|source| CliError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Assemble a policy and format its headers
///
/// # Errors
///
/// Returns error if loading, assembly, or encoding fails
pub fn run_assemble(source: &PolicySource, format: OutputFormat) -> Result<String, CliError> {
    let policy = load_policy(source)?;
    let headers = PolicyAssembler::new().assemble(&policy)?.headers();
    format_headers(&headers, format)
}

/// Format a header map
///
/// # Errors
///
/// Returns error if JSON encoding fails
pub fn format_headers(headers: &HeaderMap, format: OutputFormat) -> Result<String, CliError> {
    match format {
        OutputFormat::Text => Ok(headers
            .iter()
            .map(|(name, value)| format!("{name}: {value}"))
            .collect::<Vec<_>>()
            .join("\n")),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(headers)?),
    }
}

/// One line per preset: name and description
#[must_use]
pub fn list_presets() -> String {
    Preset::ALL
        .iter()
        .map(|p| format!("{:<8} {}", p.as_str(), p.description()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Built-in template text for one kind, or all kinds
#[must_use]
pub fn show_templates(kind: Option<TemplateKind>) -> String {
    match kind {
        Some(kind) => kind.default_text().to_string(),
        None => TemplateKind::ALL
            .iter()
            .map(|k| format!("{}:\n  {}", k, k.default_text()))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}
