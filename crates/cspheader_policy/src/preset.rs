//! Ready-made policies.

use crate::options::{SourceOptions, UnquotedOption};
use crate::policy::Policy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// `Report-To` payload used by the presets; `/_/csp-reports` is relative to self
pub const DEFAULT_REPORT_TO_PAYLOAD: &str =
    r#"{"group":"default","max_age": 86400, "endpoints": [{"url":"/_/csp-reports" }]}"#;

/// Policy generally agreeable for React applications.
///
/// `default-src` is `'none'` on purpose; even `'self'` opens a door for many
/// element types. Styles need `'unsafe-inline'` in attributes unless the build
/// sets `INLINE_RUNTIME_CHUNK=false` and `IMAGE_INLINE_SIZE_LIMIT=0`.
#[must_use]
pub fn react() -> Policy {
    let mut policy = Policy::new();

    // Fetch directives
    policy.csp.default_src = SourceOptions::none();
    policy.csp.script_src = SourceOptions::self_only();
    policy.csp.style_src_attr = SourceOptions {
        unsafe_inline: true,
        ..SourceOptions::self_only()
    };

    // Document directives
    policy.csp.base_uri = SourceOptions::none();

    // Navigation directives
    policy.csp.form_action = SourceOptions::self_only();

    // Reporting directives
    policy.csp.report_to = UnquotedOption::new("default");
    policy.report_to_payload = DEFAULT_REPORT_TO_PAYLOAD.to_string();

    policy
}

/// Named presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    /// See [`react`]
    React,
}

impl Preset {
    /// Every preset
    pub const ALL: [Preset; 1] = [Self::React];

    /// Preset name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::React => "react",
        }
    }

    /// One-line description
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::React => "single-page React application served from its own origin",
        }
    }

    /// Build the preset's policy
    #[must_use]
    pub fn policy(&self) -> Policy {
        match self {
            Self::React => react(),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Preset name not recognized
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown preset: {0}")]
pub struct UnknownPreset(pub String);

impl FromStr for Preset {
    type Err = UnknownPreset;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownPreset(s.to_string()))
    }
}
