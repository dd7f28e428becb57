//! Option value types for individual directives.
//!
//! These are plain data. Turning them into directive text is the job of
//! [`crate::renderer::Renderer`].

use serde::{Deserialize, Serialize};

/// Options for a directive governed by the source-list grammar
/// (`default-src`, `script-src`, `base-uri`, `form-action`, ...)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SourceOptions {
    /// When false the directive is `'none'` and every other field is ignored
    pub allow: bool,
    /// `'self'`
    pub allow_self: bool,
    /// Host and scheme sources, emitted verbatim in order
    pub values: Vec<String>,
    /// `'unsafe-eval'`
    pub unsafe_eval: bool,
    /// `'wasm-unsafe-eval'`
    pub wasm_unsafe_eval: bool,
    /// `'unsafe-hashes'`
    pub unsafe_hashes: bool,
    /// `'unsafe-inline'`
    pub unsafe_inline: bool,
    /// Pre-formatted `'nonce-<base64>'` token; must differ on every response
    pub nonce_value: String,
    /// Pre-formatted `'<algorithm>-<base64>'` token
    pub hash_value: String,
    /// `'strict-dynamic'`
    pub strict_dynamic: bool,
    /// `'report-sample'`
    pub report_sample: bool,
}

impl SourceOptions {
    /// `'none'`
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// `'self'`
    #[must_use]
    pub fn self_only() -> Self {
        Self {
            allow: true,
            allow_self: true,
            ..Self::default()
        }
    }
}

/// Sandbox tokens; each enabled flag lifts one restriction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SandboxOptions {
    /// `allow-downloads`
    pub allow_downloads: bool,
    /// `allow-forms`
    pub allow_forms: bool,
    /// `allow-modals`
    pub allow_modals: bool,
    /// `allow-orientation-lock`
    pub allow_orientation_lock: bool,
    /// `allow-pointer-lock`
    pub allow_pointer_lock: bool,
    /// `allow-popups`
    pub allow_popups: bool,
    /// `allow-popups-to-escape-sandbox`
    pub allow_popups_to_escape_sandbox: bool,
    /// `allow-presentation`
    pub allow_presentation: bool,
    /// `allow-same-origin`
    pub allow_same_origin: bool,
    /// `allow-scripts`
    pub allow_scripts: bool,
    /// `allow-top-navigation`
    pub allow_top_navigation: bool,
    /// `allow-top-navigation-by-user-activation`
    pub allow_top_navigation_by_user_activation: bool,
    /// `allow-top-navigation-to-custom-protocols`
    pub allow_top_navigation_to_custom_protocols: bool,
}

/// Options for `frame-ancestors`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FrameAncestorOptions {
    /// When false the directive is `'none'` and every other field is ignored
    pub allow: bool,
    /// `'self'`
    pub allow_self: bool,
    /// Host sources, emitted before scheme sources
    pub host_sources: Vec<String>,
    /// Scheme sources
    pub scheme_sources: Vec<String>,
}

/// One or more unquoted values (`report-uri`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnquotedOptions {
    /// Values in order
    pub values: Vec<String>,
}

/// A single unquoted value (`report-to`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnquotedOption {
    /// The value
    pub value: String,
}

impl UnquotedOption {
    /// Create from any string
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}
