//! Directive renderer.
//!
//! Dispatches an option value to the template for its kind and produces
//! the directive's value text, e.g. `'self' 'unsafe-inline'`.

use crate::options::{
    FrameAncestorOptions, SandboxOptions, SourceOptions, UnquotedOption, UnquotedOptions,
};
use crate::template::{Segment, Template, TemplateKind, TemplateSet, SANDBOX_TOKENS};

/// Value of a source-list or frame-ancestors directive that allows nothing
pub const NONE: &str = "'none'";

/// Borrowed view of one directive's options, tagged by kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionValue<'a> {
    /// Source-list options
    Source(&'a SourceOptions),
    /// Sandbox options
    Sandbox(&'a SandboxOptions),
    /// Frame-ancestors options
    FrameAncestors(&'a FrameAncestorOptions),
    /// Several unquoted values
    UnquotedMulti(&'a UnquotedOptions),
    /// One unquoted value
    UnquotedSingle(&'a UnquotedOption),
}

impl OptionValue<'_> {
    /// Template kind this value renders with
    #[must_use]
    pub const fn kind(&self) -> TemplateKind {
        match self {
            Self::Source(_) => TemplateKind::SourceOption,
            Self::Sandbox(_) => TemplateKind::Sandbox,
            Self::FrameAncestors(_) => TemplateKind::FrameAncestors,
            Self::UnquotedMulti(_) => TemplateKind::UnquotedMulti,
            Self::UnquotedSingle(_) => TemplateKind::UnquotedSingle,
        }
    }
}

impl<'a> From<&'a SourceOptions> for OptionValue<'a> {
    fn from(value: &'a SourceOptions) -> Self {
        Self::Source(value)
    }
}

impl<'a> From<&'a SandboxOptions> for OptionValue<'a> {
    fn from(value: &'a SandboxOptions) -> Self {
        Self::Sandbox(value)
    }
}

impl<'a> From<&'a FrameAncestorOptions> for OptionValue<'a> {
    fn from(value: &'a FrameAncestorOptions) -> Self {
        Self::FrameAncestors(value)
    }
}

impl<'a> From<&'a UnquotedOptions> for OptionValue<'a> {
    fn from(value: &'a UnquotedOptions) -> Self {
        Self::UnquotedMulti(value)
    }
}

impl<'a> From<&'a UnquotedOption> for OptionValue<'a> {
    fn from(value: &'a UnquotedOption) -> Self {
        Self::UnquotedSingle(value)
    }
}

/// Rendering errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    /// Template applied to options of another kind
    #[error("{template} template cannot render {value} options")]
    KindMismatch {
        template: TemplateKind,
        value: TemplateKind,
    },

    /// Template names a field the options do not have
    #[error("{kind} options have no field {field:?}")]
    UnknownField { kind: TemplateKind, field: String },
}

/// Renders option values with a fixed set of compiled templates
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    templates: TemplateSet,
}

impl Renderer {
    /// Create a renderer over compiled templates
    #[must_use]
    pub fn new(templates: TemplateSet) -> Self {
        Self { templates }
    }

    /// Templates in use
    #[must_use]
    pub fn templates(&self) -> &TemplateSet {
        &self.templates
    }

    /// Render a value with the template for its kind
    ///
    /// # Errors
    ///
    /// Returns error if the template cannot be applied to the value
    pub fn render<'a>(&self, value: impl Into<OptionValue<'a>>) -> Result<String, RenderError> {
        let value = value.into();
        render(self.templates.get(value.kind()), value)
    }
}

/// Render a value with an explicit template
///
/// # Errors
///
/// Returns [`RenderError::KindMismatch`] if the template is bound to another kind
pub fn render(template: &Template, value: OptionValue<'_>) -> Result<String, RenderError> {
    if template.kind() != value.kind() {
        return Err(RenderError::KindMismatch {
            template: template.kind(),
            value: value.kind(),
        });
    }

    match value {
        OptionValue::Source(opts) if !opts.allow => return Ok(NONE.to_string()),
        OptionValue::FrameAncestors(opts) if !opts.allow => return Ok(NONE.to_string()),
        _ => {}
    }

    let mut out = String::new();
    for segment in template.segments() {
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Field(field) => out.push_str(&field_tokens(value, field)?.join(" ")),
        }
    }

    Ok(normalize_whitespace(&out))
}

/// `'nonce-<base64>'`
#[must_use]
pub fn nonce_source(base64: &str) -> String {
    format!("'nonce-{base64}'")
}

/// `'<algorithm>-<base64>'`, e.g. `'sha256-...'`
#[must_use]
pub fn hash_source(algorithm: &str, base64: &str) -> String {
    format!("'{algorithm}-{base64}'")
}

fn flag(enabled: bool, token: &'static str) -> Vec<&'static str> {
    if enabled { vec![token] } else { Vec::new() }
}

fn text(value: &str) -> Vec<&str> {
    if value.is_empty() { Vec::new() } else { vec![value] }
}

fn field_tokens<'v>(value: OptionValue<'v>, field: &str) -> Result<Vec<&'v str>, RenderError> {
    let tokens: Vec<&'v str> = match value {
        OptionValue::Source(opts) => match field {
            "self" => flag(opts.allow_self, "'self'"),
            "values" => opts.values.iter().map(String::as_str).collect(),
            "unsafe-eval" => flag(opts.unsafe_eval, "'unsafe-eval'"),
            "wasm-unsafe-eval" => flag(opts.wasm_unsafe_eval, "'wasm-unsafe-eval'"),
            "unsafe-hashes" => flag(opts.unsafe_hashes, "'unsafe-hashes'"),
            "unsafe-inline" => flag(opts.unsafe_inline, "'unsafe-inline'"),
            "nonce" => text(&opts.nonce_value),
            "hash" => text(&opts.hash_value),
            "strict-dynamic" => flag(opts.strict_dynamic, "'strict-dynamic'"),
            "report-sample" => flag(opts.report_sample, "'report-sample'"),
            _ => return Err(unknown_field(value, field)),
        },
        OptionValue::Sandbox(opts) => {
            let enabled = sandbox_flags(opts);
            match SANDBOX_TOKENS.iter().position(|t| *t == field) {
                Some(idx) => flag(enabled[idx], SANDBOX_TOKENS[idx]),
                None => return Err(unknown_field(value, field)),
            }
        }
        OptionValue::FrameAncestors(opts) => match field {
            "self" => flag(opts.allow_self, "'self'"),
            "host-sources" => opts.host_sources.iter().map(String::as_str).collect(),
            "scheme-sources" => opts.scheme_sources.iter().map(String::as_str).collect(),
            _ => return Err(unknown_field(value, field)),
        },
        OptionValue::UnquotedMulti(opts) => match field {
            "values" => opts.values.iter().map(String::as_str).collect(),
            _ => return Err(unknown_field(value, field)),
        },
        OptionValue::UnquotedSingle(opts) => match field {
            "value" => text(&opts.value),
            _ => return Err(unknown_field(value, field)),
        },
    };
    Ok(tokens)
}

fn unknown_field(value: OptionValue<'_>, field: &str) -> RenderError {
    RenderError::UnknownField {
        kind: value.kind(),
        field: field.to_string(),
    }
}

// Same order as SANDBOX_TOKENS.
fn sandbox_flags(opts: &SandboxOptions) -> [bool; 13] {
    [
        opts.allow_downloads,
        opts.allow_forms,
        opts.allow_modals,
        opts.allow_orientation_lock,
        opts.allow_pointer_lock,
        opts.allow_popups,
        opts.allow_popups_to_escape_sandbox,
        opts.allow_presentation,
        opts.allow_same_origin,
        opts.allow_scripts,
        opts.allow_top_navigation,
        opts.allow_top_navigation_by_user_activation,
        opts.allow_top_navigation_to_custom_protocols,
    ]
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
