//! Directive templates.
//!
//! A template is literal text with `{field}` placeholders. Each
//! [`TemplateKind`] defines the fields its placeholders may name; `{{` and
//! `}}` stand for literal braces. Whitespace in the rendered result is
//! normalized by the renderer, so templates separate placeholders with
//! plain spaces and never worry about empty fields.

use crate::assembler::AssemblyError;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Default source-option template
pub const TEMPLATE_TEXT_SOURCE_OPTION: &str = "{self} {values} {unsafe-eval} \
    {wasm-unsafe-eval} {unsafe-hashes} {unsafe-inline} {nonce} {hash} \
    {strict-dynamic} {report-sample}";

/// Default sandbox template
pub const TEMPLATE_TEXT_SANDBOX: &str = "{allow-downloads} {allow-forms} {allow-modals} \
    {allow-orientation-lock} {allow-pointer-lock} {allow-popups} \
    {allow-popups-to-escape-sandbox} {allow-presentation} {allow-same-origin} \
    {allow-scripts} {allow-top-navigation} {allow-top-navigation-by-user-activation} \
    {allow-top-navigation-to-custom-protocols}";

/// Default frame-ancestors template
pub const TEMPLATE_TEXT_FRAME_ANCESTORS: &str = "{self} {host-sources} {scheme-sources}";

/// Default template for multiple unquoted values
pub const TEMPLATE_TEXT_UNQUOTED_MULTI: &str = "{values}";

/// Default template for a single unquoted value
pub const TEMPLATE_TEXT_UNQUOTED_SINGLE: &str = "{value}";

/// Sandbox tokens in canonical order
pub const SANDBOX_TOKENS: [&str; 13] = [
    "allow-downloads",
    "allow-forms",
    "allow-modals",
    "allow-orientation-lock",
    "allow-pointer-lock",
    "allow-popups",
    "allow-popups-to-escape-sandbox",
    "allow-presentation",
    "allow-same-origin",
    "allow-scripts",
    "allow-top-navigation",
    "allow-top-navigation-by-user-activation",
    "allow-top-navigation-to-custom-protocols",
];

const SOURCE_OPTION_FIELDS: [&str; 10] = [
    "self",
    "values",
    "unsafe-eval",
    "wasm-unsafe-eval",
    "unsafe-hashes",
    "unsafe-inline",
    "nonce",
    "hash",
    "strict-dynamic",
    "report-sample",
];

const FRAME_ANCESTOR_FIELDS: [&str; 3] = ["self", "host-sources", "scheme-sources"];

/// The five option shapes a template can be bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TemplateKind {
    /// Source-list directives
    SourceOption,
    /// `sandbox`
    Sandbox,
    /// `frame-ancestors`
    FrameAncestors,
    /// Several unquoted values (`report-uri`)
    UnquotedMulti,
    /// One unquoted value (`report-to`)
    UnquotedSingle,
}

impl TemplateKind {
    /// Every kind
    pub const ALL: [TemplateKind; 5] = [
        Self::SourceOption,
        Self::Sandbox,
        Self::FrameAncestors,
        Self::UnquotedMulti,
        Self::UnquotedSingle,
    ];

    /// Kind name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SourceOption => "source-option",
            Self::Sandbox => "sandbox",
            Self::FrameAncestors => "frame-ancestors",
            Self::UnquotedMulti => "unquoted-multi",
            Self::UnquotedSingle => "unquoted-single",
        }
    }

    /// Placeholder names a template of this kind may use
    #[must_use]
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            Self::SourceOption => &SOURCE_OPTION_FIELDS,
            Self::Sandbox => &SANDBOX_TOKENS,
            Self::FrameAncestors => &FRAME_ANCESTOR_FIELDS,
            Self::UnquotedMulti => &["values"],
            Self::UnquotedSingle => &["value"],
        }
    }

    /// Built-in template text
    #[must_use]
    pub const fn default_text(&self) -> &'static str {
        match self {
            Self::SourceOption => TEMPLATE_TEXT_SOURCE_OPTION,
            Self::Sandbox => TEMPLATE_TEXT_SANDBOX,
            Self::FrameAncestors => TEMPLATE_TEXT_FRAME_ANCESTORS,
            Self::UnquotedMulti => TEMPLATE_TEXT_UNQUOTED_MULTI,
            Self::UnquotedSingle => TEMPLATE_TEXT_UNQUOTED_SINGLE,
        }
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateKind {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| TemplateError::UnknownKind(s.to_string()))
    }
}

/// Template compilation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// `{` without a matching `}`
    #[error("unclosed placeholder at byte {position}")]
    Unclosed { position: usize },

    /// `}` outside a placeholder
    #[error("unmatched '}}' at byte {position}")]
    UnmatchedClose { position: usize },

    /// `{}`
    #[error("empty placeholder at byte {position}")]
    EmptyPlaceholder { position: usize },

    /// Placeholder names a field the kind does not have
    #[error("{kind} templates have no field {field:?}")]
    UnknownField { kind: TemplateKind, field: String },

    /// Kind name not recognized
    #[error("unknown template kind: {0}")]
    UnknownKind(String),
}

/// A piece of compiled template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Copied verbatim
    Literal(String),
    /// Replaced by the field's tokens
    Field(&'static str),
}

/// A compiled template bound to one [`TemplateKind`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    kind: TemplateKind,
    segments: Vec<Segment>,
}

impl Template {
    /// Compile template text for a kind
    ///
    /// # Errors
    ///
    /// Returns error if the text is malformed or names an unknown field
    pub fn compile(kind: TemplateKind, text: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = text.char_indices().peekable();

        while let Some((position, c)) = chars.next() {
            match c {
                '{' => {
                    if chars.next_if(|&(_, next)| next == '{').is_some() {
                        literal.push('{');
                        continue;
                    }

                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some((_, '}')) => break,
                            Some((_, '{')) | None => {
                                return Err(TemplateError::Unclosed { position });
                            }
                            Some((_, ch)) => name.push(ch),
                        }
                    }

                    let name = name.trim();
                    if name.is_empty() {
                        return Err(TemplateError::EmptyPlaceholder { position });
                    }
                    let field = kind
                        .fields()
                        .iter()
                        .copied()
                        .find(|f| *f == name)
                        .ok_or_else(|| TemplateError::UnknownField {
                            kind,
                            field: name.to_string(),
                        })?;

                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Field(field));
                }
                '}' => {
                    if chars.next_if(|&(_, next)| next == '}').is_none() {
                        return Err(TemplateError::UnmatchedClose { position });
                    }
                    literal.push('}');
                }
                other => literal.push(other),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self { kind, segments })
    }

    /// Kind this template renders
    #[must_use]
    pub fn kind(&self) -> TemplateKind {
        self.kind
    }

    /// Compiled segments in order
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

/// One compiled template per kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSet {
    source_option: Arc<Template>,
    sandbox: Arc<Template>,
    frame_ancestors: Arc<Template>,
    unquoted_multi: Arc<Template>,
    unquoted_single: Arc<Template>,
}

static DEFAULT_TEMPLATES: Lazy<TemplateSet> = Lazy::new(|| {
    // Built-in texts are constants covered by `test_default_templates_match_builtin_text`
    let compile = |kind: TemplateKind| {
        Arc::new(Template::compile(kind, kind.default_text()).expect("built-in template is valid"))
    };
    TemplateSet {
        source_option: compile(TemplateKind::SourceOption),
        sandbox: compile(TemplateKind::Sandbox),
        frame_ancestors: compile(TemplateKind::FrameAncestors),
        unquoted_multi: compile(TemplateKind::UnquotedMulti),
        unquoted_single: compile(TemplateKind::UnquotedSingle),
    }
});

impl TemplateSet {
    /// Template for a kind
    #[must_use]
    pub fn get(&self, kind: TemplateKind) -> &Template {
        match kind {
            TemplateKind::SourceOption => &self.source_option,
            TemplateKind::Sandbox => &self.sandbox,
            TemplateKind::FrameAncestors => &self.frame_ancestors,
            TemplateKind::UnquotedMulti => &self.unquoted_multi,
            TemplateKind::UnquotedSingle => &self.unquoted_single,
        }
    }

    fn slot_mut(&mut self, kind: TemplateKind) -> &mut Arc<Template> {
        match kind {
            TemplateKind::SourceOption => &mut self.source_option,
            TemplateKind::Sandbox => &mut self.sandbox,
            TemplateKind::FrameAncestors => &mut self.frame_ancestors,
            TemplateKind::UnquotedMulti => &mut self.unquoted_multi,
            TemplateKind::UnquotedSingle => &mut self.unquoted_single,
        }
    }
}

impl Default for TemplateSet {
    fn default() -> Self {
        DEFAULT_TEMPLATES.clone()
    }
}

/// Caller overrides for template text; absent or empty text selects the built-in
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TemplateConfig {
    /// Source-option template text
    pub source_option: Option<String>,
    /// Sandbox template text
    pub sandbox: Option<String>,
    /// Frame-ancestors template text
    pub frame_ancestors: Option<String>,
    /// Multi-value unquoted template text
    pub unquoted_multi: Option<String>,
    /// Single-value unquoted template text
    pub unquoted_single: Option<String>,
}

impl TemplateConfig {
    /// Override text for a kind, if one is set
    #[must_use]
    pub fn text(&self, kind: TemplateKind) -> Option<&str> {
        let text = match kind {
            TemplateKind::SourceOption => &self.source_option,
            TemplateKind::Sandbox => &self.sandbox,
            TemplateKind::FrameAncestors => &self.frame_ancestors,
            TemplateKind::UnquotedMulti => &self.unquoted_multi,
            TemplateKind::UnquotedSingle => &self.unquoted_single,
        };
        text.as_deref().filter(|t| !t.is_empty())
    }

    /// Set override text for a kind
    #[must_use]
    pub fn with_text(mut self, kind: TemplateKind, text: impl Into<String>) -> Self {
        let text = Some(text.into());
        match kind {
            TemplateKind::SourceOption => self.source_option = text,
            TemplateKind::Sandbox => self.sandbox = text,
            TemplateKind::FrameAncestors => self.frame_ancestors = text,
            TemplateKind::UnquotedMulti => self.unquoted_multi = text,
            TemplateKind::UnquotedSingle => self.unquoted_single = text,
        }
        self
    }

    /// Compile overrides on top of the built-in templates
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError::TemplateInvalid`] for the first override that fails to compile
    pub fn compile(&self) -> Result<TemplateSet, AssemblyError> {
        let mut set = TemplateSet::default();
        for kind in TemplateKind::ALL {
            if let Some(text) = self.text(kind) {
                let template = Template::compile(kind, text)
                    .map_err(|source| AssemblyError::TemplateInvalid { kind, source })?;
                *set.slot_mut(kind) = Arc::new(template);
            }
        }
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_templates_match_builtin_text() {
        let defaults = TemplateSet::default();
        for kind in TemplateKind::ALL {
            let compiled = Template::compile(kind, kind.default_text()).unwrap();
            assert_eq!(*defaults.get(kind), compiled);
        }
    }

    #[test]
    fn test_builtin_templates_compile() {
        for kind in TemplateKind::ALL {
            let template = Template::compile(kind, kind.default_text()).unwrap();
            assert_eq!(template.kind(), kind);
            let fields = template
                .segments()
                .iter()
                .filter(|s| matches!(s, Segment::Field(_)))
                .count();
            assert_eq!(fields, kind.fields().len());
        }
    }

    #[test]
    fn test_compile_segments() {
        let template = Template::compile(TemplateKind::FrameAncestors, "x {self}{ host-sources }").unwrap();
        assert_eq!(
            template.segments(),
            &[
                Segment::Literal("x ".to_string()),
                Segment::Field("self"),
                Segment::Field("host-sources"),
            ]
        );
    }

    #[test]
    fn test_compile_escaped_braces() {
        let template = Template::compile(TemplateKind::UnquotedSingle, "{{{value}}}").unwrap();
        assert_eq!(
            template.segments(),
            &[
                Segment::Literal("{".to_string()),
                Segment::Field("value"),
                Segment::Literal("}".to_string()),
            ]
        );
    }

    #[test]
    fn test_compile_errors() {
        assert_eq!(
            Template::compile(TemplateKind::SourceOption, "{self"),
            Err(TemplateError::Unclosed { position: 0 })
        );
        assert_eq!(
            Template::compile(TemplateKind::SourceOption, "{self {values}"),
            Err(TemplateError::Unclosed { position: 0 })
        );
        assert_eq!(
            Template::compile(TemplateKind::SourceOption, "{self} }"),
            Err(TemplateError::UnmatchedClose { position: 7 })
        );
        assert_eq!(
            Template::compile(TemplateKind::SourceOption, "{ }"),
            Err(TemplateError::EmptyPlaceholder { position: 0 })
        );
        assert!(matches!(
            Template::compile(TemplateKind::Sandbox, "{self}"),
            Err(TemplateError::UnknownField { kind: TemplateKind::Sandbox, .. })
        ));
    }

    #[test]
    fn test_config_empty_text_uses_default() {
        let config = TemplateConfig::default().with_text(TemplateKind::Sandbox, "");
        assert_eq!(config.text(TemplateKind::Sandbox), None);
        let set = config.compile().unwrap();
        assert_eq!(set, TemplateSet::default());
    }

    #[test]
    fn test_config_override() {
        let config = TemplateConfig::default().with_text(TemplateKind::UnquotedSingle, "g-{value}");
        let set = config.compile().unwrap();
        assert_eq!(set.get(TemplateKind::UnquotedSingle).segments().len(), 2);
        assert_eq!(set.get(TemplateKind::Sandbox), TemplateSet::default().get(TemplateKind::Sandbox));
    }

    #[test]
    fn test_config_invalid_override() {
        let config = TemplateConfig::default().with_text(TemplateKind::FrameAncestors, "{values}");
        let err = config.compile().unwrap_err();
        assert!(matches!(
            err,
            AssemblyError::TemplateInvalid {
                kind: TemplateKind::FrameAncestors,
                ..
            }
        ));
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!("unquoted-multi".parse::<TemplateKind>().unwrap(), TemplateKind::UnquotedMulti);
        assert!(matches!(
            "bogus".parse::<TemplateKind>(),
            Err(TemplateError::UnknownKind(_))
        ));
    }
}
