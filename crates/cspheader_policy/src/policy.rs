//! The policy aggregate: every supported directive's options plus the
//! `Report-To` payload and optional template overrides.

use crate::options::{
    FrameAncestorOptions, SandboxOptions, SourceOptions, UnquotedOption, UnquotedOptions,
};
use crate::template::TemplateConfig;
use cspheader_core::Directive;
use serde::{Deserialize, Serialize};

/// A complete Content-Security-Policy configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Policy {
    /// Template text overrides
    pub templates: TemplateConfig,
    /// Directive options
    pub csp: CspDirectives,
    /// Literal `Report-To` header body; opaque to assembly beyond the group check
    pub report_to_payload: String,
}

impl Policy {
    /// Create a policy where every source-list directive is `'none'`
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace template overrides
    #[must_use]
    pub fn with_templates(mut self, templates: TemplateConfig) -> Self {
        self.templates = templates;
        self
    }

    /// Set the `report-to` group and the matching `Report-To` payload
    #[must_use]
    pub fn with_report_to(mut self, group: impl Into<String>, payload: impl Into<String>) -> Self {
        self.csp.report_to = UnquotedOption::new(group);
        self.report_to_payload = payload.into();
        self
    }

    /// Parse a policy from JSON
    ///
    /// # Errors
    ///
    /// Returns error if the JSON does not describe a policy
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Per-directive options, one field per supported directive
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CspDirectives {
    // Fetch directives
    /// Fallback for absent fetch directives; `'self'` includes the scheme
    pub default_src: SourceOptions,
    /// Workers and embedded frames
    pub child_src: SourceOptions,
    /// `connect-src`
    pub connect_src: SourceOptions,
    /// `font-src`
    pub font_src: SourceOptions,
    /// `frame-src`
    pub frame_src: SourceOptions,
    /// `img-src`
    pub img_src: SourceOptions,
    /// `manifest-src`
    pub manifest_src: SourceOptions,
    /// `media-src`
    pub media_src: SourceOptions,
    /// `object-src`
    pub object_src: SourceOptions,
    /// `prefetch-src`
    pub prefetch_src: SourceOptions,
    /// `script-src`
    pub script_src: SourceOptions,
    /// `script-src-elem`
    pub script_src_elem: SourceOptions,
    /// `script-src-attr`
    pub script_src_attr: SourceOptions,
    /// `style-src`
    pub style_src: SourceOptions,
    /// `style-src-elem`
    pub style_src_elem: SourceOptions,
    /// `style-src-attr`
    pub style_src_attr: SourceOptions,
    /// `worker-src`
    pub worker_src: SourceOptions,

    // Document directives
    /// `base-uri`
    pub base_uri: SourceOptions,
    /// `sandbox`
    pub sandbox: SandboxOptions,

    // Navigation directives
    /// `form-action`
    pub form_action: SourceOptions,
    /// `frame-ancestors`
    pub frame_ancestors: FrameAncestorOptions,

    // Reporting directives
    /// `report-uri`; deprecated but still the only option in some browsers
    pub report_uri: UnquotedOptions,
    /// `report-to` group; requires a matching `Report-To` payload
    pub report_to: UnquotedOption,

    /// `upgrade-insecure-requests`
    pub upgrade_insecure_requests: bool,
}

impl CspDirectives {
    /// Source options for a source-list directive
    #[must_use]
    pub fn source(&self, directive: Directive) -> Option<&SourceOptions> {
        let options = match directive {
            Directive::DefaultSrc => &self.default_src,
            Directive::ChildSrc => &self.child_src,
            Directive::ConnectSrc => &self.connect_src,
            Directive::FontSrc => &self.font_src,
            Directive::FrameSrc => &self.frame_src,
            Directive::ImgSrc => &self.img_src,
            Directive::ManifestSrc => &self.manifest_src,
            Directive::MediaSrc => &self.media_src,
            Directive::ObjectSrc => &self.object_src,
            Directive::PrefetchSrc => &self.prefetch_src,
            Directive::ScriptSrc => &self.script_src,
            Directive::ScriptSrcElem => &self.script_src_elem,
            Directive::ScriptSrcAttr => &self.script_src_attr,
            Directive::StyleSrc => &self.style_src,
            Directive::StyleSrcElem => &self.style_src_elem,
            Directive::StyleSrcAttr => &self.style_src_attr,
            Directive::WorkerSrc => &self.worker_src,
            Directive::BaseUri => &self.base_uri,
            Directive::FormAction => &self.form_action,
            Directive::Sandbox
            | Directive::FrameAncestors
            | Directive::ReportUri
            | Directive::ReportTo
            | Directive::UpgradeInsecureRequests => return None,
        };
        Some(options)
    }

    /// Mutable source options for a source-list directive
    pub fn source_mut(&mut self, directive: Directive) -> Option<&mut SourceOptions> {
        let options = match directive {
            Directive::DefaultSrc => &mut self.default_src,
            Directive::ChildSrc => &mut self.child_src,
            Directive::ConnectSrc => &mut self.connect_src,
            Directive::FontSrc => &mut self.font_src,
            Directive::FrameSrc => &mut self.frame_src,
            Directive::ImgSrc => &mut self.img_src,
            Directive::ManifestSrc => &mut self.manifest_src,
            Directive::MediaSrc => &mut self.media_src,
            Directive::ObjectSrc => &mut self.object_src,
            Directive::PrefetchSrc => &mut self.prefetch_src,
            Directive::ScriptSrc => &mut self.script_src,
            Directive::ScriptSrcElem => &mut self.script_src_elem,
            Directive::ScriptSrcAttr => &mut self.script_src_attr,
            Directive::StyleSrc => &mut self.style_src,
            Directive::StyleSrcElem => &mut self.style_src_elem,
            Directive::StyleSrcAttr => &mut self.style_src_attr,
            Directive::WorkerSrc => &mut self.worker_src,
            Directive::BaseUri => &mut self.base_uri,
            Directive::FormAction => &mut self.form_action,
            Directive::Sandbox
            | Directive::FrameAncestors
            | Directive::ReportUri
            | Directive::ReportTo
            | Directive::UpgradeInsecureRequests => return None,
        };
        Some(options)
    }
}
