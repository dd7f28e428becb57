//! Directive vocabulary.
//!
//! Variants are declared in canonical order; the derived `Ord` is the order
//! in which assembled policies are flattened.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A supported Content-Security-Policy directive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Directive {
    /// Fallback for every other fetch directive
    DefaultSrc,
    /// Workers and nested browsing contexts
    ChildSrc,
    /// Script interfaces such as fetch and WebSocket
    ConnectSrc,
    /// Fonts loaded via `@font-face`
    FontSrc,
    /// Nested browsing contexts such as `<iframe>`
    FrameSrc,
    /// Images and favicons
    ImgSrc,
    /// Application manifests
    ManifestSrc,
    /// `<audio>`, `<video>` and `<track>`
    MediaSrc,
    /// `<object>` and `<embed>`
    ObjectSrc,
    /// Prefetched or prerendered resources
    PrefetchSrc,
    /// JavaScript and WebAssembly
    ScriptSrc,
    /// `<script>` elements
    ScriptSrcElem,
    /// Inline script event handlers
    ScriptSrcAttr,
    /// Stylesheets
    StyleSrc,
    /// `<style>` and `<link rel="stylesheet">` elements
    StyleSrcElem,
    /// Inline `style` attributes
    StyleSrcAttr,
    /// Worker, SharedWorker and ServiceWorker scripts
    WorkerSrc,
    /// URLs usable in a document's `<base>` element
    BaseUri,
    /// Sandbox restrictions, like the `<iframe>` attribute
    Sandbox,
    /// Form submission targets
    FormAction,
    /// Parents that may embed the page
    FrameAncestors,
    /// Legacy violation reporting endpoint
    ReportUri,
    /// Reporting API group name
    ReportTo,
    /// Treat insecure URLs as if they were HTTPS
    UpgradeInsecureRequests,
}

/// Directive grouping as used by the CSP specification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DirectiveCategory {
    /// Where resources may be loaded from
    Fetch,
    /// Properties of the document or worker environment
    Document,
    /// Where the user may navigate or submit forms to
    Navigation,
    /// Violation reporting
    Reporting,
    /// Anything else
    Other,
}

impl Directive {
    /// Every directive, in canonical order
    pub const ALL: [Directive; 24] = [
        Self::DefaultSrc,
        Self::ChildSrc,
        Self::ConnectSrc,
        Self::FontSrc,
        Self::FrameSrc,
        Self::ImgSrc,
        Self::ManifestSrc,
        Self::MediaSrc,
        Self::ObjectSrc,
        Self::PrefetchSrc,
        Self::ScriptSrc,
        Self::ScriptSrcElem,
        Self::ScriptSrcAttr,
        Self::StyleSrc,
        Self::StyleSrcElem,
        Self::StyleSrcAttr,
        Self::WorkerSrc,
        Self::BaseUri,
        Self::Sandbox,
        Self::FormAction,
        Self::FrameAncestors,
        Self::ReportUri,
        Self::ReportTo,
        Self::UpgradeInsecureRequests,
    ];

    /// Fetch directives that fall back to `default-src` (excludes `default-src` itself)
    pub const FETCH: [Directive; 16] = [
        Self::ChildSrc,
        Self::ConnectSrc,
        Self::FontSrc,
        Self::FrameSrc,
        Self::ImgSrc,
        Self::ManifestSrc,
        Self::MediaSrc,
        Self::ObjectSrc,
        Self::PrefetchSrc,
        Self::ScriptSrc,
        Self::ScriptSrcElem,
        Self::ScriptSrcAttr,
        Self::StyleSrc,
        Self::StyleSrcElem,
        Self::StyleSrcAttr,
        Self::WorkerSrc,
    ];

    /// Directive name as written in the header
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DefaultSrc => "default-src",
            Self::ChildSrc => "child-src",
            Self::ConnectSrc => "connect-src",
            Self::FontSrc => "font-src",
            Self::FrameSrc => "frame-src",
            Self::ImgSrc => "img-src",
            Self::ManifestSrc => "manifest-src",
            Self::MediaSrc => "media-src",
            Self::ObjectSrc => "object-src",
            Self::PrefetchSrc => "prefetch-src",
            Self::ScriptSrc => "script-src",
            Self::ScriptSrcElem => "script-src-elem",
            Self::ScriptSrcAttr => "script-src-attr",
            Self::StyleSrc => "style-src",
            Self::StyleSrcElem => "style-src-elem",
            Self::StyleSrcAttr => "style-src-attr",
            Self::WorkerSrc => "worker-src",
            Self::BaseUri => "base-uri",
            Self::Sandbox => "sandbox",
            Self::FormAction => "form-action",
            Self::FrameAncestors => "frame-ancestors",
            Self::ReportUri => "report-uri",
            Self::ReportTo => "report-to",
            Self::UpgradeInsecureRequests => "upgrade-insecure-requests",
        }
    }

    /// Category the directive belongs to
    #[must_use]
    pub const fn category(&self) -> DirectiveCategory {
        match self {
            Self::BaseUri | Self::Sandbox => DirectiveCategory::Document,
            Self::FormAction | Self::FrameAncestors => DirectiveCategory::Navigation,
            Self::ReportUri | Self::ReportTo => DirectiveCategory::Reporting,
            Self::UpgradeInsecureRequests => DirectiveCategory::Other,
            _ => DirectiveCategory::Fetch,
        }
    }

    /// Whether the directive is subject to `default-src` redundancy filtering
    #[must_use]
    pub const fn is_fetch(&self) -> bool {
        !matches!(self, Self::DefaultSrc) && matches!(self.category(), DirectiveCategory::Fetch)
    }

    /// Whether the directive is governed by the source-list grammar
    #[must_use]
    pub const fn is_source_list(&self) -> bool {
        matches!(self.category(), DirectiveCategory::Fetch)
            || matches!(self, Self::BaseUri | Self::FormAction)
    }

    /// Whether the directive is written with a value after its name
    #[must_use]
    pub const fn takes_value(&self) -> bool {
        !matches!(self, Self::UpgradeInsecureRequests)
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Directive {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|d| d.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| CoreError::UnknownDirective {
                name: s.to_string(),
            })
    }
}

impl DirectiveCategory {
    /// Category name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Document => "document",
            Self::Navigation => "navigation",
            Self::Reporting => "reporting",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for DirectiveCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DirectiveCategory {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fetch" => Ok(Self::Fetch),
            "document" => Ok(Self::Document),
            "navigation" => Ok(Self::Navigation),
            "reporting" => Ok(Self::Reporting),
            "other" => Ok(Self::Other),
            _ => Err(CoreError::UnknownCategory {
                name: s.to_string(),
            }),
        }
    }
}
