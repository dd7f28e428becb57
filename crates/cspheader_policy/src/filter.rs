//! Redundancy filter for fetch directives.
//!
//! A fetch directive whose rendered text equals the rendered `default-src`
//! adds nothing, since browsers fall back to `default-src` anyway.

use cspheader_core::Directive;

/// Whether a rendered directive duplicates `default-src` and should be dropped.
///
/// Only fetch directives are ever redundant; `default-src` itself and
/// non-fetch directives always return false.
#[must_use]
pub fn is_redundant(directive: Directive, rendered: &str, default_src: &str) -> bool {
    directive.is_fetch() && rendered == default_src
}
