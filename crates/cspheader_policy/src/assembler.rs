//! Policy assembler.
//!
//! Turns a [`Policy`] into header values:
//!
//! 1. compile templates (caller overrides or built-ins)
//! 2. validate `report-to` against the `Report-To` payload
//! 3. render `default-src`, always kept
//! 4. render fetch directives, dropping any identical to `default-src`
//! 5. render `base-uri` and `form-action`
//! 6. render the remaining directives, all static
//! 7. flatten static then dynamic directives into one header value
//!
//! The static half of an [`AssembledPolicy`] can be reused across responses
//! while nonce-bearing directives are regenerated with
//! [`AssembledPolicy::refresh`].

use crate::directive_map::{flatten, DirectiveMap};
use crate::filter::is_redundant;
use crate::options::SourceOptions;
use crate::partition::{classify, Partition};
use crate::policy::Policy;
use crate::renderer::{OptionValue, RenderError, Renderer};
use crate::template::{TemplateError, TemplateKind};
use crate::validate::Validator;
use cspheader_core::{Directive, CONTENT_SECURITY_POLICY, REPORT_TO};
use indexmap::IndexMap;
use tracing::{debug, trace};

/// Header name to header value, in emission order
pub type HeaderMap = IndexMap<String, String>;

/// Assembly errors. Assembly either fully succeeds or produces nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssemblyError {
    /// A caller-supplied template failed to compile
    #[error("invalid {kind} template: {source}")]
    TemplateInvalid {
        kind: TemplateKind,
        #[source]
        source: TemplateError,
    },

    /// `report-to` is set but there is no `Report-To` payload
    #[error("report-to group {group:?} requires a Report-To payload")]
    ReportToMissing { group: String },

    /// The `Report-To` payload does not mention the `report-to` group
    #[error("Report-To payload does not reference report-to group {group:?}")]
    ReportToMismatch { group: String },

    /// Rendering a directive failed
    #[error("failed to render {directive}: {source}")]
    Render {
        directive: Directive,
        #[source]
        source: RenderError,
    },

    /// Only source-list directives can be regenerated per response
    #[error("{directive} is not a source-list directive")]
    NotSourceDirective { directive: Directive },

    /// `default-src` decides which fetch directives were dropped, so changing
    /// it needs a full reassembly
    #[error("default-src cannot be regenerated per response; reassemble the policy")]
    DefaultSrcRefresh,
}

/// Assembles policies into header values
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyAssembler {
    validator: Validator,
}

impl PolicyAssembler {
    /// Create a new assembler
    #[must_use]
    pub fn new() -> Self {
        Self {
            validator: Validator::new(),
        }
    }

    /// Assemble a policy
    ///
    /// # Errors
    ///
    /// Returns error if a template override is invalid, `report-to` validation
    /// fails, or a directive fails to render
    pub fn assemble(&self, policy: &Policy) -> Result<AssembledPolicy, AssemblyError> {
        let templates = policy.templates.compile()?;
        self.validator.validate(policy)?;

        let renderer = Renderer::new(templates);
        let csp = &policy.csp;
        let mut split = Split::default();

        let default_src = render_directive(&renderer, Directive::DefaultSrc, &csp.default_src)?;
        split.static_directives.insert(Directive::DefaultSrc, default_src.clone());

        for directive in Directive::FETCH.into_iter().chain([Directive::BaseUri, Directive::FormAction]) {
            let options = csp
                .source(directive)
                .ok_or(AssemblyError::NotSourceDirective { directive })?;
            let text = render_directive(&renderer, directive, options)?;
            if is_redundant(directive, &text, &default_src) {
                debug!(%directive, "dropping directive identical to default-src");
                continue;
            }
            split.place(directive, text, classify(options));
        }

        split.static_directives.insert(
            Directive::Sandbox,
            render_directive(&renderer, Directive::Sandbox, &csp.sandbox)?,
        );
        split.static_directives.insert(
            Directive::FrameAncestors,
            render_directive(&renderer, Directive::FrameAncestors, &csp.frame_ancestors)?,
        );
        split.static_directives.insert(
            Directive::ReportUri,
            render_directive(&renderer, Directive::ReportUri, &csp.report_uri)?,
        );
        split.static_directives.insert(
            Directive::ReportTo,
            render_directive(&renderer, Directive::ReportTo, &csp.report_to)?,
        );
        let upgrade = if csp.upgrade_insecure_requests {
            Directive::UpgradeInsecureRequests.as_str()
        } else {
            ""
        };
        split
            .static_directives
            .insert(Directive::UpgradeInsecureRequests, upgrade);

        debug!(
            static_count = split.static_directives.len(),
            dynamic_count = split.dynamic_directives.len(),
            "assembled policy"
        );

        Ok(AssembledPolicy {
            renderer,
            static_directives: split.static_directives,
            dynamic_directives: split.dynamic_directives,
            report_to: Some(policy.report_to_payload.clone()).filter(|p| !p.is_empty()),
        })
    }
}

#[derive(Default)]
struct Split {
    static_directives: DirectiveMap,
    dynamic_directives: DirectiveMap,
}

impl Split {
    fn place(&mut self, directive: Directive, text: String, partition: Partition) {
        match partition {
            Partition::Static => {
                self.static_directives.insert(directive, text);
            }
            Partition::Dynamic => {
                debug!(%directive, "directive carries a nonce or hash");
                self.dynamic_directives.insert(directive, text);
            }
        }
    }
}

fn render_directive<'a>(
    renderer: &Renderer,
    directive: Directive,
    value: impl Into<OptionValue<'a>>,
) -> Result<String, AssemblyError> {
    let text = renderer
        .render(value)
        .map_err(|source| AssemblyError::Render { directive, source })?;
    trace!(%directive, %text, "rendered directive");
    Ok(text)
}

/// Result of assembling a policy.
///
/// Holds the static and dynamic directive maps so the static snapshot can be
/// reused while dynamic directives are rendered afresh for each response.
#[derive(Debug, Clone)]
pub struct AssembledPolicy {
    renderer: Renderer,
    static_directives: DirectiveMap,
    dynamic_directives: DirectiveMap,
    report_to: Option<String>,
}

impl AssembledPolicy {
    /// Directives stable across responses
    #[must_use]
    pub fn static_directives(&self) -> &DirectiveMap {
        &self.static_directives
    }

    /// Directives carrying a nonce or hash
    #[must_use]
    pub fn dynamic_directives(&self) -> &DirectiveMap {
        &self.dynamic_directives
    }

    /// `Report-To` payload, if one was configured
    #[must_use]
    pub fn report_to(&self) -> Option<&str> {
        self.report_to.as_deref()
    }

    /// Flattened `Content-Security-Policy` value
    #[must_use]
    pub fn content_security_policy(&self) -> String {
        flatten(&self.static_directives, &self.dynamic_directives)
    }

    /// Header map for this policy
    #[must_use]
    pub fn headers(&self) -> HeaderMap {
        self.merge_dynamic(&self.dynamic_directives)
    }

    /// Render fresh dynamic directives for one response.
    ///
    /// Fetch directives identical to the snapshot's `default-src` render to
    /// empty text, which hides them in [`merge_dynamic`](Self::merge_dynamic).
    ///
    /// # Errors
    ///
    /// Returns error if a directive is `default-src`, is not a source-list
    /// directive, or fails to render
    pub fn render_dynamic(
        &self,
        updates: &[(Directive, SourceOptions)],
    ) -> Result<DirectiveMap, AssemblyError> {
        let default_src = self
            .static_directives
            .get(Directive::DefaultSrc)
            .unwrap_or_default();
        let mut fresh = DirectiveMap::new();

        for (directive, options) in updates {
            let directive = *directive;
            if directive == Directive::DefaultSrc {
                return Err(AssemblyError::DefaultSrcRefresh);
            }
            if !directive.is_source_list() {
                return Err(AssemblyError::NotSourceDirective { directive });
            }
            let mut text = render_directive(&self.renderer, directive, options)?;
            if is_redundant(directive, &text, default_src) {
                debug!(%directive, "dropping directive identical to default-src");
                text.clear();
            }
            fresh.insert(directive, text);
        }

        Ok(fresh)
    }

    /// Merge a fresh dynamic map into the static snapshot.
    ///
    /// An entry in `dynamic` replaces a static entry for the same directive.
    #[must_use]
    pub fn merge_dynamic(&self, dynamic: &DirectiveMap) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_SECURITY_POLICY.to_string(),
            flatten(&self.static_directives, dynamic),
        );
        if let Some(payload) = &self.report_to {
            headers.insert(REPORT_TO.to_string(), payload.clone());
        }
        headers
    }

    /// Re-render the given directives and return headers for one response.
    ///
    /// Dynamic directives not named in `updates` keep their assembled text.
    ///
    /// # Errors
    ///
    /// Returns error under the same conditions as [`render_dynamic`](Self::render_dynamic)
    pub fn refresh(
        &self,
        updates: &[(Directive, SourceOptions)],
    ) -> Result<HeaderMap, AssemblyError> {
        let mut dynamic = self.dynamic_directives.clone();
        for (directive, text) in self.render_dynamic(updates)?.iter() {
            dynamic.insert(directive, text);
        }
        Ok(self.merge_dynamic(&dynamic))
    }
}

/// Assemble a policy straight into its header map
///
/// # Errors
///
/// Returns error under the same conditions as [`PolicyAssembler::assemble`]
pub fn assemble(policy: &Policy) -> Result<HeaderMap, AssemblyError> {
    Ok(PolicyAssembler::new().assemble(policy)?.headers())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{FrameAncestorOptions, SandboxOptions, UnquotedOption, UnquotedOptions};
    use crate::renderer::nonce_source;
    use crate::template::TemplateConfig;
    use proptest::prelude::*;

    const PAYLOAD: &str =
        r#"{"group":"default","max_age": 86400, "endpoints": [{"url":"/_/csp-reports" }]}"#;

    fn fragments(csp: &str) -> Vec<String> {
        csp.split_inclusive(';')
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .collect()
    }

    fn scenario_policy() -> Policy {
        let mut policy = Policy::new();
        policy.csp.default_src = SourceOptions::none();
        policy.csp.script_src = SourceOptions::self_only();
        policy.csp.base_uri = SourceOptions::none();
        policy.csp.form_action = SourceOptions::self_only();
        policy.csp.frame_ancestors = FrameAncestorOptions::default();
        policy.csp.report_to = UnquotedOption::new("default");
        policy.report_to_payload = PAYLOAD.to_string();
        policy
    }

    #[test]
    fn test_end_to_end_scenario() {
        let headers = assemble(&scenario_policy()).unwrap();
        let csp = &headers[CONTENT_SECURITY_POLICY];
        let parts = fragments(csp);

        for expected in [
            "default-src 'none';",
            "script-src 'self';",
            "base-uri 'none';",
            "form-action 'self';",
            "frame-ancestors 'none';",
            "report-to default;",
        ] {
            assert!(parts.contains(&expected.to_string()), "missing {expected} in {csp}");
        }
        assert_eq!(parts.len(), 6, "{csp}");
        assert_eq!(headers[REPORT_TO], PAYLOAD);
    }

    #[test]
    fn test_end_to_end_canonical_order() {
        let headers = assemble(&scenario_policy()).unwrap();
        assert_eq!(
            headers[CONTENT_SECURITY_POLICY],
            "default-src 'none'; script-src 'self'; base-uri 'none'; form-action 'self'; \
             frame-ancestors 'none'; report-to default;"
        );
        let keys: Vec<_> = headers.keys().cloned().collect();
        assert_eq!(keys, vec![CONTENT_SECURITY_POLICY, REPORT_TO]);
    }

    #[test]
    fn test_redundant_fetch_directive_dropped() {
        let mut policy = Policy::new();
        policy.csp.default_src = SourceOptions::self_only();
        policy.csp.script_src = SourceOptions::self_only();
        policy.csp.img_src = SourceOptions {
            values: vec!["data:".to_string()],
            ..SourceOptions::self_only()
        };

        let assembled = PolicyAssembler::new().assemble(&policy).unwrap();
        let csp = assembled.content_security_policy();
        assert!(csp.contains("default-src 'self';"));
        assert!(!fragments(&csp).iter().any(|f| f.starts_with("script-src ")));
        assert!(csp.contains("img-src 'self' data:;"));
        assert!(!assembled.static_directives().contains(Directive::ScriptSrc));
        assert!(!assembled.dynamic_directives().contains(Directive::ScriptSrc));
    }

    #[test]
    fn test_default_policy_is_default_src_none_only() {
        // every source-list directive is 'none'; fetch ones collapse into default-src
        let headers = assemble(&Policy::new()).unwrap();
        assert_eq!(
            headers[CONTENT_SECURITY_POLICY],
            "default-src 'none'; base-uri 'none'; form-action 'none'; frame-ancestors 'none';"
        );
        assert!(!headers.contains_key(REPORT_TO));
    }

    #[test]
    fn test_non_fetch_never_filtered() {
        let mut policy = Policy::new();
        policy.csp.default_src = SourceOptions::self_only();
        policy.csp.base_uri = SourceOptions::self_only();
        policy.csp.form_action = SourceOptions::self_only();

        let assembled = PolicyAssembler::new().assemble(&policy).unwrap();
        assert_eq!(assembled.static_directives().get(Directive::BaseUri), Some("'self'"));
        assert_eq!(assembled.static_directives().get(Directive::FormAction), Some("'self'"));
    }

    #[test]
    fn test_nonce_directive_is_dynamic() {
        let mut policy = Policy::new();
        policy.csp.script_src = SourceOptions {
            nonce_value: nonce_source("abc123"),
            strict_dynamic: true,
            ..SourceOptions::self_only()
        };
        policy.csp.form_action = SourceOptions {
            hash_value: "'sha256-xyz'".to_string(),
            ..SourceOptions::self_only()
        };

        let assembled = PolicyAssembler::new().assemble(&policy).unwrap();
        assert!(!assembled.static_directives().contains(Directive::ScriptSrc));
        assert_eq!(
            assembled.dynamic_directives().get(Directive::ScriptSrc),
            Some("'self' 'nonce-abc123' 'strict-dynamic'")
        );
        assert!(assembled.dynamic_directives().contains(Directive::FormAction));
        assert!(!assembled.static_directives().contains(Directive::FormAction));

        // dynamic fragments follow static ones
        let csp = assembled.content_security_policy();
        assert!(csp.ends_with(
            "script-src 'self' 'nonce-abc123' 'strict-dynamic'; form-action 'self' 'sha256-xyz';"
        ));
    }

    #[test]
    fn test_static_directives_without_nonce() {
        let mut policy = Policy::new();
        policy.csp.style_src = SourceOptions::self_only();
        let assembled = PolicyAssembler::new().assemble(&policy).unwrap();
        assert!(assembled.static_directives().contains(Directive::StyleSrc));
        assert!(assembled.dynamic_directives().is_empty());
    }

    #[test]
    fn test_report_to_consistency() {
        let policy = Policy::new().with_report_to("default", r#"{"group":"default"}"#);
        let headers = assemble(&policy).unwrap();
        assert!(headers.contains_key(CONTENT_SECURITY_POLICY));
        assert!(headers.contains_key(REPORT_TO));

        let policy = Policy::new().with_report_to("default", r#"{"group":"other"}"#);
        assert_eq!(
            assemble(&policy),
            Err(AssemblyError::ReportToMismatch {
                group: "default".to_string()
            })
        );

        let policy = Policy::new().with_report_to("default", "");
        assert!(matches!(
            assemble(&policy),
            Err(AssemblyError::ReportToMissing { .. })
        ));
    }

    #[test]
    fn test_payload_without_group_is_passed_through() {
        let mut policy = Policy::new();
        policy.report_to_payload = r#"{"group":"external"}"#.to_string();
        let headers = assemble(&policy).unwrap();
        assert_eq!(headers[REPORT_TO], r#"{"group":"external"}"#);
        assert!(!headers[CONTENT_SECURITY_POLICY].contains("report-to"));
    }

    #[test]
    fn test_invalid_template_fails_before_validation() {
        let policy = Policy::new()
            .with_report_to("default", "")
            .with_templates(TemplateConfig::default().with_text(TemplateKind::SourceOption, "{self"));
        assert!(matches!(
            assemble(&policy),
            Err(AssemblyError::TemplateInvalid {
                kind: TemplateKind::SourceOption,
                ..
            })
        ));
    }

    #[test]
    fn test_custom_template_applies() {
        let mut policy = Policy::new();
        policy.csp.report_uri = UnquotedOptions {
            values: vec!["/a".to_string(), "/b".to_string()],
        };
        policy.templates = TemplateConfig::default().with_text(TemplateKind::UnquotedMulti, "{values} /always");
        let headers = assemble(&policy).unwrap();
        assert!(headers[CONTENT_SECURITY_POLICY].contains("report-uri /a /b /always;"));
    }

    #[test]
    fn test_sandbox_and_upgrade() {
        let mut policy = Policy::new();
        policy.csp.sandbox = SandboxOptions {
            allow_forms: true,
            allow_scripts: true,
            ..SandboxOptions::default()
        };
        policy.csp.upgrade_insecure_requests = true;
        let csp = &assemble(&policy).unwrap()[CONTENT_SECURITY_POLICY];
        assert!(csp.contains("sandbox allow-forms allow-scripts;"));
        assert!(csp.ends_with("upgrade-insecure-requests;"));
        assert!(!csp.contains("upgrade-insecure-requests upgrade-insecure-requests"));
    }

    #[test]
    fn test_empty_sandbox_omitted() {
        let csp = &assemble(&Policy::new()).unwrap()[CONTENT_SECURITY_POLICY];
        assert!(!csp.contains("sandbox"));
        assert!(!csp.contains("upgrade-insecure-requests"));
        assert!(!csp.contains("report-uri"));
    }

    #[test]
    fn test_refresh_swaps_nonce() {
        let mut policy = Policy::new();
        policy.csp.script_src = SourceOptions {
            nonce_value: nonce_source("first"),
            ..SourceOptions::self_only()
        };
        policy.csp.style_src = SourceOptions::self_only();
        let assembled = PolicyAssembler::new().assemble(&policy).unwrap();

        let next = SourceOptions {
            nonce_value: nonce_source("second"),
            ..SourceOptions::self_only()
        };
        let headers = assembled.refresh(&[(Directive::ScriptSrc, next)]).unwrap();
        let csp = &headers[CONTENT_SECURITY_POLICY];
        assert!(csp.contains("script-src 'self' 'nonce-second';"));
        assert!(!csp.contains("first"));
        assert!(csp.contains("style-src 'self';"));

        // the snapshot itself is untouched
        assert!(assembled.content_security_policy().contains("'nonce-first'"));
    }

    #[test]
    fn test_render_dynamic_redundant_hides_directive() {
        let mut policy = Policy::new();
        policy.csp.img_src = SourceOptions::self_only();
        let assembled = PolicyAssembler::new().assemble(&policy).unwrap();

        let fresh = assembled
            .render_dynamic(&[(Directive::ImgSrc, SourceOptions::none())])
            .unwrap();
        assert_eq!(fresh.get(Directive::ImgSrc), Some(""));
        let headers = assembled.merge_dynamic(&fresh);
        assert!(!headers[CONTENT_SECURITY_POLICY].contains("img-src"));
    }

    #[test]
    fn test_render_dynamic_rejects_non_source_directive() {
        let assembled = PolicyAssembler::new().assemble(&Policy::new()).unwrap();
        assert_eq!(
            assembled
                .render_dynamic(&[(Directive::Sandbox, SourceOptions::self_only())])
                .unwrap_err(),
            AssemblyError::NotSourceDirective {
                directive: Directive::Sandbox
            }
        );
    }

    #[test]
    fn test_refresh_rejects_default_src() {
        let assembled = PolicyAssembler::new().assemble(&Policy::new()).unwrap();
        let looser = SourceOptions {
            values: vec!["https:".to_string()],
            nonce_value: nonce_source("x"),
            ..SourceOptions::self_only()
        };
        assert_eq!(
            assembled
                .refresh(&[(Directive::DefaultSrc, looser.clone())])
                .unwrap_err(),
            AssemblyError::DefaultSrcRefresh
        );
        assert_eq!(
            assembled
                .render_dynamic(&[(Directive::ScriptSrc, looser), (Directive::DefaultSrc, SourceOptions::none())])
                .unwrap_err(),
            AssemblyError::DefaultSrcRefresh
        );
        assert!(
            assembled
                .content_security_policy()
                .starts_with("default-src 'none';")
        );
    }

    #[test]
    fn test_error_display() {
        let err = AssemblyError::ReportToMismatch {
            group: "default".to_string(),
        };
        assert!(err.to_string().contains("\"default\""));

        let err = AssemblyError::TemplateInvalid {
            kind: TemplateKind::Sandbox,
            source: TemplateError::Unclosed { position: 3 },
        };
        assert_eq!(err.to_string(), "invalid sandbox template: unclosed placeholder at byte 3");
    }

    fn arb_policy() -> impl Strategy<Value = Policy> {
        (any::<[bool; 6]>(), "[a-z0-9]{0,6}").prop_map(|(flags, nonce)| {
            let mut policy = Policy::new();
            policy.csp.default_src.allow = flags[0];
            policy.csp.default_src.allow_self = flags[1];
            policy.csp.script_src = SourceOptions {
                allow: flags[2],
                allow_self: flags[3],
                nonce_value: if nonce.is_empty() { nonce } else { nonce_source(&nonce) },
                ..SourceOptions::default()
            };
            policy.csp.img_src.allow = flags[4];
            policy.csp.upgrade_insecure_requests = flags[5];
            policy
        })
    }

    proptest::proptest! {
        #[test]
        fn prop_assembly_idempotent(policy in arb_policy()) {
            let first = assemble(&policy).unwrap();
            let second = assemble(&policy).unwrap();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_default_src_always_present(policy in arb_policy()) {
            let assembled = PolicyAssembler::new().assemble(&policy).unwrap();
            prop_assert!(assembled.static_directives().contains(Directive::DefaultSrc));
        }

        #[test]
        fn prop_nonce_never_static(policy in arb_policy()) {
            let assembled = PolicyAssembler::new().assemble(&policy).unwrap();
            if !policy.csp.script_src.nonce_value.is_empty() {
                prop_assert!(!assembled.static_directives().contains(Directive::ScriptSrc));
            }
        }
    }
}
