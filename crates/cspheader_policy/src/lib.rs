//! cspheader Policy Engine
//!
//! Compiles declarative per-directive options into `Content-Security-Policy`
//! and `Report-To` header values. Directives carrying nonces or hashes are
//! kept apart from the static remainder so they can be regenerated per
//! response without re-assembling the whole policy.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod assembler;
pub mod directive_map;
pub mod filter;
pub mod options;
pub mod partition;
pub mod policy;
pub mod preset;
pub mod renderer;
pub mod template;
pub mod validate;

pub use assembler::{assemble, AssembledPolicy, AssemblyError, HeaderMap, PolicyAssembler};
pub use directive_map::DirectiveMap;
pub use options::{
    FrameAncestorOptions, SandboxOptions, SourceOptions, UnquotedOption, UnquotedOptions,
};
pub use partition::Partition;
pub use policy::{CspDirectives, Policy};
pub use preset::Preset;
pub use renderer::{hash_source, nonce_source, OptionValue, RenderError, Renderer};
pub use template::{Template, TemplateConfig, TemplateError, TemplateKind, TemplateSet};
pub use validate::Validator;

pub use cspheader_core::Directive;
