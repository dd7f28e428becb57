//! cspheader Core Types
//!
//! This crate contains the directive vocabulary shared by the policy engine
//! and its front ends. Pure types, no I/O.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod directive;
pub mod error;
pub mod header;

// Re-exports
pub use directive::{Directive, DirectiveCategory};
pub use error::{CoreError, CoreResult};
pub use header::{CONTENT_SECURITY_POLICY, REPORT_TO};
