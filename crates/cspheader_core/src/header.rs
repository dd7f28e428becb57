//! HTTP header names emitted by policy assembly.

/// Header carrying the flattened policy
pub const CONTENT_SECURITY_POLICY: &str = "Content-Security-Policy";

/// Header carrying the reporting endpoint descriptor referenced by `report-to`
pub const REPORT_TO: &str = "Report-To";
