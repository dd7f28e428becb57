//! Cross-field validation between the `report-to` directive and the
//! `Report-To` header payload.

use crate::assembler::AssemblyError;
use crate::policy::Policy;
use tracing::warn;

/// Policy validator, run before any directive is rendered
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator;

impl Validator {
    /// Create a new validator
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Validate a policy
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError::ReportToMissing`] or [`AssemblyError::ReportToMismatch`]
    pub fn validate(&self, policy: &Policy) -> Result<(), AssemblyError> {
        validate_report_to(&policy.csp.report_to.value, &policy.report_to_payload)
    }
}

/// Check that a `report-to` group name is backed by a payload naming it.
///
/// The payload is matched textually, not parsed.
///
/// # Errors
///
/// Returns error if the group is set and the payload is empty or does not contain it
pub fn validate_report_to(group: &str, payload: &str) -> Result<(), AssemblyError> {
    if group.is_empty() {
        return Ok(());
    }

    if payload.is_empty() {
        warn!(group, "report-to group set without a Report-To payload");
        return Err(AssemblyError::ReportToMissing {
            group: group.to_string(),
        });
    }

    if !payload.contains(group) {
        warn!(group, "Report-To payload does not reference report-to group");
        return Err(AssemblyError::ReportToMismatch {
            group: group.to_string(),
        });
    }

    Ok(())
}
