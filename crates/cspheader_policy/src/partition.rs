//! Static/dynamic partitioning of source-list directives.

use crate::options::SourceOptions;
use serde::{Deserialize, Serialize};

/// Which half of an assembled policy a directive belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Partition {
    /// Stable across responses; safe to cache
    Static,
    /// Carries a nonce or hash; regenerated per response
    Dynamic,
}

/// Classify source options by whether they carry a nonce or hash
#[must_use]
pub fn classify(options: &SourceOptions) -> Partition {
    if !options.nonce_value.is_empty() || !options.hash_value.is_empty() {
        Partition::Dynamic
    } else {
        Partition::Static
    }
}
