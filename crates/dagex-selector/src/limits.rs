//! Traversal bounds for interactive browsing.

use serde::{Deserialize, Serialize};

/// Depth and width bounds threaded through selector presets and the
/// resolver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraversalLimits {
    /// Recursion depth for type-checking descents.
    pub max_depth: u64,
    /// Number of directory children classified eagerly.
    pub max_dir_type_checks: usize,
}

impl Default for TraversalLimits {
    fn default() -> Self {
        Self {
            max_depth: 15,
            max_dir_type_checks: 16,
        }
    }
}
