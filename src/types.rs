//! Common types used throughout page-fanout
//!
//! Shared type aliases used across multiple modules.

use std::collections::{BTreeMap, HashMap};

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// Generic key-value map with string keys and values
pub type StringMap = HashMap<String, String>;

/// Query parameters, kept ordered so requests render deterministically
pub type ParamMap = BTreeMap<String, String>;

// ============================================================================
// Retrieval Mode
// ============================================================================

/// How a window of items is fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalMode {
    /// One page at a time, following `nextPageToken`
    Sequential,
    /// All pages at once from precomputed tokens
    Concurrent,
    /// First page alone to learn the total, then the rest at once
    #[default]
    ConcurrentWithDiscovery,
}

impl std::fmt::Display for RetrievalMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Sequential => "sequential",
            Self::Concurrent => "concurrent",
            Self::ConcurrentWithDiscovery => "concurrent_with_discovery",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retrieval_mode_serde() {
        let mode: RetrievalMode = serde_yaml::from_str("concurrent").unwrap();
        assert_eq!(mode, RetrievalMode::Concurrent);
        assert_eq!(RetrievalMode::default().to_string(), "concurrent_with_discovery");
    }
}
