//! # Classifier Configuration
//!
//! Switches for the taxonomy builder, passed explicitly to each session

use crate::TaxonomyError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Taxonomy builder configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Also test `¬C` for satisfiability, detecting concepts equivalent to ⊤
    pub double_check_satisfiability: bool,

    /// Build the definition order from told subsumers and use it to seed marks
    pub use_told_subsumers: bool,

    /// Seed negative marks from told disjointness
    pub use_told_disjoints: bool,

    /// Turn `C ⊑ A ⊔ B` into told subsumers via the least common ancestors of the disjuncts
    pub resolve_union_subsumers: bool,

    /// Seed realization with the syntactically obvious types of each individual
    pub realize_with_obvious_types: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            double_check_satisfiability: true,
            use_told_subsumers: true,
            use_told_disjoints: true,
            resolve_union_subsumers: true,
            realize_with_obvious_types: true,
        }
    }
}

impl ClassifierConfig {
    /// Every optimisation off: the oracle decides everything
    pub fn naive() -> Self {
        Self {
            double_check_satisfiability: true,
            use_told_subsumers: false,
            use_told_disjoints: false,
            resolve_union_subsumers: false,
            realize_with_obvious_types: false,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, TaxonomyError> {
        serde_json::from_str(json).map_err(|e| TaxonomyError::Config(e.to_string()))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, TaxonomyError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| TaxonomyError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&content)
    }
}
