//! Demand line models.

use serde::{Deserialize, Serialize};

/// One row of a purchase request: a free-text medicine name plus desired quantity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DemandLine {
    /// Opaque identifier, stable while the line is being edited
    pub id: String,
    /// Free-text medicine name as typed (original casing preserved)
    pub name: String,
    /// Requested quantity, carried through unchanged
    pub quantity: u32,
}

impl DemandLine {
    /// Create a new demand line with a fresh identifier.
    pub fn new(name: impl Into<String>, quantity: u32) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            quantity,
        }
    }

    /// Create a demand line with a caller-supplied identifier.
    pub fn with_id(id: impl Into<String>, name: impl Into<String>, quantity: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            quantity,
        }
    }

    /// The trimmed query text used for display.
    pub fn query(&self) -> &str {
        self.name.trim()
    }

    /// Lower-cased query used for comparisons.
    pub fn normalized_query(&self) -> String {
        self.query().to_lowercase()
    }

    /// True when the name is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.query().is_empty()
    }
}
