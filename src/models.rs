//! Generation model descriptors
//!
//! The set of models the remote service exposes is fixed and known at build
//! time; the table is loaded once and shared read-only across all requests.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Identifier of the single model whose output may be a vector graphic.
pub const VECTOR_MODEL_ID: &str = "8000";

/// Static metadata for one generation model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelDescriptor {
    /// Remote model identifier (numeric string on the wire)
    pub id: &'static str,
    /// Human-readable name used in tool responses
    pub display_name: &'static str,
    /// Whether the model can emit vector output
    pub vector_capable: bool,
}

const MODELS: &[ModelDescriptor] = &[
    ModelDescriptor {
        id: "5000",
        display_name: "FLUX1.1",
        vector_capable: false,
    },
    ModelDescriptor {
        id: "6000",
        display_name: "SD3.5",
        vector_capable: false,
    },
    ModelDescriptor {
        id: "7000",
        display_name: "Recraft-Real",
        vector_capable: false,
    },
    ModelDescriptor {
        id: "8000",
        display_name: "Recraft-Vector",
        vector_capable: true,
    },
    ModelDescriptor {
        id: "9000",
        display_name: "FLUX1.1-ultra",
        vector_capable: false,
    },
];

/// Lookup table keyed by model id (loaded once)
static MODEL_TABLE: Lazy<HashMap<&'static str, &'static ModelDescriptor>> =
    Lazy::new(|| MODELS.iter().map(|m| (m.id, m)).collect());

/// Look up a model by its bare identifier.
pub fn lookup(id: &str) -> Option<&'static ModelDescriptor> {
    MODEL_TABLE.get(id).copied()
}

/// All known models, in id order.
pub fn all() -> &'static [ModelDescriptor] {
    MODELS
}
