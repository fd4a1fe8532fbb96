//! Knobs for one unit analysis.

use serde::{Deserialize, Serialize};

/// How far callable references are resolved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallableReferenceMode {
    /// Only the shape (reflective type) of the reference is computed; an
    /// ambiguous reference yields a placeholder type.
    Shape,
    /// The reference is resolved to a single target and bound.
    #[default]
    Resolve,
}

impl CallableReferenceMode {
    pub const fn label(self) -> &'static str {
        match self {
            CallableReferenceMode::Shape => "shape",
            CallableReferenceMode::Resolve => "resolve",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckerOptions {
    pub check_constructors: bool,
    pub check_callable_references: bool,
    pub callable_reference_mode: CallableReferenceMode,
    /// 0 = unlimited.
    pub max_diagnostics_per_unit: usize,
}

impl Default for CheckerOptions {
    fn default() -> Self {
        Self {
            check_constructors: true,
            check_callable_references: true,
            callable_reference_mode: CallableReferenceMode::Resolve,
            max_diagnostics_per_unit: 0,
        }
    }
}
