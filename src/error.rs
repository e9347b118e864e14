//! Error types for the calculation engine

use thiserror::Error;

/// Failures raised at the engine boundary.
///
/// Infeasible quantities are never errors: the refining calculators
/// report them as data (`can_craft_all`, deficits, zero-output steps) so
/// a "what if I don't have enough" scenario still yields a usable
/// estimate. Only the multi-tier calculator can fail mid-calculation,
/// and only on an invalid tier range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalcError {
    #[error("tier must be between 2 and 8, got {0}")]
    InvalidTier(u8),

    #[error("start tier T{start} must be lower than end tier T{end}")]
    InvalidTierRange { start: u8, end: u8 },

    #[error("unknown equipment recipe '{0}'")]
    UnknownRecipe(String),

    #[error("unknown material type '{0}' (expected ore, hide, fiber, wood or stone)")]
    UnknownMaterial(String),
}
