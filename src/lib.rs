//! Profit calculation engine for Albion Online refining and crafting.
//!
//! Four deterministic calculators cover the production loop: target-mode
//! refining, owned-resources refining to exhaustion, equipment crafting
//! from a bill of materials, and chained refining across a tier range.
//! Every calculator is a pure function from an input record to a result
//! record; prices, owned quantities and fee settings always arrive as
//! explicit fields, never ambient state.

pub mod crafting;
pub mod equipment;
pub mod error;
pub mod game_data;
pub mod multi_tier;
pub mod refining;
pub mod resources;
pub mod session;

pub use error::CalcError;
