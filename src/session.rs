//! Boundary records shared with the persistence and presentation layers

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::crafting::{CraftingInput, CraftingResult, calculate_equipment_crafting};
use crate::equipment::recipe_by_id;
use crate::error::CalcError;
use crate::multi_tier::{MultiTierInput, MultiTierResult, calculate_multi_tier_refining};
use crate::refining::{RefiningInput, RefiningResult, calculate_refining_profit};
use crate::resources::{ResourceInput, ResourceResult, calculate_resource_refining};

/// Equipment crafting input plus the id of the recipe it refers to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquipmentCalculation {
    pub recipe_id: String,
    #[serde(flatten)]
    pub input: CraftingInput,
}

/// One fully-specified scenario for any of the four calculators.
///
/// A tagged union instead of one record with optional fields: each
/// variant carries exactly the fields its calculator reads, so a saved
/// scenario can never mix, say, equipment prices with a tier range.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CalculationInput {
    Refining(RefiningInput),
    Resources(ResourceInput),
    Equipment(EquipmentCalculation),
    MultiTier(MultiTierInput),
}

/// The matching result for whichever calculator ran
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CalculationResult {
    Refining(RefiningResult),
    Resources(ResourceResult),
    Equipment(CraftingResult),
    MultiTier(MultiTierResult),
}

impl CalculationResult {
    /// Headline profit figure for session summaries
    pub fn net_profit(&self) -> f64 {
        match self {
            CalculationResult::Refining(r) => r.net_profit,
            CalculationResult::Resources(r) => r.net_profit,
            CalculationResult::Equipment(r) => r.net_profit,
            CalculationResult::MultiTier(r) => r.net_profit,
        }
    }

    /// Headline per-unit profit figure for session summaries
    pub fn profit_per_unit(&self) -> f64 {
        match self {
            CalculationResult::Refining(r) => r.profit_per_unit,
            CalculationResult::Resources(r) => {
                if r.refinements_made > 0 {
                    r.net_profit / r.refinements_made as f64
                } else {
                    0.0
                }
            }
            CalculationResult::Equipment(r) => r.profit_per_unit,
            CalculationResult::MultiTier(r) => r.profit_per_unit,
        }
    }
}

impl fmt::Display for CalculationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalculationResult::Refining(r) => r.fmt(f),
            CalculationResult::Resources(r) => r.fmt(f),
            CalculationResult::Equipment(r) => r.fmt(f),
            CalculationResult::MultiTier(r) => r.fmt(f),
        }
    }
}

/// Run whichever calculator the input selects.
///
/// The equipment variant resolves its recipe id here, so the calculator
/// itself never fails; the multi-tier variant can reject its tier range.
pub fn calculate(input: &CalculationInput) -> Result<CalculationResult, CalcError> {
    match input {
        CalculationInput::Refining(input) => {
            Ok(CalculationResult::Refining(calculate_refining_profit(input)))
        }
        CalculationInput::Resources(input) => {
            Ok(CalculationResult::Resources(calculate_resource_refining(input)))
        }
        CalculationInput::Equipment(calc) => {
            let recipe = recipe_by_id(&calc.recipe_id)
                .ok_or_else(|| CalcError::UnknownRecipe(calc.recipe_id.clone()))?;
            Ok(CalculationResult::Equipment(calculate_equipment_crafting(recipe, &calc.input)))
        }
        CalculationInput::MultiTier(input) => {
            Ok(CalculationResult::MultiTier(calculate_multi_tier_refining(input)?))
        }
    }
}

/// Named snapshot exchanged with the persistence collaborator.
///
/// The engine never stores or looks these up; the surrogate id and
/// timestamps arrive already assigned by whoever persists them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(flatten)]
    pub input: CalculationInput,
    pub net_profit: f64,
    pub profit_per_unit: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Session {
    /// Pair a scenario with its headline numbers, leaving identity to
    /// the persistence side
    pub fn new(name: impl Into<String>, input: CalculationInput, result: &CalculationResult) -> Self {
        Session {
            id: None,
            name: name.into(),
            input,
            net_profit: result.net_profit(),
            profit_per_unit: result.profit_per_unit(),
            created_at: None,
            updated_at: None,
        }
    }
}
