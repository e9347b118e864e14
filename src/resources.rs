//! Resource-exhaustion refining: convert owned materials until nothing
//! more can be refined

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::game_data::{
    MaterialType, Tier, effective_return_rate, focus_cost, requirements_for, returned_units,
};

/// Hard cap on refining passes. Convergence normally takes a handful of
/// iterations because each pass's output shrinks, but a return rate at
/// or above 100% keeps the pools from draining and this cap is the only
/// thing that bounds the loop.
pub const MAX_ITERATIONS: u32 = 1000;

/// Owned-resources refining configuration. There is no target quantity;
/// the engine refines as much as the pools allow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceInput {
    pub material_type: MaterialType,
    pub tier: Tier,
    pub owned_raw_materials: u64,
    #[serde(default)]
    pub owned_lower_tier_refined: u64,
    pub raw_material_price: f64,
    pub refined_material_price: f64,
    #[serde(default)]
    pub lower_tier_refined_price: f64,
    pub return_rate: f64,
    #[serde(default)]
    pub mastery_level: u32,
    #[serde(default)]
    pub use_focus: bool,
    #[serde(default)]
    pub station_fee_percent: f64,
    #[serde(default)]
    pub market_tax_percent: f64,
    #[serde(default)]
    pub is_premium: bool,
}

/// What is left (and newly produced) once the loop stops
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalInventory {
    pub raw_materials: u64,
    pub lower_tier_refined: u64,
    pub refined_materials: u64,
}

/// Owned-resources refining breakdown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceResult {
    pub material_type: MaterialType,
    pub tier: Tier,

    // Production
    pub refinements_made: u64,
    pub iterations: u32,

    // Consumption and returns, totalled across all passes
    pub raw_materials_used: u64,
    pub lower_tier_refined_used: u64,
    pub raw_materials_returned: u64,
    pub lower_tier_refined_returned: u64,

    pub final_inventory: FinalInventory,

    // Valuation: cost basis is the entire owned pool (what the materials
    // were worth going in), not the net spend
    pub total_value_produced: f64,
    pub material_costs: f64,
    pub station_fee: f64,
    pub net_profit: f64,

    pub focus_used: u64,
    pub effective_return_rate: f64,
}

/// Refine owned materials to exhaustion.
///
/// Each pass converts the maximum number of whole units the current
/// pools allow, then feeds the floored returns back into the pools;
/// because returns are floored per pass, a later pass can unlock
/// conversions the previous one could not. The loop ends when a pass
/// can craft nothing, or at [`MAX_ITERATIONS`].
pub fn calculate_resource_refining(input: &ResourceInput) -> ResourceResult {
    let requirements = requirements_for(input.tier);
    let effective_rate =
        effective_return_rate(input.return_rate, input.mastery_level, input.use_focus);

    let mut raw_pool = input.owned_raw_materials;
    let mut refined_pool = input.owned_lower_tier_refined;

    let mut refinements_made: u64 = 0;
    let mut raw_materials_used: u64 = 0;
    let mut lower_tier_refined_used: u64 = 0;
    let mut raw_materials_returned: u64 = 0;
    let mut lower_tier_refined_returned: u64 = 0;
    let mut iterations: u32 = 0;

    while iterations < MAX_ITERATIONS {
        let crafts_from_raw = raw_pool / requirements.raw;
        let craftable = if input.tier > Tier::T2 {
            crafts_from_raw.min(refined_pool / requirements.refined)
        } else {
            crafts_from_raw
        };
        if craftable == 0 {
            break;
        }

        let consumed_raw = craftable * requirements.raw;
        let consumed_refined = if input.tier > Tier::T2 {
            craftable * requirements.refined
        } else {
            0
        };
        let returned_raw = returned_units(consumed_raw, effective_rate);
        let returned_refined = returned_units(consumed_refined, effective_rate);

        // Saturating arithmetic keeps a >100% rate (growing pools) inside
        // u64 until the iteration cap stops the loop.
        raw_pool = (raw_pool - consumed_raw).saturating_add(returned_raw);
        refined_pool = (refined_pool - consumed_refined).saturating_add(returned_refined);

        refinements_made = refinements_made.saturating_add(craftable);
        raw_materials_used = raw_materials_used.saturating_add(consumed_raw);
        lower_tier_refined_used = lower_tier_refined_used.saturating_add(consumed_refined);
        raw_materials_returned = raw_materials_returned.saturating_add(returned_raw);
        lower_tier_refined_returned =
            lower_tier_refined_returned.saturating_add(returned_refined);
        iterations += 1;
    }

    // Opportunity-cost framing: the whole owned stock is the cost basis,
    // however much of it the loop actually consumed.
    let material_costs = input.owned_raw_materials as f64 * input.raw_material_price
        + input.owned_lower_tier_refined as f64 * input.lower_tier_refined_price;

    let net_raw_used = raw_materials_used as f64 - raw_materials_returned as f64;
    let net_refined_used =
        lower_tier_refined_used as f64 - lower_tier_refined_returned as f64;
    let base_station_fee = (net_raw_used * input.raw_material_price
        + net_refined_used * input.lower_tier_refined_price)
        * (input.station_fee_percent / 100.0);
    let station_fee = if input.is_premium { base_station_fee * 0.5 } else { base_station_fee };

    let total_value_produced = raw_pool as f64 * input.raw_material_price
        + refined_pool as f64 * input.lower_tier_refined_price
        + refinements_made as f64 * input.refined_material_price;

    let net_profit = total_value_produced - material_costs - station_fee;

    let focus_used =
        if input.use_focus { refinements_made.saturating_mul(focus_cost(input.tier)) } else { 0 };

    ResourceResult {
        material_type: input.material_type,
        tier: input.tier,

        refinements_made,
        iterations,

        raw_materials_used,
        lower_tier_refined_used,
        raw_materials_returned,
        lower_tier_refined_returned,

        final_inventory: FinalInventory {
            raw_materials: raw_pool,
            lower_tier_refined: refined_pool,
            refined_materials: refinements_made,
        },

        total_value_produced,
        material_costs,
        station_fee,
        net_profit,

        focus_used,
        effective_return_rate: effective_rate,
    }
}

impl fmt::Display for ResourceResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Resource Refining Summary ===")?;
        writeln!(
            f,
            "Refined: {} x {} {} in {} passes (return rate {:.1}%)",
            self.refinements_made,
            self.tier,
            self.material_type.refined_name(self.tier),
            self.iterations,
            self.effective_return_rate
        )?;
        writeln!(f)?;

        writeln!(f, "Materials:")?;
        writeln!(
            f,
            "  Raw used:         {:>10}  (returned {})",
            self.raw_materials_used, self.raw_materials_returned
        )?;
        if self.lower_tier_refined_used > 0 {
            writeln!(
                f,
                "  Lower refined:    {:>10}  (returned {})",
                self.lower_tier_refined_used, self.lower_tier_refined_returned
            )?;
        }
        writeln!(
            f,
            "  Leftover: {} raw, {} lower-tier refined",
            self.final_inventory.raw_materials, self.final_inventory.lower_tier_refined
        )?;
        if self.focus_used > 0 {
            writeln!(f, "  Focus used:       {:>10}", self.focus_used)?;
        }
        writeln!(f)?;

        writeln!(f, "Valuation:")?;
        writeln!(f, "  Inventory value:  {:>12.0}", self.total_value_produced)?;
        writeln!(f, "  Material cost:    {:>12.0}", self.material_costs)?;
        writeln!(f, "  Station fee:      {:>12.0}", self.station_fee)?;
        writeln!(f, "  Net profit:       {:>12.0}", self.net_profit)?;

        Ok(())
    }
}
