//! Single-recipe refining calculator: profit for a fixed target quantity

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::game_data::{
    MaterialType, Tier, effective_return_rate, focus_cost, requirements_for, returned_units,
};

/// Target-mode refining configuration.
///
/// The available quantities are only used for the feasibility check;
/// nothing is consumed from them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefiningInput {
    pub material_type: MaterialType,
    pub tier: Tier,
    pub target_quantity: u64,
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
    #[serde(default)]
    pub available_raw_materials: u64,
    #[serde(default)]
    pub available_lower_tier_refined: u64,
}

/// Target-mode refining breakdown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefiningResult {
    pub material_type: MaterialType,
    pub tier: Tier,

    // Material requirements
    pub raw_materials_needed: u64,
    pub lower_tier_refined_needed: u64,
    pub total_crafting_attempts: u64,

    // Returns
    pub expected_output: u64,
    pub raw_materials_returned: u64,
    pub lower_tier_refined_returned: u64,
    pub effective_return_rate: f64,

    // Costs
    pub raw_material_cost: f64,
    pub lower_tier_refined_cost: f64,
    pub station_fee: f64,
    pub market_tax: f64,
    pub focus_cost: u64,
    pub total_cost: f64,

    // Revenue and profit
    pub total_revenue: f64,
    pub gross_profit: f64,
    pub net_profit: f64,
    pub profit_per_unit: f64,
    pub profit_per_focus: f64,
    pub profit_margin: f64,
    pub returned_materials_value: f64,

    // Feasibility
    pub can_craft_all: bool,
    pub missing_raw_materials: u64,
    pub missing_lower_tier_refined: u64,
    pub max_possible_crafts: u64,
}

/// Compute the full cost/revenue/profit breakdown for refining a target
/// quantity at one tier.
///
/// Infeasible targets are not an error: the result reports
/// `can_craft_all = false` together with the per-material deficits and
/// the maximum quantity the available materials do cover.
pub fn calculate_refining_profit(input: &RefiningInput) -> RefiningResult {
    let requirements = requirements_for(input.tier);
    let focus_cost_per_craft = focus_cost(input.tier);

    let effective_rate =
        effective_return_rate(input.return_rate, input.mastery_level, input.use_focus);

    let raw_materials_needed = input.target_quantity * requirements.raw;
    let lower_tier_refined_needed = if input.tier > Tier::T2 {
        input.target_quantity * requirements.refined
    } else {
        0
    };

    let raw_materials_returned = returned_units(raw_materials_needed, effective_rate);
    let lower_tier_refined_returned = returned_units(lower_tier_refined_needed, effective_rate);

    // Net consumption is priced in f64 space: with a return rate above
    // 100% the returns exceed the input and the net cost goes negative.
    let net_raw_used = raw_materials_needed as f64 - raw_materials_returned as f64;
    let net_lower_used = lower_tier_refined_needed as f64 - lower_tier_refined_returned as f64;

    let can_craft_all = input.available_raw_materials >= raw_materials_needed
        && input.available_lower_tier_refined >= lower_tier_refined_needed;
    let missing_raw_materials = raw_materials_needed.saturating_sub(input.available_raw_materials);
    let missing_lower_tier_refined =
        lower_tier_refined_needed.saturating_sub(input.available_lower_tier_refined);

    let max_crafts_from_raw = input.available_raw_materials / requirements.raw;
    let max_crafts_from_refined = if input.tier > Tier::T2 {
        input.available_lower_tier_refined / requirements.refined
    } else {
        u64::MAX
    };
    let max_possible_crafts = max_crafts_from_raw.min(max_crafts_from_refined);

    let raw_material_cost = net_raw_used * input.raw_material_price;
    let lower_tier_refined_cost = net_lower_used * input.lower_tier_refined_price;

    let base_station_fee =
        (raw_material_cost + lower_tier_refined_cost) * (input.station_fee_percent / 100.0);
    let station_fee = if input.is_premium { base_station_fee * 0.5 } else { base_station_fee };

    let total_revenue = input.target_quantity as f64 * input.refined_material_price;
    let base_market_tax = total_revenue * (input.market_tax_percent / 100.0);
    let market_tax = if input.is_premium { base_market_tax * 0.5 } else { base_market_tax };

    let focus_cost =
        if input.use_focus { input.target_quantity * focus_cost_per_craft } else { 0 };

    let total_cost = raw_material_cost
        + lower_tier_refined_cost
        + station_fee
        + market_tax
        + focus_cost as f64;

    let gross_profit = total_revenue - raw_material_cost - lower_tier_refined_cost;
    let net_profit = total_revenue - total_cost;
    let profit_per_unit = if input.target_quantity > 0 {
        net_profit / input.target_quantity as f64
    } else {
        0.0
    };
    let profit_per_focus = if input.use_focus && focus_cost > 0 {
        net_profit / (focus_cost as f64 / focus_cost_per_craft as f64)
    } else {
        0.0
    };
    let profit_margin =
        if total_revenue > 0.0 { net_profit / total_revenue * 100.0 } else { 0.0 };
    let returned_materials_value = raw_materials_returned as f64 * input.raw_material_price
        + lower_tier_refined_returned as f64 * input.lower_tier_refined_price;

    RefiningResult {
        material_type: input.material_type,
        tier: input.tier,

        raw_materials_needed,
        lower_tier_refined_needed,
        total_crafting_attempts: input.target_quantity,

        expected_output: input.target_quantity,
        raw_materials_returned,
        lower_tier_refined_returned,
        effective_return_rate: effective_rate,

        raw_material_cost,
        lower_tier_refined_cost,
        station_fee,
        market_tax,
        focus_cost,
        total_cost,

        total_revenue,
        gross_profit,
        net_profit,
        profit_per_unit,
        profit_per_focus,
        profit_margin,
        returned_materials_value,

        can_craft_all,
        missing_raw_materials,
        missing_lower_tier_refined,
        max_possible_crafts,
    }
}

impl fmt::Display for RefiningResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Refining Summary ===")?;
        writeln!(
            f,
            "Target: {} x {} {} (return rate {:.1}%)",
            self.expected_output,
            self.tier,
            self.material_type.refined_name(self.tier),
            self.effective_return_rate
        )?;
        writeln!(f)?;

        writeln!(f, "Materials:")?;
        writeln!(
            f,
            "  Raw needed:       {:>10}  (returned {})",
            self.raw_materials_needed, self.raw_materials_returned
        )?;
        if self.lower_tier_refined_needed > 0 {
            writeln!(
                f,
                "  Lower refined:    {:>10}  (returned {})",
                self.lower_tier_refined_needed, self.lower_tier_refined_returned
            )?;
        }
        writeln!(f)?;

        writeln!(f, "Costs:")?;
        writeln!(f, "  Raw materials:    {:>12.0}", self.raw_material_cost)?;
        writeln!(f, "  Lower refined:    {:>12.0}", self.lower_tier_refined_cost)?;
        writeln!(f, "  Station fee:      {:>12.0}", self.station_fee)?;
        writeln!(f, "  Market tax:       {:>12.0}", self.market_tax)?;
        if self.focus_cost > 0 {
            writeln!(f, "  Focus points:     {:>12}", self.focus_cost)?;
        }
        writeln!(f, "  Total:            {:>12.0}", self.total_cost)?;
        writeln!(f)?;

        writeln!(f, "Profit:")?;
        writeln!(f, "  Revenue:          {:>12.0}", self.total_revenue)?;
        writeln!(f, "  Gross profit:     {:>12.0}", self.gross_profit)?;
        writeln!(f, "  Net profit:       {:>12.0}", self.net_profit)?;
        writeln!(
            f,
            "  Per unit: {:.1}   Margin: {:.1}%",
            self.profit_per_unit, self.profit_margin
        )?;

        if !self.can_craft_all {
            writeln!(f)?;
            writeln!(
                f,
                "Short on materials: {} raw, {} lower-tier refined (max {} crafts)",
                self.missing_raw_materials,
                self.missing_lower_tier_refined,
                self.max_possible_crafts
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_input() -> RefiningInput {
        RefiningInput {
            material_type: MaterialType::Ore,
            tier: Tier::T4,
            target_quantity: 100,
            raw_material_price: 100.0,
            refined_material_price: 300.0,
            lower_tier_refined_price: 200.0,
            return_rate: 15.2,
            mastery_level: 0,
            use_focus: false,
            station_fee_percent: 0.0,
            market_tax_percent: 0.0,
            is_premium: false,
            available_raw_materials: 0,
            available_lower_tier_refined: 0,
        }
    }

    #[test]
    fn tier4_target_100_reference_numbers() {
        let result = calculate_refining_profit(&base_input());

        assert_eq!(result.raw_materials_needed, 200);
        assert_eq!(result.lower_tier_refined_needed, 100);
        assert_eq!(result.raw_materials_returned, 30);
        assert_eq!(result.lower_tier_refined_returned, 15);
        assert_eq!(result.raw_material_cost, 17_000.0);
        assert_eq!(result.lower_tier_refined_cost, 17_000.0);
        assert_eq!(result.total_revenue, 30_000.0);
        assert_eq!(result.net_profit, -4_000.0);
        assert_eq!(result.gross_profit, -4_000.0);
        assert_eq!(result.returned_materials_value, 6_000.0);
    }

    #[test]
    fn zero_target_produces_all_zero_fields() {
        let mut input = base_input();
        input.target_quantity = 0;
        input.use_focus = true;
        let result = calculate_refining_profit(&input);

        assert_eq!(result.raw_materials_needed, 0);
        assert_eq!(result.total_cost, 0.0);
        assert_eq!(result.total_revenue, 0.0);
        assert_eq!(result.net_profit, 0.0);
        assert_eq!(result.profit_per_unit, 0.0);
        assert_eq!(result.profit_margin, 0.0);
        assert_eq!(result.focus_cost, 0);
        assert!(result.can_craft_all);
    }

    #[test]
    fn feasibility_reports_deficits_instead_of_failing() {
        let mut input = base_input();
        input.available_raw_materials = 150;
        input.available_lower_tier_refined = 40;
        let result = calculate_refining_profit(&input);

        assert!(!result.can_craft_all);
        assert_eq!(result.missing_raw_materials, 50);
        assert_eq!(result.missing_lower_tier_refined, 60);
        // 150/2 = 75 from raw, 40/1 = 40 from refined
        assert_eq!(result.max_possible_crafts, 40);
    }

    #[test]
    fn tier2_has_no_lower_tier_bound() {
        let mut input = base_input();
        input.tier = Tier::T2;
        input.available_raw_materials = 100;
        input.available_lower_tier_refined = 0;
        let result = calculate_refining_profit(&input);

        assert_eq!(result.lower_tier_refined_needed, 0);
        assert_eq!(result.lower_tier_refined_returned, 0);
        assert_eq!(result.max_possible_crafts, 50);
    }

    #[test]
    fn premium_halves_station_fee_and_market_tax() {
        let mut input = base_input();
        input.station_fee_percent = 10.0;
        input.market_tax_percent = 4.0;
        let normal = calculate_refining_profit(&input);
        input.is_premium = true;
        let premium = calculate_refining_profit(&input);

        assert!(normal.station_fee > 0.0);
        assert_eq!(premium.station_fee, normal.station_fee / 2.0);
        assert_eq!(premium.market_tax, normal.market_tax / 2.0);
    }

    #[test]
    fn focus_adds_bonus_and_charges_focus_points() {
        let mut input = base_input();
        input.use_focus = true;
        let result = calculate_refining_profit(&input);

        assert_eq!(result.effective_return_rate, 15.2 + 15.3);
        // T4 costs 3 focus per craft
        assert_eq!(result.focus_cost, 300);
        // profit / (focus_cost / per_craft) reduces to profit per craft here
        assert_eq!(result.profit_per_focus, result.net_profit / 100.0);
    }

    #[test]
    fn rate_above_100_goes_to_negative_net_cost() {
        let mut input = base_input();
        input.return_rate = 120.0;
        let result = calculate_refining_profit(&input);

        // 200 raw in, 240 back: the net material cost turns negative.
        assert_eq!(result.raw_materials_returned, 240);
        assert!(result.raw_material_cost < 0.0);
    }
}
