//! Equipment crafting calculator: profit for producing discrete items
//! from a bill of materials

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::equipment::EquipmentRecipe;
use crate::game_data::{FOCUS_CRAFTING_RATE, MaterialType, Tier, returned_units};

/// Equipment crafting configuration. The recipe itself is passed
/// alongside, already resolved by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CraftingInput {
    pub tier: Tier,
    pub quantity: u64,
    /// Price per refined material, one entry per material the bill uses
    pub material_prices: BTreeMap<MaterialType, f64>,
    /// Selling price of one crafted unit
    pub sell_price: f64,
    pub return_rate: f64,
    #[serde(default)]
    pub use_focus: bool,
    #[serde(default)]
    pub station_fee_percent: f64,
    #[serde(default)]
    pub market_tax_percent: f64,
    #[serde(default)]
    pub is_premium: bool,
}

/// Per-material consumption row for one crafting run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialRequirement {
    pub material_type: MaterialType,
    pub material_name: String,
    pub refined_name: String,
    /// Total refined units needed before returns
    pub amount: u64,
    /// Gross cost of `amount` at the material price
    pub cost: f64,
    pub returned: u64,
    /// Net units consumed; negative when the return rate exceeds 100%
    pub net_used: i64,
    pub net_cost: f64,
}

/// Equipment crafting breakdown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CraftingResult {
    pub equipment_id: String,
    pub equipment_name: String,
    pub equipment_tier: Tier,
    pub quantity_crafted: u64,

    pub material_requirements: Vec<MaterialRequirement>,
    pub total_material_cost: f64,
    pub total_net_material_cost: f64,
    pub returned_materials_value: f64,

    pub effective_return_rate: f64,

    pub station_fee: f64,
    pub market_tax: f64,
    pub focus_cost: u64,
    pub total_cost: f64,

    pub total_revenue: f64,
    pub gross_profit: f64,
    pub net_profit: f64,
    pub profit_per_unit: f64,
    pub profit_margin: f64,
    pub profit_per_focus: f64,

    pub is_profitable: bool,
}

/// Compute the profit breakdown for crafting `input.quantity` units of a
/// recipe.
///
/// Focus here replaces the return rate with a flat
/// [`FOCUS_CRAFTING_RATE`] instead of adding a bonus on top of it; the
/// two composition rules evolved separately in the game and both are
/// kept as-is.
pub fn calculate_equipment_crafting(
    recipe: &EquipmentRecipe,
    input: &CraftingInput,
) -> CraftingResult {
    let effective_rate = if input.use_focus { FOCUS_CRAFTING_RATE } else { input.return_rate };

    let mut material_requirements = Vec::with_capacity(recipe.materials.len());
    let mut total_material_cost = 0.0;
    let mut total_net_material_cost = 0.0;
    let mut returned_materials_value = 0.0;

    for &(material_type, per_unit_amount) in recipe.materials {
        let amount = per_unit_amount * input.quantity;
        let price = input.material_prices.get(&material_type).copied().unwrap_or(0.0);
        let cost = amount as f64 * price;

        let returned = returned_units(amount, effective_rate);
        let net_used = amount as i64 - returned as i64;
        let net_cost = net_used as f64 * price;
        let returned_value = returned as f64 * price;

        material_requirements.push(MaterialRequirement {
            material_type,
            material_name: material_type.raw_name(input.tier).to_string(),
            refined_name: material_type.refined_name(input.tier).to_string(),
            amount,
            cost,
            returned,
            net_used,
            net_cost,
        });

        total_material_cost += cost;
        total_net_material_cost += net_cost;
        returned_materials_value += returned_value;
    }

    let base_station_fee = total_material_cost * (input.station_fee_percent / 100.0);
    let station_fee = if input.is_premium { base_station_fee * 0.5 } else { base_station_fee };

    let total_revenue = input.quantity as f64 * input.sell_price;
    let base_market_tax = total_revenue * (input.market_tax_percent / 100.0);
    let market_tax = if input.is_premium { base_market_tax * 0.5 } else { base_market_tax };

    let focus_cost_per_unit = recipe.focus_cost_per_unit();
    let focus_cost = if input.use_focus { input.quantity * focus_cost_per_unit } else { 0 };

    // Focus points are reported but not charged against the sale.
    let total_cost = total_net_material_cost + station_fee + market_tax;

    let gross_profit = total_revenue - total_material_cost;
    let net_profit = total_revenue - total_cost;
    let profit_per_unit =
        if input.quantity > 0 { net_profit / input.quantity as f64 } else { 0.0 };
    let profit_margin =
        if total_revenue > 0.0 { net_profit / total_revenue * 100.0 } else { 0.0 };
    let profit_per_focus = if input.use_focus && focus_cost > 0 {
        net_profit / (focus_cost as f64 / focus_cost_per_unit as f64)
    } else {
        0.0
    };

    CraftingResult {
        equipment_id: recipe.id.to_string(),
        equipment_name: recipe.name.to_string(),
        equipment_tier: input.tier,
        quantity_crafted: input.quantity,

        material_requirements,
        total_material_cost,
        total_net_material_cost,
        returned_materials_value,

        effective_return_rate: effective_rate,

        station_fee,
        market_tax,
        focus_cost,
        total_cost,

        total_revenue,
        gross_profit,
        net_profit,
        profit_per_unit,
        profit_margin,
        profit_per_focus,

        is_profitable: net_profit > 0.0,
    }
}

impl fmt::Display for CraftingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Crafting Summary ===")?;
        writeln!(
            f,
            "Item: {} x {} {} (return rate {:.1}%)",
            self.quantity_crafted, self.equipment_tier, self.equipment_name,
            self.effective_return_rate
        )?;
        writeln!(f)?;

        writeln!(f, "Materials:")?;
        for req in &self.material_requirements {
            writeln!(
                f,
                "  {:<22} {:>6} needed, {:>5} returned, net cost {:>10.0}",
                req.refined_name, req.amount, req.returned, req.net_cost
            )?;
        }
        writeln!(f)?;

        writeln!(f, "Costs:")?;
        writeln!(f, "  Materials (net):  {:>12.0}", self.total_net_material_cost)?;
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
            "  Per unit: {:.1}   Margin: {:.1}%   {}",
            self.profit_per_unit,
            self.profit_margin,
            if self.is_profitable { "PROFITABLE" } else { "not profitable" }
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equipment::recipe_by_id;

    fn base_input() -> CraftingInput {
        CraftingInput {
            tier: Tier::T4,
            quantity: 10,
            material_prices: BTreeMap::from([(MaterialType::Fiber, 200.0)]),
            sell_price: 1000.0,
            return_rate: 15.2,
            use_focus: false,
            station_fee_percent: 0.0,
            market_tax_percent: 0.0,
            is_premium: false,
        }
    }

    #[test]
    fn cloth_hood_reference_numbers() {
        // 8 fiber per unit, 10 units, fiber at 200, selling at 1000.
        let recipe = recipe_by_id("cloth_hood").unwrap();
        let result = calculate_equipment_crafting(recipe, &base_input());

        let fiber = &result.material_requirements[0];
        assert_eq!(fiber.amount, 80);
        assert_eq!(fiber.returned, 12);
        assert_eq!(fiber.net_used, 68);
        assert_eq!(result.total_material_cost, 16_000.0);
        assert_eq!(result.total_net_material_cost, 13_600.0);
        assert_eq!(result.total_revenue, 10_000.0);
        assert_eq!(result.gross_profit, -6_000.0);
        assert_eq!(result.net_profit, -3_600.0);
        assert!(!result.is_profitable);
    }

    #[test]
    fn focus_replaces_the_rate_instead_of_adding() {
        let recipe = recipe_by_id("cloth_hood").unwrap();
        let mut input = base_input();
        input.use_focus = true;
        input.return_rate = 36.7; // ignored under focus
        let result = calculate_equipment_crafting(recipe, &input);

        assert_eq!(result.effective_return_rate, 53.9);
        assert_eq!(result.focus_cost, 30);
        assert_eq!(result.material_requirements[0].returned, 43); // floor(80 * 0.539)
    }

    #[test]
    fn multi_material_bill_sums_across_rows() {
        let recipe = recipe_by_id("bow").unwrap();
        let mut input = base_input();
        input.material_prices =
            BTreeMap::from([(MaterialType::Hide, 250.0), (MaterialType::Wood, 100.0)]);
        input.quantity = 1;
        let result = calculate_equipment_crafting(recipe, &input);

        assert_eq!(result.material_requirements.len(), 2);
        // 16 hide + 8 wood, no returns survive the floor at quantity 1:
        // floor(16 * 0.152) = 2, floor(8 * 0.152) = 1
        assert_eq!(result.total_material_cost, 16.0 * 250.0 + 8.0 * 100.0);
        assert_eq!(result.total_net_material_cost, 14.0 * 250.0 + 7.0 * 100.0);
    }

    #[test]
    fn missing_price_is_treated_as_zero() {
        let recipe = recipe_by_id("bow").unwrap();
        let mut input = base_input();
        input.material_prices = BTreeMap::from([(MaterialType::Hide, 250.0)]);
        let result = calculate_equipment_crafting(recipe, &input);

        let wood = result
            .material_requirements
            .iter()
            .find(|r| r.material_type == MaterialType::Wood)
            .unwrap();
        assert_eq!(wood.cost, 0.0);
        assert_eq!(wood.net_cost, 0.0);
    }

    #[test]
    fn profit_sign_matches_flag() {
        let recipe = recipe_by_id("cloth_hood").unwrap();
        let mut input = base_input();
        input.sell_price = 5000.0;
        let profitable = calculate_equipment_crafting(recipe, &input);
        assert!(profitable.is_profitable);
        assert!(profitable.net_profit > 0.0);

        input.sell_price = 100.0;
        let losing = calculate_equipment_crafting(recipe, &input);
        assert!(!losing.is_profitable);
        assert!(losing.net_profit <= 0.0);
    }

    #[test]
    fn premium_halves_both_fees() {
        let recipe = recipe_by_id("cloth_hood").unwrap();
        let mut input = base_input();
        input.station_fee_percent = 10.0;
        input.market_tax_percent = 4.0;
        let normal = calculate_equipment_crafting(recipe, &input);
        input.is_premium = true;
        let premium = calculate_equipment_crafting(recipe, &input);

        assert_eq!(premium.station_fee, normal.station_fee / 2.0);
        assert_eq!(premium.market_tax, normal.market_tax / 2.0);
    }
}
