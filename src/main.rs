//! Albion Refining Calculator
//!
//! Profit estimation for refining, crafting and multi-tier production
//! chains in Albion Online.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use albion_calculator::crafting::{CraftingInput, calculate_equipment_crafting};
use albion_calculator::equipment::{ALL_RECIPES, recipe_by_id};
use albion_calculator::game_data::{CITY_BONUSES, MaterialType, Tier, base_return_rate};
use albion_calculator::multi_tier::{
    MultiTierInput, calculate_multi_tier_refining, tier_ranges,
};
use albion_calculator::refining::{RefiningInput, calculate_refining_profit};
use albion_calculator::resources::{ResourceInput, calculate_resource_refining};
use albion_calculator::session::{CalculationInput, calculate};

#[derive(Parser)]
#[command(name = "albion-calculator")]
#[command(about = "Refining and crafting profit calculator for Albion Online")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Refining profit for a target output quantity
    Refine {
        /// Raw resource family (ore, hide, fiber, wood, stone)
        material: String,

        /// Material tier, 2-8
        tier: u8,

        /// Refined units to produce
        #[arg(short, long, default_value_t = 100)]
        quantity: u64,

        /// Price per raw material
        #[arg(long)]
        raw_price: f64,

        /// Sale price per refined unit
        #[arg(long)]
        refined_price: f64,

        /// Price per lower-tier refined unit
        #[arg(long, default_value_t = 0.0)]
        lower_price: f64,

        /// Base return rate override; resolved from the city flags when absent
        #[arg(long)]
        return_rate: Option<f64>,

        /// Refining in the material's bonus city
        #[arg(long)]
        bonus_city: bool,

        /// Refining day bonus (bonus city only)
        #[arg(long)]
        refining_day: bool,

        /// Mastery level
        #[arg(long, default_value_t = 0)]
        mastery: u32,

        /// Spend focus for a higher return rate
        #[arg(long)]
        focus: bool,

        /// Station fee percent on net material cost
        #[arg(long, default_value_t = 0.0)]
        station_fee: f64,

        /// Market tax percent on the sale
        #[arg(long, default_value_t = 0.0)]
        market_tax: f64,

        /// Premium account (halves station fee and market tax)
        #[arg(long)]
        premium: bool,

        /// Raw materials on hand, for the feasibility check
        #[arg(long, default_value_t = 0)]
        available_raw: u64,

        /// Lower-tier refined materials on hand
        #[arg(long, default_value_t = 0)]
        available_lower: u64,
    },

    /// Refine owned materials to exhaustion instead of hitting a target
    Exhaust {
        /// Raw resource family (ore, hide, fiber, wood, stone)
        material: String,

        /// Material tier, 2-8
        tier: u8,

        /// Raw materials owned
        #[arg(long)]
        owned_raw: u64,

        /// Lower-tier refined materials owned
        #[arg(long, default_value_t = 0)]
        owned_lower: u64,

        /// Price per raw material
        #[arg(long)]
        raw_price: f64,

        /// Sale price per refined unit
        #[arg(long)]
        refined_price: f64,

        /// Price per lower-tier refined unit
        #[arg(long, default_value_t = 0.0)]
        lower_price: f64,

        /// Base return rate override; resolved from the city flags when absent
        #[arg(long)]
        return_rate: Option<f64>,

        #[arg(long)]
        bonus_city: bool,

        #[arg(long)]
        refining_day: bool,

        #[arg(long, default_value_t = 0)]
        mastery: u32,

        #[arg(long)]
        focus: bool,

        #[arg(long, default_value_t = 0.0)]
        station_fee: f64,

        #[arg(long, default_value_t = 0.0)]
        market_tax: f64,

        #[arg(long)]
        premium: bool,
    },

    /// Equipment crafting profit for a recipe
    Craft {
        /// Recipe id (see list-recipes)
        recipe: String,

        /// Units to craft
        #[arg(short, long, default_value_t = 1)]
        quantity: u64,

        /// Refined material price as material=price; repeat per material
        #[arg(long = "price", value_parser = parse_material_price)]
        prices: Vec<(MaterialType, f64)>,

        /// Sale price per crafted unit
        #[arg(long)]
        sell_price: f64,

        /// Base return rate
        #[arg(long, default_value_t = 15.2)]
        return_rate: f64,

        /// Spend focus (flat 53.9% return rate)
        #[arg(long)]
        focus: bool,

        #[arg(long, default_value_t = 0.0)]
        station_fee: f64,

        #[arg(long, default_value_t = 0.0)]
        market_tax: f64,

        #[arg(long)]
        premium: bool,
    },

    /// Chain refining across a tier range, from a TOML scenario file
    Chain {
        /// Scenario file holding a multi-tier configuration
        scenario: PathBuf,
    },

    /// Run any saved scenario file (tagged with its calculator mode)
    Calc {
        /// Scenario file holding a tagged calculation input
        scenario: PathBuf,
    },

    /// List all equipment recipes
    ListRecipes,

    /// List material names per tier
    ListMaterials {
        /// Only this tier
        #[arg(long)]
        tier: Option<u8>,
    },

    /// List royal city refining bonuses
    ListCities,

    /// List valid multi-tier chain ranges
    ListRanges,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Refine {
            material,
            tier,
            quantity,
            raw_price,
            refined_price,
            lower_price,
            return_rate,
            bonus_city,
            refining_day,
            mastery,
            focus,
            station_fee,
            market_tax,
            premium,
            available_raw,
            available_lower,
        } => {
            let input = RefiningInput {
                material_type: material.parse()?,
                tier: Tier::new(tier)?,
                target_quantity: quantity,
                raw_material_price: raw_price,
                refined_material_price: refined_price,
                lower_tier_refined_price: lower_price,
                return_rate: return_rate
                    .unwrap_or_else(|| base_return_rate(bonus_city, refining_day)),
                mastery_level: mastery,
                use_focus: focus,
                station_fee_percent: station_fee,
                market_tax_percent: market_tax,
                is_premium: premium,
                available_raw_materials: available_raw,
                available_lower_tier_refined: available_lower,
            };
            println!("{}", calculate_refining_profit(&input));
        }

        Commands::Exhaust {
            material,
            tier,
            owned_raw,
            owned_lower,
            raw_price,
            refined_price,
            lower_price,
            return_rate,
            bonus_city,
            refining_day,
            mastery,
            focus,
            station_fee,
            market_tax,
            premium,
        } => {
            let input = ResourceInput {
                material_type: material.parse()?,
                tier: Tier::new(tier)?,
                owned_raw_materials: owned_raw,
                owned_lower_tier_refined: owned_lower,
                raw_material_price: raw_price,
                refined_material_price: refined_price,
                lower_tier_refined_price: lower_price,
                return_rate: return_rate
                    .unwrap_or_else(|| base_return_rate(bonus_city, refining_day)),
                mastery_level: mastery,
                use_focus: focus,
                station_fee_percent: station_fee,
                market_tax_percent: market_tax,
                is_premium: premium,
            };
            println!("{}", calculate_resource_refining(&input));
        }

        Commands::Craft {
            recipe,
            quantity,
            prices,
            sell_price,
            return_rate,
            focus,
            station_fee,
            market_tax,
            premium,
        } => {
            let recipe = recipe_by_id(&recipe)
                .with_context(|| format!("unknown recipe '{recipe}', try list-recipes"))?;
            let input = CraftingInput {
                tier: recipe.tier,
                quantity,
                material_prices: prices.into_iter().collect::<BTreeMap<_, _>>(),
                sell_price,
                return_rate,
                use_focus: focus,
                station_fee_percent: station_fee,
                market_tax_percent: market_tax,
                is_premium: premium,
            };
            println!("{}", calculate_equipment_crafting(recipe, &input));
        }

        Commands::Chain { scenario } => {
            let text = fs::read_to_string(&scenario)
                .with_context(|| format!("reading {}", scenario.display()))?;
            let input: MultiTierInput =
                toml::from_str(&text).context("parsing chain scenario")?;
            println!("{}", calculate_multi_tier_refining(&input)?);
        }

        Commands::Calc { scenario } => {
            let text = fs::read_to_string(&scenario)
                .with_context(|| format!("reading {}", scenario.display()))?;
            let input: CalculationInput =
                toml::from_str(&text).context("parsing scenario")?;
            println!("{}", calculate(&input)?);
        }

        Commands::ListRecipes => {
            println!(
                "{:<16} {:<18} {:<12} {:<10} {}",
                "Id", "Name", "Category", "Slot", "Materials"
            );
            println!("{}", "-".repeat(76));
            for recipe in ALL_RECIPES {
                let materials = recipe
                    .materials
                    .iter()
                    .map(|&(m, qty)| format!("{qty} {}", m.display_name().to_lowercase()))
                    .collect::<Vec<_>>()
                    .join(" + ");
                println!(
                    "{:<16} {:<18} {:<12} {:<10} {}",
                    recipe.id,
                    recipe.name,
                    recipe.category.label(),
                    recipe.slot.label(),
                    materials
                );
            }
        }

        Commands::ListMaterials { tier } => {
            let tiers: Vec<Tier> = match tier {
                Some(t) => vec![Tier::new(t)?],
                None => Tier::all().collect(),
            };
            for material in MaterialType::ALL {
                println!("{} ({}):", material, material.refined_family());
                for t in &tiers {
                    println!(
                        "  {}: {} -> {}",
                        t,
                        material.raw_name(*t),
                        material.refined_name(*t)
                    );
                }
            }
        }

        Commands::ListCities => {
            println!("{:<14} {:<10} {}", "City", "Material", "Bonus");
            println!("{}", "-".repeat(32));
            for bonus in CITY_BONUSES {
                let material =
                    bonus.material.map_or("all".to_string(), |m| m.display_name().to_string());
                println!("{:<14} {:<10} {:.1}%", bonus.city, material, bonus.bonus);
            }
        }

        Commands::ListRanges => {
            println!("Valid chain ranges:");
            for (start, end) in tier_ranges() {
                println!("  {start} -> {end}");
            }
        }
    }

    Ok(())
}

/// Parse a `material=price` pair for the craft subcommand
fn parse_material_price(s: &str) -> Result<(MaterialType, f64), String> {
    let (material, price) = s
        .split_once('=')
        .ok_or_else(|| format!("expected material=price, got '{s}'"))?;
    let material: MaterialType = material.parse().map_err(|e| format!("{e}"))?;
    let price: f64 = price.parse().map_err(|_| format!("invalid price '{price}'"))?;
    Ok((material, price))
}
