//! Equipment recipe registry: bills of materials for craftable items

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::game_data::{MaterialType, Tier};

/// Focus points per crafted unit unless the recipe overrides it
pub const DEFAULT_CRAFT_FOCUS_COST: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquipmentCategory {
    Weapons,
    Armor,
    Accessories,
    Tools,
    Consumables,
}

impl EquipmentCategory {
    pub const ALL: [EquipmentCategory; 5] = [
        EquipmentCategory::Weapons,
        EquipmentCategory::Armor,
        EquipmentCategory::Accessories,
        EquipmentCategory::Tools,
        EquipmentCategory::Consumables,
    ];

    pub fn label(self) -> &'static str {
        match self {
            EquipmentCategory::Weapons => "Weapons",
            EquipmentCategory::Armor => "Armor",
            EquipmentCategory::Accessories => "Accessories",
            EquipmentCategory::Tools => "Tools",
            EquipmentCategory::Consumables => "Consumables",
        }
    }
}

impl fmt::Display for EquipmentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquipmentSlot {
    Head,
    Chest,
    Shoes,
    MainHand,
    OffHand,
    Cape,
    Bag,
    Mount,
    Tool,
    Consumable,
}

impl EquipmentSlot {
    pub fn label(self) -> &'static str {
        match self {
            EquipmentSlot::Head => "Head",
            EquipmentSlot::Chest => "Chest",
            EquipmentSlot::Shoes => "Shoes",
            EquipmentSlot::MainHand => "Main Hand",
            EquipmentSlot::OffHand => "Off Hand",
            EquipmentSlot::Cape => "Cape",
            EquipmentSlot::Bag => "Bag",
            EquipmentSlot::Mount => "Mount",
            EquipmentSlot::Tool => "Tool",
            EquipmentSlot::Consumable => "Consumable",
        }
    }
}

impl fmt::Display for EquipmentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One craftable item: identity plus its bill of materials.
///
/// `materials` lists refined material consumed per unit crafted.
#[derive(Debug, Clone, Copy)]
pub struct EquipmentRecipe {
    pub id: &'static str,
    pub name: &'static str,
    pub category: EquipmentCategory,
    pub slot: EquipmentSlot,
    pub tier: Tier,
    pub materials: &'static [(MaterialType, u64)],
    /// Per-recipe focus cost when it differs from the default
    pub focus_cost: Option<u64>,
}

impl EquipmentRecipe {
    /// Focus points consumed per crafted unit
    pub fn focus_cost_per_unit(&self) -> u64 {
        self.focus_cost.unwrap_or(DEFAULT_CRAFT_FOCUS_COST)
    }

    /// Whether the bill of materials includes the given material
    pub fn uses_material(&self, material: MaterialType) -> bool {
        self.materials.iter().any(|&(m, _)| m == material)
    }
}

macro_rules! recipe {
    ($id:literal, $name:literal, $cat:ident, $slot:ident, $($mat:ident: $qty:literal),+) => {
        EquipmentRecipe {
            id: $id,
            name: $name,
            category: EquipmentCategory::$cat,
            slot: EquipmentSlot::$slot,
            tier: Tier::T4,
            materials: &[$((MaterialType::$mat, $qty)),+],
            focus_cost: None,
        }
    };
}

/// Every known equipment recipe
pub const ALL_RECIPES: &[EquipmentRecipe] = &[
    // Cloth armor
    recipe!("cloth_hood", "Cloth Hood", Armor, Head, Fiber: 8),
    recipe!("cloth_robe", "Cloth Robe", Armor, Chest, Fiber: 16),
    recipe!("cloth_sandals", "Cloth Sandals", Armor, Shoes, Fiber: 8),
    // Magic weapons
    recipe!("fire_staff", "Fire Staff", Weapons, MainHand, Fiber: 16, Wood: 8),
    recipe!("holy_staff", "Holy Staff", Weapons, MainHand, Fiber: 16, Wood: 8),
    recipe!("arcane_staff", "Arcane Staff", Weapons, MainHand, Fiber: 16, Wood: 8),
    recipe!("curse_staff", "Curse Staff", Weapons, MainHand, Fiber: 16, Wood: 8),
    recipe!("nature_staff", "Nature Staff", Weapons, MainHand, Fiber: 16, Wood: 8),
    recipe!("frost_staff", "Frost Staff", Weapons, MainHand, Fiber: 16, Wood: 8),
    // Off-hand casters
    recipe!("tome_of_spells", "Tome of Spells", Weapons, OffHand, Fiber: 8),
    recipe!("orb", "Orb", Weapons, OffHand, Fiber: 8),
    // Leather armor
    recipe!("leather_hood", "Leather Hood", Armor, Head, Hide: 8),
    recipe!("leather_jacket", "Leather Jacket", Armor, Chest, Hide: 16),
    recipe!("leather_shoes", "Leather Shoes", Armor, Shoes, Hide: 8),
    // Ranged weapons
    recipe!("bow", "Bow", Weapons, MainHand, Hide: 16, Wood: 8),
    recipe!("crossbow", "Crossbow", Weapons, MainHand, Hide: 16, Wood: 8),
    recipe!("quiver", "Quiver", Weapons, OffHand, Hide: 8),
    // Plate armor
    recipe!("plate_helmet", "Plate Helmet", Armor, Head, Ore: 8),
    recipe!("plate_armor", "Plate Armor", Armor, Chest, Ore: 16),
    recipe!("plate_boots", "Plate Boots", Armor, Shoes, Ore: 8),
    // Melee weapons
    recipe!("sword", "Sword", Weapons, MainHand, Ore: 16),
    recipe!("axe", "Axe", Weapons, MainHand, Ore: 16),
    recipe!("mace", "Mace", Weapons, MainHand, Ore: 16),
    recipe!("hammer", "Hammer", Weapons, MainHand, Ore: 20),
    recipe!("spear", "Spear", Weapons, MainHand, Ore: 16, Wood: 8),
    recipe!("dagger", "Dagger", Weapons, MainHand, Ore: 12),
    recipe!("shield", "Shield", Weapons, OffHand, Ore: 8),
    // Tools
    recipe!("pickaxe", "Pickaxe", Tools, Tool, Ore: 16, Wood: 8),
    recipe!("sickle", "Sickle", Tools, Tool, Ore: 16, Wood: 8),
    recipe!("skinning_knife", "Skinning Knife", Tools, Tool, Ore: 16, Wood: 8),
    recipe!("stone_hammer", "Stone Hammer", Tools, Tool, Ore: 16, Wood: 8),
    recipe!("fishing_rod", "Fishing Rod", Tools, Tool, Wood: 16, Fiber: 8),
    // Accessories
    recipe!("bag", "Bag", Accessories, Bag, Hide: 8, Fiber: 4),
    recipe!("cape", "Cape", Accessories, Cape, Fiber: 8),
];

/// Look up a recipe by its id
pub fn recipe_by_id(id: &str) -> Option<&'static EquipmentRecipe> {
    ALL_RECIPES.iter().find(|r| r.id == id)
}

/// All recipes in a category
pub fn recipes_by_category(category: EquipmentCategory) -> Vec<&'static EquipmentRecipe> {
    ALL_RECIPES.iter().filter(|r| r.category == category).collect()
}

/// All recipes whose bill of materials includes the given material
pub fn recipes_by_material(material: MaterialType) -> Vec<&'static EquipmentRecipe> {
    ALL_RECIPES.iter().filter(|r| r.uses_material(material)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_lookup_by_id() {
        let bow = recipe_by_id("bow").unwrap();
        assert_eq!(bow.name, "Bow");
        assert_eq!(bow.materials, &[(MaterialType::Hide, 16), (MaterialType::Wood, 8)][..]);
        assert!(recipe_by_id("battleaxe_of_doom").is_none());
    }

    #[test]
    fn registry_ids_are_unique() {
        for (i, a) in ALL_RECIPES.iter().enumerate() {
            for b in &ALL_RECIPES[i + 1..] {
                assert_ne!(a.id, b.id);
            }
        }
    }

    #[test]
    fn category_and_material_filters() {
        let tools = recipes_by_category(EquipmentCategory::Tools);
        assert_eq!(tools.len(), 5);
        assert!(tools.iter().all(|r| r.slot == EquipmentSlot::Tool));

        let hide_users = recipes_by_material(MaterialType::Hide);
        assert!(hide_users.iter().any(|r| r.id == "bag"));
        assert!(hide_users.iter().all(|r| r.uses_material(MaterialType::Hide)));
    }

    #[test]
    fn focus_cost_defaults_to_three() {
        assert_eq!(recipe_by_id("sword").unwrap().focus_cost_per_unit(), 3);
    }

    #[test]
    fn every_bom_entry_is_positive() {
        for recipe in ALL_RECIPES {
            assert!(!recipe.materials.is_empty(), "{} has an empty bill", recipe.id);
            for &(_, qty) in recipe.materials {
                assert!(qty > 0);
            }
        }
    }
}
