//! Static game data: materials, tiers, refining requirements, return rates

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::error::CalcError;

/// The five raw resource families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialType {
    Ore,
    Hide,
    Fiber,
    Wood,
    Stone,
}

impl MaterialType {
    pub const ALL: [MaterialType; 5] = [
        MaterialType::Ore,
        MaterialType::Hide,
        MaterialType::Fiber,
        MaterialType::Wood,
        MaterialType::Stone,
    ];

    /// Display name of the raw resource family
    pub fn display_name(self) -> &'static str {
        match self {
            MaterialType::Ore => "Ore",
            MaterialType::Hide => "Hide",
            MaterialType::Fiber => "Fiber",
            MaterialType::Wood => "Wood",
            MaterialType::Stone => "Stone",
        }
    }

    /// Name of the refined product family (what refining this resource yields)
    pub fn refined_family(self) -> &'static str {
        match self {
            MaterialType::Ore => "Metal Bars",
            MaterialType::Hide => "Leather",
            MaterialType::Fiber => "Cloth",
            MaterialType::Wood => "Planks",
            MaterialType::Stone => "Stone Blocks",
        }
    }

    /// In-game name of the raw material at a given tier
    pub fn raw_name(self, tier: Tier) -> &'static str {
        match self {
            MaterialType::Ore => match tier.get() {
                2 => "Copper Ore",
                3 => "Tin Ore",
                4 => "Iron Ore",
                5 => "Titanium Ore",
                6 => "Adamantium Ore",
                7 => "Meteorite Ore",
                _ => "Orichalcum Ore",
            },
            MaterialType::Hide => match tier.get() {
                2 => "Rugged Hide",
                3 => "Thin Hide",
                4 => "Medium Hide",
                5 => "Heavy Hide",
                6 => "Robust Hide",
                7 => "Thick Hide",
                _ => "Resilient Hide",
            },
            MaterialType::Fiber => match tier.get() {
                2 => "Cotton",
                3 => "Flax",
                4 => "Hemp",
                5 => "Skyflower",
                6 => "Amberleaf",
                7 => "Sunflax",
                _ => "Ghost Hemp",
            },
            MaterialType::Wood => match tier.get() {
                2 => "Birch Logs",
                3 => "Chestnut Logs",
                4 => "Pine Logs",
                5 => "Cedar Logs",
                6 => "Bloodoak Logs",
                7 => "Ashenbark Logs",
                _ => "Whitewood Logs",
            },
            MaterialType::Stone => match tier.get() {
                2 => "Limestone",
                3 => "Sandstone",
                4 => "Travertine",
                5 => "Granite",
                6 => "Slate",
                7 => "Basalt",
                _ => "Marble",
            },
        }
    }

    /// In-game name of the refined material at a given tier
    pub fn refined_name(self, tier: Tier) -> &'static str {
        match self {
            MaterialType::Ore => match tier.get() {
                2 => "Copper Bar",
                3 => "Bronze Bar",
                4 => "Steel Bar",
                5 => "Titanium Steel Bar",
                6 => "Adamantium Steel Bar",
                7 => "Meteorite Steel Bar",
                _ => "Orichalcum Steel Bar",
            },
            MaterialType::Hide => match tier.get() {
                2 => "Stiff Leather",
                3 => "Thick Leather",
                4 => "Worked Leather",
                5 => "Cured Leather",
                6 => "Hardened Leather",
                7 => "Reinforced Leather",
                _ => "Fortified Leather",
            },
            MaterialType::Fiber => match tier.get() {
                2 => "Simple Cloth",
                3 => "Neat Cloth",
                4 => "Fine Cloth",
                5 => "Ornate Cloth",
                6 => "Lavish Cloth",
                7 => "Opulent Cloth",
                _ => "Ethereal Cloth",
            },
            MaterialType::Wood => match tier.get() {
                2 => "Birch Planks",
                3 => "Chestnut Planks",
                4 => "Pine Planks",
                5 => "Cedar Planks",
                6 => "Bloodoak Planks",
                7 => "Ashenbark Planks",
                _ => "Whitewood Planks",
            },
            MaterialType::Stone => match tier.get() {
                2 => "Limestone Block",
                3 => "Sandstone Block",
                4 => "Travertine Block",
                5 => "Granite Block",
                6 => "Slate Block",
                7 => "Basalt Block",
                _ => "Marble Block",
            },
        }
    }
}

impl fmt::Display for MaterialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for MaterialType {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ore" => Ok(MaterialType::Ore),
            "hide" => Ok(MaterialType::Hide),
            "fiber" => Ok(MaterialType::Fiber),
            "wood" => Ok(MaterialType::Wood),
            "stone" => Ok(MaterialType::Stone),
            _ => Err(CalcError::UnknownMaterial(s.to_string())),
        }
    }
}

/// Material/equipment power level, always in [2, 8].
///
/// Tier T refined goods are produced from tier T raw materials plus
/// tier T-1 refined goods; tier 2 needs no lower-tier input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tier(u8);

impl Tier {
    pub const MIN: Tier = Tier(2);
    pub const MAX: Tier = Tier(8);

    pub const T2: Tier = Tier(2);
    pub const T3: Tier = Tier(3);
    pub const T4: Tier = Tier(4);
    pub const T5: Tier = Tier(5);
    pub const T6: Tier = Tier(6);
    pub const T7: Tier = Tier(7);
    pub const T8: Tier = Tier(8);

    /// Validate a raw tier number
    pub fn new(tier: u8) -> Result<Tier, CalcError> {
        if (Self::MIN.0..=Self::MAX.0).contains(&tier) {
            Ok(Tier(tier))
        } else {
            Err(CalcError::InvalidTier(tier))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// The next tier up, if any
    pub fn next(self) -> Option<Tier> {
        if self.0 < Self::MAX.0 { Some(Tier(self.0 + 1)) } else { None }
    }

    /// The tier below, if any
    pub fn prev(self) -> Option<Tier> {
        if self.0 > Self::MIN.0 { Some(Tier(self.0 - 1)) } else { None }
    }

    /// All tiers in ascending order
    pub fn all() -> impl Iterator<Item = Tier> {
        (Self::MIN.0..=Self::MAX.0).map(Tier)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

impl FromStr for Tier {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix(['T', 't']).unwrap_or(s);
        let raw: u8 = digits.parse().map_err(|_| CalcError::InvalidTier(0))?;
        Tier::new(raw)
    }
}

impl Serialize for Tier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.0)
    }
}

// Accepts integers and strings so tiers work both as plain fields and as
// TOML/JSON map keys (which are always strings on the wire).
impl<'de> Deserialize<'de> for Tier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TierVisitor;

        impl Visitor<'_> for TierVisitor {
            type Value = Tier;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a tier number between 2 and 8")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Tier, E> {
                u8::try_from(v)
                    .map_err(|_| E::custom("tier out of range"))
                    .and_then(|t| Tier::new(t).map_err(E::custom))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Tier, E> {
                u8::try_from(v)
                    .map_err(|_| E::custom("tier out of range"))
                    .and_then(|t| Tier::new(t).map_err(E::custom))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Tier, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(TierVisitor)
    }
}

/// Per-craft material requirements of one refining conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierRequirements {
    /// Raw materials of the target tier consumed per unit
    pub raw: u64,
    /// Refined materials of the tier below consumed per unit
    pub refined: u64,
}

/// Raw/refined input counts for refining one unit at the given tier
pub fn requirements_for(tier: Tier) -> TierRequirements {
    match tier.get() {
        2 => TierRequirements { raw: 2, refined: 0 },
        3 => TierRequirements { raw: 2, refined: 1 },
        4 => TierRequirements { raw: 2, refined: 1 },
        5 => TierRequirements { raw: 3, refined: 1 },
        6 => TierRequirements { raw: 4, refined: 1 },
        7 => TierRequirements { raw: 5, refined: 1 },
        _ => TierRequirements { raw: 6, refined: 1 },
    }
}

/// Focus points consumed per refining craft at the given tier
pub fn focus_cost(tier: Tier) -> u64 {
    match tier.get() {
        2 => 10,
        3 => 24,
        4 => 3,
        5 => 6,
        6 => 10,
        7 => 18,
        _ => 31,
    }
}

/// Return rate in a city with a bonus for the refined material
pub const RETURN_RATE_BONUS_CITY: f64 = 36.7;
/// Bonus city rate stacked with the refining day bonus
pub const RETURN_RATE_BONUS_CITY_REFINING_DAY: f64 = 46.7;
/// Return rate everywhere else
pub const RETURN_RATE_NON_BONUS_CITY: f64 = 15.2;

/// Additive return-rate bonus from focus while refining
pub const FOCUS_REFINING_BONUS: f64 = 15.3;
/// Flat return rate focus grants while crafting equipment
pub const FOCUS_CRAFTING_RATE: f64 = 53.9;

/// Additional return rate granted per 20 mastery levels
pub const MASTERY_BONUS_PER_20_LEVELS: f64 = 4.0;

/// Mastery return-rate bonus: 4 percentage points per full 20 levels
pub fn mastery_bonus(mastery_level: u32) -> f64 {
    f64::from(mastery_level / 20) * MASTERY_BONUS_PER_20_LEVELS
}

/// Effective refining return rate: base plus mastery, plus the focus
/// bonus when focus is used. No upper clamp is applied; rates at or
/// above 100% are a caller concern (the exhaustion loop's iteration cap
/// is the only backstop).
pub fn effective_return_rate(base: f64, mastery_level: u32, use_focus: bool) -> f64 {
    let focus_bonus = if use_focus { FOCUS_REFINING_BONUS } else { 0.0 };
    base + mastery_bonus(mastery_level) + focus_bonus
}

/// Resolve the base return rate from location toggles. The refining day
/// bonus only applies in a bonus city.
pub fn base_return_rate(is_bonus_city: bool, is_refining_day: bool) -> f64 {
    if is_bonus_city {
        if is_refining_day {
            RETURN_RATE_BONUS_CITY_REFINING_DAY
        } else {
            RETURN_RATE_BONUS_CITY
        }
    } else {
        RETURN_RATE_NON_BONUS_CITY
    }
}

/// Whole units returned after a conversion: partial units are impossible,
/// so the fraction is always floored, never rounded.
pub fn returned_units(consumed: u64, return_rate_percent: f64) -> u64 {
    (consumed as f64 * return_rate_percent / 100.0).floor() as u64
}

/// A royal city's refining bonus
#[derive(Debug, Clone, Copy)]
pub struct CityBonus {
    pub city: &'static str,
    /// Material the bonus applies to; `None` means every material
    pub material: Option<MaterialType>,
    pub bonus: f64,
}

/// Per-city refining bonuses
pub const CITY_BONUSES: [CityBonus; 6] = [
    CityBonus { city: "Martlock", material: Some(MaterialType::Hide), bonus: 36.7 },
    CityBonus { city: "Bridgewatch", material: Some(MaterialType::Stone), bonus: 36.7 },
    CityBonus { city: "Lymhurst", material: Some(MaterialType::Fiber), bonus: 36.7 },
    CityBonus { city: "Fort Sterling", material: Some(MaterialType::Wood), bonus: 36.7 },
    CityBonus { city: "Thetford", material: Some(MaterialType::Ore), bonus: 36.7 },
    CityBonus { city: "Caerleon", material: None, bonus: 15.2 },
];

/// Refining bonus a city grants for a material, if it grants one
pub fn bonus_for_city(city: &str, material: MaterialType) -> Option<f64> {
    CITY_BONUSES
        .iter()
        .find(|b| b.city.eq_ignore_ascii_case(city))
        .filter(|b| b.material.is_none() || b.material == Some(material))
        .map(|b| b.bonus)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_validation() {
        assert!(Tier::new(2).is_ok());
        assert!(Tier::new(8).is_ok());
        assert!(Tier::new(1).is_err());
        assert!(Tier::new(9).is_err());
        assert!(Tier::new(0).is_err());
    }

    #[test]
    fn tier_parsing_accepts_prefix() {
        assert_eq!("4".parse::<Tier>().unwrap(), Tier::T4);
        assert_eq!("T6".parse::<Tier>().unwrap(), Tier::T6);
        assert!("T9".parse::<Tier>().is_err());
    }

    #[test]
    fn requirements_are_monotonic() {
        // T2 is the only tier with no lower-tier input.
        assert_eq!(requirements_for(Tier::T2).refined, 0);
        for tier in Tier::all().skip(1) {
            assert!(requirements_for(tier).refined >= 1, "{tier} needs lower-tier input");
            assert!(requirements_for(tier).raw >= 2);
        }
    }

    #[test]
    fn mastery_bonus_steps_every_20_levels() {
        assert_eq!(mastery_bonus(0), 0.0);
        assert_eq!(mastery_bonus(19), 0.0);
        assert_eq!(mastery_bonus(20), 4.0);
        assert_eq!(mastery_bonus(39), 4.0);
        assert_eq!(mastery_bonus(100), 20.0);
    }

    #[test]
    fn effective_rate_composition() {
        assert_eq!(effective_return_rate(15.2, 0, false), 15.2);
        assert_eq!(effective_return_rate(15.2, 0, true), 15.2 + 15.3);
        assert_eq!(effective_return_rate(36.7, 40, false), 36.7 + 8.0);
        // No clamp: stacking may exceed 100%.
        assert!(effective_return_rate(46.7, 300, true) > 100.0);
    }

    #[test]
    fn returns_never_exceed_input_below_100_percent() {
        for amount in [0u64, 1, 2, 7, 100, 12345] {
            for rate in [0.0, 15.2, 46.7, 99.9, 100.0] {
                assert!(returned_units(amount, rate) <= amount);
            }
        }
    }

    #[test]
    fn returned_units_floor_not_round() {
        assert_eq!(returned_units(200, 15.2), 30);
        assert_eq!(returned_units(100, 15.2), 15);
        assert_eq!(returned_units(13, 15.2), 1); // 1.976 floors to 1
    }

    #[test]
    fn base_rate_resolution() {
        assert_eq!(base_return_rate(false, false), 15.2);
        assert_eq!(base_return_rate(false, true), 15.2); // refining day needs a bonus city
        assert_eq!(base_return_rate(true, false), 36.7);
        assert_eq!(base_return_rate(true, true), 46.7);
    }

    #[test]
    fn city_bonus_lookup() {
        assert_eq!(bonus_for_city("Thetford", MaterialType::Ore), Some(36.7));
        assert_eq!(bonus_for_city("thetford", MaterialType::Ore), Some(36.7));
        assert_eq!(bonus_for_city("Thetford", MaterialType::Hide), None);
        assert_eq!(bonus_for_city("Caerleon", MaterialType::Hide), Some(15.2));
        assert_eq!(bonus_for_city("Nowhere", MaterialType::Ore), None);
    }

    #[test]
    fn tier_deserializes_from_int_and_map_key() {
        #[derive(Deserialize)]
        struct Doc {
            tier: Tier,
            prices: std::collections::BTreeMap<Tier, f64>,
        }

        let doc: Doc = toml::from_str(
            r#"
            tier = 5
            [prices]
            "4" = 120.0
            "5" = 260.0
            "#,
        )
        .unwrap();
        assert_eq!(doc.tier, Tier::T5);
        assert_eq!(doc.prices[&Tier::T4], 120.0);
        assert_eq!(doc.prices[&Tier::T5], 260.0);
    }
}
