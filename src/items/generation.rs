//! Item tables and generators for starter gear, enemy loot and chests.

use super::types::{ArmorSlot, Item, ItemEffect, ItemId, Quality};
use crate::core::constants::STARTER_POTIONS;
use crate::entity::effects::EffectKind;
use rand::Rng;

pub fn weapon_of(id: ItemId, quality: Quality) -> Item {
    Item::weapon(
        id,
        format!("{} Sword", quality.name()),
        quality,
        quality.weapon_bonus(),
    )
}

pub fn armor_of(id: ItemId, slot: ArmorSlot, quality: Quality) -> Item {
    Item::armor(
        id,
        format!("{} {}", quality.name(), slot.piece()),
        slot,
        quality,
        slot.defense(quality),
    )
}

pub fn healing_potion(id: ItemId, quality: Quality) -> Item {
    Item::consumable(
        id,
        format!("{} Healing Potion", quality.name()),
        quality,
        ItemEffect::Heal(quality.potion_strength()),
    )
}

pub fn stamina_tonic(id: ItemId, quality: Quality) -> Item {
    Item::consumable(
        id,
        format!("{} Tonic", quality.name()),
        quality,
        ItemEffect::RestoreStamina(quality.potion_strength() / 2),
    )
}

pub fn fire_bomb(id: ItemId, quality: Quality) -> Item {
    Item::consumable(
        id,
        format!("{} Fire Bomb", quality.name()),
        quality,
        ItemEffect::Damage(quality.potion_strength() / 2 + 5),
    )
}

pub fn poison_vial(id: ItemId, quality: Quality) -> Item {
    Item::consumable(
        id,
        format!("{} Poison Vial", quality.name()),
        quality,
        ItemEffect::Inflict {
            kind: EffectKind::Poison,
            duration: 3,
            magnitude: 3 + quality.tier() as u32 * 2,
        },
    )
}

pub fn snare_net(id: ItemId, quality: Quality) -> Item {
    Item::consumable(
        id,
        "Snare Net",
        quality,
        ItemEffect::Inflict {
            kind: EffectKind::Snared,
            duration: 2 + quality.tier() as u32 / 2,
            magnitude: 0,
        },
    )
}

pub fn strength_draught(id: ItemId, quality: Quality) -> Item {
    Item::consumable(
        id,
        format!("{} Strength Draught", quality.name()),
        quality,
        ItemEffect::Inflict {
            kind: EffectKind::Strength,
            duration: 3,
            magnitude: 2 + quality.tier() as u32,
        },
    )
}

/// Picks a quality tier uniformly between `min` and `max`, inclusive.
pub fn roll_quality<R: Rng + ?Sized>(rng: &mut R, min: Quality, max: Quality) -> Quality {
    let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
    Quality::from_tier(rng.gen_range(lo.tier()..=hi.tier()))
}

/// Quality band for loot found at a given danger level.
pub fn quality_band(danger: u32) -> (Quality, Quality) {
    let low = (danger as usize).saturating_sub(1) / 2;
    (Quality::from_tier(low), Quality::from_tier(low + 1))
}

/// A random chest item, better the deeper the danger.
pub fn random_loot<R: Rng + ?Sized>(id: ItemId, danger: u32, rng: &mut R) -> Item {
    let (min, max) = quality_band(danger);
    let quality = roll_quality(rng, min, max);
    match rng.gen_range(0..100) {
        0..=34 => healing_potion(id, quality),
        35..=44 => stamina_tonic(id, quality),
        45..=52 => fire_bomb(id, quality),
        53..=59 => poison_vial(id, quality),
        60..=64 => snare_net(id, quality),
        65..=71 => strength_draught(id, quality),
        72..=85 => weapon_of(id, quality),
        _ => armor_of(id, ArmorSlot::ALL[rng.gen_range(0..ArmorSlot::ALL.len())], quality),
    }
}

/// Gear every new hero starts with, allocating ids through `next_id`.
pub fn starter_kit(mut next_id: impl FnMut() -> ItemId) -> Vec<Item> {
    vec![
        weapon_of(next_id(), Quality::Worn),
        armor_of(next_id(), ArmorSlot::Chestplate, Quality::Worn),
        healing_potion(next_id(), Quality::Tempered).with_count(STARTER_POTIONS),
    ]
}
