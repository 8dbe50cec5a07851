use crate::entity::effects::EffectKind;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item#{}", self.0)
    }
}

/// Where a piece of armor is worn. An entity wears at most one per slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ArmorSlot {
    Helmet,
    Chestplate,
    Leggings,
    Boots,
}

impl ArmorSlot {
    pub const ALL: [ArmorSlot; 4] = [
        ArmorSlot::Helmet,
        ArmorSlot::Chestplate,
        ArmorSlot::Leggings,
        ArmorSlot::Boots,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ArmorSlot::Helmet => "Helmet",
            ArmorSlot::Chestplate => "Chestplate",
            ArmorSlot::Leggings => "Leggings",
            ArmorSlot::Boots => "Boots",
        }
    }

    /// Noun used in generated item names, e.g. "Worn Mail".
    pub fn piece(&self) -> &'static str {
        match self {
            ArmorSlot::Helmet => "Helm",
            ArmorSlot::Chestplate => "Mail",
            ArmorSlot::Leggings => "Greaves",
            ArmorSlot::Boots => "Boots",
        }
    }

    /// Defense a piece of this slot grants at `quality`. Chest and legs carry
    /// the full quality bonus, head and feet half of it (rounded up).
    pub fn defense(&self, quality: Quality) -> u32 {
        let full = quality.armor_bonus();
        match self {
            ArmorSlot::Chestplate | ArmorSlot::Leggings => full,
            ArmorSlot::Helmet | ArmorSlot::Boots => full.div_ceil(2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemCategory {
    Weapon,
    Armor(ArmorSlot),
    Consumable,
}

impl ItemCategory {
    pub fn armor_slot(&self) -> Option<ArmorSlot> {
        match self {
            ItemCategory::Armor(slot) => Some(*slot),
            _ => None,
        }
    }
}

/// Quality ladder shared by weapons, armor and potions. Ordered worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Quality {
    Rusted = 0,
    Worn = 1,
    Tempered = 2,
    Fine = 3,
    Razor = 4,
    Exquisite = 5,
}

impl Quality {
    pub const ALL: [Quality; 6] = [
        Quality::Rusted,
        Quality::Worn,
        Quality::Tempered,
        Quality::Fine,
        Quality::Razor,
        Quality::Exquisite,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Quality::Rusted => "Rusted",
            Quality::Worn => "Worn",
            Quality::Tempered => "Tempered",
            Quality::Fine => "Fine",
            Quality::Razor => "Razor",
            Quality::Exquisite => "Exquisite",
        }
    }

    pub fn tier(&self) -> usize {
        *self as usize
    }

    /// Clamps an arbitrary tier index onto the ladder.
    pub fn from_tier(tier: usize) -> Quality {
        Self::ALL[tier.min(Self::ALL.len() - 1)]
    }

    pub fn weapon_bonus(&self) -> u32 {
        [1, 2, 4, 6, 9, 12][self.tier()]
    }

    pub fn armor_bonus(&self) -> u32 {
        [1, 2, 3, 5, 7, 9][self.tier()]
    }

    pub fn potion_strength(&self) -> u32 {
        [10, 15, 25, 35, 50, 70][self.tier()]
    }
}

/// What an item does when equipped or consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemEffect {
    /// Passive bonus while equipped.
    StatModifier { attack: u32, defense: u32 },
    Heal(u32),
    RestoreStamina(u32),
    /// Direct damage to a target, ignoring defense.
    Damage(u32),
    Inflict {
        kind: EffectKind,
        duration: u32,
        magnitude: u32,
    },
}

impl ItemEffect {
    /// Whether a consumable with this effect is meant for an opponent.
    pub fn is_hostile(&self) -> bool {
        match self {
            ItemEffect::Damage(_) => true,
            ItemEffect::Inflict { kind, .. } => kind.is_harmful(),
            _ => false,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ItemEffect::StatModifier { attack, defense } => match (attack, defense) {
                (0, d) => format!("+{} DEF", d),
                (a, 0) => format!("+{} ATK", a),
                (a, d) => format!("+{} ATK +{} DEF", a, d),
            },
            ItemEffect::Heal(n) => format!("heals {}", n),
            ItemEffect::RestoreStamina(n) => format!("restores {} stamina", n),
            ItemEffect::Damage(n) => format!("deals {} damage", n),
            ItemEffect::Inflict {
                kind,
                duration,
                magnitude,
            } => format!("{} {} for {} turns", kind.name(), magnitude, duration),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub category: ItemCategory,
    pub effect: ItemEffect,
    pub quality: Quality,
    count: u32,
}

impl Item {
    pub fn weapon(id: ItemId, name: impl Into<String>, quality: Quality, attack: u32) -> Self {
        Self {
            id,
            name: name.into(),
            category: ItemCategory::Weapon,
            effect: ItemEffect::StatModifier { attack, defense: 0 },
            quality,
            count: 1,
        }
    }

    pub fn armor(
        id: ItemId,
        name: impl Into<String>,
        slot: ArmorSlot,
        quality: Quality,
        defense: u32,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            category: ItemCategory::Armor(slot),
            effect: ItemEffect::StatModifier { attack: 0, defense },
            quality,
            count: 1,
        }
    }

    pub fn consumable(
        id: ItemId,
        name: impl Into<String>,
        quality: Quality,
        effect: ItemEffect,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            category: ItemCategory::Consumable,
            effect,
            quality,
            count: 1,
        }
    }

    /// Rebuilds an item from stored parts, rejecting combinations that cannot
    /// exist in play.
    pub fn from_parts(
        id: ItemId,
        name: String,
        category: ItemCategory,
        effect: ItemEffect,
        quality: Quality,
        count: u32,
    ) -> Result<Self, String> {
        if count == 0 {
            return Err(format!("{} has an empty stack", id));
        }
        let modifier = matches!(effect, ItemEffect::StatModifier { .. });
        match category {
            ItemCategory::Weapon | ItemCategory::Armor(_) if !modifier => {
                return Err(format!("{} is equipment without a stat modifier", id));
            }
            ItemCategory::Consumable if modifier => {
                return Err(format!("{} is a consumable with a stat modifier", id));
            }
            ItemCategory::Weapon | ItemCategory::Armor(_) if count != 1 => {
                return Err(format!("{} is stacked equipment", id));
            }
            _ => {}
        }
        Ok(Self {
            id,
            name,
            category,
            effect,
            quality,
            count,
        })
    }

    pub fn with_count(mut self, count: u32) -> Self {
        if self.is_consumable() {
            self.count = count.max(1);
        }
        self
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub(crate) fn set_count(&mut self, count: u32) {
        debug_assert!(count >= 1);
        self.count = count;
    }

    pub fn is_consumable(&self) -> bool {
        self.category == ItemCategory::Consumable
    }

    pub fn is_equipment(&self) -> bool {
        matches!(self.category, ItemCategory::Weapon | ItemCategory::Armor(_))
    }

    /// Consumables of the same make share one stack; equipment never stacks.
    pub fn stacks_with(&self, other: &Item) -> bool {
        self.is_consumable()
            && other.is_consumable()
            && self.name == other.name
            && self.effect == other.effect
            && self.quality == other.quality
    }

    /// (attack, defense) granted while equipped.
    pub fn modifier(&self) -> (u32, u32) {
        match self.effect {
            ItemEffect::StatModifier { attack, defense } => (attack, defense),
            _ => (0, 0),
        }
    }

    pub fn describe(&self) -> String {
        if self.count > 1 {
            format!("{} x{} ({})", self.name, self.count, self.effect.describe())
        } else {
            format!("{} ({})", self.name, self.effect.describe())
        }
    }
}
