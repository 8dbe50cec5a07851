use super::effects::{EffectTick, StatusEffect, StatusEffects};
use super::inventory::Inventory;
use crate::core::error::{GameError, GameResult};
use crate::items::{Item, ItemCategory, ItemEffect, ItemId, Quality};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which team an entity fights for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Party,
    Hostile,
}

impl Side {
    pub fn opposing(&self) -> Side {
        match self {
            Side::Party => Side::Hostile,
            Side::Hostile => Side::Party,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Active,
    /// Health reached zero. The entity stays addressable until removed.
    Defeated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnemyKind {
    Kobold,
    Goblin,
    Orc,
    Ogre,
    Troll,
    Wraith,
}

/// Spawn template for an enemy kind.
#[derive(Debug, Clone, Copy)]
pub struct EnemyTemplate {
    pub health: (u32, u32),
    pub attack: u32,
    pub defense: u32,
    pub speed: u32,
    pub stamina: u32,
    pub weapon: (Quality, Quality),
    /// `None` when the kind never wears armor.
    pub armor: Option<(Quality, Quality)>,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 6] = [
        EnemyKind::Kobold,
        EnemyKind::Goblin,
        EnemyKind::Orc,
        EnemyKind::Ogre,
        EnemyKind::Troll,
        EnemyKind::Wraith,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EnemyKind::Kobold => "Kobold",
            EnemyKind::Goblin => "Goblin",
            EnemyKind::Orc => "Orc",
            EnemyKind::Ogre => "Ogre",
            EnemyKind::Troll => "Troll",
            EnemyKind::Wraith => "Wraith",
        }
    }

    pub fn template(&self) -> EnemyTemplate {
        use Quality::*;
        match self {
            EnemyKind::Kobold => EnemyTemplate {
                health: (30, 40),
                attack: 6,
                defense: 1,
                speed: 12,
                stamina: 8,
                weapon: (Rusted, Worn),
                armor: None,
            },
            EnemyKind::Goblin => EnemyTemplate {
                health: (45, 55),
                attack: 7,
                defense: 1,
                speed: 11,
                stamina: 10,
                weapon: (Worn, Tempered),
                armor: Some((Rusted, Worn)),
            },
            EnemyKind::Orc => EnemyTemplate {
                health: (50, 70),
                attack: 9,
                defense: 2,
                speed: 8,
                stamina: 14,
                weapon: (Tempered, Fine),
                armor: Some((Worn, Fine)),
            },
            EnemyKind::Ogre => EnemyTemplate {
                health: (70, 80),
                attack: 11,
                defense: 3,
                speed: 6,
                stamina: 16,
                weapon: (Tempered, Razor),
                armor: Some((Tempered, Fine)),
            },
            EnemyKind::Troll => EnemyTemplate {
                health: (80, 100),
                attack: 12,
                defense: 4,
                speed: 5,
                stamina: 18,
                weapon: (Fine, Razor),
                armor: Some((Fine, Razor)),
            },
            EnemyKind::Wraith => EnemyTemplate {
                health: (90, 120),
                attack: 14,
                defense: 3,
                speed: 10,
                stamina: 20,
                weapon: (Razor, Exquisite),
                armor: Some((Razor, Exquisite)),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Player,
    Enemy(EnemyKind),
}

/// Base attributes before equipment and effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseStats {
    pub max_health: u32,
    pub max_stamina: u32,
    pub attack: u32,
    pub defense: u32,
    pub speed: u32,
}

/// What an entity experienced when it received an item effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectReceipt {
    Healed(u32),
    StaminaRestored(u32),
    Damaged(u32),
    Afflicted(StatusEffect),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    id: EntityId,
    name: String,
    kind: EntityKind,
    side: Side,
    base: BaseStats,
    health: u32,
    stamina: u32,
    lifecycle: Lifecycle,
    inventory: Inventory,
    effects: StatusEffects,
}

impl Entity {
    /// Creates an entity at full health and stamina.
    pub fn new(
        id: EntityId,
        name: impl Into<String>,
        kind: EntityKind,
        side: Side,
        base: BaseStats,
    ) -> Self {
        let mut entity = Self {
            id,
            name: name.into(),
            kind,
            side,
            base,
            health: base.max_health,
            stamina: base.max_stamina,
            lifecycle: Lifecycle::Active,
            inventory: Inventory::new(),
            effects: StatusEffects::new(),
        };
        entity.sync_lifecycle();
        entity
    }

    /// Rebuilds a stored entity. Unlike the mutators, this rejects
    /// out-of-range values instead of clamping them.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn restore(
        id: EntityId,
        name: String,
        kind: EntityKind,
        side: Side,
        base: BaseStats,
        health: u32,
        stamina: u32,
        lifecycle: Lifecycle,
        inventory: Inventory,
        effects: Vec<StatusEffect>,
    ) -> Result<Self, String> {
        if health > base.max_health {
            return Err(format!(
                "{} has health {} above max {}",
                id, health, base.max_health
            ));
        }
        if stamina > base.max_stamina {
            return Err(format!(
                "{} has stamina {} above max {}",
                id, stamina, base.max_stamina
            ));
        }
        if (health == 0) != (lifecycle == Lifecycle::Defeated) {
            return Err(format!(
                "{} has health {} but lifecycle {:?}",
                id, health, lifecycle
            ));
        }
        if let Some(effect) = effects.iter().find(|e| e.remaining == 0) {
            return Err(format!("{} carries an expired {:?}", id, effect.kind));
        }
        for (i, effect) in effects.iter().enumerate() {
            if effects[..i].iter().any(|e| e.kind == effect.kind) {
                return Err(format!("{} carries {:?} twice", id, effect.kind));
            }
        }
        Ok(Self {
            id,
            name,
            kind,
            side,
            base,
            health,
            stamina,
            lifecycle,
            inventory,
            effects: StatusEffects::from_vec(effects),
        })
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn is_player(&self) -> bool {
        self.kind == EntityKind::Player
    }

    pub fn base(&self) -> BaseStats {
        self.base
    }

    pub fn health(&self) -> u32 {
        self.health
    }

    pub fn max_health(&self) -> u32 {
        self.base.max_health
    }

    pub fn stamina(&self) -> u32 {
        self.stamina
    }

    pub fn max_stamina(&self) -> u32 {
        self.base.max_stamina
    }

    pub fn speed(&self) -> u32 {
        self.base.speed
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle == Lifecycle::Active
    }

    pub fn is_defeated(&self) -> bool {
        self.lifecycle == Lifecycle::Defeated
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn effects(&self) -> &StatusEffects {
        &self.effects
    }

    /// Base attack plus weapon and effect bonuses.
    pub fn effective_attack(&self) -> u32 {
        let (weapon, _) = self.inventory.equipment_bonus();
        self.base
            .attack
            .saturating_add(weapon)
            .saturating_add(self.effects.attack_bonus())
    }

    /// Base defense plus armor and effect bonuses.
    pub fn effective_defense(&self) -> u32 {
        let (_, armor) = self.inventory.equipment_bonus();
        self.base
            .defense
            .saturating_add(armor)
            .saturating_add(self.effects.defense_bonus())
    }

    /// Damage this entity would deal to `target` with a plain attack.
    pub fn damage_against(&self, target: &Entity) -> u32 {
        self.effective_attack()
            .saturating_sub(target.effective_defense())
    }

    // =========================================================================
    // Health and stamina
    // =========================================================================

    /// Sets health, clamped to [0, max health]. Healing a defeated entity
    /// through this path is ignored; see [`Entity::revive`].
    pub fn set_health(&mut self, value: i64) {
        if self.is_defeated() && value > 0 {
            return;
        }
        self.health = value.clamp(0, self.base.max_health as i64) as u32;
        self.sync_lifecycle();
    }

    /// Lowers max health, clamping current health along with it.
    pub fn set_max_health(&mut self, max_health: u32) {
        self.base.max_health = max_health;
        self.health = self.health.min(max_health);
        self.sync_lifecycle();
    }

    /// Applies damage and returns the health actually lost.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        let lost = amount.min(self.health);
        self.health -= lost;
        self.sync_lifecycle();
        lost
    }

    /// Restores health up to the maximum and returns the amount gained.
    pub fn heal(&mut self, amount: u32) -> u32 {
        if self.is_defeated() {
            return 0;
        }
        let gained = amount.min(self.base.max_health - self.health);
        self.health += gained;
        gained
    }

    pub fn restore_stamina(&mut self, amount: u32) -> u32 {
        let gained = amount.min(self.base.max_stamina - self.stamina);
        self.stamina += gained;
        gained
    }

    pub fn set_stamina(&mut self, value: i64) {
        self.stamina = value.clamp(0, self.base.max_stamina as i64) as u32;
    }

    /// Brings a defeated entity back with the given health (at least 1).
    pub fn revive(&mut self, health: u32) {
        if self.base.max_health == 0 {
            return;
        }
        self.lifecycle = Lifecycle::Active;
        self.health = health.clamp(1, self.base.max_health);
        self.effects.clear();
        self.sync_lifecycle();
    }

    /// Full heal, full stamina, no lingering effects.
    pub fn rest(&mut self) {
        if self.is_defeated() {
            return;
        }
        self.health = self.base.max_health;
        self.stamina = self.base.max_stamina;
        self.effects.clear();
        self.sync_lifecycle();
    }

    fn sync_lifecycle(&mut self) {
        if self.health == 0 {
            self.lifecycle = Lifecycle::Defeated;
        }
    }

    // =========================================================================
    // Inventory
    // =========================================================================

    pub fn add_item(&mut self, item: Item) -> ItemId {
        self.inventory.add_item(item)
    }

    pub fn remove_item(&mut self, id: ItemId, count: u32) -> GameResult<u32> {
        self.inventory.remove_item(id, count)
    }

    pub fn equip(&mut self, id: ItemId) -> GameResult<Option<ItemId>> {
        self.inventory
            .equip(id)
            .map_err(|reason| GameError::invalid_action(self.id, reason))
    }

    /// Takes every item off this entity.
    pub fn drain_inventory(&mut self) -> Vec<Item> {
        self.inventory.drain()
    }

    /// Drops consumables, keeping equipment. Returns how many stacks were lost.
    pub fn lose_consumables(&mut self) -> usize {
        let before = self.inventory.len();
        self.inventory.retain(|i| i.category != ItemCategory::Consumable);
        before - self.inventory.len()
    }

    /// Checks that `id` is a consumable this entity holds and returns its effect.
    pub fn consumable_effect(&self, id: ItemId) -> GameResult<ItemEffect> {
        match self.inventory.get(id) {
            Some(item) if item.is_consumable() => Ok(item.effect),
            Some(_) => Err(GameError::invalid_action(
                self.id,
                "only consumables can be used",
            )),
            None => Err(GameError::invalid_action(
                self.id,
                format!("{} is not in the inventory", id),
            )),
        }
    }

    /// Removes one unit of a consumable and returns its effect.
    pub fn consume(&mut self, id: ItemId) -> GameResult<ItemEffect> {
        let effect = self.consumable_effect(id)?;
        self.inventory.remove_item(id, 1)?;
        Ok(effect)
    }

    /// Applies an instantaneous item effect to this entity.
    ///
    /// Stat modifiers only work while equipped, so receiving one is an
    /// invariant violation rather than a no-op.
    pub fn receive(&mut self, effect: ItemEffect) -> GameResult<EffectReceipt> {
        let receipt = match effect {
            ItemEffect::Heal(n) => EffectReceipt::Healed(self.heal(n)),
            ItemEffect::RestoreStamina(n) => EffectReceipt::StaminaRestored(self.restore_stamina(n)),
            ItemEffect::Damage(n) => EffectReceipt::Damaged(self.take_damage(n)),
            ItemEffect::Inflict {
                kind,
                duration,
                magnitude,
            } => {
                let effect = StatusEffect::new(kind, duration, magnitude);
                self.apply_effect(effect);
                EffectReceipt::Afflicted(effect)
            }
            ItemEffect::StatModifier { .. } => {
                return Err(GameError::InvariantViolation(format!(
                    "{} received a stat modifier as an instant effect",
                    self.id
                )))
            }
        };
        Ok(receipt)
    }

    // =========================================================================
    // Status effects
    // =========================================================================

    pub fn apply_effect(&mut self, effect: StatusEffect) {
        if self.is_defeated() {
            return;
        }
        self.effects.apply(effect);
    }

    /// Advances every effect by one turn: per-turn damage and healing first,
    /// in registration order, then durations drop and expired effects go.
    pub fn tick_effects(&mut self) -> Vec<EffectTick> {
        let mut ticks = Vec::new();
        for change in self.effects.pending_health_changes() {
            match change {
                EffectTick::Damaged { kind, amount } => {
                    let lost = self.take_damage(amount);
                    ticks.push(EffectTick::Damaged { kind, amount: lost });
                }
                EffectTick::Healed { kind, amount } => {
                    let gained = self.heal(amount);
                    ticks.push(EffectTick::Healed {
                        kind,
                        amount: gained,
                    });
                }
                EffectTick::Expired { .. } => {}
            }
        }
        ticks.extend(self.effects.decrement());
        if self.is_defeated() {
            self.effects.clear();
        }
        ticks
    }
}
