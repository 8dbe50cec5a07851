//! On-disk record shapes and the hand-written conversions to and from the
//! in-memory model.
//!
//! Enum-like values go through lowercase record tags so a record stays
//! readable and survives variant reordering. An unknown tag fails to decode.

use crate::core::constants::{SAVE_SCHEMA, SAVE_VERSION};
use crate::entity::{
    BaseStats, EffectKind, EnemyKind, Entity, EntityId, EntityKind, Inventory, Lifecycle, Roster,
    Side, StatusEffect,
};
use crate::items::{ArmorSlot, Item, ItemCategory, ItemEffect, ItemId, Quality};
use crate::world::{
    Direction, Location, LocationId, LocationKind, Position, Shop, ShopKind, WorldState,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// The envelope written to a slot file.
///
/// `world` is kept as raw JSON so the checksum covers the exact bytes on disk.
#[derive(Debug, Serialize, Deserialize)]
pub struct SaveRecord {
    pub schema: String,
    pub version: u32,
    pub record_id: Uuid,
    pub saved_at: DateTime<Utc>,
    pub checksum: String,
    pub world: Box<RawValue>,
}

impl SaveRecord {
    /// Wraps an encoded world in a fresh envelope.
    pub fn seal(world: Box<RawValue>) -> Self {
        Self {
            schema: SAVE_SCHEMA.to_string(),
            version: SAVE_VERSION,
            record_id: Uuid::new_v4(),
            saved_at: Utc::now(),
            checksum: checksum_of(world.get()),
            world,
        }
    }

    /// Checks schema, version and checksum. Returns the reason on failure.
    pub fn verify(&self) -> Result<(), String> {
        if self.schema != SAVE_SCHEMA {
            return Err(format!("unknown schema '{}'", self.schema));
        }
        if self.version == 0 || self.version > SAVE_VERSION {
            return Err(format!("unsupported version {}", self.version));
        }
        let actual = checksum_of(self.world.get());
        if actual != self.checksum {
            return Err("checksum mismatch".to_string());
        }
        Ok(())
    }

    pub fn decode_world(&self) -> Result<WorldRecord, String> {
        serde_json::from_str(self.world.get()).map_err(|e| format!("bad world data: {}", e))
    }
}

/// Lowercase hex SHA-256 of `text`.
pub fn checksum_of(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldRecord {
    pub seed: u64,
    pub steps: u64,
    pub player: u64,
    pub next_entity: u64,
    pub next_item: u64,
    pub position: PositionRecord,
    pub locations: Vec<LocationRecord>,
    #[serde(default)]
    pub opened_chests: Vec<PositionRecord>,
    pub entities: Vec<EntityRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionRecord {
    pub location: u32,
    pub floor: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub id: u32,
    pub name: String,
    pub kind: LocationTag,
    #[serde(default)]
    pub floors: u32,
    pub danger: u32,
    pub exits: Vec<ExitRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shops: Vec<ShopRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitRecord {
    pub direction: DirectionTag,
    pub to: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopRecord {
    pub kind: ShopTag,
    pub owner: String,
    #[serde(default)]
    pub patrons: Vec<String>,
    pub wares: Vec<ItemRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: u64,
    pub name: String,
    pub kind: EntityTag,
    pub side: SideTag,
    pub stats: StatsRecord,
    pub health: u32,
    pub stamina: u32,
    pub defeated: bool,
    pub items: Vec<ItemRecord>,
    pub weapon: Option<u64>,
    /// Worn armor ids, at most one per slot.
    #[serde(default)]
    pub armor: Vec<u64>,
    #[serde(default)]
    pub effects: Vec<StatusRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsRecord {
    pub max_health: u32,
    pub max_stamina: u32,
    pub attack: u32,
    pub defense: u32,
    pub speed: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub id: u64,
    pub name: String,
    pub category: CategoryTag,
    /// Set for armor only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<SlotTag>,
    pub quality: QualityTag,
    pub count: u32,
    pub effect: EffectRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EffectRecord {
    StatModifier {
        attack: u32,
        defense: u32,
    },
    Heal {
        amount: u32,
    },
    RestoreStamina {
        amount: u32,
    },
    Damage {
        amount: u32,
    },
    Inflict {
        status: StatusTag,
        duration: u32,
        magnitude: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub kind: StatusTag,
    pub remaining: u32,
    pub magnitude: u32,
}

// =========================================================================
// Tags
// =========================================================================

/// Declares a lowercase record tag that mirrors a model enum one to one.
macro_rules! record_tag {
    ($(#[$meta:meta])* $tag:ident <=> $model:ident { $($variant:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $tag {
            $($variant),+
        }

        impl From<$model> for $tag {
            fn from(value: $model) -> Self {
                match value {
                    $($model::$variant => $tag::$variant),+
                }
            }
        }

        impl From<$tag> for $model {
            fn from(value: $tag) -> Self {
                match value {
                    $($tag::$variant => $model::$variant),+
                }
            }
        }
    };
}

record_tag!(SideTag <=> Side { Party, Hostile });
record_tag!(DirectionTag <=> Direction { North, South, East, West });
record_tag!(ShopTag <=> ShopKind { Blacksmith, Tavern, Emporium });
record_tag!(SlotTag <=> ArmorSlot { Helmet, Chestplate, Leggings, Boots });
record_tag!(QualityTag <=> Quality { Rusted, Worn, Tempered, Fine, Razor, Exquisite });
record_tag!(StatusTag <=> EffectKind { Poison, Regeneration, Strength, Fortify, Guarded, Snared });

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationTag {
    Town,
    Wilds,
    Dungeon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryTag {
    Weapon,
    Armor,
    Consumable,
}

/// "player" or an enemy kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityTag {
    Player,
    Kobold,
    Goblin,
    Orc,
    Ogre,
    Troll,
    Wraith,
}

impl From<EntityKind> for EntityTag {
    fn from(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Player => EntityTag::Player,
            EntityKind::Enemy(EnemyKind::Kobold) => EntityTag::Kobold,
            EntityKind::Enemy(EnemyKind::Goblin) => EntityTag::Goblin,
            EntityKind::Enemy(EnemyKind::Orc) => EntityTag::Orc,
            EntityKind::Enemy(EnemyKind::Ogre) => EntityTag::Ogre,
            EntityKind::Enemy(EnemyKind::Troll) => EntityTag::Troll,
            EntityKind::Enemy(EnemyKind::Wraith) => EntityTag::Wraith,
        }
    }
}

impl From<EntityTag> for EntityKind {
    fn from(tag: EntityTag) -> Self {
        match tag {
            EntityTag::Player => EntityKind::Player,
            EntityTag::Kobold => EntityKind::Enemy(EnemyKind::Kobold),
            EntityTag::Goblin => EntityKind::Enemy(EnemyKind::Goblin),
            EntityTag::Orc => EntityKind::Enemy(EnemyKind::Orc),
            EntityTag::Ogre => EntityKind::Enemy(EnemyKind::Ogre),
            EntityTag::Troll => EntityKind::Enemy(EnemyKind::Troll),
            EntityTag::Wraith => EntityKind::Enemy(EnemyKind::Wraith),
        }
    }
}

// =========================================================================
// Model -> record
// =========================================================================

pub fn world_to_record(world: &WorldState) -> WorldRecord {
    WorldRecord {
        seed: world.seed,
        steps: world.steps,
        player: world.player.0,
        next_entity: world.next_entity_id(),
        next_item: world.next_item_id(),
        position: PositionRecord {
            location: world.position.location.0,
            floor: world.position.floor,
        },
        locations: world.locations.values().map(location_to_record).collect(),
        opened_chests: world
            .opened_chests
            .iter()
            .map(|(location, floor)| PositionRecord {
                location: location.0,
                floor: *floor,
            })
            .collect(),
        entities: world.roster.iter().map(entity_to_record).collect(),
    }
}

fn location_to_record(location: &Location) -> LocationRecord {
    let kind = match location.kind {
        LocationKind::Town { .. } => LocationTag::Town,
        LocationKind::Wilds => LocationTag::Wilds,
        LocationKind::Dungeon { .. } => LocationTag::Dungeon,
    };
    LocationRecord {
        id: location.id.0,
        name: location.name.clone(),
        kind,
        floors: location.floors(),
        danger: location.danger,
        exits: location
            .exits
            .iter()
            .map(|(direction, to)| ExitRecord {
                direction: (*direction).into(),
                to: to.0,
            })
            .collect(),
        shops: location
            .shops()
            .iter()
            .map(|shop| ShopRecord {
                kind: shop.kind.into(),
                owner: shop.owner.clone(),
                patrons: shop.patrons.clone(),
                wares: shop.wares.iter().map(item_to_record).collect(),
            })
            .collect(),
    }
}

fn entity_to_record(entity: &Entity) -> EntityRecord {
    let base = entity.base();
    EntityRecord {
        id: entity.id().0,
        name: entity.name().to_string(),
        kind: entity.kind().into(),
        side: entity.side().into(),
        stats: StatsRecord {
            max_health: base.max_health,
            max_stamina: base.max_stamina,
            attack: base.attack,
            defense: base.defense,
            speed: base.speed,
        },
        health: entity.health(),
        stamina: entity.stamina(),
        defeated: entity.is_defeated(),
        items: entity.inventory().items().iter().map(item_to_record).collect(),
        weapon: entity.inventory().weapon_id().map(|id| id.0),
        armor: entity.inventory().armor_ids().map(|id| id.0).collect(),
        effects: entity
            .effects()
            .iter()
            .map(|e| StatusRecord {
                kind: e.kind.into(),
                remaining: e.remaining,
                magnitude: e.magnitude,
            })
            .collect(),
    }
}

fn item_to_record(item: &Item) -> ItemRecord {
    let (category, slot) = match item.category {
        ItemCategory::Weapon => (CategoryTag::Weapon, None),
        ItemCategory::Armor(slot) => (CategoryTag::Armor, Some(slot.into())),
        ItemCategory::Consumable => (CategoryTag::Consumable, None),
    };
    ItemRecord {
        id: item.id.0,
        name: item.name.clone(),
        category,
        slot,
        quality: item.quality.into(),
        count: item.count(),
        effect: match item.effect {
            ItemEffect::StatModifier { attack, defense } => {
                EffectRecord::StatModifier { attack, defense }
            }
            ItemEffect::Heal(amount) => EffectRecord::Heal { amount },
            ItemEffect::RestoreStamina(amount) => EffectRecord::RestoreStamina { amount },
            ItemEffect::Damage(amount) => EffectRecord::Damage { amount },
            ItemEffect::Inflict {
                kind,
                duration,
                magnitude,
            } => EffectRecord::Inflict {
                status: kind.into(),
                duration,
                magnitude,
            },
        },
    }
}

// =========================================================================
// Record -> model
// =========================================================================

/// Rebuilds a world, rejecting anything that breaks a model invariant.
pub fn world_from_record(record: WorldRecord) -> Result<WorldState, String> {
    let mut locations = BTreeMap::new();
    for loc in record.locations {
        let location = location_from_record(loc)?;
        let id = location.id;
        if locations.insert(id, location).is_some() {
            return Err(format!("{} stored twice", id));
        }
    }

    let mut roster = Roster::new();
    for rec in record.entities {
        let entity = entity_from_record(rec)?;
        let id = entity.id();
        if roster.insert(entity).is_some() {
            return Err(format!("entity {} stored twice", id));
        }
    }

    let opened_chests: BTreeSet<(LocationId, u32)> = record
        .opened_chests
        .into_iter()
        .map(|p| (LocationId(p.location), p.floor))
        .collect();

    WorldState::restore(
        record.seed,
        record.steps,
        EntityId(record.player),
        roster,
        locations,
        Position {
            location: LocationId(record.position.location),
            floor: record.position.floor,
        },
        opened_chests,
        record.next_entity,
        record.next_item,
    )
}

fn location_from_record(rec: LocationRecord) -> Result<Location, String> {
    if rec.kind != LocationTag::Town && !rec.shops.is_empty() {
        return Err(format!("'{}' has shops but is not a town", rec.name));
    }
    let kind = match rec.kind {
        LocationTag::Town => LocationKind::Town {
            shops: rec
                .shops
                .into_iter()
                .map(shop_from_record)
                .collect::<Result<Vec<_>, _>>()?,
        },
        LocationTag::Wilds => LocationKind::Wilds,
        LocationTag::Dungeon if rec.floors > 0 => LocationKind::Dungeon { floors: rec.floors },
        LocationTag::Dungeon => return Err(format!("dungeon '{}' has no floors", rec.name)),
    };
    let exits = rec
        .exits
        .into_iter()
        .map(|exit| (exit.direction.into(), LocationId(exit.to)))
        .collect();
    Ok(Location {
        id: LocationId(rec.id),
        name: rec.name,
        kind,
        danger: rec.danger,
        exits,
    })
}

fn shop_from_record(rec: ShopRecord) -> Result<Shop, String> {
    let wares = rec
        .wares
        .into_iter()
        .map(item_from_record)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Shop {
        kind: rec.kind.into(),
        owner: rec.owner,
        patrons: rec.patrons,
        wares,
    })
}

fn entity_from_record(rec: EntityRecord) -> Result<Entity, String> {
    let id = EntityId(rec.id);
    let items = rec
        .items
        .into_iter()
        .map(item_from_record)
        .collect::<Result<Vec<_>, _>>()?;
    let armor: Vec<ItemId> = rec.armor.into_iter().map(ItemId).collect();
    let inventory = Inventory::restore(items, rec.weapon.map(ItemId), &armor)
        .map_err(|e| format!("{}: {}", id, e))?;
    let effects = rec
        .effects
        .into_iter()
        .map(|e| StatusEffect::new(e.kind.into(), e.remaining, e.magnitude))
        .collect();
    let lifecycle = if rec.defeated {
        Lifecycle::Defeated
    } else {
        Lifecycle::Active
    };
    let base = BaseStats {
        max_health: rec.stats.max_health,
        max_stamina: rec.stats.max_stamina,
        attack: rec.stats.attack,
        defense: rec.stats.defense,
        speed: rec.stats.speed,
    };
    Entity::restore(
        id,
        rec.name,
        rec.kind.into(),
        rec.side.into(),
        base,
        rec.health,
        rec.stamina,
        lifecycle,
        inventory,
        effects,
    )
}

fn item_from_record(rec: ItemRecord) -> Result<Item, String> {
    let id = ItemId(rec.id);
    let category = match (rec.category, rec.slot) {
        (CategoryTag::Weapon, None) => ItemCategory::Weapon,
        (CategoryTag::Armor, Some(slot)) => ItemCategory::Armor(slot.into()),
        (CategoryTag::Consumable, None) => ItemCategory::Consumable,
        (CategoryTag::Armor, None) => return Err(format!("{} is armor without a slot", id)),
        (_, Some(_)) => return Err(format!("{} names a slot but is not armor", id)),
    };
    let effect = match rec.effect {
        EffectRecord::StatModifier { attack, defense } => {
            ItemEffect::StatModifier { attack, defense }
        }
        EffectRecord::Heal { amount } => ItemEffect::Heal(amount),
        EffectRecord::RestoreStamina { amount } => ItemEffect::RestoreStamina(amount),
        EffectRecord::Damage { amount } => ItemEffect::Damage(amount),
        EffectRecord::Inflict {
            status,
            duration,
            magnitude,
        } => ItemEffect::Inflict {
            kind: status.into(),
            duration,
            magnitude,
        },
    };
    Item::from_parts(id, rec.name, category, effect, rec.quality.into(), rec.count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::armor_of;
    use crate::world::{generate_world, FixedNames};
    use serde_json::{json, Value};

    fn sample_world() -> WorldState {
        let mut world = generate_world(99, "Hero", &mut FixedNames::new()).unwrap();
        world.steps = 12;
        world.opened_chests.insert((LocationId(2), 1));
        world
            .player_mut()
            .unwrap()
            .apply_effect(StatusEffect::new(EffectKind::Regeneration, 3, 2));
        world
    }

    #[test]
    fn test_world_survives_record_conversion() {
        let world = sample_world();
        let restored = world_from_record(world_to_record(&world)).unwrap();
        assert_eq!(restored, world);
    }

    #[test]
    fn test_tags_are_lowercase_strings() {
        let record = serde_json::to_value(world_to_record(&sample_world())).unwrap();
        let hero = &record["entities"][0];
        assert_eq!(hero["kind"], "player");
        assert_eq!(hero["side"], "party");
        assert_eq!(hero["effects"][0]["kind"], "regeneration");
        assert_eq!(record["locations"][0]["kind"], "town");
        assert_eq!(record["locations"][0]["exits"][0]["direction"], "east");

        let items = hero["items"].as_array().unwrap();
        let sword = items.iter().find(|i| i["category"] == "weapon").unwrap();
        assert_eq!(sword["quality"], "worn");
        assert!(sword.get("slot").is_none());
        let mail = items.iter().find(|i| i["category"] == "armor").unwrap();
        assert_eq!(mail["slot"], "chestplate");
    }

    #[test]
    fn test_tags_follow_model_names() {
        let tag = |value: Value| value.as_str().unwrap().to_string();
        for kind in EffectKind::ALL {
            let json = serde_json::to_value(StatusTag::from(kind)).unwrap();
            assert_eq!(tag(json), kind.name().to_lowercase());
        }
        for quality in Quality::ALL {
            let json = serde_json::to_value(QualityTag::from(quality)).unwrap();
            assert_eq!(tag(json), quality.name().to_lowercase());
        }
        for slot in ArmorSlot::ALL {
            let json = serde_json::to_value(SlotTag::from(slot)).unwrap();
            assert_eq!(tag(json), slot.name().to_lowercase());
        }
        for kind in ShopKind::ALL {
            let json = serde_json::to_value(ShopTag::from(kind)).unwrap();
            assert_eq!(tag(json), kind.name().to_lowercase());
        }
        for kind in EnemyKind::ALL {
            let json = serde_json::to_value(EntityTag::from(EntityKind::Enemy(kind))).unwrap();
            assert_eq!(tag(json), kind.name().to_lowercase());
        }
    }

    #[test]
    fn test_unknown_tags_fail_to_decode() {
        let record = serde_json::to_value(world_to_record(&sample_world())).unwrap();

        let mut castle = record.clone();
        castle["locations"][0]["kind"] = json!("castle");
        assert!(serde_json::from_value::<WorldRecord>(castle).is_err());

        let mut confused = record.clone();
        confused["entities"][0]["effects"][0]["kind"] = json!("confused");
        assert!(serde_json::from_value::<WorldRecord>(confused).is_err());

        let mut shield = record;
        shield["entities"][0]["items"][1]["slot"] = json!("shield");
        assert!(serde_json::from_value::<WorldRecord>(shield).is_err());
    }

    #[test]
    fn test_conversion_rejects_broken_invariants() {
        let mut record = world_to_record(&sample_world());
        record.entities[0].health = record.entities[0].stats.max_health + 1;
        assert!(world_from_record(record).is_err());

        let mut record = world_to_record(&sample_world());
        record.entities[0].health = 0;
        assert!(world_from_record(record).is_err());

        let mut record = world_to_record(&sample_world());
        record.entities[0].weapon = Some(9_999);
        assert!(world_from_record(record).is_err());

        let mut record = world_to_record(&sample_world());
        record.locations[2].kind = LocationTag::Dungeon;
        record.locations[2].floors = 0;
        assert!(world_from_record(record).is_err());
    }

    // =========================================================================
    // Shops
    // =========================================================================

    #[test]
    fn test_town_shops_survive_record_conversion() {
        let world = sample_world();
        let shops = world.location(LocationId(0)).unwrap().shops().to_vec();
        assert!(!shops.is_empty());

        let record = world_to_record(&world);
        assert_eq!(record.locations[0].shops.len(), shops.len());
        assert_eq!(record.locations[0].shops[0].owner, shops[0].owner);
        assert!(record.locations[1].shops.is_empty());

        let json = serde_json::to_string(&record).unwrap();
        let decoded: WorldRecord = serde_json::from_str(&json).unwrap();
        let restored = world_from_record(decoded).unwrap();
        assert_eq!(restored.location(LocationId(0)).unwrap().shops(), &shops[..]);
        assert_eq!(restored, world);
    }

    #[test]
    fn test_shops_outside_town_are_rejected() {
        let mut record = world_to_record(&sample_world());
        let shops = std::mem::take(&mut record.locations[0].shops);
        record.locations[1].shops = shops;
        let err = world_from_record(record).unwrap_err();
        assert!(err.contains("has shops but is not a town"), "{err}");
    }

    // =========================================================================
    // Armor slots
    // =========================================================================

    #[test]
    fn test_worn_armor_survives_record_conversion() {
        let mut world = sample_world();
        let helm = armor_of(world.allocate_item_id(), ArmorSlot::Helmet, Quality::Fine);
        let hero = world.player_mut().unwrap();
        let helm = hero.add_item(helm);
        hero.equip(helm).unwrap();

        let record = world_to_record(&world);
        assert_eq!(record.entities[0].armor.len(), 2);
        let restored = world_from_record(record).unwrap();
        assert_eq!(restored, world);
        assert_eq!(
            restored.player().unwrap().effective_defense(),
            world.player().unwrap().effective_defense()
        );
    }

    #[test]
    fn test_two_pieces_in_one_slot_are_rejected() {
        let mut world = sample_world();
        let spare = armor_of(world.allocate_item_id(), ArmorSlot::Chestplate, Quality::Fine);
        let spare = world.player_mut().unwrap().add_item(spare);

        let mut record = world_to_record(&world);
        record.entities[0].armor.push(spare.0);
        let err = world_from_record(record).unwrap_err();
        assert!(err.contains("two pieces worn in the Chestplate slot"), "{err}");
    }

    #[test]
    fn test_armor_needs_a_slot_and_only_armor_has_one() {
        let mut record = world_to_record(&sample_world());
        let mail = record.entities[0]
            .items
            .iter_mut()
            .find(|i| i.category == CategoryTag::Armor)
            .unwrap();
        mail.slot = None;
        let err = world_from_record(record).unwrap_err();
        assert!(err.contains("armor without a slot"), "{err}");

        let mut record = world_to_record(&sample_world());
        let sword = record.entities[0]
            .items
            .iter_mut()
            .find(|i| i.category == CategoryTag::Weapon)
            .unwrap();
        sword.slot = Some(SlotTag::Helmet);
        let err = world_from_record(record).unwrap_err();
        assert!(err.contains("names a slot but is not armor"), "{err}");
    }

    #[test]
    fn test_sealed_record_verifies_and_detects_tampering() {
        let json = serde_json::to_string(&world_to_record(&sample_world())).unwrap();
        let record = SaveRecord::seal(RawValue::from_string(json.clone()).unwrap());
        assert!(record.verify().is_ok());
        assert_eq!(record.checksum.len(), 64);

        let tampered = json.replacen("\"steps\":12", "\"steps\":13", 1);
        assert_ne!(tampered, json);
        let forged = SaveRecord {
            world: RawValue::from_string(tampered).unwrap(),
            ..record
        };
        assert_eq!(forged.verify(), Err("checksum mismatch".to_string()));
    }

    #[test]
    fn test_checksum_is_lowercase_hex() {
        assert_eq!(
            checksum_of("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
