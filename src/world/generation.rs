//! World generation and enemy spawning.

use crate::core::constants::{
    DANGER_SCALING_PERCENT, DUNGEON_EXTRA_FLOOR_WEIGHTS, DUNGEON_MIN_FLOORS,
    ENEMY_POTION_DROP_CHANCE, PLAYER_BASE_ATTACK, PLAYER_BASE_DEFENSE, PLAYER_BASE_HEALTH,
    PLAYER_BASE_SPEED, PLAYER_BASE_STAMINA,
};
use crate::core::error::GameResult;
use crate::entity::{BaseStats, EnemyKind, Entity, EntityId, EntityKind, Roster, Side};
use crate::items::{
    armor_of, healing_potion, quality_band, roll_quality, starter_kit, weapon_of, ArmorSlot,
    ItemId,
};
use crate::world::encounter::EncounterSpec;
use crate::world::names::NameGenerator;
use crate::world::shops::open_town_shops;
use crate::world::types::{Direction, Location, LocationId, LocationKind, Position, WorldState};
use rand::Rng;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use tracing::debug;

/// Rolls a dungeon depth: the minimum plus weighted extra floors.
pub fn roll_floor_count<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    let roll: f64 = rng.gen();
    let extra = DUNGEON_EXTRA_FLOOR_WEIGHTS
        .iter()
        .find(|(threshold, _)| roll < *threshold)
        .map_or(0, |(_, extra)| *extra);
    DUNGEON_MIN_FLOORS + extra
}

pub fn player_stats() -> BaseStats {
    BaseStats {
        max_health: PLAYER_BASE_HEALTH,
        max_stamina: PLAYER_BASE_STAMINA,
        attack: PLAYER_BASE_ATTACK,
        defense: PLAYER_BASE_DEFENSE,
        speed: PLAYER_BASE_SPEED,
    }
}

/// A fresh hero carrying and wearing the starter kit.
pub fn new_player(
    id: EntityId,
    name: &str,
    next_item: impl FnMut() -> ItemId,
) -> GameResult<Entity> {
    let mut hero = Entity::new(id, name, EntityKind::Player, Side::Party, player_stats());
    for item in starter_kit(next_item) {
        let equipment = item.is_equipment();
        let id = hero.add_item(item);
        if equipment {
            hero.equip(id)?;
        }
    }
    Ok(hero)
}

/// Builds the map: a town with one to three shops and two roads, each
/// leading through wilderness to a dungeon.
///
/// ```text
///            [dungeon B]
///                 |
///             [wilds B]
///                 |
///  [town] -- [wilds A] -- [dungeon A]
/// ```
///
/// Road B starts north of town. Everything is a pure function of `seed`
/// and the name generator.
pub fn generate_world(
    seed: u64,
    hero_name: &str,
    names: &mut dyn NameGenerator,
) -> GameResult<WorldState> {
    let mut rng = StdRng::seed_from_u64(seed);
    let near_floors = roll_floor_count(&mut rng);
    let far_floors = roll_floor_count(&mut rng);

    let mut next_item = 0;
    let mut allocate = || {
        next_item += 1;
        ItemId(next_item)
    };
    let hero = new_player(EntityId(1), hero_name, &mut allocate)?;
    let shops = open_town_shops(names, &mut rng, &mut allocate);
    let shop_count = shops.len();

    let mut place = |id: u32, kind: LocationKind, danger: u32, exits: Vec<(Direction, u32)>| {
        Location {
            id: LocationId(id),
            name: names.place_name(&kind),
            kind,
            danger,
            exits: exits
                .into_iter()
                .map(|(d, to)| (d, LocationId(to)))
                .collect(),
        }
    };

    let layout = vec![
        place(
            0,
            LocationKind::Town { shops },
            0,
            vec![(Direction::East, 1), (Direction::North, 3)],
        ),
        place(
            1,
            LocationKind::Wilds,
            1,
            vec![(Direction::West, 0), (Direction::East, 2)],
        ),
        place(
            2,
            LocationKind::Dungeon {
                floors: near_floors,
            },
            2,
            vec![(Direction::West, 1)],
        ),
        place(
            3,
            LocationKind::Wilds,
            3,
            vec![(Direction::South, 0), (Direction::North, 4)],
        ),
        place(
            4,
            LocationKind::Dungeon { floors: far_floors },
            5,
            vec![(Direction::South, 3)],
        ),
    ];
    let locations: BTreeMap<LocationId, Location> =
        layout.into_iter().map(|loc| (loc.id, loc)).collect();

    let player = hero.id();
    let roster: Roster = std::iter::once(hero).collect();

    debug!(seed, near_floors, far_floors, shop_count, "world generated");
    Ok(WorldState::new(
        seed,
        player,
        roster,
        locations,
        Position::surface(LocationId(0)),
    ))
}

fn scaled(value: u32, danger: u32) -> u32 {
    let percent = 100 + DANGER_SCALING_PERCENT * danger.saturating_sub(1);
    value.saturating_mul(percent) / 100
}

/// Creates one enemy, armed from its template, and puts it in the roster.
pub fn spawn_enemy<R: Rng + ?Sized>(
    world: &mut WorldState,
    kind: EnemyKind,
    danger: u32,
    names: &mut dyn NameGenerator,
    rng: &mut R,
) -> GameResult<EntityId> {
    let template = kind.template();
    let health = scaled(rng.gen_range(template.health.0..=template.health.1), danger);
    let base = BaseStats {
        max_health: health,
        max_stamina: template.stamina,
        attack: scaled(template.attack, danger),
        defense: template.defense,
        speed: template.speed,
    };

    let id = world.allocate_entity_id();
    let mut enemy = Entity::new(
        id,
        names.enemy_name(kind),
        EntityKind::Enemy(kind),
        Side::Hostile,
        base,
    );

    let weapon = weapon_of(
        world.allocate_item_id(),
        roll_quality(rng, template.weapon.0, template.weapon.1),
    );
    let weapon = enemy.add_item(weapon);
    enemy.equip(weapon)?;

    if let Some((min, max)) = template.armor {
        let armor = armor_of(
            world.allocate_item_id(),
            ArmorSlot::Chestplate,
            roll_quality(rng, min, max),
        );
        let armor = enemy.add_item(armor);
        enemy.equip(armor)?;
    }

    if rng.gen_bool(ENEMY_POTION_DROP_CHANCE) {
        let (min, max) = quality_band(danger);
        enemy.add_item(healing_potion(
            world.allocate_item_id(),
            roll_quality(rng, min, max),
        ));
    }

    debug!(%id, kind = kind.name(), danger, health, "enemy spawned");
    world.roster.insert(enemy);
    Ok(id)
}

/// Spawns a whole encounter group in listed order.
pub fn spawn_encounter<R: Rng + ?Sized>(
    world: &mut WorldState,
    spec: &EncounterSpec,
    names: &mut dyn NameGenerator,
    rng: &mut R,
) -> GameResult<Vec<EntityId>> {
    spec.enemies
        .iter()
        .map(|kind| spawn_enemy(world, *kind, spec.danger, names, rng))
        .collect()
}
