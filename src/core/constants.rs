// Player baseline
pub const PLAYER_BASE_HEALTH: u32 = 100;
pub const PLAYER_BASE_STAMINA: u32 = 20;
pub const PLAYER_BASE_ATTACK: u32 = 10;
pub const PLAYER_BASE_DEFENSE: u32 = 3;
pub const PLAYER_BASE_SPEED: u32 = 10;
pub const STARTER_POTIONS: u32 = 3;

// Combat
/// `Defend` must survive the defender's own end-of-turn tick and expire on the next one.
pub const GUARD_DURATION_TURNS: u32 = 2;
/// AI heals when at or below this fraction (numerator / denominator) of max health.
pub const AI_HEAL_THRESHOLD: (u32, u32) = (1, 3);
pub const COMBAT_LOG_CAPACITY: usize = 12;

// Encounters
pub const ENCOUNTER_BASE_CHANCE: f64 = 0.20;
pub const ENCOUNTER_CHANCE_PER_DANGER: f64 = 0.08;
pub const ENCOUNTER_MAX_CHANCE: f64 = 0.75;
pub const MAX_ENCOUNTER_GROUP: usize = 3;
pub const DEFAULT_SCRIPTED_INTERVAL: u64 = 3;

// Enemy scaling: each danger level above 1 adds this percentage to health and attack.
pub const DANGER_SCALING_PERCENT: u32 = 10;
pub const ENEMY_POTION_DROP_CHANCE: f64 = 0.35;

// Dungeons: always DUNGEON_MIN_FLOORS, plus extra floors by cumulative weight.
pub const DUNGEON_MIN_FLOORS: u32 = 3;
pub const DUNGEON_EXTRA_FLOOR_WEIGHTS: [(f64, u32); 6] = [
    (0.20, 0),
    (0.45, 1),
    (0.70, 2),
    (0.85, 3),
    (0.94, 4),
    (1.0, 5),
];

// Towns: between 1 and MAX_TOWN_SHOPS shops, no kind twice.
pub const MAX_TOWN_SHOPS: usize = 3;
pub const SHOP_WARES: usize = 4;

// Persistence
pub const SAVE_SCHEMA: &str = "delve/save";
pub const SAVE_VERSION: u32 = 1;
pub const MAX_BACKUPS_PER_SLOT: usize = 10;
pub const DEFAULT_SLOT: &str = "main";
pub const DEFAULT_HERO_NAME: &str = "Wanderer";
