//! Flavor names for enemies, places and townsfolk.

use crate::entity::EnemyKind;
use crate::world::types::LocationKind;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub trait NameGenerator {
    fn enemy_name(&mut self, kind: EnemyKind) -> String;
    fn place_name(&mut self, kind: &LocationKind) -> String;
    /// A given name for a shopkeeper or patron.
    fn person_name(&mut self) -> String;
}

const ENEMY_PREFIXES: [&str; 10] = [
    "Grizz", "Sav", "Dark", "Blood", "Bone", "Shadow", "Fel", "Dire", "Wild", "Grim",
];
const ENEMY_ROOTS: [&str; 10] = [
    "led", "age", "en", "tooth", "claw", "fang", "heart", "eye", "maw", "tail",
];

const PERSON_NAMES: [&str; 16] = [
    "Aldric", "Bryn", "Cora", "Dunstan", "Edda", "Fenn", "Greta", "Hale", "Isolde", "Jory",
    "Kestrel", "Linnea", "Marek", "Nell", "Osric", "Petra",
];

const TOWN_NAMES: [&str; 8] = [
    "Ashford", "Millbrook", "Greywater", "Oakhollow", "Stonebridge", "Larkspur", "Fenwick",
    "Harrowgate",
];
const WILDS_FIRST: [&str; 8] = [
    "Whispering", "Sunken", "Thornwood", "Howling", "Misty", "Broken", "Silent", "Ashen",
];
const WILDS_LAST: [&str; 6] = ["Moor", "Woods", "Hills", "Marsh", "Vale", "Barrens"];
const DUNGEON_FIRST: [&str; 8] = [
    "Forgotten", "Cursed", "Drowned", "Hollow", "Black", "Shattered", "Weeping", "Gloom",
];
const DUNGEON_LAST: [&str; 6] = ["Crypt", "Depths", "Catacombs", "Vault", "Warren", "Halls"];

/// Table-driven names from a seeded generator.
#[derive(Debug, Clone)]
pub struct TableNames {
    rng: StdRng,
}

impl TableNames {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn pick<'a>(&mut self, table: &[&'a str]) -> &'a str {
        table[self.rng.gen_range(0..table.len())]
    }
}

impl NameGenerator for TableNames {
    fn enemy_name(&mut self, kind: EnemyKind) -> String {
        let prefix = self.pick(&ENEMY_PREFIXES);
        let root = self.pick(&ENEMY_ROOTS);
        format!("{}{} {}", prefix, root, kind.name())
    }

    fn place_name(&mut self, kind: &LocationKind) -> String {
        match kind {
            LocationKind::Town { .. } => self.pick(&TOWN_NAMES).to_string(),
            LocationKind::Wilds => {
                format!("{} {}", self.pick(&WILDS_FIRST), self.pick(&WILDS_LAST))
            }
            LocationKind::Dungeon { .. } => {
                format!("{} {}", self.pick(&DUNGEON_FIRST), self.pick(&DUNGEON_LAST))
            }
        }
    }

    fn person_name(&mut self) -> String {
        self.pick(&PERSON_NAMES).to_string()
    }
}

/// Predictable names: the kind plus a running number.
#[derive(Debug, Clone, Default)]
pub struct FixedNames {
    counter: u32,
}

impl FixedNames {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&mut self) -> u32 {
        self.counter += 1;
        self.counter
    }
}

impl NameGenerator for FixedNames {
    fn enemy_name(&mut self, kind: EnemyKind) -> String {
        let n = self.next();
        format!("{} {}", kind.name(), n)
    }

    fn place_name(&mut self, kind: &LocationKind) -> String {
        let n = self.next();
        format!("{} {}", kind.name(), n)
    }

    fn person_name(&mut self) -> String {
        let n = self.next();
        format!("Person {}", n)
    }
}
