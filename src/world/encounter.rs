//! Encounter policies: when exploring triggers a fight, and against whom.

use crate::core::constants::{
    ENCOUNTER_BASE_CHANCE, ENCOUNTER_CHANCE_PER_DANGER, ENCOUNTER_MAX_CHANCE,
    MAX_ENCOUNTER_GROUP,
};
use crate::entity::EnemyKind;
use crate::world::types::{Location, Position};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// What to spawn for one encounter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncounterSpec {
    pub enemies: Vec<EnemyKind>,
    pub danger: u32,
}

pub trait EncounterPolicy {
    /// Decides whether the step numbered `steps` at `position` starts a fight.
    fn roll(&mut self, location: &Location, position: &Position, steps: u64)
        -> Option<EncounterSpec>;
}

/// Enemy kinds that fit a danger level, weakest first.
pub fn enemy_pool(danger: u32) -> &'static [EnemyKind] {
    let all = &EnemyKind::ALL;
    let start = ((danger / 2) as usize).min(all.len() - 2);
    &all[start..start + 2]
}

fn danger_at(location: &Location, position: &Position) -> u32 {
    location.danger.saturating_add(position.floor)
}

/// A single enemy every `every` steps outside town. Fully predictable.
#[derive(Debug, Clone)]
pub struct ScriptedEncounters {
    every: u64,
}

impl ScriptedEncounters {
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
        }
    }
}

impl EncounterPolicy for ScriptedEncounters {
    fn roll(
        &mut self,
        location: &Location,
        position: &Position,
        steps: u64,
    ) -> Option<EncounterSpec> {
        if location.is_town() || steps == 0 || steps % self.every != 0 {
            return None;
        }
        let danger = danger_at(location, position);
        let pool = enemy_pool(danger);
        let pick = ((steps / self.every) % pool.len() as u64) as usize;
        Some(EncounterSpec {
            enemies: vec![pool[pick]],
            danger,
        })
    }
}

/// Seeded chance per step that grows with danger. The roll for a given step
/// only depends on the seed and the step number, so a reloaded game sees the
/// same encounters.
#[derive(Debug, Clone)]
pub struct WeightedEncounters {
    seed: u64,
}

impl WeightedEncounters {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn chance(danger: u32) -> f64 {
        (ENCOUNTER_BASE_CHANCE + ENCOUNTER_CHANCE_PER_DANGER * danger as f64)
            .min(ENCOUNTER_MAX_CHANCE)
    }
}

impl EncounterPolicy for WeightedEncounters {
    fn roll(
        &mut self,
        location: &Location,
        position: &Position,
        steps: u64,
    ) -> Option<EncounterSpec> {
        if location.is_town() {
            return None;
        }
        let mut rng =
            StdRng::seed_from_u64(self.seed ^ steps.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        let danger = danger_at(location, position);
        if !rng.gen_bool(Self::chance(danger)) {
            return None;
        }

        let largest = (1 + danger as usize / 3).min(MAX_ENCOUNTER_GROUP);
        let size = rng.gen_range(1..=largest);
        let pool = enemy_pool(danger);
        let enemies = (0..size)
            .map(|_| pool[rng.gen_range(0..pool.len())])
            .collect();
        Some(EncounterSpec { enemies, danger })
    }
}
