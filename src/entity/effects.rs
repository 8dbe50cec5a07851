//! Timed status effects.
//!
//! Effects live in registration order. Ticking walks them in that order so
//! that replaying the same turns always yields the same log.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectKind {
    /// Loses `magnitude` health every tick.
    Poison,
    /// Regains `magnitude` health every tick.
    Regeneration,
    /// +`magnitude` attack.
    Strength,
    /// +`magnitude` defense.
    Fortify,
    /// +`magnitude` defense, granted by `Defend`.
    Guarded,
    /// Cannot flee.
    Snared,
}

impl EffectKind {
    pub const ALL: [EffectKind; 6] = [
        EffectKind::Poison,
        EffectKind::Regeneration,
        EffectKind::Strength,
        EffectKind::Fortify,
        EffectKind::Guarded,
        EffectKind::Snared,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EffectKind::Poison => "Poison",
            EffectKind::Regeneration => "Regeneration",
            EffectKind::Strength => "Strength",
            EffectKind::Fortify => "Fortify",
            EffectKind::Guarded => "Guarded",
            EffectKind::Snared => "Snared",
        }
    }

    pub fn is_harmful(&self) -> bool {
        matches!(self, EffectKind::Poison | EffectKind::Snared)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusEffect {
    pub kind: EffectKind,
    pub remaining: u32,
    pub magnitude: u32,
}

impl StatusEffect {
    pub fn new(kind: EffectKind, remaining: u32, magnitude: u32) -> Self {
        Self {
            kind,
            remaining,
            magnitude,
        }
    }
}

/// Result of one effect during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectTick {
    Damaged { kind: EffectKind, amount: u32 },
    Healed { kind: EffectKind, amount: u32 },
    Expired { kind: EffectKind },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusEffects {
    effects: Vec<StatusEffect>,
}

impl StatusEffects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an effect. Re-applying a kind refreshes it in place, keeping
    /// its original position. Zero-duration effects are ignored.
    pub fn apply(&mut self, effect: StatusEffect) {
        if effect.remaining == 0 {
            return;
        }
        match self.effects.iter_mut().find(|e| e.kind == effect.kind) {
            Some(existing) => {
                existing.remaining = existing.remaining.max(effect.remaining);
                existing.magnitude = existing.magnitude.max(effect.magnitude);
            }
            None => self.effects.push(effect),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatusEffect> {
        self.effects.iter()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn has(&self, kind: EffectKind) -> bool {
        self.effects.iter().any(|e| e.kind == kind)
    }

    pub fn clear(&mut self) {
        self.effects.clear();
    }

    pub fn attack_bonus(&self) -> u32 {
        self.sum_of(&[EffectKind::Strength])
    }

    pub fn defense_bonus(&self) -> u32 {
        self.sum_of(&[EffectKind::Fortify, EffectKind::Guarded])
    }

    pub fn prevents_flee(&self) -> bool {
        self.has(EffectKind::Snared)
    }

    fn sum_of(&self, kinds: &[EffectKind]) -> u32 {
        self.effects
            .iter()
            .filter(|e| kinds.contains(&e.kind))
            .fold(0u32, |acc, e| acc.saturating_add(e.magnitude))
    }

    /// Per-turn health changes, in registration order, before durations drop.
    pub(crate) fn pending_health_changes(&self) -> Vec<EffectTick> {
        self.effects
            .iter()
            .filter_map(|e| match e.kind {
                EffectKind::Poison => Some(EffectTick::Damaged {
                    kind: e.kind,
                    amount: e.magnitude,
                }),
                EffectKind::Regeneration => Some(EffectTick::Healed {
                    kind: e.kind,
                    amount: e.magnitude,
                }),
                _ => None,
            })
            .collect()
    }

    /// Decrements every duration by one and drops the expired effects.
    pub(crate) fn decrement(&mut self) -> Vec<EffectTick> {
        let mut expired = Vec::new();
        self.effects.retain_mut(|e| {
            e.remaining = e.remaining.saturating_sub(1);
            if e.remaining == 0 {
                expired.push(EffectTick::Expired { kind: e.kind });
                false
            } else {
                true
            }
        });
        expired
    }

    pub(crate) fn from_vec(effects: Vec<StatusEffect>) -> Self {
        Self { effects }
    }
}
