use crate::entity::{EffectKind, EffectReceipt, EntityId, Roster};
use crate::items::ItemId;

/// One choice made by a participant on its turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Attack {
        target: EntityId,
    },
    Defend,
    /// `target` defaults to the user for helpful items. Hostile items need one.
    UseItem {
        item: ItemId,
        target: Option<EntityId>,
    },
    Flee,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initiative,
    ActionSelection,
    Resolution,
    Terminal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Pending,
    /// The party side is the only one left standing.
    Victory,
    /// The party side has no one left standing.
    Defeat,
    Fled {
        by: EntityId,
    },
}

impl Outcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::Pending)
    }
}

/// Who picks actions for a participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Controller {
    /// Waits on the presentation layer for a command.
    Human,
    /// Resolved synchronously by a [`crate::combat::CombatPolicy`].
    Ai,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Participant {
    pub id: EntityId,
    pub controller: Controller,
}

impl Participant {
    pub fn human(id: EntityId) -> Self {
        Self {
            id,
            controller: Controller::Human,
        }
    }

    pub fn ai(id: EntityId) -> Self {
        Self {
            id,
            controller: Controller::Ai,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CombatEvent {
    RoundStarted {
        round: u32,
    },
    Attacked {
        attacker: EntityId,
        target: EntityId,
        damage: u32,
    },
    Defended {
        actor: EntityId,
    },
    ItemUsed {
        actor: EntityId,
        item_name: String,
        target: EntityId,
        receipt: EffectReceipt,
    },
    EffectDamage {
        target: EntityId,
        kind: EffectKind,
        amount: u32,
    },
    EffectHeal {
        target: EntityId,
        kind: EffectKind,
        amount: u32,
    },
    EffectExpired {
        target: EntityId,
        kind: EffectKind,
    },
    Defeated {
        entity: EntityId,
    },
    Fled {
        entity: EntityId,
    },
    FleeBlocked {
        entity: EntityId,
    },
    Ended {
        outcome: Outcome,
    },
}

impl CombatEvent {
    /// Renders the event as a log line, naming entities through the roster.
    pub fn describe(&self, roster: &Roster) -> String {
        let name = |id: &EntityId| {
            roster
                .get(*id)
                .map(|e| e.name().to_string())
                .unwrap_or_else(|| id.to_string())
        };
        match self {
            CombatEvent::RoundStarted { round } => format!("-- Round {} --", round),
            CombatEvent::Attacked {
                attacker,
                target,
                damage: 0,
            } => format!("{} attacks {} but does no harm", name(attacker), name(target)),
            CombatEvent::Attacked {
                attacker,
                target,
                damage,
            } => format!("{} hits {} for {}", name(attacker), name(target), damage),
            CombatEvent::Defended { actor } => format!("{} raises their guard", name(actor)),
            CombatEvent::ItemUsed {
                actor,
                item_name,
                target,
                receipt,
            } => {
                let on = if actor == target {
                    String::new()
                } else {
                    format!(" on {}", name(target))
                };
                let result = match receipt {
                    EffectReceipt::Healed(n) => format!("restoring {} health", n),
                    EffectReceipt::StaminaRestored(n) => format!("restoring {} stamina", n),
                    EffectReceipt::Damaged(n) => format!("dealing {} damage", n),
                    EffectReceipt::Afflicted(effect) => {
                        format!("applying {} for {} turns", effect.kind.name(), effect.remaining)
                    }
                };
                format!("{} uses {}{}, {}", name(actor), item_name, on, result)
            }
            CombatEvent::EffectDamage {
                target,
                kind,
                amount,
            } => format!("{} takes {} from {}", name(target), amount, kind.name()),
            CombatEvent::EffectHeal {
                target,
                kind,
                amount,
            } => format!("{} recovers {} from {}", name(target), amount, kind.name()),
            CombatEvent::EffectExpired { target, kind } => {
                format!("{} wears off {}", kind.name(), name(target))
            }
            CombatEvent::Defeated { entity } => format!("{} is defeated!", name(entity)),
            CombatEvent::Fled { entity } => format!("{} flees the fight", name(entity)),
            CombatEvent::FleeBlocked { entity } => {
                format!("{} tries to flee but is snared", name(entity))
            }
            CombatEvent::Ended { outcome } => match outcome {
                Outcome::Victory => "Victory!".to_string(),
                Outcome::Defeat => "You have fallen.".to_string(),
                Outcome::Fled { by } => format!("The fight ends as {} escapes", name(by)),
                Outcome::Pending => "The fight goes on".to_string(),
            },
        }
    }
}

/// Summary of a finished session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombatReport {
    pub outcome: Outcome,
    pub rounds: u32,
    pub turns: u32,
    pub participants: Vec<Participant>,
    pub defeated: Vec<EntityId>,
    pub events: Vec<CombatEvent>,
}
