//! The combat session state machine.
//!
//! A session never owns entities. It keeps participant ids and borrows the
//! world's [`Roster`] for each step, so every hit lands on the world's own
//! entities.

use super::policy::CombatPolicy;
use super::types::{
    Action, CombatEvent, CombatReport, Controller, Outcome, Participant, Phase,
};
use crate::core::constants::GUARD_DURATION_TURNS;
use crate::core::error::{GameError, GameResult};
use crate::entity::{EffectKind, EffectTick, Entity, EntityId, Roster, Side, StatusEffect};
use crate::items::{ItemEffect, ItemId};
use std::collections::VecDeque;
use tracing::debug;

/// Orders participants by speed, fastest first. Equal speeds keep
/// registration order. Defeated or unknown entities are left out.
pub fn initiative_order(participants: &[EntityId], roster: &Roster) -> Vec<EntityId> {
    let mut ranked: Vec<(usize, EntityId, u32)> = participants
        .iter()
        .enumerate()
        .filter_map(|(slot, id)| {
            roster
                .get(*id)
                .filter(|e| e.is_active())
                .map(|e| (slot, *id, e.speed()))
        })
        .collect();
    ranked.sort_by(|a, b| b.2.cmp(&a.2).then(a.0.cmp(&b.0)));
    ranked.into_iter().map(|(_, id, _)| id).collect()
}

/// A validated action, ready to apply.
enum Plan {
    Attack {
        target: EntityId,
    },
    Defend,
    UseItem {
        item: ItemId,
        effect: ItemEffect,
        target: EntityId,
    },
    Flee,
}

#[derive(Debug)]
pub struct CombatSession {
    participants: Vec<Participant>,
    /// Fixed initiative order, minus anyone defeated since.
    order: Vec<EntityId>,
    /// Who still acts this round, front first.
    queue: VecDeque<EntityId>,
    turn: u32,
    round: u32,
    phase: Phase,
    outcome: Outcome,
    defeated: Vec<EntityId>,
    events: Vec<CombatEvent>,
}

impl CombatSession {
    /// Rolls initiative and opens round one.
    ///
    /// Fails with `InvariantViolation` when the participant list cannot make a
    /// fight: fewer than two, unknown or duplicated ids, or one side without
    /// anyone standing.
    pub fn start(participants: Vec<Participant>, roster: &Roster) -> GameResult<Self> {
        if participants.len() < 2 {
            return Err(GameError::InvariantViolation(
                "combat needs at least two participants".into(),
            ));
        }
        for (i, p) in participants.iter().enumerate() {
            if !roster.contains(p.id) {
                return Err(GameError::InvariantViolation(format!(
                    "combat participant {} is not in the roster",
                    p.id
                )));
            }
            if participants[..i].iter().any(|other| other.id == p.id) {
                return Err(GameError::InvariantViolation(format!(
                    "combat participant {} registered twice",
                    p.id
                )));
            }
        }

        let mut session = Self {
            participants,
            order: Vec::new(),
            queue: VecDeque::new(),
            turn: 0,
            round: 0,
            phase: Phase::Initiative,
            outcome: Outcome::Pending,
            defeated: Vec::new(),
            events: Vec::new(),
        };

        let ids: Vec<EntityId> = session.participants.iter().map(|p| p.id).collect();
        session.order = initiative_order(&ids, roster);
        if session.side_outcome(roster) != Outcome::Pending {
            return Err(GameError::InvariantViolation(
                "combat needs a standing participant on both sides".into(),
            ));
        }

        session.begin_round();
        session.phase = Phase::ActionSelection;
        debug!(order = ?session.order, "combat started");
        Ok(session)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn is_over(&self) -> bool {
        self.phase == Phase::Terminal
    }

    /// Number of resolved actions so far.
    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Initiative order of everyone still standing.
    pub fn order(&self) -> &[EntityId] {
        &self.order
    }

    /// Everyone still due to act this round, current actor first.
    pub fn remaining_this_round(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.queue.iter().copied()
    }

    pub fn events(&self) -> &[CombatEvent] {
        &self.events
    }

    pub fn defeated(&self) -> &[EntityId] {
        &self.defeated
    }

    /// Whose turn it is, or `None` once the session is over.
    pub fn current_actor(&self) -> Option<EntityId> {
        if self.is_over() {
            return None;
        }
        self.queue.front().copied()
    }

    pub fn controller_of(&self, id: EntityId) -> Option<Controller> {
        self.participants
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.controller)
    }

    pub fn is_participant(&self, id: EntityId) -> bool {
        self.participants.iter().any(|p| p.id == id)
    }

    /// Standing opponents of `id`, in initiative order.
    pub fn opponents_of(&self, id: EntityId, roster: &Roster) -> Vec<EntityId> {
        let Some(side) = roster.get(id).map(|e| e.side()) else {
            return Vec::new();
        };
        self.order
            .iter()
            .copied()
            .filter(|other| roster.get(*other).is_some_and(|e| e.side() != side))
            .collect()
    }

    /// Standing allies of `id` (itself included), in initiative order.
    pub fn allies_of(&self, id: EntityId, roster: &Roster) -> Vec<EntityId> {
        let Some(side) = roster.get(id).map(|e| e.side()) else {
            return Vec::new();
        };
        self.order
            .iter()
            .copied()
            .filter(|other| roster.get(*other).is_some_and(|e| e.side() == side))
            .collect()
    }

    /// Resolves one action for the current actor.
    ///
    /// On `InvalidAction` nothing changes: the same actor is still up and the
    /// turn counter has not moved.
    pub fn submit(
        &mut self,
        actor: EntityId,
        action: Action,
        roster: &mut Roster,
    ) -> GameResult<Vec<CombatEvent>> {
        if self.is_over() {
            return Err(GameError::invalid_action(actor, "the fight is already over"));
        }
        match self.current_actor() {
            Some(current) if current == actor => {}
            _ => return Err(GameError::invalid_action(actor, "it is not your turn")),
        }

        let plan = self.validate(actor, action, roster)?;

        self.phase = Phase::Resolution;
        let mut events = Vec::new();
        let fled = self.resolve(actor, plan, roster, &mut events)?;

        if !fled && roster.is_active(actor) {
            self.tick_actor(actor, roster, &mut events);
        }

        self.turn += 1;
        if self.queue.front() == Some(&actor) {
            self.queue.pop_front();
        }

        let outcome = if fled {
            Outcome::Fled { by: actor }
        } else {
            self.side_outcome(roster)
        };

        if outcome.is_terminal() {
            self.phase = Phase::Terminal;
            self.outcome = outcome;
            self.queue.clear();
            events.push(CombatEvent::Ended { outcome });
            debug!(?outcome, rounds = self.round, turns = self.turn, "combat ended");
        } else {
            if self.queue.is_empty() {
                self.round += 1;
                self.queue = self.order.iter().copied().collect();
                events.push(CombatEvent::RoundStarted { round: self.round });
            }
            self.phase = Phase::ActionSelection;
        }

        self.events.extend(events.iter().cloned());
        Ok(events)
    }

    /// Lets the policy act for every AI participant until a human is up or
    /// the fight ends. A policy choosing an invalid action is a bug.
    pub fn run_ai_turns(
        &mut self,
        roster: &mut Roster,
        policy: &mut dyn CombatPolicy,
    ) -> GameResult<Vec<CombatEvent>> {
        let mut events = Vec::new();
        while let Some(actor) = self.current_actor() {
            if self.controller_of(actor) != Some(Controller::Ai) {
                break;
            }
            let action = policy.choose_action(actor, self, roster);
            events.extend(self.act_for(actor, action, roster)?);
        }
        Ok(events)
    }

    /// Resolves the whole fight with one policy playing every participant,
    /// humans included. Used for simulations and auto-battles.
    pub fn auto_resolve(
        &mut self,
        roster: &mut Roster,
        policy: &mut dyn CombatPolicy,
    ) -> GameResult<Outcome> {
        while let Some(actor) = self.current_actor() {
            let action = policy.choose_action(actor, self, roster);
            self.act_for(actor, action, roster)?;
        }
        Ok(self.outcome)
    }

    /// Consumes a finished session.
    pub fn finish(self) -> GameResult<CombatReport> {
        if !self.is_over() {
            return Err(GameError::InvariantViolation(
                "combat session finished before reaching a terminal state".into(),
            ));
        }
        Ok(CombatReport {
            outcome: self.outcome,
            rounds: self.round,
            turns: self.turn,
            participants: self.participants,
            defeated: self.defeated,
            events: self.events,
        })
    }

    fn act_for(
        &mut self,
        actor: EntityId,
        action: Action,
        roster: &mut Roster,
    ) -> GameResult<Vec<CombatEvent>> {
        self.submit(actor, action, roster).map_err(|e| match e {
            GameError::InvalidAction { actor, reason } => GameError::InvariantViolation(format!(
                "policy chose an invalid action for {}: {}",
                actor, reason
            )),
            other => other,
        })
    }

    fn validate(&self, actor: EntityId, action: Action, roster: &Roster) -> GameResult<Plan> {
        let me = roster.get(actor).filter(|e| e.is_active()).ok_or_else(|| {
            GameError::InvariantViolation(format!("{} is queued but cannot act", actor))
        })?;

        match action {
            Action::Attack { target } => {
                self.check_target(actor, target, me.side().opposing(), roster)?;
                Ok(Plan::Attack { target })
            }
            Action::Defend => Ok(Plan::Defend),
            Action::Flee => Ok(Plan::Flee),
            Action::UseItem { item, target } => {
                let effect = me.consumable_effect(item)?;
                let target = if effect.is_hostile() {
                    let target = target.ok_or_else(|| {
                        GameError::invalid_action(actor, "that item needs a target")
                    })?;
                    self.check_target(actor, target, me.side().opposing(), roster)?;
                    target
                } else {
                    let target = target.unwrap_or(actor);
                    self.check_target(actor, target, me.side(), roster)?;
                    target
                };
                Ok(Plan::UseItem {
                    item,
                    effect,
                    target,
                })
            }
        }
    }

    fn check_target(
        &self,
        actor: EntityId,
        target: EntityId,
        side: Side,
        roster: &Roster,
    ) -> GameResult<()> {
        let entity = roster
            .get(target)
            .filter(|_| self.is_participant(target))
            .ok_or_else(|| {
                GameError::invalid_action(actor, format!("{} is not in this fight", target))
            })?;
        if !entity.is_active() {
            return Err(GameError::invalid_action(
                actor,
                format!("{} is already defeated", entity.name()),
            ));
        }
        if entity.side() != side {
            let wanted = if roster.get(actor).is_some_and(|a| a.side() == side) {
                "an ally"
            } else {
                "an opponent"
            };
            return Err(GameError::invalid_action(
                actor,
                format!("{} is not {}", entity.name(), wanted),
            ));
        }
        Ok(())
    }

    /// Applies a plan. Returns true when the actor fled.
    fn resolve(
        &mut self,
        actor: EntityId,
        plan: Plan,
        roster: &mut Roster,
        events: &mut Vec<CombatEvent>,
    ) -> GameResult<bool> {
        match plan {
            Plan::Attack { target } => {
                let damage = match (roster.get(actor), roster.get(target)) {
                    (Some(a), Some(t)) => a.damage_against(t),
                    _ => 0,
                };
                let dealt = entity_mut(target, roster)?.take_damage(damage);
                events.push(CombatEvent::Attacked {
                    attacker: actor,
                    target,
                    damage: dealt,
                });
                self.note_if_defeated(target, roster, events);
            }
            Plan::Defend => {
                let me = entity_mut(actor, roster)?;
                let guard = me.base().defense.max(1);
                me.apply_effect(StatusEffect::new(
                    EffectKind::Guarded,
                    GUARD_DURATION_TURNS,
                    guard,
                ));
                events.push(CombatEvent::Defended { actor });
            }
            Plan::UseItem {
                item,
                effect,
                target,
            } => {
                let me = entity_mut(actor, roster)?;
                let item_name = me
                    .inventory()
                    .get(item)
                    .map(|i| i.name.clone())
                    .unwrap_or_default();
                me.consume(item)?;
                let receipt = entity_mut(target, roster)?.receive(effect)?;
                events.push(CombatEvent::ItemUsed {
                    actor,
                    item_name,
                    target,
                    receipt,
                });
                self.note_if_defeated(target, roster, events);
            }
            Plan::Flee => {
                let me = entity_mut(actor, roster)?;
                if me.effects().prevents_flee() {
                    events.push(CombatEvent::FleeBlocked { entity: actor });
                } else {
                    events.push(CombatEvent::Fled { entity: actor });
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    fn tick_actor(&mut self, actor: EntityId, roster: &mut Roster, events: &mut Vec<CombatEvent>) {
        let Some(me) = roster.get_mut(actor) else {
            return;
        };
        for tick in me.tick_effects() {
            events.push(match tick {
                EffectTick::Damaged { kind, amount } => CombatEvent::EffectDamage {
                    target: actor,
                    kind,
                    amount,
                },
                EffectTick::Healed { kind, amount } => CombatEvent::EffectHeal {
                    target: actor,
                    kind,
                    amount,
                },
                EffectTick::Expired { kind } => CombatEvent::EffectExpired {
                    target: actor,
                    kind,
                },
            });
        }
        self.note_if_defeated(actor, roster, events);
    }

    /// Drops a freshly defeated entity out of the turn order at once.
    fn note_if_defeated(
        &mut self,
        id: EntityId,
        roster: &Roster,
        events: &mut Vec<CombatEvent>,
    ) {
        let down = roster.get(id).is_some_and(|e| e.is_defeated());
        if down && !self.defeated.contains(&id) {
            self.defeated.push(id);
            self.order.retain(|other| *other != id);
            self.queue.retain(|other| *other != id);
            events.push(CombatEvent::Defeated { entity: id });
        }
    }

    fn side_outcome(&self, roster: &Roster) -> Outcome {
        let standing = |side: Side| {
            self.participants.iter().any(|p| {
                roster
                    .get(p.id)
                    .is_some_and(|e| e.is_active() && e.side() == side)
            })
        };
        match (standing(Side::Party), standing(Side::Hostile)) {
            (true, true) => Outcome::Pending,
            (true, false) => Outcome::Victory,
            (false, _) => Outcome::Defeat,
        }
    }

    fn begin_round(&mut self) {
        self.round += 1;
        self.queue = self.order.iter().copied().collect();
        self.events.push(CombatEvent::RoundStarted { round: self.round });
    }
}

fn entity_mut(id: EntityId, roster: &mut Roster) -> GameResult<&mut Entity> {
    roster.get_mut(id).ok_or_else(|| {
        GameError::InvariantViolation(format!("{} vanished from the roster mid-fight", id))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::policy::AggressivePolicy;
    use crate::entity::{BaseStats, EffectReceipt, EnemyKind, EntityKind};
    use crate::items::{fire_bomb, healing_potion, Quality};

    // =========================================================================
    // Test Helpers
    // =========================================================================

    fn fighter(id: u64, side: Side, health: u32, attack: u32, defense: u32, speed: u32) -> Entity {
        let kind = match side {
            Side::Party => EntityKind::Player,
            Side::Hostile => EntityKind::Enemy(EnemyKind::Goblin),
        };
        Entity::new(
            EntityId(id),
            format!("F{}", id),
            kind,
            side,
            BaseStats {
                max_health: health,
                max_stamina: 10,
                attack,
                defense,
                speed,
            },
        )
    }

    fn roster_of(entities: Vec<Entity>) -> Roster {
        entities.into_iter().collect()
    }

    fn duel() -> (Roster, CombatSession) {
        let roster = roster_of(vec![
            fighter(1, Side::Party, 10, 5, 0, 10),
            fighter(2, Side::Hostile, 10, 3, 1, 5),
        ]);
        let session = CombatSession::start(
            vec![Participant::human(EntityId(1)), Participant::ai(EntityId(2))],
            &roster,
        )
        .unwrap();
        (roster, session)
    }

    fn attack(target: u64) -> Action {
        Action::Attack {
            target: EntityId(target),
        }
    }

    // =========================================================================
    // Initiative
    // =========================================================================

    #[test]
    fn test_initiative_sorts_by_speed_then_registration() {
        let roster = roster_of(vec![
            fighter(1, Side::Party, 10, 1, 0, 5),
            fighter(2, Side::Hostile, 10, 1, 0, 9),
            fighter(3, Side::Hostile, 10, 1, 0, 5),
            fighter(4, Side::Hostile, 10, 1, 0, 7),
        ]);
        let ids = [EntityId(3), EntityId(1), EntityId(2), EntityId(4)];
        assert_eq!(
            initiative_order(&ids, &roster),
            vec![EntityId(2), EntityId(4), EntityId(3), EntityId(1)]
        );
    }

    #[test]
    fn test_initiative_skips_defeated() {
        let mut down = fighter(2, Side::Hostile, 10, 1, 0, 9);
        down.set_health(0);
        let roster = roster_of(vec![fighter(1, Side::Party, 10, 1, 0, 5), down]);
        assert_eq!(
            initiative_order(&[EntityId(1), EntityId(2)], &roster),
            vec![EntityId(1)]
        );
    }

    // =========================================================================
    // Starting a session
    // =========================================================================

    #[test]
    fn test_start_opens_round_one() {
        let (_, session) = duel();
        assert_eq!(session.phase(), Phase::ActionSelection);
        assert_eq!(session.round(), 1);
        assert_eq!(session.turn(), 0);
        assert_eq!(session.current_actor(), Some(EntityId(1)));
        assert_eq!(session.events(), &[CombatEvent::RoundStarted { round: 1 }]);
    }

    #[test]
    fn test_start_rejects_bad_participant_lists() {
        let roster = roster_of(vec![
            fighter(1, Side::Party, 10, 5, 0, 10),
            fighter(2, Side::Party, 10, 5, 0, 10),
        ]);

        let alone = CombatSession::start(vec![Participant::human(EntityId(1))], &roster);
        assert!(matches!(alone, Err(GameError::InvariantViolation(_))));

        let same_side = CombatSession::start(
            vec![Participant::human(EntityId(1)), Participant::ai(EntityId(2))],
            &roster,
        );
        assert!(matches!(same_side, Err(GameError::InvariantViolation(_))));

        let twice = CombatSession::start(
            vec![Participant::human(EntityId(1)), Participant::ai(EntityId(1))],
            &roster,
        );
        assert!(matches!(twice, Err(GameError::InvariantViolation(_))));

        let unknown = CombatSession::start(
            vec![Participant::human(EntityId(1)), Participant::ai(EntityId(9))],
            &roster,
        );
        assert!(matches!(unknown, Err(GameError::InvariantViolation(_))));
    }

    // =========================================================================
    // Submitting actions
    // =========================================================================

    #[test]
    fn test_attack_applies_formula_and_advances() {
        let (mut roster, mut session) = duel();
        let events = session.submit(EntityId(1), attack(2), &mut roster).unwrap();
        assert!(events.contains(&CombatEvent::Attacked {
            attacker: EntityId(1),
            target: EntityId(2),
            damage: 4,
        }));
        assert_eq!(roster.get(EntityId(2)).unwrap().health(), 6);
        assert_eq!(session.turn(), 1);
        assert_eq!(session.current_actor(), Some(EntityId(2)));
    }

    #[test]
    fn test_out_of_turn_action_is_rejected() {
        let (mut roster, mut session) = duel();
        let err = session.submit(EntityId(2), attack(1), &mut roster).unwrap_err();
        assert!(matches!(err, GameError::InvalidAction { .. }));
        assert_eq!(session.turn(), 0);
        assert_eq!(roster.get(EntityId(1)).unwrap().health(), 10);
    }

    #[test]
    fn test_invalid_target_leaves_state_untouched() {
        let (mut roster, mut session) = duel();

        let err = session.submit(EntityId(1), attack(1), &mut roster).unwrap_err();
        assert!(matches!(err, GameError::InvalidAction { .. }));
        let err = session.submit(EntityId(1), attack(42), &mut roster).unwrap_err();
        assert!(matches!(err, GameError::InvalidAction { .. }));

        assert_eq!(session.turn(), 0);
        assert_eq!(session.current_actor(), Some(EntityId(1)));
        assert_eq!(roster.get(EntityId(1)).unwrap().health(), 10);
        assert_eq!(roster.get(EntityId(2)).unwrap().health(), 10);
    }

    #[test]
    fn test_round_rolls_over_after_everyone_acts() {
        let (mut roster, mut session) = duel();
        session.submit(EntityId(1), attack(2), &mut roster).unwrap();
        let events = session.submit(EntityId(2), attack(1), &mut roster).unwrap();
        assert!(events.contains(&CombatEvent::RoundStarted { round: 2 }));
        assert_eq!(session.round(), 2);
        assert_eq!(session.current_actor(), Some(EntityId(1)));
    }

    #[test]
    fn test_defeated_combatant_loses_its_turn_this_round() {
        let mut roster = roster_of(vec![
            fighter(1, Side::Party, 10, 50, 0, 10),
            fighter(2, Side::Hostile, 10, 3, 0, 5),
            fighter(3, Side::Hostile, 10, 3, 0, 1),
        ]);
        let mut session = CombatSession::start(
            vec![
                Participant::human(EntityId(1)),
                Participant::ai(EntityId(2)),
                Participant::ai(EntityId(3)),
            ],
            &roster,
        )
        .unwrap();

        let events = session.submit(EntityId(1), attack(2), &mut roster).unwrap();
        assert!(events.contains(&CombatEvent::Defeated { entity: EntityId(2) }));
        assert_eq!(session.current_actor(), Some(EntityId(3)));
        assert_eq!(session.order(), &[EntityId(1), EntityId(3)]);
        assert_eq!(session.defeated(), &[EntityId(2)]);
        assert_eq!(
            session.remaining_this_round().collect::<Vec<_>>(),
            vec![EntityId(3)]
        );
        assert_eq!(session.opponents_of(EntityId(1), &roster), vec![EntityId(3)]);
        assert_eq!(session.allies_of(EntityId(3), &roster), vec![EntityId(3)]);
    }

    #[test]
    fn test_victory_is_terminal() {
        let mut roster = roster_of(vec![
            fighter(1, Side::Party, 10, 50, 0, 10),
            fighter(2, Side::Hostile, 10, 3, 0, 5),
        ]);
        let mut session = CombatSession::start(
            vec![Participant::human(EntityId(1)), Participant::ai(EntityId(2))],
            &roster,
        )
        .unwrap();

        let events = session.submit(EntityId(1), attack(2), &mut roster).unwrap();
        assert_eq!(
            events.last(),
            Some(&CombatEvent::Ended {
                outcome: Outcome::Victory
            })
        );
        assert!(session.is_over());
        assert_eq!(session.current_actor(), None);

        let err = session.submit(EntityId(1), Action::Defend, &mut roster).unwrap_err();
        assert!(matches!(err, GameError::InvalidAction { .. }));

        let report = session.finish().unwrap();
        assert_eq!(report.outcome, Outcome::Victory);
        assert_eq!(report.rounds, 1);
        assert_eq!(report.turns, 1);
    }

    #[test]
    fn test_finish_before_end_is_an_error() {
        let (_, session) = duel();
        assert!(matches!(
            session.finish(),
            Err(GameError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_defend_raises_defense_until_next_turn() {
        let (mut roster, mut session) = duel();
        session.submit(EntityId(1), Action::Defend, &mut roster).unwrap();
        assert!(roster.get(EntityId(1)).unwrap().effects().has(EffectKind::Guarded));

        // Guard of 1 takes the goblin's 3 down to 2.
        let events = session.submit(EntityId(2), attack(1), &mut roster).unwrap();
        assert!(events.contains(&CombatEvent::Attacked {
            attacker: EntityId(2),
            target: EntityId(1),
            damage: 2,
        }));

        session.submit(EntityId(1), attack(2), &mut roster).unwrap();
        assert!(!roster.get(EntityId(1)).unwrap().effects().has(EffectKind::Guarded));
    }

    #[test]
    fn test_flee_ends_the_fight() {
        let (mut roster, mut session) = duel();
        session.submit(EntityId(1), Action::Flee, &mut roster).unwrap();
        assert_eq!(session.outcome(), Outcome::Fled { by: EntityId(1) });
        assert!(session.is_over());
    }

    #[test]
    fn test_snared_flee_wastes_the_turn() {
        let (mut roster, mut session) = duel();
        roster
            .get_mut(EntityId(1))
            .unwrap()
            .apply_effect(StatusEffect::new(EffectKind::Snared, 3, 0));

        let events = session.submit(EntityId(1), Action::Flee, &mut roster).unwrap();
        assert!(events.contains(&CombatEvent::FleeBlocked { entity: EntityId(1) }));
        assert!(!session.is_over());
        assert_eq!(session.current_actor(), Some(EntityId(2)));
    }

    #[test]
    fn test_use_item_heals_self_by_default() {
        let (mut roster, mut session) = duel();
        let hero = roster.get_mut(EntityId(1)).unwrap();
        hero.take_damage(8);
        let potion = hero.add_item(healing_potion(ItemId(1), Quality::Rusted));

        let events = session
            .submit(
                EntityId(1),
                Action::UseItem {
                    item: potion,
                    target: None,
                },
                &mut roster,
            )
            .unwrap();
        assert!(matches!(
            events[0],
            CombatEvent::ItemUsed {
                receipt: EffectReceipt::Healed(8),
                ..
            }
        ));
        let hero = roster.get(EntityId(1)).unwrap();
        assert_eq!(hero.health(), 10);
        assert!(hero.inventory().is_empty());
    }

    #[test]
    fn test_hostile_item_needs_an_opponent() {
        let (mut roster, mut session) = duel();
        let bomb = roster
            .get_mut(EntityId(1))
            .unwrap()
            .add_item(fire_bomb(ItemId(1), Quality::Worn));

        let untargeted = Action::UseItem {
            item: bomb,
            target: None,
        };
        assert!(session.submit(EntityId(1), untargeted, &mut roster).is_err());

        let at_self = Action::UseItem {
            item: bomb,
            target: Some(EntityId(1)),
        };
        assert!(session.submit(EntityId(1), at_self, &mut roster).is_err());
        assert_eq!(session.turn(), 0);

        let at_enemy = Action::UseItem {
            item: bomb,
            target: Some(EntityId(2)),
        };
        session.submit(EntityId(1), at_enemy, &mut roster).unwrap();
        assert!(roster.get(EntityId(2)).unwrap().health() < 10);
        assert!(roster.get(EntityId(1)).unwrap().inventory().is_empty());
    }

    #[test]
    fn test_unknown_item_is_rejected() {
        let (mut roster, mut session) = duel();
        let action = Action::UseItem {
            item: ItemId(77),
            target: None,
        };
        let err = session.submit(EntityId(1), action, &mut roster).unwrap_err();
        assert!(matches!(err, GameError::InvalidAction { .. }));
    }

    #[test]
    fn test_poison_ticks_at_end_of_own_turn() {
        let (mut roster, mut session) = duel();
        roster
            .get_mut(EntityId(1))
            .unwrap()
            .apply_effect(StatusEffect::new(EffectKind::Poison, 1, 2));

        let events = session.submit(EntityId(1), Action::Defend, &mut roster).unwrap();
        assert!(events.contains(&CombatEvent::EffectDamage {
            target: EntityId(1),
            kind: EffectKind::Poison,
            amount: 2,
        }));
        assert!(events.contains(&CombatEvent::EffectExpired {
            target: EntityId(1),
            kind: EffectKind::Poison,
        }));
        assert_eq!(roster.get(EntityId(1)).unwrap().health(), 8);
    }

    // =========================================================================
    // AI turns
    // =========================================================================

    #[test]
    fn test_ai_turns_stop_at_the_human() {
        let (mut roster, mut session) = duel();
        session.submit(EntityId(1), attack(2), &mut roster).unwrap();

        let events = session
            .run_ai_turns(&mut roster, &mut AggressivePolicy)
            .unwrap();
        assert!(events.contains(&CombatEvent::Attacked {
            attacker: EntityId(2),
            target: EntityId(1),
            damage: 3,
        }));
        assert_eq!(session.current_actor(), Some(EntityId(1)));
    }

    #[test]
    fn test_auto_resolve_reaches_an_outcome() {
        let (mut roster, mut session) = duel();
        let outcome = session
            .auto_resolve(&mut roster, &mut AggressivePolicy)
            .unwrap();
        assert_eq!(outcome, Outcome::Victory);
        assert_eq!(session.round(), 3);
    }
}
