//! Decision making for AI-controlled combatants.

use super::logic::CombatSession;
use super::types::Action;
use crate::core::constants::AI_HEAL_THRESHOLD;
use crate::entity::{Entity, EntityId, Roster};
use crate::items::ItemEffect;

/// Picks an action for `actor` given a read-only view of the fight.
///
/// Implementations must only return actions the session would accept.
pub trait CombatPolicy {
    fn choose_action(&mut self, actor: EntityId, session: &CombatSession, roster: &Roster)
        -> Action;
}

/// Heals when badly hurt, otherwise hits the weakest opponent it can hurt.
/// With nothing to hurt it throws a bomb if it has one, then tries to run.
#[derive(Debug, Clone, Copy, Default)]
pub struct AggressivePolicy;

impl CombatPolicy for AggressivePolicy {
    fn choose_action(
        &mut self,
        actor: EntityId,
        session: &CombatSession,
        roster: &Roster,
    ) -> Action {
        let Some(me) = roster.get(actor) else {
            return Action::Defend;
        };

        if is_badly_hurt(me) {
            if let Some(item) = first_item(me, |e| matches!(e, ItemEffect::Heal(_))) {
                return Action::UseItem { item, target: None };
            }
        }

        let opponents: Vec<&Entity> = session
            .opponents_of(actor, roster)
            .into_iter()
            .filter_map(|id| roster.get(id))
            .collect();

        let weakest = opponents
            .iter()
            .filter(|target| me.damage_against(target) > 0)
            .min_by_key(|target| target.health());
        if let Some(target) = weakest {
            return Action::Attack {
                target: target.id(),
            };
        }

        if let (Some(item), Some(target)) = (
            first_item(me, |e| matches!(e, ItemEffect::Damage(_))),
            opponents.first(),
        ) {
            return Action::UseItem {
                item,
                target: Some(target.id()),
            };
        }

        if me.effects().prevents_flee() {
            Action::Defend
        } else {
            Action::Flee
        }
    }
}

/// Always swings at the first standing opponent. Handy for scripted fights.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttackOnlyPolicy;

impl CombatPolicy for AttackOnlyPolicy {
    fn choose_action(
        &mut self,
        actor: EntityId,
        session: &CombatSession,
        roster: &Roster,
    ) -> Action {
        match session.opponents_of(actor, roster).first() {
            Some(target) => Action::Attack { target: *target },
            None => Action::Defend,
        }
    }
}

fn is_badly_hurt(entity: &Entity) -> bool {
    let (num, den) = AI_HEAL_THRESHOLD;
    entity.health() < entity.max_health()
        && u64::from(entity.health()) * u64::from(den) <= u64::from(entity.max_health()) * u64::from(num)
}

fn first_item(
    entity: &Entity,
    wanted: impl Fn(&ItemEffect) -> bool,
) -> Option<crate::items::ItemId> {
    entity
        .inventory()
        .items()
        .iter()
        .find(|item| item.is_consumable() && wanted(&item.effect))
        .map(|item| item.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::types::Participant;
    use crate::entity::{BaseStats, EffectKind, EnemyKind, EntityKind, Side, StatusEffect};
    use crate::items::{fire_bomb, healing_potion, ItemId, Quality};

    fn fighter(id: u64, side: Side, health: u32, attack: u32, defense: u32) -> Entity {
        let kind = match side {
            Side::Party => EntityKind::Player,
            Side::Hostile => EntityKind::Enemy(EnemyKind::Orc),
        };
        Entity::new(
            EntityId(id),
            format!("F{}", id),
            kind,
            side,
            BaseStats {
                max_health: health,
                max_stamina: 5,
                attack,
                defense,
                speed: 20 - id as u32,
            },
        )
    }

    fn session_for(roster: &Roster) -> CombatSession {
        let participants = roster
            .iter()
            .map(|e| match e.side() {
                Side::Party => Participant::human(e.id()),
                Side::Hostile => Participant::ai(e.id()),
            })
            .collect();
        CombatSession::start(participants, roster).unwrap()
    }

    #[test]
    fn test_targets_weakest_opponent() {
        let mut roster: Roster = vec![
            fighter(1, Side::Hostile, 30, 8, 0),
            fighter(2, Side::Party, 30, 5, 0),
            fighter(3, Side::Party, 30, 5, 0),
        ]
        .into_iter()
        .collect();
        roster.get_mut(EntityId(3)).unwrap().take_damage(10);
        let session = session_for(&roster);

        let action = AggressivePolicy.choose_action(EntityId(1), &session, &roster);
        assert_eq!(action, Action::Attack { target: EntityId(3) });
    }

    #[test]
    fn test_ties_go_to_initiative_order() {
        let roster: Roster = vec![
            fighter(1, Side::Hostile, 30, 8, 0),
            fighter(2, Side::Party, 30, 5, 0),
            fighter(3, Side::Party, 30, 5, 0),
        ]
        .into_iter()
        .collect();
        let session = session_for(&roster);
        let action = AggressivePolicy.choose_action(EntityId(1), &session, &roster);
        assert_eq!(action, Action::Attack { target: EntityId(2) });
    }

    #[test]
    fn test_heals_when_badly_hurt() {
        let mut roster: Roster = vec![
            fighter(1, Side::Hostile, 30, 8, 0),
            fighter(2, Side::Party, 30, 5, 0),
        ]
        .into_iter()
        .collect();
        let orc = roster.get_mut(EntityId(1)).unwrap();
        orc.take_damage(25);
        let potion = orc.add_item(healing_potion(ItemId(9), Quality::Worn));
        let session = session_for(&roster);

        let action = AggressivePolicy.choose_action(EntityId(1), &session, &roster);
        assert_eq!(
            action,
            Action::UseItem {
                item: potion,
                target: None
            }
        );
    }

    #[test]
    fn test_throws_bomb_when_blows_cannot_land() {
        let mut roster: Roster = vec![
            fighter(1, Side::Hostile, 30, 2, 0),
            fighter(2, Side::Party, 30, 5, 9),
        ]
        .into_iter()
        .collect();
        let bomb = roster
            .get_mut(EntityId(1))
            .unwrap()
            .add_item(fire_bomb(ItemId(4), Quality::Rusted));
        let session = session_for(&roster);

        let action = AggressivePolicy.choose_action(EntityId(1), &session, &roster);
        assert_eq!(
            action,
            Action::UseItem {
                item: bomb,
                target: Some(EntityId(2))
            }
        );
    }

    #[test]
    fn test_flees_from_hopeless_fight_unless_snared() {
        let mut roster: Roster = vec![
            fighter(1, Side::Hostile, 30, 2, 0),
            fighter(2, Side::Party, 30, 5, 9),
        ]
        .into_iter()
        .collect();
        let session = session_for(&roster);
        assert_eq!(
            AggressivePolicy.choose_action(EntityId(1), &session, &roster),
            Action::Flee
        );

        roster
            .get_mut(EntityId(1))
            .unwrap()
            .apply_effect(StatusEffect::new(EffectKind::Snared, 2, 0));
        assert_eq!(
            AggressivePolicy.choose_action(EntityId(1), &session, &roster),
            Action::Defend
        );
    }

    #[test]
    fn test_attack_only_picks_first_opponent() {
        let roster: Roster = vec![
            fighter(1, Side::Party, 30, 2, 0),
            fighter(2, Side::Hostile, 30, 5, 9),
        ]
        .into_iter()
        .collect();
        let session = session_for(&roster);
        assert_eq!(
            AttackOnlyPolicy.choose_action(EntityId(1), &session, &roster),
            Action::Attack { target: EntityId(2) }
        );
    }
}
