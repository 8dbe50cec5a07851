use crate::core::error::{GameError, GameResult};
use crate::entity::{Entity, EntityId, Roster, Side};
use crate::items::ItemId;
use crate::world::shops::Shop;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocationId(pub u32);

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "loc#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::South => "south",
            Direction::East => "east",
            Direction::West => "west",
        }
    }

    pub fn opposite(&self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationKind {
    Town { shops: Vec<Shop> },
    Wilds,
    /// A dungeon entrance with `floors` levels below it.
    Dungeon { floors: u32 },
}

impl LocationKind {
    pub fn name(&self) -> &'static str {
        match self {
            LocationKind::Town { .. } => "town",
            LocationKind::Wilds => "wilds",
            LocationKind::Dungeon { .. } => "dungeon",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub kind: LocationKind,
    /// Base danger at ground level. Dungeon floors add their depth.
    pub danger: u32,
    pub exits: Vec<(Direction, LocationId)>,
}

impl Location {
    pub fn exit(&self, direction: Direction) -> Option<LocationId> {
        self.exits
            .iter()
            .find(|(d, _)| *d == direction)
            .map(|(_, to)| *to)
    }

    pub fn is_town(&self) -> bool {
        matches!(self.kind, LocationKind::Town { .. })
    }

    pub fn floors(&self) -> u32 {
        match &self.kind {
            LocationKind::Dungeon { floors } => *floors,
            _ => 0,
        }
    }

    /// Shops in a town; empty everywhere else.
    pub fn shops(&self) -> &[Shop] {
        match &self.kind {
            LocationKind::Town { shops } => shops,
            _ => &[],
        }
    }
}

/// Where the player stands. Floor 0 is ground level; dungeon floors count
/// down from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub location: LocationId,
    pub floor: u32,
}

impl Position {
    pub fn surface(location: LocationId) -> Self {
        Self { location, floor: 0 }
    }

    pub fn is_underground(&self) -> bool {
        self.floor > 0
    }
}

/// Everything that gets saved: the map, the roster and where the player is.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldState {
    pub seed: u64,
    /// Exploration commands taken so far. Drives encounter rolls.
    pub steps: u64,
    pub player: EntityId,
    pub roster: Roster,
    pub locations: BTreeMap<LocationId, Location>,
    pub position: Position,
    /// (dungeon, floor) pairs whose chest is already open.
    pub opened_chests: BTreeSet<(LocationId, u32)>,
    next_entity: u64,
    next_item: u64,
}

impl WorldState {
    pub fn new(
        seed: u64,
        player: EntityId,
        roster: Roster,
        locations: BTreeMap<LocationId, Location>,
        position: Position,
    ) -> Self {
        let mut world = Self {
            seed,
            steps: 0,
            player,
            roster,
            locations,
            position,
            opened_chests: BTreeSet::new(),
            next_entity: 0,
            next_item: 0,
        };
        world.next_entity = world.max_entity_id().map_or(1, |id| id + 1);
        world.next_item = world.max_item_id().map_or(1, |id| id + 1);
        world
    }

    /// Rebuilds a stored world with its id counters. Fails when the result
    /// would break an invariant.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn restore(
        seed: u64,
        steps: u64,
        player: EntityId,
        roster: Roster,
        locations: BTreeMap<LocationId, Location>,
        position: Position,
        opened_chests: BTreeSet<(LocationId, u32)>,
        next_entity: u64,
        next_item: u64,
    ) -> Result<Self, String> {
        let world = Self {
            seed,
            steps,
            player,
            roster,
            locations,
            position,
            opened_chests,
            next_entity,
            next_item,
        };
        world.check_invariants()?;
        Ok(world)
    }

    pub fn next_entity_id(&self) -> u64 {
        self.next_entity
    }

    pub fn next_item_id(&self) -> u64 {
        self.next_item
    }

    pub fn allocate_entity_id(&mut self) -> EntityId {
        let id = EntityId(self.next_entity);
        self.next_entity += 1;
        id
    }

    pub fn allocate_item_id(&mut self) -> ItemId {
        let id = ItemId(self.next_item);
        self.next_item += 1;
        id
    }

    pub fn location(&self, id: LocationId) -> Option<&Location> {
        self.locations.get(&id)
    }

    pub fn current_location(&self) -> GameResult<&Location> {
        self.location(self.position.location).ok_or_else(|| {
            GameError::InvariantViolation(format!(
                "player stands in unknown location {}",
                self.position.location
            ))
        })
    }

    pub fn player(&self) -> GameResult<&Entity> {
        self.roster.get(self.player).ok_or_else(|| {
            GameError::InvariantViolation(format!("player {} missing from roster", self.player))
        })
    }

    pub fn player_mut(&mut self) -> GameResult<&mut Entity> {
        let id = self.player;
        self.roster.get_mut(id).ok_or_else(|| {
            GameError::InvariantViolation(format!("player {} missing from roster", id))
        })
    }

    /// Danger where the player stands: location danger plus dungeon depth.
    pub fn danger_here(&self) -> u32 {
        self.location(self.position.location)
            .map_or(0, |loc| loc.danger)
            .saturating_add(self.position.floor)
    }

    /// True when the current dungeon floor still has its chest.
    pub fn chest_here(&self) -> bool {
        self.position.is_underground()
            && !self
                .opened_chests
                .contains(&(self.position.location, self.position.floor))
    }

    /// Checks the cross-references a loaded world relies on.
    pub fn check_invariants(&self) -> Result<(), String> {
        let player = self
            .roster
            .get(self.player)
            .ok_or_else(|| format!("player {} is not in the roster", self.player))?;
        if !player.is_player() || player.side() != Side::Party {
            return Err(format!("{} is not a player character", self.player));
        }

        let here = self
            .locations
            .get(&self.position.location)
            .ok_or_else(|| format!("position points at unknown {}", self.position.location))?;
        if self.position.floor > here.floors() {
            return Err(format!(
                "floor {} is below the bottom of {}",
                self.position.floor, here.name
            ));
        }

        for location in self.locations.values() {
            for (direction, to) in &location.exits {
                if !self.locations.contains_key(to) {
                    return Err(format!(
                        "{} leads {} to unknown {}",
                        location.name,
                        direction.name(),
                        to
                    ));
                }
            }
        }

        for (dungeon, floor) in &self.opened_chests {
            let valid = self
                .locations
                .get(dungeon)
                .is_some_and(|loc| *floor >= 1 && *floor <= loc.floors());
            if !valid {
                return Err(format!("opened chest at {} floor {} does not exist", dungeon, floor));
            }
        }

        if self.max_entity_id().is_some_and(|max| max >= self.next_entity) {
            return Err("entity id counter is behind the roster".to_string());
        }
        if self.max_item_id().is_some_and(|max| max >= self.next_item) {
            return Err("item id counter is behind the inventories and shops".to_string());
        }
        Ok(())
    }

    fn max_entity_id(&self) -> Option<u64> {
        self.roster.ids().map(|id| id.0).max()
    }

    /// Highest item id held by anyone, shop shelves included.
    fn max_item_id(&self) -> Option<u64> {
        let carried = self
            .roster
            .iter()
            .flat_map(|e| e.inventory().items().iter().map(|i| i.id.0));
        let shelved = self
            .locations
            .values()
            .flat_map(|l| l.shops().iter().flat_map(|s| s.wares.iter().map(|i| i.id.0)));
        carried.chain(shelved).max()
    }
}
