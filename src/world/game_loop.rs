//! The exploration loop: one [`Command`] in, state mutated, a [`GameView`]
//! out.

use crate::combat::{
    Action, AggressivePolicy, CombatEvent, CombatPolicy, CombatReport, CombatSession, Outcome,
    Participant,
};
use crate::core::config::GameConfig;
use crate::core::constants::COMBAT_LOG_CAPACITY;
use crate::core::error::{GameError, GameResult};
use crate::entity::{Entity, EntityId, Side};
use crate::items::{random_loot, Item, ItemId};
use crate::persistence::SaveManager;
use crate::world::encounter::EncounterPolicy;
use crate::world::generation::{generate_world, spawn_encounter};
use crate::world::names::NameGenerator;
use crate::world::shops::Shop;
use crate::world::types::{Direction, LocationKind, WorldState};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::VecDeque;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Move(Direction),
    Descend,
    Ascend,
    /// Opens the chest on the current dungeon floor.
    Search,
    /// Full recovery. Towns only.
    Rest,
    /// Steps into the town shop at this index to look over the keeper's wares.
    VisitShop(usize),
    LeaveShop,
    UseItem(ItemId),
    Equip(ItemId),
    Combat(Action),
    Save,
    /// Starts over after a game over.
    NewGame,
    Quit,
}

#[derive(Debug)]
pub enum Mode {
    Exploring,
    /// Browsing the town shop at this index.
    Shopping(usize),
    InCombat(CombatSession),
    GameOver,
}

/// Read-only summary of an entity for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySummary {
    pub id: EntityId,
    pub name: String,
    pub health: u32,
    pub max_health: u32,
    pub stamina: u32,
    pub max_stamina: u32,
    pub attack: u32,
    pub defense: u32,
    pub effects: Vec<String>,
    pub defeated: bool,
}

impl EntitySummary {
    fn of(entity: &Entity) -> Self {
        Self {
            id: entity.id(),
            name: entity.name().to_string(),
            health: entity.health(),
            max_health: entity.max_health(),
            stamina: entity.stamina(),
            max_stamina: entity.max_stamina(),
            attack: entity.effective_attack(),
            defense: entity.effective_defense(),
            effects: entity
                .effects()
                .iter()
                .map(|e| format!("{} ({})", e.kind.name(), e.remaining))
                .collect(),
            defeated: entity.is_defeated(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSummary {
    pub id: ItemId,
    pub label: String,
    pub equipped: bool,
    pub consumable: bool,
    /// Meant to be thrown at an opponent.
    pub hostile: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Exploring,
    Shopping,
    InCombat { round: u32, your_turn: bool },
    GameOver,
}

/// The shop the player is standing in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopView {
    pub name: String,
    pub kind: &'static str,
    pub owner: String,
    pub patrons: Vec<String>,
    pub wares: Vec<String>,
}

/// Everything the presentation layer needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameView {
    pub mode: ViewMode,
    pub slot: String,
    pub location: String,
    pub location_kind: &'static str,
    pub floor: u32,
    pub floors: u32,
    pub danger: u32,
    pub exits: Vec<(Direction, String)>,
    pub chest_here: bool,
    /// Shop names in this town, in visiting order.
    pub shops: Vec<String>,
    pub shop: Option<ShopView>,
    pub steps: u64,
    pub player: EntitySummary,
    pub inventory: Vec<ItemSummary>,
    pub opponents: Vec<EntitySummary>,
    pub log: Vec<String>,
    pub commands: Vec<&'static str>,
}

pub struct Game {
    world: WorldState,
    mode: Mode,
    log: VecDeque<String>,
    config: GameConfig,
    slot: String,
    encounters: Box<dyn EncounterPolicy>,
    names: Box<dyn NameGenerator>,
    ai: Box<dyn CombatPolicy>,
    saves: Option<SaveManager>,
    rng: StdRng,
    quit: bool,
}

impl Game {
    /// Generates a fresh world for `config.default_slot`.
    pub fn new_game(config: &GameConfig, mut names: Box<dyn NameGenerator>) -> GameResult<Self> {
        let seed = config.seed.unwrap_or_else(rand::random);
        let world = generate_world(seed, &config.hero_name, names.as_mut())?;
        info!(seed, slot = %config.default_slot, "new game");
        let mut game = Self::from_world(world, config, names);
        game.push_log(format!(
            "{} sets out from {}.",
            config.hero_name,
            game.location_name()
        ));
        Ok(game)
    }

    /// Loads `slot` from the configured save directory.
    pub fn load(
        config: &GameConfig,
        slot: &str,
        names: Box<dyn NameGenerator>,
    ) -> GameResult<Self> {
        let saves = SaveManager::from_config(config);
        let world = saves.load(slot)?;
        let mut game = Self::from_world(world, config, names).with_slot(slot);
        game.push_log(format!("Resumed at {}.", game.location_name()));
        Ok(game)
    }

    /// Wraps an existing world. A world whose player is already defeated
    /// starts in game over.
    pub fn from_world(
        world: WorldState,
        config: &GameConfig,
        names: Box<dyn NameGenerator>,
    ) -> Self {
        let mode = if world.player().is_ok_and(Entity::is_defeated) {
            Mode::GameOver
        } else {
            Mode::Exploring
        };
        Self {
            encounters: config.encounter_policy(world.seed),
            rng: StdRng::seed_from_u64(world.seed.wrapping_add(world.steps)),
            world,
            mode,
            log: VecDeque::with_capacity(COMBAT_LOG_CAPACITY),
            config: config.clone(),
            slot: config.default_slot.clone(),
            names,
            ai: Box::new(AggressivePolicy),
            saves: Some(SaveManager::from_config(config)),
            quit: false,
        }
    }

    pub fn with_slot(mut self, slot: &str) -> Self {
        self.slot = slot.to_string();
        self
    }

    pub fn with_encounters(mut self, encounters: Box<dyn EncounterPolicy>) -> Self {
        self.encounters = encounters;
        self
    }

    pub fn with_ai(mut self, ai: Box<dyn CombatPolicy>) -> Self {
        self.ai = ai;
        self
    }

    /// Keeps everything in memory. Checkpoints become no-ops.
    pub fn without_saves(mut self) -> Self {
        self.saves = None;
        self
    }

    pub fn world(&self) -> &WorldState {
        &self.world
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn slot(&self) -> &str {
        &self.slot
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn log(&self) -> impl Iterator<Item = &str> {
        self.log.iter().map(String::as_str)
    }

    /// Applies one command. Recoverable errors leave the game untouched.
    pub fn handle(&mut self, command: Command) -> GameResult<()> {
        let actor = self.world.player;
        match command {
            Command::Quit => {
                self.quit = true;
                return Ok(());
            }
            Command::NewGame => {
                if !matches!(self.mode, Mode::GameOver) {
                    return Err(GameError::invalid_action(actor, "you are still alive"));
                }
                return self.restart();
            }
            Command::Combat(action) => return self.combat_turn(action),
            Command::LeaveShop => return self.leave_shop(),
            _ => {}
        }

        match self.mode {
            Mode::Exploring => {}
            Mode::Shopping(_) => {
                return Err(GameError::invalid_action(actor, "step out of the shop first"))
            }
            Mode::InCombat(_) => {
                return Err(GameError::invalid_action(actor, "finish the fight first"))
            }
            Mode::GameOver => return Err(GameError::invalid_action(actor, "your journey is over")),
        }

        match command {
            Command::Move(direction) => self.travel(direction),
            Command::Descend => self.descend(),
            Command::Ascend => self.ascend(),
            Command::Search => self.search(),
            Command::Rest => self.rest(),
            Command::VisitShop(index) => self.visit_shop(index),
            Command::UseItem(item) => self.use_item(item),
            Command::Equip(item) => self.equip(item),
            Command::Save => self.checkpoint(),
            Command::Quit | Command::NewGame | Command::Combat(_) | Command::LeaveShop => Ok(()),
        }
    }

    // =========================================================================
    // Exploration
    // =========================================================================

    fn travel(&mut self, direction: Direction) -> GameResult<()> {
        let actor = self.world.player;
        if self.world.position.is_underground() {
            return Err(GameError::invalid_action(
                actor,
                "climb back to the surface first",
            ));
        }
        let to = self
            .world
            .current_location()?
            .exit(direction)
            .ok_or_else(|| {
                GameError::invalid_action(actor, format!("no road leads {}", direction.name()))
            })?;

        self.world.position.location = to;
        self.world.steps += 1;
        self.push_log(format!(
            "You travel {} to {}.",
            direction.name(),
            self.location_name()
        ));

        if self.world.current_location()?.is_town() {
            self.push_log("You feel safe here. Rest to recover.".to_string());
            return self.autosave();
        }
        self.roll_encounter()
    }

    fn descend(&mut self) -> GameResult<()> {
        let actor = self.world.player;
        let here = self.world.current_location()?;
        let LocationKind::Dungeon { floors } = here.kind else {
            return Err(GameError::invalid_action(actor, "there is no way down here"));
        };
        if self.world.position.floor >= floors {
            return Err(GameError::invalid_action(actor, "this is the deepest floor"));
        }

        self.world.position.floor += 1;
        self.world.steps += 1;
        self.push_log(format!(
            "You descend to floor {} of {}.",
            self.world.position.floor, floors
        ));
        if self.world.chest_here() {
            self.push_log("A chest sits in the corner.".to_string());
        }
        self.roll_encounter()
    }

    fn ascend(&mut self) -> GameResult<()> {
        let actor = self.world.player;
        if !self.world.position.is_underground() {
            return Err(GameError::invalid_action(actor, "there is no way up here"));
        }
        self.world.position.floor -= 1;
        self.world.steps += 1;
        if self.world.position.is_underground() {
            self.push_log(format!("You climb to floor {}.", self.world.position.floor));
        } else {
            self.push_log(format!("You climb out of {}.", self.location_name()));
        }
        self.roll_encounter()
    }

    fn search(&mut self) -> GameResult<()> {
        let actor = self.world.player;
        if !self.world.position.is_underground() {
            return Err(GameError::invalid_action(actor, "there is nothing to search here"));
        }
        if !self.world.chest_here() {
            return Err(GameError::invalid_action(actor, "the chest here is already empty"));
        }

        let danger = self.world.danger_here();
        let id = self.world.allocate_item_id();
        let item = random_loot(id, danger, &mut self.rng);
        let label = item.describe();
        self.world.player_mut()?.add_item(item);
        self.world
            .opened_chests
            .insert((self.world.position.location, self.world.position.floor));
        self.push_log(format!("You open the chest and find {}.", label));
        Ok(())
    }

    fn rest(&mut self) -> GameResult<()> {
        let actor = self.world.player;
        if !self.world.current_location()?.is_town() {
            return Err(GameError::invalid_action(actor, "you can only rest in town"));
        }
        self.world.player_mut()?.rest();
        self.push_log("You rest at the inn and wake refreshed.".to_string());
        Ok(())
    }

    fn visit_shop(&mut self, index: usize) -> GameResult<()> {
        let actor = self.world.player;
        let here = self.world.current_location()?;
        if !here.is_town() {
            return Err(GameError::invalid_action(actor, "there are no shops here"));
        }
        let shop = here
            .shops()
            .get(index)
            .ok_or_else(|| GameError::invalid_action(actor, "this town has no such shop"))?;
        let greeting = format!(
            "You enter {}. {} shows you the wares.",
            shop.name(),
            shop.owner
        );
        debug!(shop = %shop.name(), wares = shop.wares.len(), "visiting shop");
        self.mode = Mode::Shopping(index);
        self.push_log(greeting);
        Ok(())
    }

    fn leave_shop(&mut self) -> GameResult<()> {
        if !matches!(self.mode, Mode::Shopping(_)) {
            return Err(GameError::invalid_action(
                self.world.player,
                "you are not in a shop",
            ));
        }
        self.mode = Mode::Exploring;
        self.push_log(format!("You step back out into {}.", self.location_name()));
        Ok(())
    }

    fn use_item(&mut self, item: ItemId) -> GameResult<()> {
        let actor = self.world.player;
        let player = self.world.player_mut()?;
        let effect = player.consumable_effect(item)?;
        if effect.is_hostile() {
            return Err(GameError::invalid_action(actor, "there is nothing to use that on"));
        }
        let name = player
            .inventory()
            .get(item)
            .map(|i| i.name.clone())
            .unwrap_or_default();
        player.consume(item)?;
        player.receive(effect)?;
        self.push_log(format!("You use {}.", name));
        Ok(())
    }

    fn equip(&mut self, item: ItemId) -> GameResult<()> {
        let player = self.world.player_mut()?;
        player.equip(item)?;
        let name = player
            .inventory()
            .get(item)
            .map(|i| i.name.clone())
            .unwrap_or_default();
        self.push_log(format!("You equip {}.", name));
        Ok(())
    }

    // =========================================================================
    // Combat
    // =========================================================================

    fn roll_encounter(&mut self) -> GameResult<()> {
        let location = self.world.current_location()?.clone();
        let Some(spec) = self
            .encounters
            .roll(&location, &self.world.position, self.world.steps)
        else {
            return Ok(());
        };

        let enemies = spawn_encounter(&mut self.world, &spec, self.names.as_mut(), &mut self.rng)?;
        let mut participants = vec![Participant::human(self.world.player)];
        participants.extend(enemies.iter().map(|id| Participant::ai(*id)));
        let session = CombatSession::start(participants, &self.world.roster)?;

        let names: Vec<String> = enemies
            .iter()
            .filter_map(|id| self.world.roster.get(*id))
            .map(|e| e.name().to_string())
            .collect();
        info!(danger = spec.danger, enemies = names.len(), "encounter");
        self.push_log(format!("Ambush! {} attack!", names.join(", ")));

        self.mode = Mode::InCombat(session);
        self.advance_ai()
    }

    fn combat_turn(&mut self, action: Action) -> GameResult<()> {
        let player = self.world.player;
        let Mode::InCombat(session) = &mut self.mode else {
            return Err(GameError::invalid_action(player, "there is no fight"));
        };
        let events = session.submit(player, action, &mut self.world.roster)?;
        let lines = describe_all(&events, &self.world);
        self.push_lines(lines);
        self.advance_ai()
    }

    /// Runs AI turns until the player is up or the fight ends, then merges
    /// a finished fight back into the world.
    fn advance_ai(&mut self) -> GameResult<()> {
        let Mode::InCombat(session) = &mut self.mode else {
            return Ok(());
        };
        let events = session.run_ai_turns(&mut self.world.roster, self.ai.as_mut())?;
        let over = session.is_over();
        let lines = describe_all(&events, &self.world);
        self.push_lines(lines);

        if over {
            if let Mode::InCombat(session) = std::mem::replace(&mut self.mode, Mode::Exploring) {
                let report = session.finish()?;
                self.merge(report)?;
            }
        }
        Ok(())
    }

    fn merge(&mut self, report: CombatReport) -> GameResult<()> {
        debug!(outcome = ?report.outcome, rounds = report.rounds, "merging combat result");
        let hostiles: Vec<EntityId> = report
            .participants
            .iter()
            .map(|p| p.id)
            .filter(|id| {
                self.world
                    .roster
                    .get(*id)
                    .is_some_and(|e| e.side() == Side::Hostile)
            })
            .collect();

        match report.outcome {
            Outcome::Defeat => {
                for id in &hostiles {
                    self.world.roster.remove(*id);
                }
                self.mode = Mode::GameOver;
                self.push_log("You have fallen. Press n to begin anew.".to_string());
                info!(slot = %self.slot, "player defeated");
                if self.config.permadeath {
                    if let Some(saves) = &self.saves {
                        match saves.delete_slot(&self.slot) {
                            Ok(()) | Err(GameError::NotFound { .. }) => {}
                            Err(e) => return Err(e),
                        }
                    }
                } else {
                    self.checkpoint_or_warn()?;
                }
                return Ok(());
            }
            Outcome::Victory | Outcome::Fled { .. } => {
                let mut loot = Vec::new();
                for id in &hostiles {
                    if let Some(mut enemy) = self.world.roster.remove(*id) {
                        if enemy.is_defeated() {
                            loot.extend(enemy.drain_inventory());
                        }
                    }
                }
                let player = self.world.player_mut()?;
                let labels: Vec<String> = loot
                    .into_iter()
                    .map(|item| {
                        let label = item.describe();
                        player.add_item(item);
                        label
                    })
                    .collect();

                match report.outcome {
                    Outcome::Victory => self.push_log("Victory!".to_string()),
                    _ => self.push_log("The fight breaks off.".to_string()),
                }
                if !labels.is_empty() {
                    self.push_log(format!("Looted: {}.", labels.join(", ")));
                }
            }
            Outcome::Pending => {
                return Err(GameError::InvariantViolation(
                    "merged a combat that never ended".into(),
                ))
            }
        }

        self.autosave()
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    fn checkpoint(&mut self) -> GameResult<()> {
        let Some(saves) = &self.saves else {
            return Ok(());
        };
        saves.save(&self.world, &self.slot)?;
        self.push_log("Game saved.".to_string());
        Ok(())
    }

    fn autosave(&mut self) -> GameResult<()> {
        if !self.config.autosave {
            return Ok(());
        }
        self.checkpoint_or_warn()
    }

    /// Saves after a state change that has already happened. A failed write
    /// cannot undo the change, so it is logged and play goes on. Only
    /// invariant violations still propagate.
    fn checkpoint_or_warn(&mut self) -> GameResult<()> {
        match self.checkpoint() {
            Err(e) if !e.is_fatal() => {
                warn!(slot = %self.slot, error = %e, "autosave failed");
                self.push_log(format!("Autosave failed: {}", e));
                Ok(())
            }
            result => result,
        }
    }

    fn restart(&mut self) -> GameResult<()> {
        let seed = self.config.seed.unwrap_or_else(rand::random);
        let world = generate_world(seed, &self.config.hero_name, self.names.as_mut())?;
        self.encounters = self.config.encounter_policy(seed);
        self.rng = StdRng::seed_from_u64(seed);
        self.world = world;
        self.mode = Mode::Exploring;
        self.log.clear();
        self.push_log(format!("A new journey begins in {}.", self.location_name()));
        info!(seed, slot = %self.slot, "restarted after game over");
        self.autosave()
    }

    // =========================================================================
    // View
    // =========================================================================

    pub fn view(&self) -> GameResult<GameView> {
        let here = self.world.current_location()?;
        let player = self.world.player()?;
        let inventory = player
            .inventory()
            .items()
            .iter()
            .map(|item| ItemSummary {
                id: item.id,
                label: item.describe(),
                equipped: player.inventory().is_equipped(item.id),
                consumable: item.is_consumable(),
                hostile: item.is_consumable() && item.effect.is_hostile(),
            })
            .collect();

        let (mode, opponents) = match &self.mode {
            Mode::Exploring => (ViewMode::Exploring, Vec::new()),
            Mode::Shopping(_) => (ViewMode::Shopping, Vec::new()),
            Mode::GameOver => (ViewMode::GameOver, Vec::new()),
            Mode::InCombat(session) => (
                ViewMode::InCombat {
                    round: session.round(),
                    your_turn: session.current_actor() == Some(self.world.player),
                },
                session
                    .participants()
                    .iter()
                    .filter_map(|p| self.world.roster.get(p.id))
                    .filter(|e| e.side() == Side::Hostile)
                    .map(EntitySummary::of)
                    .collect(),
            ),
        };

        let exits = if self.world.position.is_underground() {
            Vec::new()
        } else {
            here.exits
                .iter()
                .map(|(d, to)| {
                    let name = self
                        .world
                        .location(*to)
                        .map_or_else(|| to.to_string(), |l| l.name.clone());
                    (*d, name)
                })
                .collect()
        };

        let shop = match &self.mode {
            Mode::Shopping(index) => here.shops().get(*index).map(|shop| ShopView {
                name: shop.name(),
                kind: shop.kind.name(),
                owner: shop.owner.clone(),
                patrons: shop.patrons.clone(),
                wares: shop.wares.iter().map(Item::describe).collect(),
            }),
            _ => None,
        };

        Ok(GameView {
            mode,
            slot: self.slot.clone(),
            location: here.name.clone(),
            location_kind: here.kind.name(),
            floor: self.world.position.floor,
            floors: here.floors(),
            danger: self.world.danger_here(),
            exits,
            chest_here: self.world.chest_here(),
            shops: here.shops().iter().map(Shop::name).collect(),
            shop,
            steps: self.world.steps,
            player: EntitySummary::of(player),
            inventory,
            opponents,
            log: self.log.iter().cloned().collect(),
            commands: self.available_commands(),
        })
    }

    fn available_commands(&self) -> Vec<&'static str> {
        match &self.mode {
            Mode::GameOver => vec!["new game", "quit"],
            Mode::Shopping(_) => vec!["leave shop", "quit"],
            Mode::InCombat(_) => vec!["attack", "defend", "use item", "flee", "quit"],
            Mode::Exploring => {
                let mut commands = Vec::new();
                let here = self.world.current_location().ok();
                if !self.world.position.is_underground() {
                    commands.push("move");
                }
                let floors = here.map_or(0, |l| l.floors());
                if self.world.position.floor < floors {
                    commands.push("descend");
                }
                if self.world.position.is_underground() {
                    commands.push("ascend");
                }
                if self.world.chest_here() {
                    commands.push("search");
                }
                if here.is_some_and(|l| l.is_town()) {
                    commands.push("rest");
                }
                if here.is_some_and(|l| !l.shops().is_empty()) {
                    commands.push("visit shop");
                }
                commands.extend(["use item", "equip", "save", "quit"]);
                commands
            }
        }
    }

    fn location_name(&self) -> String {
        self.world
            .current_location()
            .map(|l| l.name.clone())
            .unwrap_or_default()
    }

    fn push_log(&mut self, line: String) {
        if self.log.len() == COMBAT_LOG_CAPACITY {
            self.log.pop_front();
        }
        self.log.push_back(line);
    }

    fn push_lines(&mut self, lines: Vec<String>) {
        for line in lines {
            self.push_log(line);
        }
    }
}

fn describe_all(events: &[CombatEvent], world: &WorldState) -> Vec<String> {
    events.iter().map(|e| e.describe(&world.roster)).collect()
}
