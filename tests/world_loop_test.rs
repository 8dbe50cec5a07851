//! Integration test: world loop
//!
//! Plays short adventures through `Game::handle` the way the terminal front
//! end does, with scripted encounters so every fight is predictable.

use delve::combat::{Action, AttackOnlyPolicy, CombatPolicy};
use delve::core::{EncounterMode, GameConfig, GameError};
use delve::entity::EnemyKind;
use delve::persistence::SaveManager;
use delve::world::{
    generate_world, Command, Direction, EncounterPolicy, EncounterSpec, FixedNames, Game,
    Location, LocationId, Mode, Position, ScriptedEncounters, ViewMode,
};
use tempfile::TempDir;

/// Sends a lone kobold at the listed step numbers and nothing otherwise.
struct KoboldsAt(Vec<u64>);

impl EncounterPolicy for KoboldsAt {
    fn roll(
        &mut self,
        location: &Location,
        position: &Position,
        steps: u64,
    ) -> Option<EncounterSpec> {
        self.0.contains(&steps).then(|| EncounterSpec {
            enemies: vec![EnemyKind::Kobold],
            danger: location.danger + position.floor,
        })
    }
}

fn config(dir: &TempDir, permadeath: bool) -> GameConfig {
    GameConfig {
        save_dir: dir.path().join("saves"),
        log_dir: dir.path().join("logs"),
        seed: Some(21),
        permadeath,
        encounters: EncounterMode::Scripted { every: 1000 },
        ..GameConfig::default()
    }
}

/// A game whose hero is down to one hit point and who meets a goblin on
/// every step outside town. Goblins are faster than the hero.
fn doomed_game(config: &GameConfig) -> Game {
    let mut world = generate_world(21, &config.hero_name, &mut FixedNames::new()).unwrap();
    world.player_mut().unwrap().set_health(1);
    Game::from_world(world, config, Box::new(FixedNames::new()))
        .with_encounters(Box::new(ScriptedEncounters::new(1)))
}

/// Attacks until the current fight is over.
fn fight_out(game: &mut Game) {
    let mut policy = AttackOnlyPolicy;
    while let Mode::InCombat(session) = game.mode() {
        let player = game.world().player;
        let action = policy.choose_action(player, session, &game.world().roster);
        game.handle(Command::Combat(action)).unwrap();
    }
}

fn reason(err: GameError) -> String {
    match err {
        GameError::InvalidAction { reason, .. } => reason,
        other => panic!("expected InvalidAction, got {other:?}"),
    }
}

// =========================================================================
// Defeat
// =========================================================================

#[test]
fn test_defeat_with_permadeath_deletes_the_slot() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir, true);
    let saves = SaveManager::from_config(&config);
    let mut game = doomed_game(&config);

    game.handle(Command::Save).unwrap();
    assert!(saves.exists("main"));

    game.handle(Command::Move(Direction::East)).unwrap();
    assert!(matches!(game.mode(), Mode::GameOver));
    assert!(game.world().player().unwrap().is_defeated());
    assert_eq!(game.world().roster.len(), 1, "hostiles are cleared");
    assert!(!saves.exists("main"));
    assert!(saves.backups("main").unwrap().is_empty());

    let view = game.view().unwrap();
    assert_eq!(view.mode, ViewMode::GameOver);
    assert_eq!(view.commands, vec!["new game", "quit"]);
}

#[test]
fn test_defeat_without_permadeath_checkpoints_game_over() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir, false);
    let mut game = doomed_game(&config);

    game.handle(Command::Move(Direction::East)).unwrap();
    assert!(matches!(game.mode(), Mode::GameOver));

    let reloaded = Game::load(&config, "main", Box::new(FixedNames::new())).unwrap();
    assert!(matches!(reloaded.mode(), Mode::GameOver));
    assert_eq!(reloaded.world(), game.world());
}

#[test]
fn test_game_over_only_accepts_new_game_and_quit() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir, true);
    let mut game = doomed_game(&config);
    game.handle(Command::Move(Direction::East)).unwrap();

    for command in [
        Command::Move(Direction::West),
        Command::Rest,
        Command::Save,
        Command::Search,
    ] {
        let err = game.handle(command).unwrap_err();
        assert_eq!(reason(err), "your journey is over");
    }
    let err = game.handle(Command::Combat(Action::Defend)).unwrap_err();
    assert_eq!(reason(err), "there is no fight");

    game.handle(Command::NewGame).unwrap();
    assert!(matches!(game.mode(), Mode::Exploring));
    let hero = game.world().player().unwrap();
    assert_eq!(hero.health(), hero.max_health());
    assert_eq!(game.world().steps, 0);
    assert!(SaveManager::from_config(&config).exists("main"));
}

#[test]
fn test_new_game_is_refused_while_alive() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir, true);
    let mut game = Game::new_game(&config, Box::new(FixedNames::new())).unwrap();
    let err = game.handle(Command::NewGame).unwrap_err();
    assert_eq!(reason(err), "you are still alive");
}

// =========================================================================
// Fights that end well
// =========================================================================

#[test]
fn test_fleeing_ends_the_fight_without_loot() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir, true);
    let mut game = Game::new_game(&config, Box::new(FixedNames::new()))
        .unwrap()
        .with_encounters(Box::new(ScriptedEncounters::new(1)))
        .with_ai(Box::new(AttackOnlyPolicy))
        .without_saves();

    // The faster enemy strikes before the hero can act.
    game.handle(Command::Move(Direction::East)).unwrap();
    assert!(matches!(game.mode(), Mode::InCombat(_)));
    assert!(game.world().player().unwrap().health() < 100);
    game.handle(Command::Combat(Action::Flee)).unwrap();

    assert!(matches!(game.mode(), Mode::Exploring));
    assert_eq!(game.world().roster.len(), 1);
    assert_eq!(game.world().player().unwrap().inventory().len(), 3);
    assert!(game.log().any(|line| line == "The fight breaks off."));
}

#[test]
fn test_round_trip_through_town_and_dungeon() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir, true);
    let mut game = Game::new_game(&config, Box::new(FixedNames::new()))
        .unwrap()
        .with_encounters(Box::new(KoboldsAt(vec![3, 5])));

    game.handle(Command::Move(Direction::East)).unwrap();
    game.handle(Command::Move(Direction::East)).unwrap();
    assert!(matches!(game.mode(), Mode::Exploring));
    game.handle(Command::Descend).unwrap();
    assert!(matches!(game.mode(), Mode::InCombat(_)));
    fight_out(&mut game);
    assert!(matches!(game.mode(), Mode::Exploring));
    assert_eq!(game.world().roster.len(), 1);

    game.handle(Command::Search).unwrap();
    assert!(!game.world().chest_here());
    game.handle(Command::Ascend).unwrap();
    game.handle(Command::Move(Direction::West)).unwrap();
    fight_out(&mut game);
    game.handle(Command::Move(Direction::West)).unwrap();
    assert_eq!(game.world().position.location, LocationId(0));

    // Entering town autosaves, and the save resumes the same world.
    let resumed = Game::load(&config, "main", Box::new(FixedNames::new())).unwrap();
    assert_eq!(resumed.world(), game.world());
    assert!(matches!(resumed.mode(), Mode::Exploring));
}

#[test]
fn test_same_seed_same_adventure() {
    let play = || {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(&dir, true);
        config.encounters = EncounterMode::Weighted;
        let mut game = Game::new_game(&config, Box::new(FixedNames::new()))
            .unwrap()
            .without_saves();
        for _ in 0..8 {
            for direction in [Direction::East, Direction::West] {
                if !matches!(game.mode(), Mode::Exploring) {
                    break;
                }
                game.handle(Command::Move(direction)).unwrap();
                fight_out(&mut game);
            }
            if game.world().position.location == LocationId(0)
                && matches!(game.mode(), Mode::Exploring)
            {
                game.handle(Command::Rest).unwrap();
            }
        }
        let log: Vec<String> = game.log().map(str::to_string).collect();
        (game.world().clone(), log)
    };

    let (first_world, first_log) = play();
    let (second_world, second_log) = play();
    assert_eq!(first_world, second_world);
    assert_eq!(first_log, second_log);
}

// =========================================================================
// Autosave failures
// =========================================================================

/// Puts the save directory below a regular file so every write fails.
fn unwritable(dir: &TempDir, permadeath: bool) -> GameConfig {
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"not a directory").unwrap();
    GameConfig {
        save_dir: blocker.join("saves"),
        ..config(dir, permadeath)
    }
}

#[test]
fn test_failed_autosave_keeps_the_move() {
    let dir = tempfile::tempdir().unwrap();
    let config = unwritable(&dir, false);
    let mut game = Game::new_game(&config, Box::new(FixedNames::new())).unwrap();

    game.handle(Command::Move(Direction::East)).unwrap();
    game.handle(Command::Move(Direction::West)).unwrap();
    assert_eq!(game.world().position, Position::surface(LocationId(0)));
    assert_eq!(game.world().steps, 2);
    assert!(game.log().any(|line| line.starts_with("Autosave failed")));
    assert!(matches!(game.mode(), Mode::Exploring));

    let err = game.handle(Command::Save).unwrap_err();
    assert!(matches!(err, GameError::Io(_)));
}

#[test]
fn test_failed_checkpoint_after_defeat_still_ends_the_game() {
    let dir = tempfile::tempdir().unwrap();
    let config = unwritable(&dir, false);
    let mut game = doomed_game(&config);

    game.handle(Command::Move(Direction::East)).unwrap();
    assert!(matches!(game.mode(), Mode::GameOver));
    assert_eq!(game.world().position, Position::surface(LocationId(1)));
    assert!(game.log().any(|line| line.starts_with("Autosave failed")));
}
