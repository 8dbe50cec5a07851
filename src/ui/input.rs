//! Key presses to game commands.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use delve::combat::Action;
use delve::world::{Command, Direction, GameView, ViewMode};

/// Cursor state that lives between frames.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub item: usize,
    pub target: usize,
}

impl Selection {
    /// Keeps both cursors inside the lists they point into.
    pub fn clamp(&mut self, view: &GameView) {
        self.item = self.item.min(view.inventory.len().saturating_sub(1));
        self.target = self.target.min(living_targets(view).len().saturating_sub(1));
    }
}

fn living_targets(view: &GameView) -> Vec<delve::entity::EntityId> {
    view.opponents
        .iter()
        .filter(|o| !o.defeated)
        .map(|o| o.id)
        .collect()
}

/// Maps a key to a command. Cursor keys that only move a selection return
/// `None` after updating `selection`.
pub fn map_key(key: KeyEvent, view: &GameView, selection: &mut Selection) -> Option<Command> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(Command::Quit);
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return Some(Command::Quit),
        KeyCode::Char('j') => {
            if selection.item + 1 < view.inventory.len() {
                selection.item += 1;
            }
            return None;
        }
        KeyCode::Char('k') => {
            selection.item = selection.item.saturating_sub(1);
            return None;
        }
        _ => {}
    }

    let item = view.inventory.get(selection.item);
    match view.mode {
        ViewMode::GameOver => match key.code {
            KeyCode::Char('n') => Some(Command::NewGame),
            _ => None,
        },
        ViewMode::Exploring => match key.code {
            KeyCode::Up => Some(Command::Move(Direction::North)),
            KeyCode::Down => Some(Command::Move(Direction::South)),
            KeyCode::Left => Some(Command::Move(Direction::West)),
            KeyCode::Right => Some(Command::Move(Direction::East)),
            KeyCode::Char('>') => Some(Command::Descend),
            KeyCode::Char('<') => Some(Command::Ascend),
            KeyCode::Char('s') => Some(Command::Search),
            KeyCode::Char('r') => Some(Command::Rest),
            KeyCode::Char('S') => Some(Command::Save),
            KeyCode::Char('u') => item.map(|i| Command::UseItem(i.id)),
            KeyCode::Char('e') => item.map(|i| Command::Equip(i.id)),
            KeyCode::Char(c @ '1'..='9') => {
                let index = c as usize - '1' as usize;
                (index < view.shops.len()).then_some(Command::VisitShop(index))
            }
            _ => None,
        },
        ViewMode::Shopping => match key.code {
            KeyCode::Char('x') | KeyCode::Backspace => Some(Command::LeaveShop),
            _ => None,
        },
        ViewMode::InCombat { .. } => {
            let targets = living_targets(view);
            let target = targets.get(selection.target).copied();
            match key.code {
                KeyCode::Tab => {
                    if !targets.is_empty() {
                        selection.target = (selection.target + 1) % targets.len();
                    }
                    None
                }
                KeyCode::Char('a') => {
                    target.map(|target| Command::Combat(Action::Attack { target }))
                }
                KeyCode::Char('d') => Some(Command::Combat(Action::Defend)),
                KeyCode::Char('f') => Some(Command::Combat(Action::Flee)),
                KeyCode::Char('u') => item.map(|i| {
                    Command::Combat(Action::UseItem {
                        item: i.id,
                        target: if i.hostile { target } else { None },
                    })
                }),
                _ => None,
            }
        }
    }
}

/// Footer hint for the current mode.
pub fn key_help(mode: ViewMode) -> &'static str {
    match mode {
        ViewMode::Exploring => {
            "arrows move  > descend  < ascend  s search  r rest  1-3 shop  j/k select  u use  e equip  S save  q quit"
        }
        ViewMode::Shopping => "x leave shop  j/k select  q quit",
        ViewMode::InCombat { .. } => {
            "a attack  Tab target  d defend  u use item  f flee  j/k select  q quit"
        }
        ViewMode::GameOver => "n new game  q quit",
    }
}
