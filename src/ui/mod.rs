pub mod input;

use delve::world::{EntitySummary, GameView, ShopView, ViewMode};
use input::{key_help, Selection};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

/// Draws one frame from the game projection.
pub fn draw(frame: &mut Frame, view: &GameView, selection: &Selection, status: Option<&str>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Location header
            Constraint::Min(10),   // Stats and log
            Constraint::Length(8), // Inventory
            Constraint::Length(3), // Footer
        ])
        .split(frame.size());

    draw_header(frame, chunks[0], view);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[1]);
    draw_combatants(frame, middle[0], view, selection);
    draw_log(frame, middle[1], view);

    draw_inventory(frame, chunks[2], view, selection);
    draw_footer(frame, chunks[3], view, status);
}

fn draw_header(frame: &mut Frame, area: Rect, view: &GameView) {
    let depth = if view.floor > 0 {
        format!("  floor {}/{}", view.floor, view.floors)
    } else {
        String::new()
    };
    let exits = view
        .exits
        .iter()
        .map(|(d, name)| format!("{}: {}", d.name(), name))
        .collect::<Vec<_>>()
        .join("  ");
    let mut spans = vec![
        Span::styled(
            view.location.clone(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" ({}){}  danger {}", view.location_kind, depth, view.danger)),
    ];
    if view.chest_here {
        spans.push(Span::styled("  [chest]", Style::default().fg(Color::Yellow)));
    }
    if !exits.is_empty() {
        spans.push(Span::styled(
            format!("  |  {}", exits),
            Style::default().fg(Color::DarkGray),
        ));
    }

    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" delve [{}] ", view.slot)),
    );
    frame.render_widget(header, area);
}

fn health_line(entity: &EntitySummary, highlight: bool) -> Line<'static> {
    let color = if entity.defeated {
        Color::DarkGray
    } else if entity.health * 3 <= entity.max_health {
        Color::Red
    } else {
        Color::Green
    };
    let marker = if highlight { "> " } else { "  " };
    let mut spans = vec![
        Span::raw(marker),
        Span::styled(
            entity.name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  HP {}/{}", entity.health, entity.max_health),
            Style::default().fg(color),
        ),
        Span::raw(format!("  ATK {}  DEF {}", entity.attack, entity.defense)),
    ];
    if !entity.effects.is_empty() {
        spans.push(Span::styled(
            format!("  {}", entity.effects.join(", ")),
            Style::default().fg(Color::Magenta),
        ));
    }
    Line::from(spans)
}

fn draw_combatants(frame: &mut Frame, area: Rect, view: &GameView, selection: &Selection) {
    let mut lines = vec![
        health_line(&view.player, false),
        Line::from(Span::raw(format!(
            "  SP {}/{}",
            view.player.stamina, view.player.max_stamina
        ))),
        Line::from(""),
    ];

    let title = match view.mode {
        ViewMode::Exploring => " Hero ".to_string(),
        ViewMode::Shopping => view
            .shop
            .as_ref()
            .map_or_else(|| " Shop ".to_string(), |shop| format!(" {} ", shop.name)),
        ViewMode::InCombat { round, your_turn } => {
            let turn = if your_turn { "your move" } else { "waiting" };
            format!(" Round {} - {} ", round, turn)
        }
        ViewMode::GameOver => " Fallen ".to_string(),
    };

    let mut living = 0;
    for enemy in &view.opponents {
        let highlight = !enemy.defeated && living == selection.target;
        if !enemy.defeated {
            living += 1;
        }
        lines.push(health_line(enemy, highlight));
    }

    match (&view.shop, view.mode) {
        (Some(shop), ViewMode::Shopping) => lines.extend(shop_lines(shop)),
        (None, ViewMode::Exploring) if !view.shops.is_empty() => {
            lines.push(Line::from(Span::styled(
                "Shops",
                Style::default().add_modifier(Modifier::BOLD),
            )));
            lines.extend(
                view.shops
                    .iter()
                    .enumerate()
                    .map(|(i, name)| Line::from(format!("  {} {}", i + 1, name))),
            );
        }
        _ => {}
    }

    if view.mode == ViewMode::GameOver {
        lines.push(Line::from(Span::styled(
            "GAME OVER",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )));
    }

    let panel = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(panel, area);
}

fn shop_lines(shop: &ShopView) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(format!("{} keeps the {}.", shop.owner, shop.kind.to_lowercase())),
        Line::from(Span::styled(
            format!("Patrons: {}", shop.patrons.join(", ")),
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(Span::styled(
            "Wares",
            Style::default().add_modifier(Modifier::BOLD),
        )),
    ];
    lines.extend(shop.wares.iter().map(|ware| {
        Line::from(Span::styled(
            format!("  {}", ware),
            Style::default().fg(Color::Yellow),
        ))
    }));
    lines
}

fn draw_log(frame: &mut Frame, area: Rect, view: &GameView) {
    let visible = area.height.saturating_sub(2) as usize;
    let skip = view.log.len().saturating_sub(visible);
    let lines: Vec<Line> = view
        .log
        .iter()
        .skip(skip)
        .map(|l| Line::from(l.as_str()))
        .collect();
    let log = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(" Log "));
    frame.render_widget(log, area);
}

fn draw_inventory(frame: &mut Frame, area: Rect, view: &GameView, selection: &Selection) {
    let items: Vec<ListItem> = view
        .inventory
        .iter()
        .map(|item| {
            let mut label = item.label.clone();
            if item.equipped {
                label.push_str(" [E]");
            }
            ListItem::new(label)
        })
        .collect();

    let mut state = ListState::default();
    if !view.inventory.is_empty() {
        state.select(Some(selection.item));
    }
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(" Inventory "))
        .highlight_style(Style::default().fg(Color::Black).bg(Color::Cyan))
        .highlight_symbol("> ");
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_footer(frame: &mut Frame, area: Rect, view: &GameView, status: Option<&str>) {
    let line = match status {
        Some(message) => Line::from(Span::styled(
            message.to_string(),
            Style::default().fg(Color::Yellow),
        )),
        None => Line::from(Span::styled(
            key_help(view.mode),
            Style::default().fg(Color::DarkGray),
        )),
    };
    let footer = Paragraph::new(line)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer, area);
}
