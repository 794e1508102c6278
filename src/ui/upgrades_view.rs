use crate::app::{App, Tab};
use crate::sim::catalog::{self, Tree};
use crate::sim::game::Game;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs};

pub fn render(frame: &mut Frame, area: Rect, app: &App, game: &Game) {
    let sections = Layout::vertical([Constraint::Length(3), Constraint::Min(3)]).split(area);

    let titles: Vec<Line> = Tab::ALL.iter().map(|tab| Line::from(tab.title())).collect();
    let selected_tab = Tab::ALL.iter().position(|tab| *tab == app.tab()).unwrap_or(0);
    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).title("Upgrades"))
        .select(selected_tab)
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_widget(tabs, sections[0]);

    match app.tab().tree() {
        Some(tree) if !game.state.tree_unlocked(tree) => render_locked(frame, sections[1], tree),
        Some(tree) => render_tree(frame, sections[1], app, game, tree),
        None => render_wake(frame, sections[1], app, game),
    }
}

fn render_locked(frame: &mut Frame, area: Rect, tree: Tree) {
    let hint = match tree {
        Tree::Hall => "Earn enough this run, then press H to retreat to the Hall.",
        _ => "Earn a great deal this run, then press C to retreat to the Archive.",
    };
    let paragraph = Paragraph::new(vec![
        Line::from(Span::styled(
            format!("The {} is closed.", tree.label()),
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(hint),
    ])
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(paragraph, area);
}

fn render_tree(frame: &mut Frame, area: Rect, app: &App, game: &Game, tree: Tree) {
    let state = &game.state;
    let displayed = state.displayed_desk_upgrades();
    let funds = state.currency(tree);

    let items: Vec<ListItem> = tree
        .upgrades()
        .iter()
        .map(|def| {
            let level = state.level_of(tree, def.id);
            let ready = catalog::is_purchasable(def, |id| state.owns(tree, id));
            let maxed = def.is_maxed(level);
            let cost = def.cost_at(level);
            let superseded = tree == Tree::Desk && level > 0 && !displayed.contains(&def.id);
            let color = if maxed || superseded {
                Color::DarkGray
            } else if !ready {
                Color::Gray
            } else if funds >= cost {
                Color::Yellow
            } else {
                Color::White
            };
            let mut line = vec![Span::styled(
                def.name,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )];
            if maxed {
                line.push(Span::raw("  [MAX]"));
            } else if !ready {
                line.push(Span::raw("  [requires earlier upgrade]"));
            } else {
                line.push(Span::raw(format!(
                    "  [{} {}]",
                    game.format_amount(cost),
                    tree.currency()
                )));
            }
            if level > 0 {
                line.push(Span::raw(format!("  (lvl {level}/{})", def.max_level)));
            }
            ListItem::new(vec![Line::from(line), Line::from(def.description)])
        })
        .collect();

    let title = format!(
        "{}: {} {}",
        tree.label(),
        game.format_amount(funds),
        tree.currency()
    );
    render_list(frame, area, app, items, title);
}

fn render_wake(frame: &mut Frame, area: Rect, app: &App, game: &Game) {
    let state = &game.state;
    let items: Vec<ListItem> = catalog::WAKE_UPGRADES
        .iter()
        .map(|def| {
            let owned = state.wake_timer_upgrades.contains(def.id);
            let color = if owned {
                Color::DarkGray
            } else if state.stability >= def.cost {
                Color::Yellow
            } else {
                Color::White
            };
            let effect = if def.infinite {
                "never sleep again".to_string()
            } else {
                format!("+{:.0}s awake", def.time_bonus)
            };
            let price = if owned {
                "  [OWNED]".to_string()
            } else {
                format!("  [{} stability]", game.format_amount(def.cost))
            };
            ListItem::new(Line::from(vec![
                Span::styled(def.name, Style::default().fg(color).add_modifier(Modifier::BOLD)),
                Span::raw(price),
                Span::raw(format!("  {effect}")),
            ]))
        })
        .collect();

    let title = format!("Wake: {} stability", game.format_amount(state.stability));
    render_list(frame, area, app, items, title);
}

fn render_list(frame: &mut Frame, area: Rect, app: &App, items: Vec<ListItem>, title: String) {
    let len = items.len();
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_symbol("▶ ")
        .highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White));
    let mut list_state = ListState::default();
    if len > 0 {
        list_state.select(Some(app.selected().min(len - 1)));
    }
    frame.render_stateful_widget(list, area, &mut list_state);
}
