use crate::app::App;
use crate::sim::game::Game;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

pub mod log_view;
pub mod status_view;
pub mod upgrades_view;

pub fn render(frame: &mut Frame, app: &App, game: &Game) {
    let size = frame.size();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(2),
        ])
        .split(size);

    render_header(frame, layout[0], game);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(layout[1]);

    upgrades_view::render(frame, columns[0], app, game);

    let right = Layout::vertical([Constraint::Min(14), Constraint::Length(12)]).split(columns[1]);
    status_view::render(frame, right[0], game);
    log_view::render(frame, right[1], game);

    render_footer(frame, layout[2]);
}

fn render_header(frame: &mut Frame, area: Rect, game: &Game) {
    let state = &game.state;
    let mut spans = vec![
        Span::styled(
            "Reverie",
            Style::default()
                .fg(Color::LightBlue)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  •  Money: "),
        Span::styled(game.format_amount(state.money), Style::default().fg(Color::Yellow)),
    ];
    if state.inspiration_unlocked {
        spans.push(Span::raw("  •  Inspiration: "));
        spans.push(Span::styled(
            game.format_amount(state.inspiration),
            Style::default().fg(Color::LightMagenta),
        ));
    }
    if state.concepts_unlocked {
        spans.push(Span::raw("  •  Concepts: "));
        spans.push(Span::styled(
            game.format_amount(state.concepts),
            Style::default().fg(Color::LightCyan),
        ));
    }
    if state.stability_resets > 0 || state.stability > 0.0 {
        spans.push(Span::raw("  •  Stability: "));
        spans.push(Span::styled(
            game.format_amount(state.stability),
            Style::default().fg(Color::LightGreen),
        ));
    }

    let lines = vec![
        Line::from(spans),
        Line::from(vec![Span::raw(format!(
            "Layer {}  •  earned this run {}  •  lifetime {}",
            state.layer,
            game.format_amount(state.money_since_reset),
            game.format_amount(state.total_money_earned)
        ))]),
    ];

    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(paragraph, area);
}

fn render_footer(frame: &mut Frame, area: Rect) {
    let key = |label: &'static str| Span::styled(label, Style::default().fg(Color::Yellow));
    let instructions = Paragraph::new(Line::from(vec![
        key("[Space]"),
        Span::raw(" work  •  "),
        key("[Tab]"),
        Span::raw(" tree  •  "),
        key("[J/K]"),
        Span::raw(" navigate  •  "),
        key("[Enter]"),
        Span::raw(" buy  •  "),
        key("[A]"),
        Span::raw(" auto  •  "),
        key("[F]"),
        Span::raw(" focus  •  "),
        key("[H/C]"),
        Span::raw(" Hall/Archive reset  •  "),
        key("[G]"),
        Span::raw(" wager  •  "),
        key("[S]"),
        Span::raw(" save  •  "),
        key("[Q]"),
        Span::raw(" save & quit"),
    ]))
    .wrap(Wrap { trim: true })
    .block(Block::default().borders(Borders::TOP));
    frame.render_widget(instructions, area);
}
