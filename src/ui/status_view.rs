use crate::sim::economy;
use crate::sim::game::Game;
use crate::sim::prestige::ResetKind;
use crate::sim::resonance;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Gauge, Paragraph, Wrap};

pub fn render(frame: &mut Frame, area: Rect, game: &Game) {
    let block = Block::default().title("Condition").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let sections = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(4),
    ])
    .split(inner);

    render_wake_gauge(frame, sections[0], game);
    render_resonance_gauge(frame, sections[1], game);

    let state = &game.state;
    let tuning = game.tuning();
    let manual = game.manual_yield();
    let auto = game.auto_yield();

    let mut lines = vec![Line::from(vec![
        Span::styled("Work", Style::default().fg(Color::Yellow)),
        Span::raw(format!(
            ": +{} every {:.2}s",
            game.format_amount(manual.gain),
            manual.delay
        )),
    ])];

    if state.auto_unlocked {
        let status = if state.auto_enabled { "on" } else { "off" };
        let progress = (state.work_timer / auto.delay.max(f64::EPSILON) * 100.0).min(100.0);
        lines.push(Line::from(format!(
            "Auto ({status}): +{} per cycle, {progress:.0}% to next",
            game.format_amount(auto.gain)
        )));
    }
    if state.focus_unlocked {
        let remaining = game.focus_remaining();
        let focus = if remaining > 0.0 {
            format!("Focus: burning, {remaining:.0}s left")
        } else {
            format!("Focus: {:.0}/{:.0}", state.focus, tuning.focus_max)
        };
        lines.push(Line::from(focus));
    }
    if state.motivation_unlocked {
        lines.push(Line::from(format!(
            "Motivation: {:.0}/{:.0} (x{:.2})",
            state.motivation,
            tuning.motivation_max,
            economy::motivation_multiplier(state, tuning)
        )));
    }
    if state.charge_unlocked {
        lines.push(Line::from(format!(
            "Charge: {:.0}s (best {:.0}s, x{:.2})",
            state.charge,
            state.best_charge,
            economy::charge_multiplier(state, tuning)
        )));
    }

    for kind in [ResetKind::Inspiration, ResetKind::Concept] {
        let line = match game.reset_preview(kind) {
            Some(reward) => Line::from(Span::styled(
                format!("{} reset ready: +{}", kind.label(), game.format_amount(reward)),
                Style::default().fg(Color::LightGreen),
            )),
            None => Line::from(Span::styled(
                format!(
                    "{} reset at {} earned",
                    kind.label(),
                    game.format_amount(kind.threshold(tuning))
                ),
                Style::default().fg(Color::DarkGray),
            )),
        };
        lines.push(line);
    }

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, sections[2]);
}

fn render_wake_gauge(frame: &mut Frame, area: Rect, game: &Game) {
    let state = &game.state;
    let (ratio, label, color) = if state.wake_timer_infinite {
        (1.0, "Awake: forever".to_string(), Color::LightGreen)
    } else {
        let ratio = (state.wake_timer / state.wake_timer_cap.max(1.0)).clamp(0.0, 1.0);
        let color = if state.wake_timer <= game.tuning().wake_warning_secs {
            Color::LightRed
        } else {
            Color::Green
        };
        (
            ratio,
            format!("Awake: {:.0}s / {:.0}s", state.wake_timer, state.wake_timer_cap),
            color,
        )
    };
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(color))
        .ratio(ratio)
        .label(label);
    frame.render_widget(gauge, area);
}

fn render_resonance_gauge(frame: &mut Frame, area: Rect, game: &Game) {
    let state = &game.state;
    if state.layer < 2 {
        return;
    }
    let tuning = &game.tuning().resonance;
    let in_tune = resonance::in_tune(state, tuning);
    let label = format!(
        "Resonance {:.0} (target {:.0}) x{:.2}",
        state.resonance_val,
        state.resonance_target,
        resonance::efficiency(state, tuning)
    );
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(if in_tune { Color::LightCyan } else { Color::Magenta }))
        .ratio((state.resonance_val / 100.0).clamp(0.0, 1.0))
        .label(label);
    frame.render_widget(gauge, area);
}
