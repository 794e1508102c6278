use crate::sim::game::Game;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem};

pub fn render(frame: &mut Frame, area: Rect, game: &Game) {
    let items: Vec<ListItem> = game
        .messages()
        .map(|message| ListItem::new(Line::from(message.as_str())))
        .collect();
    let list = List::new(items).block(Block::default().title("Journal").borders(Borders::ALL));
    frame.render_widget(list, area);
}
