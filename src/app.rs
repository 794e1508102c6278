use crate::input::Command;
use crate::sim::catalog::{self, Tree};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Desk,
    Hall,
    Archive,
    Wake,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Desk, Tab::Hall, Tab::Archive, Tab::Wake];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Desk => "Desk",
            Tab::Hall => "Hall",
            Tab::Archive => "Archive",
            Tab::Wake => "Wake",
        }
    }

    pub fn tree(self) -> Option<Tree> {
        match self {
            Tab::Desk => Some(Tree::Desk),
            Tab::Hall => Some(Tree::Hall),
            Tab::Archive => Some(Tree::Archive),
            Tab::Wake => None,
        }
    }

    fn index(self) -> usize {
        match self {
            Tab::Desk => 0,
            Tab::Hall => 1,
            Tab::Archive => 2,
            Tab::Wake => 3,
        }
    }

    /// Rows in this tab's upgrade list.
    pub fn row_count(self) -> usize {
        match self.tree() {
            Some(tree) => tree.upgrades().len(),
            None => catalog::WAKE_UPGRADES.len(),
        }
    }
}

#[derive(Debug, Default)]
pub struct App {
    tab: Tab,
    selected: [usize; 4],
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn next_tab(&mut self) {
        self.tab = Tab::ALL[(self.tab.index() + 1) % Tab::ALL.len()];
    }

    pub fn previous_tab(&mut self) {
        self.tab = Tab::ALL[(self.tab.index() + Tab::ALL.len() - 1) % Tab::ALL.len()];
    }

    pub fn selected(&self) -> usize {
        self.selected[self.tab.index()]
    }

    pub fn move_selection(&mut self, delta: isize) {
        let len = self.tab.row_count();
        if len == 0 {
            return;
        }
        let slot = &mut self.selected[self.tab.index()];
        *slot = (*slot as isize + delta).rem_euclid(len as isize) as usize;
    }

    /// The purchase the highlighted row stands for.
    pub fn selected_command(&self) -> Option<Command> {
        let index = self.selected();
        match self.tab.tree() {
            Some(tree) => tree.upgrades().get(index).map(|def| Command::Buy {
                tree,
                id: def.id.to_string(),
            }),
            None => catalog::WAKE_UPGRADES
                .get(index)
                .map(|def| Command::BuyWake(def.id.to_string())),
        }
    }
}
