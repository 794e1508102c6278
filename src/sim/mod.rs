pub mod catalog;
pub mod economy;
pub mod format;
pub mod game;
pub mod minigame;
pub mod prestige;
pub mod resonance;
pub mod state;
pub mod wake_timer;
