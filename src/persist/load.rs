use super::deserialize;
use crate::config::Tuning;
use crate::sim::state::GameState;
use anyhow::Result;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

pub fn load_game(path: &Path, tuning: &Tuning) -> Result<Option<GameState>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(deserialize(&content, tuning))),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}
