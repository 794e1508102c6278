mod load;
mod save;

pub use load::load_game;
pub use save::{save_game, save_in_background};

use crate::config::Tuning;
use crate::sim::state::GameState;
use crate::sim::wake_timer;
use anyhow::Result;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::warn;

pub fn slot_path(save_dir: &Path, slot: u8) -> PathBuf {
    save_dir.join(format!("slot{slot}.json"))
}

/// Floats are written shortest-exact and read back bit for bit.
pub fn serialize(state: &GameState) -> Result<String> {
    Ok(serde_json::to_string_pretty(state)?)
}

/// Never fails: corrupt blobs load as a fresh run, bad fields fall back one by one.
pub fn deserialize(blob: &str, tuning: &Tuning) -> GameState {
    let mut state = match serde_json::from_str::<Value>(blob) {
        Ok(Value::Object(fields)) => merge_fields(fields, tuning),
        Ok(_) => {
            warn!("save blob is not an object; starting fresh");
            GameState::with_tuning(tuning)
        }
        Err(err) => {
            warn!(error = %err, "save blob is corrupt; starting fresh");
            GameState::with_tuning(tuning)
        }
    };
    state.normalize(tuning);
    wake_timer::recalc_state(&mut state, tuning);
    state
}

fn merge_fields(fields: Map<String, Value>, tuning: &Tuning) -> GameState {
    let fresh = GameState::with_tuning(tuning);
    let Ok(Value::Object(mut merged)) = serde_json::to_value(&fresh) else {
        return fresh;
    };
    let mut state = fresh;
    for (key, value) in fields {
        if !merged.contains_key(&key) {
            continue;
        }
        let previous = merged.insert(key.clone(), value);
        match serde_json::from_value::<GameState>(Value::Object(merged.clone())) {
            Ok(candidate) => state = candidate,
            Err(err) => {
                warn!(field = %key, error = %err, "ignoring unreadable save field");
                if let Some(previous) = previous {
                    merged.insert(key, previous);
                }
            }
        }
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::catalog::Tree;
    use std::env;
    use std::fs;

    #[test]
    fn slot_files_are_numbered() {
        assert_eq!(
            slot_path(Path::new("saves"), 3),
            PathBuf::from("saves").join("slot3.json")
        );
    }

    #[test]
    fn state_survives_a_disk_round_trip() {
        let dir = env::temp_dir().join(format!("reverie-persist-{}", std::process::id()));
        let path = slot_path(&dir, 1);
        let tuning = Tuning::default();
        let mut state = GameState::with_tuning(&tuning);
        state.layer = 2;
        state.money = 1234.5;
        state.set_level(Tree::Desk, "notebook", 3);
        state.set_level(Tree::Archive, "stabilizer", 2);
        state.wake_timer_upgrades.insert("coffee".to_string());
        state.wake_timer = 200.0;

        save_game(&state, &path).expect("save");
        let loaded = load_game(&path, &tuning).expect("load").expect("present");
        assert_eq!(loaded.money, state.money);
        assert_eq!(loaded.level_of(Tree::Desk, "notebook"), 3);
        assert_eq!(loaded.level_of(Tree::Archive, "stabilizer"), 2);
        assert!((loaded.wake_timer_cap - (tuning.wake_base_cap + 60.0)).abs() < 1e-9);
        assert!((loaded.wake_timer - 200.0).abs() < 1e-9);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_slot_is_not_an_error() {
        let path = env::temp_dir().join("reverie-no-such-dir").join("slot9.json");
        assert!(load_game(&path, &Tuning::default()).expect("no error").is_none());
    }

    #[test]
    fn missing_keys_take_initial_values() {
        let tuning = Tuning::default();
        let state = deserialize(r#"{"money": 42.0, "layer": 1}"#, &tuning);
        assert_eq!(state.layer, 1);
        assert!((state.money - 42.0).abs() < f64::EPSILON);
        assert!((state.money_mult - 1.0).abs() < f64::EPSILON);
        assert!((state.resonance_val - tuning.resonance.start_value).abs() < f64::EPSILON);
        assert!((state.wake_timer - tuning.wake_base_cap).abs() < f64::EPSILON);
    }

    #[test]
    fn a_wrongly_typed_field_falls_back_alone() {
        let tuning = Tuning::default();
        let state = deserialize(
            r#"{"money": "lots", "inspiration": 7.0, "upgrade_levels": {"notebook": 2}}"#,
            &tuning,
        );
        assert!(state.money.abs() < f64::EPSILON);
        assert!((state.inspiration - 7.0).abs() < f64::EPSILON);
        assert_eq!(state.level_of(Tree::Desk, "notebook"), 2);
        assert!(state.owned_upgrades.contains("notebook"));
    }

    #[test]
    fn corrupt_blob_loads_fresh() {
        let tuning = Tuning::default();
        assert_eq!(deserialize("{not json", &tuning), GameState::with_tuning(&tuning));
        assert_eq!(deserialize("[1, 2]", &tuning), GameState::with_tuning(&tuning));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let tuning = Tuning::default();
        let state = deserialize(r#"{"blackjack_streak": 9, "concepts": 3.0}"#, &tuning);
        assert!((state.concepts - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn load_rederives_wake_cap_and_clamps() {
        let tuning = Tuning::default();
        let state = deserialize(
            r#"{"wake_timer": 99999.0, "wake_timer_cap": 5.0, "wake_timer_upgrades": ["lucid_state"], "resonance_val": -20.0}"#,
            &tuning,
        );
        assert!(state.wake_timer_infinite);
        assert!((state.wake_timer_cap - tuning.wake_base_cap).abs() < f64::EPSILON);
        assert!((state.wake_timer - state.wake_timer_cap).abs() < f64::EPSILON);
        assert!(state.resonance_val.abs() < f64::EPSILON);
    }

    #[test]
    fn serialized_state_reads_back_equal() {
        let tuning = Tuning::default();
        let mut state = GameState::with_tuning(&tuning);
        state.inspiration = 12.0;
        state.set_level(Tree::Hall, "muse", 2);
        state.focus_unlocked = true;
        let blob = serialize(&state).expect("serializes");
        assert_eq!(deserialize(&blob, &tuning), state);
    }

    #[test]
    fn accumulated_floats_reload_bit_for_bit() {
        let tuning = Tuning::default();
        let mut state = GameState::with_tuning(&tuning);
        let mut earned = 0.0_f64;
        for i in 0..500 {
            earned += 1.1002460000000003 * (f64::from(i) + 0.37) / 7.0;
            state.money = earned * 0.9;
            state.money_since_reset = earned;
            state.total_money_earned = earned * 1.7;
            state.resonance_val = 100.0 * (earned / (earned + 3.0));

            let blob = serialize(&state).expect("serializes");
            let reloaded = deserialize(&blob, &tuning);
            assert_eq!(reloaded.money.to_bits(), state.money.to_bits(), "money at step {i}");
            assert_eq!(
                reloaded.money_since_reset.to_bits(),
                state.money_since_reset.to_bits()
            );
            assert_eq!(
                reloaded.total_money_earned.to_bits(),
                state.total_money_earned.to_bits()
            );
            assert_eq!(
                reloaded.resonance_val.to_bits(),
                state.resonance_val.to_bits()
            );
        }
    }
}
