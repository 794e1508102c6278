use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::sim::format::DEFAULT_SCIENTIFIC_EXPONENT;

pub const CONFIG_FILE: &str = "reverie.ron";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub save_dir: PathBuf,
    pub slot: u8,
    pub log_file: PathBuf,
    pub tick_ms: u64,
    pub tuning: Tuning,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            save_dir: PathBuf::from("saves"),
            slot: 1,
            log_file: PathBuf::from("reverie.log"),
            tick_ms: 100,
            tuning: Tuning::default(),
        }
    }
}

impl Config {
    /// Reads `reverie.ron` from the working directory, or returns defaults when absent.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => ron::from_str(&content)
                .with_context(|| format!("malformed config file {}", path.display())),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err.into()),
        }
    }

    /// Loop period, never shorter than the busy-spin floor.
    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(MIN_TICK_MS))
    }
}

const MIN_TICK_MS: u64 = 20;

/// Balance constants for the simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub base_gain: f64,
    pub base_work_delay: f64,
    pub min_work_delay: f64,
    pub global_money_multiplier: f64,
    pub scientific_exponent: i32,

    pub work_debounce_ms: u64,
    pub reset_cooldown_ms: u64,
    pub max_auto_cycles_per_tick: u32,

    pub focus_per_work: f64,
    pub focus_max: f64,
    pub focus_cost: f64,
    pub focus_duration_secs: f64,
    pub focus_delay_factor: f64,

    pub motivation_max: f64,
    pub motivation_regen: f64,
    pub motivation_cap_multiplier: f64,

    pub charge_rate: f64,
    pub charge_max: f64,
    /// `(charge needed, gain multiplier)` in ascending order.
    pub charge_thresholds: Vec<(f64, f64)>,

    pub inspiration_threshold: f64,
    pub inspiration_divisor: f64,
    pub inspiration_exponent: f64,
    pub inspiration_log_base: f64,
    pub concepts_threshold: f64,
    pub concepts_divisor: f64,
    pub concepts_exponent: f64,
    pub concepts_log_base: f64,
    pub stability_exponent: f64,
    pub stability_multiplier: f64,

    pub wake_base_cap: f64,
    pub wake_warning_secs: f64,

    pub resonance: ResonanceTuning,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            base_gain: 1.0,
            base_work_delay: 6.7,
            min_work_delay: 0.2,
            global_money_multiplier: 1.0,
            scientific_exponent: DEFAULT_SCIENTIFIC_EXPONENT,

            work_debounce_ms: 100,
            reset_cooldown_ms: 50,
            max_auto_cycles_per_tick: 1_000,

            focus_per_work: 4.0,
            focus_max: 100.0,
            focus_cost: 100.0,
            focus_duration_secs: 20.0,
            focus_delay_factor: 0.5,

            motivation_max: 100.0,
            motivation_regen: 0.5,
            motivation_cap_multiplier: 2.0,

            charge_rate: 1.0,
            charge_max: 3_600.0,
            charge_thresholds: vec![(30.0, 1.1), (120.0, 1.25), (600.0, 1.5), (1_800.0, 2.0)],

            inspiration_threshold: 100_000.0,
            inspiration_divisor: 100_000.0,
            inspiration_exponent: 0.35,
            inspiration_log_base: 1.5,
            concepts_threshold: 1_000_000.0,
            concepts_divisor: 1_000_000.0,
            concepts_exponent: 0.30,
            concepts_log_base: 1.4,
            stability_exponent: 0.2,
            stability_multiplier: 1.0,

            wake_base_cap: 600.0,
            wake_warning_secs: 30.0,

            resonance: ResonanceTuning::default(),
        }
    }
}

impl Tuning {
    pub fn work_debounce(&self) -> Duration {
        Duration::from_millis(self.work_debounce_ms.max(100))
    }

    pub fn reset_cooldown(&self) -> Duration {
        Duration::from_millis(self.reset_cooldown_ms.max(50))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResonanceTuning {
    pub start_value: f64,
    pub start_target: f64,
    pub base_instability: f64,
    pub min_instability: f64,
    pub stabilizer_decay: f64,
    pub drift_rate: f64,
    pub jitter: f64,
    /// Expected large jumps per second at instability 1.0.
    pub jump_rate: f64,
    pub jump_size: f64,
    pub target_min: f64,
    pub target_max: f64,
    pub target_width: f64,
    pub in_tune_bonus: f64,
    pub cooldown_min: f64,
    pub cooldown_max: f64,
    pub cooldown_narrow_per_level: f64,
    pub bias_per_level: f64,
    pub bias_cap: f64,
    pub max_step_secs: f64,
    pub max_steps: u32,
}

impl Default for ResonanceTuning {
    fn default() -> Self {
        Self {
            start_value: 50.0,
            start_target: 50.0,
            base_instability: 1.0,
            min_instability: 0.15,
            stabilizer_decay: 0.82,
            drift_rate: 3.0,
            jitter: 1.5,
            jump_rate: 0.05,
            jump_size: 20.0,
            target_min: 10.0,
            target_max: 90.0,
            target_width: 15.0,
            in_tune_bonus: 1.5,
            cooldown_min: 1.5,
            cooldown_max: 6.0,
            cooldown_narrow_per_level: 0.35,
            bias_per_level: 0.05,
            bias_cap: 0.25,
            max_step_secs: 0.5,
            max_steps: 240,
        }
    }
}
