//! Resonance tuning: the value wanders, the target wanders, and output follows how close they are.

use super::catalog::Effect;
use super::economy;
use super::state::{DriftDir, GameState};
use crate::config::ResonanceTuning;
use rand::Rng;

pub fn stabilizer_level(state: &GameState) -> u32 {
    economy::owned_effects(state)
        .into_iter()
        .filter(|(def, _)| matches!(def.effect, Effect::Stabilizer))
        .map(|(_, level)| level)
        .sum()
}

pub fn instability(state: &GameState, tuning: &ResonanceTuning) -> f64 {
    let level = stabilizer_level(state) as i32;
    (tuning.base_instability * tuning.stabilizer_decay.powi(level)).max(tuning.min_instability)
}

/// Advances the walk by `delta` seconds, sub-stepping long gaps so rates hold.
pub fn update(state: &mut GameState, tuning: &ResonanceTuning, delta: f64, rng: &mut impl Rng) {
    if state.layer < 2 || delta.is_nan() || delta <= 0.0 {
        return;
    }
    let level = stabilizer_level(state);
    let instability = instability(state, tuning);
    let steps = (delta / tuning.max_step_secs.max(1e-3))
        .ceil()
        .clamp(1.0, tuning.max_steps.max(1) as f64) as u32;
    let dt = delta / steps as f64;
    for _ in 0..steps {
        step(state, tuning, level, instability, dt, rng);
    }
}

fn step(
    state: &mut GameState,
    tuning: &ResonanceTuning,
    level: u32,
    instability: f64,
    dt: f64,
    rng: &mut impl Rng,
) {
    state.resonance_target += rng.gen_range(-0.5..0.5) * dt * 10.0 * instability;
    state.resonance_target = state
        .resonance_target
        .clamp(tuning.target_min, tuning.target_max);

    state.resonance_repick_cooldown -= dt;
    if state.resonance_repick_cooldown <= 0.0 {
        state.resonance_drift_dir = pick_direction(state, tuning, level, rng);
        state.resonance_repick_cooldown = roll_cooldown(tuning, level, rng);
    }

    let drift = tuning.drift_rate * (0.75 + instability) * dt;
    let jitter = rng.gen_range(-1.0..1.0) * tuning.jitter * instability * dt;
    state.resonance_val += state.resonance_drift_dir.sign() * drift + jitter;

    // Poisson arrival over dt, so one long step cannot exceed certainty
    let jump_chance = 1.0 - (-tuning.jump_rate * instability * dt).exp();
    if rng.gen_bool(jump_chance.clamp(0.0, 1.0)) {
        state.resonance_val += rng.gen_range(-1.0..1.0) * tuning.jump_size * instability;
    }

    if state.resonance_val <= 0.0 {
        state.resonance_val = 0.0;
        state.resonance_drift_dir = DriftDir::Rising;
    } else if state.resonance_val >= 100.0 {
        state.resonance_val = 100.0;
        state.resonance_drift_dir = DriftDir::Falling;
    }
}

fn pick_direction(
    state: &GameState,
    tuning: &ResonanceTuning,
    level: u32,
    rng: &mut impl Rng,
) -> DriftDir {
    let toward = if state.resonance_target >= state.resonance_val {
        DriftDir::Rising
    } else {
        DriftDir::Falling
    };
    let bias = (tuning.bias_per_level * level as f64).min(tuning.bias_cap);
    if rng.gen_bool((0.5 + bias).clamp(0.0, 1.0)) {
        toward
    } else {
        toward.flipped()
    }
}

fn roll_cooldown(tuning: &ResonanceTuning, level: u32, rng: &mut impl Rng) -> f64 {
    let upper = (tuning.cooldown_max - tuning.cooldown_narrow_per_level * level as f64)
        .max(tuning.cooldown_min);
    if upper <= tuning.cooldown_min {
        return tuning.cooldown_min;
    }
    rng.gen_range(tuning.cooldown_min..=upper)
}

/// Flat bonus inside the zone, accelerating falloff outside it.
pub fn efficiency(state: &GameState, tuning: &ResonanceTuning) -> f64 {
    let distance = (state.resonance_val - state.resonance_target).abs();
    let width = tuning.target_width;
    if distance <= width {
        return tuning.in_tune_bonus;
    }
    let overflow = distance - width;
    let normalized = (overflow / (100.0 - width).max(1e-6)).min(1.0);
    let penalty = normalized.powf(0.7) * 1.25;
    (1.0 - penalty).max(0.0)
}

pub fn in_tune(state: &GameState, tuning: &ResonanceTuning) -> bool {
    (state.resonance_val - state.resonance_target).abs() <= tuning.target_width
}
