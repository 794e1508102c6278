use super::catalog::Effect;
use super::economy;
use super::state::GameState;
use super::wake_timer;
use crate::config::Tuning;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetKind {
    /// Money into inspiration; opens the Hall.
    Inspiration,
    /// Money into concepts; opens the Archive and costs the Hall.
    Concept,
}

impl ResetKind {
    pub fn label(self) -> &'static str {
        match self {
            ResetKind::Inspiration => "Hall",
            ResetKind::Concept => "Archive",
        }
    }

    pub fn threshold(self, tuning: &Tuning) -> f64 {
        match self {
            ResetKind::Inspiration => tuning.inspiration_threshold,
            ResetKind::Concept => tuning.concepts_threshold,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ResetError {
    #[error("need {needed:.0} money earned since the last reset (have {have:.0})")]
    BelowThreshold { needed: f64, have: f64 },
    #[error("reset already in progress")]
    CoolingDown,
}

/// `floor(n^exponent × log_base(n + 1) × multiplier)` with `n = pool / divisor`; never negative.
fn concave_reward(pool: f64, divisor: f64, exponent: f64, log_base: f64, multiplier: f64) -> f64 {
    let normalized = pool.max(0.0) / divisor.max(1e-6);
    let log_base = log_base.max(1.0 + 1e-6);
    let raw = normalized.powf(exponent) * ((normalized + 1.0).ln() / log_base.ln());
    let reward = (raw * multiplier.max(0.0)).floor();
    if reward.is_finite() { reward.max(0.0) } else { 0.0 }
}

pub fn inspiration_multiplier(state: &GameState) -> f64 {
    economy::reward_multiplier(state, |effect| match effect {
        Effect::InspirationMult(scaling) => Some(*scaling),
        _ => None,
    })
}

pub fn concept_multiplier(state: &GameState) -> f64 {
    economy::reward_multiplier(state, |effect| match effect {
        Effect::ConceptMult(scaling) => Some(*scaling),
        _ => None,
    })
}

pub fn inspiration_reward(state: &GameState, tuning: &Tuning) -> f64 {
    concave_reward(
        state.money_since_reset,
        tuning.inspiration_divisor,
        tuning.inspiration_exponent,
        tuning.inspiration_log_base,
        inspiration_multiplier(state),
    )
}

pub fn concept_reward(state: &GameState, tuning: &Tuning) -> f64 {
    concave_reward(
        state.money_since_reset,
        tuning.concepts_divisor,
        tuning.concepts_exponent,
        tuning.concepts_log_base,
        concept_multiplier(state),
    )
}

pub fn stability_reward(state: &GameState, tuning: &Tuning) -> f64 {
    let pool = state.money.max(state.money_since_reset).max(0.0);
    let raw = ((pool + 1.0).powf(tuning.stability_exponent) * tuning.stability_multiplier).floor();
    if raw.is_finite() { raw.max(1.0) } else { 1.0 }
}

pub fn reward_for(kind: ResetKind, state: &GameState, tuning: &Tuning) -> f64 {
    match kind {
        ResetKind::Inspiration => inspiration_reward(state, tuning),
        ResetKind::Concept => concept_reward(state, tuning),
    }
}

pub fn is_eligible(kind: ResetKind, state: &GameState, tuning: &Tuning) -> bool {
    state.money_since_reset >= kind.threshold(tuning)
}

/// Forced by wake-timer depletion. Leaves layer, inspiration and concepts alone.
pub fn collapse(state: &mut GameState, tuning: &Tuning) -> f64 {
    let reward = stability_reward(state, tuning);
    state.stability += reward;
    state.stability_resets += 1;

    wipe_desk(state);
    state.motivation = 0.0;

    wake_timer::recalc_state(state, tuning);
    state.wake_timer = state.wake_timer_cap;
    state.wake_locked = false;
    state.wake_warned = false;
    state.needs_reset = false;
    info!(
        reward,
        stability = state.stability,
        collapses = state.stability_resets,
        "wake timer collapsed the run"
    );
    reward
}

pub fn reset(kind: ResetKind, state: &mut GameState, tuning: &Tuning) -> Result<f64, ResetError> {
    match kind {
        ResetKind::Inspiration => reset_inspiration(state, tuning),
        ResetKind::Concept => reset_concepts(state, tuning),
    }
}

pub fn reset_inspiration(state: &mut GameState, tuning: &Tuning) -> Result<f64, ResetError> {
    check_threshold(ResetKind::Inspiration, state, tuning)?;
    let reward = inspiration_reward(state, tuning);
    state.inspiration += reward;

    wipe_for_reset(state);
    state.inspiration_unlocked = true;
    state.layer = state.layer.max(1);
    state.inspiration_resets += 1;
    info!(reward, layer = state.layer, "reset to the Hall");
    Ok(reward)
}

pub fn reset_concepts(state: &mut GameState, tuning: &Tuning) -> Result<f64, ResetError> {
    check_threshold(ResetKind::Concept, state, tuning)?;
    let reward = concept_reward(state, tuning);
    state.concepts += reward;

    wipe_for_reset(state);
    state.inspiration_upgrades.clear();
    state.inspiration = 0.0;
    state.resonance_val = tuning.resonance.start_value;
    state.concepts_unlocked = true;
    state.layer = state.layer.max(2);
    state.concept_resets += 1;
    info!(reward, layer = state.layer, "reset to the Archive");
    Ok(reward)
}

fn check_threshold(kind: ResetKind, state: &GameState, tuning: &Tuning) -> Result<(), ResetError> {
    if is_eligible(kind, state, tuning) {
        Ok(())
    } else {
        Err(ResetError::BelowThreshold {
            needed: kind.threshold(tuning),
            have: state.money_since_reset,
        })
    }
}

fn wipe_desk(state: &mut GameState) {
    state.money = 0.0;
    state.money_since_reset = 0.0;
    state.focus = 0.0;
    state.focus_active_until = 0.0;
    state.charge = 0.0;
    state.best_charge = 0.0;
    state.charge_threshold = 0;
    state.work_timer = 0.0;
    state.owned_upgrades.clear();
    state.upgrade_levels.clear();
}

fn wipe_for_reset(state: &mut GameState) {
    wipe_desk(state);
    state.focus_unlocked = false;
    state.charge_unlocked = false;
}
