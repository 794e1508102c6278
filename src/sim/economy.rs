use super::catalog::{self, Effect, Tree, UpgradeDef};
use super::resonance;
use super::state::GameState;
use crate::config::Tuning;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkYield {
    pub gain: f64,
    pub delay: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Accumulator {
    gain_add: f64,
    gain_mult: f64,
    delay_mult: f64,
}

impl Default for Accumulator {
    fn default() -> Self {
        Self {
            gain_add: 0.0,
            gain_mult: 1.0,
            delay_mult: 1.0,
        }
    }
}

/// Owned upgrades in fold order: Desk, then Hall, then Archive.
pub fn owned_effects(state: &GameState) -> Vec<(&'static UpgradeDef, u32)> {
    let desk = state
        .upgrade_levels
        .iter()
        .filter_map(|(id, level)| Some((catalog::find(Tree::Desk, id)?, *level)));
    let hall = state
        .inspiration_upgrades
        .iter()
        .filter_map(|entry| Some((catalog::find(Tree::Hall, &entry.id)?, entry.level)));
    let archive = state
        .concept_upgrades
        .iter()
        .filter_map(|entry| Some((catalog::find(Tree::Archive, &entry.id)?, entry.level)));
    desk.chain(hall)
        .chain(archive)
        .filter(|(_, level)| *level > 0)
        .collect()
}

/// Gain per work cycle and the cycle delay. Only writes unlock flags, and only ever sets them.
pub fn compute_gain_and_delay(
    state: &mut GameState,
    tuning: &Tuning,
    auto: bool,
    now: f64,
) -> WorkYield {
    let mut acc = Accumulator::default();
    for (def, level) in owned_effects(state) {
        let value = |scaling: catalog::Scaling| scaling.value_at(level).unwrap_or(1.0);
        match def.effect {
            Effect::FlatGain(scaling) => acc.gain_add += scaling.value_at(level).unwrap_or(0.0),
            Effect::GainMult(scaling) => acc.gain_mult *= value(scaling),
            Effect::AutoGainMult(scaling) => {
                if auto {
                    acc.gain_mult *= value(scaling);
                }
            }
            Effect::DelayMult(scaling) => acc.delay_mult *= value(scaling),
            Effect::Unlock(unlock) => state.grant_unlock(unlock),
            Effect::InspirationMult(_) | Effect::ConceptMult(_) | Effect::Stabilizer => {}
        }
    }

    acc.gain_mult *= motivation_multiplier(state, tuning);
    acc.gain_mult *= charge_multiplier(state, tuning);
    if focus_active(state, now) {
        acc.delay_mult *= tuning.focus_delay_factor;
    }
    if state.layer >= 2 {
        acc.gain_mult *= resonance::efficiency(state, &tuning.resonance);
    }

    let gain = (tuning.base_gain * acc.gain_mult + acc.gain_add)
        * tuning.global_money_multiplier
        * state.money_mult;
    let delay = (tuning.base_work_delay * acc.delay_mult).max(tuning.min_work_delay);
    WorkYield { gain, delay }
}

pub fn motivation_multiplier(state: &GameState, tuning: &Tuning) -> f64 {
    if !state.motivation_unlocked {
        return 1.0;
    }
    let fill = (state.motivation / tuning.motivation_max.max(1e-6)).clamp(0.0, 1.0);
    1.0 + (tuning.motivation_cap_multiplier - 1.0) * fill
}

/// `1.5^log10(charge + 0.1)`; defined at zero charge.
pub fn charge_bonus(charge: f64) -> f64 {
    1.5_f64.powf((charge.max(0.0) + 0.1).log10())
}

pub fn charge_multiplier(state: &GameState, tuning: &Tuning) -> f64 {
    let crossed = tuning
        .charge_thresholds
        .iter()
        .filter(|(needed, _)| state.best_charge >= *needed)
        .map(|(_, mult)| *mult)
        .last();
    match crossed {
        Some(mult) => 1.0 + (mult - 1.0) * charge_bonus(state.charge),
        None => 1.0,
    }
}

pub fn focus_active(state: &GameState, now: f64) -> bool {
    now < state.focus_active_until
}

/// Applies one work cycle. Returns false without touching state while the wake timer is exhausted.
pub fn perform_work(
    state: &mut GameState,
    tuning: &Tuning,
    work: WorkYield,
    manual: bool,
) -> bool {
    if state.wake_exhausted() {
        return false;
    }
    state.money += work.gain;
    state.money_since_reset += work.gain;
    state.total_money_earned += work.gain;
    if state.motivation_unlocked {
        state.motivation = (state.motivation - 1.0).max(0.0);
    }
    if manual {
        if state.focus_unlocked {
            state.focus = (state.focus + tuning.focus_per_work).min(tuning.focus_max);
        }
    } else {
        state.work_timer = (state.work_timer - work.delay).max(0.0);
    }
    true
}

#[derive(Debug, Error, PartialEq)]
pub enum FocusError {
    #[error("focus is not unlocked yet")]
    Locked,
    #[error("focus is already burning")]
    AlreadyActive,
    #[error("need {needed:.0} focus")]
    NotEnough { needed: f64 },
}

pub fn activate_focus(state: &mut GameState, tuning: &Tuning, now: f64) -> Result<f64, FocusError> {
    if !state.focus_unlocked {
        return Err(FocusError::Locked);
    }
    if focus_active(state, now) {
        return Err(FocusError::AlreadyActive);
    }
    if state.focus < tuning.focus_cost {
        return Err(FocusError::NotEnough {
            needed: tuning.focus_cost,
        });
    }
    state.focus -= tuning.focus_cost;
    state.focus_active_until = now + tuning.focus_duration_secs;
    Ok(state.focus_active_until)
}

/// Motivation regeneration and charge build-up. Returns multipliers of newly crossed charge thresholds.
pub fn accumulate(state: &mut GameState, tuning: &Tuning, secs: f64) -> Vec<f64> {
    if state.motivation_unlocked {
        state.motivation = (state.motivation + tuning.motivation_regen * secs).min(tuning.motivation_max);
    }
    let mut crossed = Vec::new();
    if !state.charge_unlocked {
        return crossed;
    }
    state.charge = (state.charge + tuning.charge_rate * secs).min(tuning.charge_max);
    state.best_charge = state.best_charge.max(state.charge);
    while let Some((needed, mult)) = tuning
        .charge_thresholds
        .get(state.charge_threshold as usize)
        .copied()
    {
        if state.best_charge < needed {
            break;
        }
        state.charge_threshold += 1;
        crossed.push(mult);
    }
    crossed
}

/// Product of every owned multiplier of the given kind across all trees.
pub fn reward_multiplier(state: &GameState, select: fn(&Effect) -> Option<catalog::Scaling>) -> f64 {
    owned_effects(state)
        .into_iter()
        .filter_map(|(def, level)| select(&def.effect)?.value_at(level))
        .product()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::DriftDir;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn bare_state_yields_base_constants() {
        let tuning = Tuning::default();
        let mut state = GameState::default();
        let work = compute_gain_and_delay(&mut state, &tuning, false, 0.0);
        assert!(approx(work.gain, 1.0));
        assert!(approx(work.delay, 6.7));
    }

    #[test]
    fn unscaled_flat_gain_ignores_level() {
        let tuning = Tuning::default();
        let mut state = GameState::default();
        state.set_level(Tree::Desk, "desk_lamp", 2);
        let work = compute_gain_and_delay(&mut state, &tuning, false, 0.0);
        assert!(approx(work.gain, 1.0 + 4.0));

        state.set_level(Tree::Desk, "desk_lamp", 5);
        let work = compute_gain_and_delay(&mut state, &tuning, false, 0.0);
        assert!(approx(work.gain, 5.0));
    }

    #[test]
    fn scaled_flat_gain_grows_per_level() {
        let tuning = Tuning::default();
        let mut state = GameState::default();
        state.set_level(Tree::Desk, "sharpen_pencil", 3);
        let work = compute_gain_and_delay(&mut state, &tuning, false, 0.0);
        assert!(approx(work.gain, 1.0 + 1.12 * 1.12));
    }

    #[test]
    fn auto_only_multiplier_skips_manual_work() {
        let tuning = Tuning::default();
        let mut state = GameState::default();
        state.set_level(Tree::Desk, "momentum", 1);
        let manual = compute_gain_and_delay(&mut state, &tuning, false, 0.0);
        let auto = compute_gain_and_delay(&mut state, &tuning, true, 0.0);
        assert!(approx(manual.gain, 1.0));
        assert!(approx(auto.gain, 1.5));
    }

    #[test]
    fn multipliers_fold_across_all_three_trees() {
        let tuning = Tuning::default();
        let mut state = GameState::default();
        state.set_level(Tree::Desk, "notebook", 2);
        state.set_level(Tree::Hall, "muse", 1);
        state.set_level(Tree::Archive, "framework", 1);
        state.set_level(Tree::Desk, "ergonomic_chair", 1);
        let work = compute_gain_and_delay(&mut state, &tuning, false, 0.0);
        assert!(approx(work.gain, 1.5 * 1.15 * 2.0 * 3.0));
        assert!(approx(work.delay, 6.7 * 0.9));
    }

    #[test]
    fn unlock_flags_are_set_and_stay_set() {
        let tuning = Tuning::default();
        let mut state = GameState::default();
        state.set_level(Tree::Desk, "autopilot", 1);
        compute_gain_and_delay(&mut state, &tuning, false, 0.0);
        compute_gain_and_delay(&mut state, &tuning, false, 0.0);
        assert!(state.auto_unlocked);
        state.set_level(Tree::Desk, "autopilot", 0);
        compute_gain_and_delay(&mut state, &tuning, false, 0.0);
        assert!(state.auto_unlocked);
    }

    #[test]
    fn delay_respects_floor_and_focus() {
        let tuning = Tuning::default();
        let mut state = GameState::default();
        state.focus_active_until = 100.0;
        let focused = compute_gain_and_delay(&mut state, &tuning, false, 50.0);
        assert!(approx(focused.delay, 6.7 * tuning.focus_delay_factor));
        let expired = compute_gain_and_delay(&mut state, &tuning, false, 100.0);
        assert!(approx(expired.delay, 6.7));

        state.set_level(Tree::Desk, "ergonomic_chair", 8);
        state.set_level(Tree::Desk, "standing_desk", 6);
        state.set_level(Tree::Hall, "quick_hands", 6);
        let mut tight = tuning.clone();
        tight.min_work_delay = 3.0;
        let floored = compute_gain_and_delay(&mut state, &tight, false, 0.0);
        assert!(approx(floored.delay, 3.0));
    }

    #[test]
    fn resonance_only_counts_from_layer_two() {
        let tuning = Tuning::default();
        let mut state = GameState::default();
        state.resonance_val = 50.0;
        state.resonance_target = 50.0;
        state.resonance_drift_dir = DriftDir::Falling;
        state.layer = 1;
        assert!(approx(compute_gain_and_delay(&mut state, &tuning, false, 0.0).gain, 1.0));
        state.layer = 2;
        assert!(approx(compute_gain_and_delay(&mut state, &tuning, false, 0.0).gain, 1.5));
    }

    #[test]
    fn charge_bonus_is_defined_at_zero() {
        assert!(approx(charge_bonus(0.0), 1.0 / 1.5));
        assert!(charge_bonus(1_000.0) > charge_bonus(10.0));
    }

    #[test]
    fn charge_multiplier_uses_highest_crossed_threshold() {
        let tuning = Tuning::default();
        let mut state = GameState::default();
        assert!(approx(charge_multiplier(&state, &tuning), 1.0));
        state.best_charge = 150.0;
        state.charge = 9.9;
        // 1.5^log10(10) == 1.5
        assert!(approx(charge_multiplier(&state, &tuning), 1.0 + 0.25 * 1.5));
    }

    #[test]
    fn accumulate_reports_each_threshold_once() {
        let tuning = Tuning::default();
        let mut state = GameState::default();
        state.charge_unlocked = true;
        let crossed = accumulate(&mut state, &tuning, 200.0);
        assert_eq!(crossed, vec![1.1, 1.25]);
        assert_eq!(state.charge_threshold, 2);
        assert!(accumulate(&mut state, &tuning, 1.0).is_empty());
        let huge = accumulate(&mut state, &tuning, 1e9);
        assert_eq!(huge, vec![1.5, 2.0]);
        assert!(approx(state.charge, tuning.charge_max));
    }

    #[test]
    fn motivation_scales_gain_and_drains_per_cycle() {
        let tuning = Tuning::default();
        let mut state = GameState::default();
        state.motivation_unlocked = true;
        let full = compute_gain_and_delay(&mut state, &tuning, false, 0.0);
        assert!(approx(full.gain, tuning.motivation_cap_multiplier));
        assert!(perform_work(&mut state, &tuning, full, true));
        assert!(approx(state.motivation, tuning.motivation_max - 1.0));

        state.motivation = 0.3;
        assert!(perform_work(&mut state, &tuning, full, true));
        assert!(approx(state.motivation, 0.0));
    }

    #[test]
    fn perform_work_refuses_when_awake_time_is_gone() {
        let tuning = Tuning::default();
        let mut state = GameState::default();
        state.wake_timer = 0.0;
        state.wake_locked = true;
        let before = state.clone();
        let work = WorkYield { gain: 5.0, delay: 1.0 };
        assert!(!perform_work(&mut state, &tuning, work, true));
        assert_eq!(state, before);

        state.wake_timer_infinite = true;
        assert!(perform_work(&mut state, &tuning, work, true));
        assert!(approx(state.money, 5.0));
    }

    #[test]
    fn only_automatic_work_consumes_the_work_timer() {
        let tuning = Tuning::default();
        let mut state = GameState::default();
        state.work_timer = 10.0;
        let work = WorkYield { gain: 1.0, delay: 4.0 };
        perform_work(&mut state, &tuning, work, true);
        assert!(approx(state.work_timer, 10.0));
        perform_work(&mut state, &tuning, work, false);
        assert!(approx(state.work_timer, 6.0));
        assert!(approx(state.money_since_reset, 2.0));
    }

    #[test]
    fn focus_activation_spends_the_bar() {
        let tuning = Tuning::default();
        let mut state = GameState::default();
        assert_eq!(activate_focus(&mut state, &tuning, 0.0), Err(FocusError::Locked));
        state.focus_unlocked = true;
        assert!(matches!(
            activate_focus(&mut state, &tuning, 0.0),
            Err(FocusError::NotEnough { .. })
        ));
        state.focus = tuning.focus_max;
        let until = activate_focus(&mut state, &tuning, 10.0).expect("focus fires");
        assert!(approx(until, 10.0 + tuning.focus_duration_secs));
        assert_eq!(activate_focus(&mut state, &tuning, 11.0), Err(FocusError::AlreadyActive));
    }

    #[test]
    fn reward_multiplier_multiplies_matching_effects() {
        let mut state = GameState::default();
        let inspiration = |effect: &Effect| match effect {
            Effect::InspirationMult(scaling) => Some(*scaling),
            _ => None,
        };
        assert!(approx(reward_multiplier(&state, inspiration), 1.0));
        state.set_level(Tree::Hall, "inspire_rate", 1);
        state.set_level(Tree::Archive, "inspire_mult", 1);
        assert!(approx(reward_multiplier(&state, inspiration), 1.25 * 1.5));
    }
}
