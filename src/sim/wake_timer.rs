use super::catalog;
use super::game::PurchaseError;
use super::prestige;
use super::state::GameState;
use crate::config::Tuning;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WakeEvent {
    RunningLow { remaining: f64 },
    Collapsed { reward: f64 },
}

/// Derives cap and the infinite flag from the owned wake upgrades, then re-clamps the timer.
pub fn recalc_state(state: &mut GameState, tuning: &Tuning) {
    let owned: Vec<&catalog::WakeUpgradeDef> = state
        .wake_timer_upgrades
        .iter()
        .filter_map(|id| catalog::find_wake(id))
        .collect();
    state.wake_timer_cap = tuning.wake_base_cap + owned.iter().map(|def| def.time_bonus).sum::<f64>();
    state.wake_timer_infinite = owned.iter().any(|def| def.infinite);

    if state.wake_timer_infinite {
        state.wake_timer = state.wake_timer_cap;
        state.wake_locked = false;
        state.wake_warned = false;
        state.needs_reset = false;
    } else {
        if !state.wake_timer.is_finite() {
            state.wake_timer = state.wake_timer_cap;
        }
        state.wake_timer = state.wake_timer.clamp(0.0, state.wake_timer_cap);
        state.wake_locked = state.wake_timer <= 0.0;
    }
}

/// Drains the timer. Depletion collapses the run once per depletion, not once per tick.
pub fn tick(state: &mut GameState, tuning: &Tuning, delta: f64) -> Option<WakeEvent> {
    if state.wake_timer_infinite {
        return None;
    }
    state.wake_timer = (state.wake_timer - delta.max(0.0)).max(0.0);
    if state.wake_timer <= 0.0 {
        state.wake_locked = true;
        if state.needs_reset {
            return None;
        }
        state.needs_reset = true;
        let reward = prestige::collapse(state, tuning);
        return Some(WakeEvent::Collapsed { reward });
    }
    if !state.wake_warned && state.wake_timer <= tuning.wake_warning_secs {
        state.wake_warned = true;
        return Some(WakeEvent::RunningLow {
            remaining: state.wake_timer,
        });
    }
    None
}

/// Every purchase refills the timer to the new cap.
pub fn buy_upgrade(state: &mut GameState, tuning: &Tuning, id: &str) -> Result<f64, PurchaseError> {
    let def = catalog::find_wake(id).ok_or_else(|| PurchaseError::UnknownUpgrade { id: id.to_string() })?;
    if state.wake_timer_upgrades.contains(def.id) {
        return Err(PurchaseError::AlreadyOwned { name: def.name });
    }
    if state.stability < def.cost {
        return Err(PurchaseError::InsufficientFunds {
            cost: def.cost,
            currency: "stability",
        });
    }
    state.stability -= def.cost;
    state.wake_timer_upgrades.insert(def.id.to_string());
    recalc_state(state, tuning);
    state.wake_timer = state.wake_timer_cap;
    state.wake_locked = false;
    state.wake_warned = false;
    state.needs_reset = false;
    Ok(def.cost)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cap_sums_owned_bonuses() {
        let tuning = Tuning::default();
        let mut state = GameState::default();
        state.wake_timer_upgrades.insert("coffee".to_string());
        state.wake_timer_upgrades.insert("power_nap".to_string());
        recalc_state(&mut state, &tuning);
        assert!((state.wake_timer_cap - (tuning.wake_base_cap + 240.0)).abs() < 1e-9);
        assert!(!state.wake_timer_infinite);
    }

    #[test]
    fn infinite_grant_pins_timer_to_cap() {
        let tuning = Tuning::default();
        let mut state = GameState::default();
        state.wake_timer_upgrades.insert("coffee".to_string());
        state.wake_timer_upgrades.insert("power_nap".to_string());
        state.wake_timer_upgrades.insert("lucid_state".to_string());
        state.wake_timer = 0.0;
        state.wake_locked = true;
        state.needs_reset = true;
        recalc_state(&mut state, &tuning);
        assert!(state.wake_timer_infinite);
        assert!((state.wake_timer - state.wake_timer_cap).abs() < f64::EPSILON);
        assert!(!state.wake_locked && !state.needs_reset);

        assert_eq!(tick(&mut state, &tuning, 10_000.0), None);
        assert!((state.wake_timer - state.wake_timer_cap).abs() < f64::EPSILON);
    }

    #[test]
    fn recalc_clamps_and_locks() {
        let tuning = Tuning::default();
        let mut state = GameState::default();
        state.wake_timer = 10_000.0;
        recalc_state(&mut state, &tuning);
        assert!((state.wake_timer - tuning.wake_base_cap).abs() < f64::EPSILON);
        state.wake_timer = -3.0;
        recalc_state(&mut state, &tuning);
        assert!(state.wake_timer.abs() < f64::EPSILON);
        assert!(state.wake_locked);
    }

    #[test]
    fn depletion_collapses_exactly_once() {
        let tuning = Tuning::default();
        let mut state = GameState::default();
        state.money = 5_000.0;
        state.money_since_reset = 5_000.0;

        let event = tick(&mut state, &tuning, tuning.wake_base_cap + 1.0);
        assert!(matches!(event, Some(WakeEvent::Collapsed { .. })));
        assert_eq!(state.stability_resets, 1);
        assert!((state.wake_timer - state.wake_timer_cap).abs() < f64::EPSILON);
    }

    #[test]
    fn held_at_zero_does_not_retrigger() {
        let tuning = Tuning::default();
        let mut state = GameState::default();
        state.wake_timer = 0.0;
        state.needs_reset = true;
        for _ in 0..50 {
            assert_eq!(tick(&mut state, &tuning, 0.1), None);
        }
        assert_eq!(state.stability_resets, 0);
        assert!(state.wake_locked);
    }

    #[test]
    fn low_timer_warns_once() {
        let tuning = Tuning::default();
        let mut state = GameState::default();
        let drain = tuning.wake_base_cap - tuning.wake_warning_secs + 1.0;
        assert!(matches!(
            tick(&mut state, &tuning, drain),
            Some(WakeEvent::RunningLow { .. })
        ));
        assert_eq!(tick(&mut state, &tuning, 1.0), None);
    }

    #[test]
    fn purchase_spends_stability_and_refills() {
        let tuning = Tuning::default();
        let mut state = GameState::default();
        state.stability = 4.0;
        state.wake_timer = 12.0;

        assert_eq!(buy_upgrade(&mut state, &tuning, "power_nap"), Ok(3.0));
        assert!((state.stability - 1.0).abs() < f64::EPSILON);
        assert!((state.wake_timer - (tuning.wake_base_cap + 180.0)).abs() < 1e-9);

        assert!(matches!(
            buy_upgrade(&mut state, &tuning, "power_nap"),
            Err(PurchaseError::AlreadyOwned { .. })
        ));
        let before = state.clone();
        assert!(matches!(
            buy_upgrade(&mut state, &tuning, "sleep_schedule"),
            Err(PurchaseError::InsufficientFunds { .. })
        ));
        assert_eq!(state, before);
        assert!(matches!(
            buy_upgrade(&mut state, &tuning, "hibernate"),
            Err(PurchaseError::UnknownUpgrade { .. })
        ));
    }
}
