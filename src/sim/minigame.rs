use super::state::GameState;
use rand::Rng;
use std::panic::{self, AssertUnwindSafe};
use thiserror::Error;
use tracing::warn;

/// A side game that takes the player's money and hands back a new balance.
pub trait MoneyMinigame {
    fn name(&self) -> &str;
    fn run(&mut self, money: f64) -> Result<f64, MinigameError>;
}

#[derive(Debug, Error, PartialEq)]
pub enum MinigameError {
    #[error("{0}")]
    Aborted(String),
    #[error("returned an invalid balance {0}")]
    InvalidBalance(f64),
    #[error("crashed: {0}")]
    Crashed(String),
}

/// Runs the minigame against `state.money`. Any failure restores the pre-game balance.
pub fn play(state: &mut GameState, minigame: &mut dyn MoneyMinigame) -> Result<f64, MinigameError> {
    let snapshot = state.money;
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| minigame.run(snapshot)))
        .unwrap_or_else(|payload| Err(MinigameError::Crashed(panic_message(payload.as_ref()))));
    match outcome {
        Ok(balance) if balance.is_finite() && balance >= 0.0 => {
            state.money = balance;
            Ok(balance - snapshot)
        }
        Ok(balance) => {
            state.money = snapshot;
            warn!(game = minigame.name(), balance, "minigame returned a bad balance");
            Err(MinigameError::InvalidBalance(balance))
        }
        Err(err) => {
            state.money = snapshot;
            warn!(game = minigame.name(), %err, "minigame failed; money restored");
            Err(err)
        }
    }
}

/// Stakes a fixed share of the balance on a fair coin.
pub struct CoinToss<R> {
    rng: R,
    stake_fraction: f64,
}

impl<R: Rng> CoinToss<R> {
    pub fn new(rng: R, stake_fraction: f64) -> Self {
        Self {
            rng,
            stake_fraction: stake_fraction.clamp(0.0, 1.0),
        }
    }
}

impl<R: Rng> MoneyMinigame for CoinToss<R> {
    fn name(&self) -> &str {
        "Coin toss"
    }

    fn run(&mut self, money: f64) -> Result<f64, MinigameError> {
        if money <= 0.0 {
            return Err(MinigameError::Aborted("nothing to stake".to_string()));
        }
        let stake = money * self.stake_fraction;
        if self.rng.gen_bool(0.5) {
            Ok(money + stake)
        } else {
            Ok(money - stake)
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        text.to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Result<f64, MinigameError>);

    impl MoneyMinigame for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn run(&mut self, _money: f64) -> Result<f64, MinigameError> {
            match &self.0 {
                Ok(value) => Ok(*value),
                Err(MinigameError::Aborted(reason)) => Err(MinigameError::Aborted(reason.clone())),
                Err(_) => Err(MinigameError::Aborted("other".to_string())),
            }
        }
    }

    struct Exploding;

    impl MoneyMinigame for Exploding {
        fn name(&self) -> &str {
            "exploding"
        }

        fn run(&mut self, _money: f64) -> Result<f64, MinigameError> {
            panic!("dealer fell over");
        }
    }

    #[test]
    fn returned_balance_becomes_money() {
        let mut state = GameState::default();
        state.money = 100.0;
        let delta = play(&mut state, &mut Fixed(Ok(160.0))).expect("game succeeds");
        assert!((delta - 60.0).abs() < f64::EPSILON);
        assert!((state.money - 160.0).abs() < f64::EPSILON);
        assert!(state.money_since_reset.abs() < f64::EPSILON);
    }

    #[test]
    fn failures_restore_the_snapshot() {
        let mut state = GameState::default();
        state.money = 100.0;
        let aborted = play(&mut state, &mut Fixed(Err(MinigameError::Aborted("quit".into()))));
        assert_eq!(aborted, Err(MinigameError::Aborted("quit".to_string())));
        assert!((state.money - 100.0).abs() < f64::EPSILON);

        let invalid = play(&mut state, &mut Fixed(Ok(f64::NAN)));
        assert!(matches!(invalid, Err(MinigameError::InvalidBalance(_))));
        assert!((state.money - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn coin_toss_moves_money_by_the_stake() {
        use rand::SeedableRng;
        use rand::rngs::StdRng;

        let mut toss = CoinToss::new(StdRng::seed_from_u64(7), 0.1);
        for _ in 0..20 {
            let mut state = GameState::default();
            state.money = 100.0;
            let delta = play(&mut state, &mut toss).expect("toss settles");
            assert!((delta.abs() - 10.0).abs() < 1e-9);
        }
        let mut broke = GameState::default();
        assert!(matches!(
            play(&mut broke, &mut toss),
            Err(MinigameError::Aborted(_))
        ));
    }

    #[test]
    fn panics_are_caught_at_the_boundary() {
        let mut state = GameState::default();
        state.money = 42.0;
        let result = play(&mut state, &mut Exploding);
        assert_eq!(result, Err(MinigameError::Crashed("dealer fell over".to_string())));
        assert!((state.money - 42.0).abs() < f64::EPSILON);
    }
}
