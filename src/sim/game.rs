use super::catalog::{self, Tree};
use super::economy::{self, FocusError, WorkYield};
use super::format::format_with_threshold;
use super::minigame::{self, CoinToss, MinigameError, MoneyMinigame};
use super::prestige::{self, ResetError, ResetKind};
use super::resonance;
use super::state::GameState;
use super::wake_timer::{self, WakeEvent};
use crate::config::Tuning;
use crate::input::Command;
use rand::rngs::ThreadRng;
use rand::thread_rng;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{debug, error, info};

const MAX_MESSAGES: usize = 10;
const WAGER_STAKE: f64 = 0.1;

/// Admits one event per window; events inside the window are dropped.
#[derive(Debug, Clone)]
pub struct Debounce {
    window: Duration,
    last: Option<Instant>,
}

impl Debounce {
    pub fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    pub fn allow(&mut self, now: Instant) -> bool {
        match self.last {
            Some(previous) if now.saturating_duration_since(previous) < self.window => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

pub fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs_f64())
        .unwrap_or(0.0)
}

pub struct Game {
    pub state: GameState,
    tuning: Tuning,
    rng: ThreadRng,
    messages: VecDeque<String>,
    work_gate: Debounce,
    purchase_gate: Debounce,
    inspiration_gate: Debounce,
    concept_gate: Debounce,
    manual_yield: WorkYield,
    auto_yield: WorkYield,
}

impl Game {
    pub fn fresh(tuning: Tuning) -> Self {
        Self::from_state(GameState::with_tuning(&tuning), tuning)
    }

    pub fn from_state(mut state: GameState, tuning: Tuning) -> Self {
        state.normalize(&tuning);
        wake_timer::recalc_state(&mut state, &tuning);
        let now = unix_now();
        let manual_yield = economy::compute_gain_and_delay(&mut state, &tuning, false, now);
        let auto_yield = economy::compute_gain_and_delay(&mut state, &tuning, true, now);
        Self {
            state,
            work_gate: Debounce::new(tuning.work_debounce()),
            purchase_gate: Debounce::new(tuning.work_debounce()),
            inspiration_gate: Debounce::new(tuning.reset_cooldown()),
            concept_gate: Debounce::new(tuning.reset_cooldown()),
            tuning,
            rng: thread_rng(),
            messages: VecDeque::with_capacity(MAX_MESSAGES),
            manual_yield,
            auto_yield,
        }
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Runs one update; a panic or a non-finite result rolls the state back to before the tick.
    pub fn tick(&mut self, delta: Duration) {
        let snapshot = self.state.clone();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.update(delta)));
        match outcome {
            Ok(()) if self.state.is_sane() => {}
            Ok(()) => {
                error!(?delta, "tick produced non-finite state; rolled back");
                self.state = snapshot;
                self.refresh_yields();
            }
            Err(_) => {
                error!(?delta, "tick panicked; rolled back");
                self.state = snapshot;
                self.refresh_yields();
            }
        }
    }

    pub fn update(&mut self, delta: Duration) {
        let secs = delta.as_secs_f64();
        if secs <= 0.0 {
            return;
        }
        self.state.play_time += secs;

        match wake_timer::tick(&mut self.state, &self.tuning, secs) {
            Some(WakeEvent::RunningLow { remaining }) => {
                self.push_message(format!("You are fading: {remaining:.0}s of wakefulness left."));
            }
            Some(WakeEvent::Collapsed { reward }) => {
                let reward = self.format_amount(reward);
                self.push_message(format!(
                    "You collapsed from exhaustion. The desk is cleared. +{reward} stability."
                ));
            }
            None => {}
        }

        for mult in economy::accumulate(&mut self.state, &self.tuning, secs) {
            self.push_message(format!("Charge threshold reached: up to x{mult:.2} output."));
        }

        resonance_update(&mut self.state, &self.tuning, secs, &mut self.rng);
        self.run_automation(secs);
        self.refresh_yields();
    }

    fn run_automation(&mut self, secs: f64) {
        if !(self.state.auto_unlocked && self.state.auto_enabled) {
            self.state.work_timer = 0.0;
            return;
        }
        self.state.work_timer += secs;
        let mut cycles = 0_u32;
        let mut earned = 0.0;
        loop {
            let work = economy::compute_gain_and_delay(&mut self.state, &self.tuning, true, unix_now());
            if self.state.work_timer < work.delay {
                break;
            }
            if cycles >= self.tuning.max_auto_cycles_per_tick
                || !economy::perform_work(&mut self.state, &self.tuning, work, false)
            {
                self.state.work_timer = self.state.work_timer.min(work.delay);
                break;
            }
            cycles += 1;
            earned += work.gain;
        }
        if cycles > 0 {
            debug!(cycles, earned, "automatic work");
        }
    }

    fn refresh_yields(&mut self) {
        let now = unix_now();
        self.manual_yield = economy::compute_gain_and_delay(&mut self.state, &self.tuning, false, now);
        self.auto_yield = economy::compute_gain_and_delay(&mut self.state, &self.tuning, true, now);
    }

    pub fn manual_yield(&self) -> WorkYield {
        self.manual_yield
    }

    pub fn auto_yield(&self) -> WorkYield {
        self.auto_yield
    }

    /// Manual work; repeats inside the debounce window are dropped.
    pub fn work(&mut self, now: Instant) -> bool {
        if !self.work_gate.allow(now) {
            return false;
        }
        let work = economy::compute_gain_and_delay(&mut self.state, &self.tuning, false, unix_now());
        if economy::perform_work(&mut self.state, &self.tuning, work, true) {
            true
        } else {
            self.push_message("Too exhausted to work.".to_string());
            false
        }
    }

    pub fn apply(&mut self, command: &Command, now: Instant) {
        debug!(%command, "applying command");
        match command {
            Command::Work => {
                self.work(now);
            }
            Command::Buy { tree, id } => {
                if !self.purchase_gate.allow(now) {
                    return;
                }
                if let Err(err) = self.buy(*tree, id) {
                    self.push_message(format!("Purchase failed: {err}"));
                }
            }
            Command::BuyWake(id) => {
                if !self.purchase_gate.allow(now) {
                    return;
                }
                if let Err(err) = self.buy_wake(id) {
                    self.push_message(format!("Purchase failed: {err}"));
                }
            }
            Command::Reset(kind) => match self.reset(*kind, now) {
                Ok(_) | Err(ResetError::CoolingDown) => {}
                Err(err) => self.push_message(format!("{} reset unavailable: {err}", kind.label())),
            },
            Command::ToggleAuto => self.toggle_auto(),
            Command::Focus => {
                if let Err(err) = self.activate_focus() {
                    self.push_message(format!("Focus failed: {err}"));
                }
            }
            Command::Wager => {
                let mut toss = CoinToss::new(thread_rng(), WAGER_STAKE);
                // outcome already reported to the journal
                let _ = self.play_minigame(&mut toss);
            }
            Command::Save | Command::Quit => {}
        }
    }

    pub fn buy(&mut self, tree: Tree, id: &str) -> Result<(), PurchaseError> {
        let def = catalog::find(tree, id).ok_or_else(|| PurchaseError::UnknownUpgrade {
            id: id.to_string(),
        })?;
        if !self.state.tree_unlocked(tree) {
            return Err(PurchaseError::TreeLocked { tree: tree.label() });
        }
        let level = self.state.level_of(tree, def.id);
        if def.is_maxed(level) {
            return Err(PurchaseError::MaxedOut { name: def.name });
        }
        if !catalog::is_purchasable(def, |prerequisite| self.state.owns(tree, prerequisite)) {
            return Err(PurchaseError::MissingPrerequisite { name: def.name });
        }
        let cost = def.cost_at(level);
        if self.state.currency(tree) < cost {
            return Err(PurchaseError::InsufficientFunds {
                cost,
                currency: tree.currency(),
            });
        }

        *self.state.currency_mut(tree) -= cost;
        self.state.set_level(tree, def.id, level + 1);
        self.refresh_yields();
        info!(tree = tree.label(), id = def.id, level = level + 1, cost, "upgrade purchased");
        let cost = self.format_amount(cost);
        self.push_message(format!(
            "Purchased {} level {} (-{cost} {})",
            def.name,
            level + 1,
            tree.currency()
        ));
        Ok(())
    }

    pub fn buy_wake(&mut self, id: &str) -> Result<(), PurchaseError> {
        let cost = wake_timer::buy_upgrade(&mut self.state, &self.tuning, id)?;
        let name = catalog::find_wake(id).map(|def| def.name).unwrap_or(id);
        info!(id, cost, cap = self.state.wake_timer_cap, "wake upgrade purchased");
        if self.state.wake_timer_infinite {
            self.push_message(format!("{name}: you no longer need sleep."));
        } else {
            self.push_message(format!(
                "{name}: wakefulness extended to {:.0}s and refilled.",
                self.state.wake_timer_cap
            ));
        }
        Ok(())
    }

    pub fn reset(&mut self, kind: ResetKind, now: Instant) -> Result<f64, ResetError> {
        let gate = match kind {
            ResetKind::Inspiration => &mut self.inspiration_gate,
            ResetKind::Concept => &mut self.concept_gate,
        };
        if !gate.allow(now) {
            return Err(ResetError::CoolingDown);
        }
        let reward = prestige::reset(kind, &mut self.state, &self.tuning)?;
        self.refresh_yields();
        let currency = match kind {
            ResetKind::Inspiration => "inspiration",
            ResetKind::Concept => "concepts",
        };
        let shown = self.format_amount(reward);
        self.push_message(format!("You retreat to the {}. +{shown} {currency}.", kind.label()));
        Ok(reward)
    }

    pub fn toggle_auto(&mut self) {
        if !self.state.auto_unlocked {
            self.push_message("Automatic work is not unlocked yet.".to_string());
            return;
        }
        self.state.auto_enabled = !self.state.auto_enabled;
        let label = if self.state.auto_enabled { "on" } else { "off" };
        self.push_message(format!("Automatic work {label}."));
    }

    pub fn activate_focus(&mut self) -> Result<(), FocusError> {
        let until = economy::activate_focus(&mut self.state, &self.tuning, unix_now())?;
        self.refresh_yields();
        let remaining = (until - unix_now()).max(0.0);
        self.push_message(format!("Focus burst: faster work for {remaining:.0}s."));
        Ok(())
    }

    pub fn focus_remaining(&self) -> f64 {
        (self.state.focus_active_until - unix_now()).max(0.0)
    }

    pub fn play_minigame(&mut self, game: &mut dyn MoneyMinigame) -> Result<f64, MinigameError> {
        let name = game.name().to_string();
        match minigame::play(&mut self.state, game) {
            Ok(delta) => {
                let shown = self.format_amount(delta);
                self.push_message(format!("{name} settled: {shown} money."));
                Ok(delta)
            }
            Err(err) => {
                self.push_message(format!("{name} failed ({err}); money restored."));
                Err(err)
            }
        }
    }

    pub fn reset_preview(&self, kind: ResetKind) -> Option<f64> {
        prestige::is_eligible(kind, &self.state, &self.tuning)
            .then(|| prestige::reward_for(kind, &self.state, &self.tuning))
    }

    pub fn format_amount(&self, value: f64) -> String {
        format_with_threshold(value, self.tuning.scientific_exponent)
    }

    pub fn messages(&self) -> impl Iterator<Item = &String> {
        self.messages.iter()
    }

    pub fn add_message<S: Into<String>>(&mut self, message: S) {
        self.push_message(message.into());
    }

    fn push_message(&mut self, message: String) {
        if self.messages.len() >= MAX_MESSAGES {
            self.messages.pop_front();
        }
        self.messages.push_back(message);
    }
}

fn resonance_update(state: &mut GameState, tuning: &Tuning, secs: f64, rng: &mut ThreadRng) {
    let was_in_tune = resonance::in_tune(state, &tuning.resonance);
    resonance::update(state, &tuning.resonance, secs, rng);
    if state.layer >= 2 && was_in_tune != resonance::in_tune(state, &tuning.resonance) {
        debug!(
            value = state.resonance_val,
            target = state.resonance_target,
            "resonance crossed the tuning zone"
        );
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum PurchaseError {
    #[error("no upgrade called {id}")]
    UnknownUpgrade { id: String },
    #[error("the {tree} is still locked")]
    TreeLocked { tree: &'static str },
    #[error("{name} is already at its maximum level")]
    MaxedOut { name: &'static str },
    #[error("{name} needs an earlier upgrade first")]
    MissingPrerequisite { name: &'static str },
    #[error("{name} is already owned")]
    AlreadyOwned { name: &'static str },
    #[error("not enough {currency} (requires {cost:.2})")]
    InsufficientFunds { cost: f64, currency: &'static str },
}
