use super::catalog::{self, Tree, Unlock};
use crate::config::Tuning;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedUpgrade {
    pub id: String,
    pub level: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DriftDir {
    #[default]
    Rising,
    Falling,
}

impl DriftDir {
    pub fn sign(self) -> f64 {
        match self {
            DriftDir::Rising => 1.0,
            DriftDir::Falling => -1.0,
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            DriftDir::Rising => DriftDir::Falling,
            DriftDir::Falling => DriftDir::Rising,
        }
    }
}

/// Every persisted field of a run. Missing keys load as their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameState {
    pub layer: u32,
    pub money: f64,
    pub money_since_reset: f64,
    pub total_money_earned: f64,
    pub money_mult: f64,
    pub inspiration: f64,
    pub concepts: f64,
    pub stability: f64,

    pub owned_upgrades: BTreeSet<String>,
    pub upgrade_levels: BTreeMap<String, u32>,
    pub inspiration_upgrades: Vec<OwnedUpgrade>,
    pub concept_upgrades: Vec<OwnedUpgrade>,

    pub wake_timer: f64,
    pub wake_timer_cap: f64,
    pub wake_timer_infinite: bool,
    pub wake_timer_upgrades: BTreeSet<String>,
    pub wake_locked: bool,
    pub wake_warned: bool,
    pub needs_reset: bool,

    pub resonance_val: f64,
    pub resonance_target: f64,
    pub resonance_drift_dir: DriftDir,
    pub resonance_repick_cooldown: f64,

    pub focus: f64,
    pub focus_unlocked: bool,
    /// Unix seconds.
    pub focus_active_until: f64,

    pub auto_unlocked: bool,
    pub auto_enabled: bool,
    pub work_timer: f64,

    pub motivation_unlocked: bool,
    pub motivation: f64,

    pub charge_unlocked: bool,
    pub charge: f64,
    pub best_charge: f64,
    pub charge_threshold: u32,

    pub rpg_unlocked: bool,
    pub inspiration_unlocked: bool,
    pub concepts_unlocked: bool,

    pub inspiration_resets: u32,
    pub concept_resets: u32,
    pub stability_resets: u32,

    pub play_time: f64,
}

impl Default for GameState {
    fn default() -> Self {
        Self::with_tuning(&Tuning::default())
    }
}

impl GameState {
    pub fn with_tuning(tuning: &Tuning) -> Self {
        Self {
            layer: 0,
            money: 0.0,
            money_since_reset: 0.0,
            total_money_earned: 0.0,
            money_mult: 1.0,
            inspiration: 0.0,
            concepts: 0.0,
            stability: 0.0,
            owned_upgrades: BTreeSet::new(),
            upgrade_levels: BTreeMap::new(),
            inspiration_upgrades: Vec::new(),
            concept_upgrades: Vec::new(),
            wake_timer: tuning.wake_base_cap,
            wake_timer_cap: tuning.wake_base_cap,
            wake_timer_infinite: false,
            wake_timer_upgrades: BTreeSet::new(),
            wake_locked: false,
            wake_warned: false,
            needs_reset: false,
            resonance_val: tuning.resonance.start_value,
            resonance_target: tuning.resonance.start_target,
            resonance_drift_dir: DriftDir::Rising,
            resonance_repick_cooldown: tuning.resonance.cooldown_max,
            focus: 0.0,
            focus_unlocked: false,
            focus_active_until: 0.0,
            auto_unlocked: false,
            auto_enabled: false,
            work_timer: 0.0,
            motivation_unlocked: false,
            motivation: tuning.motivation_max,
            charge_unlocked: false,
            charge: 0.0,
            best_charge: 0.0,
            charge_threshold: 0,
            rpg_unlocked: false,
            inspiration_unlocked: false,
            concepts_unlocked: false,
            inspiration_resets: 0,
            concept_resets: 0,
            stability_resets: 0,
            play_time: 0.0,
        }
    }

    pub fn level_of(&self, tree: Tree, id: &str) -> u32 {
        match tree {
            Tree::Desk => self.upgrade_levels.get(id).copied().unwrap_or(0),
            Tree::Hall => tree_level(&self.inspiration_upgrades, id),
            Tree::Archive => tree_level(&self.concept_upgrades, id),
        }
    }

    pub fn owns(&self, tree: Tree, id: &str) -> bool {
        self.level_of(tree, id) > 0
    }

    /// Records a new level; Desk entries also join the owned set.
    pub fn set_level(&mut self, tree: Tree, id: &str, level: u32) {
        match tree {
            Tree::Desk => {
                self.upgrade_levels.insert(id.to_string(), level);
                if level > 0 {
                    self.owned_upgrades.insert(id.to_string());
                } else {
                    self.owned_upgrades.remove(id);
                }
            }
            Tree::Hall => set_tree_level(&mut self.inspiration_upgrades, id, level),
            Tree::Archive => set_tree_level(&mut self.concept_upgrades, id, level),
        }
    }

    pub fn tree_unlocked(&self, tree: Tree) -> bool {
        match tree {
            Tree::Desk => true,
            Tree::Hall => self.inspiration_unlocked,
            Tree::Archive => self.concepts_unlocked,
        }
    }

    pub fn currency(&self, tree: Tree) -> f64 {
        match tree {
            Tree::Desk => self.money,
            Tree::Hall => self.inspiration,
            Tree::Archive => self.concepts,
        }
    }

    pub fn currency_mut(&mut self, tree: Tree) -> &mut f64 {
        match tree {
            Tree::Desk => &mut self.money,
            Tree::Hall => &mut self.inspiration,
            Tree::Archive => &mut self.concepts,
        }
    }

    /// OR-in only; an unlock is never revoked here.
    pub fn grant_unlock(&mut self, unlock: Unlock) {
        let flag = match unlock {
            Unlock::Focus => &mut self.focus_unlocked,
            Unlock::AutoWork => &mut self.auto_unlocked,
            Unlock::Motivation => &mut self.motivation_unlocked,
            Unlock::Charge => &mut self.charge_unlocked,
            Unlock::Rpg => &mut self.rpg_unlocked,
        };
        *flag = true;
    }

    pub fn wake_exhausted(&self) -> bool {
        !self.wake_timer_infinite && (self.wake_locked || self.wake_timer <= 0.0)
    }

    /// Owned Desk ids for display, with superseded entries hidden.
    pub fn displayed_desk_upgrades(&self) -> Vec<&str> {
        let owned: Vec<&str> = self.owned_upgrades.iter().map(String::as_str).collect();
        catalog::display_owned(&owned)
    }

    pub fn is_sane(&self) -> bool {
        [
            self.money,
            self.money_since_reset,
            self.total_money_earned,
            self.money_mult,
            self.inspiration,
            self.concepts,
            self.stability,
            self.wake_timer,
            self.wake_timer_cap,
            self.resonance_val,
            self.resonance_target,
            self.resonance_repick_cooldown,
            self.focus,
            self.focus_active_until,
            self.work_timer,
            self.motivation,
            self.charge,
            self.best_charge,
            self.play_time,
        ]
        .iter()
        .all(|value| value.is_finite())
    }

    /// Repairs values a hand-edited or older save may carry out of range.
    pub fn normalize(&mut self, tuning: &Tuning) {
        let resonance = &tuning.resonance;
        if !self.resonance_val.is_finite() {
            self.resonance_val = resonance.start_value;
        }
        if !self.resonance_target.is_finite() {
            self.resonance_target = resonance.start_target;
        }
        self.resonance_val = self.resonance_val.clamp(0.0, 100.0);
        self.resonance_target = self.resonance_target.clamp(0.0, 100.0);
        self.resonance_repick_cooldown = self.resonance_repick_cooldown.max(0.0);

        for value in [
            &mut self.money,
            &mut self.money_since_reset,
            &mut self.total_money_earned,
            &mut self.inspiration,
            &mut self.concepts,
            &mut self.stability,
            &mut self.focus,
            &mut self.motivation,
            &mut self.charge,
            &mut self.best_charge,
            &mut self.work_timer,
            &mut self.play_time,
        ] {
            if !value.is_finite() || *value < 0.0 {
                *value = 0.0;
            }
        }
        if !self.money_mult.is_finite() || self.money_mult <= 0.0 {
            self.money_mult = 1.0;
        }
        self.total_money_earned = self.total_money_earned.max(self.money_since_reset);
        self.focus = self.focus.min(tuning.focus_max);
        self.motivation = self.motivation.min(tuning.motivation_max);
        self.best_charge = self.best_charge.max(self.charge);

        self.upgrade_levels.retain(|id, level| {
            match catalog::find(Tree::Desk, id) {
                Some(def) => {
                    *level = (*level).min(def.max_level);
                    *level > 0
                }
                None => false,
            }
        });
        self.owned_upgrades = self.upgrade_levels.keys().cloned().collect();
        clamp_tree(&mut self.inspiration_upgrades, Tree::Hall);
        clamp_tree(&mut self.concept_upgrades, Tree::Archive);
        self.wake_timer_upgrades
            .retain(|id| catalog::find_wake(id).is_some());

        // A collapse is pending only inside a tick; a stored flag would block the next one.
        self.needs_reset = false;
    }
}

fn tree_level(entries: &[OwnedUpgrade], id: &str) -> u32 {
    entries
        .iter()
        .find(|entry| entry.id == id)
        .map(|entry| entry.level)
        .unwrap_or(0)
}

fn set_tree_level(entries: &mut Vec<OwnedUpgrade>, id: &str, level: u32) {
    if let Some(entry) = entries.iter_mut().find(|entry| entry.id == id) {
        entry.level = level;
    } else {
        entries.push(OwnedUpgrade {
            id: id.to_string(),
            level,
        });
    }
    entries.retain(|entry| entry.level > 0);
}

fn clamp_tree(entries: &mut Vec<OwnedUpgrade>, tree: Tree) {
    let mut seen = BTreeSet::new();
    entries.retain_mut(|entry| match catalog::find(tree, &entry.id) {
        Some(def) if seen.insert(entry.id.clone()) => {
            entry.level = entry.level.min(def.max_level);
            entry.level > 0
        }
        _ => false,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_starts_with_full_timer() {
        let state = GameState::default();
        assert_eq!(state.layer, 0);
        assert!((state.wake_timer - state.wake_timer_cap).abs() < f64::EPSILON);
        assert!(!state.wake_exhausted());
        assert!(state.is_sane());
    }

    #[test]
    fn set_level_keeps_owned_set_in_step() {
        let mut state = GameState::default();
        state.set_level(Tree::Desk, "notebook", 2);
        assert!(state.owned_upgrades.contains("notebook"));
        assert_eq!(state.level_of(Tree::Desk, "notebook"), 2);

        state.set_level(Tree::Hall, "muse", 1);
        state.set_level(Tree::Hall, "muse", 3);
        assert_eq!(state.inspiration_upgrades.len(), 1);
        assert_eq!(state.level_of(Tree::Hall, "muse"), 3);
        assert!(!state.owns(Tree::Archive, "muse"));
    }

    #[test]
    fn grant_unlock_is_idempotent() {
        let mut state = GameState::default();
        state.grant_unlock(Unlock::Charge);
        state.grant_unlock(Unlock::Charge);
        assert!(state.charge_unlocked);
        assert!(!state.focus_unlocked);
    }

    #[test]
    fn normalize_repairs_out_of_range_values() {
        let tuning = Tuning::default();
        let mut state = GameState::default();
        state.resonance_val = 180.0;
        state.resonance_target = f64::NAN;
        state.money = -5.0;
        state.upgrade_levels.insert("notebook".to_string(), 99);
        state.upgrade_levels.insert("ghost".to_string(), 1);
        state.inspiration_upgrades.push(OwnedUpgrade {
            id: "muse".to_string(),
            level: 2,
        });
        state.inspiration_upgrades.push(OwnedUpgrade {
            id: "muse".to_string(),
            level: 4,
        });

        state.normalize(&tuning);

        assert!((state.resonance_val - 100.0).abs() < f64::EPSILON);
        assert!((state.resonance_target - tuning.resonance.start_target).abs() < f64::EPSILON);
        assert!(state.money.abs() < f64::EPSILON);
        assert_eq!(state.level_of(Tree::Desk, "notebook"), 10);
        assert!(!state.owned_upgrades.contains("ghost"));
        assert_eq!(state.inspiration_upgrades.len(), 1);
        assert_eq!(state.level_of(Tree::Hall, "muse"), 2);
    }

    #[test]
    fn normalize_drops_a_stored_pending_collapse() {
        let tuning = Tuning::default();
        let mut state = GameState::with_tuning(&tuning);
        state.wake_timer = 0.0;
        state.needs_reset = true;
        state.normalize(&tuning);
        assert!(!state.needs_reset);
    }
}
