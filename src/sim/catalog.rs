//! Static upgrade definitions for every tree.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tree {
    /// Bought with money; wiped by every reset.
    Desk,
    /// Bought with inspiration; wiped by the concept reset.
    Hall,
    /// Bought with concepts; never wiped.
    Archive,
}

impl Tree {
    pub const ALL: [Tree; 3] = [Tree::Desk, Tree::Hall, Tree::Archive];

    pub fn label(self) -> &'static str {
        match self {
            Tree::Desk => "Desk",
            Tree::Hall => "Hall",
            Tree::Archive => "Archive",
        }
    }

    pub fn currency(self) -> &'static str {
        match self {
            Tree::Desk => "money",
            Tree::Hall => "inspiration",
            Tree::Archive => "concepts",
        }
    }

    pub fn upgrades(self) -> &'static [UpgradeDef] {
        match self {
            Tree::Desk => &DESK_UPGRADES,
            Tree::Hall => &HALL_UPGRADES,
            Tree::Archive => &ARCHIVE_UPGRADES,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Tree::Desk => "desk",
            Tree::Hall => "hall",
            Tree::Archive => "archive",
        }
    }
}

/// `base × per_level^(level-1)` for level ≥ 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scaling {
    pub base: f64,
    pub per_level: f64,
}

impl Scaling {
    pub const fn flat(base: f64) -> Self {
        Self {
            base,
            per_level: 1.0,
        }
    }

    pub const fn new(base: f64, per_level: f64) -> Self {
        Self { base, per_level }
    }

    pub fn value_at(&self, level: u32) -> Option<f64> {
        if level == 0 {
            return None;
        }
        Some(self.base * self.per_level.powi(level as i32 - 1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unlock {
    Focus,
    AutoWork,
    Motivation,
    Charge,
    Rpg,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    FlatGain(Scaling),
    GainMult(Scaling),
    /// Applied only to automatic work cycles.
    AutoGainMult(Scaling),
    DelayMult(Scaling),
    InspirationMult(Scaling),
    ConceptMult(Scaling),
    /// Each level damps resonance instability.
    Stabilizer,
    Unlock(Unlock),
}

#[derive(Debug, Clone, Copy)]
pub struct UpgradeDef {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub base_cost: f64,
    pub cost_multiplier: f64,
    pub max_level: u32,
    pub effect: Effect,
    pub prerequisites: &'static [&'static str],
}

impl UpgradeDef {
    /// Price of moving from `level` to `level + 1`.
    pub fn cost_at(&self, level: u32) -> f64 {
        self.base_cost * self.cost_multiplier.powi(level as i32)
    }

    pub fn is_maxed(&self, level: u32) -> bool {
        level >= self.max_level
    }
}

pub fn is_purchasable(def: &UpgradeDef, owned: impl Fn(&str) -> bool) -> bool {
    def.prerequisites.iter().all(|id| owned(id))
}

pub fn find(tree: Tree, id: &str) -> Option<&'static UpgradeDef> {
    tree.upgrades().iter().find(|def| def.id == id)
}

/// Later upgrades that hide an earlier one in the displayed ownership list.
pub const REPLACEMENTS: [(&str, &str); 3] = [
    ("deep_work", "notebook"),
    ("standing_desk", "ergonomic_chair"),
    ("grand_theory", "framework"),
];

/// Filters superseded ids for display only; economic effects are untouched.
pub fn display_owned<'a>(owned: &[&'a str]) -> Vec<&'a str> {
    owned
        .iter()
        .copied()
        .filter(|id| {
            !REPLACEMENTS
                .iter()
                .any(|(newer, older)| older == id && owned.contains(newer))
        })
        .collect()
}

pub static DESK_UPGRADES: [UpgradeDef; 12] = [
    UpgradeDef {
        id: "sharpen_pencil",
        name: "Sharpened Pencil",
        description: "Flat bonus to every work cycle.",
        base_cost: 10.0,
        cost_multiplier: 1.15,
        max_level: 25,
        effect: Effect::FlatGain(Scaling::new(1.0, 1.12)),
        prerequisites: &[],
    },
    UpgradeDef {
        id: "notebook",
        name: "Notebook",
        description: "Multiplies work output.",
        base_cost: 50.0,
        cost_multiplier: 1.6,
        max_level: 10,
        effect: Effect::GainMult(Scaling::new(1.5, 1.15)),
        prerequisites: &[],
    },
    UpgradeDef {
        id: "ergonomic_chair",
        name: "Ergonomic Chair",
        description: "Shortens the work cycle.",
        base_cost: 100.0,
        cost_multiplier: 1.8,
        max_level: 8,
        effect: Effect::DelayMult(Scaling::new(0.9, 0.95)),
        prerequisites: &[],
    },
    UpgradeDef {
        id: "desk_lamp",
        name: "Desk Lamp",
        description: "A steady flat bonus that does not grow with level.",
        base_cost: 400.0,
        cost_multiplier: 1.5,
        max_level: 5,
        effect: Effect::FlatGain(Scaling::flat(4.0)),
        prerequisites: &[],
    },
    UpgradeDef {
        id: "focus_ritual",
        name: "Focus Ritual",
        description: "Unlocks focus: fill the bar by hand, then burst.",
        base_cost: 250.0,
        cost_multiplier: 1.0,
        max_level: 1,
        effect: Effect::Unlock(Unlock::Focus),
        prerequisites: &[],
    },
    UpgradeDef {
        id: "autopilot",
        name: "Autopilot",
        description: "Unlocks automatic work cycles.",
        base_cost: 500.0,
        cost_multiplier: 1.0,
        max_level: 1,
        effect: Effect::Unlock(Unlock::AutoWork),
        prerequisites: &["ergonomic_chair"],
    },
    UpgradeDef {
        id: "momentum",
        name: "Momentum",
        description: "Automatic cycles earn more.",
        base_cost: 900.0,
        cost_multiplier: 1.7,
        max_level: 10,
        effect: Effect::AutoGainMult(Scaling::new(1.5, 1.1)),
        prerequisites: &["autopilot"],
    },
    UpgradeDef {
        id: "pep_talk",
        name: "Pep Talk",
        description: "Unlocks motivation: a full tank boosts output.",
        base_cost: 1_500.0,
        cost_multiplier: 1.0,
        max_level: 1,
        effect: Effect::Unlock(Unlock::Motivation),
        prerequisites: &[],
    },
    UpgradeDef {
        id: "capacitor",
        name: "Capacitor",
        description: "Unlocks charge: idle time builds a lasting multiplier.",
        base_cost: 5_000.0,
        cost_multiplier: 1.0,
        max_level: 1,
        effect: Effect::Unlock(Unlock::Charge),
        prerequisites: &["focus_ritual"],
    },
    UpgradeDef {
        id: "standing_desk",
        name: "Standing Desk",
        description: "Shortens the work cycle further.",
        base_cost: 12_000.0,
        cost_multiplier: 2.0,
        max_level: 6,
        effect: Effect::DelayMult(Scaling::new(0.8, 0.95)),
        prerequisites: &["ergonomic_chair"],
    },
    UpgradeDef {
        id: "deep_work",
        name: "Deep Work",
        description: "A far stronger output multiplier.",
        base_cost: 20_000.0,
        cost_multiplier: 1.9,
        max_level: 10,
        effect: Effect::GainMult(Scaling::new(2.0, 1.25)),
        prerequisites: &["notebook"],
    },
    UpgradeDef {
        id: "map_room",
        name: "Map Room",
        description: "Opens the way to the dungeon expedition.",
        base_cost: 50_000.0,
        cost_multiplier: 1.0,
        max_level: 1,
        effect: Effect::Unlock(Unlock::Rpg),
        prerequisites: &["deep_work"],
    },
];

pub static HALL_UPGRADES: [UpgradeDef; 5] = [
    UpgradeDef {
        id: "muse",
        name: "Muse",
        description: "Multiplies all work output.",
        base_cost: 1.0,
        cost_multiplier: 2.0,
        max_level: 10,
        effect: Effect::GainMult(Scaling::new(2.0, 1.5)),
        prerequisites: &[],
    },
    UpgradeDef {
        id: "quick_hands",
        name: "Quick Hands",
        description: "Shortens the work cycle across resets.",
        base_cost: 2.0,
        cost_multiplier: 2.2,
        max_level: 6,
        effect: Effect::DelayMult(Scaling::new(0.85, 0.95)),
        prerequisites: &[],
    },
    UpgradeDef {
        id: "inspire_rate",
        name: "Inspire Rate",
        description: "More inspiration per Hall reset.",
        base_cost: 3.0,
        cost_multiplier: 2.0,
        max_level: 10,
        effect: Effect::InspirationMult(Scaling::new(1.25, 1.2)),
        prerequisites: &["muse"],
    },
    UpgradeDef {
        id: "second_nature",
        name: "Second Nature",
        description: "Automatic work is available from the start.",
        base_cost: 5.0,
        cost_multiplier: 1.0,
        max_level: 1,
        effect: Effect::Unlock(Unlock::AutoWork),
        prerequisites: &["quick_hands"],
    },
    UpgradeDef {
        id: "trained_focus",
        name: "Trained Focus",
        description: "Focus is available from the start.",
        base_cost: 8.0,
        cost_multiplier: 1.0,
        max_level: 1,
        effect: Effect::Unlock(Unlock::Focus),
        prerequisites: &["second_nature"],
    },
];

pub static ARCHIVE_UPGRADES: [UpgradeDef; 6] = [
    UpgradeDef {
        id: "framework",
        name: "Framework",
        description: "Multiplies all work output.",
        base_cost: 1.0,
        cost_multiplier: 2.5,
        max_level: 10,
        effect: Effect::GainMult(Scaling::new(3.0, 1.5)),
        prerequisites: &[],
    },
    UpgradeDef {
        id: "stabilizer",
        name: "Stabilizer",
        description: "Calms resonance drift.",
        base_cost: 1.0,
        cost_multiplier: 1.8,
        max_level: 10,
        effect: Effect::Stabilizer,
        prerequisites: &[],
    },
    UpgradeDef {
        id: "concept_rate",
        name: "Concept Rate",
        description: "More concepts per Archive reset.",
        base_cost: 2.0,
        cost_multiplier: 2.2,
        max_level: 10,
        effect: Effect::ConceptMult(Scaling::new(1.2, 1.15)),
        prerequisites: &["framework"],
    },
    UpgradeDef {
        id: "inspire_mult",
        name: "Inspire Mult",
        description: "Multiplies inspiration from Hall resets.",
        base_cost: 3.0,
        cost_multiplier: 2.5,
        max_level: 8,
        effect: Effect::InspirationMult(Scaling::new(1.5, 1.2)),
        prerequisites: &[],
    },
    UpgradeDef {
        id: "persistent_habits",
        name: "Persistent Habits",
        description: "Motivation is available from the start.",
        base_cost: 4.0,
        cost_multiplier: 1.0,
        max_level: 1,
        effect: Effect::Unlock(Unlock::Motivation),
        prerequisites: &["framework"],
    },
    UpgradeDef {
        id: "grand_theory",
        name: "Grand Theory",
        description: "Supersedes the Framework with a stronger multiplier.",
        base_cost: 25.0,
        cost_multiplier: 3.0,
        max_level: 5,
        effect: Effect::GainMult(Scaling::new(5.0, 1.6)),
        prerequisites: &["framework", "concept_rate"],
    },
];

/// Survival-timer upgrades, bought once each with stability.
#[derive(Debug, Clone, Copy)]
pub struct WakeUpgradeDef {
    pub id: &'static str,
    pub name: &'static str,
    pub cost: f64,
    pub time_bonus: f64,
    pub infinite: bool,
}

pub static WAKE_UPGRADES: [WakeUpgradeDef; 5] = [
    WakeUpgradeDef {
        id: "coffee",
        name: "Coffee",
        cost: 1.0,
        time_bonus: 60.0,
        infinite: false,
    },
    WakeUpgradeDef {
        id: "power_nap",
        name: "Power Nap",
        cost: 3.0,
        time_bonus: 180.0,
        infinite: false,
    },
    WakeUpgradeDef {
        id: "sleep_schedule",
        name: "Sleep Schedule",
        cost: 8.0,
        time_bonus: 600.0,
        infinite: false,
    },
    WakeUpgradeDef {
        id: "circadian_lock",
        name: "Circadian Lock",
        cost: 20.0,
        time_bonus: 1_800.0,
        infinite: false,
    },
    WakeUpgradeDef {
        id: "lucid_state",
        name: "Lucid State",
        cost: 60.0,
        time_bonus: 0.0,
        infinite: true,
    },
];

pub fn find_wake(id: &str) -> Option<&'static WakeUpgradeDef> {
    WAKE_UPGRADES.iter().find(|def| def.id == id)
}
