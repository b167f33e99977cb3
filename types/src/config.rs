//! Hotbar configuration types
//!
//! One TOML file describes the actions to track, the priority groups they
//! belong to, and which held inputs drive which group.
//!
//! ```toml
//! poll_interval_ms = 10
//!
//! [[action]]
//! id = "big_heal"
//! keys = ["shift", "m"]
//! cooldown_secs = 7.0
//! icon = "icons/big_heal.png"
//!
//! [[policy]]
//! name = "heals"
//! actions = ["big_heal", "small_heal"]
//!
//! [[binding]]
//! name = "heal while f1 held"
//! when = ["key:f1"]
//! target = { policy = "heals" }
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::Rect;

// ═══════════════════════════════════════════════════════════════════════════
// Top level
// ═══════════════════════════════════════════════════════════════════════════

/// Complete configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotbarConfig {
    /// Sleep between evaluations while a binding's inputs are held
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Delay before bindings start listening (time to focus the target window)
    #[serde(default)]
    pub startup_delay_ms: u64,

    #[serde(default, rename = "action")]
    pub actions: Vec<ActionConfig>,

    #[serde(default, rename = "policy")]
    pub policies: Vec<PolicyConfig>,

    #[serde(default, rename = "binding")]
    pub bindings: Vec<BindingConfig>,
}

impl Default for HotbarConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            startup_delay_ms: 0,
            actions: Vec::new(),
            policies: Vec::new(),
            bindings: Vec::new(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Actions
// ═══════════════════════════════════════════════════════════════════════════

/// How an action decides whether a trigger attempt actually took effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationMode {
    /// Elapsed time only, icon is ignored
    TimerOnly,
    /// Icon only, the cooldown ends when the icon shows up again
    VisualOnly,
    /// Icon decides whether the attempt registered, timer (if any) runs the cooldown
    #[default]
    VisualPreferred,
}

/// One trackable action (a hotbar slot)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionConfig {
    /// Unique identifier, referenced by policies and bindings
    pub id: String,

    /// Key chord sent to fire the action, e.g. `["ctrl", "num0"]`
    #[serde(default)]
    pub keys: Vec<String>,

    // ─── Cooldown ───────────────────────────────────────────────────────────
    /// Cooldown in seconds (0 = no timed cooldown)
    #[serde(default)]
    pub cooldown_secs: f64,

    #[serde(default)]
    pub confirmation: ConfirmationMode,

    /// Wait after firing before trusting any confirmation check
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    // ─── Icon search ────────────────────────────────────────────────────────
    /// PNG of the slot's ready icon (None = timer only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<PathBuf>,

    #[serde(default)]
    pub search_region: Rect,

    /// Narrow `search_region` to the icon after the first hit
    #[serde(default = "default_true")]
    pub refine_region: bool,

    /// Pixels of slack kept around the icon when narrowing
    #[serde(default)]
    pub region_margin: u32,

    #[serde(default = "default_true")]
    pub grayscale: bool,

    /// Max per-channel difference still counted as a matching pixel
    #[serde(default)]
    pub color_tolerance: u8,

    /// Re-probe period while waiting for the icon to come back
    #[serde(default = "default_recheck_interval_ms")]
    pub recheck_interval_ms: u64,

    /// Every N consecutive misses on a narrowed region, look in the full region again
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_probe_every: Option<u32>,
}

impl ActionConfig {
    /// Config with defaults for everything except the id
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            keys: Vec::new(),
            cooldown_secs: 0.0,
            confirmation: ConfirmationMode::default(),
            settle_ms: default_settle_ms(),
            icon: None,
            search_region: Rect::default(),
            refine_region: true,
            region_margin: 0,
            grayscale: true,
            color_tolerance: 0,
            recheck_interval_ms: default_recheck_interval_ms(),
            fallback_probe_every: None,
        }
    }

    /// Human-readable chord, e.g. `shift+m`
    pub fn chord(&self) -> String {
        self.keys.join("+")
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Policies and bindings
// ═══════════════════════════════════════════════════════════════════════════

/// Priority-ordered group of actions; the first ready one fires
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    pub name: String,
    /// Action ids, highest priority first
    pub actions: Vec<String>,
}

/// What a binding drives while its inputs are held
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingTarget {
    Policy(String),
    Action(String),
}

/// Held inputs mapped to a policy or a single action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingConfig {
    pub name: String,
    /// Conditions that must all be held at once, e.g. `["key:shift", "mouse:right"]`
    pub when: Vec<String>,
    pub target: BindingTarget,
}

fn default_true() -> bool {
    true
}

fn default_poll_interval_ms() -> u64 {
    10
}

fn default_settle_ms() -> u64 {
    200
}

fn default_recheck_interval_ms() -> u64 {
    100
}
