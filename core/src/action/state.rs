use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use hotbar_types::{ActionConfig, ConfirmationMode, Rect};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::tracker::AvailabilityTracker;
use super::worker::ConfirmationWorker;
use crate::error::{ActuatorError, ProbeError};
use crate::lock;
use crate::ports::{Actuator, VisionProbe};
use crate::vision::Image;

/// Identifier of a tracked action (one per keybind).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActionId(Arc<str>);

impl ActionId {
    pub fn new(id: &str) -> Self {
        Self(Arc::from(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ActionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl std::fmt::Display for ActionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where an action is in its attempt/confirm cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Phase {
    Available = 0,
    PendingConfirmation = 1,
    CoolingDown = 2,
}

impl Phase {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Phase::Available,
            1 => Phase::PendingConfirmation,
            _ => Phase::CoolingDown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Phase::Available => "ready",
            Phase::PendingConfirmation => "confirming",
            Phase::CoolingDown => "cooldown",
        }
    }
}

/// Static per-action configuration, fixed at construction.
#[derive(Debug, Clone)]
pub struct ActionSettings {
    pub cooldown: Duration,
    pub confirmation: ConfirmationMode,
    pub settle_delay: Duration,
    /// Ready icon; `None` means timer-only regardless of `confirmation`
    pub pattern: Option<Arc<Image>>,
    pub search_region: Rect,
    pub refine_region: bool,
    pub region_margin: u32,
    pub grayscale: bool,
    pub color_tolerance: u8,
    pub recheck_interval: Duration,
    pub fallback_probe_every: Option<u32>,
}

impl ActionSettings {
    /// Timer-only action with the default settle delay.
    pub fn timer(cooldown: Duration) -> Self {
        Self::from_config(
            &ActionConfig {
                cooldown_secs: cooldown.as_secs_f64(),
                confirmation: ConfirmationMode::TimerOnly,
                ..ActionConfig::new("")
            },
            None,
        )
    }

    pub fn from_config(config: &ActionConfig, pattern: Option<Arc<Image>>) -> Self {
        Self {
            cooldown: Duration::try_from_secs_f64(config.cooldown_secs).unwrap_or_default(),
            confirmation: config.confirmation,
            settle_delay: Duration::from_millis(config.settle_ms),
            pattern,
            search_region: config.search_region,
            refine_region: config.refine_region,
            region_margin: config.region_margin,
            grayscale: config.grayscale,
            color_tolerance: config.color_tolerance,
            recheck_interval: Duration::from_millis(config.recheck_interval_ms.max(1)),
            fallback_probe_every: config.fallback_probe_every,
        }
    }

    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    /// Pattern to probe with, if the icon decides confirmation.
    pub(crate) fn visual_pattern(&self) -> Option<&Image> {
        match self.confirmation {
            ConfirmationMode::TimerOnly => None,
            _ => self.pattern.as_deref(),
        }
    }

    /// Whether the cooldown ends on the icon reappearing rather than on the timer.
    fn cools_down_visually(&self) -> bool {
        match self.confirmation {
            ConfirmationMode::TimerOnly => false,
            ConfirmationMode::VisualOnly => self.pattern.is_some(),
            ConfirmationMode::VisualPreferred => self.pattern.is_some() && self.cooldown.is_zero(),
        }
    }
}

/// Search region bookkeeping. Narrowed after the first hit.
#[derive(Debug)]
struct RegionCache {
    initial: Rect,
    current: Rect,
    refined: bool,
    consecutive_misses: u32,
}

/// Runtime state of one action.
///
/// Shared between policy evaluators (which call [`attempt`](Self::attempt))
/// and the action's confirmation worker (which drives every later
/// transition).
pub struct ActionState {
    id: ActionId,
    settings: ActionSettings,
    phase: AtomicU8,
    tracker: AvailabilityTracker,
    region: Mutex<RegionCache>,
    actuator: Arc<dyn Actuator>,
    attempts: mpsc::UnboundedSender<Instant>,
}

impl std::fmt::Debug for ActionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionState")
            .field("id", &self.id)
            .field("phase", &self.phase())
            .field("remaining", &self.remaining())
            .finish_non_exhaustive()
    }
}

impl ActionState {
    /// Create an action and the worker that confirms its attempts.
    ///
    /// The worker must be started (see [`ConfirmationWorker::spawn`]) before
    /// the first attempt, otherwise the action stays unavailable after firing.
    pub fn new(
        id: ActionId,
        settings: ActionSettings,
        actuator: Arc<dyn Actuator>,
        probe: Arc<dyn VisionProbe>,
    ) -> (Arc<Self>, ConfirmationWorker) {
        let (tx, rx) = mpsc::unbounded_channel();
        let region = settings.search_region;

        let state = Arc::new(Self {
            id,
            tracker: AvailabilityTracker::new(settings.cooldown),
            settings,
            phase: AtomicU8::new(Phase::Available as u8),
            region: Mutex::new(RegionCache {
                initial: region,
                current: region,
                refined: false,
                consecutive_misses: 0,
            }),
            actuator,
            attempts: tx,
        });

        let worker = ConfirmationWorker::new(Arc::clone(&state), probe, rx);
        (state, worker)
    }

    pub fn id(&self) -> &ActionId {
        &self.id
    }

    pub fn settings(&self) -> &ActionSettings {
        &self.settings
    }

    pub fn tracker(&self) -> &AvailabilityTracker {
        &self.tracker
    }

    pub fn phase(&self) -> Phase {
        Phase::from_u8(self.phase.load(Ordering::Acquire))
    }

    pub fn is_available(&self) -> bool {
        self.phase() == Phase::Available
    }

    pub fn settle_delay(&self) -> Duration {
        self.settings.settle_delay
    }

    /// Time left on the cooldown timer (zero for visually-timed cooldowns).
    pub fn remaining(&self) -> Duration {
        self.tracker.remaining()
    }

    /// Region the next probe will search.
    pub fn search_region(&self) -> Rect {
        lock(&self.region).current
    }

    /// Fire the action if it is available.
    ///
    /// The availability check and the flip to `PendingConfirmation` are a
    /// single compare-and-swap, so concurrent callers can never both fire.
    /// Returns `Ok(false)` without side effects when the action was not
    /// available. If the actuator fails the action is released again.
    pub fn attempt(&self) -> Result<bool, ActuatorError> {
        if self
            .phase
            .compare_exchange(
                Phase::Available as u8,
                Phase::PendingConfirmation as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            return Ok(false);
        }

        if let Err(e) = self.actuator.trigger(&self.id) {
            self.set_phase(Phase::Available);
            return Err(e);
        }

        let now = Instant::now();
        self.tracker.record_attempt(now);
        info!(action = %self.id, "Fired");

        if self.attempts.send(now).is_err() {
            // Worker is gone; the action stays unavailable from here on.
            error!(action = %self.id, "Confirmation worker not running");
        }

        Ok(true)
    }

    pub(crate) fn set_phase(&self, phase: Phase) {
        debug!(action = %self.id, phase = phase.label(), "Phase changed");
        self.phase.store(phase as u8, Ordering::Release);
    }

    /// Whether the last attempt actually put the action on cooldown.
    ///
    /// With an icon: a visible ready icon means the action is NOT in use, so
    /// the attempt did not register. Without one: busy while the last attempt
    /// is younger than the cooldown.
    pub(crate) fn confirm_busy(&self, probe: &dyn VisionProbe) -> Result<bool, ProbeError> {
        match self.settings.visual_pattern() {
            Some(pattern) => Ok(self.probe_icon(probe, pattern)?.is_none()),
            None => Ok(self.tracker.is_busy_at(Instant::now())),
        }
    }

    /// Block until the cooldown is over.
    pub(crate) fn wait_cooldown(&self, probe: &dyn VisionProbe) -> Result<(), ProbeError> {
        let pattern = match self.settings.visual_pattern() {
            Some(pattern) if self.settings.cools_down_visually() => pattern,
            _ => {
                let remaining = self.tracker.remaining();
                debug!(action = %self.id, remaining_ms = remaining.as_millis() as u64, "Cooling down");
                thread::sleep(remaining);
                return Ok(());
            }
        };

        debug!(action = %self.id, "Cooling down until icon is visible");
        loop {
            thread::sleep(self.settings.recheck_interval);
            if self.probe_icon(probe, pattern)?.is_some() {
                return Ok(());
            }
        }
    }

    /// Probe for the ready icon and maintain the search region.
    ///
    /// A hit narrows the region to the icon (plus margin). The narrowing is
    /// one-way: if the icon moves, probes keep missing unless
    /// `fallback_probe_every` is set, in which case every N-th consecutive
    /// miss looks in the initial region again.
    pub(crate) fn probe_icon(
        &self,
        probe: &dyn VisionProbe,
        pattern: &Image,
    ) -> Result<Option<Rect>, ProbeError> {
        let (region, is_fallback) = {
            let cache = lock(&self.region);
            let fallback_due = cache.refined
                && self.settings.fallback_probe_every.is_some_and(|every| {
                    every > 0
                        && cache.consecutive_misses > 0
                        && cache.consecutive_misses % every == 0
                });
            if fallback_due {
                (cache.initial, true)
            } else {
                (cache.current, false)
            }
        };

        let found = probe.locate(
            pattern,
            region,
            self.settings.grayscale,
            self.settings.color_tolerance,
        )?;

        let mut cache = lock(&self.region);
        match found {
            Some(hit) => {
                cache.consecutive_misses = 0;
                if is_fallback {
                    warn!(action = %self.id, region = %hit, "Icon moved, search region reset");
                }
                if self.settings.refine_region && !hit.is_empty() {
                    let narrowed = hit.padded(self.settings.region_margin);
                    if narrowed != cache.current {
                        debug!(action = %self.id, region = %narrowed, "Search region narrowed");
                    }
                    cache.current = narrowed;
                    cache.refined = true;
                }
            }
            None => {
                cache.consecutive_misses = cache.consecutive_misses.saturating_add(1);
            }
        }

        debug!(action = %self.id, region = %region, found = found.is_some(), "Probed icon");
        Ok(found)
    }
}
