//! Fakes for the engine's ports.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use hotbar_types::Rect;

use crate::action::{ActionId, ActionSettings, ActionState};
use crate::error::{ActuatorError, ProbeError, WorkerError};
use crate::lock;
use crate::ports::{Actuator, VisionProbe};
use crate::vision::Image;

/// Records every trigger; can be told to fail.
#[derive(Default)]
pub struct RecordingActuator {
    calls: Mutex<Vec<ActionId>>,
    fail: AtomicBool,
}

impl RecordingActuator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<ActionId> {
        lock(&self.calls).clone()
    }

    pub fn count(&self, id: &str) -> usize {
        lock(&self.calls).iter().filter(|c| c.as_str() == id).count()
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl Actuator for RecordingActuator {
    fn trigger(&self, action: &ActionId) -> Result<(), ActuatorError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ActuatorError::Unavailable("test".to_string()));
        }
        lock(&self.calls).push(action.clone());
        Ok(())
    }
}

/// Icon at a fixed spot that can be shown or hidden. A search finds it only
/// if the region fully contains it.
pub struct ScriptedProbe {
    icon_at: Mutex<Rect>,
    visible: AtomicBool,
    fail: AtomicBool,
    searched: Mutex<Vec<Rect>>,
    calls: AtomicUsize,
}

impl ScriptedProbe {
    pub fn new(icon_at: Rect, visible: bool) -> Arc<Self> {
        Arc::new(Self {
            icon_at: Mutex::new(icon_at),
            visible: AtomicBool::new(visible),
            fail: AtomicBool::new(false),
            searched: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::SeqCst);
    }

    pub fn move_icon(&self, to: Rect) {
        *lock(&self.icon_at) = to;
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn searched(&self) -> Vec<Rect> {
        lock(&self.searched).clone()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl VisionProbe for ScriptedProbe {
    fn locate(
        &self,
        _pattern: &Image,
        region: Rect,
        _grayscale: bool,
        _color_tolerance: u8,
    ) -> Result<Option<Rect>, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(ProbeError::SurfaceUnavailable("test".to_string()));
        }
        lock(&self.searched).push(region);

        let icon = *lock(&self.icon_at);
        let found = self.visible.load(Ordering::SeqCst) && region.contains(&icon);
        Ok(found.then_some(icon))
    }
}

pub fn icon() -> Arc<Image> {
    Arc::new(Image::filled(4, 4, [255, 255, 255, 255]))
}

pub fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// Timer-only action with a running worker.
pub fn spawn_timer_action(
    id: &str,
    cooldown: Duration,
    settle: Duration,
    actuator: Arc<RecordingActuator>,
) -> (Arc<ActionState>, JoinHandle<Result<(), WorkerError>>) {
    let probe = ScriptedProbe::new(Rect::new(0, 0, 1, 1), false);
    spawn_action(
        id,
        ActionSettings::timer(cooldown).with_settle_delay(settle),
        actuator,
        probe,
    )
}

pub fn spawn_action(
    id: &str,
    settings: ActionSettings,
    actuator: Arc<RecordingActuator>,
    probe: Arc<ScriptedProbe>,
) -> (Arc<ActionState>, JoinHandle<Result<(), WorkerError>>) {
    let (state, worker) = ActionState::new(ActionId::new(id), settings, actuator, probe);
    let handle = worker.spawn().unwrap();
    (state, handle)
}

/// Poll `cond` until it holds or `timeout` passes.
pub fn wait_for(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = std::time::Instant::now() + timeout;
    while std::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    cond()
}
