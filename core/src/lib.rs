pub mod action;
pub mod arbitration;
pub mod config;
pub mod error;
pub mod ports;
pub mod registry;
pub mod router;
pub mod vision;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports for convenience
pub use action::{ActionId, ActionSettings, ActionState, AvailabilityTracker, Phase};
pub use arbitration::ArbitrationPolicy;
pub use error::{ActuatorError, ProbeError, WorkerError};
pub use ports::{Actuator, NoDisplay, VisionProbe};
pub use registry::{ActionRegistry, ActionStatus, RegistryError};
pub use router::{Binding, ConditionBoard, ConditionId, ConditionListener, RouterHandle, TriggerRouter};
pub use hotbar_types::{ConfirmationMode, HotbarConfig, Rect};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a mutex, recovering the guard if a worker panicked while holding it.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
