//! Per-action cooldown tracking
//!
//! Each tracked action owns an [`ActionState`] and one confirmation worker.
//!
//! ```text
//!                attempt()                    settle delay elapses
//!  Available ──────────────► PendingConfirmation ─────────────────┐
//!     ▲  ▲                                                        │
//!     │  └──────── check says "not busy" (attempt didn't land) ───┤
//!     │                                                           │ check says "busy"
//!     │                                                           ▼
//!     └─────────── timer runs out / icon visible again ────── CoolingDown
//! ```
//!
//! `attempt()` runs on whichever thread evaluates a policy. Everything after
//! the flip to `PendingConfirmation` happens on the action's own worker.

mod state;
mod tracker;
mod worker;


pub use state::{ActionId, ActionSettings, ActionState, Phase};
pub use tracker::AvailabilityTracker;
pub use worker::{ConfirmationWorker, CycleOutcome};
