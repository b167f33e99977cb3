use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use super::state::{ActionState, Phase};
use crate::error::WorkerError;
use crate::ports::VisionProbe;

/// Result of one settle-and-check cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The attempt registered and the cooldown has run out
    CooledDown,
    /// The action still looked ready after the settle delay
    NotRegistered,
}

/// Consumer side of an action's attempt channel.
///
/// Sleeps until an attempt is signalled, waits the settle delay, checks
/// whether the attempt took, waits out the cooldown and marks the action
/// available again. One per action; at most one cycle in flight.
pub struct ConfirmationWorker {
    state: Arc<ActionState>,
    probe: Arc<dyn VisionProbe>,
    attempts: mpsc::UnboundedReceiver<Instant>,
}

impl ConfirmationWorker {
    pub(super) fn new(
        state: Arc<ActionState>,
        probe: Arc<dyn VisionProbe>,
        attempts: mpsc::UnboundedReceiver<Instant>,
    ) -> Self {
        Self {
            state,
            probe,
            attempts,
        }
    }

    /// Run the worker on its own named thread.
    pub fn spawn(self) -> io::Result<JoinHandle<Result<(), WorkerError>>> {
        let name = format!("confirm-{}", self.state.id());
        thread::Builder::new().name(name).spawn(move || {
            let id = self.state.id().clone();
            let result = self.run();
            if let Err(e) = &result {
                error!(action = %id, error = %e, "Confirmation worker stopped");
            }
            result
        })
    }

    /// Process attempts for the life of the process. The sending half lives in
    /// the `ActionState` this worker holds, so the channel never closes while
    /// the worker runs.
    pub fn run(mut self) -> Result<(), WorkerError> {
        while let Some(attempted_at) = self.attempts.blocking_recv() {
            debug!(
                action = %self.state.id(),
                since_attempt_ms = attempted_at.elapsed().as_millis() as u64,
                "Attempt received"
            );
            self.run_cycle()?;
        }
        Ok(())
    }

    /// One confirmation cycle for the attempt currently in flight.
    ///
    /// A probe failure leaves the action unavailable and is returned to the
    /// caller; no other action is affected.
    pub fn run_cycle(&self) -> Result<CycleOutcome, WorkerError> {
        let state = &self.state;
        thread::sleep(state.settle_delay());

        let busy = state
            .confirm_busy(self.probe.as_ref())
            .map_err(|e| self.probe_error(e))?;

        let outcome = if busy {
            state.set_phase(Phase::CoolingDown);
            state
                .wait_cooldown(self.probe.as_ref())
                .map_err(|e| self.probe_error(e))?;
            CycleOutcome::CooledDown
        } else {
            if state.settings().visual_pattern().is_some() {
                warn!(action = %state.id(), "Attempt did not register, ready again");
            } else {
                debug!(action = %state.id(), "Cooldown over before confirmation, ready again");
            }
            CycleOutcome::NotRegistered
        };

        state.set_phase(Phase::Available);
        Ok(outcome)
    }

    fn probe_error(&self, source: crate::error::ProbeError) -> WorkerError {
        WorkerError::Probe {
            action: self.state.id().to_string(),
            source,
        }
    }
}
