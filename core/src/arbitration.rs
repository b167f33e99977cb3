//! Priority-ordered selection among actions
//!
//! A policy is an ordered group of actions, best first. Each evaluation
//! fires the first one that is available and stops there, so a group like
//! `[big_heal, medium_heal, small_heal]` always uses the strongest heal that
//! is off cooldown.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, trace};

use crate::action::{ActionId, ActionState};
use crate::error::ActuatorError;

#[derive(Debug, Clone)]
pub struct ArbitrationPolicy {
    name: String,
    candidates: Vec<Arc<ActionState>>,
}

impl ArbitrationPolicy {
    /// `candidates` in priority order, highest first.
    pub fn new(name: impl Into<String>, candidates: Vec<Arc<ActionState>>) -> Self {
        Self {
            name: name.into(),
            candidates,
        }
    }

    /// Policy driving a single action: check-and-attempt on every evaluation.
    pub fn single(action: Arc<ActionState>) -> Self {
        Self::new(action.id().to_string(), vec![action])
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn candidates(&self) -> &[Arc<ActionState>] {
        &self.candidates
    }

    /// Fire the highest-priority available candidate.
    ///
    /// Returns the fired action's id, or `None` if nothing was available.
    /// Lower-priority candidates are not touched once one fires.
    pub fn evaluate_once(&self) -> Result<Option<ActionId>, ActuatorError> {
        Ok(self.fire_first()?.map(|action| action.id().clone()))
    }

    fn fire_first(&self) -> Result<Option<&ActionState>, ActuatorError> {
        for action in &self.candidates {
            if !action.is_available() {
                continue;
            }
            // Another policy sharing this action can win the race between the
            // check and the attempt; fall through to the next candidate.
            if action.attempt()? {
                debug!(policy = %self.name, action = %action.id(), "Selected");
                return Ok(Some(action));
            }
        }
        trace!(policy = %self.name, "Nothing available");
        Ok(None)
    }

    /// Evaluate repeatedly while `active` holds.
    ///
    /// After a fire, waits that action's settle delay before the next
    /// evaluation; otherwise waits `poll_interval`. Returns the number of
    /// actions fired.
    pub fn run_while(
        &self,
        mut active: impl FnMut() -> bool,
        poll_interval: Duration,
    ) -> Result<usize, ActuatorError> {
        let mut fired = 0;
        while active() {
            match self.fire_first()? {
                Some(action) => {
                    fired += 1;
                    thread::sleep(action.settle_delay());
                }
                None => thread::sleep(poll_interval),
            }
        }
        Ok(fired)
    }
}
