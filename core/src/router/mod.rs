//! Held-input routing
//!
//! Maps held inputs to policies. Every binding gets its own polling worker:
//!
//! ```text
//!   ConditionBoard ◄── on_active / on_inactive ── input source
//!        │
//!        │ wait_all_active(gates)            (blocked while released)
//!        ▼
//!   binding worker ── run_while(all gates held) ──► ArbitrationPolicy
//! ```
//!
//! Gates are level-triggered: the policy is evaluated again and again while
//! every gate stays held, not once per key press. A binding with several
//! gates (an outer key plus an inner mouse button) only runs while all of
//! them are down together. Bindings never share state beyond the board, so
//! any number of them can be active at once.

mod condition;

pub use condition::{ConditionBoard, ConditionId, ConditionListener};

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info};

use crate::arbitration::ArbitrationPolicy;
use crate::error::WorkerError;

/// One held-input → policy mapping.
#[derive(Debug, Clone)]
pub struct Binding {
    pub name: String,
    /// Inputs that must all be held at once
    pub gates: Vec<ConditionId>,
    pub policy: Arc<ArbitrationPolicy>,
}

impl Binding {
    pub fn new(
        name: impl Into<String>,
        gates: Vec<ConditionId>,
        policy: Arc<ArbitrationPolicy>,
    ) -> Self {
        Self {
            name: name.into(),
            gates,
            policy,
        }
    }
}

/// Collects bindings and starts their workers.
pub struct TriggerRouter {
    board: Arc<ConditionBoard>,
    bindings: Vec<Binding>,
    poll_interval: Duration,
    startup_delay: Duration,
}

impl TriggerRouter {
    pub fn new(board: Arc<ConditionBoard>, poll_interval: Duration) -> Self {
        Self {
            board,
            bindings: Vec::new(),
            poll_interval,
            startup_delay: Duration::ZERO,
        }
    }

    /// Delay before any binding starts listening.
    pub fn with_startup_delay(mut self, delay: Duration) -> Self {
        self.startup_delay = delay;
        self
    }

    pub fn bind(&mut self, binding: Binding) {
        self.bindings.push(binding);
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn board(&self) -> &Arc<ConditionBoard> {
        &self.board
    }

    /// Spawn one polling worker per binding.
    pub fn start(self) -> io::Result<RouterHandle> {
        let mut workers = Vec::with_capacity(self.bindings.len());

        for binding in self.bindings {
            let board = Arc::clone(&self.board);
            let poll_interval = self.poll_interval;
            let startup_delay = self.startup_delay;
            let name = binding.name.clone();

            let handle = thread::Builder::new()
                .name(format!("bind-{}", binding.name))
                .spawn(move || {
                    let result = run_binding(&binding, &board, poll_interval, startup_delay);
                    if let Err(e) = &result {
                        error!(binding = %binding.name, error = %e, "Binding worker stopped");
                    }
                    result
                })?;

            workers.push((name, handle));
        }

        info!(bindings = workers.len(), "Router started");
        Ok(RouterHandle {
            board: self.board,
            workers,
        })
    }
}

fn run_binding(
    binding: &Binding,
    board: &ConditionBoard,
    poll_interval: Duration,
    startup_delay: Duration,
) -> Result<(), WorkerError> {
    if !startup_delay.is_zero() {
        thread::sleep(startup_delay);
    }

    while board.wait_all_active(&binding.gates) {
        debug!(binding = %binding.name, "Gates held");
        let fired = binding
            .policy
            .run_while(|| board.all_active(&binding.gates), poll_interval)?;
        debug!(binding = %binding.name, fired, "Gates released");
    }

    Ok(())
}

/// Running router. Dropping it leaves the workers running.
pub struct RouterHandle {
    board: Arc<ConditionBoard>,
    workers: Vec<(String, JoinHandle<Result<(), WorkerError>>)>,
}

impl RouterHandle {
    pub fn board(&self) -> &Arc<ConditionBoard> {
        &self.board
    }

    /// Names of bindings whose worker has exited (normally only after an error).
    pub fn stopped(&self) -> Vec<&str> {
        self.workers
            .iter()
            .filter(|(_, h)| h.is_finished())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Close the board and wait for every binding worker.
    pub fn shutdown(self) -> Vec<(String, Result<(), WorkerError>)> {
        self.board.close();
        self.workers
            .into_iter()
            .map(|(name, handle)| {
                let result = handle.join().unwrap_or(Err(WorkerError::Panicked));
                (name, result)
            })
            .collect()
    }
}
