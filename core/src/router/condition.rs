//! Level-triggered input conditions.

use std::collections::BTreeSet;
use std::sync::{Condvar, Mutex};

use crate::lock;

/// Name of an external input, e.g. `key:f1` or `mouse:right`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConditionId(String);

impl ConditionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ConditionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl std::fmt::Display for ConditionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Edge callbacks from whatever watches the keyboard and mouse.
pub trait ConditionListener: Send + Sync {
    /// Input went down (repeats while held are harmless).
    fn on_active(&self, id: &ConditionId);
    /// Input went up.
    fn on_inactive(&self, id: &ConditionId);
}

#[derive(Debug, Default)]
struct BoardState {
    active: BTreeSet<ConditionId>,
    closed: bool,
}

/// Current level of every input, shared by all binding workers.
///
/// Workers block on the board while their inputs are released and are woken
/// on every edge.
#[derive(Debug, Default)]
pub struct ConditionBoard {
    state: Mutex<BoardState>,
    changed: Condvar,
}

impl ConditionBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `id` held. Returns true on a rising edge.
    pub fn activate(&self, id: &ConditionId) -> bool {
        let rising = lock(&self.state).active.insert(id.clone());
        if rising {
            self.changed.notify_all();
        }
        rising
    }

    /// Mark `id` released. Returns true on a falling edge.
    pub fn deactivate(&self, id: &ConditionId) -> bool {
        let falling = lock(&self.state).active.remove(id);
        if falling {
            self.changed.notify_all();
        }
        falling
    }

    pub fn is_active(&self, id: &ConditionId) -> bool {
        lock(&self.state).active.contains(id)
    }

    /// True if every gate is held and the board is open.
    pub fn all_active(&self, gates: &[ConditionId]) -> bool {
        let state = lock(&self.state);
        !state.closed && gates.iter().all(|g| state.active.contains(g))
    }

    /// Block until every gate is held at once. Returns false if the board
    /// was closed instead.
    pub fn wait_all_active(&self, gates: &[ConditionId]) -> bool {
        let mut state = lock(&self.state);
        loop {
            if state.closed {
                return false;
            }
            if gates.iter().all(|g| state.active.contains(g)) {
                return true;
            }
            state = self
                .changed
                .wait(state)
                .unwrap_or_else(std::sync::PoisonError::into_inner);
        }
    }

    /// Currently held inputs, sorted.
    pub fn active(&self) -> Vec<ConditionId> {
        lock(&self.state).active.iter().cloned().collect()
    }

    /// Release everything and wake all waiters for good.
    pub fn close(&self) {
        let mut state = lock(&self.state);
        state.closed = true;
        state.active.clear();
        drop(state);
        self.changed.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.state).closed
    }
}

impl ConditionListener for ConditionBoard {
    fn on_active(&self, id: &ConditionId) {
        self.activate(id);
    }

    fn on_inactive(&self, id: &ConditionId) {
        self.deactivate(id);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_condition_ids_normalize() {
        assert_eq!(ConditionId::new(" Key:F1 "), ConditionId::from("key:f1"));
    }

    #[test]
    fn test_edges() {
        let board = ConditionBoard::new();
        let f1 = ConditionId::from("key:f1");

        assert!(board.activate(&f1));
        assert!(!board.activate(&f1), "key repeat reported as a new edge");
        assert!(board.is_active(&f1));
        assert!(board.deactivate(&f1));
        assert!(!board.deactivate(&f1));
        assert!(!board.is_active(&f1));
    }

    #[test]
    fn test_all_active_requires_every_gate() {
        let board = ConditionBoard::new();
        let gates = [ConditionId::from("key:shift"), ConditionId::from("mouse:right")];

        board.activate(&gates[1]);
        assert!(!board.all_active(&gates));
        board.activate(&gates[0]);
        assert!(board.all_active(&gates));
        board.deactivate(&gates[1]);
        assert!(!board.all_active(&gates));
    }

    #[test]
    fn test_wait_wakes_on_activation() {
        let board = Arc::new(ConditionBoard::new());
        let gates = vec![ConditionId::from("key:f1"), ConditionId::from("mouse:left")];

        let waiter = {
            let board = Arc::clone(&board);
            let gates = gates.clone();
            thread::spawn(move || board.wait_all_active(&gates))
        };

        thread::sleep(Duration::from_millis(20));
        board.activate(&gates[0]);
        thread::sleep(Duration::from_millis(20));
        assert!(!waiter.is_finished(), "woke with only one gate held");

        board.activate(&gates[1]);
        assert!(waiter.join().unwrap());
    }

    #[test]
    fn test_close_releases_waiters() {
        let board = Arc::new(ConditionBoard::new());
        let waiter = {
            let board = Arc::clone(&board);
            thread::spawn(move || board.wait_all_active(&[ConditionId::from("key:f9")]))
        };

        thread::sleep(Duration::from_millis(20));
        board.close();
        assert!(!waiter.join().unwrap());
        assert!(board.is_closed());
        assert!(!board.all_active(&[]));
    }

    #[test]
    fn test_listener_callbacks_drive_board() {
        let board = ConditionBoard::new();
        let listener: &dyn ConditionListener = &board;
        let id = ConditionId::from("mouse:right");

        listener.on_active(&id);
        assert_eq!(board.active(), vec![id.clone()]);
        listener.on_inactive(&id);
        assert!(board.active().is_empty());
    }
}
