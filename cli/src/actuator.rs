//! Stand-in actuator that logs the chord it would send.

use std::collections::HashMap;

use hotbar_core::{ActionId, Actuator, ActuatorError};
use hotbar_types::HotbarConfig;
use tracing::info;

/// Maps each action to its key chord and logs it on trigger.
#[derive(Debug, Default)]
pub struct LogActuator {
    chords: HashMap<ActionId, String>,
}

impl LogActuator {
    pub fn from_config(config: &HotbarConfig) -> Self {
        let chords = config
            .actions
            .iter()
            .filter(|a| !a.keys.is_empty())
            .map(|a| (ActionId::new(&a.id), a.chord()))
            .collect();
        Self { chords }
    }

    pub fn chord(&self, action: &ActionId) -> Option<&str> {
        self.chords.get(action).map(String::as_str)
    }
}

impl Actuator for LogActuator {
    fn trigger(&self, action: &ActionId) -> Result<(), ActuatorError> {
        let chord = self
            .chord(action)
            .ok_or_else(|| ActuatorError::NoChord(action.to_string()))?;
        info!(action = %action, chord, "Send keys");
        Ok(())
    }
}
