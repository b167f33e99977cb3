//! Console command handlers.

use std::fmt::Write;
use std::time::Duration;

use hotbar_core::{ActionRegistry, ConditionBoard, ConditionId, ConditionListener};
use hotbar_types::formatting::{format_countdown, format_duration};

pub fn press(condition: &str, board: &ConditionBoard) -> String {
    let id = ConditionId::from(condition);
    if board.is_active(&id) {
        return format!("{id} already held\n");
    }
    board.on_active(&id);
    format!("{id} held\n")
}

pub fn release(condition: &str, board: &ConditionBoard) -> String {
    let id = ConditionId::from(condition);
    if !board.is_active(&id) {
        return format!("{id} was not held\n");
    }
    board.on_inactive(&id);
    format!("{id} released\n")
}

/// Check-and-attempt one action directly, outside any binding.
pub fn fire(action: &str, registry: &ActionRegistry) -> Result<String, String> {
    let state = registry
        .action(action)
        .ok_or_else(|| format!("error: unknown action '{action}'\n"))?;

    match state.attempt() {
        Ok(true) => Ok(format!("{} fired\n", state.id())),
        Ok(false) => Ok(format!(
            "{} not available ({})\n",
            state.id(),
            state.phase().label()
        )),
        Err(e) => Err(format!("error: {e}\n")),
    }
}

pub fn status(registry: &ActionRegistry, board: &ConditionBoard, uptime: Duration) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "uptime {}", format_duration(uptime.as_secs()));

    let held: Vec<String> = board.active().iter().map(ToString::to_string).collect();
    if held.is_empty() {
        let _ = writeln!(out, "held: none");
    } else {
        let _ = writeln!(out, "held: {}", held.join(", "));
    }

    let stopped = registry.stopped_workers();
    for action in registry.snapshot() {
        let mut line = format!(
            "  {:<16} {:<10} {:>6}  {}",
            action.id.as_str(),
            action.phase.label(),
            format_countdown(action.remaining, "s", "-"),
            action.search_region,
        );
        if stopped.contains(&&action.id) {
            line.push_str("  [worker stopped]");
        }
        let _ = writeln!(out, "{line}");
    }
    out
}
