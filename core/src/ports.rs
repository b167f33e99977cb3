//! Seams to the outside world.
//!
//! The engine never touches the keyboard or the display directly. It asks an
//! [`Actuator`] to fire an action and a [`VisionProbe`] to look for an icon.
//! Both are shared by every action worker and may be called concurrently.

use hotbar_types::Rect;

use crate::action::ActionId;
use crate::error::{ActuatorError, ProbeError};
use crate::vision::Image;

/// Sends the configured input for an action. Fire-and-forget: whether the
/// target registered it is inferred later by the confirmation worker.
pub trait Actuator: Send + Sync {
    fn trigger(&self, action: &ActionId) -> Result<(), ActuatorError>;
}

/// Searches part of the display for a reference image.
pub trait VisionProbe: Send + Sync {
    /// Bounding box of the first match of `pattern` inside `region`, if any.
    fn locate(
        &self,
        pattern: &Image,
        region: Rect,
        grayscale: bool,
        color_tolerance: u8,
    ) -> Result<Option<Rect>, ProbeError>;
}

/// Probe used when no display source is configured. Every search fails, which
/// stops the confirmation worker of any action that relies on an icon.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDisplay;

impl VisionProbe for NoDisplay {
    fn locate(
        &self,
        _pattern: &Image,
        _region: Rect,
        _grayscale: bool,
        _color_tolerance: u8,
    ) -> Result<Option<Rect>, ProbeError> {
        Err(ProbeError::SurfaceUnavailable(
            "no display source configured".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_display_always_fails() {
        let pattern = Image::filled(1, 1, [0, 0, 0, 255]);
        let err = NoDisplay
            .locate(&pattern, Rect::default(), true, 0)
            .unwrap_err();
        assert!(matches!(err, ProbeError::SurfaceUnavailable(_)));
    }
}
