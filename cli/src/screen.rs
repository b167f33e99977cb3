//! PNG file standing in for the display.

use std::path::{Path, PathBuf};

use hotbar_core::ProbeError;
use hotbar_core::vision::{Frame, FrameSource, Image};
use hotbar_types::Rect;

/// Re-reads the file on every grab, so replacing it changes what the
/// probes see.
#[derive(Debug, Clone)]
pub struct PngScreen {
    path: PathBuf,
}

impl PngScreen {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FrameSource for PngScreen {
    fn grab(&self, _region: Rect) -> Result<Frame, ProbeError> {
        let image = Image::load_png(&self.path).map_err(|e| ProbeError::Capture(e.to_string()))?;
        Ok(Frame::at_origin(image))
    }
}
