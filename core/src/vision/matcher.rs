//! Template matching over captured frames.

use hotbar_types::Rect;

use super::{Frame, Image};
use crate::error::ProbeError;
use crate::ports::VisionProbe;

/// Something that can capture (part of) the display.
pub trait FrameSource: Send + Sync {
    /// Capture a frame covering at least `region` clipped to the display.
    /// Returning more than asked for is fine; the matcher clips.
    fn grab(&self, region: Rect) -> Result<Frame, ProbeError>;
}

/// [`VisionProbe`] backed by a [`FrameSource`] and exhaustive template matching.
pub struct TemplateProbe<F> {
    source: F,
}

impl<F: FrameSource> TemplateProbe<F> {
    pub fn new(source: F) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &F {
        &self.source
    }
}

impl<F: FrameSource> VisionProbe for TemplateProbe<F> {
    fn locate(
        &self,
        pattern: &Image,
        region: Rect,
        grayscale: bool,
        color_tolerance: u8,
    ) -> Result<Option<Rect>, ProbeError> {
        let frame = self.source.grab(region)?;
        Ok(find_template(
            &frame,
            pattern,
            region,
            grayscale,
            color_tolerance,
        ))
    }
}

/// ITU-R 601 luma, the same weights PIL uses for mode "L".
#[inline]
pub fn luma(rgba: [u8; 4]) -> u8 {
    ((rgba[0] as u32 * 299 + rgba[1] as u32 * 587 + rgba[2] as u32 * 114) / 1000) as u8
}

#[inline]
fn pixel_matches(screen: [u8; 4], wanted: [u8; 4], grayscale: bool, tolerance: u8) -> bool {
    if grayscale {
        return luma(screen).abs_diff(luma(wanted)) <= tolerance;
    }
    screen[..3]
        .iter()
        .zip(&wanted[..3])
        .all(|(a, b)| a.abs_diff(*b) <= tolerance)
}

/// Scan `region` of `frame` row by row for `pattern`.
///
/// Fully transparent pattern pixels are ignored. Returns the screen-space
/// bounding box of the first (top-most, then left-most) match.
pub fn find_template(
    frame: &Frame,
    pattern: &Image,
    region: Rect,
    grayscale: bool,
    tolerance: u8,
) -> Option<Rect> {
    // Only the part of `bounds` the image actually covers can be read
    let covered = Rect::new(
        frame.bounds.left,
        frame.bounds.top,
        frame.bounds.width.min(frame.image.width()),
        frame.bounds.height.min(frame.image.height()),
    );
    let area = region.intersect(&covered)?;
    let (pw, ph) = (pattern.width(), pattern.height());
    if area.width < pw || area.height < ph {
        return None;
    }

    // Opaque pattern pixels, precomputed once per search
    let wanted: Vec<(u32, u32, [u8; 4])> = (0..ph)
        .flat_map(|y| (0..pw).map(move |x| (x, y)))
        .map(|(x, y)| (x, y, pattern.pixel(x, y)))
        .filter(|(_, _, p)| p[3] != 0)
        .collect();

    // Frame-local coordinates of the search area
    let fx0 = (area.left - frame.bounds.left) as u32;
    let fy0 = (area.top - frame.bounds.top) as u32;

    for dy in 0..=(area.height - ph) {
        for dx in 0..=(area.width - pw) {
            let (ox, oy) = (fx0 + dx, fy0 + dy);
            let hit = wanted.iter().all(|&(x, y, p)| {
                pixel_matches(frame.image.pixel(ox + x, oy + y), p, grayscale, tolerance)
            });
            if hit {
                return Some(Rect::new(
                    area.left + dx as i32,
                    area.top + dy as i32,
                    pw,
                    ph,
                ));
            }
        }
    }

    None
}
