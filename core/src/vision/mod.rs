//! Icon search
//!
//! A [`TemplateProbe`] implements [`VisionProbe`](crate::VisionProbe) by
//! grabbing a frame from a [`FrameSource`] and sliding the reference image
//! over the requested region until every opaque pixel matches.
//!
//! ```text
//!   FrameSource::grab(region) ──► Frame { bounds, image }
//!                                        │
//!                    find_template(frame, pattern, region)
//!                                        │
//!                                        ▼
//!                               Option<Rect> (screen coords)
//! ```

mod image;
mod matcher;

pub use image::{Frame, Image, PatternError};
pub use matcher::{find_template, luma, FrameSource, TemplateProbe};
