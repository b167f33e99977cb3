//! RGBA image buffers and PNG loading.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use hotbar_types::Rect;
use thiserror::Error;

/// Errors that can occur while loading a reference image
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("failed to open {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {path:?}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: png::DecodingError,
    },

    #[error("unsupported color type {color_type:?} in {path:?}")]
    UnsupportedColor {
        path: PathBuf,
        color_type: png::ColorType,
    },

    #[error("buffer of {len} bytes does not hold a {width}x{height} RGBA image")]
    BadBuffer { width: u32, height: u32, len: usize },

    #[error("image has zero width or height")]
    Empty,
}

/// 8-bit RGBA image, row-major.
#[derive(Clone, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 4]>,
}

impl std::fmt::Debug for Image {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Image({}x{})", self.width, self.height)
    }
}

impl Image {
    /// Build from raw RGBA bytes (4 per pixel).
    pub fn from_rgba(width: u32, height: u32, bytes: &[u8]) -> Result<Self, PatternError> {
        if width == 0 || height == 0 {
            return Err(PatternError::Empty);
        }
        if bytes.len() != width as usize * height as usize * 4 {
            return Err(PatternError::BadBuffer {
                width,
                height,
                len: bytes.len(),
            });
        }

        let pixels = bytes
            .chunks_exact(4)
            .map(|c| [c[0], c[1], c[2], c[3]])
            .collect();

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Solid image, mostly useful for building frames in tests and tools.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        Self {
            width,
            height,
            pixels: vec![rgba; width as usize * height as usize],
        }
    }

    /// Decode a PNG file. Palette, 16-bit and low bit-depth images are
    /// normalized to 8-bit channels.
    pub fn load_png(path: &Path) -> Result<Self, PatternError> {
        let file = File::open(path).map_err(|e| PatternError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut decoder = png::Decoder::new(BufReader::new(file));
        decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
        let mut reader = decoder.read_info().map_err(|e| PatternError::Decode {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buf).map_err(|e| PatternError::Decode {
            path: path.to_path_buf(),
            source: e,
        })?;
        let bytes = &buf[..info.buffer_size()];

        let rgba: Vec<u8> = match info.color_type {
            png::ColorType::Rgba => bytes.to_vec(),
            png::ColorType::Rgb => bytes
                .chunks_exact(3)
                .flat_map(|c| [c[0], c[1], c[2], 255])
                .collect(),
            png::ColorType::Grayscale => bytes.iter().flat_map(|&g| [g, g, g, 255]).collect(),
            png::ColorType::GrayscaleAlpha => bytes
                .chunks_exact(2)
                .flat_map(|c| [c[0], c[0], c[0], c[1]])
                .collect(),
            other => {
                return Err(PatternError::UnsupportedColor {
                    path: path.to_path_buf(),
                    color_type: other,
                });
            }
        };

        Self::from_rgba(info.width, info.height, &rgba)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel at (x, y). Caller guarantees bounds.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let width = self.width as usize;
        if let Some(p) = self.pixels.get_mut(y as usize * width + x as usize) {
            *p = rgba;
        }
    }

    /// Copy `other` into this image with its top-left corner at (x, y),
    /// clipping anything that falls outside.
    pub fn blit(&mut self, other: &Image, x: u32, y: u32) {
        for oy in 0..other.height {
            for ox in 0..other.width {
                let (tx, ty) = (x + ox, y + oy);
                if tx < self.width && ty < self.height {
                    self.set_pixel(tx, ty, other.pixel(ox, oy));
                }
            }
        }
    }
}

/// A captured piece of the display and where it sits on screen.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Screen rectangle covered by `image`
    pub bounds: Rect,
    pub image: Image,
}

impl Frame {
    /// Frame covering the screen from the origin.
    pub fn at_origin(image: Image) -> Self {
        Self {
            bounds: Rect::new(0, 0, image.width(), image.height()),
            image,
        }
    }
}
