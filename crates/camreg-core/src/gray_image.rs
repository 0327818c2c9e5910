//! Grayscale background images and where they come from.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CamregError, Result};

/// Vertical order of the rows in a pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RowOrder {
    /// First row is the top of the image.
    #[default]
    TopToBottom,
    /// First row is the bottom of the image.
    BottomToTop,
}

impl RowOrder {
    /// Maps a top-down texture coordinate `v` to the buffer's row order.
    #[must_use]
    pub fn texcoord_v(self, v: f32) -> f32 {
        match self {
            RowOrder::TopToBottom => v,
            RowOrder::BottomToTop => 1.0 - v,
        }
    }
}

/// A single-channel 8-bit image, one byte per pixel, rows packed without padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    row_order: RowOrder,
}

impl GrayImage {
    /// Creates an image after checking the dimensions against the buffer.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>, row_order: RowOrder) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(CamregError::InvalidImage(format!(
                "image dimensions must be positive, got {width}x{height}"
            )));
        }
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(CamregError::SizeMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
            row_order,
        })
    }

    /// Creates an image filled with a single value.
    pub fn filled(width: u32, height: u32, value: u8) -> Result<Self> {
        Self::new(
            width,
            height,
            vec![value; width as usize * height as usize],
            RowOrder::TopToBottom,
        )
    }

    /// Returns the image width.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the image height.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the raw pixel buffer in its stored row order.
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Returns the row order of the pixel buffer.
    #[must_use]
    pub fn row_order(&self) -> RowOrder {
        self.row_order
    }

    /// Returns the pixel at `(x, y)`, with `y = 0` the top row regardless of
    /// the stored row order.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> u8 {
        let row = match self.row_order {
            RowOrder::TopToBottom => y,
            RowOrder::BottomToTop => self.height - 1 - y,
        };
        self.pixels[row as usize * self.width as usize + x as usize]
    }
}

/// Supplies the background photograph.
pub trait ImageSource {
    /// Loads the image. Called once when the scene is prepared.
    fn load(&self) -> Result<GrayImage>;

    /// Short description used in log messages.
    fn describe(&self) -> String;
}

impl ImageSource for GrayImage {
    fn load(&self) -> Result<GrayImage> {
        Ok(self.clone())
    }

    fn describe(&self) -> String {
        format!("in-memory {}x{} image", self.width, self.height)
    }
}

/// Loads an image file and converts it to 8-bit luma.
#[derive(Debug, Clone)]
pub struct FileImageSource {
    path: PathBuf,
}

impl FileImageSource {
    /// Creates a source for the image at `path`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Returns the file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ImageSource for FileImageSource {
    fn load(&self) -> Result<GrayImage> {
        let luma = image::open(&self.path)?.to_luma8();
        let (width, height) = luma.dimensions();
        log::info!(
            "loaded background {} ({width}x{height})",
            self.path.display()
        );
        GrayImage::new(width, height, luma.into_raw(), RowOrder::TopToBottom)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
