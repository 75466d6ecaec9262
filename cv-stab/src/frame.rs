//! # Frame color handling

use crate::error::{Error, Result};
use opencv::core::Mat;
use opencv::imgproc;
use opencv::prelude::*;

/// Color layout of a frame image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorFormat {
    /// Single-channel grayscale.
    Gray,
    /// 3-channel blue/green/red.
    Bgr,
    /// 4-channel blue/green/red/alpha.
    Bgra,
}

impl ColorFormat {
    /// Infer the format from an image's channel count.
    pub fn of(image: &Mat) -> Result<Self> {
        match image.channels() {
            1 => Ok(Self::Gray),
            3 => Ok(Self::Bgr),
            4 => Ok(Self::Bgra),
            channels => Err(Error::InvalidFrameShape { channels }),
        }
    }
}

/// An image together with its declared color format.
///
/// The pipeline needs three views of a frame: grayscale for motion math,
/// BGR for writing, and BGRA for alpha-aware bordering. Conversions are
/// produced on demand and nothing is cached across calls.
pub struct Frame {
    image: Mat,
    format: ColorFormat,
}

impl Frame {
    /// Wrap an image, inferring its color format from the channel count.
    pub fn new(image: Mat) -> Result<Self> {
        let format = ColorFormat::of(&image)?;
        Ok(Self { image, format })
    }

    /// Wrap an image with a known color format.
    pub fn with_format(image: Mat, format: ColorFormat) -> Self {
        Self { image, format }
    }

    pub fn image(&self) -> &Mat {
        &self.image
    }

    pub fn into_image(self) -> Mat {
        self.image
    }

    pub fn format(&self) -> ColorFormat {
        self.format
    }

    /// Frame dimensions as `(height, width)`.
    pub fn dims(&self) -> (i32, i32) {
        (self.image.rows(), self.image.cols())
    }

    /// Deep copy of the frame.
    pub fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            image: self.image.try_clone()?,
            format: self.format,
        })
    }

    /// Convert the image into `target`, copying if already there.
    pub fn to(&self, target: ColorFormat) -> Result<Mat> {
        use ColorFormat::*;

        if self.format == target {
            return Ok(self.image.try_clone()?);
        }

        let code = match (self.format, target) {
            (Gray, Bgr) => imgproc::COLOR_GRAY2BGR,
            (Gray, Bgra) => imgproc::COLOR_GRAY2BGRA,
            (Bgr, Gray) => imgproc::COLOR_BGR2GRAY,
            (Bgr, Bgra) => imgproc::COLOR_BGR2BGRA,
            (Bgra, Gray) => imgproc::COLOR_BGRA2GRAY,
            (Bgra, Bgr) => imgproc::COLOR_BGRA2BGR,
            (from, to) => return Err(Error::UnsupportedConversion { from, to }),
        };

        let mut out = Mat::default();
        imgproc::cvt_color(&self.image, &mut out, code, 0)?;
        Ok(out)
    }

    /// Grayscale view of the frame.
    pub fn gray(&self) -> Result<Mat> {
        self.to(ColorFormat::Gray)
    }

    /// BGR view of the frame.
    pub fn bgr(&self) -> Result<Mat> {
        self.to(ColorFormat::Bgr)
    }

    /// BGRA view of the frame.
    pub fn bgra(&self) -> Result<Mat> {
        self.to(ColorFormat::Bgra)
    }
}
