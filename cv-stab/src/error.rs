//! # Pipeline errors

use crate::frame::ColorFormat;

/// Errors produced by the OpenCV stabilization pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A frame image with a channel count outside {1, 3, 4}.
    #[error("unexpected frame image shape: {channels} channels")]
    InvalidFrameShape { channels: i32 },
    /// A color conversion with no direct mapping.
    #[error("unsupported color conversion: {from:?} to {to:?}")]
    UnsupportedConversion { from: ColorFormat, to: ColorFormat },
    /// The input path does not exist, or the camera could not be opened.
    #[error("input not found: {0}")]
    InputNotFound(String),
    /// The source yielded no first frame.
    #[error("input source yielded no frames")]
    EmptyInput,
    /// Applying stored transforms without having generated any.
    #[error("no stored transforms; generate transforms first")]
    EmptyTransforms,
    /// A keypoint detector that this build of OpenCV does not ship.
    #[error("keypoint detector {0} requires an OpenCV contrib (xfeatures2d) build")]
    UnsupportedDetector(&'static str),
    /// A keypoint method name outside the recognized set.
    #[error("unknown keypoint method: {0:?}")]
    UnknownDetector(String),
    /// Auto border sizing needs the whole transform set up front.
    #[error("auto border is undefined for {0}")]
    AutoBorderUnsupported(&'static str),
    /// A codec code that is not exactly four ASCII characters.
    #[error("invalid fourcc code: {0:?}")]
    InvalidFourcc(String),
    /// A path that cannot be passed to the video backend.
    #[error("path is not valid UTF-8: {0:?}")]
    InvalidPath(std::path::PathBuf),
    #[error(transparent)]
    Core(#[from] vidstab::error::Error),
    #[error(transparent)]
    OpenCv(#[from] opencv::Error),
}

pub type Result<T> = core::result::Result<T, Error>;
