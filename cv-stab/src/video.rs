//! # Video sources and sinks

use crate::error::{Error, Result};
use crate::frame::Frame;
use log::*;
use opencv::core::{Mat, Size};
use opencv::prelude::*;
use opencv::videoio::{self, VideoCapture, VideoWriter};
use std::os::raw::c_char;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::thread;
use std::time::Duration;

/// Fallback frame rate when the source does not report one.
const DEFAULT_FPS: f64 = 30.0;

/// Where frames come from: a container file or a live camera device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Input {
    File(PathBuf),
    Camera(i32),
}

impl FromStr for Input {
    type Err = std::convert::Infallible;

    /// A non-negative integer selects a camera device; anything else is a
    /// file path.
    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        match s.parse::<i32>() {
            Ok(index) if index >= 0 => Ok(Self::Camera(index)),
            _ => Ok(Self::File(PathBuf::from(s))),
        }
    }
}

impl From<&Path> for Input {
    fn from(path: &Path) -> Self {
        Self::File(path.to_path_buf())
    }
}

/// Reader over a video capture handle.
pub struct VideoSource {
    capture: VideoCapture,
    input: Input,
}

impl VideoSource {
    /// Open a source for reading.
    ///
    /// Camera devices get a short warm-up sleep before the first read, as
    /// live capture tends to return empty frames right after opening.
    pub fn open(input: &Input) -> Result<Self> {
        let capture = match input {
            Input::File(path) => {
                if !path.exists() {
                    return Err(Error::InputNotFound(path.display().to_string()));
                }
                let path = path
                    .to_str()
                    .ok_or_else(|| Error::InvalidPath(path.clone()))?;
                VideoCapture::from_file(path, videoio::CAP_ANY)?
            }
            Input::Camera(index) => {
                let capture = VideoCapture::new(*index, videoio::CAP_ANY)?;
                thread::sleep(Duration::from_millis(100));
                capture
            }
        };

        if !capture.is_opened()? {
            return Err(Error::InputNotFound(format!("{input:?}")));
        }

        Ok(Self {
            capture,
            input: input.clone(),
        })
    }

    /// Read the next frame; `None` signals end-of-stream.
    pub fn read(&mut self) -> Result<Option<Frame>> {
        let mut image = Mat::default();
        if self.capture.read(&mut image)? && !image.empty() {
            Frame::new(image).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Source frame rate, falling back to 30 when unreported.
    pub fn fps(&self) -> f64 {
        match self.capture.get(videoio::CAP_PROP_FPS) {
            Ok(fps) if fps.is_finite() && fps > 0.0 => fps,
            _ => DEFAULT_FPS,
        }
    }

    /// Whether this source can be read again from the start.
    pub fn is_rewindable(&self) -> bool {
        matches!(self.input, Input::File(_))
    }
}

impl Drop for VideoSource {
    fn drop(&mut self) {
        if let Err(err) = self.capture.release() {
            warn!("failed to release video capture: {}", err);
        }
    }
}

/// Lazily initialized writer for stabilized output.
///
/// The writer is created from the first written frame's dimensions rather
/// than the input's, since bordering changes the output geometry.
pub struct VideoSink {
    path: PathBuf,
    fourcc: i32,
    fps: f64,
    writer: Option<VideoWriter>,
}

impl VideoSink {
    /// Prepare a sink without touching the filesystem yet.
    ///
    /// # Arguments
    ///
    /// * `path` - output file path.
    /// * `fourcc` - 4-character codec code, e.g. `MJPG`.
    /// * `fps` - output frame rate.
    pub fn new(path: &Path, fourcc: &str, fps: f64) -> Result<Self> {
        if fourcc.len() != 4 || !fourcc.is_ascii() {
            return Err(Error::InvalidFourcc(fourcc.into()));
        }
        let code: Vec<c_char> = fourcc.chars().map(|c| c as c_char).collect();

        Ok(Self {
            path: path.to_path_buf(),
            fourcc: VideoWriter::fourcc(code[0], code[1], code[2], code[3])?,
            fps,
            writer: None,
        })
    }

    /// Write one frame, creating the writer on first use.
    pub fn write(&mut self, frame: &Frame) -> Result<()> {
        let bgr = frame.bgr()?;

        if self.writer.is_none() {
            let path = self
                .path
                .to_str()
                .ok_or_else(|| Error::InvalidPath(self.path.clone()))?;
            let size = Size::new(bgr.cols(), bgr.rows());
            self.writer = Some(VideoWriter::new(path, self.fourcc, self.fps, size, true)?);
        }

        if let Some(writer) = self.writer.as_mut() {
            writer.write(&bgr)?;
        }
        Ok(())
    }

    /// Flush and close the writer, if one was created.
    pub fn release(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.release()?;
        }
        Ok(())
    }
}

impl Drop for VideoSink {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            warn!("failed to release video writer: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_parsing() {
        assert_eq!("0".parse::<Input>().unwrap(), Input::Camera(0));
        assert_eq!("2".parse::<Input>().unwrap(), Input::Camera(2));
        assert_eq!(
            "video.avi".parse::<Input>().unwrap(),
            Input::File(PathBuf::from("video.avi"))
        );
        assert_eq!(
            "-1".parse::<Input>().unwrap(),
            Input::File(PathBuf::from("-1"))
        );
    }

    #[test]
    fn missing_file_is_reported() {
        let input = Input::File(PathBuf::from("definitely/not/here.avi"));
        assert!(matches!(
            VideoSource::open(&input),
            Err(Error::InputNotFound(_))
        ));
    }

    #[test]
    fn fourcc_must_be_four_ascii_chars() {
        assert!(matches!(
            VideoSink::new(Path::new("out.avi"), "MJPEG", 30.0),
            Err(Error::InvalidFourcc(_))
        ));
        assert!(VideoSink::new(Path::new("out.avi"), "MJPG", 30.0).is_ok());
    }
}
