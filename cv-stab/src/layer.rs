//! # Frame compositing hooks

use crate::error::Result;
use crate::frame::{ColorFormat, Frame};
use opencv::core::{self, Mat};
use opencv::prelude::*;

/// Per-frame compositor taking `(foreground, background)`.
///
/// The current stabilized frame arrives as the foreground and the previous
/// output as the background.
pub type LayerFunc = Box<dyn FnMut(&Frame, &Frame) -> Result<Frame>>;

/// Layering state for one run.
///
/// The previous output lives here rather than in the orchestrator so the
/// hook cannot observe state from an earlier run.
pub(crate) struct LayerState {
    func: Option<LayerFunc>,
    prev: Option<Frame>,
}

impl LayerState {
    pub fn new(func: Option<LayerFunc>) -> Self {
        Self { func, prev: None }
    }

    /// Compose against the previous output; the first output passes
    /// through unmodified.
    pub fn apply(&mut self, frame: Frame) -> Result<Frame> {
        let out = match (&mut self.func, &self.prev) {
            (Some(func), Some(prev)) => func(&frame, prev)?,
            _ => frame,
        };

        if self.func.is_some() {
            self.prev = Some(out.try_clone()?);
        }

        Ok(out)
    }
}

/// Paste the foreground's opaque pixels over the background.
///
/// Both frames are taken as BGRA; the foreground's alpha channel decides
/// which pixels survive, so border fill from
/// [`border_frame`](crate::warp::border_frame) stays transparent.
pub fn layer_overlay(foreground: &Frame, background: &Frame) -> Result<Frame> {
    let fg = foreground.bgra()?;
    let mut out = background.bgra()?;

    let mut mask = Mat::default();
    core::extract_channel(&fg, &mut mask, 3)?;
    fg.copy_to_masked(&mut out, &mask)?;

    Ok(Frame::with_format(out, ColorFormat::Bgra))
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{no_array, Rect, Scalar, Vec4b, CV_8UC4};

    fn solid_bgra(b: f64, alpha: f64) -> Frame {
        let image =
            Mat::new_rows_cols_with_default(20, 20, CV_8UC4, Scalar::new(b, 0.0, 0.0, alpha))
                .unwrap();
        Frame::with_format(image, ColorFormat::Bgra)
    }

    #[test]
    fn overlay_respects_alpha() {
        // Foreground: opaque left half, transparent right half.
        let fg = solid_bgra(200.0, 255.0);
        let mut right = Mat::roi(fg.image(), Rect::new(10, 0, 10, 20)).unwrap();
        right
            .set_to(&Scalar::new(200.0, 0.0, 0.0, 0.0), &no_array())
            .unwrap();
        let bg = solid_bgra(50.0, 255.0);

        let out = layer_overlay(&fg, &bg).unwrap();
        assert_eq!(out.image().at_2d::<Vec4b>(10, 3).unwrap()[0], 200);
        assert_eq!(out.image().at_2d::<Vec4b>(10, 16).unwrap()[0], 50);
    }

    #[test]
    fn first_output_passes_through() {
        let calls = std::rc::Rc::new(std::cell::Cell::new(0usize));
        let counter = calls.clone();
        let func: LayerFunc = Box::new(move |fg, _bg| {
            counter.set(counter.get() + 1);
            fg.try_clone()
        });

        let mut state = LayerState::new(Some(func));
        state.apply(solid_bgra(10.0, 255.0)).unwrap();
        assert_eq!(calls.get(), 0);
        state.apply(solid_bgra(20.0, 255.0)).unwrap();
        assert_eq!(calls.get(), 1);
    }
}
