//! # Single-frame streaming stabilization
//!
//! Live input cannot be read twice, so streaming stabilization trades a
//! fixed delay for causality: each call feeds one frame in and, once the
//! smoothing window is populated, gets the frame `window` positions back
//! out. During warm-up the session emits black frames shaped like the
//! output, mirroring the warm-up behavior of background subtractors.

use crate::error::{Error, Result};
use crate::estimator::MotionEstimator;
use crate::frame::Frame;
use crate::layer::LayerState;
use crate::stabilizer::{StabilizeOptions, Stabilizer};
use crate::warp;
use log::*;
use opencv::core::Mat;
use opencv::prelude::*;
use vidstab::border::{BorderSize, ResolvedBorder};
use vidstab::buffer::FrameBuffer;
use vidstab::trajectory::TrajectoryStore;

impl Stabilizer {
    /// Start a streaming session that estimates motion as frames arrive.
    ///
    /// The border size must be fixed up front; auto sizing needs the whole
    /// transform set, which a live stream cannot provide.
    pub fn streaming(&self, options: StabilizeOptions) -> Result<StreamingSession> {
        let size = match options.border_size {
            BorderSize::Fixed(size) => size,
            BorderSize::Auto => {
                return Err(Error::AutoBorderUnsupported("single-frame streaming"))
            }
        };

        Ok(StreamingSession {
            window: options.smoothing_window,
            border: ResolvedBorder::fixed(size, options.border_mode),
            estimator: Some(self.estimator()),
            store: TrajectoryStore::new(None),
            buffer: FrameBuffer::new(options.smoothing_window + 1),
            layer: LayerState::new(options.layer_func),
            blank: None,
            emitted: 0,
        })
    }

    /// Start a streaming session that replays stored transforms instead of
    /// estimating.
    pub fn streaming_with_transforms(
        &self,
        store: &TrajectoryStore,
        options: StabilizeOptions,
    ) -> Result<StreamingSession> {
        if store.is_empty() {
            return Err(Error::EmptyTransforms);
        }

        let mut session = self.streaming(options)?;
        session.estimator = None;
        session.store = store.clone();
        Ok(session)
    }
}

/// Streaming run state with a `window`-frame output delay.
///
/// Created by [`Stabilizer::streaming`]; all cross-call state of a stream
/// lives here and dies with the session.
pub struct StreamingSession {
    window: usize,
    border: ResolvedBorder,
    estimator: Option<MotionEstimator>,
    store: TrajectoryStore,
    buffer: FrameBuffer<Frame>,
    layer: LayerState,
    blank: Option<Frame>,
    emitted: usize,
}

impl StreamingSession {
    /// Feed one frame and collect one output.
    ///
    /// The first `window` calls return an all-black frame shaped like the
    /// output while the trajectory fills. After that, each call consumes
    /// its input and emits the stabilized frame `window` positions behind.
    /// Passing `None` drains the remaining buffered frames one per call,
    /// then yields `None`.
    pub fn next(&mut self, input: Option<Frame>) -> Result<Option<Frame>> {
        match input {
            Some(frame) => {
                if self.blank.is_none() {
                    return self.first_call(frame);
                }

                if let Some(estimator) = self.estimator.as_mut() {
                    let raw = estimator.step(&frame)?;
                    self.store.append(raw);
                    self.store.recompute(self.window);
                }

                if self.emitted < self.window {
                    self.buffer.push(frame);
                    self.emitted += 1;
                    return Ok(self.blank.as_ref().map(|b| b.try_clone()).transpose()?);
                }

                let (i, held) = self.buffer.pop_front()?;
                self.buffer.push(frame);
                self.emit(i, held)
            }
            None => {
                self.buffer.mark_source_done();
                match self.buffer.pop_front() {
                    Ok((i, held)) => self.emit(i, held),
                    Err(_) => Ok(None),
                }
            }
        }
    }

    /// Output delay in frames; also the number of warm-up outputs.
    pub fn delay(&self) -> usize {
        self.window
    }

    /// Prime the session and emit the precomputed warm-up frame.
    fn first_call(&mut self, frame: Frame) -> Result<Option<Frame>> {
        let blank = blank_output(&frame, &self.border)?;
        let out = blank.try_clone()?;
        self.blank = Some(blank);

        if let Some(estimator) = self.estimator.as_mut() {
            estimator.bootstrap(&frame)?;
        }
        self.buffer.push(frame);
        self.emitted += 1;

        Ok(Some(out))
    }

    /// Warp and compose one buffered frame.
    fn emit(&mut self, i: usize, frame: Frame) -> Result<Option<Frame>> {
        let transform = match self.store.transform(i) {
            Some(transform) => transform,
            None => {
                debug!("transform set exhausted at frame {}; stream is done", i);
                return Ok(None);
            }
        };

        let bordered = warp::border_frame(&frame, &self.border)?;
        let warped = warp::warp_frame(&bordered, transform, self.border.mode)?;
        let cropped = warp::crop_frame(warped, &self.border)?;
        let out = self.layer.apply(cropped)?;

        self.emitted += 1;
        Ok(Some(out))
    }
}

/// All-black frame with the same border treatment as real output, so the
/// warm-up frames match the output dimensions.
fn blank_output(first: &Frame, border: &ResolvedBorder) -> Result<Frame> {
    let image = first.image();
    let zeros = Mat::zeros(image.rows(), image.cols(), image.typ())?.to_mat()?;
    let frame = Frame::with_format(zeros, first.format());

    let bordered = warp::border_frame(&frame, border)?;
    warp::crop_frame(bordered, border)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::ColorFormat;
    use opencv::core::{no_array, Rect, Scalar, CV_8UC3};

    fn textured_frame() -> Frame {
        let mut image =
            Mat::new_rows_cols_with_default(120, 160, CV_8UC3, Scalar::all(15.0)).unwrap();
        for (i, rect) in [
            Rect::new(20, 15, 30, 25),
            Rect::new(90, 20, 40, 30),
            Rect::new(50, 70, 45, 35),
        ]
        .into_iter()
        .enumerate()
        {
            let mut region = Mat::roi(&image, rect).unwrap();
            region
                .set_to(
                    &Scalar::new(60.0 * i as f64, 230.0 - 40.0 * i as f64, 90.0, 0.0),
                    &no_array(),
                )
                .unwrap();
        }
        Frame::with_format(image, ColorFormat::Bgr)
    }

    fn is_black(frame: &Frame) -> bool {
        let bgr = frame.bgr().unwrap();
        let total = opencv::core::sum_elems(&bgr).unwrap();
        total[0] + total[1] + total[2] == 0.0
    }

    #[test]
    fn warm_up_emits_black_frames_then_output() {
        let stabilizer = Stabilizer::default();
        let mut session = stabilizer
            .streaming(StabilizeOptions::default().smoothing_window(5))
            .unwrap();

        let input = textured_frame();
        let mut outputs = vec![];
        for _ in 0..8 {
            let out = session.next(Some(input.try_clone().unwrap())).unwrap();
            outputs.push(out.unwrap());
        }

        for out in &outputs[..5] {
            assert!(is_black(out));
            assert_eq!(out.dims(), input.dims());
        }
        for out in &outputs[5..] {
            assert!(!is_black(out));
        }
    }

    #[test]
    fn drain_yields_buffered_frames_then_none() {
        let stabilizer = Stabilizer::default();
        let mut session = stabilizer
            .streaming(StabilizeOptions::default().smoothing_window(4))
            .unwrap();

        let input = textured_frame();
        for _ in 0..6 {
            session.next(Some(input.try_clone().unwrap())).unwrap();
        }

        // 6 frames in, 2 real outputs emitted; 4 remain buffered and the
        // newest one has no transform, so 3 drain before the end.
        let mut drained = 0;
        while session.next(None).unwrap().is_some() {
            drained += 1;
        }
        assert_eq!(drained, 3);
        assert!(session.next(None).unwrap().is_none());
    }

    #[test]
    fn static_input_passes_through_unwarped() {
        let stabilizer = Stabilizer::default();
        let mut session = stabilizer
            .streaming(StabilizeOptions::default().smoothing_window(3))
            .unwrap();

        let input = textured_frame();
        for _ in 0..3 {
            session.next(Some(input.try_clone().unwrap())).unwrap();
        }
        let out = session
            .next(Some(input.try_clone().unwrap()))
            .unwrap()
            .unwrap();

        // Zero motion means the stabilized frame is the input, padded by
        // nothing and converted to BGRA. Sub-pixel LK jitter can blur a
        // few edge pixels, so compare with a small mean tolerance.
        let mut diff = Mat::default();
        opencv::core::absdiff(&out.bgr().unwrap(), input.image(), &mut diff).unwrap();
        let total = opencv::core::sum_elems(&diff).unwrap();
        let mean = (total[0] + total[1] + total[2]) / (120.0 * 160.0 * 3.0);
        assert!(mean < 1.0, "mean abs diff {} too large", mean);
    }

    #[test]
    fn auto_border_is_rejected() {
        let stabilizer = Stabilizer::default();
        let options = StabilizeOptions::default().border(
            BorderSize::Auto,
            vidstab::border::BorderMode::Black,
        );
        assert!(matches!(
            stabilizer.streaming(options),
            Err(Error::AutoBorderUnsupported(_))
        ));
    }
}
