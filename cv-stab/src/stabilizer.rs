//! # Stabilization drivers
//!
//! Three entry points share one pipeline: `gen_transforms` computes the
//! transform set without writing video, `stabilize` reads, estimates and
//! writes in one pass, and `apply_transforms` replays a stored transform
//! set. All of them move frames through the same delay contract: a frame
//! is only warped once the smoothing window behind it is populated.

use crate::error::{Error, Result};
use crate::estimator::MotionEstimator;
use crate::frame::Frame;
use crate::keypoints::KeypointMethod;
use crate::layer::{LayerFunc, LayerState};
use crate::video::{Input, VideoSink, VideoSource};
use crate::warp;
use log::*;
use opencv::highgui;
use std::path::Path;
use vidstab::border::{BorderMode, BorderSize, ExtremeCorners, ResolvedBorder};
use vidstab::buffer::FrameBuffer;
use vidstab::trajectory::TrajectoryStore;

/// Per-call stabilization options.
///
/// One value of this is consumed per driver call; nothing in it survives
/// between runs.
pub struct StabilizeOptions {
    /// Smoothing window width, and therefore the output delay.
    pub smoothing_window: usize,
    /// Cap on processed input frames.
    pub max_frames: Option<usize>,
    /// Fill style for border and warp.
    pub border_mode: BorderMode,
    /// Requested border size.
    pub border_size: BorderSize,
    /// Codec for the output file.
    pub fourcc: String,
    /// Show output frames in a window while processing.
    pub playback: bool,
    /// Optional per-frame compositor.
    pub layer_func: Option<LayerFunc>,
}

impl Default for StabilizeOptions {
    fn default() -> Self {
        Self {
            smoothing_window: 30,
            max_frames: None,
            border_mode: BorderMode::Black,
            border_size: BorderSize::Fixed(0),
            fourcc: "MJPG".into(),
            playback: false,
            layer_func: None,
        }
    }
}

impl StabilizeOptions {
    pub fn smoothing_window(self, smoothing_window: usize) -> Self {
        Self {
            smoothing_window,
            ..self
        }
    }

    pub fn max_frames(self, max_frames: usize) -> Self {
        Self {
            max_frames: Some(max_frames),
            ..self
        }
    }

    pub fn border(self, border_size: BorderSize, border_mode: BorderMode) -> Self {
        Self {
            border_size,
            border_mode,
            ..self
        }
    }

    pub fn fourcc(self, fourcc: &str) -> Self {
        Self {
            fourcc: fourcc.into(),
            ..self
        }
    }

    pub fn playback(self, playback: bool) -> Self {
        Self { playback, ..self }
    }

    pub fn layer_func(self, layer_func: LayerFunc) -> Self {
        Self {
            layer_func: Some(layer_func),
            ..self
        }
    }

    fn delay(&self) -> usize {
        match self.max_frames {
            Some(max_frames) => self.smoothing_window.min(max_frames),
            None => self.smoothing_window,
        }
    }
}

/// Video stabilizer configuration.
///
/// Holds only what is fixed across runs: the keypoint detector and the
/// working-size cap for motion math. Each driver call builds its own
/// mutable run state, so one `Stabilizer` can process any number of
/// videos.
pub struct Stabilizer {
    detector: KeypointMethod,
    processing_max_dim: Option<i32>,
}

impl Default for Stabilizer {
    fn default() -> Self {
        Self::new(KeypointMethod::default())
    }
}

impl Stabilizer {
    /// Create a stabilizer using the given keypoint detector.
    pub fn new(detector: KeypointMethod) -> Self {
        Self {
            detector,
            processing_max_dim: None,
        }
    }

    /// Cap the longest image side used for motion math.
    pub fn processing_max_dim(self, cap: i32) -> Self {
        Self {
            processing_max_dim: Some(cap),
            ..self
        }
    }

    pub(crate) fn estimator(&self) -> MotionEstimator {
        MotionEstimator::new(self.detector.clone(), self.processing_max_dim)
    }

    /// Generate the stabilizing transform set for a video.
    ///
    /// Reads the whole source, estimating frame-to-frame motion, and
    /// returns the recomputed trajectory store. No output is written; pass
    /// the store to [`apply_transforms`](Self::apply_transforms) to
    /// stabilize with it.
    pub fn gen_transforms(&self, input: &Input, options: &StabilizeOptions) -> Result<TrajectoryStore> {
        let mut source = VideoSource::open(input)?;
        let mut buffer = FrameBuffer::new(options.smoothing_window + 1);
        let mut estimator = self.estimator();
        let mut store = TrajectoryStore::new(options.max_frames);

        init_trajectory(
            &mut source,
            &mut buffer,
            &mut estimator,
            &mut store,
            usize::MAX,
        )?;
        store.recompute(options.smoothing_window);
        info!("generated {} transforms", store.len());

        Ok(store)
    }

    /// Read a video, stabilize it, and write the result.
    ///
    /// With a fixed border this is a single pass: motion estimation runs
    /// `smoothing_window` frames ahead of warping. With
    /// [`BorderSize::Auto`] the source is read twice, once to size the
    /// border from the full transform set and once to apply it, so the
    /// input must be a rewindable file.
    pub fn stabilize(&self, input: &Input, output: &Path, options: StabilizeOptions) -> Result<()> {
        match options.border_size {
            BorderSize::Auto => {
                if matches!(input, Input::Camera(_)) {
                    return Err(Error::AutoBorderUnsupported("camera input"));
                }
                let store = self.gen_transforms(input, &options)?;
                if store.is_empty() {
                    return Err(Error::EmptyTransforms);
                }
                // Second pass over a reopened source.
                self.apply_stored(input, output, store, options)
            }
            BorderSize::Fixed(_) => {
                let mut source = VideoSource::open(input)?;
                let mut buffer = FrameBuffer::new(options.smoothing_window + 1);
                let mut estimator = self.estimator();
                let mut store = TrajectoryStore::new(options.max_frames);

                init_trajectory(
                    &mut source,
                    &mut buffer,
                    &mut estimator,
                    &mut store,
                    options.delay(),
                )?;
                store.recompute(options.smoothing_window);

                apply_loop(
                    source,
                    output,
                    buffer,
                    store,
                    Some(estimator),
                    options,
                )
            }
        }
    }

    /// Stabilize using a previously generated transform set.
    pub fn apply_transforms(
        &self,
        input: &Input,
        output: &Path,
        store: &TrajectoryStore,
        options: StabilizeOptions,
    ) -> Result<()> {
        if store.is_empty() {
            return Err(Error::EmptyTransforms);
        }
        self.apply_stored(input, output, store.clone(), options)
    }

    fn apply_stored(
        &self,
        input: &Input,
        output: &Path,
        store: TrajectoryStore,
        options: StabilizeOptions,
    ) -> Result<()> {
        let mut source = VideoSource::open(input)?;
        let mut buffer = FrameBuffer::new(options.smoothing_window + 1);

        // Prefetch the smoothing window so the apply loop starts with the
        // delay already established.
        for _ in 0..options.delay() {
            match source.read()? {
                Some(frame) => {
                    buffer.push(frame);
                }
                None => {
                    buffer.mark_source_done();
                    break;
                }
            }
        }
        if buffer.is_empty() {
            return Err(Error::EmptyInput);
        }

        apply_loop(source, output, buffer, store, None, options)
    }
}

/// Bootstrap the estimator and stream frames until `target` transforms are
/// in hand or the source runs dry.
fn init_trajectory(
    source: &mut VideoSource,
    buffer: &mut FrameBuffer<Frame>,
    estimator: &mut MotionEstimator,
    store: &mut TrajectoryStore,
    target: usize,
) -> Result<()> {
    let first = source.read()?.ok_or(Error::EmptyInput)?;
    estimator.bootstrap(&first)?;
    buffer.push(first);

    while store.len() < target {
        match source.read()? {
            Some(frame) => {
                let raw = estimator.step(&frame)?;
                buffer.push(frame);
                store.append(raw);
            }
            None => {
                buffer.mark_source_done();
                break;
            }
        }
    }

    Ok(())
}

/// Pop, warp and write frames until the input or the transform set runs
/// out. When an estimator is supplied, each popped frame is replaced by a
/// freshly read one and the transform set keeps growing; otherwise the
/// stored transforms are replayed as-is.
fn apply_loop(
    mut source: VideoSource,
    output: &Path,
    mut buffer: FrameBuffer<Frame>,
    mut store: TrajectoryStore,
    mut estimator: Option<MotionEstimator>,
    options: StabilizeOptions,
) -> Result<()> {
    let dims = buffer
        .front()
        .map(|frame| frame.dims())
        .ok_or(Error::EmptyInput)?;

    // The border has to be settled before the first warp, since auto
    // sizing depends on the whole transform set.
    let border = match options.border_size {
        BorderSize::Fixed(size) => ResolvedBorder::fixed(size, options.border_mode),
        BorderSize::Auto => {
            let size = ExtremeCorners::scan(dims, store.transforms()).border_size();
            info!("auto border resolved to {} px", size);
            ResolvedBorder::fixed(size, options.border_mode)
        }
    };

    let mut sink = VideoSink::new(output, &options.fourcc, source.fps())?;
    let mut layer = LayerState::new(options.layer_func);
    let playback_title = format!(
        "Stabilization Playback ({} frame delay if using live video; press Q or ESC to quit)",
        options.delay()
    );

    loop {
        let (i, frame) = match buffer.pop_front() {
            Ok(popped) => popped,
            Err(_) => break,
        };

        if options.max_frames.map_or(false, |max| i + 1 >= max) {
            break;
        }

        // Keep the buffer one window ahead of the output.
        if !buffer.source_done() {
            match source.read()? {
                Some(next) => {
                    if let Some(estimator) = estimator.as_mut() {
                        let raw = estimator.step(&next)?;
                        store.append(raw);
                        store.recompute(options.smoothing_window);
                    }
                    buffer.push(next);
                }
                None => buffer.mark_source_done(),
            }
        }

        let transform = match store.transform(i) {
            Some(transform) => transform,
            None => {
                if buffer.is_end() {
                    debug!("transform set exhausted at frame {}; ending normally", i);
                } else {
                    warn!(
                        "input is longer than the transform set (frame {}); stopping",
                        i
                    );
                }
                break;
            }
        };

        let bordered = warp::border_frame(&frame, &border)?;
        let warped = warp::warp_frame(&bordered, transform, border.mode)?;
        let cropped = warp::crop_frame(warped, &border)?;
        let composed = layer.apply(cropped)?;

        if options.playback && !show_playback(&playback_title, &composed)? {
            info!("playback aborted by user");
            break;
        }

        sink.write(&composed)?;
    }

    sink.release()?;
    if options.playback {
        let _ = highgui::destroy_all_windows();
    }

    Ok(())
}

/// Display one frame; returns false when the user asked to quit.
fn show_playback(title: &str, frame: &Frame) -> Result<bool> {
    highgui::imshow(title, frame.image())?;
    let key = highgui::wait_key(1)?;
    Ok(key != i32::from(b'q') && key != 27)
}
