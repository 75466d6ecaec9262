//! # OpenCV Video Stabilization
//!
//! Stabilizes shaky video by tracking keypoints with sparse pyramidal
//! Lucas-Kanade optical flow, fitting a rigid transform per frame pair,
//! smoothing the cumulative trajectory, and rewarping each frame by the
//! residual between the raw and smoothed trajectories. High-frequency
//! shake is suppressed while intentional camera motion survives.
//!
//! The motion bookkeeping (transforms, trajectory, smoothing, buffering,
//! border sizing) comes from the [`vidstab`] crate; this crate supplies
//! the OpenCV-backed pieces and the drivers:
//!
//! * [`Stabilizer::stabilize`] - file in, stabilized file out.
//! * [`Stabilizer::gen_transforms`] / [`Stabilizer::apply_transforms`] -
//!   two-phase operation with a reusable transform set.
//! * [`Stabilizer::streaming`] - one frame in, one delayed frame out, for
//!   live sources.

pub mod error;
pub mod estimator;
pub mod frame;
pub mod keypoints;
pub mod layer;
pub mod stabilizer;
pub mod streaming;
pub mod video;
pub mod warp;

pub use error::{Error, Result};
pub use estimator::MotionEstimator;
pub use frame::{ColorFormat, Frame};
pub use keypoints::KeypointMethod;
pub use layer::{layer_overlay, LayerFunc};
pub use stabilizer::{StabilizeOptions, Stabilizer};
pub use streaming::StreamingSession;
pub use video::{Input, VideoSink, VideoSource};
pub use vidstab::border::{BorderMode, BorderSize};
pub use vidstab::trajectory::TrajectoryStore;
pub use vidstab::transform::Transform;
