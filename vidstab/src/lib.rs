//! # Video Stabilization Framework
//!
//! This library provides the motion bookkeeping behind video stabilization:
//! rigid frame-to-frame transforms, the cumulative trajectory and its
//! moving-average smoothing, bounded frame queues, and border sizing.
//!
//! The pieces here are backend-agnostic. Motion estimation, warping and
//! video I/O live in the `cv-stab` crate, which drives these types with
//! OpenCV.
//!
//! The easiest way to use the library is to import its prelude:
//!
//! ```
//! use vidstab::prelude::v1::*;
//! ```

pub mod border;
pub mod buffer;
pub mod error;
pub mod smoothing;
pub mod trajectory;
pub mod transform;

pub mod prelude {
    pub mod v1 {
        pub use crate::{
            border::{BorderMode, BorderSize, ExtremeCorners, ResolvedBorder},
            buffer::FrameBuffer,
            error::{Error, Result},
            smoothing::bfill_rolling_mean,
            trajectory::TrajectoryStore,
            transform::Transform,
        };
    }
}
