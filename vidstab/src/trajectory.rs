//! # Cumulative trajectory bookkeeping

use crate::smoothing::bfill_rolling_mean;
use crate::transform::Transform;

/// Raw, cumulative and smoothed motion over a processed frame sequence.
///
/// `raw[i]` is the estimated transform taking frame `i` to frame `i + 1`.
/// The trajectory is the componentwise running sum of the raw transforms,
/// and [`recompute`](Self::recompute) derives the smoothed trajectory and
/// the residual transforms that the warper actually applies:
///
/// `transforms[i] = raw[i] + smoothed[i] - trajectory[i]`
#[derive(Clone)]
pub struct TrajectoryStore {
    raw: Vec<Transform>,
    trajectory: Vec<Transform>,
    smoothed: Vec<Transform>,
    transforms: Vec<Transform>,
    max_frames: Option<usize>,
}

impl TrajectoryStore {
    /// Create an empty store.
    ///
    /// # Arguments
    ///
    /// * `max_frames` - optional cap on processed input frames. When set to
    ///   `M`, recomputing truncates every array to its first `M - 1` rows,
    ///   since `M` frames yield `M - 1` inter-frame transforms.
    pub fn new(max_frames: Option<usize>) -> Self {
        Self {
            raw: vec![],
            trajectory: vec![],
            smoothed: vec![],
            transforms: vec![],
            max_frames,
        }
    }

    /// Append one raw frame-to-frame transform, extending the trajectory.
    pub fn append(&mut self, raw: Transform) {
        let last = self.trajectory.last().copied().unwrap_or(Transform::ZERO);
        self.trajectory.push(last + raw);
        self.raw.push(raw);
    }

    /// Recompute the smoothed trajectory and the residual transforms.
    ///
    /// # Arguments
    ///
    /// * `window` - width of the backward-filled rolling mean.
    pub fn recompute(&mut self, window: usize) {
        self.smoothed = bfill_rolling_mean(&self.trajectory, window);
        self.transforms = self
            .raw
            .iter()
            .zip(&self.smoothed)
            .zip(&self.trajectory)
            .map(|((&raw, &smoothed), &trajectory)| raw + smoothed - trajectory)
            .collect();

        if let Some(max_frames) = self.max_frames {
            let keep = max_frames.saturating_sub(1);
            if self.raw.len() > keep {
                self.raw.truncate(keep);
                self.trajectory.truncate(keep);
                self.smoothed.truncate(keep);
                self.transforms.truncate(keep);
            }
        }
    }

    /// Residual transform for output frame `i`, if one was computed.
    pub fn transform(&self, i: usize) -> Option<Transform> {
        self.transforms.get(i).copied()
    }

    /// All residual transforms from the last [`recompute`](Self::recompute).
    pub fn transforms(&self) -> &[Transform] {
        &self.transforms
    }

    /// Raw frame-to-frame transforms in append order.
    pub fn raw(&self) -> &[Transform] {
        &self.raw
    }

    /// Cumulative trajectory rows.
    pub fn trajectory(&self) -> &[Transform] {
        &self.trajectory
    }

    /// Smoothed trajectory rows from the last recompute.
    pub fn smoothed(&self) -> &[Transform] {
        &self.smoothed
    }

    /// Number of raw transforms appended (and kept).
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}
