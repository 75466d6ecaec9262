//! # Frame-to-frame rigid motion estimation
//!
//! The estimator carries the previous frame's grayscale image and
//! keypoints, tracks those points into each new frame with pyramidal
//! Lucas-Kanade flow, and fits a partial (rigid) affine to the surviving
//! matches. Keypoints are re-detected on every frame: sparse LK bleeds
//! features near the image edges, and re-detection keeps the feature count
//! stable at a cost that is small next to the warp.

use crate::error::Result;
use crate::frame::Frame;
use crate::keypoints::KeypointMethod;
use log::*;
use opencv::calib3d;
use opencv::core::{self, Mat, Point2f, Size, TermCriteria, Vector};
use opencv::imgproc;
use opencv::prelude::*;
use opencv::video;
use vidstab::transform::Transform;

/// Motion estimator state machine.
///
/// Motion math runs on grayscale images capped at `processing_max_dim` on
/// their longest side; recovered translations are scaled back so the
/// resulting transforms live in full-resolution coordinates. The working
/// scale is fixed by the first frame and reused for the whole run.
pub struct MotionEstimator {
    detector: KeypointMethod,
    processing_max_dim: Option<i32>,
    scale: Option<f64>,
    scale_decided: bool,
    prev_gray: Option<Mat>,
    prev_kps: Vector<Point2f>,
}

impl MotionEstimator {
    /// Create an estimator with no prior frame.
    ///
    /// # Arguments
    ///
    /// * `detector` - keypoint detector configuration.
    /// * `processing_max_dim` - longest-side cap for motion math, or `None`
    ///   to always work at full resolution.
    pub fn new(detector: KeypointMethod, processing_max_dim: Option<i32>) -> Self {
        Self {
            detector,
            processing_max_dim,
            scale: None,
            scale_decided: false,
            prev_gray: None,
            prev_kps: Vector::new(),
        }
    }

    /// Prime the estimator with the first frame of a run.
    ///
    /// A frame without detectable keypoints is not an error; the following
    /// [`step`](Self::step) reports zero motion instead.
    pub fn bootstrap(&mut self, frame: &Frame) -> Result<()> {
        let gray = self.working_gray(frame)?;
        self.prev_kps = self.detector.detect(&gray)?;
        if self.prev_kps.is_empty() {
            debug!("no keypoints on bootstrap frame; reporting zero motion until features appear");
        }
        self.prev_gray = Some(gray);
        Ok(())
    }

    /// Consume the next frame and return the raw frame-to-frame transform.
    ///
    /// Degenerate frames (no prior keypoints, fewer than two surviving
    /// matches, or a failed fit) yield the zero transform so the pipeline
    /// keeps moving.
    pub fn step(&mut self, frame: &Frame) -> Result<Transform> {
        let cur_gray = self.working_gray(frame)?;

        let prev_gray = match self.prev_gray.take() {
            Some(prev) => prev,
            // Stepping an unprimed estimator just primes it.
            None => {
                self.prev_kps = self.detector.detect(&cur_gray)?;
                self.prev_gray = Some(cur_gray);
                return Ok(Transform::ZERO);
            }
        };

        let raw = if self.prev_kps.is_empty() {
            Transform::ZERO
        } else {
            let (prev_pts, cur_pts) = self.track(&prev_gray, &cur_gray)?;
            self.partial_transform(&prev_pts, &cur_pts)?
        };

        self.prev_kps = self.detector.detect(&cur_gray)?;
        self.prev_gray = Some(cur_gray);

        Ok(raw)
    }

    /// Grayscale working image, resized per the persistent policy.
    fn working_gray(&mut self, frame: &Frame) -> Result<Mat> {
        let gray = frame.gray()?;

        if !self.scale_decided {
            let longest = gray.rows().max(gray.cols());
            self.scale = match self.processing_max_dim {
                Some(cap) if longest > cap => Some(cap as f64 / longest as f64),
                _ => None,
            };
            self.scale_decided = true;
            if let Some(scale) = self.scale {
                debug!("motion math runs at {:.3}x resolution", scale);
            }
        }

        match self.scale {
            Some(scale) => {
                let size = Size::new(
                    (gray.cols() as f64 * scale).round() as i32,
                    (gray.rows() as f64 * scale).round() as i32,
                );
                let mut resized = Mat::default();
                imgproc::resize(&gray, &mut resized, size, 0.0, 0.0, imgproc::INTER_AREA)?;
                Ok(resized)
            }
            None => Ok(gray),
        }
    }

    /// Track the prior keypoints into `cur_gray`, keeping matched pairs.
    fn track(&self, prev_gray: &Mat, cur_gray: &Mat) -> Result<(Vector<Point2f>, Vector<Point2f>)> {
        let mut cur_kps = Vector::<Point2f>::new();
        let mut status = Vector::<u8>::new();
        let mut err = Vector::<f32>::new();

        video::calc_optical_flow_pyr_lk(
            prev_gray,
            cur_gray,
            &self.prev_kps,
            &mut cur_kps,
            &mut status,
            &mut err,
            Size::new(21, 21),
            3,
            TermCriteria::new(core::TermCriteria_COUNT + core::TermCriteria_EPS, 30, 0.01)?,
            0,
            1e-4,
        )?;

        let mut prev_matched = Vector::new();
        let mut cur_matched = Vector::new();
        for (i, matched) in status.iter().enumerate() {
            if matched == 1 {
                prev_matched.push(self.prev_kps.get(i)?);
                cur_matched.push(cur_kps.get(i)?);
            }
        }

        Ok((prev_matched, cur_matched))
    }

    /// Least-squares rigid fit from matched point pairs.
    fn partial_transform(
        &self,
        prev_pts: &Vector<Point2f>,
        cur_pts: &Vector<Point2f>,
    ) -> Result<Transform> {
        if prev_pts.len() < 2 {
            debug!(
                "only {} matched keypoints; reporting zero motion",
                prev_pts.len()
            );
            return Ok(Transform::ZERO);
        }

        let mut inliers = Mat::default();
        let m = calib3d::estimate_affine_partial_2d(
            prev_pts,
            cur_pts,
            &mut inliers,
            calib3d::RANSAC,
            3.0,
            2000,
            0.99,
            10,
        )?;

        if m.empty() {
            debug!("rigid fit failed; reporting zero motion");
            return Ok(Transform::ZERO);
        }

        let mut dx = *m.at_2d::<f64>(0, 2)?;
        let mut dy = *m.at_2d::<f64>(1, 2)?;
        let da = f64::atan2(*m.at_2d::<f64>(1, 0)?, *m.at_2d::<f64>(0, 0)?);

        // Flow ran on the resized image; translations are full-resolution.
        if let Some(scale) = self.scale {
            dx /= scale;
            dy /= scale;
        }

        Ok(Transform::new(dx, dy, da))
    }
}
