//! # Border sizing policy
//!
//! Warping pushes frame content past the original rectangle, so frames are
//! padded before warping and optionally cropped after. This module resolves
//! a requested border into the padding/cropping actually performed, and
//! sizes the `auto` border by bounding corner displacement over a full
//! transform set.

use crate::error::Error;
use crate::transform::Transform;
use nalgebra as na;
use std::str::FromStr;

/// Fill style for pixels exposed by padding and warping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BorderMode {
    /// Fill with black.
    Black,
    /// Mirror the frame content.
    Reflect,
    /// Repeat the edge pixels.
    Replicate,
}

impl FromStr for BorderMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "black" => Ok(Self::Black),
            "reflect" => Ok(Self::Reflect),
            "replicate" => Ok(Self::Replicate),
            _ => Err(Error::InvalidBorderType(s.into())),
        }
    }
}

/// Requested border size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BorderSize {
    /// Pad each side by this many pixels; negative values crop inward.
    Fixed(i32),
    /// Size the border from the transform set so nothing is clipped.
    Auto,
}

impl FromStr for BorderSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "auto" => Ok(Self::Auto),
            _ => s
                .parse()
                .map(Self::Fixed)
                .map_err(|_| Error::InvalidBorderSize(s.into())),
        }
    }
}

/// Border sizing with the negative-crop rule already applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedBorder {
    /// Padding added to each side before warping.
    pub pad: i32,
    /// Pixels removed from each side after warping.
    pub crop: i32,
    /// Fill style for the padded region.
    pub mode: BorderMode,
}

impl ResolvedBorder {
    /// Resolve a fixed border size.
    ///
    /// Positive sizes pad each side; zero neither pads nor crops. A
    /// negative size `s` pads each side by 100 and crops each side by
    /// `100 + |s|` after warping, netting a `|s|`-pixel inward crop around
    /// the original frame rectangle.
    pub fn fixed(size: i32, mode: BorderMode) -> Self {
        if size < 0 {
            Self {
                pad: 100,
                crop: 100 + size.unsigned_abs() as i32,
                mode,
            }
        } else {
            Self {
                pad: size,
                crop: 0,
                mode,
            }
        }
    }

    /// Output dimensions for an input of `(height, width)`.
    pub fn output_dims(&self, (height, width): (i32, i32)) -> (i32, i32) {
        let delta = 2 * (self.pad - self.crop);
        (height + delta, width + delta)
    }
}

/// Worst absolute corner displacements over a transform set.
///
/// Each field bounds how far frame content can overshoot the original
/// rectangle in one direction: `min_x`/`max_x` track the left and right
/// corner pairs, `min_y`/`max_y` the top and bottom pairs. All values are
/// non-negative.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ExtremeCorners {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl ExtremeCorners {
    /// Scan a transform set for the worst corner displacements.
    ///
    /// # Arguments
    ///
    /// * `dims` - first frame dimensions as `(height, width)`.
    /// * `transforms` - the full set of residual transforms.
    pub fn scan((height, width): (i32, i32), transforms: &[Transform]) -> Self {
        let h = (height - 1) as f64;
        let w = (width - 1) as f64;
        let corners = [
            na::Point2::new(0.0, 0.0), // top left
            na::Point2::new(0.0, h),   // bottom left
            na::Point2::new(w, 0.0),   // top right
            na::Point2::new(w, h),     // bottom right
        ];

        let mut extremes = Self::default();
        for transform in transforms {
            let deltas = corners.map(|c| transform.apply(c) - c);

            extremes.min_x = extremes.min_x.max(deltas[0].x.abs()).max(deltas[1].x.abs());
            extremes.min_y = extremes.min_y.max(deltas[0].y.abs()).max(deltas[2].y.abs());
            extremes.max_x = extremes.max_x.max(deltas[2].x.abs()).max(deltas[3].x.abs());
            extremes.max_y = extremes.max_y.max(deltas[1].y.abs()).max(deltas[3].y.abs());
        }

        extremes
    }

    /// Border size large enough that no direction clips.
    pub fn border_size(&self) -> i32 {
        self.min_x
            .max(self.min_y)
            .max(self.max_x)
            .max(self.max_y)
            .round() as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn border_type_parsing() {
        assert_eq!("black".parse::<BorderMode>().unwrap(), BorderMode::Black);
        assert_eq!(
            "replicate".parse::<BorderMode>().unwrap(),
            BorderMode::Replicate
        );
        assert!("mirror".parse::<BorderMode>().is_err());
    }

    #[test]
    fn border_size_parsing() {
        assert_eq!("auto".parse::<BorderSize>().unwrap(), BorderSize::Auto);
        assert_eq!("-20".parse::<BorderSize>().unwrap(), BorderSize::Fixed(-20));
        assert!("wide".parse::<BorderSize>().is_err());
    }

    #[test]
    fn positive_border_pads_only() {
        let border = ResolvedBorder::fixed(15, BorderMode::Black);
        assert_eq!(border.pad, 15);
        assert_eq!(border.crop, 0);
        assert_eq!(border.output_dims((100, 200)), (130, 230));
    }

    #[test]
    fn negative_border_nets_an_inward_crop() {
        let border = ResolvedBorder::fixed(-20, BorderMode::Black);
        assert_eq!(border.pad, 100);
        assert_eq!(border.crop, 120);
        // 20 pixels come off each side of the original rectangle.
        assert_eq!(border.output_dims((480, 640)), (440, 600));
    }

    #[test]
    fn zero_border_is_a_no_op() {
        let border = ResolvedBorder::fixed(0, BorderMode::Reflect);
        assert_eq!(border.output_dims((480, 640)), (480, 640));
    }

    #[test]
    fn translation_extremes_bound_every_corner() {
        let transforms = [
            Transform::new(3.0, -1.0, 0.0),
            Transform::new(-7.5, 2.0, 0.0),
        ];
        let extremes = ExtremeCorners::scan((480, 640), &transforms);

        // Pure translation displaces every corner equally.
        assert_approx_eq!(extremes.min_x, 7.5);
        assert_approx_eq!(extremes.max_x, 7.5);
        assert_approx_eq!(extremes.min_y, 2.0);
        assert_approx_eq!(extremes.max_y, 2.0);
        assert_eq!(extremes.border_size(), 8);
    }

    #[test]
    fn auto_border_contains_transformed_corners() {
        let transforms = [
            Transform::new(12.0, -4.0, 0.02),
            Transform::new(-9.0, 6.5, -0.015),
            Transform::new(2.0, 1.0, 0.03),
        ];
        let dims = (360, 480);
        let extremes = ExtremeCorners::scan(dims, &transforms);
        let b = extremes.border_size() as f64;

        // With the frame padded by `b` on each side, every transformed
        // corner stays inside the padded rectangle.
        let h = (dims.0 - 1) as f64;
        let w = (dims.1 - 1) as f64;
        for t in &transforms {
            for corner in [
                na::Point2::new(0.0, 0.0),
                na::Point2::new(0.0, h),
                na::Point2::new(w, 0.0),
                na::Point2::new(w, h),
            ] {
                let p = t.apply(corner);
                assert!(p.x >= -b - 0.5 && p.x <= w + b + 0.5);
                assert!(p.y >= -b - 0.5 && p.y <= h + b + 0.5);
            }
        }
    }

    #[test]
    fn zero_transforms_need_no_border() {
        let extremes = ExtremeCorners::scan((100, 100), &[Transform::ZERO; 5]);
        assert_eq!(extremes.border_size(), 0);
    }
}
