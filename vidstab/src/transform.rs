//! # Rigid frame-to-frame transforms

use nalgebra as na;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, Sub};

/// A 3-DOF rigid transform between two consecutive frames.
///
/// `dx` and `dy` are pixel translations, `da` is a rotation angle in
/// radians. The trajectory composes these additively per component, which
/// holds only for the small per-frame rotations of handheld shake; this
/// type deliberately offers no SE(2) product.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transform {
    /// Horizontal translation in pixels.
    pub dx: f64,
    /// Vertical translation in pixels.
    pub dy: f64,
    /// Rotation in radians.
    pub da: f64,
}

impl Transform {
    /// The identity motion.
    pub const ZERO: Self = Self {
        dx: 0.0,
        dy: 0.0,
        da: 0.0,
    };

    /// Create a new transform.
    ///
    /// # Arguments
    ///
    /// * `dx` - horizontal translation in pixels.
    /// * `dy` - vertical translation in pixels.
    /// * `da` - rotation in radians.
    pub fn new(dx: f64, dy: f64, da: f64) -> Self {
        Self { dx, dy, da }
    }

    /// Build the 2x3 affine matrix encoding this transform.
    ///
    /// The layout is `[[cos da, -sin da, dx], [sin da, cos da, dy]]`.
    pub fn matrix(&self) -> na::Matrix2x3<f64> {
        let (sin, cos) = self.da.sin_cos();
        na::Matrix2x3::new(cos, -sin, self.dx, sin, cos, self.dy)
    }

    /// Apply the transform to a 2D point.
    pub fn apply(&self, p: na::Point2<f64>) -> na::Point2<f64> {
        let m = self.matrix();
        na::Point2::new(
            m[(0, 0)] * p.x + m[(0, 1)] * p.y + m[(0, 2)],
            m[(1, 0)] * p.x + m[(1, 1)] * p.y + m[(1, 2)],
        )
    }
}

impl Add for Transform {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.dx + rhs.dx, self.dy + rhs.dy, self.da + rhs.da)
    }
}

impl AddAssign for Transform {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Transform {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.dx - rhs.dx, self.dy - rhs.dy, self.da - rhs.da)
    }
}

impl Div<f64> for Transform {
    type Output = Self;

    fn div(self, rhs: f64) -> Self {
        Self::new(self.dx / rhs, self.dy / rhs, self.da / rhs)
    }
}

impl Sum for Transform {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, t| acc + t)
    }
}
