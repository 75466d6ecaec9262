//! # Keypoint detection
//!
//! The motion estimator tracks whatever points a detector hands it, so
//! detectors are configuration, not state: a method name from a closed set
//! plus per-method parameters, turned into point sets on demand.

use crate::error::{Error, Result};
use opencv::core::{no_array, KeyPoint, Mat, Point2f, Vector};
use opencv::features2d::{self, ORB_ScoreType};
use opencv::imgproc;
use opencv::prelude::*;
use std::str::FromStr;

/// Keypoint detector selection with per-method parameters.
///
/// `Gftt` is the default, carrying the parameters of the classic
/// good-features-to-track setup. `Harris` is the same detector with the
/// Harris response enabled. `Dense` samples a fixed grid instead of
/// responding to image content, which keeps tracking alive on textures
/// where corner detectors starve.
#[derive(Clone, Debug)]
pub enum KeypointMethod {
    Gftt {
        max_corners: i32,
        quality_level: f64,
        min_distance: f64,
        block_size: i32,
    },
    Harris {
        max_corners: i32,
        quality_level: f64,
        min_distance: f64,
        block_size: i32,
    },
    Fast {
        threshold: i32,
    },
    Brisk,
    Mser,
    Orb {
        n_features: i32,
    },
    Sift,
    Dense {
        step: i32,
    },
    /// Only present in OpenCV contrib (`xfeatures2d`) builds.
    Star,
    /// Only present in OpenCV contrib (`xfeatures2d`) builds.
    Surf,
}

impl Default for KeypointMethod {
    fn default() -> Self {
        Self::Gftt {
            max_corners: 200,
            quality_level: 0.01,
            min_distance: 30.0,
            block_size: 3,
        }
    }
}

impl FromStr for KeypointMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "GFTT" => Ok(Self::default()),
            "HARRIS" => Ok(Self::Harris {
                max_corners: 200,
                quality_level: 0.01,
                min_distance: 30.0,
                block_size: 3,
            }),
            "FAST" => Ok(Self::Fast { threshold: 10 }),
            "BRISK" => Ok(Self::Brisk),
            "MSER" => Ok(Self::Mser),
            "ORB" => Ok(Self::Orb { n_features: 500 }),
            "SIFT" => Ok(Self::Sift),
            "DENSE" => Ok(Self::Dense { step: 30 }),
            "STAR" => Ok(Self::Star),
            "SURF" => Ok(Self::Surf),
            _ => Err(Error::UnknownDetector(s.into())),
        }
    }
}

impl KeypointMethod {
    /// Detect keypoints on a grayscale image.
    pub fn detect(&self, gray: &Mat) -> Result<Vector<Point2f>> {
        match *self {
            Self::Gftt {
                max_corners,
                quality_level,
                min_distance,
                block_size,
            } => good_features(gray, max_corners, quality_level, min_distance, block_size, false),
            Self::Harris {
                max_corners,
                quality_level,
                min_distance,
                block_size,
            } => good_features(gray, max_corners, quality_level, min_distance, block_size, true),
            Self::Fast { threshold } => {
                let mut kps = Vector::<KeyPoint>::new();
                features2d::fast(gray, &mut kps, threshold, true)?;
                Ok(points_of(&kps))
            }
            Self::Brisk => {
                let mut detector = features2d::BRISK::create(30, 3, 1.0)?;
                detect_with(&mut detector, gray)
            }
            Self::Mser => {
                let mut detector =
                    features2d::MSER::create(5, 60, 14400, 0.25, 0.2, 200, 1.01, 0.003, 5)?;
                detect_with(&mut detector, gray)
            }
            Self::Orb { n_features } => {
                let mut detector = features2d::ORB::create(
                    n_features,
                    1.2,
                    8,
                    31,
                    0,
                    2,
                    ORB_ScoreType::HARRIS_SCORE,
                    31,
                    20,
                )?;
                detect_with(&mut detector, gray)
            }
            Self::Sift => {
                let mut detector = features2d::SIFT::create(0, 3, 0.04, 10.0, 1.6)?;
                detect_with(&mut detector, gray)
            }
            Self::Dense { step } => {
                let mut points = Vector::new();
                let mut y = step / 2;
                while y < gray.rows() {
                    let mut x = step / 2;
                    while x < gray.cols() {
                        points.push(Point2f::new(x as f32, y as f32));
                        x += step;
                    }
                    y += step;
                }
                Ok(points)
            }
            Self::Star => Err(Error::UnsupportedDetector("STAR")),
            Self::Surf => Err(Error::UnsupportedDetector("SURF")),
        }
    }
}

fn good_features(
    gray: &Mat,
    max_corners: i32,
    quality_level: f64,
    min_distance: f64,
    block_size: i32,
    use_harris: bool,
) -> Result<Vector<Point2f>> {
    let mut corners = Vector::<Point2f>::new();
    imgproc::good_features_to_track(
        gray,
        &mut corners,
        max_corners,
        quality_level,
        min_distance,
        &no_array(),
        block_size,
        use_harris,
        0.04,
    )?;
    Ok(corners)
}

fn detect_with(detector: &mut impl Feature2DTrait, gray: &Mat) -> Result<Vector<Point2f>> {
    let mut kps = Vector::<KeyPoint>::new();
    detector.detect(gray, &mut kps, &no_array())?;
    Ok(points_of(&kps))
}

fn points_of(kps: &Vector<KeyPoint>) -> Vector<Point2f> {
    kps.iter().map(|kp| kp.pt()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{Rect, Scalar, CV_8UC1};

    fn textured() -> Mat {
        let mut image =
            Mat::new_rows_cols_with_default(120, 160, CV_8UC1, Scalar::all(0.0)).unwrap();
        for (i, rect) in [
            Rect::new(20, 20, 30, 25),
            Rect::new(90, 15, 40, 30),
            Rect::new(40, 70, 50, 35),
        ]
        .into_iter()
        .enumerate()
        {
            let mut region = Mat::roi(&image, rect).unwrap();
            region
                .set_to(&Scalar::all(120.0 + 40.0 * i as f64), &no_array())
                .unwrap();
        }
        image
    }

    #[test]
    fn gftt_finds_corners() {
        let points = KeypointMethod::default().detect(&textured()).unwrap();
        assert!(!points.is_empty());
    }

    #[test]
    fn dense_grid_covers_the_image() {
        let points = KeypointMethod::Dense { step: 40 }
            .detect(&textured())
            .unwrap();
        // 120x160 sampled every 40 px starting at 20 -> 3 rows x 4 cols.
        assert_eq!(points.len(), 12);
    }

    #[test]
    fn contrib_detectors_are_rejected() {
        assert!(matches!(
            KeypointMethod::Star.detect(&textured()),
            Err(Error::UnsupportedDetector("STAR"))
        ));
    }

    #[test]
    fn method_names_parse() {
        assert!(matches!(
            "GFTT".parse::<KeypointMethod>().unwrap(),
            KeypointMethod::Gftt { max_corners: 200, .. }
        ));
        assert!(matches!(
            "ORB".parse::<KeypointMethod>().unwrap(),
            KeypointMethod::Orb { n_features: 500 }
        ));
        assert!("AKAZE".parse::<KeypointMethod>().is_err());
    }
}
