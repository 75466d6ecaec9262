//! # Bordered warping
//!
//! Frames are padded before warping so stabilizing motion has room to push
//! content around, and optionally cropped back afterwards. The border and
//! the warp must agree on a fill mode, and the bordered frame carries an
//! alpha channel separating original pixels from fill.

use crate::error::Result;
use crate::frame::{ColorFormat, Frame};
use opencv::core::{self, Mat, Rect, Scalar, Size};
use opencv::imgproc;
use opencv::prelude::*;
use vidstab::border::{BorderMode, ResolvedBorder};
use vidstab::transform::Transform;

/// OpenCV border constant for a fill mode.
pub fn fill_mode(mode: BorderMode) -> i32 {
    match mode {
        BorderMode::Black => core::BORDER_CONSTANT,
        BorderMode::Reflect => core::BORDER_REFLECT,
        BorderMode::Replicate => core::BORDER_REPLICATE,
    }
}

/// Extend a frame by the border padding, attaching an alpha channel.
///
/// The alpha channel is 255 inside the original frame rectangle and 0 in
/// the border region, letting downstream layering tell original pixels
/// from filled ones. The result is always BGRA.
pub fn border_frame(frame: &Frame, border: &ResolvedBorder) -> Result<Frame> {
    let pad = border.pad;

    let mut padded = Mat::default();
    core::copy_make_border(
        frame.image(),
        &mut padded,
        pad,
        pad,
        pad,
        pad,
        fill_mode(border.mode),
        Scalar::all(0.0),
    )?;

    let mut bgra = Frame::with_format(padded, frame.format()).bgra()?;

    let (h, w) = frame.dims();
    let mut alpha = Mat::zeros(bgra.rows(), bgra.cols(), core::CV_8UC1)?.to_mat()?;
    let mut inner = Mat::roi(&alpha, Rect::new(pad, pad, w, h))?;
    inner.set_to(&Scalar::all(255.0), &core::no_array())?;
    core::insert_channel(&alpha, &mut bgra, 3)?;

    Ok(Frame::with_format(bgra, ColorFormat::Bgra))
}

/// Warp a bordered frame by a transform, preserving its size.
pub fn warp_frame(bordered: &Frame, transform: Transform, mode: BorderMode) -> Result<Frame> {
    let m = transform.matrix();
    let m = Mat::from_slice_2d(&[
        [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
        [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
    ])?;

    let (h, w) = bordered.dims();
    let mut warped = Mat::default();
    imgproc::warp_affine(
        bordered.image(),
        &mut warped,
        &m,
        Size::new(w, h),
        imgproc::INTER_LINEAR,
        fill_mode(mode),
        Scalar::all(0.0),
    )?;

    Ok(Frame::with_format(warped, bordered.format()))
}

/// Remove the post-warp crop when a negative border is in effect.
pub fn crop_frame(frame: Frame, border: &ResolvedBorder) -> Result<Frame> {
    if border.crop == 0 {
        return Ok(frame);
    }

    let c = border.crop;
    let (h, w) = frame.dims();
    let format = frame.format();
    let cropped = Mat::roi(frame.image(), Rect::new(c, c, w - 2 * c, h - 2 * c))?.try_clone()?;

    Ok(Frame::with_format(cropped, format))
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{Vec4b, CV_8UC3};

    fn frame() -> Frame {
        let image =
            Mat::new_rows_cols_with_default(40, 60, CV_8UC3, Scalar::new(10.0, 200.0, 30.0, 0.0))
                .unwrap();
        Frame::with_format(image, ColorFormat::Bgr)
    }

    #[test]
    fn border_alpha_separates_fill_from_content() {
        let border = ResolvedBorder::fixed(8, BorderMode::Black);
        let bordered = border_frame(&frame(), &border).unwrap();

        assert_eq!(bordered.format(), ColorFormat::Bgra);
        assert_eq!(bordered.dims(), (56, 76));

        let image = bordered.image();
        // Border corner is transparent fill, frame interior is opaque.
        assert_eq!(image.at_2d::<Vec4b>(0, 0).unwrap()[3], 0);
        assert_eq!(image.at_2d::<Vec4b>(20, 30).unwrap()[3], 255);
        assert_eq!(image.at_2d::<Vec4b>(20, 30).unwrap()[1], 200);
    }

    #[test]
    fn identity_warp_preserves_content() {
        let border = ResolvedBorder::fixed(0, BorderMode::Black);
        let bordered = border_frame(&frame(), &border).unwrap();
        let warped = warp_frame(&bordered, Transform::ZERO, border.mode).unwrap();

        let mut diff = Mat::default();
        core::absdiff(bordered.image(), warped.image(), &mut diff).unwrap();
        let total = core::sum_elems(&diff).unwrap();
        assert_eq!(total, Scalar::all(0.0));
    }

    #[test]
    fn translation_warp_moves_content_into_the_border() {
        let border = ResolvedBorder::fixed(10, BorderMode::Black);
        let bordered = border_frame(&frame(), &border).unwrap();
        let warped = warp_frame(&bordered, Transform::new(6.0, 0.0, 0.0), border.mode).unwrap();

        // The right-hand border fill now holds shifted frame content.
        let moved = warped.image().at_2d::<Vec4b>(30, 72).unwrap();
        assert_eq!(moved[1], 200);
    }

    #[test]
    fn negative_border_crop_shrinks_the_frame() {
        let image = Mat::new_rows_cols_with_default(
            300,
            400,
            CV_8UC3,
            Scalar::new(10.0, 200.0, 30.0, 0.0),
        )
        .unwrap();
        let frame = Frame::with_format(image, ColorFormat::Bgr);

        let border = ResolvedBorder::fixed(-20, BorderMode::Black);
        let bordered = border_frame(&frame, &border).unwrap();
        assert_eq!(bordered.dims(), (500, 600));

        let warped = warp_frame(&bordered, Transform::ZERO, border.mode).unwrap();
        let cropped = crop_frame(warped, &border).unwrap();
        // 20 pixels come off each side of the original 300x400.
        assert_eq!(cropped.dims(), (260, 360));
    }
}
