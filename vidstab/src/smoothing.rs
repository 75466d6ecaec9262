//! # Trajectory smoothing

use crate::transform::Transform;

/// Backward-filled rolling mean over a transform sequence.
///
/// `out[i]` is the componentwise mean of `rows[max(0, i + 1 - n) ..= i]`.
/// The first `n - 1` positions average whatever shorter prefix exists
/// rather than being held back as missing, so the output always has the
/// same length as the input.
///
/// # Arguments
///
/// * `rows` - trajectory rows to smooth.
/// * `n` - width of the averaging window. Must be non-zero.
pub fn bfill_rolling_mean(rows: &[Transform], n: usize) -> Vec<Transform> {
    assert!(n > 0, "smoothing window must be non-zero");

    (0..rows.len())
        .map(|i| {
            let lo = (i + 1).saturating_sub(n);
            let window = &rows[lo..=i];
            window.iter().copied().sum::<Transform>() / window.len() as f64
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn ramp(len: usize) -> Vec<Transform> {
        (0..len)
            .map(|i| Transform::new(i as f64, -(i as f64), 0.1 * i as f64))
            .collect()
    }

    #[test]
    fn prefix_uses_shorter_windows() {
        let rows = ramp(6);
        let smoothed = bfill_rolling_mean(&rows, 3);

        assert_eq!(smoothed.len(), rows.len());
        // First entries average the available prefix only.
        assert_approx_eq!(smoothed[0].dx, 0.0);
        assert_approx_eq!(smoothed[1].dx, 0.5);
        // Steady state: mean of the trailing 3 rows.
        assert_approx_eq!(smoothed[2].dx, 1.0);
        assert_approx_eq!(smoothed[5].dx, 4.0);
        assert_approx_eq!(smoothed[5].dy, -4.0);
        assert_approx_eq!(smoothed[5].da, 0.4);
    }

    #[test]
    fn window_wider_than_input_is_a_running_mean() {
        let rows = ramp(4);
        let smoothed = bfill_rolling_mean(&rows, 30);

        assert_approx_eq!(smoothed[3].dx, 1.5);
    }

    #[test]
    fn unit_window_is_identity() {
        let rows = ramp(5);
        let smoothed = bfill_rolling_mean(&rows, 1);

        for (s, r) in smoothed.iter().zip(rows.iter()) {
            assert_approx_eq!(s.dx, r.dx);
            assert_approx_eq!(s.dy, r.dy);
            assert_approx_eq!(s.da, r.da);
        }
    }
}
