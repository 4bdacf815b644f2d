//! Scalar kernels shared by the gradient noise generator.

/// Quintic fade curve `6t^5 - 15t^4 + 10t^3`.
///
/// First and second derivatives vanish at `t = 0` and `t = 1`, which keeps
/// the interpolated field C2-continuous across lattice cell faces.
#[inline]
pub fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

/// Linear interpolation from `a` (at `t = 0`) to `b` (at `t = 1`).
#[inline]
pub fn lerp(t: f64, a: f64, b: f64) -> f64 {
    a + t * (b - a)
}

/// Dot product of the offset `(x, y, z)` with one of twelve edge gradients.
///
/// The low four bits of `hash` pick the gradient; the sixteen codes map onto
/// the twelve cube-edge directions with four repeated.
#[inline]
pub fn grad(hash: u8, x: f64, y: f64, z: f64) -> f64 {
    let h = hash & 15;
    let u = if h < 8 { x } else { y };
    let v = if h < 4 {
        y
    } else if h == 12 || h == 14 {
        x
    } else {
        z
    };
    (if h & 1 == 0 { u } else { -u }) + (if h & 2 == 0 { v } else { -v })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fade_endpoints_and_midpoint() {
        assert_eq!(fade(0.0), 0.0);
        assert_eq!(fade(1.0), 1.0);
        assert!((fade(0.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn fade_is_flat_at_endpoints() {
        let h = 1e-4;
        let slope_start = (fade(h) - fade(0.0)) / h;
        let slope_end = (fade(1.0) - fade(1.0 - h)) / h;
        assert!(slope_start.abs() < 1e-6, "slope at 0: {slope_start}");
        assert!(slope_end.abs() < 1e-6, "slope at 1: {slope_end}");
    }

    #[test]
    fn lerp_hits_both_ends() {
        assert_eq!(lerp(0.0, -3.0, 5.0), -3.0);
        assert_eq!(lerp(1.0, -3.0, 5.0), 5.0);
        assert_eq!(lerp(0.25, 0.0, 8.0), 2.0);
    }

    #[test]
    fn grad_selects_edge_directions() {
        let (x, y, z) = (0.25, 0.5, 0.75);
        let expected = [
            x + y,
            -x + y,
            x - y,
            -x - y,
            x + z,
            -x + z,
            x - z,
            -x - z,
            y + z,
            -y + z,
            y - z,
            -y - z,
            y + x,
            -y + z,
            y - x,
            -y - z,
        ];
        for (h, want) in expected.into_iter().enumerate() {
            assert_eq!(grad(h as u8, x, y, z), want, "hash {h}");
            // Only the low nibble matters.
            assert_eq!(grad(h as u8 | 0xF0, x, y, z), want, "hash {h} | 0xF0");
        }
    }

    #[test]
    fn grad_is_zero_at_zero_offset() {
        for h in 0..=255u8 {
            assert_eq!(grad(h, 0.0, 0.0, 0.0), 0.0);
        }
    }
}
