use crate::error::{DragError, Result};

/// Result of a bracketed root search
#[derive(Debug, Clone)]
pub struct RootResult {
    pub root: f64,
    pub iterations_used: usize,
    pub final_error: f64,
    pub success: bool,
}

/// Brent's method for root finding
///
/// Combines bisection, secant and inverse quadratic interpolation. The root
/// must be bracketed by `[a, b]`.
pub fn brent_root_find<F>(
    f: F,
    mut a: f64,
    mut b: f64,
    tolerance: f64,
    max_iterations: usize,
) -> Result<RootResult>
where
    F: Fn(f64) -> f64,
{
    let mut fa = f(a);
    let mut fb = f(b);
    let mut iterations = 0;

    if fa * fb > 0.0 {
        return Err(DragError::RootNotBracketed { a, b, fa, fb });
    }

    // Keep b as the best estimate
    if fa.abs() < fb.abs() {
        std::mem::swap(&mut a, &mut b);
        std::mem::swap(&mut fa, &mut fb);
    }

    let mut c = a;
    let mut fc = fa;
    let mut d = b - a;
    let mut e = d;

    while iterations < max_iterations {
        iterations += 1;

        if fb == 0.0 {
            return Ok(RootResult { root: b, iterations_used: iterations, final_error: 0.0, success: true });
        }

        if fc.abs() < fb.abs() {
            a = b;
            b = c;
            c = a;
            fa = fb;
            fb = fc;
            fc = fa;
        }

        let tolerance_scaled = 2.0 * f64::EPSILON * b.abs() + 0.5 * tolerance;
        let m = 0.5 * (c - b);

        if m.abs() <= tolerance_scaled {
            return Ok(RootResult {
                root: b,
                iterations_used: iterations,
                final_error: fb.abs(),
                success: true,
            });
        }

        if e.abs() >= tolerance_scaled && fa.abs() > fb.abs() {
            let s = fb / fa;
            let mut p;
            let mut q;

            if a == c {
                // Secant step
                p = 2.0 * m * s;
                q = 1.0 - s;
            } else {
                // Inverse quadratic interpolation
                q = fa / fc;
                let r = fb / fc;
                p = s * (2.0 * m * q * (q - r) - (b - a) * (r - 1.0));
                q = (q - 1.0) * (r - 1.0) * (s - 1.0);
            }

            if p > 0.0 {
                q = -q;
            } else {
                p = -p;
            }

            let prev_e = e;
            e = d;

            if 2.0 * p < 3.0 * m * q - (tolerance_scaled * q).abs() && p < (0.5 * prev_e * q).abs() {
                d = p / q;
            } else {
                d = m;
                e = d;
            }
        } else {
            d = m;
            e = d;
        }

        a = b;
        fa = fb;

        if d.abs() > tolerance_scaled {
            b += d;
        } else if m > 0.0 {
            b += tolerance_scaled;
        } else {
            b -= tolerance_scaled;
        }

        fb = f(b);

        // Re-establish the bracket [b, c]
        if (fb > 0.0) == (fc > 0.0) {
            c = a;
            fc = fa;
            d = b - a;
            e = d;
        }
    }

    Ok(RootResult {
        root: b,
        iterations_used: iterations,
        final_error: fb.abs(),
        success: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brent_root_find_quadratic() {
        // x^2 - 4 = 0, root at x = 2
        let result = brent_root_find(|x: f64| x * x - 4.0, 1.0, 3.0, 1e-10, 100).unwrap();

        assert!(result.success);
        assert!((result.root - 2.0).abs() < 1e-8);
        assert!(result.iterations_used > 0);
    }

    #[test]
    fn test_brent_root_find_linear() {
        let result = brent_root_find(|x: f64| 2.0 * x - 6.0, 0.0, 5.0, 1e-10, 100).unwrap();

        assert!(result.success);
        assert!((result.root - 3.0).abs() < 1e-8);
    }

    #[test]
    fn test_brent_root_at_endpoint() {
        let result = brent_root_find(|x: f64| x - 1.0, 1.0, 2.0, 1e-10, 100).unwrap();
        assert!((result.root - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_brent_root_find_cubic() {
        // falling parabola with a known crossing
        let f = |t: f64| 50.0 * t - 4.9 * t * t;
        let result = brent_root_find(f, 5.0, 15.0, 1e-12, 100).unwrap();

        assert!(result.success);
        assert!((result.root - 50.0 / 4.9).abs() < 1e-9);
    }

    #[test]
    fn test_brent_root_find_no_bracket() {
        let result = brent_root_find(|x: f64| x * x + 1.0, 1.0, 3.0, 1e-6, 100);
        assert!(matches!(result, Err(DragError::RootNotBracketed { .. })));
    }
}
