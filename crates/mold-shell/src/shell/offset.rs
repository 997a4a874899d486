//! Offsets of sampled section curves.
//!
//! Both shells draw their void skin inside a section curve `x ↦ f(x)` that is
//! piecewise linear between samples: the wall's cavity radius over height and
//! the foot's top height over radius. Shifting the curve along one axis thins
//! the material wherever the curve runs close to that axis. Here the skin is
//! taken from the curve swept by a disk of radius `t` instead, so every skin
//! point keeps at least `t` from the curve.

/// Value of the polyline at `x`, or `None` outside its samples.
fn value_at(xs: &[f64], fs: &[f64], x: f64) -> Option<f64> {
    let (&first, &last) = (xs.first()?, xs.last()?);
    if x < first || x > last {
        return None;
    }
    let k = xs.partition_point(|&v| v <= x);
    if k >= xs.len() {
        return fs.last().copied();
    }
    let (x0, x1) = (xs[k - 1], xs[k]);
    let frac = if x1 > x0 { (x - x0) / (x1 - x0) } else { 0.0 };
    Some(fs[k - 1] + (fs[k] - fs[k - 1]) * frac)
}

/// Top of the disk sweep of the polyline `(xs, fs)` at `x`:
/// the largest `f(x') + sqrt(t² − (x − x')²)` over `|x − x'| ≤ t`.
///
/// `xs` must ascend. Returns `-∞` when no sample lies within `t` of `x`.
pub fn disk_envelope(xs: &[f64], fs: &[f64], x: f64, t: f64) -> f64 {
    debug_assert_eq!(xs.len(), fs.len());
    let (lo, hi) = (x - t, x + t);
    let lift = |at: f64, f: f64| f + (t * t - (at - x).powi(2)).max(0.0).sqrt();

    let first = xs.partition_point(|&v| v < lo).saturating_sub(1);
    let mut best = f64::NEG_INFINITY;
    for k in first..xs.len() {
        let (x0, f0) = (xs[k], fs[k]);
        if x0 > hi {
            break;
        }
        if x0 >= lo {
            best = best.max(lift(x0, f0));
        }
        let Some(&x1) = xs.get(k + 1) else {
            break;
        };
        let (a, b) = (x0.max(lo), x1.min(hi));
        if a > b || x1 - x0 <= f64::EPSILON {
            continue;
        }
        // Line plus circle is concave: the peak is where their slopes cancel.
        let slope = (fs[k + 1] - f0) / (x1 - x0);
        let peak = (x + slope * t / (1.0 + slope * slope).sqrt()).clamp(a, b);
        best = best.max(lift(peak, f0 + slope * (peak - x0)));
    }
    best
}

/// Largest [`disk_envelope`] over `[lo, hi]`.
///
/// A straight skin segment spanning `[lo, hi]` whose two ends both sit at
/// this value stays at least `t` from the curve along its whole length.
pub fn span_envelope(xs: &[f64], fs: &[f64], lo: f64, hi: f64, t: f64) -> f64 {
    let (lo, hi) = (lo.min(hi), lo.max(hi));
    let ends = disk_envelope(xs, fs, lo, t).max(disk_envelope(xs, fs, hi, t));
    xs.iter()
        .zip(fs)
        .filter(|&(&x, _)| x >= lo && x <= hi)
        .map(|(_, &f)| f)
        .chain(value_at(xs, fs, lo))
        .chain(value_at(xs, fs, hi))
        .fold(ends, |best, f| best.max(f + t))
}

/// Distance from `(x, y)` to the polyline `(xs, fs)` drawn in the plane.
#[cfg(test)]
pub(crate) fn distance_to_polyline(xs: &[f64], fs: &[f64], x: f64, y: f64) -> f64 {
    let p = nalgebra::Vector2::new(x, y);
    xs.windows(2)
        .zip(fs.windows(2))
        .map(|(xw, fw)| {
            let a = nalgebra::Vector2::new(xw[0], fw[0]);
            let d = nalgebra::Vector2::new(xw[1], fw[1]) - a;
            let len2 = d.norm_squared();
            let s = if len2 > 0.0 { ((p - a).dot(&d) / len2).clamp(0.0, 1.0) } else { 0.0 };
            (a + d * s - p).norm()
        })
        .fold(f64::INFINITY, f64::min)
}
