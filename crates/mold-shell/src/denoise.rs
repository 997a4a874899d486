//! Gap filling, despiking and smoothing of sample grids.
//!
//! Every function here is a pure `Grid -> Grid` stencil. The angular axis of
//! a grid wraps around; the other axis (height or radius) is bounded. Each
//! pass reads only its input and writes a fresh grid.

use tracing::{debug, warn};

use crate::error::{MoldError, MoldResult};
use crate::params::DenoiseParams;
use crate::profile::{FilledHeightGrid, Grid, HeightGrid, Profile};

/// Reach of the neighbour search when filling underside gaps.
const FILL_REACH: isize = 3;

/// Half-width of the despike window (5×5).
const DESPIKE_REACH: isize = 2;

/// Which grid axis is angular and therefore wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wrap {
    /// Columns are angles (profiles).
    Columns,
    /// Rows are angles (height grids).
    Rows,
}

impl Wrap {
    /// Neighbour at offset `(dr, dc)`, or `None` past the bounded axis.
    #[inline]
    fn offset<T>(
        self,
        grid: &Grid<T>,
        r: usize,
        c: usize,
        dr: isize,
        dc: isize,
    ) -> Option<(usize, usize)> {
        let (rows, cols) = (grid.rows() as isize, grid.cols() as isize);
        let (mut nr, mut nc) = (r as isize + dr, c as isize + dc);
        match self {
            Wrap::Columns => {
                nc = nc.rem_euclid(cols);
                if !(0..rows).contains(&nr) {
                    return None;
                }
            }
            Wrap::Rows => {
                nr = nr.rem_euclid(rows);
                if !(0..cols).contains(&nc) {
                    return None;
                }
            }
        }
        Some((nr as usize, nc as usize))
    }

    /// Neighbour at offset `(dr, dc)`, clamped on the bounded axis.
    #[inline]
    fn clamped<T>(
        self,
        grid: &Grid<T>,
        r: usize,
        c: usize,
        dr: isize,
        dc: isize,
    ) -> (usize, usize) {
        let (rows, cols) = (grid.rows() as isize, grid.cols() as isize);
        let (nr, nc) = (r as isize + dr, c as isize + dc);
        match self {
            Wrap::Columns => (nr.clamp(0, rows - 1) as usize, nc.rem_euclid(cols) as usize),
            Wrap::Rows => (nr.rem_euclid(rows) as usize, nc.clamp(0, cols - 1) as usize),
        }
    }
}

/// Median of a non-empty slice; the mean of the middle pair for even lengths.
fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    })
}

/// Fill missing (zero) profile samples.
///
/// Gaps within a row take the inverse-distance weighted average of the
/// nearest known samples on either side, searching circularly. Rows without
/// any sample are interpolated by height between the nearest sampled rows.
///
/// # Errors
///
/// [`MoldError::EmptySampling`] if no ray hit the vessel at all.
pub fn fill_profile_gaps(profile: &Profile) -> MoldResult<Profile> {
    let src = &profile.radii;
    let (rows, cols) = (src.rows(), src.cols());

    let sampled: Vec<bool> = src.iter_rows().map(|row| row.iter().any(|&r| r > 0.0)).collect();
    if !sampled.iter().any(|&s| s) {
        return Err(MoldError::EmptySampling { rays: rows * cols });
    }

    let mut radii = Grid::from_fn(rows, cols, |h, a| {
        if src[(h, a)] > 0.0 || !sampled[h] {
            return src[(h, a)];
        }
        fill_in_row(src.row(h), a)
    });

    let mut empty_rows = 0;
    for h in (0..rows).filter(|&h| !sampled[h]) {
        empty_rows += 1;
        let below = (0..h).rev().find(|&i| sampled[i]);
        let above = (h + 1..rows).find(|&i| sampled[i]);
        for a in 0..cols {
            radii[(h, a)] = match (below, above) {
                (Some(lo), Some(hi)) => {
                    let span = profile.heights[hi] - profile.heights[lo];
                    let frac = if span.abs() > f64::EPSILON {
                        (profile.heights[h] - profile.heights[lo]) / span
                    } else {
                        (h - lo) as f64 / (hi - lo) as f64
                    };
                    radii[(lo, a)] + (radii[(hi, a)] - radii[(lo, a)]) * frac
                }
                (Some(i), None) | (None, Some(i)) => radii[(i, a)],
                (None, None) => radii[(h, a)],
            };
        }
    }

    debug!(gaps = profile.gap_count(), empty_rows, "Filled profile gaps");
    Ok(Profile::new(radii, profile.heights.clone()))
}

/// Value for the gap at `a` from the nearest samples left and right of it.
fn fill_in_row(row: &[f64], a: usize) -> f64 {
    let n = row.len();
    let left = (1..n).map(|d| (d, row[(a + n - d) % n])).find(|&(_, r)| r > 0.0);
    let right = (1..n).map(|d| (d, row[(a + d) % n])).find(|&(_, r)| r > 0.0);
    match (left, right) {
        (Some((dl, l)), Some((dr, r))) => {
            let (dl, dr) = (dl as f64, dr as f64);
            (l * dr + r * dl) / (dl + dr)
        }
        (Some((_, v)), None) | (None, Some((_, v))) => v,
        (None, None) => 0.0,
    }
}

/// Fill missing underside heights.
///
/// Each gap takes the median of up to three valid neighbours either side
/// radially and angularly. Remaining gaps extend the nearest valid value of
/// their angle row flat (outward past the last hit, inward before the first)
/// or interpolate between hits. Rows with no valid value at all take the
/// per-radius median of the other rows. A grid with no valid value becomes
/// flat at `fallback_y`.
pub fn fill_height_grid_gaps(grid: &HeightGrid, fallback_y: f64) -> FilledHeightGrid {
    let src = &grid.y;
    let (rows, cols) = (src.rows(), src.cols());

    if src.values().all(Option::is_none) {
        warn!(
            fallback_y = format!("{:.3}", fallback_y),
            "No ray hit the vessel underside, using a flat floor"
        );
        return FilledHeightGrid {
            y: Grid::filled(rows, cols, fallback_y),
            radii: grid.radii.clone(),
        };
    }

    // Neighbour medians, all read from the unfilled grid.
    let step1 = Grid::from_fn(rows, cols, |a, k| {
        if let Some(y) = src[(a, k)] {
            return Some(y);
        }
        let mut found = Vec::with_capacity(4 * FILL_REACH as usize);
        for d in (-FILL_REACH..=FILL_REACH).filter(|&d| d != 0) {
            if let Some(p) = Wrap::Rows.offset(src, a, k, 0, d)
                && let Some(y) = src[p]
            {
                found.push(y);
            }
            if let Some(p) = Wrap::Rows.offset(src, a, k, d, 0)
                && let Some(y) = src[p]
            {
                found.push(y);
            }
        }
        median(&mut found)
    });

    // Extend each row from its own valid values.
    let mut empty_rows = Vec::new();
    let mut rows_filled: Vec<Option<Vec<f64>>> = Vec::with_capacity(rows);
    for a in 0..rows {
        let row = step1.row(a);
        let valid: Vec<usize> = (0..cols).filter(|&k| row[k].is_some()).collect();
        let (Some(&first), Some(&last)) = (valid.first(), valid.last()) else {
            empty_rows.push(a);
            rows_filled.push(None);
            continue;
        };
        let filled = (0..cols)
            .map(|k| match row[k] {
                Some(y) => y,
                None if k < first => row[first].unwrap_or(fallback_y),
                None if k > last => row[last].unwrap_or(fallback_y),
                None => interpolate_between(row, k),
            })
            .collect();
        rows_filled.push(Some(filled));
    }

    // Rows with nothing take the column median of the rest.
    let column_medians: Vec<f64> = (0..cols)
        .map(|k| {
            let mut column: Vec<f64> = rows_filled.iter().flatten().map(|row| row[k]).collect();
            median(&mut column).unwrap_or(fallback_y)
        })
        .collect();

    let y = Grid::from_fn(rows, cols, |a, k| match &rows_filled[a] {
        Some(row) => row[k],
        None => column_medians[k],
    });

    debug!(
        gaps = grid.gap_count(),
        empty_rows = empty_rows.len(),
        "Filled underside gaps"
    );
    FilledHeightGrid {
        y,
        radii: grid.radii.clone(),
    }
}

/// Linear interpolation across an interior run of gaps.
fn interpolate_between(row: &[Option<f64>], k: usize) -> f64 {
    let lo = (0..k).rev().find_map(|i| row[i].map(|y| (i, y)));
    let hi = (k + 1..row.len()).find_map(|i| row[i].map(|y| (i, y)));
    match (lo, hi) {
        (Some((i0, y0)), Some((i1, y1))) => {
            y0 + (y1 - y0) * (k - i0) as f64 / (i1 - i0) as f64
        }
        (Some((_, y)), None) | (None, Some((_, y))) => y,
        (None, None) => 0.0,
    }
}

/// Replace samples that deviate from the median of their 5×5 neighbourhood
/// (self excluded) by more than `threshold` with that median.
pub fn despike(grid: &Grid<f64>, wrap: Wrap, threshold: f64) -> Grid<f64> {
    let out = Grid::par_from_fn(grid.rows(), grid.cols(), |r, c| {
        let value = grid[(r, c)];
        let mut window = Vec::with_capacity(24);
        for dr in -DESPIKE_REACH..=DESPIKE_REACH {
            for dc in -DESPIKE_REACH..=DESPIKE_REACH {
                if (dr, dc) == (0, 0) {
                    continue;
                }
                if let Some(p) = wrap.offset(grid, r, c, dr, dc) {
                    window.push(grid[p]);
                }
            }
        }
        match median(&mut window) {
            Some(m) if (value - m).abs() > threshold => m,
            _ => value,
        }
    });

    let replaced = grid
        .values()
        .zip(out.values())
        .filter(|(a, b)| a != b)
        .count();
    debug!(replaced, threshold, "Despiked grid");
    out
}

/// One pass of the 3×3 binomial kernel: corners 1/16, edges 1/8, centre 1/4.
///
/// Wraps on the angular axis and clamps on the other.
pub fn smooth_pass(grid: &Grid<f64>, wrap: Wrap) -> Grid<f64> {
    const WEIGHTS: [f64; 3] = [1.0, 2.0, 1.0];

    Grid::par_from_fn(grid.rows(), grid.cols(), |r, c| {
        let mut sum = 0.0;
        for (i, dr) in (-1..=1).enumerate() {
            for (j, dc) in (-1..=1).enumerate() {
                sum += WEIGHTS[i] * WEIGHTS[j] * grid[wrap.clamped(grid, r, c, dr, dc)];
            }
        }
        sum / 16.0
    })
}

/// Apply `passes` smoothing passes, each reading the previous output.
///
/// With `center_ring` set, index 0 of the bounded axis (the ring at radius
/// zero) is replaced by its mean over all angles after every pass, since all
/// of those samples describe the same point.
pub fn smooth(grid: &Grid<f64>, wrap: Wrap, passes: usize, center_ring: bool) -> Grid<f64> {
    let mut current = grid.clone();
    for _ in 0..passes {
        current = smooth_pass(&current, wrap);
        if center_ring {
            average_center_ring(&mut current, wrap);
        }
    }
    current
}

fn average_center_ring(grid: &mut Grid<f64>, wrap: Wrap) {
    let cells: Vec<(usize, usize)> = match wrap {
        Wrap::Rows => (0..grid.rows()).map(|a| (a, 0)).collect(),
        Wrap::Columns => (0..grid.cols()).map(|a| (0, a)).collect(),
    };
    if cells.is_empty() {
        return;
    }
    let mean = cells.iter().map(|&p| grid[p]).sum::<f64>() / cells.len() as f64;
    for p in cells {
        grid[p] = mean;
    }
}

/// Fill, despike and smooth a sampled profile.
pub fn denoise_profile(profile: &Profile, params: &DenoiseParams) -> MoldResult<Profile> {
    let filled = fill_profile_gaps(profile)?;
    let despiked = despike(&filled.radii, Wrap::Columns, params.despike_threshold);
    let radii = smooth(&despiked, Wrap::Columns, params.smoothing_passes, false);
    Ok(Profile::new(radii, filled.heights))
}

/// Fill, despike and smooth a sampled underside.
pub fn denoise_height_grid(
    grid: &HeightGrid,
    fallback_y: f64,
    params: &DenoiseParams,
) -> FilledHeightGrid {
    let filled = fill_height_grid_gaps(grid, fallback_y);
    let despiked = despike(&filled.y, Wrap::Rows, params.despike_threshold);
    let y = smooth(&despiked, Wrap::Rows, params.smoothing_passes, true);
    FilledHeightGrid {
        y,
        radii: filled.radii,
    }
}
