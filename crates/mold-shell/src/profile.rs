//! Cylindrical sample grids.
//!
//! A [`Profile`] stores the vessel's outer radius per (height, angle); a
//! [`HeightGrid`] stores the underside height per (angle, radius). Both use a
//! dense row-major [`Grid`]. Angles are always `2π·a / angle_count`.

use std::f64::consts::TAU;
use std::ops::{Index, IndexMut};

use rayon::prelude::*;

/// Dense row-major 2D array.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: Clone> Grid<T> {
    /// Grid with every cell set to `value`.
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }
}

impl<T> Grid<T> {
    /// Build a grid from a function of `(row, col)`.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                data.push(f(r, c));
            }
        }
        Self { rows, cols, data }
    }

    /// Build a grid from a function of `(row, col)`, evaluating cells in parallel.
    pub fn par_from_fn(rows: usize, cols: usize, f: impl Fn(usize, usize) -> T + Sync) -> Self
    where
        T: Send,
    {
        let data = (0..rows * cols)
            .into_par_iter()
            .map(|i| f(i / cols, i % cols))
            .collect();
        Self { rows, cols, data }
    }

    /// Build a grid from equally sized rows.
    ///
    /// Returns `None` if the rows differ in length.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Option<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != cols) {
            return None;
        }
        let n = rows.len();
        Some(Self {
            rows: n,
            cols,
            data: rows.into_iter().flatten().collect(),
        })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        (row < self.rows && col < self.cols).then(|| &self.data[row * self.cols + col])
    }

    pub fn row(&self, row: usize) -> &[T] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn row_mut(&mut self, row: usize) -> &mut [T] {
        &mut self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[T]> + '_ {
        self.data.chunks(self.cols.max(1)).take(self.rows)
    }

    pub fn values(&self) -> impl Iterator<Item = &T> + '_ {
        self.data.iter()
    }

    /// Apply `f` to every cell.
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Grid<U> {
        Grid {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(f).collect(),
        }
    }
}

impl<T> Index<(usize, usize)> for Grid<T> {
    type Output = T;

    #[inline]
    fn index(&self, (row, col): (usize, usize)) -> &T {
        &self.data[row * self.cols + col]
    }
}

impl<T> IndexMut<(usize, usize)> for Grid<T> {
    #[inline]
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut T {
        &mut self.data[row * self.cols + col]
    }
}

/// Population variance over every cell.
pub fn grid_variance(grid: &Grid<f64>) -> f64 {
    let n = (grid.rows() * grid.cols()) as f64;
    if n == 0.0 {
        return 0.0;
    }
    let mean = grid.values().sum::<f64>() / n;
    grid.values().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

/// Angle of column `index` out of `count` evenly spaced columns.
#[inline]
pub fn sample_angle(index: usize, count: usize) -> f64 {
    TAU * index as f64 / count as f64
}

/// Outer radius of the vessel per (height, angle).
///
/// `radii[(h, a)] == 0.0` marks a sample where the ray missed.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub radii: Grid<f64>,
    /// World Y of each height row, ascending.
    pub heights: Vec<f64>,
}

impl Profile {
    pub fn new(radii: Grid<f64>, heights: Vec<f64>) -> Self {
        debug_assert_eq!(radii.rows(), heights.len());
        Self { radii, heights }
    }

    #[inline]
    pub fn height_count(&self) -> usize {
        self.radii.rows()
    }

    #[inline]
    pub fn angle_count(&self) -> usize {
        self.radii.cols()
    }

    /// Number of missing samples.
    pub fn gap_count(&self) -> usize {
        self.radii.values().filter(|&&r| r == 0.0).count()
    }

    /// Largest radius in row `h`.
    pub fn row_max(&self, h: usize) -> f64 {
        self.radii.row(h).iter().copied().fold(0.0, f64::max)
    }

    /// Largest radius anywhere in the profile.
    pub fn max_radius(&self) -> f64 {
        self.radii.values().copied().fold(0.0, f64::max)
    }

    /// Radius of row `h` at angle `theta`, linearly interpolated between columns.
    pub fn radius_at(&self, h: usize, theta: f64) -> f64 {
        let n = self.angle_count();
        if n == 0 {
            return 0.0;
        }
        let pos = theta.rem_euclid(TAU) / TAU * n as f64;
        let a0 = (pos.floor() as usize) % n;
        let a1 = (a0 + 1) % n;
        let frac = pos - pos.floor();
        let row = self.radii.row(h);
        row[a0] * (1.0 - frac) + row[a1] * frac
    }
}

/// Raw underside heights per (angle, radius); `None` where the upward ray missed.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightGrid {
    pub y: Grid<Option<f64>>,
    /// Radius of each radial column, ascending from 0.
    pub radii: Vec<f64>,
}

impl HeightGrid {
    #[inline]
    pub fn angle_count(&self) -> usize {
        self.y.rows()
    }

    #[inline]
    pub fn radial_count(&self) -> usize {
        self.y.cols()
    }

    pub fn gap_count(&self) -> usize {
        self.y.values().filter(|v| v.is_none()).count()
    }
}

/// Underside heights with every gap filled.
#[derive(Debug, Clone, PartialEq)]
pub struct FilledHeightGrid {
    pub y: Grid<f64>,
    pub radii: Vec<f64>,
}

impl FilledHeightGrid {
    #[inline]
    pub fn angle_count(&self) -> usize {
        self.y.rows()
    }

    #[inline]
    pub fn radial_count(&self) -> usize {
        self.y.cols()
    }

    /// Radius of the outermost column.
    pub fn max_radius(&self) -> f64 {
        self.radii.last().copied().unwrap_or(0.0)
    }

    /// Height of angle row `a` at `radius`, linear between columns and flat
    /// beyond either end.
    pub fn height_at(&self, a: usize, radius: f64) -> f64 {
        let row = self.y.row(a);
        let k = self.radii.partition_point(|&r| r <= radius);
        if k == 0 {
            return row[0];
        }
        if k >= self.radii.len() {
            return row[row.len() - 1];
        }
        let (r0, r1) = (self.radii[k - 1], self.radii[k]);
        let frac = if r1 > r0 { (radius - r0) / (r1 - r0) } else { 0.0 };
        row[k - 1] + (row[k] - row[k - 1]) * frac
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_indexing() {
        let grid = Grid::from_fn(3, 4, |r, c| (r * 10 + c) as f64);
        assert_eq!(grid.rows(), 3);
        assert_eq!(grid.cols(), 4);
        assert_eq!(grid[(2, 3)], 23.0);
        assert_eq!(grid.row(1), &[10.0, 11.0, 12.0, 13.0]);
        assert_eq!(grid.get(3, 0), None);
        assert_eq!(grid.iter_rows().count(), 3);
    }

    #[test]
    fn test_grid_from_rows() {
        let grid = Grid::from_rows(vec![vec![1, 2], vec![3, 4]]).unwrap();
        assert_eq!(grid[(1, 0)], 3);
        assert!(Grid::from_rows(vec![vec![1, 2], vec![3]]).is_none());
    }

    #[test]
    fn test_variance() {
        let flat = Grid::filled(4, 4, 7.0);
        assert_eq!(grid_variance(&flat), 0.0);

        let grid = Grid::from_fn(1, 2, |_, c| c as f64 * 2.0);
        assert!((grid_variance(&grid) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_profile_queries() {
        let radii = Grid::from_fn(2, 4, |h, a| if h == 1 && a == 2 { 0.0 } else { 10.0 + a as f64 });
        let profile = Profile::new(radii, vec![0.0, 1.0]);

        assert_eq!(profile.gap_count(), 1);
        assert_eq!(profile.row_max(0), 13.0);
        assert_eq!(profile.max_radius(), 13.0);

        // halfway between column 0 (10) and column 1 (11)
        let r = profile.radius_at(0, TAU / 8.0);
        assert!((r - 10.5).abs() < 1e-12);

        // wraps from the last column back to the first
        let r = profile.radius_at(0, TAU * 7.0 / 8.0);
        assert!((r - 11.5).abs() < 1e-12);
    }

    #[test]
    fn test_height_at_interpolates_radially() {
        let grid = FilledHeightGrid {
            y: Grid::from_fn(2, 3, |a, k| (a * 100 + k * 10) as f64),
            radii: vec![0.0, 5.0, 10.0],
        };
        assert_eq!(grid.max_radius(), 10.0);
        assert!((grid.height_at(1, 7.5) - 115.0).abs() < 1e-12);
        assert_eq!(grid.height_at(0, 0.0), 0.0);
        assert_eq!(grid.height_at(0, 12.0), 20.0);
    }
}
