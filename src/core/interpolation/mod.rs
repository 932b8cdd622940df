//! Scattered station anomalies onto a regular grid.
//!
//! The interpolant is piecewise cubic over a Delaunay triangulation of the
//! stations (Clough-Tocher). Nodes outside the convex hull stay undefined.

mod clough_tocher;
mod delaunay;

use crate::utils::error::{Result, SurveyError};
use clough_tocher::{estimate_gradients, CubicPatch, GRADIENT_MAX_SWEEPS, GRADIENT_TOLERANCE};
use delaunay::{barycentric, contains, Point, Triangulation};
use std::collections::HashSet;

pub const DEFAULT_GRID_RESOLUTION: usize = 500;

/// One scattered sample: planar position and anomaly value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePoint {
    pub x: f64,
    pub y: f64,
    pub value: f64,
}

impl SamplePoint {
    pub fn new(x: f64, y: f64, value: f64) -> Self {
        Self { x, y, value }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSpec {
    /// Nodes along each axis.
    pub resolution: usize,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_GRID_RESOLUTION,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSummary {
    pub nodes: usize,
    pub defined: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Regular lattice over the station bounding box.
///
/// `values[iy * xs.len() + ix]` belongs to node `(xs[ix], ys[iy])`.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpolationGrid {
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
    pub values: Vec<Option<f64>>,
}

impl InterpolationGrid {
    fn undefined(xs: Vec<f64>, ys: Vec<f64>) -> Self {
        let values = vec![None; xs.len() * ys.len()];
        Self { xs, ys, values }
    }

    pub fn width(&self) -> usize {
        self.xs.len()
    }

    pub fn height(&self) -> usize {
        self.ys.len()
    }

    pub fn value(&self, ix: usize, iy: usize) -> Option<f64> {
        if ix >= self.xs.len() || iy >= self.ys.len() {
            return None;
        }
        self.values[iy * self.xs.len() + ix]
    }

    pub fn defined_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    /// Min and max over defined nodes; `None` when nothing is defined.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.values.iter().flatten().fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }

    pub fn summary(&self) -> GridSummary {
        let range = self.value_range();
        GridSummary {
            nodes: self.values.len(),
            defined: self.defined_count(),
            min: range.map(|r| r.0),
            max: range.map(|r| r.1),
        }
    }

    /// Index of the grid node closest to `x` along the x axis.
    pub fn nearest_x(&self, x: f64) -> Option<usize> {
        nearest_index(&self.xs, x)
    }

    pub fn nearest_y(&self, y: f64) -> Option<usize> {
        nearest_index(&self.ys, y)
    }
}

/// `n` evenly spaced values from `start` to `end` inclusive; the last is exactly `end`.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            let mut axis: Vec<f64> = (0..n).map(|i| start + i as f64 * step).collect();
            axis[n - 1] = end;
            axis
        }
    }
}

fn nearest_index(axis: &[f64], v: f64) -> Option<usize> {
    if axis.is_empty() || !v.is_finite() {
        return None;
    }
    let upper = axis.partition_point(|&a| a < v);
    if upper == 0 {
        return Some(0);
    }
    if upper == axis.len() {
        return Some(axis.len() - 1);
    }
    if (v - axis[upper - 1]) <= (axis[upper] - v) {
        Some(upper - 1)
    } else {
        Some(upper)
    }
}

/// Interpolates `samples` onto a `spec.resolution`² grid spanning their bounding box.
///
/// Non-finite samples are ignored. Fewer than three distinct positions, or
/// positions that are all collinear, give a grid with every node undefined.
pub fn interpolate_grid(samples: &[SamplePoint], spec: &GridSpec) -> Result<InterpolationGrid> {
    if samples.is_empty() {
        return Err(SurveyError::EmptyTableError);
    }

    let finite: Vec<SamplePoint> = samples
        .iter()
        .filter(|s| s.x.is_finite() && s.y.is_finite() && s.value.is_finite())
        .copied()
        .collect();
    if finite.len() < samples.len() {
        tracing::warn!(
            "Ignoring {} stations with non-finite position or anomaly",
            samples.len() - finite.len()
        );
    }
    if finite.is_empty() {
        return Err(SurveyError::EmptyTableError);
    }

    let (min_x, max_x) = bounds(finite.iter().map(|s| s.x));
    let (min_y, max_y) = bounds(finite.iter().map(|s| s.y));

    let xs = linspace(min_x, max_x, spec.resolution);
    let ys = linspace(min_y, max_y, spec.resolution);

    let unique = dedup_positions(&finite);
    let scale = (max_x - min_x).max(max_y - min_y);
    if unique.len() < 3 || scale <= 0.0 {
        tracing::warn!(
            "{} distinct station positions cannot be triangulated; grid is undefined",
            unique.len()
        );
        return Ok(InterpolationGrid::undefined(xs, ys));
    }

    let normalise_x = |x: f64| (x - min_x) / scale;
    let normalise_y = |y: f64| (y - min_y) / scale;

    let points: Vec<Point> = unique
        .iter()
        .map(|s| Point::new(normalise_x(s.x), normalise_y(s.y)))
        .collect();
    let values: Vec<f64> = unique.iter().map(|s| s.value).collect();

    let triangulation = Triangulation::build(&points);
    if triangulation.is_empty() {
        tracing::warn!("Station positions are collinear; grid is undefined");
        return Ok(InterpolationGrid::undefined(xs, ys));
    }
    tracing::debug!(
        "Triangulated {} stations into {} triangles",
        points.len(),
        triangulation.triangles.len()
    );

    let adjacency = triangulation.vertex_adjacency(points.len());
    let (gradients, sweeps) = estimate_gradients(
        &points,
        &values,
        &adjacency,
        GRADIENT_TOLERANCE,
        GRADIENT_MAX_SWEEPS,
    );
    match sweeps {
        Some(n) => tracing::debug!("Gradient estimation converged after {} sweeps", n),
        None => tracing::warn!(
            "Gradient estimation did not converge in {} sweeps",
            GRADIENT_MAX_SWEEPS
        ),
    }

    let patches: Vec<CubicPatch> = (0..triangulation.triangles.len())
        .map(|t| CubicPatch::new(&triangulation, t, &points, &values, &gradients))
        .collect();

    let node_xs: Vec<f64> = xs.iter().map(|&x| normalise_x(x)).collect();
    let node_ys: Vec<f64> = ys.iter().map(|&y| normalise_y(y)).collect();

    let mut grid = InterpolationGrid::undefined(xs, ys);
    let width = grid.width();

    for (t, tri) in triangulation.triangles.iter().enumerate() {
        let (p0, p1, p2) = (points[tri[0]], points[tri[1]], points[tri[2]]);
        let slack = -delaunay::BARYCENTRIC_EPS;

        let lo_x = p0.x.min(p1.x).min(p2.x) - slack;
        let hi_x = p0.x.max(p1.x).max(p2.x) + slack;
        let lo_y = p0.y.min(p1.y).min(p2.y) - slack;
        let hi_y = p0.y.max(p1.y).max(p2.y) + slack;

        let ix_range = node_xs.partition_point(|&x| x < lo_x)..node_xs.partition_point(|&x| x <= hi_x);
        let iy_range = node_ys.partition_point(|&y| y < lo_y)..node_ys.partition_point(|&y| y <= hi_y);

        for iy in iy_range {
            for ix in ix_range.clone() {
                let slot = &mut grid.values[iy * width + ix];
                if slot.is_some() {
                    continue;
                }
                let b = barycentric(Point::new(node_xs[ix], node_ys[iy]), p0, p1, p2);
                if contains(&b) {
                    *slot = Some(patches[t].evaluate(b));
                }
            }
        }
    }

    let summary = grid.summary();
    tracing::debug!(
        "Grid {}x{}: {} of {} nodes defined",
        grid.width(),
        grid.height(),
        summary.defined,
        summary.nodes
    );

    Ok(grid)
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

/// Keeps the first sample at each exact position.
fn dedup_positions(samples: &[SamplePoint]) -> Vec<SamplePoint> {
    let mut seen = HashSet::with_capacity(samples.len());
    let mut unique = Vec::with_capacity(samples.len());

    for (index, sample) in samples.iter().enumerate() {
        // -0.0 and 0.0 are the same position.
        let key = ((sample.x + 0.0).to_bits(), (sample.y + 0.0).to_bits());
        if seen.insert(key) {
            unique.push(*sample);
        } else {
            tracing::warn!(
                "Station {} duplicates position ({}, {}); keeping the first occurrence",
                index + 1,
                sample.x,
                sample.y
            );
        }
    }

    unique
}
