//! Piecewise-cubic, C1-continuous Clough-Tocher interpolant.
//!
//! Every triangle is split at its centroid into three cubic Bézier patches.
//! Vertex gradients come from a global curvature-minimising fit, and the
//! cross-edge derivative is pinned so neighbouring triangles join smoothly.

use super::delaunay::{barycentric, Point, Triangulation};

pub(crate) const GRADIENT_TOLERANCE: f64 = 1e-6;
pub(crate) const GRADIENT_MAX_SWEEPS: usize = 400;

/// Estimates a gradient per vertex by minimising the approximate curvature of
/// the interpolant along every triangulation edge (Gauss-Seidel sweeps).
///
/// Returns the gradients and the number of sweeps used; `None` sweeps means
/// the tolerance was not reached.
pub(crate) fn estimate_gradients(
    points: &[Point],
    values: &[f64],
    adjacency: &[Vec<usize>],
    tolerance: f64,
    max_sweeps: usize,
) -> (Vec<[f64; 2]>, Option<usize>) {
    let mut grad = vec![[0.0; 2]; points.len()];

    for sweep in 0..max_sweeps {
        let mut err: f64 = 0.0;

        for (i, neighbours) in adjacency.iter().enumerate() {
            if neighbours.is_empty() {
                continue;
            }

            let mut q = [0.0; 3];
            let mut s = [0.0; 2];

            for &j in neighbours {
                let ex = points[j].x - points[i].x;
                let ey = points[j].y - points[i].y;
                let l = (ex * ex + ey * ey).sqrt();
                let l3 = l * l * l;

                let f1 = values[i];
                let f2 = values[j];
                let df2 = -ex * grad[j][0] - ey * grad[j][1];

                q[0] += 4.0 * ex * ex / l3;
                q[1] += 4.0 * ex * ey / l3;
                q[2] += 4.0 * ey * ey / l3;

                let rhs = 6.0 * (f1 - f2) - 2.0 * df2;
                s[0] += rhs * ex / l3;
                s[1] += rhs * ey / l3;
            }

            let det = q[0] * q[2] - q[1] * q[1];
            if det.abs() <= f64::MIN_POSITIVE {
                continue;
            }
            let r0 = (q[2] * s[0] - q[1] * s[1]) / det;
            let r1 = (-q[1] * s[0] + q[0] * s[1]) / det;

            let change = (grad[i][0] + r0).abs().max((grad[i][1] + r1).abs());
            grad[i] = [-r0, -r1];

            err = err.max(change / r0.abs().max(r1.abs()).max(1.0));
        }

        if err < tolerance {
            return (grad, Some(sweep + 1));
        }
    }

    (grad, None)
}

/// Bézier ordinates of one triangle's three cubic sub-patches.
///
/// Index `cIJKL` weighs `b1^I b2^J b3^K b4^L`, where `b4` is the centroid weight.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CubicPatch {
    c3000: f64,
    c0300: f64,
    c0030: f64,
    c2100: f64,
    c2010: f64,
    c1200: f64,
    c0210: f64,
    c1020: f64,
    c0120: f64,
    c2001: f64,
    c0201: f64,
    c0021: f64,
    c1101: f64,
    c1011: f64,
    c0111: f64,
    c1002: f64,
    c0102: f64,
    c0012: f64,
    c0003: f64,
}

impl CubicPatch {
    pub fn new(
        triangulation: &Triangulation,
        index: usize,
        points: &[Point],
        values: &[f64],
        gradients: &[[f64; 2]],
    ) -> Self {
        let [i0, i1, i2] = triangulation.triangles[index];
        let (p0, p1, p2) = (points[i0], points[i1], points[i2]);

        let e12x = p1.x - p0.x;
        let e12y = p1.y - p0.y;
        let e23x = p2.x - p1.x;
        let e23y = p2.y - p1.y;
        let e31x = p0.x - p2.x;
        let e31y = p0.y - p2.y;

        let (f1, f2, f3) = (values[i0], values[i1], values[i2]);
        let (g1, g2, g3) = (gradients[i0], gradients[i1], gradients[i2]);

        let df12 = g1[0] * e12x + g1[1] * e12y;
        let df21 = -(g2[0] * e12x + g2[1] * e12y);
        let df23 = g2[0] * e23x + g2[1] * e23y;
        let df32 = -(g3[0] * e23x + g3[1] * e23y);
        let df31 = g3[0] * e31x + g3[1] * e31y;
        let df13 = -(g1[0] * e31x + g1[1] * e31y);

        let c3000 = f1;
        let c2100 = (df12 + 3.0 * c3000) / 3.0;
        let c2010 = (df13 + 3.0 * c3000) / 3.0;
        let c0300 = f2;
        let c1200 = (df21 + 3.0 * c0300) / 3.0;
        let c0210 = (df23 + 3.0 * c0300) / 3.0;
        let c0030 = f3;
        let c1020 = (df31 + 3.0 * c0030) / 3.0;
        let c0120 = (df32 + 3.0 * c0030) / 3.0;

        let c2001 = (c2100 + c2010 + c3000) / 3.0;
        let c0201 = (c1200 + c0300 + c0210) / 3.0;
        let c0021 = (c1020 + c0120 + c0030) / 3.0;

        // Cross-boundary derivative: linear along each edge, taken towards the
        // neighbour's centroid, or towards our own centroid on the hull.
        let mut g = [-0.5; 3];
        for (k, slot) in g.iter_mut().enumerate() {
            let Some(other) = triangulation.neighbors[index][k] else {
                continue;
            };
            let [j0, j1, j2] = triangulation.triangles[other];
            let centroid = Point::new(
                (points[j0].x + points[j1].x + points[j2].x) / 3.0,
                (points[j0].y + points[j1].y + points[j2].y) / 3.0,
            );
            let c = barycentric(centroid, p0, p1, p2);

            *slot = match k {
                0 => (2.0 * c[2] + c[1] - 1.0) / (2.0 - 3.0 * c[2] - 3.0 * c[1]),
                1 => (2.0 * c[0] + c[2] - 1.0) / (2.0 - 3.0 * c[0] - 3.0 * c[2]),
                _ => (2.0 * c[1] + c[0] - 1.0) / (2.0 - 3.0 * c[1] - 3.0 * c[0]),
            };
        }

        let c0111 = (g[0] * (-c0300 + 3.0 * c0210 - 3.0 * c0120 + c0030)
            + (-c0300 + 2.0 * c0210 - c0120 + c0021 + c0201))
            / 2.0;
        let c1011 = (g[1] * (-c0030 + 3.0 * c1020 - 3.0 * c2010 + c3000)
            + (-c0030 + 2.0 * c1020 - c2010 + c2001 + c0021))
            / 2.0;
        let c1101 = (g[2] * (-c3000 + 3.0 * c2100 - 3.0 * c1200 + c0300)
            + (-c3000 + 2.0 * c2100 - c1200 + c2001 + c0201))
            / 2.0;

        let c1002 = (c1101 + c1011 + c2001) / 3.0;
        let c0102 = (c1101 + c0111 + c0201) / 3.0;
        let c0012 = (c1011 + c0111 + c0021) / 3.0;

        let c0003 = (c1002 + c0102 + c0012) / 3.0;

        Self {
            c3000,
            c0300,
            c0030,
            c2100,
            c2010,
            c1200,
            c0210,
            c1020,
            c0120,
            c2001,
            c0201,
            c0021,
            c1101,
            c1011,
            c0111,
            c1002,
            c0102,
            c0012,
            c0003,
        }
    }

    /// Evaluates the patch at barycentric weights `b` of the parent triangle.
    pub fn evaluate(&self, b: [f64; 3]) -> f64 {
        let minval = b[0].min(b[1]).min(b[2]);

        let b1 = b[0] - minval;
        let b2 = b[1] - minval;
        let b3 = b[2] - minval;
        let b4 = 3.0 * minval;

        let b4_2 = b4 * b4;
        let b4_3 = b4_2 * b4;

        if b[0] == minval {
            b4_3 * self.c0003
                + 3.0 * b4_2 * b3 * self.c0012
                + 3.0 * b4_2 * b2 * self.c0102
                + 3.0 * b4 * b3 * b3 * self.c0021
                + 6.0 * b4 * b3 * b2 * self.c0111
                + 3.0 * b4 * b2 * b2 * self.c0201
                + b3 * b3 * b3 * self.c0030
                + 3.0 * b3 * b3 * b2 * self.c0120
                + 3.0 * b3 * b2 * b2 * self.c0210
                + b2 * b2 * b2 * self.c0300
        } else if b[1] == minval {
            b4_3 * self.c0003
                + 3.0 * b4_2 * b3 * self.c0012
                + 3.0 * b4_2 * b1 * self.c1002
                + 3.0 * b4 * b3 * b3 * self.c0021
                + 6.0 * b4 * b3 * b1 * self.c1011
                + 3.0 * b4 * b1 * b1 * self.c2001
                + b3 * b3 * b3 * self.c0030
                + 3.0 * b3 * b3 * b1 * self.c1020
                + 3.0 * b3 * b1 * b1 * self.c2010
                + b1 * b1 * b1 * self.c3000
        } else {
            b4_3 * self.c0003
                + 3.0 * b4_2 * b2 * self.c0102
                + 3.0 * b4_2 * b1 * self.c1002
                + 3.0 * b4 * b2 * b2 * self.c0201
                + 6.0 * b4 * b2 * b1 * self.c1101
                + 3.0 * b4 * b1 * b1 * self.c2001
                + b2 * b2 * b2 * self.c0300
                + 3.0 * b2 * b2 * b1 * self.c1200
                + 3.0 * b2 * b1 * b1 * self.c2100
                + b1 * b1 * b1 * self.c3000
        }
    }
}
