//! Incremental Bowyer-Watson Delaunay triangulation.
//!
//! Works in the caller's coordinates, which are expected to be normalised to
//! roughly the unit box; the super-triangle and degeneracy thresholds assume it.

use std::collections::{HashMap, VecDeque};

/// Circumradius of the super-triangle's inscribed circle is half of this.
const SUPER_TRIANGLE_RADIUS: f64 = 1.0e4;
/// Triangles with a smaller doubled area are treated as degenerate.
const MIN_DOUBLE_AREA: f64 = 1.0e-12;
/// Relative margin for the strict in-circumcircle test.
const IN_CIRCLE_MARGIN: f64 = 1.0e-12;
/// Barycentric slack when locating a point.
pub(crate) const BARYCENTRIC_EPS: f64 = -1.0e-10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy)]
struct Circumcircle {
    cx: f64,
    cy: f64,
    radius_sq: f64,
}

fn circumcircle(p0: Point, p1: Point, p2: Point) -> Option<Circumcircle> {
    let (ax, ay) = (p0.x, p0.y);
    let (bx, by) = (p1.x, p1.y);
    let (cx, cy) = (p2.x, p2.y);

    let d = 2.0 * (ax * (by - cy) + bx * (cy - ay) + cx * (ay - by));
    if d.abs() < MIN_DOUBLE_AREA * 1e-6 {
        return None;
    }

    let a2 = ax * ax + ay * ay;
    let b2 = bx * bx + by * by;
    let c2 = cx * cx + cy * cy;

    let ux = (a2 * (by - cy) + b2 * (cy - ay) + c2 * (ay - by)) / d;
    let uy = (a2 * (cx - bx) + b2 * (ax - cx) + c2 * (bx - ax)) / d;

    let dx = ax - ux;
    let dy = ay - uy;

    Some(Circumcircle {
        cx: ux,
        cy: uy,
        radius_sq: dx * dx + dy * dy,
    })
}

/// Twice the signed area; positive for counter-clockwise vertices.
pub(crate) fn double_area(p0: Point, p1: Point, p2: Point) -> f64 {
    (p1.x - p0.x) * (p2.y - p0.y) - (p2.x - p0.x) * (p1.y - p0.y)
}

/// Barycentric weights `(u, v, w)` of `p` so that `p = u*p0 + v*p1 + w*p2`.
pub(crate) fn barycentric(p: Point, p0: Point, p1: Point, p2: Point) -> [f64; 3] {
    let v0x = p1.x - p0.x;
    let v0y = p1.y - p0.y;
    let v1x = p2.x - p0.x;
    let v1y = p2.y - p0.y;
    let v2x = p.x - p0.x;
    let v2y = p.y - p0.y;

    let dot00 = v0x * v0x + v0y * v0y;
    let dot01 = v0x * v1x + v0y * v1y;
    let dot02 = v0x * v2x + v0y * v2y;
    let dot11 = v1x * v1x + v1y * v1y;
    let dot12 = v1x * v2x + v1y * v2y;

    let inv_denom = 1.0 / (dot00 * dot11 - dot01 * dot01);
    let v = (dot11 * dot02 - dot01 * dot12) * inv_denom;
    let w = (dot00 * dot12 - dot01 * dot02) * inv_denom;

    [1.0 - v - w, v, w]
}

pub(crate) fn contains(weights: &[f64; 3]) -> bool {
    weights.iter().all(|&b| b >= BARYCENTRIC_EPS)
}

fn edge_key(a: usize, b: usize) -> (usize, usize) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// A Delaunay triangulation with per-triangle adjacency.
///
/// `neighbors[t][k]` is the triangle across the edge opposite vertex `k` of
/// triangle `t`, or `None` on the convex hull.
#[derive(Debug, Clone, Default)]
pub(crate) struct Triangulation {
    pub triangles: Vec<[usize; 3]>,
    pub neighbors: Vec<[Option<usize>; 3]>,
}

impl Triangulation {
    /// Triangulates `points`, which must not contain exact duplicates.
    /// Fewer than three points, or all-collinear points, give an empty triangulation.
    pub fn build(points: &[Point]) -> Self {
        if points.len() < 3 {
            return Self::default();
        }

        let triangles = bowyer_watson(points);
        let neighbors = build_neighbors(&triangles);

        Self {
            triangles,
            neighbors,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Sorted, de-duplicated neighbour lists of every vertex.
    pub fn vertex_adjacency(&self, vertex_count: usize) -> Vec<Vec<usize>> {
        let mut adjacency = vec![Vec::new(); vertex_count];
        for tri in &self.triangles {
            for k in 0..3 {
                let a = tri[k];
                let b = tri[(k + 1) % 3];
                adjacency[a].push(b);
                adjacency[b].push(a);
            }
        }
        for list in &mut adjacency {
            list.sort_unstable();
            list.dedup();
        }
        adjacency
    }
}

fn bowyer_watson(points: &[Point]) -> Vec<[usize; 3]> {
    let (mut cx, mut cy) = (0.0, 0.0);
    for p in points {
        cx += p.x;
        cy += p.y;
    }
    cx /= points.len() as f64;
    cy /= points.len() as f64;

    let r = SUPER_TRIANGLE_RADIUS;
    let half_width = r * 3f64.sqrt() / 2.0;

    // super-triangle occupies indices 0..3, real points follow
    let mut vertices: Vec<Point> = Vec::with_capacity(points.len() + 3);
    vertices.push(Point::new(cx - half_width, cy - r / 2.0));
    vertices.push(Point::new(cx + half_width, cy - r / 2.0));
    vertices.push(Point::new(cx, cy + r));
    vertices.extend_from_slice(points);

    let mut triangles: Vec<[usize; 3]> = vec![[0, 1, 2]];
    let mut circles: Vec<Option<Circumcircle>> =
        vec![circumcircle(vertices[0], vertices[1], vertices[2])];

    for vi in 3..vertices.len() {
        let p = vertices[vi];

        let candidates: Vec<usize> = (0..triangles.len())
            .filter(|&ti| match circles[ti] {
                Some(cc) => {
                    let dx = p.x - cc.cx;
                    let dy = p.y - cc.cy;
                    dx * dx + dy * dy < cc.radius_sq * (1.0 - IN_CIRCLE_MARGIN)
                }
                None => false,
            })
            .collect();

        let bad = connected_cavity(&vertices, &triangles, &candidates, p);
        if bad.is_empty() {
            tracing::debug!("Point {} could not be inserted into the triangulation", vi - 3);
            continue;
        }

        let mut edge_count: HashMap<(usize, usize), (usize, usize, u8)> = HashMap::new();
        for &ti in &bad {
            let tri = triangles[ti];
            for k in 0..3 {
                let (a, b) = (tri[k], tri[(k + 1) % 3]);
                edge_count
                    .entry(edge_key(a, b))
                    .and_modify(|entry| entry.2 += 1)
                    .or_insert((a, b, 1));
            }
        }

        let mut bad_sorted = bad;
        bad_sorted.sort_unstable_by(|a, b| b.cmp(a));
        for ti in bad_sorted {
            triangles.swap_remove(ti);
            circles.swap_remove(ti);
        }

        let mut boundary: Vec<(usize, usize)> = edge_count
            .into_values()
            .filter(|&(_, _, count)| count == 1)
            .map(|(a, b, _)| (a, b))
            .collect();
        boundary.sort_unstable();

        for (a, b) in boundary {
            let mut tri = [a, b, vi];
            if double_area(vertices[a], vertices[b], p) < 0.0 {
                tri.swap(0, 1);
            }
            circles.push(circumcircle(vertices[tri[0]], vertices[tri[1]], vertices[tri[2]]));
            triangles.push(tri);
        }
    }

    triangles
        .into_iter()
        .filter(|tri| tri.iter().all(|&v| v >= 3))
        .map(|tri| [tri[0] - 3, tri[1] - 3, tri[2] - 3])
        .filter(|tri| double_area(points[tri[0]], points[tri[1]], points[tri[2]]).abs() > MIN_DOUBLE_AREA)
        .collect()
}

/// Keeps the candidates reachable, through shared edges, from a candidate
/// that contains `p`. Disconnected candidates would produce overlapping triangles.
fn connected_cavity(
    vertices: &[Point],
    triangles: &[[usize; 3]],
    candidates: &[usize],
    p: Point,
) -> Vec<usize> {
    let seed = candidates.iter().copied().find(|&ti| {
        let [a, b, c] = triangles[ti];
        contains(&barycentric(p, vertices[a], vertices[b], vertices[c]))
    });

    let Some(seed) = seed else {
        return Vec::new();
    };

    let mut visited = vec![false; candidates.len()];
    let mut queue = VecDeque::new();
    let mut cavity = Vec::with_capacity(candidates.len());

    if let Some(pos) = candidates.iter().position(|&ti| ti == seed) {
        visited[pos] = true;
    }
    queue.push_back(seed);

    while let Some(ti) = queue.pop_front() {
        cavity.push(ti);
        let tri = triangles[ti];
        for (pos, &other) in candidates.iter().enumerate() {
            if visited[pos] {
                continue;
            }
            let shared = triangles[other].iter().filter(|v| tri.contains(v)).count();
            if shared == 2 {
                visited[pos] = true;
                queue.push_back(other);
            }
        }
    }

    cavity
}

fn build_neighbors(triangles: &[[usize; 3]]) -> Vec<[Option<usize>; 3]> {
    let mut edges: HashMap<(usize, usize), Vec<(usize, usize)>> = HashMap::new();
    for (ti, tri) in triangles.iter().enumerate() {
        for k in 0..3 {
            let a = tri[(k + 1) % 3];
            let b = tri[(k + 2) % 3];
            edges.entry(edge_key(a, b)).or_default().push((ti, k));
        }
    }

    let mut neighbors = vec![[None; 3]; triangles.len()];
    for sharing in edges.values() {
        if let [(t0, k0), (t1, k1)] = sharing[..] {
            neighbors[t0][k0] = Some(t1);
            neighbors[t1][k1] = Some(t0);
        }
    }
    neighbors
}
