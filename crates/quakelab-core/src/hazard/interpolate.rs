//! Piecewise-cubic scattered-data interpolation on a Delaunay triangulation.
//!
//! The triangulation is built once by Bowyer-Watson insertion. Each scalar
//! field fitted over it gets weighted least-squares vertex gradients, and
//! queries are evaluated with the reduced Clough-Tocher split: the containing
//! triangle is divided at its centroid into three cubic Bezier patches whose
//! control net is C1 across all interior edges and has a linearly varying
//! normal derivative along the outer edges. Queries outside the convex hull
//! return NaN, never an error.

/// Relative slack for barycentric containment, absorbs roundoff for queries
/// that sit exactly on an edge shared by two triangles.
const CONTAINMENT_EPSILON: f64 = 1.0e-9;

/// Relative area threshold below which a candidate triangle is discarded as
/// degenerate.
const DEGENERATE_AREA_EPSILON: f64 = 1.0e-12;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TriangulationError {
    #[error("triangulation needs at least 3 points, got {actual}")]
    TooFewPoints { actual: usize },
    #[error("points are collinear or coincident, no triangulation exists")]
    DegenerateGeometry,
}

/// Delaunay triangulation of a fixed scattered point set.
#[derive(Debug, Clone)]
pub struct Triangulation {
    points: Vec<[f64; 2]>,
    triangles: Vec<[usize; 3]>,
}

/// One scalar field over a [`Triangulation`]: nodal values plus fitted
/// gradients.
#[derive(Debug, Clone)]
pub struct Field {
    values: Vec<f64>,
    gradients: Vec<[f64; 2]>,
}

impl Triangulation {
    /// Bowyer-Watson incremental Delaunay construction.
    pub fn delaunay(points: &[[f64; 2]]) -> Result<Self, TriangulationError> {
        let n = points.len();
        if n < 3 {
            return Err(TriangulationError::TooFewPoints { actual: n });
        }

        let (min, max) = bounding_box(points);
        let span = (max[0] - min[0]).max(max[1] - min[1]).max(1.0);
        let center = [(min[0] + max[0]) / 2.0, (min[1] + max[1]) / 2.0];

        // Super-triangle generously enclosing every input point.
        let mut vertices: Vec<[f64; 2]> = points.to_vec();
        vertices.push([center[0] - 20.0 * span, center[1] - span]);
        vertices.push([center[0] + 20.0 * span, center[1] - span]);
        vertices.push([center[0], center[1] + 20.0 * span]);

        let mut triangles: Vec<[usize; 3]> = vec![[n, n + 1, n + 2]];

        for point in 0..n {
            let position = vertices[point];

            let mut cavity: Vec<usize> = Vec::new();
            for (index, triangle) in triangles.iter().enumerate() {
                if in_circumcircle(&vertices, *triangle, position) {
                    cavity.push(index);
                }
            }

            // Boundary of the cavity: edges not shared by two removed
            // triangles.
            let mut boundary: Vec<(usize, usize)> = Vec::new();
            for &index in &cavity {
                let [a, b, c] = triangles[index];
                for edge in [(a, b), (b, c), (c, a)] {
                    if let Some(twin) = boundary
                        .iter()
                        .position(|&(p, q)| (p, q) == (edge.1, edge.0) || (p, q) == edge)
                    {
                        boundary.swap_remove(twin);
                    } else {
                        boundary.push(edge);
                    }
                }
            }

            for &index in cavity.iter().rev() {
                triangles.swap_remove(index);
            }
            for (a, b) in boundary {
                triangles.push(oriented(&vertices, [a, b, point]));
            }
        }

        let area_floor = DEGENERATE_AREA_EPSILON * span * span;
        triangles.retain(|triangle| {
            triangle.iter().all(|&vertex| vertex < n)
                && orient2d(
                    vertices[triangle[0]],
                    vertices[triangle[1]],
                    vertices[triangle[2]],
                )
                .abs()
                    > area_floor
        });

        if triangles.is_empty() {
            return Err(TriangulationError::DegenerateGeometry);
        }

        vertices.truncate(n);
        Ok(Self {
            points: vertices,
            triangles,
        })
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Containing triangle and barycentric coordinates of a query point,
    /// `None` outside the convex hull (including NaN queries).
    pub fn locate(&self, x: f64, y: f64) -> Option<(usize, [f64; 3])> {
        let query = [x, y];
        for (index, &[a, b, c]) in self.triangles.iter().enumerate() {
            let (pa, pb, pc) = (self.points[a], self.points[b], self.points[c]);
            let denominator = orient2d(pa, pb, pc);
            let l1 = orient2d(query, pb, pc) / denominator;
            let l2 = orient2d(pa, query, pc) / denominator;
            let l3 = orient2d(pa, pb, query) / denominator;
            if l1 >= -CONTAINMENT_EPSILON
                && l2 >= -CONTAINMENT_EPSILON
                && l3 >= -CONTAINMENT_EPSILON
            {
                return Some((index, [l1, l2, l3]));
            }
        }
        None
    }

    /// Interpolate a field at a query point, NaN outside the hull.
    pub fn evaluate(&self, field: &Field, x: f64, y: f64) -> f64 {
        match self.locate(x, y) {
            Some((triangle, barycentric)) => self.evaluate_in(field, triangle, barycentric),
            None => f64::NAN,
        }
    }

    /// Reduced Clough-Tocher evaluation inside an already located triangle.
    pub fn evaluate_in(&self, field: &Field, triangle: usize, barycentric: [f64; 3]) -> f64 {
        let corners = self.triangles[triangle];
        let p: [[f64; 2]; 3] = [
            self.points[corners[0]],
            self.points[corners[1]],
            self.points[corners[2]],
        ];
        let f: [f64; 3] = [
            field.values[corners[0]],
            field.values[corners[1]],
            field.values[corners[2]],
        ];
        let g: [[f64; 2]; 3] = [
            field.gradients[corners[0]],
            field.gradients[corners[1]],
            field.gradients[corners[2]],
        ];

        let centroid = [
            (p[0][0] + p[1][0] + p[2][0]) / 3.0,
            (p[0][1] + p[1][1] + p[2][1]) / 3.0,
        ];

        // Cubic endpoint extrapolation of vertex i towards q.
        let reach = |i: usize, q: [f64; 2]| -> f64 {
            f[i] + (g[i][0] * (q[0] - p[i][0]) + g[i][1] * (q[1] - p[i][1])) / 3.0
        };

        // Control points along the interior edges towards the centroid.
        let r = [reach(0, centroid), reach(1, centroid), reach(2, centroid)];

        // Outer interior control point of the patch over edge (j, k), fixed
        // by the linear-normal-derivative condition of the reduced element.
        let outer = |j: usize, k: usize| -> f64 {
            (reach(j, p[k]) + reach(k, p[j])) / 4.0 - (f[j] + f[k]) / 4.0 + (r[j] + r[k]) / 2.0
        };
        let w = [outer(1, 2), outer(2, 0), outer(0, 1)];

        // Control points adjacent to the centroid and the centroid value,
        // from the C1 conditions across the three interior edges.
        let s = [
            (w[2] + w[1] + r[0]) / 3.0,
            (w[0] + w[2] + r[1]) / 3.0,
            (w[1] + w[0] + r[2]) / 3.0,
        ];
        let q = (s[0] + s[1] + s[2]) / 3.0;

        // Micro-triangle opposite the smallest barycentric coordinate.
        let smallest = (0..3)
            .min_by(|&a, &b| barycentric[a].total_cmp(&barycentric[b]))
            .unwrap_or(2);
        let i = (smallest + 1) % 3;
        let j = (smallest + 2) % 3;

        let alpha = barycentric[i] - barycentric[smallest];
        let beta = barycentric[j] - barycentric[smallest];
        let gamma = 3.0 * barycentric[smallest];

        let b300 = f[i];
        let b030 = f[j];
        let b003 = q;
        let b210 = reach(i, p[j]);
        let b120 = reach(j, p[i]);
        let b201 = r[i];
        let b021 = r[j];
        let b102 = s[i];
        let b012 = s[j];
        let b111 = w[smallest];

        b300 * alpha * alpha * alpha
            + b030 * beta * beta * beta
            + b003 * gamma * gamma * gamma
            + 3.0
                * (b210 * alpha * alpha * beta
                    + b201 * alpha * alpha * gamma
                    + b120 * alpha * beta * beta
                    + b021 * beta * beta * gamma
                    + b102 * alpha * gamma * gamma
                    + b012 * beta * gamma * gamma)
            + 6.0 * b111 * alpha * beta * gamma
    }
}

impl Field {
    /// Fit a field over the triangulation: nodal values as given, gradients
    /// from a distance-weighted least-squares plane through each vertex's
    /// neighbourhood. Vertices with a degenerate neighbourhood get a zero
    /// gradient.
    pub fn fit(triangulation: &Triangulation, values: Vec<f64>) -> Self {
        debug_assert_eq!(values.len(), triangulation.points.len());

        let n = triangulation.points.len();
        let mut neighbours: Vec<Vec<usize>> = vec![Vec::new(); n];
        for &[a, b, c] in &triangulation.triangles {
            for (from, to) in [(a, b), (b, c), (c, a), (b, a), (c, b), (a, c)] {
                if !neighbours[from].contains(&to) {
                    neighbours[from].push(to);
                }
            }
        }

        let mut gradients = vec![[0.0_f64; 2]; n];
        for vertex in 0..n {
            let origin = triangulation.points[vertex];
            let mut sxx = 0.0;
            let mut sxy = 0.0;
            let mut syy = 0.0;
            let mut sxf = 0.0;
            let mut syf = 0.0;
            for &neighbour in &neighbours[vertex] {
                let dx = triangulation.points[neighbour][0] - origin[0];
                let dy = triangulation.points[neighbour][1] - origin[1];
                let df = values[neighbour] - values[vertex];
                let weight = 1.0 / (dx * dx + dy * dy);
                sxx += weight * dx * dx;
                sxy += weight * dx * dy;
                syy += weight * dy * dy;
                sxf += weight * dx * df;
                syf += weight * dy * df;
            }
            let determinant = sxx * syy - sxy * sxy;
            if determinant.abs() > f64::EPSILON * (sxx + syy).powi(2) {
                gradients[vertex] = [
                    (syy * sxf - sxy * syf) / determinant,
                    (sxx * syf - sxy * sxf) / determinant,
                ];
            }
        }

        Self { values, gradients }
    }
}

fn bounding_box(points: &[[f64; 2]]) -> ([f64; 2], [f64; 2]) {
    let mut min = [f64::INFINITY; 2];
    let mut max = [f64::NEG_INFINITY; 2];
    for point in points {
        for axis in 0..2 {
            min[axis] = min[axis].min(point[axis]);
            max[axis] = max[axis].max(point[axis]);
        }
    }
    (min, max)
}

/// Twice the signed area of (a, b, c); positive when counter-clockwise.
fn orient2d(a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> f64 {
    (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])
}

fn oriented(vertices: &[[f64; 2]], triangle: [usize; 3]) -> [usize; 3] {
    let [a, b, c] = triangle;
    if orient2d(vertices[a], vertices[b], vertices[c]) < 0.0 {
        [a, c, b]
    } else {
        [a, b, c]
    }
}

/// Strict in-circumcircle test for a counter-clockwise triangle.
fn in_circumcircle(vertices: &[[f64; 2]], triangle: [usize; 3], point: [f64; 2]) -> bool {
    let [a, b, c] = triangle;
    let ax = vertices[a][0] - point[0];
    let ay = vertices[a][1] - point[1];
    let bx = vertices[b][0] - point[0];
    let by = vertices[b][1] - point[1];
    let cx = vertices[c][0] - point[0];
    let cy = vertices[c][1] - point[1];

    let aw = ax * ax + ay * ay;
    let bw = bx * bx + by * by;
    let cw = cx * cx + cy * cy;

    ax * (by * cw - bw * cy) - ay * (bx * cw - bw * cx) + aw * (bx * cy - by * cx) > 0.0
}
