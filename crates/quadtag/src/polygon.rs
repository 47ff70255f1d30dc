//! Polygon helpers for contour filtering: simplification, perimeter,
//! convexity, area, and bounds.

use nalgebra::Point2;

#[inline]
fn dist_sq(a: Point2<i32>, b: Point2<i32>) -> f64 {
    let dx = (a.x - b.x) as f64;
    let dy = (a.y - b.y) as f64;
    dx * dx + dy * dy
}

/// Perpendicular distance from `p` to the line through `a` and `b`.
/// Falls back to point distance when `a == b`.
fn line_dist(a: Point2<i32>, b: Point2<i32>, p: Point2<i32>) -> f64 {
    let dx = (b.x - a.x) as f64;
    let dy = (b.y - a.y) as f64;
    let len_sq = dx * dx + dy * dy;
    if len_sq <= 0.0 {
        return dist_sq(a, p).sqrt();
    }
    let cross = ((p.x - a.x) as f64) * dy - ((p.y - a.y) as f64) * dx;
    cross.abs() / len_sq.sqrt()
}

/// Simplify an open chain, appending every retained vertex except the
/// chain's final endpoint.
fn simplify_chain(chain: &[Point2<i32>], epsilon: f64, out: &mut Vec<Point2<i32>>) {
    let n = chain.len();
    if n == 0 {
        return;
    }
    let mut keep = vec![false; n];
    keep[0] = true;

    let mut stack = vec![(0usize, n - 1)];
    while let Some((a, b)) = stack.pop() {
        if b <= a + 1 {
            continue;
        }
        let mut split = a;
        let mut dmax = 0.0f64;
        for i in a + 1..b {
            let d = line_dist(chain[a], chain[b], chain[i]);
            if d > dmax {
                dmax = d;
                split = i;
            }
        }
        if dmax > epsilon {
            keep[split] = true;
            stack.push((a, split));
            stack.push((split, b));
        }
    }

    for i in 0..n - 1 {
        if keep[i] {
            out.push(chain[i]);
        }
    }
}

/// Douglas-Peucker simplification of a closed contour.
///
/// The contour is split at vertex 0 and the vertex farthest from it, and
/// each half-chain is simplified independently; `epsilon` is the maximum
/// allowed deviation in pixels.
pub fn approx_poly_dp(contour: &[Point2<i32>], epsilon: f64) -> Vec<Point2<i32>> {
    let n = contour.len();
    if n < 3 {
        return contour.to_vec();
    }

    let mut far = 0;
    let mut best = 0.0;
    for (i, &p) in contour.iter().enumerate() {
        let d = dist_sq(contour[0], p);
        if d > best {
            best = d;
            far = i;
        }
    }
    if far == 0 {
        // Degenerate: all vertices coincide.
        return vec![contour[0]];
    }

    let mut out = Vec::new();
    simplify_chain(&contour[..=far], epsilon, &mut out);

    let mut back: Vec<Point2<i32>> = contour[far..].to_vec();
    back.push(contour[0]);
    simplify_chain(&back, epsilon, &mut out);

    out
}

/// Closed-polygon perimeter.
pub fn perimeter(poly: &[Point2<i32>]) -> f64 {
    let len = poly.len();
    if len == 0 {
        return 0.0;
    }

    let mut p = 0.0;
    let mut j = len - 1;
    for i in 0..len {
        p += dist_sq(poly[i], poly[j]).sqrt();
        j = i;
    }
    p
}

/// Strict convexity test via cross-product orientation.
///
/// Accepts both windings; a collinear vertex triple is treated as
/// non-convex, so degenerate "quads" with a flattened corner are rejected.
pub fn is_convex(poly: &[Point2<i32>]) -> bool {
    let len = poly.len();
    if len < 3 {
        return false;
    }

    let mut orientation = 0u8;

    let mut prev = poly[len - 1];
    let mut cur = poly[0];
    let mut dx0 = cur.x - prev.x;
    let mut dy0 = cur.y - prev.y;

    let mut j = 0;
    for _ in 0..len {
        j += 1;
        if j == len {
            j = 0;
        }
        prev = cur;
        cur = poly[j];

        let dx = cur.x - prev.x;
        let dy = cur.y - prev.y;

        let cross = (dy as i64) * (dx0 as i64) - (dx as i64) * (dy0 as i64);
        orientation |= match cross.cmp(&0) {
            std::cmp::Ordering::Greater => 1,
            std::cmp::Ordering::Less => 2,
            std::cmp::Ordering::Equal => 3,
        };
        if orientation == 3 {
            return false;
        }

        dx0 = dx;
        dy0 = dy;
    }

    true
}

/// Even-odd test for `p` strictly inside a closed polygon.
///
/// Integer cross-multiplication keeps the edge-crossing comparison exact,
/// so dense pixel contours need no epsilon.
pub fn point_in_polygon(p: Point2<i32>, poly: &[Point2<i32>]) -> bool {
    if poly.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = poly.len() - 1;
    for i in 0..poly.len() {
        let a = poly[i];
        let b = poly[j];
        if (a.y > p.y) != (b.y > p.y) {
            // p.x < a.x + (b.x - a.x) * (p.y - a.y) / (b.y - a.y), with the
            // division cleared through the signed denominator.
            let den = (b.y - a.y) as i64;
            let num = (b.x - a.x) as i64 * (p.y - a.y) as i64;
            let lhs = (p.x - a.x) as i64 * den;
            let crosses = if den > 0 { lhs < num } else { lhs > num };
            if crosses {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Absolute polygon area (shoelace formula).
pub fn polygon_area(poly: &[Point2<i32>]) -> f64 {
    let len = poly.len();
    if len < 3 {
        return 0.0;
    }
    let mut acc = 0i64;
    let mut j = len - 1;
    for i in 0..len {
        acc += (poly[j].x as i64) * (poly[i].y as i64) - (poly[i].x as i64) * (poly[j].y as i64);
        j = i;
    }
    (acc.abs() as f64) * 0.5
}

/// Axis-aligned bounds: `(min, max)` corner points.
pub fn bounding_box(poly: &[Point2<i32>]) -> (Point2<i32>, Point2<i32>) {
    let mut min = Point2::new(i32::MAX, i32::MAX);
    let mut max = Point2::new(i32::MIN, i32::MIN);
    for p in poly {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }
    (min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: i32, y: i32) -> Point2<i32> {
        Point2::new(x, y)
    }

    #[test]
    fn convexity() {
        let square = [pt(0, 0), pt(4, 0), pt(4, 4), pt(0, 4)];
        assert!(is_convex(&square));

        let concave = [pt(0, 0), pt(4, 0), pt(4, 2), pt(2, 2), pt(2, 4), pt(0, 4)];
        assert!(!is_convex(&concave));
    }

    #[test]
    fn area_and_perimeter_of_unit_square() {
        let square = [pt(0, 0), pt(3, 0), pt(3, 3), pt(0, 3)];
        assert!((polygon_area(&square) - 9.0).abs() < 1e-9);
        assert!((perimeter(&square) - 12.0).abs() < 1e-9);
    }

    #[test]
    fn approx_reduces_square_trace_to_four_corners() {
        // Dense trace of a 10x10 square boundary.
        let mut trace = Vec::new();
        for x in 0..10 {
            trace.push(pt(x, 0));
        }
        for y in 0..10 {
            trace.push(pt(10, y));
        }
        for x in (1..=10).rev() {
            trace.push(pt(x, 10));
        }
        for y in (1..=10).rev() {
            trace.push(pt(0, y));
        }

        let poly = approx_poly_dp(&trace, 1.5);
        assert_eq!(poly.len(), 4);
        for corner in [pt(0, 0), pt(10, 0), pt(10, 10), pt(0, 10)] {
            assert!(poly.contains(&corner), "missing corner {corner:?}");
        }
    }

    #[test]
    fn approx_keeps_genuine_vertices() {
        let tri = [pt(0, 0), pt(5, 0), pt(10, 0), pt(5, 8), pt(2, 4)];
        let poly = approx_poly_dp(&tri, 1.0);
        // The midpoint of the base lies on the base line and must be
        // dropped; the endpoints and the apex survive.
        assert!(poly.contains(&pt(0, 0)));
        assert!(poly.contains(&pt(10, 0)));
        assert!(poly.contains(&pt(5, 8)));
        assert!(!poly.contains(&pt(5, 0)));
    }

    #[test]
    fn point_containment() {
        let square = [pt(0, 0), pt(10, 0), pt(10, 10), pt(0, 10)];
        assert!(point_in_polygon(pt(5, 5), &square));
        assert!(point_in_polygon(pt(1, 9), &square));
        assert!(!point_in_polygon(pt(15, 5), &square));
        assert!(!point_in_polygon(pt(-1, 5), &square));
        assert!(!point_in_polygon(pt(5, 11), &square));

        // Winding direction does not matter.
        let ccw = [pt(0, 0), pt(0, 10), pt(10, 10), pt(10, 0)];
        assert!(point_in_polygon(pt(5, 5), &ccw));
    }

    #[test]
    fn bounds() {
        let poly = [pt(3, 7), pt(-1, 2), pt(5, 4)];
        let (min, max) = bounding_box(&poly);
        assert_eq!((min.x, min.y), (-1, 2));
        assert_eq!((max.x, max.y), (5, 7));
    }
}
