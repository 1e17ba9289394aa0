use imageproc::point::Point;
use crate::models::RotatedRect;

/// Area enclosed by a closed polygon (shoelace formula), always non-negative
pub fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }

    let mut twice_area: i64 = 0;
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        twice_area += p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64;
    }

    twice_area.abs() as f64 / 2.0
}

/// Cross product of OA and OB
fn cross(o: Point<i32>, a: Point<i32>, b: Point<i32>) -> i64 {
    (a.x - o.x) as i64 * (b.y - o.y) as i64 - (a.y - o.y) as i64 * (b.x - o.x) as i64
}

/// Convex hull by Andrew's monotone chain; collinear points are dropped
pub fn convex_hull(points: &[Point<i32>]) -> Vec<Point<i32>> {
    let mut pts = points.to_vec();
    pts.sort_by(|a, b| a.x.cmp(&b.x).then(a.y.cmp(&b.y)));
    pts.dedup();

    if pts.len() < 3 {
        return pts;
    }

    let mut lower: Vec<Point<i32>> = Vec::new();
    for p in &pts {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], *p) <= 0 {
            lower.pop();
        }
        lower.push(*p);
    }

    let mut upper: Vec<Point<i32>> = Vec::new();
    for p in pts.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], *p) <= 0 {
            upper.pop();
        }
        upper.push(*p);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

/// Fold an edge direction into `(0, 90]`, returning the folded angle and
/// whether the fold turned the edge by an odd multiple of 90 degrees.
fn fold_angle(degrees: f32) -> (f32, bool) {
    let mut folded = degrees.rem_euclid(90.0);
    if folded < 1e-4 {
        folded = 90.0;
    }
    let quarter_turns = ((degrees - folded) / 90.0).round() as i64;
    (folded, quarter_turns.rem_euclid(2) == 1)
}

fn rect_along(direction: (f64, f64), extent_u: (f64, f64), extent_v: (f64, f64)) -> RotatedRect {
    let (ux, uy) = direction;
    let cu = (extent_u.0 + extent_u.1) / 2.0;
    let cv = (extent_v.0 + extent_v.1) / 2.0;
    let width = (extent_u.1 - extent_u.0) as f32;
    let height = (extent_v.1 - extent_v.0) as f32;

    let (angle, swapped) = fold_angle(uy.atan2(ux).to_degrees() as f32);
    let (width, height) = if swapped { (height, width) } else { (width, height) };

    RotatedRect {
        center: ((cu * ux - cv * uy) as f32, (cu * uy + cv * ux) as f32),
        width,
        height,
        angle,
    }
}

/// Minimum-area rectangle enclosing `points`, found by testing every hull edge
/// as a candidate rectangle side.
///
/// The angle follows the [`RotatedRect`] convention: degrees in `(0, 90]`,
/// measured in image coordinates with y pointing down.
pub fn min_area_rect(points: &[Point<i32>]) -> Option<RotatedRect> {
    let hull = convex_hull(points);
    let first = *hull.first()?;

    if hull.len() == 1 {
        return Some(RotatedRect {
            center: (first.x as f32, first.y as f32),
            width: 0.0,
            height: 0.0,
            angle: 90.0,
        });
    }

    let hull_f: Vec<(f64, f64)> = hull.iter().map(|p| (p.x as f64, p.y as f64)).collect();
    let n = hull_f.len();
    let mut best: Option<(f64, RotatedRect)> = None;

    for i in 0..n {
        let (px, py) = hull_f[i];
        let (qx, qy) = hull_f[(i + 1) % n];
        let len = (qx - px).hypot(qy - py);
        if len == 0.0 {
            continue;
        }
        let (ux, uy) = ((qx - px) / len, (qy - py) / len);

        let mut extent_u = (f64::MAX, f64::MIN);
        let mut extent_v = (f64::MAX, f64::MIN);
        for &(x, y) in &hull_f {
            let u = x * ux + y * uy;
            let v = -x * uy + y * ux;
            extent_u = (extent_u.0.min(u), extent_u.1.max(u));
            extent_v = (extent_v.0.min(v), extent_v.1.max(v));
        }

        let area = (extent_u.1 - extent_u.0) * (extent_v.1 - extent_v.0);
        if best.as_ref().is_none_or(|(best_area, _)| area < *best_area - 1e-9) {
            best = Some((area, rect_along((ux, uy), extent_u, extent_v)));
        }
    }

    best.map(|(_, rect)| rect)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(coords: &[(i32, i32)]) -> Vec<Point<i32>> {
        coords.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    #[test]
    fn area_of_square_ignores_orientation() {
        let square = pts(&[(0, 0), (10, 0), (10, 10), (0, 10)]);
        let mut reversed = square.clone();
        reversed.reverse();
        assert_eq!(polygon_area(&square), 100.0);
        assert_eq!(polygon_area(&reversed), 100.0);
        assert_eq!(polygon_area(&square[..2]), 0.0);
    }

    #[test]
    fn hull_drops_interior_points() {
        let hull = convex_hull(&pts(&[(0, 0), (4, 0), (2, 1), (4, 4), (0, 4), (2, 2)]));
        assert_eq!(hull.len(), 4);
        assert!(!hull.contains(&Point::new(2, 2)));
    }

    #[test]
    fn axis_aligned_rect_reports_ninety() {
        let rect = min_area_rect(&pts(&[(10, 20), (50, 20), (50, 40), (10, 40)])).unwrap();
        assert!((rect.angle - 90.0).abs() < 1e-3);
        assert!((rect.center.0 - 30.0).abs() < 1e-3);
        assert!((rect.center.1 - 30.0).abs() < 1e-3);
        let mut sides = [rect.width, rect.height];
        sides.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert!((sides[0] - 20.0).abs() < 1e-3 && (sides[1] - 40.0).abs() < 1e-3);
        assert_eq!(rect.correction_angle(), 0.0);
    }

    #[test]
    fn tilted_rect_angle_is_folded() {
        // Long edge along (cos 30, sin 30): clockwise on screen
        let (c, s) = (30f64.to_radians().cos(), 30f64.to_radians().sin());
        let corners: Vec<Point<i32>> = [(0.0, 0.0), (400.0, 0.0), (400.0, 200.0), (0.0, 200.0)]
            .iter()
            .map(|&(x, y)| Point::new((x * c - y * s).round() as i32 + 500, (x * s + y * c).round() as i32 + 500))
            .collect();
        let rect = min_area_rect(&corners).unwrap();
        assert!((rect.angle - 30.0).abs() < 0.5, "angle {}", rect.angle);
        assert!((rect.correction_angle() - 30.0).abs() < 0.5);

        // Counter-clockwise tilt lands above 45 and folds to a negative turn
        let mirrored: Vec<Point<i32>> = corners.iter().map(|p| Point::new(p.x, 2000 - p.y)).collect();
        let rect = min_area_rect(&mirrored).unwrap();
        assert!((rect.angle - 60.0).abs() < 0.5, "angle {}", rect.angle);
        assert!((rect.correction_angle() + 30.0).abs() < 0.5);
    }

    #[test]
    fn degenerate_inputs() {
        assert!(min_area_rect(&[]).is_none());
        let single = min_area_rect(&pts(&[(3, 4)])).unwrap();
        assert_eq!(single.center, (3.0, 4.0));
        let segment = min_area_rect(&pts(&[(0, 0), (10, 0)])).unwrap();
        assert_eq!(segment.height.min(segment.width), 0.0);
    }
}
