//! Planar geometry helpers
//!
//! Distances are Euclidean over the abstract map plane; there is no road
//! network behind them.

use crate::models::Point;

/// Tolerance for treating a point as lying on a polygon edge
const EDGE_EPSILON: f64 = 1e-9;

/// Euclidean distance between two points
pub fn distance(a: &Point, b: &Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    (dx * dx + dy * dy).sqrt()
}

/// Inverse-distance proximity term; a zero distance is maximal proximity
pub fn proximity(distance: f64) -> f64 {
    if distance <= 0.0 {
        f64::INFINITY
    } else {
        1.0 / distance
    }
}

/// Inclusive box test using `corners[0]` as min and `corners[2]` as max
pub fn bounding_box_contains(corners: &[Point], p: &Point) -> bool {
    let (Some(min), Some(max)) = (corners.first(), corners.get(2)) else {
        return false;
    };
    p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y
}

/// Ray-casting containment over the full vertex list.
///
/// Points on an edge or vertex count as inside. Polygons with fewer than
/// three vertices contain nothing.
pub fn polygon_contains(polygon: &[Point], p: &Point) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let a = &polygon[i];
        let b = &polygon[j];

        if on_segment(a, b, p) {
            return true;
        }

        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

fn on_segment(a: &Point, b: &Point, p: &Point) -> bool {
    let cross = (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x);
    if cross.abs() > EDGE_EPSILON {
        return false;
    }
    p.x >= a.x.min(b.x) - EDGE_EPSILON
        && p.x <= a.x.max(b.x) + EDGE_EPSILON
        && p.y >= a.y.min(b.y) - EDGE_EPSILON
        && p.y <= a.y.max(b.y) + EDGE_EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Point> {
        vec![
            Point::new(10.0, 10.0),
            Point::new(40.0, 10.0),
            Point::new(40.0, 40.0),
            Point::new(10.0, 40.0),
        ]
    }

    #[test]
    fn test_distance_is_symmetric() {
        let samples = [
            (Point::new(0.0, 0.0), Point::new(3.0, 4.0)),
            (Point::new(-12.5, 7.0), Point::new(40.0, -3.25)),
            (Point::new(22.0, 18.0), Point::new(20.0, 15.0)),
        ];
        for (a, b) in samples {
            assert_eq!(distance(&a, &b), distance(&b, &a));
        }
        assert_eq!(distance(&Point::new(0.0, 0.0), &Point::new(3.0, 4.0)), 5.0);
    }

    #[test]
    fn test_distance_to_self_is_zero() {
        let p = Point::new(55.0, 25.0);
        assert_eq!(distance(&p, &p), 0.0);
    }

    #[test]
    fn test_proximity_at_zero_distance() {
        assert_eq!(proximity(0.0), f64::INFINITY);
        assert_eq!(proximity(4.0), 0.25);
        assert!(!proximity(0.0).is_nan());
    }

    #[test]
    fn test_bounding_box_inclusive() {
        let corners = square();
        assert!(bounding_box_contains(&corners, &Point::new(22.0, 18.0)));
        assert!(bounding_box_contains(&corners, &Point::new(10.0, 40.0)));
        assert!(!bounding_box_contains(&corners, &Point::new(40.1, 20.0)));
        assert!(!bounding_box_contains(&corners[..2], &Point::new(20.0, 20.0)));
    }

    #[test]
    fn test_polygon_contains_square() {
        let polygon = square();
        assert!(polygon_contains(&polygon, &Point::new(22.0, 18.0)));
        assert!(!polygon_contains(&polygon, &Point::new(100.0, 100.0)));
        assert!(!polygon_contains(&polygon, &Point::new(5.0, 20.0)));
    }

    #[test]
    fn test_polygon_boundary_is_inside() {
        let polygon = square();
        assert!(polygon_contains(&polygon, &Point::new(40.0, 25.0)));
        assert!(polygon_contains(&polygon, &Point::new(10.0, 10.0)));
        assert!(polygon_contains(&polygon, &Point::new(25.0, 40.0)));
    }

    #[test]
    fn test_polygon_independent_of_vertex_order() {
        // Same square authored from a different starting corner
        let polygon = vec![
            Point::new(40.0, 40.0),
            Point::new(10.0, 40.0),
            Point::new(10.0, 10.0),
            Point::new(40.0, 10.0),
        ];
        assert!(polygon_contains(&polygon, &Point::new(22.0, 18.0)));
        assert!(!bounding_box_contains(&polygon, &Point::new(22.0, 18.0)));
    }

    #[test]
    fn test_concave_polygon() {
        // L-shape missing its upper-right quadrant
        let polygon = vec![
            Point::new(0.0, 0.0),
            Point::new(20.0, 0.0),
            Point::new(20.0, 10.0),
            Point::new(10.0, 10.0),
            Point::new(10.0, 20.0),
            Point::new(0.0, 20.0),
        ];
        assert!(polygon_contains(&polygon, &Point::new(5.0, 15.0)));
        assert!(polygon_contains(&polygon, &Point::new(15.0, 5.0)));
        assert!(!polygon_contains(&polygon, &Point::new(15.0, 15.0)));
    }

    #[test]
    fn test_degenerate_polygon() {
        let line = vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)];
        assert!(!polygon_contains(&line, &Point::new(5.0, 0.0)));
    }
}
