//! Polygon and freehand paths stored as normalized points.

use super::ShapeBehavior;
use crate::geometry::{point_in_polygon, point_polyline_distance_sq};
use kurbo::{BezPath, Point, Rect, Size};
use serde::{Deserialize, Serialize};

/// Whether the path is a closed polygon or an open stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathType {
    Polygon,
    Freehand,
}

/// A path whose points are fractions of the frame, `(0,0)` top-left and
/// `(1,1)` bottom-right. Resizing the frame rescales the path for free.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathShape {
    pub path_type: PathType,
    pub points: Vec<Point>,
}

impl PathShape {
    /// Simplification tolerance for freehand strokes, in world units.
    pub const SIMPLIFY_TOLERANCE: f64 = 1.0;

    pub fn polygon(points: Vec<Point>) -> Self {
        Self {
            path_type: PathType::Polygon,
            points,
        }
    }

    /// A diamond touching the four edge midpoints.
    pub fn diamond() -> Self {
        Self::polygon(vec![
            Point::new(0.5, 0.0),
            Point::new(1.0, 0.5),
            Point::new(0.5, 1.0),
            Point::new(0.0, 0.5),
        ])
    }

    /// Build a freehand path from world points. Returns the path and the
    /// frame it is normalized against, grown to at least `min` around the
    /// stroke's center.
    pub fn freehand_from_world(points: &[Point], min: Size) -> (Self, Rect) {
        let simplified = rdp_simplify(points, Self::SIMPLIFY_TOLERANCE);
        let bounds = simplified
            .iter()
            .skip(1)
            .fold(
                simplified.first().map(|p| Rect::from_points(*p, *p)).unwrap_or(Rect::ZERO),
                |acc, p| acc.union_pt(*p),
            );
        let frame = Rect::from_center_size(
            bounds.center(),
            Size::new(bounds.width().max(min.width), bounds.height().max(min.height)),
        );
        let normalized = simplified
            .iter()
            .map(|p| {
                Point::new(
                    (p.x - frame.x0) / frame.width(),
                    (p.y - frame.y0) / frame.height(),
                )
            })
            .collect();
        (
            Self {
                path_type: PathType::Freehand,
                points: normalized,
            },
            frame,
        )
    }

    pub fn is_closed(&self) -> bool {
        self.path_type == PathType::Polygon
    }

    /// Points in the local frame (centered, unrotated) for a frame of `size`.
    pub fn local_points(&self, size: Size) -> Vec<Point> {
        self.points
            .iter()
            .map(|p| Point::new((p.x - 0.5) * size.width, (p.y - 0.5) * size.height))
            .collect()
    }

    /// Mirror the normalized points.
    pub fn bake_flip(&mut self, flip_x: bool, flip_y: bool) {
        for point in &mut self.points {
            if flip_x {
                point.x = 1.0 - point.x;
            }
            if flip_y {
                point.y = 1.0 - point.y;
            }
        }
    }
}

impl ShapeBehavior for PathShape {
    fn min_size(&self) -> Size {
        match self.path_type {
            PathType::Polygon => Size::new(20.0, 20.0),
            PathType::Freehand => Size::new(10.0, 10.0),
        }
    }

    fn local_path(&self, size: Size) -> BezPath {
        let mut path = BezPath::new();
        let points = self.local_points(size);
        let Some(first) = points.first() else {
            return path;
        };
        path.move_to(*first);
        for point in &points[1..] {
            path.line_to(*point);
        }
        if self.is_closed() {
            path.close_path();
        }
        path
    }

    fn hit_local(&self, local: Point, size: Size, tolerance: f64) -> bool {
        let mut points = self.local_points(size);
        if self.is_closed() {
            if point_in_polygon(local, &points) {
                return true;
            }
            if let Some(first) = points.first().copied() {
                points.push(first);
            }
        }
        point_polyline_distance_sq(local, &points) <= tolerance * tolerance
    }

    fn supports_flip(&self) -> bool {
        true
    }
}

/// Ramer-Douglas-Peucker line simplification.
pub(crate) fn rdp_simplify(points: &[Point], tolerance: f64) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let first = points[0];
    let last = points[points.len() - 1];

    let mut max_dist = 0.0;
    let mut max_index = 0;
    for (i, point) in points.iter().enumerate().skip(1).take(points.len() - 2) {
        let dist = perpendicular_distance(*point, first, last);
        if dist > max_dist {
            max_dist = dist;
            max_index = i;
        }
    }

    if max_dist > tolerance {
        let mut left = rdp_simplify(&points[..=max_index], tolerance);
        let right = rdp_simplify(&points[max_index..], tolerance);
        left.pop();
        left.extend(right);
        left
    } else {
        vec![first, last]
    }
}

fn perpendicular_distance(point: Point, start: Point, end: Point) -> f64 {
    let d = end - start;
    let len_sq = d.hypot2();
    if len_sq < f64::EPSILON {
        return (point - start).hypot();
    }
    (point - start).cross(d).abs() / len_sq.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diamond_hits_center_not_corner() {
        let diamond = PathShape::diamond();
        let size = Size::new(100.0, 100.0);
        assert!(diamond.hit_local(Point::ZERO, size, 0.0));
        assert!(!diamond.hit_local(Point::new(-48.0, -48.0), size, 2.0));
    }

    #[test]
    fn test_freehand_normalizes_into_frame() {
        let stroke = [
            Point::new(10.0, 10.0),
            Point::new(60.0, 40.0),
            Point::new(110.0, 10.0),
        ];
        let (path, frame) = PathShape::freehand_from_world(&stroke, Size::new(10.0, 10.0));
        assert_eq!(frame, Rect::new(10.0, 10.0, 110.0, 40.0));
        assert_eq!(path.points.len(), 3);
        assert_eq!(path.points[0], Point::new(0.0, 0.0));
        assert_eq!(path.points[1], Point::new(0.5, 1.0));
    }

    #[test]
    fn test_flat_stroke_gets_min_height() {
        let stroke = [Point::new(0.0, 5.0), Point::new(50.0, 5.0)];
        let (path, frame) = PathShape::freehand_from_world(&stroke, Size::new(10.0, 10.0));
        assert!((frame.height() - 10.0).abs() < f64::EPSILON);
        assert!((path.points[0].y - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_bake_flip_mirrors_points() {
        let mut path = PathShape::polygon(vec![Point::new(0.0, 0.25), Point::new(1.0, 1.0)]);
        path.bake_flip(true, false);
        assert_eq!(path.points, vec![Point::new(1.0, 0.25), Point::new(0.0, 1.0)]);
    }

    #[test]
    fn test_simplify_drops_collinear_points() {
        let points: Vec<Point> = (0..10).map(|i| Point::new(i as f64, 0.0)).collect();
        assert_eq!(rdp_simplify(&points, 0.5).len(), 2);
    }
}
