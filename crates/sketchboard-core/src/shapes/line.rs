//! Polyline connector with optional arrowheads.

use super::ShapeBehavior;
use crate::connection::Role;
use crate::geometry::point_polyline_distance_sq;
use kurbo::{BezPath, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// A polyline whose points are kept in world coordinates. The owning
/// shape's frame is recomputed from the points whenever they change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Line {
    pub points: Vec<Point>,
    #[serde(default)]
    pub start_arrow: bool,
    #[serde(default)]
    pub end_arrow: bool,
}

impl Line {
    pub const HEAD_SIZE: f64 = 15.0;

    pub fn new(start: Point, end: Point) -> Self {
        Self::from_points(vec![start, end])
    }

    pub fn from_points(points: Vec<Point>) -> Self {
        Self {
            points,
            start_arrow: false,
            end_arrow: false,
        }
    }

    pub fn with_end_arrow(mut self, end_arrow: bool) -> Self {
        self.end_arrow = end_arrow;
        self
    }

    pub fn start(&self) -> Option<Point> {
        self.points.first().copied()
    }

    pub fn end(&self) -> Option<Point> {
        self.points.last().copied()
    }

    /// Index of the point playing `role`.
    pub fn index_of(&self, role: Role) -> Option<usize> {
        match (role, self.points.len()) {
            (_, 0) => None,
            (Role::Start, _) => Some(0),
            (Role::End, n) => Some(n - 1),
        }
    }

    /// Role of the point at `index`, if it is an endpoint.
    pub fn role_at(&self, index: usize) -> Option<Role> {
        if self.points.len() < 2 {
            return None;
        }
        if index == 0 {
            Some(Role::Start)
        } else if index == self.points.len() - 1 {
            Some(Role::End)
        } else {
            None
        }
    }

    pub fn set_point(&mut self, index: usize, point: Point) -> bool {
        match self.points.get_mut(index) {
            Some(p) => {
                *p = point;
                true
            }
            None => false,
        }
    }

    pub fn translate(&mut self, delta: Vec2) {
        for point in &mut self.points {
            *point += delta;
        }
    }

    /// Tight bounds of the points (zero area for straight axis lines).
    pub fn bounds(&self) -> Rect {
        let mut iter = self.points.iter();
        let Some(first) = iter.next() else {
            return Rect::ZERO;
        };
        iter.fold(Rect::from_points(*first, *first), |acc, p| acc.union_pt(*p))
    }

    /// Index of the point within `padding` of `point`, endpoints first.
    pub fn point_near(&self, point: Point, padding: f64) -> Option<usize> {
        let limit = padding * padding;
        let n = self.points.len();
        let mut order: Vec<usize> = Vec::with_capacity(n);
        if n > 0 {
            order.push(n - 1);
        }
        order.push(0);
        order.extend(1..n.saturating_sub(1));
        order
            .into_iter()
            .filter(|&i| i < n)
            .find(|&i| (self.points[i] - point).hypot2() <= limit)
    }

    fn local_points(&self) -> Vec<Point> {
        let center = self.bounds().center().to_vec2();
        self.points.iter().map(|p| *p - center).collect()
    }

    fn head(tip: Point, from: Point) -> Option<BezPath> {
        let dir = tip - from;
        let len = dir.hypot();
        if len < f64::EPSILON {
            return None;
        }
        let dir = dir / len;
        let perp = Vec2::new(-dir.y, dir.x);
        let back = tip - dir * Self::HEAD_SIZE;
        let mut path = BezPath::new();
        path.move_to(back + perp * Self::HEAD_SIZE * 0.5);
        path.line_to(tip);
        path.line_to(back - perp * Self::HEAD_SIZE * 0.5);
        Some(path)
    }
}

impl ShapeBehavior for Line {
    fn min_size(&self) -> Size {
        Size::ZERO
    }

    fn local_path(&self, _size: Size) -> BezPath {
        let points = self.local_points();
        let mut path = BezPath::new();
        let Some(first) = points.first() else {
            return path;
        };
        path.move_to(*first);
        for point in &points[1..] {
            path.line_to(*point);
        }
        let n = points.len();
        if n >= 2 {
            if self.end_arrow {
                if let Some(head) = Self::head(points[n - 1], points[n - 2]) {
                    path.extend(head);
                }
            }
            if self.start_arrow {
                if let Some(head) = Self::head(points[0], points[1]) {
                    path.extend(head);
                }
            }
        }
        path
    }

    fn hit_local(&self, local: Point, _size: Size, tolerance: f64) -> bool {
        point_polyline_distance_sq(local, &self.local_points()) <= tolerance * tolerance
    }

    fn supports_rotation(&self) -> bool {
        false
    }

    fn supports_caption(&self) -> bool {
        false
    }
}
