//! Rotation-aware hit-testing and resize math.
//!
//! Rotation is stored once per shape (radians, clockwise, pivot at the frame
//! center) and never baked into coordinates, so every query first moves the
//! world point into the shape's local frame.

use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_4, TAU};

/// One of the eight resize handle zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResizeDirection {
    #[serde(rename = "tl")]
    TopLeft,
    #[serde(rename = "t")]
    Top,
    #[serde(rename = "tr")]
    TopRight,
    #[serde(rename = "r")]
    Right,
    #[serde(rename = "br")]
    BottomRight,
    #[serde(rename = "b")]
    Bottom,
    #[serde(rename = "bl")]
    BottomLeft,
    #[serde(rename = "l")]
    Left,
}

impl ResizeDirection {
    /// All directions, clockwise starting from the top edge.
    pub const ALL: [ResizeDirection; 8] = [
        ResizeDirection::Top,
        ResizeDirection::TopRight,
        ResizeDirection::Right,
        ResizeDirection::BottomRight,
        ResizeDirection::Bottom,
        ResizeDirection::BottomLeft,
        ResizeDirection::Left,
        ResizeDirection::TopLeft,
    ];

    /// Short tag (`tl`, `t`, `tr`, ...).
    pub fn tag(self) -> &'static str {
        match self {
            ResizeDirection::TopLeft => "tl",
            ResizeDirection::Top => "t",
            ResizeDirection::TopRight => "tr",
            ResizeDirection::Right => "r",
            ResizeDirection::BottomRight => "br",
            ResizeDirection::Bottom => "b",
            ResizeDirection::BottomLeft => "bl",
            ResizeDirection::Left => "l",
        }
    }

    pub fn moves_left(self) -> bool {
        matches!(
            self,
            ResizeDirection::TopLeft | ResizeDirection::Left | ResizeDirection::BottomLeft
        )
    }

    pub fn moves_right(self) -> bool {
        matches!(
            self,
            ResizeDirection::TopRight | ResizeDirection::Right | ResizeDirection::BottomRight
        )
    }

    pub fn moves_top(self) -> bool {
        matches!(
            self,
            ResizeDirection::TopLeft | ResizeDirection::Top | ResizeDirection::TopRight
        )
    }

    pub fn moves_bottom(self) -> bool {
        matches!(
            self,
            ResizeDirection::BottomLeft | ResizeDirection::Bottom | ResizeDirection::BottomRight
        )
    }

    /// Corner handles move two edges at once.
    pub fn is_corner(self) -> bool {
        matches!(
            self,
            ResizeDirection::TopLeft
                | ResizeDirection::TopRight
                | ResizeDirection::BottomLeft
                | ResizeDirection::BottomRight
        )
    }

    /// Position on the compass, in 45° steps clockwise from the top edge.
    fn compass_index(self) -> usize {
        match self {
            ResizeDirection::Top => 0,
            ResizeDirection::TopRight => 1,
            ResizeDirection::Right => 2,
            ResizeDirection::BottomRight => 3,
            ResizeDirection::Bottom => 4,
            ResizeDirection::BottomLeft => 5,
            ResizeDirection::Left => 6,
            ResizeDirection::TopLeft => 7,
        }
    }
}

/// Pointer cursor glyphs the host should display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CursorIcon {
    #[default]
    Default,
    Move,
    Rotate,
    NsResize,
    EwResize,
    NwseResize,
    NeswResize,
    Grab,
    Grabbing,
    Text,
    Crosshair,
}

/// Resize cursor for `direction` on a shape rotated by `rotation` radians.
///
/// The rotation is quantized to 45° buckets so the glyph always follows the
/// apparent drag axis.
pub fn resize_cursor(direction: ResizeDirection, rotation: f64) -> CursorIcon {
    let steps = (normalize_angle(rotation) / FRAC_PI_4).round() as usize;
    match (direction.compass_index() + steps) % 8 {
        0 | 4 => CursorIcon::NsResize,
        1 | 5 => CursorIcon::NeswResize,
        2 | 6 => CursorIcon::EwResize,
        _ => CursorIcon::NwseResize,
    }
}

/// Normalize an angle into `[0, 2π)`. Non-finite input maps to zero.
pub fn normalize_angle(angle: f64) -> f64 {
    if !angle.is_finite() {
        return 0.0;
    }
    let wrapped = angle.rem_euclid(TAU);
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Rotate a vector clockwise (screen coordinates, y down) by `rotation`.
pub fn rotate_vec(v: Vec2, rotation: f64) -> Vec2 {
    let (sin, cos) = rotation.sin_cos();
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Move a world point into the local frame of a shape centered at `center`
/// and rotated by `rotation`. The result is relative to the center.
pub fn calc_point_with_rotation(point: Point, center: Point, rotation: f64) -> Point {
    let local = rotate_vec(point - center, -rotation);
    Point::new(local.x, local.y)
}

/// Inverse of [`calc_point_with_rotation`].
pub fn local_to_world(local: Point, center: Point, rotation: f64) -> Point {
    center + rotate_vec(local.to_vec2(), rotation)
}

/// Whether `point` lies inside `rect` once rotated by `rotation` about its center.
pub fn is_draggable(point: Point, rect: Rect, rotation: f64) -> bool {
    let local = calc_point_with_rotation(point, rect.center(), rotation);
    local.x.abs() <= rect.width() / 2.0 && local.y.abs() <= rect.height() / 2.0
}

/// Classify `point` against the eight handle zones of `rect`.
///
/// Each zone is a band of `padding` on either side of an edge. A point that
/// satisfies two edge conditions is a corner.
pub fn resize_direction(point: Point, rect: Rect, padding: f64) -> Option<ResizeDirection> {
    let within_x = point.x >= rect.x0 - padding && point.x <= rect.x1 + padding;
    let within_y = point.y >= rect.y0 - padding && point.y <= rect.y1 + padding;
    if !within_x || !within_y {
        return None;
    }

    let left = (point.x - rect.x0).abs() <= padding;
    let right = (point.x - rect.x1).abs() <= padding;
    let top = (point.y - rect.y0).abs() <= padding;
    let bottom = (point.y - rect.y1).abs() <= padding;

    match (top, bottom, left, right) {
        (true, _, true, _) => Some(ResizeDirection::TopLeft),
        (true, _, _, true) => Some(ResizeDirection::TopRight),
        (_, true, true, _) => Some(ResizeDirection::BottomLeft),
        (_, true, _, true) => Some(ResizeDirection::BottomRight),
        (true, _, _, _) => Some(ResizeDirection::Top),
        (_, true, _, _) => Some(ResizeDirection::Bottom),
        (_, _, true, _) => Some(ResizeDirection::Left),
        (_, _, _, true) => Some(ResizeDirection::Right),
        _ => None,
    }
}

/// [`resize_direction`] for a rotated rect: the test runs in the local frame.
pub fn resize_direction_rotated(
    point: Point,
    rect: Rect,
    rotation: f64,
    padding: f64,
) -> Option<ResizeDirection> {
    let local = calc_point_with_rotation(point, rect.center(), rotation);
    resize_direction(local, Rect::from_center_size(Point::ZERO, rect.size()), padding)
}

/// Whether `point` is in the rotate ring: within `padding + rotation_padding`
/// of the rect but neither draggable nor on a resize handle.
pub fn is_rotatable(
    point: Point,
    rect: Rect,
    rotation: f64,
    padding: f64,
    rotation_padding: f64,
) -> bool {
    let local = calc_point_with_rotation(point, rect.center(), rotation);
    let local_rect = Rect::from_center_size(Point::ZERO, rect.size());
    let reach = padding + rotation_padding;
    let ring = local_rect.inflate(reach, reach);
    ring.contains(local)
        && !(local.x.abs() <= rect.width() / 2.0 && local.y.abs() <= rect.height() / 2.0)
        && resize_direction(local, local_rect, padding).is_none()
}

/// Size floor and proportional constraint for a resize gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeConstraints {
    pub min_width: f64,
    pub min_height: f64,
    /// Keep the original aspect ratio on corner handles.
    pub keep_aspect: bool,
}

impl ResizeConstraints {
    pub fn new(min_width: f64, min_height: f64) -> Self {
        Self {
            min_width,
            min_height,
            keep_aspect: false,
        }
    }

    pub fn from_size(min: Size) -> Self {
        Self::new(min.width, min.height)
    }

    pub fn with_aspect(mut self, keep_aspect: bool) -> Self {
        self.keep_aspect = keep_aspect;
        self
    }
}

/// Result of a resize that may cross the opposite edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlipResize {
    pub rect: Rect,
    pub flip_x: bool,
    pub flip_y: bool,
}

/// New unrotated frame of a rotated box after dragging the `direction` handle
/// to `current`.
///
/// The pointer is located in the local frame of `old` (centered on the
/// original center), the moving edges are clamped against the fixed ones,
/// and the new local center is rotated back into world space.
pub fn resize_with_rotation(
    current: Point,
    old: Rect,
    direction: ResizeDirection,
    rotation: f64,
    constraints: ResizeConstraints,
) -> Rect {
    let local = calc_point_with_rotation(current, old.center(), rotation);
    let extents = local_extents(local, old.size(), direction, constraints, false);
    extents_to_world(extents, old.center(), rotation)
}

/// Like [`resize_with_rotation`] but the moving edge may cross the opposite
/// edge. Crossing an axis toggles that axis' flip relative to the previous
/// flip state.
#[allow(clippy::too_many_arguments)]
pub fn resize_with_rotation_and_flip(
    current: Point,
    old: Rect,
    direction: ResizeDirection,
    rotation: f64,
    flip_x: bool,
    flip_y: bool,
    constraints: ResizeConstraints,
) -> FlipResize {
    let local = calc_point_with_rotation(current, old.center(), rotation);
    let half_w = old.width() / 2.0;
    let half_h = old.height() / 2.0;

    let crossed_x = (direction.moves_left() && local.x > half_w)
        || (direction.moves_right() && local.x < -half_w);
    let crossed_y = (direction.moves_top() && local.y > half_h)
        || (direction.moves_bottom() && local.y < -half_h);

    let extents = local_extents(local, old.size(), direction, constraints, true);
    FlipResize {
        rect: extents_to_world(extents, old.center(), rotation),
        flip_x: flip_x ^ crossed_x,
        flip_y: flip_y ^ crossed_y,
    }
}

/// Scale `inner` from the coordinate space of `from` into `to`.
pub fn map_rect(inner: Rect, from: Rect, to: Rect) -> Rect {
    let sx = if from.width() > f64::EPSILON { to.width() / from.width() } else { 1.0 };
    let sy = if from.height() > f64::EPSILON { to.height() / from.height() } else { 1.0 };
    Rect::new(
        to.x0 + (inner.x0 - from.x0) * sx,
        to.y0 + (inner.y0 - from.y0) * sy,
        to.x0 + (inner.x1 - from.x0) * sx,
        to.y0 + (inner.y1 - from.y0) * sy,
    )
}

/// Axis-aligned bounds of `rect` rotated by `rotation` about its center.
pub fn rotated_bounds(rect: Rect, rotation: f64) -> Rect {
    if normalize_angle(rotation).abs() < 1e-9 {
        return rect;
    }
    let center = rect.center();
    let half = Vec2::new(rect.width() / 2.0, rect.height() / 2.0);
    let corners = [
        Vec2::new(-half.x, -half.y),
        Vec2::new(half.x, -half.y),
        Vec2::new(half.x, half.y),
        Vec2::new(-half.x, half.y),
    ];
    let mut bounds = Rect::from_center_size(center + rotate_vec(corners[0], rotation), Size::ZERO);
    for corner in &corners[1..] {
        bounds = bounds.union_pt(center + rotate_vec(*corner, rotation));
    }
    bounds
}

/// Whether `inner` lies completely inside `outer` (edges may touch).
pub fn contains_rect(outer: Rect, inner: Rect) -> bool {
    inner.x0 >= outer.x0 && inner.y0 >= outer.y0 && inner.x1 <= outer.x1 && inner.y1 <= outer.y1
}

/// Union of a set of rects, `None` when empty.
pub fn union_rects(rects: impl IntoIterator<Item = Rect>) -> Option<Rect> {
    rects.into_iter().reduce(|acc, r| acc.union(r))
}

/// Squared distance from a point to the segment `a`-`b`.
/// A zero-length segment degrades to the point distance.
pub fn point_segment_distance_sq(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot2();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    (pv - seg * t).hypot2()
}

/// Squared distance from a point to a polyline.
pub fn point_polyline_distance_sq(point: Point, points: &[Point]) -> f64 {
    match points {
        [] => f64::INFINITY,
        [only] => (point - *only).hypot2(),
        _ => points
            .windows(2)
            .map(|w| point_segment_distance_sq(point, w[0], w[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Even-odd point in polygon test.
pub fn point_in_polygon(point: Point, polygon: &[Point]) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (pi, pj) = (polygon[i], polygon[j]);
        if (pi.y > point.y) != (pj.y > point.y)
            && point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Edges of a local box: `(x0, x1, y0, y1)` centered on the original center.
type Extents = (f64, f64, f64, f64);

fn local_extents(
    local: Point,
    size: Size,
    direction: ResizeDirection,
    constraints: ResizeConstraints,
    allow_cross: bool,
) -> Extents {
    let half_w = size.width / 2.0;
    let half_h = size.height / 2.0;

    let (mut x0, mut x1, mut fixed_low_x) = (-half_w, half_w, true);
    if direction.moves_left() {
        (x0, x1, fixed_low_x) = span(half_w, local.x, constraints.min_width, allow_cross, true);
    } else if direction.moves_right() {
        (x0, x1, fixed_low_x) = span(-half_w, local.x, constraints.min_width, allow_cross, false);
    }

    let (mut y0, mut y1, mut fixed_low_y) = (-half_h, half_h, true);
    if direction.moves_top() {
        (y0, y1, fixed_low_y) = span(half_h, local.y, constraints.min_height, allow_cross, true);
    } else if direction.moves_bottom() {
        (y0, y1, fixed_low_y) = span(-half_h, local.y, constraints.min_height, allow_cross, false);
    }

    if constraints.keep_aspect
        && direction.is_corner()
        && size.width > f64::EPSILON
        && size.height > f64::EPSILON
    {
        let scale = ((x1 - x0) / size.width)
            .max((y1 - y0) / size.height)
            .max(constraints.min_width / size.width)
            .max(constraints.min_height / size.height);
        let (w, h) = (size.width * scale, size.height * scale);
        if fixed_low_x { x1 = x0 + w } else { x0 = x1 - w }
        if fixed_low_y { y1 = y0 + h } else { y0 = y1 - h }
    }

    (x0, x1, y0, y1)
}

/// Interval spanned by a fixed edge and a moving edge, honoring `min`.
/// `moving_is_low` says which side the moving edge starts on.
/// The third value is true when the fixed edge is the low end.
fn span(fixed: f64, moving: f64, min: f64, allow_cross: bool, moving_is_low: bool) -> (f64, f64, bool) {
    let crossed = allow_cross && if moving_is_low { moving > fixed } else { moving < fixed };
    if moving_is_low != crossed {
        (moving.min(fixed - min), fixed, false)
    } else {
        (fixed, moving.max(fixed + min), true)
    }
}

fn extents_to_world((x0, x1, y0, y1): Extents, center: Point, rotation: f64) -> Rect {
    let local_center = Vec2::new((x0 + x1) / 2.0, (y0 + y1) / 2.0);
    let world_center = center + rotate_vec(local_center, rotation);
    Rect::from_center_size(world_center, Size::new(x1 - x0, y1 - y0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    const EPS: f64 = 1e-9;

    fn assert_rect(actual: Rect, expected: Rect) {
        assert!(
            (actual.x0 - expected.x0).abs() < 1e-6
                && (actual.y0 - expected.y0).abs() < 1e-6
                && (actual.x1 - expected.x1).abs() < 1e-6
                && (actual.y1 - expected.y1).abs() < 1e-6,
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[test]
    fn test_center_always_draggable() {
        let rect = Rect::new(10.0, 20.0, 130.0, 60.0);
        for step in 0..64 {
            let angle = step as f64 * TAU / 64.0;
            assert!(is_draggable(rect.center(), rect, angle));
            assert!(!is_draggable(Point::new(1000.0, -1000.0), rect, angle));
        }
    }

    #[test]
    fn test_draggable_respects_rotation() {
        let rect = Rect::new(0.0, 0.0, 200.0, 20.0);
        // Along the long axis when unrotated.
        assert!(is_draggable(Point::new(190.0, 10.0), rect, 0.0));
        // Rotated a quarter turn, the same point falls outside.
        assert!(!is_draggable(Point::new(190.0, 10.0), rect, PI / 2.0));
        assert!(is_draggable(Point::new(100.0, 100.0), rect, PI / 2.0));
    }

    #[test]
    fn test_resize_direction_corners_win() {
        let rect = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert_eq!(resize_direction(Point::new(2.0, 3.0), rect, 8.0), Some(ResizeDirection::TopLeft));
        assert_eq!(resize_direction(Point::new(99.0, -4.0), rect, 8.0), Some(ResizeDirection::TopRight));
        assert_eq!(resize_direction(Point::new(-5.0, 104.0), rect, 8.0), Some(ResizeDirection::BottomLeft));
        assert_eq!(resize_direction(Point::new(105.0, 95.0), rect, 8.0), Some(ResizeDirection::BottomRight));
        assert_eq!(resize_direction(Point::new(50.0, 1.0), rect, 8.0), Some(ResizeDirection::Top));
        assert_eq!(resize_direction(Point::new(50.0, 99.0), rect, 8.0), Some(ResizeDirection::Bottom));
        assert_eq!(resize_direction(Point::new(-3.0, 50.0), rect, 8.0), Some(ResizeDirection::Left));
        assert_eq!(resize_direction(Point::new(103.0, 50.0), rect, 8.0), Some(ResizeDirection::Right));
        assert_eq!(resize_direction(Point::new(50.0, 50.0), rect, 8.0), None);
        assert_eq!(resize_direction(Point::new(150.0, 50.0), rect, 8.0), None);
    }

    #[test]
    fn test_resize_direction_rotated_uses_local_frame() {
        let rect = Rect::new(0.0, 0.0, 100.0, 100.0);
        // After a half turn the world top-left corner is the local bottom-right handle.
        assert_eq!(
            resize_direction_rotated(Point::new(0.0, 0.0), rect, PI, 8.0),
            Some(ResizeDirection::BottomRight)
        );
    }

    #[test]
    fn test_rotation_ring_outside_handles() {
        let rect = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert!(is_rotatable(Point::new(-15.0, -15.0), rect, 0.0, 8.0, 16.0));
        assert!(!is_rotatable(Point::new(50.0, 50.0), rect, 0.0, 8.0, 16.0));
        assert!(!is_rotatable(Point::new(2.0, 2.0), rect, 0.0, 8.0, 16.0));
        assert!(!is_rotatable(Point::new(-40.0, -40.0), rect, 0.0, 8.0, 16.0));
    }

    #[test]
    fn test_resize_bottom_right_unrotated() {
        let old = Rect::new(0.0, 0.0, 100.0, 100.0);
        let result = resize_with_rotation(
            Point::new(150.0, 120.0),
            old,
            ResizeDirection::BottomRight,
            0.0,
            ResizeConstraints::new(20.0, 20.0),
        );
        assert_rect(result, Rect::new(0.0, 0.0, 150.0, 120.0));
    }

    #[test]
    fn test_resize_bottom_right_half_turn_moves_center_by_rotated_delta() {
        let old = Rect::new(0.0, 0.0, 100.0, 100.0);
        // With a half turn the local bottom-right handle sits at world (0, 0).
        let result = resize_with_rotation(
            Point::new(-50.0, -20.0),
            old,
            ResizeDirection::BottomRight,
            PI,
            ResizeConstraints::new(20.0, 20.0),
        );
        assert!((result.width() - 150.0).abs() < 1e-6);
        assert!((result.height() - 120.0).abs() < 1e-6);
        // Local center moved by (+25, +10); rotated by π that is (-25, -10).
        assert!((result.center().x - 25.0).abs() < 1e-6);
        assert!((result.center().y - 40.0).abs() < 1e-6);
    }

    #[test]
    fn test_resize_never_below_floor() {
        let old = Rect::new(0.0, 0.0, 100.0, 100.0);
        for direction in ResizeDirection::ALL {
            for angle in [0.0, 0.7, PI, 4.0] {
                let result = resize_with_rotation(
                    Point::new(-5000.0, 7000.0),
                    old,
                    direction,
                    angle,
                    ResizeConstraints::new(20.0, 10.0),
                );
                assert!(result.width() >= 20.0 - EPS);
                assert!(result.height() >= 10.0 - EPS);

                let flipped = resize_with_rotation_and_flip(
                    Point::new(5000.0, -7000.0),
                    old,
                    direction,
                    angle,
                    false,
                    false,
                    ResizeConstraints::new(20.0, 10.0),
                );
                assert!(flipped.rect.width() >= 20.0 - EPS);
                assert!(flipped.rect.height() >= 10.0 - EPS);
            }
        }
    }

    #[test]
    fn test_resize_clamps_when_crossing() {
        let old = Rect::new(0.0, 0.0, 100.0, 100.0);
        let result = resize_with_rotation(
            Point::new(-80.0, 50.0),
            old,
            ResizeDirection::Right,
            0.0,
            ResizeConstraints::new(20.0, 20.0),
        );
        assert_rect(result, Rect::new(0.0, 0.0, 20.0, 100.0));
    }

    #[test]
    fn test_flip_when_crossing_opposite_edge() {
        let old = Rect::new(0.0, 0.0, 100.0, 100.0);
        let result = resize_with_rotation_and_flip(
            Point::new(-60.0, 50.0),
            old,
            ResizeDirection::Right,
            0.0,
            false,
            false,
            ResizeConstraints::new(10.0, 10.0),
        );
        assert!(result.flip_x);
        assert!(!result.flip_y);
        assert_rect(result.rect, Rect::new(-60.0, 0.0, 0.0, 100.0));

        // Crossing again relative to an already flipped shape flips back.
        let again = resize_with_rotation_and_flip(
            Point::new(-60.0, 50.0),
            old,
            ResizeDirection::Right,
            0.0,
            true,
            false,
            ResizeConstraints::new(10.0, 10.0),
        );
        assert!(!again.flip_x);
    }

    #[test]
    fn test_flip_top_left_both_axes() {
        let old = Rect::new(0.0, 0.0, 100.0, 100.0);
        let result = resize_with_rotation_and_flip(
            Point::new(130.0, 140.0),
            old,
            ResizeDirection::TopLeft,
            0.0,
            false,
            false,
            ResizeConstraints::new(10.0, 10.0),
        );
        assert!(result.flip_x && result.flip_y);
        assert_rect(result.rect, Rect::new(100.0, 100.0, 130.0, 140.0));
    }

    #[test]
    fn test_keep_aspect_on_corner() {
        let old = Rect::new(0.0, 0.0, 100.0, 50.0);
        let result = resize_with_rotation(
            Point::new(300.0, 60.0),
            old,
            ResizeDirection::BottomRight,
            0.0,
            ResizeConstraints::new(20.0, 20.0).with_aspect(true),
        );
        assert_rect(result, Rect::new(0.0, 0.0, 300.0, 150.0));
    }

    #[test]
    fn test_resize_cursor_follows_rotation() {
        assert_eq!(resize_cursor(ResizeDirection::Top, 0.0), CursorIcon::NsResize);
        assert_eq!(resize_cursor(ResizeDirection::Top, PI / 2.0), CursorIcon::EwResize);
        assert_eq!(resize_cursor(ResizeDirection::Top, PI / 4.0), CursorIcon::NeswResize);
        assert_eq!(resize_cursor(ResizeDirection::TopLeft, 0.0), CursorIcon::NwseResize);
        assert_eq!(resize_cursor(ResizeDirection::Right, -PI / 2.0), CursorIcon::NsResize);
    }

    #[test]
    fn test_segment_distance_degenerate() {
        let p = Point::new(3.0, 4.0);
        assert!((point_segment_distance_sq(p, Point::ZERO, Point::ZERO) - 25.0).abs() < EPS);
        assert!((point_segment_distance_sq(p, Point::new(0.0, 0.0), Point::new(10.0, 0.0)) - 16.0).abs() < EPS);
    }

    #[test]
    fn test_normalize_angle() {
        assert!((normalize_angle(-PI / 2.0) - 3.0 * PI / 2.0).abs() < EPS);
        assert!((normalize_angle(5.0 * PI) - PI).abs() < 1e-9);
        assert_eq!(normalize_angle(f64::NAN), 0.0);
    }

    #[test]
    fn test_map_rect() {
        let from = Rect::new(0.0, 0.0, 100.0, 100.0);
        let to = Rect::new(0.0, 0.0, 200.0, 50.0);
        assert_rect(map_rect(Rect::new(50.0, 50.0, 100.0, 100.0), from, to), Rect::new(100.0, 25.0, 200.0, 50.0));
    }

    #[test]
    fn test_point_in_polygon() {
        let tri = [Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(0.0, 10.0)];
        assert!(point_in_polygon(Point::new(2.0, 2.0), &tri));
        assert!(!point_in_polygon(Point::new(8.0, 8.0), &tri));
    }
}
