//! Alignment snapping against other shapes' edges and centers.

use crate::config::EditorConfig;
use crate::geometry::ResizeDirection;
use crate::shapes::{Shape, ShapeId};
use crate::store::ShapeStore;
use kurbo::{Point, Rect, Vec2};

/// Which coordinate a guide constrains. `X` guides are vertical lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
}

/// One of the three alignment lines of a box on an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlignLine {
    /// Left or top edge.
    Start,
    /// Horizontal or vertical center.
    Middle,
    /// Right or bottom edge.
    End,
}

impl AlignLine {
    const ALL: [AlignLine; 3] = [AlignLine::Start, AlignLine::Middle, AlignLine::End];

    fn index(self) -> usize {
        match self {
            AlignLine::Start => 0,
            AlignLine::Middle => 1,
            AlignLine::End => 2,
        }
    }

    fn of(self, rect: Rect, axis: Axis) -> f64 {
        match (axis, self) {
            (Axis::X, AlignLine::Start) => rect.x0,
            (Axis::X, AlignLine::Middle) => rect.center().x,
            (Axis::X, AlignLine::End) => rect.x1,
            (Axis::Y, AlignLine::Start) => rect.y0,
            (Axis::Y, AlignLine::Middle) => rect.center().y,
            (Axis::Y, AlignLine::End) => rect.y1,
        }
    }
}

/// Which of the mover's lines are allowed to snap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapLines {
    pub x: [bool; 3],
    pub y: [bool; 3],
}

impl SnapLines {
    pub const ALL: SnapLines = SnapLines {
        x: [true; 3],
        y: [true; 3],
    };

    /// Only the edges a resize handle moves.
    pub fn for_resize(direction: ResizeDirection) -> Self {
        Self {
            x: [direction.moves_left(), false, direction.moves_right()],
            y: [direction.moves_top(), false, direction.moves_bottom()],
        }
    }

    fn allows(&self, axis: Axis, line: AlignLine) -> bool {
        match axis {
            Axis::X => self.x[line.index()],
            Axis::Y => self.y[line.index()],
        }
    }
}

/// Thresholds for the alignment engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapSettings {
    pub tolerance: f64,
    pub dead_zone: f64,
    pub dedup_distance: f64,
    pub max_guides: usize,
}

impl Default for SnapSettings {
    fn default() -> Self {
        Self::from(&EditorConfig::default())
    }
}

impl From<&EditorConfig> for SnapSettings {
    fn from(config: &EditorConfig) -> Self {
        Self {
            tolerance: config.snap_tolerance,
            dead_zone: config.snap_dead_zone,
            dedup_distance: config.guide_dedup_distance,
            max_guides: config.max_guides_per_axis,
        }
    }
}

/// A potential alignment between one mover line and one target line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapCandidate {
    pub axis: Axis,
    pub line: AlignLine,
    pub target: ShapeId,
    /// Coordinate of the target line.
    pub position: f64,
    /// Offset that moves the mover line onto the target line.
    pub delta: f64,
    target_bounds: Rect,
}

impl SnapCandidate {
    pub fn distance(&self) -> f64 {
        self.delta.abs()
    }
}

/// A visual alignment guide, in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuideLine {
    pub axis: Axis,
    pub position: f64,
    pub start: f64,
    pub end: f64,
}

impl GuideLine {
    pub fn endpoints(&self) -> (Point, Point) {
        match self.axis {
            Axis::X => (Point::new(self.position, self.start), Point::new(self.position, self.end)),
            Axis::Y => (Point::new(self.start, self.position), Point::new(self.end, self.position)),
        }
    }
}

/// Result of aligning a mover.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapOutcome {
    pub offset: Vec2,
    pub snapped_x: Option<AlignLine>,
    pub snapped_y: Option<AlignLine>,
    pub guides: Vec<GuideLine>,
}

impl SnapOutcome {
    pub fn is_snapped(&self) -> bool {
        self.snapped_x.is_some() || self.snapped_y.is_some()
    }
}

/// Collect alignment candidates for `mover` against every other shape.
///
/// Skips the mover, ids in `exclude`, shapes connected to the mover, and
/// selection shapes. The result is stably sorted by distance, so ties keep
/// store order and then mover line order.
pub fn candidates(
    store: &ShapeStore,
    mover: &Shape,
    exclude: &[ShapeId],
    lines: SnapLines,
    tolerance: f64,
) -> (Vec<SnapCandidate>, Vec<SnapCandidate>) {
    let connected = mover.connections.targets();
    let bounds = mover.bounds();
    let mut xs = Vec::new();
    let mut ys = Vec::new();

    for other in store.iter() {
        let id = other.id();
        if id == mover.id() || other.is_selection() || exclude.contains(&id) || connected.contains(&id) {
            continue;
        }
        let target_bounds = other.bounds();
        for (axis, out) in [(Axis::X, &mut xs), (Axis::Y, &mut ys)] {
            for line in AlignLine::ALL {
                if !lines.allows(axis, line) {
                    continue;
                }
                let from = line.of(bounds, axis);
                for target_line in AlignLine::ALL {
                    let position = target_line.of(target_bounds, axis);
                    let delta = position - from;
                    if delta.abs() <= tolerance {
                        out.push(SnapCandidate {
                            axis,
                            line,
                            target: id,
                            position,
                            delta,
                            target_bounds,
                        });
                    }
                }
            }
        }
    }

    xs.sort_by(|a, b| a.distance().total_cmp(&b.distance()));
    ys.sort_by(|a, b| a.distance().total_cmp(&b.distance()));
    (xs, ys)
}

/// Compute the snap offset and guides for `mover`.
pub fn align(
    store: &ShapeStore,
    mover: &Shape,
    exclude: &[ShapeId],
    lines: SnapLines,
    settings: &SnapSettings,
) -> SnapOutcome {
    let (xs, ys) = candidates(store, mover, exclude, lines, settings.tolerance);

    let pick = |list: &[SnapCandidate]| {
        list.first()
            .filter(|c| c.distance() > settings.dead_zone)
            .map(|c| (c.delta, c.line))
    };
    let snap_x = pick(&xs);
    let snap_y = pick(&ys);
    let offset = Vec2::new(
        snap_x.map_or(0.0, |(d, _)| d),
        snap_y.map_or(0.0, |(d, _)| d),
    );

    let moved = mover.bounds() + offset;
    let mut guides = collect_guides(&xs, offset.x, moved, settings);
    guides.extend(collect_guides(&ys, offset.y, moved, settings));

    SnapOutcome {
        offset,
        snapped_x: snap_x.map(|(_, line)| line),
        snapped_y: snap_y.map(|(_, line)| line),
        guides,
    }
}

fn collect_guides(
    sorted: &[SnapCandidate],
    applied: f64,
    moved: Rect,
    settings: &SnapSettings,
) -> Vec<GuideLine> {
    let mut guides: Vec<GuideLine> = Vec::new();
    for candidate in sorted {
        if guides.len() >= settings.max_guides {
            break;
        }
        // Only lines that are aligned once the offset is applied.
        if (candidate.delta - applied).abs() > settings.dead_zone {
            continue;
        }
        if guides
            .iter()
            .any(|g| (g.position - candidate.position).abs() < settings.dedup_distance)
        {
            continue;
        }
        let (start, end) = match candidate.axis {
            Axis::X => (
                moved.y0.min(candidate.target_bounds.y0),
                moved.y1.max(candidate.target_bounds.y1),
            ),
            Axis::Y => (
                moved.x0.min(candidate.target_bounds.x0),
                moved.x1.max(candidate.target_bounds.x1),
            ),
        };
        guides.push(GuideLine {
            axis: candidate.axis,
            position: candidate.position,
            start,
            end,
        });
    }
    guides
}

/// Move the edges a resize handle controls by the snap offset. Only
/// unrotated shapes are adjusted; the size floor is kept.
pub fn apply_resize_snap(shape: &mut Shape, direction: ResizeDirection, outcome: &SnapOutcome) {
    if shape.rotation().abs() > 1e-9 || !outcome.is_snapped() {
        return;
    }
    let min = shape.min_size();
    let mut rect = shape.rect();
    match outcome.snapped_x {
        Some(AlignLine::Start) if direction.moves_left() => rect.x0 += outcome.offset.x,
        Some(AlignLine::End) if direction.moves_right() => rect.x1 += outcome.offset.x,
        _ => {}
    }
    match outcome.snapped_y {
        Some(AlignLine::Start) if direction.moves_top() => rect.y0 += outcome.offset.y,
        Some(AlignLine::End) if direction.moves_bottom() => rect.y1 += outcome.offset.y,
        _ => {}
    }
    if rect.width() >= min.width && rect.height() >= min.height {
        shape.frame.set_rect(rect);
    }
}

/// Snap an angle (radians) to the nearest multiple of `increment`.
pub fn snap_angle(angle: f64, increment: f64) -> f64 {
    if increment <= 0.0 {
        return angle;
    }
    (angle / increment).round() * increment
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn rect(x: f64, y: f64, w: f64, h: f64) -> Shape {
        Shape::rectangle(Rect::new(x, y, x + w, y + h))
    }

    #[test]
    fn test_snaps_left_edge_within_tolerance() {
        let mut store = ShapeStore::new();
        store.insert(rect(100.0, 300.0, 50.0, 50.0));
        let mover = rect(103.0, 0.0, 30.0, 30.0);

        let outcome = align(&store, &mover, &[], SnapLines::ALL, &SnapSettings::default());
        assert!((outcome.offset.x + 3.0).abs() < 1e-9);
        assert_eq!(outcome.snapped_x, Some(AlignLine::Start));
        assert!(outcome.offset.y.abs() < f64::EPSILON);
        assert_eq!(outcome.guides.len(), 1);
        assert_eq!(outcome.guides[0].axis, Axis::X);
        assert!((outcome.guides[0].start - 0.0).abs() < 1e-9);
        assert!((outcome.guides[0].end - 350.0).abs() < 1e-9);
    }

    #[test]
    fn test_dead_zone_suppresses_tiny_offsets() {
        let mut store = ShapeStore::new();
        store.insert(rect(100.0, 300.0, 50.0, 50.0));
        let mover = rect(100.3, 0.0, 30.0, 30.0);

        let outcome = align(&store, &mover, &[], SnapLines::ALL, &SnapSettings::default());
        assert!(outcome.offset.x.abs() < f64::EPSILON);
        assert!(outcome.snapped_x.is_none());
        // Still aligned, so the guide is shown.
        assert_eq!(outcome.guides.len(), 1);
    }

    #[test]
    fn test_applying_offset_is_idempotent() {
        let mut store = ShapeStore::new();
        store.insert(rect(100.0, 100.0, 50.0, 50.0));
        store.insert(rect(300.0, 204.0, 80.0, 20.0));
        let mut mover = rect(152.0, 197.0, 40.0, 40.0);

        let settings = SnapSettings::default();
        let first = align(&store, &mover, &[], SnapLines::ALL, &settings);
        assert!(first.is_snapped());
        mover.translate(first.offset);
        let second = align(&store, &mover, &[], SnapLines::ALL, &settings);
        assert_eq!(second.offset, Vec2::ZERO);
    }

    #[test]
    fn test_guides_capped_and_deduplicated() {
        let mut store = ShapeStore::new();
        // Five shapes sharing the same left edge plus one 1px away.
        for i in 0..5 {
            store.insert(rect(100.0, 100.0 * i as f64 + 200.0, 30.0, 30.0));
        }
        store.insert(rect(101.0, 900.0, 30.0, 30.0));
        let mover = rect(100.0, 0.0, 30.0, 30.0);

        let outcome = align(&store, &mover, &[], SnapLines::ALL, &SnapSettings::default());
        let x_guides: Vec<_> = outcome.guides.iter().filter(|g| g.axis == Axis::X).collect();
        assert!(x_guides.len() <= 3);
        for (i, a) in x_guides.iter().enumerate() {
            for b in &x_guides[i + 1..] {
                assert!((a.position - b.position).abs() >= 2.0);
            }
        }
    }

    #[test]
    fn test_excludes_connected_and_listed() {
        let mut store = ShapeStore::new();
        let a = store.insert(rect(100.0, 300.0, 50.0, 50.0));
        let mover = rect(103.0, 0.0, 30.0, 30.0);
        let outcome = align(&store, &mover, &[a], SnapLines::ALL, &SnapSettings::default());
        assert!(!outcome.is_snapped());
        assert!(outcome.guides.is_empty());
    }

    #[test]
    fn test_resize_snap_moves_only_handle_edge() {
        let mut store = ShapeStore::new();
        store.insert(rect(200.0, 300.0, 50.0, 50.0));
        let mut shape = rect(100.0, 0.0, 97.0, 40.0);
        let direction = ResizeDirection::Right;

        let outcome = align(&store, &shape, &[], SnapLines::for_resize(direction), &SnapSettings::default());
        apply_resize_snap(&mut shape, direction, &outcome);
        assert_eq!(shape.rect(), Rect::new(100.0, 0.0, 200.0, 40.0));
    }

    #[test]
    fn test_resize_snap_skips_rotated() {
        let mut shape = rect(100.0, 0.0, 97.0, 40.0);
        shape.set_rotation(PI / 6.0);
        let before = shape.rect();
        let outcome = SnapOutcome {
            offset: Vec2::new(3.0, 0.0),
            snapped_x: Some(AlignLine::End),
            ..SnapOutcome::default()
        };
        apply_resize_snap(&mut shape, ResizeDirection::Right, &outcome);
        assert_eq!(shape.rect(), before);
    }

    #[test]
    fn test_snap_angle() {
        let step = 15f64.to_radians();
        assert!((snap_angle(0.27, step) - step).abs() < 1e-9);
        assert!((snap_angle(PI - 0.01, step) - PI).abs() < 1e-9);
    }
}
