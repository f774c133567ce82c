//! Shape definitions for the scene.

mod ellipse;
mod group;
mod icon;
mod image;
mod line;
mod path;
mod rectangle;
mod text;

pub use ellipse::Ellipse;
pub use group::{ActiveSelection, Group};
pub use icon::Icon;
pub use image::{Image, ImageFormat, ImageLoadError, ImageSource, ImageUpload};
pub use line::Line;
pub use path::{PathShape, PathType};
pub use rectangle::Rectangle;
pub use text::{Caption, FontWeight, TextAlign, TextBlock, TextLayout};

use crate::connection::{Anchor, ConnectionEvent, ConnectionSet};
use crate::geometry::{
    self, ResizeConstraints, ResizeDirection, calc_point_with_rotation, local_to_world,
    normalize_angle, rotated_bounds,
};
use kurbo::{Affine, BezPath, Point, Rect, Size, Vec2};
use peniko::Color;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for shapes.
pub type ShapeId = Uuid;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Style properties for shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeStyle {
    pub stroke_color: SerializableColor,
    pub stroke_width: f64,
    /// Fill color (None = no fill).
    #[serde(default)]
    pub fill_color: Option<SerializableColor>,
    /// Dash lengths, empty for a solid stroke.
    #[serde(default)]
    pub dash: Vec<f64>,
    /// Overall opacity (0.0 = fully transparent, 1.0 = fully opaque).
    #[serde(default = "default_opacity")]
    pub opacity: f64,
}

fn default_opacity() -> f64 {
    1.0
}

impl ShapeStyle {
    /// Get the stroke color with opacity applied.
    pub fn stroke_with_opacity(&self) -> Color {
        with_opacity(self.stroke_color, self.opacity)
    }

    /// Get the fill color with opacity applied.
    pub fn fill_with_opacity(&self) -> Option<Color> {
        self.fill_color.map(|c| with_opacity(c, self.opacity))
    }

    pub fn set_stroke(&mut self, color: Color) {
        self.stroke_color = color.into();
    }

    pub fn set_fill(&mut self, color: Option<Color>) {
        self.fill_color = color.map(|c| c.into());
    }
}

fn with_opacity(color: SerializableColor, opacity: f64) -> Color {
    let alpha = (color.a as f64 * opacity.clamp(0.0, 1.0)) as u8;
    Color::from_rgba8(color.r, color.g, color.b, alpha)
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            stroke_color: SerializableColor::black(),
            stroke_width: 2.0,
            fill_color: None,
            dash: Vec::new(),
            opacity: 1.0,
        }
    }
}

/// Kind-specific behavior. Local coordinates are centered on the frame
/// center, before rotation and flips are applied.
pub trait ShapeBehavior {
    /// Smallest width and height a resize may produce.
    fn min_size(&self) -> Size;

    /// Outline in the local frame for a frame of `size`.
    fn local_path(&self, size: Size) -> BezPath;

    /// Whether a local point hits the shape.
    fn hit_local(&self, local: Point, size: Size, tolerance: f64) -> bool {
        Rect::from_center_size(Point::ZERO, size)
            .inflate(tolerance, tolerance)
            .contains(local)
    }

    fn supports_rotation(&self) -> bool {
        true
    }

    /// Whether crossing an edge during resize mirrors the shape.
    fn supports_flip(&self) -> bool {
        false
    }

    fn supports_caption(&self) -> bool {
        true
    }

    /// Corner resizes keep the aspect ratio without a modifier.
    fn keeps_aspect(&self) -> bool {
        false
    }
}

/// Position, size, rotation and mirroring shared by every kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    /// Radians, clockwise, about the frame center.
    #[serde(default)]
    pub rotate: f64,
    #[serde(default)]
    pub flip_x: bool,
    #[serde(default)]
    pub flip_y: bool,
}

impl Frame {
    pub fn from_rect(rect: Rect) -> Self {
        let rect = rect.abs();
        Self {
            left: rect.x0,
            top: rect.y0,
            width: rect.width(),
            height: rect.height(),
            rotate: 0.0,
            flip_x: false,
            flip_y: false,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.left, self.top, self.left + self.width, self.top + self.height)
    }

    pub fn set_rect(&mut self, rect: Rect) {
        let rect = rect.abs();
        self.left = rect.x0;
        self.top = rect.y0;
        self.width = rect.width();
        self.height = rect.height();
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn center(&self) -> Point {
        Point::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.left += delta.x;
        self.top += delta.y;
    }

    /// Axis-aligned world bounds including rotation.
    pub fn bounds(&self) -> Rect {
        rotated_bounds(self.rect(), self.rotate)
    }

    /// Local-to-world transform including rotation and flips.
    pub fn transform(&self) -> Affine {
        let sx = if self.flip_x { -1.0 } else { 1.0 };
        let sy = if self.flip_y { -1.0 } else { 1.0 };
        Affine::translate(self.center().to_vec2())
            * Affine::rotate(self.rotate)
            * Affine::scale_non_uniform(sx, sy)
    }
}

/// Kind-specific data. Serialized inline with a `type` discriminator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ShapeKind {
    Rectangle(Rectangle),
    Ellipse(Ellipse),
    Path(PathShape),
    Line(Line),
    Text(TextBlock),
    Image(Image),
    Icon(Icon),
    Group(Group),
    Selection(ActiveSelection),
}

impl ShapeKind {
    pub fn behavior(&self) -> &dyn ShapeBehavior {
        match self {
            ShapeKind::Rectangle(k) => k,
            ShapeKind::Ellipse(k) => k,
            ShapeKind::Path(k) => k,
            ShapeKind::Line(k) => k,
            ShapeKind::Text(k) => k,
            ShapeKind::Image(k) => k,
            ShapeKind::Icon(k) => k,
            ShapeKind::Group(k) => k,
            ShapeKind::Selection(k) => k,
        }
    }

    /// The `type` discriminator used in snapshots.
    pub fn name(&self) -> &'static str {
        match self {
            ShapeKind::Rectangle(_) => "rectangle",
            ShapeKind::Ellipse(_) => "ellipse",
            ShapeKind::Path(_) => "path",
            ShapeKind::Line(_) => "line",
            ShapeKind::Text(_) => "text",
            ShapeKind::Image(_) => "image",
            ShapeKind::Icon(_) => "icon",
            ShapeKind::Group(_) => "group",
            ShapeKind::Selection(_) => "selection",
        }
    }
}

/// Typed property edits issued by an options panel.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Position(Point),
    Size(Size),
    Rotation(f64),
    Style(ShapeStyle),
    Caption(Option<Caption>),
    CornerRadius(f64),
    Arrows { start: bool, end: bool },
}

/// A shape in the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub(crate) id: ShapeId,
    #[serde(flatten)]
    pub frame: Frame,
    #[serde(flatten)]
    pub style: ShapeStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<Caption>,
    #[serde(default, skip_serializing_if = "ConnectionSet::is_empty")]
    pub connections: ConnectionSet,
    #[serde(flatten)]
    pub kind: ShapeKind,
}

impl Shape {
    /// Create a shape of `kind` occupying `rect`, grown to the kind's minimum.
    pub fn new(kind: ShapeKind, rect: Rect) -> Self {
        let mut shape = Self {
            id: Uuid::new_v4(),
            frame: Frame::from_rect(rect),
            style: ShapeStyle::default(),
            caption: None,
            connections: ConnectionSet::default(),
            kind,
        };
        shape.enforce_min_size();
        shape
    }

    pub fn rectangle(rect: Rect) -> Self {
        Self::new(ShapeKind::Rectangle(Rectangle::new()), rect)
    }

    pub fn ellipse(rect: Rect) -> Self {
        Self::new(ShapeKind::Ellipse(Ellipse::new()), rect)
    }

    pub fn polygon(rect: Rect, points: Vec<Point>) -> Self {
        Self::new(ShapeKind::Path(PathShape::polygon(points)), rect)
    }

    /// Freehand stroke from world points.
    pub fn freehand(points: &[Point]) -> Self {
        let min = Size::new(10.0, 10.0);
        let (path, frame) = PathShape::freehand_from_world(points, min);
        Self::new(ShapeKind::Path(path), frame)
    }

    pub fn line(start: Point, end: Point) -> Self {
        Self::line_from_points(vec![start, end])
    }

    pub fn line_from_points(points: Vec<Point>) -> Self {
        let line = Line::from_points(points);
        let rect = line.bounds();
        Self::new(ShapeKind::Line(line), rect)
    }

    /// A left-aligned text block with its top-left corner at `origin`.
    pub fn text(origin: Point, content: impl Into<String>) -> Self {
        let block = TextBlock::default();
        let caption = Caption::new(content).with_align(TextAlign::Left);
        let height = block.fit_height(&caption, TextBlock::DEFAULT_WIDTH);
        let rect = Rect::from_origin_size(origin, Size::new(TextBlock::DEFAULT_WIDTH, height));
        let mut shape = Self::new(ShapeKind::Text(block), rect);
        shape.caption = Some(caption);
        shape
    }

    pub fn image(rect: Rect, image: Image) -> Self {
        Self::new(ShapeKind::Image(image), rect)
    }

    pub fn icon(rect: Rect, icon: Icon) -> Self {
        Self::new(ShapeKind::Icon(icon), rect)
    }

    pub fn group(children: Vec<Shape>) -> Self {
        let group = Group::new(children);
        let rect = group.bounds().unwrap_or(Rect::ZERO);
        Self::new(ShapeKind::Group(group), rect)
    }

    pub fn selection(members: Vec<ShapeId>, rect: Rect) -> Self {
        let mut shape = Self::new(ShapeKind::Selection(ActiveSelection::new(members)), rect);
        // A marquee starts as a point; it is not clamped like real shapes.
        shape.frame.set_rect(rect);
        shape
    }

    pub fn with_style(mut self, style: ShapeStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_caption(mut self, caption: Caption) -> Self {
        if self.supports_caption() {
            self.caption = Some(caption);
            self.reflow_text();
        }
        self
    }

    pub fn id(&self) -> ShapeId {
        self.id
    }

    /// Assign fresh ids to this shape and any group children.
    pub fn regenerate_id(&mut self) {
        self.id = Uuid::new_v4();
        if let ShapeKind::Group(group) = &mut self.kind {
            for child in &mut group.children {
                child.regenerate_id();
            }
        }
    }

    pub fn kind_name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn behavior(&self) -> &dyn ShapeBehavior {
        self.kind.behavior()
    }

    pub fn is_selection(&self) -> bool {
        matches!(self.kind, ShapeKind::Selection(_))
    }

    pub fn is_line(&self) -> bool {
        matches!(self.kind, ShapeKind::Line(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, ShapeKind::Text(_))
    }

    pub fn as_line(&self) -> Option<&Line> {
        match &self.kind {
            ShapeKind::Line(line) => Some(line),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&Group> {
        match &self.kind {
            ShapeKind::Group(group) => Some(group),
            _ => None,
        }
    }

    pub fn as_selection(&self) -> Option<&ActiveSelection> {
        match &self.kind {
            ShapeKind::Selection(selection) => Some(selection),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&Image> {
        match &self.kind {
            ShapeKind::Image(image) => Some(image),
            _ => None,
        }
    }

    pub fn rect(&self) -> Rect {
        self.frame.rect()
    }

    pub fn center(&self) -> Point {
        self.frame.center()
    }

    pub fn rotation(&self) -> f64 {
        self.frame.rotate
    }

    /// World-space axis-aligned bounds.
    pub fn bounds(&self) -> Rect {
        self.frame.bounds()
    }

    pub fn min_size(&self) -> Size {
        self.behavior().min_size()
    }

    pub fn supports_rotation(&self) -> bool {
        self.behavior().supports_rotation()
    }

    pub fn supports_flip(&self) -> bool {
        self.behavior().supports_flip()
    }

    pub fn supports_caption(&self) -> bool {
        self.behavior().supports_caption()
    }

    pub fn keeps_aspect(&self) -> bool {
        self.behavior().keeps_aspect()
    }

    /// Outline in world coordinates.
    pub fn outline(&self) -> BezPath {
        self.frame.transform() * self.behavior().local_path(self.frame.size())
    }

    /// Whether `point` hits the shape's body (within `tolerance` plus half
    /// the stroke).
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let local = calc_point_with_rotation(point, self.center(), self.frame.rotate);
        let tolerance = tolerance + self.style.stroke_width / 2.0;
        self.behavior().hit_local(local, self.frame.size(), tolerance)
    }

    /// Whether `point` is inside the rotated frame.
    pub fn is_draggable(&self, point: Point) -> bool {
        geometry::is_draggable(point, self.rect(), self.frame.rotate)
    }

    /// Resize handle under `point`, if any.
    pub fn resize_handle(&self, point: Point, padding: f64) -> Option<ResizeDirection> {
        if self.is_line() {
            return None;
        }
        geometry::resize_direction_rotated(point, self.rect(), self.frame.rotate, padding)
    }

    pub fn is_rotate_zone(&self, point: Point, padding: f64, rotation_padding: f64) -> bool {
        self.supports_rotation()
            && geometry::is_rotatable(point, self.rect(), self.frame.rotate, padding, rotation_padding)
    }

    /// Index of a line point under `point`.
    pub fn line_handle(&self, point: Point, padding: f64) -> Option<usize> {
        self.as_line().and_then(|line| line.point_near(point, padding))
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.frame.translate(delta);
        match &mut self.kind {
            ShapeKind::Line(line) => line.translate(delta),
            ShapeKind::Group(group) => {
                for child in &mut group.children {
                    child.translate(delta);
                }
            }
            _ => {}
        }
    }

    /// Re-derive this shape from `original` with the `direction` handle
    /// dragged to `current`. Kinds that support flipping may cross edges.
    pub fn resize_from(
        &mut self,
        original: &Shape,
        current: Point,
        direction: ResizeDirection,
        keep_aspect: bool,
    ) {
        let old = original.rect();
        let constraints = ResizeConstraints::from_size(original.min_size())
            .with_aspect(keep_aspect || original.keeps_aspect());

        let new_rect = if original.supports_flip() {
            let result = geometry::resize_with_rotation_and_flip(
                current,
                old,
                direction,
                original.frame.rotate,
                original.frame.flip_x,
                original.frame.flip_y,
                constraints,
            );
            self.frame.flip_x = result.flip_x;
            self.frame.flip_y = result.flip_y;
            result.rect
        } else {
            geometry::resize_with_rotation(current, old, direction, original.frame.rotate, constraints)
        };
        self.frame.set_rect(new_rect);

        if let (ShapeKind::Group(group), ShapeKind::Group(source)) = (&mut self.kind, &original.kind) {
            group.children = source.children.clone();
            for child in &mut group.children {
                child.map_into(old, new_rect);
            }
        }
        self.reflow_text();
    }

    /// Scale this shape from the coordinate space `from` into `to`.
    pub fn map_into(&mut self, from: Rect, to: Rect) {
        match &mut self.kind {
            ShapeKind::Line(line) => {
                for point in &mut line.points {
                    *point = map_point(*point, from, to);
                }
                self.sync_frame();
                return;
            }
            ShapeKind::Group(group) => {
                for child in &mut group.children {
                    child.map_into(from, to);
                }
            }
            _ => {}
        }
        self.frame.set_rect(geometry::map_rect(self.rect(), from, to));
        self.enforce_min_size();
        self.reflow_text();
    }

    /// Set rotation (normalized). Ignored by kinds that cannot rotate.
    pub fn set_rotation(&mut self, angle: f64) -> bool {
        if !self.supports_rotation() {
            return false;
        }
        self.frame.rotate = normalize_angle(angle);
        true
    }

    /// Bake pending flips into point data where the kind stores points.
    /// Images and text keep the flags and mirror at draw time.
    pub fn commit_flip(&mut self) {
        let (flip_x, flip_y) = (self.frame.flip_x, self.frame.flip_y);
        if !flip_x && !flip_y {
            return;
        }
        match &mut self.kind {
            ShapeKind::Path(path) => path.bake_flip(flip_x, flip_y),
            ShapeKind::Icon(icon) => icon.bake_flip(flip_x, flip_y),
            _ => return,
        }
        self.frame.flip_x = false;
        self.frame.flip_y = false;
    }

    /// World position of fractional anchor `coords`.
    pub fn anchor_point(&self, coords: Point) -> Point {
        let local = Point::new(
            (coords.x - 0.5) * self.frame.width,
            (coords.y - 0.5) * self.frame.height,
        );
        local_to_world(local, self.center(), self.frame.rotate)
    }

    /// Closest named anchor within `tolerance` of `point`.
    pub fn anchor_near(&self, point: Point, tolerance: f64) -> Option<Anchor> {
        Anchor::ALL
            .into_iter()
            .map(|anchor| (anchor, (self.anchor_point(anchor.coords()) - point).hypot()))
            .filter(|(_, dist)| *dist <= tolerance)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(anchor, _)| anchor)
    }

    /// React to a connected peer moving. Only lines follow their peers.
    pub fn on_connection_event(&mut self, event: &ConnectionEvent) -> bool {
        let role = event.connection.role;
        if self.connections.find(event.source, role).is_none() {
            return false;
        }
        let ShapeKind::Line(line) = &mut self.kind else {
            return false;
        };
        let moved = line
            .index_of(role)
            .is_some_and(|index| line.set_point(index, event.new_point));
        if moved {
            self.sync_frame();
        }
        moved
    }

    /// Recompute derived frames: lines from their points, groups from children.
    pub fn sync_frame(&mut self) {
        let rect = match &self.kind {
            ShapeKind::Line(line) => line.bounds(),
            ShapeKind::Group(group) => match group.bounds() {
                Some(rect) => rect,
                None => return,
            },
            _ => return,
        };
        self.frame.set_rect(rect);
        self.frame.rotate = 0.0;
    }

    /// Grow text blocks so the caption fits.
    pub fn reflow_text(&mut self) {
        if let (ShapeKind::Text(block), Some(caption)) = (&self.kind, &self.caption) {
            let needed = block.fit_height(caption, self.frame.width);
            self.frame.height = needed.max(block.min_size().height);
        }
    }

    /// Apply an edit. Returns false when the kind does not support it.
    pub fn apply(&mut self, mutation: Mutation) -> bool {
        match mutation {
            Mutation::Position(position) => {
                let delta = position - Point::new(self.frame.left, self.frame.top);
                self.translate(delta);
            }
            Mutation::Size(size) => {
                if self.is_line() || self.is_selection() {
                    return false;
                }
                let old = self.rect();
                let new_rect = Rect::from_origin_size(old.origin(), size);
                if let ShapeKind::Group(group) = &mut self.kind {
                    for child in &mut group.children {
                        child.map_into(old, new_rect);
                    }
                }
                self.frame.set_rect(new_rect);
                self.enforce_min_size();
                self.reflow_text();
            }
            Mutation::Rotation(angle) => return self.set_rotation(angle),
            Mutation::Style(style) => self.style = style,
            Mutation::Caption(caption) => {
                if !self.supports_caption() {
                    return false;
                }
                self.caption = caption;
                self.reflow_text();
            }
            Mutation::CornerRadius(radius) => match &mut self.kind {
                ShapeKind::Rectangle(rect) => rect.corner_radius = radius.max(0.0),
                _ => return false,
            },
            Mutation::Arrows { start, end } => match &mut self.kind {
                ShapeKind::Line(line) => {
                    line.start_arrow = start;
                    line.end_arrow = end;
                }
                _ => return false,
            },
        }
        true
    }

    /// Fold negative extents into a normalized frame and apply the kind's
    /// minimum size.
    pub(crate) fn normalize_frame(&mut self) {
        let rect = self.frame.rect();
        self.frame.set_rect(rect);
        self.enforce_min_size();
    }

    fn enforce_min_size(&mut self) {
        let min = self.min_size();
        self.frame.width = self.frame.width.max(min.width);
        self.frame.height = self.frame.height.max(min.height);
    }
}

fn map_point(point: Point, from: Rect, to: Rect) -> Point {
    let sx = if from.width() > f64::EPSILON { to.width() / from.width() } else { 1.0 };
    let sy = if from.height() > f64::EPSILON { to.height() / from.height() } else { 1.0 };
    Point::new(to.x0 + (point.x - from.x0) * sx, to.y0 + (point.y - from.y0) * sy)
}
