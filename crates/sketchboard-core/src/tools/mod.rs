//! Tool system: the select tool plus the shape creation tools.

pub mod select;
pub mod text;

pub use select::{ResizeHandle, SelectState, SelectTool};
pub use text::{TextKeyOutcome, TextSession};

use crate::shapes::{PathShape, Shape, ShapeStyle};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ToolKind {
    #[default]
    Select,
    Rectangle,
    Ellipse,
    /// Diamond-shaped polygon.
    Polygon,
    Line,
    Freehand,
    Text,
}

impl ToolKind {
    pub fn creates_shapes(self) -> bool {
        !matches!(self, ToolKind::Select)
    }
}

/// Variant of the active tool. `Grab` turns the select tool into a hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Submode {
    #[default]
    Default,
    Grab,
}

#[derive(Debug, Clone, Default)]
pub enum CreateState {
    #[default]
    Idle,
    Drawing { start: Point, current: Point },
}

/// Drag-to-create for the shape tools.
#[derive(Debug, Clone)]
pub struct CreateTool {
    pub tool: ToolKind,
    pub state: CreateState,
    /// Style applied to new shapes.
    pub style: ShapeStyle,
    /// Corner radius for new rectangles.
    pub corner_radius: f64,
    points: Vec<Point>,
}

impl Default for CreateTool {
    fn default() -> Self {
        Self {
            tool: ToolKind::Rectangle,
            state: CreateState::Idle,
            style: ShapeStyle::default(),
            corner_radius: 0.0,
            points: Vec::new(),
        }
    }
}

impl CreateTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_tool(&mut self, tool: ToolKind) {
        self.tool = tool;
        self.cancel();
    }

    pub fn begin(&mut self, point: Point) {
        self.points.clear();
        self.points.push(point);
        self.state = CreateState::Drawing {
            start: point,
            current: point,
        };
    }

    pub fn update(&mut self, point: Point) {
        if let CreateState::Drawing { current, .. } = &mut self.state {
            *current = point;
            if self.tool == ToolKind::Freehand {
                self.points.push(point);
            }
        }
    }

    /// Finish the gesture. `min_drag` is how far the pointer must have
    /// travelled for a line or freehand stroke to count.
    pub fn end(&mut self, point: Point, min_drag: f64) -> Option<Shape> {
        let CreateState::Drawing { start, .. } = self.state else {
            return None;
        };
        self.update(point);
        let shape = self.build(start, point, min_drag);
        self.cancel();
        shape
    }

    pub fn cancel(&mut self) {
        self.state = CreateState::Idle;
        self.points.clear();
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, CreateState::Drawing { .. })
    }

    /// The shape as it would be created right now, for the overlay.
    pub fn preview_shape(&self) -> Option<Shape> {
        match self.state {
            CreateState::Drawing { start, current } if self.tool != ToolKind::Text => {
                self.shape_between(start, current)
            }
            _ => None,
        }
    }

    fn build(&self, start: Point, end: Point, min_drag: f64) -> Option<Shape> {
        let rect = Rect::from_points(start, end);
        match self.tool {
            ToolKind::Select => None,
            // Text is created on click.
            ToolKind::Text => self.shape_between(start, end),
            ToolKind::Line => ((end - start).hypot() >= min_drag)
                .then(|| self.shape_between(start, end))
                .flatten(),
            ToolKind::Freehand => {
                let extent = self
                    .points
                    .iter()
                    .map(|p| (*p - start).hypot())
                    .fold(0.0, f64::max);
                (self.points.len() >= 2 && extent >= min_drag)
                    .then(|| self.shape_between(start, end))
                    .flatten()
            }
            ToolKind::Rectangle | ToolKind::Ellipse | ToolKind::Polygon => {
                let shape = self.shape_between(start, end)?;
                let min = shape.min_size();
                (rect.width() >= min.width && rect.height() >= min.height).then_some(shape)
            }
        }
    }

    fn shape_between(&self, start: Point, end: Point) -> Option<Shape> {
        let rect = Rect::from_points(start, end);
        let shape = match self.tool {
            ToolKind::Select => return None,
            ToolKind::Rectangle => {
                let mut shape = Shape::rectangle(rect);
                shape.apply(crate::shapes::Mutation::CornerRadius(self.corner_radius));
                shape
            }
            ToolKind::Ellipse => Shape::ellipse(rect),
            ToolKind::Polygon => Shape::polygon(rect, PathShape::diamond().points),
            ToolKind::Line => Shape::line(start, end),
            ToolKind::Freehand => {
                if self.points.len() < 2 {
                    return None;
                }
                Shape::freehand(&self.points)
            }
            ToolKind::Text => return Some(Shape::text(start, "")),
        };
        Some(shape.with_style(self.style.clone()))
    }
}
