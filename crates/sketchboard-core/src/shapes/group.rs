//! Group shape for combining multiple shapes.

use super::{Shape, ShapeBehavior, ShapeId};
use crate::geometry::union_rects;
use kurbo::{BezPath, Point, Rect, Shape as KurboShape, Size};
use serde::{Deserialize, Serialize};

/// A group of shapes manipulated as a single unit. Children keep their own
/// world frames; the group frame is their union.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub children: Vec<Shape>,
}

impl Group {
    pub fn new(children: Vec<Shape>) -> Self {
        Self { children }
    }

    /// Union of the children's world bounds.
    pub fn bounds(&self) -> Option<Rect> {
        union_rects(self.children.iter().map(Shape::bounds))
    }

    /// All ids in this group, including nested groups.
    pub fn all_shape_ids(&self) -> Vec<ShapeId> {
        let mut ids = Vec::new();
        for child in &self.children {
            ids.push(child.id());
            if let Some(group) = child.as_group() {
                ids.extend(group.all_shape_ids());
            }
        }
        ids
    }

    /// Dissolve the group and return its children.
    pub fn ungroup(self) -> Vec<Shape> {
        self.children
    }
}

impl ShapeBehavior for Group {
    fn min_size(&self) -> Size {
        Size::new(10.0, 10.0)
    }

    fn local_path(&self, size: Size) -> BezPath {
        Rect::from_center_size(Point::ZERO, size).to_path(0.1)
    }

    fn supports_rotation(&self) -> bool {
        false
    }

    fn supports_caption(&self) -> bool {
        false
    }
}

/// Marker kind for the transient marquee / active multi-selection shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActiveSelection {
    pub members: Vec<ShapeId>,
}

impl ActiveSelection {
    pub fn new(members: Vec<ShapeId>) -> Self {
        Self { members }
    }

    /// A marquee has no members yet.
    pub fn is_marquee(&self) -> bool {
        self.members.is_empty()
    }
}

impl ShapeBehavior for ActiveSelection {
    fn min_size(&self) -> Size {
        Size::new(10.0, 10.0)
    }

    fn local_path(&self, size: Size) -> BezPath {
        Rect::from_center_size(Point::ZERO, size).to_path(0.1)
    }

    fn supports_rotation(&self) -> bool {
        false
    }

    fn supports_caption(&self) -> bool {
        false
    }
}
