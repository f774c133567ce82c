//! Ellipse shape.

use super::ShapeBehavior;
use kurbo::{BezPath, Ellipse as KurboEllipse, Point, Rect, Shape as KurboShape, Size};
use serde::{Deserialize, Serialize};

/// An ellipse inscribed in its frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ellipse {}

impl Ellipse {
    pub fn new() -> Self {
        Self {}
    }
}

impl ShapeBehavior for Ellipse {
    fn min_size(&self) -> Size {
        Size::new(20.0, 20.0)
    }

    fn local_path(&self, size: Size) -> BezPath {
        KurboEllipse::from_rect(Rect::from_center_size(Point::ZERO, size)).to_path(0.1)
    }

    fn hit_local(&self, local: Point, size: Size, tolerance: f64) -> bool {
        let rx = size.width / 2.0 + tolerance;
        let ry = size.height / 2.0 + tolerance;
        if rx <= 0.0 || ry <= 0.0 {
            return false;
        }
        (local.x / rx).powi(2) + (local.y / ry).powi(2) <= 1.0
    }
}
