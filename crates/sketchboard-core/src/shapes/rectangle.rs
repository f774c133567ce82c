//! Rectangle shape.

use super::ShapeBehavior;
use kurbo::{BezPath, Point, Rect, RoundedRect, Shape as KurboShape, Size};
use serde::{Deserialize, Serialize};

/// A rectangle with optional rounded corners.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rectangle {
    /// Corner radius (0 = sharp corners).
    #[serde(default)]
    pub corner_radius: f64,
}

impl Rectangle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_corner_radius(mut self, radius: f64) -> Self {
        self.corner_radius = radius.max(0.0);
        self
    }
}

impl ShapeBehavior for Rectangle {
    fn min_size(&self) -> Size {
        Size::new(20.0, 20.0)
    }

    fn local_path(&self, size: Size) -> BezPath {
        let rect = Rect::from_center_size(Point::ZERO, size);
        if self.corner_radius > 0.0 {
            let radius = self.corner_radius.min(size.width.min(size.height) / 2.0);
            RoundedRect::from_rect(rect, radius).to_path(0.1)
        } else {
            rect.to_path(0.1)
        }
    }
}
