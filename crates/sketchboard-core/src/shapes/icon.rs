//! Vector icon drawn from SVG path data.

use super::ShapeBehavior;
use kurbo::{Affine, BezPath, Rect, Size};
use serde::{Deserialize, Serialize};

/// An icon scaled from its view box into the shape frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Icon {
    /// SVG path data (`d` attribute).
    pub svg_path: String,
    pub view_box: Rect,
}

impl Icon {
    pub fn new(svg_path: impl Into<String>, view_box: Rect) -> Self {
        Self {
            svg_path: svg_path.into(),
            view_box,
        }
    }

    /// Parsed path in view box coordinates. Malformed data yields `None`.
    pub fn parsed(&self) -> Option<BezPath> {
        match BezPath::from_svg(&self.svg_path) {
            Ok(path) => Some(path),
            Err(err) => {
                log::warn!("Invalid icon path data: {err}");
                None
            }
        }
    }

    /// Maps view box coordinates into a local frame of `size`.
    fn view_transform(&self, size: Size) -> Affine {
        let vb = self.view_box;
        let sx = if vb.width() > f64::EPSILON { size.width / vb.width() } else { 1.0 };
        let sy = if vb.height() > f64::EPSILON { size.height / vb.height() } else { 1.0 };
        Affine::scale_non_uniform(sx, sy) * Affine::translate(-vb.center().to_vec2())
    }

    /// Mirror the path data inside the view box.
    pub fn bake_flip(&mut self, flip_x: bool, flip_y: bool) {
        if !flip_x && !flip_y {
            return;
        }
        let Some(path) = self.parsed() else {
            return;
        };
        let center = self.view_box.center().to_vec2();
        let mirror = Affine::translate(center)
            * Affine::scale_non_uniform(if flip_x { -1.0 } else { 1.0 }, if flip_y { -1.0 } else { 1.0 })
            * Affine::translate(-center);
        self.svg_path = (mirror * path).to_svg();
    }
}

impl ShapeBehavior for Icon {
    fn min_size(&self) -> Size {
        Size::new(10.0, 10.0)
    }

    fn local_path(&self, size: Size) -> BezPath {
        match self.parsed() {
            Some(path) => self.view_transform(size) * path,
            None => BezPath::new(),
        }
    }

    fn supports_flip(&self) -> bool {
        true
    }

    fn supports_caption(&self) -> bool {
        false
    }

    fn keeps_aspect(&self) -> bool {
        true
    }
}

impl Default for Icon {
    fn default() -> Self {
        Self::new("M0 0L24 0L24 24L0 24Z", Rect::new(0.0, 0.0, 24.0, 24.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Shape as KurboShape;

    #[test]
    fn test_local_path_fills_frame() {
        let icon = Icon::default();
        let bounds = icon.local_path(Size::new(48.0, 48.0)).bounding_box();
        assert!((bounds.x0 + 24.0).abs() < 1e-6);
        assert!((bounds.x1 - 24.0).abs() < 1e-6);
    }

    #[test]
    fn test_bake_flip_mirrors_data() {
        let mut icon = Icon::new("M0 0L12 24", Rect::new(0.0, 0.0, 24.0, 24.0));
        icon.bake_flip(true, false);
        let path = icon.parsed().unwrap();
        let bounds = path.bounding_box();
        assert!((bounds.x0 - 12.0).abs() < 1e-6);
        assert!((bounds.x1 - 24.0).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_path_is_empty() {
        let icon = Icon::new("not a path", Rect::new(0.0, 0.0, 24.0, 24.0));
        assert!(icon.local_path(Size::new(10.0, 10.0)).elements().is_empty());
    }
}
