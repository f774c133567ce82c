//! The drawable-surface contract and per-shape draw routines.
//!
//! The core never produces pixels. A paint backend implements [`Surface`];
//! the editor walks the scene once per frame and issues fill, stroke, text
//! and image calls in world coordinates with a view transform attached.

use crate::camera::Camera;
use crate::geometry::ResizeDirection;
use crate::shapes::{Image, Shape, ShapeId, ShapeKind, TextBlock, TextLayout};
use crate::snap::GuideLine;
use crate::store::ShapeStore;
use kurbo::{Affine, BezPath, Circle, Point, Rect, Shape as _, Stroke};
use peniko::Color;

pub const SELECTION_COLOR: Color = Color::from_rgba8(59, 130, 246, 255);
pub const MARQUEE_FILL: Color = Color::from_rgba8(59, 130, 246, 25);
pub const GUIDE_COLOR: Color = Color::from_rgba8(236, 72, 153, 180);
pub const PLACEHOLDER_COLOR: Color = Color::from_rgba8(160, 160, 160, 255);

/// Handle square size in screen pixels.
const HANDLE_SIZE: f64 = 8.0;

/// What a backend must provide to paint the scene.
pub trait Surface {
    fn fill_path(&mut self, path: &BezPath, transform: Affine, color: Color);

    fn stroke_path(&mut self, path: &BezPath, transform: Affine, stroke: &Stroke, color: Color);

    /// Draw laid-out text. Line origins are in the transform's local frame.
    fn draw_text(&mut self, layout: &TextLayout, origins: &[Point], transform: Affine, color: Color);

    /// Draw an image into `rect` (local frame).
    fn draw_image(&mut self, image: &Image, rect: Rect, transform: Affine);
}

/// Final paint, or the lighter styling used while a shape is being resized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawMode {
    #[default]
    Final,
    Preview,
}

/// Transient drawing that sits above the scene.
#[derive(Debug, Clone, Default)]
pub struct Overlay {
    pub guides: Vec<GuideLine>,
    /// Outline-only clone of the hovered shape.
    pub hover: Option<Shape>,
    /// Shape being drawn by a creation tool.
    pub preview: Option<Shape>,
    /// Shapes under an active resize, drawn in preview mode.
    pub resizing: Vec<ShapeId>,
}

impl Overlay {
    pub fn clear(&mut self) {
        self.guides.clear();
        self.hover = None;
        self.preview = None;
        self.resizing.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.guides.is_empty()
            && self.hover.is_none()
            && self.preview.is_none()
            && self.resizing.is_empty()
    }
}

fn faded(color: Color, mode: DrawMode) -> Color {
    match mode {
        DrawMode::Final => color,
        DrawMode::Preview => color.multiply_alpha(0.5),
    }
}

impl Shape {
    /// Paint this shape. `view` maps world to screen.
    pub fn draw(&self, surface: &mut dyn Surface, mode: DrawMode, view: Affine) {
        let transform = view * self.frame.transform();
        let size = self.frame.size();
        match &self.kind {
            ShapeKind::Selection(_) => return,
            ShapeKind::Group(group) => {
                for child in &group.children {
                    child.draw(surface, mode, view);
                }
                return;
            }
            ShapeKind::Image(image) => {
                let rect = Rect::from_center_size(Point::ZERO, size);
                if image.is_placeholder() {
                    let mut cross = rect.to_path(0.1);
                    cross.move_to(Point::new(rect.x0, rect.y0));
                    cross.line_to(Point::new(rect.x1, rect.y1));
                    cross.move_to(Point::new(rect.x1, rect.y0));
                    cross.line_to(Point::new(rect.x0, rect.y1));
                    surface.stroke_path(&cross, transform, &Stroke::new(1.0), PLACEHOLDER_COLOR);
                } else {
                    surface.draw_image(image, rect, transform);
                }
                return;
            }
            ShapeKind::Text(block) => {
                if mode == DrawMode::Preview {
                    let outline = self.behavior().local_path(size);
                    let stroke = Stroke::new(1.0).with_dashes(0.0, [4.0, 4.0]);
                    surface.stroke_path(&outline, transform, &stroke, SELECTION_COLOR);
                }
                self.draw_caption(surface, mode, transform, block.padding);
                return;
            }
            _ => {}
        }

        let path = self.behavior().local_path(size);
        if let Some(fill) = self.style.fill_with_opacity() {
            surface.fill_path(&path, transform, faded(fill, mode));
        }
        if self.style.stroke_width > 0.0 {
            let stroke =
                Stroke::new(self.style.stroke_width).with_dashes(0.0, self.style.dash.iter().copied());
            surface.stroke_path(&path, transform, &stroke, faded(self.style.stroke_with_opacity(), mode));
        }
        // Captions are laid out again on commit; skip them mid-resize.
        if mode == DrawMode::Final {
            self.draw_caption(surface, mode, transform, TextBlock::DEFAULT_PADDING);
        }
    }

    fn draw_caption(&self, surface: &mut dyn Surface, mode: DrawMode, transform: Affine, padding: f64) {
        let Some(caption) = self.caption.as_ref().filter(|c| !c.is_empty()) else {
            return;
        };
        let width = (self.frame.width - 2.0 * padding).max(1.0);
        let layout = caption.layout(width);
        let origins = layout.line_origins(width);
        surface.draw_text(&layout, &origins, transform, faded(self.style.stroke_with_opacity(), mode));
    }
}

/// Paint the scene and then the overlay.
pub fn render_scene(
    surface: &mut dyn Surface,
    store: &ShapeStore,
    overlay: &Overlay,
    camera: &Camera,
) {
    let view = camera.transform();
    for shape in store.iter() {
        let mode = if overlay.resizing.contains(&shape.id()) {
            DrawMode::Preview
        } else {
            DrawMode::Final
        };
        shape.draw(surface, mode, view);
    }
    render_overlay(surface, store, overlay, camera);
}

fn render_overlay(surface: &mut dyn Surface, store: &ShapeStore, overlay: &Overlay, camera: &Camera) {
    let view = camera.transform();
    let px = 1.0 / camera.zoom;
    let thin = Stroke::new(px);

    if let Some(active) = store.active().and_then(|id| store.get(id)) {
        draw_selection(surface, active, view, px);
    }
    if let Some(hover) = &overlay.hover {
        surface.stroke_path(&hover.outline(), view, &thin, SELECTION_COLOR);
    }
    if !overlay.guides.is_empty() {
        let mut path = BezPath::new();
        for guide in &overlay.guides {
            let (a, b) = guide.endpoints();
            path.move_to(a);
            path.line_to(b);
        }
        surface.stroke_path(&path, view, &thin, GUIDE_COLOR);
    }
    if let Some(preview) = &overlay.preview {
        preview.draw(surface, DrawMode::Preview, view);
    }
}

fn draw_selection(surface: &mut dyn Surface, active: &Shape, view: Affine, px: f64) {
    let dashed = Stroke::new(px).with_dashes(0.0, [4.0 * px, 4.0 * px]);
    if let Some(selection) = active.as_selection() {
        let rect = active.rect().to_path(0.1);
        if selection.is_marquee() {
            surface.fill_path(&rect, view, MARQUEE_FILL);
        }
        surface.stroke_path(&rect, view, &dashed, SELECTION_COLOR);
        if selection.is_marquee() {
            return;
        }
    }

    if let Some(line) = active.as_line() {
        for point in &line.points {
            let dot = Circle::new(*point, HANDLE_SIZE / 2.0 * px).to_path(0.1);
            surface.fill_path(&dot, view, Color::WHITE);
            surface.stroke_path(&dot, view, &Stroke::new(2.0 * px), SELECTION_COLOR);
        }
        return;
    }

    let transform = view * active.frame.transform();
    let size = active.frame.size();
    let frame = Rect::from_center_size(Point::ZERO, size);
    if !active.is_selection() {
        surface.stroke_path(&frame.to_path(0.1), transform, &dashed, SELECTION_COLOR);
    }
    let half = HANDLE_SIZE / 2.0 * px;
    for direction in ResizeDirection::ALL {
        let at = handle_position(frame, direction);
        let handle = Rect::new(at.x - half, at.y - half, at.x + half, at.y + half).to_path(0.1);
        surface.fill_path(&handle, transform, Color::WHITE);
        surface.stroke_path(&handle, transform, &Stroke::new(1.5 * px), SELECTION_COLOR);
    }
}

fn handle_position(frame: Rect, direction: ResizeDirection) -> Point {
    let x = if direction.moves_left() {
        frame.x0
    } else if direction.moves_right() {
        frame.x1
    } else {
        frame.center().x
    };
    let y = if direction.moves_top() {
        frame.y0
    } else if direction.moves_bottom() {
        frame.y1
    } else {
        frame.center().y
    };
    Point::new(x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Caption, ShapeStyle};

    #[derive(Default)]
    struct Tally {
        fills: Vec<Color>,
        strokes: Vec<(f64, usize)>,
        texts: Vec<Vec<String>>,
        images: usize,
    }

    impl Surface for Tally {
        fn fill_path(&mut self, _path: &BezPath, _transform: Affine, color: Color) {
            self.fills.push(color);
        }

        fn stroke_path(&mut self, _path: &BezPath, _transform: Affine, stroke: &Stroke, _color: Color) {
            self.strokes.push((stroke.width, stroke.dash_pattern.len()));
        }

        fn draw_text(&mut self, layout: &TextLayout, origins: &[Point], _transform: Affine, _color: Color) {
            assert_eq!(layout.lines.len(), origins.len());
            self.texts.push(layout.lines.clone());
        }

        fn draw_image(&mut self, _image: &Image, _rect: Rect, _transform: Affine) {
            self.images += 1;
        }
    }

    #[test]
    fn test_filled_rectangle_with_caption() {
        let shape = Shape::rectangle(Rect::new(0.0, 0.0, 100.0, 50.0))
            .with_style(ShapeStyle {
                fill_color: Some(Color::WHITE.into()),
                dash: vec![5.0, 5.0],
                ..ShapeStyle::default()
            })
            .with_caption(Caption::new("label"));
        let mut tally = Tally::default();
        shape.draw(&mut tally, DrawMode::Final, Affine::IDENTITY);
        assert_eq!(tally.fills.len(), 1);
        assert_eq!(tally.strokes, vec![(2.0, 2)]);
        assert_eq!(tally.texts, vec![vec!["label".to_string()]]);
    }

    #[test]
    fn test_preview_skips_caption() {
        let shape = Shape::rectangle(Rect::new(0.0, 0.0, 100.0, 50.0)).with_caption(Caption::new("x"));
        let mut tally = Tally::default();
        shape.draw(&mut tally, DrawMode::Preview, Affine::IDENTITY);
        assert!(tally.texts.is_empty());
        assert_eq!(tally.strokes.len(), 1);
    }

    #[test]
    fn test_group_draws_children_and_selection_draws_nothing() {
        let group = Shape::group(vec![
            Shape::rectangle(Rect::new(0.0, 0.0, 40.0, 40.0)),
            Shape::ellipse(Rect::new(50.0, 0.0, 90.0, 40.0)),
        ]);
        let mut tally = Tally::default();
        group.draw(&mut tally, DrawMode::Final, Affine::IDENTITY);
        assert_eq!(tally.strokes.len(), 2);

        let mut tally = Tally::default();
        Shape::selection(vec![], Rect::new(0.0, 0.0, 10.0, 10.0)).draw(
            &mut tally,
            DrawMode::Final,
            Affine::IDENTITY,
        );
        assert!(tally.strokes.is_empty());
    }

    #[test]
    fn test_images_and_placeholders() {
        let mut tally = Tally::default();
        Shape::image(Rect::new(0.0, 0.0, 40.0, 40.0), Image::embedded(&[1, 2], 2, 2)).draw(
            &mut tally,
            DrawMode::Final,
            Affine::IDENTITY,
        );
        Shape::image(Rect::new(0.0, 0.0, 40.0, 40.0), Image::placeholder()).draw(
            &mut tally,
            DrawMode::Final,
            Affine::IDENTITY,
        );
        assert_eq!(tally.images, 1);
        assert_eq!(tally.strokes.len(), 1);
    }

    #[test]
    fn test_scene_draws_handles_for_active_shape() {
        let mut store = ShapeStore::new();
        let id = store.insert(Shape::rectangle(Rect::new(0.0, 0.0, 100.0, 100.0)));
        let mut tally = Tally::default();
        render_scene(&mut tally, &store, &Overlay::default(), &Camera::new());
        assert_eq!(tally.strokes.len(), 1);

        store.set_active(Some(id));
        let mut tally = Tally::default();
        render_scene(&mut tally, &store, &Overlay::default(), &Camera::new());
        // Shape, dashed frame, eight handles.
        assert_eq!(tally.strokes.len(), 10);
        assert_eq!(tally.fills.len(), 8);
    }

    #[test]
    fn test_handle_positions() {
        let frame = Rect::new(-10.0, -5.0, 10.0, 5.0);
        assert_eq!(handle_position(frame, ResizeDirection::TopLeft), Point::new(-10.0, -5.0));
        assert_eq!(handle_position(frame, ResizeDirection::Right), Point::new(10.0, 0.0));
        assert_eq!(handle_position(frame, ResizeDirection::Bottom), Point::new(0.0, 5.0));
    }
}
