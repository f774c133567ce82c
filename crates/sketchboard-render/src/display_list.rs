//! A surface that records draw calls instead of rasterizing them.

use crate::renderer::{GridStyle, RenderContext, RenderResult, Renderer};
use kurbo::{Affine, BezPath, Circle, Point, Rect, Shape as _, Stroke};
use peniko::Color;
use sketchboard_core::render::{Surface, render_scene};
use sketchboard_core::shapes::{Image, TextLayout};

/// Grid lines closer than this on screen are not drawn.
const MIN_GRID_PIXELS: f64 = 4.0;

const GRID_COLOR: Color = Color::from_rgba8(225, 225, 225, 255);

/// One recorded draw call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear(Color),
    Fill {
        path: BezPath,
        transform: Affine,
        color: Color,
    },
    Stroke {
        path: BezPath,
        transform: Affine,
        width: f64,
        dashed: bool,
        color: Color,
    },
    Text {
        lines: Vec<String>,
        origins: Vec<Point>,
        font_size: f64,
        transform: Affine,
        color: Color,
    },
    Image {
        image: Image,
        rect: Rect,
        transform: Affine,
    },
}

impl DrawCommand {
    /// Screen-space bounding box, when the command covers an area.
    pub fn screen_bounds(&self) -> Option<Rect> {
        match self {
            DrawCommand::Clear(_) | DrawCommand::Text { .. } => None,
            DrawCommand::Fill { path, transform, .. } | DrawCommand::Stroke { path, transform, .. } => {
                Some((*transform * path.clone()).bounding_box())
            }
            DrawCommand::Image { rect, transform, .. } => Some(transform.transform_rect_bbox(*rect)),
        }
    }
}

/// Ordered list of draw calls for one frame.
#[derive(Debug, Clone, Default)]
pub struct DisplayList {
    commands: Vec<DrawCommand>,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    /// Recorded text, one string per text command with lines joined.
    pub fn texts(&self) -> Vec<String> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { lines, .. } => Some(lines.join("\n")),
                _ => None,
            })
            .collect()
    }
}

impl Surface for DisplayList {
    fn fill_path(&mut self, path: &BezPath, transform: Affine, color: Color) {
        self.push(DrawCommand::Fill {
            path: path.clone(),
            transform,
            color,
        });
    }

    fn stroke_path(&mut self, path: &BezPath, transform: Affine, stroke: &Stroke, color: Color) {
        self.push(DrawCommand::Stroke {
            path: path.clone(),
            transform,
            width: stroke.width,
            dashed: !stroke.dash_pattern.is_empty(),
            color,
        });
    }

    fn draw_text(&mut self, layout: &TextLayout, origins: &[Point], transform: Affine, color: Color) {
        self.push(DrawCommand::Text {
            lines: layout.lines.clone(),
            origins: origins.to_vec(),
            font_size: layout.font_size,
            transform,
            color,
        });
    }

    fn draw_image(&mut self, image: &Image, rect: Rect, transform: Affine) {
        self.push(DrawCommand::Image {
            image: image.clone(),
            rect,
            transform,
        });
    }
}

/// Renderer that fills a [`DisplayList`] each frame.
#[derive(Debug, Default)]
pub struct DisplayListRenderer {
    list: DisplayList,
}

impl DisplayListRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn display_list(&self) -> &DisplayList {
        &self.list
    }

    pub fn take_display_list(&mut self) -> DisplayList {
        std::mem::take(&mut self.list)
    }

    fn render_grid(&mut self, ctx: &RenderContext) {
        let camera = ctx.editor.camera();
        let spacing = ctx.grid_spacing;
        if ctx.grid == GridStyle::None {
            return;
        }
        if spacing.is_nan() || spacing * camera.zoom < MIN_GRID_PIXELS {
            log::debug!("Grid skipped at zoom {}", camera.zoom);
            return;
        }
        let visible = camera.visible_rect(ctx.logical_viewport());
        let view = camera.transform();
        let x_start = (visible.x0 / spacing).floor() as i64;
        let x_end = (visible.x1 / spacing).ceil() as i64;
        let y_start = (visible.y0 / spacing).floor() as i64;
        let y_end = (visible.y1 / spacing).ceil() as i64;

        let mut path = BezPath::new();
        match ctx.grid {
            GridStyle::None => {}
            GridStyle::Lines => {
                for i in x_start..=x_end {
                    let x = i as f64 * spacing;
                    path.move_to(Point::new(x, visible.y0));
                    path.line_to(Point::new(x, visible.y1));
                }
                for j in y_start..=y_end {
                    let y = j as f64 * spacing;
                    path.move_to(Point::new(visible.x0, y));
                    path.line_to(Point::new(visible.x1, y));
                }
                let stroke = Stroke::new(1.0 / camera.zoom);
                self.list.stroke_path(&path, view, &stroke, GRID_COLOR);
            }
            GridStyle::Dots => {
                let radius = 1.0 / camera.zoom;
                for i in x_start..=x_end {
                    for j in y_start..=y_end {
                        let center = Point::new(i as f64 * spacing, j as f64 * spacing);
                        path.extend(Circle::new(center, radius).path_elements(0.1));
                    }
                }
                self.list.fill_path(&path, view, GRID_COLOR);
            }
        }
    }
}

impl Renderer for DisplayListRenderer {
    fn build_scene(&mut self, ctx: &RenderContext) -> RenderResult<()> {
        self.list.clear();
        self.list.push(DrawCommand::Clear(ctx.background));
        self.render_grid(ctx);

        let editor = ctx.editor;
        render_scene(&mut self.list, editor.store(), &editor.canvas().overlay, editor.camera());
        log::trace!("Built display list with {} command(s)", self.list.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::RendererError;
    use kurbo::Size;
    use sketchboard_core::input::PointerEvent;
    use sketchboard_core::shapes::{Caption, Shape};
    use sketchboard_core::{Editor, ToolKind, Submode};

    const VIEWPORT: Size = Size::new(800.0, 600.0);

    fn build(editor: &Editor, grid: GridStyle) -> DisplayList {
        let mut renderer = DisplayListRenderer::new();
        let ctx = RenderContext::new(editor, VIEWPORT).with_grid(grid, 20.0);
        renderer.render(&ctx).unwrap();
        renderer.take_display_list()
    }

    fn strokes(list: &DisplayList) -> Vec<(f64, bool)> {
        list.commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Stroke { width, dashed, .. } => Some((*width, *dashed)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_empty_scene_only_clears() {
        let editor = Editor::default();
        let list = build(&editor, GridStyle::None);
        assert_eq!(list.commands(), &[DrawCommand::Clear(RenderContext::DEFAULT_BACKGROUND)]);
    }

    #[test]
    fn test_invalid_viewport_is_an_error() {
        let editor = Editor::default();
        let mut renderer = DisplayListRenderer::new();
        let ctx = RenderContext::new(&editor, Size::new(0.0, 600.0));
        assert!(matches!(renderer.render(&ctx), Err(RendererError::InvalidViewport(_))));
        let ctx = RenderContext::new(&editor, Size::new(f64::NAN, 600.0));
        assert!(matches!(renderer.render(&ctx), Err(RendererError::InvalidViewport(_))));
        assert!(renderer.display_list().is_empty());
    }

    #[test]
    fn test_shape_fill_then_stroke() {
        let mut editor = Editor::default();
        let mut shape = Shape::rectangle(Rect::new(0.0, 0.0, 100.0, 50.0));
        shape.style.set_fill(Some(Color::from_rgba8(255, 0, 0, 255)));
        editor.add_shape(shape);

        let list = build(&editor, GridStyle::None);
        assert!(matches!(list.commands()[1], DrawCommand::Fill { .. }));
        assert!(matches!(list.commands()[2], DrawCommand::Stroke { dashed: false, .. }));
        let bounds = list.commands()[1].screen_bounds().unwrap();
        assert!((bounds.width() - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_selected_shape_gets_dashed_frame() {
        let mut editor = Editor::default();
        editor.add_shape(Shape::rectangle(Rect::new(0.0, 0.0, 100.0, 50.0)));
        editor.handle_pointer(PointerEvent::down(Point::new(50.0, 25.0)));
        editor.handle_pointer(PointerEvent::up(Point::new(50.0, 25.0)));

        let list = build(&editor, GridStyle::None);
        assert!(strokes(&list).iter().any(|(_, dashed)| *dashed));
    }

    #[test]
    fn test_camera_zoom_scales_overlay_strokes() {
        let mut editor = Editor::default();
        editor.add_shape(Shape::rectangle(Rect::new(0.0, 0.0, 100.0, 50.0)));
        editor.handle_pointer(PointerEvent::down(Point::new(50.0, 25.0)));
        editor.handle_pointer(PointerEvent::up(Point::new(50.0, 25.0)));
        editor.camera_mut().zoom = 2.0;

        let list = build(&editor, GridStyle::None);
        let dashed: Vec<f64> = strokes(&list)
            .into_iter()
            .filter(|(_, dashed)| *dashed)
            .map(|(width, _)| width)
            .collect();
        assert!(!dashed.is_empty());
        assert!(dashed.iter().all(|w| (*w - 0.5).abs() < 1e-9));
    }

    #[test]
    fn test_caption_is_recorded_as_text() {
        let mut editor = Editor::default();
        editor.add_shape(Shape::rectangle(Rect::new(0.0, 0.0, 200.0, 80.0)).with_caption(Caption::new("hello")));
        editor.add_shape(Shape::text(Point::new(0.0, 200.0), "one\ntwo"));

        let list = build(&editor, GridStyle::None);
        assert_eq!(list.texts(), vec!["hello".to_string(), "one\ntwo".to_string()]);
    }

    #[test]
    fn test_creation_preview_is_drawn() {
        let mut editor = Editor::default();
        editor.set_mode(ToolKind::Rectangle, Submode::Default);
        editor.handle_pointer(PointerEvent::down(Point::new(10.0, 10.0)));
        editor.handle_pointer(PointerEvent::moved(Point::new(90.0, 60.0)));

        let list = build(&editor, GridStyle::None);
        assert!(list.len() > 1);
        assert!(editor.store().is_empty());
    }

    #[test]
    fn test_grid_lines_follow_viewport() {
        let editor = Editor::default();
        let list = build(&editor, GridStyle::Lines);
        assert_eq!(list.len(), 2);
        assert_eq!(strokes(&list).len(), 1);

        let dots = build(&editor, GridStyle::Dots);
        assert!(matches!(dots.commands()[1], DrawCommand::Fill { .. }));
    }

    #[test]
    fn test_grid_hidden_when_zoomed_far_out() {
        let mut editor = Editor::default();
        editor.camera_mut().zoom = 0.1;
        let list = build(&editor, GridStyle::Lines);
        assert_eq!(list.len(), 1);
    }
}
