//! Backend-neutral frame description and the trait paint backends implement.

use kurbo::Size;
use peniko::Color;
use sketchboard_core::editor::Editor;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RendererError {
    #[error("viewport {0:?} has no drawable area")]
    InvalidViewport(Size),
    #[error("surface error: {0}")]
    Surface(String),
}

pub type RenderResult<T> = Result<T, RendererError>;

/// Background decoration drawn under the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GridStyle {
    #[default]
    None,
    Lines,
    /// A dot at every grid intersection.
    Dots,
}

impl GridStyle {
    /// The style a "toggle grid" control switches to.
    pub fn next(self) -> Self {
        match self {
            GridStyle::None => GridStyle::Lines,
            GridStyle::Lines => GridStyle::Dots,
            GridStyle::Dots => GridStyle::None,
        }
    }
}

/// Everything a backend needs to paint one frame of an [`Editor`].
pub struct RenderContext<'a> {
    pub editor: &'a Editor,
    /// Physical pixels.
    pub viewport: Size,
    /// Physical pixels per logical pixel.
    pub pixel_ratio: f64,
    pub background: Color,
    pub grid: GridStyle,
    /// Grid cell size in canvas units.
    pub grid_spacing: f64,
}

impl<'a> RenderContext<'a> {
    pub const DEFAULT_BACKGROUND: Color = Color::from_rgba8(250, 250, 250, 255);

    pub fn new(editor: &'a Editor, viewport: Size) -> Self {
        Self {
            editor,
            viewport,
            pixel_ratio: 1.0,
            background: Self::DEFAULT_BACKGROUND,
            grid: GridStyle::None,
            grid_spacing: 20.0,
        }
    }

    pub fn with_pixel_ratio(mut self, pixel_ratio: f64) -> Self {
        self.pixel_ratio = pixel_ratio;
        self
    }

    pub fn with_background(mut self, background: Color) -> Self {
        self.background = background;
        self
    }

    pub fn with_grid(mut self, grid: GridStyle, spacing: f64) -> Self {
        self.grid = grid;
        self.grid_spacing = spacing;
        self
    }

    /// Viewport in the logical pixels the camera works in.
    pub fn logical_viewport(&self) -> Size {
        let ratio = if self.pixel_ratio > 0.0 { self.pixel_ratio } else { 1.0 };
        Size::new(self.viewport.width / ratio, self.viewport.height / ratio)
    }

    pub fn check_viewport(&self) -> RenderResult<()> {
        let Size { width, height } = self.viewport;
        if width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0 {
            Ok(())
        } else {
            Err(RendererError::InvalidViewport(self.viewport))
        }
    }
}

/// A paint backend.
///
/// Backends receive the editor's draw calls through
/// [`sketchboard_core::render::Surface`]; `build_scene` decides where they go.
pub trait Renderer {
    fn build_scene(&mut self, ctx: &RenderContext) -> RenderResult<()>;

    /// Validate the frame, then build it.
    fn render(&mut self, ctx: &RenderContext) -> RenderResult<()> {
        ctx.check_viewport()?;
        self.build_scene(ctx)
    }
}
