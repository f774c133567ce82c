//! Sketchboard Render Library
//!
//! Renderer abstraction for sketchboard, plus a backend that records the
//! draw calls the editor issues into a display list.

mod display_list;
mod renderer;

pub use display_list::{DisplayList, DisplayListRenderer, DrawCommand};
pub use renderer::{GridStyle, RenderContext, RenderResult, Renderer, RendererError};
