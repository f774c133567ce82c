//! Raster image shape.

use super::ShapeBehavior;
use base64::{Engine, engine::general_purpose::STANDARD};
use kurbo::{BezPath, Point, Rect, Shape as KurboShape, Size};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from the asynchronous image pipeline.
#[derive(Debug, Error)]
pub enum ImageLoadError {
    #[error("upload failed: {0}")]
    Upload(String),
    #[error("could not decode image: {0}")]
    Decode(String),
    #[error("image request was cancelled")]
    Cancelled,
}

/// Image format for stored image data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
    WebP,
    Gif,
}

impl ImageFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::WebP => "image/webp",
            ImageFormat::Gif => "image/gif",
        }
    }

    /// Detect format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(ImageFormat::Png);
        }
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }
        if data.starts_with(b"GIF8") {
            return Some(ImageFormat::Gif);
        }
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::WebP);
        }
        None
    }
}

/// Where the pixels come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ImageSource {
    /// Uploaded; the host resolves the URL.
    Url { url: String },
    /// Inline base64 payload, used when upload is unavailable.
    Embedded { data: String },
    /// Loading failed; drawn as a crossed box.
    Placeholder,
}

/// Payload delivered by the host once an image request resolves.
#[derive(Debug)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub source_width: u32,
    pub source_height: u32,
    /// Result of uploading `bytes`. On failure the bytes are embedded.
    pub url: Result<String, ImageLoadError>,
}

/// A raster image shown inside its frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub source: ImageSource,
    pub source_width: u32,
    pub source_height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<ImageFormat>,
}

impl Image {
    pub const PLACEHOLDER_SIZE: Size = Size::new(200.0, 150.0);

    pub fn from_url(url: impl Into<String>, source_width: u32, source_height: u32) -> Self {
        Self {
            source: ImageSource::Url { url: url.into() },
            source_width,
            source_height,
            format: None,
        }
    }

    pub fn embedded(data: &[u8], source_width: u32, source_height: u32) -> Self {
        Self {
            source: ImageSource::Embedded {
                data: STANDARD.encode(data),
            },
            source_width,
            source_height,
            format: ImageFormat::from_magic_bytes(data),
        }
    }

    pub fn placeholder() -> Self {
        Self {
            source: ImageSource::Placeholder,
            source_width: Self::PLACEHOLDER_SIZE.width as u32,
            source_height: Self::PLACEHOLDER_SIZE.height as u32,
            format: None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.source, ImageSource::Placeholder)
    }

    /// Raw bytes of an embedded image.
    pub fn data(&self) -> Option<Vec<u8>> {
        match &self.source {
            ImageSource::Embedded { data } => STANDARD.decode(data).ok(),
            _ => None,
        }
    }

    /// Display size fitting within `max` while keeping the source aspect ratio.
    pub fn fit_size(&self, max: Size) -> Size {
        if self.source_width == 0 || self.source_height == 0 {
            return Self::PLACEHOLDER_SIZE;
        }
        let source = Size::new(self.source_width as f64, self.source_height as f64);
        if source.width <= max.width && source.height <= max.height {
            return source;
        }
        let aspect = source.width / source.height;
        if aspect > max.width / max.height {
            Size::new(max.width, max.width / aspect)
        } else {
            Size::new(max.height * aspect, max.height)
        }
    }
}

impl ShapeBehavior for Image {
    fn min_size(&self) -> Size {
        Size::new(20.0, 20.0)
    }

    fn local_path(&self, size: Size) -> BezPath {
        Rect::from_center_size(Point::ZERO, size).to_path(0.1)
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
