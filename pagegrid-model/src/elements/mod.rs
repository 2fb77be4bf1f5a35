//! Built-in element types.

mod image;
mod text;

pub use image::ImageElement;
pub use text::TextElement;
