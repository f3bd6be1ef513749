pub mod render;
pub mod text;

pub use render::{SkiaRenderer, Style, fixation_pixmap};
pub use text::{render_text_pixmap, text_width, wrap_lines};
