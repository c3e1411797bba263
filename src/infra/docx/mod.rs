// Document serialization formats.

pub mod docx_renderer;

pub use docx_renderer::DocxRenderer;
