pub mod assembler;
pub mod document_models;

pub use assembler::assemble;
pub use document_models::{AssembledDocument, Section};
