// The core module contains all business logic.
// Nothing in here knows about Google, HTTP or the command line.

#[path = "errors.rs"]
pub mod errors;

#[path = "sheet/mod.rs"]
pub mod sheet;

#[path = "document/mod.rs"]
pub mod document;

#[path = "export/mod.rs"]
pub mod export;
