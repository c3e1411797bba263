// HTTP adapter. Translates JSON requests into export pipeline calls and
// pipeline results back into responses. No business logic lives here.

#[path = "api_error.rs"]
pub mod api_error;

#[path = "handlers.rs"]
pub mod handlers;

#[path = "router.rs"]
pub mod router;

pub use router::build_router;
