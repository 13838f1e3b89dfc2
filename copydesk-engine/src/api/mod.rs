//! HTTP API surface
//!
//! Thin axum routes over the pipeline: health, idea intake, article listing,
//! advisory revision validation, and the SSE event stream. No HTML rendering
//! lives here; the UI is a separate consumer of these endpoints.

pub mod articles;
pub mod health;
pub mod ideas;
pub mod revisions;
pub mod sse;

pub use articles::article_routes;
pub use health::health_routes;
pub use ideas::idea_routes;
pub use revisions::revision_routes;
pub use sse::event_stream;
