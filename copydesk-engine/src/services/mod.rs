//! Pipeline services
//!
//! External-service clients plus the decision logic that stitches them into
//! the generation pipeline.

pub mod contributor_matcher;
pub mod draft_client;
pub mod generation_orchestrator;
pub mod humanizer_client;
pub mod idea_intake;
pub mod link_weaver_client;
pub mod publisher_client;
pub(crate) mod rate_limit;
pub mod similarity;

pub use draft_client::DraftClient;
pub use generation_orchestrator::{GenerationOrchestrator, RunOutcome};
pub use humanizer_client::HumanizerClient;
pub use link_weaver_client::LinkWeaverClient;
pub use publisher_client::{PublisherClient, ShortcodePolicy};
