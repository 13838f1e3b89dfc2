//! Domain models for the generation-and-gating pipeline

pub mod article;
pub mod contributor;
pub mod feedback;
pub mod idea;

pub use article::{Article, ArticleStatus, ArticleVersion, RiskLevel, VersionSource};
pub use contributor::Contributor;
pub use feedback::FeedbackItem;
pub use idea::{Idea, IdeaStatus};
