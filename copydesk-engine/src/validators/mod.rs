//! Content validation layer
//!
//! Two validators gate and audit pipeline output:
//! - `quality_scorer`: deterministic multi-check publish gate
//! - `revision_validator`: advisory before/after verification of reviewer
//!   feedback

pub mod quality_scorer;
pub mod revision_validator;

pub use quality_scorer::{QualityAssessment, QualityScorer, QualityThresholds};
pub use revision_validator::{RevisionReport, RevisionValidator};
