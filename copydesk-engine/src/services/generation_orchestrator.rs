//! Generation orchestrator
//!
//! Sequences one idea through the pipeline:
//! drafting → contributor assignment → humanizing → linking → scoring → persistence
//!
//! Each external call is a single attempt. A failed draft or humanize call
//! aborts the run and leaves the idea `pending` so the next automation cycle
//! can retry it; link insertion is best-effort and falls back to the unlinked
//! content. Immediately before persisting, the normalized title is re-checked
//! against existing articles; a duplicate rejects the idea and discards the
//! generated content.

use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use copydesk_common::events::{CopydeskEvent, EventBus};

use crate::db;
use crate::models::{Article, ArticleVersion, Idea, VersionSource};
use crate::services::contributor_matcher;
use crate::services::draft_client::{DraftClient, DraftRequest, IdeaSuggestionRequest};
use crate::services::humanizer_client::{HumanizeRequest, HumanizerClient};
use crate::services::idea_intake::{self, NewIdea};
use crate::services::link_weaver_client::{LinkInsertRequest, LinkWeaverClient, MIN_CATALOG_ENTRIES};
use crate::services::publisher_client::ShortcodePolicy;
use crate::utils::html;
use crate::validators::quality_scorer::{derive_risk_level, QualityScorer};

/// Default word target handed to the draft service
const DEFAULT_TARGET_WORD_COUNT: usize = 1200;

/// Outcome of one idea's pipeline run
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// Article persisted as draft
    Persisted {
        article_id: Uuid,
        score: u8,
        can_publish: bool,
    },
    /// Pre-persist duplicate check fired; idea rejected, content discarded
    RejectedDuplicate { matched_title: String },
    /// An external stage failed; idea left pending for retry
    Aborted { stage: &'static str },
}

/// Orchestrates the multi-vendor generation sequence, one idea at a time
pub struct GenerationOrchestrator {
    db: SqlitePool,
    event_bus: EventBus,
    draft_client: DraftClient,
    humanizer_client: HumanizerClient,
    link_client: LinkWeaverClient,
    thresholds_cache: db::settings::ThresholdsCache,
    shortcode_policy: ShortcodePolicy,
    target_word_count: usize,
}

impl GenerationOrchestrator {
    pub fn new(
        db: SqlitePool,
        event_bus: EventBus,
        draft_client: DraftClient,
        humanizer_client: HumanizerClient,
        link_client: LinkWeaverClient,
    ) -> Self {
        Self {
            db,
            event_bus,
            draft_client,
            humanizer_client,
            link_client,
            thresholds_cache: db::settings::ThresholdsCache::with_default_ttl(),
            shortcode_policy: ShortcodePolicy::default(),
            target_word_count: DEFAULT_TARGET_WORD_COUNT,
        }
    }

    /// Run one idea through the full pipeline
    ///
    /// Database errors propagate; external-service failures are absorbed into
    /// `RunOutcome::Aborted` so the calling loop continues with the next idea.
    pub async fn run_idea(&self, idea: &Idea) -> Result<RunOutcome> {
        tracing::info!(idea_id = %idea.id, title = %idea.title, "Starting generation run");
        self.event_bus.emit_lossy(CopydeskEvent::GenerationStarted {
            idea_id: idea.id,
            title: idea.title.clone(),
            timestamp: Utc::now(),
        });

        // Stage 1: DRAFTING - external draft service, structured response
        let draft_request = DraftRequest {
            idea_title: idea.title.clone(),
            description: idea.description.clone(),
            keywords: idea.keywords.clone(),
            content_type: idea.content_type.clone(),
            target_word_count: self.target_word_count,
        };
        let draft = match self.draft_client.generate(&draft_request).await {
            Ok(draft) => draft,
            Err(e) => return Ok(self.abort(idea, "drafting", &e.to_string())),
        };
        self.stage_completed(idea, "drafting");

        // Stage 2: CONTRIBUTOR - best-effort style assignment
        let contributors = match db::contributors::load_all_contributors(&self.db).await {
            Ok(contributors) => contributors,
            Err(e) => {
                tracing::warn!(idea_id = %idea.id, error = %e, "Contributor fetch failed, continuing unassigned");
                Vec::new()
            }
        };
        let contributor = contributor_matcher::best_match(idea, &contributors);
        let style_profile = contributor.and_then(|c| c.style_profile.clone());
        self.stage_completed(idea, "contributor");

        // Stage 3: HUMANIZING - external style rewrite
        let humanize_request = HumanizeRequest {
            content: draft.content.clone(),
            style_profile,
        };
        let humanized = match self.humanizer_client.humanize(&humanize_request).await {
            Ok(content) => content,
            Err(e) => return Ok(self.abort(idea, "humanizing", &e.to_string())),
        };
        self.stage_completed(idea, "humanizing");

        // Stage 4: LINKING - best-effort, needs a usable catalog
        let catalog = db::articles::load_link_catalog(&self.db).await?;
        let linked = if catalog.len() >= MIN_CATALOG_ENTRIES {
            let link_request = LinkInsertRequest {
                content: humanized.clone(),
                catalog,
            };
            match self.link_client.insert_links(&link_request).await {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!(
                        idea_id = %idea.id,
                        error = %e,
                        "Link insertion failed, falling back to unlinked content"
                    );
                    humanized
                }
            }
        } else {
            tracing::debug!(
                idea_id = %idea.id,
                catalog_entries = catalog.len(),
                "Link catalog too small, skipping link insertion"
            );
            humanized
        };
        self.stage_completed(idea, "linking");

        // Stage 5: SCORING
        let thresholds = self.thresholds_cache.get(&self.db).await?;
        let scorer = QualityScorer::new(thresholds);
        let assessment = scorer.assess(&linked, Some(&draft.focus_keyword));
        let risk_level = derive_risk_level(
            &assessment,
            self.shortcode_policy.has_monetization(&linked),
        );
        self.stage_completed(idea, "scoring");

        // Stage 6: duplicate re-check on the exact normalized title
        if let Some(existing) = db::articles::load_by_normalized_title(&self.db, &draft.title).await? {
            let reason = format!("Duplicate of: {}", existing.title);
            db::ideas::mark_rejected(&self.db, idea.id, &reason).await?;

            tracing::info!(
                idea_id = %idea.id,
                matched_title = %existing.title,
                "Generated title duplicates existing article, discarding content"
            );
            self.event_bus.emit_lossy(CopydeskEvent::IdeaRejectedDuplicate {
                idea_id: idea.id,
                matched_title: existing.title.clone(),
                similarity: 1.0,
                timestamp: Utc::now(),
            });

            return Ok(RunOutcome::RejectedDuplicate {
                matched_title: existing.title,
            });
        }

        // Stage 7: PERSISTENCE - article draft, version snapshot, idea closure
        let mut article = Article::new(
            draft.title,
            linked.clone(),
            draft.excerpt,
            idea.keywords.clone(),
        );
        article.word_count = html::word_count(&linked) as i64;
        article.quality_score = Some(assessment.score as i64);
        article.quality_issues = assessment.issues.iter().map(|i| i.message.clone()).collect();
        article.risk_level = risk_level;
        article.contributor_id = contributor.map(|c| c.id);

        db::articles::insert_article(&self.db, &article).await?;
        db::article_versions::save_version(
            &self.db,
            &ArticleVersion::new(article.id, linked, VersionSource::Original),
        )
        .await?;
        db::ideas::mark_completed(&self.db, idea.id, article.id).await?;

        tracing::info!(
            idea_id = %idea.id,
            article_id = %article.id,
            score = assessment.score,
            can_publish = assessment.can_publish,
            risk_level = %risk_level.as_str(),
            "Generation run persisted"
        );
        self.event_bus.emit_lossy(CopydeskEvent::ArticleScored {
            article_id: article.id,
            score: assessment.score,
            can_publish: assessment.can_publish,
            risk_level: risk_level.as_str().to_string(),
            timestamp: Utc::now(),
        });

        Ok(RunOutcome::Persisted {
            article_id: article.id,
            score: assessment.score,
            can_publish: assessment.can_publish,
        })
    }

    /// Ask the draft service for fresh topics and run each through intake dedup
    ///
    /// Returns the number of suggestions that survived dedup. Used by the
    /// scheduler's idea replenishment under its single-flight guard.
    pub async fn replenish_ideas(&self, count: usize) -> Result<usize> {
        let mut existing = db::ideas::load_active_titles(&self.db).await?;
        existing.extend(db::articles::load_all_titles(&self.db).await?);

        let request = IdeaSuggestionRequest {
            count,
            existing_titles: existing,
        };
        let suggestions = match self.draft_client.suggest_ideas(&request).await {
            Ok(suggestions) => suggestions,
            Err(e) => {
                tracing::warn!(error = %e, "Idea suggestion call failed");
                return Ok(0);
            }
        };

        let mut accepted = 0;
        for suggestion in suggestions {
            let admission = idea_intake::admit_idea(
                &self.db,
                &self.event_bus,
                NewIdea {
                    title: suggestion.title,
                    description: suggestion.description,
                    keywords: suggestion.keywords,
                    content_type: suggestion.content_type,
                    source_tag: "auto".to_string(),
                },
            )
            .await?;

            if matches!(admission, idea_intake::IdeaAdmission::Accepted(_)) {
                accepted += 1;
            }
        }

        tracing::info!(accepted, "Idea replenishment complete");
        Ok(accepted)
    }

    fn stage_completed(&self, idea: &Idea, stage: &'static str) {
        tracing::debug!(idea_id = %idea.id, stage, "Stage completed");
        self.event_bus.emit_lossy(CopydeskEvent::GenerationStageCompleted {
            idea_id: idea.id,
            stage: stage.to_string(),
            timestamp: Utc::now(),
        });
    }

    /// Absorb an external-service failure: log, announce, leave the idea pending
    fn abort(&self, idea: &Idea, stage: &'static str, error: &str) -> RunOutcome {
        tracing::warn!(
            idea_id = %idea.id,
            stage,
            error,
            "Generation run aborted, idea stays pending for retry"
        );
        self.event_bus.emit_lossy(CopydeskEvent::GenerationFailed {
            idea_id: idea.id,
            stage: stage.to_string(),
            error_message: error.to_string(),
            timestamp: Utc::now(),
        });
        RunOutcome::Aborted { stage }
    }
}
