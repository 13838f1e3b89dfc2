//! Publish scheduler
//!
//! Interval-driven automation: once per tick the scheduler reads settings,
//! snapshots persisted state, and decides which articles to auto-publish,
//! which to auto-approve, and which ideas to start generating. All branching
//! lives in the pure `decide_tick` function so the policy is unit-testable
//! without timers or a database; the async loop only gathers the snapshot and
//! executes the returned actions.
//!
//! Ticks run to completion before the next fires. The only cross-tick state
//! is the single-flight guard on idea replenishment; everything else is
//! recomputed fresh from the store each tick.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Duration as ChronoDuration, Local, NaiveTime, Timelike, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use copydesk_common::events::{CopydeskEvent, EventBus};

use crate::db;
use crate::models::{ArticleStatus, RiskLevel};
use crate::services::publisher_client::{PublishError, PublishRequest, PublisherClient};
use crate::services::GenerationOrchestrator;
use crate::utils::html::{link_counts, normalize_title};
use crate::validators::QualityScorer;

/// Coarse auto-approve criteria count
const AUTO_APPROVE_CRITERIA: u8 = 5;
/// Minimum criteria met for auto-approval (the internal-link criterion is
/// additionally mandatory; see `auto_approve_decision`)
const AUTO_APPROVE_MIN_MET: u8 = 4;

// ============================================================================
// Settings
// ============================================================================

/// Daily time-of-day window during which auto-posting is blocked
///
/// May cross midnight: 22:00-06:00 blocks the late evening and early morning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishWindow {
    pub block_start: NaiveTime,
    pub block_end: NaiveTime,
}

impl PublishWindow {
    /// Whether `now` falls inside the blocked window `[start, end)`
    pub fn is_blocked(&self, now: NaiveTime) -> bool {
        if self.block_start <= self.block_end {
            self.block_start <= now && now < self.block_end
        } else {
            // Crossing midnight
            now >= self.block_start || now < self.block_end
        }
    }
}

/// How much the scheduler is allowed to do on its own
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutomationLevel {
    /// No automated generation; auto-post only if separately enabled
    Manual,
    /// Keep the idea queue topped up, but never generate articles
    SemiAuto,
    /// Idea replenishment, article generation, and auto-approval
    FullAuto,
}

impl std::str::FromStr for AutomationLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(AutomationLevel::Manual),
            "semi_auto" => Ok(AutomationLevel::SemiAuto),
            "full_auto" => Ok(AutomationLevel::FullAuto),
            other => Err(format!("Unknown automation level: {}", other)),
        }
    }
}

/// Per-tick scheduler configuration, read fresh from settings every tick
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    pub auto_post_enabled: bool,
    pub automation_level: AutomationLevel,
    pub publish_window: Option<PublishWindow>,
    pub max_concurrent_generation: usize,
    pub min_idea_queue: usize,
    pub auto_publish_delay_days: i64,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            auto_post_enabled: false,
            automation_level: AutomationLevel::Manual,
            publish_window: None,
            max_concurrent_generation: 2,
            min_idea_queue: 5,
            auto_publish_delay_days: 3,
        }
    }
}

/// Load scheduler settings, defaulting every unset or malformed key
pub async fn load_scheduler_settings(pool: &SqlitePool) -> Result<SchedulerSettings> {
    let defaults = SchedulerSettings::default();

    let block_start: Option<NaiveTime> = db::settings::get_setting::<String>(pool, "publish_block_start")
        .await?
        .and_then(|s| NaiveTime::parse_from_str(&s, "%H:%M").ok());
    let block_end: Option<NaiveTime> = db::settings::get_setting::<String>(pool, "publish_block_end")
        .await?
        .and_then(|s| NaiveTime::parse_from_str(&s, "%H:%M").ok());
    let publish_window = match (block_start, block_end) {
        (Some(block_start), Some(block_end)) => Some(PublishWindow { block_start, block_end }),
        _ => None,
    };

    Ok(SchedulerSettings {
        auto_post_enabled: db::settings::get_setting(pool, "auto_post_enabled")
            .await?
            .unwrap_or(defaults.auto_post_enabled),
        automation_level: db::settings::get_setting(pool, "automation_level")
            .await?
            .unwrap_or(defaults.automation_level),
        publish_window,
        max_concurrent_generation: db::settings::get_setting(pool, "max_concurrent_generation")
            .await?
            .unwrap_or(defaults.max_concurrent_generation),
        min_idea_queue: db::settings::get_setting(pool, "min_idea_queue")
            .await?
            .unwrap_or(defaults.min_idea_queue),
        auto_publish_delay_days: db::settings::get_setting(pool, "auto_publish_delay_days")
            .await?
            .unwrap_or(defaults.auto_publish_delay_days),
    })
}

// ============================================================================
// Snapshot and decision
// ============================================================================

/// Approved article facts needed for the auto-post decision
#[derive(Debug, Clone)]
pub struct ApprovedArticle {
    pub id: Uuid,
    pub risk_level: RiskLevel,
    pub auto_publish_deadline: Option<DateTime<Utc>>,
}

/// Draft/in-review article facts for the coarse auto-approve checklist
#[derive(Debug, Clone)]
pub struct ReviewCandidate {
    pub id: Uuid,
    pub word_count: i64,
    pub content_chars: usize,
    pub has_keywords: bool,
    pub internal_links: usize,
    pub external_links: usize,
}

/// A pending idea eligible for full-auto generation
#[derive(Debug, Clone)]
pub struct PendingIdea {
    pub id: Uuid,
    pub title: String,
}

/// Persisted-state snapshot gathered at the start of each tick
#[derive(Debug, Clone)]
pub struct TickSnapshot {
    pub approved: Vec<ApprovedArticle>,
    pub review_candidates: Vec<ReviewCandidate>,
    pub pending_ideas: Vec<PendingIdea>,
    pub pending_idea_count: usize,
    /// count(status ∈ {draft, in_review}), recomputed fresh each tick
    pub in_progress: usize,
    /// Normalized titles of every existing article
    pub existing_titles: Vec<String>,
    pub has_default_connection: bool,
    /// Single-flight guard observation
    pub generation_in_flight: bool,
}

impl Default for TickSnapshot {
    fn default() -> Self {
        Self {
            approved: Vec::new(),
            review_candidates: Vec::new(),
            pending_ideas: Vec::new(),
            pending_idea_count: 0,
            in_progress: 0,
            existing_titles: Vec::new(),
            has_default_connection: false,
            generation_in_flight: false,
        }
    }
}

/// One action the tick decided to take
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickAction {
    Publish { article_id: Uuid },
    Approve { article_id: Uuid, criteria_met: u8 },
    StartGeneration { idea_id: Uuid },
    ReplenishIdeas { count: usize },
}

/// Auto-approve checklist: how many of the five criteria hold, and whether the
/// mandatory internal-link criterion is among them
pub fn auto_approve_decision(candidate: &ReviewCandidate) -> (u8, bool) {
    let links_ok = candidate.internal_links >= 2;
    let criteria = [
        candidate.word_count >= 850,
        candidate.content_chars > 3000,
        candidate.has_keywords,
        links_ok,
        candidate.external_links >= 1,
    ];
    let met = criteria.iter().filter(|c| **c).count() as u8;
    (met, met >= AUTO_APPROVE_MIN_MET && links_ok)
}

/// Pure per-tick policy: state + settings + time in, actions out
///
/// `local_time` drives the block-window check; `now_utc` drives deadline
/// comparisons.
pub fn decide_tick(
    snapshot: &TickSnapshot,
    settings: &SchedulerSettings,
    now_utc: DateTime<Utc>,
    local_time: NaiveTime,
) -> Vec<TickAction> {
    let mut actions = Vec::new();

    // Auto-post pass: skipped entirely inside the block window or without a
    // usable default connection
    if settings.auto_post_enabled {
        let blocked = settings
            .publish_window
            .is_some_and(|w| w.is_blocked(local_time));
        if blocked {
            tracing::debug!("Auto-post skipped: inside publish block window");
        } else if !snapshot.has_default_connection {
            tracing::debug!("Auto-post skipped: no default connected publish target");
        } else {
            for article in &snapshot.approved {
                if !article.risk_level.allows_auto_publish() {
                    continue;
                }
                let deadline_passed = article
                    .auto_publish_deadline
                    .map_or(true, |deadline| deadline <= now_utc);
                if deadline_passed {
                    actions.push(TickAction::Publish { article_id: article.id });
                }
            }
        }
    }

    if settings.automation_level == AutomationLevel::FullAuto {
        // Auto-approve pass over draft/in-review articles
        for candidate in &snapshot.review_candidates {
            let (met, approve) = auto_approve_decision(candidate);
            if approve {
                actions.push(TickAction::Approve {
                    article_id: candidate.id,
                    criteria_met: met,
                });
            }
        }

        // Full-auto generation under the concurrency cap, skipping ideas whose
        // normalized title collides with an existing article title
        let budget = settings
            .max_concurrent_generation
            .saturating_sub(snapshot.in_progress);
        let mut started = 0;
        for idea in &snapshot.pending_ideas {
            if started >= budget {
                break;
            }
            let normalized = normalize_title(&idea.title);
            let collides = snapshot.existing_titles.iter().any(|existing| {
                existing == &normalized
                    || existing.contains(&normalized)
                    || normalized.contains(existing.as_str())
            });
            if collides {
                tracing::debug!(idea_id = %idea.id, title = %idea.title, "Idea skipped: title collides with existing article");
                continue;
            }
            actions.push(TickAction::StartGeneration { idea_id: idea.id });
            started += 1;
        }
    }

    // Idea replenishment behind the single-flight guard
    if settings.automation_level != AutomationLevel::Manual
        && snapshot.pending_idea_count < settings.min_idea_queue
        && !snapshot.generation_in_flight
    {
        actions.push(TickAction::ReplenishIdeas {
            count: settings.min_idea_queue - snapshot.pending_idea_count,
        });
    }

    actions
}

// ============================================================================
// Executor loop
// ============================================================================

/// Per-tick execution summary
#[derive(Debug, Clone, Copy, Default)]
pub struct TickSummary {
    pub published: usize,
    pub approved: usize,
    pub generations_started: usize,
    pub ideas_requested: usize,
}

/// Interval-driven scheduler over the persisted store
pub struct PublishScheduler {
    db: SqlitePool,
    event_bus: EventBus,
    orchestrator: Arc<GenerationOrchestrator>,
    publisher: Option<Arc<PublisherClient>>,
    generation_guard: Arc<AtomicBool>,
}

impl PublishScheduler {
    pub fn new(
        db: SqlitePool,
        event_bus: EventBus,
        orchestrator: Arc<GenerationOrchestrator>,
        publisher: Option<Arc<PublisherClient>>,
    ) -> Self {
        Self {
            db,
            event_bus,
            orchestrator,
            publisher,
            generation_guard: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Spawn the automation loop
    pub fn start(self: Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            tracing::info!(interval_secs = interval.as_secs(), "Publish scheduler started");

            loop {
                ticker.tick().await;

                match self.run_tick().await {
                    Ok(summary) => {
                        if summary.published + summary.approved + summary.generations_started > 0 {
                            tracing::info!(
                                published = summary.published,
                                approved = summary.approved,
                                generations = summary.generations_started,
                                "Scheduler tick complete"
                            );
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Scheduler tick failed");
                    }
                }
            }
        })
    }

    /// One full tick: settings → snapshot → decision → execution
    pub async fn run_tick(&self) -> Result<TickSummary> {
        let settings = load_scheduler_settings(&self.db).await?;
        let snapshot = self.build_snapshot().await?;

        let now_utc = Utc::now();
        let local = Local::now();
        let local_time =
            NaiveTime::from_hms_opt(local.hour(), local.minute(), local.second()).unwrap_or_default();

        let actions = decide_tick(&snapshot, &settings, now_utc, local_time);
        let summary = self.execute(actions, &settings).await;

        self.event_bus.emit_lossy(CopydeskEvent::SchedulerTick {
            published: summary.published,
            approved: summary.approved,
            generations_started: summary.generations_started,
            timestamp: Utc::now(),
        });

        Ok(summary)
    }

    async fn build_snapshot(&self) -> Result<TickSnapshot> {
        let approved = db::articles::load_by_status(&self.db, ArticleStatus::Approved)
            .await?
            .into_iter()
            .map(|a| ApprovedArticle {
                id: a.id,
                risk_level: a.risk_level,
                auto_publish_deadline: a.auto_publish_deadline,
            })
            .collect();

        let mut review_candidates = Vec::new();
        for status in [ArticleStatus::Draft, ArticleStatus::InReview] {
            for article in db::articles::load_by_status(&self.db, status).await? {
                let links = link_counts(&article.content, None);
                review_candidates.push(ReviewCandidate {
                    id: article.id,
                    word_count: article.word_count,
                    content_chars: article.content.len(),
                    has_keywords: !article.target_keywords.is_empty(),
                    internal_links: links.internal,
                    external_links: links.external,
                });
            }
        }

        let pending_ideas = db::ideas::load_pending_ideas(&self.db, 50)
            .await?
            .into_iter()
            .map(|idea| PendingIdea {
                id: idea.id,
                title: idea.title,
            })
            .collect();

        Ok(TickSnapshot {
            approved,
            review_candidates,
            pending_ideas,
            pending_idea_count: db::ideas::count_pending(&self.db).await? as usize,
            in_progress: db::articles::count_in_progress(&self.db).await? as usize,
            existing_titles: db::articles::load_all_titles(&self.db)
                .await?
                .iter()
                .map(|t| normalize_title(t))
                .collect(),
            has_default_connection: db::connections::has_default_connected(&self.db).await?,
            generation_in_flight: self.generation_guard.load(Ordering::SeqCst),
        })
    }

    async fn execute(&self, actions: Vec<TickAction>, settings: &SchedulerSettings) -> TickSummary {
        let mut summary = TickSummary::default();

        for action in actions {
            match action {
                TickAction::Publish { article_id } => {
                    match self.publish_article(article_id).await {
                        Ok(()) => summary.published += 1,
                        Err(e) => {
                            // Log and continue; the next tick retries
                            tracing::warn!(article_id = %article_id, error = %e, "Auto-publish failed");
                            self.event_bus.emit_lossy(CopydeskEvent::PublishFailed {
                                article_id,
                                error_message: e.to_string(),
                                timestamp: Utc::now(),
                            });
                        }
                    }
                }
                TickAction::Approve { article_id, criteria_met } => {
                    let deadline = Utc::now() + ChronoDuration::days(settings.auto_publish_delay_days);
                    match db::articles::approve(&self.db, article_id, deadline).await {
                        Ok(()) => {
                            summary.approved += 1;
                            tracing::info!(
                                article_id = %article_id,
                                criteria_met,
                                deadline = %deadline,
                                "Article auto-approved"
                            );
                            self.event_bus.emit_lossy(CopydeskEvent::ArticleAutoApproved {
                                article_id,
                                criteria_met,
                                auto_publish_deadline: deadline,
                                timestamp: Utc::now(),
                            });
                        }
                        Err(e) => {
                            tracing::warn!(article_id = %article_id, error = %e, "Auto-approve failed");
                        }
                    }
                }
                TickAction::StartGeneration { idea_id } => {
                    match db::ideas::load_idea(&self.db, idea_id).await {
                        Ok(Some(idea)) => match self.orchestrator.run_idea(&idea).await {
                            Ok(_) => summary.generations_started += 1,
                            Err(e) => {
                                tracing::warn!(idea_id = %idea_id, error = %e, "Generation run errored");
                            }
                        },
                        Ok(None) => {
                            tracing::warn!(idea_id = %idea_id, "Idea vanished before generation");
                        }
                        Err(e) => {
                            tracing::warn!(idea_id = %idea_id, error = %e, "Idea load failed");
                        }
                    }
                }
                TickAction::ReplenishIdeas { count } => {
                    // Single-flight: skip if another replenishment is running
                    if self
                        .generation_guard
                        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                        .is_ok()
                    {
                        match self.orchestrator.replenish_ideas(count).await {
                            Ok(accepted) => summary.ideas_requested += accepted,
                            Err(e) => {
                                tracing::warn!(error = %e, "Idea replenishment failed");
                            }
                        }
                        self.generation_guard.store(false, Ordering::SeqCst);
                    } else {
                        tracing::debug!("Idea replenishment already in flight, skipping");
                    }
                }
            }
        }

        summary
    }

    async fn publish_article(&self, article_id: Uuid) -> Result<()> {
        let article = db::articles::load_article(&self.db, article_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("article not found"))?;

        // Automated publication re-runs the quality gate on current content;
        // only a human override may publish past a failed critical check
        let thresholds = db::settings::load_quality_thresholds(&self.db).await?;
        let assessment = QualityScorer::new(thresholds)
            .assess(&article.content, article.target_keywords.first().map(|k| k.as_str()));
        if !assessment.can_publish {
            let blockers: Vec<String> = assessment
                .issues
                .iter()
                .map(|issue| issue.message.clone())
                .collect();
            db::articles::update_quality(
                &self.db,
                article.id,
                assessment.score as i64,
                &blockers,
                article.risk_level,
            )
            .await?;
            anyhow::bail!("quality gate failed: {}", blockers.join("; "));
        }

        let Some(publisher) = self.publisher.as_ref() else {
            anyhow::bail!("publish credential not configured");
        };

        let request = PublishRequest {
            title: article.title.clone(),
            content: article.content.clone(),
            excerpt: article.excerpt.clone(),
            status: "publish".to_string(),
            category_id: None,
        };

        let response = publisher
            .publish(&request)
            .await
            .map_err(|e: PublishError| anyhow::anyhow!(e))?;

        db::articles::mark_published(&self.db, article.id, &response.link).await?;

        tracing::info!(
            article_id = %article.id,
            published_url = %response.link,
            "Article auto-published"
        );
        self.event_bus.emit_lossy(CopydeskEvent::ArticlePublished {
            article_id: article.id,
            published_url: response.link,
            timestamp: Utc::now(),
        });

        Ok(())
    }
}
