//! Pipeline integration tests
//!
//! Exercise the orchestrator, scheduler, and validators together against an
//! in-memory SQLite store. External services are unreachable here on purpose:
//! failure handling (abort-and-retry, publish-failure-and-continue) is part of
//! the contract under test.

use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use sqlx::SqlitePool;

use copydesk_common::events::EventBus;
use copydesk_engine::db;
use copydesk_engine::models::{Article, ArticleStatus, IdeaStatus, RiskLevel};
use copydesk_engine::scheduler::PublishScheduler;
use copydesk_engine::services::idea_intake::{admit_idea, IdeaAdmission, NewIdea};
use copydesk_engine::services::{
    DraftClient, GenerationOrchestrator, HumanizerClient, LinkWeaverClient,
};

/// Port 9 (discard) is never serving; connections fail fast
const DEAD_SERVICE_URL: &str = "http://127.0.0.1:9";

async fn test_pool() -> SqlitePool {
    let pool = SqlitePool::connect(":memory:").await.unwrap();
    db::init_tables(&pool).await.unwrap();
    pool
}

fn dead_orchestrator(pool: SqlitePool, bus: EventBus) -> Arc<GenerationOrchestrator> {
    Arc::new(GenerationOrchestrator::new(
        pool,
        bus,
        DraftClient::new(DEAD_SERVICE_URL.to_string()).unwrap(),
        HumanizerClient::new(DEAD_SERVICE_URL.to_string()).unwrap(),
        LinkWeaverClient::new(DEAD_SERVICE_URL.to_string()).unwrap(),
    ))
}

fn new_idea(title: &str) -> NewIdea {
    NewIdea {
        title: title.to_string(),
        description: "test description".to_string(),
        keywords: vec!["savings".to_string()],
        content_type: "guide".to_string(),
        source_tag: "manual".to_string(),
    }
}

/// Content that clears both the coarse auto-approve checklist and the quality
/// gate's critical checks: 3 internal links, 1 external link, > 3000 characters
fn approvable_content() -> String {
    let mut content = String::from(
        r#"<p>See <a href="/savings">savings</a>, <a href="/cds">CDs</a>,
           and <a href="/checking">checking</a>,
           plus <a href="https://fdic.gov/data">FDIC data</a>.</p>"#,
    );
    while content.len() <= 3000 {
        content.push_str("<p>Filler paragraph with enough prose to grow the body.</p>");
    }
    content
}

#[tokio::test]
async fn test_failed_draft_call_leaves_idea_pending_for_retry() {
    let pool = test_pool().await;
    let bus = EventBus::new(64);
    let orchestrator = dead_orchestrator(pool.clone(), bus.clone());

    let admission = admit_idea(&pool, &bus, new_idea("Emergency fund sizing")).await.unwrap();
    let IdeaAdmission::Accepted(idea) = admission else {
        panic!("idea should be accepted");
    };

    let outcome = orchestrator.run_idea(&idea).await.unwrap();
    assert!(matches!(
        outcome,
        copydesk_engine::services::RunOutcome::Aborted { stage: "drafting" }
    ));

    // The idea is untouched and re-triable on the next cycle
    let stored = db::ideas::load_idea(&pool, idea.id).await.unwrap().unwrap();
    assert_eq!(stored.status, IdeaStatus::Pending);
    assert_eq!(db::ideas::count_pending(&pool).await.unwrap(), 1);

    // No article or version was persisted
    assert!(db::articles::load_all_titles(&pool).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_scheduler_tick_auto_approves_checklist_passers() {
    let pool = test_pool().await;
    let bus = EventBus::new(64);
    let orchestrator = dead_orchestrator(pool.clone(), bus.clone());

    db::settings::set_setting(&pool, "automation_level", "full_auto").await.unwrap();
    db::settings::set_setting(&pool, "auto_publish_delay_days", 2).await.unwrap();

    // Passer: checklist-clean draft
    let mut passer = Article::new(
        "Checklist passer".to_string(),
        approvable_content(),
        String::new(),
        vec!["savings".to_string()],
    );
    passer.word_count = 900;
    db::articles::insert_article(&pool, &passer).await.unwrap();

    // Non-passer: only one internal link
    let mut failer = Article::new(
        "Checklist failer".to_string(),
        format!(
            r#"<p><a href="/only-one">one</a> and <a href="https://x.example">ext</a></p>{}"#,
            "<p>padding paragraph to cross the length bar.</p>".repeat(80)
        ),
        String::new(),
        vec!["savings".to_string()],
    );
    failer.word_count = 900;
    db::articles::insert_article(&pool, &failer).await.unwrap();

    let scheduler = Arc::new(PublishScheduler::new(pool.clone(), bus, orchestrator, None));
    let summary = scheduler.run_tick().await.unwrap();

    assert_eq!(summary.approved, 1);

    let approved = db::articles::load_article(&pool, passer.id).await.unwrap().unwrap();
    assert_eq!(approved.status, ArticleStatus::Approved);
    let deadline = approved.auto_publish_deadline.expect("approval stamps a deadline");
    let expected = Utc::now() + ChronoDuration::days(2);
    assert!((deadline - expected).num_minutes().abs() < 5);

    let rejected = db::articles::load_article(&pool, failer.id).await.unwrap().unwrap();
    assert_eq!(rejected.status, ArticleStatus::Draft);
}

#[tokio::test]
async fn test_publish_failure_keeps_article_approved_for_next_tick() {
    let pool = test_pool().await;
    let bus = EventBus::new(64);
    let orchestrator = dead_orchestrator(pool.clone(), bus.clone());

    db::settings::set_setting(&pool, "auto_post_enabled", true).await.unwrap();

    // A default connected target exists, so the auto-post pass runs
    let mut connection = db::connections::PublishConnection::new(
        "main".to_string(),
        "https://cms.example".to_string(),
    );
    connection.is_default = true;
    connection.connected = true;
    db::connections::save_connection(&pool, &connection).await.unwrap();

    let mut article = Article::new(
        "Overdue approved article".to_string(),
        approvable_content(),
        String::new(),
        vec![],
    );
    article.word_count = 900;
    db::articles::insert_article(&pool, &article).await.unwrap();
    db::articles::approve(&pool, article.id, Utc::now() - ChronoDuration::hours(1))
        .await
        .unwrap();
    db::articles::update_quality(&pool, article.id, 90, &[], RiskLevel::Low).await.unwrap();

    // No publisher configured: the publish attempt fails, is logged, and the
    // article remains approved so the next tick retries
    let scheduler = Arc::new(PublishScheduler::new(pool.clone(), bus, orchestrator, None));
    let summary = scheduler.run_tick().await.unwrap();

    assert_eq!(summary.published, 0);
    let stored = db::articles::load_article(&pool, article.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ArticleStatus::Approved);
}

#[tokio::test]
async fn test_auto_post_pass_skipped_without_connection() {
    let pool = test_pool().await;
    let bus = EventBus::new(64);
    let orchestrator = dead_orchestrator(pool.clone(), bus.clone());

    db::settings::set_setting(&pool, "auto_post_enabled", true).await.unwrap();

    let mut article = Article::new(
        "Would publish if connected".to_string(),
        approvable_content(),
        String::new(),
        vec![],
    );
    article.word_count = 900;
    db::articles::insert_article(&pool, &article).await.unwrap();
    db::articles::approve(&pool, article.id, Utc::now() - ChronoDuration::hours(1))
        .await
        .unwrap();
    db::articles::update_quality(&pool, article.id, 90, &[], RiskLevel::Low).await.unwrap();

    let scheduler = Arc::new(PublishScheduler::new(pool.clone(), bus, orchestrator, None));
    let summary = scheduler.run_tick().await.unwrap();

    assert_eq!(summary.published, 0);
    let stored = db::articles::load_article(&pool, article.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ArticleStatus::Approved);
}

#[tokio::test]
async fn test_high_risk_article_never_auto_published() {
    let pool = test_pool().await;
    let bus = EventBus::new(64);
    let orchestrator = dead_orchestrator(pool.clone(), bus.clone());

    db::settings::set_setting(&pool, "auto_post_enabled", true).await.unwrap();

    let mut connection = db::connections::PublishConnection::new(
        "main".to_string(),
        "https://cms.example".to_string(),
    );
    connection.is_default = true;
    connection.connected = true;
    db::connections::save_connection(&pool, &connection).await.unwrap();

    let mut article = Article::new(
        "High risk article".to_string(),
        approvable_content(),
        String::new(),
        vec![],
    );
    article.word_count = 900;
    db::articles::insert_article(&pool, &article).await.unwrap();
    db::articles::approve(&pool, article.id, Utc::now() - ChronoDuration::hours(1))
        .await
        .unwrap();
    db::articles::update_quality(&pool, article.id, 95, &[], RiskLevel::High).await.unwrap();

    let scheduler = Arc::new(PublishScheduler::new(pool.clone(), bus, orchestrator, None));
    let summary = scheduler.run_tick().await.unwrap();

    // Risk gating filters the article before any publish attempt
    assert_eq!(summary.published, 0);
    let stored = db::articles::load_article(&pool, article.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ArticleStatus::Approved);
}

#[tokio::test]
async fn test_auto_publish_rechecks_quality_gate() {
    let pool = test_pool().await;
    let bus = EventBus::new(64);
    let orchestrator = dead_orchestrator(pool.clone(), bus.clone());

    db::settings::set_setting(&pool, "auto_post_enabled", true).await.unwrap();

    let mut connection = db::connections::PublishConnection::new(
        "main".to_string(),
        "https://cms.example".to_string(),
    );
    connection.is_default = true;
    connection.connected = true;
    db::connections::save_connection(&pool, &connection).await.unwrap();

    // Approved and low risk, but the content has a single internal link and
    // therefore fails the critical internal-link check
    let mut article = Article::new(
        "Under-linked approved article".to_string(),
        format!(
            r#"<p><a href="/one">one</a> and <a href="https://x.example">ext</a></p>{}"#,
            "<p>padding paragraph to cross the length bar.</p>".repeat(80)
        ),
        String::new(),
        vec![],
    );
    article.word_count = 900;
    db::articles::insert_article(&pool, &article).await.unwrap();
    db::articles::approve(&pool, article.id, Utc::now() - ChronoDuration::hours(1))
        .await
        .unwrap();
    db::articles::update_quality(&pool, article.id, 80, &[], RiskLevel::Low).await.unwrap();

    let scheduler = Arc::new(PublishScheduler::new(pool.clone(), bus, orchestrator, None));
    let summary = scheduler.run_tick().await.unwrap();

    assert_eq!(summary.published, 0);
    let stored = db::articles::load_article(&pool, article.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ArticleStatus::Approved);
    assert!(
        stored.quality_issues.iter().any(|i| i.contains("internal links")),
        "the refreshed snapshot records the blocking issue"
    );
}

#[tokio::test]
async fn test_intake_dedup_blocks_near_duplicate_of_article() {
    let pool = test_pool().await;
    let bus = EventBus::new(64);

    let article = Article::new(
        "How to build a CD ladder".to_string(),
        "<p>body</p>".to_string(),
        String::new(),
        vec![],
    );
    db::articles::insert_article(&pool, &article).await.unwrap();

    let admission = admit_idea(&pool, &bus, new_idea("How to build a CD ladder!")).await.unwrap();
    match admission {
        IdeaAdmission::RejectedDuplicate { matched_title, similarity, .. } => {
            assert_eq!(matched_title, "How to build a CD ladder");
            assert!(similarity > 0.70);
        }
        other => panic!("expected duplicate rejection, got {:?}", other),
    }
    assert_eq!(db::ideas::count_pending(&pool).await.unwrap(), 0);
}
