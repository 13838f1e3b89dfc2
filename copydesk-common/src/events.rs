//! Event types for the copydesk pipeline
//!
//! Every state transition the pipeline makes is announced on the EventBus so
//! that the API layer (SSE) and any other subscriber can observe progress
//! without polling the database.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Copydesk pipeline event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CopydeskEvent {
    /// Idea rejected during intake because it duplicates an existing title
    IdeaRejectedDuplicate {
        idea_id: Uuid,
        matched_title: String,
        similarity: f64,
        timestamp: DateTime<Utc>,
    },

    /// Generation run started for an idea
    GenerationStarted {
        idea_id: Uuid,
        title: String,
        timestamp: DateTime<Utc>,
    },

    /// A pipeline stage completed for an idea
    GenerationStageCompleted {
        idea_id: Uuid,
        stage: String,
        timestamp: DateTime<Utc>,
    },

    /// Generation run aborted; the idea stays pending and is re-triable
    GenerationFailed {
        idea_id: Uuid,
        stage: String,
        error_message: String,
        timestamp: DateTime<Utc>,
    },

    /// Article persisted and scored
    ArticleScored {
        article_id: Uuid,
        score: u8,
        can_publish: bool,
        risk_level: String,
        timestamp: DateTime<Utc>,
    },

    /// Article auto-approved by the scheduler's coarse checklist
    ArticleAutoApproved {
        article_id: Uuid,
        criteria_met: u8,
        auto_publish_deadline: DateTime<Utc>,
        timestamp: DateTime<Utc>,
    },

    /// Article pushed to the publishing endpoint
    ArticlePublished {
        article_id: Uuid,
        published_url: String,
        timestamp: DateTime<Utc>,
    },

    /// Publishing attempt failed; retried on a later tick
    PublishFailed {
        article_id: Uuid,
        error_message: String,
        timestamp: DateTime<Utc>,
    },

    /// Scheduler tick summary
    SchedulerTick {
        published: usize,
        approved: usize,
        generations_started: usize,
        timestamp: DateTime<Utc>,
    },
}

impl CopydeskEvent {
    /// Event name used as the SSE event type
    pub fn event_type(&self) -> &'static str {
        match self {
            CopydeskEvent::IdeaRejectedDuplicate { .. } => "IdeaRejectedDuplicate",
            CopydeskEvent::GenerationStarted { .. } => "GenerationStarted",
            CopydeskEvent::GenerationStageCompleted { .. } => "GenerationStageCompleted",
            CopydeskEvent::GenerationFailed { .. } => "GenerationFailed",
            CopydeskEvent::ArticleScored { .. } => "ArticleScored",
            CopydeskEvent::ArticleAutoApproved { .. } => "ArticleAutoApproved",
            CopydeskEvent::ArticlePublished { .. } => "ArticlePublished",
            CopydeskEvent::PublishFailed { .. } => "PublishFailed",
            CopydeskEvent::SchedulerTick { .. } => "SchedulerTick",
        }
    }
}

/// Broadcast-based event bus shared across the pipeline
///
/// Backed by `tokio::broadcast`, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<CopydeskEvent>,
    capacity: usize,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<CopydeskEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: CopydeskEvent,
    ) -> std::result::Result<usize, broadcast::error::SendError<CopydeskEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring the case where no subscriber is listening
    pub fn emit_lossy(&self, event: CopydeskEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("Event emitted with no active subscribers");
        }
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_emit_and_receive() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.emit_lossy(CopydeskEvent::GenerationStarted {
            idea_id: Uuid::new_v4(),
            title: "Test idea".to_string(),
            timestamp: Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        assert!(matches!(event, CopydeskEvent::GenerationStarted { .. }));
    }

    #[test]
    fn test_emit_without_subscribers_is_lossy() {
        let bus = EventBus::new(4);
        // No subscriber attached; must not panic or error out
        bus.emit_lossy(CopydeskEvent::SchedulerTick {
            published: 0,
            approved: 0,
            generations_started: 0,
            timestamp: Utc::now(),
        });
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = CopydeskEvent::PublishFailed {
            article_id: Uuid::new_v4(),
            error_message: "endpoint unreachable".to_string(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "PublishFailed");
    }
}
