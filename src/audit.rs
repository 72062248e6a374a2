use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// audit actions the engine emits; serialized in the sink's wire format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    AutomatedRepaymentSuccess,
    AutomatedRepaymentFailure,
    AutomatedRepaymentSkipped,
    NplFlagged,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::AutomatedRepaymentSuccess => "AUTOMATED_REPAYMENT_SUCCESS",
            AuditAction::AutomatedRepaymentFailure => "AUTOMATED_REPAYMENT_FAILURE",
            AuditAction::AutomatedRepaymentSkipped => "AUTOMATED_REPAYMENT_SKIPPED",
            AuditAction::NplFlagged => "NPL_FLAGGED",
        }
    }
}

/// one structured audit record; the sink is write-only, the engine never
/// reads events back
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// system actor for batch jobs, user id for manual operations
    pub actor_id: String,
    pub action: AuditAction,
    pub entity: String,
    pub entity_id: Uuid,
    pub details: String,
}

impl AuditEvent {
    pub fn new(
        actor_id: impl Into<String>,
        action: AuditAction,
        entity: impl Into<String>,
        entity_id: Uuid,
        details: impl Into<String>,
    ) -> Self {
        Self {
            actor_id: actor_id.into(),
            action,
            entity: entity.into(),
            entity_id,
            details: details.into(),
        }
    }
}

/// write-only audit collaborator
pub trait AuditSink {
    fn record(&mut self, event: AuditEvent);
}

/// in-memory sink for collecting events during tests and batch runs
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Vec<AuditEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn events(&self) -> &[AuditEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<AuditEvent> {
        std::mem::take(&mut self.events)
    }
}

impl AuditSink for RecordingSink {
    fn record(&mut self, event: AuditEvent) {
        self.events.push(event);
    }
}
