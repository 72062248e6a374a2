use chrono::Duration;
use hourglass_rs::SafeTimeProvider;
use tracing::info;

use crate::audit::{AuditAction, AuditEvent, AuditSink};
use crate::errors::Result;
use crate::storage::{LendingStore, StoreTx};

const NPL_ACTOR: &str = "SYSTEM";

/// per-invocation classification counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NplSummary {
    pub providers_scanned: u64,
    /// borrowers actually transitioned to NPL; already-flagged borrowers
    /// are not recounted
    pub borrowers_flagged: u64,
}

/// batch job flagging borrowers whose unpaid loans have aged past the
/// provider's NPL threshold. Age is measured from disbursement, not the
/// due date.
pub struct NplClassifier;

impl NplClassifier {
    pub fn run<S, A>(store: &S, audit: &mut A, time: &SafeTimeProvider) -> Result<NplSummary>
    where
        S: LendingStore,
        A: AuditSink,
    {
        let today = time.now().date_naive();
        let mut summary = NplSummary::default();

        for provider in store.providers()? {
            let threshold_date = today - Duration::days(provider.npl_threshold_days as i64);
            let flagged = store
                .run_in_transaction(|tx| tx.flag_npl_borrowers(provider.id, threshold_date))?;

            summary.providers_scanned += 1;
            summary.borrowers_flagged += flagged;

            if flagged > 0 {
                audit.record(AuditEvent::new(
                    NPL_ACTOR,
                    AuditAction::NplFlagged,
                    "provider",
                    provider.id,
                    format!("{flagged} borrowers flagged past {threshold_date}"),
                ));
            }
            info!(provider_id = %provider.id, %threshold_date, flagged, "npl classification");
        }

        info!(
            providers = summary.providers_scanned,
            flagged = summary.borrowers_flagged,
            "npl classification finished"
        );
        Ok(summary)
    }
}
