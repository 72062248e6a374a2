pub mod npl;
pub mod sweep;

use std::fmt;
use std::str::FromStr;

use hourglass_rs::SafeTimeProvider;

use crate::audit::AuditSink;
use crate::errors::{LendingError, Result};
use crate::storage::LendingStore;

pub use npl::{NplClassifier, NplSummary};
pub use sweep::{BalanceSource, RepaymentSweepWorker, SweepSummary};

/// scheduled batch tasks; the external scheduler invokes them by name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchTask {
    Repayment,
    Npl,
}

impl FromStr for BatchTask {
    type Err = LendingError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "repayment" => Ok(BatchTask::Repayment),
            "npl" => Ok(BatchTask::Npl),
            other => Err(LendingError::UnknownTask { name: other.to_string() }),
        }
    }
}

impl fmt::Display for BatchTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchTask::Repayment => write!(f, "repayment"),
            BatchTask::Npl => write!(f, "npl"),
        }
    }
}

/// structured completion summary for one task invocation. Per-item
/// failures are counted here, not surfaced as errors; only top-level
/// faults (storage unreachable, unknown task) fail the invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskSummary {
    pub task: BatchTask,
    pub succeeded: u64,
    pub skipped: u64,
    pub failed: u64,
}

impl fmt::Display for TaskSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} succeeded, {} skipped, {} failed",
            self.task, self.succeeded, self.skipped, self.failed
        )
    }
}

/// dispatch one named task over the store
pub fn run_task<S, B, A>(
    task: BatchTask,
    store: &S,
    balances: &B,
    audit: &mut A,
    time: &SafeTimeProvider,
) -> Result<TaskSummary>
where
    S: LendingStore,
    B: BalanceSource,
    A: AuditSink,
{
    match task {
        BatchTask::Repayment => {
            let summary = RepaymentSweepWorker::run(store, balances, audit, time)?;
            Ok(TaskSummary {
                task,
                succeeded: summary.settled,
                skipped: summary.skipped,
                failed: summary.failed,
            })
        }
        BatchTask::Npl => {
            let summary = NplClassifier::run(store, audit, time)?;
            Ok(TaskSummary {
                task,
                succeeded: summary.borrowers_flagged,
                skipped: 0,
                failed: 0,
            })
        }
    }
}
