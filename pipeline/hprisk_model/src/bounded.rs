//! Running a fallible operation under an optional deadline.

use crate::error::{ServiceError, Stage};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

/// Runs `op` inline when `timeout` is `None`, otherwise on a worker thread
/// whose result is awaited for at most `timeout`.
///
/// A worker that overruns is detached and its result discarded.
pub(crate) fn run_bounded<T, F>(
    stage: Stage,
    timeout: Option<Duration>,
    op: F,
) -> Result<T, ServiceError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ServiceError> + Send + 'static,
{
    let Some(after) = timeout else {
        return op();
    };
    let (tx, rx) = mpsc::sync_channel(1);
    let spawned = thread::Builder::new()
        .name(format!("hprisk-{}", stage_tag(stage)))
        .spawn(move || {
            // the receiver is gone if the caller already timed out
            let _ = tx.send(op());
        });
    if let Err(e) = spawned {
        return Err(worker_failure(stage, format!("cannot start worker: {e}")));
    }
    match rx.recv_timeout(after) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => {
            log::warn!("{stage} exceeded {after:?}; abandoning worker");
            Err(ServiceError::TimedOut { stage, after })
        }
        Err(RecvTimeoutError::Disconnected) => {
            Err(worker_failure(stage, "worker terminated without a result".to_string()))
        }
    }
}

fn stage_tag(stage: Stage) -> &'static str {
    match stage {
        Stage::Load => "load",
        Stage::Inference => "inference",
    }
}

fn worker_failure(stage: Stage, reason: String) -> ServiceError {
    ServiceError::WorkerFailed { stage, reason }
}
