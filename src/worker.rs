use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::UserMap;
use crate::grader::{Grader, GraderError, Verdict};
use crate::queue::SubmissionQueue;
use crate::store::VerdictSink;

pub async fn worker(
    id: u8,
    grader: Arc<Grader>,
    users: Arc<UserMap>,
    store: Arc<dyn VerdictSink>,
    queue: Arc<SubmissionQueue>,
    token: CancellationToken,
) -> anyhow::Result<()> {
    log::info!("Worker {id} initialized");

    loop {
        tokio::select! {
            _ = token.cancelled() => {
                log::info!("Worker {id} received shutdown signal, stopping");
                break;
            }

            submission = queue.pop() => {
                log::info!("Worker {id} grading {} by {}", submission.url, submission.user);

                match grader.run_pipeline(&submission, &token).await {
                    Ok(verdict) => {
                        // Verdicts carry the display name, not the login
                        let verdict = Verdict {
                            user: users.display_name(&verdict.user).to_owned(),
                            ..verdict
                        };
                        match store.record(&verdict).await {
                            Ok(record_id) => log::info!(
                                "Recorded verdict {record_id} for {}: {}",
                                verdict.url,
                                verdict.error.unwrap_or("correct")
                            ),
                            Err(e) => {
                                log::error!("Failed to record verdict for {}: {e}", verdict.url);
                            }
                        }
                    }
                    Err(GraderError::Cancelled) => {
                        log::info!("Worker {id} cancelled mid-grading, stopping");
                        break;
                    }
                    Err(e) => {
                        log::error!("Grading {} failed without a verdict: {e}", submission.url);
                    }
                }
            }
        };
    }

    log::info!("Worker {id} has shut down gracefully");
    Ok(())
}
