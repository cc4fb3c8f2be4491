use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use super::{GraderError, StageResult};

/// Runs one stage subprocess to completion with both output streams fully
/// drained, so the child can exit even when it writes to stdout and stderr
/// at once.
///
/// The caller configures argv, working directory and stdin; stdout/stderr
/// are always captured here. The child is killed when the deadline elapses
/// (the stage then reports failure with empty streams) and when the shutdown
/// token fires (the whole run is abandoned with `GraderError::Cancelled`).
/// `kill_on_drop` also reaps the child if the surrounding task is dropped
/// mid-await.
pub(super) async fn run_stage(
    mut cmd: Command,
    deadline: Duration,
    shutdown: &CancellationToken,
) -> Result<StageResult, GraderError> {
    cmd.stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let program = cmd.as_std().get_program().to_string_lossy().into_owned();
    let child = cmd.spawn().map_err(|source| GraderError::Spawn {
        command: program.clone(),
        source,
    })?;

    tokio::select! {
        waited = tokio::time::timeout(deadline, child.wait_with_output()) => {
            match waited {
                Ok(Ok(output)) => Ok(StageResult::from(output)),
                Ok(Err(e)) => Err(e.into()),
                Err(_) => {
                    log::warn!(
                        "{program} exceeded its {}s deadline, killed",
                        deadline.as_secs()
                    );
                    Ok(StageResult::timed_out())
                }
            }
        }
        _ = shutdown.cancelled() => Err(GraderError::Cancelled),
    }
}
