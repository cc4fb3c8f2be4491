mod pipeline;
mod process;
mod workspace;

pub use pipeline::{CommandSet, Grader};
pub use workspace::Workspace;

use std::path::PathBuf;

use thiserror::Error;

/// One grading request, extracted from a pull-request event. Immutable once
/// received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Login handle of the submitter
    pub user: String,
    /// Human-facing URL of the graded tree (repository URL + commit SHA)
    pub url: String,
    /// URL the submitted repository is cloned from
    pub clone_url: String,
    /// Branch to clone
    pub branch: String,
}

/// Outcome of one pipeline stage: exit disposition plus both output streams,
/// fully drained.
#[derive(Debug)]
pub struct StageResult {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl StageResult {
    /// Result for a stage whose subprocess was killed at the deadline. The
    /// streams are gone with the process, so they come back empty.
    pub(crate) fn timed_out() -> Self {
        Self {
            success: false,
            code: None,
            stdout: Vec::new(),
            stderr: Vec::new(),
        }
    }
}

impl From<std::process::Output> for StageResult {
    fn from(output: std::process::Output) -> Self {
        Self {
            success: output.status.success(),
            code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        }
    }
}

/// Terminal outcome of grading one submission.
///
/// `error` of `None` means correct: the build succeeded, the run exited zero
/// and its stdout matched the expected output byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub user: String,
    pub url: String,
    pub error: Option<&'static str>,
    pub stdout: String,
    pub stderr: String,
}

impl Verdict {
    /// Builds the verdict for `submission` out of the deciding stage's
    /// captured streams. Decoding is lossy; the byte-exact output comparison
    /// has already happened by the time a verdict exists.
    pub fn from_stage(
        submission: &Submission,
        error: Option<&'static str>,
        stage: &StageResult,
    ) -> Self {
        Self {
            user: submission.user.clone(),
            url: submission.url.clone(),
            error,
            stdout: String::from_utf8_lossy(&stage.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stage.stderr).into_owned(),
        }
    }
}

/// Conditions that abort a pipeline run without producing a verdict.
///
/// These are host or shutdown problems, not gradeable outcomes; storing them
/// as verdicts would blame the submission for the environment.
#[derive(Debug, Error)]
pub enum GraderError {
    #[error("shutdown requested while grading")]
    Cancelled,

    #[error("missing test fixture {}: {source}", path.display())]
    MissingFixture {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to spawn {command}: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
