use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::config::GraderConfig;

use super::process::run_stage;
use super::workspace::Workspace;
use super::{GraderError, StageResult, Submission, Verdict};

/// Total clone attempts per submission. Network flakiness is common and
/// cheap to retry; build and run failures are deterministic for a fixed
/// checkout and never retried.
const CLONE_ATTEMPTS: u32 = 3;

/// Name of the input fed to the run command, shipped in the submission's own
/// repository.
const INPUT_FIXTURE: &str = "stdin.txt";

/// Name of the expected-output file the run's stdout is compared against.
const ANSWER_FIXTURE: &str = "stdout.txt";

/// The fixed process boundary: clone, build and run argvs.
///
/// `%URL%` and `%REF%` in the fetch argv are substituted per submission;
/// nothing else about the commands ever varies per submission. Tests inject
/// substitute argvs to stand in fake subprocesses.
#[derive(Debug, Clone)]
pub struct CommandSet {
    pub fetch: Vec<String>,
    pub build: Vec<String>,
    pub run: Vec<String>,
}

impl Default for CommandSet {
    fn default() -> Self {
        Self {
            fetch: vec![
                "git".to_string(),
                "clone".to_string(),
                "--progress".to_string(),
                "-b".to_string(),
                "%REF%".to_string(),
                "--depth".to_string(),
                "1".to_string(),
                "%URL%".to_string(),
                "repo".to_string(),
            ],
            build: vec!["make".to_string(), "all".to_string()],
            run: vec!["make".to_string(), "-s".to_string(), "run".to_string()],
        }
    }
}

/// Sequences the fetch, build and execute-and-verify stages for one
/// submission inside a throwaway workspace.
///
/// Stages run strictly one after another; each failure short-circuits into a
/// verdict. The workspace is released on every path out of `run_pipeline`.
pub struct Grader {
    commands: CommandSet,
    fetch_timeout: Duration,
    build_timeout: Duration,
    run_timeout: Duration,
}

impl Grader {
    pub fn new(config: &GraderConfig) -> Self {
        Self::with_commands(CommandSet::default(), config)
    }

    /// Grader with a substitute command set; lets tests replace the clone,
    /// build and run processes with scripted ones.
    pub fn with_commands(commands: CommandSet, config: &GraderConfig) -> Self {
        if commands.fetch.is_empty() || commands.build.is_empty() || commands.run.is_empty() {
            panic!("Stage commands must not be empty");
        }

        Self {
            commands,
            fetch_timeout: Duration::from_secs(config.fetch_timeout_secs),
            build_timeout: Duration::from_secs(config.build_timeout_secs),
            run_timeout: Duration::from_secs(config.run_timeout_secs),
        }
    }

    /// Grades one submission: clone, build, run, compare.
    ///
    /// Every run that is not aborted by an infrastructure failure or
    /// shutdown produces exactly one verdict.
    pub async fn run_pipeline(
        &self,
        submission: &Submission,
        shutdown: &CancellationToken,
    ) -> Result<Verdict, GraderError> {
        let workspace = Workspace::acquire()?;
        let outcome = self.grade(submission, &workspace, shutdown).await;
        // The workspace is gone before the verdict escapes
        drop(workspace);
        outcome
    }

    async fn grade(
        &self,
        submission: &Submission,
        workspace: &Workspace,
        shutdown: &CancellationToken,
    ) -> Result<Verdict, GraderError> {
        let fetch = self.fetch(submission, workspace, shutdown).await?;
        if !fetch.success {
            return Ok(Verdict::from_stage(
                submission,
                Some("Unable to download source code"),
                &fetch,
            ));
        }
        log::info!("Clone OK");

        let build = self.build(workspace, shutdown).await?;
        if !build.success {
            return Ok(Verdict::from_stage(submission, Some("Build error"), &build));
        }
        log::info!("Build OK");

        let run = self.execute(workspace, shutdown).await?;
        log::info!("Run OK");
        if !run.success {
            return Ok(Verdict::from_stage(
                submission,
                Some("Program exited abnormally"),
                &run,
            ));
        }

        let answer_path = workspace.repo_dir().join(ANSWER_FIXTURE);
        let expected = fs::read(&answer_path).map_err(|source| GraderError::MissingFixture {
            path: answer_path,
            source,
        })?;

        // The comparison is on raw bytes; a trailing-newline difference is a
        // wrong answer
        let error = if run.stdout == expected {
            None
        } else {
            Some("Wrong answer")
        };
        Ok(Verdict::from_stage(submission, error, &run))
    }

    /// Clones the submitted branch into `repo/`, retrying while attempts
    /// remain. Only the last attempt's output survives.
    async fn fetch(
        &self,
        submission: &Submission,
        workspace: &Workspace,
        shutdown: &CancellationToken,
    ) -> Result<StageResult, GraderError> {
        let mut mapping = HashMap::<&str, &str>::new();
        mapping.insert("%URL%", &submission.clone_url);
        mapping.insert("%REF%", &submission.branch);

        let argv: Vec<String> = self
            .commands
            .fetch
            .iter()
            .map(|s| {
                let mut t = s.clone();
                for (k, v) in mapping.iter() {
                    t = t.replace(k, v);
                }
                t
            })
            .collect();

        let mut attempt = 1;
        loop {
            let mut cmd = stage_command(&argv, workspace.path());
            cmd.stdin(Stdio::null());

            let result = run_stage(cmd, self.fetch_timeout, shutdown).await?;
            if result.success || attempt >= CLONE_ATTEMPTS {
                return Ok(result);
            }

            log::warn!(
                "Clone attempt {attempt}/{CLONE_ATTEMPTS} for {} failed (exit {:?}), retrying",
                submission.clone_url,
                result.code
            );
            attempt += 1;
        }
    }

    /// Builds the checkout with the fixed build command. A build failure is
    /// the submission's fault, so there is exactly one attempt.
    async fn build(
        &self,
        workspace: &Workspace,
        shutdown: &CancellationToken,
    ) -> Result<StageResult, GraderError> {
        let mut cmd = stage_command(&self.commands.build, &workspace.repo_dir());
        cmd.stdin(Stdio::null());
        run_stage(cmd, self.build_timeout, shutdown).await
    }

    /// Runs the fixed run command with `stdin.txt` on standard input. A
    /// missing input file is a repository misconfiguration, not a grading
    /// outcome.
    async fn execute(
        &self,
        workspace: &Workspace,
        shutdown: &CancellationToken,
    ) -> Result<StageResult, GraderError> {
        let input_path = workspace.repo_dir().join(INPUT_FIXTURE);
        let input = fs::File::open(&input_path).map_err(|source| GraderError::MissingFixture {
            path: input_path,
            source,
        })?;

        let mut cmd = stage_command(&self.commands.run, &workspace.repo_dir());
        cmd.stdin(Stdio::from(input));
        run_stage(cmd, self.run_timeout, shutdown).await
    }
}

fn stage_command(argv: &[String], cwd: &Path) -> Command {
    let mut cmd = Command::new(&argv[0]);
    cmd.args(&argv[1..]).current_dir(cwd);
    cmd
}
