use std::io::ErrorKind as IoErrorKind;
use std::time::Instant;

use chrono::Local;
use tokio::fs;
use tokio::sync::oneshot;

use super::process::{self, CommandRun, Exit};
use super::{
    BuildError, BuildMode, BuildOutcome, BuildRecord, BuildReport, HARD_REBUILD_MARKER,
};
use crate::config::{CommandSpec, GeneratorConfig};
use crate::layout::SiteLayout;

const QUICK_ENV: &str = "SITE_ADMIN_QUICK";

/// Work sent to the build worker
#[derive(Debug)]
enum Job {
    Rebuild {
        reason: Option<String>,
        mode: BuildMode,
        reply: oneshot::Sender<BuildReport>,
    },
    /// Forced rebuild followed by the deploy command
    Deploy {
        command: CommandSpec,
        reply: oneshot::Sender<Result<BuildReport, BuildError>>,
    },
}

/// Cloneable handle for requesting builds from anywhere in the application.
#[derive(Debug, Clone)]
pub struct BuildHandle {
    tx: flume::Sender<Job>,
}

impl BuildHandle {
    /// Whether the worker is still accepting jobs.
    pub fn is_running(&self) -> bool {
        !self.tx.is_disconnected()
    }

    /// Request a build and wait for the run that serves it.
    ///
    /// Requests queued while another build is running are merged into a
    /// single run; all of them receive its report.
    pub async fn rebuild(
        &self,
        reason: Option<String>,
        mode: BuildMode,
    ) -> Result<BuildReport, BuildError> {
        let (reply, rx) = oneshot::channel();
        tracing::debug!(?reason, %mode, "dispatching rebuild");
        self.tx
            .send_async(Job::Rebuild {
                reason,
                mode,
                reply,
            })
            .await
            .map_err(|_| BuildError::WorkerGone)?;
        rx.await.map_err(|_| BuildError::WorkerGone)
    }

    /// Hard rebuild, then run `command` if the build succeeded.
    pub async fn deploy(&self, command: CommandSpec) -> Result<BuildReport, BuildError> {
        if command.is_empty() {
            return Err(BuildError::NoDeployCommand);
        }
        let (reply, rx) = oneshot::channel();
        self.tx
            .send_async(Job::Deploy { command, reply })
            .await
            .map_err(|_| BuildError::WorkerGone)?;
        rx.await.map_err(|_| BuildError::WorkerGone)?
    }
}

/// Owns the generator and runs one build at a time.
#[derive(Debug)]
pub struct BuildCoordinator {
    layout: SiteLayout,
    generator: GeneratorConfig,
    rx: flume::Receiver<Job>,
}

impl BuildCoordinator {
    /// Create a coordinator and the handle that feeds it. The coordinator
    /// does nothing until [`BuildCoordinator::run`] is polled.
    pub fn new(layout: SiteLayout, generator: GeneratorConfig) -> (Self, BuildHandle) {
        let (tx, rx) = flume::unbounded();
        (
            Self {
                layout,
                generator,
                rx,
            },
            BuildHandle { tx },
        )
    }

    /// Create a coordinator and run it on a background task.
    pub fn spawn(layout: SiteLayout, generator: GeneratorConfig) -> BuildHandle {
        let (coordinator, handle) = Self::new(layout, generator);
        tokio::spawn(coordinator.run());
        handle
    }

    /// Process jobs until every handle has been dropped.
    pub async fn run(self) {
        tracing::info!(program = %self.generator.program, "build worker started");
        while let Ok(first) = self.rx.recv_async().await {
            let mut rebuilds = Vec::new();
            let mut deploys = Vec::new();
            for job in std::iter::once(first).chain(self.rx.drain()) {
                match job {
                    Job::Rebuild {
                        reason,
                        mode,
                        reply,
                    } => rebuilds.push((reason, mode, reply)),
                    Job::Deploy { command, reply } => deploys.push((command, reply)),
                }
            }

            if !rebuilds.is_empty() {
                let requests = rebuilds.len();
                let mode = rebuilds
                    .iter()
                    .fold(BuildMode::Quick, |acc, (_, mode, _)| acc.merge(*mode));
                let reasons: Vec<String> = rebuilds
                    .iter()
                    .filter_map(|(reason, _, _)| reason.clone())
                    .filter(|r| !r.is_empty())
                    .collect();
                let reason = (!reasons.is_empty()).then(|| reasons.join("; "));
                if requests > 1 {
                    tracing::info!(requests, %mode, "coalesced queued rebuild requests");
                }

                let report = self.build(reason, mode, requests).await;
                for (_, _, reply) in rebuilds {
                    let _ = reply.send(report.clone());
                }
            }

            for (command, reply) in deploys {
                let _ = reply.send(self.deploy(&command).await);
            }
        }
        tracing::info!("build worker stopped");
    }

    async fn build(&self, reason: Option<String>, mode: BuildMode, requests: usize) -> BuildReport {
        let reason = match (reason, mode) {
            (Some(reason), BuildMode::Hard) => Some(format!("{}{}", reason, HARD_REBUILD_MARKER)),
            (reason, _) => reason,
        };
        let started_at = Local::now();
        let clock = Instant::now();

        if mode == BuildMode::Hard {
            self.purge().await;
        }

        let mut argv = Vec::with_capacity(self.generator.args.len() + 1);
        argv.push(self.generator.program.clone());
        argv.extend(self.generator.args.iter().cloned());
        let mut envs = Vec::new();
        if mode == BuildMode::Quick {
            argv.extend(self.generator.quick_args.iter().cloned());
            envs.push((QUICK_ENV, "1"));
        }

        let run = process::run(
            &argv,
            self.layout.base_dir(),
            &envs,
            self.generator.timeout(),
        )
        .await;
        let (outcome, diagnostics) = self.interpret(&run);

        let record = BuildRecord {
            started_at,
            ended_at: Local::now(),
            duration: clock.elapsed(),
            reason: reason.clone().unwrap_or_default(),
            mode,
            outcome: outcome.clone(),
            diagnostics: diagnostics.clone(),
        };
        match &outcome {
            BuildOutcome::Succeeded => {
                tracing::info!(%mode, elapsed = ?record.duration, "site build finished")
            }
            other => tracing::warn!(%mode, outcome = %other, "site build did not succeed"),
        }
        if reason.is_some() {
            if let Err(e) = record.append_to(&self.layout.audit_log()).await {
                tracing::error!("failed to append to audit log: {}", e);
            }
        }

        BuildReport {
            outcome,
            mode,
            reason,
            diagnostics,
            requests,
        }
    }

    fn interpret(&self, run: &CommandRun) -> (BuildOutcome, Vec<String>) {
        let mut diagnostics = process::diagnostic_lines(&run.output);
        let outcome = match &run.exit {
            Exit::Code(Some(0)) => BuildOutcome::Succeeded,
            Exit::Code(code) => BuildOutcome::Failed { code: *code },
            Exit::TimedOut => {
                diagnostics.push(format!(
                    "ERROR: generator timed out after {} seconds",
                    self.generator.timeout_secs
                ));
                BuildOutcome::TimedOut
            }
            Exit::SpawnFailed(e) => {
                diagnostics.push(format!(
                    "ERROR: could not run {}: {}",
                    self.generator.program, e
                ));
                BuildOutcome::Failed { code: None }
            }
        };
        (outcome, diagnostics)
    }

    /// Remove the render cache and the whole output tree.
    async fn purge(&self) {
        let work_dir = self.layout.work_dir();
        let prefix = &self.generator.render_cache_prefix;
        if !prefix.is_empty() {
            if let Ok(mut entries) = fs::read_dir(&work_dir).await {
                while let Ok(Some(entry)) = entries.next_entry().await {
                    if !entry.file_name().to_string_lossy().starts_with(prefix.as_str()) {
                        continue;
                    }
                    let path = entry.path();
                    let removed = match entry.file_type().await {
                        Ok(ft) if ft.is_dir() => fs::remove_dir_all(&path).await,
                        _ => fs::remove_file(&path).await,
                    };
                    if let Err(e) = removed {
                        tracing::warn!(path = %path.display(), "failed to purge render cache: {}", e);
                    }
                }
            }
        }

        let output = self.layout.output_dir();
        match fs::remove_dir_all(&output).await {
            Ok(()) => tracing::info!(path = %output.display(), "removed output tree"),
            Err(e) if e.kind() == IoErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %output.display(), "failed to remove output tree: {}", e),
        }
    }

    async fn deploy(&self, command: &CommandSpec) -> Result<BuildReport, BuildError> {
        let mut report = self
            .build(Some("Deploy requested".to_string()), BuildMode::Hard, 1)
            .await;
        if !report.outcome.is_success() {
            return Err(BuildError::BuildUnsuccessful(report.outcome));
        }

        tracing::info!("running deploy command");
        let run = process::run(
            &command.to_argv(),
            self.layout.base_dir(),
            &[],
            self.generator.timeout(),
        )
        .await;
        match run.exit {
            Exit::Code(Some(0)) => {
                report.diagnostics.extend(process::diagnostic_lines(&run.output));
                tracing::info!("deploy finished");
                Ok(report)
            }
            Exit::TimedOut => Err(BuildError::DeployTimedOut(self.generator.timeout())),
            Exit::Code(code) => {
                tracing::warn!(?code, output = %run.output, "deploy failed");
                Err(BuildError::DeployFailed(BuildOutcome::Failed { code }))
            }
            Exit::SpawnFailed(e) => {
                tracing::warn!("could not start deploy command: {}", e);
                Err(BuildError::DeployFailed(BuildOutcome::Failed { code: None }))
            }
        }
    }
}
