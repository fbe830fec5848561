use crate::config::BuildConfig;
use crate::core::{HostPlatform, RunSummary, SigningStatus, SigningStrategy, Target};
use crate::detection::signing_strategy;
use crate::error::OutputDirError;
use crate::execution::{Toolchain, ToolInvoker};
use crate::jobs::TargetJob;
use crate::workspace::prepare_output_dir;
use serde::Serialize;
use std::future::Future;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

/// Progress hooks fired while a run executes. Every hook defaults to a no-op.
pub trait BuildReporter {
    fn target_started(&mut self, _target: &Target) {}
    fn target_built(&mut self, _job: &TargetJob) {}
    fn target_failed(&mut self, _job: &TargetJob, _reason: &str) {}
    fn signing_started(&mut self, _job: &TargetJob, _strategy: SigningStrategy) {}
    fn signing_succeeded(&mut self, _job: &TargetJob, _strategy: SigningStrategy) {}
    fn signing_failed(&mut self, _job: &TargetJob, _strategy: SigningStrategy, _headline: &str) {}
    fn run_finished(&mut self, _report: &RunReport) {}
}

/// Reporter that discards every event.
#[derive(Debug, Default)]
pub struct SilentReporter;

impl BuildReporter for SilentReporter {}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub jobs: Vec<TargetJob>,
    pub summary: RunSummary,
}

pub struct Orchestrator<I: ToolInvoker> {
    invoker: I,
    toolchain: Toolchain,
    host: HostPlatform,
    project_name: String,
    output_dir: PathBuf,
}

impl<I: ToolInvoker> Orchestrator<I> {
    pub fn new(invoker: I, config: &BuildConfig, host: HostPlatform) -> Self {
        Self {
            invoker,
            toolchain: Toolchain::from_config(config),
            host,
            project_name: config.project_name.clone(),
            output_dir: config.output_dir.clone(),
        }
    }

    pub fn invoker(&self) -> &I {
        &self.invoker
    }

    pub fn output_path(&self, target: &Target) -> PathBuf {
        self.output_dir.join(target.artifact_name(&self.project_name))
    }

    /// Packages one target, then attempts the signing step that applies to
    /// it. Signing failures are reported but never fail the target.
    pub async fn build_target(&self, target: Target, reporter: &mut dyn BuildReporter) -> TargetJob {
        let mut job = TargetJob::new(target, self.output_path(&target));
        reporter.target_started(&target);
        job.start();

        let package = self.toolchain.package(&target, &job.output_path);
        if let Err(e) = self.invoker.invoke(&package).await {
            let reason = e.to_string().trim_end().to_string();
            error!("Build for {} failed: {}", target, reason);
            job.fail(reason.clone());
            reporter.target_failed(&job, &reason);
            return job;
        }

        info!("Built {} -> {:?}", target, job.output_path);
        reporter.target_built(&job);

        let strategy = signing_strategy(target.family, self.host);
        let Some(sign) = self.toolchain.sign(strategy, &job.output_path) else {
            debug!("No signing step for {} on {:?} host", target, self.host);
            job.succeed(SigningStatus::NotApplicable);
            return job;
        };

        job.begin_signing();
        reporter.signing_started(&job, strategy);
        let signing = match self.invoker.invoke(&sign).await {
            Ok(()) => {
                reporter.signing_succeeded(&job, strategy);
                SigningStatus::Signed
            }
            Err(e) => {
                let headline = e.headline();
                warn!("Code signing failed for {}, continuing unsigned: {}", target, headline);
                reporter.signing_failed(&job, strategy, &headline);
                SigningStatus::Failed(headline)
            }
        };

        job.succeed(signing);
        job
    }

    /// Prepares the output directory once, then builds `targets` in order.
    /// When `shutdown` resolves the in-flight subprocess is dropped (and
    /// killed) and the remaining targets are left unbuilt.
    pub async fn run<F>(
        &self,
        targets: &[Target],
        reporter: &mut dyn BuildReporter,
        shutdown: F,
    ) -> Result<RunReport, OutputDirError>
    where
        F: Future<Output = ()>,
    {
        prepare_output_dir(&self.output_dir).await?;

        tokio::pin!(shutdown);
        let mut jobs = Vec::with_capacity(targets.len());
        let mut cancelled = false;

        for target in targets {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    warn!("Cancellation requested, stopping before {} finished", target);
                    cancelled = true;
                }
                job = self.build_target(*target, &mut *reporter) => jobs.push(job),
            }
            if cancelled {
                break;
            }
        }

        let summary = RunSummary::tally(
            targets.len(),
            jobs.iter().filter_map(|job| job.outcome.as_ref()),
            cancelled,
        );
        let report = RunReport { jobs, summary };
        reporter.run_finished(&report);
        Ok(report)
    }

    pub async fn run_all(
        &self,
        targets: &[Target],
        reporter: &mut dyn BuildReporter,
    ) -> Result<RunReport, OutputDirError> {
        self.run(targets, reporter, std::future::pending()).await
    }
}
