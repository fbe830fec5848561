use crate::core::{BuildOutcome, SigningStatus, Target};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetStatus {
    Pending,
    Building,
    Signing,
    Succeeded,
    Failed,
}

impl TargetStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TargetStatus::Succeeded | TargetStatus::Failed)
    }
}

/// Lifecycle of a single target within a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetJob {
    pub target: Target,
    pub label: String,
    pub output_path: PathBuf,
    pub status: TargetStatus,
    pub outcome: Option<BuildOutcome>,
    pub duration_ms: u64,
    #[serde(skip)]
    started: Option<Instant>,
}

impl TargetJob {
    pub fn new(target: Target, output_path: PathBuf) -> Self {
        Self {
            target,
            label: target.label().to_string(),
            output_path,
            status: TargetStatus::Pending,
            outcome: None,
            duration_ms: 0,
            started: None,
        }
    }

    pub fn start(&mut self) {
        if self.status == TargetStatus::Pending {
            self.status = TargetStatus::Building;
            self.started = Some(Instant::now());
        }
    }

    pub fn begin_signing(&mut self) {
        if self.status == TargetStatus::Building {
            self.status = TargetStatus::Signing;
        }
    }

    pub fn succeed(&mut self, signing: SigningStatus) {
        if matches!(self.status, TargetStatus::Building | TargetStatus::Signing) {
            self.status = TargetStatus::Succeeded;
            self.outcome = Some(BuildOutcome::Succeeded {
                artifact: self.output_path.clone(),
                signing,
            });
            self.stop_clock();
        }
    }

    pub fn fail(&mut self, reason: String) {
        if self.status == TargetStatus::Building {
            self.status = TargetStatus::Failed;
            self.outcome = Some(BuildOutcome::Failed { reason });
            self.stop_clock();
        }
    }

    fn stop_clock(&mut self) {
        if let Some(started) = self.started {
            self.duration_ms = started.elapsed().as_millis() as u64;
        }
    }
}
