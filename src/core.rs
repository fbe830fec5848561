use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformFamily {
    MacOs,
    Linux,
    Windows,
}

impl PlatformFamily {
    pub const fn slug(&self) -> &'static str {
        match self {
            PlatformFamily::MacOs => "macos",
            PlatformFamily::Linux => "linux",
            PlatformFamily::Windows => "win",
        }
    }

    pub const fn executable_suffix(&self) -> &'static str {
        match self {
            PlatformFamily::Windows => ".exe",
            _ => "",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    X64,
    Arm64,
}

impl Arch {
    pub const fn slug(&self) -> &'static str {
        match self {
            Arch::X64 => "x64",
            Arch::Arm64 => "arm64",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseTargetError {
    #[error("invalid target `{0}`: expected <platform>-<arch>, e.g. linux-x64")]
    Malformed(String),
    #[error("unknown platform `{0}` (expected macos, linux or win)")]
    UnknownPlatform(String),
    #[error("unknown architecture `{0}` (expected x64 or arm64)")]
    UnknownArch(String),
}

/// A (platform family, architecture) pair to produce one binary for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    pub family: PlatformFamily,
    pub arch: Arch,
}

impl Target {
    pub const fn new(family: PlatformFamily, arch: Arch) -> Self {
        Self { family, arch }
    }

    /// Every supported target, in build order.
    pub fn defaults() -> Vec<Target> {
        vec![
            Target::new(PlatformFamily::MacOs, Arch::X64),
            Target::new(PlatformFamily::MacOs, Arch::Arm64),
            Target::new(PlatformFamily::Linux, Arch::X64),
            Target::new(PlatformFamily::Linux, Arch::Arm64),
            Target::new(PlatformFamily::Windows, Arch::X64),
            Target::new(PlatformFamily::Windows, Arch::Arm64),
        ]
    }

    /// Identifier handed to the packager, e.g. `node18-linux-arm64`.
    pub fn identifier(&self, runtime: &str) -> String {
        format!("{}-{}", runtime, self)
    }

    pub fn label(&self) -> &'static str {
        match (self.family, self.arch) {
            (PlatformFamily::MacOs, Arch::X64) => "macOS Intel",
            (PlatformFamily::MacOs, Arch::Arm64) => "macOS Apple Silicon",
            (PlatformFamily::Linux, Arch::X64) => "Linux x64",
            (PlatformFamily::Linux, Arch::Arm64) => "Linux ARM64",
            (PlatformFamily::Windows, Arch::X64) => "Windows x64",
            (PlatformFamily::Windows, Arch::Arm64) => "Windows ARM64",
        }
    }

    pub fn artifact_name(&self, project: &str) -> String {
        format!("{}-{}{}", project, self, self.family.executable_suffix())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.family.slug(), self.arch.slug())
    }
}

impl FromStr for Target {
    type Err = ParseTargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (family, arch) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| ParseTargetError::Malformed(s.to_string()))?;

        let family = match family.to_ascii_lowercase().as_str() {
            "macos" | "darwin" => PlatformFamily::MacOs,
            "linux" => PlatformFamily::Linux,
            "win" | "windows" => PlatformFamily::Windows,
            other => return Err(ParseTargetError::UnknownPlatform(other.to_string())),
        };
        let arch = match arch.to_ascii_lowercase().as_str() {
            "x64" | "x86_64" => Arch::X64,
            "arm64" | "aarch64" => Arch::Arm64,
            other => return Err(ParseTargetError::UnknownArch(other.to_string())),
        };

        Ok(Target::new(family, arch))
    }
}

/// Operating system the orchestrator itself runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostPlatform {
    MacOs,
    Linux,
    Windows,
    Other,
}

impl HostPlatform {
    pub const fn current() -> Self {
        if cfg!(target_os = "macos") {
            HostPlatform::MacOs
        } else if cfg!(target_os = "linux") {
            HostPlatform::Linux
        } else if cfg!(target_os = "windows") {
            HostPlatform::Windows
        } else {
            HostPlatform::Other
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SigningStrategy {
    None,
    MacSign,
    WinSign,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum SigningStatus {
    NotApplicable,
    Signed,
    /// Holds the first line of the signing error.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum BuildOutcome {
    Succeeded {
        artifact: PathBuf,
        signing: SigningStatus,
    },
    Failed {
        reason: String,
    },
}

impl BuildOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, BuildOutcome::Succeeded { .. })
    }
}

pub const SUCCESS_MESSAGE: &str = "All builds completed successfully!";
pub const PARTIAL_FAILURE_MESSAGE: &str = "Some builds failed. Check the output above for details.";
pub const CANCELLED_MESSAGE: &str = "Build run was cancelled before all targets finished.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub cancelled: bool,
}

impl RunSummary {
    /// Tallies finished outcomes; targets without one count as skipped.
    pub fn tally<'a, I>(total: usize, outcomes: I, cancelled: bool) -> Self
    where
        I: IntoIterator<Item = &'a BuildOutcome>,
    {
        let (mut succeeded, mut failed) = (0, 0);
        for outcome in outcomes {
            if outcome.is_success() {
                succeeded += 1;
            } else {
                failed += 1;
            }
        }

        Self {
            total,
            succeeded,
            failed,
            skipped: total.saturating_sub(succeeded + failed),
            cancelled,
        }
    }

    pub fn all_succeeded(&self) -> bool {
        !self.cancelled && self.failed == 0 && self.succeeded == self.total
    }

    pub fn message(&self) -> &'static str {
        if self.all_succeeded() {
            SUCCESS_MESSAGE
        } else if self.cancelled && self.failed == 0 {
            CANCELLED_MESSAGE
        } else {
            PARTIAL_FAILURE_MESSAGE
        }
    }

    pub fn exit_code(&self) -> u8 {
        if self.cancelled {
            130
        } else if self.failed > 0 {
            1
        } else {
            0
        }
    }
}
