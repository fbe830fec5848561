use crate::config::BuildConfig;
use crate::core::{SigningStrategy, Target};
use crate::error::ToolError;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    /// Child shares the orchestrator's stdin/stdout/stderr.
    Inherit,
    /// Like `Inherit`, but the child's stdout goes to our stderr so stdout
    /// stays free for machine-readable output.
    InheritToStderr,
    /// Output is collected; stderr ends up in the error on failure.
    Capture,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: OsString,
    pub args: Vec<OsString>,
    pub stream: StreamMode,
}

impl Invocation {
    pub fn program_name(&self) -> String {
        self.program.to_string_lossy().to_string()
    }

    /// Display form only; the arguments themselves are passed through as-is.
    pub fn command_line(&self) -> String {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|part| part.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait]
pub trait ToolInvoker: Send + Sync {
    async fn invoke(&self, invocation: &Invocation) -> Result<(), ToolError>;
}

/// Runs invocations as real subprocesses.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessInvoker;

#[async_trait]
impl ToolInvoker for ProcessInvoker {
    async fn invoke(&self, invocation: &Invocation) -> Result<(), ToolError> {
        tracing::debug!("Running: {}", invocation.command_line());

        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args).kill_on_drop(true);

        let program = invocation.program_name();
        let spawn_error = |source| ToolError::Spawn {
            program: program.clone(),
            source,
        };

        match invocation.stream {
            StreamMode::Inherit | StreamMode::InheritToStderr => {
                let stdout = if invocation.stream == StreamMode::InheritToStderr {
                    Stdio::from(std::io::stderr())
                } else {
                    Stdio::inherit()
                };
                let status = command
                    .stdin(Stdio::inherit())
                    .stdout(stdout)
                    .stderr(Stdio::inherit())
                    .status()
                    .await
                    .map_err(spawn_error)?;

                if !status.success() {
                    return Err(ToolError::Exit {
                        program,
                        status,
                        stderr: String::new(),
                    });
                }
            }
            StreamMode::Capture => {
                let output = command
                    .stdin(Stdio::null())
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped())
                    .output()
                    .await
                    .map_err(spawn_error)?;

                tracing::trace!(
                    "{} stdout: {}",
                    program,
                    String::from_utf8_lossy(&output.stdout)
                );

                if !output.status.success() {
                    return Err(ToolError::Exit {
                        program,
                        status: output.status,
                        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}

/// How the packager and signing scripts are invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub packager_program: String,
    pub packager_args: Vec<String>,
    pub packager_stream: StreamMode,
    pub runtime: String,
    pub mac_sign_script: Option<PathBuf>,
    pub win_sign_script: Option<PathBuf>,
}

impl Toolchain {
    pub fn from_config(config: &BuildConfig) -> Self {
        let (mac_sign_script, win_sign_script) = if config.signing {
            (
                Some(config.mac_sign_script.clone()),
                Some(config.win_sign_script.clone()),
            )
        } else {
            (None, None)
        };

        Self {
            packager_program: config.packager.clone(),
            packager_args: config.packager_args.clone(),
            packager_stream: if config.machine_output {
                StreamMode::InheritToStderr
            } else {
                StreamMode::Inherit
            },
            runtime: config.runtime.clone(),
            mac_sign_script,
            win_sign_script,
        }
    }

    pub fn package(&self, target: &Target, output: &Path) -> Invocation {
        let mut args: Vec<OsString> = self.packager_args.iter().map(OsString::from).collect();
        args.push("--target".into());
        args.push(target.identifier(&self.runtime).into());
        args.push("--output".into());
        args.push(output.as_os_str().to_os_string());

        Invocation {
            program: self.packager_program.clone().into(),
            args,
            stream: self.packager_stream,
        }
    }

    /// `None` when the strategy is `None` or its script is disabled.
    pub fn sign(&self, strategy: SigningStrategy, artifact: &Path) -> Option<Invocation> {
        let script = match strategy {
            SigningStrategy::None => return None,
            SigningStrategy::MacSign => self.mac_sign_script.as_ref()?,
            SigningStrategy::WinSign => self.win_sign_script.as_ref()?,
        };

        Some(Invocation {
            program: script.as_os_str().to_os_string(),
            args: vec![artifact.as_os_str().to_os_string()],
            stream: StreamMode::Capture,
        })
    }
}
