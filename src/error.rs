use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("command failed: {program} ({status})\n{stderr}")]
    Exit {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
}

impl ToolError {
    /// First line of the error message, used for one-line warnings.
    pub fn headline(&self) -> String {
        self.to_string()
            .lines()
            .next()
            .unwrap_or_default()
            .trim()
            .to_string()
    }
}

#[derive(Debug, Error)]
pub enum OutputDirError {
    #[error("output path {0:?} exists but is not a directory")]
    NotADirectory(PathBuf),
    #[error("failed to prepare output directory {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
