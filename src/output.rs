//! Console output for build runs.
//!
//! Colored progress lines per target and the closing summary block. Colors
//! are only emitted when the stream supports them.

use crate::core::{SigningStrategy, Target};
use crate::jobs::TargetJob;
use crate::orchestrator::{BuildReporter, RunReport};
use owo_colors::{OwoColorize, Stream};
use std::path::{Path, PathBuf};

pub mod symbols {
    pub const SUCCESS: &str = "✓";
    pub const ERROR: &str = "✗";
    pub const WARNING: &str = "⚠";
    pub const LOCK: &str = "🔐";
}

fn artifact_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn signing_kind(strategy: SigningStrategy) -> &'static str {
    match strategy {
        SigningStrategy::WinSign => "Windows code signing",
        _ => "Code signing",
    }
}

pub fn print_banner(project: &str) {
    println!(
        "{}",
        format!("{} Cross-Platform Build", project.to_uppercase())
            .if_supports_color(Stream::Stdout, |s| s.cyan())
    );
    println!("Building binaries for all supported platforms...\n");
}

pub fn print_fatal(message: &str) {
    eprintln!(
        "{} {}",
        symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
        message.if_supports_color(Stream::Stderr, |s| s.red())
    );
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

pub struct ConsoleReporter {
    output_dir: PathBuf,
}

impl ConsoleReporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

impl BuildReporter for ConsoleReporter {
    fn target_started(&mut self, target: &Target) {
        println!(
            "{}",
            format!("Building for {}...", target.label())
                .if_supports_color(Stream::Stdout, |s| s.bright_blue())
        );
    }

    fn target_built(&mut self, job: &TargetJob) {
        println!(
            "{}",
            format!(
                "{} Successfully built for {} -> {}",
                symbols::SUCCESS,
                job.label,
                artifact_name(&job.output_path)
            )
            .if_supports_color(Stream::Stdout, |s| s.green())
        );
    }

    fn target_failed(&mut self, job: &TargetJob, reason: &str) {
        println!(
            "{}\n",
            format!("{} Failed to build for {}: {}", symbols::ERROR, job.label, reason)
                .if_supports_color(Stream::Stdout, |s| s.red())
        );
    }

    fn signing_started(&mut self, job: &TargetJob, _strategy: SigningStrategy) {
        println!(
            "{}",
            format!("  {} Code signing {}...", symbols::LOCK, artifact_name(&job.output_path))
                .if_supports_color(Stream::Stdout, |s| s.bright_blue())
        );
    }

    fn signing_succeeded(&mut self, job: &TargetJob, _strategy: SigningStrategy) {
        println!(
            "{}\n",
            format!("  {} Code signed {}", symbols::SUCCESS, artifact_name(&job.output_path))
                .if_supports_color(Stream::Stdout, |s| s.green())
        );
    }

    fn signing_failed(&mut self, job: &TargetJob, strategy: SigningStrategy, headline: &str) {
        println!(
            "{}",
            format!(
                "  {} {} failed for {} (continuing without signing)",
                symbols::WARNING,
                signing_kind(strategy),
                artifact_name(&job.output_path)
            )
            .if_supports_color(Stream::Stdout, |s| s.yellow())
        );
        println!(
            "    {}\n",
            headline.if_supports_color(Stream::Stdout, |s| s.dimmed())
        );
    }

    fn run_finished(&mut self, report: &RunReport) {
        let summary = &report.summary;

        println!("\n=== Build Summary ===");
        println!(
            "{}",
            format!("Successful builds: {}", summary.succeeded)
                .if_supports_color(Stream::Stdout, |s| s.green())
        );
        if summary.failed > 0 {
            println!(
                "{}",
                format!("Failed builds: {}", summary.failed)
                    .if_supports_color(Stream::Stdout, |s| s.red())
            );
        }
        if summary.skipped > 0 {
            println!(
                "{}",
                format!("Skipped builds: {}", summary.skipped)
                    .if_supports_color(Stream::Stdout, |s| s.yellow())
            );
        }

        if summary.all_succeeded() {
            println!(
                "\n{}",
                summary.message().if_supports_color(Stream::Stdout, |s| s.green())
            );
            println!(
                "Binaries are available in the {}/ directory",
                self.output_dir.display()
            );
        } else {
            println!(
                "\n{} {}",
                symbols::WARNING.if_supports_color(Stream::Stdout, |s| s.yellow()),
                summary.message().if_supports_color(Stream::Stdout, |s| s.yellow())
            );
        }
    }
}
