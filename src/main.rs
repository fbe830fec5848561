use anyhow::Result;
use clap::Parser;
use maiass_build::core::Target;
use maiass_build::orchestrator::SilentReporter;
use maiass_build::output::{self, ConsoleReporter};
use maiass_build::{BuildConfig, BuildReporter, HostPlatform, Orchestrator, ProcessInvoker};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Builds standalone binaries for every supported platform
#[derive(Parser, Debug)]
#[command(name = "maiass-build")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Base name of the produced binaries
    #[arg(long, env = "MAIASS_BUILD_NAME", default_value = "maiass")]
    name: String,

    /// Runtime prefix of packager target identifiers
    #[arg(long, env = "MAIASS_BUILD_RUNTIME", default_value = "node18")]
    runtime: String,

    /// Directory the binaries are written to (cleaned before the run)
    #[arg(short, long, env = "MAIASS_BUILD_OUTPUT", default_value = "build")]
    output_dir: PathBuf,

    /// Packager executable
    #[arg(long, env = "MAIASS_BUILD_PACKAGER", default_value = "npx")]
    packager: String,

    /// Argument passed to the packager before --target/--output (repeatable)
    #[arg(
        long = "packager-arg",
        env = "MAIASS_BUILD_PACKAGER_ARGS",
        value_delimiter = ',',
        allow_hyphen_values = true,
        default_values_t = ["pkg".to_string(), ".".to_string()]
    )]
    packager_args: Vec<String>,

    /// macOS code signing script
    #[arg(long, env = "MAIASS_BUILD_MAC_SIGN", default_value = "./scripts/codesign.sh")]
    mac_sign_script: PathBuf,

    /// Windows code signing script
    #[arg(long, env = "MAIASS_BUILD_WIN_SIGN", default_value = "./scripts/codesign-windows.sh")]
    win_sign_script: PathBuf,

    /// Skip all code signing
    #[arg(long, env = "MAIASS_BUILD_NO_SIGN")]
    no_sign: bool,

    /// Only build these targets, e.g. linux-x64 (repeatable or comma-separated)
    #[arg(short, long = "target", env = "MAIASS_BUILD_TARGETS", value_delimiter = ',')]
    targets: Vec<Target>,

    /// Print the run report as JSON instead of the summary block
    #[arg(long, env = "MAIASS_BUILD_JSON")]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long, env = "MAIASS_BUILD_VERBOSE")]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> BuildConfig {
        let mut config = BuildConfig {
            project_name: self.name,
            runtime: self.runtime,
            output_dir: self.output_dir,
            packager: self.packager,
            packager_args: self.packager_args,
            mac_sign_script: self.mac_sign_script,
            win_sign_script: self.win_sign_script,
            signing: !self.no_sign,
            machine_output: self.json,
            ..BuildConfig::default()
        };
        config.select_targets(&self.targets);
        config
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "error" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let config = cli.into_config();
    let json = config.machine_output;
    info!("Building {} target(s) into {:?}", config.targets.len(), config.output_dir);

    if !json {
        output::print_banner(&config.project_name);
    }

    let orchestrator = Orchestrator::new(ProcessInvoker, &config, HostPlatform::current());
    let mut console = ConsoleReporter::new(&config.output_dir);
    let mut silent = SilentReporter;
    let reporter: &mut dyn BuildReporter = if json { &mut silent } else { &mut console };
    let shutdown = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    let report = match orchestrator.run(&config.targets, reporter, shutdown).await {
        Ok(report) => report,
        Err(e) => {
            output::print_fatal(&e.to_string());
            return Ok(ExitCode::FAILURE);
        }
    };

    if json {
        output::print_json(&report)?;
    }

    Ok(ExitCode::from(report.summary.exit_code()))
}
