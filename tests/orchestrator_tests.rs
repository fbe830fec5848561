#![cfg(unix)]

use async_trait::async_trait;
use maiass_build::core::{
    Arch, BuildOutcome, HostPlatform, PlatformFamily, SigningStatus, Target,
    PARTIAL_FAILURE_MESSAGE, SUCCESS_MESSAGE,
};
use maiass_build::error::ToolError;
use maiass_build::jobs::TargetStatus;
use maiass_build::orchestrator::SilentReporter;
use maiass_build::{BuildConfig, Invocation, Orchestrator, StreamMode, ToolInvoker};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::os::unix::process::ExitStatusExt;
use std::path::Path;
use std::process::ExitStatus;
use std::time::Duration;
use tempfile::TempDir;
use tracing_test::traced_test;

const MAC_SIGN: &str = "sign-mac.sh";
const WIN_SIGN: &str = "sign-win.sh";

/// Records every invocation; fails packaging for chosen target identifiers
/// and optionally fails every signing call.
#[derive(Default)]
struct FakeInvoker {
    calls: Mutex<Vec<Invocation>>,
    failing_targets: HashSet<String>,
    fail_signing: bool,
    hang_on: Option<String>,
}

impl FakeInvoker {
    fn failing(targets: &[&str]) -> Self {
        Self {
            failing_targets: targets.iter().map(|t| t.to_string()).collect(),
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().clone()
    }

    fn signing_calls(&self) -> Vec<Invocation> {
        self.calls()
            .into_iter()
            .filter(|call| call.program == MAC_SIGN || call.program == WIN_SIGN)
            .collect()
    }

    fn exit_failure(program: &str, stderr: &str) -> ToolError {
        ToolError::Exit {
            program: program.to_string(),
            status: ExitStatus::from_raw(1 << 8),
            stderr: stderr.to_string(),
        }
    }
}

fn target_arg(invocation: &Invocation) -> Option<&str> {
    invocation
        .args
        .iter()
        .position(|arg| arg == "--target")
        .and_then(|i| invocation.args.get(i + 1))
        .and_then(|arg| arg.to_str())
}

#[async_trait]
impl ToolInvoker for FakeInvoker {
    async fn invoke(&self, invocation: &Invocation) -> Result<(), ToolError> {
        self.calls.lock().push(invocation.clone());

        if invocation.program == MAC_SIGN || invocation.program == WIN_SIGN {
            if self.fail_signing {
                return Err(Self::exit_failure(
                    &invocation.program_name(),
                    "no identity found\nsecond line",
                ));
            }
            return Ok(());
        }

        let target = target_arg(invocation).unwrap_or_default().to_string();
        if self.hang_on.as_deref() == Some(target.as_str()) {
            std::future::pending::<()>().await;
        }
        if self.failing_targets.contains(&target) {
            return Err(Self::exit_failure(&invocation.program_name(), ""));
        }
        Ok(())
    }
}

fn test_config(output_dir: &Path) -> BuildConfig {
    BuildConfig {
        output_dir: output_dir.to_path_buf(),
        packager: "pkg".to_string(),
        packager_args: vec![".".to_string()],
        mac_sign_script: MAC_SIGN.into(),
        win_sign_script: WIN_SIGN.into(),
        ..BuildConfig::default()
    }
}

fn orchestrator(invoker: FakeInvoker, output_dir: &Path, host: HostPlatform) -> Orchestrator<FakeInvoker> {
    Orchestrator::new(invoker, &test_config(output_dir), host)
}

#[tokio::test]
async fn test_all_targets_succeed() {
    let temp_dir = TempDir::new().unwrap();
    let out = temp_dir.path().join("build");
    let runner = orchestrator(FakeInvoker::default(), &out, HostPlatform::MacOs);

    let report = runner
        .run_all(&Target::defaults(), &mut SilentReporter)
        .await
        .unwrap();

    assert_eq!(report.summary.total, 6);
    assert_eq!(report.summary.succeeded, 6);
    assert_eq!(report.summary.failed, 0);
    assert!(report.summary.all_succeeded());
    assert_eq!(report.summary.message(), SUCCESS_MESSAGE);
    assert_eq!(report.summary.exit_code(), 0);
    assert!(report
        .jobs
        .iter()
        .all(|job| job.status == TargetStatus::Succeeded));

    // On a macOS host every macOS and Windows artifact gets signed.
    assert_eq!(runner.invoker().signing_calls().len(), 4);
}

#[tokio::test]
async fn test_one_packaging_failure_is_partial() {
    let temp_dir = TempDir::new().unwrap();
    let out = temp_dir.path().join("build");
    let runner = orchestrator(
        FakeInvoker::failing(&["node18-linux-arm64"]),
        &out,
        HostPlatform::Linux,
    );

    let report = runner
        .run_all(&Target::defaults(), &mut SilentReporter)
        .await
        .unwrap();

    assert_eq!(report.summary.succeeded, 5);
    assert_eq!(report.summary.failed, 1);
    assert_eq!(report.summary.succeeded + report.summary.failed, 6);
    assert_eq!(report.summary.message(), PARTIAL_FAILURE_MESSAGE);
    assert_eq!(report.summary.exit_code(), 1);

    let failed = &report.jobs[3];
    assert_eq!(failed.target, Target::new(PlatformFamily::Linux, Arch::Arm64));
    assert_eq!(failed.status, TargetStatus::Failed);
    match failed.outcome.as_ref().unwrap() {
        BuildOutcome::Failed { reason } => assert!(reason.contains("command failed: pkg")),
        other => panic!("expected failure, got {:?}", other),
    }

    // The targets after the failure were still attempted.
    assert_eq!(report.jobs.len(), 6);
    assert_eq!(report.jobs[4].status, TargetStatus::Succeeded);
}

#[tokio::test]
async fn test_failed_packaging_never_signs() {
    let temp_dir = TempDir::new().unwrap();
    let runner = orchestrator(
        FakeInvoker::failing(&["node18-win-x64", "node18-macos-arm64"]),
        temp_dir.path(),
        HostPlatform::MacOs,
    );

    let win = runner
        .build_target(Target::new(PlatformFamily::Windows, Arch::X64), &mut SilentReporter)
        .await;
    let mac = runner
        .build_target(Target::new(PlatformFamily::MacOs, Arch::Arm64), &mut SilentReporter)
        .await;

    assert_eq!(win.status, TargetStatus::Failed);
    assert_eq!(mac.status, TargetStatus::Failed);
    assert!(runner.invoker().signing_calls().is_empty());
    assert_eq!(runner.invoker().calls().len(), 2);
}

#[tokio::test]
#[traced_test]
async fn test_signing_failure_keeps_success() {
    let temp_dir = TempDir::new().unwrap();
    let invoker = FakeInvoker {
        fail_signing: true,
        ..FakeInvoker::default()
    };
    let runner = orchestrator(invoker, temp_dir.path(), HostPlatform::MacOs);

    let job = runner
        .build_target(Target::new(PlatformFamily::MacOs, Arch::X64), &mut SilentReporter)
        .await;

    assert_eq!(job.status, TargetStatus::Succeeded);
    match job.outcome.unwrap() {
        BuildOutcome::Succeeded { signing, .. } => {
            assert_eq!(
                signing,
                SigningStatus::Failed("command failed: sign-mac.sh (exit status: 1)".to_string())
            );
        }
        other => panic!("expected success, got {:?}", other),
    }
    assert_eq!(runner.invoker().signing_calls().len(), 1);
    assert!(logs_contain("Code signing failed for macos-x64"));
}

#[tokio::test]
async fn test_linux_host_skips_macos_signing() {
    let temp_dir = TempDir::new().unwrap();
    let runner = orchestrator(FakeInvoker::default(), temp_dir.path(), HostPlatform::Linux);

    let report = runner
        .run_all(&Target::defaults(), &mut SilentReporter)
        .await
        .unwrap();

    let signed: Vec<String> = runner
        .invoker()
        .signing_calls()
        .into_iter()
        .map(|call| call.program_name())
        .collect();
    assert_eq!(signed, vec![WIN_SIGN.to_string(), WIN_SIGN.to_string()]);

    let mac = &report.jobs[0];
    assert_eq!(
        mac.outcome,
        Some(BuildOutcome::Succeeded {
            artifact: temp_dir.path().join("maiass-macos-x64"),
            signing: SigningStatus::NotApplicable,
        })
    );
}

#[tokio::test]
async fn test_invocations_follow_declaration_order() {
    let temp_dir = TempDir::new().unwrap();
    let runner = orchestrator(FakeInvoker::default(), temp_dir.path(), HostPlatform::Linux);

    runner
        .run_all(&Target::defaults(), &mut SilentReporter)
        .await
        .unwrap();

    let calls = runner.invoker().calls();
    let packaged: Vec<&str> = calls.iter().filter_map(target_arg).collect();
    assert_eq!(
        packaged,
        vec![
            "node18-macos-x64",
            "node18-macos-arm64",
            "node18-linux-x64",
            "node18-linux-arm64",
            "node18-win-x64",
            "node18-win-arm64",
        ]
    );

    let win_package = calls
        .iter()
        .find(|call| target_arg(call) == Some("node18-win-x64"))
        .unwrap();
    let output = temp_dir.path().join("maiass-win-x64.exe");
    assert_eq!(win_package.stream, StreamMode::Inherit);
    assert_eq!(
        win_package.args,
        vec![
            OsString::from("."),
            OsString::from("--target"),
            OsString::from("node18-win-x64"),
            OsString::from("--output"),
            output.into_os_string(),
        ]
    );

    let win_sign = calls.iter().find(|call| call.program == WIN_SIGN).unwrap();
    assert_eq!(win_sign.stream, StreamMode::Capture);
}

#[tokio::test]
async fn test_signing_disabled() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = test_config(temp_dir.path());
    config.signing = false;
    let runner = Orchestrator::new(FakeInvoker::default(), &config, HostPlatform::MacOs);

    let report = runner
        .run_all(&Target::defaults(), &mut SilentReporter)
        .await
        .unwrap();

    assert!(report.summary.all_succeeded());
    assert!(runner.invoker().signing_calls().is_empty());
}

#[tokio::test]
async fn test_output_dir_reset_before_first_build() {
    let temp_dir = TempDir::new().unwrap();
    let out = temp_dir.path().join("build");
    fs::create_dir_all(out.join("nested")).unwrap();
    fs::write(out.join("maiass-linux-x64"), "stale").unwrap();
    fs::write(out.join("nested").join("old.bin"), "stale").unwrap();

    let runner = orchestrator(FakeInvoker::default(), &out, HostPlatform::Linux);
    runner
        .run_all(&[Target::new(PlatformFamily::Linux, Arch::X64)], &mut SilentReporter)
        .await
        .unwrap();

    // The fake packager writes nothing, so only a reset directory remains.
    assert!(out.is_dir());
    assert_eq!(fs::read_dir(&out).unwrap().count(), 0);
}

#[tokio::test]
async fn test_output_dir_failure_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let out = temp_dir.path().join("build");
    fs::write(&out, "not a directory").unwrap();

    let runner = orchestrator(FakeInvoker::default(), &out, HostPlatform::Linux);
    let result = runner.run_all(&Target::defaults(), &mut SilentReporter).await;

    assert!(result.is_err());
    assert!(runner.invoker().calls().is_empty());
}

#[tokio::test]
async fn test_shutdown_skips_remaining_targets() {
    let temp_dir = TempDir::new().unwrap();
    let invoker = FakeInvoker {
        hang_on: Some("node18-linux-x64".to_string()),
        ..FakeInvoker::default()
    };
    let runner = orchestrator(invoker, temp_dir.path(), HostPlatform::Linux);

    let report = runner
        .run(
            &Target::defaults(),
            &mut SilentReporter,
            tokio::time::sleep(Duration::from_millis(200)),
        )
        .await
        .unwrap();

    assert!(report.summary.cancelled);
    assert_eq!(report.summary.succeeded, 2);
    assert_eq!(report.summary.failed, 0);
    assert_eq!(report.summary.skipped, 4);
    assert_eq!(report.jobs.len(), 2);
    assert_eq!(report.summary.exit_code(), 130);
    assert!(!report.summary.all_succeeded());
    assert_eq!(runner.invoker().calls().len(), 3);
}
