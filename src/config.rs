use crate::core::Target;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildConfig {
    pub project_name: String,
    pub runtime: String,
    pub output_dir: PathBuf,
    pub packager: String,
    pub packager_args: Vec<String>,
    pub mac_sign_script: PathBuf,
    pub win_sign_script: PathBuf,
    pub signing: bool,
    /// Stdout carries the JSON report, so packager output is moved to stderr.
    pub machine_output: bool,
    pub targets: Vec<Target>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            project_name: "maiass".to_string(),
            runtime: "node18".to_string(),
            output_dir: PathBuf::from("build"),
            packager: "npx".to_string(),
            packager_args: vec!["pkg".to_string(), ".".to_string()],
            mac_sign_script: PathBuf::from("./scripts/codesign.sh"),
            win_sign_script: PathBuf::from("./scripts/codesign-windows.sh"),
            signing: true,
            machine_output: false,
            targets: Target::defaults(),
        }
    }
}

impl BuildConfig {
    /// Restricts the run to `selected`, keeping declaration order. An empty
    /// selection keeps every target.
    pub fn select_targets(&mut self, selected: &[Target]) {
        if selected.is_empty() {
            return;
        }
        self.targets.retain(|target| selected.contains(target));
    }
}
