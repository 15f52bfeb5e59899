//! Container build pipeline
//!
//! Prepares the cache layout, then runs pip install, cmake configure and
//! cmake build in order. The first failing step aborts the build and its
//! exit code becomes ours.

pub(crate) mod env;
pub(crate) mod layout;
pub(crate) mod plan;
pub(crate) mod summary;

use std::fmt::Write as _;
use std::path::PathBuf;

use crate::error::AppError;
use crate::process::{Step, StepRunner, signals};

pub(crate) use layout::Layout;
pub(crate) use summary::BuildSummary;

/// Fully resolved build settings (CLI merged over config over defaults)
#[derive(Debug, Clone)]
pub(crate) struct BuildSettings {
    pub(crate) source_dir: PathBuf,
    pub(crate) output_dir: PathBuf,
    pub(crate) launcher: Option<String>,
    pub(crate) pip: String,
    pub(crate) cmake: String,
    pub(crate) generator: String,
    pub(crate) requirements: PathBuf,
    pub(crate) skip_pip: bool,
    pub(crate) amdgpu_families: Option<String>,
    pub(crate) package_version: Option<String>,
    pub(crate) target: Option<String>,
    pub(crate) parallel: Option<u32>,
    pub(crate) log_dir: Option<PathBuf>,
    pub(crate) summary: Option<PathBuf>,
    pub(crate) dry_run: bool,
    /// Config `cmake_args` followed by arguments given after `--`
    pub(crate) cmake_args: Vec<String>,
}

impl BuildSettings {
    pub(crate) fn layout(&self) -> Layout {
        Layout::new(&self.source_dir, &self.output_dir)
    }

    pub(crate) fn steps(&self) -> Vec<Step> {
        plan::plan_steps(self, &self.layout())
    }
}

/// Render what a build would do, without touching the filesystem
pub(crate) fn describe(settings: &BuildSettings) -> String {
    let layout = settings.layout();
    let mut out = String::new();
    for dir in layout.output_dirs() {
        let _ = writeln!(out, "mkdir -p {}", dir.display());
    }
    for (name, value) in env::build_env(&layout, settings.launcher.as_deref()) {
        let _ = writeln!(out, "export {name}={value}");
    }
    for step in settings.steps() {
        let _ = writeln!(out, "{}", step.command_line());
    }
    out
}

/// Run the whole build through `runner`
pub(crate) fn run_build<R: StepRunner>(
    settings: &BuildSettings,
    runner: &mut R,
) -> Result<(), AppError> {
    let layout = settings.layout();
    layout.check_source()?;
    layout.prepare()?;

    let mut summary = BuildSummary::start();
    let result = run_steps(&settings.steps(), runner, &mut summary);
    summary.finish(&result);

    if let Some(path) = &settings.summary {
        match (summary.write(path), &result) {
            (Err(e), Ok(())) => return Err(e),
            (Err(e), Err(_)) => tracing::warn!("{e}"),
            (Ok(()), _) => tracing::debug!("Wrote build summary to {}", path.display()),
        }
    }
    result
}

fn run_steps<R: StepRunner>(
    steps: &[Step],
    runner: &mut R,
    summary: &mut BuildSummary,
) -> Result<(), AppError> {
    for step in steps {
        if let Some(signal) = signals::received() {
            return Err(AppError::Interrupted { signal });
        }

        let outcome = runner.run(step)?;
        summary.record(step, &outcome);
        if !outcome.success() {
            tracing::error!("{} failed with exit code {}", step.name, outcome.exit_code);
            return Err(AppError::StepFailed {
                step: step.name.to_string(),
                code: outcome.exit_code,
            });
        }
        tracing::info!(
            "{} finished in {:.1}s",
            step.name,
            outcome.duration.as_secs_f64()
        );
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::consts::{DEFAULT_CMAKE, DEFAULT_GENERATOR, DEFAULT_PIP};
    use crate::process::StepOutcome;
    use std::collections::HashMap;
    use std::path::Path;
    use std::time::Duration;

    pub(crate) fn settings(source: &Path, output: &Path) -> BuildSettings {
        BuildSettings {
            source_dir: source.to_path_buf(),
            output_dir: output.to_path_buf(),
            launcher: Some("ccache".to_string()),
            pip: DEFAULT_PIP.to_string(),
            cmake: DEFAULT_CMAKE.to_string(),
            generator: DEFAULT_GENERATOR.to_string(),
            requirements: source.join("requirements.txt"),
            skip_pip: false,
            amdgpu_families: None,
            package_version: None,
            target: None,
            parallel: None,
            log_dir: None,
            summary: None,
            dry_run: false,
            cmake_args: Vec::new(),
        }
    }

    /// Records steps instead of running them
    struct RecordingRunner {
        layout: Layout,
        exit_codes: HashMap<&'static str, i32>,
        ran: Vec<Step>,
        dirs_ready: Vec<bool>,
    }

    impl RecordingRunner {
        fn new(layout: Layout) -> Self {
            Self {
                layout,
                exit_codes: HashMap::new(),
                ran: Vec::new(),
                dirs_ready: Vec::new(),
            }
        }

        fn failing(mut self, step: &'static str, code: i32) -> Self {
            self.exit_codes.insert(step, code);
            self
        }
    }

    impl StepRunner for RecordingRunner {
        fn run(&mut self, step: &Step) -> Result<StepOutcome, AppError> {
            self.dirs_ready
                .push(self.layout.output_dirs().iter().all(|d| d.is_dir()));
            self.ran.push(step.clone());
            Ok(StepOutcome {
                exit_code: self.exit_codes.get(step.name).copied().unwrap_or(0),
                duration: Duration::from_millis(5),
            })
        }
    }

    fn fixture() -> (tempfile::TempDir, BuildSettings) {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = dir.path().join("src");
        std::fs::create_dir_all(&source).expect("mkdir src");
        let settings = settings(&source, &dir.path().join("output"));
        (dir, settings)
    }

    #[test]
    fn cache_dirs_exist_before_first_step() {
        let (_dir, settings) = fixture();
        let mut runner = RecordingRunner::new(settings.layout());
        run_build(&settings, &mut runner).expect("build");
        assert_eq!(runner.ran.len(), 3);
        assert!(runner.dirs_ready.iter().all(|ready| *ready));
    }

    #[test]
    fn env_is_set_on_cmake_steps() {
        let (_dir, settings) = fixture();
        let layout = settings.layout();
        let mut runner = RecordingRunner::new(layout.clone());
        run_build(&settings, &mut runner).expect("build");

        let ccache_dir = layout.ccache_dir.to_string_lossy().into_owned();
        for step in runner.ran.iter().filter(|s| s.program == "cmake") {
            assert_eq!(step.env_var("CCACHE_DIR"), Some(ccache_dir.as_str()));
            assert_eq!(step.env_var("CMAKE_C_COMPILER_LAUNCHER"), Some("ccache"));
        }
    }

    #[test]
    fn failing_step_stops_the_pipeline() {
        let (_dir, settings) = fixture();
        let mut runner =
            RecordingRunner::new(settings.layout()).failing(plan::CONFIGURE_STEP, 2);
        let err = run_build(&settings, &mut runner).expect_err("should fail");

        assert!(matches!(err, AppError::StepFailed { code: 2, .. }));
        assert_eq!(err.exit_code(), 2);
        let names: Vec<_> = runner.ran.iter().map(|s| s.name).collect();
        assert_eq!(names, vec![plan::PIP_STEP, plan::CONFIGURE_STEP]);
    }

    #[test]
    fn missing_source_runs_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = settings(&dir.path().join("absent"), &dir.path().join("output"));
        let mut runner = RecordingRunner::new(settings.layout());
        let err = run_build(&settings, &mut runner).expect_err("should fail");
        assert!(matches!(err, AppError::SourceMissing { .. }));
        assert!(runner.ran.is_empty());
        assert!(!dir.path().join("output").exists());
    }

    #[test]
    fn summary_is_written_on_failure() {
        let (dir, mut settings) = fixture();
        let summary_path = dir.path().join("summary.json");
        settings.summary = Some(summary_path.clone());
        let mut runner = RecordingRunner::new(settings.layout()).failing(plan::BUILD_STEP, 1);
        assert!(run_build(&settings, &mut runner).is_err());

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&summary_path).expect("read"))
                .expect("json");
        assert_eq!(json["success"], false);
        assert_eq!(json["steps"].as_array().map(Vec::len), Some(3));
        assert_eq!(json["steps"][2]["exit_code"], 1);
    }

    #[test]
    fn describe_lists_dirs_env_and_commands() {
        let settings = settings(Path::new("/therock/src"), Path::new("/therock/output"));
        let text = describe(&settings);
        assert!(text.contains("mkdir -p /therock/output/caches/ccache\n"));
        assert!(text.contains("export CCACHE_DIR=/therock/output/caches/ccache\n"));
        assert!(text.contains("export CMAKE_C_COMPILER_LAUNCHER=ccache\n"));
        assert!(text.ends_with("cmake --build /therock/output/build\n"));
    }
}
