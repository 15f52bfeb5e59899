//! Step list for a build

use std::path::Path;

use crate::build::BuildSettings;
use crate::build::env::build_env;
use crate::build::layout::Layout;
use crate::process::Step;

pub(crate) const PIP_STEP: &str = "pip-install";
pub(crate) const CONFIGURE_STEP: &str = "configure";
pub(crate) const BUILD_STEP: &str = "build";

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Steps in execution order: pip install, cmake configure, cmake build
pub(crate) fn plan_steps(settings: &BuildSettings, layout: &Layout) -> Vec<Step> {
    let env = build_env(layout, settings.launcher.as_deref());
    let step = |name, program: &str, args| Step {
        name,
        program: program.to_string(),
        args,
        env: env.clone(),
        cwd: Some(layout.source_dir.clone()),
    };

    let mut steps = Vec::with_capacity(3);
    if !settings.skip_pip {
        steps.push(step(PIP_STEP, &settings.pip, pip_args(settings)));
    }
    steps.push(step(
        CONFIGURE_STEP,
        &settings.cmake,
        configure_args(settings, layout),
    ));
    steps.push(step(BUILD_STEP, &settings.cmake, build_args(settings, layout)));
    steps
}

fn pip_args(settings: &BuildSettings) -> Vec<String> {
    vec![
        "install".to_string(),
        "-r".to_string(),
        path_arg(&settings.requirements),
    ]
}

fn configure_args(settings: &BuildSettings, layout: &Layout) -> Vec<String> {
    let mut args = vec![
        format!("-G{}", settings.generator),
        "-S".to_string(),
        path_arg(&layout.source_dir),
        "-B".to_string(),
        path_arg(&layout.build_dir),
    ];
    if let Some(families) = &settings.amdgpu_families {
        args.push(format!("-DTHEROCK_AMDGPU_FAMILIES={families}"));
    }
    if let Some(version) = &settings.package_version {
        args.push(format!("-DTHEROCK_PACKAGE_VERSION={version}"));
    }
    args.extend(settings.cmake_args.iter().cloned());
    args
}

fn build_args(settings: &BuildSettings, layout: &Layout) -> Vec<String> {
    let mut args = vec!["--build".to_string(), path_arg(&layout.build_dir)];
    if let Some(target) = &settings.target {
        args.push("--target".to_string());
        args.push(target.clone());
    }
    if let Some(jobs) = settings.parallel {
        args.push("--parallel".to_string());
        args.push(jobs.to_string());
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::tests::settings;

    fn names(steps: &[Step]) -> Vec<&'static str> {
        steps.iter().map(|s| s.name).collect()
    }

    #[test]
    fn default_plan_order() {
        let settings = settings(Path::new("/therock/src"), Path::new("/therock/output"));
        let layout = Layout::new(&settings.source_dir, &settings.output_dir);
        let steps = plan_steps(&settings, &layout);
        assert_eq!(names(&steps), vec![PIP_STEP, CONFIGURE_STEP, BUILD_STEP]);

        assert_eq!(
            steps[0].command_line(),
            "pip install -r /therock/src/requirements.txt"
        );
        assert_eq!(
            steps[1].args,
            vec!["-GNinja", "-S", "/therock/src", "-B", "/therock/output/build"]
        );
        assert_eq!(steps[2].command_line(), "cmake --build /therock/output/build");
        assert!(steps.iter().all(|s| s.cwd.as_deref() == Some(Path::new("/therock/src"))));
    }

    #[test]
    fn skip_pip_drops_install_step() {
        let mut settings = settings(Path::new("/src"), Path::new("/out"));
        settings.skip_pip = true;
        let layout = Layout::new(&settings.source_dir, &settings.output_dir);
        assert_eq!(
            names(&plan_steps(&settings, &layout)),
            vec![CONFIGURE_STEP, BUILD_STEP]
        );
    }

    #[test]
    fn caller_args_go_last_on_configure_only() {
        let mut settings = settings(Path::new("/src"), Path::new("/out"));
        settings.amdgpu_families = Some("gfx110X-dgpu".to_string());
        settings.package_version = Some("7.0.0rc1".to_string());
        settings.cmake_args = vec!["-DTHEROCK_ENABLE_BLAS=ON".to_string()];
        settings.target = Some("therock-dist".to_string());
        settings.parallel = Some(32);
        let layout = Layout::new(&settings.source_dir, &settings.output_dir);
        let steps = plan_steps(&settings, &layout);

        let configure = &steps[1].args;
        assert_eq!(configure[5], "-DTHEROCK_AMDGPU_FAMILIES=gfx110X-dgpu");
        assert_eq!(configure[6], "-DTHEROCK_PACKAGE_VERSION=7.0.0rc1");
        assert_eq!(configure.last().map(String::as_str), Some("-DTHEROCK_ENABLE_BLAS=ON"));

        assert_eq!(
            steps[2].args,
            vec!["--build", "/out/build", "--target", "therock-dist", "--parallel", "32"]
        );
    }

    #[test]
    fn every_step_carries_cache_env() {
        let settings = settings(Path::new("/src"), Path::new("/out"));
        let layout = Layout::new(&settings.source_dir, &settings.output_dir);
        for step in plan_steps(&settings, &layout) {
            assert_eq!(step.env_var("CCACHE_DIR"), Some("/out/caches/ccache"));
            assert_eq!(step.env_var("PIP_CACHE_DIR"), Some("/out/caches/pip"));
            assert_eq!(step.env_var("CMAKE_CXX_COMPILER_LAUNCHER"), Some("ccache"));
        }
    }
}
