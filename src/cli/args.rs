//! CLI argument definitions
//!
//! Global CLI options, per-command argument groups and configuration merging logic.

use std::path::PathBuf;

use clap::{Args, Parser};

use crate::build::BuildSettings;
use crate::config::Config;
use crate::consts::{
    DEFAULT_CMAKE, DEFAULT_GENERATOR, DEFAULT_LAUNCHER, DEFAULT_OUTPUT_DIR, DEFAULT_PIP,
    DEFAULT_REQUIREMENTS, DEFAULT_SOURCE_DIR,
};

use super::commands::Commands;

#[derive(Parser)]
#[command(name = "rockbuild")]
#[command(about = "Containerized build driver for cmake/ninja projects", version)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Commands,

    /// Enable debug output (show resolved settings and environment)
    #[arg(long, global = true)]
    pub(crate) debug: bool,

    /// Read configuration from this file instead of the default locations
    #[arg(long, global = true, value_name = "PATH")]
    pub(crate) config: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Args)]
pub(crate) struct BuildArgs {
    /// Source checkout to configure (default: /therock/src)
    #[arg(long, value_name = "DIR")]
    pub(crate) source_dir: Option<PathBuf>,

    /// Output root for caches and the build tree (default: /therock/output)
    #[arg(long, value_name = "DIR")]
    pub(crate) output_dir: Option<PathBuf>,

    /// Compiler launcher passed to CMake (default: ccache)
    #[arg(long, value_name = "PROGRAM")]
    pub(crate) launcher: Option<String>,

    /// Do not set CMAKE_<LANG>_COMPILER_LAUNCHER
    #[arg(long, conflicts_with = "launcher")]
    pub(crate) no_launcher: bool,

    /// pip executable used to install requirements
    #[arg(long, value_name = "PROGRAM")]
    pub(crate) pip: Option<String>,

    /// cmake executable
    #[arg(long, value_name = "PROGRAM")]
    pub(crate) cmake: Option<String>,

    /// CMake generator (default: Ninja)
    #[arg(short = 'G', long, value_name = "NAME")]
    pub(crate) generator: Option<String>,

    /// Requirements file, relative to the source directory unless absolute
    #[arg(short, long, value_name = "FILE")]
    pub(crate) requirements: Option<PathBuf>,

    /// Skip installing Python requirements
    #[arg(long)]
    pub(crate) skip_pip: bool,

    /// Value for -DTHEROCK_AMDGPU_FAMILIES
    #[arg(long, value_name = "FAMILIES")]
    pub(crate) amdgpu_families: Option<String>,

    /// Value for -DTHEROCK_PACKAGE_VERSION
    #[arg(long, value_name = "VERSION")]
    pub(crate) package_version: Option<String>,

    /// Build only this target
    #[arg(short, long, value_name = "TARGET")]
    pub(crate) target: Option<String>,

    /// Parallel build jobs passed to `cmake --build --parallel`
    #[arg(short = 'j', long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub(crate) parallel: Option<u32>,

    /// Tee each step's output into <DIR>/<step>.log
    #[arg(long, value_name = "DIR")]
    pub(crate) log_dir: Option<PathBuf>,

    /// Write a JSON build summary to this file
    #[arg(long, value_name = "FILE")]
    pub(crate) summary: Option<PathBuf>,

    /// Print the environment and commands without running anything
    #[arg(short = 'n', long)]
    pub(crate) dry_run: bool,

    /// Extra arguments forwarded to the cmake configure step
    #[arg(last = true, value_name = "CMAKE_ARGS")]
    pub(crate) cmake_args: Vec<String>,
}

impl BuildArgs {
    /// Merge config file values into CLI (CLI args take precedence)
    pub(crate) fn with_config(self, config: &Config) -> BuildSettings {
        let source_dir = self
            .source_dir
            .or_else(|| config.source_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SOURCE_DIR));
        let output_dir = self
            .output_dir
            .or_else(|| config.output_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

        // A launcher given on the command line wins over no_launcher in the config
        let launcher = if self.no_launcher || (config.no_launcher && self.launcher.is_none()) {
            None
        } else {
            Some(
                self.launcher
                    .or_else(|| config.launcher.clone())
                    .unwrap_or_else(|| DEFAULT_LAUNCHER.to_string()),
            )
        };

        let requirements = self
            .requirements
            .or_else(|| config.requirements.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_REQUIREMENTS));
        let requirements = if requirements.is_absolute() {
            requirements
        } else {
            source_dir.join(requirements)
        };

        // Config args come first so the command line can override them
        let mut cmake_args = config.cmake_args.clone();
        cmake_args.extend(self.cmake_args);

        BuildSettings {
            source_dir,
            output_dir,
            launcher,
            pip: self
                .pip
                .or_else(|| config.pip.clone())
                .unwrap_or_else(|| DEFAULT_PIP.to_string()),
            cmake: self
                .cmake
                .or_else(|| config.cmake.clone())
                .unwrap_or_else(|| DEFAULT_CMAKE.to_string()),
            generator: self
                .generator
                .or_else(|| config.generator.clone())
                .unwrap_or_else(|| DEFAULT_GENERATOR.to_string()),
            requirements,
            skip_pip: self.skip_pip || config.skip_pip,
            amdgpu_families: self
                .amdgpu_families
                .or_else(|| config.amdgpu_families.clone()),
            package_version: self
                .package_version
                .or_else(|| config.package_version.clone()),
            target: self.target,
            parallel: self.parallel.or(config.parallel),
            log_dir: self.log_dir.or_else(|| config.log_dir.clone()),
            summary: self.summary,
            dry_run: self.dry_run,
            cmake_args,
        }
    }
}

#[derive(Debug, Clone, Default, Args)]
pub(crate) struct TeatimeArgs {
    /// Prefix console lines with "[LABEL] " and report total time
    #[arg(long)]
    pub(crate) label: Option<String>,

    /// Only print console output if the child fails
    #[arg(long)]
    pub(crate) no_interactive: bool,

    /// Prefix log file lines with seconds since start
    #[arg(long)]
    pub(crate) log_timestamps: bool,

    /// Also write output to this log file
    pub(crate) file: Option<PathBuf>,

    /// Command to run; without it, stdin is forwarded
    #[arg(last = true, value_name = "COMMAND")]
    pub(crate) child: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn parse_build(args: &[&str]) -> BuildArgs {
        let mut argv = vec!["rockbuild", "build"];
        argv.extend_from_slice(args);
        match Cli::parse_from(argv).command {
            Commands::Build(args) => args,
            _ => panic!("expected build command"),
        }
    }

    #[test]
    fn defaults_match_container_layout() {
        let settings = parse_build(&[]).with_config(&Config::default());
        assert_eq!(settings.source_dir, Path::new("/therock/src"));
        assert_eq!(settings.output_dir, Path::new("/therock/output"));
        assert_eq!(settings.launcher.as_deref(), Some("ccache"));
        assert_eq!(settings.generator, "Ninja");
        assert_eq!(
            settings.requirements,
            Path::new("/therock/src/requirements.txt")
        );
        assert!(!settings.skip_pip);
    }

    #[test]
    fn trailing_args_are_forwarded_verbatim() {
        let args = parse_build(&["--", "-DTHEROCK_ENABLE_ALL=OFF", "--fresh"]);
        assert_eq!(args.cmake_args, vec!["-DTHEROCK_ENABLE_ALL=OFF", "--fresh"]);
    }

    #[test]
    fn cli_overrides_config() {
        let config = Config {
            source_dir: Some(PathBuf::from("/cfg/src")),
            launcher: Some("sccache".to_string()),
            cmake_args: vec!["-DFROM_CONFIG=1".to_string()],
            ..Config::default()
        };
        let settings = parse_build(&["--source-dir", "/cli/src", "--", "-DFROM_CLI=1"])
            .with_config(&config);
        assert_eq!(settings.source_dir, Path::new("/cli/src"));
        assert_eq!(settings.launcher.as_deref(), Some("sccache"));
        assert_eq!(settings.cmake_args, vec!["-DFROM_CONFIG=1", "-DFROM_CLI=1"]);
    }

    #[test]
    fn no_launcher_from_config_or_cli() {
        let config = Config {
            no_launcher: true,
            ..Config::default()
        };
        assert!(parse_build(&[]).with_config(&config).launcher.is_none());
        assert!(
            parse_build(&["--no-launcher"])
                .with_config(&Config::default())
                .launcher
                .is_none()
        );
        assert_eq!(
            parse_build(&["--launcher", "ccache"])
                .with_config(&config)
                .launcher
                .as_deref(),
            Some("ccache")
        );
    }

    #[test]
    fn parallel_must_be_positive() {
        assert!(Cli::try_parse_from(["rockbuild", "build", "-j", "0"]).is_err());
        assert_eq!(parse_build(&["-j", "8"]).parallel, Some(8));
    }

    #[test]
    fn absolute_requirements_are_kept() {
        let settings =
            parse_build(&["--requirements", "/tmp/reqs.txt"]).with_config(&Config::default());
        assert_eq!(settings.requirements, Path::new("/tmp/reqs.txt"));
    }

    #[test]
    fn teatime_splits_child_command() {
        let cli = Cli::parse_from([
            "rockbuild", "teatime", "--label", "amd-llvm", "build.log", "--", "ninja", "-v",
        ]);
        match cli.command {
            Commands::Teatime(args) => {
                assert_eq!(args.label.as_deref(), Some("amd-llvm"));
                assert_eq!(args.file, Some(PathBuf::from("build.log")));
                assert_eq!(args.child, vec!["ninja", "-v"]);
            }
            _ => panic!("expected teatime command"),
        }
    }
}
