use std::io::Write;
use std::path::{Path, PathBuf};

use crate::build::{self, BuildSettings};
use crate::ccache::compiler_check;
use crate::cli::{Cli, Commands, TeatimeArgs};
use crate::compile_commands;
use crate::config::Config;
use crate::consts::{TEATIME_FORCE_INTERACTIVE, TEATIME_LABEL_GH_GROUP};
use crate::error::AppError;
use crate::process::{ProcessRunner, signals};
use crate::teatime::{self, OutputSink, SinkOptions};

fn install_signal_forwarding() -> Result<(), AppError> {
    signals::install().map_err(|source| AppError::Io {
        path: PathBuf::from("<signal handlers>"),
        source,
    })
}

/// GitHub Actions grouping; an unparsable value only costs the grouping
fn gh_group_enabled() -> bool {
    match teatime::env_flag(TEATIME_LABEL_GH_GROUP) {
        Ok(enabled) => enabled.unwrap_or(false),
        Err(e) => {
            tracing::warn!("{e} (not emitting GitHub Actions groups)");
            false
        }
    }
}

fn handle_build(settings: BuildSettings) -> Result<i32, AppError> {
    tracing::debug!("Resolved build settings: {settings:?}");

    if settings.dry_run {
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(build::describe(&settings).as_bytes())
            .map_err(|source| AppError::Io {
                path: PathBuf::from("<stdout>"),
                source,
            })?;
        return Ok(0);
    }

    install_signal_forwarding()?;
    let mut runner = ProcessRunner::new(settings.log_dir.clone(), gh_group_enabled());
    build::run_build(&settings, &mut runner)?;
    tracing::info!("Build complete: {}", settings.layout().build_dir.display());
    Ok(0)
}

fn handle_teatime(args: TeatimeArgs) -> Result<i32, AppError> {
    let interactive = match teatime::env_flag(TEATIME_FORCE_INTERACTIVE)? {
        Some(forced) => forced,
        None => !args.no_interactive,
    };

    install_signal_forwarding()?;
    let mut sink = OutputSink::new(
        std::io::stdout(),
        SinkOptions {
            label: args.label,
            interactive,
            log_path: args.file,
            log_timestamps: args.log_timestamps,
            gh_group: gh_group_enabled(),
        },
    )?;
    teatime::tee_argv(&mut sink, &args.child)
}

fn handle_compiler_check(cache_dir: &Path, compiler: &Path) -> Result<i32, AppError> {
    let fingerprint = compiler_check(cache_dir, compiler)?;
    println!("{fingerprint}");
    Ok(0)
}

fn handle_merge(output: &Path, inputs: &[PathBuf]) -> Result<i32, AppError> {
    compile_commands::merge(output, inputs)?;
    Ok(0)
}

/// Dispatch a parsed command line. Returns the process exit code.
pub(crate) fn run(cli: Cli) -> Result<i32, AppError> {
    match cli.command {
        Commands::Build(args) => {
            // compiler-check runs once per compile, so only build reads config
            let config = match &cli.config {
                Some(path) => Config::load_from(path)?,
                None => Config::load(),
            };
            handle_build(args.with_config(&config))
        }
        Commands::Teatime(args) => handle_teatime(args),
        Commands::CompilerCheck {
            cache_dir,
            compiler,
        } => handle_compiler_check(&cache_dir, &compiler),
        Commands::MergeCompileCommands { output, inputs } => handle_merge(&output, &inputs),
    }
}
