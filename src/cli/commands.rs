//! CLI subcommand definitions

use std::path::PathBuf;

use clap::Subcommand;

use super::args::{BuildArgs, TeatimeArgs};

/// Main CLI commands
#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Create cache dirs, install requirements, run cmake configure and build
    Build(BuildArgs),
    /// Tee and time a command's output (or stdin) into a log file
    Teatime(TeatimeArgs),
    /// Print a stable compiler fingerprint for ccache's compiler_check
    CompilerCheck {
        /// Directory holding previously computed fingerprints
        cache_dir: PathBuf,
        /// Compiler executable to fingerprint
        compiler: PathBuf,
    },
    /// Merge compile_commands.json fragments into one file
    MergeCompileCommands {
        /// Merged output file
        output: PathBuf,
        /// Input fragments; missing or empty files are skipped
        inputs: Vec<PathBuf>,
    },
}
