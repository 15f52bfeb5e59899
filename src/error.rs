use std::path::PathBuf;

use thiserror::Error;

/// Exit code for driver failures that are not a child's own exit status
pub(crate) const EXIT_FAILURE: i32 = 1;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("Source directory not found: {}", path.display())]
    SourceMissing { path: PathBuf },

    #[error("Failed to create {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{program} not found. Is it installed and on PATH?")]
    ToolNotFound { program: String },

    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("Failed to wait for {program}: {source}")]
    Wait {
        program: String,
        source: std::io::Error,
    },

    #[error("Step \"{step}\" failed with exit code {code}")]
    StepFailed { step: String, code: i32 },

    #[error("Interrupted by signal {signal}")]
    Interrupted { signal: i32 },

    #[error("Failed to read config {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Expected {name} env var to be an integer, got \"{value}\"")]
    InvalidEnv { name: &'static str, value: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Expected a JSON array in {}", path.display())]
    NotAnArray { path: PathBuf },

    #[error("{0}")]
    CompilerCheck(#[from] CompilerCheckError),
}

impl AppError {
    /// Process exit code for this error
    pub(crate) fn exit_code(&self) -> i32 {
        match self {
            AppError::StepFailed { code, .. } => *code,
            AppError::Interrupted { signal } => 128 + signal,
            _ => EXIT_FAILURE,
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum CompilerCheckError {
    #[error("Failed to stat compiler {}: {source}", path.display())]
    Compiler {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("ldd not found. It is required to fingerprint the compiler.")]
    LddNotFound,

    #[error("Failed to run ldd: {0}")]
    LddSpawn(std::io::Error),

    #[error("ldd failed: {0}")]
    LddFailed(String),

    #[error("Could not match ldd output: {0}")]
    UnmatchedLine(String),

    #[error("Failed to hash {}: {source}", path.display())]
    Hash {
        path: PathBuf,
        source: std::io::Error,
    },
}
