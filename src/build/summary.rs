//! JSON build summary

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::AppError;
use crate::process::{Step, StepOutcome};

#[derive(Debug, Clone, Serialize)]
pub(crate) struct StepRecord {
    pub(crate) name: String,
    pub(crate) command: String,
    pub(crate) exit_code: i32,
    pub(crate) duration_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct BuildSummary {
    pub(crate) started_at: DateTime<Utc>,
    pub(crate) finished_at: Option<DateTime<Utc>>,
    pub(crate) success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) error: Option<String>,
    pub(crate) steps: Vec<StepRecord>,
}

impl BuildSummary {
    pub(crate) fn start() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            success: false,
            error: None,
            steps: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, step: &Step, outcome: &StepOutcome) {
        self.steps.push(StepRecord {
            name: step.name.to_string(),
            command: step.command_line(),
            exit_code: outcome.exit_code,
            duration_ms: u64::try_from(outcome.duration.as_millis()).unwrap_or(u64::MAX),
        });
    }

    pub(crate) fn finish(&mut self, result: &Result<(), AppError>) {
        self.finished_at = Some(Utc::now());
        self.success = result.is_ok();
        self.error = result.as_ref().err().map(ToString::to_string);
    }

    pub(crate) fn write(&self, path: &Path) -> Result<(), AppError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|source| AppError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| AppError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(|source| AppError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
