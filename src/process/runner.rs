//! Build steps and the runner that executes them

use std::path::PathBuf;
use std::process::Command;
use std::time::{Duration, Instant};

use crate::error::AppError;
use crate::teatime::{self, OutputSink, SinkOptions};
use crate::utils::quote_command;

/// One external tool invocation in the build pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Step {
    pub(crate) name: &'static str,
    pub(crate) program: String,
    pub(crate) args: Vec<String>,
    pub(crate) env: Vec<(String, String)>,
    pub(crate) cwd: Option<PathBuf>,
}

impl Step {
    /// Shell-quoted command line, for logs and dry runs
    pub(crate) fn command_line(&self) -> String {
        quote_command(&self.program, &self.args)
    }

    pub(crate) fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command.envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        if let Some(cwd) = &self.cwd {
            command.current_dir(cwd);
        }
        command
    }

    /// Value of an environment variable set on this step
    #[cfg(test)]
    pub(crate) fn env_var(&self, name: &str) -> Option<&str> {
        self.env
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StepOutcome {
    pub(crate) exit_code: i32,
    pub(crate) duration: Duration,
}

impl StepOutcome {
    pub(crate) fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Executes build steps; swapped out in tests
pub(crate) trait StepRunner {
    fn run(&mut self, step: &Step) -> Result<StepOutcome, AppError>;
}

/// Runs steps as real child processes, optionally teeing output into logs
pub(crate) struct ProcessRunner {
    log_dir: Option<PathBuf>,
    gh_group: bool,
}

impl ProcessRunner {
    pub(crate) fn new(log_dir: Option<PathBuf>, gh_group: bool) -> Self {
        Self { log_dir, gh_group }
    }
}

impl StepRunner for ProcessRunner {
    fn run(&mut self, step: &Step) -> Result<StepOutcome, AppError> {
        tracing::info!("Running {}: {}", step.name, step.command_line());
        let started = Instant::now();
        let mut command = step.to_command();

        let exit_code = match &self.log_dir {
            Some(dir) => {
                let mut sink = OutputSink::new(
                    std::io::stdout(),
                    SinkOptions {
                        label: Some(step.name.to_string()),
                        interactive: true,
                        log_path: Some(dir.join(format!("{}.log", step.name))),
                        log_timestamps: true,
                        gh_group: self.gh_group,
                    },
                )?;
                teatime::tee_command(&mut sink, command, &step.program, &step.command_line())?
            }
            None => super::run_in_group(&mut command, &step.program)?,
        };

        Ok(StepOutcome {
            exit_code,
            duration: started.elapsed(),
        })
    }
}
