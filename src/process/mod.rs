//! Child process plumbing
//!
//! Every external tool runs as the leader of its own process group so an
//! interrupt can be relayed to the tool and everything it spawned.

pub(crate) mod runner;
pub(crate) mod signals;

use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::process::{Child, Command, ExitStatus, Stdio};

use crate::error::{AppError, EXIT_FAILURE};

pub(crate) use runner::{ProcessRunner, Step, StepOutcome, StepRunner};
pub(crate) use signals::ActiveGroup;

/// Map an exit status to a shell-style exit code (128 + signal when killed)
pub(crate) fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    status.signal().map_or(EXIT_FAILURE, |signal| 128 + signal)
}

fn spawn_error(program: &str, e: std::io::Error) -> AppError {
    if e.kind() == std::io::ErrorKind::NotFound {
        AppError::ToolNotFound {
            program: program.to_string(),
        }
    } else {
        AppError::Spawn {
            program: program.to_string(),
            source: e,
        }
    }
}

/// Spawn `command` in a new process group and make that group the
/// interrupt forwarding target.
///
/// The group is never the terminal's foreground group, so stdin is
/// `/dev/null`: a tty read would stop the child with SIGTTIN.
pub(crate) fn spawn_in_group(
    command: &mut Command,
    program: &str,
) -> Result<(Child, ActiveGroup), AppError> {
    command.process_group(0).stdin(Stdio::null());
    let child = command.spawn().map_err(|e| spawn_error(program, e))?;
    let group = ActiveGroup::register(child.id());
    tracing::debug!("Spawned {program} as group {}", group.pgid());
    Ok((child, group))
}

/// Wait for a child started by [`spawn_in_group`]. A signal received while it
/// ran turns into [`AppError::Interrupted`].
pub(crate) fn wait_in_group(
    mut child: Child,
    group: ActiveGroup,
    program: &str,
) -> Result<i32, AppError> {
    let status = child.wait().map_err(|source| AppError::Wait {
        program: program.to_string(),
        source,
    })?;
    drop(group);

    if let Some(signal) = signals::received() {
        tracing::warn!("{program} stopped by forwarded signal {signal}");
        return Err(AppError::Interrupted { signal });
    }
    Ok(exit_code(status))
}

/// Run `command` to completion with inherited stdio
pub(crate) fn run_in_group(command: &mut Command, program: &str) -> Result<i32, AppError> {
    let (child, group) = spawn_in_group(command, program)?;
    wait_in_group(child, group, program)
}
