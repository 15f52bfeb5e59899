//! teatime: tee + time for build logs
//!
//! Forwards a child's combined stdout/stderr (or stdin, in pipeline mode) to
//! the console and optionally a log file, with labels and timing.

pub(crate) mod sink;

use std::io::{BufRead, BufReader, Write};
use std::process::Command;

use crate::error::AppError;
use crate::process;

pub(crate) use sink::{OutputSink, SinkOptions};

/// Parse an integer-valued boolean env var. Unset or empty means `None`.
pub(crate) fn env_flag(name: &'static str) -> Result<Option<bool>, AppError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => parse_flag(name, &value).map(Some),
        _ => Ok(None),
    }
}

fn parse_flag(name: &'static str, value: &str) -> Result<bool, AppError> {
    value
        .trim()
        .parse::<i64>()
        .map(|v| v != 0)
        .map_err(|_| AppError::InvalidEnv {
            name,
            value: value.to_string(),
        })
}

fn read_error(e: std::io::Error) -> AppError {
    AppError::Io {
        path: "<child output>".into(),
        source: e,
    }
}

fn forward_lines<W: Write, R: BufRead>(
    sink: &mut OutputSink<W>,
    mut reader: R,
) -> Result<(), AppError> {
    let mut line = Vec::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).map_err(read_error)? == 0 {
            return Ok(());
        }
        sink.write_line(&line)?;
    }
}

/// Pipeline mode: forward `reader` until EOF
pub(crate) fn tee_reader<W: Write, R: BufRead>(
    sink: &mut OutputSink<W>,
    reader: R,
) -> Result<i32, AppError> {
    sink.start()?;
    let result = forward_lines(sink, reader);
    sink.finish()?;
    result.map(|()| 0)
}

/// Subprocess mode: run `command` with stderr merged into stdout and forward
/// its output. Returns the child's exit code. Buffered output is dumped to
/// the console if the child fails or is interrupted.
pub(crate) fn tee_command<W: Write>(
    sink: &mut OutputSink<W>,
    command: Command,
    program: &str,
    command_line: &str,
) -> Result<i32, AppError> {
    sink.start()?;
    let result = run_child(sink, command, program, command_line);
    if !matches!(result, Ok(0)) {
        sink.dump()?;
    }
    sink.finish()?;
    result
}

fn run_child<W: Write>(
    sink: &mut OutputSink<W>,
    mut command: Command,
    program: &str,
    command_line: &str,
) -> Result<i32, AppError> {
    if sink.has_log() {
        let cwd = match command.get_current_dir() {
            Some(dir) => dir.to_path_buf(),
            None => std::env::current_dir().map_err(|source| AppError::Io {
                path: ".".into(),
                source,
            })?,
        };
        sink.write_exec(&cwd, command_line)?;
    }

    let (reader, writer) = std::io::pipe().map_err(read_error)?;
    let stderr_writer = writer.try_clone().map_err(read_error)?;
    command.stdout(writer).stderr(stderr_writer);

    let (child, group) = process::spawn_in_group(&mut command, program)?;
    // Our copies of the write end must close or the reader never sees EOF
    drop(command);

    let forwarded = forward_lines(sink, BufReader::new(reader));
    let code = process::wait_in_group(child, group, program)?;
    forwarded?;
    Ok(code)
}

/// Run `argv` under teatime
pub(crate) fn tee_argv<W: Write>(
    sink: &mut OutputSink<W>,
    argv: &[String],
) -> Result<i32, AppError> {
    let Some((program, args)) = argv.split_first() else {
        return tee_reader(sink, std::io::stdin().lock());
    };
    let mut command = Command::new(program);
    command.args(args);
    let command_line = crate::utils::quote_command(program, args);
    tee_command(sink, command, program, &command_line)
}
