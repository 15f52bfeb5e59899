//! Console + log file output for teatime

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use crate::error::AppError;

#[derive(Debug, Clone, Default)]
pub(crate) struct SinkOptions {
    pub(crate) label: Option<String>,
    /// Stream to the console; otherwise buffer until a failure dumps it
    pub(crate) interactive: bool,
    pub(crate) log_path: Option<PathBuf>,
    pub(crate) log_timestamps: bool,
    /// Emit GitHub Actions `::group::` markers instead of line prefixes
    pub(crate) gh_group: bool,
}

struct LogFile {
    path: PathBuf,
    writer: BufWriter<File>,
}

pub(crate) struct OutputSink<W: Write> {
    console: W,
    buffered: Option<Vec<u8>>,
    label: Option<String>,
    gh_group: bool,
    log: Option<LogFile>,
    log_timestamps: bool,
    started: Instant,
    started_epoch: f64,
}

fn epoch_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

fn output_error(e: std::io::Error) -> AppError {
    AppError::Io {
        path: PathBuf::from("<stdout>"),
        source: e,
    }
}

impl<W: Write> OutputSink<W> {
    pub(crate) fn new(console: W, options: SinkOptions) -> Result<Self, AppError> {
        let log = match options.log_path {
            Some(path) => Some(open_log(&path)?),
            None => None,
        };
        Ok(Self {
            console,
            buffered: (!options.interactive).then(Vec::new),
            label: options.label,
            gh_group: options.gh_group,
            log,
            log_timestamps: options.log_timestamps,
            started: Instant::now(),
            started_epoch: epoch_secs(),
        })
    }

    fn out(&mut self) -> &mut dyn Write {
        match &mut self.buffered {
            Some(buffer) => buffer as &mut dyn Write,
            None => &mut self.console,
        }
    }

    fn log_write(&mut self, bytes: &[u8]) -> Result<(), AppError> {
        if let Some(log) = &mut self.log {
            log.writer
                .write_all(bytes)
                .and_then(|()| log.writer.flush())
                .map_err(|source| AppError::Io {
                    path: log.path.clone(),
                    source,
                })?;
        }
        Ok(())
    }

    pub(crate) fn has_log(&self) -> bool {
        self.log.is_some()
    }

    pub(crate) fn start(&mut self) -> Result<(), AppError> {
        if self.gh_group
            && let Some(label) = self.label.clone()
        {
            writeln!(self.out(), "::group::{label}").map_err(output_error)?;
        }
        if self.log_timestamps {
            let header = format!("BEGIN\t{:.6}\n", self.started_epoch);
            self.log_write(header.as_bytes())?;
        }
        Ok(())
    }

    /// Record the command being run (log file only)
    pub(crate) fn write_exec(&mut self, cwd: &Path, command_line: &str) -> Result<(), AppError> {
        let line = format!("EXEC\t{}\t{command_line}\n", cwd.display());
        self.log_write(line.as_bytes())
    }

    /// Forward one line of output, including its trailing newline if any
    pub(crate) fn write_line(&mut self, line: &[u8]) -> Result<(), AppError> {
        let prefix = match &self.label {
            Some(label) if !self.gh_group => Some(format!("[{label}] ")),
            _ => None,
        };
        let interactive = self.buffered.is_none();
        let out = self.out();
        if let Some(prefix) = prefix {
            out.write_all(prefix.as_bytes()).map_err(output_error)?;
        }
        out.write_all(line).map_err(output_error)?;
        if interactive {
            out.flush().map_err(output_error)?;
        }

        if self.log_timestamps {
            let elapsed = format!("{:.1}\t", self.started.elapsed().as_secs_f64());
            self.log_write(elapsed.as_bytes())?;
        }
        self.log_write(line)
    }

    /// Write buffered output to the console (no-op when interactive)
    pub(crate) fn dump(&mut self) -> Result<(), AppError> {
        if let Some(buffer) = self.buffered.take() {
            self.console.write_all(&buffer).map_err(output_error)?;
            self.console.flush().map_err(output_error)?;
            // Anything written after a dump is no longer interesting
            self.buffered = Some(Vec::new());
        }
        Ok(())
    }

    pub(crate) fn finish(&mut self) -> Result<(), AppError> {
        let elapsed = self.started.elapsed().as_secs_f64();
        if self.log_timestamps {
            let trailer = format!("END\t{:.6}\t{elapsed:.3}\n", epoch_secs());
            self.log_write(trailer.as_bytes())?;
        }
        self.log = None;

        if let Some(label) = self.label.clone() {
            if self.gh_group {
                writeln!(self.out(), "::endgroup::").map_err(output_error)?;
            } else {
                let secs = elapsed.round() as u64;
                writeln!(self.out(), "[{label} completed in {secs} seconds]")
                    .map_err(output_error)?;
            }
        }
        self.out().flush().map_err(output_error)
    }

    #[cfg(test)]
    pub(crate) fn into_console(self) -> W {
        self.console
    }
}

fn open_log(path: &Path) -> Result<LogFile, AppError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| AppError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let file = File::create(path).map_err(|source| AppError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(LogFile {
        path: path.to_path_buf(),
        writer: BufWriter::new(file),
    })
}
