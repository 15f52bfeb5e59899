//! Shared library discovery via ldd

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::CompilerCheckError;

/// Absolute paths of the shared libraries `binary` loads
pub(crate) fn shared_libraries(binary: &Path) -> Result<Vec<PathBuf>, CompilerCheckError> {
    let output = Command::new("ldd").arg(binary).output().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            CompilerCheckError::LddNotFound
        } else {
            CompilerCheckError::LddSpawn(e)
        }
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let message = if stderr.trim().is_empty() { stdout } else { stderr };
        return Err(CompilerCheckError::LddFailed(message.trim().to_string()));
    }

    parse_ldd_output(&String::from_utf8_lossy(&output.stdout))
}

/// Parse ldd output. Lines look like:
///
/// ```text
///     linux-vdso.so.1 (0x00007481bc7ed000)
///     libc.so.6 => /lib/x86_64-linux-gnu/libc.so.6 (0x00007481bc400000)
///     /lib64/ld-linux-x86-64.so.2 (0x00007481bc7ef000)
/// ```
///
/// Entries without an absolute path (the vdso) are skipped. Any line that
/// does not fit the shape is an error.
pub(crate) fn parse_ldd_output(text: &str) -> Result<Vec<PathBuf>, CompilerCheckError> {
    let mut paths = Vec::new();
    for line in text.lines() {
        if let Some(path) = parse_ldd_line(line)? {
            paths.push(path);
        }
    }
    Ok(paths)
}

fn parse_ldd_line(line: &str) -> Result<Option<PathBuf>, CompilerCheckError> {
    let unmatched = || CompilerCheckError::UnmatchedLine(line.to_string());

    let body = line.strip_suffix(')').ok_or_else(unmatched)?;
    let (head, address) = body.rsplit_once(" (").ok_or_else(unmatched)?;
    if address.is_empty() || head.is_empty() {
        return Err(unmatched());
    }

    // Optional "soname => " prefix
    let path = match head.rsplit_once(" => ") {
        Some((soname, path)) if !soname.is_empty() && !path.is_empty() => path,
        _ => head,
    }
    .trim();
    if path.is_empty() {
        return Err(unmatched());
    }

    let path = Path::new(path);
    Ok(path.is_absolute().then(|| path.to_path_buf()))
}
