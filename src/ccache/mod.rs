//! Compiler fingerprints for ccache's `compiler_check` directive
//!
//! The fingerprint hashes the compiler binary and every shared library it
//! loads, keyed by file name only so that identical toolchains installed
//! under different prefixes still share cache entries. Because ccache runs
//! the check for every compile, results are memoized in a directory keyed by
//! the compiler's canonical path and mtime.

pub(crate) mod ldd;

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};

use crate::error::CompilerCheckError;

const FINGERPRINT_VERSION: u32 = 1;

/// Fingerprint `compiler`, consulting and filling the memo in `cache_dir`
pub(crate) fn compiler_check(
    cache_dir: &Path,
    compiler: &Path,
) -> Result<String, CompilerCheckError> {
    let compiler_error = |source| CompilerCheckError::Compiler {
        path: compiler.to_path_buf(),
        source,
    };
    let compiler = compiler.canonicalize().map_err(compiler_error)?;
    let mtime = fs::metadata(&compiler)
        .and_then(|meta| meta.modified())
        .map_err(compiler_error)?;

    let memo = cache_dir.join(memo_key(&compiler, mtime));
    if let Ok(cached) = fs::read_to_string(&memo) {
        tracing::debug!("Compiler fingerprint hit: {}", memo.display());
        return Ok(cached);
    }

    let mut files = vec![compiler.clone()];
    files.extend(ldd::shared_libraries(&compiler)?);
    let fingerprint = fingerprint(&files)?;
    store(&memo, &fingerprint);
    Ok(fingerprint)
}

fn memo_key(compiler: &Path, mtime: SystemTime) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{FINGERPRINT_VERSION},{},", mtime_text(mtime)).as_bytes());
    hasher.update(compiler.to_string_lossy().as_bytes());
    hex::encode(hasher.finalize())
}

/// Float seconds since the epoch, keeping `.0` on whole seconds so keys match
/// memo directories written by the Python checker
fn mtime_text(mtime: SystemTime) -> String {
    let secs = mtime
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0);
    format!("{secs:?}")
}

/// One `<sha256>\t<basename>` line per file, in order
pub(crate) fn fingerprint(files: &[PathBuf]) -> Result<String, CompilerCheckError> {
    let mut lines = Vec::with_capacity(files.len());
    for path in files {
        let digest = file_sha256(path).map_err(|source| CompilerCheckError::Hash {
            path: path.clone(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        lines.push(format!("{digest}\t{name}"));
    }
    Ok(lines.join("\n"))
}

fn file_sha256(path: &Path) -> std::io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Write the memo atomically via rename. Concurrent writers may race; any
/// of them winning is fine, and failures only cost a recomputation.
fn store(memo: &Path, fingerprint: &str) {
    let tmp = PathBuf::from(format!("{}.tmp{}", memo.display(), std::process::id()));
    if let Some(parent) = tmp.parent() {
        let _ = fs::create_dir_all(parent);
    }
    if fs::write(&tmp, fingerprint).is_ok() && fs::rename(&tmp, memo).is_err() {
        tracing::debug!("Could not store compiler fingerprint at {}", memo.display());
    }
    let _ = fs::remove_file(&tmp);
}
