//! Output directory layout

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AppError;

/// Directories the build reads from and writes to
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Layout {
    pub(crate) source_dir: PathBuf,
    pub(crate) output_dir: PathBuf,
    pub(crate) build_dir: PathBuf,
    pub(crate) caches_dir: PathBuf,
    pub(crate) ccache_dir: PathBuf,
    pub(crate) pip_cache_dir: PathBuf,
}

impl Layout {
    pub(crate) fn new(source_dir: &Path, output_dir: &Path) -> Self {
        let caches_dir = output_dir.join("caches");
        Self {
            source_dir: source_dir.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            build_dir: output_dir.join("build"),
            ccache_dir: caches_dir.join("ccache"),
            pip_cache_dir: caches_dir.join("pip"),
            caches_dir,
        }
    }

    /// Every directory [`Layout::prepare`] creates
    pub(crate) fn output_dirs(&self) -> [&Path; 4] {
        [
            &self.caches_dir,
            &self.ccache_dir,
            &self.pip_cache_dir,
            &self.build_dir,
        ]
    }

    pub(crate) fn check_source(&self) -> Result<(), AppError> {
        if self.source_dir.is_dir() {
            Ok(())
        } else {
            Err(AppError::SourceMissing {
                path: self.source_dir.clone(),
            })
        }
    }

    /// Create the cache and build directories. Safe to call repeatedly.
    pub(crate) fn prepare(&self) -> Result<(), AppError> {
        for dir in self.output_dirs() {
            fs::create_dir_all(dir).map_err(|source| AppError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
            tracing::debug!("Ensured {}", dir.display());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_container_paths() {
        let layout = Layout::new(Path::new("/therock/src"), Path::new("/therock/output"));
        assert_eq!(layout.build_dir, Path::new("/therock/output/build"));
        assert_eq!(layout.caches_dir, Path::new("/therock/output/caches"));
        assert_eq!(layout.ccache_dir, Path::new("/therock/output/caches/ccache"));
        assert_eq!(layout.pip_cache_dir, Path::new("/therock/output/caches/pip"));
    }

    #[test]
    fn prepare_creates_everything_and_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let layout = Layout::new(&dir.path().join("src"), &dir.path().join("output"));
        layout.prepare().expect("first prepare");
        layout.prepare().expect("second prepare");
        for d in layout.output_dirs() {
            assert!(d.is_dir(), "{} missing", d.display());
        }
    }

    #[test]
    fn prepare_reports_the_failing_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blocker = dir.path().join("output");
        fs::write(&blocker, "not a directory").expect("write");
        let layout = Layout::new(&dir.path().join("src"), &blocker);

        let err = layout.prepare().expect_err("should fail");
        match err {
            AppError::CreateDir { path, .. } => assert!(path.starts_with(&blocker)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn check_source_requires_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let layout = Layout::new(&dir.path().join("missing"), dir.path());
        assert!(matches!(
            layout.check_source(),
            Err(AppError::SourceMissing { .. })
        ));
        let layout = Layout::new(dir.path(), dir.path());
        assert!(layout.check_source().is_ok());
    }
}
