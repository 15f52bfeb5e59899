//! Environment handed to every build step

use crate::build::layout::Layout;
use crate::consts::{
    CCACHE_DIR, CMAKE_C_COMPILER_LAUNCHER, CMAKE_CXX_COMPILER_LAUNCHER, PIP_CACHE_DIR,
};

/// Cache locations and, when a launcher is configured, the CMake launcher vars
pub(crate) fn build_env(layout: &Layout, launcher: Option<&str>) -> Vec<(String, String)> {
    let mut env = vec![
        (
            CCACHE_DIR.to_string(),
            layout.ccache_dir.to_string_lossy().into_owned(),
        ),
        (
            PIP_CACHE_DIR.to_string(),
            layout.pip_cache_dir.to_string_lossy().into_owned(),
        ),
    ];
    if let Some(launcher) = launcher {
        for name in [CMAKE_C_COMPILER_LAUNCHER, CMAKE_CXX_COMPILER_LAUNCHER] {
            env.push((name.to_string(), launcher.to_string()));
        }
    }
    env
}
