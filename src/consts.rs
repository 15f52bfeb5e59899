/// Source checkout mounted into the build container
pub(crate) const DEFAULT_SOURCE_DIR: &str = "/therock/src";

/// Root for everything the build produces (caches and build tree)
pub(crate) const DEFAULT_OUTPUT_DIR: &str = "/therock/output";

/// Compiler launcher wired into CMake by default
pub(crate) const DEFAULT_LAUNCHER: &str = "ccache";

pub(crate) const DEFAULT_PIP: &str = "pip";
pub(crate) const DEFAULT_CMAKE: &str = "cmake";
pub(crate) const DEFAULT_GENERATOR: &str = "Ninja";

/// Requirements file, relative to the source directory
pub(crate) const DEFAULT_REQUIREMENTS: &str = "requirements.txt";

pub(crate) const CCACHE_DIR: &str = "CCACHE_DIR";
pub(crate) const PIP_CACHE_DIR: &str = "PIP_CACHE_DIR";
pub(crate) const CMAKE_C_COMPILER_LAUNCHER: &str = "CMAKE_C_COMPILER_LAUNCHER";
pub(crate) const CMAKE_CXX_COMPILER_LAUNCHER: &str = "CMAKE_CXX_COMPILER_LAUNCHER";

pub(crate) const TEATIME_LABEL_GH_GROUP: &str = "TEATIME_LABEL_GH_GROUP";
pub(crate) const TEATIME_FORCE_INTERACTIVE: &str = "TEATIME_FORCE_INTERACTIVE";
