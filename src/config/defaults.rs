//! Default configuration values

/// Recipe file name at the project root
pub const RECIPE_FILE: &str = "carbio.toml";

/// Generator output folder, relative to the project root
pub const GENERATORS_DIR: &str = "build/generators";

/// Top-level build folder, relative to the project root
pub const BUILD_DIR: &str = "build";

/// Install destination, relative to the project root
pub const PACKAGE_DIR: &str = "package";

/// Stamp folder, relative to the project root
pub const STAMPS_DIR: &str = "build/stamps";

/// Toolchain descriptor file name
pub const TOOLCHAIN_FILE: &str = "carbio_toolchain.cmake";

/// Aggregate dependency descriptor file name
pub const DEPS_FILE: &str = "carbio_deps.cmake";

/// Generator lock file name
pub const GENERATORS_LOCK: &str = "carbio-generators.lock";

/// Package metadata file, both in the store and in the installed package
pub const PACKAGE_MANIFEST: &str = "carbio-package.toml";

/// Default build driver executable
pub const DEFAULT_CMAKE: &str = "cmake";

/// Default test runner executable
pub const DEFAULT_CTEST: &str = "ctest";

/// Default test runner arguments
pub const DEFAULT_CTEST_ARGS: &[&str] = &["--output-on-failure"];
