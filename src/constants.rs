// src/constants.rs

/// Reserved named-slot key: working directory for the spawned process.
pub const CURRENT_PATH_KEY: &str = "current_path";

/// Reserved named-slot key: executable to spawn instead of argument 0.
pub const EXECUTABLE_KEY: &str = "executable";

/// Reserved named-slot key: whether to look the executable up on the
/// system `PATH` before spawning.
pub const USE_PATH_KEY: &str = "use_path";
