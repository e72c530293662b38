// src/constants.rs

/// The variable name bound to the command string during template substitution.
pub const CMD_VAR: &str = "CMD";

/// The literal placeholder token shell templates use for the command string.
pub const CMD_PLACEHOLDER: &str = "${CMD}";

/// Version string reported until the Go toolchain has been probed.
pub const DEFAULT_GO_VERSION: &str = "1.x";

/// Environment variables discovered by the startup shell probe.
pub const PROBED_VARS: [&str; 4] = ["PATH", "GOBIN", "GOPATH", "GOROOT"];
