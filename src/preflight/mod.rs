//! Preflight checks for build validation.
//!
//! Validates that the host has the tools a labsjdk build shells out to
//! before any long-running step starts.
//!
//! # Example
//!
//! ```rust
//! use labsjdk::preflight::{command_exists, check_required_tools};
//!
//! if !command_exists("git") {
//!     println!("git not installed");
//! }
//!
//! let tools = &[("sh", "a POSIX shell"), ("git", "git")];
//! if let Err(e) = check_required_tools(tools) {
//!     eprintln!("{}", e);
//! }
//! ```

use anyhow::{bail, Result};

/// Check if a command can be found on `PATH`.
pub fn command_exists(cmd: &str) -> bool {
    which::which(cmd).is_ok()
}

/// Tools needed by every build.
pub const BUILD_TOOLS: &[(&str, &str)] = &[("sh", "a POSIX shell"), ("git", "git")];

/// Tools needed when artifacts are uploaded.
pub const UPLOAD_TOOLS: &[(&str, &str)] = &[("ssh", "openssh-client"), ("scp", "openssh-client")];

/// Check that specific tools are available.
///
/// Each tuple is (command, package). All missing tools are reported at once.
pub fn check_required_tools(tools: &[(&str, &str)]) -> Result<()> {
    let missing: Vec<_> = tools
        .iter()
        .filter(|(tool, _)| !command_exists(tool))
        .collect();

    if !missing.is_empty() {
        let msg = missing
            .iter()
            .map(|(t, p)| format!("  {} (install: {})", t, p))
            .collect::<Vec<_>>()
            .join("\n");
        bail!("Missing required host tools:\n{}", msg);
    }

    Ok(())
}

/// Check the tools `build-labsjdk` will run.
pub fn check_build_tools(make: &str, uploading: bool) -> Result<()> {
    let mut tools: Vec<(&str, &str)> = BUILD_TOOLS.to_vec();
    tools.push((make, "GNU make"));
    if uploading {
        tools.extend_from_slice(UPLOAD_TOOLS);
    }
    check_required_tools(&tools)
}
