//! Synchronous external command execution.
//!
//! Every command is logged as a shell-quoted line before it runs. A command
//! that cannot be spawned or exits unsuccessfully is an error.

use anyhow::{bail, Context, Result};
use std::ffi::OsStr;
use std::process::{Command, Stdio};

fn is_shell_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || "@%+=:,./_-".contains(c)
}

/// Quote `arg` for a POSIX shell, leaving plain words untouched.
pub fn quote_arg(arg: &str) -> String {
    if !arg.is_empty() && arg.chars().all(is_shell_safe) {
        return arg.to_string();
    }
    format!("'{}'", arg.replace('\'', "'\"'\"'"))
}

/// Render a command as it would be typed into a shell.
pub fn quote_command(cmd: &Command) -> String {
    std::iter::once(cmd.get_program())
        .chain(cmd.get_args())
        .map(OsStr::to_string_lossy)
        .map(|part| quote_arg(&part))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Run `cmd` to completion, inheriting stdio.
pub fn check_call(cmd: &mut Command) -> Result<()> {
    let line = quote_command(cmd);
    log::info!("{line}");

    let status = cmd
        .status()
        .with_context(|| format!("spawning '{line}'"))?;
    if !status.success() {
        bail!("command failed with {status}: {line}");
    }
    Ok(())
}

/// Run `cmd` to completion and return its stdout.
pub fn check_output(cmd: &mut Command) -> Result<String> {
    let line = quote_command(cmd);
    log::info!("{line}");

    let output = cmd
        .stderr(Stdio::inherit())
        .output()
        .with_context(|| format!("spawning '{line}'"))?;
    if !output.status.success() {
        bail!("command failed with {}: {line}", output.status);
    }
    String::from_utf8(output.stdout).with_context(|| format!("decoding output of '{line}'"))
}
