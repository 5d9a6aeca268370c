//! Uploading artifacts to the remote labsjdk directory.
//!
//! Candidates are copied to `<dir>/jdk-candidates/<name>` and exposed as a
//! `-dev` alias so pull requests can reference them. Deploy jobs then move
//! the candidate to its published location `<dir>/<name>`.

use anyhow::{bail, Context, Result};
use std::fmt;
use std::path::Path;
use std::process::Command;

use crate::naming::ArtifactNames;
use crate::process::check_call;

pub const CANDIDATES_DIR: &str = "jdk-candidates";

/// Purpose of the CI job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CiTarget {
    Gate,
    Deploy,
}

impl fmt::Display for CiTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CiTarget::Gate => f.write_str("gate"),
            CiTarget::Deploy => f.write_str("deploy"),
        }
    }
}

/// Join POSIX path segments regardless of the host platform.
pub fn posix_join(base: &str, name: &str) -> String {
    if name.starts_with('/') || base.is_empty() {
        return name.to_string();
    }
    if base.ends_with('/') {
        format!("{base}{name}")
    } else {
        format!("{base}/{name}")
    }
}

/// An scp location of the form `user@host:/remote/dir`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteBase {
    pub user_host: String,
    pub dir: String,
}

impl RemoteBase {
    pub fn parse(scp_base_path: &str) -> Result<Self> {
        let Some((user_host, dir)) = scp_base_path.split_once(':') else {
            bail!("scp base path must have the form user@host:/dir, got '{scp_base_path}'");
        };
        if user_host.is_empty() || dir.is_empty() || dir.contains(':') {
            bail!("scp base path must have the form user@host:/dir, got '{scp_base_path}'");
        }
        Ok(Self {
            user_host: user_host.to_string(),
            dir: dir.to_string(),
        })
    }

    /// Path on the remote host below the base directory.
    pub fn remote_path(&self, name: &str) -> String {
        posix_join(&self.dir, name)
    }

    /// scp destination below the base directory.
    pub fn scp_path(&self, name: &str) -> String {
        format!("{}:{}", self.user_host, self.remote_path(name))
    }

    fn ssh(&self) -> Command {
        let mut cmd = Command::new("ssh");
        cmd.arg(&self.user_host);
        cmd
    }
}

impl fmt::Display for RemoteBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.user_host, self.dir)
    }
}

/// Command that succeeds only when `archive` is not yet published.
pub fn deploy_guard_command(remote: &RemoteBase, archive: &str) -> Command {
    let mut cmd = remote.ssh();
    cmd.args(["test", "!", "-f"]).arg(remote.remote_path(archive));
    cmd
}

/// Refuse to deploy over a previously published archive.
pub fn ensure_not_deployed(remote: &RemoteBase, archive: &str) -> Result<()> {
    if let Err(err) = check_call(&mut deploy_guard_command(remote, archive)) {
        log::error!("{err:#}");
        bail!(
            "Cannot deploy over existing binary at {}",
            remote.scp_path(archive)
        );
    }
    Ok(())
}

/// Remote commands that upload `name` and, on deploy, publish it.
pub fn upload_commands(
    local: &Path,
    name: &str,
    remote: &RemoteBase,
    names: &ArtifactNames,
    target: CiTarget,
) -> Vec<Command> {
    let candidate_rel = posix_join(CANDIDATES_DIR, name);
    let candidate = remote.remote_path(&candidate_rel);

    let mut scp = Command::new("scp");
    scp.arg(local).arg(remote.scp_path(&candidate_rel));

    let mut link = remote.ssh();
    link.args(["ln", "-f", "-s"])
        .arg(&candidate)
        .arg(remote.remote_path(&names.dev_name(name)));

    let mut commands = vec![scp, link];
    if target == CiTarget::Deploy {
        let mut publish = remote.ssh();
        publish
            .arg("mv")
            .arg(&candidate)
            .arg(remote.remote_path(name));
        commands.push(publish);
    }
    commands
}

/// Upload `local` as a candidate and publish it for deploy jobs.
pub fn upload(
    local: &Path,
    remote: &RemoteBase,
    names: &ArtifactNames,
    target: CiTarget,
) -> Result<()> {
    let name = local
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("artifact has no file name: {}", local.display()))?;

    make_group_writable(local)?;

    let mut commands = upload_commands(local, name, remote, names, target).into_iter();
    log::info!(
        "Uploading {} to {}...",
        local.display(),
        remote.scp_path(&posix_join(CANDIDATES_DIR, name))
    );
    if let Some(mut scp) = commands.next() {
        check_call(&mut scp)?;
    }
    if let Some(mut link) = commands.next() {
        check_call(&mut link)?;
    }
    if let Some(mut publish) = commands.next() {
        log::info!("Publishing {}...", local.display());
        check_call(&mut publish)?;
    }
    Ok(())
}

#[cfg(unix)]
fn make_group_writable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o664))
        .with_context(|| format!("setting permissions on '{}'", path.display()))
}

#[cfg(not(unix))]
fn make_group_writable(_path: &Path) -> Result<()> {
    Ok(())
}
