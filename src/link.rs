//! `java_home` convenience links.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Point `link` at `target`, replacing whatever `link` was before.
///
/// POSIX hosts get a symbolic link; Windows gets a directory junction made
/// with `mklink /J`.
pub fn link_java_home(target: &Path, link: &Path) -> Result<()> {
    remove_existing(link)?;
    if let Some(parent) = link.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating '{}'", parent.display()))?;
        }
    }
    create_link(target, link)
}

fn remove_existing(link: &Path) -> Result<()> {
    let Ok(md) = fs::symlink_metadata(link) else {
        return Ok(());
    };
    let removed = if md.file_type().is_symlink() || md.is_file() {
        fs::remove_file(link).or_else(|_| fs::remove_dir(link))
    } else {
        // junctions report as directories on Windows
        fs::remove_dir(link)
    };
    removed.with_context(|| format!("removing existing '{}'", link.display()))
}

#[cfg(unix)]
fn create_link(target: &Path, link: &Path) -> Result<()> {
    log::info!("ln -s {} {}", target.display(), link.display());
    std::os::unix::fs::symlink(target, link)
        .with_context(|| format!("linking '{}' -> '{}'", link.display(), target.display()))
}

#[cfg(windows)]
fn create_link(target: &Path, link: &Path) -> Result<()> {
    let mut cmd = std::process::Command::new("cmd");
    cmd.args(["/c", "mklink", "/J"]).arg(link).arg(target);
    crate::process::check_call(&mut cmd)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn creates_link_to_java_home() {
        let temp = TempDir::new().unwrap();
        let home = temp.path().join("labsjdk/Contents/Home");
        fs::create_dir_all(home.join("bin")).unwrap();
        fs::write(home.join("release"), b"JAVA_VERSION=\"11.0.2\"").unwrap();

        let link = temp.path().join("java_home");
        link_java_home(&home, &link).unwrap();
        assert_eq!(
            fs::read(link.join("release")).unwrap(),
            b"JAVA_VERSION=\"11.0.2\""
        );
    }

    #[test]
    fn replaces_existing_link() {
        let temp = TempDir::new().unwrap();
        let old = temp.path().join("old");
        let new = temp.path().join("new");
        fs::create_dir_all(&old).unwrap();
        fs::create_dir_all(&new).unwrap();
        fs::write(new.join("marker"), b"new").unwrap();

        let link = temp.path().join("java_home");
        link_java_home(&old, &link).unwrap();
        link_java_home(&new, &link).unwrap();
        assert_eq!(fs::read(link.join("marker")).unwrap(), b"new");
    }

    #[test]
    fn dangling_link_is_replaced() {
        let temp = TempDir::new().unwrap();
        let link = temp.path().join("java_home");
        link_java_home(&temp.path().join("gone"), &link).unwrap();
        let home = temp.path().join("home");
        fs::create_dir_all(&home).unwrap();
        link_java_home(&home, &link).unwrap();
        assert!(link.join(".").is_dir());
    }
}
