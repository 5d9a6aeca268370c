//! Java version and build number resolution.
//!
//! The version comes from the `make/autoconf/version-numbers` properties file
//! of the JDK source tree. The build number is the highest `+N` suffix among
//! the git tags for that version.

use anyhow::{bail, Context, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::naming::Edition;
use crate::process::check_output;

/// Location of the version properties file relative to the open source root.
pub const VERSION_NUMBERS_FILE: &str = "make/autoconf/version-numbers";

/// A `feature.interim.update` JDK version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JavaVersion {
    pub feature: u32,
    pub interim: u32,
    pub update: u32,
}

impl fmt::Display for JavaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.feature, self.interim, self.update)
    }
}

/// Parse `key=value` lines, skipping blanks and `#` comments.
pub fn parse_properties(text: &str) -> BTreeMap<String, String> {
    let mut values = BTreeMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            values.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    values
}

/// Extract the JDK version from the contents of a version-numbers file.
pub fn parse_version_numbers(text: &str) -> Result<JavaVersion> {
    let values = parse_properties(text);
    let field = |key: &str| -> Result<u32> {
        let raw = values
            .get(key)
            .with_context(|| format!("missing {key} in version-numbers"))?;
        raw.parse::<u32>()
            .with_context(|| format!("invalid {key} value '{raw}'"))
    };

    Ok(JavaVersion {
        feature: field("DEFAULT_VERSION_FEATURE")?,
        interim: field("DEFAULT_VERSION_INTERIM")?,
        update: field("DEFAULT_VERSION_UPDATE")?,
    })
}

pub fn read_java_version(path: &Path) -> Result<JavaVersion> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading version numbers '{}'", path.display()))?;
    parse_version_numbers(&text)
        .with_context(|| format!("parsing version numbers '{}'", path.display()))
}

/// Select the highest build number among tags starting with `prefix`.
///
/// Tags whose remainder after `prefix` is not a plain number are ignored.
pub fn select_build_number<'a, I>(tags: I, prefix: &str) -> Option<u32>
where
    I: IntoIterator<Item = &'a str>,
{
    tags.into_iter()
        .filter_map(|tag| tag.trim().strip_prefix(prefix))
        .filter_map(|suffix| suffix.parse::<u32>().ok())
        .max()
}

/// Git tag prefix for all builds of `version`, e.g. `jdk-11.0.2+`.
pub fn tag_prefix(version: &JavaVersion) -> String {
    format!("jdk-{version}+")
}

/// List the tags of the git repository at `repo_dir`.
pub fn git_tags(repo_dir: &Path) -> Result<Vec<String>> {
    let mut cmd = Command::new("git");
    cmd.arg("-C").arg(repo_dir).arg("tag");
    let output = check_output(&mut cmd)
        .with_context(|| format!("listing git tags in '{}'", repo_dir.display()))?;
    Ok(output
        .split_whitespace()
        .map(|tag| tag.to_string())
        .collect())
}

/// Version metadata computed once per invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInfo {
    pub version: JavaVersion,
    pub build_number: u32,
    pub edition: Edition,
}

impl ReleaseInfo {
    /// Resolve version, build number and edition for the JDK source tree at
    /// `source_dir`.
    pub fn resolve(source_dir: &Path) -> Result<Self> {
        let edition = Edition::detect(source_dir);
        let open_dir = open_source_dir(source_dir, edition);
        let version = read_java_version(&open_dir.join(VERSION_NUMBERS_FILE))?;

        let prefix = tag_prefix(&version);
        let tags = git_tags(&open_dir)?;
        let Some(build_number) = select_build_number(tags.iter().map(String::as_str), &prefix)
        else {
            bail!(
                "no git tag starting with '{}' in '{}'",
                prefix,
                open_dir.display()
            );
        };

        log::info!("resolved {edition} {version}+{build_number}");
        Ok(Self {
            version,
            build_number,
            edition,
        })
    }
}

/// Root of the open sources: `open/` inside a closed tree.
pub fn open_source_dir(source_dir: &Path, edition: Edition) -> PathBuf {
    match edition {
        Edition::Enterprise => source_dir.join("open"),
        Edition::Community => source_dir.to_path_buf(),
    }
}
