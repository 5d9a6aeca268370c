//! Naming conventions for labsjdk archives and install directories.

use std::fmt;
use std::path::Path;

use crate::version::ReleaseInfo;

/// Debug level that carries no name qualifier.
pub const RELEASE_DEBUG_LEVEL: &str = "release";

/// Community (open tree) or enterprise (closed tree) build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edition {
    Community,
    Enterprise,
}

impl Edition {
    /// A source tree with a `closed/` directory is an enterprise tree.
    pub fn detect(source_dir: &Path) -> Self {
        if source_dir.join("closed").is_dir() {
            Edition::Enterprise
        } else {
            Edition::Community
        }
    }

    pub fn is_closed(self) -> bool {
        self == Edition::Enterprise
    }

    pub fn tag(self) -> &'static str {
        match self {
            Edition::Community => "ce",
            Edition::Enterprise => "ee",
        }
    }
}

impl fmt::Display for Edition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// `""` for release builds, `-<level>` otherwise.
pub fn debug_level_qualifier(debug_level: &str) -> String {
    if debug_level == RELEASE_DEBUG_LEVEL {
        String::new()
    } else {
        format!("-{debug_level}")
    }
}

/// Names derived from the release metadata of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactNames {
    /// `labsjdk-<ed>-<version>+<build>-jvmci-<jvmci><qualifier>`
    pub archive_prefix: String,
    /// `labsjdk-<ed>-<version>-jvmci-<jvmci><qualifier>`
    pub install_prefix: String,
}

impl ArtifactNames {
    pub fn new(release: &ReleaseInfo, jvmci_version: &str, debug_level: &str) -> Self {
        let qualifier = debug_level_qualifier(debug_level);
        let edition = release.edition;
        let version = release.version;
        Self {
            archive_prefix: format!(
                "labsjdk-{edition}-{version}+{}-jvmci-{jvmci_version}{qualifier}",
                release.build_number
            ),
            install_prefix: format!("labsjdk-{edition}-{version}-jvmci-{jvmci_version}{qualifier}"),
        }
    }

    /// File name of the distributable archive for a CI platform.
    pub fn archive_file(&self, ci_os: &str, ci_arch: &str) -> String {
        format!("{}-{ci_os}-{ci_arch}.tar.gz", self.archive_prefix)
    }

    /// Alias under which a candidate artifact is exposed for pull requests.
    pub fn dev_name(&self, file_name: &str) -> String {
        file_name.replace(
            &self.archive_prefix,
            &format!("{}-dev", self.archive_prefix),
        )
    }
}
