//! Optional TOML settings read by `build-labsjdk` (`--config`).
//!
//! `repackage-labsjdk` takes everything from its command line.
//!
//! ```toml
//! [configure]
//! extra_options = ["--with-jobs=8"]
//!
//! [publish]
//! scp_base_path = "ci@builds.example.com:/srv/labsjdk"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LabsJdkConfig {
    #[serde(default)]
    pub configure: ConfigureSection,
    #[serde(default)]
    pub publish: PublishSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigureSection {
    /// Appended to the computed configure options.
    #[serde(default)]
    pub extra_options: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PublishSection {
    /// Used when `--scp-base-path` is not given.
    pub scp_base_path: Option<String>,
}

impl LabsJdkConfig {
    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config '{}'", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing config '{}'", path.display()))
    }

    /// Load `path` if given, else use defaults.
    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// The remote base, with an explicit CLI value taking precedence.
    pub fn scp_base_path(&self, cli: Option<&str>) -> Option<String> {
        cli.map(str::to_string)
            .or_else(|| self.publish.scp_base_path.clone())
    }
}
