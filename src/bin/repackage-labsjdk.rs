use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use labsjdk::workflows::{run_repackage, RepackageOptions};

/// Repackage prebuilt JDK bundles into a versioned labsjdk layout.
#[derive(Parser, Debug)]
#[command(name = "repackage-labsjdk", version)]
struct Cli {
    /// JVMCI version (e.g., 19.3-b03)
    #[arg(long)]
    jvmci_version: String,
    /// Target architecture in CI terminology
    #[arg(long, env = "CI_ARCH")]
    ci_arch: String,
    /// Target OS in CI terminology
    #[arg(long, env = "CI_OS")]
    ci_os: String,
    /// Directory to create; must not exist yet
    #[arg(long)]
    target_dir: PathBuf,
    /// Build configuration whose bundles are repackaged
    #[arg(long)]
    conf: Option<String>,
    /// Directory holding the bundles (default: <source-dir>/build/<conf>/bundles)
    #[arg(long)]
    bundles_dir: Option<PathBuf>,
    /// Merge the static-libs bundle into the image
    #[arg(long)]
    with_static_libs: bool,
    /// Debug level of the bundles
    #[arg(long, default_value = "release")]
    jdk_debug_level: String,
    /// Link to create pointing to JAVA_HOME (default: <target-dir>/java_home)
    #[arg(long)]
    java_home_link_target: Option<PathBuf>,
    /// JDK source checkout providing version-numbers and git tags
    #[arg(long, default_value = ".")]
    source_dir: PathBuf,
}

fn main() -> Result<()> {
    labsjdk::logging::init();
    let cli = Cli::parse();

    let opts = RepackageOptions {
        source_dir: cli.source_dir,
        jvmci_version: cli.jvmci_version,
        ci_arch: cli.ci_arch,
        ci_os: cli.ci_os,
        target_dir: cli.target_dir,
        conf: cli.conf,
        bundles_dir: cli.bundles_dir,
        with_static_libs: cli.with_static_libs,
        jdk_debug_level: cli.jdk_debug_level,
        java_home_link_target: cli.java_home_link_target,
    };

    let outcome = run_repackage(&opts).context("repackage-labsjdk failed")?;
    log::info!(
        "{} -> {}",
        outcome.java_home_link.display(),
        outcome.java_home.display()
    );
    Ok(())
}
