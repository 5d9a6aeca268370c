use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use labsjdk::config::LabsJdkConfig;
use labsjdk::preflight::check_build_tools;
use labsjdk::publish::CiTarget;
use labsjdk::workflows::{run_build, BuildOptions};

/// Build a labsjdk from a JDK checkout, package it, and optionally upload it.
#[derive(Parser, Debug)]
#[command(name = "build-labsjdk", version)]
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
    /// Purpose of the CI job
    #[arg(long, value_enum, default_value_t = CiTarget::Gate)]
    ci_target: CiTarget,
    /// Target architecture in JDK terminology
    #[arg(long, env = "JDK_ARCH")]
    jdk_arch: String,
    /// Target OS in JDK terminology
    #[arg(long, env = "JDK_OS")]
    jdk_os: String,
    /// GNU make executable
    #[arg(long, env = "MAKE", default_value = "make")]
    make: String,
    /// Directory into which images are copied
    #[arg(long)]
    images_dir: PathBuf,
    /// Value for the --with-boot-jdk configure option
    #[arg(long, env = "BOOT_JDK")]
    boot_jdk: String,
    /// Value for the --with-devkit configure option
    #[arg(long, env = "DEVKIT", default_value = "")]
    devkit: String,
    /// Run "make clean" after building the image
    #[arg(long)]
    clean_after_build: bool,
    /// Build and include static libs in the archive
    #[arg(long)]
    with_static_libs: bool,
    /// scp path of the remote labsjdk directory (user@host:/dir)
    #[arg(long)]
    scp_base_path: Option<String>,
    /// Value for the --with-debug-level configure option
    #[arg(long, default_value = "release")]
    jdk_debug_level: String,
    /// Symbolic link to create pointing to JAVA_HOME of the built JDK
    #[arg(long)]
    java_home_link_target: Option<PathBuf>,
    /// JDK source checkout
    #[arg(long, default_value = ".")]
    source_dir: PathBuf,
    /// Optional TOML settings file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    labsjdk::logging::init();
    let cli = Cli::parse();
    let config = LabsJdkConfig::load_optional(cli.config.as_deref())?;

    let opts = BuildOptions {
        scp_base_path: config.scp_base_path(cli.scp_base_path.as_deref()),
        extra_configure_options: config.configure.extra_options,
        source_dir: cli.source_dir,
        jvmci_version: cli.jvmci_version,
        ci_arch: cli.ci_arch,
        ci_os: cli.ci_os,
        ci_target: cli.ci_target,
        jdk_arch: cli.jdk_arch,
        jdk_os: cli.jdk_os,
        make: cli.make,
        images_dir: cli.images_dir,
        boot_jdk: cli.boot_jdk,
        devkit: cli.devkit,
        clean_after_build: cli.clean_after_build,
        with_static_libs: cli.with_static_libs,
        jdk_debug_level: cli.jdk_debug_level,
        java_home_link_target: cli.java_home_link_target,
    };

    check_build_tools(&opts.make, opts.scp_base_path.is_some())?;
    let outcome = run_build(&opts).context("build-labsjdk failed")?;

    log::info!(
        "labsjdk at {} (sha1 {})",
        outcome.archive.display(),
        outcome.sha1.display()
    );
    Ok(())
}
