//! `build-labsjdk`: configure, make, package, verify and upload a labsjdk.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::archive::{create_archive, extract_archive};
use crate::checksum::write_sha1;
use crate::configure::{configure_options, ConfigureInputs, STATIC_BUILD_OPTION};
use crate::layout::{
    find_build_configuration, install_static_libs, locate_image, recreate_dir, remove_demo,
    stash_static_libs, MACOS_HOME_SUBPATH,
};
use crate::link::link_java_home;
use crate::naming::ArtifactNames;
use crate::process::check_call;
use crate::publish::{ensure_not_deployed, upload, CiTarget, RemoteBase};
use crate::version::ReleaseInfo;

/// Everything `build-labsjdk` needs, after CLI, environment and config
/// file have been merged.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Root of the JDK checkout; configure and make run here.
    pub source_dir: PathBuf,
    pub jvmci_version: String,
    pub ci_arch: String,
    pub ci_os: String,
    pub ci_target: CiTarget,
    pub jdk_arch: String,
    pub jdk_os: String,
    pub make: String,
    pub images_dir: PathBuf,
    pub boot_jdk: String,
    pub devkit: String,
    pub clean_after_build: bool,
    pub with_static_libs: bool,
    pub scp_base_path: Option<String>,
    pub jdk_debug_level: String,
    pub java_home_link_target: Option<PathBuf>,
    pub extra_configure_options: Vec<String>,
}

/// Files produced by a successful build.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub archive: PathBuf,
    pub sha1: PathBuf,
    pub pathfix: Option<PathBuf>,
    pub extracted_java_home: PathBuf,
}

/// Static libraries cannot be built for this OS.
const NO_STATIC_BUILD_OS: &str = "solaris";

/// Contents of the `.pathfix` file written for macOS bundles.
pub const PATHFIX_CONTENTS: &str = MACOS_HOME_SUBPATH;

struct Builder<'a> {
    opts: &'a BuildOptions,
    source_dir: PathBuf,
    configure: Vec<String>,
}

impl Builder<'_> {
    fn build_dir(&self) -> PathBuf {
        self.source_dir.join("build")
    }

    fn configuration_prefix(&self) -> String {
        format!("{}-{}", self.opts.jdk_os, self.opts.jdk_arch)
    }

    fn configure(&self, extra: &[&str]) -> Result<()> {
        let mut cmd = Command::new("sh");
        cmd.arg("configure")
            .args(&self.configure)
            .args(extra)
            .current_dir(&self.source_dir);
        check_call(&mut cmd).context("configure failed")
    }

    fn make(&self, target: &str) -> Result<()> {
        let mut cmd = Command::new(&self.opts.make);
        cmd.arg(format!("CONF={}", self.opts.jdk_debug_level))
            .arg(target)
            .current_dir(&self.source_dir);
        check_call(&mut cmd).with_context(|| format!("make {target} failed"))
    }

    fn configuration_dir(&self) -> Result<PathBuf> {
        let build_dir = self.build_dir();
        let name = find_build_configuration(
            &build_dir,
            &self.configuration_prefix(),
            &self.opts.jdk_debug_level,
        )?;
        Ok(build_dir.join(name))
    }

    /// Build once with `--enable-static-build` and keep only `lib/static`.
    fn build_static_libs(&self) -> Result<PathBuf> {
        self.configure(&[STATIC_BUILD_OPTION])?;
        self.make("images")?;

        let config_dir = self.configuration_dir()?;
        let saved = PathBuf::from(format!("{}-static-libs", config_dir.display()));
        stash_static_libs(&config_dir, &saved)?;

        log::info!("removing static build {}", config_dir.display());
        fs::remove_dir_all(&config_dir)
            .with_context(|| format!("removing '{}'", config_dir.display()))?;
        Ok(saved)
    }
}

/// Run the full build pipeline.
pub fn run_build(opts: &BuildOptions) -> Result<BuildOutcome> {
    let source_dir = fs::canonicalize(&opts.source_dir)
        .with_context(|| format!("resolving source dir '{}'", opts.source_dir.display()))?;

    fs::create_dir_all(&opts.images_dir)
        .with_context(|| format!("creating images dir '{}'", opts.images_dir.display()))?;
    let images_dir = fs::canonicalize(&opts.images_dir)
        .with_context(|| format!("resolving images dir '{}'", opts.images_dir.display()))?;

    let release = ReleaseInfo::resolve(&source_dir)?;
    let names = ArtifactNames::new(&release, &opts.jvmci_version, &opts.jdk_debug_level);
    let archive = names.archive_file(&opts.ci_os, &opts.ci_arch);

    let remote = opts
        .scp_base_path
        .as_deref()
        .map(RemoteBase::parse)
        .transpose()?;
    if opts.ci_target == CiTarget::Deploy {
        let Some(remote) = &remote else {
            bail!("deploy requires a remote location (--scp-base-path)");
        };
        ensure_not_deployed(remote, &archive)?;
    }

    let configure = configure_options(&ConfigureInputs {
        debug_level: &opts.jdk_debug_level,
        boot_jdk: &opts.boot_jdk,
        devkit: &opts.devkit,
        build_number: release.build_number,
        jvmci_version: &opts.jvmci_version,
        ci_arch: &opts.ci_arch,
        edition: release.edition,
        extra_options: &opts.extra_configure_options,
    });
    let builder = Builder {
        opts,
        source_dir,
        configure,
    };

    let saved_static_libs = if opts.with_static_libs && opts.ci_os != NO_STATIC_BUILD_OS {
        Some(builder.build_static_libs()?)
    } else {
        None
    };

    builder.configure(&[])?;
    builder.make("images")?;
    let image = locate_image(&builder.configuration_dir()?)?;

    if let Some(saved) = &saved_static_libs {
        install_static_libs(saved, &image.java_home)?;
    }
    if release.edition.is_closed() {
        remove_demo(&image.java_home)?;
    }

    let arcpath = images_dir.join(&archive);
    let pathfix = if image.needs_pathfix {
        let path = append_extension(&arcpath, "pathfix");
        fs::write(&path, PATHFIX_CONTENTS)
            .with_context(|| format!("writing '{}'", path.display()))?;
        Some(path)
    } else {
        None
    };

    log::info!("Creating {}", arcpath.display());
    create_archive(&image.image, &arcpath, &format!("{}/", names.install_prefix))?;
    let sha1path = append_extension(&arcpath, "sha1");
    write_sha1(&arcpath, &sha1path)?;

    if opts.clean_after_build {
        builder.make("clean")?;
    }

    let extracted_java_home = smoke_test(&arcpath, &images_dir, &names, opts, pathfix.is_some())?;

    if let Some(link) = &opts.java_home_link_target {
        link_java_home(&extracted_java_home, link)?;
    }

    if let Some(remote) = &remote {
        for artifact in [Some(&arcpath), Some(&sha1path), pathfix.as_ref()]
            .into_iter()
            .flatten()
        {
            upload(artifact, remote, &names, opts.ci_target)?;
        }
    }

    Ok(BuildOutcome {
        archive: arcpath,
        sha1: sha1path,
        pathfix,
        extracted_java_home,
    })
}

/// Extract the archive under `<images_dir>/<debug level>` and run
/// `java -version` from it.
fn smoke_test(
    arcpath: &Path,
    images_dir: &Path,
    names: &ArtifactNames,
    opts: &BuildOptions,
    needs_pathfix: bool,
) -> Result<PathBuf> {
    let extracted_image_dir = images_dir.join(&opts.jdk_debug_level);
    recreate_dir(&extracted_image_dir)?;
    log::info!(
        "Extracting {} to {}",
        arcpath.display(),
        extracted_image_dir.display()
    );
    extract_archive(arcpath, &extracted_image_dir)?;

    let mut java_home = extracted_image_dir.join(&names.install_prefix);
    if needs_pathfix {
        java_home = java_home.join(MACOS_HOME_SUBPATH);
    }
    let java_exe = java_home.join("bin").join(java_executable());
    log::info!("Executing {}", java_exe.display());
    check_call(Command::new(&java_exe).arg("-version"))
        .context("smoke test of the extracted JDK failed")?;
    Ok(java_home)
}

fn java_executable() -> &'static str {
    if cfg!(windows) {
        "java.exe"
    } else {
        "java"
    }
}

/// `path` with `.ext` appended to its full file name.
pub fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}
