//! `repackage-labsjdk`: turn prebuilt JDK bundles into a labsjdk layout.

use anyhow::{bail, Context, Result};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::archive::{create_archive, extract_archive, ArchiveKind};
use crate::checksum::write_sha1;
use crate::layout::{
    display_names, install_static_libs, java_home_of, list_dir, require_non_empty, single_entry,
};
use crate::link::link_java_home;
use crate::naming::{ArtifactNames, RELEASE_DEBUG_LEVEL};
use crate::version::ReleaseInfo;
use crate::workflows::build::{append_extension, PATHFIX_CONTENTS};

/// Name of the link created in the target directory by default.
pub const JAVA_HOME_LINK: &str = "java_home";

#[derive(Debug, Clone)]
pub struct RepackageOptions {
    pub source_dir: PathBuf,
    pub jvmci_version: String,
    pub ci_arch: String,
    pub ci_os: String,
    /// Must not exist yet.
    pub target_dir: PathBuf,
    /// Build configuration whose `bundles/` directory is read.
    pub conf: Option<String>,
    /// Overrides `<source_dir>/build/<conf>/bundles`.
    pub bundles_dir: Option<PathBuf>,
    pub with_static_libs: bool,
    pub jdk_debug_level: String,
    /// Defaults to `<target_dir>/java_home`.
    pub java_home_link_target: Option<PathBuf>,
}

impl RepackageOptions {
    pub fn bundles_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.bundles_dir {
            return Ok(dir.clone());
        }
        let Some(conf) = &self.conf else {
            bail!("either a build configuration (--conf) or --bundles-dir is required");
        };
        Ok(self.source_dir.join("build").join(conf).join("bundles"))
    }

    fn java_home_link(&self, target_dir: &Path) -> PathBuf {
        self.java_home_link_target
            .clone()
            .unwrap_or_else(|| target_dir.join(JAVA_HOME_LINK))
    }
}

#[derive(Debug, Clone)]
pub struct RepackageOutcome {
    pub install_dir: PathBuf,
    pub java_home: PathBuf,
    pub archive: PathBuf,
    pub sha1: PathBuf,
    pub pathfix: Option<PathBuf>,
    pub java_home_link: PathBuf,
}

/// What a file in the bundles directory contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleKind {
    /// `jdk-<version>_<platform>_bin<debug>.<ext>`
    Jdk,
    /// `jdk-<version>_<platform>_bin-static-libs<debug>.<ext>`
    StaticLibs,
    /// Anything else: debug symbols, tests, docs, JRE.
    Other,
}

fn strip_archive_extension(name: &str) -> &str {
    [".tar.gz", ".tgz", ".tar", ".zip"]
        .iter()
        .find_map(|ext| name.strip_suffix(ext))
        .unwrap_or(name)
}

/// Suffix the JDK make rules append to bundle names for a debug level:
/// none for `release`, `-debug` for `fastdebug`, `-<level>` otherwise.
pub fn bundle_debug_suffix(debug_level: &str) -> String {
    match debug_level {
        RELEASE_DEBUG_LEVEL => String::new(),
        "fastdebug" => "-debug".to_string(),
        level => format!("-{level}"),
    }
}

/// Classify a bundle file name built with `debug_suffix`; `None` for files
/// that are not archives.
pub fn classify_bundle(name: &str, debug_suffix: &str) -> Option<BundleKind> {
    ArchiveKind::from_path(Path::new(name)).ok()?;
    if !name.starts_with("jdk") {
        return Some(BundleKind::Other);
    }
    let stem = strip_archive_extension(name);
    let Some((_, rest)) = stem.rsplit_once("_bin") else {
        return Some(BundleKind::Other);
    };
    let kind = if rest == debug_suffix {
        BundleKind::Jdk
    } else if rest.strip_prefix("-static-libs") == Some(debug_suffix) {
        BundleKind::StaticLibs
    } else {
        BundleKind::Other
    };
    Some(kind)
}

/// The single bundle of `kind` in `bundles_dir`.
pub fn find_bundle(bundles_dir: &Path, kind: BundleKind, debug_suffix: &str) -> Result<PathBuf> {
    let names = list_dir(bundles_dir)?;
    let matches: Vec<&OsString> = names
        .iter()
        .filter(|name| {
            name.to_str()
                .and_then(|name| classify_bundle(name, debug_suffix))
                == Some(kind)
        })
        .collect();
    match matches.as_slice() {
        [name] => Ok(bundles_dir.join(name)),
        _ => bail!(
            "expected exactly one {:?} bundle in {}, found {:?} among {:?}",
            kind,
            bundles_dir.display(),
            matches,
            display_names(&names)
        ),
    }
}

/// Resolve release metadata from the source tree and repackage.
pub fn run_repackage(opts: &RepackageOptions) -> Result<RepackageOutcome> {
    ensure_target_absent(&opts.target_dir)?;
    let release = ReleaseInfo::resolve(&opts.source_dir)?;
    repackage_with_release(opts, &release)
}

fn ensure_target_absent(target_dir: &Path) -> Result<()> {
    if target_dir.exists() || target_dir.is_symlink() {
        bail!("target directory already exists: {}", target_dir.display());
    }
    Ok(())
}

/// Repackage the bundles for an already-resolved release.
pub fn repackage_with_release(
    opts: &RepackageOptions,
    release: &ReleaseInfo,
) -> Result<RepackageOutcome> {
    ensure_target_absent(&opts.target_dir)?;
    let bundles_dir = opts.bundles_dir()?;
    let debug_suffix = bundle_debug_suffix(&opts.jdk_debug_level);
    let jdk_bundle = find_bundle(&bundles_dir, BundleKind::Jdk, &debug_suffix)?;
    let static_libs_bundle = if opts.with_static_libs {
        Some(find_bundle(&bundles_dir, BundleKind::StaticLibs, &debug_suffix)?)
    } else {
        None
    };

    fs::create_dir_all(&opts.target_dir).with_context(|| {
        format!("creating target directory '{}'", opts.target_dir.display())
    })?;
    // link targets must not depend on the working directory
    let target_dir = fs::canonicalize(&opts.target_dir).with_context(|| {
        format!("resolving target directory '{}'", opts.target_dir.display())
    })?;

    let names = ArtifactNames::new(release, &opts.jvmci_version, &opts.jdk_debug_level);
    let install_dir = target_dir.join(&names.install_prefix);
    extract_single_root(
        &jdk_bundle,
        &target_dir.join(format!("{}.extract", names.install_prefix)),
        &install_dir,
    )?;

    let java_home = java_home_of(&install_dir);
    let needs_pathfix = java_home != install_dir;

    if let Some(bundle) = &static_libs_bundle {
        let scratch = target_dir.join(format!("{}.static-libs", names.install_prefix));
        let static_root = scratch.join("root");
        extract_single_root(bundle, &scratch.join("extract"), &static_root)?;
        let static_dir = java_home_of(&static_root).join("lib/static");
        require_non_empty(&static_dir)?;
        install_static_libs(&static_dir, &java_home)?;
        fs::remove_dir_all(&scratch)
            .with_context(|| format!("removing '{}'", scratch.display()))?;
    }

    let arcpath = target_dir.join(names.archive_file(&opts.ci_os, &opts.ci_arch));
    let pathfix = if needs_pathfix {
        let path = append_extension(&arcpath, "pathfix");
        fs::write(&path, PATHFIX_CONTENTS)
            .with_context(|| format!("writing '{}'", path.display()))?;
        Some(path)
    } else {
        None
    };

    log::info!("Creating {}", arcpath.display());
    create_archive(&install_dir, &arcpath, &format!("{}/", names.install_prefix))?;
    let sha1path = append_extension(&arcpath, "sha1");
    write_sha1(&arcpath, &sha1path)?;

    let java_home_link = opts.java_home_link(&target_dir);
    link_java_home(&java_home, &java_home_link)?;

    Ok(RepackageOutcome {
        install_dir,
        java_home,
        archive: arcpath,
        sha1: sha1path,
        pathfix,
        java_home_link,
    })
}

/// Extract `bundle` into `scratch`, require exactly one top-level entry and
/// move it to `dest`.
fn extract_single_root(bundle: &Path, scratch: &Path, dest: &Path) -> Result<()> {
    log::info!("Extracting {} to {}", bundle.display(), scratch.display());
    extract_archive(bundle, scratch)?;
    let root = single_entry(scratch)?;
    fs::rename(&root, dest)
        .with_context(|| format!("renaming '{}' -> '{}'", root.display(), dest.display()))?;
    fs::remove_dir(scratch).with_context(|| format!("removing '{}'", scratch.display()))
}
