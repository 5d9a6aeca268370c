//! Locating build outputs and reshaping JDK image directories.

use anyhow::{bail, Context, Result};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// macOS bundles keep the java home below the `.jdk` directory.
pub const MACOS_HOME_SUBPATH: &str = "Contents/Home";

/// Sorted entry names of a directory.
pub fn list_dir(dir: &Path) -> Result<Vec<OsString>> {
    let mut names = Vec::new();
    for entry in
        fs::read_dir(dir).with_context(|| format!("reading directory '{}'", dir.display()))?
    {
        let entry = entry.with_context(|| format!("reading entry under '{}'", dir.display()))?;
        names.push(entry.file_name());
    }
    names.sort();
    Ok(names)
}

/// Printable form of entry names, for error messages only.
pub fn display_names(names: &[OsString]) -> Vec<String> {
    names
        .iter()
        .map(|name| name.to_string_lossy().into_owned())
        .collect()
}

/// Name of the configuration directory in `build_dir` that starts with
/// `prefix` and ends with `debug_level` (e.g. `linux-x86_64-server-release`).
pub fn find_build_configuration(build_dir: &Path, prefix: &str, debug_level: &str) -> Result<String> {
    let names = list_dir(build_dir)?;
    if let Some(name) = names
        .iter()
        .filter_map(|name| name.to_str())
        .find(|name| name.starts_with(prefix) && name.ends_with(debug_level))
    {
        return Ok(name.to_string());
    }
    bail!(
        "no entry starting with \"{}\" in {}: {:?}",
        prefix,
        build_dir.display(),
        display_names(&names)
    )
}

/// The only entry of `dir`.
pub fn single_entry(dir: &Path) -> Result<PathBuf> {
    let names = list_dir(dir)?;
    match names.as_slice() {
        [name] => Ok(dir.join(name)),
        _ => bail!(
            "expected exactly one entry in {}, found {}: {:?}",
            dir.display(),
            names.len(),
            display_names(&names)
        ),
    }
}

/// `dir/Contents/Home` when `dir` has the macOS bundle layout, else `dir`.
pub fn java_home_of(dir: &Path) -> PathBuf {
    let home = dir.join(MACOS_HOME_SUBPATH);
    if home.is_dir() {
        home
    } else {
        dir.to_path_buf()
    }
}

/// A built JDK image inside a build configuration directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JdkImage {
    /// Directory that gets archived.
    pub image: PathBuf,
    /// `JAVA_HOME` within `image`.
    pub java_home: PathBuf,
    /// Archive consumers must append `Contents/Home` to find the java home.
    pub needs_pathfix: bool,
}

/// Find the JDK image under `<config_dir>/images`.
///
/// A `jdk-bundle` directory (macOS) must hold exactly one `*.jdk` bundle;
/// otherwise the flat `jdk` image is used.
pub fn locate_image(config_dir: &Path) -> Result<JdkImage> {
    let bundle_dir = config_dir.join("images/jdk-bundle");
    if !bundle_dir.exists() {
        let image = config_dir.join("images/jdk");
        if !image.is_dir() {
            bail!("JDK image not found: {}", image.display());
        }
        return Ok(JdkImage {
            java_home: image.clone(),
            image,
            needs_pathfix: false,
        });
    }

    let names = list_dir(&bundle_dir)?;
    let bundles: Vec<&OsString> = names
        .iter()
        .filter(|n| n.to_str().is_some_and(|n| n.ends_with(".jdk")))
        .collect();
    let [bundle] = bundles.as_slice() else {
        bail!(
            "expected exactly one .jdk bundle in {}: {:?}",
            bundle_dir.display(),
            display_names(&names)
        );
    };
    let image = bundle_dir.join(bundle);
    if !image.is_dir() {
        bail!("JDK bundle is not a directory: {}", image.display());
    }

    Ok(JdkImage {
        java_home: image.join(MACOS_HOME_SUBPATH),
        image,
        needs_pathfix: true,
    })
}

/// Move `<config_dir>/images/jdk/lib/static` to `saved_dir`, replacing any
/// previous stash.
pub fn stash_static_libs(config_dir: &Path, saved_dir: &Path) -> Result<()> {
    let static_libs_dir = config_dir.join("images/jdk/lib/static");
    require_non_empty(&static_libs_dir)?;

    if saved_dir.exists() {
        fs::remove_dir_all(saved_dir)
            .with_context(|| format!("removing old static libs '{}'", saved_dir.display()))?;
    }
    fs::rename(&static_libs_dir, saved_dir).with_context(|| {
        format!(
            "moving '{}' -> '{}'",
            static_libs_dir.display(),
            saved_dir.display()
        )
    })?;
    Ok(())
}

/// Fail unless `dir` exists and has at least one entry.
pub fn require_non_empty(dir: &Path) -> Result<()> {
    if !dir.is_dir() || list_dir(dir)?.is_empty() {
        bail!("Static libs dir is empty: {}", dir.display());
    }
    Ok(())
}

/// Move every entry of `saved_dir` into `<java_home>/lib`.
pub fn install_static_libs(saved_dir: &Path, java_home: &Path) -> Result<()> {
    let lib_dir = java_home.join("lib");
    fs::create_dir_all(&lib_dir)
        .with_context(|| format!("creating '{}'", lib_dir.display()))?;
    for name in list_dir(saved_dir)? {
        let src = saved_dir.join(&name);
        let dst = lib_dir.join(&name);
        fs::rename(&src, &dst)
            .with_context(|| format!("moving '{}' -> '{}'", src.display(), dst.display()))?;
    }
    Ok(())
}

/// Remove `<java_home>/demo` if present.
pub fn remove_demo(java_home: &Path) -> Result<()> {
    let demo_dir = java_home.join("demo");
    if demo_dir.exists() {
        log::info!("removing {}", demo_dir.display());
        fs::remove_dir_all(&demo_dir)
            .with_context(|| format!("removing '{}'", demo_dir.display()))?;
    }
    Ok(())
}

/// Remove `dir` if it exists, then create it empty.
pub fn recreate_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir).with_context(|| format!("removing '{}'", dir.display()))?;
    }
    fs::create_dir_all(dir).with_context(|| format!("creating '{}'", dir.display()))
}
