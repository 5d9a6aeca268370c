use std::fs;
use std::path::{Path, PathBuf};

use labsjdk::archive::{create_archive, extract_archive};
use labsjdk::checksum::sha1_file;
use labsjdk::workflows::repackage::{repackage_with_release, RepackageOptions};
use labsjdk::{Edition, JavaVersion, ReleaseInfo};
use tempfile::TempDir;

fn release() -> ReleaseInfo {
    ReleaseInfo {
        version: JavaVersion {
            feature: 11,
            interim: 0,
            update: 2,
        },
        build_number: 7,
        edition: Edition::Community,
    }
}

fn options(root: &Path, bundles_dir: PathBuf, with_static_libs: bool) -> RepackageOptions {
    RepackageOptions {
        source_dir: root.to_path_buf(),
        jvmci_version: "19.3-b03".into(),
        ci_arch: "amd64".into(),
        ci_os: "linux".into(),
        target_dir: root.join("labsjdk"),
        conf: None,
        bundles_dir: Some(bundles_dir),
        with_static_libs,
        jdk_debug_level: "release".into(),
        java_home_link_target: None,
    }
}

/// Write `files` under a single `top` directory and archive it as `bundle`.
fn make_bundle(root: &Path, bundles_dir: &Path, bundle: &str, top: &str, files: &[&str]) {
    let staging = root.join("staging").join(bundle);
    for file in files {
        let path = staging.join(top).join(file);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, file.as_bytes()).unwrap();
    }
    fs::create_dir_all(bundles_dir).unwrap();
    create_archive(&staging, &bundles_dir.join(bundle), "").unwrap();
}

#[test]
fn repackages_flat_bundle_with_static_libs() {
    let temp = TempDir::new().unwrap();
    let root = &fs::canonicalize(temp.path()).unwrap();
    let bundles = root.join("bundles");
    make_bundle(
        root,
        &bundles,
        "jdk-11.0.2+7_linux-x64_bin.tar.gz",
        "jdk-11.0.2+7",
        &["bin/java", "lib/modules", "release"],
    );
    make_bundle(
        root,
        &bundles,
        "jdk-11.0.2+7_linux-x64_bin-static-libs.tar.gz",
        "jdk-11.0.2+7-static-libs",
        &["lib/static/linux-amd64/glibc/libjava.a"],
    );
    make_bundle(
        root,
        &bundles,
        "jdk-11.0.2+7_linux-x64_bin-debug-symbols.tar.gz",
        "jdk-11.0.2+7",
        &["lib/server/libjvm.debuginfo"],
    );

    let outcome = repackage_with_release(&options(root, bundles, true), &release()).unwrap();

    let install_dir = root.join("labsjdk/labsjdk-ce-11.0.2-jvmci-19.3-b03");
    assert_eq!(outcome.install_dir, install_dir);
    assert_eq!(outcome.java_home, install_dir);
    assert!(outcome.pathfix.is_none());
    assert_eq!(
        fs::read(install_dir.join("lib/linux-amd64/glibc/libjava.a")).unwrap(),
        b"lib/static/linux-amd64/glibc/libjava.a"
    );
    assert!(!install_dir.join("lib/server/libjvm.debuginfo").exists());

    assert_eq!(
        outcome.archive,
        root.join("labsjdk/labsjdk-ce-11.0.2+7-jvmci-19.3-b03-linux-amd64.tar.gz")
    );
    assert_eq!(
        fs::read_to_string(&outcome.sha1).unwrap(),
        sha1_file(&outcome.archive).unwrap()
    );

    assert_eq!(outcome.java_home_link, root.join("labsjdk/java_home"));
    assert_eq!(
        fs::read(outcome.java_home_link.join("release")).unwrap(),
        b"release"
    );

    // Only the renamed image, the archive, its digest and the link remain.
    let mut entries: Vec<String> = fs::read_dir(root.join("labsjdk"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    entries.sort();
    assert_eq!(
        entries,
        vec![
            "java_home",
            "labsjdk-ce-11.0.2+7-jvmci-19.3-b03-linux-amd64.tar.gz",
            "labsjdk-ce-11.0.2+7-jvmci-19.3-b03-linux-amd64.tar.gz.sha1",
            "labsjdk-ce-11.0.2-jvmci-19.3-b03",
        ]
    );

    let check = root.join("check");
    extract_archive(&outcome.archive, &check).unwrap();
    assert_eq!(
        fs::read(check.join("labsjdk-ce-11.0.2-jvmci-19.3-b03/bin/java")).unwrap(),
        b"bin/java"
    );
}

#[test]
fn repackages_macos_bundle_with_pathfix() {
    let temp = TempDir::new().unwrap();
    let root = &fs::canonicalize(temp.path()).unwrap();
    let bundles = root.join("bundles");
    make_bundle(
        root,
        &bundles,
        "jdk-11.0.2+7_osx-x64_bin.tar.gz",
        "jdk-11.0.2.jdk",
        &["Contents/Home/bin/java", "Contents/Info.plist"],
    );

    let mut opts = options(root, bundles, false);
    opts.ci_os = "darwin".into();
    opts.java_home_link_target = Some(root.join("links/java_home"));
    let outcome = repackage_with_release(&opts, &release()).unwrap();

    let install_dir = root.join("labsjdk/labsjdk-ce-11.0.2-jvmci-19.3-b03");
    assert_eq!(outcome.java_home, install_dir.join("Contents/Home"));
    let pathfix = outcome.pathfix.unwrap();
    assert_eq!(fs::read_to_string(pathfix).unwrap(), "Contents/Home");
    assert_eq!(
        fs::read(root.join("links/java_home/bin/java")).unwrap(),
        b"Contents/Home/bin/java"
    );
}

#[test]
fn bundle_with_several_top_level_entries_aborts() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    let bundles = root.join("bundles");
    let staging = root.join("staging");
    fs::create_dir_all(staging.join("a")).unwrap();
    fs::create_dir_all(staging.join("b")).unwrap();
    fs::create_dir_all(&bundles).unwrap();
    create_archive(
        &staging,
        &bundles.join("jdk-11.0.2+7_linux-x64_bin.tar.gz"),
        "",
    )
    .unwrap();

    let err = repackage_with_release(&options(root, bundles, false), &release()).unwrap_err();
    assert!(format!("{err:#}").contains("expected exactly one entry"));
}

#[test]
fn existing_target_dir_aborts() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::create_dir_all(root.join("labsjdk")).unwrap();
    let err = repackage_with_release(&options(root, root.join("bundles"), false), &release())
        .unwrap_err();
    assert!(err.to_string().contains("already exists"));
}

#[test]
fn missing_static_libs_bundle_aborts() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    let bundles = root.join("bundles");
    make_bundle(
        root,
        &bundles,
        "jdk-11.0.2+7_linux-x64_bin.zip",
        "jdk-11.0.2+7",
        &["bin/java"],
    );
    let err = repackage_with_release(&options(root, bundles, true), &release()).unwrap_err();
    assert!(err.to_string().contains("StaticLibs"));
    assert!(!root.join("labsjdk").exists());
}

#[test]
fn repackages_fastdebug_bundles() {
    let temp = TempDir::new().unwrap();
    let root = &fs::canonicalize(temp.path()).unwrap();
    let bundles = root.join("bundles");
    make_bundle(
        root,
        &bundles,
        "jdk-11.0.2+7_linux-x64_bin-debug.tar.gz",
        "jdk-11.0.2+7",
        &["bin/java", "release"],
    );
    make_bundle(
        root,
        &bundles,
        "jdk-11.0.2+7_linux-x64_bin-static-libs-debug.tar.gz",
        "jdk-11.0.2+7-static-libs",
        &["lib/static/linux-amd64/glibc/libjava.a"],
    );
    make_bundle(
        root,
        &bundles,
        "jdk-11.0.2+7_linux-x64_bin-debug-symbols.tar.gz",
        "jdk-11.0.2+7",
        &["lib/server/libjvm.debuginfo"],
    );

    let mut opts = options(root, bundles, true);
    opts.jdk_debug_level = "fastdebug".into();
    let outcome = repackage_with_release(&opts, &release()).unwrap();

    let install_dir = root.join("labsjdk/labsjdk-ce-11.0.2-jvmci-19.3-b03-fastdebug");
    assert_eq!(outcome.install_dir, install_dir);
    assert_eq!(
        outcome.archive,
        root.join("labsjdk/labsjdk-ce-11.0.2+7-jvmci-19.3-b03-fastdebug-linux-amd64.tar.gz")
    );
    assert_eq!(
        fs::read(install_dir.join("lib/linux-amd64/glibc/libjava.a")).unwrap(),
        b"lib/static/linux-amd64/glibc/libjava.a"
    );
    assert!(!install_dir.join("lib/server/libjvm.debuginfo").exists());
}
