//! Archive creation and extraction for JDK images.
//!
//! The archive kind is chosen from the file extension: `.zip`, `.tar`, or
//! `.tar.gz`/`.tgz`. While archiving, every file and directory in the image
//! is made readable by group and others; anything the owner can execute also
//! becomes executable by group and others.

use anyhow::{bail, Context, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    Tar,
    TarGz,
}

impl ArchiveKind {
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        if name.ends_with(".zip") {
            Ok(ArchiveKind::Zip)
        } else if name.ends_with(".tar") {
            Ok(ArchiveKind::Tar)
        } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Ok(ArchiveKind::TarGz)
        } else {
            bail!("unsupported archive kind: {}", path.display())
        }
    }
}

/// Permission bits an image entry should carry once archived.
pub fn normalized_mode(mode: u32, is_dir: bool) -> u32 {
    let mut mode = (mode & 0o7777) | 0o044;
    if is_dir || mode & 0o100 != 0 {
        mode |= 0o011;
    }
    mode
}

#[derive(Debug, PartialEq, Eq)]
enum EntryKind {
    Dir,
    File,
    Symlink,
}

#[derive(Debug)]
struct ImageEntry {
    path: PathBuf,
    name: String,
    kind: EntryKind,
    mode: u32,
}

/// Create an archive at `arcpath` from the contents of `src_dir`.
///
/// Each entry is stored as `prefix` followed by its path relative to
/// `src_dir`, so a prefix meant as a directory must end in `/`.
pub fn create_archive(src_dir: &Path, arcpath: &Path, prefix: &str) -> Result<()> {
    let kind = ArchiveKind::from_path(arcpath)?;
    if !src_dir.is_dir() {
        bail!("archive source is not a directory: {}", src_dir.display());
    }

    let entries = collect_entries(src_dir, prefix)?;
    log::debug!(
        "archiving {} entries from {}",
        entries.len(),
        src_dir.display()
    );

    let out = File::create(arcpath)
        .with_context(|| format!("creating archive '{}'", arcpath.display()))?;
    let out = BufWriter::new(out);

    match kind {
        ArchiveKind::Tar => {
            let mut out = write_tar(out, &entries)?;
            out.flush()?;
        }
        ArchiveKind::TarGz => {
            let encoder = write_tar(GzEncoder::new(out, Compression::default()), &entries)?;
            let mut out = encoder.finish()?;
            out.flush()?;
        }
        ArchiveKind::Zip => {
            let mut out = write_zip(out, &entries)?;
            out.flush()?;
        }
    }
    Ok(())
}

fn collect_entries(src_dir: &Path, prefix: &str) -> Result<Vec<ImageEntry>> {
    let mut entries = Vec::new();
    for ent in WalkDir::new(src_dir)
        .follow_links(false)
        .sort_by_file_name()
        .min_depth(1)
    {
        let ent = ent.with_context(|| format!("walking '{}'", src_dir.display()))?;
        let path = ent.path().to_path_buf();
        let rel = path
            .strip_prefix(src_dir)
            .unwrap_or(&path)
            .to_string_lossy()
            .replace('\\', "/");

        let md = fs::symlink_metadata(&path)
            .with_context(|| format!("reading metadata of '{}'", path.display()))?;
        let kind = if md.file_type().is_symlink() {
            EntryKind::Symlink
        } else if md.is_dir() {
            EntryKind::Dir
        } else {
            EntryKind::File
        };

        let mode = if kind == EntryKind::Symlink {
            0o777
        } else {
            normalize_permissions(&path, &md)?
        };

        entries.push(ImageEntry {
            path,
            name: format!("{prefix}{rel}"),
            kind,
            mode,
        });
    }
    Ok(entries)
}

#[cfg(unix)]
fn normalize_permissions(path: &Path, md: &fs::Metadata) -> Result<u32> {
    use std::os::unix::fs::PermissionsExt;
    let mode = md.permissions().mode() & 0o7777;
    let wanted = normalized_mode(mode, md.is_dir());
    if wanted != mode {
        fs::set_permissions(path, fs::Permissions::from_mode(wanted))
            .with_context(|| format!("setting permissions on '{}'", path.display()))?;
    }
    Ok(wanted)
}

#[cfg(not(unix))]
fn normalize_permissions(_path: &Path, md: &fs::Metadata) -> Result<u32> {
    Ok(if md.is_dir() { 0o755 } else { 0o644 })
}

fn write_tar<W: Write>(writer: W, entries: &[ImageEntry]) -> Result<W> {
    let mut builder = tar::Builder::new(writer);
    builder.follow_symlinks(false);
    for entry in entries {
        builder
            .append_path_with_name(&entry.path, &entry.name)
            .with_context(|| format!("adding '{}' to archive", entry.path.display()))?;
    }
    builder.into_inner().context("finishing tar archive")
}

fn write_zip<W: Write + io::Seek>(writer: W, entries: &[ImageEntry]) -> Result<W> {
    let mut zip = ZipWriter::new(writer);
    for entry in entries {
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(entry.mode);
        match entry.kind {
            EntryKind::Dir => zip.add_directory(entry.name.as_str(), options)?,
            EntryKind::File => {
                zip.start_file(entry.name.as_str(), options)?;
                copy_into(&entry.path, &mut zip)?;
            }
            // zip extractors write links back as plain files holding the
            // target path, so the resolved entry is stored instead
            EntryKind::Symlink => {
                let md = fs::metadata(&entry.path)
                    .with_context(|| format!("resolving link '{}'", entry.path.display()))?;
                let mode = normalized_mode(mode_bits(&md), md.is_dir());
                let options = options.unix_permissions(mode);
                if md.is_dir() {
                    zip.add_directory(entry.name.as_str(), options)?;
                } else {
                    zip.start_file(entry.name.as_str(), options)?;
                    copy_into(&entry.path, &mut zip)?;
                }
            }
        }
    }
    zip.finish().context("finishing zip archive")
}

fn copy_into<W: Write>(path: &Path, out: &mut W) -> Result<()> {
    let mut src = File::open(path).with_context(|| format!("opening '{}'", path.display()))?;
    io::copy(&mut src, out).with_context(|| format!("adding '{}' to archive", path.display()))?;
    Ok(())
}

#[cfg(unix)]
fn mode_bits(md: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    md.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn mode_bits(md: &fs::Metadata) -> u32 {
    if md.is_dir() {
        0o755
    } else {
        0o644
    }
}

/// Unpack `arcpath` into `dest`, creating `dest` if needed.
pub fn extract_archive(arcpath: &Path, dest: &Path) -> Result<()> {
    let kind = ArchiveKind::from_path(arcpath)?;
    fs::create_dir_all(dest)
        .with_context(|| format!("creating extraction directory '{}'", dest.display()))?;

    let file = File::open(arcpath)
        .with_context(|| format!("opening archive '{}'", arcpath.display()))?;
    let reader = BufReader::new(file);

    let unpacked = match kind {
        ArchiveKind::Tar => unpack_tar(reader, dest),
        ArchiveKind::TarGz => unpack_tar(GzDecoder::new(reader), dest),
        ArchiveKind::Zip => unpack_zip(reader, dest),
    };
    unpacked.with_context(|| {
        format!(
            "extracting '{}' into '{}'",
            arcpath.display(),
            dest.display()
        )
    })
}

fn unpack_zip<R: Read + io::Seek>(reader: R, dest: &Path) -> Result<()> {
    let mut archive = ZipArchive::new(reader)?;
    archive.extract(dest)?;
    Ok(())
}

fn unpack_tar<R: Read>(reader: R, dest: &Path) -> Result<()> {
    let mut archive = tar::Archive::new(reader);
    archive.set_preserve_permissions(true);
    archive.unpack(dest)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_image(root: &Path) -> PathBuf {
        let image = root.join("image");
        fs::create_dir_all(image.join("bin")).unwrap();
        fs::create_dir_all(image.join("lib")).unwrap();
        fs::write(image.join("bin/java"), b"#!/bin/sh\necho java\n").unwrap();
        fs::write(image.join("lib/modules"), b"modules").unwrap();
        fs::write(image.join("release"), b"JAVA_VERSION=\"11.0.2\"\n").unwrap();
        image
    }

    #[cfg(unix)]
    fn mode_of(path: &Path) -> u32 {
        use std::os::unix::fs::PermissionsExt;
        fs::symlink_metadata(path).unwrap().permissions().mode() & 0o777
    }

    #[cfg(unix)]
    fn set_mode(path: &Path, mode: u32) {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
    }

    #[test]
    fn executable_files_gain_group_and_other_execute() {
        assert_eq!(normalized_mode(0o700, false), 0o755);
        assert_eq!(normalized_mode(0o100755, false), 0o755);
    }

    #[test]
    fn plain_files_gain_only_read() {
        assert_eq!(normalized_mode(0o600, false), 0o644);
        assert_eq!(normalized_mode(0o640, false), 0o644);
    }

    #[test]
    fn directories_are_always_searchable() {
        assert_eq!(normalized_mode(0o600, true), 0o655);
        assert_eq!(normalized_mode(0o700, true), 0o755);
    }

    #[test]
    fn archive_kind_from_extension() {
        assert_eq!(ArchiveKind::from_path(Path::new("a.zip")).unwrap(), ArchiveKind::Zip);
        assert_eq!(ArchiveKind::from_path(Path::new("a.tar")).unwrap(), ArchiveKind::Tar);
        assert_eq!(
            ArchiveKind::from_path(Path::new("a.tar.gz")).unwrap(),
            ArchiveKind::TarGz
        );
        assert_eq!(ArchiveKind::from_path(Path::new("a.tgz")).unwrap(), ArchiveKind::TarGz);
        assert!(ArchiveKind::from_path(Path::new("a.7z")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn archiving_normalizes_permissions_on_disk() {
        let temp = TempDir::new().unwrap();
        let image = sample_image(temp.path());
        set_mode(&image.join("bin/java"), 0o700);
        set_mode(&image.join("lib/modules"), 0o600);

        create_archive(&image, &temp.path().join("out.tar.gz"), "jdk/").unwrap();

        assert_eq!(mode_of(&image.join("bin/java")), 0o755);
        assert_eq!(mode_of(&image.join("lib/modules")), 0o644);
    }

    #[cfg(unix)]
    #[test]
    fn tar_gz_entries_are_prefixed_and_extractable() {
        let temp = TempDir::new().unwrap();
        let image = sample_image(temp.path());
        set_mode(&image.join("bin/java"), 0o700);
        std::os::unix::fs::symlink("modules", image.join("lib/modules.link")).unwrap();

        let arcpath = temp.path().join("labsjdk.tar.gz");
        create_archive(&image, &arcpath, "labsjdk-ce-11.0.2-jvmci-19.3-b03/").unwrap();

        let out = temp.path().join("out");
        extract_archive(&arcpath, &out).unwrap();

        let home = out.join("labsjdk-ce-11.0.2-jvmci-19.3-b03");
        assert_eq!(fs::read(home.join("lib/modules")).unwrap(), b"modules");
        assert_eq!(mode_of(&home.join("bin/java")), 0o755);
        assert!(home.join("lib/modules.link").is_symlink());
        assert_eq!(
            fs::read_link(home.join("lib/modules.link")).unwrap(),
            PathBuf::from("modules")
        );
    }

    #[test]
    fn plain_tar_roundtrip_keeps_empty_directories() {
        let temp = TempDir::new().unwrap();
        let image = sample_image(temp.path());
        fs::create_dir_all(image.join("include/empty")).unwrap();

        let arcpath = temp.path().join("image.tar");
        create_archive(&image, &arcpath, "").unwrap();

        let out = temp.path().join("out");
        extract_archive(&arcpath, &out).unwrap();
        assert!(out.join("include/empty").is_dir());
        assert_eq!(fs::read(out.join("release")).unwrap(), b"JAVA_VERSION=\"11.0.2\"\n");
    }

    #[test]
    fn zip_roundtrip() {
        let temp = TempDir::new().unwrap();
        let image = sample_image(temp.path());

        let arcpath = temp.path().join("bundle.zip");
        create_archive(&image, &arcpath, "jdk-11.0.2+7/").unwrap();

        let out = temp.path().join("out");
        extract_archive(&arcpath, &out).unwrap();
        assert_eq!(
            fs::read(out.join("jdk-11.0.2+7/lib/modules")).unwrap(),
            b"modules"
        );
    }

    #[cfg(unix)]
    #[test]
    fn zip_stores_what_symlinks_resolve_to() {
        let temp = TempDir::new().unwrap();
        let image = sample_image(temp.path());
        set_mode(&image.join("bin/java"), 0o700);
        std::os::unix::fs::symlink("modules", image.join("lib/modules.link")).unwrap();
        std::os::unix::fs::symlink("../bin/java", image.join("lib/java.link")).unwrap();
        std::os::unix::fs::symlink("../bin", image.join("lib/bin.link")).unwrap();

        let arcpath = temp.path().join("bundle.zip");
        create_archive(&image, &arcpath, "jdk-11.0.2+7/").unwrap();

        let out = temp.path().join("out");
        extract_archive(&arcpath, &out).unwrap();
        let lib = out.join("jdk-11.0.2+7/lib");
        assert!(!lib.join("modules.link").is_symlink());
        assert_eq!(fs::read(lib.join("modules.link")).unwrap(), b"modules");
        assert_eq!(
            fs::read(lib.join("java.link")).unwrap(),
            b"#!/bin/sh\necho java\n"
        );
        assert_eq!(mode_of(&lib.join("java.link")), 0o755);
        assert!(lib.join("bin.link").is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn zip_rejects_dangling_symlink() {
        let temp = TempDir::new().unwrap();
        let image = sample_image(temp.path());
        std::os::unix::fs::symlink("missing", image.join("lib/dangling")).unwrap();

        let err = create_archive(&image, &temp.path().join("bundle.zip"), "").unwrap_err();
        assert!(format!("{err:#}").contains("resolving link"));
    }

    #[test]
    fn unsupported_archive_is_rejected_before_writing() {
        let temp = TempDir::new().unwrap();
        let image = sample_image(temp.path());
        let arcpath = temp.path().join("image.rar");
        let err = create_archive(&image, &arcpath, "").unwrap_err();
        assert!(err.to_string().contains("unsupported archive kind"));
        assert!(!arcpath.exists());
    }
}
