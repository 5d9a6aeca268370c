//! Build, package and publish labsjdk images for CI.
//!
//! Two drivers share this crate:
//!
//! - **build-labsjdk** runs `configure` and `make` on a JDK checkout, archives
//!   the image, smoke-tests it and optionally uploads it.
//! - **repackage-labsjdk** takes prebuilt bundles and lays them out under the
//!   labsjdk naming scheme with a `java_home` link.
//!
//! # Architecture
//!
//! ```text
//! version ──► naming ──┬──► workflows::build ──► configure, process, publish
//!                      │            │
//!                      │            └──► layout, archive, checksum, link
//!                      │
//!                      └──► workflows::repackage ──► layout, archive, checksum, link
//! ```
//!
//! Every step is synchronous. Any failure aborts the whole run with a
//! contextual [`anyhow::Error`].

pub mod archive;
pub mod checksum;
pub mod config;
pub mod configure;
pub mod layout;
pub mod link;
pub mod logging;
pub mod naming;
pub mod preflight;
pub mod process;
pub mod publish;
pub mod version;
pub mod workflows;

pub use naming::{ArtifactNames, Edition};
pub use version::{JavaVersion, ReleaseInfo};
