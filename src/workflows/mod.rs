//! The two drivers: building a labsjdk from source and repackaging
//! prebuilt bundles.

pub mod build;
pub mod repackage;

pub use build::{run_build, BuildOptions, BuildOutcome};
pub use repackage::{run_repackage, RepackageOptions, RepackageOutcome};
