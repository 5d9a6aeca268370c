//! Options passed to the JDK `configure` script.

use crate::naming::{Edition, RELEASE_DEBUG_LEVEL};

/// Inputs that shape the configure command line.
#[derive(Debug, Clone)]
pub struct ConfigureInputs<'a> {
    pub debug_level: &'a str,
    pub boot_jdk: &'a str,
    pub devkit: &'a str,
    pub build_number: u32,
    pub jvmci_version: &'a str,
    pub ci_arch: &'a str,
    pub edition: Edition,
    /// Appended verbatim after the computed options.
    pub extra_options: &'a [String],
}

/// Compute the configure options for a labsjdk build.
pub fn configure_options(inputs: &ConfigureInputs<'_>) -> Vec<String> {
    let mut options = vec![
        format!("--with-debug-level={}", inputs.debug_level),
        // AOT is not part of labsjdk
        "--enable-aot=no".to_string(),
        "--with-jvm-features=graal".to_string(),
        "--with-jvm-variants=server".to_string(),
        "--disable-warnings-as-errors".to_string(),
        format!("--with-boot-jdk={}", inputs.boot_jdk),
        format!("--with-devkit={}", inputs.devkit),
        "--with-zlib=bundled".to_string(),
        format!("--with-version-build={}", inputs.build_number),
        format!("--with-version-opt=jvmci-{}-LTS", inputs.jvmci_version),
        // An empty VERSION_PRE marks the build as GA
        "--with-version-pre=".to_string(),
    ];

    if inputs.ci_arch != "aarch64" {
        options.push("--disable-precompiled-headers".to_string());
    }
    if inputs.edition.is_closed() {
        options.push("--disable-manpages".to_string());
    }
    if inputs.debug_level != RELEASE_DEBUG_LEVEL {
        options.push("--with-native-debug-symbols=external".to_string());
    } else {
        options.push("--with-native-debug-symbols=none".to_string());
    }

    options.extend(inputs.extra_options.iter().cloned());
    options
}

/// Option added for the pass that only produces static libraries.
pub const STATIC_BUILD_OPTION: &str = "--enable-static-build";
