//! Logger setup shared by the binaries.

use log::LevelFilter;

/// Install a timestamped logger at `info`, overridable through `RUST_LOG`.
pub fn init() {
    let mut builder = pretty_env_logger::formatted_timed_builder();
    builder.filter_level(LevelFilter::Info);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    // a logger may already be installed by an embedding program
    let _ = builder.try_init();
}
