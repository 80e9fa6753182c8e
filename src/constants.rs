//! Central place for application-wide constants and default values.

/// Default application name (can be overridden in config)
pub const DEFAULT_APP_NAME: &str = "Overlink";

/// Left padding used to align log lines with those that include emoji prefixes.
/// Keep this to a fixed width matching the emoji prefix you use elsewhere.
pub const ICON_PLACEHOLDER: &str = "   "; // Three spaces for alignment

/// SDK short name reported alongside the version
pub const SDK_NAME: &str = "overlink";

/// Application / crate version (populated from Cargo.toml via env! macro)
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default capacity of the bounded host completion queue. Enqueueing blocks
/// the backend worker once this many completions are waiting for the host.
pub const DEFAULT_COMPLETION_QUEUE: usize = 64;

/// Human friendly composite version string used in prompts / logs.
pub fn full_version() -> String {
    format!("{} v{}", SDK_NAME, APP_VERSION)
}
