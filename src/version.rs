// Build-time identity from Cargo.toml (reported on /version and sent as the collector User-Agent)

/// Package version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name (from Cargo.toml).
pub const NAME: &str = env!("CARGO_PKG_NAME");

pub fn user_agent() -> String {
    format!("{}/{}", NAME, VERSION)
}
