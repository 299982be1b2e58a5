//! Build version information.

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Human-readable build info line for `--version`.
pub fn info() -> String {
    let commit = option_env!("VANTAGE_GIT_COMMIT").unwrap_or("unknown");
    let date = option_env!("VANTAGE_BUILD_DATE").unwrap_or("unknown");
    format!("vantage-console {VERSION} (commit {commit}, built {date})")
}
