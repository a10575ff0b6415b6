use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Callboard";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing filter when RUST_LOG is not set.
pub fn default_log_filter() -> String {
    "info,callboard=debug".to_string()
}

/// Deployed scripting web-app URL backing the dashboard.
/// Required: without it there is no record store to talk to.
pub fn script_url() -> Option<String> {
    std::env::var("CALLBOARD_SCRIPT_URL")
        .ok()
        .filter(|v| !v.trim().is_empty())
}

/// Address the dashboard API listens on.
pub fn bind_addr() -> SocketAddr {
    std::env::var("CALLBOARD_ADDR")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 8787)))
}

/// Directory holding the built dashboard UI assets.
pub fn dashboard_dist_dir() -> PathBuf {
    std::env::var("CALLBOARD_DIST")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("dist"))
}
