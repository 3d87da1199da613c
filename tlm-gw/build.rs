//! Build script for tlm-gw
//!
//! Stamps the binary with the identity it logs at startup:
//! - GIT_HASH: short commit hash, `unknown` outside a checkout
//! - BUILD_TIMESTAMP: UTC, ISO 8601
//! - BUILD_PROFILE: cargo profile (debug/release)

use std::process::Command;

fn main() {
    // 8-character hash, same width the startup banner expects
    let git_hash = git(&["rev-parse", "--short=8", "HEAD"]).unwrap_or_else(|| "unknown".into());

    let build_timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);

    // Set by cargo for build scripts
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".into());

    emit("GIT_HASH", &git_hash);
    emit("BUILD_TIMESTAMP", &build_timestamp);
    emit("BUILD_PROFILE", &profile);

    // No rerun-if-changed: the script reruns on every build so the
    // timestamp and hash stay current.
}

/// Trimmed stdout of a successful git invocation
fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn emit(key: &str, value: &str) {
    println!("cargo:rustc-env={}={}", key, value);
}
