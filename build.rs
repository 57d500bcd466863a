//! Stamps the binary with a version: an explicit `PYGET_BUILD_VERSION`, the
//! nearest `v*` release tag of a git checkout, or the manifest version.

use std::env;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/tags");
    println!("cargo:rerun-if-env-changed=PYGET_BUILD_VERSION");

    let version = env::var("PYGET_BUILD_VERSION")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .or_else(release_version)
        .or_else(|| env::var("CARGO_PKG_VERSION").ok())
        .unwrap_or_else(|| "0.0.0".to_string());

    println!("cargo:rustc-env=PYGET_VERSION={}", version);
}

/// `git describe` against release tags, as a semver string:
/// `v1.2.0` is `1.2.0`, `v1.2.0-3-gabc1234-dirty` is `1.2.0+3.gabc1234.dirty`.
fn release_version() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--match", "v[0-9]*", "--dirty"])
        .output()
        .ok()
        .filter(|o| o.status.success())?;

    let described = String::from_utf8(output.stdout).ok()?;
    let described = described.trim().strip_prefix('v')?;
    Some(match described.split_once('-') {
        None => described.to_string(),
        Some((tag, distance)) => format!("{}+{}", tag, distance.replace('-', ".")),
    })
}
