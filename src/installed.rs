//! Packages already installed into a Python interpreter, read from
//! `pip list`.

use anyhow::Result;
use log::debug;
use regex::Regex;
use std::sync::LazyLock;

use crate::catalog::Package;
use crate::python::PythonInstallation;
use crate::runtime::Runtime;

/// Source recorded on installed packages.
pub const INSTALLED_SOURCE: &str = "pypi";

// Legacy format: "requests (2.31.0)".
static LEGACY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<name>[^ ]+) \((?P<version>[^)]+)\)").expect("pip list pattern is valid")
});

/// Parse `pip list` output into packages.
///
/// Both the legacy `name (version)` lines and the column layout are
/// understood; headers and anything else are skipped. With `name`, only
/// packages whose name equals it (ignoring case) are kept.
pub fn parse_pip_list(output: &str, name: Option<&str>) -> Vec<Package> {
    output
        .lines()
        .filter_map(parse_line)
        .filter(|(package, _)| name.is_none_or(|n| package.eq_ignore_ascii_case(n)))
        .map(|(package, version)| Package::new(INSTALLED_SOURCE, package, version, None))
        .collect()
}

fn parse_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if let Some(caps) = LEGACY_LINE.captures(line) {
        let name = caps.name("name")?.as_str();
        let version = caps.name("version")?.as_str();
        return Some((name, version));
    }

    let mut columns = line.split_whitespace();
    let name = columns.next()?;
    let version = columns.next()?;
    // Header, separator rows and notices have no numeric version column.
    if !version.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    Some((name, version))
}

/// Run `<python> -m pip list` and parse what it prints.
#[tracing::instrument(skip(runtime, python))]
pub fn installed_packages<R: Runtime + ?Sized>(
    runtime: &R,
    python: &PythonInstallation,
    name: Option<&str>,
) -> Result<Vec<Package>> {
    let args = ["-m", "pip", "list"].map(String::from);
    let output = runtime.run(python.executable(), &args)?;
    if !output.success() {
        anyhow::bail!(
            "pip list failed with {:?}: {}",
            output.code,
            output.stderr.trim()
        );
    }

    let packages = parse_pip_list(&output.stdout, name);
    debug!("pip reported {} matching package(s)", packages.len());
    Ok(packages)
}
