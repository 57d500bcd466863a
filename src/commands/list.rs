use anyhow::Result;
use log::debug;
use std::path::Path;

use crate::{
    catalog::Package, installed::installed_packages, python::PythonInstallation,
    runtime::Runtime,
};

/// List packages installed into the interpreter.
#[tracing::instrument(skip(runtime))]
pub fn list<R: Runtime>(runtime: R, python: Option<&Path>, name: Option<&str>) -> Result<Vec<Package>> {
    let python = PythonInstallation::locate(&runtime, python, None)?;
    debug!("Listing packages of {:?}", python.executable());

    let packages = installed_packages(&runtime, &python, name)?;
    if packages.is_empty() {
        println!("No packages installed.");
    }
    for package in &packages {
        println!("{} {}", package.name, package.version);
    }
    Ok(packages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{CommandOutput, MockRuntime};

    fn pip_output(stdout: &'static str) -> MockRuntime {
        let mut runtime = MockRuntime::new();
        runtime.expect_run().returning(move |_, _| {
            Ok(CommandOutput {
                code: Some(0),
                stdout: stdout.to_string(),
                stderr: String::new(),
            })
        });
        runtime
    }

    #[test]
    fn test_list_no_packages() {
        let runtime = pip_output("Package Version\n------- -------\n");
        let packages = list(runtime, Some(Path::new("python")), None).unwrap();
        assert!(packages.is_empty());
    }

    #[test]
    fn test_list_with_filter() {
        let runtime = pip_output("pip (1.5.6)\nrequests (2.4.3)\n");
        let packages = list(runtime, Some(Path::new("python")), Some("Requests")).unwrap();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].fast_path, "pypi/requests/2.4.3");
    }
}
