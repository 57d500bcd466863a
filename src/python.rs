//! Discovery of the local Python interpreter the packages are meant for.

use anyhow::{Context, Result};
use log::debug;
use semver::Version;
use std::path::{Path, PathBuf};

use crate::error::PygetError;
use crate::pe;
use crate::runtime::{CommandOutput, Runtime};
use crate::target::{Bitness, RuntimeTarget};
use crate::version;

const EXECUTABLE_NAMES: &[&str] = &["python.exe", "python"];

/// A Python interpreter on this machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PythonInstallation {
    executable: PathBuf,
    version: Option<Version>,
}

impl PythonInstallation {
    /// Find the interpreter to use.
    ///
    /// An explicit path wins; otherwise the first `python` found on `PATH`
    /// is used. An explicit version is trusted without running the
    /// interpreter.
    #[tracing::instrument(skip(runtime))]
    pub fn locate<R: Runtime + ?Sized>(
        runtime: &R,
        explicit_path: Option<&Path>,
        explicit_version: Option<&str>,
    ) -> Result<Self> {
        let version = explicit_version.map(version::parse_required).transpose()?;

        let executable = match explicit_path {
            Some(path) => path.to_path_buf(),
            None => find_on_path(runtime).context(
                "Could not find a Python interpreter on PATH. Use --python to point at one.",
            )?,
        };
        debug!("Using Python interpreter {:?}", executable);

        Ok(Self {
            executable,
            version,
        })
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Interpreter version, as reported by `python -V`.
    #[tracing::instrument(skip(self, runtime))]
    pub fn version<R: Runtime + ?Sized>(&self, runtime: &R) -> Result<Version> {
        if let Some(version) = &self.version {
            return Ok(version.clone());
        }

        let output = runtime.run(&self.executable, &["-V".to_string()])?;
        if !output.success() {
            anyhow::bail!(
                "{:?} -V exited with {:?}: {}",
                self.executable,
                output.code,
                output.stderr.trim()
            );
        }
        Ok(parse_version_output(&output)?)
    }

    /// Word size of the interpreter executable.
    pub fn word_size<R: Runtime + ?Sized>(&self, runtime: &R) -> Result<Bitness> {
        pe::detect_word_size(runtime, &self.executable)
    }

    /// The target catalog candidates have to suit.
    ///
    /// `bitness` skips reading the executable header when given.
    pub fn target<R: Runtime + ?Sized>(
        &self,
        runtime: &R,
        bitness: Option<Bitness>,
    ) -> Result<RuntimeTarget> {
        let version = self.version(runtime)?;
        let bitness = match bitness {
            Some(bitness) => bitness,
            None => self.word_size(runtime)?,
        };
        Ok(RuntimeTarget::new(version, bitness))
    }
}

fn find_on_path<R: Runtime + ?Sized>(runtime: &R) -> Option<PathBuf> {
    let path = runtime.env_var("PATH").ok()?;
    std::env::split_paths(&path)
        .flat_map(|dir| EXECUTABLE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|candidate| runtime.exists(candidate))
}

/// Extract the version from `python -V` output ("Python 3.12.1").
///
/// Python 2 prints the banner on stderr, so stdout is tried first and
/// stderr second.
pub fn parse_version_output(output: &CommandOutput) -> Result<Version, PygetError> {
    let banner = [&output.stdout, &output.stderr]
        .into_iter()
        .find_map(|stream| stream.lines().map(str::trim).find(|l| !l.is_empty()))
        .ok_or_else(|| PygetError::Format("python -V printed nothing".into()))?;

    let token = banner
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| PygetError::Format(format!("unexpected version banner '{}'", banner)))?;
    version::parse_required(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use mockall::predicate::eq;
    use std::io::Cursor;

    fn output(stdout: &str, stderr: &str) -> CommandOutput {
        CommandOutput {
            code: Some(0),
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        }
    }

    fn pe_header(machine: u16) -> Vec<u8> {
        let mut header = vec![0u8; 0x100];
        header[60..64].copy_from_slice(&0x80u32.to_le_bytes());
        header[0x84..0x86].copy_from_slice(&machine.to_le_bytes());
        header
    }

    #[test]
    fn test_parse_version_output_stdout() {
        let version = parse_version_output(&output("Python 3.12.1\n", "")).unwrap();
        assert_eq!(version, Version::new(3, 12, 1));
    }

    #[test]
    fn test_parse_version_output_stderr_for_python2() {
        let version = parse_version_output(&output("", "\nPython 2.7.8\n")).unwrap();
        assert_eq!(version, Version::new(2, 7, 8));
    }

    #[test]
    fn test_parse_version_output_errors() {
        assert!(matches!(
            parse_version_output(&output("", "")),
            Err(PygetError::Format(_))
        ));
        assert!(matches!(
            parse_version_output(&output("Python\n", "")),
            Err(PygetError::Format(_))
        ));
        assert!(parse_version_output(&output("Python banana\n", "")).is_err());
    }

    #[test]
    fn test_locate_explicit_path_skips_search() {
        let runtime = MockRuntime::new();
        let python =
            PythonInstallation::locate(&runtime, Some(Path::new("/opt/py/python.exe")), None)
                .unwrap();
        assert_eq!(python.executable(), Path::new("/opt/py/python.exe"));
    }

    #[cfg(unix)]
    #[test]
    fn test_locate_searches_path() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_env_var()
            .with(eq("PATH"))
            .returning(|_| Ok("/usr/local/bin:/usr/bin".to_string()));
        runtime
            .expect_exists()
            .returning(|p| p == Path::new("/usr/bin/python"));

        let python = PythonInstallation::locate(&runtime, None, None).unwrap();
        assert_eq!(python.executable(), Path::new("/usr/bin/python"));
    }

    #[test]
    fn test_locate_not_found() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_env_var()
            .returning(|_| Err(std::env::VarError::NotPresent));

        let err = PythonInstallation::locate(&runtime, None, None).unwrap_err();
        assert!(err.to_string().contains("--python"));
    }

    #[test]
    fn test_locate_rejects_bad_explicit_version() {
        let runtime = MockRuntime::new();
        assert!(
            PythonInstallation::locate(&runtime, Some(Path::new("python")), Some("three")).is_err()
        );
    }

    #[test]
    fn test_version_runs_interpreter() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_run()
            .withf(|program, args| {
                program.to_string_lossy() == "python" && args == ["-V".to_string()]
            })
            .times(1)
            .returning(|_, _| Ok(output("Python 3.4.3\n", "")));

        let python = PythonInstallation::locate(&runtime, Some(Path::new("python")), None).unwrap();
        assert_eq!(python.version(&runtime).unwrap(), Version::new(3, 4, 3));
    }

    #[test]
    fn test_version_failure_exit_code() {
        let mut runtime = MockRuntime::new();
        runtime.expect_run().returning(|_, _| {
            Ok(CommandOutput {
                code: Some(1),
                stdout: String::new(),
                stderr: "boom".into(),
            })
        });

        let python = PythonInstallation::locate(&runtime, Some(Path::new("python")), None).unwrap();
        assert!(python.version(&runtime).is_err());
    }

    #[test]
    fn test_target_with_explicit_values_needs_no_runtime() {
        let runtime = MockRuntime::new();
        let python =
            PythonInstallation::locate(&runtime, Some(Path::new("python")), Some("2.7")).unwrap();

        let target = python.target(&runtime, Some(Bitness::X86)).unwrap();
        assert_eq!(target, RuntimeTarget::new(Version::new(2, 7, 0), Bitness::X86));
    }

    #[test]
    fn test_target_reads_executable_header() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_open()
            .returning(|_| Ok(Box::new(Cursor::new(pe_header(0x8664)))));

        let python =
            PythonInstallation::locate(&runtime, Some(Path::new("python.exe")), Some("3.12"))
                .unwrap();
        let target = python.target(&runtime, None).unwrap();
        assert_eq!(target.bitness, Bitness::X64);
        assert_eq!(target.version, Version::new(3, 12, 0));
    }
}
