//! OS shell integration: file association and the "new note here" action.
//!
//! Each backend turns registration into a list of external commands (or file
//! writes) run through a [`CommandRunner`], so the exact sequence can be
//! checked without touching the host.

mod registry;
mod xdg;

use std::cell::RefCell;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::rc::Rc;

pub use registry::RegistryIntegration;
pub use xdg::XdgIntegration;

/// ProgID / desktop-entry identifier shared by every backend.
pub const APP_ID: &str = "mdnote.markdown";

#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error("{program} exited with {}: {stderr}", code.map_or("a signal".to_string(), |c| format!("code {c}")))]
    CommandFailed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
    #[error("could not run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{0} integration is not available on this platform")]
    Unsupported(&'static str),
    #[error("cannot determine the data directory")]
    NoDataDir,
}

pub trait ShellIntegration {
    /// Attempts every registration step; fails if any step failed. Steps that
    /// succeeded are left in place.
    fn register(&self) -> Result<(), ShellError>;

    /// Removes what `register` created. Individual failures are ignored.
    fn unregister(&self);

    fn is_registered(&self) -> bool;
}

// ─── Command runner ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

pub trait CommandRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, ShellError>;
}

/// Runs commands on the host via `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, ShellError> {
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|source| ShellError::Spawn {
                program: program.to_string(),
                source,
            })?;
        Ok(CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Runs a command and turns a non-zero exit into [`ShellError::CommandFailed`].
pub(crate) fn run_checked(
    runner: &dyn CommandRunner,
    program: &str,
    args: &[String],
) -> Result<CommandOutput, ShellError> {
    let output = runner.run(program, args)?;
    if output.success {
        Ok(output)
    } else {
        Err(ShellError::CommandFailed {
            program: program.to_string(),
            code: output.code,
            stderr: output.stderr.trim().to_string(),
        })
    }
}

#[derive(Debug, Default)]
struct Recording {
    calls: Vec<(String, Vec<String>)>,
    failing: Vec<String>,
    outputs: Vec<(String, String)>,
}

/// Runner that records calls instead of executing them. Clones share state.
///
/// Every call succeeds with empty output unless its command line contains a
/// needle registered with [`RecordingRunner::fail_matching`].
#[derive(Debug, Default, Clone)]
pub struct RecordingRunner {
    inner: Rc<RefCell<Recording>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_matching(&self, needle: &str) {
        self.inner.borrow_mut().failing.push(needle.to_string());
    }

    /// Calls whose command line contains `needle` print `stdout`.
    pub fn stub_output(&self, needle: &str, stdout: &str) {
        self.inner
            .borrow_mut()
            .outputs
            .push((needle.to_string(), stdout.to_string()));
    }

    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.inner.borrow().calls.clone()
    }

    /// Calls rendered as single command lines.
    pub fn command_lines(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .map(|(program, args)| command_line(&program, &args))
            .collect()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, ShellError> {
        let mut inner = self.inner.borrow_mut();
        inner.calls.push((program.to_string(), args.to_vec()));
        let line = command_line(program, args);

        if inner.failing.iter().any(|needle| line.contains(needle.as_str())) {
            return Ok(CommandOutput {
                success: false,
                code: Some(1),
                stdout: String::new(),
                stderr: "access denied".to_string(),
            });
        }
        let stdout = inner
            .outputs
            .iter()
            .find(|(needle, _)| line.contains(needle.as_str()))
            .map(|(_, out)| out.clone())
            .unwrap_or_default();
        Ok(CommandOutput {
            success: true,
            code: Some(0),
            stdout,
            stderr: String::new(),
        })
    }
}

fn command_line(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

// ─── Backend selection ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ShellBackend {
    /// Windows registry (HKCU, or HKLM when elevated).
    Registry,
    /// freedesktop.org desktop entry plus xdg-mime.
    Xdg,
}

impl Default for ShellBackend {
    fn default() -> Self {
        if cfg!(windows) {
            ShellBackend::Registry
        } else {
            ShellBackend::Xdg
        }
    }
}

impl ShellBackend {
    pub fn name(self) -> &'static str {
        match self {
            ShellBackend::Registry => "registry",
            ShellBackend::Xdg => "xdg",
        }
    }

    /// Errors when the backend cannot work on the running OS.
    pub fn check_host(self) -> Result<(), ShellError> {
        match self {
            ShellBackend::Registry if !cfg!(windows) => Err(ShellError::Unsupported("registry")),
            ShellBackend::Xdg if cfg!(any(windows, target_os = "macos")) => {
                Err(ShellError::Unsupported("xdg"))
            }
            _ => Ok(()),
        }
    }

    /// Builds the integration for `exe`, running commands through `runner`.
    pub fn integration(
        self,
        exe: &Path,
        runner: Box<dyn CommandRunner>,
    ) -> Result<Box<dyn ShellIntegration>, ShellError> {
        Ok(match self {
            ShellBackend::Registry => Box::new(RegistryIntegration::new(exe, runner)),
            ShellBackend::Xdg => {
                let data_home = crate::paths::xdg_data_home().ok_or(ShellError::NoDataDir)?;
                Box::new(XdgIntegration::new(exe, data_home, runner))
            }
        })
    }
}
