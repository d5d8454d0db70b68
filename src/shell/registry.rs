use std::path::{Path, PathBuf};

use super::{run_checked, CommandRunner, ShellError, ShellIntegration, APP_ID};

const REG: &str = "reg";
const USER_CLASSES: &str = r"HKCU\Software\Classes";
const MACHINE_CLASSES: &str = r"HKLM\Software\Classes";
const NEW_VERB: &str = "mdnote.new";

/// Windows registry backend driven through `reg.exe`.
///
/// Writes per-user keys under `HKCU\Software\Classes`. When that fails and
/// the process already runs elevated, the same keys are written machine-wide.
pub struct RegistryIntegration {
    exe: PathBuf,
    runner: Box<dyn CommandRunner>,
}

impl RegistryIntegration {
    pub fn new(exe: &Path, runner: Box<dyn CommandRunner>) -> Self {
        Self {
            exe: exe.to_path_buf(),
            runner,
        }
    }

    fn exe(&self) -> String {
        self.exe.display().to_string()
    }

    /// `reg add` argument lists, in the order they run.
    fn add_commands(&self, root: &str) -> Vec<Vec<String>> {
        let exe = self.exe();
        let prog_id = format!(r"{root}\{APP_ID}");
        let verb = format!(r"{root}\Directory\Background\shell\{NEW_VERB}");
        vec![
            add_default(&prog_id, "Markdown Note"),
            add_default(&format!(r"{prog_id}\DefaultIcon"), &format!("\"{exe}\",0")),
            add_default(
                &format!(r"{prog_id}\shell\open\command"),
                &format!("\"{exe}\" \"%1\""),
            ),
            args(&[
                "add",
                &format!(r"{root}\.md\OpenWithProgids"),
                "/v",
                APP_ID,
                "/t",
                "REG_NONE",
                "/f",
            ]),
            add_default(&verb, "New note here"),
            args(&["add", &verb, "/v", "Icon", "/d", &format!("\"{exe}\",0"), "/f"]),
            add_default(
                &format!(r"{verb}\command"),
                &format!("\"{exe}\" --new \"%V\""),
            ),
        ]
    }

    fn delete_commands(root: &str) -> Vec<Vec<String>> {
        vec![
            args(&["delete", &format!(r"{root}\{APP_ID}"), "/f"]),
            args(&[
                "delete",
                &format!(r"{root}\.md\OpenWithProgids"),
                "/v",
                APP_ID,
                "/f",
            ]),
            args(&[
                "delete",
                &format!(r"{root}\Directory\Background\shell\{NEW_VERB}"),
                "/f",
            ]),
        ]
    }

    /// Runs every step under `root`, returning the first failure.
    fn register_under(&self, root: &str) -> Result<(), ShellError> {
        let mut first_error = None;
        for cmd in self.add_commands(root) {
            if let Err(e) = run_checked(self.runner.as_ref(), REG, &cmd) {
                tracing::warn!(key = %cmd[1], error = %e, "registry step failed");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// `net session` only succeeds for an elevated process.
    fn is_elevated(&self) -> bool {
        self.runner
            .run("net", &args(&["session"]))
            .map(|o| o.success)
            .unwrap_or(false)
    }
}

impl ShellIntegration for RegistryIntegration {
    fn register(&self) -> Result<(), ShellError> {
        match self.register_under(USER_CLASSES) {
            Ok(()) => {
                tracing::info!(root = USER_CLASSES, "shell integration registered");
                Ok(())
            }
            Err(e) if self.is_elevated() => {
                tracing::info!(error = %e, "per-user registration failed, trying machine-wide");
                self.register_under(MACHINE_CLASSES)?;
                tracing::info!(root = MACHINE_CLASSES, "shell integration registered");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn unregister(&self) {
        let mut roots = vec![USER_CLASSES];
        if self.is_elevated() {
            roots.push(MACHINE_CLASSES);
        }
        for root in roots {
            for cmd in Self::delete_commands(root) {
                if let Err(e) = run_checked(self.runner.as_ref(), REG, &cmd) {
                    tracing::debug!(key = %cmd[1], error = %e, "registry delete skipped");
                }
            }
        }
        tracing::info!("shell integration removed");
    }

    /// Either root counts: an elevated registration lives under HKLM.
    fn is_registered(&self) -> bool {
        [USER_CLASSES, MACHINE_CLASSES].into_iter().any(|root| {
            let key = format!(r"{root}\{APP_ID}\shell\open\command");
            match run_checked(self.runner.as_ref(), REG, &args(&["query", &key, "/ve"])) {
                // A stale entry pointing at an older binary counts as missing.
                Ok(out) => out.stdout.contains(&self.exe()),
                Err(_) => false,
            }
        })
    }
}

fn add_default(key: &str, data: &str) -> Vec<String> {
    args(&["add", key, "/ve", "/d", data, "/f"])
}

fn args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}
