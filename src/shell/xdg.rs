use std::path::{Path, PathBuf};

use super::{run_checked, CommandRunner, ShellError, ShellIntegration};

const DESKTOP_FILE: &str = "mdnote.desktop";
const MIME_TYPES: &[&str] = &["text/markdown", "text/x-markdown"];

/// freedesktop.org backend: a desktop entry in `$XDG_DATA_HOME/applications`
/// made the default handler for markdown via `xdg-mime`.
pub struct XdgIntegration {
    exe: PathBuf,
    applications_dir: PathBuf,
    runner: Box<dyn CommandRunner>,
}

impl XdgIntegration {
    pub fn new(exe: &Path, data_home: PathBuf, runner: Box<dyn CommandRunner>) -> Self {
        Self {
            exe: exe.to_path_buf(),
            applications_dir: data_home.join("applications"),
            runner,
        }
    }

    pub fn desktop_file_path(&self) -> PathBuf {
        self.applications_dir.join(DESKTOP_FILE)
    }

    fn exec_line(&self) -> String {
        format!("Exec={} %f", quote_exec(&self.exe))
    }

    /// Launchers pass no directory to desktop actions, so there is no
    /// "new note here" entry; that verb exists only where the shell supplies
    /// the folder (the Windows directory background menu).
    fn desktop_entry(&self) -> String {
        let mime: String = MIME_TYPES.iter().map(|m| format!("{m};")).collect();
        format!(
            "[Desktop Entry]\n\
             Type=Application\n\
             Name=mdnote\n\
             GenericName=Markdown Note Editor\n\
             Comment=Edit markdown notes with a live preview\n\
             {exec}\n\
             Terminal=true\n\
             MimeType={mime}\n\
             Categories=Utility;TextEditor;\n",
            exec = self.exec_line(),
        )
    }

    fn write_desktop_file(&self) -> Result<(), ShellError> {
        let path = self.desktop_file_path();
        let io_err = |source| ShellError::Io {
            path: path.clone(),
            source,
        };
        std::fs::create_dir_all(&self.applications_dir).map_err(io_err)?;
        std::fs::write(&path, self.desktop_entry()).map_err(io_err)
    }
}

impl ShellIntegration for XdgIntegration {
    fn register(&self) -> Result<(), ShellError> {
        let mut first_error = None;

        if let Err(e) = self.write_desktop_file() {
            tracing::warn!(error = %e, "could not write desktop entry");
            first_error.get_or_insert(e);
        }

        let mut args = vec!["default".to_string(), DESKTOP_FILE.to_string()];
        args.extend(MIME_TYPES.iter().map(|m| m.to_string()));
        if let Err(e) = run_checked(self.runner.as_ref(), "xdg-mime", &args) {
            tracing::warn!(error = %e, "xdg-mime default failed");
            first_error.get_or_insert(e);
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                tracing::info!(entry = %self.desktop_file_path().display(), "shell integration registered");
                Ok(())
            }
        }
    }

    fn unregister(&self) {
        let path = self.desktop_file_path();
        if let Err(e) = std::fs::remove_file(&path) {
            tracing::debug!(path = %path.display(), error = %e, "desktop entry not removed");
        }
        tracing::info!("shell integration removed");
    }

    fn is_registered(&self) -> bool {
        std::fs::read_to_string(self.desktop_file_path())
            .map(|entry| entry.lines().any(|l| l == self.exec_line()))
            .unwrap_or(false)
    }
}

/// Quotes a path for an `Exec=` key when it contains reserved characters.
fn quote_exec(path: &Path) -> String {
    let raw = path.display().to_string();
    if raw.chars().any(|c| c.is_whitespace() || "\"'\\$`".contains(c)) {
        let escaped: String = raw
            .chars()
            .flat_map(|c| match c {
                '"' | '`' | '$' | '\\' => vec!['\\', c],
                _ => vec![c],
            })
            .collect();
        format!("\"{escaped}\"")
    } else {
        raw
    }
}
