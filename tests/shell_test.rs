use std::path::Path;

use mdnote::shell::{
    RecordingRunner, RegistryIntegration, ShellBackend, ShellError, ShellIntegration,
    XdgIntegration,
};
use tempfile::TempDir;

const WIN_EXE: &str = r"C:\Program Files\mdnote\mdnote.exe";

fn registry(runner: &RecordingRunner) -> RegistryIntegration {
    RegistryIntegration::new(Path::new(WIN_EXE), Box::new(runner.clone()))
}

// ─── Registry ────────────────────────────────────────────────────────────

#[test]
fn registry_failure_still_attempts_every_step() {
    let runner = RecordingRunner::new();
    runner.fail_matching("DefaultIcon");
    runner.fail_matching("net session");

    let err = registry(&runner).register().unwrap_err();
    assert!(matches!(err, ShellError::CommandFailed { .. }));

    let adds = runner
        .command_lines()
        .into_iter()
        .filter(|l| l.starts_with("reg add"))
        .count();
    assert_eq!(adds, 7);
}

#[test]
fn registry_associates_md_and_adds_folder_action() {
    let runner = RecordingRunner::new();
    registry(&runner).register().unwrap();

    let lines = runner.command_lines().join("\n");
    assert!(lines.contains(r"HKCU\Software\Classes\.md\OpenWithProgids"));
    assert!(lines.contains(&format!("\"{WIN_EXE}\" \"%1\"")));
    assert!(lines.contains(&format!("\"{WIN_EXE}\" --new \"%V\"")));
    assert!(!lines.contains("HKLM"));
}

#[test]
fn registry_unregister_ignores_missing_keys() {
    let runner = RecordingRunner::new();
    runner.fail_matching("reg delete");
    runner.fail_matching("net session");
    registry(&runner).unregister();

    let deletes = runner
        .command_lines()
        .into_iter()
        .filter(|l| l.starts_with("reg delete"))
        .count();
    assert_eq!(deletes, 3);
}

#[test]
fn registry_detects_existing_registration_for_this_exe() {
    let runner = RecordingRunner::new();
    runner.stub_output("reg query", &format!("    (Default)    REG_SZ    \"{WIN_EXE}\" \"%1\""));
    assert!(registry(&runner).is_registered());

    let stale = RecordingRunner::new();
    stale.stub_output("reg query", r#"    (Default)    REG_SZ    "C:\old\mdnote.exe" "%1""#);
    assert!(!registry(&stale).is_registered());
}

// ─── XDG ─────────────────────────────────────────────────────────────────

#[test]
fn xdg_round_trip() {
    let dir = TempDir::new().unwrap();
    let runner = RecordingRunner::new();
    let xdg = XdgIntegration::new(
        Path::new("/usr/local/bin/mdnote"),
        dir.path().to_path_buf(),
        Box::new(runner.clone()),
    );

    xdg.register().unwrap();
    assert!(xdg.is_registered());
    assert!(xdg.desktop_file_path().starts_with(dir.path().join("applications")));
    assert_eq!(
        runner.command_lines(),
        vec!["xdg-mime default mdnote.desktop text/markdown text/x-markdown".to_string()]
    );

    xdg.unregister();
    assert!(!xdg.is_registered());
    // Second removal finds nothing and stays quiet.
    xdg.unregister();
}

#[test]
fn xdg_reports_mime_failure_but_keeps_entry() {
    let dir = TempDir::new().unwrap();
    let runner = RecordingRunner::new();
    runner.fail_matching("xdg-mime");
    let xdg = XdgIntegration::new(
        Path::new("/usr/local/bin/mdnote"),
        dir.path().to_path_buf(),
        Box::new(runner),
    );

    assert!(xdg.register().is_err());
    assert!(xdg.desktop_file_path().exists());
}

// ─── Backend selection ───────────────────────────────────────────────────

#[test]
fn default_backend_matches_host() {
    let backend = ShellBackend::default();
    assert!(backend.check_host().is_ok() || cfg!(target_os = "macos"));
    if cfg!(windows) {
        assert_eq!(backend, ShellBackend::Registry);
    } else {
        assert_eq!(backend, ShellBackend::Xdg);
        assert!(matches!(
            ShellBackend::Registry.check_host(),
            Err(ShellError::Unsupported("registry"))
        ));
    }
}
