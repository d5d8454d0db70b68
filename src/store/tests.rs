use super::*;
use crate::fs::MemoryFileSystem;

const DELAY: Duration = Duration::from_millis(1000);

fn store_with(fs: &MemoryFileSystem) -> FileStore {
    let mut store = FileStore::new(Box::new(fs.clone()));
    store.set_autosave(AutosavePolicy {
        enabled: true,
        delay: DELAY,
    });
    store
}

fn opened(path: &str, content: &str) -> (FileStore, MemoryFileSystem) {
    let fs = MemoryFileSystem::new();
    fs.insert(path, content);
    let mut store = store_with(&fs);
    store.open_file(Path::new(path)).unwrap();
    (store, fs)
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

// ─── Open ────────────────────────────────────────────────────────────────────

#[test]
fn open_sets_document_and_saved_status() {
    let (store, _fs) = opened("/notes/a.md", "# Title\n");
    assert_eq!(store.content(), "# Title\n");
    assert_eq!(store.path(), Some(Path::new("/notes/a.md")));
    assert_eq!(store.status(), SaveStatus::Saved);
    assert!(!store.has_unsaved_changes());
    assert_eq!(store.metadata().map(|m| m.name.as_str()), Some("a.md"));
}

#[test]
fn open_missing_file_keeps_previous_document() {
    let (mut store, _fs) = opened("/notes/a.md", "keep me");
    let err = store.open_file(Path::new("/notes/missing.md")).unwrap_err();
    assert!(matches!(err, FsError::NotFound(_)));
    assert_eq!(store.status(), SaveStatus::Error);
    assert!(store.error_message().unwrap().contains("missing.md"));
    assert_eq!(store.content(), "keep me");
    assert_eq!(store.path(), Some(Path::new("/notes/a.md")));
}

#[test]
fn open_dialog_cancel_changes_nothing() {
    let (mut store, _fs) = opened("/notes/a.md", "x");
    assert_eq!(store.open_with_dialog().unwrap(), OpenOutcome::Cancelled);
    assert_eq!(store.content(), "x");
    assert_eq!(store.status(), SaveStatus::Saved);
}

#[test]
fn open_dialog_opens_chosen_file() {
    let (mut store, fs) = opened("/notes/a.md", "x");
    fs.insert("/notes/b.md", "bee");
    fs.answer_open(Some(PathBuf::from("/notes/b.md")));
    assert_eq!(
        store.open_with_dialog().unwrap(),
        OpenOutcome::Opened(PathBuf::from("/notes/b.md"))
    );
    assert_eq!(store.content(), "bee");
}

#[test]
fn readonly_file_is_flagged() {
    let fs = MemoryFileSystem::new();
    fs.insert("/ro.md", "locked");
    fs.set_readonly(Path::new("/ro.md"), true);
    let mut store = store_with(&fs);
    store.open_file(Path::new("/ro.md")).unwrap();
    assert!(store.is_readonly());
}

// ─── Editing and status ──────────────────────────────────────────────────────

#[test]
fn edit_marks_unsaved_and_restoring_marks_saved() {
    let (mut store, _fs) = opened("/a.md", "abc");
    let t0 = Instant::now();
    store.update_content("abcd".into(), t0);
    assert_eq!(store.status(), SaveStatus::Unsaved);
    assert!(store.autosave_pending());

    store.update_content("abc".into(), t0 + ms(10));
    assert_eq!(store.status(), SaveStatus::Saved);
    assert!(!store.autosave_pending());
}

#[test]
fn identical_update_does_not_rearm() {
    let (mut store, fs) = opened("/a.md", "abc");
    let t0 = Instant::now();
    store.update_content("abcd".into(), t0);
    store.update_content("abcd".into(), t0 + ms(900));
    assert!(store.poll_autosave(t0 + DELAY).is_some());
    assert_eq!(fs.writes().len(), 1);
}

// ─── Autosave ────────────────────────────────────────────────────────────────

#[test]
fn burst_of_edits_autosaves_once_with_last_content() {
    let (mut store, fs) = opened("/a.md", "");
    let t0 = Instant::now();
    for (i, text) in ["h", "he", "hel", "hell", "hello"].iter().enumerate() {
        store.update_content(text.to_string(), t0 + ms(100 * i as u64));
        assert!(store.poll_autosave(t0 + ms(100 * i as u64 + 50)).is_none());
    }
    // Last edit at 400ms; deadline at 1400ms.
    assert!(store.poll_autosave(t0 + ms(1399)).is_none());
    let result = store.poll_autosave(t0 + ms(1400)).unwrap();
    assert_eq!(result.unwrap(), SaveOutcome::Saved(PathBuf::from("/a.md")));

    assert_eq!(fs.writes(), vec![(PathBuf::from("/a.md"), "hello".to_string())]);
    assert_eq!(store.status(), SaveStatus::Saved);
    assert!(store.last_saved_at().is_some());
    assert!(store.poll_autosave(t0 + ms(5000)).is_none());
}

#[test]
fn untitled_document_is_never_autosaved() {
    let fs = MemoryFileSystem::new();
    let mut store = store_with(&fs);
    let t0 = Instant::now();
    store.update_content("draft".into(), t0);
    assert_eq!(store.status(), SaveStatus::Unsaved);
    assert!(!store.autosave_pending());
    assert!(store.poll_autosave(t0 + ms(60_000)).is_none());
    assert!(fs.writes().is_empty());
    assert!(fs.save_prompts().is_empty());
}

#[test]
fn disabled_autosave_never_writes() {
    let (mut store, fs) = opened("/a.md", "");
    store.set_autosave(AutosavePolicy {
        enabled: false,
        delay: DELAY,
    });
    let t0 = Instant::now();
    store.update_content("text".into(), t0);
    assert!(store.poll_autosave(t0 + ms(10_000)).is_none());
    assert!(fs.writes().is_empty());
    assert_eq!(store.status(), SaveStatus::Unsaved);
}

#[test]
fn disabling_autosave_drops_pending_save() {
    let (mut store, fs) = opened("/a.md", "");
    let t0 = Instant::now();
    store.update_content("text".into(), t0);
    store.set_autosave(AutosavePolicy {
        enabled: false,
        delay: DELAY,
    });
    assert!(store.poll_autosave(t0 + DELAY).is_none());
    assert!(fs.writes().is_empty());
}

#[test]
fn manual_save_disarms_pending_autosave() {
    let (mut store, fs) = opened("/a.md", "");
    let t0 = Instant::now();
    store.update_content("typed".into(), t0);
    store.save_file(None).unwrap();
    assert!(store.poll_autosave(t0 + DELAY * 2).is_none());
    assert_eq!(fs.writes().len(), 1);
}

// ─── Save ────────────────────────────────────────────────────────────────────

#[test]
fn save_round_trip_is_byte_identical() {
    let original = "# Notes\r\n\r\n- one\r\n- two\r\n\u{1F600} tail without newline";
    let (mut store, fs) = opened("/rt.md", original);
    store.save_file(None).unwrap();
    assert_eq!(fs.contents(Path::new("/rt.md")).unwrap(), original);
}

#[test]
fn hello_scenario() {
    let fs = MemoryFileSystem::new();
    fs.insert("/hello.md", "");
    let mut store = store_with(&fs);
    store.open_file(Path::new("/hello.md")).unwrap();

    let t0 = Instant::now();
    store.update_content("hello".into(), t0);
    assert_eq!(store.status(), SaveStatus::Unsaved);

    store.poll_autosave(t0 + DELAY).unwrap().unwrap();
    assert_eq!(fs.contents(Path::new("/hello.md")).as_deref(), Some("hello"));
    assert_eq!(store.status(), SaveStatus::Saved);
    assert!(!store.has_unsaved_changes());
}

#[test]
fn save_untitled_goes_through_dialog() {
    let fs = MemoryFileSystem::new();
    let mut store = store_with(&fs);
    store.update_content("new text".into(), Instant::now());
    fs.answer_save(Some(PathBuf::from("/picked.md")));

    let outcome = store.save_file(None).unwrap();
    assert_eq!(outcome, SaveOutcome::Saved(PathBuf::from("/picked.md")));
    assert_eq!(fs.save_prompts(), vec![UNTITLED_NAME.to_string()]);
    assert_eq!(store.path(), Some(Path::new("/picked.md")));
    assert_eq!(store.status(), SaveStatus::Saved);
}

#[test]
fn cancelled_save_as_leaves_state_alone() {
    let (mut store, fs) = opened("/a.md", "abc");
    store.update_content("abcd".into(), Instant::now());

    assert_eq!(store.save_file_as().unwrap(), SaveOutcome::Cancelled);
    assert_eq!(store.status(), SaveStatus::Unsaved);
    assert_eq!(store.path(), Some(Path::new("/a.md")));
    assert!(fs.writes().is_empty());
    assert_eq!(fs.save_prompts(), vec!["a.md".to_string()]);
}

#[test]
fn save_to_explicit_target_adopts_it() {
    let (mut store, fs) = opened("/a.md", "abc");
    store.save_file(Some(Path::new("/copy.md"))).unwrap();
    assert_eq!(store.path(), Some(Path::new("/copy.md")));
    assert_eq!(fs.contents(Path::new("/copy.md")).as_deref(), Some("abc"));
}

#[test]
fn failed_save_keeps_content_and_reports_error() {
    let (mut store, fs) = opened("/a.md", "abc");
    store.update_content("abcdef".into(), Instant::now());
    fs.fail_writes(true);

    assert!(store.save_file(None).is_err());
    assert_eq!(store.status(), SaveStatus::Error);
    assert!(store.error_message().unwrap().contains("no space left"));
    assert_eq!(store.content(), "abcdef");
    assert!(store.has_unsaved_changes());
}

#[test]
fn error_turns_unsaved_on_next_edit_and_clears_on_success() {
    let (mut store, fs) = opened("/a.md", "abc");
    let t0 = Instant::now();
    store.update_content("abcd".into(), t0);
    fs.fail_writes(true);
    let _ = store.save_file(None);
    assert_eq!(store.status(), SaveStatus::Error);

    store.update_content("abcde".into(), t0 + ms(10));
    assert_eq!(store.status(), SaveStatus::Unsaved);

    fs.fail_writes(false);
    store.save_file(None).unwrap();
    assert_eq!(store.status(), SaveStatus::Saved);
    assert_eq!(store.error_message(), None);
}

#[test]
fn saving_readonly_file_is_permission_denied() {
    let fs = MemoryFileSystem::new();
    fs.insert("/ro.md", "x");
    fs.set_readonly(Path::new("/ro.md"), true);
    let mut store = store_with(&fs);
    store.open_file(Path::new("/ro.md")).unwrap();
    let err = store.save_file(None).unwrap_err();
    assert!(matches!(err, FsError::PermissionDenied(_)));
    assert_eq!(store.status(), SaveStatus::Error);
}

// ─── New documents ───────────────────────────────────────────────────────────

#[test]
fn create_new_file_resets_to_untitled() {
    let (mut store, _fs) = opened("/a.md", "abc");
    store.update_content("dirty".into(), Instant::now());
    store.create_new_file();
    assert_eq!(store.path(), None);
    assert_eq!(store.content(), "");
    assert_eq!(store.status(), SaveStatus::Saved);
    assert!(!store.autosave_pending());
    assert_eq!(store.display_name(), "Untitled");
}

#[test]
fn create_new_file_in_picks_unique_names() {
    let fs = MemoryFileSystem::new();
    let mut store = store_with(&fs);
    let dir = Path::new("/desk");

    assert_eq!(store.create_new_file_in(dir).unwrap(), dir.join("Untitled.md"));
    assert_eq!(store.create_new_file_in(dir).unwrap(), dir.join("Untitled 2.md"));
    assert_eq!(store.create_new_file_in(dir).unwrap(), dir.join("Untitled 3.md"));
    assert_eq!(fs.contents(&dir.join("Untitled 2.md")).as_deref(), Some(""));
    assert_eq!(store.status(), SaveStatus::Saved);
}

#[test]
fn new_file_in_directory_autosaves() {
    let fs = MemoryFileSystem::new();
    let mut store = store_with(&fs);
    let path = store.create_new_file_in(Path::new("/desk")).unwrap();
    let t0 = Instant::now();
    store.update_content("first line".into(), t0);
    store.poll_autosave(t0 + DELAY).unwrap().unwrap();
    assert_eq!(fs.contents(&path).as_deref(), Some("first line"));
}

#[test]
fn create_new_file_in_failure_is_reported() {
    let fs = MemoryFileSystem::new();
    fs.fail_writes(true);
    let mut store = store_with(&fs);
    assert!(store.create_new_file_in(Path::new("/desk")).is_err());
    assert_eq!(store.status(), SaveStatus::Error);
    assert_eq!(store.path(), None);
}

// ─── Reload ──────────────────────────────────────────────────────────────────

#[test]
fn reload_picks_up_external_change_when_clean() {
    let (mut store, fs) = opened("/a.md", "old");
    fs.insert("/a.md", "new from elsewhere");
    assert!(store.reload_from_disk().unwrap());
    assert_eq!(store.content(), "new from elsewhere");
}

#[test]
fn reload_skipped_when_dirty() {
    let (mut store, fs) = opened("/a.md", "old");
    store.update_content("mine".into(), Instant::now());
    fs.insert("/a.md", "theirs");
    assert!(!store.reload_from_disk().unwrap());
    assert_eq!(store.content(), "mine");
}

// ─── Paths typed without a dialog ────────────────────────────────────────

#[test]
fn typed_paths_resolve_against_base_dir() {
    let fs = MemoryFileSystem::new();
    fs.make_headless("/work");
    let store = store_with(&fs);
    assert!(!store.dialogs_available());
    assert_eq!(store.suggested_save_path(), PathBuf::from("/work/Untitled.md"));
    assert_eq!(store.resolve_path(" notes/b.md "), PathBuf::from("/work/notes/b.md"));
    assert_eq!(store.resolve_path("/abs/c.md"), PathBuf::from("/abs/c.md"));
}

#[test]
fn suggested_save_path_keeps_existing_path() {
    let (store, _fs) = opened("/notes/a.md", "x");
    assert_eq!(store.suggested_save_path(), PathBuf::from("/notes/a.md"));
}
