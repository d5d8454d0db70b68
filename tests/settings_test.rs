use mdnote::settings::{
    ConfigService, JsonConfigService, SettingKey, SettingValue, Settings, SettingsStore, ThemeId,
};
use tempfile::TempDir;

fn service(dir: &TempDir) -> JsonConfigService {
    JsonConfigService::new(dir.path().join("mdnote").join("settings.json"))
}

#[test]
fn missing_file_loads_defaults() {
    let dir = TempDir::new().unwrap();
    assert_eq!(service(&dir).load().unwrap(), Settings::default());
}

#[test]
fn mutation_is_visible_to_a_fresh_service() {
    let dir = TempDir::new().unwrap();
    let mut store = SettingsStore::load(Box::new(service(&dir)));
    store.set_theme(ThemeId::Light).unwrap();
    store.set_autosave_delay_ms(2500).unwrap();
    store.set_sync_scroll(false).unwrap();

    let reloaded = service(&dir).load().unwrap();
    assert_eq!(reloaded.theme, ThemeId::Light);
    assert_eq!(reloaded.autosave_delay_ms, 2500);
    assert!(!reloaded.sync_scroll);
}

#[test]
fn unknown_and_missing_keys_fall_back_per_key() {
    let dir = TempDir::new().unwrap();
    let svc = service(&dir);
    std::fs::create_dir_all(svc.path().parent().unwrap()).unwrap();
    std::fs::write(svc.path(), r#"{ "tab_size": 4, "shiny_new_option": true }"#).unwrap();

    let loaded = svc.load().unwrap();
    assert_eq!(loaded.tab_size, 4);
    assert_eq!(loaded.theme, Settings::default().theme);
    assert_eq!(loaded.font_family, Settings::default().font_family);
}

#[test]
fn malformed_file_makes_store_use_defaults() {
    let dir = TempDir::new().unwrap();
    let svc = service(&dir);
    std::fs::create_dir_all(svc.path().parent().unwrap()).unwrap();
    std::fs::write(svc.path(), "{ not json").unwrap();

    assert!(svc.load().is_err());
    let store = SettingsStore::load(Box::new(svc));
    assert_eq!(*store.settings(), Settings::default());
}

#[test]
fn out_of_range_values_are_clamped_on_load() {
    let dir = TempDir::new().unwrap();
    let svc = service(&dir);
    std::fs::create_dir_all(svc.path().parent().unwrap()).unwrap();
    std::fs::write(svc.path(), r#"{ "font_size": 500, "autosave_delay_ms": 1 }"#).unwrap();

    let loaded = svc.load().unwrap();
    assert!(loaded.font_size <= 48);
    assert!(loaded.autosave_delay_ms >= 200);
}

#[test]
fn single_key_get_and_set_go_through_the_file() {
    let dir = TempDir::new().unwrap();
    let svc = service(&dir);
    svc.set(SettingKey::TabSize, SettingValue::Number(6)).unwrap();
    assert_eq!(svc.get(SettingKey::TabSize).unwrap(), SettingValue::Number(6));
}

#[test]
fn reset_writes_defaults() {
    let dir = TempDir::new().unwrap();
    let mut store = SettingsStore::load(Box::new(service(&dir)));
    store.set_font_size(20).unwrap();
    store.reset_to_defaults().unwrap();

    assert_eq!(*store.settings(), Settings::default());
    assert_eq!(service(&dir).load().unwrap(), Settings::default());
}

#[test]
fn file_is_a_flat_json_object() {
    let dir = TempDir::new().unwrap();
    let svc = service(&dir);
    svc.save(&Settings::default()).unwrap();

    let raw = std::fs::read_to_string(svc.path()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let object = value.as_object().unwrap();
    for key in SettingKey::ALL {
        assert!(object.contains_key(key.name()), "missing {}", key.name());
    }
    assert_eq!(object["theme"], "dark");
}

#[test]
fn one_bad_value_keeps_the_other_preferences() {
    let dir = TempDir::new().unwrap();
    let svc = service(&dir);
    std::fs::create_dir_all(svc.path().parent().unwrap()).unwrap();
    std::fs::write(svc.path(), r#"{"theme":"light","sync_scroll":false,"tab_size":300}"#).unwrap();

    let mut store = SettingsStore::load(Box::new(svc));
    assert_eq!(store.settings().theme, ThemeId::Light);
    assert!(!store.settings().sync_scroll);
    assert_eq!(store.settings().tab_size, 8);

    // The next write keeps what the user chose.
    store.set_font_size(16).unwrap();
    let reloaded = service(&dir).load().unwrap();
    assert_eq!(reloaded.theme, ThemeId::Light);
    assert!(!reloaded.sync_scroll);
    assert_eq!(reloaded.font_size, 16);
}

#[test]
fn unknown_theme_falls_back_alone() {
    let dir = TempDir::new().unwrap();
    let svc = service(&dir);
    std::fs::create_dir_all(svc.path().parent().unwrap()).unwrap();
    std::fs::write(svc.path(), r#"{"theme":"neon","autosave_delay_ms":5000}"#).unwrap();

    let loaded = svc.load().unwrap();
    assert_eq!(loaded.theme, ThemeId::Dark);
    assert_eq!(loaded.autosave_delay_ms, 5000);
}
