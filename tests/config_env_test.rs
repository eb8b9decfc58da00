use splice_papers::Settings;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_layered_config() {
    let temp_dir = TempDir::new().unwrap();
    let original_dir = env::current_dir().unwrap();
    env::set_current_dir(&temp_dir).unwrap();

    let config_dir = temp_dir.path().join(".splice");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("settings.toml"),
        r#"
[paths]
db_path = "from-file"

[store]
search_limit = 8
example_results = 4
"#,
    )
    .unwrap();

    // Double underscore separates nested levels
    unsafe {
        env::set_var("SPLICE_STORE__SEARCH_LIMIT", "12");
        env::set_var("SPLICE_LOGGING__DEFAULT", "debug");
    }

    let settings = Settings::load().unwrap();

    unsafe {
        env::remove_var("SPLICE_STORE__SEARCH_LIMIT");
        env::remove_var("SPLICE_LOGGING__DEFAULT");
    }
    env::set_current_dir(original_dir).unwrap();

    // Environment overrides file
    assert_eq!(settings.store.search_limit, 12);
    assert_eq!(settings.logging.default, "debug");
    // File overrides defaults
    assert_eq!(settings.paths.db_path, PathBuf::from("from-file"));
    assert_eq!(settings.store.example_results, 4);
    // Defaults fill the rest
    assert_eq!(settings.paths.papers_dir, PathBuf::from("data/papers"));
}
