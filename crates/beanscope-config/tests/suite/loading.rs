use beanscope_config::{
    discover_config_path, init_tracing, load_for_workspace, with_config_env_lock,
    BeanscopeConfig, ConfigError, LoggingConfig, BEANSCOPE_CONFIG_ENV_VAR,
};
use pretty_assertions::assert_eq;

#[test]
fn loads_model_and_logging_sections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("beanscope.toml");
    std::fs::write(
        &path,
        r#"
[model]
allow_auto_configuration = false
auto_configure_order_default = 10

[logging]
level = "debug"
json = true
"#,
    )
    .unwrap();

    let config = BeanscopeConfig::load_from_path(&path).unwrap();
    assert!(!config.model.allow_auto_configuration);
    assert!(config.model.exclude_test_sources);
    assert_eq!(config.model.auto_configure_order_default, 10);
    assert_eq!(config.logging.level, "debug");
    assert!(config.logging.json);
}

#[test]
fn unknown_keys_are_reported_not_fatal() {
    let (config, diagnostics) = BeanscopeConfig::load_from_str_with_diagnostics(
        r#"
[model]
allow_autoconfig = false

[extra]
value = 1
"#,
    )
    .unwrap();

    assert!(config.model.allow_auto_configuration);
    assert_eq!(
        diagnostics.unknown_keys,
        vec!["extra".to_string(), "model.allow_autoconfig".to_string()]
    );
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = BeanscopeConfig::load_from_path(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn discovery_prefers_root_file_then_dot_directory() {
    with_config_env_lock(|| {
        std::env::remove_var(BEANSCOPE_CONFIG_ENV_VAR);

        let dir = tempfile::tempdir().unwrap();
        assert_eq!(discover_config_path(dir.path()), None);

        let nested = dir.path().join(".beanscope");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("config.toml"), "").unwrap();
        let found = discover_config_path(dir.path()).unwrap();
        assert!(found.ends_with(".beanscope/config.toml"));

        std::fs::write(dir.path().join("beanscope.toml"), "").unwrap();
        let found = discover_config_path(dir.path()).unwrap();
        assert!(found.ends_with("beanscope.toml"));
    });
}

#[test]
fn env_var_overrides_discovery() {
    with_config_env_lock(|| {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("beanscope.toml"), "").unwrap();
        std::fs::write(
            dir.path().join("custom.toml"),
            "[model]\nexclude_test_sources = false\n",
        )
        .unwrap();

        std::env::set_var(BEANSCOPE_CONFIG_ENV_VAR, "custom.toml");
        let result = load_for_workspace(dir.path());
        std::env::remove_var(BEANSCOPE_CONFIG_ENV_VAR);

        let (config, path) = result.unwrap();
        assert!(path.unwrap().ends_with("custom.toml"));
        assert!(!config.model.exclude_test_sources);
    });
}

#[test]
fn workspace_without_config_uses_defaults() {
    with_config_env_lock(|| {
        std::env::remove_var(BEANSCOPE_CONFIG_ENV_VAR);
        let dir = tempfile::tempdir().unwrap();
        let (config, path) = load_for_workspace(dir.path()).unwrap();
        assert_eq!(path, None);
        assert_eq!(config, BeanscopeConfig::default());
    });
}

#[test]
fn init_tracing_installs_once_and_writes_to_the_log_file() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("beanscope.log");
    let config = LoggingConfig {
        level: "warn".to_owned(),
        stderr: false,
        file: Some(log.clone()),
        ..Default::default()
    };

    let installed = init_tracing(&config);
    assert!(!init_tracing(&config), "second initialization must be a no-op");

    if installed {
        tracing::warn!(target: "beanscope.config", "logging smoke test");
        let written = std::fs::read_to_string(&log).unwrap();
        assert!(written.contains("logging smoke test"), "log file: {written}");
    }
}
