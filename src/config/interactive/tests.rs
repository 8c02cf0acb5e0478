use super::load_existing_config as load_existing_config_impl;
use super::*;
use tempfile::TempDir;

#[test]
fn load_existing_config() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = load_existing_config_impl(temp_dir.path());
    assert_eq!(config.base_dir, temp_dir.path());
    assert!(!config.ollama.host.is_empty());
    assert!(config.ollama.port > 0);
    assert!(!config.ollama.embedding_model.is_empty());
    assert!(config.ollama.batch_size > 0);
}

#[test]
fn unusable_config_falls_back_to_defaults() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    std::fs::write(temp_dir.path().join("config.toml"), "[ollama\n")
        .expect("should write config file");

    let config = load_existing_config_impl(temp_dir.path());
    assert_eq!(config.ollama, OllamaConfig::default());
    assert_eq!(config.base_dir, temp_dir.path());
}

#[test]
fn model_names_must_not_be_blank() {
    assert!(non_empty("all-minilm").is_ok());
    assert!(non_empty("   ").is_err());
}

#[test]
fn unreachable_ollama_reports_false() {
    let config = OllamaConfig {
        host: "127.0.0.1".to_string(),
        port: 1,
        ..OllamaConfig::default()
    };
    assert!(!test_ollama_connection(&config));
}
