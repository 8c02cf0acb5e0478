use super::*;
use serial_test::serial;
use tempfile::TempDir;

#[test]
fn default_config() {
    let config = Config::default();
    assert_eq!(config.ollama.protocol, "http");
    assert_eq!(config.ollama.host, "localhost");
    assert_eq!(config.ollama.port, 11434);
    assert_eq!(config.ollama.embedding_model, "all-minilm:latest");
    assert_eq!(config.ollama.embedding_dimension, 384);
    assert_eq!(config.ollama.generation_model, "llama3.2:latest");
    assert_eq!(config.ollama.batch_size, 16);
    assert_eq!(config.chunking.chunk_size, 512);
    assert_eq!(config.chunking.chunk_overlap, 50);
    assert_eq!(config.retrieval.default_top_k, 5);
    assert_eq!(config.retrieval.max_top_k, 10);
}

#[test]
fn config_validation() {
    let config = Config::default();
    assert!(config.validate().is_ok());

    let mut invalid_config = config.clone();
    invalid_config.ollama.protocol = "ftp".to_string();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.ollama.port = 0;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.ollama.embedding_model = String::new();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.ollama.generation_model = "  ".to_string();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.ollama.batch_size = 0;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.ollama.batch_size = 1001;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.ollama.embedding_dimension = 32;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.ollama.temperature = 2.5;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config;
    invalid_config.ollama.temperature = f32::NAN;
    assert!(invalid_config.validate().is_err());
}

#[test]
fn chunking_validation() {
    let mut config = Config::default();

    config.chunking.chunk_size = 0;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidChunkSize(0))
    ));

    config.chunking.chunk_size = 100;
    config.chunking.chunk_overlap = 100;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidChunkOverlap(100, 100))
    ));

    config.chunking.chunk_overlap = 99;
    assert!(config.validate().is_ok());
}

#[test]
fn retrieval_validation() {
    let mut config = Config::default();

    config.retrieval.max_top_k = 0;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidMaxTopK(0))
    ));

    config.retrieval.max_top_k = 10;
    config.retrieval.default_top_k = 11;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidDefaultTopK(11, 10))
    ));

    config.retrieval.default_top_k = 0;
    assert!(config.validate().is_err());

    config.retrieval.default_top_k = 10;
    assert!(config.validate().is_ok());
}

#[test]
fn ollama_url_generation() {
    let config = Config::default();
    let url = config
        .ollama_url()
        .expect("should generate ollama_url successfully");
    assert_eq!(url.as_str(), "http://localhost:11434/");
}

#[test]
fn https_url_generation() {
    let mut config = Config::default();
    config.ollama.protocol = "https".to_string();
    config.ollama.host = "secure.example.com".to_string();
    config.ollama.port = 443;

    let url = config
        .ollama_url()
        .expect("should generate https url successfully");
    assert_eq!(url.as_str(), "https://secure.example.com/");
}

#[test]
fn toml_serialization() {
    let config = Config::default();
    let toml_str = toml::to_string(&config).expect("should serialize toml correctly");
    let parsed_config: Config = toml::from_str(&toml_str).expect("should parse toml correctly");
    assert_eq!(config, parsed_config);
}

#[test]
fn partial_toml_uses_defaults() {
    let partial_toml = r#"
        [ollama]
        host = "custom-host"

        [retrieval]
        max_top_k = 20
    "#;

    let config: Config = toml::from_str(partial_toml).expect("should parse partial toml");
    assert_eq!(config.ollama.host, "custom-host");
    assert_eq!(config.ollama.port, 11434);
    assert_eq!(config.retrieval.max_top_k, 20);
    assert_eq!(config.retrieval.default_top_k, 5);
    assert_eq!(config.chunking, ChunkingConfig::default());
}

#[test]
fn invalid_toml_handling() {
    let invalid_toml = r#"
        [ollama
        host = "localhost"
        port = "invalid_port"
    "#;

    let result: Result<Config, toml::de::Error> = toml::from_str(invalid_toml);
    assert!(result.is_err());
}

#[test]
fn setter_validation() {
    let mut config = OllamaConfig::default();

    assert!(config.set_protocol("https".to_string()).is_ok());
    assert!(config.set_host("example.com".to_string()).is_ok());
    assert!(config.set_port(8080).is_ok());
    assert!(config.set_embedding_model("nomic-embed-text".to_string()).is_ok());
    assert!(config.set_generation_model("mistral".to_string()).is_ok());
    assert!(config.set_batch_size(128).is_ok());
    assert!(config.set_embedding_dimension(768).is_ok());
    assert!(config.set_temperature(0.0).is_ok());

    assert!(config.set_protocol("ftp".to_string()).is_err());
    assert!(config.set_protocol("HTTP".to_string()).is_err());
    assert!(config.set_port(0).is_err());
    assert!(config.set_embedding_model(String::new()).is_err());
    assert!(config.set_generation_model(String::new()).is_err());
    assert!(config.set_batch_size(0).is_err());
    assert!(config.set_batch_size(1001).is_err());
    assert!(config.set_embedding_dimension(8).is_err());
    assert!(config.set_temperature(-0.1).is_err());

    assert_eq!(config.protocol, "https");
    assert_eq!(config.port, 8080);
    assert_eq!(config.embedding_dimension, 768);
}

#[test]
fn load_missing_config() {
    let temp_dir = TempDir::new().expect("should create temp dir");

    let config = Config::load(temp_dir.path()).expect("should load default config");
    assert_eq!(config.base_dir, temp_dir.path());
    assert_eq!(config.ollama, OllamaConfig::default());
    assert_eq!(config.store_path(), temp_dir.path().join("store"));
}

#[test]
fn save_and_load_round_trip() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let base_dir = temp_dir.path().join("data");

    let mut config = Config::load(&base_dir).expect("should load default config");
    config.ollama.host = "ollama.internal".to_string();
    config.chunking.chunk_size = 256;
    config.chunking.chunk_overlap = 32;
    config.save().expect("should save config");

    assert!(config.config_file_path().exists());

    let loaded = Config::load(&base_dir).expect("should load saved config");
    assert_eq!(loaded, config);
}

#[test]
fn load_rejects_invalid_values() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    fs::write(
        temp_dir.path().join("config.toml"),
        "[chunking]\nchunk_size = 10\nchunk_overlap = 20\n",
    )
    .expect("should write config file");

    assert!(Config::load(temp_dir.path()).is_err());
}

#[test]
fn save_rejects_invalid_config() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut config = Config::load(temp_dir.path()).expect("should load default config");
    config.ollama.batch_size = 0;

    assert!(config.save().is_err());
    assert!(!config.config_file_path().exists());
}

#[test]
#[serial]
fn base_dir_from_environment() {
    let temp_dir = TempDir::new().expect("should create temp dir");

    // SAFETY: serialized with the other tests that touch the environment
    unsafe { std::env::set_var(DATA_DIR_ENV, temp_dir.path()) };
    let resolved = Config::default_base_dir();
    // SAFETY: as above
    unsafe { std::env::remove_var(DATA_DIR_ENV) };

    assert_eq!(
        resolved.expect("should resolve base dir"),
        temp_dir.path().to_path_buf()
    );
}
