// Configuration management module
// TOML settings stored in the data directory, plus the interactive setup

pub mod interactive;
pub mod settings;


pub use interactive::{run_interactive_config, show_config};
pub use settings::{Config, ConfigError, DATA_DIR_ENV, OllamaConfig, RetrievalConfig};

/// Resolve the data directory, honoring an explicit override first
#[inline]
pub fn resolve_base_dir(
    override_dir: Option<std::path::PathBuf>,
) -> Result<std::path::PathBuf, ConfigError> {
    override_dir.map_or_else(Config::default_base_dir, Ok)
}
