//! Configuration loading.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use ms_core::AnalysisConfig;

/// Loads configuration from default locations, optionally overlaying a
/// specific file.
///
/// Layers, lowest precedence first: built-in defaults, the platform config
/// file, `config_path`, then `MINDSYNC_*` environment variables. Nested keys
/// use `__`, e.g. `MINDSYNC_CAP__MAX_COUNT=2`.
#[expect(
    clippy::result_large_err,
    reason = "figment::Error is large but only returned at startup"
)]
pub fn load_config(config_path: Option<&Path>) -> Result<AnalysisConfig, figment::Error> {
    let mut figment = Figment::from(Serialized::defaults(AnalysisConfig::default()));

    if let Some(config_dir) = dirs_config_path() {
        figment = figment.merge(Toml::file(config_dir.join("config.toml")));
    }

    if let Some(path) = config_path {
        figment = figment.merge(Toml::file(path));
    }

    figment = figment.merge(Env::prefixed("MINDSYNC_").split("__"));

    figment.extract()
}

/// Returns the platform-specific config directory.
///
/// On Linux: `~/.config/mindsync`
pub fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("mindsync"))
}
