use markdown_neuraxis_incremental::{
    IncrementalParser, MarkdownParser, ParserConfiguration, RenderConfiguration,
    ReparseThresholds, SourcePreservingRenderer,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable that points at an alternative config file.
pub const CONFIG_PATH_ENV: &str = "MARKDOWN_NEURAXIS_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

/// Settings for parsing, incremental re-parsing and rendering. Every section is optional
/// in the file and falls back to its defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub parser: ParserConfiguration,
    pub incremental: ReparseThresholds,
    pub render: RenderConfiguration,
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    /// `$MARKDOWN_NEURAXIS_CONFIG` when set, otherwise `~/.config/markdown-neuraxis/config.toml`.
    pub fn config_path() -> PathBuf {
        Self::resolve_config_path(std::env::var(CONFIG_PATH_ENV).ok().as_deref())
    }

    fn resolve_config_path(override_path: Option<&str>) -> PathBuf {
        match override_path.filter(|p| !p.trim().is_empty()) {
            Some(path) => Self::expand_path(Path::new(path)).unwrap_or_else(|| PathBuf::from(path)),
            None => {
                let config_dir = shellexpand::tilde("~/.config/markdown-neuraxis");
                PathBuf::from(config_dir.as_ref()).join("config.toml")
            }
        }
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }

    /// An incremental parser configured from the `[parser]` and `[incremental]` sections.
    pub fn incremental_parser(&self) -> IncrementalParser {
        IncrementalParser::new(MarkdownParser::new(self.parser), self.incremental)
    }

    pub fn renderer(&self) -> SourcePreservingRenderer {
        SourcePreservingRenderer::new(self.render.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_config_path() {
        let config_path = Config::resolve_config_path(None);
        let path_str = config_path.to_string_lossy();

        // Should not contain tilde anymore
        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/markdown-neuraxis/config.toml"));
    }

    #[test]
    fn test_config_path_override() {
        assert_eq!(
            Config::resolve_config_path(Some("/etc/neuraxis.toml")),
            PathBuf::from("/etc/neuraxis.toml")
        );
        assert!(
            Config::resolve_config_path(Some("  "))
                .to_string_lossy()
                .ends_with("config.toml")
        );
    }

    #[test]
    fn test_config_path_override_with_env_var() {
        unsafe {
            env::set_var("NEURAXIS_TEST_CONFIG_DIR", "/test/env/path");
        }

        let path = Config::resolve_config_path(Some("$NEURAXIS_TEST_CONFIG_DIR/config.toml"));
        assert_eq!(path, PathBuf::from("/test/env/path/config.toml"));

        unsafe {
            env::remove_var("NEURAXIS_TEST_CONFIG_DIR");
        }
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let expanded = Config::expand_path(Path::new("~/test/path")).unwrap();
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.to_string_lossy().contains("test/path"));
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config_content = r##"
[parser]
tables = false

[incremental]
min_document_len = 0

[render]
source_mode = true

[render.theme]
link = "#ff0000"
"##;

        let config: Config = toml::from_str(config_content).unwrap();
        assert!(!config.parser.tables);
        assert!(config.parser.strikethrough);
        assert_eq!(config.incremental.min_document_len, 0);
        assert_eq!(config.incremental.max_edit_len, 1000);
        assert!(config.render.source_mode);
        assert_eq!(config.render.theme.link.as_str(), "#ff0000");
        assert_eq!(config.render.theme.muted, RenderConfiguration::default().theme.muted);
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let mut original = Config::default();
        original.parser.math = false;
        original.render.heading_scale_percent = [180, 150, 120, 110, 100, 100];

        let toml_str = toml::to_string(&original).unwrap();
        let deserialized: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(original, deserialized);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        let result = Config::load_from_path(&non_existent_config).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_load_invalid_config_reports_path() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "[parser\ntables = ").unwrap();

        let err = Config::load_from_path(&config_file).unwrap_err();
        assert!(matches!(err, ConfigError::ConfigParseError { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested").join("config.toml");
        let mut test_config = Config::default();
        test_config.render.source_mode = true;
        test_config.incremental = ReparseThresholds {
            max_edit_len: 50,
            min_document_len: 0,
        };

        test_config.save_to_path(&config_file).unwrap();
        let loaded_config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded_config, test_config);
    }

    #[test]
    fn test_builds_configured_components() {
        let mut config = Config::default();
        config.parser = ParserConfiguration::commonmark();
        config.render.source_mode = true;

        let parser = config.incremental_parser();
        assert_eq!(parser.parser().config(), &ParserConfiguration::commonmark());
        assert!(config.renderer().config().source_mode);
    }
}
