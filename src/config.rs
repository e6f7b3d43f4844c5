//! microqr runtime configuration handling

use crate::error::{ConfigError, Result};
use crate::qr::ErrorCorrection;
use crate::render::{DEFAULT_MAX_SCALE, OutputFormat};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level configuration structure persisted to disk.
///
/// Every group is `#[serde(default)]`, so a document only needs the keys it
/// wants to override; missing keys keep their built-in values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MicroQrConfig {
    /// Desktop form settings
    pub gui: GuiOptions,
    /// Default render parameters
    pub defaults: RenderDefaults,
    /// Filesystem locations
    pub paths: PathOptions,
    /// Look and feel
    pub ui: UiOptions,
    /// Logging configuration
    pub logging: LoggingOptions,
}

impl MicroQrConfig {
    /// Load configuration from an explicit path or fall back to discovered defaults.
    ///
    /// Logging is not yet installed at this point, so what happened during
    /// discovery is returned in [`LoadedConfig`] for the caller to report.
    pub fn load(explicit_path: Option<&Path>) -> Result<LoadedConfig> {
        let mut loaded = if let Some(path) = explicit_path {
            LoadedConfig {
                config: Self::from_file(path)?,
                source: Some(path.to_path_buf()),
                fallback: None,
            }
        } else if let Some(path) = Self::discover_file()? {
            match Self::from_file(&path) {
                Ok(config) => LoadedConfig {
                    config,
                    source: Some(path),
                    fallback: None,
                },
                Err(err) => LoadedConfig {
                    config: Self::default(),
                    source: Some(path),
                    fallback: Some(err.to_string()),
                },
            }
        } else {
            LoadedConfig {
                config: Self::default(),
                source: None,
                fallback: None,
            }
        };

        loaded.config.apply_env_overrides();
        Ok(loaded)
    }

    /// Attempt to locate a configuration file in common locations.
    fn discover_file() -> Result<Option<PathBuf>> {
        let cwd = env::current_dir()
            .map_err(|e| ConfigError::Invalid(format!("Failed to read cwd: {e}")))?;
        for candidate in ["microqr.toml", "microqr.yaml", "microqr.yml", "microqr.json"] {
            let path = cwd.join(candidate);
            if path.exists() {
                return Ok(Some(path));
            }
        }

        if let Some(xdg_config) = env::var_os("XDG_CONFIG_HOME") {
            let base = PathBuf::from(xdg_config).join("microqr");
            for candidate in ["config.toml", "config.yaml", "config.json"] {
                let path = base.join(candidate);
                if path.exists() {
                    return Ok(Some(path));
                }
            }
        }

        Ok(None)
    }

    /// Read configuration from a concrete file path.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            ConfigError::Invalid(format!("Failed to read {}: {e}", path.display()))
        })?;

        Self::parse(&contents, &extension(path)).map_err(|e| {
            ConfigError::Invalid(format!("Failed to parse {}: {e}", path.display())).into()
        })
    }

    fn parse(contents: &str, ext: &str) -> std::result::Result<Self, String> {
        match ext {
            "toml" => toml::from_str(contents).map_err(|e| e.to_string()),
            "yaml" | "yml" => serde_yaml::from_str(contents).map_err(|e| e.to_string()),
            "json" => serde_json::from_str(contents).map_err(|e| e.to_string()),
            other => Err(format!(
                "unsupported config format '{other}', expected toml/yaml/json"
            )),
        }
    }

    /// Write the configuration in the format implied by the file extension.
    pub fn save(&self, path: &Path) -> Result<()> {
        let rendered = match extension(path).as_str() {
            "toml" => toml::to_string_pretty(self).map_err(|e| e.to_string()),
            "yaml" | "yml" => serde_yaml::to_string(self).map_err(|e| e.to_string()),
            "json" => serde_json::to_string_pretty(self).map_err(|e| e.to_string()),
            other => Err(format!(
                "unsupported config format '{other}', expected toml/yaml/json"
            )),
        }
        .map_err(|e| ConfigError::Invalid(format!("Failed to serialise config: {e}")))?;

        if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, rendered)?;
        Ok(())
    }

    /// Apply environment variable overrides after file/default loading.
    fn apply_env_overrides(&mut self) {
        self.logging.apply_env_overrides();
        if let Ok(dir) = env::var("MICROQR_OUTPUT_DIR") {
            if !dir.trim().is_empty() {
                self.paths.output_directory = PathBuf::from(dir);
            }
        }
    }
}

/// Outcome of [`MicroQrConfig::load`]
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Effective configuration, env overrides applied
    pub config: MicroQrConfig,
    /// File the configuration came from, if any
    pub source: Option<PathBuf>,
    /// Why a discovered file was ignored in favour of the defaults
    pub fallback: Option<String>,
}

impl LoadedConfig {
    /// Report the load through `tracing`; call once logging is initialised.
    pub fn log(&self) {
        match (&self.source, &self.fallback) {
            (Some(_), Some(reason)) => {
                tracing::warn!("{reason}; falling back to built-in defaults");
            }
            (Some(path), None) => {
                tracing::info!("Using configuration file: {}", path.display());
            }
            (None, _) => {
                tracing::debug!("No microqr.{{toml,yaml,json}} found, using defaults");
            }
        }
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

/// Desktop form settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuiOptions {
    /// Initial window width in logical pixels
    pub window_width: f32,
    /// Initial window height in logical pixels
    pub window_height: f32,
    /// Largest edge rendered in the preview pane
    pub max_preview_size: u32,
    /// Initial size-in-pixels value of the form
    pub preview_size: u32,
    /// Initial border value of the form
    pub preview_border: u32,
    /// Initially selected format
    pub preview_format: OutputFormat,
    /// Quiet period before a changed form is re-rendered
    pub preview_debounce_ms: u64,
}

impl Default for GuiOptions {
    fn default() -> Self {
        Self {
            window_width: 600.0,
            window_height: 760.0,
            max_preview_size: 320,
            preview_size: 240,
            preview_border: 1,
            preview_format: OutputFormat::Png,
            preview_debounce_ms: 120,
        }
    }
}

/// Render defaults used when the command line leaves a parameter out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderDefaults {
    /// Output format
    pub format: OutputFormat,
    /// Pixels per module
    pub scale: u32,
    /// Quiet zone in modules
    pub border: u32,
    /// Error-correction level
    pub error_correction: ErrorCorrection,
    /// Upper bound for any resolved scale
    pub max_scale: u32,
}

impl Default for RenderDefaults {
    fn default() -> Self {
        Self {
            format: OutputFormat::Svg,
            scale: 8,
            border: 4,
            error_correction: ErrorCorrection::Low,
            max_scale: DEFAULT_MAX_SCALE,
        }
    }
}

/// Filesystem locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathOptions {
    /// Directory relative output filenames are placed in
    pub output_directory: PathBuf,
}

impl Default for PathOptions {
    fn default() -> Self {
        Self {
            output_directory: PathBuf::from("qrcodes"),
        }
    }
}

/// Colour theme of the desktop form
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Light background
    #[default]
    Light,
    /// Dark background
    Dark,
}

/// Look and feel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiOptions {
    /// Colour theme
    pub theme: Theme,
    /// Body font size in points
    pub font_size: f32,
}

impl Default for UiOptions {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            font_size: 12.0,
        }
    }
}

/// Structured logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingOptions {
    /// Default log level (overridable via `MICROQR_LOG_LEVEL`)
    pub level: String,
    /// Optional log file path for teeing structured logs
    pub file: Option<PathBuf>,
    /// Force ANSI colors in console logging
    pub color: bool,
    /// Optional log rotation strategy applied to `file`
    pub rotation: Option<LogRotation>,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file: None,
            color: true,
            rotation: None,
        }
    }
}

impl LoggingOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(level) = env::var("MICROQR_LOG_LEVEL") {
            self.level = level;
        }
        if let Ok(file) = env::var("MICROQR_LOG_FILE") {
            self.file = Some(PathBuf::from(file));
        }
        if let Ok(color) = env::var("MICROQR_LOG_COLOR") {
            match color.to_ascii_lowercase().as_str() {
                "0" | "false" | "off" => self.color = false,
                "1" | "true" | "on" => self.color = true,
                _ => {}
            }
        }
        if let Ok(rotation) = env::var("MICROQR_LOG_ROTATION") {
            if let Some(parsed) = LogRotation::parse(&rotation) {
                self.rotation = Some(parsed);
            }
        }
    }
}

/// Supported log rotation policies for file sinks
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    /// Rotate log files once per hour
    Hourly,
    /// Rotate log files once per day
    Daily,
}

impl LogRotation {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "hourly" => Some(Self::Hourly),
            "daily" => Some(Self::Daily),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_overrides_nested_keys_only() {
        let config = MicroQrConfig::parse(
            r#"{"gui": {"max_preview_size": 400}, "defaults": {"format": "png", "error_correction": "M"}}"#,
            "json",
        )
        .unwrap();

        assert_eq!(config.gui.max_preview_size, 400);
        assert_eq!(config.gui.window_width, 600.0);
        assert_eq!(config.defaults.format, OutputFormat::Png);
        assert_eq!(config.defaults.error_correction, ErrorCorrection::Medium);
        assert_eq!(config.defaults.scale, 8);
        assert_eq!(config.paths, PathOptions::default());
    }

    #[test]
    fn test_toml_and_yaml_documents() {
        let toml = MicroQrConfig::parse("[paths]\noutput_directory = \"out\"\n", "toml").unwrap();
        assert_eq!(toml.paths.output_directory, PathBuf::from("out"));

        let yaml = MicroQrConfig::parse("ui:\n  theme: dark\n", "yml").unwrap();
        assert_eq!(yaml.ui.theme, Theme::Dark);
        assert_eq!(yaml.ui.font_size, 12.0);
    }

    #[test]
    fn test_format_aliases() {
        let config = MicroQrConfig::parse(r#"{"defaults": {"format": "vector"}}"#, "json").unwrap();
        assert_eq!(config.defaults.format, OutputFormat::Svg);
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        assert!(MicroQrConfig::parse("", "ini").is_err());
    }

    #[test]
    fn test_save_then_load_keeps_values() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["cfg.toml", "cfg.yaml", "cfg.json"] {
            let path = dir.path().join(name);
            let mut config = MicroQrConfig::default();
            config.defaults.border = 2;
            config.logging.rotation = Some(LogRotation::Daily);
            config.save(&path).unwrap();
            assert_eq!(MicroQrConfig::from_file(&path).unwrap(), config, "{name}");
        }
    }

    #[test]
    fn test_explicit_broken_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(MicroQrConfig::from_file(&path).is_err());
        assert!(MicroQrConfig::load(Some(&path)).is_err());
    }

    #[test]
    fn test_explicit_file_is_reported_as_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("explicit.toml");
        fs::write(&path, "[defaults]\nborder = 0\n").unwrap();

        let loaded = MicroQrConfig::load(Some(&path)).unwrap();
        assert_eq!(loaded.config.defaults.border, 0);
        assert_eq!(loaded.source.as_deref(), Some(path.as_path()));
        assert!(loaded.fallback.is_none());
    }
}
