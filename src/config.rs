use std::path::{Path, PathBuf};

use color_eyre::Result;
use directories::BaseDirs;
use serde::Deserialize;

use crate::core::ChartConfig;
use crate::tui::theme::ThemeName;

const CONFIG: &str = include_str!("../.config/config.json5");

const ENV_PREFIX: &str = "CORRTUI";

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct ApiConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub analysis_id: Option<u64>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct UiConfig {
    pub theme: ThemeName,
    /// Width of the left pane as a percentage of the terminal
    pub list_width_percent: u16,
    pub tick_rate_ms: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            theme: ThemeName::Dark,
            list_width_percent: 30,
            tick_rate_ms: 250,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub chart: ChartConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

impl Config {
    /// Embedded defaults, then the user file, then `CORRTUI_*` environment
    /// variables (`__` separates sections, e.g. `CORRTUI_API__BASE_URL`).
    ///
    /// Without an explicit path, `~/.corrtui-config.json5` is read if present.
    pub fn from_path(config_path: Option<&PathBuf>) -> Result<Self, config::ConfigError> {
        let environment = config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__");
        Self::build(config_path, environment)
    }

    fn build(
        config_path: Option<&PathBuf>,
        environment: config::Environment,
    ) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder().add_source(config::File::from_str(
            CONFIG,
            config::FileFormat::Json5,
        ));

        builder = match config_path {
            Some(path) => builder.add_source(
                config::File::from(expand_tilde(path))
                    .format(config::FileFormat::Json5)
                    .required(true),
            ),
            None => builder.add_source(
                config::File::from(default_home_config_path())
                    .format(config::FileFormat::Json5)
                    .required(false),
            ),
        };

        builder.add_source(environment).build()?.try_deserialize()
    }
}

fn expand_tilde(path: &Path) -> PathBuf {
    if let (Some(rest), Some(base)) = (
        path.to_str().and_then(|s| s.strip_prefix('~')),
        BaseDirs::new(),
    ) {
        return base.home_dir().join(rest.trim_start_matches(['/', '\\']));
    }
    path.to_path_buf()
}

fn default_home_config_path() -> PathBuf {
    if let Some(base) = BaseDirs::new() {
        return base.home_dir().join(".corrtui-config.json5");
    }
    PathBuf::from(".corrtui-config.json5")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    use super::*;

    fn no_env() -> config::Environment {
        env_from(&[])
    }

    fn env_from(vars: &[(&str, &str)]) -> config::Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .source(Some(map))
    }

    fn user_file(content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".json5").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_embedded_defaults() {
        let file = user_file("{}");
        let cfg = Config::build(Some(&file.path().to_path_buf()), no_env()).unwrap();
        assert_eq!(cfg.chart, ChartConfig::default());
        assert_eq!(cfg.ui, UiConfig::default());
        assert_eq!(cfg.api.base_url.as_deref(), Some("http://localhost:8000"));
        assert_eq!(cfg.api.analysis_id, None);
    }

    #[test]
    fn test_user_file_overrides_defaults() {
        let file = user_file(
            r#"{
                // comments are fine in json5
                api: { analysis_id: 42 },
                chart: { entry_width: 3 },
                ui: { theme: "light" },
            }"#,
        );
        let cfg = Config::build(Some(&file.path().to_path_buf()), no_env()).unwrap();
        assert_eq!(cfg.api.analysis_id, Some(42));
        assert_eq!(cfg.chart.entry_width, 3.0);
        assert_eq!(cfg.chart.axis_width, ChartConfig::default().axis_width);
        assert_eq!(cfg.ui.theme, ThemeName::Light);
        assert_eq!(cfg.ui.list_width_percent, 30);
    }

    #[test]
    fn test_environment_overrides_file() {
        let file = user_file("{ api: { base_url: \"http://file\" } }");
        let env = env_from(&[("CORRTUI_API__BASE_URL", "http://env")]);
        let cfg = Config::build(Some(&file.path().to_path_buf()), env).unwrap();
        assert_eq!(cfg.api.base_url.as_deref(), Some("http://env"));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let missing = PathBuf::from("/definitely/not/here/corrtui.json5");
        assert!(Config::build(Some(&missing), no_env()).is_err());
    }
}
