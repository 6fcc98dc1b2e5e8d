use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub switching: SwitchingConfig,
    #[serde(default)]
    pub focus: FocusConfig,
    #[serde(default)]
    pub indicator: IndicatorConfig,
    /// Таблица код языка -> платформенный идентификатор раскладки
    /// (KLID на Windows, имя движка ibus/fcitx или раскладка xkb на Linux)
    #[serde(default)]
    pub languages: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            filter: "ims_rust=info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SwitchingConfig {
    /// Язык по умолчанию, когда ни одно правило не совпало
    pub default_language: String,
    /// Путь к файлу правил; относительный путь берётся от каталога
    /// исполняемого файла
    pub rules_file: String,
}

impl Default for SwitchingConfig {
    fn default() -> Self {
        Self {
            default_language: "EN".to_string(),
            rules_file: "rules.txt".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FocusConfig {
    pub polling_interval_ms: u64,
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            polling_interval_ms: 200,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndicatorConfig {
    pub dwell_ms: u64,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self { dwell_ms: 1000 }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        let figment = Figment::new()
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("IMS_"));

        let config: Config = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        // Валидация настроек логирования
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "pretty" | "json" => {}
            _ => anyhow::bail!("Неверный формат логирования: {}", self.logging.format),
        }

        // Валидация настроек переключения
        if self.switching.default_language.trim().is_empty() {
            anyhow::bail!("default_language не должен быть пустым");
        }

        if self.switching.rules_file.trim().is_empty() {
            anyhow::bail!("rules_file не должен быть пустым");
        }

        // Валидация настроек детекции фокуса
        if self.focus.polling_interval_ms < 50 {
            anyhow::bail!("polling_interval_ms должно быть минимум 50");
        }

        // Валидация индикатора
        if self.indicator.dwell_ms == 0 {
            anyhow::bail!("dwell_ms должно быть больше 0");
        }

        // Валидация таблицы языков
        for (code, layout) in &self.languages {
            if code.trim().is_empty() || layout.trim().is_empty() {
                anyhow::bail!("Пустой код языка или идентификатор раскладки в [languages]");
            }
            if code.split_whitespace().count() != 1 {
                anyhow::bail!("Код языка '{}' не должен содержать пробелов", code);
            }
        }

        Ok(())
    }

    /// Абсолютный путь к файлу правил: рядом с исполняемым файлом,
    /// если в конфигурации не задан абсолютный путь
    pub fn rules_path(&self) -> PathBuf {
        let configured = Path::new(&self.switching.rules_file);
        if configured.is_absolute() {
            return configured.to_path_buf();
        }

        match std::env::current_exe() {
            Ok(exe) => exe
                .parent()
                .map(|dir| dir.join(configured))
                .unwrap_or_else(|| configured.to_path_buf()),
            Err(_) => configured.to_path_buf(),
        }
    }

    /// Платформенный идентификатор раскладки для кода языка
    pub fn layout_for(&self, language: &str) -> Option<&str> {
        self.languages.get(language).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_polling_interval() {
        let mut config = Config::default();
        config.focus.polling_interval_ms = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_default_language_rejected() {
        let mut config = Config::default();
        config.switching.default_language = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_dwell_rejected() {
        let mut config = Config::default();
        config.indicator.dwell_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_layout_for() {
        let mut config = Config::default();
        config
            .languages
            .insert("EN".to_string(), "00000409".to_string());
        config
            .languages
            .insert("ZH".to_string(), "00000804".to_string());

        assert_eq!(config.layout_for("EN"), Some("00000409"));
        assert_eq!(config.layout_for("RU"), None);
    }

    #[test]
    fn test_language_code_with_spaces_rejected() {
        let mut config = Config::default();
        config
            .languages
            .insert("E N".to_string(), "00000409".to_string());
        assert!(config.validate().is_err());
    }
}
