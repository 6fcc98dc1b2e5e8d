use crate::error::{ImsError, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};

use super::format;

/// Отпечаток состояния файла правил на диске
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fingerprint {
    modified: SystemTime,
    len: u64,
}

fn fingerprint_of(path: &Path) -> Option<Fingerprint> {
    let metadata = fs::metadata(path).ok()?;
    let modified = metadata.modified().ok()?;
    Some(Fingerprint {
        modified,
        len: metadata.len(),
    })
}

/// Идентификаторы сравниваются без учёта регистра
fn normalize_identity(identity: &str) -> String {
    identity.trim().to_lowercase()
}

#[derive(Debug)]
struct Inner {
    rules: HashMap<String, String>,
    default_language: String,
    fingerprint: Option<Fingerprint>,
}

/// Хранилище правил "идентификатор процесса -> язык" с горячей
/// перезагрузкой по отпечатку файла и синхронным сохранением при каждом
/// изменении.
pub struct RuleStore {
    path: PathBuf,
    inner: RwLock<Inner>,
}

impl RuleStore {
    pub fn new(path: PathBuf, seed_default: String) -> Self {
        Self {
            path,
            inner: RwLock::new(Inner {
                rules: HashMap::new(),
                default_language: seed_default,
                fingerprint: None,
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Прочитать файл правил и атомарно заменить набор в памяти.
    ///
    /// Отсутствующий или нечитаемый файл — не ошибка: прежний набор
    /// сохраняется, обновляется только отпечаток.
    pub fn load(&self) -> Result<()> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                debug!(
                    "Файл правил {:?} недоступен ({}), оставляем прежний набор",
                    self.path, e
                );
                let mut inner = self.inner.write();
                inner.fingerprint = fingerprint_of(&self.path);
                return Ok(());
            }
        };

        let parsed = format::parse(&content);

        // Собираем новую карту целиком и подменяем одним присваиванием,
        // последняя запись для идентификатора выигрывает
        let mut rules = HashMap::with_capacity(parsed.rules.len());
        for (identity, language) in parsed.rules {
            rules.insert(normalize_identity(&identity), language);
        }

        let fingerprint = fingerprint_of(&self.path);

        let mut inner = self.inner.write();
        inner.rules = rules;
        if let Some(default_language) = parsed.default_language {
            inner.default_language = default_language;
        }
        inner.fingerprint = fingerprint;

        info!(
            "Загружено правил: {}, язык по умолчанию: {}",
            inner.rules.len(),
            inner.default_language
        );
        Ok(())
    }

    /// Дешёвая проверка отпечатка; перечитывает файл только если он
    /// изменился с последней загрузки. Возвращает true при перезагрузке.
    pub fn maybe_reload(&self) -> Result<bool> {
        let current = fingerprint_of(&self.path);
        {
            let inner = self.inner.read();
            if inner.fingerprint == current {
                return Ok(false);
            }
        }

        debug!("Файл правил {:?} изменился, перезагружаем", self.path);
        self.load()?;
        Ok(true)
    }

    pub fn get(&self, identity: &str) -> Option<String> {
        self.inner
            .read()
            .rules
            .get(&normalize_identity(identity))
            .cloned()
    }

    /// Правило для идентификатора, иначе язык по умолчанию
    pub fn decide(&self, identity: &str) -> String {
        let inner = self.inner.read();
        inner
            .rules
            .get(&normalize_identity(identity))
            .cloned()
            .unwrap_or_else(|| inner.default_language.clone())
    }

    pub fn default_language(&self) -> String {
        self.inner.read().default_language.clone()
    }

    /// Вставить или перезаписать правило и синхронно сохранить весь набор
    pub fn set(&self, identity: &str, language: &str) -> Result<()> {
        let mut inner = self.inner.write();
        inner
            .rules
            .insert(normalize_identity(identity), language.to_string());
        self.persist(&mut inner)
    }

    /// Удалить правило, если оно есть; отсутствие правила — не ошибка
    pub fn remove(&self, identity: &str) -> Result<()> {
        let mut inner = self.inner.write();
        if inner.rules.remove(&normalize_identity(identity)).is_none() {
            return Ok(());
        }
        self.persist(&mut inner)
    }

    pub fn set_default(&self, language: &str) -> Result<()> {
        let mut inner = self.inner.write();
        inner.default_language = language.to_string();
        self.persist(&mut inner)
    }

    /// Текущий набор правил (для discovery и конфигурационных команд)
    pub fn snapshot(&self) -> Vec<(String, String)> {
        let inner = self.inner.read();
        let mut entries: Vec<(String, String)> = inner
            .rules
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        entries.sort();
        entries
    }

    pub fn len(&self) -> usize {
        self.inner.read().rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().rules.is_empty()
    }

    /// Сохранить весь набор на диск под удерживаемой блокировкой записи,
    /// чтобы читатели не увидели расхождение памяти и диска
    fn persist(&self, inner: &mut Inner) -> Result<()> {
        let text = format::serialize(
            &inner.default_language,
            inner.rules.iter().map(|(k, v)| (k, v)),
        );

        fs::write(&self.path, text).map_err(|e| {
            warn!("Не удалось сохранить файл правил {:?}: {}", self.path, e);
            ImsError::RulesPersist(format!("{:?}: {}", self.path, e))
        })?;

        // Запоминаем отпечаток собственной записи, чтобы следующий
        // maybe_reload не перечитывал файл впустую
        inner.fingerprint = fingerprint_of(&self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> RuleStore {
        RuleStore::new(dir.path().join("rules.txt"), "ZH".to_string())
    }

    #[test]
    fn test_default_fallback_law() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        assert_eq!(store.decide("notepad.exe"), "ZH");
        assert_eq!(store.get("notepad.exe"), None);
    }

    #[test]
    fn test_override_law() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.set("Code.exe", "EN").unwrap();
        assert_eq!(store.decide("code.exe"), "EN");

        // Правило выигрывает при любом значении языка по умолчанию
        store.set_default("RU").unwrap();
        assert_eq!(store.decide("code.exe"), "EN");
        assert_eq!(store.decide("other.exe"), "RU");
    }

    #[test]
    fn test_set_twice_last_write_wins() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.set("code.exe", "EN").unwrap();
        store.set("code.exe", "ZH").unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("code.exe"), Some("ZH".to_string()));
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.set_default("ZH").unwrap();
        store.remove("ghost.exe").unwrap();
        assert_eq!(store.default_language(), "ZH");
        assert!(store.is_empty());
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.set("code.exe", "EN").unwrap();
        store.set("visual studio code.exe", "EN").unwrap();
        store.set("notepad.exe", "ZH").unwrap();
        store.set_default("RU").unwrap();

        let reloaded = store_in(&dir);
        reloaded.load().unwrap();

        assert_eq!(reloaded.snapshot(), store.snapshot());
        assert_eq!(reloaded.default_language(), "RU");
    }

    #[test]
    fn test_round_trip_with_zero_rules() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.set_default("EN").unwrap();

        let reloaded = store_in(&dir);
        reloaded.load().unwrap();
        assert!(reloaded.is_empty());
        assert_eq!(reloaded.default_language(), "EN");
    }

    #[test]
    fn test_maybe_reload_is_noop_when_unchanged() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.set("code.exe", "EN").unwrap();

        for _ in 0..10 {
            assert!(!store.maybe_reload().unwrap());
        }
        assert_eq!(store.get("code.exe"), Some("EN".to_string()));
    }

    #[test]
    fn test_maybe_reload_picks_up_external_edit() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.set("code.exe", "EN").unwrap();

        // Внешняя правка файла (другой длины, чтобы отпечаток точно сменился)
        fs::write(
            store.path(),
            "@default ZH\ncode.exe ZH\nterminal.exe EN\n",
        )
        .unwrap();

        assert!(store.maybe_reload().unwrap());
        assert_eq!(store.get("code.exe"), Some("ZH".to_string()));
        assert_eq!(store.get("terminal.exe"), Some("EN".to_string()));
        assert_eq!(store.default_language(), "ZH");
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rules.txt");
        fs::write(&path, "code.exe EN\nмусор\n# comment\nnotepad.exe ZH\n").unwrap();

        let store = RuleStore::new(path, "ZH".to_string());
        store.load().unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.get("code.exe"), Some("EN".to_string()));
        assert_eq!(store.get("notepad.exe"), Some("ZH".to_string()));
    }

    #[test]
    fn test_missing_file_keeps_prior_rules() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.set("code.exe", "EN").unwrap();

        fs::remove_file(store.path()).unwrap();
        store.load().unwrap();

        assert_eq!(store.get("code.exe"), Some("EN".to_string()));
    }

    #[test]
    fn test_case_insensitive_matching() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.set("Code.EXE", "EN").unwrap();
        assert_eq!(store.get("code.exe"), Some("EN".to_string()));
        assert_eq!(store.get("CODE.exe"), Some("EN".to_string()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_file_without_default_keeps_seed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rules.txt");
        fs::write(&path, "code.exe EN\n").unwrap();

        let store = RuleStore::new(path, "ZH".to_string());
        store.load().unwrap();
        assert_eq!(store.default_language(), "ZH");
    }
}
