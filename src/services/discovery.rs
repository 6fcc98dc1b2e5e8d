use crate::error::{ImsError, Result};
use crate::rules::RuleStore;
use crate::services::identity::{IdentitySource, ProcessIdentity};
use crate::events::WindowSnapshot;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Перечислитель видимых окон верхнего уровня
#[async_trait::async_trait]
pub trait WindowEnumerator: Send + Sync {
    async fn visible_windows(&self) -> Result<Vec<WindowSnapshot>>;
}

/// Factory function to create an appropriate window enumerator based on the dry_run flag
pub fn create_window_enumerator(dry_run: bool) -> Arc<dyn WindowEnumerator> {
    if dry_run {
        Arc::new(DryRunEnumerator)
    } else {
        Arc::new(SystemEnumerator::new())
    }
}

/// Приложение, найденное при обзоре окон
#[derive(Debug, Clone)]
pub struct DiscoveredApp {
    pub identity: ProcessIdentity,
    /// Язык из правила, если правило для приложения есть
    pub language: Option<String>,
}

impl DiscoveredApp {
    pub fn has_rule(&self) -> bool {
        self.language.is_some()
    }
}

/// Обзор текущих окон для человека, редактирующего правила.
/// Только чтение: движок переключения этот компонент не трогает.
pub struct Discovery {
    enumerator: Arc<dyn WindowEnumerator>,
    identity: Arc<dyn IdentitySource>,
    rules: Arc<RuleStore>,
}

impl Discovery {
    pub fn new(
        enumerator: Arc<dyn WindowEnumerator>,
        identity: Arc<dyn IdentitySource>,
        rules: Arc<RuleStore>,
    ) -> Self {
        Self {
            enumerator,
            identity,
            rules,
        }
    }

    /// Видимые окна, сведённые к уникальным идентификаторам приложений,
    /// отсортированные, каждый с отметкой о наличии правила
    pub async fn discover(&self) -> Result<Vec<DiscoveredApp>> {
        let windows = self.enumerator.visible_windows().await?;
        debug!("Обзор: найдено окон: {}", windows.len());

        let mut by_identity: BTreeMap<String, ProcessIdentity> = BTreeMap::new();
        for window in &windows {
            let identity = self.identity.resolve(window);
            by_identity.insert(identity.as_str().to_string(), identity);
        }

        Ok(by_identity
            .into_values()
            .map(|identity| {
                let language = if identity.is_unknown() {
                    None
                } else {
                    self.rules.get(identity.as_str())
                };
                DiscoveredApp { identity, language }
            })
            .collect())
    }
}

/// Системный перечислитель окон: EnumWindows на Windows, wmctrl -lp
/// на остальных платформах
pub struct SystemEnumerator;

impl SystemEnumerator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl WindowEnumerator for SystemEnumerator {
    #[cfg(windows)]
    async fn visible_windows(&self) -> Result<Vec<WindowSnapshot>> {
        use crate::events::WindowHandle;
        use windows::Win32::Foundation::{BOOL, HWND, LPARAM};
        use windows::Win32::UI::WindowsAndMessaging::{
            EnumWindows, GetWindowTextLengthW, GetWindowTextW, GetWindowThreadProcessId,
            IsWindowVisible,
        };

        unsafe extern "system" fn enum_proc(hwnd: HWND, lparam: LPARAM) -> BOOL {
            let found = &mut *(lparam.0 as *mut Vec<WindowSnapshot>);

            if IsWindowVisible(hwnd).as_bool() && GetWindowTextLengthW(hwnd) > 0 {
                let mut title_buf = [0u16; 256];
                let len = GetWindowTextW(hwnd, &mut title_buf);
                let title = String::from_utf16_lossy(&title_buf[..len as usize]);

                let mut pid = 0u32;
                GetWindowThreadProcessId(hwnd, Some(&mut pid));

                let mut snapshot = WindowSnapshot::new(WindowHandle(hwnd.0 as isize), title);
                if pid != 0 {
                    snapshot = snapshot.with_pid(pid);
                }
                found.push(snapshot);
            }

            BOOL(1)
        }

        let mut found: Vec<WindowSnapshot> = Vec::new();

        // SAFETY: указатель на found жив на время синхронного EnumWindows;
        // колбэк пишет только в этот вектор.
        unsafe {
            EnumWindows(Some(enum_proc), LPARAM(&mut found as *mut _ as isize))
                .map_err(|e| ImsError::Internal(format!("EnumWindows не удался: {}", e)))?;
        }

        Ok(found)
    }

    #[cfg(not(windows))]
    async fn visible_windows(&self) -> Result<Vec<WindowSnapshot>> {
        use crate::events::WindowHandle;
        use std::process::Command;

        let output = Command::new("wmctrl")
            .args(["-lp"])
            .output()
            .map_err(|e| ImsError::ServiceUnavailable(format!("wmctrl не найден: {}", e)))?;

        if !output.status.success() {
            return Err(ImsError::ServiceUnavailable(
                "wmctrl вернул ошибку".to_string(),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut found = Vec::new();

        // Формат: 0x03800003 РАБОЧИЙ_СТОЛ PID ХОСТ ЗАГОЛОВОК...
        for line in stdout.lines() {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 4 {
                continue;
            }

            let hex_id = parts[0].trim_start_matches("0x").trim_start_matches("0X");
            let Ok(handle) = isize::from_str_radix(hex_id, 16) else {
                continue;
            };

            let title = if parts.len() > 4 {
                parts[4..].join(" ")
            } else {
                String::new()
            };

            let mut snapshot = WindowSnapshot::new(WindowHandle(handle), title);
            if let Ok(pid) = parts[2].parse::<u32>() {
                if pid != 0 {
                    snapshot = snapshot.with_pid(pid);
                }
            }
            found.push(snapshot);
        }

        Ok(found)
    }
}

/// Эмуляция набора окон для режима сухого запуска
pub struct DryRunEnumerator;

#[async_trait::async_trait]
impl WindowEnumerator for DryRunEnumerator {
    async fn visible_windows(&self) -> Result<Vec<WindowSnapshot>> {
        use crate::events::WindowHandle;

        Ok(vec![
            WindowSnapshot::new(WindowHandle(1001), "Code.exe - dry_run".to_string()),
            WindowSnapshot::new(WindowHandle(1002), "Notepad.exe - dry_run".to_string()),
            WindowSnapshot::new(WindowHandle(1003), "Browser.exe - dry_run".to_string()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::WindowHandle;
    use crate::services::identity::TitleIdentitySource;
    use tempfile::TempDir;

    struct FakeEnumerator(Vec<WindowSnapshot>);

    #[async_trait::async_trait]
    impl WindowEnumerator for FakeEnumerator {
        async fn visible_windows(&self) -> Result<Vec<WindowSnapshot>> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_discover_dedupes_and_tags_rules() {
        let dir = TempDir::new().unwrap();
        let rules = Arc::new(RuleStore::new(
            dir.path().join("rules.txt"),
            "ZH".to_string(),
        ));
        rules.set("code.exe", "EN").unwrap();

        let enumerator = Arc::new(FakeEnumerator(vec![
            WindowSnapshot::new(WindowHandle(1), "Code.exe - main.rs".to_string()),
            WindowSnapshot::new(WindowHandle(2), "Code.exe - lib.rs".to_string()),
            WindowSnapshot::new(WindowHandle(3), "Notepad.exe - заметки".to_string()),
        ]));

        let discovery = Discovery::new(enumerator, Arc::new(TitleIdentitySource), rules);
        let apps = discovery.discover().await.unwrap();

        assert_eq!(apps.len(), 2);
        assert_eq!(apps[0].identity.as_str(), "code.exe");
        assert!(apps[0].has_rule());
        assert_eq!(apps[0].language.as_deref(), Some("EN"));
        assert_eq!(apps[1].identity.as_str(), "notepad.exe");
        assert!(!apps[1].has_rule());
    }

    #[tokio::test]
    async fn test_discover_keeps_unknown_without_rule_lookup() {
        let dir = TempDir::new().unwrap();
        let rules = Arc::new(RuleStore::new(
            dir.path().join("rules.txt"),
            "ZH".to_string(),
        ));
        // Даже если кто-то записал правило для "unknown", обзор его не припишет
        rules.set("unknown", "EN").unwrap();

        let enumerator = Arc::new(FakeEnumerator(vec![WindowSnapshot::new(
            WindowHandle(1),
            "   ".to_string(),
        )]));

        let discovery = Discovery::new(enumerator, Arc::new(TitleIdentitySource), rules);
        let apps = discovery.discover().await.unwrap();

        assert_eq!(apps.len(), 1);
        assert!(apps[0].identity.is_unknown());
        assert!(!apps[0].has_rule());
    }
}
