use crate::events::WindowSnapshot;
use std::fmt;
use tracing::debug;

/// Значение-заглушка для окон, чей процесс не удалось определить
const UNKNOWN_IDENTITY: &str = "unknown";

/// Нормализованное базовое имя исполняемого файла процесса.
///
/// Сравнение регистронезависимое: имя приводится к нижнему регистру при
/// создании, поэтому "Code.exe" и "code.exe" — один идентификатор.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProcessIdentity(String);

impl ProcessIdentity {
    pub fn new(name: &str) -> Self {
        let normalized = name.trim().to_lowercase();
        if normalized.is_empty() {
            return Self::unknown();
        }
        Self(normalized)
    }

    pub fn unknown() -> Self {
        Self(UNKNOWN_IDENTITY.to_string())
    }

    pub fn is_unknown(&self) -> bool {
        self.0 == UNKNOWN_IDENTITY
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Выделить базовое имя из полного пути к образу процесса
    pub fn from_image_path(path: &str) -> Self {
        let base = path
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(path);
        Self::new(base)
    }
}

impl fmt::Display for ProcessIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Источник идентификаторов процессов для движка переключения
pub trait IdentitySource: Send + Sync {
    fn resolve(&self, window: &WindowSnapshot) -> ProcessIdentity;
}

/// Factory function to create an appropriate identity source based on the dry_run flag
pub fn create_identity_source(dry_run: bool) -> std::sync::Arc<dyn IdentitySource> {
    if dry_run {
        std::sync::Arc::new(TitleIdentitySource)
    } else {
        std::sync::Arc::new(IdentityResolver::new())
    }
}

/// Разрешение снимка окна в идентификатор владеющего процесса.
///
/// Никогда не возвращает ошибку: закрытое окно, недоступный процесс или
/// нечитаемый путь — штатные случаи, для них возвращается заглушка
/// `unknown`, на которую не может совпасть ни одно правило.
pub struct IdentityResolver;

impl IdentityResolver {
    pub fn new() -> Self {
        Self
    }

    pub fn resolve(&self, window: &WindowSnapshot) -> ProcessIdentity {
        let Some(pid) = window.pid else {
            debug!("У снимка окна {} нет pid, идентификатор unknown", window);
            return ProcessIdentity::unknown();
        };

        match platform::process_image(pid) {
            Some(image) => ProcessIdentity::from_image_path(&image),
            None => {
                debug!("Не удалось запросить образ процесса pid {}", pid);
                ProcessIdentity::unknown()
            }
        }
    }
}

impl Default for IdentityResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentitySource for IdentityResolver {
    fn resolve(&self, window: &WindowSnapshot) -> ProcessIdentity {
        Self::resolve(self, window)
    }
}

/// В режиме сухого запуска идентификатором служит первый токен заголовка
/// эмулированного окна
pub struct TitleIdentitySource;

impl IdentitySource for TitleIdentitySource {
    fn resolve(&self, window: &WindowSnapshot) -> ProcessIdentity {
        window
            .title
            .split_whitespace()
            .next()
            .map(ProcessIdentity::new)
            .unwrap_or_else(ProcessIdentity::unknown)
    }
}

mod platform {
    /// Имя (или полный путь) образа процесса по pid
    #[cfg(windows)]
    pub fn process_image(pid: u32) -> Option<String> {
        use windows::Win32::Foundation::CloseHandle;
        use windows::Win32::System::ProcessStatus::GetModuleBaseNameW;
        use windows::Win32::System::Threading::{
            OpenProcess, PROCESS_QUERY_INFORMATION, PROCESS_VM_READ,
        };

        // SAFETY: OpenProcess возвращает валидный дескриптор или ошибку;
        // GetModuleBaseNameW пишет в стековый буфер известного размера;
        // дескриптор закрывается на всех путях выхода.
        unsafe {
            let handle =
                OpenProcess(PROCESS_QUERY_INFORMATION | PROCESS_VM_READ, false, pid).ok()?;

            let mut name_buf = [0u16; 256];
            let len = GetModuleBaseNameW(handle, None, &mut name_buf);

            let _ = CloseHandle(handle);

            if len > 0 {
                Some(String::from_utf16_lossy(&name_buf[..len as usize]))
            } else {
                None
            }
        }
    }

    #[cfg(all(unix, not(windows)))]
    pub fn process_image(pid: u32) -> Option<String> {
        // /proc/<pid>/exe — символьная ссылка на образ; comm — запасной путь
        let exe = std::fs::read_link(format!("/proc/{}/exe", pid)).ok();
        if let Some(path) = exe {
            return Some(path.to_string_lossy().into_owned());
        }

        std::fs::read_to_string(format!("/proc/{}/comm", pid))
            .ok()
            .map(|comm| comm.trim().to_string())
            .filter(|comm| !comm.is_empty())
    }

    #[cfg(not(any(windows, unix)))]
    pub fn process_image(_pid: u32) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::WindowHandle;

    #[test]
    fn test_identity_is_lowercased() {
        let identity = ProcessIdentity::new("Code.EXE");
        assert_eq!(identity.as_str(), "code.exe");
    }

    #[test]
    fn test_identity_from_windows_path() {
        let identity = ProcessIdentity::from_image_path(r"C:\Program Files\VS Code\Code.exe");
        assert_eq!(identity.as_str(), "code.exe");
    }

    #[test]
    fn test_identity_from_unix_path() {
        let identity = ProcessIdentity::from_image_path("/usr/bin/konsole");
        assert_eq!(identity.as_str(), "konsole");
    }

    #[test]
    fn test_empty_name_is_unknown() {
        assert!(ProcessIdentity::new("   ").is_unknown());
        assert!(ProcessIdentity::unknown().is_unknown());
        assert!(!ProcessIdentity::new("code.exe").is_unknown());
    }

    #[test]
    fn test_resolve_without_pid_is_unknown() {
        let resolver = IdentityResolver::new();
        let window = WindowSnapshot::new(WindowHandle(1), "Окно без pid".to_string());
        assert!(resolver.resolve(&window).is_unknown());
    }

    #[test]
    fn test_title_identity_source() {
        let source = TitleIdentitySource;
        let window = WindowSnapshot::new(WindowHandle(1), "Code.exe - main.rs".to_string());
        assert_eq!(source.resolve(&window).as_str(), "code.exe");

        let empty = WindowSnapshot::new(WindowHandle(2), "   ".to_string());
        assert!(source.resolve(&empty).is_unknown());
    }
}
