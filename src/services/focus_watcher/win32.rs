use crate::error::Result;
#[cfg(not(windows))]
use crate::error::ImsError;
use crate::events::WindowSnapshot;

/// Зонд переднего окна через Win32 API
pub struct Win32Probe;

impl Win32Probe {
    pub fn new() -> Self {
        Self
    }

    #[cfg(windows)]
    pub async fn test(&self) -> Result<()> {
        // GetForegroundWindow не требует прав и не блокирует; сам вызов и
        // есть проверка работоспособности
        Ok(())
    }

    #[cfg(not(windows))]
    pub async fn test(&self) -> Result<()> {
        Err(ImsError::ServiceUnavailable(
            "Win32 API недоступен на этой платформе".to_string(),
        ))
    }

    /// Снимок текущего переднего окна; None, когда фокус ни у кого
    #[cfg(windows)]
    pub async fn foreground_window(&self) -> Result<Option<WindowSnapshot>> {
        use crate::events::{WindowGeometry, WindowHandle};
        use windows::Win32::Foundation::RECT;
        use windows::Win32::UI::WindowsAndMessaging::{
            GetForegroundWindow, GetWindowRect, GetWindowTextW, GetWindowThreadProcessId,
        };

        // SAFETY: GetForegroundWindow возвращает валидный HWND или null
        // (проверяется); GetWindowTextW пишет в стековый буфер известного
        // размера; GetWindowThreadProcessId пишет в валидную ссылку;
        // ручного освобождения ресурсов не требуется.
        unsafe {
            let hwnd = GetForegroundWindow();
            if hwnd.0 == std::ptr::null_mut() {
                return Ok(None);
            }

            let mut title_buf = [0u16; 256];
            let len = GetWindowTextW(hwnd, &mut title_buf);
            let title = String::from_utf16_lossy(&title_buf[..len as usize]);

            let mut pid = 0u32;
            GetWindowThreadProcessId(hwnd, Some(&mut pid));

            let mut snapshot = WindowSnapshot::new(WindowHandle(hwnd.0 as isize), title);
            if pid != 0 {
                snapshot = snapshot.with_pid(pid);
            }

            let mut rect = RECT::default();
            if GetWindowRect(hwnd, &mut rect).is_ok() {
                snapshot = snapshot.with_geometry(WindowGeometry {
                    x: rect.left,
                    y: rect.top,
                    width: (rect.right - rect.left).max(0) as u32,
                    height: (rect.bottom - rect.top).max(0) as u32,
                });
            }

            Ok(Some(snapshot))
        }
    }

    #[cfg(not(windows))]
    pub async fn foreground_window(&self) -> Result<Option<WindowSnapshot>> {
        Err(ImsError::ServiceUnavailable(
            "Win32 API недоступен на этой платформе".to_string(),
        ))
    }
}
