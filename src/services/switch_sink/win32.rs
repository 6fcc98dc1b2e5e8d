use crate::error::{ImsError, Result};
use crate::events::WindowSnapshot;

/// Доставка запроса переключения через WM_INPUTLANGCHANGEREQUEST
pub struct Win32Sink;

impl Win32Sink {
    pub fn new() -> Self {
        Self
    }

    #[cfg(windows)]
    pub async fn test(&self) -> Result<()> {
        Ok(())
    }

    #[cfg(not(windows))]
    pub async fn test(&self) -> Result<()> {
        Err(ImsError::ServiceUnavailable(
            "Win32 API недоступен на этой платформе".to_string(),
        ))
    }

    /// `layout` — шестнадцатеричный идентификатор раскладки (HKL),
    /// например 04090409 для английской (США)
    #[cfg(windows)]
    pub async fn switch(&self, window: &WindowSnapshot, layout: &str) -> Result<()> {
        use windows::Win32::Foundation::{HWND, LPARAM, WPARAM};
        use windows::Win32::UI::WindowsAndMessaging::{
            PostMessageW, WM_INPUTLANGCHANGEREQUEST,
        };

        let value = parse_layout(layout).ok_or_else(|| {
            ImsError::Internal(format!("Некорректный идентификатор раскладки: '{}'", layout))
        })?;

        let hwnd = HWND(window.handle.value() as *mut core::ffi::c_void);

        // SAFETY: PostMessageW асинхронно помещает сообщение в очередь окна;
        // устаревший HWND приводит к ошибке вызова, а не к UB.
        unsafe {
            PostMessageW(hwnd, WM_INPUTLANGCHANGEREQUEST, WPARAM(0), LPARAM(value))
                .map_err(|e| ImsError::Internal(format!("PostMessageW не удался: {}", e)))?;
        }

        Ok(())
    }

    #[cfg(not(windows))]
    pub async fn switch(&self, _window: &WindowSnapshot, _layout: &str) -> Result<()> {
        Err(ImsError::ServiceUnavailable(
            "Win32 API недоступен на этой платформе".to_string(),
        ))
    }
}

/// Разобрать шестнадцатеричный идентификатор раскладки
#[cfg_attr(not(windows), allow(dead_code))]
fn parse_layout(layout: &str) -> Option<isize> {
    let trimmed = layout.trim().trim_start_matches("0x").trim_start_matches("0X");
    isize::from_str_radix(trimmed, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_layout() {
        assert_eq!(parse_layout("04090409"), Some(0x0409_0409));
        assert_eq!(parse_layout("0x00000804"), Some(0x804));
        assert_eq!(parse_layout("мусор"), None);
    }
}
