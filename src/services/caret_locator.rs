use crate::events::{CaretRect, ScreenPoint, WindowSnapshot};
use std::sync::Arc;
#[cfg(not(windows))]
use tracing::debug;

use crate::debug_if_enabled;

/// Зонд текстовой каретки. Отсутствие каретки — явный сигнал (None),
/// а не сравнение координат с началом экрана: легитимная каретка в точке
/// (0, 0) неотличима от отсутствующей при наивной проверке.
#[async_trait::async_trait]
pub trait CaretProbe: Send + Sync {
    async fn caret_rect(&self, window: &WindowSnapshot) -> Option<CaretRect>;
}

/// Factory function to create an appropriate caret probe based on the dry_run flag
pub fn create_caret_probe(dry_run: bool) -> Arc<dyn CaretProbe> {
    if dry_run {
        Arc::new(NullCaretProbe)
    } else {
        Arc::new(SystemCaretProbe::new())
    }
}

/// Поиск позиции для индикатора: каретка окна, иначе центр окна
pub struct CaretLocator {
    probe: Arc<dyn CaretProbe>,
}

impl CaretLocator {
    pub fn new(probe: Arc<dyn CaretProbe>) -> Self {
        Self { probe }
    }

    pub async fn locate(&self, window: &WindowSnapshot) -> ScreenPoint {
        if let Some(rect) = self.probe.caret_rect(window).await {
            debug_if_enabled!("Каретка найдена: {:?}", rect);
            return rect.top_left();
        }

        debug_if_enabled!("Каретка не обнаружена для {}, используем центр окна", window);
        match window.geometry {
            Some(geometry) => geometry.center(),
            None => ScreenPoint::default(),
        }
    }
}

/// Системный зонд каретки; на платформах без поддержки всегда сообщает
/// об отсутствии каретки
pub struct SystemCaretProbe;

impl SystemCaretProbe {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl CaretProbe for SystemCaretProbe {
    #[cfg(windows)]
    async fn caret_rect(&self, window: &WindowSnapshot) -> Option<CaretRect> {
        use windows::Win32::Foundation::{HWND, POINT};
        use windows::Win32::Graphics::Gdi::ClientToScreen;
        use windows::Win32::UI::WindowsAndMessaging::{
            GetGUIThreadInfo, GetWindowThreadProcessId, GUITHREADINFO,
        };

        let hwnd = HWND(window.handle.value() as *mut core::ffi::c_void);

        // SAFETY: GetWindowThreadProcessId и GetGUIThreadInfo пишут в
        // валидные стековые структуры; hwndCaret проверяется на null до
        // использования; ClientToScreen преобразует координаты на месте.
        unsafe {
            let tid = GetWindowThreadProcessId(hwnd, None);
            if tid == 0 {
                return None;
            }

            let mut gui_info = GUITHREADINFO {
                cbSize: std::mem::size_of::<GUITHREADINFO>() as u32,
                ..Default::default()
            };
            if GetGUIThreadInfo(tid, &mut gui_info).is_err() {
                return None;
            }

            // Отсутствие окна каретки — авторитетный признак отсутствия
            // каретки; координаты rcCaret сами по себе ничего не значат
            if gui_info.hwndCaret.0 == std::ptr::null_mut() {
                return None;
            }

            let mut point = POINT {
                x: gui_info.rcCaret.left,
                y: gui_info.rcCaret.top,
            };
            if !ClientToScreen(gui_info.hwndCaret, &mut point).as_bool() {
                return None;
            }

            Some(CaretRect {
                x: point.x,
                y: point.y,
                width: (gui_info.rcCaret.right - gui_info.rcCaret.left).max(0) as u32,
                height: (gui_info.rcCaret.bottom - gui_info.rcCaret.top).max(0) as u32,
            })
        }
    }

    #[cfg(not(windows))]
    async fn caret_rect(&self, window: &WindowSnapshot) -> Option<CaretRect> {
        debug!("Зонд каретки недоступен на этой платформе для {}", window);
        None
    }
}

/// Зонд для режима сухого запуска: каретки нет никогда
pub struct NullCaretProbe;

#[async_trait::async_trait]
impl CaretProbe for NullCaretProbe {
    async fn caret_rect(&self, _window: &WindowSnapshot) -> Option<CaretRect> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{WindowGeometry, WindowHandle};

    struct FixedCaretProbe(Option<CaretRect>);

    #[async_trait::async_trait]
    impl CaretProbe for FixedCaretProbe {
        async fn caret_rect(&self, _window: &WindowSnapshot) -> Option<CaretRect> {
            self.0
        }
    }

    fn window_with_geometry() -> WindowSnapshot {
        WindowSnapshot::new(WindowHandle(1), "Редактор".to_string()).with_geometry(
            WindowGeometry {
                x: 100,
                y: 100,
                width: 600,
                height: 400,
            },
        )
    }

    #[tokio::test]
    async fn test_caret_position_wins() {
        let locator = CaretLocator::new(Arc::new(FixedCaretProbe(Some(CaretRect {
            x: 250,
            y: 310,
            width: 2,
            height: 16,
        }))));

        let point = locator.locate(&window_with_geometry()).await;
        assert_eq!(point, ScreenPoint { x: 250, y: 310 });
    }

    #[tokio::test]
    async fn test_caret_at_origin_is_still_a_caret() {
        // Каретка в точке (0, 0) — легитимная позиция, не признак отсутствия
        let locator = CaretLocator::new(Arc::new(FixedCaretProbe(Some(CaretRect {
            x: 0,
            y: 0,
            width: 2,
            height: 16,
        }))));

        let point = locator.locate(&window_with_geometry()).await;
        assert_eq!(point, ScreenPoint { x: 0, y: 0 });
    }

    #[tokio::test]
    async fn test_fallback_to_window_center() {
        let locator = CaretLocator::new(Arc::new(FixedCaretProbe(None)));

        let point = locator.locate(&window_with_geometry()).await;
        assert_eq!(point, ScreenPoint { x: 400, y: 300 });
    }

    #[tokio::test]
    async fn test_fallback_without_geometry() {
        let locator = CaretLocator::new(Arc::new(FixedCaretProbe(None)));
        let window = WindowSnapshot::new(WindowHandle(2), "Без геометрии".to_string());

        let point = locator.locate(&window).await;
        assert_eq!(point, ScreenPoint::default());
    }
}
