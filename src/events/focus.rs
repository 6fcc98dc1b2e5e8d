use serde::{Deserialize, Serialize};
use std::fmt;

/// Непрозрачный идентификатор окна (HWND / X11 window id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowHandle(pub isize);

impl WindowHandle {
    pub fn value(&self) -> isize {
        self.0
    }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// Снимок окна на момент события фокуса
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowSnapshot {
    pub handle: WindowHandle,
    pub title: String,
    pub pid: Option<u32>,
    pub geometry: Option<WindowGeometry>,
}

impl WindowSnapshot {
    pub fn new(handle: WindowHandle, title: String) -> Self {
        Self {
            handle,
            title,
            pid: None,
            geometry: None,
        }
    }

    pub fn with_pid(mut self, pid: u32) -> Self {
        self.pid = Some(pid);
        self
    }

    pub fn with_geometry(mut self, geometry: WindowGeometry) -> Self {
        self.geometry = Some(geometry);
        self
    }
}

impl fmt::Display for WindowSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.pid {
            Some(pid) => write!(f, "\"{}\" ({}, pid {})", self.title, self.handle, pid),
            None => write!(f, "\"{}\" ({})", self.title, self.handle),
        }
    }
}

/// Геометрия окна
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowGeometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl WindowGeometry {
    /// Геометрический центр окна в экранных координатах
    pub fn center(&self) -> ScreenPoint {
        ScreenPoint {
            x: self.x + (self.width / 2) as i32,
            y: self.y + (self.height / 2) as i32,
        }
    }
}

/// Точка в экранных координатах
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
}

impl fmt::Display for ScreenPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Прямоугольник текстовой каретки в экранных координатах
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CaretRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl CaretRect {
    pub fn top_left(&self) -> ScreenPoint {
        ScreenPoint {
            x: self.x,
            y: self.y,
        }
    }
}

/// Событие смены фокуса. Окно может отсутствовать (системный переход
/// фокуса без целевого окна) — такое событие движок игнорирует целиком.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusEvent {
    pub window: Option<WindowSnapshot>,
    pub timestamp: std::time::Instant,
}

impl FocusEvent {
    pub fn new(window: Option<WindowSnapshot>) -> Self {
        Self {
            window,
            timestamp: std::time::Instant::now(),
        }
    }

    pub fn focus_changed(window: WindowSnapshot) -> Self {
        Self::new(Some(window))
    }

    pub fn without_window() -> Self {
        Self::new(None)
    }
}

impl fmt::Display for FocusEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.window {
            Some(window) => write!(
                f,
                "{} ({}ms ago)",
                window,
                self.timestamp.elapsed().as_millis()
            ),
            None => write!(f, "<no window> ({}ms ago)", self.timestamp.elapsed().as_millis()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_snapshot_creation() {
        let window = WindowSnapshot::new(WindowHandle(0x42), "Test Window".to_string())
            .with_pid(1234)
            .with_geometry(WindowGeometry {
                x: 10,
                y: 20,
                width: 100,
                height: 200,
            });

        assert_eq!(window.title, "Test Window");
        assert_eq!(window.pid, Some(1234));
        assert_eq!(window.handle, WindowHandle(0x42));
    }

    #[test]
    fn test_geometry_center() {
        let geometry = WindowGeometry {
            x: 100,
            y: 200,
            width: 400,
            height: 300,
        };
        assert_eq!(geometry.center(), ScreenPoint { x: 300, y: 350 });
    }

    #[test]
    fn test_focus_event_creation() {
        let window = WindowSnapshot::new(WindowHandle(1), "Test".to_string());
        let event = FocusEvent::focus_changed(window.clone());
        assert_eq!(event.window, Some(window));

        let empty = FocusEvent::without_window();
        assert!(empty.window.is_none());
    }
}
