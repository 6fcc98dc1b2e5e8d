use crate::error::{ImsError, Result};
use crate::events::{WindowGeometry, WindowHandle, WindowSnapshot};
use std::process::Command;
use tracing::debug;

pub struct XdotoolProbe;

impl XdotoolProbe {
    pub fn new() -> Self {
        Self
    }

    pub async fn test(&self) -> Result<()> {
        let output = Command::new("xdotool")
            .args(["getactivewindow", "getwindowname"])
            .output()?;
        if output.status.success() {
            Ok(())
        } else {
            Err(ImsError::Internal("xdotool failed".to_string()))
        }
    }

    pub async fn foreground_window(&self) -> Result<Option<WindowSnapshot>> {
        debug!("Попытка получить активное окно через xdotool");
        let id_output = Command::new("xdotool")
            .args(["getactivewindow"])
            .output()
            .map_err(|e| {
                debug!("xdotool не найден или не работает: {}", e);
                ImsError::Internal(format!("xdotool не найден: {}", e))
            })?;

        if !id_output.status.success() {
            let stderr = String::from_utf8_lossy(&id_output.stderr);
            debug!("xdotool вернул ошибку: {}", stderr);
            return Err(ImsError::Internal(format!(
                "xdotool вернул ошибку: {}",
                stderr
            )));
        }

        let id_text = String::from_utf8_lossy(&id_output.stdout).trim().to_string();
        let handle = match id_text.parse::<isize>() {
            Ok(id) => WindowHandle(id),
            Err(_) => {
                return Err(ImsError::Internal(format!(
                    "xdotool вернул некорректный id окна: '{}'",
                    id_text
                )))
            }
        };

        let title = Self::query_text(&["getactivewindow", "getwindowname"]).unwrap_or_default();

        let mut snapshot = WindowSnapshot::new(handle, title);

        if let Some(pid) = Self::query_text(&["getactivewindow", "getwindowpid"])
            .and_then(|text| text.parse::<u32>().ok())
        {
            snapshot = snapshot.with_pid(pid);
        }

        if let Some(geometry) = Self::query_geometry() {
            snapshot = snapshot.with_geometry(geometry);
        }

        Ok(Some(snapshot))
    }

    fn query_text(args: &[&str]) -> Option<String> {
        let output = Command::new("xdotool").args(args).output().ok()?;
        if !output.status.success() {
            return None;
        }
        Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Разбор вывода `getwindowgeometry --shell`: строки вида X=..., Y=...,
    /// WIDTH=..., HEIGHT=...
    fn query_geometry() -> Option<WindowGeometry> {
        let text = Self::query_text(&["getactivewindow", "getwindowgeometry", "--shell"])?;

        let mut x = None;
        let mut y = None;
        let mut width = None;
        let mut height = None;

        for line in text.lines() {
            if let Some((key, value)) = line.split_once('=') {
                match key.trim() {
                    "X" => x = value.trim().parse::<i32>().ok(),
                    "Y" => y = value.trim().parse::<i32>().ok(),
                    "WIDTH" => width = value.trim().parse::<u32>().ok(),
                    "HEIGHT" => height = value.trim().parse::<u32>().ok(),
                    _ => {}
                }
            }
        }

        Some(WindowGeometry {
            x: x?,
            y: y?,
            width: width?,
            height: height?,
        })
    }
}
