use crate::error::{ImsError, Result};
use std::process::Command;
use tracing::debug;

pub struct XkbSwitchSink;

impl XkbSwitchSink {
    pub fn new() -> Self {
        Self
    }

    pub async fn test(&self) -> Result<()> {
        let output = Command::new("xkb-switch").args(["-p"]).output()?;
        if output.status.success() {
            Ok(())
        } else {
            Err(ImsError::Internal("xkb-switch failed".to_string()))
        }
    }

    /// `layout` — имя раскладки xkb, например us или ru
    pub async fn switch(&self, layout: &str) -> Result<()> {
        debug!("Переключение раскладки через xkb-switch на '{}'", layout);
        let output = Command::new("xkb-switch")
            .args(["-s", layout])
            .output()
            .map_err(|e| ImsError::Internal(format!("xkb-switch не найден: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ImsError::Internal(format!(
                "xkb-switch вернул ошибку: {}",
                stderr
            )));
        }

        Ok(())
    }
}
