use crate::error::{ImsError, Result};
use std::process::Command;
use tracing::debug;

pub struct IbusSink;

impl IbusSink {
    pub fn new() -> Self {
        Self
    }

    pub async fn test(&self) -> Result<()> {
        let output = Command::new("ibus").args(["engine"]).output()?;
        if output.status.success() {
            Ok(())
        } else {
            Err(ImsError::Internal("ibus failed".to_string()))
        }
    }

    /// `layout` — имя движка ibus, например xkb:us::eng
    pub async fn switch(&self, layout: &str) -> Result<()> {
        debug!("Переключение раскладки через ibus на '{}'", layout);
        let output = Command::new("ibus")
            .args(["engine", layout])
            .output()
            .map_err(|e| ImsError::Internal(format!("ibus не найден: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ImsError::Internal(format!(
                "ibus вернул ошибку: {}",
                stderr
            )));
        }

        Ok(())
    }
}
