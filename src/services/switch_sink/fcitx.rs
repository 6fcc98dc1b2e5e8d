use crate::error::{ImsError, Result};
use std::process::Command;
use tracing::debug;

pub struct FcitxSink;

impl FcitxSink {
    pub fn new() -> Self {
        Self
    }

    pub async fn test(&self) -> Result<()> {
        let output = Command::new("fcitx5-remote").output()?;
        if output.status.success() {
            Ok(())
        } else {
            Err(ImsError::Internal("fcitx5-remote failed".to_string()))
        }
    }

    /// `layout` — имя метода ввода fcitx, например keyboard-us
    pub async fn switch(&self, layout: &str) -> Result<()> {
        debug!("Переключение раскладки через fcitx5-remote на '{}'", layout);
        let output = Command::new("fcitx5-remote")
            .args(["-s", layout])
            .output()
            .map_err(|e| ImsError::Internal(format!("fcitx5-remote не найден: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ImsError::Internal(format!(
                "fcitx5-remote вернул ошибку: {}",
                stderr
            )));
        }

        Ok(())
    }
}
