use crate::error::Result;
use crate::events::WindowSnapshot;
use tracing::info;

use super::r#trait::SwitchSinkTrait;

/// Сухой запуск: запросы переключения только логируются
pub struct DryRunSink;

impl DryRunSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl SwitchSinkTrait for DryRunSink {
    async fn request_switch(&self, window: &WindowSnapshot, language: &str) -> Result<()> {
        info!("[DRY RUN] Переключение {} на язык {}", window, language);
        Ok(())
    }
}
