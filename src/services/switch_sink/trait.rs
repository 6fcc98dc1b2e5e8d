use crate::config::Config;
use crate::error::Result;
use crate::events::WindowSnapshot;
use std::sync::Arc;

/// Trait for switch sinks that can run in different modes
#[async_trait::async_trait]
pub trait SwitchSinkTrait: Send + Sync {
    /// Post a fire-and-forget "change input language" request for the window
    async fn request_switch(&self, window: &WindowSnapshot, language: &str) -> Result<()>;
}

/// Factory function to create an appropriate switch sink based on the dry_run flag
pub fn create_switch_sink(
    config: Arc<Config>,
    dry_run: bool,
) -> Result<Arc<dyn SwitchSinkTrait>> {
    if dry_run {
        Ok(Arc::new(super::dry_run::DryRunSink::new()))
    } else {
        Ok(Arc::new(super::switch_sink::RealSwitchSink::new(config)))
    }
}
