use crate::config::Config;
use crate::error::Result;
use crate::events::FocusEvent;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// Trait for focus watchers that can run in different modes
#[async_trait::async_trait]
pub trait FocusWatcherTrait {
    /// Run the focus watcher
    async fn run(self: Box<Self>) -> Result<()>;
}

/// Factory function to create an appropriate focus watcher based on the dry_run flag
pub fn create_focus_watcher(
    config: Arc<Config>,
    events: UnboundedSender<FocusEvent>,
    dry_run: bool,
) -> Result<Box<dyn FocusWatcherTrait + Send>> {
    if dry_run {
        Ok(Box::new(super::dry_run::DryRunWatcher::new(events)))
    } else {
        Ok(Box::new(super::focus_watcher::RealFocusWatcher::new(
            config, events,
        )))
    }
}
