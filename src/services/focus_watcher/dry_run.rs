use crate::error::{ImsError, Result};
use crate::events::{FocusEvent, WindowGeometry, WindowHandle, WindowSnapshot};
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{interval, Duration};
use tracing::info;

use super::r#trait::FocusWatcherTrait;

/// Эмуляция смены окон для режима сухого запуска
pub struct DryRunWatcher {
    events: UnboundedSender<FocusEvent>,
}

impl DryRunWatcher {
    pub fn new(events: UnboundedSender<FocusEvent>) -> Self {
        Self { events }
    }

    pub async fn run(&mut self) -> Result<()> {
        info!("Dry-run режим - FocusWatcher работает в режиме эмуляции");

        let fake_windows = [
            "Code.exe - dry_run",
            "Notepad.exe - dry_run",
            "Browser.exe - dry_run",
            "Terminal.exe - dry_run",
        ];

        let mut window_index = 0;
        let mut interval = interval(Duration::from_secs(10));

        loop {
            interval.tick().await;

            let fake_window = WindowSnapshot::new(
                WindowHandle(1000 + window_index as isize),
                fake_windows[window_index].to_string(),
            )
            .with_geometry(WindowGeometry {
                x: 100,
                y: 100,
                width: 800,
                height: 600,
            });

            info!("Dry-run: эмулируем смену окна на: {}", fake_window.title);
            self.events
                .send(FocusEvent::focus_changed(fake_window))
                .map_err(|e| {
                    ImsError::Internal(format!("Канал событий фокуса закрыт: {}", e))
                })?;

            window_index = (window_index + 1) % fake_windows.len();
        }
    }
}

#[async_trait::async_trait]
impl FocusWatcherTrait for DryRunWatcher {
    async fn run(mut self: Box<Self>) -> Result<()> {
        (*self).run().await
    }
}
