use crate::config::Config;
use crate::error::{ImsError, Result};
use crate::events::{FocusEvent, WindowHandle, WindowSnapshot};
use crate::{ims_error, trace_if_enabled};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{interval, Duration};
use tracing::{debug, error, info, warn};

use super::r#trait::FocusWatcherTrait;
use super::win32::Win32Probe;
use super::xdotool::XdotoolProbe;

#[derive(Debug, Clone)]
enum WorkingProbe {
    Win32,
    Xdotool,
}

/// Опрашивает переднее окно с заданным интервалом и отправляет событие
/// фокуса в канал движка при каждой смене окна.
pub struct RealFocusWatcher {
    config: Arc<Config>,
    events: UnboundedSender<FocusEvent>,
    current_window: Option<WindowHandle>,
    working_probe: Option<WorkingProbe>,

    // Зонды платформ
    win32: Win32Probe,
    xdotool: XdotoolProbe,
}

impl RealFocusWatcher {
    pub fn new(config: Arc<Config>, events: UnboundedSender<FocusEvent>) -> Self {
        info!("Инициализация RealFocusWatcher");

        Self {
            config,
            events,
            current_window: None,
            working_probe: None,
            win32: Win32Probe::new(),
            xdotool: XdotoolProbe::new(),
        }
    }

    async fn detect_working_probe(&mut self) -> Result<WorkingProbe> {
        info!("Определяем рабочий зонд переднего окна...");

        if self.win32.test().await.is_ok() {
            info!("Используем Win32");
            return Ok(WorkingProbe::Win32);
        }

        if self.xdotool.test().await.is_ok() {
            info!("Используем xdotool");
            return Ok(WorkingProbe::Xdotool);
        }

        Err(ims_error!(
            service_unavailable,
            "Ни один зонд переднего окна не работает"
        ))
    }

    async fn foreground_by_probe(&self, probe: &WorkingProbe) -> Result<Option<WindowSnapshot>> {
        match probe {
            WorkingProbe::Win32 => self.win32.foreground_window().await,
            WorkingProbe::Xdotool => self.xdotool.foreground_window().await,
        }
    }

    fn is_window_changed(&self, new_window: Option<&WindowSnapshot>) -> bool {
        self.current_window != new_window.map(|window| window.handle)
    }

    pub async fn run(mut self) -> Result<()> {
        info!("RealFocusWatcher запущен");

        let mut interval = interval(Duration::from_millis(self.config.focus.polling_interval_ms));

        loop {
            interval.tick().await;
            trace_if_enabled!("Опрос переднего окна");

            let probe = match self.working_probe.clone() {
                Some(probe) => probe,
                None => match self.detect_working_probe().await {
                    Ok(probe) => {
                        self.working_probe = Some(probe.clone());
                        probe
                    }
                    Err(_) => {
                        error!("Ни один зонд не работает. Приостанавливаем детекцию на 10 секунд");
                        tokio::time::sleep(Duration::from_secs(10)).await;
                        continue;
                    }
                },
            };

            match self.foreground_by_probe(&probe).await {
                Ok(window) => {
                    if self.is_window_changed(window.as_ref()) {
                        self.send_focus_event(window)?;
                    }
                }
                Err(e) => {
                    warn!(
                        "Рабочий зонд {:?} перестал работать: {}. Переопределяем...",
                        probe, e
                    );
                    self.working_probe = None;
                }
            }
        }
    }

    fn send_focus_event(&mut self, window: Option<WindowSnapshot>) -> Result<()> {
        match &window {
            Some(snapshot) => info!("Смена активного окна на: {}", snapshot),
            None => debug!("Фокус ушёл в никуда"),
        }

        self.current_window = window.as_ref().map(|snapshot| snapshot.handle);

        let event = FocusEvent::new(window);
        self.events
            .send(event)
            .map_err(|e| ImsError::Internal(format!("Канал событий фокуса закрыт: {}", e)))?;
        Ok(())
    }
}

impl Drop for RealFocusWatcher {
    fn drop(&mut self) {
        info!("RealFocusWatcher завершает работу");
    }
}

#[async_trait::async_trait]
impl FocusWatcherTrait for RealFocusWatcher {
    async fn run(self: Box<Self>) -> Result<()> {
        (*self).run().await
    }
}
