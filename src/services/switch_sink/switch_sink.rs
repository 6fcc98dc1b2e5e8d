use crate::config::Config;
use crate::error::{ImsError, Result};
use crate::events::WindowSnapshot;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{info, warn};

use super::fcitx::FcitxSink;
use super::ibus::IbusSink;
use super::r#trait::SwitchSinkTrait;
use super::win32::Win32Sink;
use super::xkb_switch::XkbSwitchSink;

#[derive(Debug, Clone)]
enum WorkingBackend {
    Win32,
    Ibus,
    Fcitx,
    XkbSwitch,
}

/// Доставляет запросы переключения первым работающим бэкендом платформы.
///
/// Запросы fire-and-forget: ошибка доставки логируется, бэкенд
/// переопределяется на следующем запросе, наверх ошибка не поднимается.
pub struct RealSwitchSink {
    config: Arc<Config>,
    working_backend: Mutex<Option<WorkingBackend>>,

    // Бэкенды платформ
    win32: Win32Sink,
    ibus: IbusSink,
    fcitx: FcitxSink,
    xkb_switch: XkbSwitchSink,
}

impl RealSwitchSink {
    pub fn new(config: Arc<Config>) -> Self {
        info!("Инициализация RealSwitchSink");

        Self {
            config,
            working_backend: Mutex::new(None),
            win32: Win32Sink::new(),
            ibus: IbusSink::new(),
            fcitx: FcitxSink::new(),
            xkb_switch: XkbSwitchSink::new(),
        }
    }

    async fn detect_working_backend(&self) -> Result<WorkingBackend> {
        info!("Определяем рабочий бэкенд переключения раскладки...");

        if self.win32.test().await.is_ok() {
            info!("Используем Win32");
            return Ok(WorkingBackend::Win32);
        }

        if self.ibus.test().await.is_ok() {
            info!("Используем ibus");
            return Ok(WorkingBackend::Ibus);
        }

        if self.fcitx.test().await.is_ok() {
            info!("Используем fcitx5-remote");
            return Ok(WorkingBackend::Fcitx);
        }

        if self.xkb_switch.test().await.is_ok() {
            info!("Используем xkb-switch");
            return Ok(WorkingBackend::XkbSwitch);
        }

        Err(ImsError::ServiceUnavailable(
            "Ни один бэкенд переключения раскладки не работает".to_string(),
        ))
    }

    async fn switch_by_backend(
        &self,
        backend: &WorkingBackend,
        window: &WindowSnapshot,
        layout: &str,
    ) -> Result<()> {
        match backend {
            WorkingBackend::Win32 => self.win32.switch(window, layout).await,
            WorkingBackend::Ibus => self.ibus.switch(layout).await,
            WorkingBackend::Fcitx => self.fcitx.switch(layout).await,
            WorkingBackend::XkbSwitch => self.xkb_switch.switch(layout).await,
        }
    }
}

impl Drop for RealSwitchSink {
    fn drop(&mut self) {
        info!("RealSwitchSink завершает работу");
    }
}

#[async_trait::async_trait]
impl SwitchSinkTrait for RealSwitchSink {
    async fn request_switch(&self, window: &WindowSnapshot, language: &str) -> Result<()> {
        let Some(layout) = self.config.layout_for(language) else {
            warn!(
                "Для языка '{}' нет идентификатора раскладки в [languages], запрос отброшен",
                language
            );
            return Ok(());
        };
        let layout = layout.to_string();

        let current_backend = self.working_backend.lock().clone();
        let backend = match current_backend {
            Some(backend) => backend,
            None => {
                let backend = self.detect_working_backend().await?;
                *self.working_backend.lock() = Some(backend.clone());
                backend
            }
        };

        if let Err(e) = self.switch_by_backend(&backend, window, &layout).await {
            warn!(
                "Бэкенд {:?} не доставил запрос переключения: {}. Переопределяем...",
                backend, e
            );
            *self.working_backend.lock() = None;
        }

        Ok(())
    }
}
