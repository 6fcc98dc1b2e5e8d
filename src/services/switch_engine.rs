use crate::debug_if_enabled;
use crate::error::Result;
use crate::events::FocusEvent;
use crate::rules::RuleStore;
use crate::services::caret_locator::CaretLocator;
use crate::services::identity::IdentitySource;
use crate::services::indicator::IndicatorScheduler;
use crate::services::switch_sink::SwitchSinkTrait;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};

/// Движок переключения: единственный потребитель канала событий фокуса.
///
/// Каждое событие обрабатывается до конца, прежде чем из канала будет
/// взято следующее; очереди решений нет. Шторм событий (alt-tab)
/// вырождается в строго последовательную обработку без потерь.
pub struct SwitchEngine {
    rules: Arc<RuleStore>,
    identity: Arc<dyn IdentitySource>,
    sink: Arc<dyn SwitchSinkTrait>,
    caret_locator: CaretLocator,
    indicator: Arc<IndicatorScheduler>,
}

impl SwitchEngine {
    pub fn new(
        rules: Arc<RuleStore>,
        identity: Arc<dyn IdentitySource>,
        sink: Arc<dyn SwitchSinkTrait>,
        caret_locator: CaretLocator,
        indicator: Arc<IndicatorScheduler>,
    ) -> Self {
        info!("Инициализация SwitchEngine");

        Self {
            rules,
            identity,
            sink,
            caret_locator,
            indicator,
        }
    }

    pub async fn run(self, mut events: UnboundedReceiver<FocusEvent>) -> Result<()> {
        info!("SwitchEngine запущен");

        while let Some(event) = events.recv().await {
            // Ни одна ошибка обработчика не фатальна для процесса
            if let Err(e) = self.handle_focus_event(event).await {
                warn!("Ошибка обработки события фокуса: {}", e);
            }
        }

        info!("Канал событий фокуса закрыт, SwitchEngine останавливается");
        Ok(())
    }

    /// Обработать одно событие фокуса
    pub async fn handle_focus_event(&self, event: FocusEvent) -> Result<()> {
        debug_if_enabled!("Обработка события фокуса: {}", event);

        // Событие без окна игнорируется целиком: ни идентификации,
        // ни переключения, ни индикатора
        let Some(window) = event.window else {
            debug_if_enabled!("Событие фокуса без окна, пропускаем");
            return Ok(());
        };

        // Перечитываем правила до выбора языка: решение и индикатор одного
        // события видят один и тот же набор правил
        if let Err(e) = self.rules.maybe_reload() {
            warn!("Не удалось перечитать файл правил: {}", e);
        }

        let identity = self.identity.resolve(&window);

        // Заглушка unknown не совпадает ни с одним правилом
        let target = if identity.is_unknown() {
            self.rules.default_language()
        } else {
            self.rules.decide(identity.as_str())
        };

        info!("Переключение {} -> {}", identity, target);

        // Fire-and-forget: доставку не подтверждаем и не повторяем,
        // промах исправит следующее событие фокуса этого окна
        if let Err(e) = self.sink.request_switch(&window, &target).await {
            debug_if_enabled!("Запрос переключения не доставлен: {}", e);
        }

        // Индикатор позиционируется по тому же окну, что и переключение
        let position = self.caret_locator.locate(&window).await;
        self.indicator.show(position, Some(target));

        Ok(())
    }
}
