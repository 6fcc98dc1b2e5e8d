use crate::events::ScreenPoint;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::info;

use crate::debug_if_enabled;

/// Визуальное представление индикатора. Отрисовка — внешний коллаборатор;
/// планировщику важно только "показать в точке" и "спрятать".
pub trait IndicatorView: Send + Sync {
    fn show_at(&self, position: ScreenPoint, label: Option<&str>);
    fn hide(&self);
}

/// Представление по умолчанию: индикатор живёт в логе
pub struct LogIndicatorView;

impl IndicatorView for LogIndicatorView {
    fn show_at(&self, position: ScreenPoint, label: Option<&str>) {
        match label {
            Some(label) => info!("Индикатор: {} в точке {}", label, position),
            None => info!("Индикатор в точке {}", position),
        }
    }

    fn hide(&self) {
        debug_if_enabled!("Индикатор скрыт");
    }
}

#[derive(Default)]
struct IndicatorState {
    visible: bool,
    hide_task: Option<JoinHandle<()>>,
    // Номер последнего show; устаревшая задача скрытия, пережившая abort,
    // не должна спрятать индикатор нового показа
    epoch: u64,
}

struct Inner {
    view: Arc<dyn IndicatorView>,
    state: Mutex<IndicatorState>,
}

impl Inner {
    fn on_dwell_expired(&self, epoch: u64) {
        let mut state = self.state.lock();
        if state.epoch != epoch {
            return;
        }
        state.visible = false;
        state.hide_task = None;
        self.view.hide();
    }
}

/// Единственный на процесс индикатор с таймером показа.
///
/// Повторный show до истечения таймера сбрасывает таймер, а не копит их:
/// прежняя задача скрытия отменяется и запускается новая.
pub struct IndicatorScheduler {
    inner: Arc<Inner>,
    dwell: Duration,
}

impl IndicatorScheduler {
    pub fn new(view: Arc<dyn IndicatorView>, dwell: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                view,
                state: Mutex::new(IndicatorState::default()),
            }),
            dwell,
        }
    }

    /// Показать индикатор в точке и (пере)запустить таймер скрытия
    pub fn show(&self, position: ScreenPoint, label: Option<String>) {
        let mut state = self.inner.state.lock();

        self.inner.view.show_at(position, label.as_deref());
        state.visible = true;

        // Сбрасываем прежний таймер вместо наслаивания
        if let Some(task) = state.hide_task.take() {
            task.abort();
        }
        state.epoch = state.epoch.wrapping_add(1);

        let inner = Arc::clone(&self.inner);
        let dwell = self.dwell;
        let epoch = state.epoch;
        state.hide_task = Some(tokio::spawn(async move {
            sleep(dwell).await;
            inner.on_dwell_expired(epoch);
        }));
    }

    pub fn is_visible(&self) -> bool {
        self.inner.state.lock().visible
    }
}

impl Drop for IndicatorScheduler {
    fn drop(&mut self) {
        if let Some(task) = self.inner.state.lock().hide_task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex as PlainMutex;

    #[derive(Default)]
    struct RecordingView {
        shown: PlainMutex<Vec<(ScreenPoint, Option<String>)>>,
        hidden: PlainMutex<usize>,
    }

    impl IndicatorView for RecordingView {
        fn show_at(&self, position: ScreenPoint, label: Option<&str>) {
            self.shown
                .lock()
                .push((position, label.map(str::to_string)));
        }

        fn hide(&self) {
            *self.hidden.lock() += 1;
        }
    }

    fn scheduler_with_view(dwell_ms: u64) -> (IndicatorScheduler, Arc<RecordingView>) {
        let view = Arc::new(RecordingView::default());
        let scheduler = IndicatorScheduler::new(
            view.clone() as Arc<dyn IndicatorView>,
            Duration::from_millis(dwell_ms),
        );
        (scheduler, view)
    }

    #[tokio::test(start_paused = true)]
    async fn test_show_then_auto_hide() {
        let (scheduler, view) = scheduler_with_view(1000);

        scheduler.show(ScreenPoint { x: 10, y: 20 }, Some("EN".to_string()));
        assert!(scheduler.is_visible());
        assert_eq!(view.shown.lock().len(), 1);

        sleep(Duration::from_millis(1100)).await;
        assert!(!scheduler.is_visible());
        assert_eq!(*view.hidden.lock(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reshow_resets_dwell_timer() {
        let (scheduler, view) = scheduler_with_view(1000);

        scheduler.show(ScreenPoint { x: 0, y: 0 }, Some("EN".to_string()));

        // Повторный показ на середине таймера
        sleep(Duration::from_millis(500)).await;
        scheduler.show(ScreenPoint { x: 5, y: 5 }, Some("ZH".to_string()));

        // Прежний таймер истёк бы на t=1000; индикатор всё ещё виден
        sleep(Duration::from_millis(700)).await;
        assert!(scheduler.is_visible());
        assert_eq!(*view.hidden.lock(), 0);

        // Новый таймер истекает на t=1500
        sleep(Duration::from_millis(400)).await;
        assert!(!scheduler.is_visible());
        assert_eq!(*view.hidden.lock(), 1);
        assert_eq!(view.shown.lock().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_show_after_hide_shows_again() {
        let (scheduler, _view) = scheduler_with_view(100);

        scheduler.show(ScreenPoint { x: 1, y: 1 }, None);
        sleep(Duration::from_millis(200)).await;
        assert!(!scheduler.is_visible());

        scheduler.show(ScreenPoint { x: 2, y: 2 }, None);
        assert!(scheduler.is_visible());
    }
}
