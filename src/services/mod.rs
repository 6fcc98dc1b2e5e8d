pub mod caret_locator;
pub mod discovery;
pub mod focus_watcher;
pub mod identity;
pub mod indicator;
pub mod switch_engine;
pub mod switch_sink;

pub use caret_locator::{create_caret_probe, CaretLocator};
pub use discovery::{create_window_enumerator, Discovery};
pub use focus_watcher::create_focus_watcher;
pub use identity::create_identity_source;
pub use indicator::{IndicatorScheduler, LogIndicatorView};
pub use switch_engine::SwitchEngine;
pub use switch_sink::create_switch_sink;
