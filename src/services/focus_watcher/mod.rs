//! FocusWatcher service: responsibility and boundaries
//!
//! This module and its submodules are responsible ONLY for observing the
//! foreground window and emitting FocusEvent(s) into the engine channel.
//! It MUST NOT contain any business logic related to rules, languages, or
//! switch decisions. All switching decisions are made exclusively by
//! SwitchEngine, using the RuleStore.

mod dry_run;
mod focus_watcher;
mod r#trait;
mod win32;
mod xdotool;

pub use self::r#trait::create_focus_watcher;
