//! SwitchSink service: responsibility and boundaries
//!
//! This module delivers asynchronous "change input language" requests to the
//! OS. Delivery is fire-and-forget: there is no acknowledgement channel, no
//! retry, and a failed request is only logged. Which language to request is
//! decided exclusively by SwitchEngine; this module only maps a language
//! code to the platform layout identifier and posts it.

mod dry_run;
mod fcitx;
mod ibus;
mod switch_sink;
mod r#trait;
mod win32;
mod xkb_switch;

pub use self::r#trait::{create_switch_sink, SwitchSinkTrait};
