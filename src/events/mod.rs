pub mod focus;

pub use focus::{CaretRect, FocusEvent, ScreenPoint, WindowGeometry, WindowHandle, WindowSnapshot};
