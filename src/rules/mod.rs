//! RuleStore: responsibility and boundaries
//!
//! This module owns the identity -> language rule set and the default
//! language. It is the ONLY place that reads or writes the rules file, and
//! every mutation persists the whole set synchronously before returning.
//! Hot reload rebuilds a fresh map and swaps it atomically: readers never
//! observe a rule set mid-rebuild. Decision logic beyond "rule or default"
//! belongs to SwitchEngine, not here.

mod format;
mod store;

pub use store::RuleStore;
