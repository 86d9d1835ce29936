//! Session-state machinery for the watcher context.
//!
//! Detection is a pure function over collected page facts; the
//! monitor owns the mutation subscription and the last broadcast
//! kind; the broadcaster pushes transitions across contexts and
//! triggers the completion side effects.

pub mod broadcaster;
pub mod detector;
pub mod monitor;

pub use broadcaster::{CompletionActions, SettingsSource, StateBroadcaster};
pub use detector::detect;
pub use monitor::{ChangeMonitor, StateSink};
