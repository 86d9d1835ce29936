//! chessbridge runtime.
//!
//! Wires the isolated execution contexts — the page watcher, the
//! background coordinator and the control surface — over the message
//! bus, and hosts the external collaborators (settings, persistent
//! storage, the analysis-open flow).

pub mod affordance;
pub mod coordinator;
pub mod flow;
pub mod settings;
pub mod storage;
pub mod watcher;

pub use coordinator::CoordinatorContext;
pub use flow::{AnalysisOpener, Navigator};
pub use settings::SettingsService;
pub use storage::Storage;
pub use watcher::WatcherContext;
