//! Record injection into the target analysis board.
//!
//! The injection pipeline fills the board's PGN input with synthetic
//! events, activates the host page's own parsing, and clicks the
//! import control when one can be found. Waits are bounded
//! subscriptions on the mutation feed, never sleep loops.

pub mod banner;
pub mod injector;
pub mod wait;

pub use banner::{show_banner, BannerKind};
pub use injector::{InjectionOutcome, InjectionPipeline};
pub use wait::wait_for_element;
