//! Workspace façade crate.
//!
//! Re-exports the individual workspace crates (`bridge-traits`, `core-runtime`,
//! `core-playback`, and optionally `bridge-desktop`) so host applications can
//! depend on `streamer-workspace` and enable the documented features without
//! wiring each crate individually.

pub use bridge_traits;
pub use core_playback;
pub use core_runtime;

#[cfg(feature = "desktop-shims")]
pub use bridge_desktop;
