//! Core state model for a construction-site workforce board: employees and
//! their per-date work-area assignments, cached locally and reconciled with a
//! remote spreadsheet-backed store that may be unreachable at any time.
//!
//! The crate never touches presentation state. Drag-and-drop arrives as
//! discrete move events, exports consume report rows, and the remote store is
//! reached through the [`remote::adapter::Transport`] seam.

pub mod app;
pub mod board;
pub mod cache;
pub mod config;
pub mod data;
pub mod remote;
pub mod report;

pub use app::Site;
pub use config::Config;
