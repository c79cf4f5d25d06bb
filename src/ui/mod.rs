//! Terminal UI rendering using ratatui.
//!
//! ## Submodules
//!
//! - [`charts`]: Line charts of the three sample windows
//! - [`alert`]: Modal overlay showing the oldest undismissed alert
//! - [`common`]: Shared components (header, tabs, status bar, help overlay)
//! - [`theme`]: Light/dark theme support with terminal auto-detection
//!
//! ## Rendering Architecture
//!
//! The main loop in `main.rs` draws one frame per tick:
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ Header (common::render_header)       │
//! ├──────────────────────────────────────┤
//! │ Tabs (common::render_tabs)           │
//! ├──────────────────────────────────────┤
//! │                                      │
//! │ Charts (charts::render)              │
//! │                                      │
//! ├──────────────────────────────────────┤
//! │ Status Bar (common::render_status)   │
//! └──────────────────────────────────────┘
//!         ↑
//!    Overlays rendered on top:
//!    - alert::render_overlay
//!    - common::render_help
//! ```

pub mod alert;
pub mod charts;
pub mod common;
pub mod theme;

pub use theme::Theme;
