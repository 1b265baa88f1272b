//! Windowed rendering over large ordered collections
//!
//! Only rows intersecting the viewport (plus a buffer) are materialized.

pub mod layout;
pub mod renderer;

pub use layout::{ItemHeight, ListLayout};
pub use renderer::{ElementHost, ListState, VirtualList, VirtualListOptions};
