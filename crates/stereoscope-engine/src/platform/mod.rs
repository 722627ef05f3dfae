//! Platform adapters.
//!
//! Binds the scheduler's injected traits to winit: the window as the
//! presentation surface, redraw requests as the mono tick source, and
//! window pointer events as camera drags.

pub mod winit;
