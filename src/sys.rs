//! The boundary to the windowing system, plus an in-memory stand-in for it.

pub mod geometry;
pub mod headless;
pub mod screen;
pub mod window;
pub mod window_server;
