//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem, PageSink)
//! but are themselves concrete structs, not traits.

mod render;

pub use render::{strip_markup, RenderMode, RenderService, RenderedPage};
