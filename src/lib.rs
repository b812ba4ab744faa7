//! pagegen: server-side page tree compilation and rendering.
//!
//! A [`domain::Page`] owns a tree of nodes. Rendering expands the tree to a
//! fixed point, runs the registered finalizers once and emits HTML; later
//! renders only repeat the emission.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
