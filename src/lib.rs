//! Small developer productivity tools sharing one crate: a time tracker with a live terminal
//! display, a file clipper, a Python outline explorer, a bookmark launcher and a shell shortcut
//! dispatcher. Every tool is its own binary.
//!

pub mod ast;
pub mod catalog;
pub mod clipper;
pub mod fs;
pub mod linker;
pub mod shortcut;
pub mod tracker;
pub mod utils;
