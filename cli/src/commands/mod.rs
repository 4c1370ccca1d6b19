//! CLI command implementations.

pub mod announce;
pub mod children;
pub mod config;
pub mod demo;
pub mod foreground;
pub mod reap;
