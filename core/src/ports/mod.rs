//! Ports layer - Trait definitions (interfaces).
//!
//! This module defines the interfaces that the application layer uses
//! to interact with the operating system. Implementations live in `adapters`.

mod actions;
mod process_table;

pub use actions::ProcessActions;
pub use process_table::ProcessTable;
