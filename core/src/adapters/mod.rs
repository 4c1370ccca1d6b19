//! Adapters layer - Operating system implementations.
//!
//! This module contains implementations of the port traits defined in `ports`.
//! Each adapter handles one platform-specific concern.

pub mod actions;
pub mod messaging;
pub mod process_table;

// Re-export main types for convenience
pub use actions::PlatformProcessActions;
pub use messaging::{broadcast_activation, DEFAULT_ACTIVATION_MESSAGE};
pub use process_table::PlatformProcessTable;
