//! Application layer - Use case services.
//!
//! Services orchestrate domain logic over the ports:
//! - Accept domain types as inputs
//! - Use ports (traits) for OS access
//! - Return domain types as outputs

mod tree_controller;

pub use tree_controller::ProcessTreeController;
