//! Adapters layer - External system implementations.
//!
//! This module contains implementations of the [`SystemPort`](crate::ports::SystemPort)
//! trait: the real operating system and a scripted in-memory one.

pub mod memory;
pub mod system;

// Re-export main types for convenience
pub use memory::InMemorySystem;
pub use system::PlatformSystem;
