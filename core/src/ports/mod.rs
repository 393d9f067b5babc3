//! Ports layer - Trait definitions (interfaces).
//!
//! This module defines the interface that the application layer uses
//! to interact with the operating system. Implementations live in `adapters`.

mod system;

pub use system::SystemPort;
