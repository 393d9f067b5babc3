//! Application layer - Use case services.
//!
//! This module contains the services that orchestrate domain logic and
//! the [`SystemPort`](crate::ports::SystemPort) capability:
//! - [`ProcessResolver`]: PID to process metadata
//! - [`ConnectionScanner`]: connection enumeration joined with process metadata
//! - [`TerminationGuard`]: policy-checked process termination
//!
//! Services are generic over the capability and hold no mutable state, so a
//! single instance can be shared across tasks.

mod guard;
mod resolver;
mod scanner;

pub use guard::{Escalation, TerminationGuard};
pub use resolver::ProcessResolver;
pub use scanner::{ConnectionScanner, ProcessCache};
