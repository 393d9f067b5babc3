//! Domain layer - Pure data models and policy.
//!
//! This module contains the value types exchanged with consumers and the
//! critical-process classifier. Nothing here performs I/O.

pub mod critical;
mod connection;
mod filter;
mod kill;
mod process;

// Re-export all domain types
pub use connection::{join_host_port, ConnectionEntry, ConnectionState, Protocol, RawConnection};
pub use critical::{classify, is_critical, Criticality};
pub use filter::{filter_entries, is_valid_port, FilterCriteria};
pub use kill::{is_permission_error, AccessCheck, KillFailure, KillResult};
pub use process::{ProcessInfo, UNKNOWN_PROCESS_NAME};
