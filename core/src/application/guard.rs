//! Guarded process termination.
//!
//! The ordinary kill path always re-resolves and re-classifies the target
//! itself. A "protected" flag computed at scan time is never trusted here:
//! the PID may have been reused since.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::domain::{is_critical, is_permission_error, AccessCheck, KillFailure, KillResult};
use crate::error::Error;
use crate::ports::SystemPort;

use super::ProcessResolver;

/// How long a process gets to exit after a graceful request before it is forced.
pub const GRACEFUL_KILL_TIMEOUT: Duration = Duration::from_millis(500);

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Outcome of the graceful-then-forced termination sequence.
#[derive(Debug)]
pub enum Escalation {
    /// The process exited after the graceful request.
    Graceful,
    /// The graceful request failed or was ignored, and the forced stop succeeded.
    Forced { graceful_error: Error },
    /// A primitive reported that the process no longer exists.
    AlreadyExited,
    /// Both stages failed.
    Failed {
        graceful_error: Error,
        forced_error: Error,
    },
}

impl Escalation {
    pub fn terminated(&self) -> bool {
        !matches!(self, Escalation::Failed { .. })
    }
}

/// Terminates processes under the critical-process policy.
///
/// Stateless; safe to share between concurrent callers.
pub struct TerminationGuard<S: SystemPort> {
    system: Arc<S>,
    resolver: ProcessResolver<S>,
    grace_period: Duration,
}

impl<S: SystemPort> TerminationGuard<S> {
    pub fn new(system: Arc<S>) -> Self {
        let resolver = ProcessResolver::new(Arc::clone(&system));
        Self {
            system,
            resolver,
            grace_period: GRACEFUL_KILL_TIMEOUT,
        }
    }

    /// Override how long a gracefully signalled process may take to exit.
    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// Kill a process unless it is a critical system process.
    ///
    /// Resolves the current name, refuses protected processes, then runs
    /// [`escalate`](Self::escalate).
    pub async fn kill(&self, pid: u32) -> KillResult {
        let name = match self.resolver.name(pid).await {
            Ok(name) => name,
            Err(Error::NotFound(_)) => {
                return KillResult::failed(
                    format!("Process {} not found (may have already terminated)", pid),
                    KillFailure::NotFound { pid },
                );
            }
            Err(e) => {
                debug!(pid = pid, error = %e, "Cannot resolve process name, refusing to kill");
                return KillResult::failed(
                    format!("Failed to get process name: {}", e),
                    KillFailure::Unresolvable {
                        pid,
                        detail: e.to_string(),
                    },
                );
            }
        };

        if is_critical(&name) {
            warn!(pid = pid, name = %name, "Refusing to kill critical system process");
            return KillResult::failed(
                format!("Refusing to kill critical system process: {}", name),
                KillFailure::Protected { pid, name },
            );
        }

        match self.escalate(pid).await {
            Escalation::Graceful | Escalation::Forced { .. } => {
                info!(pid = pid, name = %name, "Process killed");
                KillResult::succeeded(format!("Successfully killed process {} ({})", pid, name))
            }
            Escalation::AlreadyExited => {
                KillResult::succeeded(format!("Process {} ({}) had already exited", pid, name))
            }
            Escalation::Failed { forced_error, .. } => termination_failure(pid, &name, &forced_error),
        }
    }

    /// Kill a process only if it still carries the name the caller saw.
    ///
    /// Guards against the PID having been reused since the caller's scan.
    pub async fn kill_with_verification(&self, pid: u32, expected_name: &str) -> KillResult {
        let actual = match self.resolver.name(pid).await {
            Ok(name) => name,
            Err(e) => {
                let failure = match e {
                    Error::NotFound(_) => KillFailure::NotFound { pid },
                    ref other => KillFailure::Unresolvable {
                        pid,
                        detail: other.to_string(),
                    },
                };
                return KillResult::failed(format!("Failed to verify process: {}", e), failure);
            }
        };

        if actual != expected_name {
            warn!(pid = pid, expected = expected_name, actual = %actual, "Process name mismatch");
            return KillResult::failed(
                format!(
                    "Process name mismatch: expected {}, got {}",
                    expected_name, actual
                ),
                KillFailure::Mismatch {
                    pid,
                    expected: expected_name.to_string(),
                    actual,
                },
            );
        }

        self.kill(pid).await
    }

    /// Forcefully stop a process WITHOUT the critical-process check.
    ///
    /// This is the escape hatch for operators who must stop a protected
    /// process. It skips name resolution and classification entirely and
    /// goes straight to the forced primitive. Killing an OS-critical process
    /// can crash or hang the machine.
    pub async fn force_kill(&self, pid: u32) -> KillResult {
        warn!(pid = pid, "Force killing process without critical-process check");

        match self.system.force_terminate(pid).await {
            Ok(()) => {
                info!(pid = pid, "Process force killed");
                KillResult::succeeded(format!("Force killed process {}", pid))
            }
            Err(Error::NotFound(_)) => KillResult::failed(
                format!("Process {} not found", pid),
                KillFailure::NotFound { pid },
            ),
            Err(e) if is_permission_denied(&e) => KillResult::failed(
                format!(
                    "Permission denied. Run with elevated privileges (Administrator or root) to kill process {}",
                    pid
                ),
                KillFailure::PermissionDenied {
                    pid,
                    detail: raw_text(&e),
                },
            ),
            Err(e) => KillResult::failed(
                format!("Failed to kill process: {}", raw_text(&e)),
                KillFailure::Failed {
                    pid,
                    detail: raw_text(&e),
                },
            ),
        }
    }

    /// Request graceful termination, falling back to a forced stop if the
    /// request fails or the process outlives the grace period.
    pub async fn escalate(&self, pid: u32) -> Escalation {
        let graceful_error = match self.system.terminate(pid).await {
            Ok(()) => {
                if self.wait_for_exit(pid).await {
                    debug!(pid = pid, "Process terminated after graceful request");
                    return Escalation::Graceful;
                }
                Error::KillFailed {
                    pid,
                    reason: format!(
                        "process still running {}ms after graceful termination request",
                        self.grace_period.as_millis()
                    ),
                }
            }
            Err(e) if e.is_not_found() => {
                debug!(pid = pid, "Process exited before graceful termination");
                return Escalation::AlreadyExited;
            }
            Err(e) => e,
        };

        debug!(pid = pid, error = %graceful_error, "Graceful termination failed, forcing");

        match self.system.force_terminate(pid).await {
            Ok(()) => Escalation::Forced { graceful_error },
            Err(e) if e.is_not_found() => {
                debug!(pid = pid, "Process exited before forced termination");
                Escalation::AlreadyExited
            }
            Err(forced_error) => {
                warn!(pid = pid, error = %forced_error, "Forced termination failed");
                Escalation::Failed {
                    graceful_error,
                    forced_error,
                }
            }
        }
    }

    /// Poll until `pid` is gone or the grace period runs out.
    ///
    /// A failed existence check counts as still running.
    async fn wait_for_exit(&self, pid: u32) -> bool {
        let deadline = Instant::now() + self.grace_period;
        loop {
            if !self.system.process_exists(pid).await.unwrap_or(true) {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            sleep(EXIT_POLL_INTERVAL.min(deadline - now)).await;
        }
    }

    /// Check whether the process metadata is readable, without touching the
    /// process.
    ///
    /// Advisory only; [`kill`](Self::kill) performs its own checks.
    pub async fn check_access(&self, pid: u32) -> AccessCheck {
        match self.resolver.name(pid).await {
            Ok(_) => AccessCheck {
                allowed: true,
                reason: "OK".to_string(),
            },
            Err(Error::NotFound(_)) => AccessCheck {
                allowed: false,
                reason: "Process not found".to_string(),
            },
            Err(e) if is_permission_denied(&e) || e.to_string().to_lowercase().contains("access") => {
                AccessCheck {
                    allowed: false,
                    reason: "Access denied - requires administrator privileges".to_string(),
                }
            }
            Err(e) => AccessCheck {
                allowed: false,
                reason: e.to_string(),
            },
        }
    }

    /// Whether this program runs with administrator/root privileges.
    pub async fn is_elevated(&self) -> bool {
        self.system.is_elevated().await
    }
}

fn is_permission_denied(error: &Error) -> bool {
    matches!(error, Error::PermissionDenied(_)) || is_permission_error(&error.to_string())
}

/// The OS text of an error, without our own framing where we have it.
fn raw_text(error: &Error) -> String {
    match error {
        Error::KillFailed { reason, .. } => reason.clone(),
        Error::PermissionDenied(reason) => reason.clone(),
        other => other.to_string(),
    }
}

fn termination_failure(pid: u32, name: &str, error: &Error) -> KillResult {
    if is_permission_denied(error) {
        KillResult::failed(
            format!(
                "Permission denied. Run with elevated privileges (Administrator or root) to kill process {} ({})",
                pid, name
            ),
            KillFailure::PermissionDenied {
                pid,
                detail: raw_text(error),
            },
        )
    } else {
        KillResult::failed(
            format!("Failed to kill process {} ({}): {}", pid, name, raw_text(error)),
            KillFailure::Failed {
                pid,
                detail: raw_text(error),
            },
        )
    }
}
