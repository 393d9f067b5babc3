//! Unix termination via signals.

use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::{geteuid, Pid};
use tracing::debug;

use crate::error::{Error, Result};

/// Send SIGTERM.
pub async fn terminate(pid: u32) -> Result<()> {
    send_signal(pid, Signal::SIGTERM)
}

/// Send SIGKILL.
pub async fn force_terminate(pid: u32) -> Result<()> {
    send_signal(pid, Signal::SIGKILL)
}

pub async fn is_elevated() -> bool {
    geteuid().is_root()
}

fn send_signal(pid: u32, signal: Signal) -> Result<()> {
    debug!(pid = pid, signal = signal.as_str(), "Sending signal to process");

    // PIDs above i32::MAX cannot name a process, and 0 would signal our own group.
    let raw = match i32::try_from(pid) {
        Ok(raw) if raw > 0 => raw,
        _ => return Err(Error::NotFound(pid)),
    };

    kill(Pid::from_raw(raw), signal).map_err(|errno| match errno {
        Errno::ESRCH => Error::NotFound(pid),
        Errno::EPERM => Error::PermissionDenied(errno.desc().to_string()),
        other => Error::KillFailed {
            pid,
            reason: other.desc().to_string(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_signal_missing_process() {
        // Above the default pid_max on Linux and macOS.
        let result = terminate(i32::MAX as u32).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_invalid_pids_are_not_found() {
        assert!(matches!(force_terminate(0).await, Err(Error::NotFound(0))));
        assert!(matches!(
            force_terminate(u32::MAX).await,
            Err(Error::NotFound(u32::MAX))
        ));
    }
}
