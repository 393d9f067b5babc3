//! Terminate real child processes through the platform system.
#![cfg(unix)]

use std::os::unix::process::ExitStatusExt;
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::time::Duration;

use nix::sys::signal::Signal;
use portexec_core::{PlatformSystem, TerminationGuard};

fn spawn_shell(script: &str) -> std::process::Child {
    let child = Command::new("sh")
        .args(["-c", script])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();
    // Let the shell install its traps before it is signalled.
    std::thread::sleep(Duration::from_millis(200));
    child
}

#[tokio::test]
async fn test_sigterm_ignoring_process_is_force_killed() {
    let mut child = spawn_shell("trap '' TERM; exec sleep 30");
    let guard = TerminationGuard::new(Arc::new(PlatformSystem::new()))
        .with_grace_period(Duration::from_millis(300));

    let result = guard.kill(child.id()).await;
    assert!(result.success, "{}", result.message);

    let status = child.wait().unwrap();
    assert_eq!(status.signal(), Some(Signal::SIGKILL as i32));
}

#[tokio::test]
async fn test_cooperative_process_exits_on_sigterm() {
    let mut child = spawn_shell("exec sleep 30");
    let guard = TerminationGuard::new(Arc::new(PlatformSystem::new()));

    let result = guard.kill(child.id()).await;
    assert!(result.success, "{}", result.message);

    let status = child.wait().unwrap();
    assert_eq!(status.signal(), Some(Signal::SIGTERM as i32));
}
