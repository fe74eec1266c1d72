//! Spawning a player program as a subprocess.

use anyhow::{Context, Result};
use tokio::process::{Child, Command};

/// Spawns `argv[0]` with `argv[1..]` as a subprocess with piped stdin,
/// stdout, and stderr.
///
/// The child is placed in its own process group (via `setsid` on Unix) so
/// that killing it does not require chasing a process tree, and
/// `kill_on_drop` is set as a safety net against a leaked [`Child`]
/// outliving the harness's intent to terminate it.
pub async fn spawn_player(argv: &[String]) -> Result<Child> {
    let (program, args) = argv
        .split_first()
        .context("empty argv: script produced no command to launch")?;

    let mut cmd = Command::new(program);
    cmd.args(args);
    cmd.stdin(std::process::Stdio::piped());
    cmd.stdout(std::process::Stdio::piped());
    cmd.stderr(std::process::Stdio::piped());
    cmd.kill_on_drop(true);

    #[cfg(unix)]
    unsafe {
        use std::os::unix::process::CommandExt;
        cmd.pre_exec(|| {
            libc::setsid();
            Ok(())
        });
    }

    let child = cmd
        .spawn()
        .with_context(|| format!("failed to spawn subprocess: {program}"))?;
    tracing::debug!(program = %program, pid = ?child.id(), "spawned player subprocess");
    Ok(child)
}

/// Best-effort, idempotent SIGKILL by pid, for killing a worker's
/// subprocess from outside the task that owns its `Child` handle (e.g.
/// the match deadline timeout, which has no other way to reach a worker
/// whose interpreter task is still running).
#[cfg(unix)]
pub fn force_kill(pid: u32) {
    tracing::warn!(pid, "force-killing worker subprocess");
    unsafe {
        libc::kill(pid as i32, libc::SIGKILL);
    }
}

#[cfg(not(unix))]
pub fn force_kill(_pid: u32) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn spawns_a_simple_command() {
        let argv = vec!["/bin/echo".to_string(), "hello".to_string()];
        let child = spawn_player(&argv).await.unwrap();
        assert!(child.id().is_some());
    }

    #[tokio::test]
    async fn rejects_empty_argv() {
        assert!(spawn_player(&[]).await.is_err());
    }
}
