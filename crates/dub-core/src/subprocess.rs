//! Explicit-argv subprocess invocation.
//!
//! Every external process — the media muxer, a local TTS binary — goes
//! through here so the argv-safety checks and wall-clock timeout are
//! applied uniformly. Never builds a shell string.

use dub_common::{DubError, Result};
use log::{debug, warn};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::timeout;

/// Rejects path arguments containing null bytes, `..` traversal segments,
/// or shell metacharacters in the basename, even though no shell is ever
/// invoked.
pub fn validate_path_arg(path: &Path) -> Result<()> {
    let s = path
        .to_str()
        .ok_or_else(|| DubError::InvalidPath("path is not valid UTF-8".into()))?;
    if s.contains('\0') {
        return Err(DubError::InvalidPath("path contains a null byte".into()));
    }
    if path.components().any(|c| c.as_os_str() == "..") {
        return Err(DubError::InvalidPath("path contains a `..` segment".into()));
    }
    let basename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    const SHELL_METACHARS: &[char] = &[
        ';', '|', '&', '$', '`', '>', '<', '\n', '(', ')', '{', '}', '*', '?', '~',
    ];
    if basename.chars().any(|c| SHELL_METACHARS.contains(&c)) {
        return Err(DubError::InvalidPath(format!(
            "basename contains shell metacharacters: {basename}"
        )));
    }
    Ok(())
}

/// Runs `program` with `args` via an explicit argument vector, enforcing a
/// wall-clock `deadline`. On timeout the process is killed and the call
/// fails.
pub async fn run(program: &str, args: &[&str], deadline: Duration) -> Result<()> {
    debug!("subprocess: {program} {}", args.join(" "));

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| DubError::FatalSubprocess(format!("failed to spawn {program}: {e}")))?;

    let mut stderr = child.stderr.take();

    let wait = async {
        let status = child
            .wait()
            .await
            .map_err(|e| DubError::FatalSubprocess(format!("wait failed: {e}")))?;
        let mut stderr_head = String::new();
        if let Some(mut pipe) = stderr.take() {
            let mut buf = vec![0u8; 4096];
            if let Ok(n) = pipe.read(&mut buf).await {
                stderr_head = String::from_utf8_lossy(&buf[..n]).into_owned();
            }
        }
        Ok::<_, DubError>((status, stderr_head))
    };

    match timeout(deadline, wait).await {
        Ok(Ok((status, stderr_head))) => {
            if status.success() {
                Ok(())
            } else {
                let head: String = stderr_head.chars().take(500).collect();
                Err(DubError::FatalSubprocess(format!(
                    "{program} exited with {status}: {head}"
                )))
            }
        }
        Ok(Err(e)) => Err(e),
        Err(_) => {
            warn!("{program} exceeded deadline of {:?}, killing", deadline);
            let _ = child.kill().await;
            Err(DubError::ProcessTimeout(format!(
                "{program} exceeded {:?}",
                deadline
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn rejects_traversal_and_metacharacters() {
        assert!(validate_path_arg(&PathBuf::from("../../etc/passwd")).is_err());
        assert!(validate_path_arg(&PathBuf::from("/tmp/foo;rm -rf.wav")).is_err());
        assert!(validate_path_arg(&PathBuf::from("/tmp/safe_name-123.wav")).is_ok());
    }

    #[tokio::test]
    async fn timeout_kills_and_fails() {
        let result = run("sleep", &["5"], Duration::from_millis(50)).await;
        assert!(matches!(result, Err(DubError::ProcessTimeout(_))));
    }

    #[tokio::test]
    async fn nonzero_exit_is_fatal() {
        let result = run("false", &[], Duration::from_secs(5)).await;
        assert!(matches!(result, Err(DubError::FatalSubprocess(_))));
    }
}
