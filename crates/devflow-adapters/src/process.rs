//! Subprocess execution with a payload on stdin and a hard timeout.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use devflow_models::ProcessOutput;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

/// Errors that keep a process from producing an output.
#[derive(Error, Debug)]
pub enum ExecError {
    /// The process could not be spawned.
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The process was killed after exceeding its timeout.
    #[error("{program} timed out after {}s", .timeout.as_secs())]
    TimedOut { program: String, timeout: Duration },

    /// Waiting for the process failed.
    #[error("failed to collect output of {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Runs `program` in `workdir`, writes `input` to its stdin, and collects
/// its output.
///
/// The child is killed if `timeout` elapses first. A non-zero exit status
/// is not an error; it is reported in the returned [`ProcessOutput`].
pub async fn run_with_stdin(
    program: &Path,
    args: &[String],
    workdir: &Path,
    input: &str,
    timeout: Duration,
) -> Result<ProcessOutput, ExecError> {
    let name = program.display().to_string();
    debug!(program = %name, args = ?args, workdir = %workdir.display(), input_len = input.len(), "spawning");

    let mut child = Command::new(program)
        .args(args)
        .current_dir(workdir)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ExecError::Launch {
            program: name.clone(),
            source,
        })?;

    let stdin = child.stdin.take();
    let write_input = async move {
        if let Some(mut stdin) = stdin {
            stdin.write_all(input.as_bytes()).await?;
            stdin.shutdown().await?;
        }
        Ok::<(), std::io::Error>(())
    };

    // Feed stdin while draining stdout/stderr so neither side blocks on a
    // full pipe.
    let run = {
        let name = name.clone();
        async move {
            let (written, output) = tokio::join!(write_input, child.wait_with_output());
            if let Err(e) = written {
                warn!(program = %name, error = %e, "could not write full payload to stdin");
            }
            output
        }
    };

    let output = match tokio::time::timeout(timeout, run).await {
        Ok(Ok(output)) => output,
        Ok(Err(source)) => {
            return Err(ExecError::Wait {
                program: name,
                source,
            })
        }
        Err(_) => {
            warn!(program = %name, timeout_secs = timeout.as_secs(), "process timed out, killed");
            return Err(ExecError::TimedOut {
                program: name,
                timeout,
            });
        }
    };

    let result = ProcessOutput {
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    };
    debug!(
        program = %name,
        exit_code = ?result.exit_code,
        stdout_len = result.stdout.len(),
        stderr_len = result.stderr.len(),
        "process finished"
    );
    Ok(result)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sh(script: &str) -> (PathBuf, Vec<String>) {
        (PathBuf::from("sh"), vec!["-c".to_string(), script.to_string()])
    }

    #[tokio::test]
    async fn test_payload_on_stdin() {
        let dir = tempfile::tempdir().unwrap();
        let output = run_with_stdin(
            Path::new("cat"),
            &[],
            dir.path(),
            "hello agent",
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        assert!(output.success());
        assert_eq!(output.stdout, "hello agent");
    }

    #[tokio::test]
    async fn test_large_payload_does_not_deadlock() {
        let dir = tempfile::tempdir().unwrap();
        let payload = "x".repeat(1 << 20);
        let output = run_with_stdin(
            Path::new("cat"),
            &[],
            dir.path(),
            &payload,
            Duration::from_secs(10),
        )
        .await
        .unwrap();
        assert_eq!(output.stdout.len(), payload.len());
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let (program, args) = sh("echo broken >&2; exit 3");
        let output = run_with_stdin(&program, &args, dir.path(), "", Duration::from_secs(5))
            .await
            .unwrap();

        assert!(!output.success());
        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.stderr.trim(), "broken");
    }

    #[tokio::test]
    async fn test_runs_in_workdir() {
        let dir = tempfile::tempdir().unwrap();
        let (program, args) = sh("touch created.txt");
        run_with_stdin(&program, &args, dir.path(), "", Duration::from_secs(5))
            .await
            .unwrap();
        assert!(dir.path().join("created.txt").exists());
    }

    #[tokio::test]
    async fn test_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let (program, args) = sh("sleep 5");
        let err = run_with_stdin(&program, &args, dir.path(), "", Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, ExecError::TimedOut { .. }));
    }

    #[tokio::test]
    async fn test_missing_program() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_with_stdin(
            Path::new("devflow-no-such-program"),
            &[],
            dir.path(),
            "",
            Duration::from_secs(1),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ExecError::Launch { .. }));
    }
}
