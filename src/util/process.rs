//! Subprocess execution with timeout and output capture.
//!
//! Shell-backed tools (test runs, deploys, allowlisted commands) all go
//! through [`run_with_timeout`]: spawn with piped stdout/stderr, drain
//! both pipes on background threads, and poll `try_wait` until the
//! process exits or the deadline passes. Draining concurrently matters:
//! a child that fills the pipe buffer would otherwise block forever and
//! never reach `try_wait`.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

/// How often to poll the child for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Outcome of a subprocess run.
#[derive(Debug)]
pub enum ExecOutcome {
    /// Process exited (any code); captured output is UTF-8 lossy.
    Completed {
        stdout: String,
        stderr: String,
        exit_code: i32,
    },
    /// Deadline passed; the process was killed.
    TimedOut,
    /// The program does not exist on PATH (checked before spawning).
    CommandNotFound,
}

/// Run `program args...` in `cwd` with `extra_env` merged over the
/// inherited environment, killing the process after `timeout`.
///
/// # Errors
///
/// Returns an error only for unexpected spawn/wait failures; a missing
/// program, a nonzero exit, and a timeout are all [`ExecOutcome`]s.
pub fn run_with_timeout(
    program: &str,
    args: &[String],
    cwd: &Path,
    timeout: Duration,
    extra_env: &HashMap<String, String>,
) -> Result<ExecOutcome> {
    if which::which(program).is_err() {
        return Ok(ExecOutcome::CommandNotFound);
    }

    let mut child = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .envs(extra_env)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to spawn: {program}"))?;

    let stdout_handle = drain_pipe(child.stdout.take());
    let stderr_handle = drain_pipe(child.stderr.take());

    let start = Instant::now();
    let status = loop {
        match child.try_wait().context("failed to check process status")? {
            Some(status) => break status,
            None if start.elapsed() >= timeout => {
                let _ = child.kill();
                let _ = child.wait();
                // Pipes close on kill, so the drain threads finish.
                let _ = join_pipe(stdout_handle);
                let _ = join_pipe(stderr_handle);
                return Ok(ExecOutcome::TimedOut);
            }
            None => std::thread::sleep(POLL_INTERVAL),
        }
    };

    Ok(ExecOutcome::Completed {
        stdout: String::from_utf8_lossy(&join_pipe(stdout_handle)).into_owned(),
        stderr: String::from_utf8_lossy(&join_pipe(stderr_handle)).into_owned(),
        exit_code: status.code().unwrap_or(-1),
    })
}

/// Combine captured output the way clients expect to read it: stdout,
/// then stderr, then `Exit code: N` for nonzero exits; `(no output)`
/// when everything is empty.
pub fn render_output(stdout: &str, stderr: &str, exit_code: i32) -> String {
    let mut out = stdout.to_owned();
    if !stderr.is_empty() {
        out.push('\n');
        out.push_str(stderr);
    }
    if exit_code != 0 {
        out.push_str(&format!("\nExit code: {exit_code}"));
    }
    let trimmed = out.trim();
    if trimmed.is_empty() {
        "(no output)".to_owned()
    } else {
        trimmed.to_owned()
    }
}

fn drain_pipe(pipe: Option<impl Read + Send + 'static>) -> Option<JoinHandle<Vec<u8>>> {
    pipe.map(|mut pipe| {
        std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    })
}

fn join_pipe(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_output_plain() {
        assert_eq!(render_output("hello\n", "", 0), "hello");
    }

    #[test]
    fn test_render_output_with_stderr_and_exit_code() {
        let out = render_output("out", "err", 2);
        assert_eq!(out, "out\nerr\nExit code: 2");
    }

    #[test]
    fn test_render_output_empty() {
        assert_eq!(render_output("", "", 0), "(no output)");
        assert_eq!(render_output("", "", 1), "Exit code: 1");
    }

    #[test]
    fn test_command_not_found() {
        let outcome = run_with_timeout(
            "definitely-not-a-real-command-xyz",
            &[],
            Path::new("."),
            Duration::from_secs(5),
            &HashMap::new(),
        )
        .expect("run");
        assert!(matches!(outcome, ExecOutcome::CommandNotFound));
    }

    #[cfg(unix)]
    #[test]
    fn test_captures_stdout_and_exit_code() {
        let args = vec!["-c".to_owned(), "echo out; echo err >&2; exit 3".to_owned()];
        let outcome = run_with_timeout(
            "sh",
            &args,
            Path::new("."),
            Duration::from_secs(10),
            &HashMap::new(),
        )
        .expect("run");
        match outcome {
            ExecOutcome::Completed {
                stdout,
                stderr,
                exit_code,
            } => {
                assert_eq!(stdout.trim(), "out");
                assert_eq!(stderr.trim(), "err");
                assert_eq!(exit_code, 3);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_extra_env_is_passed() {
        let mut env = HashMap::new();
        env.insert("PROJECT_MCP_TEST_VAR".to_owned(), "marker-42".to_owned());
        let args = vec!["-c".to_owned(), "printf '%s' \"$PROJECT_MCP_TEST_VAR\"".to_owned()];
        let outcome =
            run_with_timeout("sh", &args, Path::new("."), Duration::from_secs(10), &env)
                .expect("run");
        match outcome {
            ExecOutcome::Completed { stdout, .. } => assert_eq!(stdout, "marker-42"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_process() {
        let args = vec!["-c".to_owned(), "sleep 30".to_owned()];
        let start = Instant::now();
        let outcome = run_with_timeout(
            "sh",
            &args,
            Path::new("."),
            Duration::from_millis(200),
            &HashMap::new(),
        )
        .expect("run");
        assert!(matches!(outcome, ExecOutcome::TimedOut));
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[cfg(unix)]
    #[test]
    fn test_large_output_does_not_deadlock() {
        // Well past the 64 KiB pipe buffer.
        let script = "i=0; while [ $i -lt 20000 ]; do echo 0123456789; i=$((i+1)); done";
        let args = vec!["-c".to_owned(), script.to_owned()];
        let outcome = run_with_timeout(
            "sh",
            &args,
            Path::new("."),
            Duration::from_secs(60),
            &HashMap::new(),
        )
        .expect("run");
        match outcome {
            ExecOutcome::Completed { stdout, exit_code, .. } => {
                assert_eq!(exit_code, 0);
                assert!(stdout.len() >= 200_000);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
