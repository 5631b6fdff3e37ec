//! Subprocess invocation with a per-phase timeout.
//!
//! A command that exceeds its timeout is killed and recorded as `TIMEOUT` rather than causing the
//! whole job to fail: the caller attaches the appropriate flag to the cell or preprocess unit and
//! continues with the remaining work.

use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use crate::receipt::PhaseRecord;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Runs `program` with `args` in `cwd`, killing it if it runs longer than `timeout`. The
/// captured stdout/stderr are both embedded in the returned record and appended to `log_path`
/// (the cell's or preprocess unit's `logs/` file for this phase).
pub fn run(
    program: &str,
    args: &[String],
    cwd: &Path,
    timeout: Duration,
    log_path: &Path,
) -> PhaseRecord {
    let mut command = vec![program.to_string()];
    command.extend(args.iter().cloned());

    let start = Instant::now();
    let spawned = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn();

    let mut child = match spawned {
        Ok(child) => child,
        Err(source) => {
            let record = PhaseRecord {
                command,
                exit_code: None,
                timed_out: false,
                duration_ms: start.elapsed().as_millis() as u64,
                stdout: String::new(),
                stderr: source.to_string(),
            };
            write_log(log_path, &record);
            return record;
        }
    };

    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                let (stdout, stderr) = drain(&mut child);
                let record = PhaseRecord {
                    command,
                    exit_code: status.code(),
                    timed_out: false,
                    duration_ms: start.elapsed().as_millis() as u64,
                    stdout,
                    stderr,
                };
                write_log(log_path, &record);
                return record;
            }
            Ok(None) => {
                if start.elapsed() >= timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    let (stdout, stderr) = drain(&mut child);
                    let record = PhaseRecord {
                        command,
                        exit_code: None,
                        timed_out: true,
                        duration_ms: start.elapsed().as_millis() as u64,
                        stdout,
                        stderr,
                    };
                    write_log(log_path, &record);
                    return record;
                }
                std::thread::sleep(POLL_INTERVAL);
            }
            Err(source) => {
                let record = PhaseRecord {
                    command,
                    exit_code: None,
                    timed_out: false,
                    duration_ms: start.elapsed().as_millis() as u64,
                    stdout: String::new(),
                    stderr: source.to_string(),
                };
                write_log(log_path, &record);
                return record;
            }
        }
    }
}

/// Best-effort: a log write failure never turns a build phase into a harder failure than it
/// already is, since the same stdout/stderr survive in the receipt regardless.
fn write_log(log_path: &Path, record: &PhaseRecord) {
    let contents = format!(
        "$ {}\nexit_code: {:?}\ntimed_out: {}\n\n--- stdout ---\n{}\n--- stderr ---\n{}\n",
        record.command.join(" "),
        record.exit_code,
        record.timed_out,
        record.stdout,
        record.stderr,
    );
    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let _ = std::fs::write(log_path, contents);
}

fn drain(child: &mut std::process::Child) -> (String, String) {
    let mut stdout = String::new();
    let mut stderr = String::new();
    if let Some(mut out) = child.stdout.take() {
        let _ = out.read_to_string(&mut stdout);
    }
    if let Some(mut err) = child.stderr.take() {
        let _ = err.read_to_string(&mut stderr);
    }
    (stdout, stderr)
}
