use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::app::error::AppError;
use crate::app::interrupt::InterruptGate;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Collect stdout and stderr and hand them back to the caller.
    Capture,
    /// Let the child write straight to the terminal.
    Stream,
}

/// Where a streamed child's stdout lands. Its stderr always stays on stderr.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StreamTarget {
    #[default]
    Stdout,
    /// Keeps stdout free for machine-readable output such as `--json`.
    Stderr,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub interrupted: bool,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// stdout followed by stderr, the way a `2>&1` capture would read.
    pub fn combined(&self) -> String {
        let mut text = self.stdout.clone();
        text.push_str(&self.stderr);
        text
    }
}

/// Runs external programs. A nonzero exit status is reported through
/// [`CommandOutput::exit_code`], never as an `Err`; only failing to start
/// or to wait on the child is an error.
pub trait CommandRunner {
    fn run(&self, program: &str, args: &[String], mode: OutputMode) -> Result<CommandOutput, AppError>;

    /// Streams `args` until the child exits on its own or the gate fires.
    /// On interrupt, `stop_args` is run before the child is reaped.
    fn run_until_interrupted(
        &self,
        program: &str,
        args: &[String],
        stop_args: &[String],
        gate: &InterruptGate,
    ) -> Result<CommandOutput, AppError>;
}

#[derive(Debug, Clone)]
pub struct HostRunner {
    trace_id: String,
    stop_grace: Duration,
    stream_target: StreamTarget,
}

impl HostRunner {
    pub fn new(trace_id: impl Into<String>, stop_grace: Duration) -> Self {
        Self {
            trace_id: trace_id.into(),
            stop_grace,
            stream_target: StreamTarget::Stdout,
        }
    }

    pub fn with_stream_target(mut self, stream_target: StreamTarget) -> Self {
        self.stream_target = stream_target;
        self
    }
}

impl CommandRunner for HostRunner {
    fn run(&self, program: &str, args: &[String], mode: OutputMode) -> Result<CommandOutput, AppError> {
        run_command(program, args, mode, self.stream_target, &self.trace_id)
    }

    fn run_until_interrupted(
        &self,
        program: &str,
        args: &[String],
        stop_args: &[String],
        gate: &InterruptGate,
    ) -> Result<CommandOutput, AppError> {
        run_command_until_interrupted(
            program,
            args,
            stop_args,
            gate,
            self.stop_grace,
            self.stream_target,
            &self.trace_id,
        )
    }
}

fn build_command(program: &str, args: &[String], mode: OutputMode, target: StreamTarget) -> Command {
    let (stdout, stderr) = match (mode, target) {
        (OutputMode::Capture, _) => (Stdio::piped(), Stdio::piped()),
        (OutputMode::Stream, StreamTarget::Stdout) => (Stdio::inherit(), Stdio::inherit()),
        (OutputMode::Stream, StreamTarget::Stderr) => (Stdio::from(std::io::stderr()), Stdio::inherit()),
    };
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(stdout)
        .stderr(stderr);
    command
}

fn spawn(mut command: Command, trace_id: &str) -> Result<Child, AppError> {
    let program = command.get_program().to_string_lossy().to_string();
    debug!(trace_id = %trace_id, program = %program, args = ?command.get_args().collect::<Vec<_>>(), "Running command");
    command
        .spawn()
        .map_err(|err| AppError::dependency(format!("Failed to spawn {program}: {err}"), trace_id))
}

fn drain<R: Read + Send + 'static>(source: Option<R>) -> std::thread::JoinHandle<Vec<u8>> {
    std::thread::spawn(move || {
        let mut buffer = Vec::<u8>::new();
        if let Some(mut reader) = source {
            let mut temp = [0u8; 4096];
            loop {
                match reader.read(&mut temp) {
                    Ok(0) => break,
                    Ok(count) => buffer.extend_from_slice(&temp[..count]),
                    Err(_) => break,
                }
            }
        }
        buffer
    })
}

pub fn run_command(
    program: &str,
    args: &[String],
    mode: OutputMode,
    target: StreamTarget,
    trace_id: &str,
) -> Result<CommandOutput, AppError> {
    let mut child = spawn(build_command(program, args, mode, target), trace_id)?;

    // Drain stdout/stderr in parallel; a chatty child blocks once a pipe buffer fills.
    let stdout_handle = drain(child.stdout.take());
    let stderr_handle = drain(child.stderr.take());

    let status = child.wait().map_err(|err| {
        AppError::system(format!("Failed to wait for {program}: {err}"), trace_id)
    });
    let stdout_bytes = stdout_handle.join().unwrap_or_default();
    let stderr_bytes = stderr_handle.join().unwrap_or_default();
    let status = status?;

    if !status.success() {
        debug!(trace_id = %trace_id, program = %program, code = ?status.code(), "Command exited nonzero");
    }

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&stdout_bytes).to_string(),
        stderr: String::from_utf8_lossy(&stderr_bytes).to_string(),
        exit_code: status.code(),
        interrupted: false,
    })
}

pub fn run_command_until_interrupted(
    program: &str,
    args: &[String],
    stop_args: &[String],
    gate: &InterruptGate,
    grace: Duration,
    target: StreamTarget,
    trace_id: &str,
) -> Result<CommandOutput, AppError> {
    let mut command = build_command(program, args, OutputMode::Stream, target);
    // Keep the terminal's SIGINT away from the child so the stop request
    // can end the device-side process cleanly.
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }
    let mut child = spawn(command, trace_id)?;

    let exited = loop {
        match child.try_wait() {
            Ok(Some(status)) => break Some(status.code()),
            Ok(None) if gate.is_fired() => break None,
            Ok(None) => std::thread::sleep(POLL_INTERVAL),
            Err(err) => return Err(poll_failed(&mut child, program, err, trace_id)),
        }
    };

    if !gate.is_fired() {
        return Ok(CommandOutput {
            exit_code: exited.flatten(),
            interrupted: false,
            ..CommandOutput::default()
        });
    }
    // Sent even if the child already exited: where it shares the console's
    // Ctrl+C (Windows) the device-side process is still running.
    if !stop_args.is_empty() {
        if let Err(err) = run_command(program, stop_args, OutputMode::Capture, target, trace_id) {
            warn!(trace_id = %trace_id, error = %err, "Failed to send stop request");
        }
    }

    let exit_code = match exited {
        Some(code) => code,
        None => wait_with_grace(&mut child, program, grace, trace_id)?,
    };

    Ok(CommandOutput {
        exit_code,
        interrupted: true,
        ..CommandOutput::default()
    })
}

fn wait_with_grace(
    child: &mut Child,
    program: &str,
    grace: Duration,
    trace_id: &str,
) -> Result<Option<i32>, AppError> {
    let start = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status.code()),
            Ok(None) if start.elapsed() >= grace => {
                warn!(trace_id = %trace_id, program = %program, "Child still running after stop request; killing it");
                let _ = child.kill();
                let _ = child.wait();
                return Ok(None);
            }
            Ok(None) => std::thread::sleep(POLL_INTERVAL),
            Err(err) => return Err(poll_failed(child, program, err, trace_id)),
        }
    }
}

fn poll_failed(child: &mut Child, program: &str, err: std::io::Error, trace_id: &str) -> AppError {
    let _ = child.kill();
    let _ = child.wait();
    AppError::system(format!("Failed to poll {program}: {err}"), trace_id)
}
