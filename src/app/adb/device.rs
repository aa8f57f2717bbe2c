use std::path::Path;

use tracing::{debug, warn};

use crate::app::adb::parse::{parse_adb_devices, parse_device_timestamp, DEVICE_TIMESTAMP_FORMAT};
use crate::app::adb::runner::{CommandOutput, CommandRunner, OutputMode};
use crate::app::error::AppError;
use crate::app::interrupt::InterruptGate;
use crate::app::models::DeviceSummary;

fn to_args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|part| part.to_string()).collect()
}

pub fn list_devices<R: CommandRunner + ?Sized>(
    runner: &R,
    program: &str,
    trace_id: &str,
) -> Result<Vec<DeviceSummary>, AppError> {
    let output = runner.run(program, &to_args(&["devices"]), OutputMode::Capture)?;
    if !output.success() {
        warn!(trace_id = %trace_id, code = ?output.exit_code, output = %output.combined().trim(), "adb devices exited nonzero");
    }
    Ok(parse_adb_devices(&output.stdout))
}

/// One connected device, addressed with `adb -s <serial>`.
pub struct AdbDevice<'a, R: CommandRunner + ?Sized> {
    runner: &'a R,
    program: &'a str,
    serial: String,
    trace_id: &'a str,
}

impl<'a, R: CommandRunner + ?Sized> AdbDevice<'a, R> {
    pub fn new(runner: &'a R, program: &'a str, serial: impl Into<String>, trace_id: &'a str) -> Self {
        Self {
            runner,
            program,
            serial: serial.into(),
            trace_id,
        }
    }

    pub fn trace_id(&self) -> &str {
        self.trace_id
    }

    fn args(&self, rest: &[&str]) -> Vec<String> {
        let mut args = vec!["-s".to_string(), self.serial.clone()];
        args.extend(rest.iter().map(|part| part.to_string()));
        args
    }

    pub fn exec(&self, rest: &[&str], mode: OutputMode) -> Result<CommandOutput, AppError> {
        self.runner.run(self.program, &self.args(rest), mode)
    }

    pub fn shell(&self, command: &[&str]) -> Result<CommandOutput, AppError> {
        let mut rest = vec!["shell"];
        rest.extend_from_slice(command);
        self.exec(&rest, OutputMode::Capture)
    }

    pub fn pull(&self, remote: &str, local: &Path) -> Result<CommandOutput, AppError> {
        let local = local.to_string_lossy();
        self.exec(&["pull", remote, &*local], OutputMode::Capture)
    }

    pub fn remove(&self, remote: &str) -> Result<CommandOutput, AppError> {
        self.shell(&["rm", "-f", remote])
    }

    /// Streams `shell <command>` until it ends or the gate fires, then asks
    /// the device to stop it with `stop_command`.
    pub fn shell_until_interrupted(
        &self,
        command: &[&str],
        stop_command: &[&str],
        gate: &InterruptGate,
    ) -> Result<CommandOutput, AppError> {
        let mut rest = vec!["shell"];
        rest.extend_from_slice(command);
        let mut stop = vec!["shell"];
        stop.extend_from_slice(stop_command);
        self.runner
            .run_until_interrupted(self.program, &self.args(&rest), &self.args(&stop), gate)
    }

    /// Logs a failed best-effort step and reports whether it completed.
    pub fn completed(&self, step: &str, result: &Result<CommandOutput, AppError>) -> bool {
        match result {
            Ok(output) if output.success() => {
                debug!(trace_id = %self.trace_id, step = %step, "Step completed");
                true
            }
            Ok(output) => {
                warn!(
                    trace_id = %self.trace_id,
                    step = %step,
                    code = ?output.exit_code,
                    output = %output.combined().trim(),
                    "Step exited nonzero"
                );
                false
            }
            Err(err) => {
                warn!(
                    trace_id = %self.trace_id,
                    step = %step,
                    error = %err.error,
                    code = %err.code,
                    "Step failed"
                );
                false
            }
        }
    }

    /// The device clock as `YYYY-MM-DD_HH-MM-SS`, or `None` if `date` gave anything else.
    pub fn timestamp(&self) -> Option<String> {
        let format = format!("+{DEVICE_TIMESTAMP_FORMAT}");
        let result = self.shell(&["date", format.as_str()]);
        if !self.completed("date", &result) {
            return None;
        }
        result.ok().and_then(|output| parse_device_timestamp(&output.stdout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct ScriptedRunner {
        calls: RefCell<Vec<Vec<String>>>,
        stdout: String,
        exit_code: i32,
    }

    impl ScriptedRunner {
        fn new(stdout: &str, exit_code: i32) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                stdout: stdout.to_string(),
                exit_code,
            }
        }
    }

    impl CommandRunner for ScriptedRunner {
        fn run(&self, _program: &str, args: &[String], _mode: OutputMode) -> Result<CommandOutput, AppError> {
            self.calls.borrow_mut().push(args.to_vec());
            Ok(CommandOutput {
                stdout: self.stdout.clone(),
                exit_code: Some(self.exit_code),
                ..CommandOutput::default()
            })
        }

        fn run_until_interrupted(
            &self,
            _program: &str,
            args: &[String],
            stop_args: &[String],
            _gate: &InterruptGate,
        ) -> Result<CommandOutput, AppError> {
            self.calls.borrow_mut().push(args.to_vec());
            self.calls.borrow_mut().push(stop_args.to_vec());
            Ok(CommandOutput::default())
        }
    }

    #[test]
    fn commands_are_addressed_to_the_serial() {
        let runner = ScriptedRunner::new("", 0);
        let device = AdbDevice::new(&runner, "adb", "emu1", "trace");
        device.pull("/sdcard/a.png", Path::new("ws")).expect("pull");
        device.remove("/sdcard/a.png").expect("rm");

        let calls = runner.calls.borrow();
        assert_eq!(calls[0], to_args(&["-s", "emu1", "pull", "/sdcard/a.png", "ws"]));
        assert_eq!(calls[1], to_args(&["-s", "emu1", "shell", "rm", "-f", "/sdcard/a.png"]));
    }

    #[test]
    fn timestamp_uses_device_date() {
        let runner = ScriptedRunner::new("2023-11-02_08-15-00\n", 0);
        let device = AdbDevice::new(&runner, "adb", "emu1", "trace");
        assert_eq!(device.timestamp().as_deref(), Some("2023-11-02_08-15-00"));
        assert_eq!(
            runner.calls.borrow()[0],
            to_args(&["-s", "emu1", "shell", "date", "+%Y-%m-%d_%H-%M-%S"])
        );
    }

    #[test]
    fn timestamp_is_none_when_date_fails() {
        let runner = ScriptedRunner::new("2023-11-02_08-15-00\n", 1);
        let device = AdbDevice::new(&runner, "adb", "emu1", "trace");
        assert_eq!(device.timestamp(), None);
    }

    #[test]
    fn stop_command_is_addressed_to_the_serial() {
        let runner = ScriptedRunner::new("", 0);
        let device = AdbDevice::new(&runner, "adb", "emu1", "trace");
        device
            .shell_until_interrupted(
                &["screenrecord", "/data/local/tmp/r.mp4"],
                &["pkill", "-SIGINT", "screenrecord"],
                &InterruptGate::new(),
            )
            .expect("record");
        let calls = runner.calls.borrow();
        assert_eq!(calls[1], to_args(&["-s", "emu1", "shell", "pkill", "-SIGINT", "screenrecord"]));
    }

    #[test]
    fn list_devices_parses_stdout() {
        let runner = ScriptedRunner::new("List of devices attached\nemu1\tdevice\n\n", 0);
        let devices = list_devices(&runner, "adb", "trace").expect("devices");
        assert_eq!(devices.len(), 1);
        assert!(devices[0].is_ready());
        assert_eq!(runner.calls.borrow()[0], to_args(&["devices"]));
    }
}
