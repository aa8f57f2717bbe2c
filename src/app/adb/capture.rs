use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::app::adb::device::AdbDevice;
use crate::app::adb::paths::join_device_path;
use crate::app::adb::runner::CommandRunner;
use crate::app::config::{ScreenRecordSettings, ScreenshotSettings};
use crate::app::interrupt::InterruptGate;

pub const SCREENSHOT_NAME: &str = "screenshot";
pub const SCREENRECORD_NAME: &str = "screenrecord";

/// Pulls `remote` into `workspace`, removes the device copy and returns the
/// local file if it arrived.
fn collect_remote_file<R: CommandRunner + ?Sized>(
    device: &AdbDevice<'_, R>,
    remote: &str,
    workspace: &Path,
    file_name: &str,
) -> Option<PathBuf> {
    let pulled = device.completed("pull", &device.pull(remote, workspace));
    device.completed("rm", &device.remove(remote));

    let local = workspace.join(file_name);
    if pulled && local.is_file() {
        Some(local)
    } else {
        warn!(trace_id = %device.trace_id(), remote = %remote, "Capture did not reach the workspace");
        None
    }
}

pub fn screencap_args(settings: &ScreenshotSettings, remote: &str) -> Vec<String> {
    let mut args = vec!["screencap".to_string()];
    if settings.display_id >= 0 {
        args.push("-d".to_string());
        args.push(settings.display_id.to_string());
    }
    args.push("-p".to_string());
    args.push(remote.to_string());
    args
}

pub fn capture_screenshot<R: CommandRunner + ?Sized>(
    device: &AdbDevice<'_, R>,
    settings: &ScreenshotSettings,
    workspace: &Path,
) -> Option<PathBuf> {
    let file_name = format!("{SCREENSHOT_NAME}.png");
    let remote = join_device_path(&settings.remote_dir, &file_name);

    let args = screencap_args(settings, &remote);
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    if !device.completed("screencap", &device.shell(&args)) {
        return None;
    }
    collect_remote_file(device, &remote, workspace, &file_name)
}

pub fn screenrecord_args(settings: &ScreenRecordSettings, remote: &str) -> Vec<String> {
    let mut args = vec!["screenrecord".to_string()];
    if settings.time_limit_sec > 0 {
        args.push("--time-limit".to_string());
        args.push(settings.time_limit_sec.to_string());
    }
    if !settings.bit_rate.trim().is_empty() {
        args.push("--bit-rate".to_string());
        args.push(settings.bit_rate.trim().to_string());
    }
    if !settings.size.trim().is_empty() {
        args.push("--size".to_string());
        args.push(settings.size.trim().to_string());
    }
    args.push(remote.to_string());
    args
}

/// Records until the user presses Ctrl+C or the device's own time limit ends
/// the recording.
pub fn capture_screenrecord<R: CommandRunner + ?Sized>(
    device: &AdbDevice<'_, R>,
    settings: &ScreenRecordSettings,
    workspace: &Path,
    gate: &InterruptGate,
) -> Option<PathBuf> {
    let file_name = format!("{SCREENRECORD_NAME}.mp4");
    let remote = join_device_path(&settings.remote_dir, &file_name);

    let args = screenrecord_args(settings, &remote);
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let result = {
        let _window = gate.arm();
        device.shell_until_interrupted(&args, &["pkill", "-SIGINT", "screenrecord"], gate)
    };

    match &result {
        Ok(output) if output.interrupted => {
            info!(trace_id = %device.trace_id(), "Screen recording stopped by user");
        }
        Ok(output) => {
            info!(trace_id = %device.trace_id(), code = ?output.exit_code, "Screen recording ended");
        }
        Err(err) => {
            warn!(trace_id = %device.trace_id(), error = %err, "Screen recording could not start");
            return None;
        }
    }
    collect_remote_file(device, &remote, workspace, &file_name)
}
