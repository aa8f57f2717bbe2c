use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::app::adb::device::AdbDevice;
use crate::app::adb::parse::parse_first_find_match;
use crate::app::adb::paths::{device_parent_dir, validate_log_dir};
use crate::app::adb::runner::CommandRunner;

/// Device directory holding the first `file_name` found below `search_root`.
pub fn locate_log_dir<R: CommandRunner + ?Sized>(
    device: &AdbDevice<'_, R>,
    search_root: &str,
    file_name: &str,
) -> Option<String> {
    // find exits nonzero when it hits unreadable directories, so the output
    // is used regardless of the exit code.
    let output = match device.shell(&["find", search_root, "-name", file_name, "2>", "/dev/null"]) {
        Ok(output) => output,
        Err(err) => {
            warn!(trace_id = %device.trace_id(), error = %err, "Log search failed");
            return None;
        }
    };
    let Some(log_file) = parse_first_find_match(&output.stdout, file_name) else {
        info!(trace_id = %device.trace_id(), file_name = %file_name, "No application log found on device");
        return None;
    };
    let dir = device_parent_dir(&log_file);
    if let Err(reason) = validate_log_dir(&dir) {
        warn!(trace_id = %device.trace_id(), dir = %dir, reason = %reason, "Ignoring log directory");
        return None;
    }
    Some(dir)
}

/// Copies `remote_dir` to `<workspace>/<local_name>`.
pub fn pull_log_dir<R: CommandRunner + ?Sized>(
    device: &AdbDevice<'_, R>,
    remote_dir: &str,
    workspace: &Path,
    local_name: &str,
) -> Option<PathBuf> {
    let local = workspace.join(local_name);
    if !device.completed("pull log dir", &device.pull(remote_dir, &local)) {
        return None;
    }
    if local.is_dir() {
        Some(local)
    } else {
        warn!(trace_id = %device.trace_id(), local = %local.display(), "Pulled log directory is missing");
        None
    }
}
