use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::warn;

use crate::app::adb::device::AdbDevice;
use crate::app::adb::parse::DEVICE_TIMESTAMP_FORMAT;
use crate::app::adb::runner::{CommandRunner, OutputMode};

pub fn archive_file_name(timestamp: &str) -> String {
    format!("bugreport_{timestamp}.zip")
}

/// Host clock in the device timestamp format, used when `date` on the device fails.
pub fn host_timestamp() -> String {
    Local::now().format(DEVICE_TIMESTAMP_FORMAT).to_string()
}

/// Runs `adb bugreport <archive>` with its progress on the terminal and
/// returns the archive if adb left one behind.
pub fn generate_bugreport<R: CommandRunner + ?Sized>(
    device: &AdbDevice<'_, R>,
    archive: &Path,
) -> Option<PathBuf> {
    let target = archive.to_string_lossy();
    let result = device.exec(&["bugreport", &*target], OutputMode::Stream);
    device.completed("bugreport", &result);

    if archive.is_file() {
        Some(archive.to_path_buf())
    } else {
        warn!(trace_id = %device.trace_id(), archive = %archive.display(), "adb bugreport produced no archive");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::adb::parse::parse_device_timestamp;

    #[test]
    fn archive_name_embeds_timestamp() {
        assert_eq!(
            archive_file_name("2024-03-09_17-05-42"),
            "bugreport_2024-03-09_17-05-42.zip"
        );
    }

    #[test]
    fn host_timestamp_matches_device_format() {
        let stamp = host_timestamp();
        assert_eq!(parse_device_timestamp(&stamp).as_deref(), Some(stamp.as_str()));
    }
}
