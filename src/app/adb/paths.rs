//! Device-side paths. These always use `/`, whatever the host separator is.

/// Checks that a directory found by the log search is safe to pull: an
/// absolute, non-root device path without `..`.
pub fn validate_log_dir(dir: &str) -> Result<(), String> {
    let dir = dir.trim();
    if !dir.starts_with('/') {
        return Err(format!("log directory {dir:?} is not an absolute device path"));
    }
    if dir.trim_end_matches('/').is_empty() {
        return Err("log directory resolved to the device root".to_string());
    }
    if dir.split('/').any(|segment| segment == "..") {
        return Err(format!("log directory {dir:?} escapes its search root"));
    }
    Ok(())
}

/// Directory part of a device path; `/` when there is none.
pub fn device_parent_dir(path: &str) -> String {
    let path = path.trim().trim_end_matches('/');
    match path.rfind('/') {
        Some(index) if index > 0 => path[..index].to_string(),
        _ => "/".to_string(),
    }
}

pub fn join_device_path(dir: &str, file_name: &str) -> String {
    format!("{}/{}", dir.trim_end_matches('/'), file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_dir_must_be_absolute_and_below_root() {
        assert!(validate_log_dir("").is_err());
        assert!(validate_log_dir("sdcard/log").is_err());
        assert!(validate_log_dir("/").is_err());
        assert!(validate_log_dir("/sdcard/Android/data/org.citra.citra_emu/files/log").is_ok());
    }

    #[test]
    fn log_dir_rejects_parent_segments() {
        assert!(validate_log_dir("/sdcard/../data").is_err());
    }

    #[test]
    fn parent_of_find_hits() {
        assert_eq!(device_parent_dir("/sdcard/citra/log/citra_log.txt"), "/sdcard/citra/log");
        assert_eq!(device_parent_dir("/sdcard/citra/log/"), "/sdcard/citra");
        assert_eq!(device_parent_dir("/citra_log.txt"), "/");
        assert_eq!(device_parent_dir("citra_log.txt"), "/");
    }

    #[test]
    fn join_avoids_double_slash() {
        assert_eq!(join_device_path("/sdcard/", "screenshot.png"), "/sdcard/screenshot.png");
        assert_eq!(join_device_path("/data/local/tmp", "screenrecord.mp4"), "/data/local/tmp/screenrecord.mp4");
    }
}
