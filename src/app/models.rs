use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeviceSummary {
    pub serial: String,
    pub state: String,
    pub model: Option<String>,
    pub product: Option<String>,
    pub device: Option<String>,
    pub transport_id: Option<String>,
}

impl DeviceSummary {
    /// `adb devices` reports `device` for an authorized, online device.
    pub fn is_ready(&self) -> bool {
        self.state == "device"
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectOptions {
    pub screenshot: bool,
    pub screenrecord: bool,
    pub serial: Option<String>,
    pub output_dir: PathBuf,
    pub workspace_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CollectReport {
    pub trace_id: String,
    pub serial: String,
    pub device_timestamp: String,
    /// `None` when `adb bugreport` did not leave an archive behind.
    pub archive_path: Option<PathBuf>,
    pub screenshot: Option<String>,
    pub screenrecord: Option<String>,
    pub log_dir: Option<String>,
}
