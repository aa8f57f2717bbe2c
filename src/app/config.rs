use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app::error::AppError;

pub const CONFIG_PATH_ENV: &str = "COLLECT_BUGREPORT_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScreenshotSettings {
    pub remote_dir: String,
    pub display_id: i32,
}

impl Default for ScreenshotSettings {
    fn default() -> Self {
        Self {
            remote_dir: "/sdcard".to_string(),
            display_id: -1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScreenRecordSettings {
    pub remote_dir: String,
    pub time_limit_sec: i32,
    pub bit_rate: String,
    pub size: String,
    /// Seconds the local adb process gets to exit after the stop request.
    pub stop_grace_secs: u64,
}

impl Default for ScreenRecordSettings {
    fn default() -> Self {
        Self {
            remote_dir: "/data/local/tmp".to_string(),
            time_limit_sec: 0,
            bit_rate: String::new(),
            size: String::new(),
            stop_grace_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct LoggingSettings {
    pub json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CollectorConfig {
    pub adb_path: String,
    pub log_search_root: String,
    pub log_file_name: String,
    pub log_archive_dir: String,
    pub workspace_dir: String,
    pub output_dir: String,
    pub screenshot: ScreenshotSettings,
    pub screen_record: ScreenRecordSettings,
    pub logging: LoggingSettings,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            adb_path: String::new(),
            log_search_root: "/sdcard/".to_string(),
            log_file_name: "citra_log.txt".to_string(),
            log_archive_dir: "citravr_logs".to_string(),
            workspace_dir: String::new(),
            output_dir: String::new(),
            screenshot: ScreenshotSettings::default(),
            screen_record: ScreenRecordSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

pub fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".collect_bugreport.json")
}

pub fn load_config(trace_id: &str) -> Result<CollectorConfig, AppError> {
    load_config_from_path(&config_path(), trace_id)
}

pub fn load_config_from_path(path: &Path, trace_id: &str) -> Result<CollectorConfig, AppError> {
    if !path.exists() {
        return Ok(CollectorConfig::default());
    }
    let raw = fs::read_to_string(path)
        .map_err(|err| AppError::system(format!("Failed to read config: {err}"), trace_id))?;
    let config: CollectorConfig = serde_json::from_str(&raw)
        .map_err(|err| AppError::validation(format!("Failed to parse config: {err}"), trace_id))?;
    Ok(validate_config(config))
}

fn validate_config(mut config: CollectorConfig) -> CollectorConfig {
    let defaults = CollectorConfig::default();
    if config.log_search_root.trim().is_empty() {
        config.log_search_root = defaults.log_search_root;
    }
    if config.log_file_name.trim().is_empty() {
        config.log_file_name = defaults.log_file_name;
    }
    if config.log_archive_dir.trim().is_empty() || config.log_archive_dir.contains(['/', '\\']) {
        config.log_archive_dir = defaults.log_archive_dir;
    }
    if !config.screenshot.remote_dir.starts_with('/') {
        config.screenshot.remote_dir = defaults.screenshot.remote_dir;
    }
    if !config.screen_record.remote_dir.starts_with('/') {
        config.screen_record.remote_dir = defaults.screen_record.remote_dir;
    }
    if config.screen_record.time_limit_sec < 0 {
        config.screen_record.time_limit_sec = 0;
    }
    if config.screen_record.stop_grace_secs == 0 {
        config.screen_record.stop_grace_secs = defaults.screen_record.stop_grace_secs;
    }
    config
}
