use chrono::NaiveDateTime;

use crate::app::models::DeviceSummary;

/// `date` format used for archive names, both on the device and as host fallback.
pub const DEVICE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

pub fn parse_adb_devices(output: &str) -> Vec<DeviceSummary> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter(|line| !line.trim_start().starts_with('*'))
        .filter(|line| !line.to_lowercase().contains("list of devices"))
        .filter_map(|line| {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() < 2 {
                return None;
            }
            let serial = tokens[0].to_string();
            let state = tokens[1].to_string();
            let mut model = None;
            let mut product = None;
            let mut device = None;
            let mut transport_id = None;
            for token in tokens.iter().skip(2) {
                if let Some(value) = token.strip_prefix("model:") {
                    model = Some(value.to_string());
                } else if let Some(value) = token.strip_prefix("product:") {
                    product = Some(value.to_string());
                } else if let Some(value) = token.strip_prefix("device:") {
                    device = Some(value.to_string());
                } else if let Some(value) = token.strip_prefix("transport_id:") {
                    transport_id = Some(value.to_string());
                }
            }
            Some(DeviceSummary {
                serial,
                state,
                model,
                product,
                device,
                transport_id,
            })
        })
        .collect()
}

/// First ready device, or the preferred serial if it is listed and ready.
pub fn select_ready_device(devices: &[DeviceSummary], preferred: Option<&str>) -> Option<String> {
    let mut ready = devices.iter().filter(|device| device.is_ready());
    match preferred.map(str::trim).filter(|serial| !serial.is_empty()) {
        Some(serial) => ready
            .find(|device| device.serial == serial)
            .map(|device| device.serial.clone()),
        None => ready.next().map(|device| device.serial.clone()),
    }
}

/// Validates `date +%Y-%m-%d_%H-%M-%S` output from the device.
pub fn parse_device_timestamp(output: &str) -> Option<String> {
    let candidate = output.lines().map(str::trim).find(|line| !line.is_empty())?;
    NaiveDateTime::parse_from_str(candidate, DEVICE_TIMESTAMP_FORMAT).ok()?;
    Some(candidate.to_string())
}

/// First absolute path printed by `find`; anything else is noise from the shell.
pub fn parse_first_find_match(output: &str, file_name: &str) -> Option<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with('/'))
        .find(|line| line.rsplit('/').next() == Some(file_name))
        .map(str::to_string)
}
