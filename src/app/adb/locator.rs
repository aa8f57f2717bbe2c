use std::path::{Path, PathBuf};

use crate::app::error::AppError;

/// Directory name under `bin/` that holds the adb build for `os`
/// (an `std::env::consts::OS` value).
pub fn platform_dir(os: &str) -> &str {
    match os {
        "windows" => "win32",
        "macos" => "darwin",
        other => other,
    }
}

pub fn bundled_adb_path(base_dir: &Path, os: &str) -> PathBuf {
    let file_name = if os == "windows" { "adb.exe" } else { "adb" };
    base_dir.join("bin").join(platform_dir(os)).join(file_name)
}

/// Directory the running executable lives in; the bundled `bin/` tree sits next to it.
pub fn executable_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.canonicalize().ok())
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn normalize_command_path(value: &str) -> String {
    let trimmed = value.trim();
    if let Some(inner) = trimmed
        .strip_prefix('"')
        .and_then(|candidate| candidate.strip_suffix('"'))
    {
        return inner.trim().to_string();
    }
    if let Some(inner) = trimmed
        .strip_prefix('\'')
        .and_then(|candidate| candidate.strip_suffix('\''))
    {
        return inner.trim().to_string();
    }
    trimmed.to_string()
}

pub fn resolve_adb_program(override_path: &str, base_dir: &Path, os: &str) -> String {
    let normalized = normalize_command_path(override_path);
    if normalized.is_empty() {
        bundled_adb_path(base_dir, os).to_string_lossy().to_string()
    } else {
        normalized
    }
}

pub fn validate_adb_program(program: &str) -> Result<(), String> {
    if program.trim().is_empty() {
        return Err("ADB command is empty".to_string());
    }
    if program == "adb" {
        return Ok(());
    }
    let path = Path::new(program);
    if path.is_dir() {
        return Err("ADB path must point to an executable file".to_string());
    }
    if !path.exists() {
        return Err("ADB executable not found".to_string());
    }
    Ok(())
}

pub fn locate_adb(
    override_path: &str,
    base_dir: &Path,
    os: &str,
    trace_id: &str,
) -> Result<String, AppError> {
    let program = resolve_adb_program(override_path, base_dir, os);
    validate_adb_program(&program).map_err(|reason| {
        AppError::adb_not_found(
            format!(
                "adb binary not found for platform {} ({program}): {reason}",
                platform_dir(os)
            ),
            trace_id,
        )
    })?;
    Ok(program)
}
