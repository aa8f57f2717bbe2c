use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Component, Path};

use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::ZipWriter;

use crate::app::error::AppError;

fn open_for_append(archive: &Path, trace_id: &str) -> Result<ZipWriter<File>, AppError> {
    if !archive.is_file() {
        return Err(AppError::validation(
            format!("Archive does not exist: {}", archive.display()),
            trace_id,
        ));
    }
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(archive)
        .map_err(|err| AppError::system(format!("Failed to open archive: {err}"), trace_id))?;
    ZipWriter::new_append(file)
        .map_err(|err| AppError::system(format!("Failed to read archive: {err}"), trace_id))
}

fn write_file_entry(
    zip: &mut ZipWriter<File>,
    name: &str,
    source: &Path,
    trace_id: &str,
) -> Result<(), AppError> {
    zip.start_file(name, FileOptions::<()>::default())
        .map_err(|err| AppError::system(format!("Failed to add {name}: {err}"), trace_id))?;
    let mut input = File::open(source)
        .map_err(|err| AppError::system(format!("Failed to open {}: {err}", source.display()), trace_id))?;
    io::copy(&mut input, zip)
        .map_err(|err| AppError::system(format!("Failed to write {name}: {err}"), trace_id))?;
    Ok(())
}

/// Archive entry name for `relative` below `base`, always `/`-separated.
pub fn entry_name(base: &str, relative: &Path) -> String {
    let mut parts = vec![base.to_string()];
    parts.extend(relative.components().filter_map(|component| match component {
        Component::Normal(part) => Some(part.to_string_lossy().to_string()),
        _ => None,
    }));
    parts.join("/")
}

/// Adds each file at the archive root under its own file name.
pub fn append_files_flat(archive: &Path, files: &[&Path], trace_id: &str) -> Result<usize, AppError> {
    let mut zip = open_for_append(archive, trace_id)?;
    let mut added = 0;
    for file in files {
        let name = file
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .ok_or_else(|| AppError::validation(format!("Not a file: {}", file.display()), trace_id))?;
        write_file_entry(&mut zip, &name, file, trace_id)?;
        added += 1;
    }
    zip.finish()
        .map_err(|err| AppError::system(format!("Failed to finalize archive: {err}"), trace_id))?;
    Ok(added)
}

/// Adds `dir` and everything below it as `<dir name>/...`.
pub fn append_dir_recursive(archive: &Path, dir: &Path, trace_id: &str) -> Result<usize, AppError> {
    let base = dir
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .ok_or_else(|| AppError::validation(format!("Not a directory: {}", dir.display()), trace_id))?;
    let mut zip = open_for_append(archive, trace_id)?;
    let mut added = 0;

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry
            .map_err(|err| AppError::system(format!("Failed to walk {}: {err}", dir.display()), trace_id))?;
        let relative = entry.path().strip_prefix(dir).unwrap_or(entry.path());
        let name = entry_name(&base, relative);
        if entry.file_type().is_dir() {
            zip.add_directory(name.as_str(), FileOptions::<()>::default())
                .map_err(|err| AppError::system(format!("Failed to add {name}: {err}"), trace_id))?;
        } else if entry.file_type().is_file() {
            write_file_entry(&mut zip, &name, entry.path(), trace_id)?;
        } else {
            continue;
        }
        added += 1;
    }

    zip.finish()
        .map_err(|err| AppError::system(format!("Failed to finalize archive: {err}"), trace_id))?;
    Ok(added)
}

/// Stands in for the archive `adb bugreport` writes.
#[cfg(test)]
pub(crate) fn create_archive_with_entry(
    archive: &Path,
    name: &str,
    content: &[u8],
    trace_id: &str,
) -> Result<(), AppError> {
    if let Some(parent) = archive.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|err| AppError::system(format!("Failed to create output dir: {err}"), trace_id))?;
    }
    let file = File::create(archive)
        .map_err(|err| AppError::system(format!("Failed to create archive: {err}"), trace_id))?;
    let mut zip = ZipWriter::new(file);
    zip.start_file(name, FileOptions::<()>::default())
        .map_err(|err| AppError::system(format!("Failed to write archive: {err}"), trace_id))?;
    io::Write::write_all(&mut zip, content)
        .map_err(|err| AppError::system(format!("Failed to write archive: {err}"), trace_id))?;
    zip.finish()
        .map_err(|err| AppError::system(format!("Failed to finalize archive: {err}"), trace_id))?;
    Ok(())
}
