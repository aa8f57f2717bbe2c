use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::app::adb::bugreport::{archive_file_name, generate_bugreport, host_timestamp};
use crate::app::adb::capture::{capture_screenrecord, capture_screenshot};
use crate::app::adb::device::{list_devices, AdbDevice};
use crate::app::adb::parse::select_ready_device;
use crate::app::adb::runner::CommandRunner;
use crate::app::adb::transfer::{locate_log_dir, pull_log_dir};
use crate::app::archive::{append_dir_recursive, append_files_flat};
use crate::app::config::CollectorConfig;
use crate::app::error::AppError;
use crate::app::interrupt::InterruptGate;
use crate::app::models::{CollectOptions, CollectReport};
use crate::app::workspace::Workspace;


/// Where progress lines for the user go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Console {
    Stdout,
    Stderr,
}

impl Console {
    fn say(self, message: &str) {
        match self {
            Console::Stdout => println!("{message}"),
            Console::Stderr => eprintln!("{message}"),
        }
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}

pub struct BugreportCollector<'a, R: CommandRunner + ?Sized> {
    runner: &'a R,
    adb_program: &'a str,
    config: &'a CollectorConfig,
    gate: &'a InterruptGate,
    console: Console,
    trace_id: &'a str,
}

impl<'a, R: CommandRunner + ?Sized> BugreportCollector<'a, R> {
    pub fn new(
        runner: &'a R,
        adb_program: &'a str,
        config: &'a CollectorConfig,
        gate: &'a InterruptGate,
        console: Console,
        trace_id: &'a str,
    ) -> Self {
        Self {
            runner,
            adb_program,
            config,
            gate,
            console,
            trace_id,
        }
    }

    pub fn select_device(&self, preferred: Option<&str>) -> Result<String, AppError> {
        let devices = list_devices(self.runner, self.adb_program, self.trace_id)?;
        info!(trace_id = %self.trace_id, count = devices.len(), "Listed devices");
        select_ready_device(&devices, preferred).ok_or_else(|| match preferred {
            Some(serial) if !serial.trim().is_empty() => AppError::no_device(
                format!("Device {} is not connected or not ready.", serial.trim()),
                self.trace_id,
            ),
            _ => AppError::no_device(
                "No device found. Make sure your device is connected.",
                self.trace_id,
            ),
        })
    }

    pub fn collect(&self, options: &CollectOptions) -> Result<CollectReport, AppError> {
        let serial = self.select_device(options.serial.as_deref())?;
        info!(trace_id = %self.trace_id, serial = %serial, "Selected device");
        let device = AdbDevice::new(self.runner, self.adb_program, serial.clone(), self.trace_id);

        let workspace = Workspace::create(&options.workspace_dir, self.trace_id)?;

        let screenshot = if options.screenshot {
            let captured = capture_screenshot(&device, &self.config.screenshot, workspace.path());
            if let Some(path) = &captured {
                self.console.say(&format!("Screenshot saved to {}", path.display()));
            }
            captured
        } else {
            None
        };

        let screenrecord = if options.screenrecord {
            self.console.say("Press Ctrl+C to stop recording...");
            let captured = capture_screenrecord(
                &device,
                &self.config.screen_record,
                workspace.path(),
                self.gate,
            );
            if let Some(path) = &captured {
                self.console.say(&format!("Screen recording saved to {}", path.display()));
            }
            captured
        } else {
            None
        };

        let log_dir = locate_log_dir(&device, &self.config.log_search_root, &self.config.log_file_name)
            .and_then(|remote| {
                pull_log_dir(&device, &remote, workspace.path(), &self.config.log_archive_dir)
                    .map(|local| (remote, local))
            });

        self.console.say("Collecting bugreport...");
        let device_timestamp = device.timestamp().unwrap_or_else(|| {
            warn!(trace_id = %self.trace_id, "Device date unavailable; using host clock for archive name");
            host_timestamp()
        });
        if let Err(err) = fs::create_dir_all(&options.output_dir) {
            warn!(trace_id = %self.trace_id, error = %err, "Failed to create output dir");
        }
        let archive = options.output_dir.join(archive_file_name(&device_timestamp));
        let archive_path = generate_bugreport(&device, &archive);

        let mut report = CollectReport {
            trace_id: self.trace_id.to_string(),
            serial,
            device_timestamp,
            archive_path: archive_path.clone(),
            screenshot: None,
            screenrecord: None,
            log_dir: None,
        };

        if let Some(archive) = archive_path.as_deref() {
            if let Some(path) = screenshot.as_deref() {
                if self.append_media(archive, path) {
                    report.screenshot = Some(file_name_of(path));
                }
            }
            if let Some(path) = screenrecord.as_deref() {
                if self.append_media(archive, path) {
                    report.screenrecord = Some(file_name_of(path));
                }
            }
            if let Some((remote, local)) = &log_dir {
                match append_dir_recursive(archive, local, self.trace_id) {
                    Ok(count) => {
                        info!(trace_id = %self.trace_id, entries = count, "Added log directory to archive");
                        report.log_dir = Some(remote.clone());
                    }
                    Err(err) => {
                        warn!(trace_id = %self.trace_id, error = %err, "Failed to add log directory to archive");
                    }
                }
            }
            self.console.say(&format!("Bugreport saved to {}", archive.display()));
        }

        workspace.cleanup();
        Ok(report)
    }

    fn append_media(&self, archive: &Path, media: &Path) -> bool {
        match append_files_flat(archive, &[media], self.trace_id) {
            Ok(_) => true,
            Err(err) => {
                warn!(trace_id = %self.trace_id, media = %media.display(), error = %err, "Failed to add capture to archive");
                false
            }
        }
    }
}

/// Default workspace: `tmp/` next to the executable.
pub fn default_workspace_dir(base_dir: &Path) -> PathBuf {
    base_dir.join("tmp")
}
