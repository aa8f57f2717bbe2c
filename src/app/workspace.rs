use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, warn};

use crate::app::error::AppError;

const WORKSPACE_PREFIX: &str = "collect_bugreport";

/// Local directory that holds pulled artifacts until they are archived.
///
/// The directory is a fresh child of the configured root, so whatever the
/// root already holds is never touched. The root itself is removed again
/// only if this workspace created it and it is empty afterwards.
#[derive(Debug)]
pub struct Workspace {
    dir: Option<TempDir>,
    path: PathBuf,
    created_root: Option<PathBuf>,
    trace_id: String,
}

impl Workspace {
    pub fn create(root: impl Into<PathBuf>, trace_id: &str) -> Result<Self, AppError> {
        let root = root.into();
        let created_root = (!root.exists()).then(|| root.clone());
        fs::create_dir_all(&root).map_err(|err| {
            AppError::system(
                format!("Failed to create workspace root {}: {err}", root.display()),
                trace_id,
            )
        })?;
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir_in(&root)
            .map_err(|err| {
                AppError::system(
                    format!("Failed to create workspace in {}: {err}", root.display()),
                    trace_id,
                )
            })?;
        let path = dir.path().to_path_buf();
        debug!(trace_id = %trace_id, path = %path.display(), "Workspace ready");
        Ok(Self {
            dir: Some(dir),
            path,
            created_root,
            trace_id: trace_id.to_string(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn cleanup(self) {
        drop(self);
    }
}

fn ignore_missing(result: io::Result<()>) -> io::Result<()> {
    match result {
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            if let Err(err) = ignore_missing(dir.close()) {
                warn!(trace_id = %self.trace_id, path = %self.path.display(), error = %err, "Failed to remove workspace");
            }
        }
        // remove_dir refuses a non-empty root.
        if let Some(root) = &self.created_root {
            if let Err(err) = ignore_missing(fs::remove_dir(root)) {
                debug!(trace_id = %self.trace_id, root = %root.display(), error = %err, "Workspace root left in place");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_missing_root_and_a_child_inside_it() {
        let dir = TempDir::new().expect("tmp");
        let root = dir.path().join("a").join("tmp");
        let workspace = Workspace::create(&root, "trace").expect("workspace");
        assert!(workspace.path().is_dir());
        assert_eq!(workspace.path().parent(), Some(root.as_path()));
    }

    #[test]
    fn cleanup_removes_tree_and_created_root() {
        let dir = TempDir::new().expect("tmp");
        let root = dir.path().join("tmp");
        let workspace = Workspace::create(&root, "trace").expect("workspace");
        fs::create_dir_all(workspace.path().join("citravr_logs")).expect("mkdir");
        fs::write(workspace.path().join("citravr_logs").join("citra_log.txt"), b"log").expect("write");

        workspace.cleanup();
        assert!(!root.exists());
    }

    #[test]
    fn cleanup_tolerates_a_vanished_directory() {
        let dir = TempDir::new().expect("tmp");
        let root = dir.path().join("tmp");
        let workspace = Workspace::create(&root, "trace").expect("workspace");
        fs::remove_dir_all(&root).expect("remove behind the workspace's back");

        workspace.cleanup();
        assert!(!root.exists());
    }

    #[test]
    fn existing_root_and_its_contents_survive() {
        let dir = TempDir::new().expect("tmp");
        let root = dir.path().join("mydocs");
        fs::create_dir_all(&root).expect("mkdir");
        fs::write(root.join("notes.txt"), b"keep me").expect("write");

        let workspace = Workspace::create(&root, "trace").expect("workspace");
        let path = workspace.path().to_path_buf();
        workspace.cleanup();

        assert!(!path.exists());
        assert_eq!(fs::read(root.join("notes.txt")).expect("read"), b"keep me");
        let remaining: Vec<_> = fs::read_dir(&root).expect("read_dir").collect();
        assert_eq!(remaining.len(), 1);
    }

    #[test]
    fn concurrent_workspaces_do_not_share_a_directory() {
        let dir = TempDir::new().expect("tmp");
        let first = Workspace::create(dir.path().join("tmp"), "trace").expect("workspace");
        let second = Workspace::create(dir.path().join("tmp"), "trace").expect("workspace");
        assert_ne!(first.path(), second.path());
    }
}
