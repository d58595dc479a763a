//! Artifact persistence
//!
//! Files are created with their final mode so secret-bearing content is never
//! readable under the process umask, and the mode is re-applied for files
//! that already existed.

use crate::error::ProvisionError;
use nbc_compiler::{BootstrapScript, File, FileMap};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Mode for the persisted provisioning script
pub const SCRIPT_MODE: u32 = 0o755;

/// Mode for `compile --output`
pub const COMPILED_SCRIPT_MODE: u32 = 0o700;

/// Write every file, with absolute paths re-rooted under `root`
pub fn write_files(root: &Path, files: &FileMap) -> Result<usize, ProvisionError> {
    for (path, file) in files.iter() {
        write_file(&resolve(root, path), file)?;
    }
    Ok(files.len())
}

pub fn resolve(root: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    root.join(path.strip_prefix("/").unwrap_or(path))
}

pub fn write_file(path: &Path, file: &File) -> Result<(), ProvisionError> {
    write_with_mode(path, file.content.as_bytes(), file.mode)
}

pub fn write_script(path: &Path, script: &BootstrapScript, mode: u32) -> Result<(), ProvisionError> {
    write_with_mode(path, script.reveal().as_bytes(), mode)
}

fn write_with_mode(path: &Path, content: &[u8], mode: u32) -> Result<(), ProvisionError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ProvisionError::write(parent, e))?;
    }

    let mut handle = open_with_mode(path, mode).map_err(|e| ProvisionError::write(path, e))?;
    handle
        .write_all(content)
        .and_then(|_| handle.flush())
        .map_err(|e| ProvisionError::write(path, e))?;

    set_mode(path, mode).map_err(|e| ProvisionError::write(path, e))
}

#[cfg(unix)]
fn open_with_mode(path: &Path, mode: u32) -> io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(mode)
        .open(path)
}

#[cfg(not(unix))]
fn open_with_mode(path: &Path, _mode: u32) -> io::Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

// ACLs on other platforms are managed outside the bootstrapper
#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}
