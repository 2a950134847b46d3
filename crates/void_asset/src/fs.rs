//! File-system helpers used by the asset pipeline
//!
//! Reads go through a bounded retry so a file that an external tool is
//! still writing gets a short grace period before the load fails.

use crate::error::{AssetError, AssetResult};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant, UNIX_EPOCH};

const RETRY_STEP: Duration = Duration::from_millis(10);

pub fn exists(path: &Path) -> bool {
    path.exists()
}

/// Modification time in nanoseconds since the epoch, 0 when unavailable
pub fn last_write_time(path: &Path) -> u64 {
    std::fs::metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
        .map(|since| u64::try_from(since.as_nanos()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

fn is_lock_error(kind: ErrorKind) -> bool {
    matches!(kind, ErrorKind::PermissionDenied | ErrorKind::WouldBlock | ErrorKind::Interrupted)
}

/// Open a file, retrying while it appears locked
pub fn open_with_retry(path: &Path, wait: Duration) -> AssetResult<File> {
    let deadline = Instant::now() + wait;

    loop {
        match File::open(path) {
            Ok(file) => return Ok(file),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(AssetError::NotFound(path.to_path_buf()));
            }
            Err(e) if is_lock_error(e.kind()) => {
                if Instant::now() >= deadline {
                    return Err(AssetError::FileLocked(path.to_path_buf()));
                }
                thread::sleep(RETRY_STEP);
            }
            Err(e) => return Err(AssetError::io(path, e)),
        }
    }
}

/// Read a whole file
pub fn read_bytes(path: &Path, wait: Duration) -> AssetResult<Vec<u8>> {
    let mut file = open_with_retry(path, wait)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| AssetError::io(path, e))?;
    Ok(bytes)
}

/// Read a whole file as UTF-8
pub fn read_string(path: &Path, wait: Duration) -> AssetResult<String> {
    let bytes = read_bytes(path, wait)?;
    String::from_utf8(bytes).map_err(|e| AssetError::parse(path, format!("invalid UTF-8: {}", e)))
}

/// Write a file, creating parent directories
pub fn write_bytes(path: &Path, bytes: &[u8]) -> AssetResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| AssetError::io(parent, e))?;
        }
    }
    std::fs::write(path, bytes).map_err(|e| AssetError::io(path, e))
}
