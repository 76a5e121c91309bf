//! Operation logging
//!
//! Consistent start/complete/warning messages for file operations.

use std::path::Path;
use std::time::Duration;

/// Log the start of an operation on a file or directory
///
/// # Arguments
/// * `operation` - Description of the operation
/// * `path` - Path being operated on
pub fn log_operation_start(operation: &str, path: &Path) {
    log::info!("{} {}", operation, path.display());
}

/// Log the completion of an operation on a file or directory
///
/// # Arguments
/// * `operation` - Past-tense verb describing the operation
/// * `path` - Path that was operated on
/// * `items` - Number of rows processed
/// * `elapsed` - Optional elapsed time
pub fn log_operation_complete(operation: &str, path: &Path, items: usize, elapsed: Option<Duration>) {
    match elapsed {
        Some(duration) => log::info!(
            "Successfully {} {} rows ({}) in {:?}",
            operation,
            items,
            path.display(),
            duration
        ),
        None => log::info!("Successfully {} {} rows ({})", operation, items, path.display()),
    }
}

/// Log a warning, optionally tied to a path
pub fn log_warning(message: &str, path: Option<&Path>) {
    if let Some(path) = path {
        log::warn!("{}: {}", message, path.display());
    } else {
        log::warn!("{message}");
    }
}
