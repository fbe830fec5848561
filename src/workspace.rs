use crate::error::OutputDirError;
use std::path::Path;
use tokio::fs;

/// Finder metadata; left in place so a clean on macOS does not fight the OS.
const PRESERVED_ENTRIES: &[&str] = &[".DS_Store"];

/// Empties `dir` of everything but housekeeping files, or creates it when
/// absent. Any failure here is fatal for the run.
pub async fn prepare_output_dir(dir: &Path) -> Result<(), OutputDirError> {
    let io_error = |source| OutputDirError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let metadata = match fs::metadata(dir).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("Creating output directory {:?}", dir);
            return fs::create_dir_all(dir).await.map_err(io_error);
        }
        Err(e) => return Err(io_error(e)),
    };

    if !metadata.is_dir() {
        return Err(OutputDirError::NotADirectory(dir.to_path_buf()));
    }

    let mut entries = fs::read_dir(dir).await.map_err(io_error)?;
    while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
        let name = entry.file_name();
        if PRESERVED_ENTRIES.iter().any(|keep| name == *keep) {
            continue;
        }

        let path = entry.path();
        let file_type = entry.file_type().await.map_err(io_error)?;
        tracing::trace!("Removing stale entry {:?}", path);
        if file_type.is_dir() {
            fs::remove_dir_all(&path).await.map_err(io_error)?;
        } else {
            fs::remove_file(&path).await.map_err(io_error)?;
        }
    }

    Ok(())
}
