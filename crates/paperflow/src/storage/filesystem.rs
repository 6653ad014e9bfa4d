use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::TempPath;

use crate::error::StorageError;

/// Move a file from `src` to `dst`. Uses `rename` first (fast, atomic on same
/// filesystem). Falls back to copy + delete when rename fails, which covers
/// an archive directory on another device.
fn move_file(src: &Path, dst: &Path) -> Result<(), StorageError> {
    if std::fs::rename(src, dst).is_ok() {
        return Ok(());
    }

    std::fs::copy(src, dst).map_err(|e| StorageError::MoveFile {
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
        source: e,
    })?;
    File::open(dst)
        .and_then(|f| f.sync_all())
        .map_err(|e| StorageError::WriteFile {
            path: dst.to_path_buf(),
            source: e,
        })?;
    std::fs::remove_file(src).map_err(|e| StorageError::MoveFile {
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

/// Flushes directory entries so a completed rename survives a crash.
/// Not every platform allows opening a directory, so this is best effort.
fn sync_directory(path: &Path) {
    if let Err(e) = File::open(path).and_then(|d| d.sync_all()) {
        tracing::debug!("Directory sync skipped for {}: {}", path.display(), e);
    }
}

/// Owns the `output/` and `processed/` directories.
///
/// Artifacts are first staged as hidden temporary files inside `output/`
/// and only renamed to `<stem>.<ext>` on commit. Dropping a staged file
/// without committing removes it, so an aborted job leaves nothing behind.
pub struct FileStorage {
    output_directory: PathBuf,
    processed_directory: PathBuf,
}

impl FileStorage {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(
        output_directory: P,
        processed_directory: Q,
    ) -> Self {
        Self {
            output_directory: output_directory.as_ref().to_path_buf(),
            processed_directory: processed_directory.as_ref().to_path_buf(),
        }
    }

    pub fn output_directory(&self) -> &Path {
        &self.output_directory
    }

    pub fn ensure_directories(&self) -> Result<(), StorageError> {
        ensure_directory(&self.output_directory)?;
        ensure_directory(&self.processed_directory)
    }

    /// Final location of an artifact.
    pub fn output_path(&self, stem: &str, extension: &str) -> PathBuf {
        self.output_directory.join(format!("{}.{}", stem, extension))
    }

    /// Reserves an empty hidden file in `output/` for a writer that needs a
    /// path (the external OCR tool).
    pub fn stage(&self, stem: &str, extension: &str) -> Result<TempPath, StorageError> {
        ensure_directory(&self.output_directory)?;
        tempfile::Builder::new()
            .prefix(&format!(".{}.", stem))
            .suffix(&format!(".part.{}", extension))
            .tempfile_in(&self.output_directory)
            .map(|f| f.into_temp_path())
            .map_err(|e| StorageError::Stage {
                directory: self.output_directory.clone(),
                source: e,
            })
    }

    /// Stages `content` and flushes it to disk.
    pub fn stage_bytes(
        &self,
        stem: &str,
        extension: &str,
        content: &[u8],
    ) -> Result<TempPath, StorageError> {
        ensure_directory(&self.output_directory)?;
        let mut file = tempfile::Builder::new()
            .prefix(&format!(".{}.", stem))
            .suffix(&format!(".part.{}", extension))
            .tempfile_in(&self.output_directory)
            .map_err(|e| StorageError::Stage {
                directory: self.output_directory.clone(),
                source: e,
            })?;

        file.write_all(content)
            .and_then(|_| file.as_file().sync_all())
            .map_err(|e| StorageError::WriteFile {
                path: file.path().to_path_buf(),
                source: e,
            })?;

        Ok(file.into_temp_path())
    }

    /// Atomically publishes a staged file as `<stem>.<extension>`,
    /// replacing any earlier artifact of the same name.
    pub fn commit(
        &self,
        staged: TempPath,
        stem: &str,
        extension: &str,
    ) -> Result<PathBuf, StorageError> {
        let target = self.output_path(stem, extension);
        let from = staged.to_path_buf();

        File::open(&from)
            .and_then(|f| f.sync_all())
            .map_err(|e| StorageError::WriteFile {
                path: from.clone(),
                source: e,
            })?;

        staged.persist(&target).map_err(|e| StorageError::MoveFile {
            from,
            to: target.clone(),
            source: e.error,
        })?;
        sync_directory(&self.output_directory);

        Ok(target)
    }

    /// Moves the source into `processed/` under its own name. An existing
    /// archived file of that name is kept and the new one gets a numbered
    /// suffix.
    pub fn archive<P: AsRef<Path>>(&self, source_path: P) -> Result<PathBuf, StorageError> {
        let source_path = source_path.as_ref();
        ensure_directory(&self.processed_directory)?;

        let original_name = source_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| StorageError::InvalidName(source_path.to_path_buf()))?;

        let archive_path = resolve_conflict(&self.processed_directory, original_name)?;
        move_file(source_path, &archive_path)?;
        sync_directory(&self.processed_directory);

        Ok(archive_path)
    }
}

pub fn ensure_directory(path: &Path) -> Result<(), StorageError> {
    if !path.exists() {
        std::fs::create_dir_all(path).map_err(|e| StorageError::CreateDirectory {
            path: path.to_path_buf(),
            source: e,
        })?;
    }
    Ok(())
}

/// Finds an unused name in `directory`, appending `_2`, `_3`, ... to the
/// base name as needed.
fn resolve_conflict(directory: &Path, filename: &str) -> Result<PathBuf, StorageError> {
    let path = directory.join(filename);
    if std::fs::symlink_metadata(&path).is_err() {
        return Ok(path);
    }

    let (base, ext) = match filename.rfind('.') {
        Some(dot_pos) if dot_pos > 0 => (&filename[..dot_pos], Some(&filename[dot_pos..])),
        _ => (filename, None),
    };

    for counter in 2..=1000 {
        let new_filename = match ext {
            Some(ext) => format!("{}_{}{}", base, counter, ext),
            None => format!("{}_{}", base, counter),
        };

        let new_path = directory.join(&new_filename);
        if std::fs::symlink_metadata(&new_path).is_err() {
            return Ok(new_path);
        }
    }

    Err(StorageError::InvalidName(path))
}
