// File: ./src/storage.rs
// Persistence of the generated calendar.
use crate::error::{FeedError, FeedResult};
use anyhow::Result;
use fs2::FileExt;
use std::fs;
use std::path::{Path, PathBuf};

pub struct LocalStorage;

impl LocalStorage {
    /// Sidecar lock file path: `out.ics` -> `out.ics.lock`.
    fn get_lock_path(file_path: &Path) -> PathBuf {
        let mut lock_path = file_path.to_path_buf();
        if let Some(ext) = lock_path.extension() {
            let mut new_ext = ext.to_os_string();
            new_ext.push(".lock");
            lock_path.set_extension(new_ext);
        } else {
            lock_path.set_extension("lock");
        }
        lock_path
    }

    /// Run `f` while holding an exclusive advisory lock next to `file_path`.
    pub fn with_lock<F, T>(file_path: &Path, f: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        let lock_path = Self::get_lock_path(file_path);
        let file = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        file.lock_exclusive()?;
        let result = f();
        file.unlock()?;
        result
    }

    /// Atomic write: Write to .tmp file then rename
    pub fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, contents: C) -> Result<()> {
        let path = path.as_ref();
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, contents)?;
        if let Err(e) = fs::rename(&tmp_path, path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        Ok(())
    }

    /// Write the output calendar. Either the whole file lands or the old one stays.
    pub fn save_calendar(path: &Path, ics: &str) -> FeedResult<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(|e| FeedError::write(path, e))?;
        }
        Self::with_lock(path, || Self::atomic_write(path, ics))
            .map_err(|e| FeedError::write(path, e))?;
        log::info!("Saved filtered calendar to: {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TestContext;

    #[test]
    fn lock_path_appends_suffix() {
        assert_eq!(
            LocalStorage::get_lock_path(Path::new("/tmp/out.ics")),
            PathBuf::from("/tmp/out.ics.lock")
        );
        assert_eq!(
            LocalStorage::get_lock_path(Path::new("/tmp/out")),
            PathBuf::from("/tmp/out.lock")
        );
    }

    #[test]
    fn save_replaces_whole_file() {
        let ctx = TestContext::new();
        let path = ctx.root.join("nested").join("cal.ics");

        LocalStorage::save_calendar(&path, "first").unwrap();
        LocalStorage::save_calendar(&path, "second").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn save_into_directory_fails_cleanly() {
        let ctx = TestContext::new();
        let dir = ctx.root.join("public");
        fs::create_dir_all(&dir).unwrap();
        let err = LocalStorage::save_calendar(&dir, "x").unwrap_err();
        assert!(matches!(err, FeedError::Write { .. }));
    }
}
