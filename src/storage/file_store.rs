use std::{
    fs::{self, File},
    io::{ErrorKind, Read, Write},
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use fs4::fs_std::FileExt;
use tracing::debug;

use super::KeyValueStore;

const LOCK_FILE: &str = ".lock";

/// The main realization of [KeyValueStore]. Every key is a `<key>.json` file inside `dir`.
///
/// Writes go through a temporary file that is renamed over the old value, so a reader sees
/// either the previous value or the new one. Processes coordinate through `.lock` in `dir`:
/// writers hold it exclusively, readers hold it shared.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Result<Self, std::io::Error> {
        fs::create_dir_all(&dir)?;

        Ok(Self { dir })
    }

    fn value_path(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }

    fn read_locked(&self, path: &Path) -> Result<Option<String>> {
        let lock_path = self.dir.join(LOCK_FILE);
        // Nothing was ever written while there is no lock file
        let lock = match File::open(&lock_path) {
            Ok(lock) => Some(lock),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                return Err(e).with_context(|| format!("open lock file {}", lock_path.display()))
            }
        };

        if let Some(lock) = &lock {
            FileExt::lock_shared(lock).with_context(|| format!("lock {}", lock_path.display()))?;
        }
        let result = read_value(path);
        if let Some(lock) = &lock {
            FileExt::unlock(lock).with_context(|| format!("unlock {}", lock_path.display()))?;
        }
        result.with_context(|| format!("read {}", path.display()))
    }

    fn write_atomic(&self, path: &Path, value: &str) -> Result<()> {
        let lock_path = self.dir.join(LOCK_FILE);
        let lock = File::options()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .with_context(|| format!("open lock file {}", lock_path.display()))?;

        // Semi-safe acquire-release around the replace
        FileExt::lock_exclusive(&lock)
            .with_context(|| format!("lock {}", lock_path.display()))?;
        let result = Self::replace(path, value);
        FileExt::unlock(&lock).with_context(|| format!("unlock {}", lock_path.display()))?;
        result
    }

    fn replace(path: &Path, value: &str) -> Result<()> {
        let tmp_path = path.with_extension("json.tmp");
        {
            let mut tmp = File::create(&tmp_path)
                .with_context(|| format!("create {}", tmp_path.display()))?;
            tmp.write_all(value.as_bytes())
                .with_context(|| format!("write {}", tmp_path.display()))?;
            tmp.sync_all()
                .with_context(|| format!("sync {}", tmp_path.display()))?;
        }
        fs::rename(&tmp_path, path).with_context(|| format!("replace {}", path.display()))?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.value_path(key)?;
        debug!("Reading {path:?}");
        self.read_locked(&path)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.value_path(key)?;
        debug!("Writing {} bytes into {path:?}", value.len());
        self.write_atomic(&path, value)
    }
}

fn read_value(path: &Path) -> std::result::Result<Option<String>, std::io::Error> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    Ok(Some(contents))
}

/// Keys become file names, so anything that could escape the directory is refused.
fn validate_key(key: &str) -> Result<()> {
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.');
    if key.is_empty() || key.starts_with('.') || !key.chars().all(allowed) {
        bail!("Illegal storage key {key:?}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs::{self, File};

    use anyhow::Result;
    use fs4::fs_std::FileExt;
    use tempfile::tempdir;

    use super::FileStore;
    use crate::storage::KeyValueStore;

    #[test]
    fn missing_key_is_none() -> Result<()> {
        let dir = tempdir()?;
        let store = FileStore::new(dir.path().to_owned())?;

        assert_eq!(store.get("habits")?, None);
        Ok(())
    }

    #[test]
    fn set_then_get() -> Result<()> {
        let dir = tempdir()?;
        let mut store = FileStore::new(dir.path().to_owned())?;

        store.set("habits", "[]")?;
        assert_eq!(store.get("habits")?.as_deref(), Some("[]"));

        store.set("habits", r#"[{"id":"1"}]"#)?;
        assert_eq!(store.get("habits")?.as_deref(), Some(r#"[{"id":"1"}]"#));
        Ok(())
    }

    #[test]
    fn values_survive_reopening() -> Result<()> {
        let dir = tempdir()?;
        FileStore::new(dir.path().to_owned())?.set("habits", "saved")?;

        let reopened = FileStore::new(dir.path().to_owned())?;
        assert_eq!(reopened.get("habits")?.as_deref(), Some("saved"));
        Ok(())
    }

    #[test]
    fn creates_missing_directory() -> Result<()> {
        let dir = tempdir()?;
        let nested = dir.path().join("a").join("b");
        let mut store = FileStore::new(nested.clone())?;

        store.set("habits", "[]")?;
        assert!(nested.join("habits.json").exists());
        Ok(())
    }

    #[test]
    fn replace_leaves_no_temporary_file() -> Result<()> {
        let dir = tempdir()?;
        let mut store = FileStore::new(dir.path().to_owned())?;

        store.set("habits", "[]")?;

        let names = fs::read_dir(dir.path())?
            .map(|entry| entry.map(|e| e.file_name().to_string_lossy().to_string()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        assert!(names.contains(&"habits.json".to_string()));
        assert!(!names.iter().any(|n| n.ends_with(".tmp")));
        Ok(())
    }

    #[test]
    fn reads_share_the_writer_lock_file() -> Result<()> {
        let dir = tempdir()?;
        let mut store = FileStore::new(dir.path().to_owned())?;
        store.set("habits", "[]")?;

        let lock = File::open(dir.path().join(".lock"))?;
        FileExt::lock_shared(&lock)?;
        assert_eq!(store.get("habits")?.as_deref(), Some("[]"));
        FileExt::unlock(&lock)?;
        Ok(())
    }

    #[test]
    fn reads_without_lock_file() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("habits.json"), "[]")?;
        let store = FileStore::new(dir.path().to_owned())?;

        assert_eq!(store.get("habits")?.as_deref(), Some("[]"));
        assert!(!dir.path().join(".lock").exists());
        Ok(())
    }

    #[test]
    fn rejects_path_like_keys() -> Result<()> {
        let dir = tempdir()?;
        let mut store = FileStore::new(dir.path().to_owned())?;

        assert!(store.set("../escape", "x").is_err());
        assert!(store.set("a/b", "x").is_err());
        assert!(store.set(".lock", "x").is_err());
        assert!(store.get("").is_err());
        assert!(store.set("habits.corrupt", "x").is_ok());
        Ok(())
    }
}
