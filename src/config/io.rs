use std::env::current_exe;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::str;
use std::sync::Arc;
use directories_next::ProjectDirs;
use fd_lock::{RwLock, RwLockWriteGuard};
use log::{info, warn};
use parking_lot::Mutex;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::config::types::Config;
use crate::error::ConfigError;

// creates a path to <exe name>.json in the same directory as the executable
// this could be useful for usb sticks
fn get_portable_config_path() -> Option<PathBuf> {
    match current_exe() {
        Ok(mut path) => {
            if !path.set_extension("json") {
                warn!("current exe has no filename: {}", path.to_string_lossy());
                return None
            }

            Some(path)
        },
        Err(err) => {
            warn!("failed to get current exe path: {:?}", err);
            None
        },
    }
}

// creates a path to muteme-button.json in an os dependent standard directory, such as
// ~/.config/muteme-button on linux.
fn get_local_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "muteme", "muteme-button").map(|dirs| {
        dirs.config_dir().join("muteme-button.json")
    })
}

fn get_config_path() -> Result<PathBuf, ConfigError> {
    if let Some(path) = get_portable_config_path() {
        if path.is_file() {
            return Ok(path);
        }
    }

    get_local_config_path().ok_or(ConfigError::NoConfigPath)
}

pub struct ConfigIOLocker {
    rw_lock: RwLock<std::fs::File>,
}

impl ConfigIOLocker {
    /// Take the exclusive lock that marks this process as the running instance.
    pub fn lock(&mut self) -> Result<RwLockWriteGuard<'_, std::fs::File>, ConfigError> {
        self.rw_lock
            .try_write()
            .map_err(|source| ConfigError::CanNotLock { source })
    }
}

/// The config file, read once at start-up and held open for the single-instance lock.
#[derive(Clone)]
pub struct ConfigIO {
    file: Arc<Mutex<std::fs::File>>,
}

impl ConfigIO {
    /// Open the config file at the standard location, creating it (and its directory) if needed.
    /// A freshly created file is empty and reads as the defaults.
    pub fn new_sync() -> Result<Self, ConfigError> {
        let path = get_config_path()?;
        Self::open(&path)
    }

    pub fn open(path: &Path) -> Result<Self, ConfigError> {
        info!("Using config file {}", path.to_string_lossy());

        if let Some(directory) = path.parent() {
            std::fs::create_dir_all(directory)?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .truncate(false)
            .append(false)
            .create(true)
            .open(path)?;

        Ok(ConfigIO { file: Arc::new(Mutex::new(file)) })
    }

    pub fn locker(&self) -> Result<ConfigIOLocker, ConfigError> {
        let file = self.file.lock();

        Ok(ConfigIOLocker {
            rw_lock: RwLock::new(file.try_clone()?),
        })
    }

    // The File returned from here should never be closed!
    fn get_file(&self) -> Result<File, ConfigError> {
        let file = self.file.lock().try_clone()?; // std File
        Ok(File::from_std(file)) // tokio File
    }

    /// Read the config. An empty file yields the defaults.
    pub async fn read(&self) -> Result<Config, ConfigError> {
        let mut file = self.get_file()?;
        info!("Reading config file");

        let mut content = vec![];
        file.rewind().await?;
        file.read_to_end(&mut content).await?;

        if content.iter().all(u8::is_ascii_whitespace) {
            return Ok(Config::default());
        }

        let content = str::from_utf8(&content)?;
        let config: Config = serde_json::from_str(content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn empty_file_reads_as_defaults() {
        let dir = tempdir().expect("tempdir");
        let config_io = ConfigIO::open(&dir.path().join("nested").join("muteme-button.json")).expect("open");

        assert_eq!(config_io.read().await.expect("read"), Config::default());
    }

    #[tokio::test]
    async fn written_config_is_read() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("muteme-button.json");
        std::fs::write(&path, r#"{ "mutedColor": "Purple", "retryDelaySecs": 9 }"#).expect("write");

        let config_io = ConfigIO::open(&path).expect("open");
        let expected = Config { muted_color: "Purple".to_string(), retry_delay_secs: 9, ..Config::default() };
        assert_eq!(config_io.read().await.expect("read"), expected);

        // reading twice starts from the top again
        assert_eq!(config_io.read().await.expect("read"), expected);
    }

    #[tokio::test]
    async fn missing_file_is_created_and_reads_as_defaults() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("muteme-button.json");

        let config_io = ConfigIO::open(&path).expect("open");

        assert!(path.is_file());
        assert_eq!(config_io.read().await.expect("read"), Config::default());
    }

    #[tokio::test]
    async fn malformed_json_is_an_error() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("muteme-button.json");
        std::fs::write(&path, "{ not json").expect("write");

        let config_io = ConfigIO::open(&path).expect("open");
        assert!(matches!(config_io.read().await, Err(ConfigError::JsonError { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn second_instance_cannot_lock() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("muteme-button.json");

        let first = ConfigIO::open(&path).expect("open");
        let mut first_locker = first.locker().expect("locker");
        let _guard = first_locker.lock().expect("first lock");

        let second = ConfigIO::open(&path).expect("open");
        let mut second_locker = second.locker().expect("locker");
        assert!(matches!(second_locker.lock(), Err(ConfigError::CanNotLock { .. })));
    }
}
