use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::store::FormStore;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to access store file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("store file {path} is not a valid store document: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Load the store at `path`; a missing file yields an empty store.
pub fn load(path: &Path) -> Result<FormStore, PersistError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "store file missing; starting empty");
            return Ok(FormStore::new());
        }
        Err(source) => {
            return Err(PersistError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    serde_json::from_str(&contents).map_err(|source| PersistError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Write the store to `path`, replacing the previous file only once the new one is complete.
pub fn save(store: &FormStore, path: &Path) -> Result<(), PersistError> {
    let io_err = |source: io::Error| PersistError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let contents = serde_json::to_string_pretty(store).map_err(|source| PersistError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let mut staging = path.as_os_str().to_owned();
    staging.push(".tmp");
    let staging = PathBuf::from(staging);
    fs::write(&staging, contents).map_err(io_err)?;
    if let Err(source) = fs::rename(&staging, path) {
        let _ = fs::remove_file(&staging);
        return Err(io_err(source));
    }
    debug!(path = %path.display(), "store file written");
    Ok(())
}
