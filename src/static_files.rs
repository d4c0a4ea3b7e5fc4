//! Flat file store rooted at the server's base directory.
//!
//! Names come straight from the request path and are joined onto the base
//! directory as-is; there is no traversal protection.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use tempfile::NamedTempFile;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    pub fn new<P: Into<PathBuf>>(base: P) -> Self {
        Self { base_dir: base.into() }
    }

    fn map_path(&self, name: &[u8]) -> PathBuf {
        // A leading slash would make `join` discard the base directory.
        let skip = name.iter().take_while(|&&b| b == b'/').count();
        self.base_dir.join(name_to_path(&name[skip..]))
    }

    /// Read a whole file.
    ///
    /// Returns `Ok(None)` when the file does not exist; every other failure
    /// is an error.
    pub fn read(&self, name: &[u8]) -> io::Result<Option<Vec<u8>>> {
        let path = self.map_path(name);
        match fs::read(&path) {
            Ok(bytes) => {
                debug!(path = %path.display(), size_bytes = bytes.len(), "File read");
                Ok(Some(bytes))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "File not found");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Create or replace a file with `bytes`.
    ///
    /// The bytes go to a temporary file in the target's directory which is
    /// then renamed over the target, so readers see either the old or the new
    /// contents and the last finished writer wins.
    pub fn write(&self, name: &[u8], bytes: &[u8]) -> io::Result<()> {
        let path = self.map_path(name);
        let dir = path.parent().unwrap_or(self.base_dir.as_path());

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(bytes)?;
        tmp.flush()?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(fs::Permissions::from_mode(0o644))?;
        }
        tmp.persist(&path).map_err(|e| e.error)?;

        debug!(path = %path.display(), size_bytes = bytes.len(), "File written");
        Ok(())
    }
}

/// Request bytes as a relative path. Unix paths are raw bytes; elsewhere
/// invalid UTF-8 is replaced.
#[cfg(unix)]
fn name_to_path(name: &[u8]) -> PathBuf {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;
    PathBuf::from(OsStr::from_bytes(name))
}

#[cfg(not(unix))]
fn name_to_path(name: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(name).into_owned())
}
