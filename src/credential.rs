use std::io;
use std::path::{Path, PathBuf};

/// Where the pairing key lives between runs
pub trait CredentialStore {
    /// Stored key, or `None` when the client has never been paired.
    fn load(&self) -> io::Result<Option<String>>;

    fn save(&self, key: &str) -> io::Result<()>;
}

/// Plain-text key file holding a single token
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> io::Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let key = content.trim();
                Ok((!key.is_empty()).then(|| key.to_string()))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn save(&self, key: &str) -> io::Result<()> {
        std::fs::write(&self.path, key)
    }
}
