//! Local-disk storage for uploaded images.
//!
//! Files live in `{upload_dir}/{folder}/{name}`; names are generated here and
//! only the bare name is persisted in the database.

use std::io;
use std::path::PathBuf;

use uuid::Uuid;

use crate::config::StorageConfig;
use crate::error::{AppError, AppResult};

/// Extensions accepted for uploads, compared case-insensitively
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

pub const INVALID_FILE_TYPE_MESSAGE: &str =
    "Invalid file type. Only .jpg, .jpeg and .png files are accepted";

/// Sub-directory of the upload root
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageFolder {
    Users,
    Products,
}

impl StorageFolder {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageFolder::Users => "users",
            StorageFolder::Products => "products",
        }
    }
}

/// A stored file loaded for serving
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(&config.upload_dir)
    }

    /// Lower-cased text after the last `.`, if any
    pub fn extension(filename: &str) -> Option<String> {
        filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
    }

    pub fn verify_extension(filename: &str) -> bool {
        Self::extension(filename).is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
    }

    /// Random `{uuid}.{ext}` name keeping the (lower-cased) extension of `filename`
    pub fn generate_filename(filename: &str) -> String {
        match Self::extension(filename) {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        }
    }

    /// MIME type served for a stored file
    pub fn content_type(filename: &str) -> &'static str {
        match Self::extension(filename).as_deref() {
            Some("png") => "image/png",
            Some("jpg") | Some("jpeg") => "image/jpeg",
            _ => "application/octet-stream",
        }
    }

    /// Full path of a stored file. Names must be a single path component.
    pub fn path(&self, folder: StorageFolder, name: &str) -> AppResult<PathBuf> {
        if name.is_empty()
            || name.contains('/')
            || name.contains('\\')
            || name.contains("..")
        {
            return Err(AppError::storage(
                format!("resolve {}/{}", folder.as_str(), name),
                io::Error::new(io::ErrorKind::InvalidInput, "unsafe file name"),
            ));
        }

        Ok(self.root.join(folder.as_str()).join(name))
    }

    /// Writes `bytes`, creating the folder on first use
    pub async fn save(&self, folder: StorageFolder, name: &str, bytes: &[u8]) -> AppResult<()> {
        let path = self.path(folder, name)?;
        let dir = self.root.join(folder.as_str());

        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::storage(format!("create {}", dir.display()), e))?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| AppError::storage(format!("write {}", path.display()), e))?;

        tracing::debug!(path = %path.display(), size = bytes.len(), "Stored upload");
        Ok(())
    }

    /// Removes a stored file; a file that is already gone is not an error
    pub async fn delete(&self, folder: StorageFolder, name: &str) -> AppResult<()> {
        let path = self.path(folder, name)?;

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "Removed upload");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::storage(format!("delete {}", path.display()), e)),
        }
    }

    /// Reads a stored file, `None` when it does not exist on disk
    pub async fn read(&self, folder: StorageFolder, name: &str) -> AppResult<Option<Vec<u8>>> {
        let path = self.path(folder, name)?;

        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::storage(format!("read {}", path.display()), e)),
        }
    }

    /// Like [`Storage::read`], bundled with the name and MIME type
    pub async fn load(&self, folder: StorageFolder, name: &str) -> AppResult<Option<StoredFile>> {
        Ok(self.read(folder, name).await?.map(|bytes| StoredFile {
            name: name.to_string(),
            content_type: Self::content_type(name),
            bytes,
        }))
    }
}
