//! Avatar files picked in the user form and their local previews.

use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

/// An image selected for upload, held in memory until the form is submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum AvatarError {
    #[error("unsupported avatar type: {0}")]
    UnsupportedType(String),

    #[error("failed to read avatar {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AvatarFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Read an image from disk, inferring its content type from the extension.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, AvatarError> {
        let path = path.as_ref();
        let content_type = content_type_for(path).ok_or_else(|| {
            AvatarError::UnsupportedType(path.display().to_string())
        })?;

        let bytes = tokio::fs::read(path).await.map_err(|source| AvatarError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "avatar".to_string());

        Ok(Self::new(file_name, content_type, bytes))
    }

    /// `data:` URL rendering the image inline.
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.content_type,
            STANDARD.encode(&self.bytes)
        )
    }
}

/// Image content type for a file extension (case-insensitive).
pub fn content_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// A preview read that has been started but not yet applied.
///
/// Reads are tagged with the selection generation so a result that arrives
/// after the user picked another file (or cleared the field) is dropped.
#[derive(Debug, Clone)]
pub struct PendingPreview {
    pub(crate) generation: u64,
    file: AvatarFile,
}

/// Outcome of a preview read, to be handed back to the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedPreview {
    pub(crate) generation: u64,
    pub data_url: Option<String>,
}

impl PendingPreview {
    pub(crate) fn new(generation: u64, file: AvatarFile) -> Self {
        Self { generation, file }
    }

    /// Encode the image off the async executor.
    pub async fn read(self) -> LoadedPreview {
        let generation = self.generation;
        let file = self.file;
        let data_url = match tokio::task::spawn_blocking(move || file.to_data_url()).await {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(error = %e, "avatar preview read failed");
                None
            }
        };
        LoadedPreview {
            generation,
            data_url,
        }
    }
}
