use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;

/// Public URL prefix under which stored images are served.
pub const PUBLIC_PREFIX: &str = "/uploads";

const ALLOWED_EXTENSIONS: [&str; 5] = [".jpg", ".jpeg", ".png", ".gif", ".webp"];

#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn put_object(&self, file_name: &str, body: Bytes) -> anyhow::Result<()>;
    async fn delete_object(&self, file_name: &str) -> anyhow::Result<()>;
}

/// Images kept as plain files in one directory.
#[derive(Clone)]
pub struct LocalImageStore {
    root: PathBuf,
}

impl LocalImageStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, file_name: &str) -> anyhow::Result<PathBuf> {
        let base = file_name_of(file_name)
            .with_context(|| format!("no file name in {file_name:?}"))?;
        Ok(self.root.join(base))
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn put_object(&self, file_name: &str, body: Bytes) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("create upload dir {}", self.root.display()))?;
        let path = self.path_for(file_name)?;
        tokio::fs::write(&path, &body)
            .await
            .with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    async fn delete_object(&self, file_name: &str) -> anyhow::Result<()> {
        let path = self.path_for(file_name)?;
        tokio::fs::remove_file(&path)
            .await
            .with_context(|| format!("remove {}", path.display()))?;
        Ok(())
    }
}

/// Lower-cased extension (with the dot) if it is one of the accepted image types.
pub fn allowed_extension(file_name: &str) -> Option<String> {
    let ext = Path::new(file_name).extension()?.to_str()?;
    let ext = format!(".{}", ext.to_ascii_lowercase());
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Final path component of a stored reference such as `/uploads/7_abc.png`.
/// Anything before it is ignored, so a reference can never escape the root.
pub fn file_name_of(reference: &str) -> Option<&str> {
    Path::new(reference)
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
}

pub fn public_url(file_name: &str) -> String {
    format!("{PUBLIC_PREFIX}/{file_name}")
}
