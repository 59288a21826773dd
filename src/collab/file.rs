//! Page documents stored as `<dir>/<page_id>.json`.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::error::PersistenceError;
use super::traits::Persistence;
use crate::tree::TreeDocument;

#[derive(Debug, Clone)]
pub struct FilePersistence {
    dir: PathBuf,
}

impl FilePersistence {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `page_id`. Ids that could leave `dir` are rejected.
    pub fn page_path(&self, page_id: &str) -> Result<PathBuf, PersistenceError> {
        let escapes = page_id.is_empty()
            || page_id.contains("..")
            || page_id.contains(['/', '\\'])
            || Path::new(page_id).is_absolute();
        if escapes {
            return Err(PersistenceError::InvalidPageId {
                page_id: page_id.to_string(),
            });
        }
        Ok(self.dir.join(format!("{}.json", page_id)))
    }
}

#[async_trait]
impl Persistence for FilePersistence {
    async fn load_tree(&self, page_id: &str) -> Result<TreeDocument, PersistenceError> {
        let path = self.page_path(page_id)?;
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PersistenceError::NotFound {
                    page_id: page_id.to_string(),
                })
            }
            Err(source) => return Err(PersistenceError::Io { path, source }),
        };
        let mut document = TreeDocument::from_json(&content)?;
        if document.page_id.is_empty() {
            document.page_id = page_id.to_string();
        }
        debug!(page_id, widgets = document.widgets.len(), "Loaded page document");
        Ok(document)
    }

    async fn save_tree(&self, page_id: &str, document: &TreeDocument) -> Result<(), PersistenceError> {
        let path = self.page_path(page_id)?;
        let json = document.to_json()?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| PersistenceError::Io {
                path: self.dir.clone(),
                source,
            })?;

        // Readers never observe a partially written page.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|source| PersistenceError::Io {
                path: tmp.clone(),
                source,
            })?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|source| PersistenceError::Io {
                path: path.clone(),
                source,
            })?;
        info!(page_id, path = %path.display(), "Saved page document");
        Ok(())
    }
}
