//! A `MacroService` persisted as a single JSON document.
//!
//! Every mutation reads the document, applies the change, and writes the
//! result to `<path>.tmp` before renaming it over `<path>`, so readers never
//! observe a partially written file. Mutations are serialized by an async
//! mutex; concurrent processes sharing one file are not coordinated.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use macrostore_storage::{
    validate_name, Id, IdGenerator, Macro, MacroError, MacroService, MacroUpdate, NewMacro,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// On-disk document layout.
#[derive(Debug, Default, Serialize, Deserialize)]
struct MacroFile {
    #[serde(default)]
    macros: Vec<Macro>,
}

pub struct FileMacroService {
    path: PathBuf,
    ids: Arc<dyn IdGenerator>,
    write_lock: Mutex<()>,
}

impl FileMacroService {
    /// Open (or lazily create) the store at `path`. A missing file reads as
    /// an empty store; the file is created on the first mutation.
    pub fn new(path: impl Into<PathBuf>, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            path: path.into(),
            ids,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Highest id stored in the document at `path`, if any.
    ///
    /// Used to resume a sequential id generator past ids handed out by an
    /// earlier process.
    pub async fn highest_stored_id(path: &Path) -> Result<Option<Id>, MacroError> {
        Ok(load_document(path).await?.keys().next_back().copied())
    }

    async fn load(&self) -> Result<BTreeMap<Id, Macro>, MacroError> {
        load_document(&self.path).await
    }

    async fn store(&self, macros: &BTreeMap<Id, Macro>) -> Result<(), MacroError> {
        let file = MacroFile {
            macros: macros.values().cloned().collect(),
        };
        let bytes = serde_json::to_vec_pretty(&file).map_err(MacroError::backend)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                MacroError::backend(format!("failed to create {}: {}", parent.display(), e))
            })?;
        }

        write_atomically(&self.path, &self.tmp_path(), bytes).await
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }
}

async fn load_document(path: &Path) -> Result<BTreeMap<Id, Macro>, MacroError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(e) => {
            return Err(MacroError::backend(format!(
                "failed to read {}: {}",
                path.display(),
                e
            )))
        }
    };
    let file: MacroFile = serde_json::from_slice(&bytes)
        .map_err(|e| MacroError::backend(format!("failed to parse {}: {}", path.display(), e)))?;

    let mut macros = BTreeMap::new();
    for m in file.macros {
        let id = m.id;
        if macros.insert(id, m).is_some() {
            return Err(MacroError::backend(format!(
                "duplicate macro id {} in {}",
                id,
                path.display()
            )));
        }
    }
    Ok(macros)
}

/// Write `bytes` to `tmp`, then rename it over `path`. The temp file is
/// removed if the rename fails.
async fn write_atomically(path: &Path, tmp: &Path, bytes: Vec<u8>) -> Result<(), MacroError> {
    tokio::fs::write(tmp, bytes)
        .await
        .map_err(|e| MacroError::backend(format!("failed to write {}: {}", tmp.display(), e)))?;
    if let Err(e) = tokio::fs::rename(tmp, path).await {
        if let Err(cleanup) = tokio::fs::remove_file(tmp).await {
            tracing::warn!(path = %tmp.display(), error = %cleanup, "failed to remove temp file");
        }
        return Err(MacroError::backend(format!(
            "failed to move {} into place: {}",
            tmp.display(),
            e
        )));
    }
    Ok(())
}

#[async_trait]
impl MacroService for FileMacroService {
    async fn find_macro_by_id(&self, id: Id) -> Result<Macro, MacroError> {
        self.load()
            .await?
            .remove(&id)
            .ok_or(MacroError::NotFound { id })
    }

    async fn find_macros(&self) -> Result<Vec<Macro>, MacroError> {
        Ok(self.load().await?.into_values().collect())
    }

    async fn create_macro(&self, new: NewMacro) -> Result<Macro, MacroError> {
        validate_name(&new.name)?;
        let _guard = self.write_lock.lock().await;

        let mut macros = self.load().await?;
        let id = self.ids.id();
        if macros.contains_key(&id) {
            return Err(MacroError::Conflict { id });
        }
        let m = new.into_macro(id);
        macros.insert(id, m.clone());
        self.store(&macros).await?;
        tracing::debug!(%id, path = %self.path.display(), "created macro");
        Ok(m)
    }

    async fn update_macro(&self, id: Id, update: &MacroUpdate) -> Result<Macro, MacroError> {
        let _guard = self.write_lock.lock().await;

        let mut macros = self.load().await?;
        let existing = macros.get_mut(&id).ok_or(MacroError::NotFound { id })?;
        update.validate()?;
        update.apply(existing);
        let updated = existing.clone();
        self.store(&macros).await?;
        tracing::debug!(%id, path = %self.path.display(), "updated macro");
        Ok(updated)
    }

    async fn replace_macro(&self, m: Macro) -> Result<(), MacroError> {
        m.validate()?;
        let _guard = self.write_lock.lock().await;

        let mut macros = self.load().await?;
        let id = m.id;
        macros.insert(id, m);
        self.store(&macros).await?;
        tracing::debug!(%id, path = %self.path.display(), "replaced macro");
        Ok(())
    }

    async fn delete_macro(&self, id: Id) -> Result<(), MacroError> {
        let _guard = self.write_lock.lock().await;

        let mut macros = self.load().await?;
        macros.remove(&id).ok_or(MacroError::NotFound { id })?;
        self.store(&macros).await?;
        tracing::debug!(%id, path = %self.path.display(), "deleted macro");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use macrostore_storage::{MacroArguments, SequentialIdGenerator, StaticIdGenerator};

    fn ids() -> Arc<dyn IdGenerator> {
        Arc::new(SequentialIdGenerator::new(Id::new(0x10).unwrap()))
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let s = FileMacroService::new(dir.path().join("macros.json"), ids());
        assert!(s.find_macros().await.unwrap().is_empty());
        assert!(!s.path().exists());
    }

    #[tokio::test]
    async fn state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("macros.json");

        let created = {
            let s = FileMacroService::new(&path, ids());
            s.create_macro(NewMacro::new(
                "regions",
                MacroArguments::Map([("east".to_string(), "us-east-1".to_string())].into()),
            ))
            .await
            .unwrap()
        };

        let reopened = FileMacroService::new(&path, ids());
        assert_eq!(
            reopened.find_macro_by_id(created.id).await.unwrap(),
            created
        );
    }

    #[tokio::test]
    async fn creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store").join("macros.json");
        let s = FileMacroService::new(&path, ids());
        s.create_macro(NewMacro::new("a", MacroArguments::default()))
            .await
            .unwrap();
        assert!(path.exists());
        assert!(!s.tmp_path().exists());
    }

    #[tokio::test]
    async fn file_is_readable_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("macros.json");
        let id = Id::new(0x020f_755c_3c08_2000).unwrap();
        let s = FileMacroService::new(&path, Arc::new(StaticIdGenerator::new(id)));
        s.create_macro(NewMacro::new("hosts", MacroArguments::Constant(vec!["a".into()])))
            .await
            .unwrap();

        let doc: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(
            doc,
            serde_json::json!({
                "macros": [{
                    "id": "020f755c3c082000",
                    "name": "hosts",
                    "arguments": {"type": "constant", "values": ["a"]}
                }]
            })
        );
    }

    #[tokio::test]
    async fn corrupt_file_is_a_backend_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("macros.json");
        std::fs::write(&path, b"{not json").unwrap();
        let s = FileMacroService::new(&path, ids());
        let err = s.find_macros().await.unwrap_err();
        assert!(matches!(err, MacroError::Backend(_)));
        assert!(err.to_string().contains("failed to parse"));
    }

    #[tokio::test]
    async fn failed_delete_does_not_touch_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("macros.json");
        let s = FileMacroService::new(&path, ids());
        let err = s.delete_macro(Id::new(1).unwrap()).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn duplicate_ids_are_a_backend_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("macros.json");
        let entry = serde_json::json!({
            "id": "020f755c3c082000",
            "name": "hosts",
            "arguments": {"type": "constant", "values": []}
        });
        let doc = serde_json::json!({ "macros": [entry.clone(), entry] });
        std::fs::write(&path, serde_json::to_vec(&doc).unwrap()).unwrap();

        let s = FileMacroService::new(&path, ids());
        let err = s.find_macros().await.unwrap_err();
        assert!(matches!(err, MacroError::Backend(_)));
        assert!(
            err.to_string().contains("duplicate macro id 020f755c3c082000"),
            "{err}"
        );
    }

    #[tokio::test]
    async fn failed_rename_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        // Renaming a file over a non-empty directory always fails.
        let target = dir.path().join("occupied");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep"), b"x").unwrap();
        let tmp = dir.path().join("occupied.tmp");

        let err = write_atomically(&target, &tmp, b"{}".to_vec())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed to move"), "{err}");
        assert!(!tmp.exists());
        assert!(target.join("keep").exists());
    }

    #[tokio::test]
    async fn highest_stored_id_reads_the_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("macros.json");
        assert_eq!(FileMacroService::highest_stored_id(&path).await.unwrap(), None);

        let s = FileMacroService::new(&path, ids());
        s.replace_macro(Macro {
            id: Id::new(0x30).unwrap(),
            name: "b".to_string(),
            arguments: MacroArguments::default(),
        })
        .await
        .unwrap();
        s.replace_macro(Macro {
            id: Id::new(0x20).unwrap(),
            name: "a".to_string(),
            arguments: MacroArguments::default(),
        })
        .await
        .unwrap();

        assert_eq!(
            FileMacroService::highest_stored_id(&path).await.unwrap(),
            Some(Id::new(0x30).unwrap())
        );
    }
}
