use async_trait::async_trait;
use macrostore_storage::{Id, Macro, MacroError, MacroService, MacroUpdate, NewMacro};

use crate::config::{BackendKind, ConfigError, StoreConfig};
use crate::file::FileMacroService;
use crate::memory::InMemoryMacroService;

/// A backend chosen at runtime from a [`StoreConfig`].
pub enum Backend {
    Memory(InMemoryMacroService),
    File(FileMacroService),
}

/// Build the backend described by `config`.
///
/// A file store with sequential ids resumes numbering after the highest id
/// already in the document.
pub async fn open_backend(config: &StoreConfig) -> Result<Backend, ConfigError> {
    config.validate()?;
    let backend = match (config.store.backend, &config.store.path) {
        (BackendKind::Memory, _) => {
            Backend::Memory(InMemoryMacroService::new(config.id_generator()?))
        }
        (BackendKind::File, Some(path)) => {
            let highest = FileMacroService::highest_stored_id(path).await?;
            let ids = config.id_generator_after(highest)?;
            Backend::File(FileMacroService::new(path, ids))
        }
        (BackendKind::File, None) => return Err(ConfigError::MissingPath),
    };
    tracing::debug!(kind = ?config.store.backend, "opened macro backend");
    Ok(backend)
}

impl Backend {
    fn service(&self) -> &dyn MacroService {
        match self {
            Backend::Memory(s) => s,
            Backend::File(s) => s,
        }
    }
}

#[async_trait]
impl MacroService for Backend {
    async fn find_macro_by_id(&self, id: Id) -> Result<Macro, MacroError> {
        self.service().find_macro_by_id(id).await
    }

    async fn find_macros(&self) -> Result<Vec<Macro>, MacroError> {
        self.service().find_macros().await
    }

    async fn create_macro(&self, new: NewMacro) -> Result<Macro, MacroError> {
        self.service().create_macro(new).await
    }

    async fn update_macro(&self, id: Id, update: &MacroUpdate) -> Result<Macro, MacroError> {
        self.service().update_macro(id, update).await
    }

    async fn replace_macro(&self, m: Macro) -> Result<(), MacroError> {
        self.service().replace_macro(m).await
    }

    async fn delete_macro(&self, id: Id) -> Result<(), MacroError> {
        self.service().delete_macro(id).await
    }
}
