use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use macrostore_storage::conformance::MacroFields;
use macrostore_storage::{
    validate_name, Id, IdGenerator, Macro, MacroError, MacroService, MacroUpdate, NewMacro,
};

/// A `MacroService` that keeps every macro in a shared map.
///
/// Clones share the same store.
#[derive(Clone)]
pub struct InMemoryMacroService {
    inner: Arc<RwLock<BTreeMap<Id, Macro>>>,
    ids: Arc<dyn IdGenerator>,
}

impl InMemoryMacroService {
    pub fn new(ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(BTreeMap::new())),
            ids,
        }
    }

    /// Build a store holding `fields.macros` that draws ids from
    /// `fields.id_generator`.
    pub fn from_fields(fields: MacroFields) -> Result<Self, MacroError> {
        let mut macros = BTreeMap::new();
        for m in fields.macros {
            m.validate()?;
            macros.insert(m.id, m);
        }
        Ok(Self {
            inner: Arc::new(RwLock::new(macros)),
            ids: fields.id_generator,
        })
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<Id, Macro>>, MacroError> {
        self.inner
            .read()
            .map_err(|_| MacroError::backend("macro store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<Id, Macro>>, MacroError> {
        self.inner
            .write()
            .map_err(|_| MacroError::backend("macro store lock poisoned"))
    }
}

#[async_trait]
impl MacroService for InMemoryMacroService {
    async fn find_macro_by_id(&self, id: Id) -> Result<Macro, MacroError> {
        self.read()?
            .get(&id)
            .cloned()
            .ok_or(MacroError::NotFound { id })
    }

    async fn find_macros(&self) -> Result<Vec<Macro>, MacroError> {
        Ok(self.read()?.values().cloned().collect())
    }

    async fn create_macro(&self, new: NewMacro) -> Result<Macro, MacroError> {
        validate_name(&new.name)?;
        let id = self.ids.id();

        let mut macros = self.write()?;
        if macros.contains_key(&id) {
            return Err(MacroError::Conflict { id });
        }
        let m = new.into_macro(id);
        macros.insert(id, m.clone());
        tracing::debug!(%id, name = %m.name, "created macro");
        Ok(m)
    }

    async fn update_macro(&self, id: Id, update: &MacroUpdate) -> Result<Macro, MacroError> {
        let mut macros = self.write()?;
        let existing = macros.get_mut(&id).ok_or(MacroError::NotFound { id })?;
        update.validate()?;
        update.apply(existing);
        tracing::debug!(%id, "updated macro");
        Ok(existing.clone())
    }

    async fn replace_macro(&self, m: Macro) -> Result<(), MacroError> {
        m.validate()?;
        let id = m.id;
        self.write()?.insert(id, m);
        tracing::debug!(%id, "replaced macro");
        Ok(())
    }

    async fn delete_macro(&self, id: Id) -> Result<(), MacroError> {
        self.write()?
            .remove(&id)
            .ok_or(MacroError::NotFound { id })?;
        tracing::debug!(%id, "deleted macro");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use macrostore_storage::{MacroArguments, SequentialIdGenerator};

    fn service() -> InMemoryMacroService {
        InMemoryMacroService::new(Arc::new(SequentialIdGenerator::new(Id::new(1).unwrap())))
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids() {
        let s = service();
        let a = s
            .create_macro(NewMacro::new("a", MacroArguments::default()))
            .await
            .unwrap();
        let b = s
            .create_macro(NewMacro::new("b", MacroArguments::default()))
            .await
            .unwrap();
        assert_eq!(a.id.get(), 1);
        assert_eq!(b.id.get(), 2);
        assert_eq!(s.find_macros().await.unwrap(), vec![a, b]);
    }

    #[tokio::test]
    async fn clones_share_state() {
        let s = service();
        let other = s.clone();
        let m = s
            .create_macro(NewMacro::new("shared", MacroArguments::default()))
            .await
            .unwrap();
        assert_eq!(other.find_macro_by_id(m.id).await.unwrap(), m);
    }

    #[tokio::test]
    async fn from_fields_rejects_blank_fixture_names() {
        let fields = MacroFields::with_macros(vec![Macro {
            id: Id::new(1).unwrap(),
            name: " ".to_string(),
            arguments: MacroArguments::default(),
        }]);
        assert!(matches!(
            InMemoryMacroService::from_fields(fields),
            Err(MacroError::Invalid { .. })
        ));
    }

    #[tokio::test]
    async fn failed_update_leaves_macro_untouched() {
        let s = service();
        let m = s
            .create_macro(NewMacro::new("keep", MacroArguments::default()))
            .await
            .unwrap();
        let update = MacroUpdate {
            name: Some(String::new()),
            arguments: Some(MacroArguments::Constant(vec!["x".into()])),
        };
        assert!(s.update_macro(m.id, &update).await.is_err());
        assert_eq!(s.find_macro_by_id(m.id).await.unwrap(), m);
    }
}
