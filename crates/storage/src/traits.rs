use async_trait::async_trait;

use crate::error::MacroError;
use crate::id::Id;
use crate::record::{Macro, MacroUpdate, NewMacro};

/// The storage trait for macro backends.
///
/// A `MacroService` implementation stores macros keyed by [`Id`] and offers
/// create, lookup, list, partial update, replace and delete.
///
/// ## Identifier assignment
///
/// `create_macro` never trusts caller-supplied ids: it takes a [`NewMacro`]
/// and assigns the id from the backend's `IdGenerator`. If the generated id
/// is already stored the call fails with `MacroError::Conflict` and the store
/// is left untouched.
///
/// ## Not-found semantics
///
/// `find_macro_by_id`, `update_macro` and `delete_macro` return
/// `Err(MacroError::NotFound { id })` for an absent id. A failed update or
/// delete MUST NOT mutate stored state.
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync + 'static` so they can be shared
/// behind an `Arc` across async task boundaries.
#[async_trait]
pub trait MacroService: Send + Sync + 'static {
    /// Look up a single macro.
    ///
    /// Returns `Err(MacroError::NotFound)` if no macro has this id.
    async fn find_macro_by_id(&self, id: Id) -> Result<Macro, MacroError>;

    /// List every stored macro. Order is backend-defined.
    async fn find_macros(&self) -> Result<Vec<Macro>, MacroError>;

    /// Assign an id to `new`, persist it, and return the stored macro.
    ///
    /// Returns `Err(MacroError::Invalid)` if the name is blank.
    async fn create_macro(&self, new: NewMacro) -> Result<Macro, MacroError>;

    /// Apply a partial update and return the updated macro.
    ///
    /// The id is checked before the update is validated, so an update of an
    /// absent id always reports `NotFound`.
    async fn update_macro(&self, id: Id, update: &MacroUpdate) -> Result<Macro, MacroError>;

    /// Store `m` under its own id, inserting or overwriting.
    async fn replace_macro(&self, m: Macro) -> Result<(), MacroError>;

    /// Remove a macro.
    ///
    /// Returns `Err(MacroError::NotFound)` if no macro has this id.
    async fn delete_macro(&self, id: Id) -> Result<(), MacroError>;
}
