use crate::id::Id;

/// All errors that can be returned by a `MacroService` implementation.
///
/// Every message ends with the platform's error reference code so callers
/// comparing on text see the same string from every backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MacroError {
    /// No macro is stored under the given id.
    #[error("macro with ID {id} not found (error reference code: 5)")]
    NotFound { id: Id },

    /// The macro (or update) failed validation.
    #[error("invalid macro: {reason} (error reference code: 2)")]
    Invalid { reason: String },

    /// A macro with this id is already stored.
    #[error("macro with ID {id} already exists (error reference code: 6)")]
    Conflict { id: Id },

    /// A backend-specific failure (I/O, serialization, poisoned lock, ...).
    #[error("storage backend error: {0} (error reference code: 1)")]
    Backend(String),
}

impl MacroError {
    pub fn reference_code(&self) -> u32 {
        match self {
            MacroError::Backend(_) => 1,
            MacroError::Invalid { .. } => 2,
            MacroError::NotFound { .. } => 5,
            MacroError::Conflict { .. } => 6,
        }
    }

    pub fn backend(err: impl std::fmt::Display) -> Self {
        MacroError::Backend(err.to_string())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, MacroError::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_the_id() {
        let id: Id = "020f755c3c082000".parse().unwrap();
        let err = MacroError::NotFound { id };
        assert_eq!(
            err.to_string(),
            "macro with ID 020f755c3c082000 not found (error reference code: 5)"
        );
        assert!(err.is_not_found());
    }

    #[test]
    fn message_suffix_matches_reference_code() {
        let id = Id::new(3).unwrap();
        let errors = [
            MacroError::NotFound { id },
            MacroError::Invalid {
                reason: "name is required".into(),
            },
            MacroError::Conflict { id },
            MacroError::backend("disk full"),
        ];
        for err in errors {
            let suffix = format!("(error reference code: {})", err.reference_code());
            assert!(err.to_string().ends_with(&suffix), "{err}");
        }
    }
}
