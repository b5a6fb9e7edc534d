pub mod conformance;
mod error;
mod id;
mod record;
mod suite;
mod traits;

pub use error::MacroError;
pub use id::{Id, IdError, IdGenerator, RandomIdGenerator, SequentialIdGenerator, StaticIdGenerator};
pub use record::{validate_name, Macro, MacroArguments, MacroUpdate, NewMacro};
pub use traits::MacroService;
