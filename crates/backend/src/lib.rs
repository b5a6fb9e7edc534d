mod config;
mod dispatch;
mod file;
mod memory;

pub use config::{BackendKind, ConfigError, GeneratorKind, IdSettings, StoreConfig, StoreSettings};
pub use dispatch::{open_backend, Backend};
pub use file::FileMacroService;
pub use memory::InMemoryMacroService;
