pub mod context;
pub mod dispatcher;
pub mod environment;
pub mod module_path;
pub mod registry;

pub use crate::domain::model::{ModuleLocation, ModulePath, Symbol};
pub use crate::domain::ports::{SymbolScope, TrustPolicy};
pub use crate::utils::error::Result;
