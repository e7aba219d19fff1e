pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[doc(hidden)]
pub use inventory;

pub use crate::config::{LoaderConfig, LIB_DIR};
pub use crate::core::{
    context::LoaderContext,
    dispatcher::{Dispatcher, ExitReport, Stage},
    environment::Environment,
    module_path::ModulePathBuilder,
    registry::{RegistryScope, RootScope, SymbolRegistry},
};
pub use domain::model::{
    EntryFn, Method, ModuleLocation, ModulePath, Symbol, MAIN_METHOD, MODULE_SUFFIX,
};
pub use domain::ports::{SymbolScope, TrustPolicy};
pub use utils::error::{BootstrapError, LoaderError, Result};
