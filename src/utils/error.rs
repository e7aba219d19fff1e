use std::path::PathBuf;
use thiserror::Error;

/// Default exit code for every recognized bootstrap failure.
pub const FAILURE_EXIT_CODE: i32 = 1;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("{key} is not defined.")]
    ConfigMissing { key: &'static str },

    #[error("Invalid value for {field} ({value:?}): {reason}")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Cannot find {} directory", .path.display())]
    LibDirMissing { path: PathBuf },

    #[error("Error getting canonical lib path: {source}")]
    CanonicalizationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No enclosing resolution scope is available")]
    ContextConstructionFailed,

    #[error("A loader context is already installed in this environment")]
    ContextAlreadyInstalled,

    #[error("Unable to refresh trust policy: {message}")]
    PolicyRefreshFailed { message: String },

    #[error("Symbol {name} not found")]
    SymbolNotFound { name: String },

    #[error("Unable to load {name}: {reason}")]
    EntryPointNotFound { name: String, reason: String },

    #[error("{message}")]
    InvocationFailed {
        target: String,
        message: String,
        exit_code: i32,
    },
}

impl LoaderError {
    /// Never zero: every recognized failure exits non-zero.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoaderError::InvocationFailed { exit_code, .. } if *exit_code != 0 => *exit_code,
            _ => FAILURE_EXIT_CODE,
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            LoaderError::ConfigMissing { .. } | LoaderError::InvalidConfigValue { .. } => {
                "configuration"
            }
            LoaderError::LibDirMissing { .. } | LoaderError::CanonicalizationFailed { .. } => {
                "layout"
            }
            LoaderError::ContextConstructionFailed | LoaderError::ContextAlreadyInstalled => {
                "context"
            }
            LoaderError::PolicyRefreshFailed { .. } => "policy",
            LoaderError::SymbolNotFound { .. } | LoaderError::EntryPointNotFound { .. } => {
                "resolution"
            }
            LoaderError::InvocationFailed { .. } => "invocation",
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            LoaderError::ConfigMissing { .. } => {
                "Export LOADER_TARGET_CLASS with the fully qualified entry point name"
            }
            LoaderError::InvalidConfigValue { .. } => "Fix the offending LOADER_* variable",
            LoaderError::LibDirMissing { .. } | LoaderError::CanonicalizationFailed { .. } => {
                "Run the launcher from the install directory that contains the library folder"
            }
            LoaderError::ContextConstructionFailed | LoaderError::ContextAlreadyInstalled => {
                "Bootstrap the launcher from a fresh environment"
            }
            LoaderError::PolicyRefreshFailed { .. } => {
                "Check the trust policy's own diagnostics"
            }
            LoaderError::SymbolNotFound { .. } | LoaderError::EntryPointNotFound { .. } => {
                "Make sure the module that exports the entry point is in the library folder"
            }
            LoaderError::InvocationFailed { .. } => "See the application's own diagnostics",
        }
    }
}

/// A recognized failure reduced to what the process reports: a message and
/// an exit code.
///
/// Entry points may return this (directly or as the root of an error chain)
/// to choose the launcher's exit code. A zero code still exits with 1.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct BootstrapError {
    pub message: String,
    pub exit_code: i32,
}

impl BootstrapError {
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_code(message, FAILURE_EXIT_CODE)
    }

    pub fn with_code(message: impl Into<String>, exit_code: i32) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }
}

impl From<&LoaderError> for BootstrapError {
    fn from(err: &LoaderError) -> Self {
        Self::with_code(err.to_string(), err.exit_code())
    }
}

impl From<LoaderError> for BootstrapError {
    fn from(err: LoaderError) -> Self {
        Self::from(&err)
    }
}

pub type Result<T> = std::result::Result<T, LoaderError>;
