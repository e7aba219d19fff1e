use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};

/// Names the entry-point symbol to launch.
pub const TARGET_CLASS_ENV: &str = "LOADER_TARGET_CLASS";
pub const MODULE_PATH_ENV: &str = "LOADER_MODULE_PATH";
pub const VERBOSE_ENV: &str = "LOADER_VERBOSE";
pub const LOG_JSON_ENV: &str = "LOADER_LOG_JSON";

/// Library directory, relative to the working directory.
pub const LIB_DIR: &str = "lib";

/// Launcher settings.
///
/// Everything comes from the environment: the command line belongs to the
/// launched application and is forwarded untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoaderConfig {
    pub target_class: Option<String>,
    pub module_path: Option<String>,
    pub verbose: bool,
    pub log_json: bool,
}

impl LoaderConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Empty values count as
    /// unset, except for the target class, which is validated later.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        Self {
            target_class: lookup(TARGET_CLASS_ENV),
            module_path: non_empty(MODULE_PATH_ENV),
            verbose: non_empty(VERBOSE_ENV).is_some_and(|v| parse_flag(&v)),
            log_json: non_empty(LOG_JSON_ENV).is_some_and(|v| parse_flag(&v)),
        }
    }

    pub fn with_target_class(mut self, target: impl Into<String>) -> Self {
        self.target_class = Some(target.into());
        self
    }

    pub fn with_module_path(mut self, module_path: impl Into<String>) -> Self {
        self.module_path = Some(module_path.into());
        self
    }

    /// The configured entry point, or `ConfigMissing`.
    pub fn target_class(&self) -> Result<&str> {
        validation::validate_required_field(TARGET_CLASS_ENV, &self.target_class)
            .map(String::as_str)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl Validate for LoaderConfig {
    // Whether the name exists is for resolution to decide.
    fn validate(&self) -> Result<()> {
        let target = self.target_class()?;
        validation::validate_non_empty_string(TARGET_CLASS_ENV, target)
    }
}
