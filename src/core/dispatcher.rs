use crate::config::{LoaderConfig, LIB_DIR};
use crate::core::context::LoaderContext;
use crate::core::environment::Environment;
use crate::core::module_path::ModulePathBuilder;
use crate::domain::model::{EntryFn, Symbol, MAIN_METHOD};
use crate::domain::ports::SymbolScope;
use crate::utils::error::{BootstrapError, LoaderError, Result, FAILURE_EXIT_CODE};
use crate::utils::validation::Validate;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

/// Bootstrap stages, in the only order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ValidateLayout,
    BuildPath,
    InstallContext,
    RefreshPolicy,
    ResolveEntryPoint,
    Invoke,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::ValidateLayout => "validate-layout",
            Stage::BuildPath => "build-path",
            Stage::InstallContext => "install-context",
            Stage::RefreshPolicy => "refresh-policy",
            Stage::ResolveEntryPoint => "resolve-entry-point",
            Stage::Invoke => "invoke",
        };
        f.write_str(name)
    }
}

/// What the process reports when the launcher finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitReport {
    pub exit_code: i32,
    pub message: Option<String>,
}

impl ExitReport {
    pub fn success() -> Self {
        Self {
            exit_code: 0,
            message: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

impl From<BootstrapError> for ExitReport {
    fn from(err: BootstrapError) -> Self {
        Self {
            exit_code: err.exit_code,
            message: Some(err.message).filter(|m| !m.is_empty()),
        }
    }
}

/// Runs the launch sequence: check the layout, build the module path,
/// install a loader context, refresh the trust policy, resolve the entry
/// point and call its `main`.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    config: LoaderConfig,
    working_dir: PathBuf,
}

impl Dispatcher {
    pub fn new(config: LoaderConfig, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            working_dir: working_dir.into(),
        }
    }

    /// Runs the whole sequence and reduces the outcome to an exit code and
    /// an optional message for standard output.
    pub fn run(&self, env: &mut Environment, args: &[String]) -> ExitReport {
        match self.bootstrap(env, args) {
            Ok(()) => ExitReport::success(),
            Err(e) => {
                tracing::error!(
                    "Launch failed: {} (Category: {})",
                    e,
                    e.category()
                );
                tracing::debug!("Recovery suggestion: {}", e.recovery_suggestion());
                BootstrapError::from(e).into()
            }
        }
    }

    pub fn bootstrap(&self, env: &mut Environment, args: &[String]) -> Result<()> {
        enter(Stage::ValidateLayout);
        let (target, lib_dir) = self.validate_layout()?;

        enter(Stage::BuildPath);
        let builder = self.build_path(&lib_dir);

        enter(Stage::InstallContext);
        let context = LoaderContext::construct(builder.into_loader_path(), env)?.install(env)?;

        enter(Stage::RefreshPolicy);
        refresh_policy(env, &context)?;

        enter(Stage::ResolveEntryPoint);
        let symbol = resolve_entry_point(context.as_ref(), target)?;

        enter(Stage::Invoke);
        invoke(&symbol, args)
    }

    /// Returns the configured target and the canonical library directory.
    fn validate_layout(&self) -> Result<(&str, PathBuf)> {
        self.config.validate()?;
        let target = self.config.target_class()?;

        let lib_dir = self.working_dir.join(LIB_DIR);
        if !lib_dir.is_dir() {
            return Err(LoaderError::LibDirMissing {
                path: Path::new(".").join(LIB_DIR),
            });
        }

        let canonical = lib_dir
            .canonicalize()
            .map_err(|source| LoaderError::CanonicalizationFailed {
                path: lib_dir.clone(),
                source,
            })?;
        Ok((target, canonical))
    }

    fn build_path(&self, lib_dir: &Path) -> ModulePathBuilder {
        let mut builder = ModulePathBuilder::new();
        let found = builder.scan_directory(lib_dir);
        tracing::info!("Found {} modules under {}", found, lib_dir.display());

        if let Some(extra) = &self.config.module_path {
            if !builder.add_from_separated_list(extra) {
                tracing::warn!("No usable entries in extra module path {:?}", extra);
            }
        }

        if builder.is_empty() {
            tracing::warn!("Module path is empty; only built-in symbols will resolve");
        }
        tracing::debug!("Module path: {}", builder.render());
        builder
    }
}

fn enter(stage: Stage) {
    tracing::debug!("Bootstrap stage: {}", stage);
}

fn refresh_policy(env: &mut Environment, context: &LoaderContext) -> Result<()> {
    let Some(policy) = env.policy_mut() else {
        tracing::debug!("No trust policy to refresh");
        return Ok(());
    };

    policy
        .refresh(context)
        .map_err(|e| LoaderError::PolicyRefreshFailed {
            message: format!("{:#}", e),
        })
}

fn resolve_entry_point(scope: &dyn SymbolScope, target: &str) -> Result<Symbol> {
    scope
        .resolve_symbol(target)
        .map_err(|e| LoaderError::EntryPointNotFound {
            name: target.to_string(),
            reason: e.to_string(),
        })
}

fn invoke(symbol: &Symbol, args: &[String]) -> Result<()> {
    let main = lookup_main(symbol)?;

    tracing::info!(
        "Invoking {}.{}() with {} arguments",
        symbol.name,
        MAIN_METHOD,
        args.len()
    );
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| main(args)));

    match outcome {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => {
            tracing::debug!("{}.{}() failed: {:?}", symbol.name, MAIN_METHOD, e);
            Err(invocation_failure(symbol, &e))
        }
        Err(payload) => Err(LoaderError::InvocationFailed {
            target: symbol.name.to_string(),
            message: panic_message(payload.as_ref()),
            exit_code: FAILURE_EXIT_CODE,
        }),
    }
}

fn lookup_main(symbol: &Symbol) -> Result<EntryFn> {
    symbol
        .method(MAIN_METHOD)
        .ok_or_else(|| LoaderError::InvocationFailed {
            target: symbol.name.to_string(),
            message: format!(
                "Unable to invoke {}.{}(): no such method",
                symbol.name, MAIN_METHOD
            ),
            exit_code: FAILURE_EXIT_CODE,
        })
}

/// Reports the innermost cause. A [`BootstrapError`] at the root also picks
/// the exit code, unless it asks for zero.
fn invocation_failure(symbol: &Symbol, err: &anyhow::Error) -> LoaderError {
    let root = err.root_cause();
    let exit_code = root
        .downcast_ref::<BootstrapError>()
        .map(|b| b.exit_code)
        .filter(|code| *code != 0)
        .unwrap_or(FAILURE_EXIT_CODE);

    LoaderError::InvocationFailed {
        target: symbol.name.to_string(),
        message: root.to_string(),
        exit_code,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "entry point panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::registry::{RootScope, SymbolRegistry};
    use crate::domain::model::Method;
    use anyhow::Context;
    use std::sync::Arc;

    fn chained(_: &[String]) -> anyhow::Result<()> {
        Err(anyhow::anyhow!("C"))
            .context("B")
            .context("A")
    }

    fn exits_with_three(_: &[String]) -> anyhow::Result<()> {
        Err(BootstrapError::with_code("stop", 3)).context("wrapped")
    }

    fn exits_with_zero(_: &[String]) -> anyhow::Result<()> {
        Err(BootstrapError::with_code("it broke", 0).into())
    }

    fn panics(_: &[String]) -> anyhow::Result<()> {
        panic!("entry exploded");
    }

    fn ok(_: &[String]) -> anyhow::Result<()> {
        Ok(())
    }

    static CHAINED: [Method; 1] = [Method::new("main", chained)];
    static EXITS: [Method; 1] = [Method::new("main", exits_with_three)];
    static EXITS_ZERO: [Method; 1] = [Method::new("main", exits_with_zero)];
    static PANICS: [Method; 1] = [Method::new("main", panics)];
    static NO_MAIN: [Method; 1] = [Method::new("start", ok)];

    #[test]
    fn test_root_cause_is_reported() {
        let symbol = Symbol::new("m", "app.Chained", &CHAINED);
        let err = invoke(&symbol, &[]).unwrap_err();
        assert_eq!(err.to_string(), "C");
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_bootstrap_error_root_sets_exit_code() {
        let symbol = Symbol::new("m", "app.Exits", &EXITS);
        let err = invoke(&symbol, &[]).unwrap_err();
        assert_eq!(err.to_string(), "stop");
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_failure_asking_for_zero_exits_one() {
        let symbol = Symbol::new("m", "app.ExitsZero", &EXITS_ZERO);
        let err = invoke(&symbol, &[]).unwrap_err();
        assert_eq!(err.to_string(), "it broke");
        assert_eq!(err.exit_code(), 1);

        let report = ExitReport::from(BootstrapError::from(err));
        assert!(!report.is_success());
        assert_eq!(report.message.as_deref(), Some("it broke"));
    }

    #[test]
    fn test_panic_becomes_invocation_failure() {
        let symbol = Symbol::new("m", "app.Panics", &PANICS);
        let err = invoke(&symbol, &[]).unwrap_err();
        assert!(matches!(err, LoaderError::InvocationFailed { .. }));
        assert_eq!(err.to_string(), "entry exploded");
    }

    #[test]
    fn test_missing_main_method() {
        let symbol = Symbol::new("m", "app.NoMain", &NO_MAIN);
        let err = invoke(&symbol, &[]).unwrap_err();
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("app.NoMain.main()"));
    }

    #[test]
    fn test_entry_point_not_found_message() {
        let err = resolve_entry_point(&RootScope, "app.Missing").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unable to load app.Missing: Symbol app.Missing not found"
        );
    }

    #[test]
    fn test_exit_report_from_error() {
        let report = ExitReport::from(BootstrapError::new(""));
        assert_eq!(report.exit_code, 1);
        assert!(report.message.is_none());
        assert!(ExitReport::success().is_success());
    }

    #[test]
    fn test_missing_config_stops_before_layout_check() {
        let dir = tempfile::TempDir::new().unwrap();
        let dispatcher = Dispatcher::new(LoaderConfig::default(), dir.path());
        let mut env =
            Environment::new(SymbolRegistry::default()).with_system_scope(Arc::new(RootScope));

        let report = dispatcher.run(&mut env, &[]);
        assert_eq!(report.exit_code, 1);
        assert_eq!(
            report.message.as_deref(),
            Some("LOADER_TARGET_CLASS is not defined.")
        );
        assert!(env.installed_context().is_none());
    }
}
