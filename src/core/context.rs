use crate::core::environment::Environment;
use crate::core::registry::SymbolRegistry;
use crate::domain::model::{ModulePath, Symbol};
use crate::domain::ports::SymbolScope;
use crate::utils::error::{LoaderError, Result};
use std::fmt;
use std::sync::Arc;

/// Resolution scope over a module path, delegating misses to the scope that
/// was in charge before it.
pub struct LoaderContext {
    path: ModulePath,
    registry: Arc<SymbolRegistry>,
    parent: Arc<dyn SymbolScope>,
}

impl LoaderContext {
    /// Builds a context over `path` whose parent is the first available of
    /// the environment's active, defining and system scopes.
    pub fn construct(path: ModulePath, env: &Environment) -> Result<Self> {
        let parent = env
            .enclosing_scope()
            .ok_or(LoaderError::ContextConstructionFailed)?;

        tracing::debug!(
            "Loader context over {} locations, parent scope '{}'",
            path.len(),
            parent.scope_name()
        );

        Ok(Self {
            path,
            registry: env.registry(),
            parent,
        })
    }

    pub fn module_path(&self) -> &ModulePath {
        &self.path
    }

    pub fn parent(&self) -> &dyn SymbolScope {
        self.parent.as_ref()
    }

    /// Looks `name` up in the owned module path only.
    pub fn find_local(&self, name: &str) -> Option<Symbol> {
        self.path
            .iter()
            .find_map(|location| self.registry.find_in_module(location, name))
    }

    /// Makes this context the environment's active scope.
    pub fn install(self, env: &mut Environment) -> Result<Arc<LoaderContext>> {
        let context = Arc::new(self);
        env.install(Arc::clone(&context))?;
        Ok(context)
    }
}

impl SymbolScope for LoaderContext {
    fn scope_name(&self) -> &str {
        "loader"
    }

    fn find_symbol(&self, name: &str) -> Option<Symbol> {
        self.find_local(name)
            .or_else(|| self.parent.find_symbol(name))
    }
}

impl fmt::Debug for LoaderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderContext")
            .field("path", &self.path.render())
            .field("parent", &self.parent.scope_name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::module_path::ModulePathBuilder;
    use crate::core::registry::RootScope;
    use crate::domain::model::Method;
    use std::fs;
    use tempfile::TempDir;

    fn from_alpha(_: &[String]) -> anyhow::Result<()> {
        Ok(())
    }

    fn from_beta(_: &[String]) -> anyhow::Result<()> {
        anyhow::bail!("beta")
    }

    static ALPHA: [Method; 1] = [Method::new("main", from_alpha)];
    static BETA: [Method; 1] = [Method::new("main", from_beta)];

    struct FixedScope(Symbol);

    impl SymbolScope for FixedScope {
        fn scope_name(&self) -> &str {
            "fixed"
        }

        fn find_symbol(&self, name: &str) -> Option<Symbol> {
            (self.0.name == name).then_some(self.0)
        }
    }

    fn module_path(dir: &TempDir, files: &[&str]) -> ModulePath {
        let mut builder = ModulePathBuilder::new();
        for file in files {
            let path = dir.path().join(file);
            fs::write(&path, b"").unwrap();
            builder.add_location(&path);
        }
        builder.into_loader_path()
    }

    fn registry() -> SymbolRegistry {
        SymbolRegistry::from_symbols([
            Symbol::new("alpha", "app.Main", &ALPHA),
            Symbol::new("beta", "app.Main", &BETA),
            Symbol::new("beta", "app.Other", &BETA),
        ])
    }

    #[test]
    fn test_earlier_location_wins() {
        let dir = TempDir::new().unwrap();
        let env = Environment::new(registry()).with_system_scope(Arc::new(RootScope));

        let context =
            LoaderContext::construct(module_path(&dir, &["beta.mod", "alpha.mod"]), &env).unwrap();
        let symbol = context.resolve_symbol("app.Main").unwrap();
        assert_eq!(symbol.module, "beta");
    }

    #[test]
    fn test_local_symbol_shadows_parent() {
        let dir = TempDir::new().unwrap();
        let shadowed = Symbol::new("", "app.Main", &BETA);
        let env = Environment::new(registry())
            .with_defining_scope(Arc::new(FixedScope(shadowed)));

        let context = LoaderContext::construct(module_path(&dir, &["alpha.mod"]), &env).unwrap();
        assert_eq!(context.resolve_symbol("app.Main").unwrap().module, "alpha");
    }

    #[test]
    fn test_miss_delegates_to_parent() {
        let dir = TempDir::new().unwrap();
        let fallback = Symbol::new("", "app.Fallback", &ALPHA);
        let env = Environment::new(registry())
            .with_defining_scope(Arc::new(FixedScope(fallback)));

        let context = LoaderContext::construct(module_path(&dir, &["alpha.mod"]), &env).unwrap();
        assert!(context.find_local("app.Fallback").is_none());
        assert_eq!(
            context.resolve_symbol("app.Fallback").unwrap().name,
            "app.Fallback"
        );
    }

    #[test]
    fn test_symbol_absent_everywhere() {
        let dir = TempDir::new().unwrap();
        let env = Environment::new(registry()).with_system_scope(Arc::new(RootScope));

        let context = LoaderContext::construct(module_path(&dir, &["alpha.mod"]), &env).unwrap();
        // Exported by beta, which is not on the path.
        let err = context.resolve_symbol("app.Other").unwrap_err();
        assert!(matches!(err, LoaderError::SymbolNotFound { .. }));
    }

    #[test]
    fn test_parent_precedence() {
        let active = Symbol::new("", "app.Active", &ALPHA);
        let defining = Symbol::new("", "app.Defining", &ALPHA);

        let env = Environment::new(registry())
            .with_active_scope(Arc::new(FixedScope(active)))
            .with_defining_scope(Arc::new(FixedScope(defining)))
            .with_system_scope(Arc::new(RootScope));
        let context = LoaderContext::construct(ModulePath::default(), &env).unwrap();
        assert!(context.find_symbol("app.Active").is_some());
        assert!(context.find_symbol("app.Defining").is_none());

        let env = Environment::new(registry())
            .with_defining_scope(Arc::new(FixedScope(defining)))
            .with_system_scope(Arc::new(RootScope));
        let context = LoaderContext::construct(ModulePath::default(), &env).unwrap();
        assert!(context.find_symbol("app.Defining").is_some());

        let env = Environment::new(registry()).with_system_scope(Arc::new(RootScope));
        let context = LoaderContext::construct(ModulePath::default(), &env).unwrap();
        assert_eq!(context.parent().scope_name(), "system");
    }

    #[test]
    fn test_no_parent_is_fatal() {
        let env = Environment::new(registry());
        let err = LoaderContext::construct(ModulePath::default(), &env).unwrap_err();
        assert!(matches!(err, LoaderError::ContextConstructionFailed));
    }

    #[test]
    fn test_install_once() {
        let mut env = Environment::new(registry()).with_system_scope(Arc::new(RootScope));

        let first = LoaderContext::construct(ModulePath::default(), &env).unwrap();
        let installed = first.install(&mut env).unwrap();
        assert_eq!(env.active_scope().unwrap().scope_name(), "loader");
        assert!(installed.module_path().is_empty());

        let second = LoaderContext::construct(ModulePath::default(), &env).unwrap();
        // The installed context is now the active scope, hence the parent.
        assert_eq!(second.parent().scope_name(), "loader");
        assert!(matches!(
            second.install(&mut env),
            Err(LoaderError::ContextAlreadyInstalled)
        ));
    }
}
