use crate::core::context::LoaderContext;
use crate::core::registry::{RegistryScope, RootScope, SymbolRegistry};
use crate::domain::ports::{SymbolScope, TrustPolicy};
use crate::utils::error::{LoaderError, Result};
use std::sync::Arc;

/// Everything the bootstrap sequence reads from or installs into its
/// surroundings: candidate parent scopes, the trust policy, and the active
/// loader context.
pub struct Environment {
    registry: Arc<SymbolRegistry>,
    active: Option<Arc<dyn SymbolScope>>,
    defining: Option<Arc<dyn SymbolScope>>,
    system: Option<Arc<dyn SymbolScope>>,
    policy: Option<Box<dyn TrustPolicy>>,
    installed: Option<Arc<LoaderContext>>,
}

impl Environment {
    /// An environment with no scopes and no policy.
    pub fn new(registry: SymbolRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            active: None,
            defining: None,
            system: None,
            policy: None,
            installed: None,
        }
    }

    /// Wiring for a real launch: linked symbols, the launcher's built-in
    /// scope, and the root scope.
    pub fn from_process() -> Self {
        let registry = SymbolRegistry::linked();
        let builtin = RegistryScope::new(registry.clone());
        Self::new(registry)
            .with_defining_scope(Arc::new(builtin))
            .with_system_scope(Arc::new(RootScope))
    }

    pub fn with_active_scope(mut self, scope: Arc<dyn SymbolScope>) -> Self {
        self.active = Some(scope);
        self
    }

    pub fn with_defining_scope(mut self, scope: Arc<dyn SymbolScope>) -> Self {
        self.defining = Some(scope);
        self
    }

    pub fn with_system_scope(mut self, scope: Arc<dyn SymbolScope>) -> Self {
        self.system = Some(scope);
        self
    }

    pub fn with_policy(mut self, policy: impl TrustPolicy + 'static) -> Self {
        self.policy = Some(Box::new(policy));
        self
    }

    pub fn registry(&self) -> Arc<SymbolRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn active_scope(&self) -> Option<&Arc<dyn SymbolScope>> {
        self.active.as_ref()
    }

    /// Parent for a new loader context: active, then defining, then system.
    pub fn enclosing_scope(&self) -> Option<Arc<dyn SymbolScope>> {
        self.active
            .as_ref()
            .or(self.defining.as_ref())
            .or(self.system.as_ref())
            .map(Arc::clone)
    }

    pub fn installed_context(&self) -> Option<&Arc<LoaderContext>> {
        self.installed.as_ref()
    }

    pub fn policy_mut(&mut self) -> Option<&mut (dyn TrustPolicy + 'static)> {
        self.policy.as_deref_mut()
    }

    pub(crate) fn install(&mut self, context: Arc<LoaderContext>) -> Result<()> {
        if self.installed.is_some() {
            return Err(LoaderError::ContextAlreadyInstalled);
        }
        self.active = Some(Arc::clone(&context) as Arc<dyn SymbolScope>);
        self.installed = Some(context);
        Ok(())
    }
}
