use crate::core::context::LoaderContext;
use crate::domain::model::Symbol;
use crate::utils::error::{LoaderError, Result};

/// A layer of name resolution.
pub trait SymbolScope: Send + Sync {
    fn scope_name(&self) -> &str;

    /// Looks `name` up in this scope and everything it delegates to.
    fn find_symbol(&self, name: &str) -> Option<Symbol>;

    fn resolve_symbol(&self, name: &str) -> Result<Symbol> {
        self.find_symbol(name)
            .ok_or_else(|| LoaderError::SymbolNotFound {
                name: name.to_string(),
            })
    }
}

/// Trust decisions that depend on what is resolvable.
///
/// Refreshed once right after a new loader context is installed, against
/// that context. The launcher only triggers the refresh; the decisions are
/// the policy's own.
pub trait TrustPolicy: Send {
    fn refresh(&mut self, context: &LoaderContext) -> anyhow::Result<()>;
}
